//! End-to-end flows over the bundled fallback data.

use std::sync::Arc;

use anyhow::Result;
use hospital_directory_core::models::{CostAmount, FilterCriteria, NewComment, NewDeliveryCost, NewHospital};
use hospital_directory_core::source::{connect, SourceError, SourceKind, FALLBACK_ID_PREFIX};
use hospital_directory_core::state::{LoadPhase, PaginationController};
use hospital_directory_core::{DirectoryConfig, FilterEngine, HospitalSource};

fn submission(state: &str, name: &str) -> NewHospital {
    NewHospital {
        state: state.into(),
        name: name.into(),
        location: "1 Hospital Road".into(),
        services: vec!["Maternity".into()],
        delivery_cost: NewDeliveryCost {
            normal: CostAmount::Number(18000.0),
            emergency: None,
            cs: Some(CostAmount::Number(60000.0)),
            currency: "NGN".into(),
        },
        contact: "+234 800 000 0000".into(),
        hospital_type: "Public".into(),
        admin_code: Some("ADMIN900".into()),
    }
}

fn fallback() -> Result<Arc<dyn HospitalSource>> {
    let source = connect(&DirectoryConfig::fallback())?;
    assert_eq!(source.kind(), SourceKind::Fallback);
    Ok(source)
}

#[tokio::test]
async fn test_create_then_find_in_new_region() -> Result<()> {
    let source = fallback()?;

    let created = source.create(&submission("Kano", "Kano Mothers Clinic")).await?;
    assert!(created.id.starts_with(FALLBACK_ID_PREFIX));

    let all = source.list(0, 10).await?;
    let kano = all.groups.get("Kano").expect("Kano region created");
    assert_eq!(kano.len(), 1);
    assert_eq!(kano[0].name, "Kano Mothers Clinic");
    assert_eq!(all.groups.regions().last(), Some(&"Texas"));

    let found = source.get_by_id(&created.id).await?;
    assert_eq!(found, created);
    Ok(())
}

#[tokio::test]
async fn test_delete_then_lookup_fails() -> Result<()> {
    let source = fallback()?;
    source.delete("5").await?;

    assert!(matches!(source.get_by_id("5").await, Err(SourceError::NotFound(_))));
    let texas = source.list(0, 10).await?;
    assert_eq!(texas.groups.get("Texas").map(|r| r.len()), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_comment_then_detail() -> Result<()> {
    let source = fallback()?;
    let comment = NewComment {
        author: "Chioma".into(),
        text: "Short wait times".into(),
    };

    let added = source.add_comment("6", &comment).await?;
    let hospital = source.get_by_id("6").await?;
    assert_eq!(hospital.comments.first(), Some(&added));
    Ok(())
}

#[tokio::test]
async fn test_search_agrees_with_local_evaluation() -> Result<()> {
    let source = fallback()?;
    let everything = source.list(0, 10).await?.groups.into_records();

    let criteria_set = vec![
        FilterCriteria::new().with_service("Oncology").with_service("Neurology"),
        FilterCriteria::new().with_state("GEORGIA"),
        FilterCriteria::text("ave"),
        FilterCriteria::new().with_type("teaching").with_service("Surgery"),
        FilterCriteria::new().with_cost_range(Some(1.0), Some(2.0)),
    ];

    for criteria in criteria_set {
        let searched = source.search(&criteria).await?;
        let local = FilterEngine::evaluate(&criteria, &everything);
        assert_eq!(searched, local, "Criteria {:?} disagree", criteria);
    }
    Ok(())
}

#[tokio::test]
async fn test_services_filter_is_union() -> Result<()> {
    let source = fallback()?;
    let oncology = source.search(&FilterCriteria::new().with_service("Oncology")).await?;
    let neurology = source.search(&FilterCriteria::new().with_service("Neurology")).await?;
    let either = source
        .search(&FilterCriteria::new().with_service("Oncology").with_service("Neurology"))
        .await?;

    assert_eq!(either.len(), oncology.len() + neurology.len());
    Ok(())
}

#[tokio::test]
async fn test_controller_over_fallback() -> Result<()> {
    let mut config = DirectoryConfig::fallback();
    config.page_size = 4;
    let controller = PaginationController::new(connect(&config)?, config.page_size);
    let mut updates = controller.subscribe();

    assert_eq!(controller.state().phase, LoadPhase::Uninitialized);
    controller.request_stats().await?;
    assert!(updates.has_changed()?);

    let state = updates.borrow_and_update().clone();
    assert_eq!(state.phase, LoadPhase::PageLoaded);
    assert_eq!(state.total_regions, 6);
    assert_eq!(state.total_pages, 2);
    assert_eq!(state.groups.len(), 4);

    controller.quick_search("savannah").await?;
    let state = controller.state();
    assert!(state.is_filtered());
    assert_eq!(state.groups.total_records(), 1);

    controller.quick_search("   ").await?;
    let state = controller.state();
    assert!(!state.is_filtered());
    assert_eq!(state.current_page, 1);

    controller.source().create(&submission("Zamfara", "Gusau General")).await?;
    controller.next_page().await?;
    controller.refresh().await?;
    let state = controller.state();
    assert_eq!(state.current_page, 2);
    assert_eq!(state.groups.regions(), vec!["New York", "Texas", "Zamfara"]);
    Ok(())
}
