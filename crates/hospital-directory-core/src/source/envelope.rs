//! Response envelope decoding for the record service.
//!
//! Every decoder here is total: shape mismatches are logged and degrade to a
//! documented default instead of surfacing as errors.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::directory::{normalize_identified, parse_timestamp, Normalizer, RegionGroups};
use crate::models::{positive_count, Comment, Hospital, NewComment, NewHospital, RawComment};

use super::{ListPage, PageMeta, SourceError, SourceResult};

/// Identifier given to a created record when the service response carries none.
pub const UNKNOWN_ID: &str = "unknown";

/// Decode `{data: {region: [record]}, page, limit, total, totalPages}`.
///
/// A missing or non-object `data` yields an empty page.
pub fn decode_listing(normalizer: &Normalizer, payload: Value) -> ListPage {
    let meta = decode_meta(&payload);

    let buckets = match payload {
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Object(regions)) => regions,
            _ => {
                tracing::warn!("Listing response has no region map, showing an empty page");
                Map::new()
            }
        },
        _ => {
            tracing::warn!("Listing response is not an object, showing an empty page");
            Map::new()
        }
    };

    let groups = RegionGroups::from_buckets(buckets.into_iter().filter_map(|(region, records)| {
        match records {
            Value::Array(items) => Some((region, normalize_identified(normalizer, items))),
            _ => {
                tracing::warn!("Region {} does not hold a record list, skipping", region);
                None
            }
        }
    }));

    ListPage { groups, meta }
}

fn decode_meta(payload: &Value) -> Option<PageMeta> {
    let page = positive_count(payload.get("page"))?;
    let limit = positive_count(payload.get("limit")).unwrap_or(0);
    let total = payload.get("total").and_then(Value::as_u64).unwrap_or(0);
    let total_pages = payload.get("totalPages").and_then(Value::as_u64).unwrap_or(0);

    Some(PageMeta {
        page: clamp_u32(page),
        limit: clamp_u32(limit),
        total,
        total_pages: clamp_u32(total_pages),
    })
}

fn clamp_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Decode `{data: [record]}` (a bare array is accepted too).
pub fn decode_search(normalizer: &Normalizer, payload: Value) -> Vec<Hospital> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                tracing::warn!("Search response has no record list, returning no results");
                Vec::new()
            }
        },
        _ => {
            tracing::warn!("Search response is not an object, returning no results");
            Vec::new()
        }
    };
    normalize_identified(normalizer, items)
}

/// Decode a detail response (the record itself, no envelope).
///
/// A payload with no identifier is treated as the record being absent.
pub fn decode_detail(normalizer: &Normalizer, requested_id: &str, payload: Value) -> SourceResult<Hospital> {
    let hospital = normalizer.normalize_value(payload);
    if hospital.id.is_empty() {
        tracing::warn!("Detail response for {} carries no identifier", requested_id);
        return Err(SourceError::NotFound(requested_id.to_string()));
    }
    Ok(hospital)
}

/// Decode a create response: `{data: record}`, a bare record, or anything else.
///
/// Unrecognized responses degrade to the submitted record with [`UNKNOWN_ID`].
pub fn decode_created(normalizer: &Normalizer, submitted: &NewHospital, payload: Value) -> SourceResult<Hospital> {
    decode_written(normalizer, submitted, UNKNOWN_ID, payload)
}

/// Decode an update response; unrecognized responses degrade to the submitted
/// record under the edited identifier.
pub fn decode_updated(normalizer: &Normalizer, id: &str, submitted: &NewHospital, payload: Value) -> SourceResult<Hospital> {
    decode_written(normalizer, submitted, id, payload)
}

fn decode_written(
    normalizer: &Normalizer,
    submitted: &NewHospital,
    fallback_id: &str,
    payload: Value,
) -> SourceResult<Hospital> {
    let record = match payload {
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(data @ Value::Object(_)) => Some(data),
            Some(_) | None if has_identifier(&envelope) => Some(Value::Object(envelope)),
            _ => None,
        },
        _ => None,
    };

    if let Some(record) = record {
        let hospital = normalizer.normalize_value(record);
        if !hospital.id.is_empty() {
            return Ok(hospital);
        }
    }

    tracing::warn!("Unrecognized write response, using submitted record as {}", fallback_id);
    submitted_record(normalizer, submitted, fallback_id)
}

fn has_identifier(envelope: &Map<String, Value>) -> bool {
    ["_id", "id"]
        .iter()
        .any(|key| envelope.get(*key).is_some_and(|v| !v.is_null()))
}

/// Normalize a submission as if the service had echoed it back under `id`.
pub fn submitted_record(normalizer: &Normalizer, submitted: &NewHospital, id: &str) -> SourceResult<Hospital> {
    let mut value = serde_json::to_value(submitted)?;
    if let Value::Object(fields) = &mut value {
        fields.insert("_id".to_string(), Value::String(id.to_string()));
    }
    Ok(normalizer.normalize_value(value))
}

/// Decode `{data: Comment}`; anything else degrades to the submitted comment stamped now.
pub fn decode_comment(submitted: &NewComment, payload: Value) -> Comment {
    let raw = payload
        .get("data")
        .and_then(|data| RawComment::deserialize(data).ok());

    match raw {
        Some(raw) => Comment {
            author: raw.author.unwrap_or_else(|| submitted.author.clone()),
            text: raw.text.unwrap_or_else(|| submitted.text.clone()),
            created_at: raw
                .created_at
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or_else(chrono::Utc::now),
        },
        None => {
            tracing::warn!("Unrecognized comment response, using submitted comment");
            Comment::new(submitted.author.clone(), submitted.text.clone())
        }
    }
}
