//! Wire shapes for hospital records.
//!
//! The backend has served two record shapes over time:
//! - current: `_id`, `delivery_cost { normal, cesarean? }`
//! - legacy: `id`, `delivery_cost { normal, emergency, cs, currency }`
//!
//! [`RawHospital::decode`] picks the legacy shape when the cost block carries
//! any of [`LEGACY_COST_KEYS`], the current shape otherwise, and keeps records
//! that fit neither as an unrecognized JSON value.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::CostAmount;

/// Cost keys only the legacy shape uses.
pub const LEGACY_COST_KEYS: &[&str] = &["emergency", "cs", "currency"];

/// Cost block in the current backend shape.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiDeliveryCost {
    #[serde(default)]
    pub normal: CostAmount,
    #[serde(default)]
    pub cesarean: Option<CostAmount>,
    /// Subdocument id assigned by the backend store
    #[serde(rename = "_id", default)]
    pub object_id: Option<String>,
}

/// Cost block in the legacy flat shape.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LegacyDeliveryCost {
    #[serde(default)]
    pub normal: CostAmount,
    #[serde(default)]
    pub emergency: Option<CostAmount>,
    #[serde(default)]
    pub cs: Option<CostAmount>,
    #[serde(default)]
    pub cesarean: Option<CostAmount>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Comment as sent over the wire.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawComment {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

/// Record fields shared by both shapes, generic over the cost block.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(bound(deserialize = "C: Deserialize<'de>"))]
pub struct RawFields<C> {
    #[serde(rename = "_id", default, deserialize_with = "lenient_id")]
    pub primary_id: Option<String>,
    #[serde(rename = "id", default, deserialize_with = "lenient_id")]
    pub legacy_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub services: Option<Vec<String>>,
    #[serde(default)]
    pub delivery_cost: Option<C>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub admin_code: Option<String>,
    #[serde(default)]
    pub comments: Option<Vec<RawComment>>,
}

impl<C> RawFields<C> {
    /// Primary identifier, falling back to the legacy one.
    pub fn identifier(&self) -> Option<&str> {
        non_empty(self.primary_id.as_deref()).or_else(|| non_empty(self.legacy_id.as_deref()))
    }
}

/// A raw record, tagged by the shape it decoded as.
#[derive(Debug, Clone, PartialEq)]
pub enum RawHospital {
    Current(RawFields<ApiDeliveryCost>),
    Legacy(RawFields<LegacyDeliveryCost>),
    Unrecognized(Value),
}

impl RawHospital {
    /// Decode a JSON value into the shape its cost block indicates.
    pub fn decode(value: Value) -> Self {
        let decoded = if has_legacy_cost(&value) {
            RawFields::<LegacyDeliveryCost>::deserialize(&value).map(RawHospital::Legacy)
        } else {
            RawFields::<ApiDeliveryCost>::deserialize(&value).map(RawHospital::Current)
        };
        match decoded {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Unrecognized hospital record shape: {}", e);
                RawHospital::Unrecognized(value)
            }
        }
    }

    /// Resolved identifier, if the record carries one.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            RawHospital::Current(fields) => fields.identifier(),
            RawHospital::Legacy(fields) => fields.identifier(),
            RawHospital::Unrecognized(value) => non_empty(value.get("_id").and_then(Value::as_str))
                .or_else(|| non_empty(value.get("id").and_then(Value::as_str))),
        }
    }
}

fn has_legacy_cost(value: &Value) -> bool {
    value
        .get("delivery_cost")
        .and_then(Value::as_object)
        .is_some_and(|cost| LEGACY_COST_KEYS.iter().any(|key| cost.contains_key(*key)))
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// Accept string or numeric identifiers.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_current_shape() {
        let raw = RawHospital::decode(json!({
            "_id": "665f1c",
            "state": "Lagos",
            "name": "Reddington",
            "delivery_cost": { "normal": "350,000", "cesarean": "900,000", "_id": "cost1" },
            "__v": 0
        }));

        match raw {
            RawHospital::Current(fields) => {
                let cost = fields.delivery_cost.clone().unwrap();
                assert_eq!(cost.cesarean, Some(CostAmount::Text("900,000".into())));
                assert_eq!(fields.identifier(), Some("665f1c"));
            }
            other => panic!("expected current shape, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_legacy_shape() {
        let raw = RawHospital::decode(json!({
            "id": "3",
            "state": "New York",
            "delivery_cost": { "normal": 7000, "emergency": 10000, "cs": 15000, "currency": "USD" }
        }));

        match raw {
            RawHospital::Legacy(fields) => {
                let cost = fields.delivery_cost.clone().unwrap();
                assert_eq!(cost.emergency, Some(CostAmount::Number(10000.0)));
                assert_eq!(cost.currency.as_deref(), Some("USD"));
                assert_eq!(fields.identifier(), Some("3"));
            }
            other => panic!("expected legacy shape, got {:?}", other),
        }
    }

    #[test]
    fn test_extra_cost_fields_keep_current_shape() {
        let raw = RawHospital::decode(json!({
            "_id": "x",
            "delivery_cost": { "normal": "5,000", "cesarean": "9,000", "updatedAt": "2025-03-01T00:00:00Z" }
        }));
        assert!(matches!(raw, RawHospital::Current(_)));

        let raw = RawHospital::decode(json!({
            "_id": "y",
            "delivery_cost": { "normal": 100, "currency": "GBP", "note": "approx" }
        }));
        assert!(matches!(raw, RawHospital::Legacy(_)));
    }

    #[test]
    fn test_decode_unrecognized() {
        let raw = RawHospital::decode(json!({ "_id": "x1", "services": "Maternity" }));
        assert!(matches!(raw, RawHospital::Unrecognized(_)));
        assert_eq!(raw.identifier(), Some("x1"));

        let raw = RawHospital::decode(json!("not a record"));
        assert!(matches!(raw, RawHospital::Unrecognized(_)));
        assert_eq!(raw.identifier(), None);
    }

    #[test]
    fn test_identifier_fallback() {
        let raw = RawHospital::decode(json!({ "_id": "", "id": 42 }));
        assert_eq!(raw.identifier(), Some("42"));

        let raw = RawHospital::decode(json!({ "name": "No id" }));
        assert_eq!(raw.identifier(), None);
    }
}
