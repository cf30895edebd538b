//! Hospital record normalizer.
//!
//! Handles:
//! - Identifier resolution (`_id` first, legacy `id` second)
//! - Cost profile completion (emergency falls back to normal, cesarean → `cs`)
//! - Currency labelling (symbol for live records, source code for fallback records)
//! - Service deduplication and category parsing

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};

use crate::models::{
    ApiDeliveryCost, Comment, CostAmount, DeliveryCost, Hospital, HospitalType, LegacyDeliveryCost,
    RawComment, RawFields, RawHospital, DEFAULT_CURRENCY_CODE, LIVE_CURRENCY_SYMBOL,
};

/// How normalized records get their currency label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrencyLabel {
    /// Current-shape records get the live symbol; legacy records keep their code
    ByShape,
    /// Every record gets this label
    Fixed(String),
    /// Records keep their own code, the default code when they carry none
    RecordCode,
}

/// Normalizer for raw hospital records.
pub struct Normalizer {
    labelling: CurrencyLabel,
    /// Currency label for records in the current backend shape
    live_currency: String,
    /// Currency label for records that carry none
    default_currency: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Create a normalizer that labels currency by record shape.
    pub fn new() -> Self {
        Self::with_labelling(CurrencyLabel::ByShape)
    }

    /// Normalizer for records served by the record service.
    pub fn for_live() -> Self {
        Self::with_labelling(CurrencyLabel::Fixed(LIVE_CURRENCY_SYMBOL.to_string()))
    }

    /// Normalizer for the bundled fallback records.
    pub fn for_fallback() -> Self {
        Self::with_labelling(CurrencyLabel::RecordCode)
    }

    pub fn with_labelling(labelling: CurrencyLabel) -> Self {
        Self {
            labelling,
            live_currency: LIVE_CURRENCY_SYMBOL.to_string(),
            default_currency: DEFAULT_CURRENCY_CODE.to_string(),
        }
    }

    /// Decode and normalize a JSON record.
    pub fn normalize_value(&self, value: Value) -> Hospital {
        self.normalize(&RawHospital::decode(value))
    }

    /// Normalize a raw record. Never fails; missing fields become defaults.
    ///
    /// An unidentifiable record gets an empty `id`; sources drop those before
    /// handing records out.
    pub fn normalize(&self, raw: &RawHospital) -> Hospital {
        match raw {
            RawHospital::Current(fields) => {
                let cost = self.cost_from_current(fields.delivery_cost.as_ref());
                self.from_fields(fields, cost)
            }
            RawHospital::Legacy(fields) => {
                let cost = self.cost_from_legacy(fields.delivery_cost.as_ref());
                self.from_fields(fields, cost)
            }
            RawHospital::Unrecognized(value) => self.from_unrecognized(raw.identifier(), value),
        }
    }

    /// Express a canonical record in the legacy wire shape.
    ///
    /// Normalizing the result yields the same record.
    pub fn to_raw(hospital: &Hospital) -> Value {
        let comments: Vec<Value> = hospital
            .comments
            .iter()
            .map(|c| {
                json!({
                    "author": c.author,
                    "text": c.text,
                    "createdAt": c.created_at.to_rfc3339(),
                })
            })
            .collect();

        json!({
            "_id": hospital.id,
            "id": hospital.id,
            "state": hospital.state,
            "name": hospital.name,
            "location": hospital.location,
            "services": hospital.services,
            "delivery_cost": {
                "normal": hospital.delivery_cost.normal,
                "emergency": hospital.delivery_cost.emergency,
                "cs": hospital.delivery_cost.cs,
                "currency": hospital.delivery_cost.currency,
            },
            "contact": hospital.contact,
            "type": hospital.hospital_type.as_str(),
            "admin_code": hospital.admin_code,
            "comments": comments,
        })
    }

    fn from_fields<C>(&self, fields: &RawFields<C>, delivery_cost: DeliveryCost) -> Hospital {
        Hospital {
            id: fields.identifier().unwrap_or_default().to_string(),
            state: fields.state.clone().unwrap_or_default(),
            name: fields.name.clone().unwrap_or_default(),
            location: fields.location.clone().unwrap_or_default(),
            services: dedupe(fields.services.as_deref().unwrap_or_default()),
            delivery_cost,
            contact: fields.contact.clone().unwrap_or_default(),
            hospital_type: fields
                .kind
                .as_deref()
                .map(HospitalType::parse)
                .unwrap_or_default(),
            admin_code: fields.admin_code.clone(),
            comments: fields
                .comments
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(normalize_comment)
                .collect(),
            expanded: false,
        }
    }

    fn from_unrecognized(&self, id: Option<&str>, value: &Value) -> Hospital {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Hospital {
            id: id.unwrap_or_default().to_string(),
            state: text("state"),
            name: text("name"),
            location: text("location"),
            services: Vec::new(),
            delivery_cost: DeliveryCost::from_normal(
                CostAmount::default(),
                self.currency(false, None),
            ),
            contact: text("contact"),
            hospital_type: HospitalType::parse(&text("type")),
            admin_code: None,
            comments: Vec::new(),
            expanded: false,
        }
    }

    fn cost_from_current(&self, cost: Option<&ApiDeliveryCost>) -> DeliveryCost {
        let currency = self.currency(true, None);
        let Some(cost) = cost else {
            return DeliveryCost::from_normal(CostAmount::default(), currency);
        };
        DeliveryCost {
            normal: cost.normal.clone(),
            emergency: cost.normal.clone(),
            cs: cost.cesarean.clone(),
            currency,
        }
    }

    fn cost_from_legacy(&self, cost: Option<&LegacyDeliveryCost>) -> DeliveryCost {
        let Some(cost) = cost else {
            return DeliveryCost::from_normal(CostAmount::default(), self.currency(false, None));
        };
        DeliveryCost {
            normal: cost.normal.clone(),
            emergency: cost.emergency.clone().unwrap_or_else(|| cost.normal.clone()),
            cs: cost.cs.clone().or_else(|| cost.cesarean.clone()),
            currency: self.currency(false, cost.currency.as_deref()),
        }
    }

    fn currency(&self, current_shape: bool, code: Option<&str>) -> String {
        let code = code.map(str::trim).filter(|c| !c.is_empty());
        match &self.labelling {
            CurrencyLabel::Fixed(label) => label.clone(),
            CurrencyLabel::ByShape if current_shape => self.live_currency.clone(),
            CurrencyLabel::ByShape | CurrencyLabel::RecordCode => code
                .map(str::to_string)
                .unwrap_or_else(|| self.default_currency.clone()),
        }
    }
}

fn dedupe(services: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(services.len());
    for service in services {
        if !out.contains(service) {
            out.push(service.clone());
        }
    }
    out
}

fn normalize_comment(raw: &RawComment) -> Comment {
    Comment {
        author: raw.author.clone().unwrap_or_default(),
        text: raw.text.clone().unwrap_or_default(),
        created_at: raw
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_default(),
    }
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
