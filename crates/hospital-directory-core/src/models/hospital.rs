//! Canonical hospital record models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Currency symbol attached to every record served by the live backend.
pub const LIVE_CURRENCY_SYMBOL: &str = "₦";

/// Currency code used when a fallback record carries none.
pub const DEFAULT_CURRENCY_CODE: &str = "NGN";

/// A delivery cost amount.
///
/// The live backend sends free-form strings ("150,000 - 200,000") while the
/// fallback dataset uses plain numbers, so both are kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CostAmount {
    Number(f64),
    Text(String),
}

impl Default for CostAmount {
    fn default() -> Self {
        CostAmount::Number(0.0)
    }
}

impl CostAmount {
    /// Numeric value, if the amount is a number or a plain numeric string.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CostAmount::Number(n) => Some(*n),
            CostAmount::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for CostAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostAmount::Number(n) => write!(f, "{}", n),
            CostAmount::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for CostAmount {
    fn from(n: f64) -> Self {
        CostAmount::Number(n)
    }
}

/// Reconciled delivery cost profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryCost {
    /// Normal delivery cost
    pub normal: CostAmount,
    /// Emergency delivery cost (falls back to `normal`)
    pub emergency: CostAmount,
    /// Cesarean section cost; the slot always exists, `None` when upstream has no figure
    pub cs: Option<CostAmount>,
    /// Display currency (symbol for live records, code for fallback records)
    pub currency: String,
}

impl DeliveryCost {
    /// Cost profile with only a normal amount; emergency mirrors it.
    pub fn from_normal(normal: CostAmount, currency: impl Into<String>) -> Self {
        Self {
            emergency: normal.clone(),
            normal,
            cs: None,
            currency: currency.into(),
        }
    }
}

/// A visitor comment on a hospital.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a comment stamped with the current time.
    pub fn new(author: String, text: String) -> Self {
        Self {
            author,
            text,
            created_at: Utc::now(),
        }
    }
}

/// Facility category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum HospitalType {
    Public,
    Private,
    Teaching,
    Mission,
    Specialist,
    /// Any label outside the known set, kept verbatim
    Other(String),
}

impl HospitalType {
    /// Parse a category label (case-insensitive for known categories).
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "public" => HospitalType::Public,
            "private" => HospitalType::Private,
            "teaching" => HospitalType::Teaching,
            "mission" => HospitalType::Mission,
            "specialist" => HospitalType::Specialist,
            _ => HospitalType::Other(label.to_string()),
        }
    }

    /// Display label.
    pub fn as_str(&self) -> &str {
        match self {
            HospitalType::Public => "Public",
            HospitalType::Private => "Private",
            HospitalType::Teaching => "Teaching",
            HospitalType::Mission => "Mission",
            HospitalType::Specialist => "Specialist",
            HospitalType::Other(label) => label,
        }
    }

    /// Case-insensitive label comparison.
    pub fn matches(&self, label: &str) -> bool {
        self.as_str().to_lowercase() == label.trim().to_lowercase()
    }
}

impl Default for HospitalType {
    fn default() -> Self {
        HospitalType::Other(String::new())
    }
}

impl From<String> for HospitalType {
    fn from(label: String) -> Self {
        HospitalType::parse(&label)
    }
}

impl From<HospitalType> for String {
    fn from(kind: HospitalType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for HospitalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hospital directory record, independent of the backend shape it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hospital {
    /// Resolved identifier - never empty for records handed out by a source
    pub id: String,
    /// Administrative region (state)
    pub state: String,
    /// Display name
    pub name: String,
    /// Address line
    pub location: String,
    /// Offered services, deduplicated in first-seen order
    pub services: Vec<String>,
    pub delivery_cost: DeliveryCost,
    pub contact: String,
    pub hospital_type: HospitalType,
    /// Admin code for privileged edits
    pub admin_code: Option<String>,
    /// Comments, most recent first
    pub comments: Vec<Comment>,
    /// UI expansion flag, never persisted
    #[serde(skip)]
    pub expanded: bool,
}

impl Hospital {
    /// Check if the hospital offers at least one of the given services.
    pub fn offers_any(&self, services: &[String]) -> bool {
        services.iter().any(|s| self.services.contains(s))
    }

    /// Case-insensitive substring match on name or location.
    ///
    /// `needle` must already be lowercase.
    pub fn matches_text(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.location.to_lowercase().contains(needle)
    }

    /// Case-insensitive region comparison.
    pub fn in_region(&self, region: &str) -> bool {
        self.state.to_lowercase() == region.trim().to_lowercase()
    }

    /// Prepend a comment, keeping most-recent-first order.
    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.insert(0, comment);
    }

    /// Flip the UI expansion flag.
    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }
}

/// Submission payload for creating or editing a hospital.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewHospital {
    pub state: String,
    pub name: String,
    pub location: String,
    pub services: Vec<String>,
    pub delivery_cost: NewDeliveryCost,
    pub contact: String,
    #[serde(rename = "type")]
    pub hospital_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_code: Option<String>,
}

/// Cost block of a submission, in the flat shape the submission form produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDeliveryCost {
    pub normal: CostAmount,
    pub emergency: Option<CostAmount>,
    pub cs: Option<CostAmount>,
    pub currency: String,
}

/// Submission payload for a comment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewComment {
    pub author: String,
    pub text: String,
}
