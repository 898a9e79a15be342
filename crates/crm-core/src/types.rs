use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// RecordId
// ---------------------------------------------------------------------------

/// Identifier assigned by the remote store. Always numeric, never reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl From<u32> for RecordId {
    fn from(raw: u32) -> Self {
        Self(i64::from(raw))
    }
}

impl From<RecordId> for Value {
    fn from(id: RecordId) -> Self {
        Value::from(id.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordIdError {
    #[error("record id {0:?} does not start with a number")]
    NotNumeric(String),
    #[error("record id {0} must be positive")]
    NonPositive(i64),
}

/// Coerces text to an id the way form inputs hand ids around: surrounding
/// whitespace is ignored and parsing stops at the first non-digit
/// (`"42abc"` is 42).
impl FromStr for RecordId {
    type Err = RecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        let prefix = &digits[..end];
        if prefix.is_empty() {
            return Err(RecordIdError::NotNumeric(s.to_string()));
        }
        let magnitude: i64 = prefix
            .parse()
            .map_err(|_| RecordIdError::NotNumeric(s.to_string()))?;
        let value = if negative { -magnitude } else { magnitude };
        if value <= 0 {
            return Err(RecordIdError::NonPositive(value));
        }
        Ok(Self(value))
    }
}

// ---------------------------------------------------------------------------
// RecordRef
// ---------------------------------------------------------------------------

/// A reference to another record. The platform returns either the bare id or
/// a lookup object carrying the display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordRef {
    Id(RecordId),
    Lookup {
        #[serde(rename = "Id")]
        id: RecordId,
        #[serde(rename = "Name", default)]
        name: Option<String>,
    },
}

impl RecordRef {
    pub fn id(&self) -> RecordId {
        match self {
            RecordRef::Id(id) => *id,
            RecordRef::Lookup { id, .. } => *id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            RecordRef::Id(_) => None,
            RecordRef::Lookup { name, .. } => name.as_deref(),
        }
    }
}

impl From<RecordId> for RecordRef {
    fn from(id: RecordId) -> Self {
        RecordRef::Id(id)
    }
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} {value:?}")]
pub struct UnknownStage {
    pub kind: &'static str,
    pub value: String,
}

/// Where a contact sits in the sales funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LifecycleStage {
    #[default]
    Lead,
    Prospect,
    Customer,
    Evangelist,
    Other,
}

impl LifecycleStage {
    pub const ALL: [LifecycleStage; 5] = [
        LifecycleStage::Lead,
        LifecycleStage::Prospect,
        LifecycleStage::Customer,
        LifecycleStage::Evangelist,
        LifecycleStage::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStage::Lead => "Lead",
            LifecycleStage::Prospect => "Prospect",
            LifecycleStage::Customer => "Customer",
            LifecycleStage::Evangelist => "Evangelist",
            LifecycleStage::Other => "Other",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleStage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStage {
                kind: "lifecycle stage",
                value: s.to_string(),
            })
    }
}

/// Deal pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DealStage {
    #[default]
    Prospect,
    Qualified,
    Proposal,
    Negotiation,
    #[serde(rename = "Closed Won")]
    ClosedWon,
    #[serde(rename = "Closed Lost")]
    ClosedLost,
}

impl DealStage {
    /// Pipeline order, left to right on the deals board.
    pub const ORDER: [DealStage; 6] = [
        DealStage::Prospect,
        DealStage::Qualified,
        DealStage::Proposal,
        DealStage::Negotiation,
        DealStage::ClosedWon,
        DealStage::ClosedLost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DealStage::Prospect => "Prospect",
            DealStage::Qualified => "Qualified",
            DealStage::Proposal => "Proposal",
            DealStage::Negotiation => "Negotiation",
            DealStage::ClosedWon => "Closed Won",
            DealStage::ClosedLost => "Closed Lost",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, DealStage::ClosedWon | DealStage::ClosedLost)
    }

    /// Position on the board.
    pub fn position(&self) -> usize {
        Self::ORDER
            .iter()
            .position(|stage| stage == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealStage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', '_'], " ");
        Self::ORDER
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| UnknownStage {
                kind: "deal stage",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_id_coerces_numeric_prefix() {
        assert_eq!("42".parse::<RecordId>().unwrap(), RecordId::new(42));
        assert_eq!(" 17 ".parse::<RecordId>().unwrap(), RecordId::new(17));
        assert_eq!("42abc".parse::<RecordId>().unwrap(), RecordId::new(42));
        assert_eq!("+8".parse::<RecordId>().unwrap(), RecordId::new(8));
    }

    #[test]
    fn record_id_rejects_non_numeric_and_non_positive() {
        assert!(matches!(
            "abc".parse::<RecordId>(),
            Err(RecordIdError::NotNumeric(_))
        ));
        assert!(matches!("".parse::<RecordId>(), Err(RecordIdError::NotNumeric(_))));
        assert_eq!("0".parse::<RecordId>(), Err(RecordIdError::NonPositive(0)));
        assert_eq!("-3".parse::<RecordId>(), Err(RecordIdError::NonPositive(-3)));
    }

    #[test]
    fn record_ref_accepts_bare_id_and_lookup() {
        let bare: RecordRef = serde_json::from_value(json!(12)).unwrap();
        assert_eq!(bare.id(), RecordId::new(12));
        assert_eq!(bare.name(), None);

        let lookup: RecordRef =
            serde_json::from_value(json!({ "Id": 5, "Name": "Acme Corp" })).unwrap();
        assert_eq!(lookup.id(), RecordId::new(5));
        assert_eq!(lookup.name(), Some("Acme Corp"));
    }

    #[test]
    fn deal_stage_parses_display_names() {
        assert_eq!("closed won".parse::<DealStage>().unwrap(), DealStage::ClosedWon);
        assert_eq!("Closed-Lost".parse::<DealStage>().unwrap(), DealStage::ClosedLost);
        assert!("Won".parse::<DealStage>().is_err());
        assert_eq!(
            serde_json::to_value(DealStage::ClosedWon).unwrap(),
            json!("Closed Won")
        );
    }

    #[test]
    fn deal_stage_order_is_pipeline_order() {
        assert_eq!(DealStage::Prospect.position(), 0);
        assert_eq!(DealStage::Negotiation.position(), 3);
        assert!(DealStage::ClosedLost.is_closed());
        assert!(!DealStage::Proposal.is_closed());
    }

    #[test]
    fn lifecycle_stage_default_is_lead() {
        assert_eq!(LifecycleStage::default().as_str(), "Lead");
        assert_eq!(
            "customer".parse::<LifecycleStage>().unwrap(),
            LifecycleStage::Customer
        );
    }
}
