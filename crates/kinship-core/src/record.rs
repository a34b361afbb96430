//! Records served by the two paginated sources.

use crate::id::{IdParseError, Identifier};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle state of a relationship record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipStatus {
    /// Proposed, awaiting the receiver
    Pending,
    /// Confirmed by the receiver
    Accepted,
    /// Declined by the receiver
    Rejected,
    /// Stored value not recognised by this build
    Unknown,
}

/// Error returned when parsing a status supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported status value '{0}'. Valid values: pending, accepted, rejected")]
pub struct StatusParseError(pub String);

impl RelationshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Unknown => "unknown",
        }
    }

    /// Interpret a value read back from storage. Never fails.
    pub fn from_stored(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "pending" => Self::Pending,
            "accepted" => Self::Accepted,
            // legacy value, folded into rejected
            "rejected" | "blocked" => Self::Rejected,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

/// A directed relationship between two entities.
///
/// Party ids are carried exactly as the upstream transported them; they are
/// parsed by whoever consumes the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    /// Record id (the pagination key)
    pub id: Identifier,

    /// Entity that proposed the relationship
    pub sender_id: String,

    /// Entity the relationship was proposed to
    pub receiver_id: String,

    pub status: RelationshipStatus,

    /// Creation time (Unix epoch seconds)
    pub created_at: i64,
}

impl RelationshipRecord {
    /// Create a record with a zero timestamp.
    pub fn new(
        id: impl Into<Identifier>,
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        status: RelationshipStatus,
    ) -> Self {
        Self {
            id: id.into(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            status,
            created_at: 0,
        }
    }

    pub fn sender(&self) -> Result<Identifier, IdParseError> {
        Identifier::parse(&self.sender_id)
    }

    pub fn receiver(&self) -> Result<Identifier, IdParseError> {
        Identifier::parse(&self.receiver_id)
    }
}

/// The aggregatable record (a user profile).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: Identifier,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,

    /// Creation time (Unix epoch seconds)
    pub created_at: i64,
}

impl Entity {
    /// Create an entity with only an id and user name set.
    pub fn new(id: impl Into<Identifier>, user_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            first_name: String::new(),
            last_name: String::new(),
            user_name: user_name.into(),
            email: String::new(),
            created_at: 0,
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}

/// Fields for creating an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntity {
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
}

/// Relationship fields that may be named in an update mask.
pub const UPDATABLE_RELATIONSHIP_FIELDS: &[&str] = &["status"];

/// The set of field paths an update is allowed to touch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMask {
    pub paths: Vec<String>,
}

impl FieldMask {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Check the mask is non-empty and only names `allowed` paths.
    pub fn validate(&self, allowed: &[&str]) -> Result<(), String> {
        if self.paths.is_empty() {
            return Err("at least one field must be specified in field mask".to_string());
        }
        match self.paths.iter().find(|p| !allowed.contains(&p.as_str())) {
            Some(path) => Err(format!("field {} cannot be updated", path)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_str() {
        assert_eq!("accepted".parse(), Ok(RelationshipStatus::Accepted));
        assert_eq!("PENDING".parse(), Ok(RelationshipStatus::Pending));
        assert!("unknown".parse::<RelationshipStatus>().is_err());
        assert!("blocked".parse::<RelationshipStatus>().is_err());
    }

    #[test]
    fn test_status_from_stored() {
        assert_eq!(RelationshipStatus::from_stored("blocked"), RelationshipStatus::Rejected);
        assert_eq!(RelationshipStatus::from_stored("Accepted"), RelationshipStatus::Accepted);
        assert_eq!(RelationshipStatus::from_stored("???"), RelationshipStatus::Unknown);
    }

    #[test]
    fn test_record_party_parsing() {
        let record = RelationshipRecord::new(1, "10", "x", RelationshipStatus::Pending);
        assert_eq!(record.sender().unwrap(), Identifier::new(10));
        assert!(record.receiver().is_err());
    }

    #[test]
    fn test_field_mask_validation() {
        let allowed = UPDATABLE_RELATIONSHIP_FIELDS;
        assert!(FieldMask::new(["status"]).validate(allowed).is_ok());

        let err = FieldMask::default().validate(allowed).unwrap_err();
        assert!(err.contains("at least one field"));

        let err = FieldMask::new(["status", "sender_id"]).validate(allowed).unwrap_err();
        assert_eq!(err, "field sender_id cannot be updated");
    }
}
