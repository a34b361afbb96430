//! Typed filter specifications.
//!
//! A [`FilterSpec`] is an ordered list of [`Predicate`]s combined with logical
//! AND. The variant set is closed; every source pattern-matches over it and
//! rejects the predicates it cannot evaluate.

use crate::id::Identifier;
use crate::record::{Entity, RelationshipRecord, RelationshipStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Fields that may appear in an equality predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    SenderId,
    ReceiverId,
    FirstName,
    LastName,
    UserName,
    Email,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SenderId => "sender_id",
            Self::ReceiverId => "receiver_id",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::UserName => "user_name",
            Self::Email => "email",
        }
    }
}

/// Right-hand side of an equality predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Id(Identifier),
    Text(String),
}

/// A single filter predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Equality on a named field
    FieldEquals { field: Field, value: FieldValue },
    /// The record's own id is one of these
    IdIn(BTreeSet<Identifier>),
    /// Relationship status equality
    StatusEquals(RelationshipStatus),
}

impl Predicate {
    pub fn sender_is(id: Identifier) -> Self {
        Self::FieldEquals {
            field: Field::SenderId,
            value: FieldValue::Id(id),
        }
    }

    pub fn receiver_is(id: Identifier) -> Self {
        Self::FieldEquals {
            field: Field::ReceiverId,
            value: FieldValue::Id(id),
        }
    }

    pub fn text_equals(field: Field, value: impl Into<String>) -> Self {
        Self::FieldEquals {
            field,
            value: FieldValue::Text(value.into()),
        }
    }

    pub fn id_in(ids: impl IntoIterator<Item = Identifier>) -> Self {
        Self::IdIn(ids.into_iter().collect())
    }

    pub fn status_is(status: RelationshipStatus) -> Self {
        Self::StatusEquals(status)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldEquals { field, .. } => write!(f, "{} equality", field.as_str()),
            Self::IdIn(ids) => write!(f, "id in ({} ids)", ids.len()),
            Self::StatusEquals(status) => write!(f, "status = {}", status),
        }
    }
}

/// Conjunction of predicates. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    predicates: Vec<Predicate>,
}

impl FilterSpec {
    /// Matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl FromIterator<Predicate> for FilterSpec {
    fn from_iter<I: IntoIterator<Item = Predicate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Errors raised when a filter cannot be evaluated by a source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("predicate '{predicate}' is not supported by the {source_name} source")]
    Unsupported {
        predicate: String,
        source_name: &'static str,
    },

    #[error("filter on '{field}' expects {expected} value")]
    ValueType {
        field: &'static str,
        expected: &'static str,
    },
}

impl FilterError {
    fn unsupported(predicate: &Predicate, source_name: &'static str) -> Self {
        Self::Unsupported {
            predicate: predicate.to_string(),
            source_name,
        }
    }
}

/// A record that can be listed with seek pagination and filtered in memory.
pub trait Record: Clone + Send + Sync + 'static {
    /// Source name used in error messages and logs.
    const SOURCE: &'static str;

    /// The pagination key (ascending total order).
    fn key(&self) -> Identifier;

    /// Reject predicates this record kind cannot evaluate.
    fn check(predicate: &Predicate) -> Result<(), FilterError>;

    /// Evaluate an already-checked predicate.
    fn matches(&self, predicate: &Predicate) -> bool;

    /// Check every predicate, then evaluate the conjunction.
    fn matches_all(&self, filter: &FilterSpec) -> Result<bool, FilterError> {
        for predicate in filter.predicates() {
            Self::check(predicate)?;
        }
        Ok(filter.predicates().iter().all(|p| self.matches(p)))
    }
}

/// Case-insensitive name comparison; a blank filter value is a no-op.
pub fn name_matches(actual: &str, wanted: &str) -> bool {
    let wanted = wanted.trim();
    wanted.is_empty() || actual.to_lowercase() == wanted.to_lowercase()
}

impl Record for RelationshipRecord {
    const SOURCE: &'static str = "relationship";

    fn key(&self) -> Identifier {
        self.id
    }

    fn check(predicate: &Predicate) -> Result<(), FilterError> {
        match predicate {
            Predicate::FieldEquals {
                field: field @ (Field::SenderId | Field::ReceiverId),
                value,
            } => match value {
                FieldValue::Id(_) => Ok(()),
                FieldValue::Text(_) => Err(FilterError::ValueType {
                    field: field.as_str(),
                    expected: "an identifier",
                }),
            },
            Predicate::IdIn(_) | Predicate::StatusEquals(_) => Ok(()),
            other => Err(FilterError::unsupported(other, Self::SOURCE)),
        }
    }

    fn matches(&self, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::FieldEquals {
                field: Field::SenderId,
                value: FieldValue::Id(id),
            } => self.sender().ok() == Some(*id),
            Predicate::FieldEquals {
                field: Field::ReceiverId,
                value: FieldValue::Id(id),
            } => self.receiver().ok() == Some(*id),
            Predicate::IdIn(ids) => ids.contains(&self.id),
            Predicate::StatusEquals(status) => self.status == *status,
            _ => false,
        }
    }
}

impl Record for Entity {
    const SOURCE: &'static str = "entity";

    fn key(&self) -> Identifier {
        self.id
    }

    fn check(predicate: &Predicate) -> Result<(), FilterError> {
        match predicate {
            Predicate::FieldEquals {
                field: field @ (Field::FirstName | Field::LastName | Field::UserName | Field::Email),
                value,
            } => match value {
                FieldValue::Text(_) => Ok(()),
                FieldValue::Id(_) => Err(FilterError::ValueType {
                    field: field.as_str(),
                    expected: "a text",
                }),
            },
            Predicate::IdIn(_) => Ok(()),
            other => Err(FilterError::unsupported(other, Self::SOURCE)),
        }
    }

    fn matches(&self, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::FieldEquals {
                field,
                value: FieldValue::Text(wanted),
            } => match field {
                Field::FirstName => name_matches(&self.first_name, wanted),
                Field::LastName => name_matches(&self.last_name, wanted),
                Field::UserName => self.user_name == *wanted,
                Field::Email => self.email == *wanted,
                _ => false,
            },
            Predicate::IdIn(ids) => ids.contains(&self.id),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(id: i64, sender: &str, receiver: &str, status: RelationshipStatus) -> RelationshipRecord {
        RelationshipRecord::new(id, sender, receiver, status)
    }

    #[test]
    fn test_empty_spec_matches_everything() {
        let record = rel(1, "1", "2", RelationshipStatus::Pending);
        assert!(record.matches_all(&FilterSpec::all()).unwrap());
    }

    #[test]
    fn test_relationship_conjunction() {
        let filter = FilterSpec::all()
            .and(Predicate::sender_is(Identifier::new(1)))
            .and(Predicate::status_is(RelationshipStatus::Accepted));

        assert!(rel(1, "1", "2", RelationshipStatus::Accepted).matches_all(&filter).unwrap());
        assert!(!rel(2, "1", "2", RelationshipStatus::Pending).matches_all(&filter).unwrap());
        assert!(!rel(3, "3", "1", RelationshipStatus::Accepted).matches_all(&filter).unwrap());
    }

    #[test]
    fn test_predicate_order_does_not_matter() {
        let a = Predicate::receiver_is(Identifier::new(1));
        let b = Predicate::status_is(RelationshipStatus::Accepted);
        let forward = FilterSpec::new(vec![a.clone(), b.clone()]);
        let backward = FilterSpec::new(vec![b, a]);

        for record in [
            rel(1, "2", "1", RelationshipStatus::Accepted),
            rel(2, "2", "1", RelationshipStatus::Rejected),
            rel(3, "1", "2", RelationshipStatus::Accepted),
        ] {
            assert_eq!(
                record.matches_all(&forward).unwrap(),
                record.matches_all(&backward).unwrap()
            );
        }
    }

    #[test]
    fn test_malformed_party_never_matches() {
        let record = rel(1, "not-a-number", "2", RelationshipStatus::Accepted);
        let filter = FilterSpec::all().and(Predicate::sender_is(Identifier::new(0)));
        assert!(!record.matches_all(&filter).unwrap());
    }

    #[test]
    fn test_entity_rejects_relationship_predicates() {
        let entity = Entity::new(1, "alice");
        let filter = FilterSpec::all().and(Predicate::status_is(RelationshipStatus::Accepted));
        let err = entity.matches_all(&filter).unwrap_err();
        assert!(err.to_string().contains("entity source"));
    }

    #[test]
    fn test_relationship_rejects_text_sender() {
        let filter = FilterSpec::all().and(Predicate::text_equals(Field::SenderId, "1"));
        let err = rel(1, "1", "2", RelationshipStatus::Pending)
            .matches_all(&filter)
            .unwrap_err();
        assert!(matches!(err, FilterError::ValueType { field: "sender_id", .. }));
    }

    #[test]
    fn test_entity_name_filters() {
        let entity = Entity::new(7, "ada").with_name("Ada", "Lovelace");

        let filter = FilterSpec::all().and(Predicate::text_equals(Field::FirstName, " ada "));
        assert!(entity.matches_all(&filter).unwrap());

        let blank = FilterSpec::all().and(Predicate::text_equals(Field::LastName, "   "));
        assert!(entity.matches_all(&blank).unwrap());

        let ids = FilterSpec::all().and(Predicate::id_in([Identifier::new(8)]));
        assert!(!entity.matches_all(&ids).unwrap());
    }
}
