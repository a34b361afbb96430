//! Filter-to-SQL translation.
//!
//! Only clause shapes are formatted into the statement; every value is bound.

use std::collections::BTreeSet;

use crate::cursor::Cursor;
use crate::filter::{Field, FieldValue, FilterError, FilterSpec, Predicate, Record};
use crate::id::Identifier;
use crate::record::RelationshipStatus;
use rusqlite::types::Value;

/// Stored status values, including the legacy `blocked`.
const STORED_STATUSES: [&str; 4] = ["pending", "accepted", "rejected", "blocked"];

/// Accumulated `WHERE` clauses and their bound values.
#[derive(Debug, Default)]
pub(crate) struct SqlWhere {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl SqlWhere {
    /// Check and translate every predicate, then add the seek clause.
    pub(crate) fn build<T: Record>(
        filter: &FilterSpec,
        cursor: Cursor,
        translate: fn(&Predicate, &mut SqlWhere),
    ) -> Result<Self, FilterError> {
        let mut sql = Self::default();
        for predicate in filter.predicates() {
            T::check(predicate)?;
            translate(predicate, &mut sql);
        }
        if let Cursor::After(last_seen) = cursor {
            sql.push("id > ?", [Value::Integer(last_seen.get())]);
        }
        Ok(sql)
    }

    fn push(&mut self, clause: impl Into<String>, values: impl IntoIterator<Item = Value>) {
        self.clauses.push(clause.into());
        self.values.extend(values);
    }

    fn push_in(&mut self, column: &str, values: Vec<Value>) {
        let placeholders = vec!["?"; values.len()].join(", ");
        self.push(format!("{} IN ({})", column, placeholders), values);
    }

    /// `id IN` over one bound JSON array, whatever the set size; an empty set
    /// matches nothing.
    fn push_id_in(&mut self, ids: &BTreeSet<Identifier>) {
        if ids.is_empty() {
            self.clauses.push("0 = 1".to_string());
            return;
        }
        let array = ids
            .iter()
            .map(|id| id.get().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.push(
            "id IN (SELECT value FROM json_each(?))",
            [Value::Text(format!("[{}]", array))],
        );
    }

    fn push_not_in(&mut self, column: &str, values: Vec<Value>) {
        let placeholders = vec!["?"; values.len()].join(", ");
        self.push(format!("{} NOT IN ({})", column, placeholders), values);
    }

    /// The `WHERE ...` fragment, empty when unfiltered.
    pub(crate) fn clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub(crate) fn values(&self) -> &[Value] {
        &self.values
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

/// Translate a checked relationship predicate.
pub(crate) fn relationship_clause(predicate: &Predicate, sql: &mut SqlWhere) {
    match predicate {
        Predicate::FieldEquals {
            field,
            value: FieldValue::Id(id),
        } => {
            let column = match field {
                Field::SenderId => "sender_id",
                Field::ReceiverId => "receiver_id",
                _ => return,
            };
            sql.push(format!("{} = ?", column), [Value::Integer(id.get())]);
        }
        Predicate::IdIn(ids) => sql.push_id_in(ids),
        Predicate::StatusEquals(status) => match status {
            RelationshipStatus::Pending => sql.push("status = ?", [text("pending")]),
            RelationshipStatus::Accepted => sql.push("status = ?", [text("accepted")]),
            RelationshipStatus::Rejected => {
                sql.push_in("status", vec![text("rejected"), text("blocked")])
            }
            RelationshipStatus::Unknown => {
                sql.push_not_in("status", STORED_STATUSES.iter().map(|s| text(s)).collect())
            }
        },
        Predicate::FieldEquals { .. } => {}
    }
}

/// Translate a checked entity predicate.
pub(crate) fn entity_clause(predicate: &Predicate, sql: &mut SqlWhere) {
    match predicate {
        Predicate::FieldEquals {
            field,
            value: FieldValue::Text(value),
        } => match field {
            Field::FirstName | Field::LastName => {
                let wanted = value.trim();
                if wanted.is_empty() {
                    return;
                }
                let column = if *field == Field::FirstName {
                    "first_name"
                } else {
                    "last_name"
                };
                sql.push(format!("LOWER({}) = LOWER(?)", column), [text(wanted)]);
            }
            Field::UserName => sql.push("user_name = ?", [text(value)]),
            Field::Email => sql.push("email = ?", [text(value)]),
            Field::SenderId | Field::ReceiverId => {}
        },
        Predicate::IdIn(ids) => sql.push_id_in(ids),
        Predicate::FieldEquals { .. } | Predicate::StatusEquals(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Entity, RelationshipRecord};

    #[test]
    fn test_unfiltered_start_has_no_where() {
        let sql = SqlWhere::build::<Entity>(&FilterSpec::all(), Cursor::Start, entity_clause)
            .unwrap();
        assert_eq!(sql.clause(), "");
        assert!(sql.values().is_empty());
    }

    #[test]
    fn test_relationship_clauses_and_seek() {
        let filter = FilterSpec::all()
            .and(Predicate::sender_is(Identifier::new(3)))
            .and(Predicate::status_is(RelationshipStatus::Rejected));
        let sql = SqlWhere::build::<RelationshipRecord>(
            &filter,
            Cursor::After(Identifier::new(9)),
            relationship_clause,
        )
        .unwrap();

        assert_eq!(
            sql.clause(),
            " WHERE sender_id = ? AND status IN (?, ?) AND id > ?"
        );
        assert_eq!(sql.values().len(), 4);
    }

    #[test]
    fn test_empty_id_set_matches_nothing() {
        let filter = FilterSpec::all().and(Predicate::id_in([]));
        let sql = SqlWhere::build::<Entity>(&filter, Cursor::Start, entity_clause).unwrap();
        assert_eq!(sql.clause(), " WHERE 0 = 1");
    }

    #[test]
    fn test_id_set_binds_one_value() {
        let filter = FilterSpec::all().and(Predicate::id_in((1..=5).map(Identifier::new)));
        let sql = SqlWhere::build::<Entity>(&filter, Cursor::Start, entity_clause).unwrap();

        assert_eq!(sql.clause(), " WHERE id IN (SELECT value FROM json_each(?))");
        assert_eq!(sql.values(), &[Value::Text("[1,2,3,4,5]".to_string())]);
    }

    #[test]
    fn test_blank_name_filter_is_skipped() {
        let filter = FilterSpec::all().and(Predicate::text_equals(Field::FirstName, "  "));
        let sql = SqlWhere::build::<Entity>(&filter, Cursor::Start, entity_clause).unwrap();
        assert_eq!(sql.clause(), "");
    }

    #[test]
    fn test_unsupported_predicate_is_rejected() {
        let filter = FilterSpec::all().and(Predicate::text_equals(Field::Email, "a@b.c"));
        let result =
            SqlWhere::build::<RelationshipRecord>(&filter, Cursor::Start, relationship_clause);
        assert!(matches!(result, Err(FilterError::Unsupported { .. })));
    }
}
