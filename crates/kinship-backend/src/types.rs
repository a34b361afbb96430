//! Request and response types for the aggregation entry point.

use kinship_core::Entity;
use serde::{Deserialize, Serialize};

/// Ask for the entities related (or unrelated) to a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRelatedRequest {
    /// Decimal id of the subject entity
    pub subject_id: String,

    /// `true` for confirmed friends, `false` for entities with no relationship at all
    #[serde(default = "default_show_related")]
    pub show_related: bool,
}

fn default_show_related() -> bool {
    true
}

impl FetchRelatedRequest {
    pub fn related(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            show_related: true,
        }
    }

    pub fn unrelated(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            show_related: false,
        }
    }
}

/// Entities in entity-source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRelatedResponse {
    pub entities: Vec<Entity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_to_related() {
        let request: FetchRelatedRequest = serde_json::from_str(r#"{"subject_id": "4"}"#).unwrap();
        assert_eq!(request, FetchRelatedRequest::related("4"));
    }

    #[test]
    fn test_response_serializes_entities() {
        let response = FetchRelatedResponse {
            entities: vec![Entity::new(3, "carol")],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["entities"][0]["id"], 3);
        assert_eq!(json["entities"][0]["user_name"], "carol");
    }
}
