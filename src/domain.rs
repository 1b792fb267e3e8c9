//! Wire-level DTOs shared by the store, the access facade and the HTTP layer.
//!
//! Update payloads follow partial-update semantics: a field that is absent from
//! the JSON body is left untouched. Nullable columns use a double `Option` so
//! an explicit `null` (clear the value) can be told apart from an absent field.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub(crate) fn double_option<'de, T, D>(
    deserializer: D,
) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDto {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: Value,
    pub tables: Value,
    pub created_date: String,
    pub modified_date: String,
    pub revision: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectCreate {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Option<Value>,
    #[serde(default)]
    pub tables: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub attributes: Option<Value>,
    #[serde(default)]
    pub tables: Option<Value>,
    /// Fencing token: when supplied, the update is rejected with a conflict
    /// if the stored revision has moved past this value.
    #[serde(default)]
    pub revision: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationDto {
    pub id: String,
    pub primary_object_id: String,
    pub relation_type: String,
    pub description: Option<String>,
    pub secondary_object_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationCreate {
    pub primary_object_id: String,
    pub relation_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub secondary_object_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationUpdate {
    #[serde(default)]
    pub primary_object_id: Option<String>,
    #[serde(default)]
    pub relation_type: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub secondary_object_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyDto {
    pub id: String,
    pub parent_object_id: Option<String>,
    pub child_object_ids: Vec<String>,
    pub level: i32,
    pub properties: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HierarchyCreate {
    #[serde(default)]
    pub parent_object_id: Option<String>,
    #[serde(default)]
    pub child_object_ids: Vec<String>,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub properties: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HierarchyUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub parent_object_id: Option<Option<String>>,
    #[serde(default)]
    pub child_object_ids: Option<Vec<String>>,
    #[serde(default)]
    pub level: Option<i32>,
    #[serde(default)]
    pub properties: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectTypeDto {
    pub id: i32,
    pub object_type: String,
    pub parent_id: Option<i32>,
    pub description: Option<String>,
    pub attributes: Value,
    pub tables: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectTypeCreate {
    pub object_type: String,
    #[serde(default)]
    pub parent_id: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Option<Value>,
    #[serde(default)]
    pub tables: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectTypeUpdate {
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub attributes: Option<Value>,
    #[serde(default)]
    pub tables: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationTypeDto {
    pub id: i32,
    pub name: String,
    pub primary_type: i32,
    pub secondary_type: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationTypeCreate {
    pub name: String,
    pub primary_type: i32,
    pub secondary_type: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationTypeUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primary_type: Option<i32>,
    #[serde(default)]
    pub secondary_type: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyTypeDto {
    pub id: i32,
    pub object_type: i32,
    pub inventory: Value,
    pub purchase: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HierarchyTypeCreate {
    pub object_type: i32,
    #[serde(default)]
    pub inventory: Option<Value>,
    #[serde(default)]
    pub purchase: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HierarchyTypeUpdate {
    #[serde(default)]
    pub object_type: Option<i32>,
    #[serde(default)]
    pub inventory: Option<Value>,
    #[serde(default)]
    pub purchase: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub user: Option<UserDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatSessionDto {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    pub created_date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub object: ObjectDto,
    pub relevance: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub query: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub message: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_null_description_are_distinct() {
        let absent: RelationUpdate = serde_json::from_str(r#"{}"#).unwrap();
        assert!(absent.description.is_none());

        let cleared: RelationUpdate = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: RelationUpdate = serde_json::from_str(r#"{"description": "x"}"#).unwrap();
        assert_eq!(set.description, Some(Some("x".to_string())));
    }

    #[test]
    fn object_kind_uses_type_on_the_wire() {
        let create: ObjectCreate =
            serde_json::from_str(r#"{"name":"n","description":"d","type":"Item"}"#).unwrap();
        assert_eq!(create.kind, "Item");
        assert!(create.attributes.is_none());
    }
}
