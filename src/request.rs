//! Traversal request payload.
//!
//! Every field is optional and parsed leniently: a field of the wrong shape is
//! treated as absent rather than failing the whole request.

use crate::error::TraverseError;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};

/// One keyword or several, each of which must match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchInput {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraverseRequest {
    #[serde(default, deserialize_with = "search_input")]
    pub search: Option<SearchInput>,
    #[serde(default, deserialize_with = "object")]
    pub filter: Option<Map<String, JsonValue>>,
    #[serde(default, deserialize_with = "object")]
    pub range: Option<Map<String, JsonValue>>,
    #[serde(default, deserialize_with = "object")]
    pub sort: Option<Map<String, JsonValue>>,
    #[serde(default, deserialize_with = "names")]
    pub autoload: Option<Vec<String>>,
    #[serde(default, deserialize_with = "names")]
    pub load_count: Option<Vec<String>>,
    #[serde(default, deserialize_with = "flag")]
    pub trashed: bool,
}

impl TraverseRequest {
    pub fn from_value(value: JsonValue) -> Result<Self, TraverseError> {
        if !value.is_object() {
            return Err(TraverseError::InvalidRequest(format!("expected an object, got {value}")));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json(source: &str) -> Result<Self, TraverseError> {
        Self::from_value(serde_json::from_str(source)?)
    }
}

fn search_input<'de, D>(deserializer: D) -> Result<Option<SearchInput>, D::Error>
where
    D: Deserializer<'de>,
{
    let input = match JsonValue::deserialize(deserializer)? {
        JsonValue::String(keyword) if !keyword.is_empty() => Some(SearchInput::One(keyword)),
        JsonValue::Array(items) => {
            let keywords: Vec<String> = items
                .into_iter()
                .filter_map(|item| match item {
                    JsonValue::String(keyword) if !keyword.is_empty() => Some(keyword),
                    _ => None,
                })
                .collect();
            (!keywords.is_empty()).then_some(SearchInput::Many(keywords))
        }
        _ => None,
    };
    Ok(input)
}

fn object<'de, D>(deserializer: D) -> Result<Option<Map<String, JsonValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Object(map) => Some(map),
        _ => None,
    })
}

fn names<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    JsonValue::String(name) => Some(name),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

/// `1`, `"1"` and `true` are set
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::Bool(b) => b,
        JsonValue::Number(n) => n.as_i64() == Some(1),
        JsonValue::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_request() {
        let request = TraverseRequest::from_value(json!({
            "search": "joe",
            "filter": { "status": "draft", "author.email": "{!null}" },
            "range": { "price": [10, 20] },
            "sort": { "title": "desc" },
            "autoload": ["author"],
            "loadCount": ["comments"],
            "trashed": 1
        }))
        .unwrap();

        assert_eq!(request.search, Some(SearchInput::One("joe".into())));
        let keys: Vec<&str> = request.filter.as_ref().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["status", "author.email"]);
        assert_eq!(request.load_count, Some(vec!["comments".to_string()]));
        assert!(request.trashed);
    }

    #[test]
    fn test_wrong_shapes_are_absent() {
        let request = TraverseRequest::from_value(json!({
            "search": 42,
            "filter": ["status"],
            "sort": "title",
            "autoload": "author",
            "trashed": 0
        }))
        .unwrap();
        assert_eq!(request, TraverseRequest::default());
    }

    #[test]
    fn test_search_keyword_list() {
        let request = TraverseRequest::from_json(r#"{"search": ["joe", "", 3, "doe"]}"#).unwrap();
        assert_eq!(
            request.search,
            Some(SearchInput::Many(vec!["joe".to_string(), "doe".to_string()]))
        );
    }

    #[test]
    fn test_trashed_flag_forms() {
        for value in [json!(1), json!("1"), json!(true)] {
            let request = TraverseRequest::from_value(json!({ "trashed": value })).unwrap();
            assert!(request.trashed);
        }
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        let err = TraverseRequest::from_value(json!(["search"])).unwrap_err();
        assert!(matches!(err, TraverseError::InvalidRequest(_)));
    }
}
