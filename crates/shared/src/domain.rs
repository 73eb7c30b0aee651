use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Backend identifiers come through as either integers or opaque strings; both
/// are echoed back unchanged on save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ResourceId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub ResourceId);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(ResourceId::Int(value))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(ResourceId::from(value))
            }
        }
    };
}

id_newtype!(ContextId);
id_newtype!(ReceiverId);

fn str_attribute<'a>(extra: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    extra.get(key).and_then(Value::as_str)
}

/// Node-wide configuration. Resubmitted wholesale on save: every attribute
/// other than `name` stays in `extra` exactly as the backend sent it, so
/// `null` and empty values survive the round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSettings {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeSettings {
    pub fn description(&self) -> Option<&str> {
        str_attribute(&self.extra, "description")
    }

    pub fn hostname(&self) -> Option<&str> {
        str_attribute(&self.extra, "hostname")
    }

    pub fn default_language(&self) -> Option<&str> {
        str_attribute(&self.extra, "default_language")
    }

    pub fn languages_enabled(&self) -> Vec<&str> {
        self.extra
            .get("languages_enabled")
            .and_then(Value::as_array)
            .map(|languages| languages.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn maximum_filesize(&self) -> Option<u64> {
        self.extra.get("maximum_filesize").and_then(Value::as_u64)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.insert(key.into(), value.into());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub id: ContextId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Context {
    pub fn new(id: impl Into<ContextId>) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        str_attribute(&self.extra, "name")
    }

    pub fn description(&self) -> Option<&str> {
        str_attribute(&self.extra, "description")
    }

    /// Assigned receivers; entries that are not valid ids are skipped.
    pub fn receivers(&self) -> Vec<ReceiverId> {
        self.extra
            .get("receivers")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| serde_json::from_value(id.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.insert(key.into(), value.into());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    pub id: ReceiverId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Receiver {
    pub fn new(id: impl Into<ReceiverId>) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        str_attribute(&self.extra, "name")
    }

    pub fn description(&self) -> Option<&str> {
        str_attribute(&self.extra, "description")
    }
}

/// Public node identity exposed through localization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn node_settings_keeps_unmodeled_fields() {
        let raw = json!({
            "name": "srv1",
            "tor2web_admin": false,
            "footer": "hello",
        });
        let node: NodeSettings = serde_json::from_value(raw.clone()).expect("decode");
        assert_eq!(node.name, "srv1");
        assert_eq!(node.extra.get("footer"), Some(&json!("hello")));
        assert_eq!(serde_json::to_value(&node).expect("encode"), raw);
    }

    #[test]
    fn context_ids_accept_integers_and_strings() {
        let numeric: Context = serde_json::from_value(json!({"id": 1})).expect("numeric");
        let text: Context =
            serde_json::from_value(json!({"id": "c0ffee"})).expect("text");

        assert_eq!(numeric.id, ContextId::from(1));
        assert_eq!(text.id.to_string(), "c0ffee");
        assert_eq!(
            serde_json::to_value(&numeric).expect("encode"),
            json!({"id": 1})
        );
    }

    #[test]
    fn context_decodes_mixed_receiver_ids() {
        let context: Context = serde_json::from_value(json!({
            "id": "ctx",
            "name": "Default",
            "receivers": ["r1", 7]
        }))
        .expect("decode");
        assert_eq!(context.name(), Some("Default"));
        assert_eq!(
            context.receivers(),
            vec![ReceiverId::from("r1"), ReceiverId::from(7)]
        );
    }

    #[test]
    fn null_and_empty_attributes_are_resubmitted() {
        let node_raw = json!({
            "name": "srv1",
            "description": null,
            "languages_enabled": [],
            "hostname": null,
        });
        let node: NodeSettings = serde_json::from_value(node_raw.clone()).expect("node");
        assert_eq!(node.hostname(), None);
        assert!(node.languages_enabled().is_empty());
        assert_eq!(serde_json::to_value(&node).expect("encode node"), node_raw);

        let context_raw = json!({"id": "c1", "name": "ctx", "receivers": []});
        let context: Context = serde_json::from_value(context_raw.clone()).expect("context");
        assert!(context.receivers().is_empty());
        assert_eq!(
            serde_json::to_value(&context).expect("encode context"),
            context_raw
        );

        let receiver_raw = json!({"id": 3, "name": null, "pgp_key_public": ""});
        let receiver: Receiver = serde_json::from_value(receiver_raw.clone()).expect("receiver");
        assert_eq!(
            serde_json::to_value(&receiver).expect("encode receiver"),
            receiver_raw
        );
    }
}
