use std::collections::BTreeMap;

use serde::Serialize;
use shared::domain::NodeInfo;

/// Snapshot of the active language bundle and the public node identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Localization {
    pub language: String,
    pub strings: BTreeMap<String, String>,
    pub node_info: NodeInfo,
}

impl Localization {
    pub fn new(language: impl Into<String>, node_info: NodeInfo) -> Self {
        Self {
            language: language.into(),
            strings: BTreeMap::new(),
            node_info,
        }
    }

    pub fn with_strings(
        mut self,
        strings: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.strings.extend(strings);
        self
    }

    pub fn node_info(&self) -> &NodeInfo {
        &self.node_info
    }

    /// Looks up `key`, falling back to the key itself when untranslated.
    pub fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        self.strings.get(key).map(String::as_str).unwrap_or(key)
    }
}

pub trait LocalizationSource: Send + Sync {
    fn localization(&self) -> Localization;
}

impl LocalizationSource for Localization {
    fn localization(&self) -> Localization {
        self.clone()
    }
}
