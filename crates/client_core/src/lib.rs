use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use shared::domain::{Context, NodeSettings, Receiver};

mod admin_client;
pub mod error;
pub mod localization;

pub use admin_client::{AdminApiClient, AdminApiConfig};
pub use error::ResourceError;
pub use localization::{Localization, LocalizationSource};

/// Which admin resource an operation or event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Node,
    Contexts,
    Receivers,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Contexts => "contexts",
            Self::Receivers => "receivers",
        }
    }

    /// Human-readable name used in messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Node => "node settings",
            Self::Contexts => "contexts",
            Self::Receivers => "receivers",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceOperation {
    Fetch,
    Save,
}

/// Outcome notifications published by a resource implementation. This is the
/// feedback channel callers rely on instead of inspecting individual results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    Loaded {
        resource: ResourceKind,
        items: usize,
    },
    Saved {
        resource: ResourceKind,
        items: usize,
    },
    Failed {
        resource: ResourceKind,
        operation: ResourceOperation,
        message: String,
    },
}

#[async_trait]
pub trait NodeResource: Send + Sync {
    async fn get(&self) -> Result<NodeSettings, ResourceError>;
    /// Persists the whole record and returns the stored version.
    async fn save(&self, node: &NodeSettings) -> Result<NodeSettings, ResourceError>;
}

#[async_trait]
pub trait ContextsResource: Send + Sync {
    async fn query(&self) -> Result<Vec<Context>, ResourceError>;
    async fn save(&self, contexts: &[Context]) -> Result<Vec<Context>, ResourceError>;
}

#[async_trait]
pub trait ReceiversResource: Send + Sync {
    async fn query(&self) -> Result<Vec<Receiver>, ResourceError>;
    async fn save(&self, receivers: &[Receiver]) -> Result<Vec<Receiver>, ResourceError>;
}
