//! View-model for the admin settings page.
//!
//! Activation starts the node, contexts and receivers fetches side by side and
//! stores each result as soon as it arrives. Fields stay `None` until their
//! fetch resolves, and stay `None` if it fails; reporting the failure is the
//! resource implementation's job.

use std::{collections::BTreeMap, sync::Arc};

use client_core::{
    AdminApiClient, ContextsResource, Localization, LocalizationSource, NodeResource,
    ReceiversResource, ResourceError, ResourceKind,
};
use serde::Serialize;
use shared::domain::{Context, NodeInfo, NodeSettings, Receiver};
use thiserror::Error;
use tokio::{sync::RwLock, task::JoinHandle};
use tracing::{debug, info, warn};

pub const ACTIVE_MARKER: &str = "active";

pub const WIZARD_STEPS: [&str; 3] = ["Node settings", "Contexts", "Receivers"];

/// Navigation highlight derived from the current path. Holds exactly one key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActiveMenu(BTreeMap<String, &'static str>);

impl ActiveMenu {
    pub fn from_path(path: &str) -> Self {
        let key = path.rsplit('/').next().unwrap_or_default();
        Self(BTreeMap::from([(key.to_string(), ACTIVE_MARKER)]))
    }

    pub fn get(&self, key: &str) -> Option<&'static str> {
        self.0.get(key).copied()
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdminSettingsView {
    pub node: Option<NodeSettings>,
    pub contexts: Option<Vec<Context>>,
    pub receivers: Option<Vec<Receiver>>,
}

/// Everything the page renders, captured at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct AdminSettingsSnapshot {
    pub active_menu: ActiveMenu,
    pub wizard_steps: Vec<String>,
    pub localization: Localization,
    #[serde(flatten)]
    pub view: AdminSettingsView,
}

#[derive(Clone)]
pub struct AdminResources {
    pub node: Arc<dyn NodeResource>,
    pub contexts: Arc<dyn ContextsResource>,
    pub receivers: Arc<dyn ReceiversResource>,
}

impl AdminResources {
    pub fn from_client(client: Arc<AdminApiClient>) -> Self {
        Self {
            node: client.clone(),
            contexts: client.clone(),
            receivers: client,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    pub contexts: usize,
}

#[derive(Debug, Error)]
pub enum SaveAllError {
    #[error("{} have not been loaded yet", .0.label())]
    NotLoaded(ResourceKind),
    #[error("saving node settings failed: {0}")]
    Node(#[source] ResourceError),
    #[error("saving contexts failed: {0}")]
    Contexts(#[source] ResourceError),
    #[error("saving node settings failed: {node}; saving contexts failed: {contexts}")]
    Both {
        node: ResourceError,
        contexts: ResourceError,
    },
}

pub struct AdminSettingsController {
    resources: AdminResources,
    active_menu: ActiveMenu,
    localization: Localization,
    view: Arc<RwLock<AdminSettingsView>>,
    pending: Vec<JoinHandle<()>>,
}

impl AdminSettingsController {
    /// Builds the controller for `path` and starts the three fetches.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn activate(
        path: &str,
        localization: &dyn LocalizationSource,
        resources: AdminResources,
    ) -> Self {
        let active_menu = ActiveMenu::from_path(path);
        debug!(path, ?active_menu, "activating admin settings");

        let view = Arc::new(RwLock::new(AdminSettingsView::default()));
        let pending = vec![
            spawn_node_fetch(resources.node.clone(), view.clone()),
            spawn_contexts_fetch(resources.contexts.clone(), view.clone()),
            spawn_receivers_fetch(resources.receivers.clone(), view.clone()),
        ];

        Self {
            resources,
            active_menu,
            localization: localization.localization(),
            view,
            pending,
        }
    }

    /// Waits for the activation fetches to finish, whatever their outcome.
    pub async fn settled(&mut self) {
        for handle in self.pending.drain(..) {
            if let Err(error) = handle.await {
                warn!(%error, "admin settings fetch task aborted");
            }
        }
    }

    pub fn active_menu(&self) -> &ActiveMenu {
        &self.active_menu
    }

    pub fn localization(&self) -> &Localization {
        &self.localization
    }

    pub fn node_info(&self) -> &NodeInfo {
        self.localization.node_info()
    }

    pub fn wizard_steps(&self) -> &'static [&'static str] {
        &WIZARD_STEPS
    }

    pub async fn view(&self) -> AdminSettingsView {
        self.view.read().await.clone()
    }

    pub async fn edit<R>(&self, f: impl FnOnce(&mut AdminSettingsView) -> R) -> R {
        let mut view = self.view.write().await;
        f(&mut *view)
    }

    pub async fn snapshot(&self) -> AdminSettingsSnapshot {
        AdminSettingsSnapshot {
            active_menu: self.active_menu.clone(),
            wizard_steps: WIZARD_STEPS
                .iter()
                .map(|step| self.localization.translate(step).to_string())
                .collect(),
            localization: self.localization.clone(),
            view: self.view().await,
        }
    }

    /// Persists node settings and contexts concurrently and resolves once both
    /// saves have finished. Receivers are not saved.
    ///
    /// Fails with [`SaveAllError::NotLoaded`] without issuing any request when
    /// either resource is still missing from the view. A saved resource is
    /// replaced by the server's copy only if it was not edited while the save
    /// was in flight; such edits are kept and need another save.
    pub async fn save_all(&self) -> Result<SaveSummary, SaveAllError> {
        let (node, contexts) = {
            let view = self.view.read().await;
            let node = view
                .node
                .clone()
                .ok_or(SaveAllError::NotLoaded(ResourceKind::Node))?;
            let contexts = view
                .contexts
                .clone()
                .ok_or(SaveAllError::NotLoaded(ResourceKind::Contexts))?;
            (node, contexts)
        };
        debug!(contexts = contexts.len(), "saving admin settings");

        let (node_result, contexts_result) = tokio::join!(
            self.resources.node.save(&node),
            self.resources.contexts.save(&contexts)
        );

        let mut view = self.view.write().await;
        match (node_result, contexts_result) {
            (Ok(stored_node), Ok(stored_contexts)) => {
                let summary = SaveSummary {
                    contexts: stored_contexts.len(),
                };
                store_echo(&mut view.node, &node, stored_node);
                store_echo(&mut view.contexts, &contexts, stored_contexts);
                info!(contexts = summary.contexts, "admin settings saved");
                Ok(summary)
            }
            (Err(node_error), Ok(stored_contexts)) => {
                store_echo(&mut view.contexts, &contexts, stored_contexts);
                Err(SaveAllError::Node(node_error))
            }
            (Ok(stored_node), Err(contexts_error)) => {
                store_echo(&mut view.node, &node, stored_node);
                Err(SaveAllError::Contexts(contexts_error))
            }
            (Err(node), Err(contexts)) => Err(SaveAllError::Both { node, contexts }),
        }
    }
}

/// Replaces `slot` with the server's copy unless it changed since `sent` was taken.
fn store_echo<T: PartialEq>(slot: &mut Option<T>, sent: &T, stored: T) {
    if slot.as_ref() == Some(sent) {
        *slot = Some(stored);
    } else {
        debug!("keeping edits made while saving");
    }
}

fn spawn_node_fetch(
    resource: Arc<dyn NodeResource>,
    view: Arc<RwLock<AdminSettingsView>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match resource.get().await {
            Ok(node) => view.write().await.node = Some(node),
            Err(error) => warn!(%error, "node settings unavailable"),
        }
    })
}

fn spawn_contexts_fetch(
    resource: Arc<dyn ContextsResource>,
    view: Arc<RwLock<AdminSettingsView>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match resource.query().await {
            Ok(contexts) => view.write().await.contexts = Some(contexts),
            Err(error) => warn!(%error, "contexts unavailable"),
        }
    })
}

fn spawn_receivers_fetch(
    resource: Arc<dyn ReceiversResource>,
    view: Arc<RwLock<AdminSettingsView>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match resource.query().await {
            Ok(receivers) => view.write().await.receivers = Some(receivers),
            Err(error) => warn!(%error, "receivers unavailable"),
        }
    })
}

#[cfg(test)]
#[path = "tests/admin_settings_tests.rs"]
mod tests;
