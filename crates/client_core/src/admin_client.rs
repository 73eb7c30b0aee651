use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Context, NodeSettings, Receiver},
    error::ApiException,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    ContextsResource, NodeResource, ReceiversResource, ResourceError, ResourceEvent, ResourceKind,
    ResourceOperation,
};

const SESSION_HEADER: &str = "X-Session";
const LANGUAGE_HEADER: &str = "X-Language";
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct AdminApiConfig {
    pub base_url: String,
    pub session: Option<String>,
    pub language: Option<String>,
    pub timeout: Duration,
}

impl AdminApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session: None,
            language: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP-backed implementation of the node, contexts and receivers resources.
pub struct AdminApiClient {
    http: Client,
    base_url: Url,
    session: Option<String>,
    language: Option<String>,
    events: broadcast::Sender<ResourceEvent>,
}

impl AdminApiClient {
    pub fn new(config: AdminApiConfig) -> Result<Self, ResourceError> {
        let base_url = parse_base_url(&config.base_url)?;
        let http = Client::builder().timeout(config.timeout).build()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            http,
            base_url,
            session: config.session,
            language: config.language,
            events,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ResourceEvent> {
        self.events.subscribe()
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // parse_base_url rejects cannot-be-a-base urls, so segments are always available.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "admin"]).extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self.http.request(method, url);
        if let Some(session) = &self.session {
            builder = builder.header(SESSION_HEADER, session);
        }
        if let Some(language) = &self.language {
            builder = builder.header(LANGUAGE_HEADER, language);
        }
        builder
    }

    async fn send<T: DeserializeOwned>(
        &self,
        resource: ResourceKind,
        builder: RequestBuilder,
    ) -> Result<T, ResourceError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiException::from_body(status.as_u16(), &body).into());
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ResourceError::Decode { resource, source })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        resource: ResourceKind,
        segments: &[&str],
    ) -> Result<T, ResourceError> {
        let url = self.endpoint(segments);
        debug!(%resource, %url, "admin fetch");
        self.send(resource, self.request(Method::GET, url)).await
    }

    async fn put<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        resource: ResourceKind,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ResourceError> {
        let url = self.endpoint(segments);
        debug!(%resource, %url, "admin update");
        self.send(resource, self.request(Method::PUT, url).json(body))
            .await
    }

    fn report<T>(
        &self,
        resource: ResourceKind,
        operation: ResourceOperation,
        result: &Result<T, ResourceError>,
        items: impl FnOnce(&T) -> usize,
    ) {
        let event = match result {
            Ok(value) => {
                let items = items(value);
                info!(%resource, ?operation, items, "admin resource ok");
                match operation {
                    ResourceOperation::Fetch => ResourceEvent::Loaded { resource, items },
                    ResourceOperation::Save => ResourceEvent::Saved { resource, items },
                }
            }
            Err(error) => {
                warn!(%resource, ?operation, %error, "admin resource failed");
                ResourceEvent::Failed {
                    resource,
                    operation,
                    message: error.to_string(),
                }
            }
        };
        // No subscribers is fine; nobody is rendering notifications.
        let _ = self.events.send(event);
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ResourceError> {
    let invalid = |reason: String| ResourceError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https".to_string()));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("url cannot be used as a base".to_string()));
    }
    Ok(url)
}

#[async_trait]
impl NodeResource for AdminApiClient {
    async fn get(&self) -> Result<NodeSettings, ResourceError> {
        let result = self.fetch(ResourceKind::Node, &["node"]).await;
        self.report(ResourceKind::Node, ResourceOperation::Fetch, &result, |_| 1);
        result
    }

    async fn save(&self, node: &NodeSettings) -> Result<NodeSettings, ResourceError> {
        let result = self.put(ResourceKind::Node, &["node"], node).await;
        self.report(ResourceKind::Node, ResourceOperation::Save, &result, |_| 1);
        result
    }
}

#[async_trait]
impl ContextsResource for AdminApiClient {
    async fn query(&self) -> Result<Vec<Context>, ResourceError> {
        let result = self.fetch(ResourceKind::Contexts, &["contexts"]).await;
        self.report(
            ResourceKind::Contexts,
            ResourceOperation::Fetch,
            &result,
            Vec::len,
        );
        result
    }

    async fn save(&self, contexts: &[Context]) -> Result<Vec<Context>, ResourceError> {
        let result = try_join_all(contexts.iter().map(|context| {
            let id = context.id.to_string();
            async move {
                self.put(ResourceKind::Contexts, &["contexts", id.as_str()], context)
                    .await
            }
        }))
        .await;
        self.report(
            ResourceKind::Contexts,
            ResourceOperation::Save,
            &result,
            Vec::len,
        );
        result
    }
}

#[async_trait]
impl ReceiversResource for AdminApiClient {
    async fn query(&self) -> Result<Vec<Receiver>, ResourceError> {
        let result = self.fetch(ResourceKind::Receivers, &["receivers"]).await;
        self.report(
            ResourceKind::Receivers,
            ResourceOperation::Fetch,
            &result,
            Vec::len,
        );
        result
    }

    async fn save(&self, receivers: &[Receiver]) -> Result<Vec<Receiver>, ResourceError> {
        let result = try_join_all(receivers.iter().map(|receiver| {
            let id = receiver.id.to_string();
            async move {
                self.put(ResourceKind::Receivers, &["receivers", id.as_str()], receiver)
                    .await
            }
        }))
        .await;
        self.report(
            ResourceKind::Receivers,
            ResourceOperation::Save,
            &result,
            Vec::len,
        );
        result
    }
}

#[cfg(test)]
#[path = "tests/admin_client_tests.rs"]
mod tests;
