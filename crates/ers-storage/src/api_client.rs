use crate::store::{pod_binding, ExtendedResourceStore};
use crate::{Result, StorageError};
use async_trait::async_trait;
use ers_core::{
    ExtendedResource, ExtendedResourceClaim, GroupVersionKind, Resource, ResourceKey,
    EXTENSIONS_API_VERSION,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

/// Resource store that talks to a Kubernetes-compatible API server
pub struct ApiClient {
    base_url: String,
    client: Client,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_object<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self.url(path);
        debug!("GET {}", url);

        let resp = self.authorize(self.client.get(&url)).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = check_status(resp, "GET", path).await?;
        Ok(Some(resp.json::<T>().await?))
    }

    async fn put_object<T: Resource + DeserializeOwned>(&self, object: &T) -> Result<T> {
        let key = object
            .resource_key()
            .map_err(|e| StorageError::invalid_object(object.kind(), e.to_string()))?;
        let path = key.api_path();
        let url = self.url(&path);
        debug!("PUT {}", url);

        let resp = self.authorize(self.client.put(&url).json(object)).send().await?;
        if resp.status() == StatusCode::CONFLICT {
            let expected = object
                .resource_version()
                .map(|v| v.0)
                .unwrap_or_default();
            return Err(StorageError::conflict(path, expected, "newer"));
        }
        let resp = check_status(resp, "PUT", &path).await?;
        Ok(resp.json::<T>().await?)
    }
}

async fn check_status(resp: Response, method: &str, path: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(StorageError::request_error(format!(
        "{} {} failed with status {}: {}",
        method, path, status, body
    )))
}

fn claim_key(namespace: &str, name: &str) -> ResourceKey {
    let gvk = GroupVersionKind::from_api_version_kind(EXTENSIONS_API_VERSION, "ExtendedResourceClaim");
    ResourceKey::new(gvk, namespace, name)
}

fn resource_key(name: &str) -> ResourceKey {
    let gvk = GroupVersionKind::from_api_version_kind(EXTENSIONS_API_VERSION, "ExtendedResource");
    ResourceKey::cluster_scoped(gvk, name)
}

fn binding_path(namespace: &str, name: &str) -> String {
    format!("/api/v1/namespaces/{}/pods/{}/binding", namespace, name)
}

#[async_trait]
impl ExtendedResourceStore for ApiClient {
    async fn get_claim(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ExtendedResourceClaim>> {
        self.get_object(&claim_key(namespace, name).api_path()).await
    }

    async fn update_claim(&self, claim: &ExtendedResourceClaim) -> Result<ExtendedResourceClaim> {
        self.put_object(claim).await
    }

    /// The API server has no field selector for spec.rawResourceName, so the
    /// full list is fetched and filtered here.
    async fn list_resources_by_kind(
        &self,
        raw_resource_name: &str,
    ) -> Result<Vec<ExtendedResource>> {
        let path = resource_key("").collection_path();
        let list: Option<ObjectList<ExtendedResource>> = self.get_object(&path).await?;

        Ok(list
            .map(|list| list.items)
            .unwrap_or_default()
            .into_iter()
            .filter(|er| er.raw_resource_name() == raw_resource_name)
            .collect())
    }

    async fn get_resource(&self, name: &str) -> Result<Option<ExtendedResource>> {
        self.get_object(&resource_key(name).api_path()).await
    }

    async fn update_resource(&self, resource: &ExtendedResource) -> Result<ExtendedResource> {
        self.put_object(resource).await
    }

    async fn bind_pod(
        &self,
        namespace: &str,
        name: &str,
        uid: &str,
        node_name: &str,
    ) -> Result<()> {
        let path = binding_path(namespace, name);
        let url = self.url(&path);
        debug!("POST {}", url);

        let binding = pod_binding(namespace, name, uid, node_name);
        let resp = self
            .authorize(self.client.post(&url).json(&binding))
            .send()
            .await?;
        if resp.status() == StatusCode::CONFLICT {
            return Err(StorageError::already_exists(path));
        }
        check_status(resp, "POST", &path).await?;
        Ok(())
    }
}
