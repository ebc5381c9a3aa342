use crate::store::{pod_binding, ExtendedResourceStore};
use crate::{KVStore, KeyEncoder, RedbBackend, Result, StorageError};
use async_trait::async_trait;
use ers_core::k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use ers_core::{
    ExtendedResource, ExtendedResourceClaim, GroupVersionKind, Resource, ResourceKey,
    ResourceVersion, EXTENSIONS_API_VERSION,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Resource store backed by a local key-value store.
///
/// Every write is version checked: an update whose resourceVersion differs
/// from the stored one is rejected with `StorageError::Conflict`.
pub struct KvResourceStore<S: KVStore = RedbBackend> {
    kv: Arc<S>,
}

impl<S: KVStore> KvResourceStore<S> {
    pub fn new(kv: Arc<S>) -> Self {
        Self { kv }
    }

    /// Read an object by key
    pub fn get<T: Resource>(&self, key: &ResourceKey) -> Result<Option<T>> {
        let storage_key = KeyEncoder::encode_resource_key(key);
        match self.kv.get(storage_key.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// Store a new object, assigning uid, creation time and the initial version
    pub fn create<T: Resource>(&self, mut object: T) -> Result<T> {
        let key = object_key(&object)?;
        validate(&object, &key)?;

        let storage_key = KeyEncoder::encode_resource_key(&key);
        let mut txn = self.kv.transaction()?;
        if txn.get(storage_key.as_bytes())?.is_some() {
            return Err(StorageError::already_exists(storage_key));
        }

        object.set_uid(Uuid::new_v4().to_string());
        object.metadata_mut().creation_timestamp = Some(Time(chrono::Utc::now()));
        object.set_resource_version(ResourceVersion::initial());

        let data = serde_json::to_vec(&object)?;
        txn.put(storage_key.as_bytes(), &data)?;
        txn.commit()?;

        info!("Created {}", key);
        Ok(object)
    }

    /// Replace an existing object.
    ///
    /// When the object carries a resourceVersion it must match the stored one.
    pub fn update<T: Resource>(&self, mut object: T) -> Result<T> {
        let key = object_key(&object)?;
        validate(&object, &key)?;

        let storage_key = KeyEncoder::encode_resource_key(&key);
        let mut txn = self.kv.transaction()?;
        let current: T = match txn.get(storage_key.as_bytes())? {
            Some(data) => serde_json::from_slice(&data)?,
            None => return Err(StorageError::key_not_found(storage_key)),
        };

        let stored_version = current
            .resource_version()
            .unwrap_or_else(ResourceVersion::initial);

        if let Some(expected) = object.resource_version() {
            if expected != stored_version {
                debug!(
                    "Rejecting stale write of {}: have {}, stored {}",
                    key, expected, stored_version
                );
                return Err(StorageError::conflict(
                    storage_key,
                    expected.0,
                    stored_version.0,
                ));
            }
        }

        if let Some(uid) = current.uid() {
            object.set_uid(uid);
        }
        object.metadata_mut().creation_timestamp = current.metadata().creation_timestamp.clone();
        object.set_resource_version(stored_version.next());

        let data = serde_json::to_vec(&object)?;
        txn.put(storage_key.as_bytes(), &data)?;
        txn.commit()?;

        debug!("Updated {} to version {:?}", key, object.resource_version());
        Ok(object)
    }

    /// Create the object, or overwrite it unconditionally when it already exists
    pub fn apply<T: Resource>(&self, mut object: T) -> Result<T> {
        let key = object_key(&object)?;
        if self.kv.exists(KeyEncoder::encode_resource_key(&key).as_bytes())? {
            object.metadata_mut().resource_version = None;
            self.update(object)
        } else {
            self.create(object)
        }
    }

    /// All objects of a kind, in key order
    pub fn list<T: Resource>(&self, api_version: &str, kind: &str, namespace: Option<&str>) -> Result<Vec<T>> {
        let prefix = KeyEncoder::encode_prefix(api_version, kind, namespace);
        self.kv
            .scan(prefix.as_bytes())?
            .iter()
            .map(|(_, data)| serde_json::from_slice(data).map_err(StorageError::from))
            .collect()
    }
}

fn object_key<T: Resource>(object: &T) -> Result<ResourceKey> {
    object
        .resource_key()
        .map_err(|e| StorageError::invalid_object(object.kind(), e.to_string()))
}

fn validate<T: Resource>(object: &T, key: &ResourceKey) -> Result<()> {
    object
        .validate()
        .map_err(|e| StorageError::invalid_object(key.to_string(), e.to_string()))
}

fn claim_key(namespace: &str, name: &str) -> ResourceKey {
    let gvk = GroupVersionKind::from_api_version_kind(EXTENSIONS_API_VERSION, "ExtendedResourceClaim");
    ResourceKey::new(gvk, namespace, name)
}

fn resource_key(name: &str) -> ResourceKey {
    let gvk = GroupVersionKind::from_api_version_kind(EXTENSIONS_API_VERSION, "ExtendedResource");
    ResourceKey::cluster_scoped(gvk, name)
}

#[async_trait]
impl<S: KVStore> ExtendedResourceStore for KvResourceStore<S> {
    async fn get_claim(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ExtendedResourceClaim>> {
        self.get(&claim_key(namespace, name))
    }

    async fn update_claim(&self, claim: &ExtendedResourceClaim) -> Result<ExtendedResourceClaim> {
        self.update(claim.clone())
    }

    async fn list_resources_by_kind(
        &self,
        raw_resource_name: &str,
    ) -> Result<Vec<ExtendedResource>> {
        let resources: Vec<ExtendedResource> =
            self.list(EXTENSIONS_API_VERSION, "ExtendedResource", None)?;
        Ok(resources
            .into_iter()
            .filter(|er| er.raw_resource_name() == raw_resource_name)
            .collect())
    }

    async fn get_resource(&self, name: &str) -> Result<Option<ExtendedResource>> {
        self.get(&resource_key(name))
    }

    async fn update_resource(&self, resource: &ExtendedResource) -> Result<ExtendedResource> {
        self.update(resource.clone())
    }

    async fn bind_pod(
        &self,
        namespace: &str,
        name: &str,
        uid: &str,
        node_name: &str,
    ) -> Result<()> {
        let binding = pod_binding(namespace, name, uid, node_name);
        self.create(binding)?;
        info!("Bound pod {}/{} to node {}", namespace, name, node_name);
        Ok(())
    }
}
