/*!
 * Binary object store for uploaded images and synthesized audio.
 *
 * Objects are addressed by a `ScopedKey` of the form
 * `{owner}/{unix_millis}-{uuid}.{ext}`, so two users can never collide and
 * one user never overwrites an earlier object. `put` returns the public
 * reference the caller persists; `get` accepts that reference back.
 */

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use parking_lot::RwLock;

use crate::errors::StoreError;

/// Collision-resistant object key namespaced by owner
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedKey(String);

impl ScopedKey {
    /// Generate a fresh key for an object of `owner` with the given extension
    ///
    /// `owner` is used verbatim and must come from a validated `Identity`;
    /// only the extension is sanitized.
    pub fn generate(owner: &str, extension: &str) -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let extension = sanitize_segment(extension.trim_start_matches('.'));
        let extension = if extension.is_empty() { "bin".to_string() } else { extension.to_lowercase() };

        Self(format!(
            "{}/{}-{}.{}",
            owner,
            millis,
            uuid::Uuid::new_v4(),
            extension
        ))
    }

    /// Key for a file named `filename`, keeping its extension
    pub fn for_filename(owner: &str, filename: &str) -> Self {
        let extension = Path::new(filename)
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::generate(owner, &extension)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Owner segment of the key
    pub fn owner(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }
}

impl fmt::Display for ScopedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keep an extension to `[A-Za-z0-9_-]`, everything else becomes `_`
fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Binary object store contract
#[async_trait]
pub trait BlobStore: Send + Sync + Debug {
    /// Persist `bytes` under `key` and return its public reference
    ///
    /// Either the whole object is stored or the call fails; a failed put
    /// leaves nothing readable behind.
    async fn put(&self, key: &ScopedKey, bytes: Bytes, content_type: &str) -> Result<String, StoreError>;

    /// Read back an object by the reference `put` returned
    async fn get(&self, reference: &str) -> Result<Bytes, StoreError>;
}

/// Join a base URL (or prefix) and a key with exactly one slash
fn public_reference(base: &str, key: &ScopedKey) -> String {
    if base.is_empty() {
        key.as_str().to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), key)
    }
}

/// Recover the key from a reference produced with `base`
fn key_from_reference<'a>(base: &str, reference: &'a str) -> &'a str {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return reference;
    }
    reference
        .strip_prefix(base)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(reference)
}

/// Object store on the local filesystem
#[derive(Debug, Clone)]
pub struct FileSystemBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FileSystemBlobStore {
    /// Objects land under `root`; references are `{public_base_url}/{key}`,
    /// or the bare key when no base URL is configured
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key under the root, refusing anything that escapes it
    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));

        if key.is_empty() || escapes {
            return Err(StoreError::Object(format!("Invalid object key: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FileSystemBlobStore {
    async fn put(&self, key: &ScopedKey, bytes: Bytes, content_type: &str) -> Result<String, StoreError> {
        let path = self.resolve(key.as_str())?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Object(format!("Failed to create {:?}: {}", parent, e)))?;
        }

        // Write to a sibling temp file first so readers never see a partial object
        let staging = path.with_extension("partial");
        tokio::fs::write(&staging, &bytes)
            .await
            .map_err(|e| StoreError::Object(format!("Failed to write {:?}: {}", staging, e)))?;
        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(StoreError::Object(format!("Failed to move {:?} into place: {}", path, e)));
        }

        debug!("Stored {} ({} bytes, {})", key, bytes.len(), content_type);
        Ok(public_reference(&self.public_base_url, key))
    }

    async fn get(&self, reference: &str) -> Result<Bytes, StoreError> {
        let path = self.resolve(key_from_reference(&self.public_base_url, reference))?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| StoreError::Object(format!("Failed to read {}: {}", reference, e)))?;
        Ok(Bytes::from(data))
    }
}

const MEMORY_PREFIX: &str = "memory://";

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Bytes,
    content_type: String,
}

/// In-process object store, used by tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn content_type(&self, reference: &str) -> Option<String> {
        let key = reference.strip_prefix(MEMORY_PREFIX).unwrap_or(reference);
        self.objects.read().get(key).map(|o| o.content_type.clone())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &ScopedKey, bytes: Bytes, content_type: &str) -> Result<String, StoreError> {
        self.objects.write().insert(
            key.as_str().to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("{}{}", MEMORY_PREFIX, key))
    }

    async fn get(&self, reference: &str) -> Result<Bytes, StoreError> {
        let key = reference.strip_prefix(MEMORY_PREFIX).unwrap_or(reference);
        self.objects
            .read()
            .get(key)
            .map(|o| o.bytes.clone())
            .ok_or_else(|| StoreError::Object(format!("No object at {}", reference)))
    }
}
