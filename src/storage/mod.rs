mod fs;
mod memory;

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;

use async_trait::async_trait;

use crate::error::IngestError;

/// An object read back from a store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Blob storage for recipe images
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key` and return the public URL of the object
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>)
        -> Result<String, IngestError>;

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, IngestError>;

    /// Keys starting with `prefix`, sorted
    async fn list(&self, prefix: &str) -> Result<Vec<String>, IngestError>;
}

/// Reject keys that are empty or could escape the store root.
pub(crate) fn validate_key(key: &str) -> Result<(), IngestError> {
    if key.trim().is_empty() {
        return Err(IngestError::Storage("object key is empty".into()));
    }
    if key.starts_with('/') || key.split('/').any(|part| part == ".." || part.is_empty()) {
        return Err(IngestError::Storage(format!("invalid object key: {}", key)));
    }
    Ok(())
}

/// Best-effort content type for a key, from its extension.
pub(crate) fn content_type_for_key(key: &str) -> &'static str {
    let ext = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

pub(crate) fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("images/soup-1.jpg").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("images/../../secret").is_err());
        assert!(validate_key("images//soup.jpg").is_err());
    }

    #[test]
    fn test_content_type_for_key() {
        assert_eq!(content_type_for_key("images/a.JPG"), "image/jpeg");
        assert_eq!(content_type_for_key("images/a.webp"), "image/webp");
        assert_eq!(content_type_for_key("images/a"), "application/octet-stream");
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            public_url("https://cdn.test/", "images/a.png"),
            "https://cdn.test/images/a.png"
        );
    }
}
