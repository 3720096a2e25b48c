//! Profile image storage.

use async_trait::async_trait;
use orgdesk_config::StorageConfig;
use orgdesk_core::{Interface, OrgdeskResult, UploadedFile};
use orgdesk_security::random_alphanumeric;
use shaku::Component;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory, relative to the public root, holding profile images.
pub const PROFILE_IMAGE_DIR: &str = "profile_images";

/// Stores uploaded files on the public disk.
#[async_trait]
pub trait ImageStore: Interface + Send + Sync {
    /// Writes the file and returns its path relative to the public root.
    async fn store(&self, file: &UploadedFile) -> OrgdeskResult<String>;

    /// Removes a stored file. Missing files are not an error.
    async fn delete(&self, path: &str) -> OrgdeskResult<()>;
}

/// Image store backed by the local file system.
#[derive(Debug, Clone, Component)]
#[shaku(interface = ImageStore)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.public_root.clone())
    }

    /// Returns the DI parameters for this store.
    #[must_use]
    pub fn into_parameters(self) -> LocalImageStoreParameters {
        LocalImageStoreParameters { root: self.root }
    }

    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        let safe = relative
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
        safe.then(|| self.root.join(relative))
    }
}

/// Length of the random prefix that keeps equal client file names apart.
const UNIQUE_PREFIX_LENGTH: usize = 16;

/// Longest kept client file name in bytes. With the prefix it stays well
/// under the 255 byte limit most file systems put on a name.
const MAX_FILE_NAME_BYTES: usize = 200;

/// Extensions longer than this are cut along with the rest of the name.
const MAX_EXTENSION_BYTES: usize = 16;

/// Keeps only the last path component of a client-supplied file name,
/// shortened to [`MAX_FILE_NAME_BYTES`] with its extension intact.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "." || base == ".." {
        return "image".to_string();
    }
    if base.len() <= MAX_FILE_NAME_BYTES {
        return base.to_string();
    }

    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= MAX_EXTENSION_BYTES => {
            let stem = truncate_on_char_boundary(stem, MAX_FILE_NAME_BYTES - ext.len() - 1);
            format!("{stem}.{ext}")
        }
        _ => truncate_on_char_boundary(base, MAX_FILE_NAME_BYTES).to_string(),
    }
}

fn truncate_on_char_boundary(s: &str, max_bytes: usize) -> &str {
    let end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= max_bytes)
        .last()
        .unwrap_or(0);
    &s[..end]
}

/// Relative path for an upload: the client file name behind a random prefix.
#[must_use]
pub fn stored_name(file: &UploadedFile) -> String {
    format!(
        "{PROFILE_IMAGE_DIR}/{}_{}",
        random_alphanumeric(UNIQUE_PREFIX_LENGTH),
        sanitize_file_name(&file.file_name)
    )
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, file: &UploadedFile) -> OrgdeskResult<String> {
        let relative = stored_name(file);
        let dir = self.root.join(PROFILE_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(self.root.join(&relative), &file.data).await?;
        debug!("Stored image: {}", relative);
        Ok(relative)
    }

    async fn delete(&self, path: &str) -> OrgdeskResult<()> {
        let Some(full) = self.resolve(path) else {
            warn!("Refusing to delete image outside the storage root: {}", path);
            return Ok(());
        };
        match tokio::fs::remove_file(&full).await {
            Ok(()) => {
                debug!("Deleted image: {}", path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("avatar.png"), "avatar.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\me.jpg"), "me.jpg");
        assert_eq!(sanitize_file_name(".."), "image");
    }

    #[test]
    fn test_long_file_names_are_cut_keeping_extension() {
        let long = format!("{}.png", "a".repeat(300));
        let name = sanitize_file_name(&long);
        assert_eq!(name.len(), MAX_FILE_NAME_BYTES);
        assert!(name.ends_with("aaa.png"));

        // Multi-byte characters are never split.
        let wide = format!("{}.jpg", "é".repeat(150));
        let name = sanitize_file_name(&wide);
        assert!(name.len() <= MAX_FILE_NAME_BYTES);
        assert!(name.ends_with("é.jpg"));

        let no_extension = "x".repeat(250);
        assert_eq!(sanitize_file_name(&no_extension).len(), MAX_FILE_NAME_BYTES);

        let file = UploadedFile::new(long, None, vec![]);
        assert!(stored_name(&file).len() < 255);
    }

    #[test]
    fn test_stored_name_keeps_client_name() {
        let file = UploadedFile::new("../../etc/avatar.png", None, vec![]);
        let name = stored_name(&file);
        let (prefix, original) = name.trim_start_matches("profile_images/").split_once('_').unwrap();
        assert_eq!(prefix.len(), 16);
        assert_eq!(original, "avatar.png");
    }

    #[tokio::test]
    async fn test_store_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path());
        let file = UploadedFile::new("me.png", Some("image/png".to_string()), vec![1, 2, 3]);

        let path = store.store(&file).await.unwrap();
        assert!(path.starts_with("profile_images/") && path.ends_with("_me.png"));
        let again = store.store(&file).await.unwrap();
        assert_ne!(path, again);
        assert_eq!(std::fs::read(dir.path().join(&path)).unwrap(), vec![1, 2, 3]);

        store.delete(&path).await.unwrap();
        assert!(!dir.path().join(&path).exists());
        // deleting twice is fine
        store.delete(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_ignores_paths_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("keep.txt");
        std::fs::write(&outside, b"x").unwrap();

        let store = LocalImageStore::new(dir.path().join("public"));
        store.delete("../keep.txt").await.unwrap();
        assert!(outside.exists());
    }

    #[test]
    fn test_from_config_uses_public_root() {
        let config = StorageConfig {
            public_root: PathBuf::from("/srv/orgdesk/public"),
        };
        let params = LocalImageStore::from_config(&config).into_parameters();
        assert_eq!(params.root, PathBuf::from("/srv/orgdesk/public"));
    }
}
