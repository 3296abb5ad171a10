//! Local filesystem [`BlobStore`].

use std::path::{Path, PathBuf};

use crate::error::ScraperError;
use crate::sync::{BlobStore, Visibility};

/// Stores each blob as `<root>/<key>`, creating `root` on first write.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a blob with `key` is written to.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBlobKey`] if `key` is empty or could
    /// escape the store root.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, ScraperError> {
        let escapes = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\', '\0']);
        if escapes {
            return Err(ScraperError::InvalidBlobKey {
                key: key.to_owned(),
            });
        }
        Ok(self.root.join(key))
    }
}

impl BlobStore for FsBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        visibility: Visibility,
    ) -> Result<(), ScraperError> {
        let path = self.path_for(key)?;
        let io_err = |source| ScraperError::BlobStore {
            key: key.to_owned(),
            source,
        };

        tokio::fs::create_dir_all(&self.root).await.map_err(io_err)?;
        tokio::fs::write(&path, bytes).await.map_err(io_err)?;
        apply_visibility(&path, visibility).await.map_err(io_err)?;
        Ok(())
    }
}

#[cfg(unix)]
async fn apply_visibility(path: &Path, visibility: Visibility) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = match visibility {
        Visibility::Public => 0o644,
        Visibility::Private => 0o600,
    };
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await
}

#[cfg(not(unix))]
async fn apply_visibility(_path: &Path, _visibility: Visibility) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("appsync-blob-{}-{name}", std::process::id()))
    }

    #[test]
    fn path_for_rejects_escaping_keys() {
        let store = FsBlobStore::new("/tmp/blobs");
        for key in ["", ".", "..", "../etc/passwd", "a/b", "a\\b"] {
            assert!(
                matches!(store.path_for(key), Err(ScraperError::InvalidBlobKey { .. })),
                "key {key:?} should be rejected"
            );
        }
    }

    #[test]
    fn path_for_joins_plain_key() {
        let store = FsBlobStore::new("/tmp/blobs");
        assert_eq!(store.path_for("9981").unwrap(), PathBuf::from("/tmp/blobs/9981"));
    }

    #[tokio::test]
    async fn put_creates_root_and_overwrites_existing_blob() {
        let root = temp_root("overwrite");
        let _ = std::fs::remove_dir_all(&root);
        let store = FsBlobStore::new(&root);

        store.put("9981", b"first", Visibility::Public).await.unwrap();
        store.put("9981", b"second", Visibility::Public).await.unwrap();

        let stored = std::fs::read(root.join("9981")).unwrap();
        assert_eq!(stored, b"second");
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn put_public_blob_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let root = temp_root("public");
        let _ = std::fs::remove_dir_all(&root);
        let store = FsBlobStore::new(&root);

        store.put("1", b"img", Visibility::Public).await.unwrap();
        store.put("2", b"img", Visibility::Private).await.unwrap();

        let public_mode = std::fs::metadata(root.join("1")).unwrap().permissions().mode();
        let private_mode = std::fs::metadata(root.join("2")).unwrap().permissions().mode();
        assert_eq!(public_mode & 0o777, 0o644);
        assert_eq!(private_mode & 0o777, 0o600);
        std::fs::remove_dir_all(&root).unwrap();
    }
}
