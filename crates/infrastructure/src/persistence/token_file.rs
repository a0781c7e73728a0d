//! File-backed token repository.
//!
//! The token pair lives in a single JSON object. Each save replaces the
//! whole file through a sibling temporary file and a rename.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use wrike_application::ports::TokenRepository;
use wrike_domain::{AuthInfo, GatewayError, GatewayResult};

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// `TokenRepository` storing the pair in one JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenRepository {
    path: PathBuf,
}

impl FileTokenRepository {
    /// Creates a repository for `path`. Nothing is read until `load`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the token file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn storage_error(&self, action: &str, e: impl std::fmt::Display) -> GatewayError {
        GatewayError::TokenStorage(format!(
            "failed to {action} {}: {e}",
            self.path.display()
        ))
    }
}

#[async_trait]
impl TokenRepository for FileTokenRepository {
    async fn load(&self) -> GatewayResult<Option<AuthInfo>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.storage_error("read", e)),
        };

        let auth_info = from_json_bytes(&bytes).map_err(|e| self.storage_error("decode", e))?;
        tracing::debug!(path = %self.path.display(), "token file read");
        Ok(Some(auth_info))
    }

    async fn save(&self, auth_info: &AuthInfo) -> GatewayResult<()> {
        let bytes = to_json_stable_bytes(auth_info).map_err(|e| self.storage_error("encode", e))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_error("create directory for", e))?;
        }

        let temp = self.temp_path();
        fs::write(&temp, &bytes)
            .await
            .map_err(|e| self.storage_error("write", e))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.storage_error("replace", e))?;

        tracing::info!(path = %self.path.display(), "token file written");
        Ok(())
    }

    async fn clear(&self) -> GatewayResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "token file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error("remove", e)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn repository(dir: &TempDir) -> FileTokenRepository {
        FileTokenRepository::new(dir.path().join("wrike_token.json"))
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(repository(&dir).load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        let info = AuthInfo::new("A", "R").with_field("host", "www.wrike.com");

        repo.save(&info).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), Some(info));
        assert!(!repo.temp_path().exists());
    }

    #[tokio::test]
    async fn test_save_overwrites_whole_file() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);

        repo.save(&AuthInfo::new("A", "R").with_field("host", "app-eu.wrike.com"))
            .await
            .unwrap();
        repo.save(&AuthInfo::new("B", "R2")).await.unwrap();

        let text = std::fs::read_to_string(repo.path()).unwrap();
        assert_eq!(
            text,
            "{\n  \"access_token\": \"B\",\n  \"refresh_token\": \"R2\"\n}\n"
        );
    }

    #[tokio::test]
    async fn test_reads_externally_written_file() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        std::fs::write(
            repo.path(),
            r#"{"access_token":"A","refresh_token":"R","token_type":"bearer","expires_in":3600}"#,
        )
        .unwrap();

        let info = repo.load().await.unwrap().unwrap();
        assert_eq!(info.access_token, "A");
        assert_eq!(info.expires_in, Some(3600));
        assert_eq!(info.extra["token_type"], "bearer");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        std::fs::write(repo.path(), "not json").unwrap();

        let err = repo.load().await.unwrap_err();
        assert!(matches!(err, GatewayError::TokenStorage(_)));
    }

    #[tokio::test]
    async fn test_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let repo = FileTokenRepository::new(dir.path().join("nested/dir/token.json"));

        repo.save(&AuthInfo::new("A", "R")).await.unwrap();
        assert!(repo.path().exists());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        repo.save(&AuthInfo::new("A", "R")).await.unwrap();

        repo.clear().await.unwrap();
        repo.clear().await.unwrap();
        assert_eq!(repo.load().await.unwrap(), None);
    }
}
