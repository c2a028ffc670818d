//! Save surface for rendered output.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use photomark_common::{PhotomarkError, PhotomarkResult};
use photomark_model::OutputFormat;

/// Destination for a rendered blob. `Ok(None)` means the user dismissed
/// the save, which is not an error.
#[async_trait]
pub trait SaveTarget: Send + Sync {
    async fn save(&self, blob: &[u8], suggested_name: &str) -> PhotomarkResult<Option<PathBuf>>;
}

/// Save and turn dismissal into [`PhotomarkError::UserCancelled`].
pub async fn save_or_cancel(
    target: &dyn SaveTarget,
    blob: &[u8],
    suggested_name: &str,
) -> PhotomarkResult<PathBuf> {
    target
        .save(blob, suggested_name)
        .await?
        .ok_or(PhotomarkError::UserCancelled)
}

/// `<stem>_processed.<ext>`
pub fn suggested_file_name(original: &str, format: OutputFormat) -> String {
    let stem = Path::new(original)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "photo".to_string());
    format!("{stem}_processed.{}", format.extension())
}

/// Writes into a directory. Existing files are never overwritten; a
/// numeric suffix is added instead.
#[derive(Debug, Clone)]
pub struct DirectorySaveTarget {
    dir: PathBuf,
}

impl DirectorySaveTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidate(&self, name: &str, attempt: u32) -> PathBuf {
        if attempt == 0 {
            return self.dir.join(name);
        }
        let path = Path::new(name);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match path.extension() {
            Some(ext) => self
                .dir
                .join(format!("{stem}_{attempt}.{}", ext.to_string_lossy())),
            None => self.dir.join(format!("{stem}_{attempt}")),
        }
    }
}

#[async_trait]
impl SaveTarget for DirectorySaveTarget {
    async fn save(&self, blob: &[u8], suggested_name: &str) -> PhotomarkResult<Option<PathBuf>> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut attempt = 0u32;
        loop {
            let path = self.candidate(suggested_name, attempt);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(blob).await?;
                    file.flush().await?;
                    tracing::debug!(path = %path.display(), bytes = blob.len(), "Saved output");
                    return Ok(Some(path));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dismissed;

    #[async_trait]
    impl SaveTarget for Dismissed {
        async fn save(&self, _: &[u8], _: &str) -> PhotomarkResult<Option<PathBuf>> {
            Ok(None)
        }
    }

    #[test]
    fn test_suggested_name() {
        assert_eq!(
            suggested_file_name("IMG_0042.JPG", OutputFormat::Png),
            "IMG_0042_processed.png"
        );
        assert_eq!(
            suggested_file_name("archive.tar.jpeg", OutputFormat::Jpeg),
            "archive.tar_processed.jpg"
        );
        assert_eq!(suggested_file_name("", OutputFormat::Jpeg), "photo_processed.jpg");
    }

    #[tokio::test]
    async fn test_directory_target_does_not_clobber() {
        let dir = std::env::temp_dir().join(format!("photomark_save_{}", std::process::id()));
        let _ = tokio::fs::remove_dir_all(&dir).await;
        let target = DirectorySaveTarget::new(&dir);

        let first = target.save(b"one", "a_processed.jpg").await.unwrap().unwrap();
        let second = target.save(b"two", "a_processed.jpg").await.unwrap().unwrap();

        assert_eq!(first, dir.join("a_processed.jpg"));
        assert_eq!(second, dir.join("a_processed_1.jpg"));
        assert_eq!(tokio::fs::read(&first).await.unwrap(), b"one");
        assert_eq!(tokio::fs::read(&second).await.unwrap(), b"two");
        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_dismissal_is_user_cancelled() {
        let err = save_or_cancel(&Dismissed, b"x", "x.jpg").await.unwrap_err();
        assert!(err.is_user_cancelled());
    }
}
