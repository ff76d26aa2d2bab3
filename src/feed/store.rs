//! Persisting the feed document.
//!
//! The document is written to a hidden sibling file, synced, then renamed
//! over the target. Readers see either the previous file or the complete
//! new one, never a partial write. The temporary file must stay on the same
//! filesystem as the target for the rename to be atomic.

use crate::error::FeedError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument};

/// Replace the file at `path` with `bytes`.
///
/// On failure the temporary file is removed and any previous content at
/// `path` is left untouched.
#[instrument(level = "info", skip(bytes), fields(path = %path.display(), bytes = bytes.len()))]
pub async fn write_feed(path: &Path, bytes: &[u8]) -> Result<(), FeedError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let tmp = temp_path(path);
    let result: std::io::Result<()> = async {
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, path).await
    }
    .await;

    if let Err(e) = result {
        error!(error = %e, tmp = %tmp.display(), "Feed write failed; previous file kept");
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    info!("Wrote feed file");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "feed".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_parent_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rss.xml");

        write_feed(&path, b"first").await.unwrap();
        write_feed(&path, b"second").await.unwrap();

        assert_eq!(fs::read(&path).await.unwrap(), b"second");
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        // a directory at the target path makes the final rename fail
        let path = dir.path().join("rss.xml");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"old").unwrap();

        let result = write_feed(&path, b"new").await;

        assert!(result.is_err());
        assert_eq!(std::fs::read(path.join("keep")).unwrap(), b"old");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let tmp = temp_path(Path::new("/srv/feeds/rss.xml"));
        assert_eq!(tmp.parent(), Some(Path::new("/srv/feeds")));
        let name = tmp.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".rss.xml."));
        assert!(name.ends_with(".tmp"));
    }
}
