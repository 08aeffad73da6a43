use std::ffi::OsString;
use std::path::{Path, PathBuf};
use crate::errors::HnpError;

/// Atomic file write: write to a sibling temp file, then rename
pub async fn atomic_write(path: &Path, content: &str) -> Result<(), HnpError> {
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_atomic_write_replaces_content_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        atomic_write(&path, "first").await.unwrap();
        atomic_write(&path, "second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!temp_path(&path).exists());
    }
}
