use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Sibling path the new contents are staged in before the rename
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(ToOwned::to_owned)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `contents` next to `path` and rename it over the target.
///
/// Missing parent directories are created. Readers never observe a
/// partially written file, but concurrent writers are not serialized.
pub async fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let staging = staging_path(path);
    fs::write(&staging, contents)
        .await
        .with_context(|| format!("Failed to write {}", staging.display()))?;

    if let Err(e) = fs::rename(&staging, path).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }

    Ok(())
}

/// Restrict a secrets file to its owner
#[cfg(unix)]
pub async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).await?;
    let mut permissions = metadata.permissions();
    permissions.set_mode(0o600);
    fs::set_permissions(path, permissions).await?;
    Ok(())
}

#[cfg(not(unix))]
pub async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_staging_path_is_sibling() {
        let staging = staging_path(Path::new("/home/me/.aws/credentials"));
        assert_eq!(staging, PathBuf::from("/home/me/.aws/credentials.tmp"));
    }

    #[tokio::test]
    async fn test_replace_file_creates_parent_and_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("file.txt");

        replace_file(&path, b"first").await.unwrap();
        replace_file(&path, b"second").await.unwrap();

        assert_eq!(fs::read_to_string(&path).await.unwrap(), "second");
        assert!(!staging_path(&path).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_restrict_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials");
        replace_file(&path, b"").await.unwrap();
        restrict_permissions(&path).await.unwrap();

        let mode = fs::metadata(&path).await.unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
