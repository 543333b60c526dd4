use crate::traits::{DocumentStore, VaultError, VaultResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use vaultlift_core::FileRef;

/// Vault backed by a directory on the local filesystem
#[derive(Clone, Debug)]
pub struct FsVault {
    root: PathBuf,
    active: Option<FileRef>,
}

impl FsVault {
    /// Open a vault rooted at `root`. The directory must exist.
    pub async fn open(root: impl Into<PathBuf>) -> VaultResult<Self> {
        let root = root.into();
        let metadata = fs::metadata(&root).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VaultError::NotFound(root.display().to_string())
            } else {
                VaultError::IoError(e)
            }
        })?;
        if !metadata.is_dir() {
            return Err(VaultError::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        Ok(FsVault { root, active: None })
    }

    /// Mark `path` as the focused document.
    pub fn with_active_file(mut self, path: &str) -> VaultResult<Self> {
        let normalized = normalize_vault_path(path)?;
        self.active = Some(FileRef::from_path(&normalized));
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Convert a vault path to a filesystem path with traversal validation.
    fn vault_to_path(&self, path: &str) -> VaultResult<PathBuf> {
        let normalized = normalize_vault_path(path)?;
        Ok(self.root.join(normalized))
    }

    fn not_found_or_io(path: &str, e: std::io::Error) -> VaultError {
        if e.kind() == std::io::ErrorKind::NotFound {
            VaultError::NotFound(path.to_string())
        } else {
            VaultError::IoError(e)
        }
    }
}

/// Accepts `a/b.png`, `./a/b.png` or a Windows-style `a\b.png` and rejects
/// anything that could leave the vault root.
fn normalize_vault_path(path: &str) -> VaultResult<String> {
    let unified = path.replace('\\', "/");
    let mut parts = Vec::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(VaultError::InvalidPath(path.to_string()));
            }
        }
    }
    if parts.is_empty() {
        return Err(VaultError::InvalidPath(path.to_string()));
    }
    Ok(parts.join("/"))
}

#[async_trait]
impl DocumentStore for FsVault {
    async fn read_text(&self, path: &str) -> VaultResult<String> {
        let bytes = self.read_bytes(path).await?;
        String::from_utf8(bytes).map_err(|_| VaultError::NotText(path.to_string()))
    }

    async fn read_bytes(&self, path: &str) -> VaultResult<Vec<u8>> {
        let full = self.vault_to_path(path)?;
        fs::read(&full)
            .await
            .map_err(|e| Self::not_found_or_io(path, e))
    }

    async fn write_text(&self, path: &str, content: &str) -> VaultResult<()> {
        let full = self.vault_to_path(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full, content).await?;
        tracing::debug!(path = %path, bytes = content.len(), "Document written");
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> VaultResult<()> {
        let full = self.vault_to_path(path)?;
        fs::remove_file(&full)
            .await
            .map_err(|e| Self::not_found_or_io(path, e))?;
        tracing::debug!(path = %path, "File deleted from vault");
        Ok(())
    }

    async fn list_all_files(&self) -> VaultResult<Vec<FileRef>> {
        let mut files = Vec::new();
        let mut pending: Vec<(PathBuf, String)> = vec![(self.root.clone(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                // Hidden folders hold app config (.obsidian) and local trash.
                if name.starts_with('.') {
                    continue;
                }
                let rel = if prefix.is_empty() {
                    name
                } else {
                    format!("{}/{}", prefix, name)
                };
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push((entry.path(), rel));
                } else if file_type.is_file() {
                    files.push(FileRef::from_path(&rel));
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn active_file(&self) -> Option<FileRef> {
        self.active.clone()
    }

    async fn resolve_path(&self, path: &str) -> VaultResult<Option<FileRef>> {
        let Ok(normalized) = normalize_vault_path(path) else {
            return Ok(None);
        };
        match fs::metadata(self.root.join(&normalized)).await {
            Ok(meta) if meta.is_file() => Ok(Some(FileRef::from_path(&normalized))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VaultError::IoError(e)),
        }
    }
}
