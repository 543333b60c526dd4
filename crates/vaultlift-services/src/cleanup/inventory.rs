use vaultlift_core::{AppError, UploadSettings};
use vaultlift_storage::RemoteStore;

/// Every object key under the configured folder, minus soft-deleted objects.
///
/// Any listing error aborts the whole scan.
#[tracing::instrument(skip(storage, settings), fields(bucket = %storage.bucket()))]
pub async fn list_remote_objects(
    storage: &dyn RemoteStore,
    settings: &UploadSettings,
) -> Result<Vec<String>, AppError> {
    let prefix = settings.folder_path.trim_matches('/');
    let mut keys = Vec::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = storage
            .list_objects_page(prefix, token.as_deref())
            .await
            .map_err(|e| AppError::Scan(format!("listing remote objects failed: {}", e)))?;
        pages += 1;

        keys.extend(
            page.keys
                .into_iter()
                .filter(|key| !is_trashed(key, &settings.trash_path)),
        );

        match page.next_token {
            Some(next) if token.as_deref() == Some(next.as_str()) => {
                return Err(AppError::Scan(format!(
                    "listing did not advance past {}",
                    next
                )));
            }
            Some(next) => token = Some(next),
            None => break,
        }
    }

    tracing::info!(count = keys.len(), pages, prefix = %prefix, "Remote inventory listed");
    Ok(keys)
}

/// Trash folders are recognised at the root and nested at any depth.
fn is_trashed(key: &str, trash_path: &str) -> bool {
    let trash = trash_path.trim_matches('/');
    if trash.is_empty() {
        return false;
    }
    key == trash
        || key
            .strip_prefix(trash)
            .is_some_and(|rest| rest.starts_with('/'))
        || key.contains(&format!("/{}/", trash))
}
