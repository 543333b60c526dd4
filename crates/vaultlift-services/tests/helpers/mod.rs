#![allow(dead_code)]

pub mod doubles;

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use vaultlift_core::UploadSettings;
use vaultlift_services::{FsVault, RemoteStore, S3Storage};

pub const BASE_URL: &str = "https://cdn.example.com";

/// Settings for a configured bucket named `notes` behind `BASE_URL`.
pub fn settings() -> UploadSettings {
    UploadSettings {
        access_key_id: "AKIATEST".to_string(),
        secret_access_key: "secret".to_string(),
        bucket_name: "notes".to_string(),
        base_url: Some(BASE_URL.to_string()),
        ..UploadSettings::default()
    }
}

pub fn url(key: &str) -> String {
    format!("{}/{}", BASE_URL, key)
}

/// A temporary vault seeded with `files`.
pub struct TestVault {
    pub dir: TempDir,
    pub vault: Arc<FsVault>,
}

impl TestVault {
    pub async fn with_files(files: &[(&str, &str)]) -> Self {
        Self::build(files, None).await
    }

    pub async fn with_active(files: &[(&str, &str)], active: &str) -> Self {
        Self::build(files, Some(active)).await
    }

    async fn build(files: &[(&str, &str)], active: Option<&str>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, content).unwrap();
        }
        let mut vault = FsVault::open(dir.path()).await.unwrap();
        if let Some(active) = active {
            vault = vault.with_active_file(active).unwrap();
        }
        TestVault {
            dir,
            vault: Arc::new(vault),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(path)).unwrap()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.dir.path().join(path).exists()
    }
}

/// In-memory bucket seeded with `keys`.
pub async fn bucket_with(keys: &[&str]) -> S3Storage {
    let storage = S3Storage::in_memory("notes");
    for key in keys {
        storage
            .put_object(key, b"data".to_vec(), "application/octet-stream")
            .await
            .unwrap();
    }
    storage
}

/// Every key in the bucket, trash included.
pub async fn remote_keys(storage: &dyn RemoteStore) -> Vec<String> {
    let mut keys = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = storage
            .list_objects_page("", token.as_deref())
            .await
            .unwrap();
        keys.extend(page.keys);
        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    keys
}
