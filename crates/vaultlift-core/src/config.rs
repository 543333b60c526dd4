//! Configuration module
//!
//! `UploadSettings` carries everything the upload and cleanup pipelines need to
//! talk to the remote store and to shape object keys. Settings are passed
//! explicitly into every entry point and validated lazily: a vault can be
//! configured without credentials, and only the remote operations refuse to run.

use std::collections::BTreeSet;
use std::env;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const ACCESS_KEY_ID_VAR: &str = "VAULTLIFT_ACCESS_KEY_ID";
const SECRET_ACCESS_KEY_VAR: &str = "VAULTLIFT_SECRET_ACCESS_KEY";
const BUCKET_VAR: &str = "VAULTLIFT_BUCKET";

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_DATE_FORMAT: &str = "YYYY/MM";
const DEFAULT_TRASH_PATH: &str = ".trash";
const DEFAULT_ALLOWED_EXTENSIONS: &str = "png,jpg,jpeg,gif,webp,svg,bmp,pdf,mp3,mp4,mov,wav,webm";
const DEFAULT_RETRY_COUNT: u32 = 3;
const MIN_RETRY_COUNT: u32 = 1;
const MAX_RETRY_COUNT: u32 = 10;

/// Operator-editable settings for the upload and cleanup commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadSettings {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub bucket_name: String,
    /// S3 API endpoint for S3-compatible providers (MinIO, R2, Spaces...).
    pub endpoint: Option<String>,
    /// Public URL root (CDN or custom domain) used when rewriting links.
    pub base_url: Option<String>,
    pub folder_path: String,
    pub allowed_extensions: BTreeSet<String>,
    pub organize_by_date: bool,
    pub date_format: String,
    pub use_path_style: bool,
    pub retry_count: u32,
    pub trash_path: String,
    pub move_to_trash: bool,
}

impl Default for UploadSettings {
    fn default() -> Self {
        UploadSettings {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region: DEFAULT_REGION.to_string(),
            bucket_name: String::new(),
            endpoint: None,
            base_url: None,
            folder_path: String::new(),
            allowed_extensions: parse_extensions(DEFAULT_ALLOWED_EXTENSIONS),
            organize_by_date: false,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            use_path_style: false,
            retry_count: DEFAULT_RETRY_COUNT,
            trash_path: DEFAULT_TRASH_PATH.to_string(),
            move_to_trash: true,
        }
    }
}

impl UploadSettings {
    /// Load settings from `VAULTLIFT_*` environment variables (and a `.env` file
    /// when present). Missing credentials are not an error here; see [`validate`].
    ///
    /// [`validate`]: UploadSettings::validate
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |primary: &str, fallback: &str| {
            lookup(primary)
                .or_else(|| lookup(fallback))
                .filter(|s| !s.trim().is_empty())
        };
        let flag = |name: &str, default: bool| {
            lookup(name)
                .unwrap_or_else(|| default.to_string())
                .trim()
                .to_lowercase()
                .parse()
                .unwrap_or(default)
        };

        let retry_count = match lookup("VAULTLIFT_RETRY_COUNT") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                AppError::InvalidInput("VAULTLIFT_RETRY_COUNT must be a valid number".to_string())
            })?,
            None => DEFAULT_RETRY_COUNT,
        };

        let settings = UploadSettings {
            access_key_id: var(ACCESS_KEY_ID_VAR, "AWS_ACCESS_KEY_ID").unwrap_or_default(),
            secret_access_key: var(SECRET_ACCESS_KEY_VAR, "AWS_SECRET_ACCESS_KEY")
                .unwrap_or_default(),
            region: var("VAULTLIFT_REGION", "AWS_REGION")
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            bucket_name: var(BUCKET_VAR, "S3_BUCKET").unwrap_or_default(),
            endpoint: var("VAULTLIFT_ENDPOINT", "S3_ENDPOINT"),
            base_url: lookup("VAULTLIFT_BASE_URL"),
            folder_path: lookup("VAULTLIFT_FOLDER_PATH").unwrap_or_default(),
            allowed_extensions: parse_extensions(
                &lookup("VAULTLIFT_ALLOWED_EXTENSIONS")
                    .unwrap_or_else(|| DEFAULT_ALLOWED_EXTENSIONS.to_string()),
            ),
            organize_by_date: flag("VAULTLIFT_ORGANIZE_BY_DATE", false),
            date_format: lookup("VAULTLIFT_DATE_FORMAT")
                .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
            use_path_style: flag("VAULTLIFT_USE_PATH_STYLE", false),
            retry_count,
            trash_path: lookup("VAULTLIFT_TRASH_PATH")
                .unwrap_or_else(|| DEFAULT_TRASH_PATH.to_string()),
            move_to_trash: flag("VAULTLIFT_MOVE_TO_TRASH", true),
        };

        Ok(settings.normalized())
    }

    /// Clamp and tidy user-entered values so the key mapper can use them verbatim.
    pub fn normalized(mut self) -> Self {
        self.retry_count = self.retry_count.clamp(MIN_RETRY_COUNT, MAX_RETRY_COUNT);
        self.folder_path = trim_slashes(&self.folder_path);
        self.trash_path = trim_slashes(&self.trash_path);
        if self.trash_path.is_empty() {
            self.trash_path = DEFAULT_TRASH_PATH.to_string();
        }
        self.allowed_extensions = self
            .allowed_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self.base_url = self
            .base_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        self.endpoint = self
            .endpoint
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if self.date_format.trim().is_empty() {
            self.date_format = DEFAULT_DATE_FORMAT.to_string();
        }
        self
    }

    /// Fails with a configuration error when the remote store cannot be used.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut missing = Vec::new();
        if self.access_key_id.trim().is_empty() {
            missing.push(format!("access key id, set {}", ACCESS_KEY_ID_VAR));
        }
        if self.secret_access_key.trim().is_empty() {
            missing.push(format!("secret access key, set {}", SECRET_ACCESS_KEY_VAR));
        }
        if self.bucket_name.trim().is_empty() {
            missing.push(format!("bucket name, set {}", BUCKET_VAR));
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Configuration(format!(
                "remote store is not configured (missing {})",
                missing.join("; ")
            )))
        }
    }

    /// Whether files with this extension are treated as attachments.
    pub fn is_allowed_extension(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.').to_lowercase();
        !ext.is_empty() && self.allowed_extensions.contains(&ext)
    }

    /// Public URL root without a trailing slash.
    ///
    /// Falls back to the endpoint or the AWS regional host when no base URL is
    /// configured. Path-style roots exclude the bucket, which the key mapper
    /// appends itself.
    pub fn public_base_url(&self) -> String {
        let base = match (&self.base_url, &self.endpoint) {
            (Some(base), _) => base.clone(),
            (None, Some(endpoint)) if self.use_path_style => endpoint.clone(),
            (None, _) if self.use_path_style => format!("https://s3.{}.amazonaws.com", self.region),
            (None, _) => format!(
                "https://{}.s3.{}.amazonaws.com",
                self.bucket_name, self.region
            ),
        };
        base.trim_end_matches('/').to_string()
    }
}

fn parse_extensions(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn trim_slashes(path: &str) -> String {
    path.trim().trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn configured() -> UploadSettings {
        UploadSettings {
            access_key_id: "AKIA".to_string(),
            secret_access_key: "secret".to_string(),
            bucket_name: "notes".to_string(),
            ..UploadSettings::default()
        }
    }

    #[test]
    fn defaults_are_loaded_when_nothing_is_set() {
        let settings = UploadSettings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings.region, "us-east-1");
        assert_eq!(settings.retry_count, 3);
        assert_eq!(settings.trash_path, ".trash");
        assert!(settings.move_to_trash);
        assert!(settings.is_allowed_extension("PNG"));
    }

    #[test]
    fn retry_count_is_clamped() {
        let settings =
            UploadSettings::from_lookup(lookup_from(&[("VAULTLIFT_RETRY_COUNT", "42")])).unwrap();
        assert_eq!(settings.retry_count, 10);

        let settings =
            UploadSettings::from_lookup(lookup_from(&[("VAULTLIFT_RETRY_COUNT", "0")])).unwrap();
        assert_eq!(settings.retry_count, 1);
    }

    #[test]
    fn invalid_retry_count_is_rejected() {
        let result = UploadSettings::from_lookup(lookup_from(&[("VAULTLIFT_RETRY_COUNT", "many")]));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn aws_variables_are_used_as_fallback() {
        let settings = UploadSettings::from_lookup(lookup_from(&[
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("S3_BUCKET", "notes"),
            ("VAULTLIFT_REGION", "eu-west-1"),
        ]))
        .unwrap();
        assert_eq!(settings.access_key_id, "AKIA");
        assert_eq!(settings.bucket_name, "notes");
        assert_eq!(settings.region, "eu-west-1");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn paths_and_extensions_are_normalized() {
        let settings = UploadSettings::from_lookup(lookup_from(&[
            ("VAULTLIFT_FOLDER_PATH", "/obsidian/assets/"),
            ("VAULTLIFT_TRASH_PATH", "/"),
            ("VAULTLIFT_ALLOWED_EXTENSIONS", " .PNG, jpg ,,"),
        ]))
        .unwrap();
        assert_eq!(settings.folder_path, "obsidian/assets");
        assert_eq!(settings.trash_path, ".trash");
        assert_eq!(settings.allowed_extensions.len(), 2);
        assert!(settings.is_allowed_extension(".png"));
        assert!(!settings.is_allowed_extension("md"));
    }

    #[test]
    fn missing_credentials_are_a_configuration_error() {
        let err = UploadSettings::default().validate().unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.to_string().contains("bucket name"));
    }

    #[test]
    fn configuration_error_names_the_variables_that_are_read() {
        let message = UploadSettings::default().validate().unwrap_err().to_string();
        let named: Vec<&str> = message
            .split(|c: char| !(c.is_ascii_uppercase() || c == '_'))
            .filter(|word| word.starts_with("VAULTLIFT_"))
            .collect();
        assert_eq!(
            named,
            vec!["VAULTLIFT_ACCESS_KEY_ID", "VAULTLIFT_SECRET_ACCESS_KEY", "VAULTLIFT_BUCKET"]
        );

        let pairs: Vec<(&str, &str)> = named.iter().map(|name| (*name, "value")).collect();
        let settings = UploadSettings::from_lookup(lookup_from(&pairs)).unwrap();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn public_base_url_trims_trailing_slash() {
        let settings = UploadSettings {
            base_url: Some("https://cdn.example.com/".to_string()),
            ..configured()
        };
        assert_eq!(settings.public_base_url(), "https://cdn.example.com");
    }

    #[test]
    fn public_base_url_falls_back_to_aws_hosts() {
        let virtual_style = configured();
        assert_eq!(
            virtual_style.public_base_url(),
            "https://notes.s3.us-east-1.amazonaws.com"
        );

        let path_style = UploadSettings {
            use_path_style: true,
            ..configured()
        };
        assert_eq!(path_style.public_base_url(), "https://s3.us-east-1.amazonaws.com");

        let minio = UploadSettings {
            use_path_style: true,
            endpoint: Some("http://localhost:9000/".to_string()),
            ..configured()
        };
        assert_eq!(minio.public_base_url(), "http://localhost:9000");
    }
}
