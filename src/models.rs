//! Data models and structures
//!
//! Defines the transient request/result types for one publish run, the key
//! derivation shared by the upload and the invalidation, and the
//! environment-driven configuration.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize)]
pub struct UploadRequest {
    pub local_file_path: PathBuf,
    pub bucket_name: String,
    pub object_key_prefix: String,
}

impl UploadRequest {
    pub fn new(
        local_file_path: impl Into<PathBuf>,
        bucket_name: impl Into<String>,
        object_key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            local_file_path: local_file_path.into(),
            bucket_name: bucket_name.into(),
            object_key_prefix: object_key_prefix.into(),
        }
    }

    /// Final component of the local path.
    pub fn file_name(&self) -> Result<&str> {
        self.local_file_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::file_read(
                    &self.local_file_path,
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "path has no UTF-8 file name",
                    ),
                )
            })
    }

    /// Remote key: `prefix + "/" + basename`.
    pub fn object_key(&self) -> Result<String> {
        Ok(format!("{}/{}", self.object_key_prefix, self.file_name()?))
    }

    /// CDN path for the same object; always the object key with a leading slash.
    pub fn invalidation_path(&self) -> Result<String> {
        Ok(format!("/{}", self.object_key()?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadResult {
    pub location_url: String,
    pub bucket: String,
    pub key: String,
    pub e_tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidationRequest {
    pub distribution_id: String,
    pub paths: Vec<String>,
    pub caller_reference: String,
}

impl InvalidationRequest {
    /// Single-path batch covering the object described by `upload`.
    ///
    /// Without an explicit `caller_reference` a fresh time token is used, so
    /// every run produces a new invalidation.
    pub fn for_upload(
        upload: &UploadRequest,
        distribution_id: impl Into<String>,
        caller_reference: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            distribution_id: distribution_id.into(),
            paths: vec![upload.invalidation_path()?],
            caller_reference: caller_reference.unwrap_or_else(new_caller_reference),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.paths.is_empty() {
            return Err(Error::Invalidation(
                "invalidation batch must contain at least one path".to_string(),
            ));
        }
        if self.caller_reference.is_empty() {
            return Err(Error::Invalidation(
                "caller reference must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Nanosecond UTC timestamp, unique enough to never collide between runs.
pub fn new_caller_reference() -> String {
    let now = Utc::now();
    match now.timestamp_nanos_opt() {
        Some(nanos) => nanos.to_string(),
        None => now.timestamp_micros().to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidationResult {
    pub id: String,
    pub location: Option<String>,
    pub status: String,
    pub created_time: DateTime<Utc>,
    pub caller_reference: String,
    pub requested_paths: Vec<String>,
}

impl InvalidationResult {
    pub fn quantity(&self) -> usize {
        self.requested_paths.len()
    }
}

/// Ordering of the two remote calls within one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishOrder {
    /// Invalidate only after the upload has been confirmed.
    #[default]
    Sequenced,
    /// Fire both calls together; upload failures are only logged.
    Legacy,
}

impl FromStr for PublishOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequenced" => Ok(Self::Sequenced),
            "legacy" => Ok(Self::Legacy),
            other => Err(Error::Config(format!(
                "Invalid PUBLISH_ORDER '{}'. Expected 'sequenced' or 'legacy'",
                other
            ))),
        }
    }
}

impl fmt::Display for PublishOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequenced => write!(f, "sequenced"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(Error::Config(format!(
                "Invalid PUBLISH_OUTPUT '{}'. Expected 'text' or 'json'",
                other
            ))),
        }
    }
}

// Configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub region: Option<String>,
    pub storage_endpoint: Option<String>,
    pub cdn_endpoint: Option<String>,
    pub public_base_url: Option<String>,
    pub publish_order: PublishOrder,
    pub caller_reference: Option<String>,
    pub dry_run: bool,
    pub output: OutputFormat,
}

impl Config {
    /// Load from the process environment, after an optional `.env` file.
    ///
    /// AWS credentials are not read here; the SDK's default provider chain
    /// resolves them.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let publish_order = match non_empty("PUBLISH_ORDER") {
            Some(value) => value.parse()?,
            None => PublishOrder::default(),
        };
        let output = match non_empty("PUBLISH_OUTPUT") {
            Some(value) => value.parse()?,
            None => OutputFormat::default(),
        };
        let dry_run = match non_empty("DRY_RUN") {
            Some(value) => parse_bool("DRY_RUN", &value)?,
            None => false,
        };

        Ok(Self {
            region: non_empty("AWS_REGION"),
            storage_endpoint: non_empty("STORAGE_ENDPOINT"),
            cdn_endpoint: non_empty("CDN_ENDPOINT"),
            public_base_url: non_empty("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            publish_order,
            caller_reference: non_empty("INVALIDATION_CALLER_REFERENCE"),
            dry_run,
            output,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(Error::Config(format!(
            "Invalid {} '{}'. Expected true or false",
            key, other
        ))),
    }
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_object_key_and_invalidation_path_agree() {
        let request = UploadRequest::new("/tmp/build/logo.png", "my-assets", "images");

        assert_eq!(request.object_key().unwrap(), "images/logo.png");
        assert_eq!(request.invalidation_path().unwrap(), "/images/logo.png");
    }

    #[test]
    fn test_key_derivation_uses_prefix_verbatim() {
        let nested = UploadRequest::new("dist/app.js", "bucket", "static/v2");
        assert_eq!(nested.object_key().unwrap(), "static/v2/app.js");

        let empty = UploadRequest::new("app.js", "bucket", "");
        assert_eq!(empty.object_key().unwrap(), "/app.js");
        assert_eq!(empty.invalidation_path().unwrap(), "//app.js");
    }

    #[test]
    fn test_path_without_file_name_is_rejected() {
        let request = UploadRequest::new("/", "bucket", "images");
        let err = request.object_key().unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn test_invalidation_request_for_upload() {
        let upload = UploadRequest::new("logo.png", "my-assets", "images");
        let request =
            InvalidationRequest::for_upload(&upload, "E123ABC", Some("ref-1".to_string()))
                .unwrap();

        assert_eq!(request.distribution_id, "E123ABC");
        assert_eq!(request.paths, vec!["/images/logo.png".to_string()]);
        assert_eq!(request.caller_reference, "ref-1");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_generated_caller_reference_is_numeric() {
        let upload = UploadRequest::new("logo.png", "my-assets", "images");
        let request = InvalidationRequest::for_upload(&upload, "E123ABC", None).unwrap();

        assert!(!request.caller_reference.is_empty());
        assert!(request.caller_reference.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_empty_batch_fails_validation() {
        let request = InvalidationRequest {
            distribution_id: "E123ABC".to_string(),
            paths: Vec::new(),
            caller_reference: "ref".to_string(),
        };
        assert!(matches!(request.validate(), Err(Error::Invalidation(_))));
    }

    #[test]
    fn test_publish_order_parsing() {
        assert_eq!("legacy".parse::<PublishOrder>().unwrap(), PublishOrder::Legacy);
        assert_eq!(
            " Sequenced ".parse::<PublishOrder>().unwrap(),
            PublishOrder::Sequenced
        );
        assert!("parallel".parse::<PublishOrder>().is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.publish_order, PublishOrder::Sequenced);
        assert_eq!(config.output, OutputFormat::Text);
        assert!(!config.dry_run);
        assert!(config.caller_reference.is_none());
        assert!(config.storage_endpoint.is_none());
    }

    #[test]
    fn test_config_reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PUBLISH_ORDER", "legacy"),
            ("PUBLISH_OUTPUT", "json"),
            ("DRY_RUN", "1"),
            ("AWS_REGION", "eu-west-1"),
            ("STORAGE_ENDPOINT", "http://localhost:9000"),
            ("PUBLIC_BASE_URL", "https://cdn.example.com/"),
            ("INVALIDATION_CALLER_REFERENCE", "release-42"),
        ]))
        .unwrap();

        assert_eq!(config.publish_order, PublishOrder::Legacy);
        assert_eq!(config.output, OutputFormat::Json);
        assert!(config.dry_run);
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(
            config.storage_endpoint.as_deref(),
            Some("http://localhost:9000")
        );
        assert_eq!(
            config.public_base_url.as_deref(),
            Some("https://cdn.example.com")
        );
        assert_eq!(config.caller_reference.as_deref(), Some("release-42"));
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let err = Config::from_lookup(lookup_from(&[("DRY_RUN", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("DRY_RUN"));

        let err = Config::from_lookup(lookup_from(&[("PUBLISH_OUTPUT", "yaml")])).unwrap_err();
        assert!(err.to_string().contains("PUBLISH_OUTPUT"));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = Config::from_lookup(lookup_from(&[
            ("PUBLISH_ORDER", "  "),
            ("INVALIDATION_CALLER_REFERENCE", ""),
        ]))
        .unwrap();

        assert_eq!(config.publish_order, PublishOrder::Sequenced);
        assert!(config.caller_reference.is_none());
    }
}
