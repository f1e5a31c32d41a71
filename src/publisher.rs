//! Publish orchestration: upload one file, then purge its CDN path.

use crate::cdn::{CloudFrontClient, InvalidationService, MockCdnClient};
use crate::mime::content_type_for;
use crate::models::{
    Config, InvalidationRequest, InvalidationResult, PublishOrder, UploadRequest, UploadResult,
};
use crate::storage::{MockObjectStore, ObjectStore, S3Store};
use crate::{Error, Result};
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use serde::Serialize;
use std::path::Path;
use tracing::{error, info, warn};

const DEFAULT_REGION: &str = "us-east-1";

/// Callback invoked with the upload outcome as soon as it is known.
pub type UploadListener = Box<dyn Fn(&UploadOutcome) + Send + Sync>;

/// Uploads a local file and invalidates the matching CDN path.
pub struct Publisher {
    store: Box<dyn ObjectStore>,
    cdn: Box<dyn InvalidationService>,
    order: PublishOrder,
    upload_listener: Option<UploadListener>,
}

/// Injectable service bundle used to construct [`Publisher`] in tests/harnesses.
pub struct PublisherServices {
    pub store: Box<dyn ObjectStore>,
    pub cdn: Box<dyn InvalidationService>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadOutcome {
    Uploaded(UploadResult),
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub upload: UploadOutcome,
    pub invalidation: InvalidationResult,
}

impl UploadOutcome {
    pub fn line(&self) -> String {
        match self {
            Self::Uploaded(result) => format!("Upload Success {}", result.location_url),
            Self::Failed { message } => format!("Upload Error {}", message),
        }
    }
}

impl PublishReport {
    /// Human-readable summary, one line per fact.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.upload.line()];
        lines.extend(self.invalidation_lines());
        lines
    }

    pub fn invalidation_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(5);
        let invalidation = &self.invalidation;
        lines.push(format!(
            "Invalidation Requested: {}",
            invalidation.location.as_deref().unwrap_or(&invalidation.id)
        ));
        lines.push(format!("Invalidation State: {}", invalidation.status));
        lines.push(format!(
            "Invalidation Created Time: {}",
            invalidation.created_time.to_rfc3339()
        ));
        lines.push(format!("Invalidation Quantity: {}", invalidation.quantity()));
        lines.push(format!(
            "Invalidation Items: {}",
            invalidation.requested_paths.join(",")
        ));

        lines
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Process exit status for the outcome of a publish.
pub fn exit_code<T>(outcome: &Result<T>) -> i32 {
    match outcome {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

impl Publisher {
    /// Build a publisher from concrete service dependencies.
    pub fn with_services(services: PublisherServices, order: PublishOrder) -> Self {
        Self {
            store: services.store,
            cdn: services.cdn,
            order,
            upload_listener: None,
        }
    }

    /// Report the upload outcome before the invalidation result is in.
    pub fn with_upload_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&UploadOutcome) + Send + Sync + 'static,
    {
        self.upload_listener = Some(Box::new(listener));
        self
    }

    fn notify_upload(&self, outcome: &UploadOutcome) {
        if let Some(listener) = &self.upload_listener {
            listener(outcome);
        }
    }

    /// Construct the real S3/CloudFront clients, or in-memory doubles when
    /// `DRY_RUN` is set.
    ///
    /// Both clients share one SDK configuration, so credentials are resolved
    /// once per process.
    pub async fn from_config(config: &Config) -> Result<Self> {
        if config.dry_run {
            info!("DRY_RUN enabled, no remote calls will be made");
            let mut store = MockObjectStore::new();
            if let Some(base_url) = &config.public_base_url {
                store = store.with_base_url(base_url.clone());
            }
            return Ok(Self::with_services(
                PublisherServices {
                    store: Box::new(store),
                    cdn: Box::new(MockCdnClient::new()),
                },
                config.publish_order,
            ));
        }

        let region_provider =
            RegionProviderChain::first_try(config.region.clone().map(Region::new))
                .or_default_provider()
                .or_else(Region::new(DEFAULT_REGION));

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        if let Some(region) = sdk_config.region() {
            info!("Using region {}", region);
        }

        let store = S3Store::new(
            &sdk_config,
            config.storage_endpoint.clone(),
            config.public_base_url.clone(),
        );
        let cdn = CloudFrontClient::new(&sdk_config, config.cdn_endpoint.clone());

        Ok(Self::with_services(
            PublisherServices {
                store: Box::new(store),
                cdn: Box::new(cdn),
            },
            config.publish_order,
        ))
    }

    pub fn order(&self) -> PublishOrder {
        self.order
    }

    async fn open_body(path: &Path) -> Result<ByteStream> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| Error::file_read(path, e))?;

        ByteStream::read_from()
            .file(file)
            .build()
            .await
            .map_err(|e| Error::file_read(path, std::io::Error::other(e)))
    }

    async fn put(
        &self,
        request: &UploadRequest,
        key: &str,
        body: ByteStream,
    ) -> Result<UploadResult> {
        let content_type = content_type_for(&request.local_file_path);
        info!(
            "Uploading {} to s3://{}/{} ({})",
            request.local_file_path.display(),
            request.bucket_name,
            key,
            content_type
        );

        self.store
            .put_object(&request.bucket_name, key, body, content_type)
            .await
            .map_err(|e| match e {
                Error::Io(source) => Error::file_read(&request.local_file_path, source),
                other => other,
            })
    }

    /// Stream the local file to `prefix/basename` in the bucket.
    pub async fn upload(&self, request: &UploadRequest) -> Result<UploadResult> {
        let key = request.object_key()?;
        let body = Self::open_body(&request.local_file_path).await?;
        self.put(request, &key, body).await
    }

    pub async fn invalidate(&self, request: &InvalidationRequest) -> Result<InvalidationResult> {
        request.validate()?;
        info!(
            "Requesting invalidation of {} on distribution {} (caller reference {})",
            request.paths.join(","),
            request.distribution_id,
            request.caller_reference
        );

        self.cdn.create_invalidation(request).await
    }

    /// Upload the file and invalidate its CDN path.
    ///
    /// The local file is opened before any remote call, so an unreadable
    /// file never reaches the providers. In `Sequenced` order an upload
    /// failure ends the run; in `Legacy` order both calls run together and
    /// only the invalidation failure is fatal.
    pub async fn publish(
        &self,
        request: &UploadRequest,
        distribution_id: &str,
        caller_reference: Option<String>,
    ) -> Result<PublishReport> {
        let key = request.object_key()?;
        let invalidation_request =
            InvalidationRequest::for_upload(request, distribution_id, caller_reference)?;
        let body = Self::open_body(&request.local_file_path).await?;

        match self.order {
            PublishOrder::Sequenced => {
                let uploaded = self.put(request, &key, body).await.inspect_err(|e| {
                    error!("Upload failed, skipping invalidation: {}", e);
                })?;
                info!("Upload Success {}", uploaded.location_url);
                let upload = UploadOutcome::Uploaded(uploaded);
                self.notify_upload(&upload);

                let invalidation = self.invalidate(&invalidation_request).await?;
                Ok(PublishReport {
                    upload,
                    invalidation,
                })
            }
            PublishOrder::Legacy => {
                warn!("Legacy order: invalidation is sent without waiting for the upload");
                let (uploaded, invalidation) = tokio::join!(
                    self.put(request, &key, body),
                    self.invalidate(&invalidation_request)
                );

                let upload = match uploaded {
                    Ok(result) => {
                        info!("Upload Success {}", result.location_url);
                        UploadOutcome::Uploaded(result)
                    }
                    Err(e) if !e.is_fatal() => {
                        error!("Upload Error {}", e);
                        UploadOutcome::Failed {
                            message: e.to_string(),
                        }
                    }
                    Err(e) => return Err(e),
                };
                self.notify_upload(&upload);

                Ok(PublishReport {
                    upload,
                    invalidation: invalidation?,
                })
            }
        }
    }
}
