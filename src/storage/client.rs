use super::{find_io_error, is_network_error, ObjectStore};
use crate::models::UploadResult;
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

const DEFAULT_REGION: &str = "us-east-1";

pub struct S3Store {
    client: S3Client,
    region: String,
    endpoint: Option<String>,
    public_base_url: Option<String>,
}

impl S3Store {
    /// Build a store from the shared SDK configuration.
    ///
    /// A custom `endpoint` switches to path-style addressing, which is what
    /// S3-compatible stores (MinIO, Spaces, R2) expect.
    pub fn new(
        sdk_config: &SdkConfig,
        endpoint: Option<String>,
        public_base_url: Option<String>,
    ) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config);
        if let Some(endpoint) = &endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let region = sdk_config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Self {
            client: S3Client::from_conf(builder.build()),
            region,
            endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
            public_base_url,
        }
    }

    fn location_url(&self, bucket: &str, key: &str) -> String {
        match (&self.public_base_url, &self.endpoint) {
            (Some(base_url), _) => format!("{}/{}", base_url, key),
            (None, Some(endpoint)) => format!("{}/{}/{}", endpoint, bucket, key),
            (None, None) => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                bucket, self.region, key
            ),
        }
    }
}

/// Split a failed `PutObject` into a local body read failure (`Error::Io`)
/// or a provider fault (`Error::RemoteStore`).
///
/// Body read failures surface as a dispatch failure whose source chain
/// carries the `std::io::Error` from the file stream.
fn classify_put_error<E, R>(bucket: &str, key: &str, err: SdkError<E, R>) -> Error
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug + 'static,
{
    if let SdkError::DispatchFailure(dispatch) = &err {
        if let Some(io) = find_io_error(&err) {
            if dispatch.is_user() || !is_network_error(io.kind()) {
                return Error::Io(io);
            }
        }
    }

    Error::RemoteStore(format!(
        "Failed to upload s3://{}/{}: {}",
        bucket,
        key,
        DisplayErrorContext(&err)
    ))
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ByteStream,
        content_type: &str,
    ) -> Result<UploadResult> {
        let output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| classify_put_error(bucket, key, e))?;

        Ok(UploadResult {
            location_url: self.location_url(bucket, key),
            bucket: bucket.to_string(),
            key: key.to_string(),
            e_tag: output.e_tag().map(|tag| tag.to_string()),
        })
    }
}
