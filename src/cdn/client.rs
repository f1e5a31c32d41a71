use super::InvalidationService;
use crate::models::{InvalidationRequest, InvalidationResult};
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudfront::error::DisplayErrorContext;
use aws_sdk_cloudfront::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudfront::types::{Invalidation, InvalidationBatch, Paths};
use aws_sdk_cloudfront::Client as CloudFrontSdkClient;
use chrono::{DateTime, Utc};

pub struct CloudFrontClient {
    client: CloudFrontSdkClient,
}

impl CloudFrontClient {
    pub fn new(sdk_config: &SdkConfig, endpoint: Option<String>) -> Self {
        let mut builder = aws_sdk_cloudfront::config::Builder::from(sdk_config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: CloudFrontSdkClient::from_conf(builder.build()),
        }
    }
}

fn build_batch(request: &InvalidationRequest) -> Result<InvalidationBatch> {
    let quantity = i32::try_from(request.paths.len()).map_err(|_| {
        Error::Invalidation(format!("Too many paths: {}", request.paths.len()))
    })?;

    let paths = Paths::builder()
        .quantity(quantity)
        .set_items(Some(request.paths.clone()))
        .build()
        .map_err(|e| Error::Invalidation(format!("Invalid path list: {}", e)))?;

    InvalidationBatch::builder()
        .paths(paths)
        .caller_reference(&request.caller_reference)
        .build()
        .map_err(|e| Error::Invalidation(format!("Invalid invalidation batch: {}", e)))
}

fn to_chrono(time: &AwsDateTime) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(time.secs(), time.subsec_nanos())
        .ok_or_else(|| Error::Invalidation(format!("Create time out of range: {:?}", time)))
}

fn to_result(
    invalidation: &Invalidation,
    location: Option<&str>,
    request: &InvalidationRequest,
) -> Result<InvalidationResult> {
    let batch = invalidation.invalidation_batch();
    let requested_paths = batch
        .and_then(|b| b.paths())
        .map(|p| p.items().to_vec())
        .unwrap_or_else(|| request.paths.clone());
    let caller_reference = batch
        .map(|b| b.caller_reference().to_string())
        .unwrap_or_else(|| request.caller_reference.clone());

    Ok(InvalidationResult {
        id: invalidation.id().to_string(),
        location: location.map(|l| l.to_string()),
        status: invalidation.status().to_string(),
        created_time: to_chrono(invalidation.create_time())?,
        caller_reference,
        requested_paths,
    })
}

#[async_trait]
impl InvalidationService for CloudFrontClient {
    async fn create_invalidation(
        &self,
        request: &InvalidationRequest,
    ) -> Result<InvalidationResult> {
        request.validate()?;
        let batch = build_batch(request)?;

        let output = self
            .client
            .create_invalidation()
            .distribution_id(&request.distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|e| {
                Error::Invalidation(format!(
                    "Failed to invalidate distribution {}: {}",
                    request.distribution_id,
                    DisplayErrorContext(&e)
                ))
            })?;

        let invalidation = output.invalidation().ok_or_else(|| {
            Error::Invalidation("Response did not include an invalidation".to_string())
        })?;

        to_result(invalidation, output.location(), request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(paths: &[&str]) -> InvalidationRequest {
        InvalidationRequest {
            distribution_id: "E123ABC".to_string(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
            caller_reference: "1700000000000".to_string(),
        }
    }

    #[test]
    fn test_build_batch_sets_quantity_and_items() {
        let batch = build_batch(&request(&["/images/logo.png", "/index.html"])).unwrap();

        assert_eq!(batch.caller_reference(), "1700000000000");
        let paths = batch.paths().unwrap();
        assert_eq!(paths.quantity(), 2);
        assert_eq!(paths.items(), ["/images/logo.png", "/index.html"]);
    }

    #[test]
    fn test_to_result_reads_provider_fields() {
        let batch = build_batch(&request(&["/images/logo.png"])).unwrap();
        let invalidation = Invalidation::builder()
            .id("I2J0I21PCUYOIK")
            .status("InProgress")
            .create_time(AwsDateTime::from_secs(1_700_000_000))
            .invalidation_batch(batch)
            .build()
            .unwrap();

        let result = to_result(
            &invalidation,
            Some("https://cloudfront.amazonaws.com/2020-05-31/distribution/E123ABC/invalidation/I2J0I21PCUYOIK"),
            &request(&["/images/logo.png"]),
        )
        .unwrap();

        assert_eq!(result.id, "I2J0I21PCUYOIK");
        assert_eq!(result.status, "InProgress");
        assert_eq!(result.created_time.timestamp(), 1_700_000_000);
        assert_eq!(result.requested_paths, vec!["/images/logo.png".to_string()]);
        assert_eq!(result.quantity(), 1);
        assert!(result.location.unwrap().ends_with("/I2J0I21PCUYOIK"));
    }
}
