//! CDN integration for purging edge caches after a publish
//!
//! Submits invalidation batches to a CloudFront distribution so the next
//! request for a published path is served from the fresh object.

pub mod client;
pub mod mock;

pub use client::CloudFrontClient;
pub use mock::MockCdnClient;

use crate::models::{InvalidationRequest, InvalidationResult};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait InvalidationService: Send + Sync {
    /// Providers treat a repeated `caller_reference` as a retry of the
    /// earlier batch and answer with that batch's result.
    async fn create_invalidation(&self, request: &InvalidationRequest)
        -> Result<InvalidationResult>;
}
