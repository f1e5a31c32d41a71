//! Publish a single file to object storage and purge it from the CDN edge
//!
//! Uploads one local file to an S3 bucket under `prefix/basename`, then asks
//! CloudFront to invalidate `/prefix/basename` so edges fetch the new copy.

pub mod cdn;
pub mod error;
pub mod mime;
pub mod models;
pub mod publisher;
pub mod storage;

pub use error::{Error, Result};
