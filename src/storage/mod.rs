//! Object storage integration for the upload half of a publish
//!
//! Streams a local file into an S3 bucket (or any S3-compatible store) under
//! the derived object key.

pub mod client;
pub mod mock;

pub use client::S3Store;
pub use mock::MockObjectStore;

use crate::models::UploadResult;
use crate::Result;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ByteStream,
        content_type: &str,
    ) -> Result<UploadResult>;
}

/// First `std::io::Error` in an error's source chain, copied out by kind and message.
pub(crate) fn find_io_error(err: &(dyn std::error::Error + 'static)) -> Option<std::io::Error> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            return Some(std::io::Error::new(io.kind(), io.to_string()));
        }
        current = e.source();
    }
    None
}

/// Kinds produced by the connection rather than by reading the local body.
pub(crate) fn is_network_error(kind: std::io::ErrorKind) -> bool {
    use std::io::ErrorKind::*;
    matches!(
        kind,
        ConnectionRefused
            | ConnectionReset
            | ConnectionAborted
            | NotConnected
            | AddrInUse
            | AddrNotAvailable
            | BrokenPipe
            | TimedOut
            | UnexpectedEof
            | WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::io::ErrorKind;

    #[test]
    fn test_find_io_error_walks_source_chain() {
        let err = Error::file_read(
            "logo.png",
            std::io::Error::new(ErrorKind::Other, "bad sector"),
        );

        let io = find_io_error(&err).unwrap();
        assert_eq!(io.kind(), ErrorKind::Other);
        assert_eq!(io.to_string(), "bad sector");
    }

    #[test]
    fn test_find_io_error_none_without_io_source() {
        let err = Error::RemoteStore("AccessDenied".to_string());
        assert!(find_io_error(&err).is_none());
    }

    #[test]
    fn test_network_kinds() {
        assert!(is_network_error(ErrorKind::ConnectionRefused));
        assert!(!is_network_error(ErrorKind::PermissionDenied));
        assert!(!is_network_error(ErrorKind::Other));
    }
}
