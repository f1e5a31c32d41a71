use super::{find_io_error, ObjectStore};
use crate::models::UploadResult;
use crate::{Error, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockObjectStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    content_types: Arc<Mutex<HashMap<String, String>>>,
    base_url: String,
    upload_count: Arc<Mutex<usize>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            content_types: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://mock-store.example.com".to_string(),
            upload_count: Arc::new(Mutex::new(0)),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Make every upload fail with a provider-style error message.
    pub fn with_failure(self, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    /// Stored objects keyed by `bucket/key`.
    pub fn get_objects(&self) -> HashMap<String, Vec<u8>> {
        self.objects.lock().unwrap().clone()
    }

    pub fn get_content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.content_types
            .lock()
            .unwrap()
            .get(&format!("{}/{}", bucket, key))
            .cloned()
    }
}

impl Default for MockObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ByteStream,
        content_type: &str,
    ) -> Result<UploadResult> {
        *self.upload_count.lock().unwrap() += 1;

        let failure = self.failure.lock().unwrap().clone();
        if let Some(message) = failure {
            return Err(Error::RemoteStore(message));
        }

        let data = body
            .collect()
            .await
            .map_err(|e| {
                let source =
                    find_io_error(&e).unwrap_or_else(|| std::io::Error::other(e.to_string()));
                Error::Io(source)
            })?
            .into_bytes()
            .to_vec();

        let object_id = format!("{}/{}", bucket, key);
        self.objects.lock().unwrap().insert(object_id.clone(), data);
        self.content_types
            .lock()
            .unwrap()
            .insert(object_id.clone(), content_type.to_string());

        Ok(UploadResult {
            location_url: format!("{}/{}", self.base_url, object_id),
            bucket: bucket.to_string(),
            key: key.to_string(),
            e_tag: None,
        })
    }
}
