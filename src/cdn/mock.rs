use super::InvalidationService;
use crate::models::{InvalidationRequest, InvalidationResult};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-memory CDN that honours caller-reference deduplication.
#[derive(Clone)]
pub struct MockCdnClient {
    invalidations: Arc<Mutex<HashMap<(String, String), InvalidationResult>>>,
    request_log: Arc<Mutex<Vec<InvalidationRequest>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MockCdnClient {
    pub fn new() -> Self {
        Self {
            invalidations: Arc::new(Mutex::new(HashMap::new())),
            request_log: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_failure(self, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.request_log.lock().unwrap().len()
    }

    pub fn get_requests(&self) -> Vec<InvalidationRequest> {
        self.request_log.lock().unwrap().clone()
    }

    /// Number of distinct invalidations created (duplicates excluded).
    pub fn get_invalidation_count(&self) -> usize {
        self.invalidations.lock().unwrap().len()
    }
}

impl Default for MockCdnClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InvalidationService for MockCdnClient {
    async fn create_invalidation(
        &self,
        request: &InvalidationRequest,
    ) -> Result<InvalidationResult> {
        self.request_log.lock().unwrap().push(request.clone());

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(Error::Invalidation(message));
        }
        request.validate()?;

        let mut invalidations = self.invalidations.lock().unwrap();
        let dedup_key = (
            request.distribution_id.clone(),
            request.caller_reference.clone(),
        );

        if let Some(existing) = invalidations.get(&dedup_key) {
            if existing.requested_paths == request.paths {
                return Ok(existing.clone());
            }
            return Err(Error::Invalidation(format!(
                "InvalidationBatchAlreadyExists: caller reference {} was used with different paths",
                request.caller_reference
            )));
        }

        let id = format!("I{}", Uuid::new_v4().simple())
            .to_uppercase()
            .chars()
            .take(14)
            .collect::<String>();
        let result = InvalidationResult {
            location: Some(format!(
                "https://mock-cdn.example.com/distribution/{}/invalidation/{}",
                request.distribution_id, id
            )),
            id,
            status: "InProgress".to_string(),
            created_time: Utc::now(),
            caller_reference: request.caller_reference.clone(),
            requested_paths: request.paths.clone(),
        };

        invalidations.insert(dedup_key, result.clone());
        Ok(result)
    }
}
