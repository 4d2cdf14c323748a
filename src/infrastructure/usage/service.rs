//! Usage recording service

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::domain::usage::{ResponseFormat, UsageRecord, UsageRepository};

/// Parameters for recording usage
#[derive(Debug, Clone)]
pub struct RecordUsageParams {
    pub credential: String,
    pub principal: String,
    pub endpoint: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status: u16,
    pub elapsed_ms: u64,
    pub format: ResponseFormat,
}

impl RecordUsageParams {
    pub fn new(
        credential: impl Into<String>,
        principal: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            credential: credential.into(),
            principal: principal.into(),
            endpoint: endpoint.into(),
            ip_address: None,
            user_agent: None,
            status: 200,
            elapsed_ms: 0,
            format: ResponseFormat::default(),
        }
    }

    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    pub fn with_outcome(mut self, status: u16, elapsed_ms: u64, format: ResponseFormat) -> Self {
        self.status = status;
        self.elapsed_ms = elapsed_ms;
        self.format = format;
        self
    }
}

/// Best-effort usage metering
///
/// Persistence failures are logged and swallowed; they never reach the
/// request being metered.
#[derive(Clone)]
pub struct UsageRecorder {
    repository: Arc<dyn UsageRepository>,
}

impl UsageRecorder {
    pub fn new(repository: Arc<dyn UsageRepository>) -> Self {
        Self { repository }
    }

    /// Persist one usage record
    pub async fn record(&self, params: RecordUsageParams) {
        let record = UsageRecord::new(params.credential, params.principal, params.endpoint)
            .with_client(params.ip_address, params.user_agent)
            .with_outcome(params.status, params.elapsed_ms, params.format);

        let record_id = record.id().clone();
        let endpoint = record.endpoint.clone();

        match self.repository.record(record).await {
            Ok(()) => {
                debug!(
                    record_id = %record_id,
                    endpoint = %endpoint,
                    status = params.status,
                    elapsed_ms = params.elapsed_ms,
                    "Recorded API usage"
                );
            }
            Err(e) => {
                counter!("usage_record_failures_total").increment(1);
                warn!(
                    record_id = %record_id,
                    endpoint = %endpoint,
                    error = %e,
                    "Failed to record API usage"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::usage::MockUsageRepository;
    use crate::domain::DomainError;
    use crate::infrastructure::usage::InMemoryUsageRepository;

    #[tokio::test]
    async fn test_record_persists_params() {
        let repo = Arc::new(InMemoryUsageRepository::default());
        let recorder = UsageRecorder::new(repo.clone());

        recorder
            .record(
                RecordUsageParams::new("k1-secre", "survey-bureau", "/api/codelists/LAND_USE/entries")
                    .with_client(Some("10.1.2.3".to_string()), Some("curl/8.0".to_string()))
                    .with_outcome(201, 17, ResponseFormat::Xml),
            )
            .await;

        let records = repo.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].response_status, 201);
        assert_eq!(records[0].response_time_ms, 17);
        assert_eq!(records[0].response_format, ResponseFormat::Xml);
        assert_eq!(records[0].user_agent.as_deref(), Some("curl/8.0"));
    }

    #[tokio::test]
    async fn test_record_swallows_repository_failure() {
        let mut repo = MockUsageRepository::new();
        repo.expect_record()
            .times(1)
            .returning(|_| Err(DomainError::storage("disk full")));

        let recorder = UsageRecorder::new(Arc::new(repo));

        // Must complete without panicking or surfacing the error
        recorder
            .record(RecordUsageParams::new("k1", "p", "/api/x"))
            .await;
    }
}
