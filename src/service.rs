use std::{sync::Arc, time::Duration};

use tokio::{sync::Semaphore, task, time::timeout};

use crate::{
    config::WorkerConfig,
    protocol::{CombinationRequest, CombinationResponse, ControlRecord, parse_request},
    resilience::TierAggregator,
};

/// Request handler shared by every connection. Engine work runs on the
/// blocking pool, at most `max_in_flight` at a time.
#[derive(Clone)]
pub struct ResilienceService {
    aggregator: Arc<TierAggregator>,
    permits: Arc<Semaphore>,
    request_timeout: Duration,
}

impl ResilienceService {
    pub fn new(aggregator: TierAggregator, worker: &WorkerConfig) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            permits: Arc::new(Semaphore::new(worker.max_in_flight.max(1))),
            request_timeout: Duration::from_millis(worker.request_timeout_ms.max(1)),
        }
    }

    pub async fn handle_line(&self, line: &str) -> CombinationResponse {
        let request = match parse_request(line) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(target: "service", error = %err, "malformed_request");
                return CombinationResponse::Failure(ControlRecord::malformed(&err));
            }
        };

        self.handle_request(request).await
    }

    #[tracing::instrument(
        name = "handle_request",
        target = "service",
        skip(self, request),
        fields(
            operators = request.operators.len(),
            required_bandwidth = request.required_bandwidth,
            resiliency_level = %request.resiliency_level,
        )
    )]
    pub async fn handle_request(&self, request: CombinationRequest) -> CombinationResponse {
        if let Err(record) = request.validate(self.aggregator.max_operators()) {
            tracing::info!(
                target: "service",
                code = record.code.as_u16(),
                message = %record.message,
                "request_rejected"
            );
            return CombinationResponse::Failure(record);
        }

        let permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(err) => return CombinationResponse::Failure(ControlRecord::computation_failed(err)),
        };

        let aggregator = Arc::clone(&self.aggregator);
        let worker = task::spawn_blocking(move || {
            let _permit = permit;
            let requirement = request.requirement();
            aggregator
                .resolve(&request.operators, &requirement)
                .map(|result| CombinationResponse::from_result(&request.operators, &result))
        });

        let response = match timeout(self.request_timeout, worker).await {
            Ok(Ok(Ok(response))) => response,
            Ok(Ok(Err(engine_err))) => CombinationResponse::from_engine_error(&engine_err),
            Ok(Err(join_err)) => CombinationResponse::Failure(ControlRecord::computation_failed(
                format!("worker failed: {join_err}"),
            )),
            Err(_) => CombinationResponse::Failure(ControlRecord::computation_failed(format!(
                "computation exceeded {} ms",
                self.request_timeout.as_millis()
            ))),
        };

        match &response {
            CombinationResponse::Combinations(combinations) => tracing::info!(
                target: "service",
                combinations = combinations.len(),
                "request_resolved"
            ),
            CombinationResponse::Failure(record) => tracing::warn!(
                target: "service",
                code = record.code.as_u16(),
                message = %record.message,
                "request_failed"
            ),
        }

        response
    }
}
