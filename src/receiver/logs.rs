//! OTLP Logs gRPC service.

use crate::storage::TelemetryStore;
use opentelemetry_proto::tonic::collector::logs::v1::{
    logs_service_server::{LogsService, LogsServiceServer},
    ExportLogsServiceRequest, ExportLogsServiceResponse,
};
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// Create a logs service server for GRPC
pub fn create_logs_service_server(
    store: Arc<TelemetryStore>,
    max_message_bytes: usize,
) -> LogsServiceServer<OtelLogsReceiver> {
    LogsServiceServer::new(OtelLogsReceiver::new(store))
        .max_decoding_message_size(max_message_bytes)
        .max_encoding_message_size(max_message_bytes)
}

/// OTLP Logs receiver service
pub struct OtelLogsReceiver {
    store: Arc<TelemetryStore>,
}

impl OtelLogsReceiver {
    pub fn new(store: Arc<TelemetryStore>) -> Self {
        Self { store }
    }
}

#[tonic::async_trait]
impl LogsService for OtelLogsReceiver {
    async fn export(
        &self,
        request: Request<ExportLogsServiceRequest>,
    ) -> Result<Response<ExportLogsServiceResponse>, Status> {
        let request = request.into_inner();
        tracing::debug!("Received {} resource logs via gRPC", request.resource_logs.len());

        self.store.consume_logs(request.resource_logs).await;

        Ok(Response::new(ExportLogsServiceResponse {
            partial_success: None,
        }))
    }
}
