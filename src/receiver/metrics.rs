//! OTLP Metrics gRPC service.

use crate::storage::TelemetryStore;
use opentelemetry_proto::tonic::collector::metrics::v1::{
    metrics_service_server::{MetricsService, MetricsServiceServer},
    ExportMetricsServiceRequest, ExportMetricsServiceResponse,
};
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// Create a metrics service server for GRPC
pub fn create_metrics_service_server(
    store: Arc<TelemetryStore>,
    max_message_bytes: usize,
) -> MetricsServiceServer<OtelMetricsReceiver> {
    MetricsServiceServer::new(OtelMetricsReceiver::new(store))
        .max_decoding_message_size(max_message_bytes)
        .max_encoding_message_size(max_message_bytes)
}

/// OTLP Metrics receiver service
pub struct OtelMetricsReceiver {
    store: Arc<TelemetryStore>,
}

impl OtelMetricsReceiver {
    pub fn new(store: Arc<TelemetryStore>) -> Self {
        Self { store }
    }
}

#[tonic::async_trait]
impl MetricsService for OtelMetricsReceiver {
    async fn export(
        &self,
        request: Request<ExportMetricsServiceRequest>,
    ) -> Result<Response<ExportMetricsServiceResponse>, Status> {
        let request = request.into_inner();
        tracing::debug!("Received {} resource metrics via gRPC", request.resource_metrics.len());

        self.store.consume_metrics(request.resource_metrics).await;

        Ok(Response::new(ExportMetricsServiceResponse {
            partial_success: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_proto::tonic::metrics::v1::{
        metric::Data, number_data_point::Value, Gauge, Metric, NumberDataPoint, ResourceMetrics,
        ScopeMetrics,
    };

    #[tokio::test]
    async fn test_export_records_gauge() {
        let store = Arc::new(TelemetryStore::default());
        let receiver = OtelMetricsReceiver::new(Arc::clone(&store));

        let request = ExportMetricsServiceRequest {
            resource_metrics: vec![ResourceMetrics {
                resource: None,
                scope_metrics: vec![ScopeMetrics {
                    scope: None,
                    metrics: vec![Metric {
                        name: "queue_depth".into(),
                        data: Some(Data::Gauge(Gauge {
                            data_points: vec![NumberDataPoint {
                                time_unix_nano: 10,
                                value: Some(Value::AsDouble(4.0)),
                                ..Default::default()
                            }],
                        })),
                        ..Default::default()
                    }],
                    schema_url: String::new(),
                }],
                schema_url: String::new(),
            }],
        };

        receiver.export(Request::new(request)).await.unwrap();

        let series = store.metric_series("queue_depth{}").await.unwrap();
        assert_eq!(series.values, vec![4.0]);
        assert_eq!(store.counts().await.metrics, 1);
    }
}
