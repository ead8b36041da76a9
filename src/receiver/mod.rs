//! OpenTelemetry receiver implementation.
//!
//! gRPC (default port 4317) and HTTP (default port 4318) listeners that decode
//! OTLP exports and hand the batches to the [`TelemetryStore`]. Malformed
//! requests are rejected here and never reach the store.

pub mod http;
pub mod logs;
pub mod metrics;

use crate::core::config::ServerConfig;
use crate::core::{OteluiError, Result};
use crate::storage::TelemetryStore;
use opentelemetry_proto::tonic::collector::trace::v1::{
    trace_service_server::{TraceService, TraceServiceServer},
    ExportTraceServiceRequest, ExportTraceServiceResponse,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tonic::{transport::Server, Request, Response, Status};

/// OpenTelemetry receiver supporting both GRPC and HTTP protocols.
#[derive(Clone)]
pub struct OtelReceiver {
    store: Arc<TelemetryStore>,
    config: ServerConfig,
}

impl OtelReceiver {
    pub fn new(store: Arc<TelemetryStore>, config: ServerConfig) -> Self {
        Self { store, config }
    }

    pub fn grpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.config.bind_address, self.config.grpc_port)
    }

    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.config.bind_address, self.config.http_port)
    }

    /// Run both receivers until `shutdown` flips to `true` or one of them fails
    pub async fn run(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> Result<()> {
        tracing::info!(
            "Starting OTEL receivers on {} (GRPC) and {} (HTTP)",
            self.grpc_addr(),
            self.http_addr()
        );

        tokio::try_join!(
            Arc::clone(&self).start_grpc(self.grpc_addr(), shutdown.clone()),
            Arc::clone(&self).start_http(self.http_addr(), shutdown),
        )?;

        tracing::info!("OTEL receivers stopped");
        Ok(())
    }

    /// Start the GRPC server with the trace, logs and metrics services.
    pub async fn start_grpc(
        self: Arc<Self>,
        addr: SocketAddr,
        shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let limit = self.config.max_message_bytes;
        let trace_service = TraceServiceServer::new(GrpcTraceService {
            store: Arc::clone(&self.store),
        })
        .max_decoding_message_size(limit)
        .max_encoding_message_size(limit);

        tracing::info!("GRPC server binding to {}", addr);

        Server::builder()
            .add_service(trace_service)
            .add_service(logs::create_logs_service_server(Arc::clone(&self.store), limit))
            .add_service(metrics::create_metrics_service_server(Arc::clone(&self.store), limit))
            .serve_with_shutdown(addr, wait_for_shutdown(shutdown))
            .await
            .map_err(|e| {
                tracing::error!("GRPC server error: {} (binding to {})", e, addr);
                OteluiError::network(format!("Failed to start GRPC server on {addr}: {e}"))
            })?;

        tracing::info!("GRPC server stopped gracefully");
        Ok(())
    }

    /// Start the HTTP server.
    pub async fn start_http(
        self: Arc<Self>,
        addr: SocketAddr,
        shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let app = http::create_http_router(Arc::clone(&self.store), self.config.max_message_bytes);

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            OteluiError::network(format!("Failed to bind HTTP server to {addr}: {e}"))
        })?;

        tracing::info!("HTTP OTLP receiver listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await
            .map_err(|e| OteluiError::network(format!("HTTP server error: {e}")))?;

        tracing::info!("HTTP server stopped gracefully");
        Ok(())
    }
}

/// Resolves once the shutdown flag is set or its sender is gone
pub(crate) async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// OTLP Trace gRPC service
pub struct GrpcTraceService {
    store: Arc<TelemetryStore>,
}

#[tonic::async_trait]
impl TraceService for GrpcTraceService {
    async fn export(
        &self,
        request: Request<ExportTraceServiceRequest>,
    ) -> std::result::Result<Response<ExportTraceServiceResponse>, Status> {
        let request = request.into_inner();
        tracing::debug!("Received {} resource spans via gRPC", request.resource_spans.len());

        self.store.consume_traces(request.resource_spans).await;

        Ok(Response::new(ExportTraceServiceResponse {
            partial_success: None,
        }))
    }
}
