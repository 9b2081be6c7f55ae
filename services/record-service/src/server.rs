//! gRPC listener.

use kubeprac_proto::record::v1::record_service_server::RecordServiceServer;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::info;

use crate::error::Result;
use crate::services::RecordServiceImpl;

/// Bind `addr` and serve `service` until `shutdown` resolves.
///
/// # Errors
///
/// Returns error if the port cannot be bound or the transport fails.
pub async fn serve<F>(addr: SocketAddr, service: RecordServiceImpl, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind(addr).await?;
    serve_with_listener(listener, service, shutdown).await
}

/// Serve `service` on an already bound listener until `shutdown` resolves.
///
/// # Errors
///
/// Returns error if the transport fails.
pub async fn serve_with_listener<F>(
    listener: TcpListener,
    service: RecordServiceImpl,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    let addr = listener.local_addr()?;
    info!(%addr, "Record service listening");

    Server::builder()
        .add_service(RecordServiceServer::new(service))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;

    info!("Record service stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
