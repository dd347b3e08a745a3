use std::{future::Future, net::SocketAddr};

use axum::Router;
use tokio::net::TcpListener;

/// Serve `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(app: Router, listener: TcpListener, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!("listening on {:?}", listener.local_addr()?);

    // Connect info is the fallback source of the client ip recorded with each capture.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}
