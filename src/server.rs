use std::{net::SocketAddr, path::Path};

use anyhow::Context;
use axum::{Router, http::StatusCode, routing::get};
use embedded_ui::{EmbeddedBundle, EmbeddedUi, UiConfig};
use rust_embed::RustEmbed;
use tokio::{
    net::{TcpListener, ToSocketAddrs},
    sync::oneshot,
    task::JoinHandle,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

/// The UI bundle, compiled into the binary.
#[derive(RustEmbed)]
#[folder = "ui/"]
struct UiAssets;

pub struct Server {
    trigger_shutdown: oneshot::Sender<()>,
    join_handle: JoinHandle<std::io::Result<()>>,
    local_addr: SocketAddr,
}

impl Server {
    pub async fn new(socket_address: impl ToSocketAddrs, app: Router) -> anyhow::Result<Server> {
        let listener = TcpListener::bind(socket_address)
            .await
            .context("Binding server socket")?;
        let local_addr = listener.local_addr()?;
        let (trigger_shutdown, shutdown_triggered) = oneshot::channel();
        let join_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    // A dropped sender means the same as an explicit trigger.
                    let _ = shutdown_triggered.await;
                })
                .await
        });
        let server = Server {
            trigger_shutdown,
            join_handle,
            local_addr,
        };
        Ok(server)
    }

    /// The address the server actually listens on. Useful if bound to port `0`.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and waits for open requests to complete.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        // The receiver only vanishes if the server task already ended. Its result is reported
        // below.
        let _ = self.trigger_shutdown.send(());
        self.join_handle
            .await
            .context("Server task panicked")?
            .context("Serving http failed")
    }
}

/// The host application: the embedded UI in front of a health check and, optionally, static files
/// served from disk.
pub fn app(ui: UiConfig, static_dir: Option<&Path>) -> Router {
    let downstream = Router::new().route("/health", get(|| async { "OK" }));
    let downstream = match static_dir {
        Some(dir) => downstream.fallback_service(ServeDir::new(dir)),
        None => downstream.fallback(|| async { StatusCode::NOT_FOUND }),
    };
    EmbeddedUi::new(ui, EmbeddedBundle::<UiAssets>::new("ui"))
        .wrap(downstream)
        .layer(TraceLayer::new_for_http())
}
