use tokio::signal::ctrl_c;
use tracing::info;

/// Completes once the process is asked to terminate, either by Ctrl+C or, on unix, by `SIGTERM`
/// (e.g. container stop).
///
/// Awaiting this function installs the signal handlers. Awaiting the returned future waits for
/// the signal itself. This way the handlers are in place before the server starts accepting
/// connections.
pub async fn shutdown_signal() -> impl Future<Output = ()> {
    let interrupt = async {
        ctrl_c().await.expect("failed to install Ctrl+C handler");
        "interrupt"
    };

    #[cfg(unix)]
    let terminate = {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        async move {
            sigterm.recv().await;
            "terminate"
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    async move {
        let received = tokio::select! {
            name = interrupt => name,
            name = terminate => name,
        };
        info!(signal = received, "Shutting down");
    }
}
