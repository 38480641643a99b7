use std::future::{Future, IntoFuture};
use std::pin::pin;
use std::time::Duration;

use anyhow::bail;
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::oneshot;

use crate::config::AppConfig;

/// Ceiling on the graceful drain. In-flight requests that do not finish
/// within this window make the shutdown itself the terminal error.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Bind the configured address and serve until SIGINT or SIGTERM arrives,
/// then drain in-flight requests within the shutdown ceiling.
pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr = config.server_address();
    let listener = TcpListener::bind(&addr).await?;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let signals = async move {
        tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        }
    };

    log::info!("starting server addr={addr} env={}", config.env);
    serve_with_shutdown(listener, app, signals).await?;
    log::info!("stopped server addr={addr}");
    Ok(())
}

/// Serve on an already-bound listener until `signal` resolves to the name
/// of the triggering signal, then drain within the shutdown ceiling.
///
/// Two actors: the serving future owns the accept loop; the signal waiter
/// (inside the graceful-shutdown future) blocks on `signal`, trips the
/// drain, and notifies the serving actor through a one-shot channel so it
/// can arm the deadline. A serve error before any notification is a real
/// listen failure, not a self-inflicted closure.
pub async fn serve_with_shutdown(
    listener: TcpListener,
    app: Router,
    signal: impl Future<Output = &'static str> + Send + 'static,
) -> anyhow::Result<()> {
    let (notify_tx, notify_rx) = oneshot::channel::<()>();

    let shutdown = async move {
        let signal_name = signal.await;
        log::info!("shutting down server signal={signal_name}");
        let _ = notify_tx.send(());
    };

    let mut server = pin!(axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .into_future());

    tokio::select! {
        // The accept loop ended on its own: either a listen failure or an
        // instant drain. Nothing was self-inflicted unless notified below.
        result = &mut server => result?,
        _ = notify_rx => {
            // Shutdown was requested; bound the remaining drain.
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut server).await {
                Ok(result) => result?,
                Err(_) => bail!(
                    "graceful shutdown did not complete within {}s",
                    SHUTDOWN_TIMEOUT.as_secs()
                ),
            }
        }
    }

    Ok(())
}
