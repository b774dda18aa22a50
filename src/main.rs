use anyhow::{bail, Context, Result};
use axum::{serve, Router};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use pharmacy_kiosk::core::config::Config;
use pharmacy_kiosk::core::startup::build_store;
use pharmacy_kiosk::core::state::AppState;
use pharmacy_kiosk::core::{routes, tracing_init};
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::{TcpListener, UnixListener};
use tokio::signal;
use tokio::task::JoinHandle;
use tower::{Service, ServiceBuilder};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, warn, Level};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let config_path = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("config.toml")
    };

    // Load and validate configuration
    let config = Config::from_file(&config_path).context(format!(
        "Failed to load configuration from '{}'",
        config_path.display()
    ))?;

    tracing_init::init_tracing(&config.logging);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.num_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config, config_path))
}

async fn async_main(config: Config, config_path: PathBuf) -> Result<()> {
    info!(
        config_path = %config_path.display(),
        port = ?config.server.port,
        unix_socket = ?config.server.unix_socket,
        num_threads = config.server.num_threads,
        backend = ?config.storage.backend,
        access_cooldown = config.eligibility.access_cooldown,
        dispense_cooldown = config.eligibility.dispense_cooldown,
        "Pharmacy kiosk service starting"
    );

    let store = build_store(&config.storage).context("Failed to initialize storage")?;

    let state = AppState::new(config.clone(), store);

    info!(backend = state.store.backend(), "Pharmacy kiosk service startup complete");

    let app = routes::build_router(Arc::new(state)).layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        ),
    );

    let tcp = match config.server.port {
        Some(port) => Some(serve_tcp(app.clone(), port).await?),
        None => None,
    };

    let unix = match &config.server.unix_socket {
        Some(path) => Some(serve_unix(app, path)?),
        None => None,
    };

    info!("Kiosk API ready, waiting for shutdown signal");

    // The first listener to stop takes the process down with it
    let (listener, result) = match (tcp, unix) {
        (Some(tcp), Some(unix)) => tokio::select! {
            result = tcp => ("tcp", result),
            result = unix => ("unix", result),
        },
        (Some(tcp), None) => ("tcp", tcp.await),
        (None, Some(unix)) => ("unix", unix.await),
        (None, None) => bail!("No listeners configured"),
    };

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(listener, error = %e, "Listener failed"),
        Err(e) => error!(listener, error = %e, "Listener task panicked"),
    }

    info!("Shutting down gracefully");

    Ok(())
}

async fn serve_tcp(app: Router, port: u16) -> Result<JoinHandle<Result<()>>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind TCP listener to {}", addr))?;

    info!(address = %addr, "TCP listener bound");

    Ok(tokio::spawn(async move {
        serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("TCP server error")
    }))
}

fn serve_unix(app: Router, path: &Path) -> Result<JoinHandle<Result<()>>> {
    // Stale socket from a previous run
    if path.exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to remove existing Unix socket: {}", path.display()))?;
    }

    let listener = UnixListener::bind(path)
        .context(format!("Failed to bind Unix socket listener to {}", path.display()))?;

    info!(path = %path.display(), "Unix socket listener bound");

    Ok(tokio::spawn(accept_unix(listener, app)))
}

async fn accept_unix(listener: UnixListener, app: Router) -> Result<()> {
    let mut make_service = app.into_make_service();

    loop {
        let (socket, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "Failed to accept Unix socket connection");
                continue;
            }
        };

        let tower_service = match make_service.call(&socket).await {
            Ok(svc) => svc,
            Err(infallible) => match infallible {},
        };

        tokio::spawn(async move {
            let io = TokioIo::new(socket);
            let hyper_service = service_fn(move |request: Request<Incoming>| {
                tower_service.clone().call(request)
            });

            if let Err(e) = auto::Builder::new(TokioExecutor::new())
                .serve_connection_with_upgrades(io, hyper_service)
                .await
            {
                warn!(error = %e, "Error serving Unix socket connection");
            }
        });
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
