mod api;
mod config;
mod scan;
mod state;
mod utils;

use api::app_router;
use config::{apply_env_overrides, config_path_from_env, load_or_create_config, resolve_path};
use library::{Library, ScanSettings};
use scan::start_startup_scan;
use state::AppState;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (mut config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }
    apply_env_overrides(&mut config);

    let media_root = resolve_path(&config_path, config.media_root.trim());
    std::fs::create_dir_all(&media_root)?;
    let index_path = resolve_path(&config_path, config.index_path.trim());
    let static_dir = resolve_path(&config_path, config.static_dir.trim());

    let settings = ScanSettings::new(&config.allowed_extensions);
    let library = Library::open(media_root.clone(), &index_path, settings)?;
    info!(
        "Media root {:?}, catalog {:?}, extensions {:?}",
        media_root,
        index_path,
        library.settings().allowed_extensions()
    );

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let scan_on_start = config.scan_on_start;
    let state = AppState::new(config, library, static_dir);

    if scan_on_start {
        start_startup_scan(state.clone());
    } else {
        info!("Startup scan disabled; POST /scan to index the media root.");
    }

    let app = app_router(state)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                warn!("Failed to install terminate signal handler: {}", err);
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
        }
    }

    info!("Shutdown signal received.");
}
