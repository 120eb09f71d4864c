use std::{env, fs::OpenOptions, net::SocketAddr, process::exit, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use time::OffsetDateTime;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use spendwise::{
    AppState, PaginationConfig, SharedConnection, build_router, delete_expired_sessions,
    get_local_offset, graceful_shutdown, logging_middleware,
};

/// The REST API server for spendwise.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The canonical name of the local timezone, e.g. "Pacific/Auckland".
    /// Decides which day is "today" for the analytics endpoints.
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// The number of expenses to return when a request does not set a limit.
    #[arg(long, default_value_t = 50)]
    page_size: u32,
}

/// How often expired sessions are removed from the database.
const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let secret = match env::var("SECRET") {
        Ok(secret) => secret,
        Err(_) => {
            tracing::error!("The environment variable 'SECRET' must be set");
            exit(1);
        }
    };

    if get_local_offset(&args.timezone).is_none() {
        tracing::error!("Invalid timezone {}", args.timezone);
        exit(1);
    }

    let connection = match Connection::open(&args.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not open database at {}: {error}", args.db_path);
            exit(1);
        }
    };

    let state = match AppState::new(
        connection,
        &secret,
        &args.timezone,
        PaginationConfig {
            default_page_size: args.page_size,
        },
    ) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not initialize the database: {error}");
            exit(1);
        }
    };

    tokio::spawn(prune_expired_sessions(state.db_connection.clone()));

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    tracing::info!("HTTP server listening on {}", addr);

    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server error: {error}");
        exit(1);
    }
}

async fn prune_expired_sessions(db_connection: SharedConnection) {
    let mut interval = tokio::time::interval(SESSION_PRUNE_INTERVAL);

    loop {
        interval.tick().await;

        let connection = match db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return;
            }
        };

        if let Err(error) = delete_expired_sessions(OffsetDateTime::now_utc(), &connection) {
            tracing::error!("Could not delete expired sessions: {error}");
        }
    }
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
    {
        Ok(file) => file,
        Err(error) => {
            eprintln!("Could not create log file: {error}");
            exit(1);
        }
    };

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
