use axum::{routing::get, Router};
use clap::Parser;
use sql_table_editor::config::{DEFAULT_BASE_PATH, DEFAULT_BIND_ADDRESS};
use sql_table_editor::{EditorConfig, TableEditorLayer};
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod database;

#[derive(Debug, Parser)]
#[command(name = "example-server")]
#[command(about = "Serve the SQL table editor over a local SQLite file")]
struct Arguments {
    /// SQLite database file to browse (created and seeded if missing)
    #[arg(long, env = "TABLE_EDITOR_DATABASE", default_value = "./data/example.db")]
    database: PathBuf,

    /// JSON file bookmarks are stored in
    #[arg(long, env = "TABLE_EDITOR_BOOKMARKS", default_value = "bookmarks.json")]
    bookmarks: PathBuf,

    /// URL path the editor is mounted under
    #[arg(long, env = "TABLE_EDITOR_BASE_PATH", default_value = DEFAULT_BASE_PATH)]
    base_path: String,

    /// Address to listen on
    #[arg(long, env = "TABLE_EDITOR_BIND", default_value = DEFAULT_BIND_ADDRESS)]
    bind: SocketAddr,
}

impl From<Arguments> for EditorConfig {
    fn from(arguments: Arguments) -> Self {
        EditorConfig::new(arguments.database)
            .with_bookmark_path(arguments.bookmarks)
            .with_base_path(arguments.base_path)
            .with_bind_address(arguments.bind)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "sql_table_editor=debug,example_server=debug,tower_http=debug"
                .parse()
                .expect("valid filter")
        }))
        .with(fmt::layer())
        .init();

    let config = EditorConfig::from(Arguments::parse());

    // Create the database file and seed sample data
    database::setup(&config.database_path)
        .await
        .expect("Failed to setup database");

    let app = Router::new()
        .route("/", get(root_handler))
        .merge(TableEditorLayer::from_config(&config).into_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .expect("Failed to bind listen address");

    tracing::info!(
        address = %config.bind_address,
        api = %format!("http://{}{}/api/tables", config.bind_address, config.base_path),
        database = %config.database_path.display(),
        "Table editor running"
    );

    axum::serve(listener, app).await.expect("Server error");
}

async fn root_handler() -> &'static str {
    "Welcome to the sql-table-editor example server"
}
