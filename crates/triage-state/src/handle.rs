//! SurrealDB connection setup
//!
//! Supports in-memory, explicit URL, SurrealDB Cloud (WebSocket) and local
//! on-disk connections. Every connection selects the namespace/database and
//! runs the schema migrations before it is handed out.

use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Surreal;
use tracing::{info, instrument};

use crate::error::StateError;
use crate::migrations;
use crate::Result;

const DEFAULT_NAMESPACE: &str = "triage";
const DEFAULT_DATABASE: &str = "main";

/// Directory used for local persistence when no remote is configured
pub const LOCAL_DB_PATH: &str = ".bugtriage/db";

/// Configuration for SurrealDB Cloud connection
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// WebSocket endpoint URL (e.g., "wss://xxx.aws-use1.surrealdb.cloud")
    pub endpoint: String,
    /// Database username
    pub username: String,
    /// Database password
    pub password: String,
    /// Namespace (default: "triage")
    pub namespace: String,
    /// Database name (default: "main")
    pub database: String,
    /// Whether this is a root user (true) or database user (false)
    pub is_root: bool,
}

impl CloudConfig {
    /// Create a new cloud configuration for a database user
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            is_root: false,
        }
    }

    /// Set custom namespace
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    /// Set custom database
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    /// Set whether this is a root user
    pub fn with_root(mut self, is_root: bool) -> Self {
        self.is_root = is_root;
        self
    }

    /// Read the cloud settings from the process environment.
    ///
    /// `None` unless SURREALDB_ENDPOINT, SURREALDB_USERNAME and
    /// SURREALDB_PASSWORD are all set. SURREALDB_NAMESPACE, SURREALDB_DATABASE
    /// and SURREALDB_ROOT are optional.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`CloudConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(
            lookup("SURREALDB_ENDPOINT")?,
            lookup("SURREALDB_USERNAME")?,
            lookup("SURREALDB_PASSWORD")?,
        );
        if let Some(ns) = lookup("SURREALDB_NAMESPACE") {
            config.namespace = ns;
        }
        if let Some(db) = lookup("SURREALDB_DATABASE") {
            config.database = db;
        }
        config.is_root = lookup("SURREALDB_ROOT").is_some_and(|v| v.eq_ignore_ascii_case("true"));
        Some(config)
    }
}

/// Select `namespace`/`database` on `db` and run the schema migrations.
///
/// Every connection path ends here before the handle is returned.
async fn select_and_migrate(db: &Surreal<Any>, namespace: &str, database: &str) -> Result<()> {
    db.use_ns(namespace).use_db(database).await.map_err(|e| {
        StateError::Connection(format!(
            "Failed to select namespace {}/database {}: {}",
            namespace, database, e
        ))
    })?;
    migrations::init_schema(db).await
}

/// Connect to `url`, select the default namespace/database and migrate.
async fn connect_url(url: &str) -> Result<Surreal<Any>> {
    let db = surrealdb::engine::any::connect(url)
        .await
        .map_err(|e| StateError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

    select_and_migrate(&db, DEFAULT_NAMESPACE, DEFAULT_DATABASE).await?;
    Ok(db)
}

/// Connect to a fresh in-memory database.
#[instrument(skip_all)]
pub async fn connect_in_memory() -> Result<Surreal<Any>> {
    let db = connect_url("mem://").await?;
    info!("SurrealDB connected (in-memory)");
    Ok(db)
}

/// Connect to SurrealDB Cloud.
#[instrument(skip(config), fields(endpoint = %config.endpoint, namespace = %config.namespace, database = %config.database))]
pub async fn connect_cloud(config: &CloudConfig) -> Result<Surreal<Any>> {
    info!("Connecting to SurrealDB Cloud (root={})", config.is_root);

    let db = surrealdb::engine::any::connect(&config.endpoint)
        .await
        .map_err(|e| {
            StateError::Connection(format!("Failed to connect to {}: {}", config.endpoint, e))
        })?;

    if config.is_root {
        db.signin(Root {
            username: &config.username,
            password: &config.password,
        })
        .await
        .map_err(|e| StateError::Connection(format!("Root authentication failed: {}", e)))?;
    } else {
        db.signin(Database {
            namespace: &config.namespace,
            database: &config.database,
            username: &config.username,
            password: &config.password,
        })
        .await
        .map_err(|e| StateError::Connection(format!("Database authentication failed: {}", e)))?;
    }

    select_and_migrate(&db, &config.namespace, &config.database).await?;
    info!("SurrealDB Cloud connected and schema initialized");
    Ok(db)
}

/// Connect using environment variables
///
/// If SURREALDB_ENDPOINT is set, connects to cloud.
/// If SURREALDB_URL is set, connects to that URL.
/// Otherwise, falls back to local persistence under [`LOCAL_DB_PATH`].
#[instrument(skip_all)]
pub async fn connect_from_env() -> Result<Surreal<Any>> {
    if let Some(config) = CloudConfig::from_env() {
        return connect_cloud(&config).await;
    }

    if let Ok(url) = std::env::var("SURREALDB_URL") {
        info!("SURREALDB_URL found, connecting to {}", url);
        return connect_url(&url).await;
    }

    std::fs::create_dir_all(LOCAL_DB_PATH).map_err(|e| {
        StateError::Connection(format!(
            "Failed to create database directory {}: {}",
            LOCAL_DB_PATH, e
        ))
    })?;
    let url = format!("surrealkv://{}", LOCAL_DB_PATH);
    info!(
        "No cloud config or SURREALDB_URL found, using local persistence: {}",
        url
    );
    connect_url(&url).await
}
