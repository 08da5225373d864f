use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use db::{ConnectOpts, DbHandle};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use api_ingress::{ApiIngress, ApiIngressConfig};
use users::{UsersConfig, UsersModule};

mod shutdown;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MEMORY_DSN: &str = "sqlite::memory:";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps in-memory DSNs as `sqlite::memory:`.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> Result<String> {
    if db::is_sqlite_memory(dsn) {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Userhub Server - user management over REST and an interactive console
#[derive(Parser)]
#[command(name = "userhub-server")]
#[command(about = "Userhub Server - user management over REST and an interactive console")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Start the HTTP server
    Run,
    /// Run the interactive console menu
    Console,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        port: cli.port,
        verbose: cli.verbose,
        mock: cli.mock,
    };
    let command = cli.command.unwrap_or(Commands::Run);

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    // The console owns stdout; keep log noise off it unless asked for.
    if command == Commands::Console && args.verbose == 0 {
        if let Some(section) = config
            .logging
            .as_mut()
            .and_then(|logging| logging.get_mut("default"))
        {
            section.console_level = "warn".to_string();
        }
    }

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, &config.home_dir());
    tracing::info!("Userhub Server starting");

    match command {
        Commands::Run => run_server(config, args).await,
        Commands::Console => run_console(config, args).await,
        Commands::Check => check_config(config),
    }
}

/// Detect DB backend from URL scheme.
fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }

    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;

    match url.scheme() {
        "sqlite" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

/// Build the store handle from config, honoring `--mock`.
async fn connect_db(config: &AppConfig, args: &CliArgs) -> Result<DbHandle> {
    let db_config = config.database.clone().unwrap_or_default();

    let final_dsn = if args.mock {
        MEMORY_DSN.to_string()
    } else {
        detect_from_dsn(&db_config)?;
        let dsn = db_config.url.trim().to_owned();
        if dsn.starts_with("sqlite:") {
            absolutize_sqlite_dsn(&dsn, &config.home_dir())?
        } else {
            dsn
        }
    };

    let connect_opts = ConnectOpts {
        max_conns: db_config.max_conns,
        acquire_timeout: Some(Duration::from_secs(5)),
        sqlite_busy_timeout: db_config
            .busy_timeout_ms
            .map(|ms| Duration::from_millis(ms as u64)),
        create_sqlite_dirs: true,
        ..Default::default()
    };

    tracing::info!("Connecting to database: {}", redact_dsn(&final_dsn));
    let db = DbHandle::connect(&final_dsn, connect_opts)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected DB backend: {:?}", db.engine());
    Ok(db)
}

/// Hide the password part of a DSN for logging.
fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        _ => dsn.to_string(),
    }
}

async fn init_users(config: &AppConfig, db: &DbHandle) -> Result<UsersModule> {
    let users_cfg: UsersConfig = config.module_config("users")?;
    let conn = db.sea();
    UsersModule::migrate(&conn)
        .await
        .context("Failed to run users migrations")?;
    Ok(UsersModule::init(conn, &users_cfg))
}

/// The `api_ingress` section, with the request timeout taken from
/// `server.timeout_sec` unless the section sets its own.
fn ingress_config(config: &AppConfig) -> Result<ApiIngressConfig> {
    let mut ingress_cfg: ApiIngressConfig = config.module_config("api_ingress")?;
    ingress_cfg
        .request_timeout_secs
        .get_or_insert(config.server.timeout_sec);
    Ok(ingress_cfg)
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");
    let ingress_cfg = ingress_config(&config)?;
    let db = connect_db(&config, &args).await?;
    let users = init_users(&config, &db).await?;

    let mut ingress = ApiIngress::new(ingress_cfg);
    ingress.register_openapi(users.openapi());
    let router = ingress.build_router(users.register_rest(axum::Router::new()))?;
    let addr = ingress.bind_addr(&format!("{}:{}", config.server.host, config.server.port))?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = shutdown::wait_for_shutdown().await {
            tracing::warn!("shutdown: signal listener failed ({e}); stopping now");
        }
        tracing::info!("shutdown: signal received");
        signal_cancel.cancel();
    });

    let served = ApiIngress::serve(router, addr, cancel).await;

    db.close().await;
    tracing::info!("Userhub Server stopped");
    served
}

async fn run_console(config: AppConfig, args: CliArgs) -> Result<()> {
    let db = connect_db(&config, &args).await?;
    let users = init_users(&config, &db).await?;

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let output = tokio::io::stdout();
    let result = users::api::console::ConsoleApp::new(users.client(), input, output)
        .run()
        .await
        .context("Console I/O failed");

    db.close().await;
    tracing::info!("Application stopped");
    result
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    if let Some(db_config) = &config.database {
        detect_from_dsn(db_config)?;
    }
    let _: UsersConfig = config.module_config("users")?;
    ingress_config(&config)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
