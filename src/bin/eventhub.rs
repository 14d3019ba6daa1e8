#[macro_use]
extern crate log;

use eventhub::api::admin::AdminApi;
use eventhub::api::auth::forward_token_headers;
use eventhub::api::cms::CmsApi;
use eventhub::api::route::EventhubApi;
use eventhub::config;
use eventhub::model::util::UploadStore;
use eventhub::{check_db_connection, connect_db, init_logger};
use dotenv::dotenv;
use log::LevelFilter;
use poem::{
    endpoint::StaticFilesEndpoint,
    handler,
    listener::TcpListener,
    middleware::{AddData, Cors},
    web::{Data, Json},
    EndpointExt, IntoEndpoint, Route, Server,
};
use poem_openapi::OpenApiService;
use serde_json::{json, Value};
use std::sync::Arc;

use structopt::StructOpt;

/// Eventhub backend server.
#[derive(Debug, PartialEq, StructOpt)]
#[structopt(setting=structopt::clap::AppSettings::ColoredHelp, name="eventhub", author="Gastronomi Run Team <dev@gastronomirun.com>")]
struct Opt {
    /// Activate debug mode
    /// short and long flags (--debug) will be deduced from the field's name
    #[structopt(name = "debug", long = "debug")]
    debug: bool,

    /// Activate openapi mode
    #[structopt(name = "openapi", short = "o", long = "openapi")]
    openapi: bool,

    /// Enable CORS for the origins listed in CORS_ORIGINS.
    #[structopt(name = "cors", short = "c", long = "cors")]
    cors: bool,

    /// 127.0.0.1 or 0.0.0.0
    #[structopt(name = "host", short = "H", long = "host", possible_values=&["127.0.0.1", "0.0.0.0"], default_value = "127.0.0.1")]
    host: String,

    /// Which port.
    #[structopt(name = "port", short = "p", long = "port", default_value = "3000")]
    port: String,

    /// Database url, such as postgres:://user:pass@host:port/dbname.
    /// You can also set it with env var: DATABASE_URL.
    #[structopt(name = "database-url", short = "d", long = "database-url")]
    database_url: Option<String>,

    /// Pool size for database connection.
    #[structopt(name = "pool-size", short = "s", long = "pool-size")]
    pool_size: Option<u32>,

    /// JWT secret key used to sign and verify HS256 tokens.
    /// You can also set it with env var: JWT_SECRET_KEY. The server refuses to start without one.
    #[structopt(name = "jwt-secret-key", short = "k", long = "jwt-secret-key")]
    jwt_secret_key: Option<String>,

    /// Directory for uploaded files, served under /uploads.
    /// You can also set it with env var: UPLOAD_DIR.
    #[structopt(name = "upload-dir", long = "upload-dir")]
    upload_dir: Option<String>,

    /// Directory for static assets, served under /static.
    /// You can also set it with env var: STATIC_DIR.
    #[structopt(name = "static-dir", long = "static-dir")]
    static_dir: Option<String>,

    /// Base url used to build links to uploaded files, such as https://api.example.com.
    /// You can also set it with env var: PUBLIC_BASE_URL. Defaults to http://<host>:<port>.
    #[structopt(name = "public-url", long = "public-url")]
    public_url: Option<String>,
}

#[handler]
fn index() -> Json<Value> {
    Json(json!({
        "message": "Eventhub API",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/openapi",
    }))
}

#[handler]
async fn health(pool: Data<&Arc<sqlx::PgPool>>) -> Json<Value> {
    match check_db_connection(&pool).await {
        Ok(_) => Json(json!({"status": "healthy", "database": "connected"})),
        Err(e) => {
            warn!("Health check failed, {}", e);
            Json(json!({"status": "unhealthy", "database": "disconnected", "error": e.to_string()}))
        }
    }
}

#[handler]
fn healthz() -> &'static str {
    "ok"
}

/// Prefer the flag, then the environment; export the result so library code sees it.
fn export_setting(flag: Option<String>, env_key: &str) -> Option<String> {
    match flag {
        Some(v) if !v.trim().is_empty() => {
            std::env::set_var(env_key, v.trim());
            Some(v.trim().to_string())
        }
        _ => match std::env::var(env_key) {
            Ok(v) if !v.trim().is_empty() => Some(v),
            _ => None,
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    dotenv().ok();

    let args = Opt::from_args();

    let log_result = if args.debug {
        init_logger("eventhub", LevelFilter::Debug)
    } else {
        init_logger("eventhub", LevelFilter::Info)
    };

    if let Err(log) = log_result {
        error!(target:"stdout", "Log initialization error, {}", log);
        std::process::exit(1);
    };

    let host = args.host;
    let port = args.port;

    println!("\n\t\t*** Launch eventhub on {}:{} ***", host, port);

    if export_setting(args.jwt_secret_key, config::JWT_SECRET_KEY_ENV).is_none() {
        error!("JWT_SECRET_KEY is not set, please set it with `--jwt-secret-key` or the environment variable.");
        std::process::exit(1);
    }

    export_setting(args.upload_dir, config::UPLOAD_DIR_ENV);
    export_setting(args.static_dir, config::STATIC_DIR_ENV);

    let public_url = export_setting(args.public_url, config::PUBLIC_BASE_URL_ENV)
        .unwrap_or(format!("http://{}:{}", host, port));
    if let Err(e) = config::validate_base_url(&public_url) {
        error!("{}", e);
        std::process::exit(1);
    }
    std::env::set_var(config::PUBLIC_BASE_URL_ENV, &public_url);
    info!("Links to uploaded files use {}", config::public_base_url());

    let upload_dir = config::upload_dir();
    let static_dir = config::static_dir();
    for dir in [&upload_dir, &static_dir] {
        if let Err(e) = std::fs::create_dir_all(dir) {
            error!("Cannot create directory {}, {}", dir.display(), e);
            std::process::exit(1);
        }
    }

    // Connect to database.
    let database_url = match export_setting(args.database_url, "DATABASE_URL") {
        Some(v) => v,
        None => {
            error!("{}", "DATABASE_URL is not set.");
            std::process::exit(1);
        }
    };

    let pool_size = args.pool_size.unwrap_or(10);
    let pool = connect_db(&database_url, pool_size).await;
    let arc_pool = Arc::new(pool);
    let shared_rb = AddData::new(arc_pool.clone());
    let shared_store = AddData::new(UploadStore::uploads());

    match check_db_connection(&arc_pool.clone()).await {
        Ok(_) => (),
        Err(err) => {
            error!("Check database connection failed, {}", err);
            std::process::exit(1);
        }
    };

    let api_service = OpenApiService::new((EventhubApi, CmsApi, AdminApi), "Eventhub", "v0.1.0")
        .summary("A RESTful API Service for Eventhub.")
        .description("Accounts, class registration and marketing-page content for an event organiser.")
        .license("MIT")
        .server(format!("http://{}:{}", host, port));
    let openapi = api_service.swagger_ui();
    let mut spec = api_service.spec();

    // Remove charset=utf-8 from spec for compatibility with Apifox.
    spec = spec.replace("; charset=utf-8", "");

    let route = Route::new()
        .at("/", index)
        .at("/health", health)
        .at("/healthz", healthz)
        .nest("/uploads", StaticFilesEndpoint::new(&upload_dir))
        .nest("/static", StaticFilesEndpoint::new(&static_dir));

    let route = if args.openapi {
        info!("OpenApi mode is enabled. You can access the OpenApi spec at /openapi.");
        route
            .nest("/openapi", openapi)
            .at("/spec", poem::endpoint::make_sync(move |_| spec.clone()))
    } else {
        warn!("OpenApi mode is disabled. If you need the OpenApi, please use `--openapi` flag.");
        route
    };

    let route = route
        .nest_no_strip("/api/v1", api_service.into_endpoint().before(forward_token_headers))
        .with(shared_rb)
        .with(shared_store);

    if args.cors {
        let origins = config::cors_origins();
        info!("CORS mode is enabled for {}.", origins.join(", "));
        let cors = Cors::new().allow_origins(origins).allow_credentials(true);
        Server::new(TcpListener::bind(format!("{}:{}", host, port)))
            .run(route.with(cors))
            .await
    } else {
        warn!("CORS mode is disabled. If you need the CORS, please use `--cors` flag.");
        Server::new(TcpListener::bind(format!("{}:{}", host, port)))
            .run(route)
            .await
    }
}
