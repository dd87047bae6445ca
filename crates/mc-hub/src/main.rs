use axum::{
    extract::State,
    routing::{delete, get, post, put},
    Json, Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mc_core::{Combinator, FilterEngine, DEFAULT_PROJECTABLE_KEYS};

mod api;
mod auth;
mod error;
mod import;
mod pages;
mod store;
mod validation;

use auth::{CasValidator, SsoConfig, TicketValidator};
use import::{ImportConfig, ImportJob, ImportStatus};
use store::{JsonFileStore, RecordStore};

// =============================================================================
// CLI
// =============================================================================

#[derive(Parser)]
#[command(
    name = "mc-hub",
    version,
    about = "MemberConnect directory backend"
)]
struct Args {
    /// Server bind address (the PORT environment variable overrides the port)
    #[arg(long, default_value = "0.0.0.0:9696")]
    bind: String,

    /// Path to config file
    #[arg(long, default_value = "memberconnect.toml")]
    config: PathBuf,

    /// Directory holding people.json and achievements.json
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Static front end directory (overrides `[server] public_dir`)
    #[arg(long)]
    public_dir: Option<PathBuf>,
}

// =============================================================================
// Config
// =============================================================================

#[derive(Deserialize, Default, Clone, Debug)]
struct Config {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    query: QueryConfig,
    #[serde(default)]
    sso: SsoConfig,
    #[serde(default)]
    import: ImportConfig,
}

#[derive(Deserialize, Clone, Debug)]
struct ServerConfig {
    /// Static front end, served as the fallback.
    #[serde(default = "default_public_dir")]
    public_dir: PathBuf,
    /// Pages only shown after SSO (authenticated.html, admin.html).
    #[serde(default = "default_pages_dir")]
    pages_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            public_dir: default_public_dir(),
            pages_dir: default_pages_dir(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
struct QueryConfig {
    #[serde(default = "default_projectable_keys")]
    projectable_keys: Vec<String>,
    #[serde(default)]
    combinator: Combinator,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            projectable_keys: default_projectable_keys(),
            combinator: Combinator::default(),
        }
    }
}

impl QueryConfig {
    fn engine(&self) -> FilterEngine {
        FilterEngine::new(self.projectable_keys.iter().cloned()).with_combinator(self.combinator)
    }
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}
fn default_pages_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_projectable_keys() -> Vec<String> {
    DEFAULT_PROJECTABLE_KEYS.iter().map(|k| k.to_string()).collect()
}

fn load_config(path: &Path) -> Config {
    if !path.exists() {
        tracing::info!("No config at {:?}, using defaults", path);
        return Config::default();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Cannot read config {:?}: {}. Using defaults", path, e);
            return Config::default();
        }
    };
    toml::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!("Invalid config {:?}: {}. Using defaults", path, e);
        Config::default()
    })
}

/// Parse the bind address, letting `PORT` replace its port.
fn resolve_bind(bind: &str, port: Option<&str>) -> Result<SocketAddr, String> {
    let mut addr: SocketAddr = bind
        .parse()
        .map_err(|e| format!("invalid bind address '{}': {}", bind, e))?;
    if let Some(port) = port {
        let port: u16 = port
            .trim()
            .parse()
            .map_err(|e| format!("invalid PORT '{}': {}", port, e))?;
        addr.set_port(port);
    }
    Ok(addr)
}

// =============================================================================
// Application State
// =============================================================================

struct AppState {
    start_time: Instant,
    config: Config,
    engine: FilterEngine,
    people: Arc<dyn RecordStore>,
    achievements: Arc<dyn RecordStore>,
    validator: Arc<dyn TicketValidator>,
    import_status: Arc<RwLock<ImportStatus>>,
}

#[derive(Serialize)]
struct SystemStatus {
    version: &'static str,
    uptime_seconds: u64,
    people: usize,
    achievements: usize,
    combinator: Combinator,
    projectable_keys: Vec<String>,
    import_enabled: bool,
    import: ImportStatus,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "mc_hub=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = load_config(&args.config);
    if let Some(dir) = args.public_dir.clone() {
        config.server.public_dir = dir;
    }

    let addr = match resolve_bind(&args.bind, std::env::var("PORT").ok().as_deref()) {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let people: Arc<dyn RecordStore> = match JsonFileStore::open(&args.data_dir, "people").await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("Failed to open people store: {}", e);
            std::process::exit(1);
        }
    };
    let achievements: Arc<dyn RecordStore> =
        match JsonFileStore::open(&args.data_dir, "achievements").await {
            Ok(s) => Arc::new(s),
            Err(e) => {
                tracing::error!("Failed to open achievements store: {}", e);
                std::process::exit(1);
            }
        };

    let validator: Arc<dyn TicketValidator> = match CasValidator::new(&config.sso) {
        Ok(v) => Arc::new(v),
        Err(e) => {
            tracing::error!("Failed to build SSO client: {}", e);
            std::process::exit(1);
        }
    };

    let import_status = Arc::new(RwLock::new(ImportStatus::default()));
    if config.import.enabled {
        let job = ImportJob::new(config.import.clone(), people.clone(), import_status.clone());
        tokio::spawn(job.run());
    }

    let state = Arc::new(AppState {
        start_time: Instant::now(),
        engine: config.query.engine(),
        config: config.clone(),
        people,
        achievements,
        validator,
        import_status,
    });

    let app = router(state);

    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    tracing::info!("  MemberConnect v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("  Directory:  http://{}", addr);
    tracing::info!("  Query:      http://{}/data/<segment>", addr);
    tracing::info!("  Data dir:   {:?}", args.data_dir);
    tracing::info!("  Combinator: {:?}", config.query.combinator);
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Cannot bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn router(state: Arc<AppState>) -> Router {
    let public_dir = state.config.server.public_dir.clone();

    Router::new()
        // Pages
        .route("/", get(pages::index))
        .route("/admin", get(pages::admin))
        .route("/profile", get(pages::profile))
        .route("/new", get(pages::new_member))
        .route("/test", get(pages::test_page))
        // Query
        .route("/data", get(api::query_people))
        .route("/data/", get(api::query_people))
        .route("/data/:param", get(api::query_people))
        .route("/test/:param", get(api::query_people))
        // People
        .route("/user/:id", get(api::user_by_handle))
        .route("/getMember/:id", get(api::get_member))
        .route("/create", post(api::create_person))
        .route("/edit", put(api::edit_person).delete(api::delete_person))
        // Achievements
        .route("/achievements", get(api::list_achievements))
        .route("/achievements/:user", get(api::list_achievements))
        .route("/achievements/create", post(api::create_achievement))
        .route("/achievements/edit", put(api::edit_achievement))
        .route("/achievements/delete", delete(api::delete_achievement))
        .route("/api/status", get(api_status))
        // Static UI
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn api_status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        people: state.people.len().await,
        achievements: state.achievements.len().await,
        combinator: state.engine.combinator(),
        projectable_keys: state.engine.projectable_keys().to_vec(),
        import_enabled: state.config.import.enabled,
        import: state.import_status.read().await.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use mc_core::Record;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct FixedTicket;

    #[async_trait::async_trait]
    impl TicketValidator for FixedTicket {
        async fn validate(&self, ticket: &str, _service: &str) -> Option<String> {
            (ticket == "good").then(|| "keala".to_string())
        }
    }

    struct DownStore;

    fn down() -> StoreError {
        StoreError::Unavailable {
            collection: "people".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "connection refused"),
        }
    }

    #[async_trait::async_trait]
    impl RecordStore for DownStore {
        fn name(&self) -> &str {
            "people"
        }
        async fn fetch_all(&self) -> Result<Vec<Record>, StoreError> {
            Err(down())
        }
        async fn insert(&self, _record: Record) -> Result<Record, StoreError> {
            Err(down())
        }
        async fn update(&self, _k: &str, _v: &str, _p: Record) -> Result<Record, StoreError> {
            Err(down())
        }
        async fn delete_where(&self, _c: &[(String, String)]) -> Result<Record, StoreError> {
            Err(down())
        }
        async fn reload(&self) -> Result<usize, StoreError> {
            Err(down())
        }
        async fn len(&self) -> usize {
            0
        }
    }

    fn people() -> Vec<Record> {
        Record::list_from_json(
            &json!([
                {"_id": 1, "first_name": "Keala", "email": "a@x.edu", "role": "admin"},
                {"_id": 2, "first_name": "Noe", "email": "b@x.edu", "role": "student"},
            ])
            .to_string(),
        )
        .unwrap()
    }

    struct Harness {
        app: Router,
        _dir: tempfile::TempDir,
    }

    fn harness_with(people: Arc<dyn RecordStore>, query: QueryConfig) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let public_dir = dir.path().join("public");
        std::fs::create_dir_all(&public_dir).unwrap();
        std::fs::write(public_dir.join("index.html"), "<h1>directory</h1>").unwrap();
        std::fs::write(public_dir.join("app.js"), "console.log(1)").unwrap();
        std::fs::write(dir.path().join("authenticated.html"), "<h1>welcome</h1>").unwrap();
        std::fs::write(dir.path().join("admin.html"), "<h1>admin</h1>").unwrap();

        let config = Config {
            server: ServerConfig {
                public_dir,
                pages_dir: dir.path().to_path_buf(),
            },
            query,
            ..Config::default()
        };
        let state = Arc::new(AppState {
            start_time: Instant::now(),
            engine: config.query.engine(),
            config,
            people,
            achievements: Arc::new(JsonFileStore::in_memory("achievements", Vec::new())),
            validator: Arc::new(FixedTicket),
            import_status: Arc::new(RwLock::new(ImportStatus::default())),
        });
        Harness {
            app: router(state),
            _dir: dir,
        }
    }

    fn harness() -> Harness {
        harness_with(
            Arc::new(JsonFileStore::in_memory("people", people())),
            QueryConfig::default(),
        )
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, String) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let (status, body) = send(app, Request::get(uri).body(Body::empty()).unwrap()).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn ids(value: &Value) -> Vec<i64> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["_id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_data_without_segment_returns_everything() {
        let h = harness();
        let (status, body) = get_json(&h.app, "/data").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_data_bare_and_keyed_terms() {
        let h = harness();
        assert_eq!(ids(&get_json(&h.app, "/data/admin").await.1), vec![1]);
        assert_eq!(ids(&get_json(&h.app, "/data/role=stud").await.1), vec![2]);
        assert_eq!(ids(&get_json(&h.app, "/data/nobody%7Cb%40x").await.1), vec![2]);
        assert_eq!(ids(&get_json(&h.app, "/test/KEALA").await.1), vec![1]);
    }

    #[tokio::test]
    async fn test_data_projection() {
        let h = harness();
        let (status, body) = get_json(&h.app, "/data/email").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"email": "a@x.edu"}, {"email": "b@x.edu"}]));
    }

    #[tokio::test]
    async fn test_data_invalid_key() {
        let h = harness();
        let (status, body) = get_json(&h.app, "/data/zzz=admin").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!([{"errorCode": "404", "message": "\"zzz is not a valid key value.\""}])
        );
    }

    #[tokio::test]
    async fn test_data_trailing_slash_returns_everything() {
        let h = harness();
        let (status, body) = get_json(&h.app, "/data/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_data_optional_field_is_filterable() {
        let sparse = Record::list_from_json(
            &json!([{"_id": 1, "video": "yt-a"}, {"_id": 2}, {"_id": 3, "video": "vimeo"}])
                .to_string(),
        )
        .unwrap();
        let h = harness_with(
            Arc::new(JsonFileStore::in_memory("people", sparse)),
            QueryConfig::default(),
        );

        let (status, body) = get_json(&h.app, "/data/video=yt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![1]);

        // a key no record has still fails, and only that key is reported
        let (status, body) = get_json(&h.app, "/data/video=yt%7Czzz=1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!([{"errorCode": "404", "message": "\"zzz is not a valid key value.\""}])
        );
    }

    #[tokio::test]
    async fn test_data_all_combinator_from_config() {
        let h = harness_with(
            Arc::new(JsonFileStore::in_memory("people", people())),
            QueryConfig {
                combinator: Combinator::All,
                ..QueryConfig::default()
            },
        );
        assert_eq!(ids(&get_json(&h.app, "/data/x.edu%7Crole=stud").await.1), vec![2]);
        assert_eq!(get_json(&h.app, "/data/admin%7Cstudent").await.1, json!([]));
    }

    #[tokio::test]
    async fn test_store_outage_is_503() {
        let h = harness_with(Arc::new(DownStore), QueryConfig::default());
        let (status, body) = get_json(&h.app, "/data/admin").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("unavailable"));
    }

    #[tokio::test]
    async fn test_user_and_member_lookup() {
        let h = harness();
        assert_eq!(ids(&get_json(&h.app, "/user/b").await.1), vec![2]);
        assert_eq!(get_json(&h.app, "/user/zz").await.1, json!([]));

        let (status, body) = get_json(&h.app, "/getMember/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["first_name"], "Keala");
        assert_eq!(get_json(&h.app, "/getMember/9").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_edit_delete_member() {
        let h = harness();
        let new_member = json!({
            "first_name": "Lani",
            "last_name": "Akana",
            "affiliation": "UH Hilo",
            "role": "faculty",
            "email": "lani@hawaii.edu"
        });
        let (status, body) = send(&h.app, json_request("POST", "/create", new_member)).await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Value = serde_json::from_str(&body).unwrap();
        let id = created["_id"].as_str().unwrap().to_string();

        let (_, found) = get_json(&h.app, "/data/role=faculty").await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let mut edited = created.clone();
        edited["role"] = json!("emeritus");
        edited["full_name"] = json!("Lani Akana");
        let (status, body) = send(&h.app, json_request("PUT", "/edit", edited)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("emeritus"));

        let (status, _) = send(&h.app, json_request("DELETE", "/edit", json!({"_id": id}))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&h.app, json_request("DELETE", "/edit", json!({"_id": id}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&h.app, json_request("DELETE", "/edit", json!({}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_create_accepts_form_body() {
        let h = harness();
        let req = Request::post("/create")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(
                "first_name=Kai&last_name=Lee&affiliation=UH&role=staff&email=kai%40hawaii.edu",
            ))
            .unwrap();
        let (status, body) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.contains("kai@hawaii.edu"));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_member() {
        let h = harness();
        let (status, body) = send(
            &h.app,
            json_request("POST", "/create", json!({"first_name": "X", "email": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = serde_json::from_str(&body).unwrap();
        let errors = body["errors"].as_array().unwrap();
        assert!(errors.contains(&json!("role is required")));
        assert!(errors.contains(&json!("email must be a valid email address")));

        let (status, _) = send(
            &h.app,
            json_request("POST", "/create", json!({"first_name": ["nested"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_achievements_crud() {
        let h = harness();
        let (status, body) = send(
            &h.app,
            json_request(
                "POST",
                "/achievements/create",
                json!({"id": 7, "title": "Best Poster", "user": "a"}),
            ),
        )
        .await;
        assert_eq!((status, body.as_str()), (StatusCode::OK, "success"));

        let (status, _) = send(
            &h.app,
            json_request("PUT", "/achievements/edit", json!({"id": 7, "title": "Best Talk"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, list) = get_json(&h.app, "/achievements").await;
        assert_eq!(list[0]["title"], "Best Talk");

        let (status, _) = send(
            &h.app,
            json_request("PUT", "/achievements/edit", json!({"id": 8})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let del = |uri: &str| Request::delete(uri).body(Body::empty()).unwrap();
        assert_eq!(send(&h.app, del("/achievements/delete")).await.0, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(send(&h.app, del("/achievements/delete?id=7")).await.0, StatusCode::OK);
        assert_eq!(send(&h.app, del("/achievements/delete?id=7")).await.0, StatusCode::NOT_FOUND);
        assert_eq!(get_json(&h.app, "/achievements").await.1, json!([]));
    }

    #[tokio::test]
    async fn test_achievements_user_segment_lists_everything() {
        let h = harness();
        send(
            &h.app,
            json_request("POST", "/achievements/create", json!({"id": 1, "user": "a"})),
        )
        .await;
        send(
            &h.app,
            json_request("POST", "/achievements/create", json!({"id": 2, "user": "b"})),
        )
        .await;

        let (status, body) = get_json(&h.app, "/achievements/keala").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_pages_and_ticket_gate() {
        let h = harness();
        let get = |uri: &str| Request::get(uri).body(Body::empty()).unwrap();

        let (status, body) = send(&h.app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("directory"));

        let (status, body) = send(&h.app, get("/?ticket=good")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("welcome"));
        assert_eq!(send(&h.app, get("/?ticket=bad")).await.0, StatusCode::FORBIDDEN);

        let (status, body) = send(&h.app, get("/admin")).await;
        assert_eq!((status, body.as_str()), (StatusCode::FORBIDDEN, "Forbidden"));
        assert!(send(&h.app, get("/admin?ticket=good")).await.1.contains("admin"));

        let (status, body) = send(&h.app, get("/app.js")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("console"));
        assert_eq!(send(&h.app, get("/profile")).await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_status_reports_counts() {
        let h = harness();
        let (status, body) = get_json(&h.app, "/api/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["people"], 2);
        assert_eq!(body["achievements"], 0);
        assert_eq!(body["combinator"], "any");
        assert_eq!(body["import"]["runs"], 0);
    }

    #[test]
    fn test_resolve_bind() {
        assert_eq!(
            resolve_bind("0.0.0.0:9696", None).unwrap(),
            "0.0.0.0:9696".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(resolve_bind("127.0.0.1:9696", Some("8080")).unwrap().port(), 8080);
        assert!(resolve_bind("localhost", None).is_err());
        assert!(resolve_bind("127.0.0.1:9696", Some("http")).is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let config: Config = toml::from_str(
            r#"
            [query]
            projectable_keys = ["email"]
            combinator = "all"

            [import]
            enabled = true
            interval_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.query.projectable_keys, vec!["email"]);
        assert_eq!(config.query.combinator, Combinator::All);
        assert!(config.import.enabled);
        assert_eq!(config.import.command, "python");
        assert_eq!(config.server.public_dir, PathBuf::from("public"));
    }

    #[test]
    fn test_unreadable_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memberconnect.toml");
        std::fs::write(&path, "[query\ncombinator = ").unwrap();
        let config = load_config(&path);
        assert_eq!(config.query.combinator, Combinator::Any);
        assert_eq!(config.query.projectable_keys.len(), 9);

        let missing = load_config(&dir.path().join("absent.toml"));
        assert!(!missing.import.enabled);
    }
}
