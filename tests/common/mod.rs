use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tempfile::TempDir;
use uuid::Uuid;

use devtracker::config::{Config, RegistrationMode};

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
    pub media: TempDir,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Register a user; the first one becomes the administrator.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({ "username": username, "email": email, "password": password }))
            .send()
            .await
            .expect("register request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Login and return the auth response body + status.
    pub async fn login(&self, username: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Register the bootstrap admin, return access token.
    pub async fn bootstrap(&self) -> String {
        let (body, status) = self.register("admin", "admin@test.com", "password123").await;
        assert_eq!(status, StatusCode::OK, "bootstrap register failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Register a second, non-admin user, return access token.
    pub async fn regular_user(&self) -> String {
        let (body, status) = self.register("dev", "dev@test.com", "password123").await;
        assert_eq!(status, StatusCode::OK, "user register failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Create a project, return the project JSON.
    pub async fn create_project(&self, token: &str, name: &str) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/v1/projects",
                token,
                &json!({
                    "name": name,
                    "description": format!("{name} description"),
                    "status": "development",
                    "start_date": "2024-01-01",
                    "target_date": "2030-12-31",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create project failed: {body}");
        body
    }

    /// Create an application under a project, return the application JSON.
    pub async fn create_application(&self, token: &str, project_id: &str, name: &str) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/v1/applications",
                token,
                &json!({
                    "project_id": project_id,
                    "name": name,
                    "description": format!("{name} description"),
                    "complexity": "medium",
                    "status": "development",
                    "estimated_weeks": 4,
                    "features": ["Login", "Reports"],
                    "tech_stack": "Rust\nPostgres\n",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create application failed: {body}");
        body
    }

    /// Create a task under an application, return the task JSON.
    pub async fn create_task(&self, token: &str, application_id: &str, title: &str) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/v1/tasks",
                token,
                &json!({
                    "application_id": application_id,
                    "title": title,
                    "priority": "high",
                    "estimated_hours": 8,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create task failed: {body}");
        body
    }

    /// Create an artifact under an application, return the artifact JSON.
    pub async fn create_artifact(&self, token: &str, application_id: &str, name: &str) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/v1/artifacts",
                token,
                &json!({
                    "application_id": application_id,
                    "name": name,
                    "type": "documentation",
                    "content": "# Notes",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create artifact failed: {body}");
        body
    }

    /// Make an authenticated GET request.
    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated POST request with JSON body.
    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated PUT request with JSON body.
    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated DELETE request.
    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    // Create a unique test database
    let db_name = format!("devtracker_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    // Connect to default postgres DB to create test DB
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    // Connect to test DB and run migrations
    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let media = tempfile::tempdir().expect("Failed to create media dir");

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "http://localhost:0".to_string(),
        registration: RegistrationMode::Open,
        max_upload_size: 64 * 1024,
        media_root: media.path().to_path_buf(),
        export_dir: media.path().join("exports"),
        log_level: "warn".to_string(),
    };

    let app = devtracker::build_app(pool.clone(), config);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
        media,
    }
}

/// Drop stale test databases (useful after test crashes).
#[allow(dead_code)]
pub async fn cleanup_stale_test_dbs() {
    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    if let Ok(admin_pool) = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
    {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT datname FROM pg_database WHERE datname LIKE 'devtracker_test_%'",
        )
        .fetch_all(&admin_pool)
        .await
        .unwrap_or_default();

        for db_name in rows {
            let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
                .execute(&admin_pool)
                .await;
        }
        admin_pool.close().await;
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
