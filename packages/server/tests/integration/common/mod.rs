use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::storage::filesystem::FilesystemFileStore;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tempfile::TempDir;

use server::config::{
    AppConfig, AuthConfig, ChatbotConfig, CorsConfig, DatabaseConfig, IdentityConfig, LogConfig,
    ServerConfig, StorageConfig,
};
use server::integrations::generative::{GenerationError, TextGenerator};
use server::integrations::identity::{ExternalUser, IdentityError, IdentityProvider};
use server::state::AppState;

pub mod routes {
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const ME: &str = "/api/v1/auth/me";
    pub const DASHBOARD: &str = "/api/v1/dashboard";

    pub const SCHOLARSHIPS: &str = "/api/v1/scholarships";
    pub const ADMIN_SCHOLARSHIPS: &str = "/api/v1/admin/scholarships";
    pub const ADMIN_FORMS: &str = "/api/v1/admin/forms";
    pub const SUBMIT: &str = "/api/v1/forms/submit";
    pub const MY_SUBMISSIONS: &str = "/api/v1/submissions/mine";

    pub const NEWS: &str = "/api/v1/news";
    pub const ADMIN_NEWS: &str = "/api/v1/admin/news";
    pub const ADMIN_CATEGORIES: &str = "/api/v1/admin/news-categories";
    pub const ADMIN_DOWNLOADS: &str = "/api/v1/admin/downloads";
    pub const ADMIN_UPLOADS: &str = "/api/v1/admin/uploads";
    pub const CAROUSEL: &str = "/api/v1/carousel";
    pub const ADMIN_CAROUSEL: &str = "/api/v1/admin/carousel";

    pub const CHAT: &str = "/api/v1/chatbot/chat";
    pub const ADMIN_RULES: &str = "/api/v1/admin/chatbot/rules";

    pub const COUNSELING: &str = "/api/v1/counseling";
    pub const MY_COUNSELING: &str = "/api/v1/counseling/mine";
    pub const ADMIN_COUNSELING: &str = "/api/v1/admin/counseling";
    pub const ASPIRATIONS: &str = "/api/v1/aspirations";
    pub const MY_ASPIRATIONS: &str = "/api/v1/aspirations/mine";
    pub const ADMIN_ASPIRATIONS: &str = "/api/v1/admin/aspirations";

    pub fn public_form(id: &str) -> String {
        format!("/api/v1/forms/{id}")
    }

    pub fn admin_scholarship(id: &str) -> String {
        format!("/api/v1/admin/scholarships/{id}")
    }

    pub fn admin_form(id: &str) -> String {
        format!("/api/v1/admin/forms/{id}")
    }

    pub fn form_fields(id: &str) -> String {
        format!("/api/v1/admin/forms/{id}/fields")
    }

    pub fn form_settings(id: &str) -> String {
        format!("/api/v1/admin/forms/{id}/settings")
    }

    pub fn form_submissions(id: &str) -> String {
        format!("/api/v1/admin/forms/{id}/submissions")
    }

    pub fn submission(id: &str) -> String {
        format!("/api/v1/submissions/{id}")
    }

    pub fn news(id: &str) -> String {
        format!("/api/v1/news/{id}")
    }

    pub fn admin_news(id: &str) -> String {
        format!("/api/v1/admin/news/{id}")
    }

    pub fn admin_category(id: &str) -> String {
        format!("/api/v1/admin/news-categories/{id}")
    }

    pub fn download_file(id: &str) -> String {
        format!("/api/v1/downloads/{id}/file")
    }

    pub fn organization(kind: &str) -> String {
        format!("/api/v1/organizations/{kind}")
    }

    pub fn admin_counseling(id: &str) -> String {
        format!("/api/v1/admin/counseling/{id}")
    }

    pub fn counseling(id: &str) -> String {
        format!("/api/v1/counseling/{id}")
    }

    pub fn admin_aspiration(id: &str) -> String {
        format!("/api/v1/admin/aspirations/{id}")
    }
}

/// Identity directory keyed on the username prefix.
///
/// `admin*` → administrator, `staff*` → kemahasiswaan, `bem*` → pengurus BEM,
/// `alumni*` → an unmapped role, `down*` → unreachable service, anything
/// else → mahasiswa. The password `wrong` is always rejected.
struct StubIdentity;

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ExternalUser, IdentityError> {
        if password == "wrong" {
            return Err(IdentityError::InvalidCredentials);
        }
        let role = if username.starts_with("admin") {
            "Administrator"
        } else if username.starts_with("staff") {
            "Kemahasiswaan"
        } else if username.starts_with("bem") {
            "Pengurus BEM"
        } else if username.starts_with("alumni") {
            "Alumni"
        } else if username.starts_with("down") {
            return Err(IdentityError::Transport("connection refused".into()));
        } else {
            "Mahasiswa"
        };

        Ok(ExternalUser {
            username: username.to_string(),
            name: format!("User {username}"),
            email: Some(format!("{username}@campus.test")),
            role: role.to_string(),
            nim: (role == "Mahasiswa").then(|| username.to_string()),
            phone: None,
            faculty: Some("Engineering".into()),
            study_program: None,
        })
    }
}

/// Echoes the prompt back, or fails every call.
pub struct StubGenerator {
    fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, _system: &str, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GenerationError::RateLimited);
        }
        Ok(format!("generated: {prompt}"))
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub storage_root: PathBuf,
    pub generator: Arc<StubGenerator>,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// A multipart part for [`TestApp::multipart_with_token`].
pub enum Field<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, Vec<u8>),
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(false).await
    }

    pub async fn spawn_with_failing_generator() -> Self {
        Self::spawn_with(true).await
    }

    async fn spawn_with(generator_fails: bool) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("portal.db").display());
        let storage_root = dir.path().join("storage");

        let db = server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize database");
        server::seed::seed_role_permissions(&db)
            .await
            .expect("Failed to seed roles");
        server::seed::seed_organization_profiles(&db)
            .await
            .expect("Failed to seed organizations");
        server::seed::ensure_indexes(&db)
            .await
            .expect("Failed to create indexes");

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig { url: db_url },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                token_ttl_hours: 1,
            },
            identity: IdentityConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                login_path: "/api/login".to_string(),
                timeout_secs: 1,
                accept_invalid_certs: false,
            },
            storage: StorageConfig {
                root: storage_root.display().to_string(),
                max_upload_size: 8 * 1024 * 1024,
            },
            chatbot: ChatbotConfig {
                api_base: "http://127.0.0.1:1".to_string(),
                api_key: String::new(),
                model: "test".to_string(),
                persona: "You are a test assistant.".to_string(),
                enrich_matches: false,
                timeout_secs: 1,
            },
            log: LogConfig {
                level: "warn".to_string(),
            },
        };

        let files = FilesystemFileStore::new(storage_root.clone(), config.storage.max_upload_size)
            .await
            .expect("Failed to create file store");
        let generator = Arc::new(StubGenerator {
            fail: generator_fails,
            calls: AtomicUsize::new(0),
        });

        let state = AppState {
            db,
            config: Arc::new(config),
            files: Arc::new(files),
            identity: Arc::new(StubIdentity),
            generator: generator.clone(),
        };

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            storage_root,
            generator,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Whether a stored relative path exists on disk.
    pub fn stored(&self, path: &str) -> bool {
        self.storage_root.join(path).is_file()
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Send a `multipart/form-data` request with the given method.
    pub async fn multipart_with_token(
        &self,
        method: reqwest::Method,
        path: &str,
        fields: Vec<Field<'_>>,
        token: &str,
    ) -> TestResponse {
        let mut form = Form::new();
        for field in fields {
            form = match field {
                Field::Text(name, value) => form.text(name.to_string(), value.to_string()),
                Field::File(name, file_name, bytes) => form.part(
                    name.to_string(),
                    Part::bytes(bytes).file_name(file_name.to_string()),
                ),
            };
        }

        let res = self
            .client
            .request(method, self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    /// Log in through the stub identity service and return the token.
    pub async fn login(&self, username: &str) -> String {
        let res = self
            .post_without_token(
                routes::LOGIN,
                &serde_json::json!({"username": username, "password": "secret"}),
            )
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        res.body["token"]
            .as_str()
            .expect("Login response should contain a token")
            .to_string()
    }

    /// Create a scholarship and an active form on it, returning the form id.
    pub async fn create_form(&self, token: &str) -> String {
        let scholarship = self
            .post_with_token(
                routes::ADMIN_SCHOLARSHIPS,
                &serde_json::json!({
                    "title": "Academic Excellence",
                    "description": "For students with outstanding grades.",
                }),
                token,
            )
            .await;
        assert_eq!(
            scholarship.status, 201,
            "create scholarship failed: {}",
            scholarship.text
        );

        let form = self
            .post_with_token(
                routes::ADMIN_FORMS,
                &serde_json::json!({
                    "scholarship_id": scholarship.id(),
                    "title": "2025 intake",
                }),
                token,
            )
            .await;
        assert_eq!(form.status, 201, "create form failed: {}", form.text);
        form.id()
    }

    /// Replace a form's fields, asserting success.
    pub async fn set_fields(&self, form_id: &str, fields: Value, token: &str) {
        let res = self
            .put_with_token(
                &routes::form_fields(form_id),
                &serde_json::json!({ "fields": fields }),
                token,
            )
            .await;
        assert_eq!(res.status, 200, "replace fields failed: {}", res.text);
    }

    /// Replace a form's settings, asserting success.
    pub async fn set_settings(&self, form_id: &str, settings: Value, token: &str) {
        let res = self
            .put_with_token(&routes::form_settings(form_id), &settings, token)
            .await;
        assert_eq!(res.status, 200, "update settings failed: {}", res.text);
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> String {
        self.body["id"]
            .as_str()
            .expect("response body should contain 'id'")
            .to_string()
    }
}

/// A minimal PDF body.
pub fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\ntrailer\n<<>>\n%%EOF\n".to_vec()
}
