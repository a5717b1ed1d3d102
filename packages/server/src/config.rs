use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

/// External identity API used for login.
#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    pub base_url: String,
    pub login_path: String,
    pub timeout_secs: u64,
    /// Skip TLS certificate verification. Development only.
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root of the public storage area, served at `/storage`.
    pub root: String,
    /// Upper bound for any single stored blob, in bytes.
    pub max_upload_size: u64,
}

/// Generative-text API used by the chatbot.
#[derive(Debug, Deserialize, Clone)]
pub struct ChatbotConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub persona: String,
    /// Rewrite canned rule responses through the generative API.
    pub enrich_matches: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub identity: IdentityConfig,
    pub storage: StorageConfig,
    pub chatbot: ChatbotConfig,
    pub log: LogConfig,
}

const DEFAULT_PERSONA: &str = "You are the virtual assistant of the university student-affairs \
office. Answer questions about scholarships, counseling, student organizations and campus \
announcements politely and briefly. If you do not know the answer, direct the student to \
contact the student-affairs office.";

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Self::defaults()?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., PORTAL__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("PORTAL").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://portal.db?mode=rwc")?
            .set_default("auth.token_ttl_hours", 24)?
            .set_default("identity.base_url", "http://127.0.0.1:8080")?
            .set_default("identity.login_path", "/api/login")?
            .set_default("identity.timeout_secs", 10)?
            .set_default("identity.accept_invalid_certs", false)?
            .set_default("storage.root", "./storage")?
            .set_default("storage.max_upload_size", 20 * 1024 * 1024)?
            .set_default(
                "chatbot.api_base",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("chatbot.api_key", "")?
            .set_default("chatbot.model", "gemini-1.5-flash")?
            .set_default("chatbot.persona", DEFAULT_PERSONA)?
            .set_default("chatbot.enrich_matches", false)?
            .set_default("chatbot.timeout_secs", 20)?
            .set_default("log.level", "info")
    }
}
