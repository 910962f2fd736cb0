use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 10)
    pub db_max_connections: u32,

    /// Port the trigger endpoint listens on (default: 9000)
    pub server_port: u16,

    /// Resend API key for email delivery
    pub resend_api_key: String,

    /// Resend API base URL (default: https://api.resend.com)
    pub resend_api_url: String,

    /// Per-request timeout for the transport in seconds (default: 30)
    pub transport_timeout_secs: u64,

    /// Email sender address
    pub mail_from: String,

    /// Subject line of the batch message
    pub mail_subject: String,

    /// Path to the HTML body of the batch message
    pub mail_body_path: String,

    /// Attachment identifiers resolved against `attachment_dir` before every send
    pub mail_attachments: Vec<String>,

    /// Directory attachment identifiers are resolved against (default: ".")
    pub attachment_dir: String,

    /// Upper bound on concurrently running delivery workers (default: 10)
    pub dispatch_max_concurrency: usize,

    /// Timeout for selecting pending recipients in milliseconds (default: 10000)
    pub select_timeout_ms: u64,

    /// Timeout for a single "mark delivered" write in milliseconds (default: 5000)
    pub record_timeout_ms: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            server_port: std::env::var("SERVER_PORT")
                .unwrap_or_else(|_| "9000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid u16"))?,
            resend_api_key: std::env::var("RESEND_API_KEY")
                .map_err(|_| anyhow::anyhow!("RESEND_API_KEY environment variable is required"))?,
            resend_api_url: std::env::var("RESEND_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            transport_timeout_secs: std::env::var("TRANSPORT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("TRANSPORT_TIMEOUT_SECS must be a valid u64"))?,
            mail_from: std::env::var("MAIL_FROM")
                .map_err(|_| anyhow::anyhow!("MAIL_FROM environment variable is required"))?,
            mail_subject: std::env::var("MAIL_SUBJECT")
                .map_err(|_| anyhow::anyhow!("MAIL_SUBJECT environment variable is required"))?,
            mail_body_path: std::env::var("MAIL_BODY_PATH")
                .unwrap_or_else(|_| "templates/message.html".to_string()),
            mail_attachments: parse_list(&std::env::var("MAIL_ATTACHMENTS").unwrap_or_default()),
            attachment_dir: std::env::var("ATTACHMENT_DIR").unwrap_or_else(|_| ".".to_string()),
            dispatch_max_concurrency: std::env::var("DISPATCH_MAX_CONCURRENCY")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DISPATCH_MAX_CONCURRENCY must be a valid usize"))?,
            select_timeout_ms: std::env::var("SELECT_TIMEOUT_MS")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SELECT_TIMEOUT_MS must be a valid u64"))?,
            record_timeout_ms: std::env::var("RECORD_TIMEOUT_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RECORD_TIMEOUT_MS must be a valid u64"))?,
        })
    }
}

/// Split a comma separated list, dropping blank entries.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
