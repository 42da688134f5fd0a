use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetConfig {
    /// Base URL of the static frontend, used to build reset links.
    pub frontend_base: String,
    pub ttl_minutes: i64,
    /// Return the reset link in the API response when no SMTP server is configured.
    pub link_in_response: bool,
}

/// Outgoing mail relay for reset links. Absent unless `SMTP_HOST` is set.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: String,
}

/// Upper bound for token lifetimes, keeps expiry arithmetic in range.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub reset: ResetConfig,
    pub smtp: Option<SmtpConfig>,
    /// Empty means permissive CORS.
    pub cors_origins: Vec<String>,
    pub static_dir: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "rupayana".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "rupayana-users".into()),
            ttl_minutes: clamp_ttl(env_parse("JWT_TTL_MINUTES").unwrap_or(60)),
        };
        let reset = ResetConfig {
            frontend_base: std::env::var("FRONTEND_BASE")
                .unwrap_or_else(|_| "http://localhost:5500".into()),
            ttl_minutes: clamp_ttl(env_parse("RESET_TTL_MINUTES").unwrap_or(60)),
            link_in_response: std::env::var("RESET_LINK_IN_RESPONSE")
                .map(|v| parse_bool(&v))
                .unwrap_or(true),
        };
        let smtp = non_empty_var("SMTP_HOST").map(|host| SmtpConfig {
            host,
            port: env_parse("SMTP_PORT").unwrap_or(587),
            user: non_empty_var("SMTP_USER"),
            pass: non_empty_var("SMTP_PASS"),
            from: non_empty_var("FROM_EMAIL").unwrap_or_else(|| "no-reply@rupayana.test".into()),
        });
        Ok(Self {
            database_url,
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS").unwrap_or(10),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("APP_PORT").unwrap_or(4000),
            jwt,
            reset,
            smtp,
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_default(),
            static_dir: non_empty_var("STATIC_DIR"),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn clamp_ttl(minutes: i64) -> i64 {
    minutes.clamp(1, MAX_TTL_MINUTES)
}

fn parse_bool(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Comma-separated allow-list; `*` anywhere in it falls back to permissive.
pub(crate) fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect();
    if origins.iter().any(|o| o == "*") {
        return Vec::new();
    }
    origins
}
