use std::env;
use std::str::FromStr;

use super::error::{DashboardError, DashboardResult};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub empresa: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub openai_timeout_secs: u64,
    pub max_upload_size_bytes: usize,
    pub ai_rate_limit_per_minute: u32,
    pub ai_rate_limit_burst: u32,
    pub session_idle_secs: u64,
    pub max_sessions: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            empresa: "Fradma".to_string(),
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_timeout_secs: 60,
            max_upload_size_bytes: 52_428_800, // 50MB
            ai_rate_limit_per_minute: 10,
            ai_rate_limit_burst: 3,
            session_idle_secs: 3600,
            max_sessions: 1_000,
        }
    }
}

impl AppConfig {
    /// Lee la configuración desde variables de entorno (y `.env` si existe).
    pub fn from_env() -> DashboardResult<Self> {
        dotenv::dotenv().ok();
        let defaults = AppConfig::default();

        let config = AppConfig {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_env("PORT", defaults.port)?,
            log_level: env::var("LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            empresa: env::var("EMPRESA").unwrap_or(defaults.empresa),
            openai_api_key: env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            openai_timeout_secs: parse_env("OPENAI_TIMEOUT_SECS", defaults.openai_timeout_secs)?,
            max_upload_size_bytes: parse_env("MAX_UPLOAD_SIZE_BYTES", defaults.max_upload_size_bytes)?,
            ai_rate_limit_per_minute: parse_env(
                "AI_RATE_LIMIT_PER_MINUTE",
                defaults.ai_rate_limit_per_minute,
            )?,
            ai_rate_limit_burst: parse_env("AI_RATE_LIMIT_BURST", defaults.ai_rate_limit_burst)?,
            session_idle_secs: parse_env("SESSION_IDLE_SECS", defaults.session_idle_secs)?,
            max_sessions: parse_env("MAX_SESSIONS", defaults.max_sessions)?,
        };

        if config.session_idle_secs == 0 {
            return Err(DashboardError::Configuracion(
                "SESSION_IDLE_SECS debe ser mayor que cero".to_string(),
            ));
        }

        if !config.openai_base_url.starts_with("http://")
            && !config.openai_base_url.starts_with("https://")
        {
            return Err(DashboardError::Configuracion(
                "OPENAI_BASE_URL debe iniciar con http:// o https://".to_string(),
            ));
        }

        tracing::info!("Configuración cargada");
        tracing::debug!("Modelo de IA: {}", config.openai_model);
        if config.openai_api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY no definida; el resumen con IA requerirá una key por petición");
        }

        Ok(config)
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> DashboardResult<T> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|_| {
            DashboardError::Configuracion(format!("{} tiene un valor inválido: {}", key, raw))
        }),
        _ => Ok(default),
    }
}
