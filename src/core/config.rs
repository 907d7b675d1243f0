use dotenv::dotenv;
use std::env;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_EMAIL_API_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Backend dello store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    Memory,
}

/// Modalità di verifica dei bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// Verifica locale HS256 con il secret condiviso del servizio di autenticazione
    Jwt { secret: String },
    /// Introspezione remota: GET {url}/auth/v1/user
    Remote { url: String, api_key: String },
}

/// Credenziali dell'API email transazionale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailApiConfig {
    pub api_url: String,
    pub service_id: String,
    pub account_id: String,
    pub access_token: Option<String>,
    pub invite_template_id: String,
    pub conflict_template_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailMode {
    Live(EmailApiConfig),
    /// Nessun invio: le notifiche vengono solo loggate
    Log,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub app_env: String,
    pub store: StoreBackend,
    pub max_connections: u32,
    pub auth: AuthMode,
    pub email: EmailMode,
    pub dispatch_interval: Duration,
    pub public_base_url: String,
}

impl Config {
    /// Carica la configurazione dalle variabili d'ambiente
    /// Chiama dotenv() automaticamente
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Costruisce la configurazione a partire da una funzione di lookup delle variabili
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str, context: &str| {
            var(key).ok_or_else(|| format!("{key} must be set when {context}"))
        };

        let server_host = var("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let server_port = var("SERVER_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| "Invalid SERVER_PORT: must be a number between 0-65535".to_string())?;

        let app_env = var("APP_ENV").unwrap_or_else(|| "development".to_string());

        let store = match var("STORE_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => StoreBackend::Postgres {
                database_url: required("DATABASE_URL", "STORE_BACKEND=postgres")?,
            },
            "memory" => StoreBackend::Memory,
            other => return Err(format!("Invalid STORE_BACKEND '{other}': use postgres or memory")),
        };

        let max_connections = var("MAX_DB_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .map_err(|_| "Invalid MAX_DB_CONNECTIONS: must be a positive number".to_string())?;

        let auth = match var("AUTH_MODE").as_deref().unwrap_or("jwt") {
            "jwt" => AuthMode::Jwt {
                secret: required("JWT_SECRET", "AUTH_MODE=jwt")?,
            },
            "remote" => AuthMode::Remote {
                url: required("AUTH_URL", "AUTH_MODE=remote")?
                    .trim_end_matches('/')
                    .to_string(),
                api_key: required("AUTH_API_KEY", "AUTH_MODE=remote")?,
            },
            other => return Err(format!("Invalid AUTH_MODE '{other}': use jwt or remote")),
        };

        let email = match var("EMAIL_MODE").as_deref().unwrap_or("log") {
            "live" => EmailMode::Live(EmailApiConfig {
                api_url: var("EMAIL_API_URL").unwrap_or_else(|| DEFAULT_EMAIL_API_URL.to_string()),
                service_id: required("EMAIL_SERVICE_ID", "EMAIL_MODE=live")?,
                account_id: required("EMAIL_ACCOUNT_ID", "EMAIL_MODE=live")?,
                access_token: var("EMAIL_ACCESS_TOKEN"),
                invite_template_id: required("EMAIL_INVITE_TEMPLATE_ID", "EMAIL_MODE=live")?,
                conflict_template_id: required("EMAIL_CONFLICT_TEMPLATE_ID", "EMAIL_MODE=live")?,
            }),
            "log" => EmailMode::Log,
            other => return Err(format!("Invalid EMAIL_MODE '{other}': use live or log")),
        };

        let dispatch_interval = var("EMAIL_DISPATCH_INTERVAL_MS")
            .unwrap_or_else(|| "1000".to_string())
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| "Invalid EMAIL_DISPATCH_INTERVAL_MS: must be a positive number".to_string())?;

        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{server_port}"))
            .trim_end_matches('/')
            .to_string();

        Ok(Config {
            server_host,
            server_port,
            app_env,
            store,
            max_connections,
            auth,
            email,
            dispatch_interval,
            public_base_url,
        })
    }

    /// Logga la configurazione (nascondendo i segreti)
    pub fn print_info(&self) {
        info!("Server configuration:");
        info!("   Environment: {}", self.app_env);
        info!("   Server Address: {}:{}", self.server_host, self.server_port);
        match &self.store {
            StoreBackend::Postgres { database_url } => {
                info!("   Database: {}", Self::mask_url(database_url));
                info!("   Max DB Connections: {}", self.max_connections);
            }
            StoreBackend::Memory => warn!("   Database: in-memory store, data is lost on restart"),
        }
        match &self.auth {
            AuthMode::Jwt { .. } => info!("   Auth: local JWT verification"),
            AuthMode::Remote { url, .. } => info!("   Auth: remote introspection at {}", url),
        }
        match &self.email {
            EmailMode::Live(api) => info!("   Email: live via {}", api.api_url),
            EmailMode::Log => warn!("   Email: log only, no email will be sent"),
        }
        info!("   Dispatch interval: {}ms", self.dispatch_interval.as_millis());
        info!("   Public base URL: {}", self.public_base_url);
    }

    /// Maschera l'URL del database per il logging
    fn mask_url(url: &str) -> String {
        if let Some(at_pos) = url.find('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        "***".to_string()
    }
}
