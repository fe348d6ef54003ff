//! Server configuration
//!
//! Everything is read from the environment (a `.env` file is loaded first, if present). Invalid or missing values are
//! logged and replaced with defaults, except for secrets, which have no useful default.
use std::env;

use fks_common::{env_flag, Secret};
use flow_client::FlowConfig;
use log::*;

use crate::integrations::mailjet::MailjetConfig;

const DEFAULT_FKS_HOST: &str = "127.0.0.1";
const DEFAULT_FKS_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://fks_store.db";
const DEFAULT_SUCCESS_URL: &str = "http://localhost:5173/payment/success";
const DEFAULT_PENDING_URL: &str = "http://localhost:5173/payment/pending";
const DEFAULT_ERROR_URL: &str = "http://localhost:5173/payment/error";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Apply the embedded migrations when the server starts.
    pub run_migrations: bool,
    pub auth: AuthConfig,
    pub landing_pages: LandingPages,
    pub flow: FlowConfig,
    /// Receipts are only logged when this is `None`.
    pub mailjet: Option<MailjetConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FKS_HOST.to_string(),
            port: DEFAULT_FKS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            run_migrations: true,
            auth: AuthConfig::default(),
            landing_pages: LandingPages::default(),
            flow: FlowConfig::default(),
            mailjet: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("FKS_HOST").ok().unwrap_or_else(|| DEFAULT_FKS_HOST.into());
        let port = env::var("FKS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for FKS_PORT. {e} Using the default, {DEFAULT_FKS_PORT}, instead."
                    );
                    DEFAULT_FKS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_FKS_PORT);
        let database_url = env::var("FKS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ FKS_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let run_migrations = env_flag("FKS_RUN_MIGRATIONS", true);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|| {
            warn!(
                "🪛️ FKS_JWT_SECRET is not set. Every authenticated route will reject its callers until it is \
                 configured."
            );
            AuthConfig::default()
        });
        let landing_pages = LandingPages::from_env_or_default();
        let flow = FlowConfig::new_from_env_or_default();
        let mailjet = MailjetConfig::try_from_env();
        if mailjet.is_none() {
            info!("🪛️ Mailjet is not configured. Receipts will be written to the log instead of being emailed.");
        }
        Self { host, port, database_url, run_migrations, auth, landing_pages, flow, mailjet }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// The HS256 secret shared with the service that issues bearer tokens. An empty secret rejects every token.
    pub jwt_secret: Secret<String>,
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Option<Self> {
        env::var("FKS_JWT_SECRET").ok().filter(|s| !s.trim().is_empty()).map(Self::new)
    }
}

//-------------------------------------------------  LandingPages  -----------------------------------------------------
/// Where the buyer's browser is sent once the payment flow at the gateway is over.
#[derive(Clone, Debug)]
pub struct LandingPages {
    pub success_url: String,
    pub pending_url: String,
    pub error_url: String,
}

impl Default for LandingPages {
    fn default() -> Self {
        Self {
            success_url: DEFAULT_SUCCESS_URL.to_string(),
            pending_url: DEFAULT_PENDING_URL.to_string(),
            error_url: DEFAULT_ERROR_URL.to_string(),
        }
    }
}

impl LandingPages {
    pub fn from_env_or_default() -> Self {
        let read = |name: &str, default: &str| {
            env::var(name).ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
                info!("🪛️ {name} is not set. Using {default}");
                default.to_string()
            })
        };
        Self {
            success_url: read("FKS_SUCCESS_URL", DEFAULT_SUCCESS_URL),
            pending_url: read("FKS_PENDING_URL", DEFAULT_PENDING_URL),
            error_url: read("FKS_ERROR_URL", DEFAULT_ERROR_URL),
        }
    }
}
