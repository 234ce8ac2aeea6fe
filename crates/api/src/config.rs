/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Public base URL providers call back into (no trailing slash).
    pub webhook_base_url: String,
    /// API credentials for the provider adapters.
    pub providers: ProviderCredentials,
}

/// Per-provider API credentials. Empty strings disable the adapter at
/// startup (logged, not fatal) so a partially configured environment
/// can still serve the platforms it has keys for.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub fal_api_key: String,
    pub replicate_api_token: String,
    pub ark_api_key: String,
    pub kie_api_key: String,
    pub nano_api_key: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `WEBHOOK_BASE_URL`     | `http://localhost:3000`    |
    ///
    /// Provider credentials come from `FAL_API_KEY`,
    /// `REPLICATE_API_TOKEN`, `ARK_API_KEY`, `KIE_API_KEY`, and
    /// `NANO_API_KEY` (all default to empty).
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let webhook_base_url = std::env::var("WEBHOOK_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        let providers = ProviderCredentials {
            fal_api_key: std::env::var("FAL_API_KEY").unwrap_or_default(),
            replicate_api_token: std::env::var("REPLICATE_API_TOKEN").unwrap_or_default(),
            ark_api_key: std::env::var("ARK_API_KEY").unwrap_or_default(),
            kie_api_key: std::env::var("KIE_API_KEY").unwrap_or_default(),
            nano_api_key: std::env::var("NANO_API_KEY").unwrap_or_default(),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            webhook_base_url,
            providers,
        }
    }

    /// Callback URL handed to providers at dispatch time. The webhook
    /// handler itself lives in the callback service, not here.
    pub fn callback_url(&self) -> String {
        format!("{}/api/v1/generation/webhook", self.webhook_base_url)
    }
}
