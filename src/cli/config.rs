//! CLI Config

use clap::{Args, ValueEnum};
use storefront_cart::{ids::CartId, storefront::StorefrontConfig};

/// Storefront connection settings.
#[derive(Debug, Args)]
pub(crate) struct StorefrontArgs {
    /// Store domain, or a full origin for local proxies
    #[arg(long, env = "PUBLIC_STORE_DOMAIN")]
    pub(crate) store_domain: String,

    /// Storefront API version
    #[arg(long, env = "STOREFRONT_API_VERSION", default_value = "2025-01")]
    pub(crate) api_version: String,

    /// Public storefront access token
    #[arg(long, env = "PUBLIC_STOREFRONT_API_TOKEN", hide_env_values = true)]
    pub(crate) access_token: String,

    /// Cart to operate on; the first add creates one when omitted
    #[arg(long, env = "CART_ID")]
    pub(crate) cart_id: Option<String>,
}

impl StorefrontArgs {
    pub(crate) fn config(&self) -> StorefrontConfig {
        StorefrontConfig {
            store_domain: self.store_domain.clone(),
            api_version: self.api_version.clone(),
            access_token: self.access_token.clone(),
        }
    }

    pub(crate) fn cart_id(&self) -> Option<CartId> {
        self.cart_id.as_deref().map(CartId::new)
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub(crate) struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub(crate) log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub(crate) log_format: LogFormat,
}
