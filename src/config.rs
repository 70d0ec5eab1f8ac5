use std::{env, net::SocketAddr, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid environment variable format for {0}: {1}")]
    InvalidVar(String, String),
    #[error(transparent)]
    DotEnvError(#[from] dotenvy::Error),
}

#[derive(Clone, Debug)] // Clone needed if passed around, Debug for logging
pub struct Config {
    pub bind_address: SocketAddr,
    /// Allowed browser origin for CORS. Permissive when unset.
    pub client_origin: Option<String>,
    // Store region as string for simplicity here, store module can convert
    pub aws_region: String,
    // Optional endpoint for LocalStack / DynamoDB Local
    pub aws_endpoint: Option<String>,
    pub memes_table: String,
    pub bids_table: String,
    pub gemini_api_key: String,
    /// Override for the Gemini generateContent URL, mainly for testing.
    pub gemini_endpoint: Option<String>,
    pub caption_timeout_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors, relies on env vars otherwise)
        dotenvy::dotenv().ok();

        let bind_address_str =
            env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:5000".to_string());
        let bind_address = SocketAddr::from_str(&bind_address_str)
            .map_err(|e| ConfigError::InvalidVar("BIND_ADDRESS".into(), e.to_string()))?;

        let client_origin = env::var("CLIENT_ORIGIN").ok().filter(|s| !s.is_empty());

        let aws_region =
            env::var("AWS_DEFAULT_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        // Allow overriding endpoint for localstack/testing
        let aws_endpoint = env::var("AWS_ENDPOINT_URL").ok(); // Optional

        let memes_table = env::var("MEMES_TABLE").unwrap_or_else(|_| "memes".to_string());
        let bids_table = env::var("BIDS_TABLE").unwrap_or_else(|_| "bids".to_string());

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| ConfigError::MissingVar("GEMINI_API_KEY".into()))?;
        let gemini_endpoint = env::var("GEMINI_ENDPOINT").ok();

        let caption_timeout_secs = match env::var("CAPTION_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidVar("CAPTION_TIMEOUT_SECS".into(), e.to_string())
            })?,
            Err(_) => 10,
        };

        Ok(Config {
            bind_address,
            client_origin,
            aws_region,
            aws_endpoint,
            memes_table,
            bids_table,
            gemini_api_key,
            gemini_endpoint,
            caption_timeout_secs,
        })
    }
}
