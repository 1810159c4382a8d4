use anyhow::{bail, ensure, Context, Result};

/// Pack sizes used when `PACK_SIZES` is unset or yields no valid entry.
pub const DEFAULT_PACK_SIZES: &[i64] = &[250, 500, 1000, 2000, 5000];

/// Largest order accepted by `/api/calculate` unless `MAX_ORDER_QUANTITY` says otherwise.
pub const DEFAULT_MAX_ORDER_QUANTITY: i64 = 1_000_000;

/// Application configuration loaded from environment variables (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Initial contents of the pack size store.
    pub pack_sizes: Vec<i64>,
    /// Raw `PACK_SIZES` entries that were dropped; logged once tracing is up.
    pub skipped_pack_sizes: Vec<String>,
    pub max_order_quantity: i64,
    /// `None` means permissive CORS.
    pub cors_allowed_origins: Option<Vec<String>>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = parse_port(&lookup("PORT").unwrap_or_else(|| "3000".to_string()))?;

        let max_order_quantity = match lookup("MAX_ORDER_QUANTITY") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .context("MAX_ORDER_QUANTITY must be an integer")?,
            None => DEFAULT_MAX_ORDER_QUANTITY,
        };
        ensure!(
            max_order_quantity >= 0,
            "MAX_ORDER_QUANTITY must not be negative"
        );

        let (pack_sizes, skipped_pack_sizes) = match lookup("PACK_SIZES") {
            Some(raw) => parse_pack_sizes(&raw, max_order_quantity),
            None => (DEFAULT_PACK_SIZES.to_vec(), Vec::new()),
        };
        // The DP table spans order + largest pack, so startup sizes share the ceiling.
        if let Some(too_big) = pack_sizes.iter().find(|&&s| s > max_order_quantity) {
            bail!(
                "pack size {too_big} exceeds MAX_ORDER_QUANTITY ({max_order_quantity}); \
                 set PACK_SIZES to sizes within the limit"
            );
        }

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|raw| split_list(&raw).map(str::to_string).collect::<Vec<_>>())
            .filter(|origins| !origins.is_empty());

        Ok(Config {
            port,
            pack_sizes,
            skipped_pack_sizes,
            max_order_quantity,
            cors_allowed_origins,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Accepts `3000` as well as `:3000`.
fn parse_port(raw: &str) -> Result<u16> {
    raw.trim()
        .trim_start_matches(':')
        .parse::<u16>()
        .with_context(|| format!("PORT must be a valid port number, got '{raw}'"))
}

/// Parses a comma-separated list, skipping entries that are not positive integers
/// or exceed `max`. Falls back to `DEFAULT_PACK_SIZES` when nothing valid remains.
fn parse_pack_sizes(raw: &str, max: i64) -> (Vec<i64>, Vec<String>) {
    let mut sizes = Vec::new();
    let mut skipped = Vec::new();

    for entry in split_list(raw) {
        match entry.parse::<i64>() {
            Ok(size) if size > 0 && size <= max => sizes.push(size),
            _ => skipped.push(entry.to_string()),
        }
    }

    if sizes.is_empty() {
        sizes = DEFAULT_PACK_SIZES.to_vec();
    }
    (sizes, skipped)
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}
