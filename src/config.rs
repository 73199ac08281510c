use std::collections::HashMap;

use crate::error::IndexerError;

/// The closed set of chains the indexer knows how to scan. The name doubles
/// as the environment-variable prefix (`POLYGON_RPC_URL`, ...).
pub const SUPPORTED_CHAINS: &[(u64, &str)] = &[
    (1, "ETHEREUM"),
    (10, "OPTIMISM"),
    (56, "BSC"),
    (100, "GNOSIS"),
    (137, "POLYGON"),
    (8453, "BASE"),
];

/// Scanned when `ENABLED_CHAINS` is missing or empty.
pub const DEFAULT_CHAIN_ID: u64 = 137;

/// The fee collector is deployed at the same address on every supported chain.
pub const DEFAULT_FEE_COLLECTOR: &str = "0xbd6c7b0d2f68c2b7805d88388319cfb6ecb50ea9";

pub fn is_supported_chain(chain_id: u64) -> bool {
    SUPPORTED_CHAINS.iter().any(|(id, _)| *id == chain_id)
}

pub fn chain_name(chain_id: u64) -> Option<&'static str> {
    SUPPORTED_CHAINS
        .iter()
        .find(|(id, _)| *id == chain_id)
        .map(|(_, name)| *name)
}

#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: &'static str,
    pub rpc_url: String,
    pub start_block: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub chains: Vec<ChainConfig>,
    /// Shared collector address, lowercase hex.
    pub fee_collector: String,
    /// Blocks per `eth_getLogs` window.
    pub chunk_size: u64,
    /// Pause between scan cycles per chain.
    pub scan_interval_ms: u64,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from the process environment. Fails fast on any
    /// missing or malformed value.
    pub fn from_env() -> Result<Self, IndexerError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Build configuration from a key→value snapshot. Split out from
    /// [`Config::from_env`] so tests can inject maps instead of mutating the
    /// process environment.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, IndexerError> {
        let database_url = require(vars, "DATABASE_URL")?;
        let database_max_connections = parse_or(vars, "DATABASE_MAX_CONNECTIONS", 10)?;

        let chain_ids = parse_enabled_chains(vars.get("ENABLED_CHAINS").map(String::as_str))?;
        let mut chains = Vec::with_capacity(chain_ids.len());
        for chain_id in chain_ids {
            let name = chain_name(chain_id).ok_or_else(|| {
                IndexerError::Config(format!("unsupported chain id {chain_id} in ENABLED_CHAINS"))
            })?;
            let rpc_url = require(vars, &format!("{name}_RPC_URL")).map_err(|_| {
                IndexerError::Config(format!(
                    "chain {chain_id} ({name}) is enabled but {name}_RPC_URL is not set"
                ))
            })?;
            let start_block = parse_or(vars, &format!("{name}_START_BLOCK"), 0)?;
            chains.push(ChainConfig {
                chain_id,
                name,
                rpc_url,
                start_block,
            });
        }

        let fee_collector = vars
            .get("FEE_COLLECTOR_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_FEE_COLLECTOR.to_string())
            .to_ascii_lowercase();
        if !is_hex_address(&fee_collector) {
            return Err(IndexerError::Config(format!(
                "invalid FEE_COLLECTOR_ADDRESS '{fee_collector}'"
            )));
        }

        let chunk_size = parse_or(vars, "CHUNK_SIZE", 500)?;
        if chunk_size == 0 {
            return Err(IndexerError::Config("CHUNK_SIZE must be at least 1".into()));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            chains,
            fee_collector,
            chunk_size,
            scan_interval_ms: parse_or(vars, "SCAN_INTERVAL_MS", 5000)?,
            host: vars
                .get("HOST")
                .cloned()
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(vars, "PORT", 3000)?,
        })
    }
}

/// Parse the `ENABLED_CHAINS` comma list. Missing or empty selects the
/// default chain.
fn parse_enabled_chains(raw: Option<&str>) -> Result<Vec<u64>, IndexerError> {
    let raw = match raw {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Ok(vec![DEFAULT_CHAIN_ID]),
    };

    let mut ids = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let id: u64 = part.parse().map_err(|_| {
            IndexerError::Config(format!("invalid chain id '{part}' in ENABLED_CHAINS"))
        })?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return Ok(vec![DEFAULT_CHAIN_ID]);
    }
    Ok(ids)
}

fn require(vars: &HashMap<String, String>, key: &str) -> Result<String, IndexerError> {
    match vars.get(key) {
        Some(v) if !v.trim().is_empty() => Ok(v.clone()),
        _ => Err(IndexerError::Config(format!("{key} is not set"))),
    }
}

fn parse_or<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, IndexerError> {
    match vars.get(key) {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|_| IndexerError::Config(format!("invalid value '{v}' for {key}"))),
        _ => Ok(default),
    }
}

pub fn is_hex_address(s: &str) -> bool {
    s.len() == 42 && s.starts_with("0x") && s[2..].bytes().all(|b| b.is_ascii_hexdigit())
}
