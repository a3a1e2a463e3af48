//! Configuration for the token SDK
//!
//! A [`BlockchainConfig`] is built once at startup and handed to every
//! builder. It can come from a cluster preset, a TOML file, or environment
//! variables; file and env sources are layered on top of the cluster preset.

use serde::{Deserialize, Serialize};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::{fmt, path::Path, str::FromStr};

use crate::errors::{SdkError, SdkResult};

/// Maximum length of a single PDA seed
const MAX_SEED_LEN: usize = 32;

/// Target cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    MainnetBeta,
    #[default]
    Devnet,
    Testnet,
    Localnet,
}

impl Cluster {
    /// Default JSON-RPC endpoint
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
        }
    }

    /// Default websocket endpoint
    pub fn ws_url(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "wss://api.mainnet-beta.solana.com",
            Cluster::Devnet => "wss://api.devnet.solana.com",
            Cluster::Testnet => "wss://api.testnet.solana.com",
            Cluster::Localnet => "ws://127.0.0.1:8900",
        }
    }
}

impl FromStr for Cluster {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(Cluster::MainnetBeta),
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "localnet" | "localhost" => Ok(Cluster::Localnet),
            other => Err(SdkError::Configuration(format!("Unknown cluster: {other}"))),
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::Localnet => "localnet",
        };
        f.write_str(name)
    }
}

/// Commitment level used for reads and confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn to_config(self) -> CommitmentConfig {
        match self {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

impl FromStr for Commitment {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(SdkError::Configuration(format!(
                "Unknown commitment level: {other}"
            ))),
        }
    }
}

/// Program addresses the builders target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramAddresses {
    /// Token program owning created mints (Token-2022, metadata extensions)
    #[serde(with = "pubkey_str", default = "default_token_program")]
    pub token_program: Pubkey,

    #[serde(with = "pubkey_str", default = "default_associated_token_program")]
    pub associated_token_program: Pubkey,

    #[serde(with = "pubkey_str", default = "default_system_program")]
    pub system_program: Pubkey,

    /// Mint address standing in for native SOL in token pairs
    #[serde(with = "pubkey_str", default = "default_native_mint")]
    pub native_mint: Pubkey,
}

fn default_token_program() -> Pubkey {
    spl_token_2022::id()
}

fn default_associated_token_program() -> Pubkey {
    spl_associated_token_account::id()
}

fn default_system_program() -> Pubkey {
    solana_system_interface::program::ID
}

fn default_native_mint() -> Pubkey {
    spl_token::native_mint::id()
}

impl Default for ProgramAddresses {
    fn default() -> Self {
        Self {
            token_program: default_token_program(),
            associated_token_program: default_associated_token_program(),
            system_program: default_system_program(),
            native_mint: default_native_mint(),
        }
    }
}

/// Layout of the AMM program: id, discriminators and PDA seeds
///
/// The defaults are placeholders. Deployments must supply the values from the
/// target program's ABI; the program id has no default at all and swap/pool
/// builders refuse to run until it is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmConfig {
    #[serde(with = "option_pubkey_str", default)]
    pub program_id: Option<Pubkey>,

    #[serde(default = "default_init_pool_discriminator")]
    pub init_pool_discriminator: u8,

    #[serde(default = "default_swap_discriminator")]
    pub swap_discriminator: u8,

    #[serde(default = "default_add_liquidity_discriminator")]
    pub add_liquidity_discriminator: u8,

    #[serde(default = "default_pool_seed")]
    pub pool_seed: String,

    #[serde(default = "default_vault_seed")]
    pub vault_seed: String,

    /// Seed for the vault holding the native side of a pool
    #[serde(default = "default_native_vault_seed")]
    pub native_vault_seed: String,

    #[serde(default = "default_lp_mint_seed")]
    pub lp_mint_seed: String,
}

fn default_init_pool_discriminator() -> u8 { 0 }
fn default_swap_discriminator() -> u8 { 1 }
fn default_add_liquidity_discriminator() -> u8 { 2 }
fn default_pool_seed() -> String { "pool".to_string() }
fn default_vault_seed() -> String { "vault".to_string() }
fn default_native_vault_seed() -> String { "sol_vault".to_string() }
fn default_lp_mint_seed() -> String { "lp_mint".to_string() }

impl Default for AmmConfig {
    fn default() -> Self {
        Self {
            program_id: None,
            init_pool_discriminator: default_init_pool_discriminator(),
            swap_discriminator: default_swap_discriminator(),
            add_liquidity_discriminator: default_add_liquidity_discriminator(),
            pool_seed: default_pool_seed(),
            vault_seed: default_vault_seed(),
            native_vault_seed: default_native_vault_seed(),
            lp_mint_seed: default_lp_mint_seed(),
        }
    }
}

impl AmmConfig {
    /// Default layout bound to a concrete program id
    pub fn with_program(program_id: Pubkey) -> Self {
        Self {
            program_id: Some(program_id),
            ..Self::default()
        }
    }

    /// The configured program id, or a configuration error
    pub fn program_id(&self) -> SdkResult<Pubkey> {
        self.program_id
            .ok_or_else(|| SdkError::Configuration("AMM program id is not configured".to_string()))
    }

    fn validate(&self) -> SdkResult<()> {
        let discriminators = [
            self.init_pool_discriminator,
            self.swap_discriminator,
            self.add_liquidity_discriminator,
        ];
        for (idx, d) in discriminators.iter().enumerate() {
            if discriminators[idx + 1..].contains(d) {
                return Err(SdkError::Configuration(format!(
                    "Duplicate AMM discriminator: {d}"
                )));
            }
        }

        for (name, seed) in [
            ("pool_seed", &self.pool_seed),
            ("vault_seed", &self.vault_seed),
            ("native_vault_seed", &self.native_vault_seed),
            ("lp_mint_seed", &self.lp_mint_seed),
        ] {
            if seed.is_empty() || seed.len() > MAX_SEED_LEN {
                return Err(SdkError::Configuration(format!(
                    "{name} must be 1..={MAX_SEED_LEN} bytes, got {}",
                    seed.len()
                )));
            }
        }

        if self.vault_seed == self.native_vault_seed {
            return Err(SdkError::Configuration(
                "native_vault_seed must differ from vault_seed".to_string(),
            ));
        }
        Ok(())
    }
}

/// Immutable SDK configuration shared by all builders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainConfig {
    pub cluster: Cluster,
    pub rpc_url: String,
    #[serde(default)]
    pub ws_url: Option<String>,
    #[serde(default)]
    pub commitment: Commitment,
    #[serde(default)]
    pub programs: ProgramAddresses,
    #[serde(default)]
    pub amm: AmmConfig,
}

/// On-disk layout: every field optional, layered over the cluster preset
#[derive(Debug, Default, Deserialize)]
struct BlockchainConfigFile {
    #[serde(default)]
    cluster: Option<Cluster>,
    rpc_url: Option<String>,
    ws_url: Option<String>,
    commitment: Option<Commitment>,
    programs: Option<ProgramAddresses>,
    amm: Option<AmmConfig>,
}

impl BlockchainConfig {
    /// Preset for a known cluster with standard endpoints
    pub fn for_cluster(cluster: Cluster) -> Self {
        Self {
            cluster,
            rpc_url: cluster.rpc_url().to_string(),
            ws_url: Some(cluster.ws_url().to_string()),
            commitment: Commitment::default(),
            programs: ProgramAddresses::default(),
            amm: AmmConfig::default(),
        }
    }

    /// Override the RPC endpoint
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = url.into();
        self
    }

    pub fn with_commitment(mut self, commitment: Commitment) -> Self {
        self.commitment = commitment;
        self
    }

    pub fn with_amm(mut self, amm: AmmConfig) -> Self {
        self.amm = amm;
        self
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> SdkResult<Self> {
        let file: BlockchainConfigFile = toml::from_str(content)
            .map_err(|e| SdkError::Configuration(format!("Failed to parse TOML: {e}")))?;

        let preset = Self::for_cluster(file.cluster.unwrap_or_default());
        let config = Self {
            cluster: preset.cluster,
            rpc_url: file.rpc_url.unwrap_or(preset.rpc_url),
            ws_url: file.ws_url.or(preset.ws_url),
            commitment: file.commitment.unwrap_or(preset.commitment),
            programs: file.programs.unwrap_or(preset.programs),
            amm: file.amm.unwrap_or(preset.amm),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SdkError::Configuration(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from the environment (and a `.env` file if present)
    ///
    /// Recognised variables: `SOLANA_CLUSTER`, `SOLANA_RPC_URL`,
    /// `SOLANA_WS_URL`, `SOLANA_COMMITMENT`, `AMM_PROGRAM_ID`.
    pub fn from_env() -> SdkResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SdkResult<Self> {
        let cluster = match lookup("SOLANA_CLUSTER") {
            Some(name) => name.parse()?,
            None => Cluster::default(),
        };

        let mut config = Self::for_cluster(cluster);
        if let Some(url) = lookup("SOLANA_RPC_URL") {
            config.rpc_url = url;
        }
        if let Some(url) = lookup("SOLANA_WS_URL") {
            config.ws_url = Some(url);
        }
        if let Some(level) = lookup("SOLANA_COMMITMENT") {
            config.commitment = level.parse()?;
        }
        if let Some(id) = lookup("AMM_PROGRAM_ID") {
            let program_id = Pubkey::from_str(id.trim())
                .map_err(|_| SdkError::invalid_address("AMM_PROGRAM_ID", id.clone()))?;
            config.amm.program_id = Some(program_id);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check endpoint schemes and the AMM layout
    pub fn validate(&self) -> SdkResult<()> {
        if !(self.rpc_url.starts_with("http://") || self.rpc_url.starts_with("https://")) {
            return Err(SdkError::Configuration(format!(
                "rpc_url must be an http(s) URL, got '{}'",
                self.rpc_url
            )));
        }
        if let Some(ws) = &self.ws_url {
            if !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
                return Err(SdkError::Configuration(format!(
                    "ws_url must be a ws(s) URL, got '{ws}'"
                )));
            }
        }
        self.amm.validate()
    }

    pub fn commitment_config(&self) -> CommitmentConfig {
        self.commitment.to_config()
    }
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self::for_cluster(Cluster::default())
    }
}

/// Serde adapter storing a `Pubkey` as its base58 string
mod pubkey_str {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&key.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let s = String::deserialize(deserializer)?;
        Pubkey::from_str(&s).map_err(|e| D::Error::custom(format!("invalid pubkey '{s}': {e}")))
    }
}

mod option_pubkey_str {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(
        key: &Option<Pubkey>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match key {
            Some(key) => serializer.serialize_some(&key.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Pubkey>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| {
                Pubkey::from_str(&s)
                    .map_err(|e| D::Error::custom(format!("invalid pubkey '{s}': {e}")))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_cluster_presets() {
        let config = BlockchainConfig::for_cluster(Cluster::MainnetBeta);
        assert_eq!(config.rpc_url, "https://api.mainnet-beta.solana.com");
        assert_eq!(
            config.ws_url.as_deref(),
            Some("wss://api.mainnet-beta.solana.com")
        );
        assert_eq!(config.commitment, Commitment::Confirmed);
        assert_eq!(config.programs.token_program, spl_token_2022::id());
        assert!(config.amm.program_id.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cluster_parse() {
        assert_eq!("mainnet".parse::<Cluster>().unwrap(), Cluster::MainnetBeta);
        assert_eq!("Devnet".parse::<Cluster>().unwrap(), Cluster::Devnet);
        assert_eq!("localhost".parse::<Cluster>().unwrap(), Cluster::Localnet);
        assert!("moonnet".parse::<Cluster>().is_err());
        assert_eq!(Cluster::MainnetBeta.to_string(), "mainnet-beta");
    }

    #[test]
    fn test_commitment_mapping() {
        assert_eq!(
            Commitment::Finalized.to_config(),
            CommitmentConfig::finalized()
        );
        assert_eq!("processed".parse::<Commitment>().unwrap(), Commitment::Processed);
        assert!("eventually".parse::<Commitment>().is_err());
    }

    #[test]
    fn test_from_toml_layers_over_preset() {
        let amm_id = Pubkey::new_unique();
        let toml = format!(
            r#"
cluster = "localnet"
commitment = "finalized"

[amm]
program_id = "{amm_id}"
swap_discriminator = 9
"#
        );

        let config = BlockchainConfig::from_toml_str(&toml).unwrap();
        assert_eq!(config.cluster, Cluster::Localnet);
        assert_eq!(config.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(config.commitment, Commitment::Finalized);
        assert_eq!(config.amm.program_id, Some(amm_id));
        assert_eq!(config.amm.swap_discriminator, 9);
        assert_eq!(config.amm.pool_seed, "pool");
        assert_eq!(config.programs, ProgramAddresses::default());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rpc_url = \"https://rpc.example.com\"").unwrap();

        let config = BlockchainConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.cluster, Cluster::Devnet);
        assert_eq!(config.rpc_url, "https://rpc.example.com");
    }

    #[test]
    fn test_from_toml_rejects_bad_values() {
        assert!(BlockchainConfig::from_toml_str("rpc_url = \"ftp://nope\"").is_err());
        assert!(BlockchainConfig::from_toml_str("[programs]\ntoken_program = \"xyz\"").is_err());

        let dup = "[amm]\nswap_discriminator = 0\ninit_pool_discriminator = 0";
        let err = BlockchainConfig::from_toml_str(dup).unwrap_err();
        assert!(err.to_string().contains("Duplicate AMM discriminator"));

        let long_seed = format!("[amm]\npool_seed = \"{}\"", "x".repeat(40));
        assert!(BlockchainConfig::from_toml_str(&long_seed).is_err());
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = BlockchainConfig::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, SdkError::Configuration(_)));
    }

    #[test]
    fn test_from_lookup() {
        let amm_id = Pubkey::new_unique();
        let vars: HashMap<&str, String> = HashMap::from([
            ("SOLANA_CLUSTER", "testnet".to_string()),
            ("SOLANA_RPC_URL", "https://my-node.example".to_string()),
            ("SOLANA_COMMITMENT", "processed".to_string()),
            ("AMM_PROGRAM_ID", amm_id.to_string()),
        ]);

        let config = BlockchainConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.cluster, Cluster::Testnet);
        assert_eq!(config.rpc_url, "https://my-node.example");
        assert_eq!(config.ws_url.as_deref(), Some("wss://api.testnet.solana.com"));
        assert_eq!(config.commitment, Commitment::Processed);
        assert_eq!(config.amm.program_id().unwrap(), amm_id);
    }

    #[test]
    fn test_from_lookup_invalid_amm_id() {
        let err = BlockchainConfig::from_lookup(|k| {
            (k == "AMM_PROGRAM_ID").then(|| "not-a-key".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, SdkError::InvalidAddress { .. }));
    }

    #[test]
    fn test_amm_program_id_required() {
        let err = AmmConfig::default().program_id().unwrap_err();
        assert!(matches!(err, SdkError::Configuration(_)));
    }
}
