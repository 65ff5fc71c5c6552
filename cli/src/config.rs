use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use stablecoin_core::instructions::PresetParams;
use stablecoin_core::state::{ComplianceRoles, Extensions};
use std::fs;
use std::path::PathBuf;

use crate::client::parse_pubkey;

/// `init --config` file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SssConfig {
    pub token: TokenConfig,
    pub extensions: Option<ExtensionsConfig>,
    pub roles: Option<RolesConfig>,
    pub network: Option<NetworkConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: Option<u8>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtensionsConfig {
    pub permanent_delegate: Option<bool>,
    pub transfer_hook: Option<bool>,
    pub default_account_frozen: Option<bool>,
}

impl ExtensionsConfig {
    pub fn from_preset(compliant: bool) -> Self {
        Self {
            permanent_delegate: Some(compliant),
            transfer_hook: Some(compliant),
            default_account_frozen: Some(compliant),
        }
    }

    pub fn to_extensions(&self) -> Extensions {
        Extensions {
            permanent_delegate: self.permanent_delegate.unwrap_or(false),
            transfer_hook: self.transfer_hook.unwrap_or(false),
            default_frozen: self.default_account_frozen.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RolesConfig {
    pub pauser: Option<String>,
    pub minter_authority: Option<String>,
    pub burner: Option<String>,
    pub blacklister: Option<String>,
    pub seizer: Option<String>,
    pub minters: Option<Vec<MinterEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinterEntry {
    pub pubkey: String,
    /// Base units. 0 means unlimited.
    pub quota: u64,
    #[serde(default)]
    pub period_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub cluster: Option<String>,
    pub keypair_path: Option<String>,
    pub commitment: Option<String>,
}

/// Subset of `~/.config/solana/cli/config.yml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SolanaCliConfig {
    pub json_rpc_url: String,
    pub keypair_path: String,
    pub commitment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterInfo {
    pub url: String,
    pub label: Option<String>,
}

fn optional_pubkey(value: Option<&String>) -> Result<Option<Pubkey>> {
    value.map(|value| parse_pubkey(value)).transpose()
}

impl RolesConfig {
    pub fn pauser(&self) -> Result<Option<Pubkey>> {
        optional_pubkey(self.pauser.as_ref())
    }

    pub fn minter_authority(&self) -> Result<Option<Pubkey>> {
        optional_pubkey(self.minter_authority.as_ref())
    }

    pub fn burner(&self) -> Result<Option<Pubkey>> {
        optional_pubkey(self.burner.as_ref())
    }

    pub fn minters(&self) -> Result<Vec<(Pubkey, u64, i64)>> {
        self.minters
            .iter()
            .flatten()
            .map(|entry| Ok((parse_pubkey(&entry.pubkey)?, entry.quota, entry.period_seconds)))
            .collect()
    }
}

/// Maps extension flags onto the narrowest preset that carries them.
/// Compliance roles default to `authority` when the file names none.
pub fn preset_from_config(
    extensions: &ExtensionsConfig,
    roles: &RolesConfig,
    authority: Pubkey,
) -> Result<PresetParams> {
    let blacklister = optional_pubkey(roles.blacklister.as_ref())?.unwrap_or(authority);
    let seizer = optional_pubkey(roles.seizer.as_ref())?.unwrap_or(authority);
    let flags = extensions.to_extensions();

    if flags == Extensions::NONE && roles.blacklister.is_none() && roles.seizer.is_none() {
        return Ok(PresetParams::Sss1);
    }
    if flags == Extensions::COMPLIANT {
        return Ok(PresetParams::Sss2 {
            blacklister,
            seizer,
        });
    }

    let wants_compliance = flags.transfer_hook
        || flags.permanent_delegate
        || roles.blacklister.is_some()
        || roles.seizer.is_some();
    let compliance = wants_compliance.then_some(ComplianceRoles {
        blacklister,
        seizer,
        hook_authority: authority,
    });
    Ok(PresetParams::Custom {
        extensions: flags,
        compliance,
    })
}

pub fn preset_from_name(name: &str, authority: Pubkey) -> Result<PresetParams> {
    match name.to_lowercase().as_str() {
        "sss-1" => Ok(PresetParams::Sss1),
        "sss-2" => Ok(PresetParams::Sss2 {
            blacklister: authority,
            seizer: authority,
        }),
        other => bail!("Invalid preset: {} (expected sss-1 or sss-2)", other),
    }
}

pub fn load_sss_config(path: &str) -> Result<SssConfig> {
    let contents = fs::read_to_string(expand_tilde(path))
        .with_context(|| format!("Failed to read config: {}", path))?;
    toml::from_str(&contents).context("Failed to parse config")
}

pub fn load_solana_cli_config() -> Result<SolanaCliConfig> {
    let path = default_solana_config_path();
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read Solana config: {}", path.display()))?;
    serde_yaml::from_str(&contents).context("Failed to parse Solana config")
}

fn default_solana_config_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("solana");
    path.push("cli");
    path.push("config.yml");
    path
}

pub fn resolve_cluster(input: &str) -> Result<ClusterInfo> {
    let lowered = input.to_lowercase();
    let (url, label) = match lowered.as_str() {
        "devnet" => (
            "https://api.devnet.solana.com".to_string(),
            Some("devnet".to_string()),
        ),
        "testnet" => (
            "https://api.testnet.solana.com".to_string(),
            Some("testnet".to_string()),
        ),
        "mainnet" | "mainnet-beta" => (
            "https://api.mainnet-beta.solana.com".to_string(),
            Some("mainnet-beta".to_string()),
        ),
        "localnet" => (
            "http://127.0.0.1:8899".to_string(),
            Some("localnet".to_string()),
        ),
        _ => {
            if input.starts_with("http://") || input.starts_with("https://") {
                let label = if lowered.contains("devnet") {
                    Some("devnet".to_string())
                } else if lowered.contains("testnet") {
                    Some("testnet".to_string())
                } else if lowered.contains("mainnet") {
                    Some("mainnet-beta".to_string())
                } else {
                    None
                };
                (input.to_string(), label)
            } else {
                return Err(anyhow!("Unknown cluster: {}", input));
            }
        }
    };
    Ok(ClusterInfo { url, label })
}

pub fn parse_commitment(value: Option<&str>) -> CommitmentConfig {
    match value.unwrap_or("confirmed") {
        "processed" => CommitmentConfig::processed(),
        "finalized" => CommitmentConfig::finalized(),
        _ => CommitmentConfig::confirmed(),
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_named_and_custom_clusters() {
        let devnet = resolve_cluster("devnet").unwrap();
        assert_eq!(devnet.url, "https://api.devnet.solana.com");
        assert_eq!(devnet.label.as_deref(), Some("devnet"));

        let custom = resolve_cluster("https://my-rpc.mainnet.example.com").unwrap();
        assert_eq!(custom.label.as_deref(), Some("mainnet-beta"));

        let private = resolve_cluster("http://10.0.0.5:8899").unwrap();
        assert_eq!(private.label, None);

        assert!(resolve_cluster("moon").is_err());
    }

    #[test]
    fn commitment_defaults_to_confirmed() {
        assert_eq!(parse_commitment(None), CommitmentConfig::confirmed());
        assert_eq!(
            parse_commitment(Some("finalized")),
            CommitmentConfig::finalized()
        );
        assert_eq!(parse_commitment(Some("bogus")), CommitmentConfig::confirmed());
    }

    #[test]
    fn parses_full_config_file() {
        let minter = Pubkey::new_unique();
        let contents = format!(
            r#"
            [token]
            name = "Euro Coin"
            symbol = "EURC"
            decimals = 6

            [extensions]
            permanent_delegate = true
            transfer_hook = true
            default_account_frozen = true

            [[roles.minters]]
            pubkey = "{minter}"
            quota = 1000000
            period_seconds = 86400

            [network]
            cluster = "localnet"
            "#
        );
        let config: SssConfig = toml::from_str(&contents).unwrap();
        assert_eq!(config.token.symbol, "EURC");
        let roles = config.roles.unwrap();
        assert_eq!(roles.minters().unwrap(), vec![(minter, 1_000_000, 86_400)]);
        assert_eq!(
            config.network.unwrap().cluster.as_deref(),
            Some("localnet")
        );
        assert_eq!(
            config.extensions.unwrap().to_extensions(),
            Extensions::COMPLIANT
        );
    }

    #[test]
    fn preset_follows_extension_flags() {
        let authority = Pubkey::new_unique();
        let roles = RolesConfig::default();

        let preset =
            preset_from_config(&ExtensionsConfig::default(), &roles, authority).unwrap();
        assert!(matches!(preset, PresetParams::Sss1));

        let preset =
            preset_from_config(&ExtensionsConfig::from_preset(true), &roles, authority).unwrap();
        match preset {
            PresetParams::Sss2 {
                blacklister,
                seizer,
            } => {
                assert_eq!(blacklister, authority);
                assert_eq!(seizer, authority);
            }
            other => panic!("unexpected preset {:?}", other),
        }

        let partial = ExtensionsConfig {
            permanent_delegate: Some(true),
            transfer_hook: None,
            default_account_frozen: None,
        };
        match preset_from_config(&partial, &roles, authority).unwrap() {
            PresetParams::Custom {
                extensions,
                compliance,
            } => {
                assert!(extensions.permanent_delegate);
                assert!(!extensions.transfer_hook);
                assert_eq!(compliance.unwrap().hook_authority, authority);
            }
            other => panic!("unexpected preset {:?}", other),
        }
    }

    #[test]
    fn preset_names() {
        let authority = Pubkey::new_unique();
        assert!(matches!(
            preset_from_name("SSS-1", authority).unwrap(),
            PresetParams::Sss1
        ));
        assert!(preset_from_name("sss-3", authority).is_err());
    }

    #[test]
    fn expands_home_prefix() {
        let expanded = expand_tilde("~/keys/id.json");
        assert!(expanded.ends_with("keys/id.json"));
        assert_eq!(expand_tilde("/tmp/id.json"), PathBuf::from("/tmp/id.json"));
    }
}
