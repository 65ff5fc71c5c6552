use anchor_lang::{AccountDeserialize, Discriminator};
use anchor_spl::associated_token::get_associated_token_address_with_program_id;
use anchor_spl::associated_token::spl_associated_token_account::instruction as ata_instruction;
use anchor_spl::token_2022::spl_token_2022::extension::StateWithExtensions;
use anchor_spl::token_2022::spl_token_2022::state::{Account as TokenAccount2022, AccountState};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signer};
use solana_sdk::transaction::Transaction;
use std::str::FromStr;
use tracing::{debug, info};

use crate::config::{
    expand_tilde, parse_commitment, resolve_cluster, ClusterInfo, NetworkConfig, SolanaCliConfig,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct AppContext {
    pub client: RpcClient,
    pub payer: Keypair,
    pub output: OutputFormat,
    pub cluster: ClusterInfo,
    pub commitment: CommitmentConfig,
}

/// Flag, then network section of the config file, then Solana CLI config,
/// then devnet.
pub fn build_context(
    cluster_flag: Option<&str>,
    keypair_flag: Option<&str>,
    output: OutputFormat,
    solana_config: Option<&SolanaCliConfig>,
    network_override: Option<&NetworkConfig>,
) -> Result<AppContext> {
    let cluster_value = if let Some(value) = cluster_flag {
        value.to_string()
    } else if let Some(value) = network_override.and_then(|cfg| cfg.cluster.as_deref()) {
        value.to_string()
    } else if let Some(config) = solana_config {
        config.json_rpc_url.clone()
    } else {
        "devnet".to_string()
    };
    let cluster = resolve_cluster(&cluster_value)?;

    let keypair_value = if let Some(value) = keypair_flag {
        value.to_string()
    } else if let Some(value) = network_override.and_then(|cfg| cfg.keypair_path.as_deref()) {
        value.to_string()
    } else if let Some(config) = solana_config {
        config.keypair_path.clone()
    } else {
        return Err(anyhow!(
            "Missing keypair path. Use --keypair or Solana CLI config."
        ));
    };

    let commitment_value = network_override
        .and_then(|cfg| cfg.commitment.clone())
        .or_else(|| solana_config.and_then(|cfg| cfg.commitment.clone()));
    let commitment = parse_commitment(commitment_value.as_deref());

    let keypair_path = expand_tilde(&keypair_value);
    let payer = read_keypair_file(&keypair_path)
        .map_err(|err| anyhow!("Failed to read keypair: {}", err))?;

    debug!(url = %cluster.url, commitment = ?commitment.commitment, "connecting");
    let client = RpcClient::new_with_commitment(cluster.url.clone(), commitment);

    Ok(AppContext {
        client,
        payer,
        output,
        cluster,
        commitment,
    })
}

impl AppContext {
    pub fn payer_key(&self) -> Pubkey {
        self.payer.pubkey()
    }

    pub fn send(&self, instructions: Vec<Instruction>, extra_signers: &[&Keypair]) -> Result<String> {
        let blockhash = self
            .client
            .get_latest_blockhash()
            .context("Failed to fetch blockhash")?;
        let mut transaction =
            Transaction::new_with_payer(&instructions, Some(&self.payer.pubkey()));
        let mut signers: Vec<&dyn Signer> = vec![&self.payer];
        for signer in extra_signers {
            if signer.pubkey() != self.payer.pubkey() {
                signers.push(*signer);
            }
        }
        transaction.sign(&signers, blockhash);
        let signature = self
            .client
            .send_and_confirm_transaction(&transaction)
            .context("Transaction failed")?;
        info!(%signature, "transaction confirmed");
        Ok(signature.to_string())
    }

    pub fn explorer_url(&self, signature: &str) -> Option<String> {
        explorer_url(signature, &self.cluster)
    }

    /// Fetches and decodes an Anchor account. Missing accounts are an error.
    pub fn fetch<T: AccountDeserialize>(&self, address: &Pubkey) -> Result<T> {
        debug!(%address, "fetching account");
        let account = self
            .client
            .get_account(address)
            .with_context(|| format!("Account not found: {}", address))?;
        T::try_deserialize(&mut account.data.as_slice())
            .with_context(|| format!("Failed to decode account {}", address))
    }

    /// `Ok(None)` when the account does not exist; `Err` only when the RPC
    /// call itself fails.
    pub fn fetch_optional<T: AccountDeserialize>(&self, address: &Pubkey) -> Result<Option<T>> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .with_context(|| format!("RPC read failed for {}", address))?;
        response
            .value
            .map(|account| {
                T::try_deserialize(&mut account.data.as_slice())
                    .with_context(|| format!("Failed to decode account {}", address))
            })
            .transpose()
    }

    /// Every account of type `T` owned by `program_id` whose first field
    /// (right after the discriminator) equals `key`.
    pub fn list_by_first_field<T: AccountDeserialize + Discriminator>(
        &self,
        program_id: &Pubkey,
        key: &Pubkey,
    ) -> Result<Vec<(Pubkey, T)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![
                RpcFilterType::Memcmp(Memcmp::new_base58_encoded(0, T::DISCRIMINATOR)),
                RpcFilterType::Memcmp(Memcmp::new_base58_encoded(8, key.as_ref())),
            ]),
            account_config: RpcAccountInfoConfig {
                encoding: None,
                commitment: Some(self.commitment),
                data_slice: None,
                min_context_slot: None,
            },
            ..RpcProgramAccountsConfig::default()
        };
        let accounts = self
            .client
            .get_program_accounts_with_config(program_id, config)
            .context("Failed to list program accounts")?;
        debug!(count = accounts.len(), %program_id, "listed accounts");

        Ok(accounts
            .into_iter()
            .filter_map(|(address, account)| {
                T::try_deserialize(&mut account.data.as_slice())
                    .ok()
                    .map(|decoded| (address, decoded))
            })
            .collect())
    }

    pub fn fetch_token_account(&self, address: &Pubkey) -> Result<TokenAccountInfo> {
        let account = self
            .client
            .get_account(address)
            .with_context(|| format!("Token account not found: {}", address))?;
        decode_token_account(&account.data)
    }

    pub fn token_holders(&self, mint: &Pubkey) -> Result<Vec<(Pubkey, TokenAccountInfo)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
                0,
                mint.as_ref(),
            ))]),
            account_config: RpcAccountInfoConfig {
                encoding: None,
                commitment: Some(self.commitment),
                data_slice: None,
                min_context_slot: None,
            },
            ..RpcProgramAccountsConfig::default()
        };
        let accounts = self
            .client
            .get_program_accounts_with_config(&anchor_spl::token_2022::ID, config)
            .context("Failed to list token accounts")?;

        accounts
            .into_iter()
            .map(|(address, account)| Ok((address, decode_token_account(&account.data)?)))
            .collect()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TokenAccountInfo {
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
    pub frozen: bool,
}

pub fn decode_token_account(data: &[u8]) -> Result<TokenAccountInfo> {
    let parsed = StateWithExtensions::<TokenAccount2022>::unpack(data)
        .map_err(|err| anyhow!("Failed to decode token account: {}", err))?;
    Ok(TokenAccountInfo {
        owner: parsed.base.owner,
        mint: parsed.base.mint,
        amount: parsed.base.amount,
        frozen: parsed.base.state == AccountState::Frozen,
    })
}

pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address_with_program_id(owner, mint, &anchor_spl::token_2022::ID)
}

pub fn create_associated_token_account_idempotent(
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Instruction {
    ata_instruction::create_associated_token_account_idempotent(
        payer,
        owner,
        mint,
        &anchor_spl::token_2022::ID,
    )
}

pub fn parse_pubkey(value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).map_err(|_| anyhow!("Invalid pubkey: {}", value))
}

pub fn resolve_mint(mint: &Option<String>) -> Result<Pubkey> {
    let value = mint.as_deref().ok_or_else(|| anyhow!("Missing --mint"))?;
    parse_pubkey(value)
}

/// Parses a human amount ("1.5", "1_000") into base units.
pub fn parse_amount(value: &str, decimals: u8) -> Result<u64> {
    let sanitized = value.replace('_', "");
    let (whole, fractional) = sanitized
        .split_once('.')
        .unwrap_or((sanitized.as_str(), ""));
    if whole.is_empty() && fractional.is_empty() {
        return Err(anyhow!("Invalid amount: {}", value));
    }
    if fractional.len() > decimals as usize {
        return Err(anyhow!("Too many decimal places"));
    }

    let whole_value: u64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .with_context(|| format!("Invalid amount: {}", value))?
    };
    let mut fraction = fractional.to_string();
    while fraction.len() < decimals as usize {
        fraction.push('0');
    }
    let fractional_value: u64 = if fraction.is_empty() {
        0
    } else {
        fraction
            .parse()
            .with_context(|| format!("Invalid amount: {}", value))?
    };
    let scale = 10u64
        .checked_pow(decimals as u32)
        .ok_or_else(|| anyhow!("Decimal overflow"))?;
    whole_value
        .checked_mul(scale)
        .and_then(|value| value.checked_add(fractional_value))
        .ok_or_else(|| anyhow!("Amount overflow"))
}

pub fn format_amount(amount: u64, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = 10u64.pow(decimals as u32);
    let whole = amount / scale;
    let frac = amount % scale;
    format!("{}.{:0width$}", whole, frac, width = decimals as usize)
}

/// USD cents as dollars.
pub fn format_usd(cents: u64) -> String {
    format!("${}", format_amount(cents, 2))
}

pub fn explorer_url(signature: &str, cluster: &ClusterInfo) -> Option<String> {
    cluster.label.as_ref().map(|label| {
        format!(
            "https://explorer.solana.com/tx/{}?cluster={}",
            signature, label
        )
    })
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
pub struct SimpleOutput {
    pub signature: String,
    pub explorer: Option<String>,
}

/// Prints the outcome of a single transaction in the selected format.
pub fn report_signature(ctx: &AppContext, headline: &str, signature: String) -> Result<()> {
    let explorer = ctx.explorer_url(&signature);
    if ctx.output == OutputFormat::Json {
        print_json(&SimpleOutput {
            signature,
            explorer,
        })
    } else {
        println!("{}", headline);
        println!("Tx: {}", signature);
        if let Some(url) = explorer {
            println!("Explorer: {}", url);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_amounts_with_decimals() {
        assert_eq!(parse_amount("1", 6).unwrap(), 1_000_000);
        assert_eq!(parse_amount("1.5", 6).unwrap(), 1_500_000);
        assert_eq!(parse_amount("0.000001", 6).unwrap(), 1);
        assert_eq!(parse_amount(".5", 2).unwrap(), 50);
        assert_eq!(parse_amount("1_000.25", 2).unwrap(), 100_025);
        assert_eq!(parse_amount("42", 0).unwrap(), 42);
    }

    #[test]
    fn rejects_bad_amounts() {
        assert!(parse_amount("1.0000001", 6).is_err());
        assert!(parse_amount("abc", 6).is_err());
        assert!(parse_amount(".", 6).is_err());
        assert!(parse_amount("18446744073709551616", 0).is_err());
        assert!(parse_amount("18446744073709.551616", 6).is_err());
    }

    #[test]
    fn formats_amounts() {
        assert_eq!(format_amount(1_500_000, 6), "1.500000");
        assert_eq!(format_amount(100, 2), "1.00");
        assert_eq!(format_amount(10, 0), "10");
        assert_eq!(format_usd(10_830), "$108.30");
    }

    #[test]
    fn explorer_link_needs_known_cluster() {
        let devnet = resolve_cluster("devnet").unwrap();
        assert_eq!(
            explorer_url("sig", &devnet).as_deref(),
            Some("https://explorer.solana.com/tx/sig?cluster=devnet")
        );
        let private = resolve_cluster("http://10.0.0.5:8899").unwrap();
        assert!(explorer_url("sig", &private).is_none());
    }

    #[test]
    fn idempotent_ata_targets_token_2022() {
        let payer = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let ix = create_associated_token_account_idempotent(&payer, &owner, &mint);
        assert_eq!(ix.program_id, anchor_spl::associated_token::ID);
        assert_eq!(ix.accounts[1].pubkey, associated_token_address(&owner, &mint));
        assert!(ix.accounts[0].is_signer);
        assert!(ix
            .accounts
            .iter()
            .any(|meta| meta.pubkey == anchor_spl::token_2022::ID));

        let classic = get_associated_token_address_with_program_id(
            &owner,
            &mint,
            &anchor_spl::token::ID,
        );
        assert_ne!(associated_token_address(&owner, &mint), classic);
    }

    proptest! {
        #[test]
        fn format_then_parse_is_identity(amount in any::<u64>(), decimals in 0u8..=9) {
            let formatted = format_amount(amount, decimals);
            prop_assert_eq!(parse_amount(&formatted, decimals).unwrap(), amount);
        }
    }
}
