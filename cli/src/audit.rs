//! Audit trail rebuilt from program events in transaction logs.

use anchor_lang::{AnchorDeserialize, Discriminator};
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::UiTransactionEncoding;
use std::collections::HashSet;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::client::AppContext;

const PROGRAM_DATA_PREFIX: &str = "Program data: ";

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 200;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub mint: String,
    pub action: String,
    pub actor: String,
    pub target: String,
    pub amount: Option<u64>,
    pub reason: Option<String>,
    pub tx_signature: String,
    pub created_at: i64,
}

/// A decoded event before it is tied to a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEvent {
    pub action: String,
    pub mint: Pubkey,
    pub actor: Pubkey,
    pub target: Pubkey,
    pub amount: Option<u64>,
    pub reason: Option<String>,
    pub timestamp: i64,
}

impl AuditEvent {
    fn new(action: &str, mint: Pubkey, actor: Pubkey, target: Pubkey, timestamp: i64) -> Self {
        Self {
            action: action.to_string(),
            mint,
            actor,
            target,
            amount: None,
            reason: None,
            timestamp,
        }
    }

    fn with_amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    fn with_reason(mut self, reason: String) -> Self {
        if !reason.is_empty() {
            self.reason = Some(reason);
        }
        self
    }
}

fn try_decode<T: Discriminator + AnchorDeserialize>(data: &[u8]) -> Option<T> {
    let body = data.strip_prefix(T::DISCRIMINATOR)?;
    T::deserialize(&mut &body[..]).ok()
}

/// Decodes one `Program data:` payload. Events that are not tied to a mint
/// (feed registry changes, quote closes) yield `None`.
pub fn decode_event(data: &[u8]) -> Option<AuditEvent> {
    use stablecoin_core::events as core;
    use stablecoin_oracle::events as oracle;

    if let Some(e) = try_decode::<core::Initialized>(data) {
        return Some(
            AuditEvent::new("initialize", e.mint, e.master_authority, e.mint, e.timestamp)
                .with_reason(e.preset),
        );
    }
    if let Some(e) = try_decode::<core::Minted>(data) {
        return Some(
            AuditEvent::new("mint", e.mint, e.minter, e.recipient, e.timestamp)
                .with_amount(e.amount),
        );
    }
    if let Some(e) = try_decode::<core::Burned>(data) {
        return Some(
            AuditEvent::new("burn", e.mint, e.burner, e.source, e.timestamp).with_amount(e.amount),
        );
    }
    if let Some(e) = try_decode::<core::AccountFrozenEvent>(data) {
        return Some(AuditEvent::new("freeze", e.mint, e.frozen_by, e.account, e.timestamp));
    }
    if let Some(e) = try_decode::<core::AccountThawedEvent>(data) {
        return Some(AuditEvent::new("thaw", e.mint, e.thawed_by, e.account, e.timestamp));
    }
    if let Some(e) = try_decode::<core::PausedEvent>(data) {
        return Some(AuditEvent::new("pause", e.mint, e.paused_by, e.mint, e.timestamp));
    }
    if let Some(e) = try_decode::<core::UnpausedEvent>(data) {
        return Some(AuditEvent::new("unpause", e.mint, e.unpaused_by, e.mint, e.timestamp));
    }
    if let Some(e) = try_decode::<core::RoleUpdated>(data) {
        let action = format!("role_update_{}", e.role);
        return Some(AuditEvent::new(&action, e.mint, e.updated_by, e.new_address, e.timestamp));
    }
    if let Some(e) = try_decode::<core::MinterAdded>(data) {
        return Some(
            AuditEvent::new("minter_add", e.mint, e.added_by, e.minter, e.timestamp)
                .with_amount(e.quota_per_period),
        );
    }
    if let Some(e) = try_decode::<core::MinterQuotaUpdated>(data) {
        return Some(
            AuditEvent::new("minter_update", e.mint, e.updated_by, e.minter, e.timestamp)
                .with_amount(e.quota_per_period),
        );
    }
    if let Some(e) = try_decode::<core::MinterRemoved>(data) {
        return Some(AuditEvent::new("minter_remove", e.mint, e.removed_by, e.minter, e.timestamp));
    }
    // Identical layout in both programs, so this also covers oracle authority.
    if let Some(e) = try_decode::<core::AuthorityTransferProposed>(data) {
        return Some(AuditEvent::new(
            "authority_propose",
            e.mint,
            e.current_authority,
            e.proposed_authority,
            e.timestamp,
        ));
    }
    if let Some(e) = try_decode::<core::AuthorityTransferred>(data) {
        return Some(AuditEvent::new(
            "authority_transfer",
            e.mint,
            e.old_authority,
            e.new_authority,
            e.timestamp,
        ));
    }
    if let Some(e) = try_decode::<core::Blacklisted>(data) {
        return Some(
            AuditEvent::new("blacklist_add", e.mint, e.blacklisted_by, e.address, e.timestamp)
                .with_reason(e.reason),
        );
    }
    if let Some(e) = try_decode::<core::RemovedFromBlacklist>(data) {
        return Some(AuditEvent::new(
            "blacklist_remove",
            e.mint,
            e.removed_by,
            e.address,
            e.timestamp,
        ));
    }
    if let Some(e) = try_decode::<core::Seized>(data) {
        return Some(
            AuditEvent::new("seize", e.mint, e.seized_by, e.from, e.timestamp)
                .with_amount(e.amount)
                .with_reason(e.reason),
        );
    }
    if let Some(e) = try_decode::<oracle::OracleInitialized>(data) {
        return Some(
            AuditEvent::new("oracle_init", e.mint, e.authority, e.mint, e.timestamp)
                .with_reason(e.feed_symbol),
        );
    }
    if let Some(e) = try_decode::<oracle::OracleParamsUpdated>(data) {
        return Some(AuditEvent::new("oracle_params", e.mint, e.updated_by, e.mint, e.timestamp));
    }
    if let Some(e) = try_decode::<oracle::QuoteGenerated>(data) {
        let action = format!("quote_{}", e.direction);
        return Some(
            AuditEvent::new(&action, e.mint, e.requester, e.quote_id, e.timestamp)
                .with_amount(e.input_amount),
        );
    }
    if let Some(e) = try_decode::<oracle::OracleMint>(data) {
        return Some(
            AuditEvent::new("oracle_mint", e.mint, e.requester, e.recipient, e.timestamp)
                .with_amount(e.token_amount),
        );
    }
    if let Some(e) = try_decode::<oracle::OracleRedeem>(data) {
        return Some(
            AuditEvent::new("oracle_redeem", e.mint, e.requester, e.requester, e.timestamp)
                .with_amount(e.token_amount),
        );
    }
    if let Some(e) = try_decode::<oracle::CpiMultiplierUpdated>(data) {
        return Some(
            AuditEvent::new("cpi_update", e.mint, e.updated_by, e.mint, e.timestamp)
                .with_amount(e.new_multiplier)
                .with_reason(e.reference_month),
        );
    }
    if let Some(e) = try_decode::<oracle::OraclePausedEvent>(data) {
        return Some(
            AuditEvent::new("oracle_pause", e.mint, e.paused_by, e.mint, e.timestamp)
                .with_reason(e.reason),
        );
    }
    if let Some(e) = try_decode::<oracle::OracleUnpausedEvent>(data) {
        return Some(AuditEvent::new(
            "oracle_unpause",
            e.mint,
            e.unpaused_by,
            e.mint,
            e.timestamp,
        ));
    }
    None
}

/// Raw event payloads from a transaction's log lines.
pub fn program_data(logs: &[String]) -> Vec<Vec<u8>> {
    logs.iter()
        .filter_map(|line| line.strip_prefix(PROGRAM_DATA_PREFIX))
        .filter_map(|encoded| STANDARD.decode(encoded.trim()).ok())
        .collect()
}

/// Entries for `mint` from one transaction. An action appears at most once
/// per signature, across calls sharing `seen`.
pub fn entries_from_logs(
    signature: &str,
    logs: &[String],
    mint: &Pubkey,
    seen: &mut HashSet<(String, String)>,
) -> Vec<AuditEntry> {
    program_data(logs)
        .iter()
        .filter_map(|data| decode_event(data))
        .filter(|event| event.mint == *mint)
        .filter(|event| seen.insert((signature.to_string(), event.action.clone())))
        .map(|event| AuditEntry {
            id: format!("{}-{}", signature, event.action),
            mint: event.mint.to_string(),
            action: event.action,
            actor: event.actor.to_string(),
            target: event.target.to_string(),
            amount: event.amount,
            reason: event.reason,
            tx_signature: signature.to_string(),
            created_at: event.timestamp,
        })
        .collect()
}

/// Walks recent signatures of every address and decodes the events they
/// emitted for `mint`, newest first.
pub fn fetch_audit_entries(
    ctx: &AppContext,
    mint: &Pubkey,
    addresses: &[Pubkey],
    limit: usize,
) -> Result<Vec<AuditEntry>> {
    let mut signatures = Vec::new();
    let mut unique = HashSet::new();
    for address in addresses {
        let statuses = ctx
            .client
            .get_signatures_for_address_with_config(
                address,
                GetConfirmedSignaturesForAddress2Config {
                    limit: Some(limit),
                    commitment: Some(ctx.commitment),
                    ..GetConfirmedSignaturesForAddress2Config::default()
                },
            )
            .with_context(|| format!("Failed to fetch signatures for {}", address))?;
        debug!(%address, count = statuses.len(), "fetched signatures");
        for status in statuses {
            if status.err.is_none() && unique.insert(status.signature.clone()) {
                signatures.push(status.signature);
            }
        }
    }

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for signature in signatures {
        let parsed = Signature::from_str(&signature)
            .with_context(|| format!("Invalid signature: {}", signature))?;
        let transaction = match ctx.client.get_transaction_with_config(
            &parsed,
            RpcTransactionConfig {
                encoding: Some(UiTransactionEncoding::Json),
                commitment: Some(ctx.commitment),
                max_supported_transaction_version: Some(0),
            },
        ) {
            Ok(transaction) => transaction,
            Err(err) => {
                warn!(%signature, error = %err, "skipping unreadable transaction");
                continue;
            }
        };
        let logs: Option<Vec<String>> = transaction
            .transaction
            .meta
            .and_then(|meta| meta.log_messages.into());
        if let Some(logs) = logs {
            entries.extend(entries_from_logs(&signature, &logs, mint, &mut seen));
        }
    }

    sort_newest_first(&mut entries);
    Ok(entries)
}

pub fn sort_newest_first(entries: &mut [AuditEntry]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

pub fn filter_action(entries: Vec<AuditEntry>, action: Option<&str>) -> Vec<AuditEntry> {
    match action {
        Some(action) => entries
            .into_iter()
            .filter(|entry| entry.action == action || entry.action.starts_with(&format!("{}_", action)))
            .collect(),
        None => entries,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// One-based pages. The size is clamped to `1..=MAX_PAGE_SIZE`.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let total = items.len();
    let total_pages = total.div_ceil(page_size);
    let items = items
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();
    Page {
        items,
        page,
        page_size,
        total,
        total_pages,
    }
}

const CSV_HEADER: &str = "id,mint,action,actor,target,amount,reason,txSignature,createdAt";

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn to_csv(entries: &[AuditEntry]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for entry in entries {
        let amount = entry.amount.map(|value| value.to_string()).unwrap_or_default();
        let fields = [
            csv_field(&entry.id),
            csv_field(&entry.mint),
            csv_field(&entry.action),
            csv_field(&entry.actor),
            csv_field(&entry.target),
            amount,
            csv_field(entry.reason.as_deref().unwrap_or("")),
            csv_field(&entry.tx_signature),
            entry.created_at.to_string(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}
