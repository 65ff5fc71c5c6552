mod audit;
mod client;
mod config;
mod oracle;
mod sdk;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use stablecoin_core::instructions::{InitializeParams, PresetParams};
use stablecoin_core::state::{BlacklistEntry, MinterConfig, RoleUpdate, StablecoinConfig};
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use transfer_hook::state::HookConfig;

use crate::audit::{fetch_audit_entries, filter_action, paginate, to_csv, DEFAULT_PAGE_SIZE};
use crate::client::{
    associated_token_address, build_context, create_associated_token_account_idempotent,
    format_amount, parse_amount, parse_pubkey, print_json, report_signature, resolve_mint,
    AppContext, OutputFormat,
};
use crate::config::{
    load_solana_cli_config, load_sss_config, preset_from_config, preset_from_name, RolesConfig,
    SssConfig, TokenConfig,
};
use crate::oracle::{FeedsCmd, OracleCmd, QuoteCmd};
use crate::sdk::{config_pda, initialize_ix, oracle_pda, CoreHandle, Stablecoin};

#[derive(Parser)]
#[command(name = "sss-token", version, about = "Solana Stablecoin Standard CLI")]
struct Cli {
    #[arg(long, global = true)]
    cluster: Option<String>,

    #[arg(long, global = true)]
    keypair: Option<String>,

    #[arg(long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Debug logging on stderr. Otherwise RUST_LOG applies.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Init(InitArgs),
    Mint(MintArgs),
    Burn(BurnArgs),
    Freeze(AddressArgs),
    Thaw(AddressArgs),
    Pause(MintOnlyArgs),
    Unpause(MintOnlyArgs),
    #[command(subcommand)]
    Blacklist(BlacklistCmd),
    Seize(SeizeArgs),
    #[command(subcommand)]
    Minters(MintersCmd),
    #[command(subcommand)]
    Roles(RolesCmd),
    #[command(subcommand)]
    Authority(AuthorityCmd),
    #[command(subcommand)]
    Hook(HookCmd),
    Status(MintOnlyArgs),
    Supply(MintOnlyArgs),
    Holders(HoldersArgs),
    AuditLog(AuditLogArgs),
    #[command(subcommand)]
    Feeds(FeedsCmd),
    #[command(subcommand)]
    Oracle(OracleCmd),
    #[command(subcommand)]
    Quote(QuoteCmd),
}

#[derive(Parser)]
struct InitArgs {
    #[arg(long)]
    preset: Option<String>,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    symbol: Option<String>,

    #[arg(long, default_value_t = 6)]
    decimals: u8,

    #[arg(long)]
    uri: Option<String>,
}

#[derive(Parser)]
struct MintArgs {
    recipient: String,
    amount: String,

    #[arg(long)]
    mint: Option<String>,
}

#[derive(Parser)]
struct BurnArgs {
    amount: String,

    #[arg(long)]
    mint: Option<String>,
}

#[derive(Parser)]
struct AddressArgs {
    address: String,

    #[arg(long)]
    mint: Option<String>,
}

#[derive(Subcommand)]
enum BlacklistCmd {
    Add(BlacklistAddArgs),
    Remove(AddressArgs),
    Check(BlacklistCheckArgs),
    List(ListArgs),
}

#[derive(Parser)]
struct BlacklistAddArgs {
    address: String,

    #[arg(long)]
    reason: String,

    #[arg(long)]
    mint: Option<String>,
}

#[derive(Parser)]
struct BlacklistCheckArgs {
    address: String,

    #[arg(long)]
    mint: Option<String>,

    /// JSON list of `{address, reason}` used when the RPC read fails.
    #[arg(long)]
    fallback_snapshot: Option<String>,
}

#[derive(Parser)]
struct ListArgs {
    #[arg(long)]
    mint: Option<String>,

    /// Include inactive entries.
    #[arg(long)]
    all: bool,

    #[arg(long, default_value_t = 1)]
    page: usize,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,
}

#[derive(Parser)]
struct SeizeArgs {
    /// Owner of the account to seize from.
    address: String,

    /// Owner of the receiving account.
    #[arg(long)]
    to: String,

    #[arg(long)]
    amount: String,

    #[arg(long, default_value = "")]
    reason: String,

    #[arg(long)]
    mint: Option<String>,
}

#[derive(Subcommand)]
enum MintersCmd {
    List(ListArgs),
    Add(MinterQuotaArgs),
    Remove(AddressArgs),
    Update(MinterQuotaArgs),
}

#[derive(Parser)]
struct MinterQuotaArgs {
    address: String,

    /// Tokens per period. 0 means unlimited.
    #[arg(long)]
    quota: String,

    /// 0 makes the quota a lifetime cap.
    #[arg(long, default_value_t = 0)]
    period_seconds: i64,

    #[arg(long)]
    mint: Option<String>,
}

#[derive(Subcommand)]
enum RolesCmd {
    Update(RolesUpdateArgs),
}

#[derive(Parser)]
struct RolesUpdateArgs {
    #[arg(long)]
    mint: Option<String>,

    #[arg(long)]
    pauser: Option<String>,

    #[arg(long)]
    minter_authority: Option<String>,

    #[arg(long)]
    burner: Option<String>,

    #[arg(long)]
    blacklister: Option<String>,

    #[arg(long)]
    seizer: Option<String>,

    #[arg(long)]
    hook_authority: Option<String>,
}

#[derive(Subcommand)]
enum AuthorityCmd {
    Propose(AddressArgs),
    Accept(MintOnlyArgs),
    Cancel(MintOnlyArgs),
}

#[derive(Subcommand)]
enum HookCmd {
    Enable(MintOnlyArgs),
    Disable(MintOnlyArgs),
    Status(MintOnlyArgs),
}

#[derive(Parser)]
struct MintOnlyArgs {
    #[arg(long)]
    mint: Option<String>,
}

#[derive(Parser)]
struct HoldersArgs {
    #[arg(long)]
    min_balance: Option<String>,

    #[arg(long)]
    mint: Option<String>,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum AuditFormat {
    Text,
    Json,
    Csv,
}

#[derive(Parser)]
struct AuditLogArgs {
    #[arg(long)]
    action: Option<String>,

    #[arg(long, default_value_t = 1)]
    page: usize,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Signatures fetched per address.
    #[arg(long, default_value_t = 1000)]
    limit: usize,

    /// Defaults to --output.
    #[arg(long, value_enum)]
    format: Option<AuditFormat>,

    #[arg(long)]
    mint: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}

fn init_logging(verbose: bool) {
    let builder = tracing_subscriber::fmt().with_writer(std::io::stderr);
    if verbose {
        builder.with_max_level(tracing::Level::DEBUG).init();
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        builder.with_env_filter(filter).init();
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Quote(cmd) = &cli.command {
        if oracle::is_offline(cmd) {
            return oracle::simulate(cmd, cli.output);
        }
    }

    let solana_config = load_solana_cli_config().ok();
    let config_file = match &cli.command {
        Commands::Init(args) => args
            .config
            .as_ref()
            .map(|path| load_sss_config(path))
            .transpose()?,
        _ => None,
    };
    let network_override = config_file.as_ref().and_then(|cfg| cfg.network.as_ref());
    let ctx = build_context(
        cli.cluster.as_deref(),
        cli.keypair.as_deref(),
        cli.output,
        solana_config.as_ref(),
        network_override,
    )?;

    match &cli.command {
        Commands::Init(args) => handle_init(&ctx, args, config_file.as_ref()),
        Commands::Mint(args) => handle_mint(&ctx, args),
        Commands::Burn(args) => handle_burn(&ctx, args),
        Commands::Freeze(args) => handle_set_frozen(&ctx, args, true),
        Commands::Thaw(args) => handle_set_frozen(&ctx, args, false),
        Commands::Pause(args) => handle_set_paused(&ctx, args, true),
        Commands::Unpause(args) => handle_set_paused(&ctx, args, false),
        Commands::Blacklist(cmd) => handle_blacklist(&ctx, cmd),
        Commands::Seize(args) => handle_seize(&ctx, args),
        Commands::Minters(cmd) => handle_minters(&ctx, cmd),
        Commands::Roles(RolesCmd::Update(args)) => handle_roles_update(&ctx, args),
        Commands::Authority(cmd) => handle_authority(&ctx, cmd),
        Commands::Hook(cmd) => handle_hook(&ctx, cmd),
        Commands::Status(args) => handle_status(&ctx, args),
        Commands::Supply(args) => handle_supply(&ctx, args),
        Commands::Holders(args) => handle_holders(&ctx, args),
        Commands::AuditLog(args) => handle_audit_log(&ctx, args),
        Commands::Feeds(cmd) => oracle::handle_feeds(&ctx, cmd),
        Commands::Oracle(cmd) => oracle::handle_oracle(&ctx, cmd),
        Commands::Quote(cmd) => oracle::handle_quote(&ctx, cmd),
    }
}

fn fetch_config(ctx: &AppContext, mint: &Pubkey) -> Result<StablecoinConfig> {
    ctx.fetch(&config_pda(mint))
        .with_context(|| format!("No stablecoin config for mint {}", mint))
}

/// Loads the config and resolves which capabilities the mint carries.
fn load_stablecoin(ctx: &AppContext, mint: &Pubkey) -> Result<(StablecoinConfig, Stablecoin)> {
    let config = fetch_config(ctx, mint)?;
    let coin = Stablecoin::from_config(&config);
    Ok((config, coin))
}

fn account_exists(ctx: &AppContext, address: &Pubkey) -> Result<bool> {
    Ok(ctx
        .client
        .get_account_with_commitment(address, ctx.commitment)
        .with_context(|| format!("RPC read failed for {}", address))?
        .value
        .is_some())
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}

fn handle_init(ctx: &AppContext, args: &InitArgs, config: Option<&SssConfig>) -> Result<()> {
    let authority = ctx.payer_key();
    if args.preset.is_some() && args.config.is_some() {
        bail!("--preset and --config are mutually exclusive");
    }

    let (token, preset, roles) = if let Some(config) = config {
        let extensions = config.extensions.clone().unwrap_or_default();
        let roles = config.roles.clone().unwrap_or_default();
        let preset = preset_from_config(&extensions, &roles, authority)?;
        (config.token.clone(), preset, roles)
    } else {
        let preset_name = args
            .preset
            .as_deref()
            .ok_or_else(|| anyhow!("Missing --preset or --config"))?;
        let token = TokenConfig {
            name: args
                .name
                .clone()
                .ok_or_else(|| anyhow!("--name is required when using --preset"))?,
            symbol: args
                .symbol
                .clone()
                .ok_or_else(|| anyhow!("--symbol is required when using --preset"))?,
            decimals: Some(args.decimals),
            uri: args.uri.clone(),
        };
        (token, preset_from_name(preset_name, authority)?, RolesConfig::default())
    };

    let wants_hook = match &preset {
        PresetParams::Sss1 => false,
        PresetParams::Sss2 { .. } => true,
        PresetParams::Custom { extensions, .. } => extensions.transfer_hook,
    };
    let minter_authority = roles.minter_authority()?;
    let params = InitializeParams {
        name: token.name,
        symbol: token.symbol,
        uri: token.uri.unwrap_or_default(),
        decimals: token.decimals.unwrap_or(6),
        preset,
        pauser: roles.pauser()?,
        minter_authority,
        burner: roles.burner()?,
    };

    let mint_keypair = Keypair::new();
    let mint = mint_keypair.pubkey();
    let hook_program = wants_hook.then_some(transfer_hook::ID);
    let signature = ctx.send(
        vec![initialize_ix(authority, mint, hook_program, params)],
        &[&mint_keypair],
    )?;
    info!(%mint, "stablecoin initialized");

    let (config_state, coin) = load_stablecoin(ctx, &mint)?;
    if let Some(hook) = coin.hook() {
        ctx.send(
            vec![
                hook.initialize_hook_ix(authority, true),
                hook.initialize_extra_metas_ix(authority),
            ],
            &[],
        )?;
        info!(hook_config = %hook.hook_config, "transfer hook initialized");
    }

    let minters = roles.minters()?;
    if !minters.is_empty() {
        if minter_authority.unwrap_or(authority) == authority {
            let core = coin.core();
            let instructions = minters
                .iter()
                .map(|(minter, quota, period)| core.add_minter_ix(authority, *minter, *quota, *period))
                .collect();
            ctx.send(instructions, &[])?;
        } else {
            warn!("minter authority is another key; configured minters were not added");
        }
    }

    let preset_label = config_state.profile.preset_name();
    let explorer = ctx.explorer_url(&signature);
    if ctx.output == OutputFormat::Json {
        print_json(&InitOutput {
            mint: mint.to_string(),
            config: config_pda(&mint).to_string(),
            preset: preset_label.to_string(),
            signature,
            explorer,
        })
    } else {
        println!("Stablecoin initialized");
        println!("Mint:     {}", mint);
        println!("Config:   {}", config_pda(&mint));
        println!("Preset:   {}", preset_label);
        println!("Tx:       {}", signature);
        if let Some(url) = explorer {
            println!("Explorer: {}", url);
        }
        Ok(())
    }
}

fn handle_mint(ctx: &AppContext, args: &MintArgs) -> Result<()> {
    let mint = resolve_mint(&args.mint)?;
    let config = fetch_config(ctx, &mint)?;
    let amount = parse_amount(&args.amount, config.decimals)?;
    let recipient = parse_pubkey(&args.recipient)?;
    let payer = ctx.payer_key();
    let core = CoreHandle::new(mint);

    let signature = ctx.send(
        vec![
            create_associated_token_account_idempotent(&payer, &recipient, &mint),
            core.mint_ix(payer, associated_token_address(&recipient, &mint), amount),
        ],
        &[],
    )?;
    let supply = ctx.client.get_token_supply(&mint)?;
    let explorer = ctx.explorer_url(&signature);
    if ctx.output == OutputFormat::Json {
        print_json(&SupplyChangeOutput {
            signature,
            explorer,
            new_supply: supply.amount,
        })
    } else {
        println!(
            "Minted {} tokens to {}",
            format_amount(amount, config.decimals),
            recipient
        );
        println!("New supply: {}", supply.ui_amount_string);
        println!("Tx: {}", signature);
        if let Some(url) = explorer {
            println!("Explorer: {}", url);
        }
        Ok(())
    }
}

fn handle_burn(ctx: &AppContext, args: &BurnArgs) -> Result<()> {
    let mint = resolve_mint(&args.mint)?;
    let config = fetch_config(ctx, &mint)?;
    let amount = parse_amount(&args.amount, config.decimals)?;
    let burner = ctx.payer_key();
    let core = CoreHandle::new(mint);

    let signature = ctx.send(
        vec![core.burn_ix(burner, burner, associated_token_address(&burner, &mint), amount)],
        &[],
    )?;
    let supply = ctx.client.get_token_supply(&mint)?;
    let explorer = ctx.explorer_url(&signature);
    if ctx.output == OutputFormat::Json {
        print_json(&SupplyChangeOutput {
            signature,
            explorer,
            new_supply: supply.amount,
        })
    } else {
        println!(
            "Burned {} tokens from {}",
            format_amount(amount, config.decimals),
            burner
        );
        println!("New supply: {}", supply.ui_amount_string);
        println!("Tx: {}", signature);
        if let Some(url) = explorer {
            println!("Explorer: {}", url);
        }
        Ok(())
    }
}

fn handle_set_frozen(ctx: &AppContext, args: &AddressArgs, frozen: bool) -> Result<()> {
    let mint = resolve_mint(&args.mint)?;
    let owner = parse_pubkey(&args.address)?;
    let token_account = associated_token_address(&owner, &mint);
    let core = CoreHandle::new(mint);
    let authority = ctx.payer_key();

    let (ix, headline) = if frozen {
        (core.freeze_ix(authority, token_account), "Frozen token account")
    } else {
        (core.thaw_ix(authority, token_account), "Thawed token account")
    };
    let signature = ctx.send(vec![ix], &[])?;
    report_signature(ctx, &format!("{}: {}", headline, token_account), signature)
}

fn handle_set_paused(ctx: &AppContext, args: &MintOnlyArgs, paused: bool) -> Result<()> {
    let mint = resolve_mint(&args.mint)?;
    let core = CoreHandle::new(mint);
    let signature = ctx.send(vec![core.pause_ix(ctx.payer_key(), paused)], &[])?;
    let headline = if paused { "System paused" } else { "System unpaused" };
    report_signature(ctx, headline, signature)
}

/// `blacklist check --fallback-snapshot` file entry.
#[derive(Debug, Clone, Deserialize)]
struct SnapshotEntry {
    address: String,
    #[serde(default)]
    reason: Option<String>,
}

fn load_snapshot(path: &str) -> Result<Vec<SnapshotEntry>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read snapshot: {}", path))?;
    serde_json::from_str(&contents).context("Failed to parse snapshot")
}

fn check_snapshot(entries: &[SnapshotEntry], address: &Pubkey) -> BlacklistStatusOutput {
    let hit = entries
        .iter()
        .find(|entry| parse_pubkey(&entry.address).ok().as_ref() == Some(address));
    BlacklistStatusOutput {
        address: address.to_string(),
        blacklisted: hit.is_some(),
        reason: hit.and_then(|entry| entry.reason.clone()),
        degraded: true,
    }
}

fn handle_blacklist(ctx: &AppContext, cmd: &BlacklistCmd) -> Result<()> {
    let blacklister = ctx.payer_key();
    match cmd {
        BlacklistCmd::Add(args) => {
            let mint = resolve_mint(&args.mint)?;
            let (_, coin) = load_stablecoin(ctx, &mint)?;
            let compliance = coin
                .compliance()
                .ok_or_else(|| anyhow!("Compliance is not enabled for this stablecoin"))?;
            let address = parse_pubkey(&args.address)?;
            let signature = ctx.send(
                vec![compliance.add_to_blacklist_ix(blacklister, address, args.reason.clone())],
                &[],
            )?;
            report_signature(ctx, &format!("Blacklisted: {}", address), signature)
        }
        BlacklistCmd::Remove(args) => {
            let mint = resolve_mint(&args.mint)?;
            let (_, coin) = load_stablecoin(ctx, &mint)?;
            let compliance = coin
                .compliance()
                .ok_or_else(|| anyhow!("Compliance is not enabled for this stablecoin"))?;
            let address = parse_pubkey(&args.address)?;
            let signature = ctx.send(
                vec![compliance.remove_from_blacklist_ix(blacklister, address)],
                &[],
            )?;
            report_signature(ctx, &format!("Removed from blacklist: {}", address), signature)
        }
        BlacklistCmd::Check(args) => {
            let mint = resolve_mint(&args.mint)?;
            let address = parse_pubkey(&args.address)?;
            let entry_address = sdk::blacklist_pda(&mint, &address);
            let status = match ctx.fetch_optional::<BlacklistEntry>(&entry_address) {
                Ok(entry) => {
                    let active = entry.filter(|entry| entry.is_active());
                    BlacklistStatusOutput {
                        address: address.to_string(),
                        blacklisted: active.is_some(),
                        reason: active.map(|entry| entry.reason),
                        degraded: false,
                    }
                }
                Err(err) => match &args.fallback_snapshot {
                    Some(path) => {
                        warn!(error = %err, "RPC read failed, using blacklist snapshot");
                        check_snapshot(&load_snapshot(path)?, &address)
                    }
                    None => return Err(err),
                },
            };
            if ctx.output == OutputFormat::Json {
                print_json(&status)
            } else {
                if status.blacklisted {
                    println!("Blacklisted: {}", status.address);
                    if let Some(reason) = &status.reason {
                        println!("Reason: {}", reason);
                    }
                } else {
                    println!("Not blacklisted: {}", status.address);
                }
                if status.degraded {
                    println!("(degraded: answered from snapshot)");
                }
                Ok(())
            }
        }
        BlacklistCmd::List(args) => {
            let mint = resolve_mint(&args.mint)?;
            let mut entries: Vec<BlacklistEntry> = ctx
                .list_by_first_field::<BlacklistEntry>(&stablecoin_core::ID, &mint)?
                .into_iter()
                .map(|(_, entry)| entry)
                .filter(|entry| args.all || entry.is_active())
                .collect();
            entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
            let rows = entries.iter().map(BlacklistRow::from).collect();
            let page = paginate(rows, args.page, args.page_size);
            if ctx.output == OutputFormat::Json {
                print_json(&page)
            } else {
                if page.items.is_empty() {
                    println!("No blacklisted addresses");
                }
                for row in &page.items {
                    println!(
                        "{} {} ({}){}",
                        row.address,
                        row.added_at,
                        row.reason,
                        if row.active { "" } else { " removed" }
                    );
                }
                println!("Page {}/{} ({} total)", page.page, page.total_pages, page.total);
                Ok(())
            }
        }
    }
}

fn handle_seize(ctx: &AppContext, args: &SeizeArgs) -> Result<()> {
    let mint = resolve_mint(&args.mint)?;
    let (config, coin) = load_stablecoin(ctx, &mint)?;
    if !config.extensions().permanent_delegate {
        bail!("Permanent delegate not enabled for this stablecoin");
    }
    let compliance = coin
        .compliance()
        .ok_or_else(|| anyhow!("Compliance is not enabled for this stablecoin"))?;
    let amount = parse_amount(&args.amount, config.decimals)?;
    let source_owner = parse_pubkey(&args.address)?;
    let destination_owner = parse_pubkey(&args.to)?;
    let seizer = ctx.payer_key();

    let signature = ctx.send(
        vec![
            create_associated_token_account_idempotent(&seizer, &destination_owner, &mint),
            compliance.seize_ix(
                seizer,
                associated_token_address(&source_owner, &mint),
                source_owner,
                associated_token_address(&destination_owner, &mint),
                destination_owner,
                amount,
                args.reason.clone(),
                config.seizure_count,
            ),
        ],
        &[],
    )?;
    report_signature(
        ctx,
        &format!(
            "Seized {} tokens from {}",
            format_amount(amount, config.decimals),
            source_owner
        ),
        signature,
    )
}

fn handle_minters(ctx: &AppContext, cmd: &MintersCmd) -> Result<()> {
    let authority = ctx.payer_key();
    match cmd {
        MintersCmd::List(args) => {
            let mint = resolve_mint(&args.mint)?;
            let config = fetch_config(ctx, &mint)?;
            let now = unix_now();
            let mut minters: Vec<MinterConfig> = ctx
                .list_by_first_field::<MinterConfig>(&stablecoin_core::ID, &mint)?
                .into_iter()
                .map(|(_, minter)| minter)
                .filter(|minter| args.all || minter.is_active)
                .collect();
            minters.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let rows = minters
                .iter()
                .map(|minter| MinterRow::new(minter, config.decimals, now))
                .collect();
            let page = paginate(rows, args.page, args.page_size);
            if ctx.output == OutputFormat::Json {
                print_json(&page)
            } else {
                if page.items.is_empty() {
                    println!("No minters found");
                }
                for row in &page.items {
                    println!(
                        "{} quota: {} remaining: {} minted: {}",
                        row.address,
                        row.quota.as_deref().unwrap_or("unlimited"),
                        row.remaining.as_deref().unwrap_or("unlimited"),
                        row.total_minted
                    );
                }
                println!("Page {}/{} ({} total)", page.page, page.total_pages, page.total);
                Ok(())
            }
        }
        MintersCmd::Add(args) | MintersCmd::Update(args) => {
            let mint = resolve_mint(&args.mint)?;
            let config = fetch_config(ctx, &mint)?;
            let minter = parse_pubkey(&args.address)?;
            let quota = parse_amount(&args.quota, config.decimals)?;
            let core = CoreHandle::new(mint);
            let (ix, headline) = match cmd {
                MintersCmd::Add(_) => (
                    core.add_minter_ix(authority, minter, quota, args.period_seconds),
                    "Added minter",
                ),
                _ => (
                    core.update_minter_quota_ix(authority, minter, quota, args.period_seconds),
                    "Updated minter",
                ),
            };
            let signature = ctx.send(vec![ix], &[])?;
            report_signature(ctx, &format!("{}: {}", headline, minter), signature)
        }
        MintersCmd::Remove(args) => {
            let mint = resolve_mint(&args.mint)?;
            let minter = parse_pubkey(&args.address)?;
            let core = CoreHandle::new(mint);
            let signature = ctx.send(vec![core.remove_minter_ix(authority, minter)], &[])?;
            report_signature(ctx, &format!("Removed minter: {}", minter), signature)
        }
    }
}

fn optional_key(value: &Option<String>) -> Result<Option<Pubkey>> {
    value.as_deref().map(parse_pubkey).transpose()
}

fn role_update_from_args(args: &RolesUpdateArgs) -> Result<RoleUpdate> {
    let update = RoleUpdate {
        pauser: optional_key(&args.pauser)?,
        minter_authority: optional_key(&args.minter_authority)?,
        burner: optional_key(&args.burner)?,
        blacklister: optional_key(&args.blacklister)?,
        seizer: optional_key(&args.seizer)?,
        hook_authority: optional_key(&args.hook_authority)?,
    };
    let empty = update.pauser.is_none()
        && update.minter_authority.is_none()
        && update.burner.is_none()
        && update.blacklister.is_none()
        && update.seizer.is_none()
        && update.hook_authority.is_none();
    if empty {
        bail!("Specify at least one role to update");
    }
    Ok(update)
}

fn handle_roles_update(ctx: &AppContext, args: &RolesUpdateArgs) -> Result<()> {
    let mint = resolve_mint(&args.mint)?;
    let update = role_update_from_args(args)?;
    let core = CoreHandle::new(mint);
    let signature = ctx.send(vec![core.update_roles_ix(ctx.payer_key(), update)], &[])?;
    report_signature(ctx, "Roles updated", signature)
}

fn handle_authority(ctx: &AppContext, cmd: &AuthorityCmd) -> Result<()> {
    let signer = ctx.payer_key();
    match cmd {
        AuthorityCmd::Propose(args) => {
            let core = CoreHandle::new(resolve_mint(&args.mint)?);
            let proposed = parse_pubkey(&args.address)?;
            let signature = ctx.send(vec![core.propose_authority_ix(signer, proposed)], &[])?;
            report_signature(ctx, &format!("Proposed master authority {}", proposed), signature)
        }
        AuthorityCmd::Accept(args) => {
            let core = CoreHandle::new(resolve_mint(&args.mint)?);
            let signature = ctx.send(vec![core.accept_authority_ix(signer)], &[])?;
            report_signature(ctx, &format!("Master authority is now {}", signer), signature)
        }
        AuthorityCmd::Cancel(args) => {
            let core = CoreHandle::new(resolve_mint(&args.mint)?);
            let signature = ctx.send(vec![core.cancel_authority_ix(signer)], &[])?;
            report_signature(ctx, "Authority transfer cancelled", signature)
        }
    }
}

fn handle_hook(ctx: &AppContext, cmd: &HookCmd) -> Result<()> {
    let args = match cmd {
        HookCmd::Enable(args) | HookCmd::Disable(args) | HookCmd::Status(args) => args,
    };
    let mint = resolve_mint(&args.mint)?;
    let (_, coin) = load_stablecoin(ctx, &mint)?;
    let hook = coin
        .hook()
        .ok_or_else(|| anyhow!("Transfer hook not enabled for this stablecoin"))?;

    match cmd {
        HookCmd::Enable(_) | HookCmd::Disable(_) => {
            let enabled = matches!(cmd, HookCmd::Enable(_));
            let signature = ctx.send(vec![hook.set_enabled_ix(ctx.payer_key(), enabled)], &[])?;
            let headline = if enabled { "Transfer hook enabled" } else { "Transfer hook disabled" };
            report_signature(ctx, headline, signature)
        }
        HookCmd::Status(_) => {
            let state: HookConfig = ctx.fetch(&hook.hook_config)?;
            let output = HookStatusOutput {
                hook_config: hook.hook_config.to_string(),
                authority: state.authority.to_string(),
                enabled: state.enabled,
                transfer_count: state.transfer_count,
                blocked_count: state.blocked_count,
            };
            if ctx.output == OutputFormat::Json {
                print_json(&output)
            } else {
                println!("Hook config: {}", output.hook_config);
                println!("Authority: {}", output.authority);
                println!("Enabled: {}", output.enabled);
                println!("Transfers: {}", output.transfer_count);
                println!("Blocked: {}", output.blocked_count);
                Ok(())
            }
        }
    }
}

fn handle_status(ctx: &AppContext, args: &MintOnlyArgs) -> Result<()> {
    let mint = resolve_mint(&args.mint)?;
    let config = fetch_config(ctx, &mint)?;
    let supply = ctx.client.get_token_supply(&mint)?;
    let extensions = config.extensions();
    let compliance = config.compliance();
    let minters = ctx
        .list_by_first_field::<MinterConfig>(&stablecoin_core::ID, &mint)?
        .iter()
        .filter(|(_, minter)| minter.is_active)
        .count();
    let oracle = account_exists(ctx, &oracle_pda(&mint))?.then(|| oracle_pda(&mint).to_string());

    let output = StatusOutput {
        mint: mint.to_string(),
        name: config.name.clone(),
        symbol: config.symbol.clone(),
        decimals: config.decimals,
        preset: config.profile.preset_name().to_string(),
        is_paused: config.paused,
        supply: supply.amount,
        total_minted: format_amount(config.total_minted, config.decimals),
        total_burned: format_amount(config.total_burned, config.decimals),
        features: FeatureOutput {
            permanent_delegate: extensions.permanent_delegate,
            transfer_hook: extensions.transfer_hook,
            default_frozen: extensions.default_frozen,
        },
        roles: RolesOutput {
            master_authority: config.master_authority.to_string(),
            pending_authority: config
                .pending_authority
                .proposed
                .map(|key| key.to_string()),
            pauser: config.pauser.to_string(),
            minter_authority: config.minter_authority.to_string(),
            burner: config.burner.to_string(),
            blacklister: compliance.map(|roles| roles.blacklister.to_string()),
            seizer: compliance.map(|roles| roles.seizer.to_string()),
            hook_authority: compliance.map(|roles| roles.hook_authority.to_string()),
        },
        minters,
        blacklisted: config.blacklist_count,
        seizures: config.seizure_count,
        oracle,
    };

    if ctx.output == OutputFormat::Json {
        return print_json(&output);
    }
    println!("Stablecoin status");
    println!("Mint: {}", output.mint);
    println!("Token: {} ({})", output.name, output.symbol);
    println!("Preset: {}", output.preset);
    println!(
        "Status: {}",
        if output.is_paused { "Paused" } else { "Active" }
    );
    println!("Supply: {}", supply.ui_amount_string);
    println!("Total minted: {}", output.total_minted);
    println!("Total burned: {}", output.total_burned);
    println!("Features:");
    println!("  Permanent delegate: {}", output.features.permanent_delegate);
    println!("  Transfer hook: {}", output.features.transfer_hook);
    println!("  Default frozen: {}", output.features.default_frozen);
    println!("Roles:");
    println!("  Master: {}", output.roles.master_authority);
    if let Some(pending) = &output.roles.pending_authority {
        println!("  Pending master: {}", pending);
    }
    println!("  Pauser: {}", output.roles.pauser);
    println!("  Minter authority: {}", output.roles.minter_authority);
    println!("  Burner: {}", output.roles.burner);
    if let Some(blacklister) = &output.roles.blacklister {
        println!("  Blacklister: {}", blacklister);
    }
    if let Some(seizer) = &output.roles.seizer {
        println!("  Seizer: {}", seizer);
    }
    if let Some(hook_authority) = &output.roles.hook_authority {
        println!("  Hook authority: {}", hook_authority);
    }
    println!("Active minters: {}", output.minters);
    println!("Blacklisted: {}", output.blacklisted);
    println!("Seizures: {}", output.seizures);
    if let Some(oracle) = &output.oracle {
        println!("Oracle: {}", oracle);
    }
    Ok(())
}

fn handle_supply(ctx: &AppContext, args: &MintOnlyArgs) -> Result<()> {
    let mint = resolve_mint(&args.mint)?;
    let supply = ctx.client.get_token_supply(&mint)?;
    if ctx.output == OutputFormat::Json {
        print_json(&SupplyOutput {
            mint: mint.to_string(),
            supply: supply.amount,
            decimals: supply.decimals,
        })
    } else {
        println!("Supply: {}", supply.ui_amount_string);
        Ok(())
    }
}

fn handle_holders(ctx: &AppContext, args: &HoldersArgs) -> Result<()> {
    let mint = resolve_mint(&args.mint)?;
    let config = fetch_config(ctx, &mint)?;
    let min_balance = args
        .min_balance
        .as_deref()
        .map(|value| parse_amount(value, config.decimals))
        .transpose()?;

    let mut holders: Vec<HolderInfo> = ctx
        .token_holders(&mint)?
        .into_iter()
        .filter(|(_, account)| min_balance.map_or(true, |min| account.amount >= min))
        .map(|(address, account)| HolderInfo {
            owner: account.owner.to_string(),
            token_account: address.to_string(),
            amount: account.amount,
            frozen: account.frozen,
        })
        .collect();
    holders.sort_by(|a, b| b.amount.cmp(&a.amount));

    if ctx.output == OutputFormat::Json {
        print_json(&HoldersOutput { holders })
    } else {
        if holders.is_empty() {
            println!("No holders found");
        }
        for holder in holders {
            println!(
                "{} {}{}",
                holder.owner,
                format_amount(holder.amount, config.decimals),
                if holder.frozen { " (frozen)" } else { "" }
            );
        }
        Ok(())
    }
}

fn handle_audit_log(ctx: &AppContext, args: &AuditLogArgs) -> Result<()> {
    let mint = resolve_mint(&args.mint)?;
    let entries = fetch_audit_entries(
        ctx,
        &mint,
        &[config_pda(&mint), oracle_pda(&mint)],
        args.limit,
    )?;
    let entries = filter_action(entries, args.action.as_deref());
    let page = paginate(entries, args.page, args.page_size);

    let format = args.format.unwrap_or(match ctx.output {
        OutputFormat::Json => AuditFormat::Json,
        OutputFormat::Text => AuditFormat::Text,
    });
    match format {
        AuditFormat::Json => print_json(&page),
        AuditFormat::Csv => {
            print!("{}", to_csv(&page.items));
            Ok(())
        }
        AuditFormat::Text => {
            if page.items.is_empty() {
                println!("No audit entries");
            }
            for entry in &page.items {
                let amount = entry
                    .amount
                    .map(|value| format!(" {}", value))
                    .unwrap_or_default();
                println!(
                    "{} {} {} -> {}{} {}",
                    entry.created_at, entry.action, entry.actor, entry.target, amount, entry.tx_signature
                );
            }
            println!("Page {}/{} ({} total)", page.page, page.total_pages, page.total);
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct InitOutput {
    mint: String,
    config: String,
    preset: String,
    signature: String,
    explorer: Option<String>,
}

#[derive(Serialize)]
struct SupplyChangeOutput {
    signature: String,
    explorer: Option<String>,
    new_supply: String,
}

#[derive(Serialize)]
struct BlacklistStatusOutput {
    address: String,
    blacklisted: bool,
    reason: Option<String>,
    degraded: bool,
}

#[derive(Serialize)]
struct BlacklistRow {
    address: String,
    reason: String,
    added_by: String,
    added_at: i64,
    active: bool,
}

impl From<&BlacklistEntry> for BlacklistRow {
    fn from(entry: &BlacklistEntry) -> Self {
        Self {
            address: entry.address.to_string(),
            reason: entry.reason.clone(),
            added_by: entry.added_by.to_string(),
            added_at: entry.added_at,
            active: entry.is_active(),
        }
    }
}

#[derive(Serialize)]
struct MinterRow {
    address: String,
    active: bool,
    quota: Option<String>,
    period_seconds: i64,
    remaining: Option<String>,
    total_minted: String,
    mint_count: u64,
}

impl MinterRow {
    fn new(minter: &MinterConfig, decimals: u8, now: i64) -> Self {
        Self {
            address: minter.minter.to_string(),
            active: minter.is_active,
            quota: (minter.quota_per_period > 0)
                .then(|| format_amount(minter.quota_per_period, decimals)),
            period_seconds: minter.period_seconds,
            remaining: minter
                .remaining_quota(now)
                .map(|remaining| format_amount(remaining, decimals)),
            total_minted: format_amount(minter.total_minted, decimals),
            mint_count: minter.mint_count,
        }
    }
}

#[derive(Serialize)]
struct StatusOutput {
    mint: String,
    name: String,
    symbol: String,
    decimals: u8,
    preset: String,
    is_paused: bool,
    supply: String,
    total_minted: String,
    total_burned: String,
    features: FeatureOutput,
    roles: RolesOutput,
    minters: usize,
    blacklisted: u64,
    seizures: u64,
    oracle: Option<String>,
}

#[derive(Serialize)]
struct FeatureOutput {
    permanent_delegate: bool,
    transfer_hook: bool,
    default_frozen: bool,
}

#[derive(Serialize)]
struct RolesOutput {
    master_authority: String,
    pending_authority: Option<String>,
    pauser: String,
    minter_authority: String,
    burner: String,
    blacklister: Option<String>,
    seizer: Option<String>,
    hook_authority: Option<String>,
}

#[derive(Serialize)]
struct HookStatusOutput {
    hook_config: String,
    authority: String,
    enabled: bool,
    transfer_count: u64,
    blocked_count: u64,
}

#[derive(Serialize)]
struct SupplyOutput {
    mint: String,
    supply: String,
    decimals: u8,
}

#[derive(Serialize)]
struct HolderInfo {
    owner: String,
    token_account: String,
    amount: u64,
    frozen: bool,
}

#[derive(Serialize)]
struct HoldersOutput {
    holders: Vec<HolderInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtensionsConfig;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_commands() {
        let cli = Cli::try_parse_from([
            "sss-token",
            "--output",
            "json",
            "blacklist",
            "list",
            "--mint",
            "So11111111111111111111111111111111111111112",
            "--page",
            "2",
        ])
        .unwrap();
        assert!(cli.output == OutputFormat::Json);
        match cli.command {
            Commands::Blacklist(BlacklistCmd::List(args)) => {
                assert_eq!(args.page, 2);
                assert_eq!(args.page_size, DEFAULT_PAGE_SIZE);
            }
            _ => panic!("unexpected command"),
        }

        let cli = Cli::try_parse_from([
            "sss-token",
            "quote",
            "simulate-mint",
            "100",
            "--price",
            "1.083",
            "--feed-type",
            "inverse",
        ])
        .unwrap();
        match cli.command {
            Commands::Quote(cmd) => assert!(oracle::is_offline(&cmd)),
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn role_update_requires_a_role() {
        let mut args = RolesUpdateArgs {
            mint: None,
            pauser: None,
            minter_authority: None,
            burner: None,
            blacklister: None,
            seizer: None,
            hook_authority: None,
        };
        assert!(role_update_from_args(&args).is_err());

        let pauser = Pubkey::new_unique();
        args.pauser = Some(pauser.to_string());
        let update = role_update_from_args(&args).unwrap();
        assert_eq!(update.pauser, Some(pauser));
        assert!(update.seizer.is_none());

        args.seizer = Some("not-a-key".to_string());
        assert!(role_update_from_args(&args).is_err());
    }

    #[test]
    fn snapshot_answers_are_marked_degraded() {
        let listed = Pubkey::new_unique();
        let entries: Vec<SnapshotEntry> = serde_json::from_str(&format!(
            r#"[{{"address": "{}", "reason": "sanctions"}}, {{"address": "garbage"}}]"#,
            listed
        ))
        .unwrap();

        let hit = check_snapshot(&entries, &listed);
        assert!(hit.blacklisted);
        assert!(hit.degraded);
        assert_eq!(hit.reason.as_deref(), Some("sanctions"));

        let miss = check_snapshot(&entries, &Pubkey::new_unique());
        assert!(!miss.blacklisted);
        assert!(miss.degraded);
    }

    #[test]
    fn minter_row_formats_quota() {
        let minter = MinterConfig {
            mint: Pubkey::new_unique(),
            minter: Pubkey::new_unique(),
            is_active: true,
            quota_per_period: 5_000_000,
            period_seconds: 0,
            minted_this_period: 2_000_000,
            period_start: 0,
            total_minted: 2_000_000,
            mint_count: 1,
            created_at: 0,
            bump: 255,
        };
        let row = MinterRow::new(&minter, 6, 10);
        assert_eq!(row.quota.as_deref(), Some("5.000000"));
        assert_eq!(row.remaining.as_deref(), Some("3.000000"));

        let unlimited = MinterConfig {
            quota_per_period: 0,
            ..minter
        };
        assert!(MinterRow::new(&unlimited, 6, 10).quota.is_none());
    }

    #[test]
    fn extension_presets_match_names() {
        let authority = Pubkey::new_unique();
        let from_flags = preset_from_config(
            &ExtensionsConfig::from_preset(true),
            &RolesConfig::default(),
            authority,
        )
        .unwrap();
        let from_name = preset_from_name("sss-2", authority).unwrap();
        assert!(matches!(from_flags, PresetParams::Sss2 { .. }));
        assert!(matches!(from_name, PresetParams::Sss2 { .. }));
    }
}
