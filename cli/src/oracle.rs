//! `feeds`, `oracle` and `quote` commands.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use stablecoin_core::state::{RoleUpdate, StablecoinConfig};
use stablecoin_oracle::instructions::{OracleInitParams, QuoteParams, RegisterFeedParams};
use stablecoin_oracle::math::{simulate_mint_quote, simulate_redeem_quote, QuoteSimulation};
use stablecoin_oracle::state::{
    FeedEntry, FeedRegistry, FeedType, OracleConfig, OracleParamsUpdate, PendingQuote,
    QuoteDirection,
};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use crate::client::{
    associated_token_address, create_associated_token_account_idempotent, format_amount,
    format_usd, parse_amount, parse_pubkey, print_json, report_signature, resolve_mint,
    AppContext, OutputFormat,
};
use crate::sdk::{config_pda, oracle_pda, quote_pda, registry_pda, CoreHandle, OracleHandle};

/// Oracle prices and CPI multipliers carry six decimals.
const PRICE_DECIMALS: u8 = 6;
const USD_DECIMALS: u8 = 2;
/// Token amounts in the pricing formulas are scaled to six decimals.
const TOKEN_DECIMALS: u8 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FeedKind {
    Direct,
    Inverse,
    CpiIndexed,
    Custom,
}

#[derive(Parser, Debug)]
pub struct FeedTypeArgs {
    #[arg(long, value_enum, default_value = "direct")]
    feed_type: FeedKind,

    /// Custom feeds only.
    #[arg(long)]
    numerator: Option<u64>,

    #[arg(long)]
    denominator: Option<u64>,

    /// 0 = direct, 1 = inverse.
    #[arg(long, default_value_t = 0)]
    base_type: u8,
}

impl FeedTypeArgs {
    fn to_feed_type(&self) -> Result<FeedType> {
        Ok(match self.feed_type {
            FeedKind::Direct => FeedType::Direct,
            FeedKind::Inverse => FeedType::Inverse,
            FeedKind::CpiIndexed => FeedType::CpiIndexed,
            FeedKind::Custom => FeedType::Custom {
                numerator: self
                    .numerator
                    .ok_or_else(|| anyhow!("--numerator is required for custom feeds"))?,
                denominator: self
                    .denominator
                    .ok_or_else(|| anyhow!("--denominator is required for custom feeds"))?,
                base_type: self.base_type,
            },
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum FeedsCmd {
    /// Create the global feed registry, owned by the signer.
    InitRegistry,
    Register(RegisterFeedArgs),
    Deactivate {
        #[arg(long)]
        symbol: String,
    },
    List {
        /// Include deactivated slots.
        #[arg(long)]
        all: bool,
    },
}

#[derive(Parser, Debug)]
pub struct RegisterFeedArgs {
    #[arg(long)]
    symbol: String,

    #[arg(long)]
    feed_account: String,

    #[command(flatten)]
    feed_type: FeedTypeArgs,

    #[arg(long, default_value = "USD")]
    base_currency: String,

    #[arg(long, default_value = "USD")]
    quote_currency: String,

    #[arg(long, default_value_t = 6)]
    decimals: u8,
}

#[derive(Subcommand, Debug)]
pub enum OracleCmd {
    Init(OracleInitArgs),
    Pause {
        #[arg(long)]
        mint: Option<String>,

        #[arg(long, default_value = "")]
        reason: String,
    },
    Unpause {
        #[arg(long)]
        mint: Option<String>,
    },
    UpdateCpi(UpdateCpiArgs),
    UpdateParams(UpdateParamsArgs),
    ProposeAuthority {
        new_authority: String,

        #[arg(long)]
        mint: Option<String>,
    },
    AcceptAuthority {
        #[arg(long)]
        mint: Option<String>,
    },
    Status {
        #[arg(long)]
        mint: Option<String>,
    },
}

#[derive(Parser, Debug)]
pub struct OracleInitArgs {
    #[arg(long)]
    mint: Option<String>,

    #[arg(long)]
    feed_symbol: String,

    #[arg(long, default_value = "")]
    description: String,

    #[arg(long, default_value_t = 300)]
    max_staleness_secs: i64,

    #[arg(long, default_value_t = 0)]
    mint_fee_bps: u16,

    #[arg(long, default_value_t = 0)]
    redeem_fee_bps: u16,

    /// 0 disables the confidence check.
    #[arg(long, default_value_t = 0)]
    max_confidence_bps: u16,

    #[arg(long, default_value_t = 60)]
    quote_validity_secs: i64,

    #[arg(long, default_value = "1")]
    cpi_multiplier: String,

    #[arg(long, default_value_t = 0)]
    cpi_min_update_interval: i64,

    #[arg(long, default_value = "")]
    cpi_data_source: String,

    /// Quota for the oracle as a minter, in tokens. 0 means unlimited.
    #[arg(long, default_value = "0")]
    minter_quota: String,

    #[arg(long, default_value_t = 0)]
    minter_period_seconds: i64,

    /// Also make the oracle the core burner so it can execute redemptions.
    #[arg(long)]
    as_burner: bool,
}

#[derive(Parser, Debug)]
pub struct UpdateCpiArgs {
    #[arg(long)]
    mint: Option<String>,

    /// Decimal multiplier, e.g. 1.0425.
    #[arg(long)]
    multiplier: String,

    /// YYYY-MM
    #[arg(long)]
    reference_month: String,

    #[arg(long, default_value = "")]
    data_source: String,
}

#[derive(Parser, Debug)]
pub struct UpdateParamsArgs {
    #[arg(long)]
    mint: Option<String>,

    #[arg(long)]
    mint_fee_bps: Option<u16>,

    #[arg(long)]
    redeem_fee_bps: Option<u16>,

    #[arg(long)]
    max_staleness_secs: Option<i64>,

    #[arg(long)]
    max_confidence_bps: Option<u16>,

    #[arg(long)]
    quote_validity_secs: Option<i64>,

    #[arg(long)]
    cpi_min_update_interval: Option<i64>,
}

#[derive(Subcommand, Debug)]
pub enum QuoteCmd {
    /// Quote tokens for a USD amount.
    Mint(RequestQuoteArgs),
    /// Quote USD for a token amount.
    Redeem(RequestQuoteArgs),
    /// Offline preview of a mint quote.
    SimulateMint(SimulateArgs),
    /// Offline preview of a redeem quote.
    SimulateRedeem(SimulateArgs),
    Execute(QuoteRefArgs),
    Close(QuoteRefArgs),
}

#[derive(Parser, Debug)]
pub struct RequestQuoteArgs {
    /// USD for mint quotes, tokens for redeem quotes.
    amount: String,

    #[arg(long)]
    mint: Option<String>,

    #[arg(long)]
    min_output: Option<String>,

    /// Defaults to the current time in milliseconds.
    #[arg(long)]
    nonce: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// USD for mint previews, tokens for redeem previews.
    amount: String,

    /// Feed price, e.g. 1.0830.
    #[arg(long)]
    price: String,

    #[command(flatten)]
    feed_type: FeedTypeArgs,

    #[arg(long, default_value = "1")]
    cpi_multiplier: String,

    #[arg(long, default_value_t = 0)]
    fee_bps: u16,
}

#[derive(Parser, Debug)]
pub struct QuoteRefArgs {
    #[arg(long)]
    nonce: u64,

    #[arg(long)]
    mint: Option<String>,

    /// Owner that receives minted tokens. Defaults to the signer.
    #[arg(long)]
    recipient: Option<String>,
}

#[derive(Serialize)]
struct FeedOutput {
    slot: usize,
    symbol: String,
    feed_account: String,
    feed_type: String,
    base_currency: String,
    quote_currency: String,
    decimals: u8,
    active: bool,
}

impl FeedOutput {
    fn new(slot: usize, entry: &FeedEntry) -> Self {
        Self {
            slot,
            symbol: entry.symbol.clone(),
            feed_account: entry.feed_account.to_string(),
            feed_type: entry.feed_type.label().to_string(),
            base_currency: entry.base_currency.clone(),
            quote_currency: entry.quote_currency.clone(),
            decimals: entry.decimals,
            active: entry.active,
        }
    }
}

#[derive(Serialize)]
struct FeedsOutput {
    authority: String,
    feeds: Vec<FeedOutput>,
}

#[derive(Serialize)]
struct OracleStatusOutput {
    oracle: String,
    mint: String,
    authority: String,
    pending_authority: Option<String>,
    feed_symbol: String,
    description: String,
    paused: bool,
    pause_reason: Option<String>,
    mint_fee_bps: u16,
    redeem_fee_bps: u16,
    max_staleness_secs: i64,
    max_confidence_bps: u16,
    quote_validity_secs: i64,
    cpi_multiplier: String,
    cpi_last_updated: i64,
    cpi_data_source: String,
    total_minted_usd: String,
    total_redeemed_usd: String,
    mint_fees_collected: String,
    redeem_fees_collected_usd: String,
}

#[derive(Serialize)]
struct QuoteOutput {
    quote: String,
    direction: String,
    nonce: u64,
    input_amount: u64,
    output_amount: u64,
    fee_amount: u64,
    price: String,
    valid_until: i64,
    used: bool,
    signature: Option<String>,
}

impl QuoteOutput {
    fn new(address: Pubkey, quote: &PendingQuote, signature: Option<String>) -> Self {
        Self {
            quote: address.to_string(),
            direction: quote.direction.as_str().to_string(),
            nonce: quote.nonce,
            input_amount: quote.input_amount,
            output_amount: quote.output_amount,
            fee_amount: quote.fee_amount,
            price: format_amount(quote.price_snapshot, PRICE_DECIMALS),
            valid_until: quote.valid_until,
            used: quote.used,
            signature,
        }
    }
}

#[derive(Serialize)]
struct SimulationOutput {
    direction: String,
    gross: u64,
    fee: u64,
    net: u64,
    price: f64,
}

fn fetch_registry(ctx: &AppContext) -> Result<FeedRegistry> {
    ctx.fetch::<FeedRegistry>(&registry_pda())
        .context("Feed registry not initialized")
}

fn fetch_oracle(ctx: &AppContext, mint: &Pubkey) -> Result<OracleConfig> {
    ctx.fetch::<OracleConfig>(&oracle_pda(mint))
        .with_context(|| format!("Oracle not initialized for mint {}", mint))
}

fn default_nonce() -> Result<u64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock before epoch")?;
    u64::try_from(elapsed.as_millis()).context("Nonce overflow")
}

pub fn handle_feeds(ctx: &AppContext, cmd: &FeedsCmd) -> Result<()> {
    let authority = ctx.payer_key();
    match cmd {
        FeedsCmd::InitRegistry => {
            let signature = ctx.send(vec![OracleHandle::initialize_registry_ix(authority)], &[])?;
            report_signature(
                ctx,
                &format!("Feed registry initialized: {}", registry_pda()),
                signature,
            )
        }
        FeedsCmd::Register(args) => {
            let params = RegisterFeedParams {
                symbol: args.symbol.clone(),
                feed_account: parse_pubkey(&args.feed_account)?,
                feed_type: args.feed_type.to_feed_type()?,
                base_currency: args.base_currency.clone(),
                quote_currency: args.quote_currency.clone(),
                decimals: args.decimals,
            };
            let signature = ctx.send(vec![OracleHandle::register_feed_ix(authority, params)], &[])?;
            report_signature(ctx, &format!("Registered feed {}", args.symbol), signature)
        }
        FeedsCmd::Deactivate { symbol } => {
            let signature = ctx.send(
                vec![OracleHandle::deactivate_feed_ix(authority, symbol.clone())],
                &[],
            )?;
            report_signature(ctx, &format!("Deactivated feed {}", symbol), signature)
        }
        FeedsCmd::List { all } => {
            let registry = fetch_registry(ctx)?;
            let feeds: Vec<FeedOutput> = registry
                .feeds
                .iter()
                .enumerate()
                .filter(|(_, entry)| *all || entry.active)
                .map(|(slot, entry)| FeedOutput::new(slot, entry))
                .collect();
            if ctx.output == OutputFormat::Json {
                print_json(&FeedsOutput {
                    authority: registry.authority.to_string(),
                    feeds,
                })
            } else {
                if feeds.is_empty() {
                    println!("No feeds registered");
                }
                for feed in feeds {
                    println!(
                        "[{}] {} {} {}/{} ({}){}",
                        feed.slot,
                        feed.symbol,
                        feed.feed_type,
                        feed.base_currency,
                        feed.quote_currency,
                        feed.feed_account,
                        if feed.active { "" } else { " inactive" }
                    );
                }
                Ok(())
            }
        }
    }
}

pub fn handle_oracle(ctx: &AppContext, cmd: &OracleCmd) -> Result<()> {
    let authority = ctx.payer_key();
    match cmd {
        OracleCmd::Init(args) => handle_oracle_init(ctx, args),
        OracleCmd::Pause { mint, reason } => {
            let oracle = OracleHandle::new(resolve_mint(mint)?);
            let signature = ctx.send(vec![oracle.pause_ix(authority, reason.clone())], &[])?;
            report_signature(ctx, "Oracle paused", signature)
        }
        OracleCmd::Unpause { mint } => {
            let oracle = OracleHandle::new(resolve_mint(mint)?);
            let signature = ctx.send(vec![oracle.unpause_ix(authority)], &[])?;
            report_signature(ctx, "Oracle unpaused", signature)
        }
        OracleCmd::UpdateCpi(args) => {
            let oracle = OracleHandle::new(resolve_mint(&args.mint)?);
            let multiplier = parse_amount(&args.multiplier, PRICE_DECIMALS)?;
            let signature = ctx.send(
                vec![oracle.update_cpi_ix(
                    authority,
                    multiplier,
                    args.reference_month.clone(),
                    args.data_source.clone(),
                )],
                &[],
            )?;
            report_signature(
                ctx,
                &format!("CPI multiplier set to {}", args.multiplier),
                signature,
            )
        }
        OracleCmd::UpdateParams(args) => {
            let update = OracleParamsUpdate {
                mint_fee_bps: args.mint_fee_bps,
                redeem_fee_bps: args.redeem_fee_bps,
                max_staleness_secs: args.max_staleness_secs,
                max_confidence_bps: args.max_confidence_bps,
                quote_validity_secs: args.quote_validity_secs,
                cpi_min_update_interval: args.cpi_min_update_interval,
            };
            if update == OracleParamsUpdate::default() {
                bail!("Nothing to update");
            }
            let oracle = OracleHandle::new(resolve_mint(&args.mint)?);
            let signature = ctx.send(vec![oracle.update_params_ix(authority, update)], &[])?;
            report_signature(ctx, "Oracle parameters updated", signature)
        }
        OracleCmd::ProposeAuthority {
            new_authority,
            mint,
        } => {
            let oracle = OracleHandle::new(resolve_mint(mint)?);
            let proposed = parse_pubkey(new_authority)?;
            let signature = ctx.send(vec![oracle.propose_authority_ix(authority, proposed)], &[])?;
            report_signature(
                ctx,
                &format!("Proposed oracle authority {}", proposed),
                signature,
            )
        }
        OracleCmd::AcceptAuthority { mint } => {
            let oracle = OracleHandle::new(resolve_mint(mint)?);
            let signature = ctx.send(vec![oracle.accept_authority_ix(authority)], &[])?;
            report_signature(ctx, "Oracle authority accepted", signature)
        }
        OracleCmd::Status { mint } => {
            let mint = resolve_mint(mint)?;
            let config = fetch_oracle(ctx, &mint)?;
            print_oracle_status(ctx, &mint, &config)
        }
    }
}

/// Creates the oracle config, then registers the oracle PDA with the core
/// program when the signer holds the needed roles.
fn handle_oracle_init(ctx: &AppContext, args: &OracleInitArgs) -> Result<()> {
    let mint = resolve_mint(&args.mint)?;
    let authority = ctx.payer_key();
    let core_config: StablecoinConfig = ctx.fetch(&config_pda(&mint))?;
    let oracle = OracleHandle::new(mint);
    let core = CoreHandle::new(mint);

    let params = OracleInitParams {
        feed_symbol: args.feed_symbol.clone(),
        description: args.description.clone(),
        max_staleness_secs: args.max_staleness_secs,
        mint_fee_bps: args.mint_fee_bps,
        redeem_fee_bps: args.redeem_fee_bps,
        max_confidence_bps: args.max_confidence_bps,
        quote_validity_secs: args.quote_validity_secs,
        cpi_multiplier: parse_amount(&args.cpi_multiplier, PRICE_DECIMALS)?,
        cpi_min_update_interval: args.cpi_min_update_interval,
        cpi_data_source: args.cpi_data_source.clone(),
    };
    let mut instructions = vec![oracle.initialize_oracle_ix(authority, params)];

    if core_config.minter_authority == authority {
        let quota = parse_amount(&args.minter_quota, core_config.decimals)?;
        instructions.push(core.add_minter_ix(
            authority,
            oracle.oracle_config,
            quota,
            args.minter_period_seconds,
        ));
    } else {
        info!("signer is not the minter authority; oracle minter must be added separately");
    }
    if args.as_burner {
        if core_config.master_authority != authority {
            bail!("--as-burner requires the master authority");
        }
        instructions.push(core.update_roles_ix(
            authority,
            RoleUpdate {
                burner: Some(oracle.oracle_config),
                ..RoleUpdate::default()
            },
        ));
    }

    let signature = ctx.send(instructions, &[])?;
    report_signature(
        ctx,
        &format!("Oracle initialized: {}", oracle.oracle_config),
        signature,
    )
}

fn print_oracle_status(ctx: &AppContext, mint: &Pubkey, config: &OracleConfig) -> Result<()> {
    let output = OracleStatusOutput {
        oracle: oracle_pda(mint).to_string(),
        mint: mint.to_string(),
        authority: config.authority.to_string(),
        pending_authority: config.pending_authority.proposed.map(|key| key.to_string()),
        feed_symbol: config.feed_symbol.clone(),
        description: config.description.clone(),
        paused: config.paused,
        pause_reason: config.paused.then(|| config.pause_reason.clone()),
        mint_fee_bps: config.mint_fee_bps,
        redeem_fee_bps: config.redeem_fee_bps,
        max_staleness_secs: config.max_staleness_secs,
        max_confidence_bps: config.max_confidence_bps,
        quote_validity_secs: config.quote_validity_secs,
        cpi_multiplier: format_amount(config.cpi_multiplier, PRICE_DECIMALS),
        cpi_last_updated: config.cpi_last_updated,
        cpi_data_source: config.cpi_data_source.clone(),
        total_minted_usd: format_usd(config.total_minted_usd),
        total_redeemed_usd: format_usd(config.total_redeemed_usd),
        mint_fees_collected: format_amount(config.mint_fees_collected, TOKEN_DECIMALS),
        redeem_fees_collected_usd: format_usd(config.redeem_fees_collected_usd),
    };
    if ctx.output == OutputFormat::Json {
        return print_json(&output);
    }
    println!("Oracle: {}", output.oracle);
    println!("Mint: {}", output.mint);
    println!("Authority: {}", output.authority);
    if let Some(pending) = &output.pending_authority {
        println!("Pending authority: {}", pending);
    }
    println!("Feed: {} {}", output.feed_symbol, output.description);
    match &output.pause_reason {
        Some(reason) => println!("Status: Paused ({})", reason),
        None => println!("Status: Active"),
    }
    println!(
        "Fees: mint {} bps, redeem {} bps",
        output.mint_fee_bps, output.redeem_fee_bps
    );
    println!(
        "Limits: staleness {}s, confidence {} bps, quote validity {}s",
        output.max_staleness_secs, output.max_confidence_bps, output.quote_validity_secs
    );
    println!(
        "CPI multiplier: {} (updated {}, source {})",
        output.cpi_multiplier, output.cpi_last_updated, output.cpi_data_source
    );
    println!("Minted: {}", output.total_minted_usd);
    println!("Redeemed: {}", output.total_redeemed_usd);
    println!("Mint fees collected: {} tokens", output.mint_fees_collected);
    println!("Redeem fees collected: {}", output.redeem_fees_collected_usd);
    Ok(())
}

/// Simulation commands never touch the network.
pub fn is_offline(cmd: &QuoteCmd) -> bool {
    matches!(cmd, QuoteCmd::SimulateMint(_) | QuoteCmd::SimulateRedeem(_))
}

pub fn simulate(cmd: &QuoteCmd, output: OutputFormat) -> Result<()> {
    let (direction, args) = match cmd {
        QuoteCmd::SimulateMint(args) => (QuoteDirection::Mint, args),
        QuoteCmd::SimulateRedeem(args) => (QuoteDirection::Redeem, args),
        _ => bail!("Not a simulation command"),
    };
    let simulation = run_simulation(direction, args)?;
    let result = SimulationOutput {
        direction: direction.as_str().to_string(),
        gross: simulation.gross,
        fee: simulation.fee,
        net: simulation.net,
        price: simulation.price_human,
    };
    if output == OutputFormat::Json {
        return print_json(&result);
    }
    match direction {
        QuoteDirection::Mint => {
            println!("Gross: {} tokens", format_amount(result.gross, TOKEN_DECIMALS));
            println!("Fee: {} tokens", format_amount(result.fee, TOKEN_DECIMALS));
            println!("Net: {} tokens", format_amount(result.net, TOKEN_DECIMALS));
        }
        QuoteDirection::Redeem => {
            println!("Gross: {}", format_usd(result.gross));
            println!("Fee: {}", format_usd(result.fee));
            println!("Net: {}", format_usd(result.net));
        }
    }
    println!("Price: {:.6}", result.price);
    Ok(())
}

fn run_simulation(direction: QuoteDirection, args: &SimulateArgs) -> Result<QuoteSimulation> {
    let price = parse_amount(&args.price, PRICE_DECIMALS)?;
    let cpi = parse_amount(&args.cpi_multiplier, PRICE_DECIMALS)?;
    let feed_type = args.feed_type.to_feed_type()?;
    let result = match direction {
        QuoteDirection::Mint => simulate_mint_quote(
            parse_amount(&args.amount, USD_DECIMALS)?,
            price,
            &feed_type,
            cpi,
            args.fee_bps,
        ),
        QuoteDirection::Redeem => simulate_redeem_quote(
            parse_amount(&args.amount, TOKEN_DECIMALS)?,
            price,
            &feed_type,
            cpi,
            args.fee_bps,
        ),
    };
    result.map_err(|err| anyhow!("Simulation failed: {}", err))
}

pub fn handle_quote(ctx: &AppContext, cmd: &QuoteCmd) -> Result<()> {
    match cmd {
        QuoteCmd::Mint(args) => request_quote(ctx, QuoteDirection::Mint, args),
        QuoteCmd::Redeem(args) => request_quote(ctx, QuoteDirection::Redeem, args),
        QuoteCmd::SimulateMint(_) | QuoteCmd::SimulateRedeem(_) => simulate(cmd, ctx.output),
        QuoteCmd::Execute(args) => execute_quote(ctx, args),
        QuoteCmd::Close(args) => {
            let mint = resolve_mint(&args.mint)?;
            let oracle = OracleHandle::new(mint);
            let signature = ctx.send(vec![oracle.close_quote_ix(ctx.payer_key(), args.nonce)], &[])?;
            report_signature(ctx, &format!("Closed quote {}", args.nonce), signature)
        }
    }
}

fn request_quote(ctx: &AppContext, direction: QuoteDirection, args: &RequestQuoteArgs) -> Result<()> {
    let mint = resolve_mint(&args.mint)?;
    let requester = ctx.payer_key();
    let config = fetch_oracle(ctx, &mint)?;
    let registry = fetch_registry(ctx)?;
    let feed = registry
        .find_active(&config.feed_symbol)
        .ok_or_else(|| anyhow!("Feed {} is not active", config.feed_symbol))?;

    let (input_decimals, output_decimals) = match direction {
        QuoteDirection::Mint => (USD_DECIMALS, TOKEN_DECIMALS),
        QuoteDirection::Redeem => (TOKEN_DECIMALS, USD_DECIMALS),
    };
    let params = QuoteParams {
        input_amount: parse_amount(&args.amount, input_decimals)?,
        min_output: args
            .min_output
            .as_deref()
            .map(|value| parse_amount(value, output_decimals))
            .transpose()?
            .unwrap_or(0),
        nonce: args.nonce.map(Ok).unwrap_or_else(default_nonce)?,
    };
    let nonce = params.nonce;

    let oracle = OracleHandle::new(mint);
    let signature = ctx.send(
        vec![oracle.quote_ix(requester, feed.feed_account, direction, params)],
        &[],
    )?;
    let address = quote_pda(&mint, &requester, nonce);
    let quote: PendingQuote = ctx.fetch(&address)?;
    print_quote(ctx, address, &quote, Some(signature))
}

fn print_quote(
    ctx: &AppContext,
    address: Pubkey,
    quote: &PendingQuote,
    signature: Option<String>,
) -> Result<()> {
    let output = QuoteOutput::new(address, quote, signature);
    if ctx.output == OutputFormat::Json {
        return print_json(&output);
    }
    println!("Quote: {} (nonce {})", output.quote, output.nonce);
    match quote.direction {
        QuoteDirection::Mint => {
            println!("Pay: {}", format_usd(output.input_amount));
            println!("Receive: {} tokens", format_amount(output.output_amount, TOKEN_DECIMALS));
            println!("Fee: {} tokens", format_amount(output.fee_amount, TOKEN_DECIMALS));
        }
        QuoteDirection::Redeem => {
            println!("Burn: {} tokens", format_amount(output.input_amount, TOKEN_DECIMALS));
            println!("Receive: {}", format_usd(output.output_amount));
            println!("Fee: {}", format_usd(output.fee_amount));
        }
    }
    println!("Price: {}", output.price);
    println!("Valid until: {}", output.valid_until);
    if let Some(signature) = &output.signature {
        println!("Tx: {}", signature);
        if let Some(url) = ctx.explorer_url(signature) {
            println!("Explorer: {}", url);
        }
    }
    Ok(())
}

fn execute_quote(ctx: &AppContext, args: &QuoteRefArgs) -> Result<()> {
    let mint = resolve_mint(&args.mint)?;
    let requester = ctx.payer_key();
    let oracle = OracleHandle::new(mint);
    let address = quote_pda(&mint, &requester, args.nonce);
    let quote: PendingQuote = ctx
        .fetch(&address)
        .with_context(|| format!("Quote {} not found", args.nonce))?;
    if quote.used {
        bail!("Quote {} was already executed", args.nonce);
    }

    let instructions = match quote.direction {
        QuoteDirection::Mint => {
            let owner = match &args.recipient {
                Some(value) => parse_pubkey(value)?,
                None => requester,
            };
            vec![
                create_associated_token_account_idempotent(&requester, &owner, &mint),
                oracle.mint_with_oracle_ix(
                    requester,
                    args.nonce,
                    associated_token_address(&owner, &mint),
                ),
            ]
        }
        QuoteDirection::Redeem => vec![oracle.redeem_with_oracle_ix(
            requester,
            args.nonce,
            associated_token_address(&requester, &mint),
        )],
    };
    let signature = ctx.send(instructions, &[])?;
    report_signature(
        ctx,
        &format!("Executed {} quote {}", quote.direction.as_str(), args.nonce),
        signature,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulate_args(amount: &str, price: &str, kind: FeedKind, fee_bps: u16) -> SimulateArgs {
        SimulateArgs {
            amount: amount.to_string(),
            price: price.to_string(),
            feed_type: FeedTypeArgs {
                feed_type: kind,
                numerator: None,
                denominator: None,
                base_type: 0,
            },
            cpi_multiplier: "1".to_string(),
            fee_bps,
        }
    }

    #[test]
    fn test_simulates_direct_mint() {
        let simulation = run_simulation(
            QuoteDirection::Mint,
            &simulate_args("108.30", "1.083", FeedKind::Direct, 0),
        )
        .unwrap();
        assert_eq!(simulation.net, 100_000_000);
        assert_eq!(simulation.fee, 0);
    }

    #[test]
    fn test_simulates_redeem_with_fee() {
        let simulation = run_simulation(
            QuoteDirection::Redeem,
            &simulate_args("100", "1.083", FeedKind::Direct, 100),
        )
        .unwrap();
        assert_eq!(simulation.gross, 10_830);
        assert_eq!(simulation.fee, 108);
        assert_eq!(simulation.net, 10_722);
    }

    #[test]
    fn test_custom_feed_requires_ratio() {
        let mut args = simulate_args("1", "1", FeedKind::Custom, 0);
        assert!(args.feed_type.to_feed_type().is_err());
        args.feed_type.numerator = Some(2);
        args.feed_type.denominator = Some(1);
        assert_eq!(
            args.feed_type.to_feed_type().unwrap(),
            FeedType::Custom {
                numerator: 2,
                denominator: 1,
                base_type: 0
            }
        );
    }

    #[test]
    fn test_simulation_rejects_zero_amount() {
        assert!(run_simulation(
            QuoteDirection::Mint,
            &simulate_args("0", "1", FeedKind::Direct, 0)
        )
        .is_err());
    }

    #[test]
    fn test_only_simulations_are_offline() {
        let cmd = QuoteCmd::SimulateMint(simulate_args("1", "1", FeedKind::Direct, 0));
        assert!(is_offline(&cmd));
        let close = QuoteCmd::Close(QuoteRefArgs {
            nonce: 1,
            mint: None,
            recipient: None,
        });
        assert!(!is_offline(&close));
    }
}
