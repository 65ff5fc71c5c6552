#![allow(unexpected_cfgs)]

use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod math;
pub mod state;
pub mod switchboard;

use instructions::*;
use state::OracleParamsUpdate;

declare_id!("AyiCqRLA6Es6Fc8snWJCiuuMfJAcVatWzkYRNN7J2uPm");

#[program]
pub mod stablecoin_oracle {
    use super::*;

    pub fn initialize_registry(ctx: Context<InitializeRegistry>) -> Result<()> {
        instructions::registry::initialize_registry_handler(ctx)
    }

    pub fn register_feed(ctx: Context<UpdateRegistry>, params: RegisterFeedParams) -> Result<()> {
        instructions::registry::register_feed_handler(ctx, params)
    }

    /// Frees the symbol and its slot for a later registration.
    pub fn deactivate_feed(ctx: Context<UpdateRegistry>, symbol: String) -> Result<()> {
        instructions::registry::deactivate_feed_handler(ctx, symbol)
    }

    pub fn initialize_oracle(ctx: Context<InitializeOracle>, params: OracleInitParams) -> Result<()> {
        instructions::oracle_config::initialize_oracle_handler(ctx, params)
    }

    pub fn update_oracle_params(
        ctx: Context<UpdateOracle>,
        update: OracleParamsUpdate,
    ) -> Result<()> {
        instructions::oracle_config::update_oracle_params_handler(ctx, update)
    }

    pub fn pause_oracle(ctx: Context<UpdateOracle>, reason: String) -> Result<()> {
        instructions::oracle_config::pause_oracle_handler(ctx, reason)
    }

    pub fn unpause_oracle(ctx: Context<UpdateOracle>) -> Result<()> {
        instructions::oracle_config::unpause_oracle_handler(ctx)
    }

    pub fn propose_oracle_authority(
        ctx: Context<UpdateOracle>,
        new_authority: Pubkey,
    ) -> Result<()> {
        instructions::oracle_config::propose_oracle_authority_handler(ctx, new_authority)
    }

    pub fn accept_oracle_authority(ctx: Context<AcceptOracleAuthority>) -> Result<()> {
        instructions::oracle_config::accept_oracle_authority_handler(ctx)
    }

    pub fn update_cpi_multiplier(
        ctx: Context<UpdateCpiMultiplier>,
        new_multiplier: u64,
        reference_month: String,
        data_source: String,
    ) -> Result<()> {
        instructions::cpi_multiplier::update_cpi_multiplier_handler(
            ctx,
            new_multiplier,
            reference_month,
            data_source,
        )
    }

    /// Prices `input_amount` USD cents in tokens and stores the quote.
    pub fn get_mint_quote(ctx: Context<GetQuote>, params: QuoteParams) -> Result<QuoteResult> {
        instructions::quotes::get_mint_quote_handler(ctx, params)
    }

    /// Prices `input_amount` token base units in USD cents and stores the quote.
    pub fn get_redeem_quote(ctx: Context<GetQuote>, params: QuoteParams) -> Result<QuoteResult> {
        instructions::quotes::get_redeem_quote_handler(ctx, params)
    }

    pub fn mint_with_oracle(ctx: Context<MintWithOracle>) -> Result<()> {
        instructions::execute::mint_with_oracle_handler(ctx)
    }

    pub fn redeem_with_oracle(ctx: Context<RedeemWithOracle>) -> Result<()> {
        instructions::execute::redeem_with_oracle_handler(ctx)
    }

    /// Reclaims rent from an expired quote that was never executed.
    pub fn close_quote(ctx: Context<CloseQuote>) -> Result<()> {
        instructions::execute::close_quote_handler(ctx)
    }
}
