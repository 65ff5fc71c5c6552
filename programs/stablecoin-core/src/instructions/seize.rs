use anchor_lang::prelude::*;
use anchor_spl::token_2022::spl_token_2022::{onchain, state::AccountState};
use anchor_spl::token_2022::{self, Token2022};
use anchor_spl::token_interface::{Mint, TokenAccount};

use crate::constants::{CONFIG_SEED, MAX_REASON_LEN, SEIZURE_SEED};
use crate::errors::StablecoinError;
use crate::events::Seized;
use crate::state::{SeizureRecord, StablecoinConfig};

/// Preconditions on the source account that do not depend on roles.
#[derive(Debug, Clone, Copy)]
pub struct SeizurePlan {
    pub amount: u64,
    pub balance: u64,
    pub frozen: bool,
}

impl SeizurePlan {
    pub fn validate(&self) -> Result<()> {
        require!(self.amount > 0, StablecoinError::ZeroAmount);
        require!(self.frozen, StablecoinError::AccountNotFrozen);
        require!(
            self.amount <= self.balance,
            StablecoinError::InsufficientBalance
        );
        Ok(())
    }

    /// Source and destination balances once `amount` has moved. The pair sums
    /// to the same total as before, so a seizure never changes supply.
    pub fn settle(&self, destination_balance: u64) -> Result<(u64, u64)> {
        let source_after = self
            .balance
            .checked_sub(self.amount)
            .ok_or(StablecoinError::InsufficientBalance)?;
        let destination_after = destination_balance
            .checked_add(self.amount)
            .ok_or(StablecoinError::SupplyOverflow)?;
        Ok((source_after, destination_after))
    }
}

/// Remaining accounts carry the transfer hook's extra accounts, resolved
/// client-side from the mint's extra-account-meta list.
#[derive(Accounts)]
pub struct Seize<'info> {
    #[account(mut)]
    pub seizer: Signer<'info>,

    #[account(
        mut,
        seeds = [CONFIG_SEED, mint.key().as_ref()],
        bump = config.bump,
        has_one = mint
    )]
    pub config: Account<'info, StablecoinConfig>,

    pub mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        token::mint = mint,
        token::token_program = token_2022_program
    )]
    pub source: InterfaceAccount<'info, TokenAccount>,

    #[account(
        mut,
        token::mint = mint,
        token::token_program = token_2022_program
    )]
    pub destination: InterfaceAccount<'info, TokenAccount>,

    #[account(
        init,
        payer = seizer,
        space = 8 + SeizureRecord::INIT_SPACE,
        seeds = [SEIZURE_SEED, mint.key().as_ref(), &config.seizure_count.to_le_bytes()],
        bump
    )]
    pub seizure_record: Account<'info, SeizureRecord>,

    pub token_2022_program: Program<'info, Token2022>,

    pub system_program: Program<'info, System>,
}

pub fn seize_handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, Seize<'info>>,
    amount: u64,
    reason: String,
) -> Result<()> {
    let seizer = ctx.accounts.seizer.key();
    ctx.accounts.config.require_seizer(&seizer)?;
    require!(
        reason.len() <= MAX_REASON_LEN,
        StablecoinError::ReasonTooLong
    );
    require_keys_neq!(
        ctx.accounts.source.key(),
        ctx.accounts.destination.key(),
        StablecoinError::InvalidTokenAccount
    );
    let plan = SeizurePlan {
        amount,
        balance: ctx.accounts.source.amount,
        frozen: ctx.accounts.source.state == AccountState::Frozen,
    };
    plan.validate()?;
    let (source_after, destination_after) = plan.settle(ctx.accounts.destination.amount)?;

    let mint_key = ctx.accounts.mint.key();
    let config_bump = ctx.accounts.config.bump;
    let signer_seeds: &[&[u8]] = &[CONFIG_SEED, mint_key.as_ref(), &[config_bump]];
    let signer_seeds_arr = [signer_seeds];

    let config_info = ctx.accounts.config.to_account_info();
    let source_info = ctx.accounts.source.to_account_info();
    let mint_info = ctx.accounts.mint.to_account_info();
    let token_program_info = ctx.accounts.token_2022_program.to_account_info();

    token_2022::thaw_account(CpiContext::new_with_signer(
        token_program_info.clone(),
        token_2022::ThawAccount {
            account: source_info.clone(),
            mint: mint_info.clone(),
            authority: config_info.clone(),
        },
        &signer_seeds_arr,
    ))?;

    onchain::invoke_transfer_checked(
        token_program_info.key,
        source_info.clone(),
        mint_info.clone(),
        ctx.accounts.destination.to_account_info(),
        config_info.clone(),
        ctx.remaining_accounts,
        amount,
        ctx.accounts.mint.decimals,
        &signer_seeds_arr,
    )?;

    token_2022::freeze_account(CpiContext::new_with_signer(
        token_program_info,
        token_2022::FreezeAccount {
            account: source_info,
            mint: mint_info,
            authority: config_info,
        },
        &signer_seeds_arr,
    ))?;

    ctx.accounts.source.reload()?;
    ctx.accounts.destination.reload()?;
    require!(
        ctx.accounts.source.amount == source_after
            && ctx.accounts.destination.amount == destination_after,
        StablecoinError::SeizureBalanceMismatch
    );

    let clock = Clock::get()?;
    let config = &mut ctx.accounts.config;
    let sequence = config.next_seizure_sequence()?;
    config.last_updated_at = clock.unix_timestamp;

    let record = &mut ctx.accounts.seizure_record;
    record.mint = mint_key;
    record.seized_from = ctx.accounts.source.owner;
    record.seized_to = ctx.accounts.destination.owner;
    record.amount = amount;
    record.reason = reason;
    record.executed_by = seizer;
    record.executed_at = clock.unix_timestamp;
    record.slot = clock.slot;
    record.sequence = sequence;
    record.bump = ctx.bumps.seizure_record;

    emit!(Seized {
        mint: mint_key,
        from: record.seized_from,
        to: record.seized_to,
        amount,
        reason: record.reason.clone(),
        seized_by: seizer,
        sequence,
        timestamp: clock.unix_timestamp,
    });
    Ok(())
}
