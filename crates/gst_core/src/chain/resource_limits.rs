use std::collections::BTreeSet;

use gst_chainbase::{ChainbaseError, ChainbaseObject, UndoSession};
use spdlog::{debug, info};

use crate::chain::{
    GSTIO_GAS_NAME, GSTIO_NAME,
    block::BlockTimestamp,
    config::{GAS_TRANSACTION_TOLL, RATE_LIMITING_PRECISION},
    error::ChainError,
    name::Name,
    resource::{
        AccountResourceLimit, ElasticLimitParameters, ResourceGas, ResourceGasActivation,
        ResourceLimits, ResourceLimitsConfig, ResourceLimitsState, ResourceUsage,
    },
    snapshot::{SnapshotReader, SnapshotWriter},
    utils::{UsageAccumulator, downgrade_cast, gst_assert, integer_divide_ceil},
};

fn update_elastic_limit(
    current_limit: u64,
    average_usage: u64,
    params: &ElasticLimitParameters,
) -> Result<u64, ChainError> {
    let rate = if average_usage > params.target {
        params.contract_rate
    } else {
        params.expand_rate
    };
    let result = (current_limit as u128)
        .checked_mul(rate.numerator as u128)
        .ok_or_else(|| {
            ChainError::RateLimitingStateInconsistent(
                "overflow when scaling virtual limit".to_string(),
            )
        })?
        / rate.denominator as u128;
    let floor = params.max as u128;
    let ceiling = params.max as u128 * params.max_multiplier as u128;
    Ok(result.clamp(floor, ceiling) as u64)
}

pub struct ResourceLimitsManager {}

impl ResourceLimitsManager {
    /// Creates the config and state singletons. The chain starts off
    /// "congested" (slow-start): the virtual limits open at the nominal
    /// block maximums, the floor of the elastic range.
    pub fn initialize_database(session: &mut UndoSession) -> Result<(), ChainError> {
        let config = ResourceLimitsConfig::default();
        session.insert(&config)?;

        let mut state = ResourceLimitsState::default();
        state.virtual_cpu_limit = config.cpu_limit_parameters.max;
        state.virtual_net_limit = config.net_limit_parameters.max;
        session.insert(&state)?;
        Ok(())
    }

    pub fn initialize_account(session: &mut UndoSession, account: Name) -> Result<(), ChainError> {
        let limits = ResourceLimits {
            owner: account,
            ..Default::default()
        };
        session.insert(&limits).map_err(|e| match e {
            ChainbaseError::AlreadyExists => ChainError::AccountAlreadyExists(format!(
                "resource limits already initialized for account {}",
                account
            )),
            e => e.into(),
        })?;

        let usage = ResourceUsage::new(
            account,
            UsageAccumulator::default(),
            UsageAccumulator::default(),
            0,
        );
        session.insert(&usage).map_err(|e| match e {
            ChainbaseError::AlreadyExists => ChainError::AccountAlreadyExists(format!(
                "resource usage already initialized for account {}",
                account
            )),
            e => e.into(),
        })?;

        Ok(())
    }

    pub fn set_block_parameters(
        session: &mut UndoSession,
        cpu_limit_parameters: ElasticLimitParameters,
        net_limit_parameters: ElasticLimitParameters,
    ) -> Result<(), ChainError> {
        cpu_limit_parameters.validate()?;
        net_limit_parameters.validate()?;

        let mut config = session.get::<ResourceLimitsConfig>(0)?;
        if config.cpu_limit_parameters == cpu_limit_parameters
            && config.net_limit_parameters == net_limit_parameters
        {
            return Ok(());
        }

        session.modify(&mut config, |config| {
            config.cpu_limit_parameters = cpu_limit_parameters;
            config.net_limit_parameters = net_limit_parameters;
        })?;
        Ok(())
    }

    /// Ages the accounts' moving averages up to `time_slot` without billing
    /// any new usage.
    pub fn update_account_usage(
        session: &mut UndoSession,
        accounts: &BTreeSet<Name>,
        time_slot: u64,
    ) -> Result<(), ChainError> {
        let config = session.get::<ResourceLimitsConfig>(0)?;
        for account in accounts {
            let mut usage = session.get::<ResourceUsage>(*account)?;
            let mut net_usage = usage.net_usage;
            net_usage.add(0, time_slot, config.account_net_usage_average_window as u64)?;
            let mut cpu_usage = usage.cpu_usage;
            cpu_usage.add(0, time_slot, config.account_cpu_usage_average_window as u64)?;
            session.modify(&mut usage, |bu| {
                bu.net_usage = net_usage;
                bu.cpu_usage = cpu_usage;
            })?;
        }
        Ok(())
    }

    /// Bills `cpu_usage` and `net_usage` to every authorizing account and
    /// fails if any account exceeds its stake-weighted share of the sliding
    /// window, or the block runs out of headroom. Accumulator updates are
    /// persisted even on failure; undoing them is the job of the session
    /// rollback at the caller's transaction boundary.
    pub fn add_transaction_usage(
        session: &mut UndoSession,
        accounts: &BTreeSet<Name>,
        cpu_usage: u64,
        net_usage: u64,
        time_slot: u64,
    ) -> Result<(), ChainError> {
        let mut state = session.get::<ResourceLimitsState>(0)?;
        let config = session.get::<ResourceLimitsConfig>(0)?;

        for account in accounts {
            let mut usage = session.get::<ResourceUsage>(*account)?;
            let mut unused = 0i64;
            let mut net_weight = 0i64;
            let mut cpu_weight = 0i64;
            Self::get_account_limits(
                session,
                *account,
                &mut unused,
                &mut net_weight,
                &mut cpu_weight,
            )?;

            let mut net_acc = usage.net_usage;
            net_acc.add(
                net_usage,
                time_slot,
                config.account_net_usage_average_window as u64,
            )?;
            let mut cpu_acc = usage.cpu_usage;
            cpu_acc.add(
                cpu_usage,
                time_slot,
                config.account_cpu_usage_average_window as u64,
            )?;
            session.modify(&mut usage, |bu| {
                bu.net_usage = net_acc;
                bu.cpu_usage = cpu_acc;
            })?;

            if cpu_weight >= 0 && state.total_cpu_weight > 0 {
                let window_size = config.account_cpu_usage_average_window as u128;
                let virtual_cpu_capacity_in_window =
                    state.virtual_cpu_limit as u128 * window_size;
                let cpu_used_in_window = Self::used_in_window(&usage.cpu_usage, window_size)?;

                let user_weight = cpu_weight as u128;
                let all_user_weight = state.total_cpu_weight as u128;

                let max_user_use_in_window = virtual_cpu_capacity_in_window
                    .checked_mul(user_weight)
                    .ok_or_else(|| {
                        ChainError::RateLimitingStateInconsistent(
                            "overflow when computing cpu share".to_string(),
                        )
                    })?
                    / all_user_weight;

                gst_assert(
                    cpu_used_in_window <= max_user_use_in_window,
                    ChainError::TxCpuUsageExceeded(format!(
                        "authorizing account '{}' has insufficient cpu resources for this transaction; used {} of {} in window",
                        account, cpu_used_in_window, max_user_use_in_window
                    )),
                )?;
            }

            if net_weight >= 0 && state.total_net_weight > 0 {
                let window_size = config.account_net_usage_average_window as u128;
                let virtual_network_capacity_in_window =
                    state.virtual_net_limit as u128 * window_size;
                let net_used_in_window = Self::used_in_window(&usage.net_usage, window_size)?;

                let user_weight = net_weight as u128;
                let all_user_weight = state.total_net_weight as u128;

                let max_user_use_in_window = virtual_network_capacity_in_window
                    .checked_mul(user_weight)
                    .ok_or_else(|| {
                        ChainError::RateLimitingStateInconsistent(
                            "overflow when computing net share".to_string(),
                        )
                    })?
                    / all_user_weight;

                gst_assert(
                    net_used_in_window <= max_user_use_in_window,
                    ChainError::TxNetUsageExceeded(format!(
                        "authorizing account '{}' has insufficient net resources for this transaction; used {} of {} in window",
                        account, net_used_in_window, max_user_use_in_window
                    )),
                )?;
            }
        }

        // account for this transaction in the block and do not exceed those
        // limits either
        let pending_cpu_usage = state
            .pending_cpu_usage
            .checked_add(cpu_usage)
            .ok_or_else(|| {
                ChainError::BlockResourceExhausted(
                    "block has insufficient cpu resources".to_string(),
                )
            })?;
        let pending_net_usage = state
            .pending_net_usage
            .checked_add(net_usage)
            .ok_or_else(|| {
                ChainError::BlockResourceExhausted(
                    "block has insufficient net resources".to_string(),
                )
            })?;
        session.modify(&mut state, |rls| {
            rls.pending_cpu_usage = pending_cpu_usage;
            rls.pending_net_usage = pending_net_usage;
        })?;

        gst_assert(
            state.pending_cpu_usage <= config.cpu_limit_parameters.max,
            ChainError::BlockResourceExhausted("block has insufficient cpu resources".to_string()),
        )?;
        gst_assert(
            state.pending_net_usage <= config.net_limit_parameters.max,
            ChainError::BlockResourceExhausted("block has insufficient net resources".to_string()),
        )?;

        Ok(())
    }

    fn used_in_window(
        accumulator: &UsageAccumulator,
        window_size: u128,
    ) -> Result<u128, ChainError> {
        let scaled = accumulator.value_ex.checked_mul(window_size).ok_or_else(|| {
            ChainError::RateLimitingStateInconsistent(
                "overflow when scaling usage to window".to_string(),
            )
        })?;
        Ok(scaled / RATE_LIMITING_PRECISION as u128)
    }

    pub fn add_pending_ram_usage(
        session: &mut UndoSession,
        account: Name,
        ram_delta: i64,
    ) -> Result<(), ChainError> {
        if ram_delta == 0 {
            return Ok(());
        }

        let mut usage = session.get::<ResourceUsage>(account)?;

        let new_ram_usage = if ram_delta > 0 {
            gst_assert(
                u64::MAX - usage.ram_usage >= ram_delta as u64,
                ChainError::RamUsageOverflow(format!(
                    "ram usage delta would overflow for account {}",
                    account
                )),
            )?;
            usage.ram_usage + ram_delta as u64
        } else {
            gst_assert(
                usage.ram_usage >= ram_delta.unsigned_abs(),
                ChainError::RamUsageUnderflow(format!(
                    "ram usage delta would underflow for account {}",
                    account
                )),
            )?;
            usage.ram_usage - ram_delta.unsigned_abs()
        };
        session.modify(&mut usage, |u| u.ram_usage = new_ram_usage)?;

        if Self::is_activation(session)? {
            match session.find::<ResourceGas>((true, account))? {
                Some(mut gas) => {
                    // a net-negative delta must not manufacture gas headroom,
                    // so the usage saturates at zero
                    let new_gst_usage = match gas.gst_usage.checked_add_signed(ram_delta) {
                        Some(value) => value,
                        None if ram_delta < 0 => 0,
                        None => {
                            return Err(ChainError::RamUsageOverflow(format!(
                                "gas usage delta would overflow for account {}",
                                account
                            )));
                        }
                    };
                    session.modify(&mut gas, |g| g.gst_usage = new_gst_usage)?;
                }
                None => {
                    let gas = ResourceGas::new(account, true, 0, ram_delta.max(0) as u64);
                    session.insert(&gas)?;
                }
            }
        }

        Ok(())
    }

    pub fn verify_account_ram_usage(
        session: &mut UndoSession,
        account: Name,
    ) -> Result<(), ChainError> {
        let mut ram_bytes = 0i64;
        let mut net_weight = 0i64;
        let mut cpu_weight = 0i64;
        Self::get_account_limits(
            session,
            account,
            &mut ram_bytes,
            &mut net_weight,
            &mut cpu_weight,
        )?;
        let usage = session.get::<ResourceUsage>(account)?;

        if ram_bytes >= 0 {
            gst_assert(
                usage.ram_usage <= ram_bytes as u64,
                ChainError::RamUsageExceeded(format!(
                    "account {} has insufficient ram; needs {} bytes has {} bytes",
                    account, usage.ram_usage, ram_bytes
                )),
            )?;
        }

        if Self::is_activation(session)? {
            match session.find::<ResourceGas>((true, account))? {
                Some(gas) => {
                    if gas.gst_bytes >= 0 && account != GSTIO_GAS_NAME && account != GSTIO_NAME {
                        gst_assert(
                            gas.gst_usage <= gas.gst_bytes as u64,
                            ChainError::InsufficientGas(format!(
                                "account {} has insufficient gas; needs {} has {}",
                                account, gas.gst_usage, gas.gst_bytes
                            )),
                        )?;
                    }
                }
                None => {
                    gst_assert(
                        account == GSTIO_GAS_NAME,
                        ChainError::GasNotProvisioned(format!(
                            "account {} must provision gas before this operation",
                            account
                        )),
                    )?;
                }
            }
        }

        Ok(())
    }

    /// Charges the flat per-transaction gas toll against the account's gas
    /// balance. Accounts with an unlimited balance are not charged.
    pub fn verify_account_gst_usage(
        session: &mut UndoSession,
        account: Name,
    ) -> Result<(), ChainError> {
        let mut gas = session.find::<ResourceGas>((true, account))?.ok_or_else(|| {
            ChainError::GasNotProvisioned(format!(
                "account {} must provision gas before this operation",
                account
            ))
        })?;

        if gas.gst_bytes >= 0 {
            let needed = gas
                .gst_usage
                .checked_add(GAS_TRANSACTION_TOLL)
                .ok_or_else(|| {
                    ChainError::InsufficientGas(format!(
                        "account {} gas usage would overflow",
                        account
                    ))
                })?;
            gst_assert(
                gas.gst_bytes as u64 >= needed,
                ChainError::InsufficientGas(format!(
                    "account {} has insufficient gas; needs {} has {}",
                    account,
                    GAS_TRANSACTION_TOLL,
                    (gas.gst_bytes as u64).saturating_sub(gas.gst_usage)
                )),
            )?;
            session.modify(&mut gas, |g| g.gst_usage = needed)?;
        }

        Ok(())
    }

    pub fn is_activation(session: &mut UndoSession) -> Result<bool, ChainError> {
        match session.find::<ResourceGasActivation>((true, GSTIO_NAME))? {
            Some(activation) => Ok(activation.is_activation),
            None => Ok(false),
        }
    }

    pub fn get_account_ram_usage(
        session: &mut UndoSession,
        account: Name,
    ) -> Result<i64, ChainError> {
        let usage = session.get::<ResourceUsage>(account)?;
        Ok(usage.ram_usage as i64)
    }

    /// Stages new limits for the account into a pending row; the chain
    /// controller collapses pending rows into the actual state at the next
    /// block boundary. Returns true if the new `ram_bytes` limit is more
    /// restrictive than the previously set one.
    pub fn set_account_limits(
        session: &mut UndoSession,
        account: Name,
        ram_bytes: i64,
        net_weight: i64,
        cpu_weight: i64,
    ) -> Result<bool, ChainError> {
        let mut limits = match session.find::<ResourceLimits>((true, account))? {
            Some(pending_limits) => pending_limits,
            None => {
                let committed = session.get::<ResourceLimits>((false, account))?;
                let pending_limits = ResourceLimits::new(
                    committed.owner,
                    true,
                    committed.net_weight,
                    committed.cpu_weight,
                    committed.ram_bytes,
                );
                session.insert(&pending_limits)?;
                pending_limits
            }
        };

        let mut decreased_limit = false;
        if ram_bytes >= 0 {
            decreased_limit = limits.ram_bytes < 0 || ram_bytes < limits.ram_bytes;
        }

        session.modify(&mut limits, |pending_limits| {
            pending_limits.ram_bytes = ram_bytes;
            pending_limits.net_weight = net_weight;
            pending_limits.cpu_weight = cpu_weight;
        })?;

        Ok(decreased_limit)
    }

    /// Reads the pending row when one is staged so callers see the latest
    /// intended limits, falling back to the committed row.
    pub fn get_account_limits(
        session: &mut UndoSession,
        account: Name,
        ram_bytes: &mut i64,
        net_weight: &mut i64,
        cpu_weight: &mut i64,
    ) -> Result<(), ChainError> {
        let limits = match session.find::<ResourceLimits>((true, account))? {
            Some(pending_limits) => pending_limits,
            None => session.get::<ResourceLimits>((false, account))?,
        };
        *ram_bytes = limits.ram_bytes;
        *net_weight = limits.net_weight;
        *cpu_weight = limits.cpu_weight;
        Ok(())
    }

    /// Sets the account's provisioned gas. A decrease must leave room for
    /// gas already consumed. Returns the same decrease flag convention as
    /// [`Self::set_account_limits`].
    pub fn set_gst_limits(
        session: &mut UndoSession,
        account: Name,
        gst_bytes: i64,
    ) -> Result<bool, ChainError> {
        let mut limits = match session.find::<ResourceGas>((true, account))? {
            Some(pending_limits) => pending_limits,
            None => {
                let pending_limits = ResourceGas::new(account, true, gst_bytes, 0);
                session.insert(&pending_limits)?;
                pending_limits
            }
        };

        if limits.gst_bytes > gst_bytes {
            gst_assert(
                gst_bytes >= limits.gst_usage as i64,
                ChainError::InsufficientGas(format!(
                    "account {} has {} gas in use, which exceeds the new limit {}",
                    account, limits.gst_usage, gst_bytes
                )),
            )?;
        }

        let mut decreased_limit = false;
        if gst_bytes >= 0 {
            decreased_limit = limits.gst_bytes < 0 || gst_bytes < limits.gst_bytes;
        }

        session.modify(&mut limits, |pending_limits| {
            pending_limits.gst_bytes = gst_bytes;
        })?;

        Ok(decreased_limit)
    }

    /// Toggles gas metering chain-wide.
    pub fn set_gas_limits(session: &mut UndoSession, flag: bool) -> Result<(), ChainError> {
        info!("gas metering activation set to {}", flag);
        match session.find::<ResourceGasActivation>((true, GSTIO_NAME))? {
            Some(mut activation) => {
                session.modify(&mut activation, |gas| gas.is_activation = flag)?;
            }
            None => {
                let activation = ResourceGasActivation {
                    owner: GSTIO_NAME,
                    pending: true,
                    is_activation: flag,
                };
                session.insert(&activation)?;
            }
        }
        Ok(())
    }

    pub fn get_account_gas_remaining(
        session: &mut UndoSession,
        account: Name,
    ) -> Result<i64, ChainError> {
        match session.find::<ResourceGas>((true, account))? {
            Some(gas) => {
                let remaining = gas.gst_bytes - gas.gst_usage as i64;
                Ok(remaining.max(0))
            }
            None => Ok(0),
        }
    }

    /// Collapses every pending `ResourceLimits` row into its committed row,
    /// moving each positive weight out of and into the chain-wide totals
    /// with checked arithmetic. Runs once per block boundary.
    pub fn process_account_limit_updates(session: &mut UndoSession) -> Result<(), ChainError> {
        let mut by_owner_index = session.get_index::<ResourceLimits>();
        let mut itr = by_owner_index.lower_bound(true)?;

        // convenience local closure to reduce clutter
        let update_state_and_value = |total: &mut u64,
                                      value: &mut i64,
                                      pending_value: i64,
                                      debug_which: &str|
         -> Result<(), ChainError> {
            if *value > 0 {
                *total = total.checked_sub(*value as u64).ok_or_else(|| {
                    ChainError::RateLimitingStateInconsistent(format!(
                        "underflow when reverting old value to {}",
                        debug_which
                    ))
                })?;
            }

            if pending_value > 0 {
                *total = total.checked_add(pending_value as u64).ok_or_else(|| {
                    ChainError::RateLimitingStateInconsistent(format!(
                        "overflow when applying new value to {}",
                        debug_which
                    ))
                })?;
            }

            *value = pending_value;
            Ok(())
        };

        let mut state = session.get::<ResourceLimitsState>(0)?;
        let mut total_ram_bytes = state.total_ram_bytes;
        let mut total_cpu_weight = state.total_cpu_weight;
        let mut total_net_weight = state.total_net_weight;

        while let Some(pending_limit) = itr.next()? {
            if !pending_limit.pending {
                break;
            }

            let mut actual_limits =
                session.get::<ResourceLimits>((false, pending_limit.owner))?;
            let mut new_ram_bytes = actual_limits.ram_bytes;
            let mut new_cpu_weight = actual_limits.cpu_weight;
            let mut new_net_weight = actual_limits.net_weight;
            update_state_and_value(
                &mut total_ram_bytes,
                &mut new_ram_bytes,
                pending_limit.ram_bytes,
                "ram_bytes",
            )?;
            update_state_and_value(
                &mut total_cpu_weight,
                &mut new_cpu_weight,
                pending_limit.cpu_weight,
                "cpu_weight",
            )?;
            update_state_and_value(
                &mut total_net_weight,
                &mut new_net_weight,
                pending_limit.net_weight,
                "net_weight",
            )?;

            session.modify(&mut actual_limits, |rlo| {
                rlo.ram_bytes = new_ram_bytes;
                rlo.cpu_weight = new_cpu_weight;
                rlo.net_weight = new_net_weight;
            })?;
            session.remove(pending_limit)?;
        }

        session.modify(&mut state, |rso| {
            rso.total_ram_bytes = total_ram_bytes;
            rso.total_cpu_weight = total_cpu_weight;
            rso.total_net_weight = total_net_weight;
        })?;

        Ok(())
    }

    /// Folds the block's pending usage into the moving averages, recomputes
    /// the virtual limits, and resets the pending counters. Runs once per
    /// block boundary.
    pub fn process_block_usage(
        session: &mut UndoSession,
        block_num: u64,
    ) -> Result<(), ChainError> {
        let mut state = session.get::<ResourceLimitsState>(0)?;
        let config = session.get::<ResourceLimitsConfig>(0)?;

        let mut average_block_cpu_usage = state.average_block_cpu_usage;
        average_block_cpu_usage.add(
            state.pending_cpu_usage,
            block_num,
            config.cpu_limit_parameters.periods as u64,
        )?;
        let virtual_cpu_limit = update_elastic_limit(
            state.virtual_cpu_limit,
            average_block_cpu_usage.average(),
            &config.cpu_limit_parameters,
        )?;

        let mut average_block_net_usage = state.average_block_net_usage;
        average_block_net_usage.add(
            state.pending_net_usage,
            block_num,
            config.net_limit_parameters.periods as u64,
        )?;
        let virtual_net_limit = update_elastic_limit(
            state.virtual_net_limit,
            average_block_net_usage.average(),
            &config.net_limit_parameters,
        )?;

        debug!(
            "block {}: virtual cpu limit {}, virtual net limit {}",
            block_num, virtual_cpu_limit, virtual_net_limit
        );

        session.modify(&mut state, |s| {
            s.average_block_cpu_usage = average_block_cpu_usage;
            s.virtual_cpu_limit = virtual_cpu_limit;
            s.pending_cpu_usage = 0;

            s.average_block_net_usage = average_block_net_usage;
            s.virtual_net_limit = virtual_net_limit;
            s.pending_net_usage = 0;
        })?;

        Ok(())
    }

    pub fn get_virtual_block_cpu_limit(session: &mut UndoSession) -> Result<u64, ChainError> {
        let state = session.get::<ResourceLimitsState>(0)?;
        Ok(state.virtual_cpu_limit)
    }

    pub fn get_virtual_block_net_limit(session: &mut UndoSession) -> Result<u64, ChainError> {
        let state = session.get::<ResourceLimitsState>(0)?;
        Ok(state.virtual_net_limit)
    }

    pub fn get_block_cpu_limit(session: &mut UndoSession) -> Result<u64, ChainError> {
        let state = session.get::<ResourceLimitsState>(0)?;
        let config = session.get::<ResourceLimitsConfig>(0)?;
        Ok(config.cpu_limit_parameters.max - state.pending_cpu_usage)
    }

    pub fn get_block_net_limit(session: &mut UndoSession) -> Result<u64, ChainError> {
        let state = session.get::<ResourceLimitsState>(0)?;
        let config = session.get::<ResourceLimitsConfig>(0)?;
        Ok(config.net_limit_parameters.max - state.pending_net_usage)
    }

    pub fn get_account_cpu_limit(
        session: &mut UndoSession,
        account: Name,
        elastic: bool,
        current_time: Option<BlockTimestamp>,
    ) -> Result<i64, ChainError> {
        let arl = Self::get_account_cpu_limit_ex(session, account, elastic, current_time)?;
        Ok(arl.available)
    }

    pub fn get_account_cpu_limit_ex(
        session: &mut UndoSession,
        account: Name,
        elastic: bool,
        current_time: Option<BlockTimestamp>,
    ) -> Result<AccountResourceLimit, ChainError> {
        let state = session.get::<ResourceLimitsState>(0)?;
        let config = session.get::<ResourceLimitsConfig>(0)?;
        let usage = session.get::<ResourceUsage>(account)?;

        let mut unused_x = 0i64;
        let mut unused_y = 0i64;
        let mut cpu_weight = 0i64;
        Self::get_account_limits(
            session,
            account,
            &mut unused_x,
            &mut unused_y,
            &mut cpu_weight,
        )?;

        if cpu_weight < 0 || state.total_cpu_weight == 0 {
            return Ok(AccountResourceLimit::new(
                -1,
                -1,
                -1,
                BlockTimestamp::new(usage.cpu_usage.last_ordinal as u32),
                -1,
            ));
        }

        let window_size = config.account_cpu_usage_average_window as u128;
        let capacity = if elastic {
            state.virtual_cpu_limit
        } else {
            config.cpu_limit_parameters.max
        };
        Self::account_limit_in_window(
            &usage.cpu_usage,
            capacity,
            window_size,
            cpu_weight as u128,
            state.total_cpu_weight as u128,
            current_time,
        )
    }

    pub fn get_account_net_limit(
        session: &mut UndoSession,
        account: Name,
        elastic: bool,
        current_time: Option<BlockTimestamp>,
    ) -> Result<i64, ChainError> {
        let arl = Self::get_account_net_limit_ex(session, account, elastic, current_time)?;
        Ok(arl.available)
    }

    pub fn get_account_net_limit_ex(
        session: &mut UndoSession,
        account: Name,
        elastic: bool,
        current_time: Option<BlockTimestamp>,
    ) -> Result<AccountResourceLimit, ChainError> {
        let state = session.get::<ResourceLimitsState>(0)?;
        let config = session.get::<ResourceLimitsConfig>(0)?;
        let usage = session.get::<ResourceUsage>(account)?;

        let mut unused_x = 0i64;
        let mut unused_y = 0i64;
        let mut net_weight = 0i64;
        Self::get_account_limits(
            session,
            account,
            &mut unused_x,
            &mut net_weight,
            &mut unused_y,
        )?;

        if net_weight < 0 || state.total_net_weight == 0 {
            return Ok(AccountResourceLimit::new(
                -1,
                -1,
                -1,
                BlockTimestamp::new(usage.net_usage.last_ordinal as u32),
                -1,
            ));
        }

        let window_size = config.account_net_usage_average_window as u128;
        let capacity = if elastic {
            state.virtual_net_limit
        } else {
            config.net_limit_parameters.max
        };
        Self::account_limit_in_window(
            &usage.net_usage,
            capacity,
            window_size,
            net_weight as u128,
            state.total_net_weight as u128,
            current_time,
        )
    }

    fn account_limit_in_window(
        accumulator: &UsageAccumulator,
        capacity: u64,
        window_size: u128,
        user_weight: u128,
        all_user_weight: u128,
        current_time: Option<BlockTimestamp>,
    ) -> Result<AccountResourceLimit, ChainError> {
        let capacity_in_window = capacity as u128 * window_size;
        let max_user_use_in_window = capacity_in_window
            .checked_mul(user_weight)
            .ok_or_else(|| {
                ChainError::RateLimitingStateInconsistent(
                    "overflow when computing account share".to_string(),
                )
            })?
            / all_user_weight;
        let used_in_window = integer_divide_ceil(
            accumulator.value_ex.checked_mul(window_size).ok_or_else(|| {
                ChainError::RateLimitingStateInconsistent(
                    "overflow when scaling usage to window".to_string(),
                )
            })?,
            RATE_LIMITING_PRECISION as u128,
        );

        let mut arl = AccountResourceLimit::default();
        if max_user_use_in_window <= used_in_window {
            arl.available = 0;
        } else {
            arl.available = downgrade_cast(max_user_use_in_window - used_in_window)?;
        }
        arl.used = downgrade_cast(used_in_window)?;
        arl.max = downgrade_cast(max_user_use_in_window)?;
        arl.last_usage_update_time = BlockTimestamp::new(accumulator.last_ordinal as u32);
        arl.current_used = arl.used;

        if let Some(current_time) = current_time {
            if current_time.slot() as u64 > accumulator.last_ordinal {
                let mut history_usage = *accumulator;
                history_usage.add(0, current_time.slot() as u64, window_size as u64)?;
                arl.current_used = downgrade_cast(integer_divide_ceil(
                    history_usage.value_ex.checked_mul(window_size).ok_or_else(|| {
                        ChainError::RateLimitingStateInconsistent(
                            "overflow when scaling usage to window".to_string(),
                        )
                    })?,
                    RATE_LIMITING_PRECISION as u128,
                ))?;
            }
        }

        Ok(arl)
    }

    /// Writes every table to the snapshot in a fixed order, rows in
    /// primary-key order, so a restore followed by a re-export reproduces
    /// the bytes exactly.
    pub fn add_to_snapshot(
        session: &mut UndoSession,
        snapshot: &mut SnapshotWriter,
    ) -> Result<(), ChainError> {
        Self::write_table_section::<ResourceLimits>(session, snapshot)?;
        Self::write_table_section::<ResourceUsage>(session, snapshot)?;
        Self::write_table_section::<ResourceGas>(session, snapshot)?;
        Self::write_table_section::<ResourceGasActivation>(session, snapshot)?;
        Self::write_table_section::<ResourceLimitsState>(session, snapshot)?;
        Self::write_table_section::<ResourceLimitsConfig>(session, snapshot)?;
        Ok(())
    }

    pub fn read_from_snapshot(
        session: &mut UndoSession,
        snapshot: &mut SnapshotReader,
    ) -> Result<(), ChainError> {
        Self::read_table_section::<ResourceLimits>(session, snapshot)?;
        Self::read_table_section::<ResourceUsage>(session, snapshot)?;
        Self::read_table_section::<ResourceGas>(session, snapshot)?;
        Self::read_table_section::<ResourceGasActivation>(session, snapshot)?;
        Self::read_table_section::<ResourceLimitsState>(session, snapshot)?;
        Self::read_table_section::<ResourceLimitsConfig>(session, snapshot)?;
        Ok(())
    }

    fn write_table_section<T: ChainbaseObject>(
        session: &mut UndoSession,
        snapshot: &mut SnapshotWriter,
    ) -> Result<(), ChainError> {
        let mut index = session.get_index::<T>();
        let mut itr = index.begin()?;
        snapshot.write_section(|section| {
            while let Some(row) = itr.next()? {
                section.add_row(&row)?;
            }
            Ok(())
        })
    }

    fn read_table_section<T: ChainbaseObject>(
        session: &mut UndoSession,
        snapshot: &mut SnapshotReader,
    ) -> Result<(), ChainError> {
        snapshot.read_section(|section| {
            while section.more() {
                let row: T = section.read_row()?;
                session.insert(&row)?;
            }
            Ok(())
        })
    }
}
