use cosmwasm_std::{Addr, Api, DepsMut, Env, MessageInfo, Response, StdResult};

use crate::error::ContractError;
use crate::msg::{UpdateConfigParams, UpdateLotteryConfigParams};
use crate::state::{CoreConfig, Peer, CONFIG, ENTRY_CALLERS, LOTTERY_CONFIG, PEERS};

fn assert_admin(config: &CoreConfig, info: &MessageInfo, what: &str) -> Result<(), ContractError> {
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: format!("only admin can {what}"),
        });
    }
    Ok(())
}

/// `None` leaves the field alone, `Some("")` unsets it.
fn optional_addr(api: &dyn Api, value: String) -> StdResult<Option<Addr>> {
    if value.is_empty() {
        return Ok(None);
    }
    api.addr_validate(&value).map(Some)
}

pub fn update_lottery_config(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    params: UpdateLotteryConfigParams,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info, "update lottery config")?;

    let mut lottery = LOTTERY_CONFIG.load(deps.storage)?;
    if let Some(v) = params.min_swap_usd {
        lottery.min_swap_usd = v;
    }
    if let Some(v) = params.reward_share_bps {
        lottery.reward_share_bps = v;
    }
    if let Some(v) = params.active {
        lottery.active = v;
    }
    if let Some(v) = params.base_win_chance_ppm {
        lottery.base_win_chance_ppm = v;
    }
    if let Some(v) = params.max_win_chance_ppm {
        lottery.max_win_chance_ppm = v;
    }
    if let Some(v) = params.usd_multiplier_bps {
        lottery.usd_multiplier_bps = v;
    }

    // Validated as a whole so a partial update can't break a cross-field invariant
    lottery.validate()?;
    LOTTERY_CONFIG.save(deps.storage, &lottery)?;

    Ok(Response::new()
        .add_attribute("action", "update_lottery_config")
        .add_attribute("active", lottery.active.to_string())
        .add_attribute("min_swap_usd", lottery.min_swap_usd.to_string())
        .add_attribute("base_win_chance_ppm", lottery.base_win_chance_ppm.to_string())
        .add_attribute("max_win_chance_ppm", lottery.max_win_chance_ppm.to_string()))
}

pub fn update_config(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    params: UpdateConfigParams,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info, "update config")?;

    if let Some(v) = params.hub_chain_id {
        config.hub_chain_id = v;
    }
    if let Some(v) = params.randomness_hub_chain_id {
        config.randomness_hub_chain_id = v;
    }
    if let Some(v) = params.transport {
        config.transport = optional_addr(deps.api, v)?;
    }
    if let Some(v) = params.randomness_provider {
        config.randomness_provider = optional_addr(deps.api, v)?;
    }
    if let Some(v) = params.prefer_local_randomness {
        config.prefer_local_randomness = v;
    }
    if let Some(v) = params.price_oracle {
        config.price_oracle = optional_addr(deps.api, v)?;
    }
    if let Some(v) = params.boost_source {
        config.boost_source = optional_addr(deps.api, v)?;
    }
    if let Some(v) = params.jackpot_reserve {
        config.jackpot_reserve = deps.api.addr_validate(&v)?;
    }
    if let Some(v) = params.jackpot_vault_id {
        config.jackpot_vault_id = v;
    }
    if let Some(v) = params.fee_denom {
        config.fee_denom = v;
    }
    if let Some(v) = params.price_staleness_seconds {
        config.price_staleness_seconds = v;
    }
    if let Some(v) = params.twap_window_seconds {
        config.twap_window_seconds = v;
    }
    if let Some(v) = params.default_gas_limit {
        config.default_gas_limit = v;
    }

    validate_core_config(&config)?;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_config")
        .add_attribute("hub_chain_id", config.hub_chain_id.to_string())
        .add_attribute(
            "randomness_hub_chain_id",
            config.randomness_hub_chain_id.to_string(),
        ))
}

pub fn validate_core_config(config: &CoreConfig) -> Result<(), ContractError> {
    if config.fee_denom.is_empty() {
        return Err(ContractError::InvalidConfig {
            reason: "fee_denom must not be empty".to_string(),
        });
    }
    if config.price_staleness_seconds == 0 {
        return Err(ContractError::InvalidConfig {
            reason: "price_staleness_seconds must be positive".to_string(),
        });
    }
    if config.default_gas_limit == 0 {
        return Err(ContractError::InvalidConfig {
            reason: "default_gas_limit must be positive".to_string(),
        });
    }
    Ok(())
}

/// Register or replace the trusted lottery instance on `chain_id`. Admin only.
pub fn set_peer(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    chain_id: u32,
    address: String,
    gas_limit: Option<u64>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info, "set peers")?;

    // Remote addresses use another chain's encoding and can't be validated here
    if address.trim().is_empty() {
        return Err(ContractError::InvalidConfig {
            reason: "peer address must not be empty".to_string(),
        });
    }
    if gas_limit == Some(0) {
        return Err(ContractError::InvalidConfig {
            reason: "peer gas_limit must be positive".to_string(),
        });
    }

    PEERS.save(
        deps.storage,
        chain_id,
        &Peer {
            address: address.clone(),
            gas_limit,
        },
    )?;

    Ok(Response::new()
        .add_attribute("action", "set_peer")
        .add_attribute("chain_id", chain_id.to_string())
        .add_attribute("address", address))
}

pub fn remove_peer(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    chain_id: u32,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info, "remove peers")?;

    if !PEERS.has(deps.storage, chain_id) {
        return Err(ContractError::UnsupportedChain { chain_id });
    }
    PEERS.remove(deps.storage, chain_id);

    Ok(Response::new()
        .add_attribute("action", "remove_peer")
        .add_attribute("chain_id", chain_id.to_string()))
}

pub fn update_entry_callers(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    add: Vec<String>,
    remove: Vec<String>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    assert_admin(&config, &info, "update entry callers")?;

    for caller in &add {
        let addr = deps.api.addr_validate(caller)?;
        ENTRY_CALLERS.save(deps.storage, &addr, &())?;
    }
    for caller in &remove {
        let addr = deps.api.addr_validate(caller)?;
        ENTRY_CALLERS.remove(deps.storage, &addr);
    }

    Ok(Response::new()
        .add_attribute("action", "update_entry_callers")
        .add_attribute("added", add.len().to_string())
        .add_attribute("removed", remove.len().to_string()))
}
