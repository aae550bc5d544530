use cosmwasm_std::{
    entry_point, Binary, Deps, DepsMut, Env, MessageInfo, Reply, Response, StdResult, Uint128,
};
use cw2::{get_contract_version, set_contract_version};

use crate::broadcast;
use crate::dispatch;
use crate::error::ContractError;
use crate::execute;
use crate::fulfill;
use crate::msg::{
    ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg, UpdateConfigParams,
    UpdateLotteryConfigParams,
};
use crate::price;
use crate::query;
use crate::reply;
use crate::settle;
use crate::state::{CoreConfig, LotteryStats, CONFIG, ENTRY_CALLERS, LOTTERY_CONFIG, STATS};

const CONTRACT_NAME: &str = "crates.io:jackpot-lottery";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_PRICE_STALENESS_SECONDS: u64 = 2 * 60 * 60;
const DEFAULT_TWAP_WINDOW_SECONDS: u64 = 30 * 60;
const DEFAULT_GAS_LIMIT: u64 = 200_000;

#[entry_point]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    msg.lottery.validate()?;

    let optional = |value: Option<String>| -> StdResult<_> {
        value.map(|v| deps.api.addr_validate(&v)).transpose()
    };

    let config = CoreConfig {
        admin: info.sender.clone(),
        local_chain_id: msg.local_chain_id,
        hub_chain_id: msg.hub_chain_id,
        randomness_hub_chain_id: msg.randomness_hub_chain_id.unwrap_or(msg.hub_chain_id),
        transport: optional(msg.transport)?,
        randomness_provider: optional(msg.randomness_provider)?,
        prefer_local_randomness: msg.prefer_local_randomness,
        price_oracle: optional(msg.price_oracle)?,
        boost_source: optional(msg.boost_source)?,
        jackpot_reserve: deps.api.addr_validate(&msg.jackpot_reserve)?,
        jackpot_vault_id: msg.jackpot_vault_id,
        fee_denom: msg.fee_denom,
        token_decimals: msg.token_decimals,
        price_staleness_seconds: msg
            .price_staleness_seconds
            .unwrap_or(DEFAULT_PRICE_STALENESS_SECONDS),
        twap_window_seconds: msg.twap_window_seconds.unwrap_or(DEFAULT_TWAP_WINDOW_SECONDS),
        default_gas_limit: msg.default_gas_limit.unwrap_or(DEFAULT_GAS_LIMIT),
    };
    execute::validate_core_config(&config)?;

    CONFIG.save(deps.storage, &config)?;
    LOTTERY_CONFIG.save(deps.storage, &msg.lottery)?;
    STATS.save(
        deps.storage,
        &LotteryStats {
            next_request_id: 1,
            next_broadcast_id: 1,
            total_entries: 0,
            dropped_entries: 0,
            total_wins: 0,
            total_losses: 0,
            total_payouts: 0,
            total_paid_amount: Uint128::zero(),
        },
    )?;

    for caller in &msg.entry_callers {
        let addr = deps.api.addr_validate(caller)?;
        ENTRY_CALLERS.save(deps.storage, &addr, &())?;
    }

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "jackpot-lottery")
        .add_attribute("local_chain_id", config.local_chain_id.to_string())
        .add_attribute("hub_chain_id", config.hub_chain_id.to_string())
        .add_attribute("admin", info.sender.to_string()))
}

#[entry_point]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::EnterLottery { user, amount } => {
            dispatch::enter_lottery(deps, env, info, user, amount)
        }
        ExecuteMsg::OnRandomness { request_id, words } => {
            fulfill::on_randomness(deps, env, info, request_id, words)
        }
        ExecuteMsg::ReceiveMessage { origin, payload } => {
            fulfill::receive_message(deps, env, info, origin, payload)
        }
        ExecuteMsg::RefreshLocalPrice {} => price::refresh_local_price(deps, env, info),
        ExecuteMsg::RetryBroadcast {
            broadcast_id,
            dst_chain,
        } => broadcast::retry_broadcast(deps, env, info, broadcast_id, dst_chain),
        ExecuteMsg::RetryPayout { payout_id } => settle::retry_payout(deps, env, info, payout_id),
        ExecuteMsg::UpdateLotteryConfig {
            min_swap_usd,
            reward_share_bps,
            active,
            base_win_chance_ppm,
            max_win_chance_ppm,
            usd_multiplier_bps,
        } => execute::update_lottery_config(
            deps,
            env,
            info,
            UpdateLotteryConfigParams {
                min_swap_usd,
                reward_share_bps,
                active,
                base_win_chance_ppm,
                max_win_chance_ppm,
                usd_multiplier_bps,
            },
        ),
        ExecuteMsg::UpdateConfig {
            hub_chain_id,
            randomness_hub_chain_id,
            transport,
            randomness_provider,
            prefer_local_randomness,
            price_oracle,
            boost_source,
            jackpot_reserve,
            jackpot_vault_id,
            fee_denom,
            price_staleness_seconds,
            twap_window_seconds,
            default_gas_limit,
        } => execute::update_config(
            deps,
            env,
            info,
            UpdateConfigParams {
                hub_chain_id,
                randomness_hub_chain_id,
                transport,
                randomness_provider,
                prefer_local_randomness,
                price_oracle,
                boost_source,
                jackpot_reserve,
                jackpot_vault_id,
                fee_denom,
                price_staleness_seconds,
                twap_window_seconds,
                default_gas_limit,
            },
        ),
        ExecuteMsg::SetPeer {
            chain_id,
            address,
            gas_limit,
        } => execute::set_peer(deps, env, info, chain_id, address, gas_limit),
        ExecuteMsg::RemovePeer { chain_id } => execute::remove_peer(deps, env, info, chain_id),
        ExecuteMsg::UpdateEntryCallers { add, remove } => {
            execute::update_entry_callers(deps, env, info, add, remove)
        }
    }
}

#[entry_point]
pub fn reply(deps: DepsMut, env: Env, msg: Reply) -> Result<Response, ContractError> {
    reply::handle_reply(deps, env, msg)
}

#[entry_point]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::LotteryConfig {} => query::query_lottery_config(deps),
        QueryMsg::Stats {} => query::query_stats(deps),
        QueryMsg::WinChance { user, usd_value } => query::query_win_chance(deps, user, usd_value),
        QueryMsg::PendingRequest { id } => query::query_pending_request(deps, id),
        QueryMsg::PendingRequests { start_after, limit } => {
            query::query_pending_requests(deps, start_after, limit)
        }
        QueryMsg::AggregatedPrice {} => query::query_aggregated_price(deps, env),
        QueryMsg::PriceObservations {} => query::query_price_observations(deps),
        QueryMsg::ReferencePrice {} => query::query_reference_price(deps),
        QueryMsg::Peers {} => query::query_peers(deps),
        QueryMsg::Broadcast { broadcast_id } => query::query_broadcast(deps, broadcast_id),
        QueryMsg::PendingBroadcasts { start_after, limit } => {
            query::query_pending_broadcasts(deps, start_after, limit)
        }
        QueryMsg::PaidWin { win_id } => query::query_paid_win(deps, win_id),
        QueryMsg::PendingPayouts { start_after, limit } => {
            query::query_pending_payouts(deps, start_after, limit)
        }
        QueryMsg::IsEntryCaller { address } => query::query_is_entry_caller(deps, address),
    }
}

#[entry_point]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::Unauthorized {
            reason: "Cannot migrate from different contract type".to_string(),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
