use cosmwasm_std::{
    to_json_binary, Addr, DepsMut, Env, Event, MessageInfo, QuerierWrapper, Response, StdResult,
    Storage, SubMsg, Uint128, WasmMsg,
};
use jackpot_common::interfaces::{ReserveExecuteMsg, ReserveQueryMsg, ReserveResponse};
use jackpot_common::{compute_win_id, encode_packet, LotteryPacket, PriceReading, WinnerMsgType};

use crate::broadcast::{all_destinations, fan_out, new_broadcast};
use crate::error::ContractError;
use crate::price::{fetch_local_price, observation_event, record_observation};
use crate::reply::{ReplyPayload, REPLY_HUB_NOTIFY, REPLY_PAYOUT};
use crate::state::{
    ChainPriceObservation, CoreConfig, PaidWin, PayoutFailure, PendingPayout, CONFIG,
    LOTTERY_CONFIG, NEXT_PAYOUT_ID, PAID_WINS, PENDING_PAYOUTS, PENDING_PAYOUT_WINS,
    REFERENCE_PRICE, STATS,
};
use crate::transport::{admit, FeeBudget, Rejection};

const BPS_DENOMINATOR: u128 = 10_000;

/// Pay `share_bps` of this chain's own reserve to `winner`.
///
/// A win id that was already paid (or is waiting for a retry) on this chain is
/// skipped, so a chain never pays the same win twice however many copies of it
/// arrive. An unreachable reserve queues the payout instead of failing the call.
#[allow(clippy::too_many_arguments)]
pub fn pay_local_share(
    storage: &mut dyn Storage,
    querier: &QuerierWrapper,
    env: &Env,
    config: &CoreConfig,
    winner: &str,
    share_bps: u16,
    win_id: Option<&str>,
    response: Response,
) -> Result<Response, ContractError> {
    if let Some(id) = win_id {
        let reason = if PAID_WINS.has(storage, id) {
            Some("already_paid")
        } else if PENDING_PAYOUT_WINS.has(storage, id) {
            Some("payout_pending")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Ok(response.add_event(
                Event::new("jackpot_payout_skipped")
                    .add_attribute("winner", winner)
                    .add_attribute("win_id", id)
                    .add_attribute("reason", reason),
            ));
        }
    }

    let reserve = match query_reserve(querier, config) {
        Ok(reserve) => reserve,
        Err(err) => {
            let event = defer_payout(
                storage,
                env,
                winner,
                share_bps,
                win_id,
                PayoutFailure::ReserveUnavailable,
                err.to_string(),
            )?;
            return Ok(response.add_event(event));
        }
    };

    make_payout(
        storage, env, config, winner, share_bps, win_id, reserve, response,
    )
}

fn query_reserve(querier: &QuerierWrapper, config: &CoreConfig) -> StdResult<Uint128> {
    let reserve: ReserveResponse = querier.query_wasm_smart(
        &config.jackpot_reserve,
        &ReserveQueryMsg::Reserve {
            vault_id: config.jackpot_vault_id,
        },
    )?;
    Ok(reserve.amount)
}

#[allow(clippy::too_many_arguments)]
fn make_payout(
    storage: &mut dyn Storage,
    env: &Env,
    config: &CoreConfig,
    winner: &str,
    share_bps: u16,
    win_id: Option<&str>,
    reserve: Uint128,
    response: Response,
) -> Result<Response, ContractError> {
    let share = (share_bps as u128).min(BPS_DENOMINATOR);
    let amount = reserve.multiply_ratio(share, BPS_DENOMINATOR);

    if let Some(id) = win_id {
        PAID_WINS.save(
            storage,
            id,
            &PaidWin {
                win_id: id.to_string(),
                winner: winner.to_string(),
                amount,
                paid_at: env.block.time,
            },
        )?;
    }

    let mut stats = STATS.load(storage)?;
    stats.total_payouts += 1;
    stats.total_paid_amount = stats.total_paid_amount.saturating_add(amount);
    STATS.save(storage, &stats)?;

    let event = Event::new("jackpot_payout")
        .add_attribute("chain_id", config.local_chain_id.to_string())
        .add_attribute("winner", winner)
        .add_attribute("win_id", win_id.unwrap_or(""))
        .add_attribute("share_bps", share.to_string())
        .add_attribute("reserve", reserve.to_string())
        .add_attribute("amount", amount.to_string());

    if amount.is_zero() {
        return Ok(response.add_event(event));
    }

    let payout = WasmMsg::Execute {
        contract_addr: config.jackpot_reserve.to_string(),
        msg: to_json_binary(&ReserveExecuteMsg::PayOut {
            vault_id: config.jackpot_vault_id,
            recipient: winner.to_string(),
            amount,
        })?,
        funds: vec![],
    };
    let submsg = SubMsg::reply_on_error(payout, REPLY_PAYOUT).with_payload(to_json_binary(
        &ReplyPayload::Payout {
            winner: winner.to_string(),
            share_bps,
            win_id: win_id.map(str::to_string),
            amount,
        },
    )?);

    Ok(response.add_submessage(submsg).add_event(event))
}

/// Queue a payout for `RetryPayout` and describe it.
fn defer_payout(
    storage: &mut dyn Storage,
    env: &Env,
    winner: &str,
    share_bps: u16,
    win_id: Option<&str>,
    reason: PayoutFailure,
    error: String,
) -> StdResult<Event> {
    let id = NEXT_PAYOUT_ID.may_load(storage)?.unwrap_or(1);
    NEXT_PAYOUT_ID.save(storage, &(id + 1))?;

    let event = Event::new("jackpot_payout_pending")
        .add_attribute("payout_id", id.to_string())
        .add_attribute("winner", winner)
        .add_attribute("win_id", win_id.unwrap_or(""))
        .add_attribute("reason", reason.as_str())
        .add_attribute("error", error.clone());

    if let Some(win) = win_id {
        PENDING_PAYOUT_WINS.save(storage, win, &id)?;
    }
    PENDING_PAYOUTS.save(
        storage,
        id,
        &PendingPayout {
            id,
            winner: winner.to_string(),
            share_bps,
            win_id: win_id.map(str::to_string),
            reason,
            error,
            created_at: env.block.time,
        },
    )?;
    Ok(event)
}

/// The reserve rejected a `PayOut`: undo its bookkeeping and queue a retry.
pub fn payout_failed(
    storage: &mut dyn Storage,
    env: &Env,
    winner: &str,
    share_bps: u16,
    win_id: Option<&str>,
    amount: Uint128,
    error: String,
) -> Result<Response, ContractError> {
    if let Some(id) = win_id {
        PAID_WINS.remove(storage, id);
    }
    let mut stats = STATS.load(storage)?;
    stats.total_payouts = stats.total_payouts.saturating_sub(1);
    stats.total_paid_amount = stats.total_paid_amount.saturating_sub(amount);
    STATS.save(storage, &stats)?;

    let event = defer_payout(
        storage,
        env,
        winner,
        share_bps,
        win_id,
        PayoutFailure::PayOutFailed,
        error,
    )?;
    Ok(Response::new()
        .add_attribute("action", "payout_failed")
        .add_event(event))
}

/// Pay a queued payout. Fails, leaving it queued, while the reserve is still
/// unreachable.
pub fn retry_payout(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
    payout_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let pending = PENDING_PAYOUTS
        .may_load(deps.storage, payout_id)?
        .ok_or(ContractError::PayoutNotFound { payout_id })?;
    let reserve = query_reserve(&deps.querier, &config)?;

    PENDING_PAYOUTS.remove(deps.storage, payout_id);
    if let Some(id) = pending.win_id.as_deref() {
        PENDING_PAYOUT_WINS.remove(deps.storage, id);
    }

    let response = Response::new()
        .add_attribute("action", "retry_payout")
        .add_attribute("payout_id", payout_id.to_string());
    make_payout(
        deps.storage,
        &env,
        &config,
        &pending.winner,
        pending.share_bps,
        pending.win_id.as_deref(),
        reserve,
        response,
    )
}

/// Route a win that this chain's own fulfillment produced.
///
/// The hub pays locally and fans out. A spoke only asks the hub to do that,
/// and pays locally itself when the hub cannot be reached.
pub fn settle_discovered_win(
    storage: &mut dyn Storage,
    querier: &QuerierWrapper,
    env: &Env,
    config: &CoreConfig,
    request_id: u64,
    winner: &Addr,
    response: Response,
) -> Result<Response, ContractError> {
    let lottery = LOTTERY_CONFIG.load(storage)?;
    let win_id = compute_win_id(config.local_chain_id, request_id, winner.as_str());

    if config.is_hub() {
        return settle_on_hub(
            storage,
            querier,
            env,
            config,
            winner.as_str(),
            lottery.reward_share_bps,
            Some(win_id),
            response,
        );
    }

    notify_hub(
        storage,
        querier,
        env,
        config,
        winner.as_str(),
        lottery.reward_share_bps,
        win_id,
        response,
    )
}

/// Hub settlement: local share first, then every other chain.
#[allow(clippy::too_many_arguments)]
pub fn settle_on_hub(
    storage: &mut dyn Storage,
    querier: &QuerierWrapper,
    env: &Env,
    config: &CoreConfig,
    winner: &str,
    share_bps: u16,
    win_id: Option<String>,
    response: Response,
) -> Result<Response, ContractError> {
    // A redelivered notification must not trigger a second fan-out either
    if let Some(id) = win_id.as_deref() {
        if PAID_WINS.has(storage, id) || PENDING_PAYOUT_WINS.has(storage, id) {
            return Ok(response.add_event(
                Event::new("jackpot_payout_skipped")
                    .add_attribute("winner", winner)
                    .add_attribute("win_id", id)
                    .add_attribute("reason", "already_settled"),
            ));
        }
    }

    let response = pay_local_share(
        storage,
        querier,
        env,
        config,
        winner,
        share_bps,
        win_id.as_deref(),
        response,
    )?;

    let broadcast = new_broadcast(storage, env, winner, share_bps, win_id)?;
    let destinations = all_destinations(storage, config)?;
    fan_out(storage, querier, env, config, &broadcast, &destinations, response)
}

#[allow(clippy::too_many_arguments)]
fn notify_hub(
    storage: &mut dyn Storage,
    querier: &QuerierWrapper,
    env: &Env,
    config: &CoreConfig,
    winner: &str,
    share_bps: u16,
    win_id: String,
    mut response: Response,
) -> Result<Response, ContractError> {
    let now = env.block.time.seconds();

    // Piggyback a fresh local reading for the hub's price table
    let price = fetch_local_price(querier, config, now);
    if let Some(reading) = &price {
        let observation = record_observation(storage, config.local_chain_id, reading, now)?;
        response = response.add_event(observation_event(&observation));
    }

    let payload = encode_packet(&LotteryPacket::Winner {
        msg_type: WinnerMsgType::NotifyHub,
        winner: winner.to_string(),
        share_bps,
        win_id: Some(win_id.clone()),
        price,
    })?;

    let mut budget = FeeBudget::load(querier, env, config);
    let admitted = admit(
        storage,
        querier,
        config,
        &mut budget,
        config.hub_chain_id,
        &payload,
        REPLY_HUB_NOTIFY,
        &ReplyPayload::HubNotify {
            winner: winner.to_string(),
            share_bps,
            win_id: win_id.clone(),
        },
    )?;

    match admitted {
        Ok(admitted) => Ok(response.add_submessage(admitted.submsg).add_event(
            Event::new("jackpot_hub_notified")
                .add_attribute("hub_chain_id", config.hub_chain_id.to_string())
                .add_attribute("winner", winner)
                .add_attribute("win_id", win_id)
                .add_attribute("fee", admitted.fee.to_string()),
        )),
        Err(rejection) => {
            let mut event = Event::new("jackpot_degraded_payout")
                .add_attribute("winner", winner)
                .add_attribute("win_id", win_id.clone())
                .add_attribute("reason", rejection.reason());
            if let Rejection::InsufficientFee {
                required,
                available,
            } = &rejection
            {
                event = event
                    .add_attribute("required_fee", required.to_string())
                    .add_attribute("available_fee", available.to_string());
            }
            pay_local_share(
                storage,
                querier,
                env,
                config,
                winner,
                share_bps,
                Some(&win_id),
                response.add_event(event),
            )
        }
    }
}

/// Inbound winner message from a trusted peer.
#[allow(clippy::too_many_arguments)]
pub fn receive_winner(
    storage: &mut dyn Storage,
    querier: &QuerierWrapper,
    env: &Env,
    config: &CoreConfig,
    src_chain: u32,
    msg_type: WinnerMsgType,
    winner: String,
    share_bps: u16,
    win_id: Option<String>,
    price: Option<PriceReading>,
    mut response: Response,
) -> Result<Response, ContractError> {
    let now = env.block.time.seconds();

    match msg_type {
        WinnerMsgType::NotifyHub => {
            if !config.is_hub() {
                return Err(ContractError::InvalidMessageType {
                    msg_type: "notify_hub".to_string(),
                    reason: "only the hub accepts win notifications".to_string(),
                });
            }
            if let Some(reading) = price.filter(|r| r.is_available()) {
                let observation = record_observation(storage, src_chain, &reading, now)?;
                response = response.add_event(observation_event(&observation));
            }
            settle_on_hub(
                storage, querier, env, config, &winner, share_bps, win_id, response,
            )
        }
        WinnerMsgType::Broadcast => {
            if let Some(reading) = price.filter(|r| r.is_available()) {
                REFERENCE_PRICE.save(
                    storage,
                    &ChainPriceObservation {
                        chain_id: src_chain,
                        price: reading.price,
                        observed_at: reading.observed_at,
                        received_at: now,
                    },
                )?;
            }
            pay_local_share(
                storage,
                querier,
                env,
                config,
                &winner,
                share_bps,
                win_id.as_deref(),
                response,
            )
        }
    }
}
