use cosmwasm_std::{
    DepsMut, Env, Event, MessageInfo, Order, QuerierWrapper, Response, StdResult, Storage, Uint128,
};
use jackpot_common::{encode_packet, LotteryPacket, WinnerMsgType};

use crate::error::ContractError;
use crate::price::aggregated_price;
use crate::reply::{ReplyPayload, REPLY_FANOUT};
use crate::state::{
    BroadcastRecord, CoreConfig, PendingBroadcast, PendingReason, BROADCASTS, CONFIG, PEERS,
    PENDING_BROADCASTS, STATS,
};
use crate::transport::{admit, FeeBudget, Rejection};

/// Every registered chain other than this one.
pub fn all_destinations(storage: &dyn Storage, config: &CoreConfig) -> StdResult<Vec<u32>> {
    PEERS
        .keys(storage, None, None, Order::Ascending)
        .filter(|k| !matches!(k, Ok(chain_id) if *chain_id == config.local_chain_id))
        .collect()
}

pub fn new_broadcast(
    storage: &mut dyn Storage,
    env: &Env,
    winner: &str,
    share_bps: u16,
    win_id: Option<String>,
) -> StdResult<BroadcastRecord> {
    let mut stats = STATS.load(storage)?;
    let id = stats.next_broadcast_id;
    stats.next_broadcast_id += 1;
    STATS.save(storage, &stats)?;

    let record = BroadcastRecord {
        id,
        winner: winner.to_string(),
        share_bps,
        win_id,
        created_at: env.block.time,
    };
    BROADCASTS.save(storage, id, &record)?;
    Ok(record)
}

pub fn mark_pending(
    storage: &mut dyn Storage,
    env: &Env,
    broadcast_id: u64,
    dst_chain: u32,
    reason: PendingReason,
    required_fee: Uint128,
    available_fee: Uint128,
) -> StdResult<Event> {
    let marker = PendingBroadcast {
        broadcast_id,
        dst_chain,
        reason: reason.clone(),
        required_fee,
        available_fee,
        marked_at: env.block.time,
    };
    PENDING_BROADCASTS.save(storage, (broadcast_id, dst_chain), &marker)?;

    let reason_str = match reason {
        PendingReason::Unroutable => "unroutable",
        PendingReason::QuoteFailed => "quote_failed",
        PendingReason::InsufficientFee => "insufficient_fee",
        PendingReason::SendFailed => "send_failed",
    };
    Ok(Event::new("jackpot_broadcast_pending")
        .add_attribute("broadcast_id", broadcast_id.to_string())
        .add_attribute("dst_chain", dst_chain.to_string())
        .add_attribute("reason", reason_str)
        .add_attribute("required_fee", required_fee.to_string())
        .add_attribute("available_fee", available_fee.to_string()))
}

/// Send `broadcast` to each destination independently.
///
/// A destination that can't be quoted or paid for is marked pending and the
/// loop moves on; one bad destination never blocks the rest.
pub fn fan_out(
    storage: &mut dyn Storage,
    querier: &QuerierWrapper,
    env: &Env,
    config: &CoreConfig,
    broadcast: &BroadcastRecord,
    destinations: &[u32],
    mut response: Response,
) -> Result<Response, ContractError> {
    let price = aggregated_price(storage, env.block.time.seconds(), config.price_staleness_seconds)?;
    let payload = encode_packet(&LotteryPacket::Winner {
        msg_type: WinnerMsgType::Broadcast,
        winner: broadcast.winner.clone(),
        share_bps: broadcast.share_bps,
        win_id: broadcast.win_id.clone(),
        price: price.is_available().then(|| price.clone()),
    })?;

    let mut budget = FeeBudget::load(querier, env, config);
    let mut sent = 0u32;

    for &dst_chain in destinations {
        let admitted = admit(
            storage,
            querier,
            config,
            &mut budget,
            dst_chain,
            &payload,
            REPLY_FANOUT,
            &ReplyPayload::FanOut {
                broadcast_id: broadcast.id,
                dst_chain,
            },
        )?;

        match admitted {
            Ok(admitted) => {
                PENDING_BROADCASTS.remove(storage, (broadcast.id, dst_chain));
                sent += 1;
                response = response.add_submessage(admitted.submsg).add_event(
                    Event::new("jackpot_broadcast_sent")
                        .add_attribute("broadcast_id", broadcast.id.to_string())
                        .add_attribute("dst_chain", dst_chain.to_string())
                        .add_attribute("fee", admitted.fee.to_string()),
                );
            }
            Err(rejection) => {
                let (reason, required, available) = match rejection {
                    Rejection::NoTransport | Rejection::UnknownPeer => {
                        (PendingReason::Unroutable, Uint128::zero(), budget.available)
                    }
                    Rejection::QuoteFailed(_) => {
                        (PendingReason::QuoteFailed, Uint128::zero(), budget.available)
                    }
                    Rejection::InsufficientFee {
                        required,
                        available,
                    } => (PendingReason::InsufficientFee, required, available),
                };
                let event = mark_pending(
                    storage,
                    env,
                    broadcast.id,
                    dst_chain,
                    reason,
                    required,
                    available,
                )?;
                response = response.add_event(event);
            }
        }
    }

    Ok(response.add_event(
        Event::new("jackpot_broadcast")
            .add_attribute("broadcast_id", broadcast.id.to_string())
            .add_attribute("winner", broadcast.winner.clone())
            .add_attribute("share_bps", broadcast.share_bps.to_string())
            .add_attribute("destinations", destinations.len().to_string())
            .add_attribute("sent", sent.to_string())
            .add_attribute("aggregated_price", price.price.to_string()),
    ))
}

/// Re-run admission for destinations of `broadcast_id` that are still pending.
/// Anyone can call; funds sent along top up the fee budget.
pub fn retry_broadcast(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
    broadcast_id: u64,
    dst_chain: Option<u32>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let broadcast = BROADCASTS
        .may_load(deps.storage, broadcast_id)?
        .ok_or(ContractError::BroadcastNotFound { broadcast_id })?;

    let destinations: Vec<u32> = PENDING_BROADCASTS
        .prefix(broadcast_id)
        .keys(deps.storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<u32>>>()?
        .into_iter()
        .filter(|chain| dst_chain.map_or(true, |wanted| wanted == *chain))
        .collect();

    if destinations.is_empty() {
        return Err(ContractError::NoPendingBroadcast { broadcast_id });
    }

    let response = Response::new()
        .add_attribute("action", "retry_broadcast")
        .add_attribute("broadcast_id", broadcast_id.to_string());

    fan_out(
        deps.storage,
        &deps.querier,
        &env,
        &config,
        &broadcast,
        &destinations,
        response,
    )
}
