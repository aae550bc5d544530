use cosmwasm_schema::cw_serde;
use cosmwasm_std::{from_json, DepsMut, Env, Event, Reply, Response, SubMsgResult, Uint128};

use crate::broadcast::mark_pending;
use crate::error::ContractError;
use crate::settle::{pay_local_share, payout_failed};
use crate::state::{PendingReason, CONFIG, PENDING_REQUESTS, STATS};

pub const REPLY_LOCAL_RANDOMNESS: u64 = 1;
pub const REPLY_RANDOMNESS_REQUEST: u64 = 2;
pub const REPLY_RANDOMNESS_RESPONSE: u64 = 3;
pub const REPLY_HUB_NOTIFY: u64 = 4;
pub const REPLY_FANOUT: u64 = 5;
pub const REPLY_PAYOUT: u64 = 6;

/// Context carried on every outbound submessage so a failure can be handled
/// without any extra bookkeeping.
#[cw_serde]
pub enum ReplyPayload {
    LocalRandomness {
        request_id: u64,
    },
    RandomnessRequest {
        sequence: u64,
    },
    RandomnessResponse {
        src_chain: u32,
        sequence: u64,
    },
    HubNotify {
        winner: String,
        share_bps: u16,
        win_id: String,
    },
    FanOut {
        broadcast_id: u64,
        dst_chain: u32,
    },
    Payout {
        winner: String,
        share_bps: u16,
        win_id: Option<String>,
        amount: Uint128,
    },
}

/// Only failures are routed here; successful sends need no follow-up.
pub fn handle_reply(deps: DepsMut, env: Env, msg: Reply) -> Result<Response, ContractError> {
    let error = match msg.result {
        SubMsgResult::Err(err) => err,
        SubMsgResult::Ok(_) => return Ok(Response::new()),
    };
    let payload: ReplyPayload = from_json(&msg.payload)?;

    match (msg.id, payload) {
        (REPLY_LOCAL_RANDOMNESS, ReplyPayload::LocalRandomness { request_id })
        | (REPLY_RANDOMNESS_REQUEST, ReplyPayload::RandomnessRequest { sequence: request_id }) => {
            drop_request(deps, request_id, error)
        }
        (REPLY_RANDOMNESS_RESPONSE, ReplyPayload::RandomnessResponse { src_chain, sequence }) => {
            Ok(Response::new()
                .add_attribute("action", "randomness_response_failed")
                .add_event(
                    Event::new("jackpot_randomness_response_failed")
                        .add_attribute("dst_chain", src_chain.to_string())
                        .add_attribute("sequence", sequence.to_string())
                        .add_attribute("error", error),
                ))
        }
        (
            REPLY_HUB_NOTIFY,
            ReplyPayload::HubNotify {
                winner,
                share_bps,
                win_id,
            },
        ) => {
            let config = CONFIG.load(deps.storage)?;
            let response = Response::new()
                .add_attribute("action", "hub_notify_failed")
                .add_event(
                    Event::new("jackpot_degraded_payout")
                        .add_attribute("winner", winner.clone())
                        .add_attribute("win_id", win_id.clone())
                        .add_attribute("reason", "send_failed")
                        .add_attribute("error", error),
                );
            pay_local_share(
                deps.storage,
                &deps.querier,
                &env,
                &config,
                &winner,
                share_bps,
                Some(&win_id),
                response,
            )
        }
        (
            REPLY_FANOUT,
            ReplyPayload::FanOut {
                broadcast_id,
                dst_chain,
            },
        ) => {
            let event = mark_pending(
                deps.storage,
                &env,
                broadcast_id,
                dst_chain,
                PendingReason::SendFailed,
                Default::default(),
                Default::default(),
            )?;
            Ok(Response::new()
                .add_attribute("action", "broadcast_send_failed")
                .add_event(event.add_attribute("error", error)))
        }
        (
            REPLY_PAYOUT,
            ReplyPayload::Payout {
                winner,
                share_bps,
                win_id,
                amount,
            },
        ) => payout_failed(
            deps.storage,
            &env,
            &winner,
            share_bps,
            win_id.as_deref(),
            amount,
            error,
        ),
        (id, _) => Err(ContractError::UnknownReplyId { id }),
    }
}

fn drop_request(deps: DepsMut, request_id: u64, error: String) -> Result<Response, ContractError> {
    let existed = PENDING_REQUESTS.has(deps.storage, request_id);
    PENDING_REQUESTS.remove(deps.storage, request_id);
    if existed {
        let mut stats = STATS.load(deps.storage)?;
        stats.dropped_entries += 1;
        STATS.save(deps.storage, &stats)?;
    }

    Ok(Response::new()
        .add_attribute("action", "randomness_request_failed")
        .add_event(
            Event::new("jackpot_entry_dropped")
                .add_attribute("request_id", request_id.to_string())
                .add_attribute("reason", "request_send_failed")
                .add_attribute("error", error),
        ))
}
