use cosmwasm_std::{
    coins, to_json_binary, Addr, Binary, Env, QuerierWrapper, StdResult, Storage, SubMsg, Uint128,
    WasmMsg,
};
use jackpot_common::interfaces::{QuoteResponse, TransportExecuteMsg, TransportQueryMsg};
use jackpot_common::MessageOptions;

use crate::reply::ReplyPayload;
use crate::state::{CoreConfig, Peer, PEERS};

/// A message that passed admission control and is ready to be sent.
pub struct Admitted {
    pub submsg: SubMsg,
    pub fee: Uint128,
}

/// Why a message could not be admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NoTransport,
    UnknownPeer,
    QuoteFailed(String),
    InsufficientFee { required: Uint128, available: Uint128 },
}

impl Rejection {
    pub fn reason(&self) -> String {
        match self {
            Rejection::NoTransport => "no_transport".to_string(),
            Rejection::UnknownPeer => "unknown_peer".to_string(),
            Rejection::QuoteFailed(_) => "quote_failed".to_string(),
            Rejection::InsufficientFee { .. } => "insufficient_fee".to_string(),
        }
    }
}

/// Messaging fees this call can still spend. Fees attached to messages admitted
/// earlier in the same call are deducted as they are admitted.
pub struct FeeBudget {
    pub available: Uint128,
}

impl FeeBudget {
    /// Contract balance in the fee denom. A failed balance query counts as empty.
    pub fn load(querier: &QuerierWrapper, env: &Env, config: &CoreConfig) -> Self {
        let available = querier
            .query_balance(env.contract.address.to_string(), config.fee_denom.clone())
            .map(|c| c.amount)
            .unwrap_or_default();
        FeeBudget { available }
    }
}

pub fn message_options(config: &CoreConfig, peer: &Peer) -> StdResult<Binary> {
    to_json_binary(&MessageOptions {
        gas_limit: peer.gas_limit.unwrap_or(config.default_gas_limit),
    })
}

pub fn quote(
    querier: &QuerierWrapper,
    transport: &Addr,
    dst_chain: u32,
    payload: &Binary,
    options: &Binary,
) -> StdResult<Uint128> {
    let response: QuoteResponse = querier.query_wasm_smart(
        transport,
        &TransportQueryMsg::Quote {
            dst_chain,
            payload: payload.clone(),
            options: options.clone(),
        },
    )?;
    Ok(response.native_fee)
}

/// Quote a message to `dst_chain`, check it against the budget and, if it fits,
/// build a fire-and-forget send whose failure is reported back via `reply`.
#[allow(clippy::too_many_arguments)]
pub fn admit(
    storage: &dyn Storage,
    querier: &QuerierWrapper,
    config: &CoreConfig,
    budget: &mut FeeBudget,
    dst_chain: u32,
    payload: &Binary,
    reply_id: u64,
    reply_payload: &ReplyPayload,
) -> StdResult<Result<Admitted, Rejection>> {
    let Some(transport) = config.transport.as_ref() else {
        return Ok(Err(Rejection::NoTransport));
    };
    let Some(peer) = PEERS.may_load(storage, dst_chain)? else {
        return Ok(Err(Rejection::UnknownPeer));
    };

    let options = message_options(config, &peer)?;
    let fee = match quote(querier, transport, dst_chain, payload, &options) {
        Ok(fee) => fee,
        Err(e) => return Ok(Err(Rejection::QuoteFailed(e.to_string()))),
    };
    if fee > budget.available {
        return Ok(Err(Rejection::InsufficientFee {
            required: fee,
            available: budget.available,
        }));
    }
    budget.available -= fee;

    let funds = if fee.is_zero() {
        vec![]
    } else {
        coins(fee.u128(), config.fee_denom.clone())
    };
    let send = WasmMsg::Execute {
        contract_addr: transport.to_string(),
        msg: to_json_binary(&TransportExecuteMsg::Send {
            dst_chain,
            receiver: peer.address,
            payload: payload.clone(),
            options,
        })?,
        funds,
    };
    let submsg = SubMsg::reply_on_error(send, reply_id).with_payload(to_json_binary(reply_payload)?);

    Ok(Ok(Admitted { submsg, fee }))
}
