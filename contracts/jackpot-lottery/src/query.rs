use cosmwasm_std::{to_json_binary, Binary, Deps, Env, Order, StdResult, Uint128};
use cw_storage_plus::Bound;

use crate::msg::{
    PeerInfo, PeersResponse, PendingBroadcastsResponse, PendingPayoutsResponse,
    PendingRequestsResponse, PriceObservationsResponse, WinChanceResponse,
};
use crate::odds::{base_win_chance, win_chance};
use crate::price::aggregated_price;
use crate::state::{
    BROADCASTS, CONFIG, ENTRY_CALLERS, LOTTERY_CONFIG, PAID_WINS, PEERS, PENDING_BROADCASTS,
    PENDING_PAYOUTS, PENDING_REQUESTS, PRICE_OBSERVATIONS, REFERENCE_PRICE, STATS,
};

const DEFAULT_LIMIT: u32 = 30;
const MAX_LIMIT: u32 = 100;

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    to_json_binary(&CONFIG.load(deps.storage)?)
}

pub fn query_lottery_config(deps: Deps) -> StdResult<Binary> {
    to_json_binary(&LOTTERY_CONFIG.load(deps.storage)?)
}

pub fn query_stats(deps: Deps) -> StdResult<Binary> {
    to_json_binary(&STATS.load(deps.storage)?)
}

/// Odds for a hypothetical entry, after the USD multiplier and boosts.
pub fn query_win_chance(deps: Deps, user: String, usd_value: Uint128) -> StdResult<Binary> {
    let user = deps.api.addr_validate(&user)?;
    let config = CONFIG.load(deps.storage)?;
    let lottery = LOTTERY_CONFIG.load(deps.storage)?;

    let adjusted = usd_value
        .checked_multiply_ratio(lottery.usd_multiplier_bps as u128, 10_000u128)
        .unwrap_or(Uint128::MAX);
    let base_chance_ppm = base_win_chance(&lottery, adjusted);
    let win_chance_ppm = win_chance(
        &deps.querier,
        &lottery,
        config.boost_source.as_ref(),
        &user,
        adjusted,
    );

    to_json_binary(&WinChanceResponse {
        usd_value: adjusted,
        base_chance_ppm,
        win_chance_ppm,
    })
}

pub fn query_pending_request(deps: Deps, id: u64) -> StdResult<Binary> {
    to_json_binary(&PENDING_REQUESTS.may_load(deps.storage, id)?)
}

pub fn query_pending_requests(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    let requests = PENDING_REQUESTS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|r| r.map(|(_, request)| request))
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&PendingRequestsResponse { requests })
}

pub fn query_aggregated_price(deps: Deps, env: Env) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&aggregated_price(
        deps.storage,
        env.block.time.seconds(),
        config.price_staleness_seconds,
    )?)
}

pub fn query_price_observations(deps: Deps) -> StdResult<Binary> {
    let observations = PRICE_OBSERVATIONS
        .range(deps.storage, None, None, Order::Ascending)
        .map(|r| r.map(|(_, obs)| obs))
        .collect::<StdResult<Vec<_>>>()?;
    to_json_binary(&PriceObservationsResponse { observations })
}

pub fn query_reference_price(deps: Deps) -> StdResult<Binary> {
    to_json_binary(&REFERENCE_PRICE.may_load(deps.storage)?)
}

pub fn query_peers(deps: Deps) -> StdResult<Binary> {
    let peers = PEERS
        .range(deps.storage, None, None, Order::Ascending)
        .map(|r| {
            r.map(|(chain_id, peer)| PeerInfo {
                chain_id,
                address: peer.address,
                gas_limit: peer.gas_limit,
            })
        })
        .collect::<StdResult<Vec<_>>>()?;
    to_json_binary(&PeersResponse { peers })
}

pub fn query_broadcast(deps: Deps, broadcast_id: u64) -> StdResult<Binary> {
    to_json_binary(&BROADCASTS.may_load(deps.storage, broadcast_id)?)
}

pub fn query_pending_broadcasts(
    deps: Deps,
    start_after: Option<(u64, u32)>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    let pending = PENDING_BROADCASTS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|r| r.map(|(_, marker)| marker))
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&PendingBroadcastsResponse { pending })
}

pub fn query_paid_win(deps: Deps, win_id: String) -> StdResult<Binary> {
    to_json_binary(&PAID_WINS.may_load(deps.storage, &win_id)?)
}

pub fn query_pending_payouts(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    let payouts = PENDING_PAYOUTS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|r| r.map(|(_, payout)| payout))
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&PendingPayoutsResponse { payouts })
}

pub fn query_is_entry_caller(deps: Deps, address: String) -> StdResult<Binary> {
    let addr = deps.api.addr_validate(&address)?;
    to_json_binary(&ENTRY_CALLERS.has(deps.storage, &addr))
}
