use cosmwasm_std::{
    Deps, DepsMut, Env, Event, MessageInfo, Order, QuerierWrapper, Response, StdResult, Storage,
    Uint128,
};
use jackpot_common::interfaces::{PriceOracleQueryMsg, TwapResponse};
use jackpot_common::PriceReading;

use crate::error::ContractError;
use crate::state::{ChainPriceObservation, CoreConfig, CONFIG, PRICE_OBSERVATIONS, REFERENCE_PRICE};

/// Upsert the observation reported by `chain_id`. `received_at` is always the
/// local block time.
pub fn record_observation(
    storage: &mut dyn Storage,
    chain_id: u32,
    reading: &PriceReading,
    received_at: u64,
) -> StdResult<ChainPriceObservation> {
    let observation = ChainPriceObservation {
        chain_id,
        price: reading.price,
        observed_at: reading.observed_at,
        received_at,
    };
    PRICE_OBSERVATIONS.save(storage, chain_id, &observation)?;
    Ok(observation)
}

/// Average of every observation received within the staleness window.
///
/// Returns the `(0, 0)` sentinel when nothing qualifies. The reported
/// `observed_at` is the oldest observation that went into the average.
pub fn aggregated_price(
    storage: &dyn Storage,
    now: u64,
    staleness_seconds: u64,
) -> StdResult<PriceReading> {
    let observations = PRICE_OBSERVATIONS
        .range(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;

    let mut sum = Uint128::zero();
    let mut count = 0u128;
    let mut oldest = u64::MAX;

    for (_, observation) in observations {
        if observation.price.is_zero() || is_stale(observation.received_at, now, staleness_seconds)
        {
            continue;
        }
        sum = sum.saturating_add(observation.price);
        count += 1;
        oldest = oldest.min(observation.observed_at);
    }

    if count == 0 {
        return Ok(PriceReading::unavailable());
    }

    Ok(PriceReading {
        price: sum.multiply_ratio(1u128, count),
        observed_at: oldest,
    })
}

fn is_stale(timestamp: u64, now: u64, staleness_seconds: u64) -> bool {
    now.saturating_sub(timestamp) > staleness_seconds
}

/// Best-effort local price: primary (if fresh), then secondary, then TWAP.
pub fn fetch_local_price(
    querier: &QuerierWrapper,
    config: &CoreConfig,
    now: u64,
) -> Option<PriceReading> {
    let oracle = config.price_oracle.as_ref()?;

    let primary = querier
        .query_wasm_smart::<PriceReading>(oracle, &PriceOracleQueryMsg::PrimaryPrice {})
        .ok()
        .filter(|r| {
            r.is_available() && !is_stale(r.observed_at, now, config.price_staleness_seconds)
        });
    if primary.is_some() {
        return primary;
    }

    let secondary = querier
        .query_wasm_smart::<PriceReading>(oracle, &PriceOracleQueryMsg::SecondaryPrice {})
        .ok()
        .filter(|r| r.is_available());
    if secondary.is_some() {
        return secondary;
    }

    querier
        .query_wasm_smart::<TwapResponse>(
            oracle,
            &PriceOracleQueryMsg::Twap {
                duration_seconds: config.twap_window_seconds,
            },
        )
        .ok()
        .filter(|r| !r.price.is_zero())
        .map(|r| PriceReading {
            price: r.price,
            observed_at: now,
        })
}

/// Price used to value token-denominated entries: the local oracle, falling
/// back to the last fresh reference price pushed by the hub.
pub fn valuation_price(deps: Deps, config: &CoreConfig, now: u64) -> Option<PriceReading> {
    if let Some(reading) = fetch_local_price(&deps.querier, config, now) {
        return Some(reading);
    }
    REFERENCE_PRICE
        .may_load(deps.storage)
        .ok()
        .flatten()
        .filter(|r| !r.price.is_zero())
        .filter(|r| !is_stale(r.received_at, now, config.price_staleness_seconds))
        .map(|r| PriceReading {
            price: r.price,
            observed_at: r.observed_at,
        })
}

/// `token_amount * price / 10^decimals`, 6-decimal USD. Saturates at `Uint128::MAX`.
pub fn token_value_usd(token_amount: Uint128, price: Uint128, token_decimals: u8) -> Uint128 {
    let scale = 10u128.checked_pow(token_decimals as u32).unwrap_or(u128::MAX);
    token_amount
        .checked_multiply_ratio(price, scale)
        .unwrap_or(Uint128::MAX)
}

/// Refresh this chain's own observation from its oracle. Anyone can call.
pub fn refresh_local_price(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let now = env.block.time.seconds();

    let Some(reading) = fetch_local_price(&deps.querier, &config, now) else {
        return Ok(Response::new()
            .add_attribute("action", "refresh_local_price")
            .add_attribute("updated", "false")
            .add_event(
                Event::new("jackpot_price_unavailable")
                    .add_attribute("chain_id", config.local_chain_id.to_string()),
            ));
    };

    let observation = record_observation(deps.storage, config.local_chain_id, &reading, now)?;

    Ok(Response::new()
        .add_attribute("action", "refresh_local_price")
        .add_attribute("updated", "true")
        .add_event(observation_event(&observation)))
}

pub fn observation_event(observation: &ChainPriceObservation) -> Event {
    Event::new("jackpot_price_observation")
        .add_attribute("chain_id", observation.chain_id.to_string())
        .add_attribute("price", observation.price.to_string())
        .add_attribute("observed_at", observation.observed_at.to_string())
        .add_attribute("received_at", observation.received_at.to_string())
}
