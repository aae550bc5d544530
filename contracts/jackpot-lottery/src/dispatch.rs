use cosmwasm_std::{
    to_json_binary, Addr, DepsMut, Env, Event, MessageInfo, QuerierWrapper, Response, Storage,
    SubMsg, Uint128, Uint256, WasmMsg,
};
use jackpot_common::interfaces::RandomnessProviderExecuteMsg;
use jackpot_common::{encode_packet, LotteryPacket, SourceKind};

use crate::error::ContractError;
use crate::msg::{EntryAmount, EntryResponse};
use crate::odds::win_chance;
use crate::price::{aggregated_price, token_value_usd, valuation_price};
use crate::reply::{
    ReplyPayload, REPLY_LOCAL_RANDOMNESS, REPLY_RANDOMNESS_REQUEST, REPLY_RANDOMNESS_RESPONSE,
};
use crate::state::{
    CoreConfig, LotteryStats, RandomnessRequest, RelayedRequest, CONFIG, ENTRY_CALLERS,
    LOTTERY_CONFIG, PENDING_REQUESTS, RELAYED_REQUESTS, REMOTE_SEQUENCES, STATS,
};
use crate::transport::{admit, FeeBudget};

const BPS_DENOMINATOR: u128 = 10_000;

/// One word per request is all a draw needs.
const WORDS_PER_REQUEST: u8 = 1;

/// Register a qualifying trade and ask for randomness.
///
/// Only errors for an unknown caller or a malformed user address. Anything
/// that goes wrong with lottery infrastructure drops the entry instead, and
/// the response data carries `request_id = 0`.
pub fn enter_lottery(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    user: String,
    amount: EntryAmount,
) -> Result<Response, ContractError> {
    if !ENTRY_CALLERS.has(deps.storage, &info.sender) {
        return Err(ContractError::Unauthorized {
            reason: "only entry callers can submit lottery entries".to_string(),
        });
    }
    let user = deps.api.addr_validate(&user)?;

    let config = CONFIG.load(deps.storage)?;
    let lottery = LOTTERY_CONFIG.load(deps.storage)?;
    let now = env.block.time.seconds();

    if !lottery.active {
        return skip_entry(&user, "inactive");
    }

    let raw_usd = match amount {
        EntryAmount::Usd(usd) => usd,
        EntryAmount::Tokens(tokens) => match valuation_price(deps.as_ref(), &config, now) {
            Some(reading) => token_value_usd(tokens, reading.price, config.token_decimals),
            None => return skip_entry(&user, "price_unavailable"),
        },
    };
    let usd_value = raw_usd
        .checked_multiply_ratio(lottery.usd_multiplier_bps as u128, BPS_DENOMINATOR)
        .unwrap_or(Uint128::MAX);
    if usd_value < lottery.min_swap_usd {
        return skip_entry(&user, "below_minimum");
    }

    let chance = win_chance(
        &deps.querier,
        &lottery,
        config.boost_source.as_ref(),
        &user,
        usd_value,
    );

    let mut stats = STATS.load(deps.storage)?;
    let request_id = stats.next_request_id;

    let local = config
        .randomness_provider
        .as_ref()
        .filter(|_| config.prefer_local_randomness || config.is_randomness_hub());

    let (submsg, source, fee) = match local {
        Some(provider) => {
            let submsg = provider_request(provider, request_id)?;
            (
                SubMsg::reply_on_error(submsg, REPLY_LOCAL_RANDOMNESS).with_payload(
                    to_json_binary(&ReplyPayload::LocalRandomness { request_id })?,
                ),
                SourceKind::Local,
                Uint128::zero(),
            )
        }
        None => {
            let payload = encode_packet(&LotteryPacket::RandomnessRequest {
                sequence: request_id,
            })?;
            let mut budget = FeeBudget::load(&deps.querier, &env, &config);
            let admitted = admit(
                deps.storage,
                &deps.querier,
                &config,
                &mut budget,
                config.randomness_hub_chain_id,
                &payload,
                REPLY_RANDOMNESS_REQUEST,
                &ReplyPayload::RandomnessRequest {
                    sequence: request_id,
                },
            )?;
            match admitted {
                Ok(admitted) => (admitted.submsg, SourceKind::CrossChain, admitted.fee),
                Err(rejection) => {
                    return drop_entry(deps.storage, &mut stats, &user, &rejection.reason())
                }
            }
        }
    };

    stats.next_request_id += 1;
    stats.total_entries += 1;
    STATS.save(deps.storage, &stats)?;

    PENDING_REQUESTS.save(
        deps.storage,
        request_id,
        &RandomnessRequest {
            id: request_id,
            user: user.clone(),
            usd_value,
            source: source.clone(),
            created_at: env.block.time,
        },
    )?;

    let source_str = match source {
        SourceKind::Local => "local",
        SourceKind::CrossChain => "cross_chain",
    };

    Ok(Response::new()
        .add_attribute("action", "enter_lottery")
        .add_attribute("request_id", request_id.to_string())
        .add_submessage(submsg)
        .add_event(
            Event::new("jackpot_entry")
                .add_attribute("request_id", request_id.to_string())
                .add_attribute("user", user.to_string())
                .add_attribute("raw_usd", raw_usd.to_string())
                .add_attribute("usd_value", usd_value.to_string())
                .add_attribute("win_chance_ppm", chance.to_string())
                .add_attribute("source", source_str)
                .add_attribute("fee", fee.to_string()),
        )
        .set_data(to_json_binary(&EntryResponse { request_id })?))
}

fn provider_request(provider: &Addr, request_id: u64) -> Result<WasmMsg, ContractError> {
    Ok(WasmMsg::Execute {
        contract_addr: provider.to_string(),
        msg: to_json_binary(&RandomnessProviderExecuteMsg::RequestRandomness {
            request_id,
            num_words: WORDS_PER_REQUEST,
        })?,
        funds: vec![],
    })
}

/// The trade did not qualify; nothing was recorded.
fn skip_entry(user: &Addr, reason: &str) -> Result<Response, ContractError> {
    Ok(Response::new()
        .add_attribute("action", "enter_lottery")
        .add_attribute("request_id", "0")
        .add_event(
            Event::new("jackpot_entry_skipped")
                .add_attribute("user", user.to_string())
                .add_attribute("reason", reason),
        )
        .set_data(to_json_binary(&EntryResponse { request_id: 0 })?))
}

/// The trade qualified but no randomness request could be sent.
fn drop_entry(
    storage: &mut dyn Storage,
    stats: &mut LotteryStats,
    user: &Addr,
    reason: &str,
) -> Result<Response, ContractError> {
    stats.dropped_entries += 1;
    STATS.save(storage, stats)?;

    Ok(Response::new()
        .add_attribute("action", "enter_lottery")
        .add_attribute("request_id", "0")
        .add_event(
            Event::new("jackpot_entry_dropped")
                .add_attribute("user", user.to_string())
                .add_attribute("request_id", "0")
                .add_attribute("reason", reason),
        )
        .set_data(to_json_binary(&EntryResponse { request_id: 0 })?))
}

/// Randomness hub: serve a request that arrived from `src_chain`.
pub fn relay_randomness_request(
    storage: &mut dyn Storage,
    env: &Env,
    config: &CoreConfig,
    src_chain: u32,
    sequence: u64,
    response: Response,
) -> Result<Response, ContractError> {
    if REMOTE_SEQUENCES.has(storage, (src_chain, sequence)) {
        return Err(ContractError::DuplicateSequence {
            chain_id: src_chain,
            sequence,
        });
    }
    if !config.is_randomness_hub() {
        return Err(ContractError::RandomnessUnavailable {
            reason: "not the randomness hub".to_string(),
        });
    }
    let Some(provider) = config.randomness_provider.as_ref() else {
        return Err(ContractError::RandomnessUnavailable {
            reason: "no randomness provider configured".to_string(),
        });
    };

    // Relayed requests share the local id space so provider callbacks never collide
    let mut stats = STATS.load(storage)?;
    let local_id = stats.next_request_id;
    stats.next_request_id += 1;
    STATS.save(storage, &stats)?;

    REMOTE_SEQUENCES.save(storage, (src_chain, sequence), &local_id)?;
    RELAYED_REQUESTS.save(
        storage,
        local_id,
        &RelayedRequest {
            local_id,
            src_chain,
            sequence,
            received_at: env.block.time,
        },
    )?;

    Ok(response
        .add_message(provider_request(provider, local_id)?)
        .add_event(
            Event::new("jackpot_randomness_relayed")
                .add_attribute("src_chain", src_chain.to_string())
                .add_attribute("sequence", sequence.to_string())
                .add_attribute("local_id", local_id.to_string()),
        ))
}

/// Randomness hub: send the provider's word back to the chain that asked.
pub fn relay_randomness_response(
    storage: &mut dyn Storage,
    querier: &QuerierWrapper,
    env: &Env,
    config: &CoreConfig,
    relayed: RelayedRequest,
    word: Uint256,
    response: Response,
) -> Result<Response, ContractError> {
    RELAYED_REQUESTS.remove(storage, relayed.local_id);

    let price = aggregated_price(storage, env.block.time.seconds(), config.price_staleness_seconds)?;
    let payload = encode_packet(&LotteryPacket::RandomnessResponse {
        sequence: relayed.sequence,
        word,
        price: price.is_available().then_some(price),
    })?;

    let mut budget = FeeBudget::load(querier, env, config);
    let admitted = admit(
        storage,
        querier,
        config,
        &mut budget,
        relayed.src_chain,
        &payload,
        REPLY_RANDOMNESS_RESPONSE,
        &ReplyPayload::RandomnessResponse {
            src_chain: relayed.src_chain,
            sequence: relayed.sequence,
        },
    )?;

    match admitted {
        Ok(admitted) => Ok(response.add_submessage(admitted.submsg).add_event(
            Event::new("jackpot_randomness_response_sent")
                .add_attribute("dst_chain", relayed.src_chain.to_string())
                .add_attribute("sequence", relayed.sequence.to_string())
                .add_attribute("fee", admitted.fee.to_string()),
        )),
        Err(rejection) => Ok(response.add_event(
            Event::new("jackpot_randomness_response_dropped")
                .add_attribute("dst_chain", relayed.src_chain.to_string())
                .add_attribute("sequence", relayed.sequence.to_string())
                .add_attribute("reason", rejection.reason()),
        )),
    }
}
