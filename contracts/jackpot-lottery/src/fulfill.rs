use cosmwasm_std::{
    Binary, DepsMut, Env, Event, MessageInfo, QuerierWrapper, Response, Storage, Uint256,
};
use jackpot_common::{decode_packet, LotteryPacket, Origin, SourceKind};

use crate::dispatch::{relay_randomness_request, relay_randomness_response};
use crate::error::ContractError;
use crate::odds::{draw_ppm, is_winning_draw, win_chance};
use crate::settle::{receive_winner, settle_discovered_win};
use crate::state::{
    ChainPriceObservation, CoreConfig, CONFIG, LOTTERY_CONFIG, PEERS, PENDING_REQUESTS,
    REFERENCE_PRICE, RELAYED_REQUESTS, STATS,
};

/// Callback from the local randomness provider.
pub fn on_randomness(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    request_id: u64,
    words: Vec<Uint256>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if config.randomness_provider.as_ref() != Some(&info.sender) {
        return Err(ContractError::Unauthorized {
            reason: "only the randomness provider can deliver randomness".to_string(),
        });
    }
    let Some(word) = words.first().copied() else {
        return Err(ContractError::EmptyRandomness { request_id });
    };

    let response = Response::new()
        .add_attribute("action", "on_randomness")
        .add_attribute("request_id", request_id.to_string());

    if PENDING_REQUESTS.has(deps.storage, request_id) {
        return fulfill_request(
            deps.storage,
            &deps.querier,
            &env,
            &config,
            request_id,
            word,
            response,
        );
    }

    if let Some(relayed) = RELAYED_REQUESTS.may_load(deps.storage, request_id)? {
        return relay_randomness_response(
            deps.storage,
            &deps.querier,
            &env,
            &config,
            relayed,
            word,
            response,
        );
    }

    Ok(response.add_attribute("ignored", "true"))
}

/// Draw for a pending request. Removal from the pending table happens before
/// anything else, so a replayed callback finds nothing and is ignored.
pub fn fulfill_request(
    storage: &mut dyn Storage,
    querier: &QuerierWrapper,
    env: &Env,
    config: &CoreConfig,
    request_id: u64,
    word: Uint256,
    response: Response,
) -> Result<Response, ContractError> {
    let Some(request) = PENDING_REQUESTS.may_load(storage, request_id)? else {
        return Ok(response.add_attribute("ignored", "true"));
    };
    PENDING_REQUESTS.remove(storage, request_id);

    let lottery = LOTTERY_CONFIG.load(storage)?;
    let chance = win_chance(
        querier,
        &lottery,
        config.boost_source.as_ref(),
        &request.user,
        request.usd_value,
    );
    let draw = draw_ppm(word);
    let won = is_winning_draw(draw, chance);

    let mut stats = STATS.load(storage)?;
    if won {
        stats.total_wins += 1;
    } else {
        stats.total_losses += 1;
    }
    STATS.save(storage, &stats)?;

    let response = response.add_event(
        Event::new("jackpot_result")
            .add_attribute("request_id", request_id.to_string())
            .add_attribute("user", request.user.to_string())
            .add_attribute("usd_value", request.usd_value.to_string())
            .add_attribute("win_chance_ppm", chance.to_string())
            .add_attribute("word", hex::encode(word.to_be_bytes()))
            .add_attribute("draw", draw.to_string())
            .add_attribute("won", won.to_string()),
    );

    if !won {
        return Ok(response);
    }

    settle_discovered_win(
        storage,
        querier,
        env,
        config,
        request_id,
        &request.user,
        response,
    )
}

/// Inbound cross-chain message. Only the transport may call, and only on
/// behalf of the registered peer of the source chain.
pub fn receive_message(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    origin: Origin,
    payload: Binary,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if config.transport.as_ref() != Some(&info.sender) {
        return Err(ContractError::Unauthorized {
            reason: "only the transport can deliver messages".to_string(),
        });
    }

    let peer = PEERS
        .may_load(deps.storage, origin.src_chain)?
        .ok_or(ContractError::UnsupportedChain {
            chain_id: origin.src_chain,
        })?;
    if peer.address != origin.sender {
        return Err(ContractError::UntrustedPeer {
            chain_id: origin.src_chain,
            sender: origin.sender,
        });
    }

    let packet = decode_packet(&payload)?;
    let response = Response::new()
        .add_attribute("action", "receive_message")
        .add_attribute("src_chain", origin.src_chain.to_string());

    match packet {
        LotteryPacket::RandomnessRequest { sequence } => relay_randomness_request(
            deps.storage,
            &env,
            &config,
            origin.src_chain,
            sequence,
            response.add_attribute("kind", "randomness_request"),
        ),
        LotteryPacket::RandomnessResponse {
            sequence,
            word,
            price,
        } => {
            let response = response.add_attribute("kind", "randomness_response");
            if let Some(reading) = price.filter(|r| r.is_available()) {
                REFERENCE_PRICE.save(
                    deps.storage,
                    &ChainPriceObservation {
                        chain_id: origin.src_chain,
                        price: reading.price,
                        observed_at: reading.observed_at,
                        received_at: env.block.time.seconds(),
                    },
                )?;
            }

            // Sequences are this chain's request ids; only cross-chain requests
            // can be answered this way.
            let pending = PENDING_REQUESTS.may_load(deps.storage, sequence)?;
            match pending {
                Some(request) if request.source == SourceKind::CrossChain => fulfill_request(
                    deps.storage,
                    &deps.querier,
                    &env,
                    &config,
                    sequence,
                    word,
                    response,
                ),
                _ => Ok(response.add_attribute("ignored", "true")),
            }
        }
        LotteryPacket::Winner {
            msg_type,
            winner,
            share_bps,
            win_id,
            price,
        } => receive_winner(
            deps.storage,
            &deps.querier,
            &env,
            &config,
            origin.src_chain,
            msg_type,
            winner,
            share_bps,
            win_id,
            price,
            response.add_attribute("kind", "winner"),
        ),
    }
}
