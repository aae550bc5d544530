use cosmwasm_std::{
    to_json_binary, DepsMut, Env, Event, MessageInfo, Order, Response, StdResult, Storage, SubMsg,
    WasmMsg,
};
use jackpot_common::interfaces::RandomnessCallbackMsg;

use crate::beacon::{derive_words, next_round_after, verify_quicknet_beacon};
use crate::error::ContractError;
use crate::state::{
    RandomnessJob, StoredBeacon, BEACONS, CONFIG, CONSUMERS, JOBS, LATEST_ROUND, NEXT_JOB_ID,
    REQUEST_INDEX,
};

pub const MAX_WORDS: u8 = 8;
pub const REPLY_DELIVERY: u64 = 1;

/// Queue a randomness job for the next beacon. Consumers only.
pub fn request_randomness(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    request_id: u64,
    num_words: u8,
) -> Result<Response, ContractError> {
    if !CONSUMERS.has(deps.storage, &info.sender) {
        return Err(ContractError::Unauthorized {
            reason: "only consumers can request randomness".to_string(),
        });
    }
    if num_words == 0 || num_words > MAX_WORDS {
        return Err(ContractError::InvalidNumWords {
            got: num_words,
            max: MAX_WORDS,
        });
    }
    if REQUEST_INDEX.has(deps.storage, (&info.sender, request_id)) {
        return Err(ContractError::DuplicateRequest {
            consumer: info.sender.to_string(),
            request_id,
        });
    }

    let config = CONFIG.load(deps.storage)?;
    let target_round = next_round_after(
        config.genesis_time,
        config.period_seconds,
        env.block.time.seconds(),
    );

    let id = NEXT_JOB_ID.may_load(deps.storage)?.unwrap_or(1);
    NEXT_JOB_ID.save(deps.storage, &(id + 1))?;

    let job = RandomnessJob {
        id,
        consumer: info.sender.clone(),
        request_id,
        num_words,
        target_round,
        requested_at: env.block.time,
    };
    JOBS.save(deps.storage, (target_round, id), &job)?;
    REQUEST_INDEX.save(deps.storage, (&info.sender, request_id), &id)?;

    Ok(Response::new()
        .add_attribute("action", "request_randomness")
        .add_attribute("job_id", id.to_string())
        .add_event(
            Event::new("jackpot_randomness_requested")
                .add_attribute("consumer", info.sender.to_string())
                .add_attribute("request_id", request_id.to_string())
                .add_attribute("num_words", num_words.to_string())
                .add_attribute("target_round", target_round.to_string()),
        ))
}

/// Submit a drand beacon. Only operators can call this.
/// Only jobs that targeted exactly this round are delivered with it.
pub fn submit_beacon(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    round: u64,
    signature_hex: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    if !config.operators.contains(&info.sender) {
        return Err(ContractError::Unauthorized {
            reason: "only operators can submit beacons".to_string(),
        });
    }
    if BEACONS.has(deps.storage, round) {
        return Err(ContractError::BeaconAlreadyExists { round });
    }

    let signature = hex::decode(&signature_hex).map_err(|_| ContractError::InvalidHex {
        field: "signature_hex".to_string(),
    })?;
    let randomness = verify_quicknet_beacon(&config.quicknet_pubkey, round, &signature)?;

    let beacon = StoredBeacon {
        round,
        randomness: randomness.to_vec(),
        signature,
        submitted_at: env.block.time,
        submitted_by: info.sender.clone(),
    };
    BEACONS.save(deps.storage, round, &beacon)?;

    let current_latest = LATEST_ROUND.may_load(deps.storage)?.unwrap_or(0);
    if round > current_latest {
        LATEST_ROUND.save(deps.storage, &round)?;
    }

    let deliveries = deliver_jobs(deps.storage, &beacon, config.max_deliveries_per_beacon)?;

    Ok(Response::new()
        .add_attribute("action", "submit_beacon")
        .add_attribute("round", round.to_string())
        .add_attribute("submitted_by", info.sender.to_string())
        .add_attribute("delivered", deliveries.len().to_string())
        .add_submessages(deliveries)
        .add_event(
            Event::new("jackpot_beacon_submitted")
                .add_attribute("round", round.to_string())
                .add_attribute("randomness", hex::encode(randomness))
                .add_attribute("submitted_by", info.sender.to_string())
                .add_attribute("timestamp", env.block.time.seconds().to_string()),
        ))
}

/// Deliver jobs for `round` that a capped submission left behind.
pub fn deliver_pending(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    round: u64,
    limit: Option<u32>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let beacon = BEACONS
        .may_load(deps.storage, round)?
        .ok_or(ContractError::NoBeacon { round })?;

    let limit = limit
        .unwrap_or(config.max_deliveries_per_beacon)
        .min(config.max_deliveries_per_beacon);
    let deliveries = deliver_jobs(deps.storage, &beacon, limit)?;

    Ok(Response::new()
        .add_attribute("action", "deliver_pending")
        .add_attribute("round", beacon.round.to_string())
        .add_attribute("delivered", deliveries.len().to_string())
        .add_submessages(deliveries))
}

/// Remove up to `limit` jobs targeting `beacon.round` and build their
/// callbacks. A failing consumer only produces a reply, never a revert.
fn deliver_jobs(
    storage: &mut dyn Storage,
    beacon: &StoredBeacon,
    limit: u32,
) -> StdResult<Vec<SubMsg>> {
    let due: Vec<RandomnessJob> = JOBS
        .prefix(beacon.round)
        .range(storage, None, None, Order::Ascending)
        .take(limit as usize)
        .map(|r| r.map(|(_, job)| job))
        .collect::<StdResult<_>>()?;

    let mut deliveries = Vec::with_capacity(due.len());
    for job in due {
        JOBS.remove(storage, (job.target_round, job.id));
        REQUEST_INDEX.remove(storage, (&job.consumer, job.request_id));

        let callback = WasmMsg::Execute {
            contract_addr: job.consumer.to_string(),
            msg: to_json_binary(&RandomnessCallbackMsg::OnRandomness {
                request_id: job.request_id,
                words: derive_words(&beacon.randomness, job.request_id, job.num_words),
            })?,
            funds: vec![],
        };
        deliveries.push(
            SubMsg::reply_on_error(callback, REPLY_DELIVERY).with_payload(to_json_binary(&job)?),
        );
    }
    Ok(deliveries)
}

/// Update the operator list. Admin only.
pub fn update_operators(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    add: Vec<String>,
    remove: Vec<String>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;

    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can update operators".to_string(),
        });
    }

    for addr_str in &remove {
        let addr = deps.api.addr_validate(addr_str)?;
        config.operators.retain(|a| *a != addr);
    }
    for addr_str in &add {
        let addr = deps.api.addr_validate(addr_str)?;
        if !config.operators.contains(&addr) {
            config.operators.push(addr);
        }
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_operators")
        .add_attribute("added", add.join(",")))
}

pub fn update_consumers(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    add: Vec<String>,
    remove: Vec<String>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can update consumers".to_string(),
        });
    }

    for addr_str in &remove {
        let addr = deps.api.addr_validate(addr_str)?;
        CONSUMERS.remove(deps.storage, &addr);
    }
    for addr_str in &add {
        let addr = deps.api.addr_validate(addr_str)?;
        CONSUMERS.save(deps.storage, &addr, &())?;
    }

    Ok(Response::new()
        .add_attribute("action", "update_consumers")
        .add_attribute("added", add.join(","))
        .add_attribute("removed", remove.join(",")))
}
