use cosmwasm_std::{
    entry_point, from_json, Binary, Deps, DepsMut, Env, Event, MessageInfo, Reply, Response,
    StdResult, SubMsgResult,
};
use cw2::{get_contract_version, set_contract_version};

use crate::error::ContractError;
use crate::execute::{self, REPLY_DELIVERY};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query;
use crate::state::{ProviderConfig, RandomnessJob, CONFIG, CONSUMERS, LATEST_ROUND, NEXT_JOB_ID};

const CONTRACT_NAME: &str = "crates.io:jackpot-drand-randomness";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_MAX_DELIVERIES_PER_BEACON: u32 = 20;

#[entry_point]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let pubkey_bytes = hex::decode(&msg.quicknet_pubkey_hex).map_err(|_| {
        ContractError::InvalidHex {
            field: "quicknet_pubkey_hex".to_string(),
        }
    })?;
    if pubkey_bytes.len() != 96 {
        return Err(ContractError::InvalidPubkeyLength {
            got: pubkey_bytes.len(),
        });
    }
    if msg.period_seconds == 0 {
        return Err(ContractError::InvalidPeriod {});
    }

    let operators = msg
        .operators
        .iter()
        .map(|op| deps.api.addr_validate(op))
        .collect::<StdResult<Vec<_>>>()?;

    let config = ProviderConfig {
        admin: info.sender.clone(),
        operators,
        quicknet_pubkey: pubkey_bytes,
        chain_hash: msg.chain_hash,
        genesis_time: msg.genesis_time,
        period_seconds: msg.period_seconds,
        max_deliveries_per_beacon: msg
            .max_deliveries_per_beacon
            .unwrap_or(DEFAULT_MAX_DELIVERIES_PER_BEACON)
            .max(1),
    };
    CONFIG.save(deps.storage, &config)?;
    LATEST_ROUND.save(deps.storage, &0u64)?;
    NEXT_JOB_ID.save(deps.storage, &1u64)?;

    for consumer in &msg.consumers {
        let addr = deps.api.addr_validate(consumer)?;
        CONSUMERS.save(deps.storage, &addr, &())?;
    }

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "drand-randomness")
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
        ExecuteMsg::RequestRandomness {
            request_id,
            num_words,
        } => execute::request_randomness(deps, env, info, request_id, num_words),
        ExecuteMsg::SubmitBeacon {
            round,
            signature_hex,
        } => execute::submit_beacon(deps, env, info, round, signature_hex),
        ExecuteMsg::DeliverPending { round, limit } => {
            execute::deliver_pending(deps, env, info, round, limit)
        }
        ExecuteMsg::UpdateOperators { add, remove } => {
            execute::update_operators(deps, env, info, add, remove)
        }
        ExecuteMsg::UpdateConsumers { add, remove } => {
            execute::update_consumers(deps, env, info, add, remove)
        }
    }
}

/// A consumer rejected its callback. The job is already gone; record it and move on.
#[entry_point]
pub fn reply(_deps: DepsMut, _env: Env, msg: Reply) -> Result<Response, ContractError> {
    if msg.id != REPLY_DELIVERY {
        return Err(ContractError::UnknownReplyId { id: msg.id });
    }
    let SubMsgResult::Err(error) = msg.result else {
        return Ok(Response::new());
    };
    let job: RandomnessJob = from_json(&msg.payload)?;

    Ok(Response::new()
        .add_attribute("action", "delivery_failed")
        .add_event(
            Event::new("jackpot_randomness_delivery_failed")
                .add_attribute("consumer", job.consumer.to_string())
                .add_attribute("request_id", job.request_id.to_string())
                .add_attribute("target_round", job.target_round.to_string())
                .add_attribute("error", error),
        ))
}

#[entry_point]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::Beacon { round } => query::query_beacon(deps, round),
        QueryMsg::LatestRound {} => query::query_latest_round(deps),
        QueryMsg::PendingJobs { round } => query::query_pending_jobs(deps, round),
        QueryMsg::IsConsumer { address } => query::query_is_consumer(deps, address),
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
