use cosmwasm_std::{to_json_binary, Binary, Deps, Order, StdResult};

use crate::state::{RandomnessJob, BEACONS, CONFIG, CONSUMERS, JOBS, LATEST_ROUND};

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_beacon(deps: Deps, round: u64) -> StdResult<Binary> {
    let beacon = BEACONS.may_load(deps.storage, round)?;
    to_json_binary(&beacon)
}

pub fn query_latest_round(deps: Deps) -> StdResult<Binary> {
    let round = LATEST_ROUND.may_load(deps.storage)?.unwrap_or(0);
    to_json_binary(&round)
}

pub fn query_pending_jobs(deps: Deps, round: u64) -> StdResult<Binary> {
    let jobs: Vec<RandomnessJob> = JOBS
        .prefix(round)
        .range(deps.storage, None, None, Order::Ascending)
        .map(|r| r.map(|(_, job)| job))
        .collect::<StdResult<_>>()?;
    to_json_binary(&jobs)
}

pub fn query_is_consumer(deps: Deps, address: String) -> StdResult<Binary> {
    let addr = deps.api.addr_validate(&address)?;
    to_json_binary(&CONSUMERS.has(deps.storage, &addr))
}
