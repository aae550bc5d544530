use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp};
use cw_storage_plus::{Item, Map};

pub const CONFIG: Item<ProviderConfig> = Item::new("config");
pub const BEACONS: Map<u64, StoredBeacon> = Map::new("beacons");
pub const LATEST_ROUND: Item<u64> = Item::new("latest_round");

/// Contracts allowed to request randomness.
pub const CONSUMERS: Map<&Addr, ()> = Map::new("consumers");

pub const NEXT_JOB_ID: Item<u64> = Item::new("next_job_id");
/// (target_round, job_id) -> job. Ordered by round so delivery can range up to a beacon.
pub const JOBS: Map<(u64, u64), RandomnessJob> = Map::new("jobs");
/// (consumer, request_id) -> job_id, rejects a request id being reused while pending.
pub const REQUEST_INDEX: Map<(&Addr, u64), u64> = Map::new("request_index");

#[cw_serde]
pub struct ProviderConfig {
    pub admin: Addr,
    pub operators: Vec<Addr>,
    /// Quicknet public key, 96 bytes (G2 point)
    pub quicknet_pubkey: Vec<u8>,
    pub chain_hash: String,
    /// Genesis time of the drand network (unix seconds)
    pub genesis_time: u64,
    /// Period between rounds in seconds (3 for quicknet)
    pub period_seconds: u64,
    /// Callbacks sent per beacon submission; the rest wait for `DeliverPending`
    pub max_deliveries_per_beacon: u32,
}

#[cw_serde]
pub struct StoredBeacon {
    pub round: u64,
    /// sha256(signature), 32 bytes
    pub randomness: Vec<u8>,
    /// BLS signature on G1, 48 bytes
    pub signature: Vec<u8>,
    pub submitted_at: Timestamp,
    pub submitted_by: Addr,
}

#[cw_serde]
pub struct RandomnessJob {
    pub id: u64,
    pub consumer: Addr,
    pub request_id: u64,
    pub num_words: u8,
    /// First round published strictly after the request
    pub target_round: u64,
    pub requested_at: Timestamp,
}
