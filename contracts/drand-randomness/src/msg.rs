use cosmwasm_schema::{cw_serde, QueryResponses};

use crate::state::{ProviderConfig, RandomnessJob, StoredBeacon};

#[cw_serde]
pub struct InstantiateMsg {
    pub operators: Vec<String>,
    pub consumers: Vec<String>,
    /// Hex-encoded quicknet public key (96 bytes = 192 hex chars)
    pub quicknet_pubkey_hex: String,
    pub chain_hash: String,
    pub genesis_time: u64,
    pub period_seconds: u64,
    pub max_deliveries_per_beacon: Option<u32>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Ask for `num_words` random words, delivered once a later beacon lands.
    /// Consumers only.
    RequestRandomness { request_id: u64, num_words: u8 },
    /// Submit a drand beacon and deliver every job it satisfies. Operators only.
    SubmitBeacon {
        round: u64,
        /// Hex-encoded BLS signature (48 bytes = 96 hex chars)
        signature_hex: String,
    },
    /// Deliver jobs for `round` left over after a capped submission.
    /// Anyone can call.
    DeliverPending { round: u64, limit: Option<u32> },
    UpdateOperators {
        add: Vec<String>,
        remove: Vec<String>,
    },
    UpdateConsumers {
        add: Vec<String>,
        remove: Vec<String>,
    },
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ProviderConfig)]
    Config {},

    #[returns(Option<StoredBeacon>)]
    Beacon { round: u64 },

    #[returns(u64)]
    LatestRound {},

    /// Jobs waiting for `round`
    #[returns(Vec<RandomnessJob>)]
    PendingJobs { round: u64 },

    #[returns(bool)]
    IsConsumer { address: String },
}
