use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Binary, Uint128, Uint256};
use jackpot_common::{Origin, PriceReading};

use crate::state::{
    BroadcastRecord, ChainPriceObservation, CoreConfig, LotteryConfig, LotteryStats, PaidWin,
    PendingBroadcast, PendingPayout, RandomnessRequest,
};

#[cw_serde]
pub struct InstantiateMsg {
    pub local_chain_id: u32,
    pub hub_chain_id: u32,
    /// Defaults to `hub_chain_id`
    pub randomness_hub_chain_id: Option<u32>,
    pub transport: Option<String>,
    pub randomness_provider: Option<String>,
    pub prefer_local_randomness: bool,
    pub price_oracle: Option<String>,
    pub boost_source: Option<String>,
    pub jackpot_reserve: String,
    pub jackpot_vault_id: u64,
    pub fee_denom: String,
    pub token_decimals: u8,
    pub price_staleness_seconds: Option<u64>,
    pub twap_window_seconds: Option<u64>,
    pub default_gas_limit: Option<u64>,
    pub lottery: LotteryConfig,
    pub entry_callers: Vec<String>,
}

/// Value of the trade that triggered an entry.
#[cw_serde]
pub enum EntryAmount {
    /// Already valued in 6-decimal USD by the caller
    Usd(Uint128),
    /// Raw token amount, valued with the local price
    Tokens(Uint128),
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Register a qualifying trade. Entry callers only.
    /// Never fails because of lottery infrastructure; a dropped entry
    /// returns `request_id = 0` in the response data.
    EnterLottery { user: String, amount: EntryAmount },
    /// Randomness callback. Local provider only.
    OnRandomness { request_id: u64, words: Vec<Uint256> },
    /// Inbound cross-chain message. Transport only.
    ReceiveMessage { origin: Origin, payload: Binary },
    /// Refresh this chain's own price observation from the oracle. Anyone can call.
    RefreshLocalPrice {},
    /// Re-attempt destinations of a broadcast that are still marked pending.
    /// Anyone can call; attached funds top up the fee budget.
    RetryBroadcast {
        broadcast_id: u64,
        dst_chain: Option<u32>,
    },
    /// Re-attempt a local payout the reserve could not serve. Anyone can call.
    /// The share is taken from the reserve balance at retry time.
    RetryPayout { payout_id: u64 },
    /// Admin only.
    UpdateLotteryConfig {
        min_swap_usd: Option<Uint128>,
        reward_share_bps: Option<u16>,
        active: Option<bool>,
        base_win_chance_ppm: Option<u32>,
        max_win_chance_ppm: Option<u32>,
        usd_multiplier_bps: Option<u16>,
    },
    /// Admin only. An empty string unsets an optional collaborator.
    UpdateConfig {
        hub_chain_id: Option<u32>,
        randomness_hub_chain_id: Option<u32>,
        transport: Option<String>,
        randomness_provider: Option<String>,
        prefer_local_randomness: Option<bool>,
        price_oracle: Option<String>,
        boost_source: Option<String>,
        jackpot_reserve: Option<String>,
        jackpot_vault_id: Option<u64>,
        fee_denom: Option<String>,
        price_staleness_seconds: Option<u64>,
        twap_window_seconds: Option<u64>,
        default_gas_limit: Option<u64>,
    },
    /// Register or replace the trusted lottery instance on another chain. Admin only.
    SetPeer {
        chain_id: u32,
        address: String,
        gas_limit: Option<u64>,
    },
    RemovePeer { chain_id: u32 },
    UpdateEntryCallers { add: Vec<String>, remove: Vec<String> },
}

pub struct UpdateLotteryConfigParams {
    pub min_swap_usd: Option<Uint128>,
    pub reward_share_bps: Option<u16>,
    pub active: Option<bool>,
    pub base_win_chance_ppm: Option<u32>,
    pub max_win_chance_ppm: Option<u32>,
    pub usd_multiplier_bps: Option<u16>,
}

pub struct UpdateConfigParams {
    pub hub_chain_id: Option<u32>,
    pub randomness_hub_chain_id: Option<u32>,
    pub transport: Option<String>,
    pub randomness_provider: Option<String>,
    pub prefer_local_randomness: Option<bool>,
    pub price_oracle: Option<String>,
    pub boost_source: Option<String>,
    pub jackpot_reserve: Option<String>,
    pub jackpot_vault_id: Option<u64>,
    pub fee_denom: Option<String>,
    pub price_staleness_seconds: Option<u64>,
    pub twap_window_seconds: Option<u64>,
    pub default_gas_limit: Option<u64>,
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(CoreConfig)]
    Config {},
    #[returns(LotteryConfig)]
    LotteryConfig {},
    #[returns(LotteryStats)]
    Stats {},
    /// Odds a trade of `usd_value` would get right now, boosts included.
    #[returns(WinChanceResponse)]
    WinChance { user: String, usd_value: Uint128 },
    #[returns(Option<RandomnessRequest>)]
    PendingRequest { id: u64 },
    #[returns(PendingRequestsResponse)]
    PendingRequests {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    /// `(0, 0)` when no observation is fresh enough.
    #[returns(PriceReading)]
    AggregatedPrice {},
    #[returns(PriceObservationsResponse)]
    PriceObservations {},
    #[returns(Option<ChainPriceObservation>)]
    ReferencePrice {},
    #[returns(PeersResponse)]
    Peers {},
    #[returns(Option<BroadcastRecord>)]
    Broadcast { broadcast_id: u64 },
    #[returns(PendingBroadcastsResponse)]
    PendingBroadcasts {
        start_after: Option<(u64, u32)>,
        limit: Option<u32>,
    },
    #[returns(Option<PaidWin>)]
    PaidWin { win_id: String },
    #[returns(PendingPayoutsResponse)]
    PendingPayouts {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(bool)]
    IsEntryCaller { address: String },
}

#[cw_serde]
pub struct EntryResponse {
    /// 0 when the entry was skipped or dropped
    pub request_id: u64,
}

#[cw_serde]
pub struct WinChanceResponse {
    pub usd_value: Uint128,
    pub base_chance_ppm: u32,
    pub win_chance_ppm: u32,
}

#[cw_serde]
pub struct PendingRequestsResponse {
    pub requests: Vec<RandomnessRequest>,
}

#[cw_serde]
pub struct PriceObservationsResponse {
    pub observations: Vec<ChainPriceObservation>,
}

#[cw_serde]
pub struct PeerInfo {
    pub chain_id: u32,
    pub address: String,
    pub gas_limit: Option<u64>,
}

#[cw_serde]
pub struct PeersResponse {
    pub peers: Vec<PeerInfo>,
}

#[cw_serde]
pub struct PendingBroadcastsResponse {
    pub pending: Vec<PendingBroadcast>,
}

#[cw_serde]
pub struct PendingPayoutsResponse {
    pub payouts: Vec<PendingPayout>,
}
