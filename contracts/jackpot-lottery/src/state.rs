use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};
use jackpot_common::SourceKind;

use crate::error::ContractError;
use crate::odds::MAX_WIN_CHANCE_CAP_PPM;

/// Accepted band for `min_swap_usd`: $0.10 to $100.
pub const MIN_SWAP_USD_FLOOR: Uint128 = Uint128::new(100_000);
pub const MIN_SWAP_USD_CEILING: Uint128 = Uint128::new(100_000_000);

pub const CONFIG: Item<CoreConfig> = Item::new("config");
pub const LOTTERY_CONFIG: Item<LotteryConfig> = Item::new("lottery_config");
pub const STATS: Item<LotteryStats> = Item::new("stats");

/// Contracts allowed to submit lottery entries (e.g. the swap router).
pub const ENTRY_CALLERS: Map<&Addr, ()> = Map::new("entry_callers");
/// Trusted lottery instance per remote chain.
pub const PEERS: Map<u32, Peer> = Map::new("peers");

/// Requests awaiting randomness. Presence here is the only guard against
/// processing a fulfillment twice.
pub const PENDING_REQUESTS: Map<u64, RandomnessRequest> = Map::new("pending_requests");

/// Randomness hub only: local provider id -> remote request it serves.
pub const RELAYED_REQUESTS: Map<u64, RelayedRequest> = Map::new("relayed_requests");
/// Randomness hub only: (src_chain, sequence) -> local provider id.
pub const REMOTE_SEQUENCES: Map<(u32, u64), u64> = Map::new("remote_sequences");

pub const PRICE_OBSERVATIONS: Map<u32, ChainPriceObservation> = Map::new("price_obs");
/// Last aggregated price received from the hub (spokes).
pub const REFERENCE_PRICE: Item<ChainPriceObservation> = Item::new("reference_price");

pub const BROADCASTS: Map<u64, BroadcastRecord> = Map::new("broadcasts");
/// (broadcast_id, dst_chain) -> marker for a destination that still needs the message.
pub const PENDING_BROADCASTS: Map<(u64, u32), PendingBroadcast> = Map::new("pending_broadcasts");

/// Payouts made on this chain, keyed by win id.
pub const PAID_WINS: Map<&str, PaidWin> = Map::new("paid_wins");

/// Local payouts that could not be made yet. Anyone can retry them.
pub const PENDING_PAYOUTS: Map<u64, PendingPayout> = Map::new("pending_payouts");
/// win id -> pending payout id
pub const PENDING_PAYOUT_WINS: Map<&str, u64> = Map::new("pending_payout_wins");
pub const NEXT_PAYOUT_ID: Item<u64> = Item::new("next_payout_id");

#[cw_serde]
pub struct CoreConfig {
    pub admin: Addr,
    pub local_chain_id: u32,
    /// Chain that fans winners out to everyone else
    pub hub_chain_id: u32,
    /// Chain that serves cross-chain randomness requests
    pub randomness_hub_chain_id: u32,
    pub transport: Option<Addr>,
    pub randomness_provider: Option<Addr>,
    pub prefer_local_randomness: bool,
    pub price_oracle: Option<Addr>,
    pub boost_source: Option<Addr>,
    pub jackpot_reserve: Addr,
    pub jackpot_vault_id: u64,
    /// Native denom used to pay messaging fees
    pub fee_denom: String,
    /// Decimals of the traded token, used to value token-denominated entries
    pub token_decimals: u8,
    pub price_staleness_seconds: u64,
    pub twap_window_seconds: u64,
    /// Gas limit for peers that don't override it
    pub default_gas_limit: u64,
}

impl CoreConfig {
    pub fn is_hub(&self) -> bool {
        self.local_chain_id == self.hub_chain_id
    }

    pub fn is_randomness_hub(&self) -> bool {
        self.local_chain_id == self.randomness_hub_chain_id
    }
}

#[cw_serde]
pub struct LotteryConfig {
    /// Minimum qualifying trade, 6-decimal USD
    pub min_swap_usd: Uint128,
    /// Share of the local reserve paid to a winner (10000 = 100%)
    pub reward_share_bps: u16,
    pub active: bool,
    pub base_win_chance_ppm: u32,
    pub max_win_chance_ppm: u32,
    /// Scales the USD value of every entry (10000 = 1x)
    pub usd_multiplier_bps: u16,
}

impl LotteryConfig {
    pub fn validate(&self) -> Result<(), ContractError> {
        let invalid = |reason: &str| ContractError::InvalidLotteryConfig {
            reason: reason.to_string(),
        };

        if self.min_swap_usd < MIN_SWAP_USD_FLOOR || self.min_swap_usd > MIN_SWAP_USD_CEILING {
            return Err(invalid("min_swap_usd must be between $0.10 and $100"));
        }
        if self.base_win_chance_ppm == 0 {
            return Err(invalid("base_win_chance_ppm must be positive"));
        }
        if self.base_win_chance_ppm > self.max_win_chance_ppm {
            return Err(invalid("base_win_chance_ppm exceeds max_win_chance_ppm"));
        }
        if self.max_win_chance_ppm > MAX_WIN_CHANCE_CAP_PPM {
            return Err(invalid("max_win_chance_ppm exceeds the 10% cap"));
        }
        if !(10_000..=15_000).contains(&self.usd_multiplier_bps) {
            return Err(invalid("usd_multiplier_bps must be between 10000 and 15000"));
        }
        if self.reward_share_bps == 0 || self.reward_share_bps > 10_000 {
            return Err(invalid("reward_share_bps must be in (0, 10000]"));
        }
        Ok(())
    }
}

#[cw_serde]
pub struct LotteryStats {
    pub next_request_id: u64,
    pub next_broadcast_id: u64,
    pub total_entries: u64,
    pub dropped_entries: u64,
    pub total_wins: u64,
    pub total_losses: u64,
    pub total_payouts: u64,
    pub total_paid_amount: Uint128,
}

#[cw_serde]
pub struct Peer {
    /// Lottery contract address on the remote chain
    pub address: String,
    pub gas_limit: Option<u64>,
}

#[cw_serde]
pub struct RandomnessRequest {
    pub id: u64,
    pub user: Addr,
    /// Adjusted USD value fixed at entry time; odds are derived from it
    pub usd_value: Uint128,
    pub source: SourceKind,
    pub created_at: Timestamp,
}

#[cw_serde]
pub struct RelayedRequest {
    pub local_id: u64,
    pub src_chain: u32,
    pub sequence: u64,
    pub received_at: Timestamp,
}

#[cw_serde]
pub struct ChainPriceObservation {
    pub chain_id: u32,
    pub price: Uint128,
    pub observed_at: u64,
    pub received_at: u64,
}

#[cw_serde]
pub struct BroadcastRecord {
    pub id: u64,
    pub winner: String,
    pub share_bps: u16,
    pub win_id: Option<String>,
    pub created_at: Timestamp,
}

#[cw_serde]
pub enum PendingReason {
    /// No transport configured or no peer registered for the destination
    Unroutable,
    QuoteFailed,
    InsufficientFee,
    SendFailed,
}

#[cw_serde]
pub struct PendingBroadcast {
    pub broadcast_id: u64,
    pub dst_chain: u32,
    pub reason: PendingReason,
    pub required_fee: Uint128,
    pub available_fee: Uint128,
    pub marked_at: Timestamp,
}

#[cw_serde]
pub enum PayoutFailure {
    /// The reserve balance query failed
    ReserveUnavailable,
    /// The reserve rejected the `PayOut` call
    PayOutFailed,
}

impl PayoutFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutFailure::ReserveUnavailable => "reserve_unavailable",
            PayoutFailure::PayOutFailed => "pay_out_failed",
        }
    }
}

#[cw_serde]
pub struct PendingPayout {
    pub id: u64,
    pub winner: String,
    pub share_bps: u16,
    pub win_id: Option<String>,
    pub reason: PayoutFailure,
    pub error: String,
    pub created_at: Timestamp,
}

#[cw_serde]
pub struct PaidWin {
    pub win_id: String,
    pub winner: String,
    pub amount: Uint128,
    pub paid_at: Timestamp,
}
