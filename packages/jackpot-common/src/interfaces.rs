//! Message shapes of the contracts the lottery talks to.
//!
//! Only the subset of each collaborator's API the lottery relies on is
//! described here; implementations are free to expose more.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, Uint128, Uint256};

use crate::types::Origin;

// ── Messaging transport ──

#[cw_serde]
pub enum TransportQueryMsg {
    Quote {
        dst_chain: u32,
        payload: Binary,
        options: Binary,
    },
}

#[cw_serde]
pub struct QuoteResponse {
    pub native_fee: Uint128,
}

#[cw_serde]
pub enum TransportExecuteMsg {
    /// The quoted fee must be attached as funds.
    Send {
        dst_chain: u32,
        receiver: String,
        payload: Binary,
        options: Binary,
    },
}

/// What the transport executes on the receiving lottery contract.
#[cw_serde]
pub enum TransportCallbackMsg {
    ReceiveMessage { origin: Origin, payload: Binary },
}

// ── Randomness provider ──

#[cw_serde]
pub enum RandomnessProviderExecuteMsg {
    RequestRandomness { request_id: u64, num_words: u8 },
}

/// What the provider executes on the requesting contract once randomness exists.
#[cw_serde]
pub enum RandomnessCallbackMsg {
    OnRandomness { request_id: u64, words: Vec<Uint256> },
}

// ── Price oracle ──

#[cw_serde]
pub enum PriceOracleQueryMsg {
    /// Returns `PriceReading`
    PrimaryPrice {},
    /// Returns `PriceReading`
    SecondaryPrice {},
    /// Returns `TwapResponse`
    Twap { duration_seconds: u64 },
}

#[cw_serde]
pub struct TwapResponse {
    pub price: Uint128,
}

// ── Jackpot reserve ──

#[cw_serde]
pub enum ReserveQueryMsg {
    Reserve { vault_id: u64 },
}

#[cw_serde]
pub struct ReserveResponse {
    pub amount: Uint128,
}

#[cw_serde]
pub enum ReserveExecuteMsg {
    PayOut {
        vault_id: u64,
        recipient: String,
        amount: Uint128,
    },
}

// ── Voting / boost source ──

#[cw_serde]
pub enum BoostQueryMsg {
    PersonalMultiplierBps { user: String },
    AdditionalProbabilityBps { user: String },
}

#[cw_serde]
pub struct BpsResponse {
    pub bps: u32,
}
