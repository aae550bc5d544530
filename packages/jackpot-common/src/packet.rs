use cosmwasm_schema::cw_serde;
use cosmwasm_std::{from_json, to_json_binary, Binary, StdError, StdResult, Uint256};
use sha2::{Digest, Sha256};

use crate::types::{PriceReading, WinnerMsgType};

/// Payloads exchanged between lottery instances over the messaging transport.
#[cw_serde]
pub enum LotteryPacket {
    /// Spoke → randomness hub. The sequence doubles as the spoke's request id.
    RandomnessRequest { sequence: u64 },
    /// Randomness hub → spoke, optionally carrying the hub's aggregated price.
    RandomnessResponse {
        sequence: u64,
        word: Uint256,
        price: Option<PriceReading>,
    },
    Winner {
        msg_type: WinnerMsgType,
        winner: String,
        share_bps: u16,
        /// Absent on packets produced by older deployments.
        win_id: Option<String>,
        price: Option<PriceReading>,
    },
}

pub fn encode_packet(packet: &LotteryPacket) -> StdResult<Binary> {
    to_json_binary(packet)
}

/// Decode an inbound payload.
///
/// Older deployments send a bare `[winner, share_bps]` tuple; it is treated as
/// a broadcast winner without a win id or price.
pub fn decode_packet(payload: &Binary) -> StdResult<LotteryPacket> {
    if let Ok(packet) = from_json::<LotteryPacket>(payload) {
        return Ok(packet);
    }
    match from_json::<(String, u16)>(payload) {
        Ok((winner, share_bps)) => Ok(LotteryPacket::Winner {
            msg_type: WinnerMsgType::Broadcast,
            winner,
            share_bps,
            win_id: None,
            price: None,
        }),
        Err(_) => Err(StdError::generic_err("unrecognised lottery packet")),
    }
}

/// Deterministic identifier of a single win, identical on every chain that pays it.
///
/// `win_id = hex(sha256( origin_chain_u32_be || request_id_u64_be || winner_bytes ))`
pub fn compute_win_id(origin_chain: u32, request_id: u64, winner: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(origin_chain.to_be_bytes());
    hasher.update(request_id.to_be_bytes());
    hasher.update(winner.as_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    hex::encode(digest)
}
