use cosmwasm_std::StdError;
use thiserror::Error;

use crate::beacon::VerifyError;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("beacon for round {round} already exists")]
    BeaconAlreadyExists { round: u64 },

    #[error("BLS verification failed: {0}")]
    VerificationFailed(#[from] VerifyError),

    #[error("invalid hex input: {field}")]
    InvalidHex { field: String },

    #[error("invalid pubkey length: expected 96 bytes, got {got}")]
    InvalidPubkeyLength { got: usize },

    #[error("period_seconds must be positive")]
    InvalidPeriod {},

    #[error("num_words must be between 1 and {max}, got {got}")]
    InvalidNumWords { got: u8, max: u8 },

    #[error("request {request_id} from {consumer} is already pending")]
    DuplicateRequest { consumer: String, request_id: u64 },

    #[error("no beacon has been submitted for round {round}")]
    NoBeacon { round: u64 },

    #[error("unknown reply id {id}")]
    UnknownReplyId { id: u64 },
}
