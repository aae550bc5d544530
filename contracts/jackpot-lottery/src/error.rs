use cosmwasm_std::StdError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("invalid lottery config: {reason}")]
    InvalidLotteryConfig { reason: String },

    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("chain {chain_id} is not a registered peer")]
    UnsupportedChain { chain_id: u32 },

    #[error("message from chain {chain_id} was not sent by the registered peer (got {sender})")]
    UntrustedPeer { chain_id: u32, sender: String },

    #[error("sequence {sequence} from chain {chain_id} was already received")]
    DuplicateSequence { chain_id: u32, sequence: u64 },

    #[error("randomness callback for request {request_id} carried no words")]
    EmptyRandomness { request_id: u64 },

    #[error("{msg_type} message not accepted on this chain: {reason}")]
    InvalidMessageType { msg_type: String, reason: String },

    #[error("this chain cannot serve randomness requests: {reason}")]
    RandomnessUnavailable { reason: String },

    #[error("broadcast {broadcast_id} not found")]
    BroadcastNotFound { broadcast_id: u64 },

    #[error("broadcast {broadcast_id} has no pending destinations")]
    NoPendingBroadcast { broadcast_id: u64 },

    #[error("pending payout {payout_id} not found")]
    PayoutNotFound { payout_id: u64 },

    #[error("unknown reply id {id}")]
    UnknownReplyId { id: u64 },
}
