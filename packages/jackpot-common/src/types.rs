use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;

/// Where the randomness for an entry comes from.
#[cw_serde]
pub enum SourceKind {
    /// The randomness provider deployed on this chain.
    Local,
    /// A randomness request relayed through the designated randomness hub chain.
    CrossChain,
}

/// A USD price reading (6 decimals) together with the time it was observed.
#[cw_serde]
pub struct PriceReading {
    pub price: Uint128,
    /// Unix seconds
    pub observed_at: u64,
}

impl PriceReading {
    /// The `(0, 0)` sentinel meaning "no price available".
    pub fn unavailable() -> Self {
        PriceReading {
            price: Uint128::zero(),
            observed_at: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        !self.price.is_zero()
    }
}

/// Distinguishes the two directions a winner message travels in.
#[cw_serde]
pub enum WinnerMsgType {
    /// Hub → every other chain: pay your local share, do not forward.
    Broadcast,
    /// Spoke → hub: a win was discovered here, pay and fan out.
    NotifyHub,
}

/// Sender metadata attached by the transport to every inbound message.
#[cw_serde]
pub struct Origin {
    pub src_chain: u32,
    /// Address of the sending lottery contract on `src_chain`.
    pub sender: String,
}

/// Per-destination execution options handed to the transport.
#[cw_serde]
pub struct MessageOptions {
    pub gas_limit: u64,
}
