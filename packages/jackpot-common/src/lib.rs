pub mod interfaces;
pub mod packet;
pub mod types;

pub use packet::{compute_win_id, decode_packet, encode_packet, LotteryPacket};
pub use types::{MessageOptions, Origin, PriceReading, SourceKind, WinnerMsgType};
