pub mod broadcast;
pub mod contract;
pub mod dispatch;
pub mod error;
pub mod execute;
pub mod fulfill;
pub mod msg;
pub mod odds;
pub mod price;
pub mod query;
pub mod reply;
pub mod settle;
pub mod state;
pub mod transport;
