//! EastMoney web endpoints: the hot-rank list and the A-share spot board.

pub mod params;
pub mod provider;
pub mod response;

pub use provider::EastMoneyProvider;
