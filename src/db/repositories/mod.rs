pub mod asset;
pub mod ledger;
pub mod user;
