pub mod prelude;

pub mod assets;
pub mod transactions;
pub mod users;
