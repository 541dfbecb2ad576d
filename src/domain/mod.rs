pub mod amount;
pub mod coin;
pub mod cond;
pub mod deposit;
pub mod entity;
pub mod good;
pub mod ledger;
pub mod order;
pub mod ports;
pub mod tx;
