//! Sweeping user deposit addresses into the payment collector.

pub mod finish;
pub mod transfer;
