//! Daily mining benefit distribution.

pub mod bookkeeping;
pub mod reward;
pub mod transferring;
