pub mod csv;
pub mod fixture;
