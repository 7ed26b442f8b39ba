pub mod ping;
pub mod usage;
