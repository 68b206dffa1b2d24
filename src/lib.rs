pub mod alert;
pub mod batch;
pub mod cli;
pub mod config;
pub mod delivery;
pub mod filter;
pub mod pipeline;
pub mod source;
