pub mod config;
pub mod run;

pub use run::{build_state, run, run_graceful_with_state, run_with_state};
