pub use crate::errors::{HarnessError, Result};

pub mod cli;
pub mod compare;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod errors;
pub mod fixture;
pub mod harness;
pub mod normalize;
pub mod report;
pub mod runner;
pub mod scratch;
pub mod suite;
