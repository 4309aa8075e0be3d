pub mod models;
pub mod services;
pub mod transport;
pub mod cli;
pub mod utils;

pub use anyhow::{Error, Result};
