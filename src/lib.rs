#[macro_use]
extern crate tracing;

pub mod config;
pub mod digitalocean;
pub mod discovery;
mod error;
pub mod http;
pub mod inventory;
pub mod publish;
pub mod target;
#[cfg(test)]
mod testing;
pub mod trace;

pub use error::{Error, Result};

pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
