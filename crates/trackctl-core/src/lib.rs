pub mod block;
pub mod changelog;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod milestone_doc;
pub mod refs;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use client::Client;
pub use error::{Result, TrackError};
