//! Credit Lines
//!
//! Selective disclosure of credit lines and deposits/loans between companies:
//! - [`sharing`]: decides whether a change to a record or its sharing
//!   configuration sends a share, a revoke or nothing
//! - [`request_client`]: sends those messages over the bus
//! - [`requests`]: disclosure request workflows
//! - [`processing`]: consumes messages from other companies and settles each
//!   delivery exactly once

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod data;
pub mod error;
pub mod messages;
pub mod metrics;
pub mod models;
pub mod processing;
pub mod request_client;
pub mod requests;
pub mod sharing;

pub use error::{Error, Result};
