//! Wiresight - Transparent HTTP(S) client traffic inspector
//!
//! Records outgoing request and incoming response data for every request
//! issued through an instrumented client module, without changing the
//! behavior the caller observes. A debugging and testing aid, not a proxy.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::multiple_crate_versions
)]

pub mod chunk;
pub mod config;
pub mod error;
pub mod inspect;
pub mod log;
pub mod record;

pub use chunk::Chunk;
pub use error::{Result, WiresightError};
pub use inspect::{inspect, InspectParams, Module, RequestOptions, Scheme};
pub use log::{RequestLog, DEFAULT_MAX_REQUESTS};
pub use record::Record;
