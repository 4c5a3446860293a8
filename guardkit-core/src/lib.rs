//! Client-side implementation of the platform's mobile "Guard" two-factor
//! protocol for multi-account fleets: deterministic one-time codes, signed
//! confirmation requests, fleet-wide clock-skew compensation, and resilient
//! confirmation handling against a batch endpoint that fails
//! non-deterministically.
//!
//! Session management and wire transport are external collaborators: the
//! hosting process implements [`rpc::GuardRpc`] per account and injects one
//! [`GuardServices`] instance per process.
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

mod authenticator;
pub use authenticator::*;

mod cache;
pub use cache::*;

mod clock;
pub use clock::*;

mod code;
pub use code::*;

mod config;
pub use config::*;

mod confirmation;
pub use confirmation::*;

mod error;
pub use error::*;

mod gate;
pub use gate::*;

mod services;
pub use services::*;

mod signing;
pub use signing::*;

pub mod rpc;
