//! Predict throughput, delay, and loss of queueing systems.
//!
//! The crate evaluates two families of models:
//!
//! * [birth_death]: closed-form results for a single finite-capacity queue (the M/M/1/K family),
//!   together with the open-network approximations in [heuristics] that build on it.
//! * [mva]: exact Mean Value Analysis for closed product-form networks of identical stations,
//!   and a two-level decomposition ([mva::hierarchical]) that replaces each subnetwork with a
//!   flow-equivalent station.
//!
//! Every solver is a pure function of its inputs. Invalid structural inputs (a non-positive
//! service rate, zero stations, zero customers, ...) produce `0.0` rather than an error and
//! overload produces [f64::INFINITY]. Callers that must distinguish "invalid" from "valid but
//! zero" can build their inputs through the validated constructors, which return [Error].
//!
//! # Status
//!
//! `commonware-queueing` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

#![doc(
    html_logo_url = "https://commonware.xyz/imgs/rustdoc_logo.svg",
    html_favicon_url = "https://commonware.xyz/favicon.ico"
)]

use thiserror::Error;

pub mod analysis;
pub mod birth_death;
pub mod heuristics;
pub mod mva;
pub mod stats;

/// Utilization values closer than this to `1.0` are treated as exactly saturated.
pub const UTILIZATION_EPSILON: f64 = 1e-9;

/// Cycle times at or below this value are treated as zero (the network has no delay).
pub const CYCLE_TIME_EPSILON: f64 = 1e-10;

/// Errors returned by the validated constructors.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Error {
    #[error("invalid arrival rate: {0}")]
    InvalidArrivalRate(f64),
    #[error("invalid service rate: {0}")]
    InvalidServiceRate(f64),
    #[error("network has no stations")]
    NoStations,
    #[error("network has no groups")]
    NoGroups,
    #[error("network has no customers")]
    NoCustomers,
}

/// Returns an error if `rate` cannot be used as a service rate.
pub(crate) fn check_service_rate(rate: f64) -> Result<(), Error> {
    if rate.is_finite() && rate > 0.0 {
        return Ok(());
    }
    Err(Error::InvalidServiceRate(rate))
}
