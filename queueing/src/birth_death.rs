//! Closed-form evaluation of a single-server queue with Poisson arrivals and exponential service.
//!
//! A queue has arrival rate `λ`, service rate `μ`, and a total [Capacity] `K` (customers waiting
//! plus the one in service). With `ρ = λ/μ` the stationary distribution of the occupancy `n` is
//! `p_n = p_0·ρ^n` for `n ∈ [0, K]`, so every measure below follows from `p_0`:
//!
//! * blocking probability: `p_K = p_0·ρ^K`
//! * throughput: `λ·(1 − p_K)`
//! * mean occupancy: `L = ρ·(1 − (K+1)ρ^K + Kρ^(K+1)) / ((1 − ρ)(1 − ρ^(K+1)))`
//! * mean delay: `L / throughput` (Little's Law)
//!
//! An unbounded queue (`K = 0`) is stable only while `ρ < 1`. Past that point throughput saturates
//! at `μ` and occupancy and delay are infinite.
//!
//! # Example
//!
//! ```
//! use commonware_queueing::birth_death::{self, QueueParameters};
//!
//! // When arrivals match service, each of the 4 states is equally likely.
//! let queue = QueueParameters::new(5.0, 5.0, 3).unwrap();
//! assert_eq!(queue.blocking_probability(), 0.25);
//! assert_eq!(queue.throughput(), 3.75);
//!
//! // The free functions degrade to zero instead of failing.
//! assert_eq!(birth_death::throughput(-1.0, 5.0, 3), 0.0);
//! ```

use crate::{check_service_rate, Error, UTILIZATION_EPSILON};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use tracing::debug;

/// The number of customers a queue can hold, including the one in service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capacity {
    /// No customer is ever turned away.
    #[default]
    Unbounded,
    /// Arrivals that find `K` customers present are lost.
    Bounded(NonZeroU32),
}

impl Capacity {
    /// Returns `K`, or `0` if the queue is unbounded.
    pub fn get(&self) -> u32 {
        match self {
            Self::Unbounded => 0,
            Self::Bounded(k) => k.get(),
        }
    }
}

impl From<u32> for Capacity {
    /// A capacity of `0` means unbounded.
    fn from(value: u32) -> Self {
        NonZeroU32::new(value).map_or(Self::Unbounded, Self::Bounded)
    }
}

/// Inputs of a single queue.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueueParameters {
    /// Rate at which customers arrive (`λ`).
    pub arrival_rate: f64,

    /// Rate at which the server completes customers (`μ`).
    pub service_rate: f64,

    /// Total capacity of the queue (`K`).
    pub capacity: Capacity,
}

impl QueueParameters {
    /// Create validated queue parameters, where a `capacity` of `0` means unbounded.
    ///
    /// Fails if `arrival_rate` is negative (or not finite) or if `service_rate` is not positive.
    pub fn new(arrival_rate: f64, service_rate: f64, capacity: u32) -> Result<Self, Error> {
        if !(arrival_rate.is_finite() && arrival_rate >= 0.0) {
            return Err(Error::InvalidArrivalRate(arrival_rate));
        }
        check_service_rate(service_rate)?;
        Ok(Self {
            arrival_rate,
            service_rate,
            capacity: capacity.into(),
        })
    }

    /// Returns true if no customer can ever be served (no arrivals or no server).
    fn is_idle(&self) -> bool {
        !(self.arrival_rate > 0.0 && self.service_rate > 0.0)
    }

    /// Offered load `ρ = λ/μ`.
    pub fn utilization(&self) -> f64 {
        if self.is_idle() {
            return 0.0;
        }
        self.arrival_rate / self.service_rate
    }

    /// Probability that the queue is empty (`p_0`).
    pub fn empty_probability(&self) -> f64 {
        if self.is_idle() {
            return 1.0;
        }
        let rho = self.utilization();
        match self.capacity {
            Capacity::Unbounded => (1.0 - rho).max(0.0),
            Capacity::Bounded(k) => {
                let k = f64::from(k.get());
                if (rho - 1.0).abs() < UTILIZATION_EPSILON {
                    return 1.0 / (k + 1.0);
                }
                if overflows(rho, k) {
                    // p_0 = p_K·(1/ρ)^K
                    return reflected_blocking(rho, k) * rho.recip().powf(k);
                }
                (1.0 - rho) / (1.0 - rho.powf(k + 1.0))
            }
        }
    }

    /// Probability that an arrival finds the queue full (`p_K`).
    ///
    /// An unbounded queue never blocks.
    pub fn blocking_probability(&self) -> f64 {
        if self.is_idle() {
            return 0.0;
        }
        let Capacity::Bounded(k) = self.capacity else {
            return 0.0;
        };
        let k = f64::from(k.get());
        let rho = self.utilization();
        if !overflows(rho, k) {
            let blocking = self.empty_probability() * rho.powf(k);
            if blocking.is_finite() {
                return blocking;
            }
        }
        debug!(rho, capacity = k, "reflecting overflowing blocking probability");
        reflected_blocking(rho, k)
    }

    /// Rate at which customers are admitted (and, in steady state, served).
    pub fn throughput(&self) -> f64 {
        if self.is_idle() {
            return 0.0;
        }
        match self.capacity {
            Capacity::Unbounded => {
                if self.utilization() < 1.0 {
                    self.arrival_rate
                } else {
                    self.service_rate
                }
            }
            Capacity::Bounded(_) => self.arrival_rate * (1.0 - self.blocking_probability()),
        }
    }

    /// Mean number of customers in the queue, including the one in service.
    pub fn mean_occupancy(&self) -> f64 {
        if self.is_idle() {
            return 0.0;
        }
        let rho = self.utilization();
        match self.capacity {
            Capacity::Unbounded => {
                if rho < 1.0 {
                    rho / (1.0 - rho)
                } else {
                    f64::INFINITY
                }
            }
            Capacity::Bounded(k) => bounded_occupancy(rho, f64::from(k.get())),
        }
    }

    /// Mean time a served customer spends in the queue.
    ///
    /// Returns `0.0` when the queue never holds anyone and [f64::INFINITY] when it is unstable.
    pub fn mean_delay(&self) -> f64 {
        let occupancy = self.mean_occupancy();
        if occupancy <= 0.0 {
            return 0.0;
        }
        if occupancy.is_infinite() {
            return f64::INFINITY;
        }
        let throughput = self.throughput();
        if throughput <= 0.0 {
            return f64::INFINITY;
        }
        occupancy / throughput
    }
}

/// Returns true if `ρ^(K+1)` does not fit in an `f64`.
fn overflows(rho: f64, k: f64) -> bool {
    !rho.powf(k + 1.0).is_finite()
}

/// Blocking probability of an overloaded queue, from the distribution reflected around `K`
/// (`p_n ∝ (1/ρ)^(K−n)`).
fn reflected_blocking(rho: f64, k: f64) -> f64 {
    let r = rho.recip();
    (1.0 - r) / (1.0 - r.powf(k + 1.0))
}

/// Mean occupancy of a queue with capacity `k` and positive load `rho`.
fn bounded_occupancy(rho: f64, k: f64) -> f64 {
    if (rho - 1.0).abs() < UTILIZATION_EPSILON {
        return k / 2.0;
    }
    if !overflows(rho, k) {
        let rho_k = rho.powf(k);
        let rho_k1 = rho_k * rho;
        let numerator = rho * (1.0 - (k + 1.0) * rho_k + k * rho_k1);
        let denominator = (1.0 - rho) * (1.0 - rho_k1);
        if denominator == 0.0 {
            return k;
        }
        let occupancy = numerator / denominator;
        if occupancy.is_finite() {
            return occupancy;
        }
    }

    // The empty slots of a heavily loaded queue behave like customers of a lightly loaded one.
    debug!(rho, capacity = k, "reflecting overflowing occupancy");
    k - bounded_occupancy(rho.recip(), k)
}

/// Effective throughput of a queue, `0.0` for invalid inputs.
pub fn throughput(arrival_rate: f64, service_rate: f64, capacity: u32) -> f64 {
    params(arrival_rate, service_rate, capacity).map_or(0.0, |q| q.throughput())
}

/// Blocking probability of a queue, `0.0` for invalid inputs or an unbounded queue.
pub fn blocking_probability(arrival_rate: f64, service_rate: f64, capacity: u32) -> f64 {
    params(arrival_rate, service_rate, capacity).map_or(0.0, |q| q.blocking_probability())
}

/// Mean occupancy of a queue, `0.0` for invalid inputs.
pub fn mean_occupancy(arrival_rate: f64, service_rate: f64, capacity: u32) -> f64 {
    params(arrival_rate, service_rate, capacity).map_or(0.0, |q| q.mean_occupancy())
}

/// Mean delay of a queue, `0.0` for invalid inputs.
pub fn mean_delay(arrival_rate: f64, service_rate: f64, capacity: u32) -> f64 {
    params(arrival_rate, service_rate, capacity).map_or(0.0, |q| q.mean_delay())
}

fn params(arrival_rate: f64, service_rate: f64, capacity: u32) -> Option<QueueParameters> {
    QueueParameters::new(arrival_rate, service_rate, capacity).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_capacity_from_u32() {
        assert_eq!(Capacity::from(0), Capacity::Unbounded);
        assert_eq!(Capacity::from(3).get(), 3);
        assert_eq!(Capacity::Unbounded.get(), 0);
    }

    #[test]
    fn test_saturated_queue() {
        let queue = QueueParameters::new(5.0, 5.0, 3).unwrap();
        assert_eq!(queue.empty_probability(), 0.25);
        assert_eq!(queue.blocking_probability(), 0.25);
        assert_eq!(queue.throughput(), 3.75);
        assert_eq!(queue.mean_occupancy(), 1.5);
        assert_close(queue.mean_delay(), 1.5 / 3.75);
    }

    #[test]
    fn test_bounded_queue() {
        // ρ = 0.5, K = 2: p = [4/7, 2/7, 1/7]
        let queue = QueueParameters::new(1.0, 2.0, 2).unwrap();
        assert_close(queue.empty_probability(), 4.0 / 7.0);
        assert_close(queue.blocking_probability(), 1.0 / 7.0);
        assert_close(queue.throughput(), 6.0 / 7.0);
        assert_close(queue.mean_occupancy(), 4.0 / 7.0);
        assert_close(queue.mean_delay(), (4.0 / 7.0) / (6.0 / 7.0));
    }

    #[test]
    fn test_unbounded_queue() {
        assert_eq!(throughput(2.0, 5.0, 0), 2.0);
        assert_close(mean_occupancy(2.0, 5.0, 0), 2.0 / 3.0);
        assert_close(mean_delay(2.0, 5.0, 0), 1.0 / 3.0);
        assert_eq!(blocking_probability(2.0, 5.0, 0), 0.0);
        assert_close(
            QueueParameters::new(2.0, 5.0, 0).unwrap().empty_probability(),
            0.6,
        );
    }

    #[test]
    fn test_unbounded_overload() {
        assert_eq!(throughput(5.0, 5.0, 0), 5.0);
        assert_eq!(throughput(8.0, 5.0, 0), 5.0);
        assert_eq!(mean_occupancy(8.0, 5.0, 0), f64::INFINITY);
        assert_eq!(mean_delay(8.0, 5.0, 0), f64::INFINITY);
    }

    #[test_case(-1.0, 5.0, 3; "negative arrival rate")]
    #[test_case(1.0, 0.0, 3; "zero service rate")]
    #[test_case(1.0, -2.0, 0; "negative service rate")]
    #[test_case(0.0, 5.0, 3; "no arrivals")]
    #[test_case(f64::NAN, 5.0, 3; "nan arrival rate")]
    fn test_degenerate_inputs(arrival_rate: f64, service_rate: f64, capacity: u32) {
        assert_eq!(throughput(arrival_rate, service_rate, capacity), 0.0);
        assert_eq!(mean_occupancy(arrival_rate, service_rate, capacity), 0.0);
        assert_eq!(mean_delay(arrival_rate, service_rate, capacity), 0.0);
        assert_eq!(blocking_probability(arrival_rate, service_rate, capacity), 0.0);
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            QueueParameters::new(-1.0, 5.0, 3),
            Err(Error::InvalidArrivalRate(-1.0))
        );
        assert_eq!(
            QueueParameters::new(1.0, 0.0, 3),
            Err(Error::InvalidServiceRate(0.0))
        );
        assert!(QueueParameters::new(0.0, 5.0, 3).is_ok());
    }

    #[test]
    fn test_throughput_bounded_by_arrivals() {
        for capacity in [0, 1, 3, 10, 100] {
            let mut previous = 0.0;
            for step in 0..200 {
                let arrival_rate = step as f64 * 0.05;
                let served = throughput(arrival_rate, 5.0, capacity);
                assert!(served <= arrival_rate, "K={capacity} λ={arrival_rate}");
                if arrival_rate < 5.0 {
                    assert!(served >= previous, "K={capacity} λ={arrival_rate}");
                }
                previous = served;
            }
        }
    }

    #[test]
    fn test_littles_law() {
        for (arrival_rate, capacity) in [(1.0, 1), (4.0, 5), (7.5, 20), (12.0, 3)] {
            let queue = QueueParameters::new(arrival_rate, 5.0, capacity).unwrap();
            assert_close(
                queue.mean_delay() * queue.throughput(),
                queue.mean_occupancy(),
            );
        }
    }

    #[test]
    fn test_large_capacity_approaches_unbounded() {
        assert_close(mean_occupancy(2.0, 5.0, 1000), mean_occupancy(2.0, 5.0, 0));
        assert_close(throughput(2.0, 5.0, 1000), 2.0);
    }

    #[test]
    fn test_overflowing_load() {
        // 30^1001 does not fit in an f64.
        let queue = QueueParameters::new(30.0, 1.0, 1000).unwrap();
        assert_close(queue.blocking_probability(), 29.0 / 30.0);
        assert_close(queue.throughput(), 1.0);
        assert_close(queue.mean_occupancy(), 1000.0 - 1.0 / 29.0);
        assert!(queue.mean_delay().is_finite());
    }

    #[test_case(1022; "power fits")]
    #[test_case(1023; "only the next power overflows")]
    #[test_case(1024; "both powers overflow")]
    fn test_overflow_boundary(capacity: u32) {
        // 2^1023 is the largest power of two an f64 holds.
        let queue = QueueParameters::new(2.0, 1.0, capacity).unwrap();
        let k = f64::from(capacity);
        assert!(queue.empty_probability() >= 0.0);
        assert!(queue.empty_probability() < 1e-300);
        assert_close(queue.blocking_probability(), 0.5);
        assert_close(queue.throughput(), 1.0);
        assert!(queue.throughput() <= 1.0);
        assert_close(queue.mean_occupancy(), k - 1.0);
        assert_close(queue.mean_delay(), k - 1.0);
    }
}
