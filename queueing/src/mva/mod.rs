//! Exact Mean Value Analysis of closed networks.
//!
//! A closed network circulates a fixed population of `K` customers through `N` single-server
//! stations. There are no external arrivals: the population is an input, not something derived
//! from an arrival rate. Every station here has the same mean service time `S = 1/μ` and is
//! visited once per cycle.
//!
//! The solver adds one customer at a time. By the arrival theorem, a customer arriving at a station
//! in a network with `k` customers finds the mean queue length of the same network with `k − 1`
//! customers, so population `k` only needs the [State] at `k − 1`:
//!
//! 1. residence time `R_i(k) = S·(1 + Q_i(k−1))`
//! 2. cycle time `T(k) = Σ e_i·R_i(k)`
//! 3. throughput `X(k) = k / T(k)`
//! 4. queue length `Q_i(k) = X(k)·e_i·R_i(k)`
//!
//! Solving population `K` costs `O(K·N)`.
//!
//! # Example
//!
//! ```
//! use commonware_queueing::mva::Network;
//!
//! // Two stations serving one customer per second, shared by two customers.
//! let network = Network::new(2, 1.0).unwrap();
//! let solution = network.solve(2);
//! assert_eq!(solution.cycle_time, 3.0);
//! assert_eq!(solution.throughput, 2.0 / 3.0);
//!
//! // Every intermediate population is available as well.
//! let cycle_times: Vec<f64> = network.steps(2).map(|step| step.cycle_time).collect();
//! assert_eq!(cycle_times, vec![2.0, 3.0]);
//! ```

use crate::{check_service_rate, Error, CYCLE_TIME_EPSILON};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub mod hierarchical;

/// Visits a customer pays to each station per cycle.
const VISIT_RATIO: f64 = 1.0;

/// Mean queue length of every station at one population.
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    population: usize,
    queue_lengths: Vec<f64>,
}

impl State {
    /// The state of a network of `stations` stations holding no customers.
    pub fn empty(stations: usize) -> Self {
        Self {
            population: 0,
            queue_lengths: vec![0.0; stations],
        }
    }

    /// Number of customers this state describes.
    pub fn population(&self) -> usize {
        self.population
    }

    /// Mean number of customers at each station.
    pub fn queue_lengths(&self) -> &[f64] {
        &self.queue_lengths
    }

    /// Add one customer to a network whose stations all have mean service time `service_time`.
    ///
    /// Returns the state at the next population and the measures computed on the way there.
    pub fn advance(&self, service_time: f64) -> (Self, Step) {
        let population = self.population + 1;
        let residence_times: Vec<f64> = self
            .queue_lengths
            .iter()
            .map(|queue_length| service_time * (1.0 + queue_length))
            .collect();
        let cycle_time: f64 = residence_times
            .iter()
            .map(|residence_time| VISIT_RATIO * residence_time)
            .sum();
        let throughput = if cycle_time > CYCLE_TIME_EPSILON {
            population as f64 / cycle_time
        } else {
            debug!(population, cycle_time, "cycle time vanished");
            0.0
        };
        // A station nobody reaches holds no customers, even if its residence time is unbounded.
        let queue_lengths = residence_times
            .iter()
            .map(|residence_time| {
                if throughput > 0.0 {
                    throughput * VISIT_RATIO * residence_time
                } else {
                    0.0
                }
            })
            .collect();
        trace!(population, cycle_time, throughput, "advanced population");

        (
            Self {
                population,
                queue_lengths,
            },
            Step {
                population,
                cycle_time,
                throughput,
            },
        )
    }
}

/// Network-wide measures at one population.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    /// Number of customers in the network.
    pub population: usize,

    /// Mean time for a customer to complete one cycle (`T(k)`).
    pub cycle_time: f64,

    /// Rate at which customers complete cycles (`X(k)`).
    pub throughput: f64,
}

/// Network-wide measures at the target population.
///
/// A degenerate network (no stations, no customers, no service) solves to all zeros.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Mean network delay `T(K)`.
    pub cycle_time: f64,

    /// System throughput `X(K)`.
    pub throughput: f64,
}

impl From<Step> for Solution {
    fn from(step: Step) -> Self {
        Self {
            cycle_time: step.cycle_time,
            throughput: step.throughput,
        }
    }
}

/// A closed network of identical stations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Network {
    stations: usize,
    service_time: f64,
}

impl Network {
    /// Create a network of `stations` stations, each serving `service_rate` customers per unit
    /// of time.
    pub fn new(stations: usize, service_rate: f64) -> Result<Self, Error> {
        if stations == 0 {
            return Err(Error::NoStations);
        }
        check_service_rate(service_rate)?;
        Ok(Self {
            stations,
            service_time: service_rate.recip(),
        })
    }

    /// Number of stations.
    pub fn stations(&self) -> usize {
        self.stations
    }

    /// Mean service time of every station (`1/μ`).
    pub fn service_time(&self) -> f64 {
        self.service_time
    }

    /// Iterate over the measures at populations `1..=population`.
    pub fn steps(&self, population: usize) -> Steps {
        Steps {
            state: State::empty(self.stations),
            service_time: self.service_time,
            remaining: population,
        }
    }

    /// Solve the network at `population`.
    pub fn solve(&self, population: usize) -> Solution {
        self.steps(population)
            .last()
            .map_or_else(Solution::default, Solution::from)
    }
}

/// Iterator over successive populations of a [Network].
pub struct Steps {
    state: State,
    service_time: f64,
    remaining: usize,
}

impl Steps {
    /// The state reached by the last step (the empty state before the first).
    pub fn state(&self) -> &State {
        &self.state
    }
}

impl Iterator for Steps {
    type Item = Step;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let (state, step) = self.state.advance(self.service_time);
        self.state = state;
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Steps {}

/// Solve a network of `stations` stations serving at `service_rate` with `population` customers.
///
/// Invalid inputs solve to zeros.
pub fn solve(service_rate: f64, stations: usize, population: usize) -> Solution {
    Network::new(stations, service_rate)
        .map_or_else(|_| Solution::default(), |network| network.solve(population))
}

/// Mean network delay `T(K)`, `0.0` for invalid inputs.
pub fn delay(service_rate: f64, stations: usize, population: usize) -> f64 {
    solve(service_rate, stations, population).cycle_time
}
