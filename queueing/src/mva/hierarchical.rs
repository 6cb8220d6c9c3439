//! Two-level decomposition of a closed network into flow-equivalent groups.
//!
//! The network consists of `G` groups of `n` identical stations. Each group is replaced by a single
//! flow-equivalent station whose service time depends on how many customers it holds:
//!
//! 1. _Subnetwork curve:_ solve one group on its own at every population `j ∈ [1, K]` and record
//!    its throughput `X_sub(j)` in a [ThroughputCurve]. Every population is an independent exact
//!    solve, so building the curve costs `O(K²·n)`.
//! 2. _Upper level:_ run the exact recurrence over the `G` flow-equivalent stations. At network
//!    population `k` each group is assumed to hold `round(k/G)` customers (clamped to `[1, K]`)
//!    and serves with mean time `1/X_sub(round(k/G))`.
//!
//! The per-group population is an approximation of flow-equivalent aggregation, not a multi-class
//! result. With a single group the decomposition reproduces [super::Network::solve] exactly.

use super::{Network, Solution, State};
use crate::{Error, CYCLE_TIME_EPSILON};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shape of a grouped network.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of groups (`G`).
    pub groups: usize,

    /// Number of stations inside every group.
    pub nodes_per_group: usize,

    /// Service rate of every station (`μ`).
    pub service_rate: f64,

    /// Customers circulating through the whole network (`K`).
    pub population: usize,
}

impl Config {
    /// Check the configuration and return the network describing a single group.
    pub fn validate(&self) -> Result<Network, Error> {
        if self.groups == 0 {
            return Err(Error::NoGroups);
        }
        if self.population == 0 {
            return Err(Error::NoCustomers);
        }
        Network::new(self.nodes_per_group, self.service_rate)
    }
}

/// Throughput of one subnetwork at every population `1..=K`.
#[derive(Clone, Debug, PartialEq)]
pub struct ThroughputCurve {
    throughputs: Vec<f64>,
}

impl ThroughputCurve {
    /// Solve `subnetwork` independently at every population up to `population`.
    pub fn build(subnetwork: &Network, population: usize) -> Self {
        let throughputs = (1..=population)
            .map(|local| subnetwork.solve(local).throughput)
            .collect();
        Self { throughputs }
    }

    /// Largest population covered by the curve.
    pub fn len(&self) -> usize {
        self.throughputs.len()
    }

    /// Returns true if the curve covers no population.
    pub fn is_empty(&self) -> bool {
        self.throughputs.is_empty()
    }

    /// Throughput of the subnetwork holding `population` customers.
    pub fn get(&self, population: usize) -> Option<f64> {
        let index = population.checked_sub(1)?;
        self.throughputs.get(index).copied()
    }

    /// Mean service time of the flow-equivalent station holding `population` customers.
    ///
    /// Returns `None` if the curve does not cover `population` or the subnetwork is not serving.
    pub fn service_time(&self, population: usize) -> Option<f64> {
        self.get(population)
            .filter(|throughput| *throughput > CYCLE_TIME_EPSILON)
            .map(f64::recip)
    }
}

impl From<Vec<f64>> for ThroughputCurve {
    /// Interpret `throughputs[j]` as the throughput at population `j + 1`.
    fn from(throughputs: Vec<f64>) -> Self {
        Self { throughputs }
    }
}

/// Customers assumed to sit in each group when the network holds `population` customers.
fn local_population(population: usize, groups: usize, max: usize) -> usize {
    let share = (population as f64 / groups as f64).round() as usize;
    share.clamp(1, max)
}

/// Solve the grouped network described by `cfg`.
///
/// Invalid configurations solve to zeros.
pub fn solve(cfg: &Config) -> Solution {
    let Ok(subnetwork) = cfg.validate() else {
        return Solution::default();
    };
    let curve = ThroughputCurve::build(&subnetwork, cfg.population);
    debug!(
        groups = cfg.groups,
        nodes_per_group = cfg.nodes_per_group,
        population = cfg.population,
        "built subnetwork curve"
    );

    // A group that cannot serve behaves like its stations visited back to back.
    let fallback = subnetwork.service_time() * cfg.nodes_per_group as f64;
    let mut state = State::empty(cfg.groups);
    let mut solution = Solution::default();
    for population in 1..=cfg.population {
        let local = local_population(population, cfg.groups, cfg.population);
        let service_time = curve.service_time(local).unwrap_or_else(|| {
            debug!(population, local, fallback, "subnetwork not serving");
            fallback
        });
        let (next, step) = state.advance(service_time);
        state = next;
        solution = step.into();
    }
    solution
}

/// Mean network delay `T(K)` of `groups` groups of `nodes_per_group` stations, `0.0` for invalid
/// inputs.
pub fn delay(service_rate: f64, groups: usize, nodes_per_group: usize, population: usize) -> f64 {
    solve(&Config {
        groups,
        nodes_per_group,
        service_rate,
        population,
    })
    .cycle_time
}
