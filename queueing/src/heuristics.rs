//! Approximations for open networks built from single-server queues.
//!
//! The delay formulas treat every node as an unbounded M/M/1 queue that sees the full arrival
//! stream. They return [f64::INFINITY] as soon as any stage is overloaded and keep returning it
//! through every formula that depends on that stage.
//!
//! [Method] attaches a structural correction factor to the exact [birth_death::throughput] of a
//! single queue. The factors carry the names of the classical closed-network algorithms so that
//! results line up with existing reports, but they are fixed scalings and not those algorithms
//! (see [crate::mva] for the exact Mean Value Analysis).

use crate::{birth_death, UTILIZATION_EPSILON};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean delay of a single unbounded queue.
///
/// With no arrivals this is the bare service time `1/μ`.
pub fn mm1_delay(arrival_rate: f64, service_rate: f64) -> f64 {
    if arrival_rate < 0.0 || service_rate <= 0.0 {
        return 0.0;
    }
    if arrival_rate == 0.0 {
        return service_rate.recip();
    }
    if arrival_rate >= service_rate {
        return f64::INFINITY;
    }
    (service_rate - arrival_rate).recip()
}

/// Throughput of `servers` parallel servers sharing one unbounded queue.
///
/// Arrivals are served in full until the offered load reaches the combined capacity `c·μ`.
///
/// # Example
///
/// ```
/// use commonware_queueing::heuristics::multi_server_throughput;
///
/// assert_eq!(multi_server_throughput(4.0, 5.0, 2), 4.0);
/// assert_eq!(multi_server_throughput(12.0, 5.0, 2), 10.0);
/// ```
pub fn multi_server_throughput(arrival_rate: f64, service_rate: f64, servers: u32) -> f64 {
    if arrival_rate <= 0.0 || service_rate <= 0.0 || servers == 0 {
        return 0.0;
    }
    let capacity = f64::from(servers) * service_rate;
    if arrival_rate / capacity >= 1.0 {
        return capacity;
    }
    arrival_rate
}

/// Mean end-to-end delay across `nodes` identical unbounded queues in series.
pub fn series_delay(arrival_rate: f64, service_rate: f64, nodes: u32) -> f64 {
    if arrival_rate < 0.0 || service_rate <= 0.0 || nodes == 0 {
        return 0.0;
    }
    let nodes = f64::from(nodes);
    if arrival_rate.abs() < UTILIZATION_EPSILON {
        return nodes * service_rate.recip();
    }
    if arrival_rate >= service_rate {
        return f64::INFINITY;
    }
    nodes * (service_rate - arrival_rate).recip()
}

/// Mean delay across `groups` groups of `nodes_per_group` queues.
///
/// Arrivals split evenly across groups. Each group is a [series_delay] whose inverse acts as the
/// service rate of the group. A customer then crosses the `groups − 1` links between groups, each
/// modelled as an unbounded queue served at that rate.
pub fn hierarchical_series_delay(
    arrival_rate: f64,
    service_rate: f64,
    groups: u32,
    nodes_per_group: u32,
) -> f64 {
    if arrival_rate < 0.0 || service_rate <= 0.0 || groups == 0 || nodes_per_group == 0 {
        return 0.0;
    }
    let per_group = arrival_rate / f64::from(groups);
    let intra = series_delay(per_group, service_rate, nodes_per_group);
    if intra.is_infinite() {
        return f64::INFINITY;
    }

    let group_rate = intra.recip();
    if per_group >= group_rate {
        return f64::INFINITY;
    }
    let inter = f64::from(groups - 1) * (group_rate - per_group).recip();
    intra + inter
}

/// Throughput of an ad hoc network where every node contends for one shared channel.
///
/// Each additional node costs 10% efficiency and the result never exceeds the channel rate.
pub fn adhoc_throughput(load: f64, data_rate: f64, nodes: u32) -> f64 {
    if load < 0.0 || data_rate <= 0.0 || nodes == 0 {
        return 0.0;
    }
    let efficiency = 1.0 / (1.0 + 0.1 * f64::from(nodes - 1));
    (load * data_rate * efficiency).min(data_rate)
}

/// Throughput of a grouped network where traffic is aggregated per group.
///
/// Each additional group costs 5% efficiency, bottoming out at 50%, and the result never exceeds
/// the channel rate.
pub fn group_throughput(load: f64, data_rate: f64, groups: u32) -> f64 {
    if load < 0.0 || data_rate <= 0.0 || groups == 0 {
        return 0.0;
    }
    let efficiency = (1.0 - 0.05 * f64::from(groups - 1)).max(0.5);
    (load * data_rate * efficiency).min(data_rate)
}

/// A named throughput estimate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// The exact single-queue solution, unscaled.
    GlobalBalance,
    /// Scaled by `1 − e^(−N/3)`.
    GordonNewell,
    /// Scaled by `N/(N+2)`.
    Buzen,
    /// Scaled by `N/(N+1)`.
    MeanValueAnalysis,
}

impl Method {
    /// Every method, in reporting order.
    pub const ALL: [Method; 4] = [
        Method::MeanValueAnalysis,
        Method::GlobalBalance,
        Method::GordonNewell,
        Method::Buzen,
    ];

    /// Name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GlobalBalance => "GlobalBalance",
            Self::GordonNewell => "GordonNewell",
            Self::Buzen => "Buzen",
            Self::MeanValueAnalysis => "MeanValueAnalysis",
        }
    }

    /// Correction factor applied for a network of `nodes` nodes (or groups).
    pub fn factor(&self, nodes: u32) -> f64 {
        let n = f64::from(nodes);
        match self {
            Self::GlobalBalance => 1.0,
            Self::GordonNewell => 1.0 - (-n / 3.0).exp(),
            Self::Buzen => n / (n + 2.0),
            Self::MeanValueAnalysis => n / (n + 1.0),
        }
    }

    /// Estimated throughput of a queue with the given rates and capacity inside a network of
    /// `nodes` nodes.
    pub fn throughput(
        &self,
        arrival_rate: f64,
        service_rate: f64,
        capacity: u32,
        nodes: u32,
    ) -> f64 {
        if nodes == 0 {
            return 0.0;
        }
        birth_death::throughput(arrival_rate, service_rate, capacity) * self.factor(nodes)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
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
    fn test_mm1_delay() {
        assert_close(mm1_delay(2.0, 5.0), 1.0 / 3.0);
        assert_eq!(mm1_delay(0.0, 5.0), 0.2);
        assert_eq!(mm1_delay(5.0, 5.0), f64::INFINITY);
        assert_eq!(mm1_delay(6.0, 5.0), f64::INFINITY);
        assert_eq!(mm1_delay(-1.0, 5.0), 0.0);
        assert_eq!(mm1_delay(1.0, 0.0), 0.0);
    }

    #[test]
    fn test_multi_server_throughput() {
        assert_eq!(multi_server_throughput(4.0, 5.0, 1), 4.0);
        assert_eq!(multi_server_throughput(12.0, 5.0, 2), 10.0);
        assert_eq!(multi_server_throughput(12.0, 5.0, 3), 12.0);
        assert_eq!(multi_server_throughput(12.0, 5.0, 0), 0.0);
        assert_eq!(multi_server_throughput(0.0, 5.0, 2), 0.0);
    }

    #[test]
    fn test_series_delay() {
        assert_close(series_delay(2.0, 5.0, 3), 1.0);
        assert_close(series_delay(0.0, 5.0, 4), 0.8);
        assert_eq!(series_delay(5.0, 5.0, 3), f64::INFINITY);
        assert_eq!(series_delay(2.0, 5.0, 0), 0.0);
        assert_eq!(series_delay(2.0, 0.0, 3), 0.0);
    }

    #[test]
    fn test_hierarchical_series_delay() {
        // λ per group = 1, intra = 3 · 1/4 = 0.75, group rate = 4/3, inter = 2 / (4/3 − 1) = 6
        assert_close(hierarchical_series_delay(3.0, 5.0, 3, 3), 6.75);

        // A single group has no inter-group links.
        assert_close(
            hierarchical_series_delay(0.5, 5.0, 1, 4),
            series_delay(0.5, 5.0, 4),
        );
    }

    #[test]
    fn test_hierarchical_series_instability() {
        // Unstable intra-group stage.
        let delay = hierarchical_series_delay(18.0, 5.0, 3, 3);
        assert_eq!(delay, f64::INFINITY);

        // Stable nodes, but the aggregate group cannot keep up: intra = 3/3 = 1, rate = 1 < 2.
        let delay = hierarchical_series_delay(6.0, 5.0, 3, 3);
        assert_eq!(delay, f64::INFINITY);
        assert!(!delay.is_nan());
    }

    #[test_case(-1.0, 5.0, 3, 3; "negative arrival rate")]
    #[test_case(1.0, 0.0, 3, 3; "zero service rate")]
    #[test_case(1.0, 5.0, 0, 3; "no groups")]
    #[test_case(1.0, 5.0, 3, 0; "no nodes")]
    fn test_hierarchical_series_degenerate(
        arrival_rate: f64,
        service_rate: f64,
        groups: u32,
        nodes: u32,
    ) {
        assert_eq!(
            hierarchical_series_delay(arrival_rate, service_rate, groups, nodes),
            0.0
        );
    }

    #[test]
    fn test_method_factors() {
        assert_eq!(Method::GlobalBalance.factor(9), 1.0);
        assert_close(Method::GordonNewell.factor(3), 1.0 - (-1.0f64).exp());
        assert_close(Method::Buzen.factor(3), 0.6);
        assert_close(Method::MeanValueAnalysis.factor(9), 0.9);

        // Every factor approaches one as the network grows.
        for method in Method::ALL {
            assert!(method.factor(10_000) > 0.999, "{method}");
        }
    }

    #[test]
    fn test_method_throughput() {
        let base = birth_death::throughput(5.0, 5.0, 3);
        assert_eq!(Method::GlobalBalance.throughput(5.0, 5.0, 3, 9), base);
        assert_close(Method::Buzen.throughput(5.0, 5.0, 3, 2), base * 0.5);
        assert_close(
            Method::MeanValueAnalysis.throughput(5.0, 5.0, 3, 3),
            base * 0.75,
        );
        for method in Method::ALL {
            assert_eq!(method.throughput(5.0, 5.0, 3, 0), 0.0);
            assert_eq!(method.throughput(0.0, 5.0, 3, 3), 0.0);
            assert_eq!(method.throughput(5.0, -1.0, 3, 3), 0.0);
        }
    }

    #[test]
    fn test_specialised_models() {
        assert_close(adhoc_throughput(0.5, 5.0, 1), 2.5);
        assert_close(adhoc_throughput(0.5, 5.0, 11), 1.25);
        assert_eq!(adhoc_throughput(4.0, 5.0, 1), 5.0);
        assert_eq!(adhoc_throughput(0.5, 5.0, 0), 0.0);

        assert_close(group_throughput(0.5, 5.0, 3), 2.25);
        assert_close(group_throughput(0.5, 5.0, 50), 1.25);
        assert_eq!(group_throughput(4.0, 5.0, 1), 5.0);
        assert_eq!(group_throughput(-0.1, 5.0, 3), 0.0);
    }
}
