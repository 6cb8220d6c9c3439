//! Compare analytic predictions against measured network samples.
//!
//! A measurement source runs the same offered loads against an ad hoc network (every node talks
//! directly) and a grouped network (nodes aggregated into groups) and reports one [Observation]
//! per load. [predict] evaluates every model in this crate at each observation, and [compare]
//! summarizes how the two topologies performed against each other.

use crate::{
    heuristics::{self, Method},
    mva::{self, hierarchical},
    stats,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Group size assumed when a grouped topology cannot be split evenly.
const DEFAULT_NODES_PER_GROUP: u32 = 3;

/// Throughput ratio above which one topology is considered better than the other.
const BETTER_RATIO: f64 = 1.1;

/// Throughput ratio below which one topology is considered worse than the other.
const WORSE_RATIO: f64 = 0.9;

/// Layout of the measured network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Topology {
    /// Every node forwards independently.
    AdHoc { nodes: u32 },
    /// Nodes are split into `groups` groups.
    Group { groups: u32, nodes: u32 },
}

impl Topology {
    /// Number of nodes (ad hoc) or groups (grouped) the named heuristics scale by.
    pub fn size(&self) -> u32 {
        match self {
            Self::AdHoc { nodes } => *nodes,
            Self::Group { groups, .. } => *groups,
        }
    }

    /// Throughput the specialised model of this topology predicts at `load` on a channel of
    /// `data_rate` ([heuristics::adhoc_throughput] or [heuristics::group_throughput]).
    pub fn model_throughput(&self, load: f64, data_rate: f64) -> f64 {
        match self {
            Self::AdHoc { nodes } => heuristics::adhoc_throughput(load, data_rate, *nodes),
            Self::Group { groups, .. } => heuristics::group_throughput(load, data_rate, *groups),
        }
    }

    /// Number of nodes in each group (every node forms its own group in an ad hoc network).
    pub fn nodes_per_group(&self) -> u32 {
        match self {
            Self::AdHoc { .. } => 1,
            Self::Group { groups, nodes } => {
                if *groups == 0 || *nodes == 0 {
                    return DEFAULT_NODES_PER_GROUP;
                }
                nodes / groups
            }
        }
    }
}

/// One measured point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Offered arrival rate.
    pub lambda: f64,

    /// Measured throughput.
    pub throughput: f64,

    /// Measured mean delay.
    pub delay: f64,

    /// Fraction of packets lost.
    #[serde(default)]
    pub packet_loss: f64,

    /// Mean offered load per node.
    #[serde(default)]
    pub load: f64,
}

/// Configuration for [predict].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Service rate of every node (`μ`).
    pub service_rate: f64,

    /// Average buffer capacity of a node (`0` for unbounded).
    pub capacity: u32,

    /// Layout of the measured network.
    pub topology: Topology,

    /// Customers circulating through the closed-network models.
    pub population: usize,

    /// Rate of the shared channel the specialised models saturate at.
    pub data_rate: f64,
}

/// Every model evaluated at one observation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub lambda: f64,
    pub measured_throughput: f64,
    pub measured_delay: f64,
    pub mean_value_analysis: f64,
    pub global_balance: f64,
    pub gordon_newell: f64,
    pub buzen: f64,

    /// Open-network delay ([heuristics::series_delay] or [heuristics::hierarchical_series_delay]).
    pub series_delay: f64,

    /// Closed-network delay ([mva::delay] or [hierarchical::delay]).
    pub mva_delay: f64,

    /// Specialised model of the topology evaluated at the measured load.
    pub model_throughput: f64,
}

impl Prediction {
    /// Throughput estimated by `method`.
    pub fn throughput(&self, method: Method) -> f64 {
        match method {
            Method::MeanValueAnalysis => self.mean_value_analysis,
            Method::GlobalBalance => self.global_balance,
            Method::GordonNewell => self.gordon_newell,
            Method::Buzen => self.buzen,
        }
    }
}

/// Evaluate every model at each of `observations`.
pub fn predict(cfg: &Config, observations: &[Observation]) -> Vec<Prediction> {
    let mu = cfg.service_rate;
    let size = cfg.topology.size();
    let nodes_per_group = cfg.topology.nodes_per_group();

    // The closed-network delay does not depend on the offered load.
    let mva_delay = match cfg.topology {
        Topology::AdHoc { nodes } => mva::delay(mu, nodes as usize, cfg.population),
        Topology::Group { groups, .. } => hierarchical::delay(
            mu,
            groups as usize,
            nodes_per_group as usize,
            cfg.population,
        ),
    };
    debug!(?cfg.topology, mva_delay, points = observations.len(), "predicting");

    observations
        .iter()
        .map(|observation| {
            let lambda = observation.lambda;
            let throughput = |method: Method| method.throughput(lambda, mu, cfg.capacity, size);
            let series_delay = match cfg.topology {
                Topology::AdHoc { nodes } => heuristics::series_delay(lambda, mu, nodes),
                Topology::Group { groups, .. } => {
                    heuristics::hierarchical_series_delay(lambda, mu, groups, nodes_per_group)
                }
            };
            Prediction {
                lambda,
                measured_throughput: observation.throughput,
                measured_delay: observation.delay,
                mean_value_analysis: throughput(Method::MeanValueAnalysis),
                global_balance: throughput(Method::GlobalBalance),
                gordon_newell: throughput(Method::GordonNewell),
                buzen: throughput(Method::Buzen),
                series_delay,
                mva_delay,
                model_throughput: cfg
                    .topology
                    .model_throughput(observation.load, cfg.data_rate),
            }
        })
        .collect()
}

/// Averages over every observation of one topology.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub throughput: f64,
    pub median_throughput: f64,
    pub delay: f64,
    pub packet_loss: f64,
    pub load: f64,

    /// Coefficient of variation of the measured throughput.
    pub variation: f64,

    /// Specialised model of the topology evaluated at the mean load.
    pub model_throughput: f64,
}

impl Summary {
    /// Summarize `observations` of the network described by `cfg` (all zeros if there are none).
    pub fn of(cfg: &Config, observations: &[Observation]) -> Self {
        if observations.is_empty() {
            return Self::default();
        }
        let column = |f: fn(&Observation) -> f64| observations.iter().map(f).collect::<Vec<_>>();
        let mut throughputs = column(|o: &Observation| o.throughput);
        let load = stats::mean(&column(|o: &Observation| o.load));
        Self {
            throughput: stats::mean(&throughputs),
            delay: stats::mean(&column(|o: &Observation| o.delay)),
            packet_loss: stats::mean(&column(|o: &Observation| o.packet_loss)),
            load,
            variation: stats::coefficient_of_variation(&throughputs),
            model_throughput: cfg.topology.model_throughput(load, cfg.data_rate),
            median_throughput: stats::median(&mut throughputs),
        }
    }
}

/// Which topology came out ahead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    AdHoc,
    Group,
    Similar,
}

/// Ad hoc versus grouped performance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub adhoc: Summary,
    pub group: Summary,

    /// Ad hoc throughput over grouped throughput (`0.0` if the latter is zero).
    pub throughput_ratio: f64,

    /// Ad hoc delay over grouped delay (`0.0` if the latter is zero).
    pub delay_ratio: f64,

    /// Topology with the higher throughput.
    pub throughput: Verdict,

    /// Topology whose throughput varies less.
    pub stability: Verdict,
}

/// Compare measurements of the same loads on the ad hoc network described by `adhoc_cfg` and the
/// grouped network described by `group_cfg`.
pub fn compare(
    adhoc_cfg: &Config,
    adhoc: &[Observation],
    group_cfg: &Config,
    group: &[Observation],
) -> Comparison {
    let adhoc = Summary::of(adhoc_cfg, adhoc);
    let group = Summary::of(group_cfg, group);
    let ratio = |a: f64, b: f64| if b > 0.0 { a / b } else { 0.0 };

    let throughput = if adhoc.throughput > BETTER_RATIO * group.throughput {
        Verdict::AdHoc
    } else if adhoc.throughput < WORSE_RATIO * group.throughput {
        Verdict::Group
    } else {
        Verdict::Similar
    };
    let stability = match adhoc.variation.total_cmp(&group.variation) {
        std::cmp::Ordering::Less => Verdict::AdHoc,
        std::cmp::Ordering::Greater => Verdict::Group,
        std::cmp::Ordering::Equal => Verdict::Similar,
    };

    Comparison {
        adhoc,
        group,
        throughput_ratio: ratio(adhoc.throughput, group.throughput),
        delay_ratio: ratio(adhoc.delay, group.delay),
        throughput,
        stability,
    }
}
