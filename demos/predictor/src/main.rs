//! Compare analytic queueing predictions against measured network samples.

use clap::{value_parser, Arg, ArgAction, Command};
use colored::Colorize;
use commonware_queueing::{
    analysis::{self, Comparison, Observation, Prediction, Topology, Verdict},
    heuristics::Method,
};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, Level};

/// Errors that can occur while loading measurements.
#[derive(Error, Debug)]
enum Error {
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    Parse(PathBuf, serde_json::Error),
}

/// Measurements of the same offered loads on both topologies.
#[derive(Deserialize)]
struct Measurements {
    adhoc: Vec<Observation>,
    group: Vec<Observation>,
}

/// Command line arguments parsed from user input
struct Arguments {
    observations: PathBuf,
    service_rate: f64,
    capacity: u32,
    nodes: u32,
    groups: u32,
    population: usize,
    data_rate: f64,
    verbose: bool,
}

fn main() {
    let args = parse_arguments();

    // Initialize logging
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let measurements = match load(&args.observations) {
        Ok(measurements) => measurements,
        Err(err) => {
            eprintln!("{}", err.to_string().red());
            std::process::exit(1);
        }
    };
    debug!(
        adhoc = measurements.adhoc.len(),
        group = measurements.group.len(),
        "loaded measurements"
    );

    let adhoc = analysis::Config {
        service_rate: args.service_rate,
        capacity: args.capacity,
        topology: Topology::AdHoc { nodes: args.nodes },
        population: args.population,
        data_rate: args.data_rate,
    };
    let group = analysis::Config {
        topology: Topology::Group {
            groups: args.groups,
            nodes: args.nodes,
        },
        ..adhoc
    };
    print_predictions("ad hoc", &analysis::predict(&adhoc, &measurements.adhoc));
    print_predictions("group", &analysis::predict(&group, &measurements.group));
    print_comparison(&analysis::compare(
        &adhoc,
        &measurements.adhoc,
        &group,
        &measurements.group,
    ));
}

/// Parse command line arguments and return structured data
fn parse_arguments() -> Arguments {
    let matches = Command::new("commonware-predictor")
        .about("Compare analytic queueing predictions against measured network samples")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("observations")
                .value_parser(value_parser!(PathBuf))
                .required(true)
                .help("Path to a JSON file with \"adhoc\" and \"group\" observation lists"),
        )
        .arg(
            Arg::new("service-rate")
                .long("service-rate")
                .value_parser(value_parser!(f64))
                .default_value("5.0")
                .help("Service rate of every node"),
        )
        .arg(
            Arg::new("capacity")
                .long("capacity")
                .value_parser(value_parser!(u32))
                .default_value("3")
                .help("Average buffer capacity of a node (0 for unbounded)"),
        )
        .arg(
            Arg::new("nodes")
                .long("nodes")
                .value_parser(value_parser!(u32))
                .default_value("9")
                .help("Number of nodes in the network"),
        )
        .arg(
            Arg::new("groups")
                .long("groups")
                .value_parser(value_parser!(u32))
                .default_value("3")
                .help("Number of groups in the grouped network"),
        )
        .arg(
            Arg::new("population")
                .long("population")
                .value_parser(value_parser!(usize))
                .default_value("18")
                .help("Customers circulating through the closed-network models"),
        )
        .arg(
            Arg::new("data-rate")
                .long("data-rate")
                .value_parser(value_parser!(f64))
                .default_value("10.0")
                .help("Rate of the shared channel used by the specialised models"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Emit debug logs"),
        )
        .get_matches();

    Arguments {
        observations: matches
            .get_one::<PathBuf>("observations")
            .expect("observations file required")
            .clone(),
        service_rate: *matches.get_one::<f64>("service-rate").expect("has default"),
        capacity: *matches.get_one::<u32>("capacity").expect("has default"),
        nodes: *matches.get_one::<u32>("nodes").expect("has default"),
        groups: *matches.get_one::<u32>("groups").expect("has default"),
        population: *matches.get_one::<usize>("population").expect("has default"),
        data_rate: *matches.get_one::<f64>("data-rate").expect("has default"),
        verbose: matches.get_flag("verbose"),
    }
}

/// Read measurements from `path`.
fn load(path: &Path) -> Result<Measurements, Error> {
    let content = fs::read_to_string(path).map_err(|err| Error::Read(path.to_path_buf(), err))?;
    serde_json::from_str(&content).map_err(|err| Error::Parse(path.to_path_buf(), err))
}

/// Print every prediction for one topology
fn print_predictions(label: &str, predictions: &[Prediction]) {
    println!("\n{}", format!("{label} predictions:").bold().blue());
    for prediction in predictions {
        println!(
            "{}",
            format!(
                "  λ={:.2} measured: {:.3} (delay {:.3})",
                prediction.lambda, prediction.measured_throughput, prediction.measured_delay
            )
            .green()
        );
        let estimates: Vec<String> = Method::ALL
            .iter()
            .map(|method| format!("{method}: {:.3}", prediction.throughput(*method)))
            .collect();
        println!("    {}", estimates.join(" | "));
        println!(
            "    {}",
            format!(
                "series delay: {:.3} | mva delay: {:.3} | model: {:.3}",
                prediction.series_delay, prediction.mva_delay, prediction.model_throughput
            )
            .magenta()
        );
    }
}

/// Print the ad hoc versus grouped comparison
fn print_comparison(comparison: &Comparison) {
    println!("\n{}", "-".repeat(80).yellow());
    println!("{}", "comparison:".bold().blue());
    println!(
        "  throughput: ad hoc {:.3}, group {:.3} (ratio {:.3})",
        comparison.adhoc.throughput, comparison.group.throughput, comparison.throughput_ratio
    );
    println!(
        "  median throughput: ad hoc {:.3}, group {:.3}",
        comparison.adhoc.median_throughput, comparison.group.median_throughput
    );
    println!(
        "  model at mean load: ad hoc {:.3} ({:.2}), group {:.3} ({:.2})",
        comparison.adhoc.model_throughput,
        comparison.adhoc.load,
        comparison.group.model_throughput,
        comparison.group.load
    );
    println!(
        "  delay: ad hoc {:.3}, group {:.3} (ratio {:.3})",
        comparison.adhoc.delay, comparison.group.delay, comparison.delay_ratio
    );
    println!(
        "  packet loss: ad hoc {:.2}%, group {:.2}%",
        comparison.adhoc.packet_loss * 100.0,
        comparison.group.packet_loss * 100.0
    );
    println!(
        "  variation: ad hoc {:.2}%, group {:.2}%",
        comparison.adhoc.variation * 100.0,
        comparison.group.variation * 100.0
    );
    let describe = |verdict: Verdict, what: &str| match verdict {
        Verdict::AdHoc => format!("ad hoc network shows better {what}"),
        Verdict::Group => format!("group network shows better {what}"),
        Verdict::Similar => format!("both networks show similar {what}"),
    };
    println!("  -> {}", describe(comparison.throughput, "throughput").cyan());
    println!("  -> {}", describe(comparison.stability, "stability").cyan());
}
