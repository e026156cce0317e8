use clap::{Arg, Command};
use log::LevelFilter;
use std::cell::RefCell;
use std::path::PathBuf;
use std::process;

use kernel_sim::policy::valid_schedspec;
use kernel_sim::{logger, Algorithm, PresetTable, SimConfig, SimError, Simulation};

#[derive(Debug, Default)]
struct Flags {
    v_option: bool,
}

thread_local!(static TFLAGS: RefCell<Flags> = RefCell::new(Flags::default()));

// prints the trace rows and the final occupancy stats
macro_rules! v_trace {
    ($($arg:tt)*) => {
        crate::TFLAGS.with(|tflags| {
            let tflags = tflags.borrow();
            if tflags.v_option {
                println!("{}", format_args!($($arg)*));
            }
        });
    };
}

mod utils;
use utils::{read_input_file, MemoryTraceWriter};

struct Args {
    preset: String,
    presets_file: Option<PathBuf>,
    algorithm: Algorithm,
    inputfile: PathBuf,
    tracefile: PathBuf,
}

fn actual_main_fn(args: Args) -> Result<(), SimError> {
    let mut presets = PresetTable::builtin();
    if let Some(path) = &args.presets_file {
        presets.load(path)?;
    }
    let partitions = presets.get(&args.preset)?;

    // Read input file
    let processes = read_input_file(&args.inputfile)?;
    let config = SimConfig::memory(partitions).with_algorithm(args.algorithm);
    let mut sim = Simulation::new(processes, &config)?;

    let mut trace = MemoryTraceWriter::create(&args.tracefile)?;
    let outcome = sim.run(&mut trace);
    let stats = trace.finish()?;
    outcome?;

    // Print end stats
    if let Some(table) = sim.partitions() {
        let slots: Vec<String> = table
            .iter()
            .enumerate()
            .map(|(idx, p)| match p.owner {
                Some(pid) => format!("{}:{}/{}", idx, pid, p.capacity),
                None => format!("{}:*/{}", idx, p.capacity),
            })
            .collect();
        v_trace!("PT: {}", slots.join(" "));
    }
    v_trace!(
        "TOTAL {} {} {} {} {}",
        sim.clock(),
        sim.processes().len(),
        stats.transitions,
        stats.peak_used,
        stats.peak_partitions
    );
    Ok(())
}

fn command() -> Command<'static> {
    Command::new("MMU program")
        .about("Fixed-partition memory management simulator")
        .arg(
            Arg::new("preset")
                .short('p')
                .long("preset")
                .required(true)
                .help("partition size preset (size1, size2, or one from --presets)")
                .takes_value(true),
        )
        .arg(
            Arg::new("presets")
                .long("presets")
                .required(false)
                .help("TOML file with extra partition presets")
                .takes_value(true),
        )
        .arg(
            Arg::new("algorithm")
                .short('a')
                .long("algorithm")
                .required(false)
                .default_value("FCFS")
                .validator(valid_schedspec)
                .help("scheduling algorithm: FCFS, RoundRobin or Priority")
                .takes_value(true),
        )
        .arg(
            Arg::new("v_flag")
                .short('v')
                .required(false)
                .help("echo the trace to stdout")
                .takes_value(false),
        )
        .arg(
            Arg::new("q_flag")
                .short('q')
                .required(false)
                .help("log admission and dispatch decisions to stderr")
                .takes_value(false),
        )
        .arg(
            Arg::new("inputfile")
                .help("input file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("tracefile")
                .help("trace output file")
                .required(true)
                .index(2),
        )
}

fn parse_args(actual_args: &Vec<String>) -> Result<Args, SimError> {
    let matches = command().get_matches_from(actual_args);

    TFLAGS.with(|tflags| {
        tflags.borrow_mut().v_option = matches.is_present("v_flag");
    });
    logger::init(if matches.is_present("q_flag") {
        LevelFilter::Trace
    } else {
        LevelFilter::Warn
    });

    let value = |name: &str| matches.value_of(name).unwrap_or_default().to_string();
    Ok(Args {
        preset: value("preset"),
        presets_file: matches.value_of("presets").map(PathBuf::from),
        algorithm: value("algorithm").parse()?,
        inputfile: PathBuf::from(value("inputfile")),
        tracefile: PathBuf::from(value("tracefile")),
    })
}

fn main() {
    let args = std::env::args().collect::<Vec<String>>();

    // Parse command line arguments
    let result = parse_args(&args).and_then(actual_main_fn);
    if let Err(err) = result {
        eprintln!("mmu: {}", err);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_selector_is_validated() {
        let args = |alg: &'static str| vec!["mmu", "-p", "size1", "-a", alg, "input.csv", "trace.txt"];
        assert!(command().try_get_matches_from(args("R")).is_ok());
        assert!(command().try_get_matches_from(args("Priority")).is_ok());
        assert!(command().try_get_matches_from(args("RR")).is_err());
        assert!(command().try_get_matches_from(args("fcfs")).is_err());
    }
}
