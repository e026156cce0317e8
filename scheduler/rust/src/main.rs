use clap::{Arg, Command};
use log::LevelFilter;
use std::cell::RefCell;
use std::path::PathBuf;
use std::process;

use kernel_sim::metrics::{process_stats, summarize};
use kernel_sim::policy::valid_schedspec;
use kernel_sim::{logger, Algorithm, SimConfig, SimError, Simulation};

// Define a struct to hold the flags
#[derive(Debug, Default)]
struct Flags {
    v_option: bool,
}

thread_local!(static TFLAGS: RefCell<Flags> = RefCell::new(Flags::default()));

// echoes trace rows and per-process stats
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
use utils::{read_input_file, write_summary, TraceWriter};

struct Args {
    algorithm: Algorithm,
    inputfile: PathBuf,
    tracefile: PathBuf,
    summaryfile: PathBuf,
}

fn parse_args(actual_args: &Vec<String>) -> Result<Args, SimError> {
    let matches = Command::new("Scheduler simulator")
        .about("Replays processes through FCFS, RoundRobin or Priority scheduling")
        .arg(
            Arg::new("algorithm")
                .short('s')
                .long("sched")
                .required(true)
                .takes_value(true)
                .validator(valid_schedspec)
                .help("scheduling algorithm: FCFS, RoundRobin or Priority"),
        )
        .arg(
            Arg::new("v_flag")
                .short('v')
                .takes_value(false)
                .help("echo every transition and per-process stats to stdout"),
        )
        .arg(
            Arg::new("q_flag")
                .short('q')
                .takes_value(false)
                .help("log engine decisions (ready queue, dispatch) to stderr"),
        )
        .arg(
            Arg::new("inputfile")
                .help("process list (CSV)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("tracefile")
                .help("transition trace output")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("summaryfile")
                .help("summary report output")
                .required(true)
                .index(3),
        )
        .get_matches_from(actual_args);

    TFLAGS.with(|tflags| {
        tflags.borrow_mut().v_option = matches.is_present("v_flag");
    });
    logger::init(if matches.is_present("q_flag") {
        LevelFilter::Trace
    } else {
        LevelFilter::Warn
    });

    let path = |name: &str| PathBuf::from(matches.value_of(name).unwrap_or_default());
    Ok(Args {
        algorithm: matches.value_of("algorithm").unwrap_or_default().parse()?,
        inputfile: path("inputfile"),
        tracefile: path("tracefile"),
        summaryfile: path("summaryfile"),
    })
}

fn actual_main_fn(args: Args) -> Result<(), SimError> {
    // Read and validate everything before creating any output
    let processes = read_input_file(&args.inputfile)?;
    let config = SimConfig::scheduler(args.algorithm);
    let mut sim = Simulation::new(processes, &config)?;

    let mut trace = TraceWriter::create(&args.tracefile)?;
    sim.run(&mut trace)?;
    trace.finish()?;

    let stats = process_stats(sim.terminated())?;
    for s in &stats {
        v_trace!(
            "{:5}: {:5} {:5} {:5} {:5} {:5}",
            s.pid,
            s.arrival,
            s.start,
            s.end,
            s.turnaround,
            s.waiting
        );
    }
    let summary = summarize(&stats)?;
    write_summary(&args.summaryfile, &summary)?;
    v_trace!(
        "SUM: {} {:.6} {:.6} {:.6}",
        args.algorithm,
        summary.throughput,
        summary.avg_turnaround,
        summary.avg_waiting
    );
    Ok(())
}

fn main() {
    let args = std::env::args().collect::<Vec<String>>();

    let result = parse_args(&args).and_then(actual_main_fn);
    if let Err(err) = result {
        eprintln!("scheduler: {}", err);
        process::exit(1);
    }
}
