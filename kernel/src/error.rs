use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::process::Pid;

/// Everything that can stop a simulation run.
#[derive(Debug)]
pub enum SimError {
    /// An input or output file could not be opened, read or written.
    Io {
        path: PathBuf,
        source: io::Error,
    },
    /// A configuration file or preset is malformed.
    Config(String),
    UnknownAlgorithm(String),
    UnknownPreset(String),
    /// Two input records share the same process id.
    DuplicatePid(Pid),
    /// Nothing is in flight and the records left in New can never be admitted.
    Stalled {
        tick: usize,
        pending: Vec<Pid>,
    },
    /// A collection or partition invariant was broken; this is a logic defect.
    Invariant(String),
    /// There are no terminated records to summarize.
    Empty,
}

impl SimError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> SimError {
        SimError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> SimError {
        SimError::Invariant(msg.into())
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            SimError::Config(msg) => write!(f, "invalid configuration: {}", msg),
            SimError::UnknownAlgorithm(name) => write!(
                f,
                "unknown scheduling algorithm '{}' (expected FCFS, RoundRobin or Priority)",
                name
            ),
            SimError::UnknownPreset(name) => write!(f, "unknown partition preset '{}'", name),
            SimError::DuplicatePid(pid) => write!(f, "duplicate process id {}", pid),
            SimError::Stalled { tick, pending } => {
                let pids: Vec<String> = pending.iter().map(|pid| pid.to_string()).collect();
                write!(
                    f,
                    "simulation stalled at tick {}: process(es) {} can never be admitted",
                    tick,
                    pids.join(", ")
                )
            }
            SimError::Invariant(msg) => write!(f, "invariant violated: {}", msg),
            SimError::Empty => write!(f, "no terminated processes to summarize"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
