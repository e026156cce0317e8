//! A discrete-time simulator of process scheduling and fixed-partition
//! memory allocation.
//!
//! A [`Simulation`] replays a list of [`ProcessSpec`]s tick by tick, moving
//! each record through New, Ready, Running, Waiting and Terminated, and emits
//! a [`Transition`] for every state change. With partitions configured, a
//! process must be granted one of four fixed partitions before it leaves New.
//! [`metrics`] reduces the terminated records to turnaround, waiting time and
//! throughput.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod input;
pub mod logger;
pub mod metrics;
pub mod partition;
pub mod policy;
pub mod process;
pub mod queue;

pub use config::{PresetTable, SimConfig};
pub use engine::Simulation;
pub use error::SimError;
pub use event::{PartitionChange, TraceSink, Transition};
pub use input::LastField;
pub use metrics::{ProcessStats, Summary};
pub use partition::{MemorySnapshot, PartitionTable, PARTITION_COUNT};
pub use policy::{Algorithm, SchedulingPolicy, ROUND_ROBIN_QUANTUM};
pub use process::{Episode, EpisodeKind, Pid, Process, ProcessSpec, State};
