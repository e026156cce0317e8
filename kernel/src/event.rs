use crate::error::SimError;
use crate::partition::MemorySnapshot;
use crate::process::{Pid, State};

/// Which partition a memory-variant transition bound or released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionChange {
    Entry(usize),
    Removal(usize),
}

/// One committed state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub tick: usize,
    pub pid: Pid,
    pub from: State,
    pub to: State,
    pub partition: Option<PartitionChange>,
    /// Partition occupancy right after the change; memory variant only.
    pub memory: Option<MemorySnapshot>,
}

/// Receives transitions in commit order.
pub trait TraceSink {
    fn record(&mut self, transition: &Transition) -> Result<(), SimError>;
}

impl TraceSink for Vec<Transition> {
    fn record(&mut self, transition: &Transition) -> Result<(), SimError> {
        self.push(transition.clone());
        Ok(())
    }
}

impl<S: TraceSink + ?Sized> TraceSink for &mut S {
    fn record(&mut self, transition: &Transition) -> Result<(), SimError> {
        (**self).record(transition)
    }
}
