use std::collections::HashMap;

use log::{debug, trace, warn};

use crate::config::SimConfig;
use crate::error::SimError;
use crate::event::{PartitionChange, TraceSink, Transition};
use crate::partition::PartitionTable;
use crate::policy::SchedulingPolicy;
use crate::process::{EpisodeKind, Pid, Process, ProcessSpec, State};
use crate::queue::{ProcessQueue, Slot};

/// The simulated kernel: owns every process record, the five lifecycle
/// collections and, when memory management is on, the partition table.
pub struct Simulation {
    procs: Vec<Process>,
    slots: HashMap<Pid, Slot>,

    new: ProcessQueue,
    ready: ProcessQueue,
    running: Option<Slot>,
    waiting: ProcessQueue,
    terminated: ProcessQueue,

    partitions: Option<PartitionTable>,
    policy: Box<dyn SchedulingPolicy>,
    clock: usize,
}

impl Simulation {
    /// Builds a run from processes in input order; they all start in New.
    pub fn new(specs: Vec<ProcessSpec>, config: &SimConfig) -> Result<Simulation, SimError> {
        let mut slots = HashMap::with_capacity(specs.len());
        let mut new = ProcessQueue::new();
        for (slot, spec) in specs.iter().enumerate() {
            if slots.insert(spec.pid, slot).is_some() {
                return Err(SimError::DuplicatePid(spec.pid));
            }
            new.push_back(slot);
        }

        Ok(Simulation {
            procs: specs.into_iter().map(Process::new).collect(),
            slots,
            new,
            ready: ProcessQueue::new(),
            running: None,
            waiting: ProcessQueue::new(),
            terminated: ProcessQueue::new(),
            partitions: config.partitions.map(PartitionTable::new),
            policy: config.algorithm.policy(),
            clock: 0,
        })
    }

    pub fn clock(&self) -> usize {
        self.clock
    }

    pub fn is_finished(&self) -> bool {
        self.terminated.len() == self.procs.len()
    }

    pub fn process(&self, pid: Pid) -> Option<&Process> {
        self.slots.get(&pid).map(|&slot| &self.procs[slot])
    }

    pub fn processes(&self) -> &[Process] {
        &self.procs
    }

    pub fn partitions(&self) -> Option<&PartitionTable> {
        self.partitions.as_ref()
    }

    /// Records in termination order.
    pub fn terminated(&self) -> impl Iterator<Item = &Process> + '_ {
        self.terminated.iter().map(move |slot| &self.procs[slot])
    }

    pub fn pids_in(&self, state: State) -> Vec<Pid> {
        let pid = |slot: Slot| self.procs[slot].pid();
        match state {
            State::Running => self.running.into_iter().map(pid).collect(),
            State::New => self.new.iter().map(pid).collect(),
            State::Ready => self.ready.iter().map(pid).collect(),
            State::Waiting => self.waiting.iter().map(pid).collect(),
            State::Terminated => self.terminated.iter().map(pid).collect(),
        }
    }

    pub fn count(&self, state: State) -> usize {
        match state {
            State::Running => self.running.map_or(0, |_| 1),
            State::New => self.new.len(),
            State::Ready => self.ready.len(),
            State::Waiting => self.waiting.len(),
            State::Terminated => self.terminated.len(),
        }
    }

    /// Runs until every process has terminated, handing each transition to `sink`.
    pub fn run<S: TraceSink>(&mut self, mut sink: S) -> Result<(), SimError> {
        while !self.is_finished() {
            for transition in self.step()? {
                sink.record(&transition)?;
            }
        }
        debug!(
            "all {} processes terminated after {} ticks",
            self.procs.len(),
            self.clock
        );
        Ok(())
    }

    /// Executes one tick and returns the transitions it committed, in order.
    pub fn step(&mut self) -> Result<Vec<Transition>, SimError> {
        self.check_stall()?;

        let tick = self.clock;
        let mut committed = Vec::new();

        self.admit(tick, &mut committed)?;
        self.complete_io(tick, &mut committed)?;
        self.run_cpu(tick, &mut committed)?;
        self.dispatch(tick, &mut committed)?;

        #[cfg(debug_assertions)]
        self.verify()?;

        self.clock += 1;
        Ok(committed)
    }

    // New → Ready for every arrived record; with partitions, only if one fits.
    fn admit(&mut self, tick: usize, committed: &mut Vec<Transition>) -> Result<(), SimError> {
        for slot in self.new.snapshot() {
            let (pid, arrival, demand) = {
                let proc = &self.procs[slot];
                (proc.pid(), proc.spec.arrival, proc.spec.memory)
            };
            if arrival > tick {
                continue;
            }

            let change = match self.partitions.as_mut() {
                None => None,
                Some(table) => match table.first_fit(demand) {
                    Some(idx) => {
                        table.allocate(idx, pid, demand)?;
                        self.procs[slot].partition = Some(idx);
                        Some(PartitionChange::Entry(idx))
                    }
                    None => {
                        trace!(
                            "{}: process {} waits for a partition ({})",
                            tick,
                            pid,
                            demand
                        );
                        continue;
                    }
                },
            };
            self.commit(tick, slot, State::Ready, change, committed)?;
        }
        Ok(())
    }

    // Waiting → Ready once the I/O episode has lasted io_duration ticks.
    fn complete_io(
        &mut self,
        tick: usize,
        committed: &mut Vec<Transition>,
    ) -> Result<(), SimError> {
        for slot in self.waiting.snapshot() {
            if self.procs[slot].tick_io() {
                self.procs[slot].open_episode(EpisodeKind::Io, tick);
                self.commit(tick, slot, State::Ready, None, committed)?;
            }
        }
        Ok(())
    }

    // One tick of CPU for the running record, then terminate, block on I/O,
    // or preempt on quantum expiry, in that order of precedence.
    fn run_cpu(&mut self, tick: usize, committed: &mut Vec<Transition>) -> Result<(), SimError> {
        let slot = match self.running {
            Some(slot) => slot,
            None => return Ok(()),
        };

        let quantum = self.policy.quantum();
        let proc = &mut self.procs[slot];
        if proc.tick_cpu() {
            proc.end = Some(tick);
            let change = self.release_partition(slot)?;
            self.commit(tick, slot, State::Terminated, change, committed)
        } else if proc.io_due() {
            proc.run_elapsed = 0;
            self.commit(tick, slot, State::Waiting, None, committed)
        } else if quantum.map_or(false, |q| proc.slice_elapsed >= q) {
            proc.open_episode(EpisodeKind::Timer, tick);
            self.commit(tick, slot, State::Ready, None, committed)
        } else {
            Ok(())
        }
    }

    // Ready → Running for the record the policy picks, when the CPU is idle.
    fn dispatch(&mut self, tick: usize, committed: &mut Vec<Transition>) -> Result<(), SimError> {
        if self.running.is_some() || self.ready.is_empty() {
            return Ok(());
        }

        let slot = {
            let order = self.ready.snapshot();
            let candidates: Vec<&Process> = order.iter().map(|&s| &self.procs[s]).collect();
            let idx = self.policy.select(&candidates).ok_or_else(|| {
                SimError::invariant("policy chose nothing from a non-empty Ready")
            })?;
            trace!(
                "{}: ready [{}] -> {}",
                tick,
                candidates
                    .iter()
                    .map(|p| p.pid().to_string())
                    .collect::<Vec<_>>()
                    .join(" "),
                candidates[idx].pid()
            );
            order[idx]
        };

        self.procs[slot].dispatch(tick);
        self.commit(tick, slot, State::Running, None, committed)
    }

    fn release_partition(&mut self, slot: Slot) -> Result<Option<PartitionChange>, SimError> {
        let table = match self.partitions.as_mut() {
            Some(table) => table,
            None => return Ok(None),
        };
        let proc = &mut self.procs[slot];
        let idx = proc.partition.take().ok_or_else(|| {
            SimError::invariant(format!("process {} runs without a partition", proc.pid()))
        })?;
        table.deallocate(idx)?;
        Ok(Some(PartitionChange::Removal(idx)))
    }

    /// Moves `slot` from its current collection to the one for `to` and
    /// records the transition.
    fn commit(
        &mut self,
        tick: usize,
        slot: Slot,
        to: State,
        partition: Option<PartitionChange>,
        committed: &mut Vec<Transition>,
    ) -> Result<(), SimError> {
        let from = self.procs[slot].state;
        self.detach(slot, from)?;
        self.attach(slot, to)?;
        self.procs[slot].state = to;

        let transition = Transition {
            tick,
            pid: self.procs[slot].pid(),
            from,
            to,
            partition,
            memory: self.partitions.as_ref().map(PartitionTable::snapshot),
        };
        debug!("{}: {} {} -> {}", tick, transition.pid, from, to);
        committed.push(transition);
        Ok(())
    }

    fn detach(&mut self, slot: Slot, from: State) -> Result<(), SimError> {
        let removed = match from {
            State::Running if self.running == Some(slot) => {
                self.running = None;
                true
            }
            State::Running => false,
            State::New => self.new.remove(slot).is_some(),
            State::Ready => self.ready.remove(slot).is_some(),
            State::Waiting => self.waiting.remove(slot).is_some(),
            State::Terminated => false,
        };
        if removed {
            Ok(())
        } else {
            Err(SimError::invariant(format!(
                "process {} is not in {}",
                self.procs[slot].pid(),
                from
            )))
        }
    }

    fn attach(&mut self, slot: Slot, to: State) -> Result<(), SimError> {
        match to {
            State::Running => {
                if let Some(other) = self.running {
                    return Err(SimError::invariant(format!(
                        "process {} dispatched while {} is running",
                        self.procs[slot].pid(),
                        self.procs[other].pid()
                    )));
                }
                self.running = Some(slot);
            }
            State::New => {
                return Err(SimError::invariant(format!(
                    "process {} moved back to New",
                    self.procs[slot].pid()
                )))
            }
            State::Ready => self.ready.push_back(slot),
            State::Waiting => self.waiting.push_back(slot),
            State::Terminated => self.terminated.push_back(slot),
        }
        Ok(())
    }

    // Nothing in flight means every partition is free; if no arrived New
    // record fits even so, and none is still to arrive, no tick can help.
    fn check_stall(&self) -> Result<(), SimError> {
        if self.new.is_empty()
            || self.running.is_some()
            || !self.ready.is_empty()
            || !self.waiting.is_empty()
        {
            return Ok(());
        }
        let table = match &self.partitions {
            Some(table) => table,
            None => return Ok(()),
        };

        let admissible = self.new.iter().any(|slot| {
            let spec = &self.procs[slot].spec;
            spec.arrival > self.clock || table.first_fit(spec.memory).is_some()
        });
        if admissible {
            return Ok(());
        }

        let pending = self.pids_in(State::New);
        warn!(
            "{}: process(es) {:?} exceed every partition (largest {})",
            self.clock,
            pending,
            table.largest()
        );
        Err(SimError::Stalled {
            tick: self.clock,
            pending,
        })
    }

    /// Checks the collection and partition invariants.
    pub fn verify(&self) -> Result<(), SimError> {
        let sizes: usize = State::ALL.iter().map(|&s| self.count(s)).sum();
        if sizes != self.procs.len() {
            return Err(SimError::invariant(format!(
                "collections hold {} records, expected {}",
                sizes,
                self.procs.len()
            )));
        }

        for (slot, proc) in self.procs.iter().enumerate() {
            let holders: Vec<State> = State::ALL
                .iter()
                .copied()
                .filter(|&s| self.holds(s, slot))
                .collect();
            if holders != [proc.state] {
                return Err(SimError::invariant(format!(
                    "process {} in state {} is held by {:?}",
                    proc.pid(),
                    proc.state,
                    holders
                )));
            }
            if proc.remaining > proc.spec.cpu_time {
                return Err(SimError::invariant(format!(
                    "process {} has {} ticks left of {}",
                    proc.pid(),
                    proc.remaining,
                    proc.spec.cpu_time
                )));
            }
            if proc.state == State::Terminated && (proc.remaining != 0 || proc.end.is_none()) {
                return Err(SimError::invariant(format!(
                    "process {} terminated with {} ticks left",
                    proc.pid(),
                    proc.remaining
                )));
            }
            self.verify_binding(proc)?;
        }

        if let Some(table) = &self.partitions {
            for (idx, partition) in table.iter().enumerate() {
                if partition.used > partition.capacity {
                    return Err(SimError::invariant(format!(
                        "partition {} holds {} of {}",
                        idx, partition.used, partition.capacity
                    )));
                }
                if let Some(owner) = partition.owner {
                    let bound = self
                        .process(owner)
                        .map_or(false, |p| p.partition == Some(idx));
                    if !bound {
                        return Err(SimError::invariant(format!(
                            "partition {} names process {} which does not hold it",
                            idx, owner
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn verify_binding(&self, proc: &Process) -> Result<(), SimError> {
        let in_memory = matches!(proc.state, State::Ready | State::Running | State::Waiting);
        match (&self.partitions, proc.partition) {
            (None, None) => Ok(()),
            (None, Some(idx)) => Err(SimError::invariant(format!(
                "process {} holds partition {} without memory management",
                proc.pid(),
                idx
            ))),
            (Some(_), None) if !in_memory => Ok(()),
            (Some(_), None) => Err(SimError::invariant(format!(
                "process {} is {} without a partition",
                proc.pid(),
                proc.state
            ))),
            (Some(table), Some(idx)) => {
                let owned = table.get(idx).map_or(false, |p| {
                    p.owner == Some(proc.pid()) && p.used == proc.spec.memory
                });
                if in_memory && owned {
                    Ok(())
                } else {
                    Err(SimError::invariant(format!(
                        "process {} ({}) has a stale binding to partition {}",
                        proc.pid(),
                        proc.state,
                        idx
                    )))
                }
            }
        }
    }

    fn holds(&self, state: State, slot: Slot) -> bool {
        match state {
            State::Running => self.running == Some(slot),
            State::New => self.new.contains(slot),
            State::Ready => self.ready.contains(slot),
            State::Waiting => self.waiting.contains(slot),
            State::Terminated => self.terminated.contains(slot),
        }
    }
}
