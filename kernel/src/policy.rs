use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::error::SimError;
use crate::process::Process;

/// Ticks a Round-Robin process runs before it is sent back to Ready.
pub const ROUND_ROBIN_QUANTUM: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Fcfs,
    RoundRobin,
    Priority,
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Fcfs => "FCFS",
            Algorithm::RoundRobin => "RoundRobin",
            Algorithm::Priority => "Priority",
        }
    }

    pub fn policy(&self) -> Box<dyn SchedulingPolicy> {
        match self {
            Algorithm::Fcfs => Box::new(Fcfs),
            Algorithm::RoundRobin => Box::new(RoundRobin {
                quantum: ROUND_ROBIN_QUANTUM,
            }),
            Algorithm::Priority => Box::new(Priority),
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Fcfs
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FCFS" | "F" => Ok(Algorithm::Fcfs),
            "RoundRobin" | "R" => Ok(Algorithm::RoundRobin),
            "Priority" | "P" => Ok(Algorithm::Priority),
            _ => Err(SimError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Command-line check for an algorithm selector: a full name or its first letter.
pub fn valid_schedspec(value: &str) -> Result<(), String> {
    let re = Regex::new(r"^(FCFS|RoundRobin|Priority|[FRP])$").unwrap();
    if !re.is_match(value) {
        Err(format!(
            "Invalid scheduler specification: {}. Must be one of FCFS, RoundRobin, Priority \
             (or F, R, P)",
            value
        ))
    } else {
        Ok(())
    }
}

/// Picks the next process to run. Implementations never reorder `ready`.
pub trait SchedulingPolicy {
    /// Index into `ready` of the record to dispatch, `None` when `ready` is empty.
    fn select(&self, ready: &[&Process]) -> Option<usize>;

    /// Time slice after which a running process is preempted, if any.
    fn quantum(&self) -> Option<usize> {
        None
    }
}

pub struct Fcfs;

impl SchedulingPolicy for Fcfs {
    fn select(&self, ready: &[&Process]) -> Option<usize> {
        if ready.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

pub struct RoundRobin {
    quantum: usize,
}

impl SchedulingPolicy for RoundRobin {
    fn select(&self, ready: &[&Process]) -> Option<usize> {
        if ready.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    fn quantum(&self) -> Option<usize> {
        Some(self.quantum)
    }
}

/// Smallest priority value wins; the earliest of equal priorities wins.
pub struct Priority;

impl SchedulingPolicy for Priority {
    fn select(&self, ready: &[&Process]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, proc) in ready.iter().enumerate() {
            match best {
                Some(b) if ready[b].spec.priority <= proc.spec.priority => {}
                _ => best = Some(i),
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessSpec;

    #[test]
    fn schedspec_accepts_names_and_letters() {
        for spec in ["FCFS", "RoundRobin", "Priority", "F", "R", "P"] {
            assert!(valid_schedspec(spec).is_ok(), "{}", spec);
            assert!(spec.parse::<Algorithm>().is_ok(), "{}", spec);
        }
        for spec in ["fcfs", "RR", "R2", "", "Priority "] {
            assert!(valid_schedspec(spec).is_err(), "{}", spec);
        }
    }

    fn with_prio(pid: u32, priority: i32) -> Process {
        Process::new(ProcessSpec::new(pid, 0, 1, 0, 0).with_priority(priority))
    }

    #[test]
    fn priority_picks_first_minimum() {
        let procs = vec![with_prio(1, 5), with_prio(2, 2), with_prio(3, 2)];
        let ready: Vec<&Process> = procs.iter().collect();
        let idx = Priority.select(&ready).unwrap();
        assert_eq!(ready[idx].pid(), 2);
    }

    #[test]
    fn fcfs_and_round_robin_take_head() {
        let procs = vec![with_prio(4, 9), with_prio(5, 0)];
        let ready: Vec<&Process> = procs.iter().collect();
        assert_eq!(Fcfs.select(&ready), Some(0));
        assert_eq!(Algorithm::RoundRobin.policy().select(&ready), Some(0));
        assert_eq!(Fcfs.select(&[]), None);
        assert_eq!(Priority.select(&[]), None);
    }

    #[test]
    fn only_round_robin_has_a_quantum() {
        assert_eq!(Algorithm::Fcfs.policy().quantum(), None);
        assert_eq!(Algorithm::Priority.policy().quantum(), None);
        assert_eq!(
            Algorithm::RoundRobin.policy().quantum(),
            Some(ROUND_ROBIN_QUANTUM)
        );
    }

    #[test]
    fn parse_names_and_aliases() {
        assert_eq!("FCFS".parse::<Algorithm>().unwrap(), Algorithm::Fcfs);
        assert_eq!("R".parse::<Algorithm>().unwrap(), Algorithm::RoundRobin);
        assert_eq!("Priority".parse::<Algorithm>().unwrap(), Algorithm::Priority);
        assert!(matches!(
            "SJF".parse::<Algorithm>(),
            Err(SimError::UnknownAlgorithm(_))
        ));
    }
}
