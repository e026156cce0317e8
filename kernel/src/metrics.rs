//! Turnaround, waiting time and throughput over the terminated records.

use crate::error::SimError;
use crate::process::{Pid, Process};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub throughput: f64,
    pub avg_turnaround: f64,
    pub avg_waiting: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStats {
    pub pid: Pid,
    pub arrival: usize,
    pub start: usize,
    pub end: usize,
    pub turnaround: usize,
    pub waiting: usize,
}

/// Per-record figures, in the order given. Every record must have terminated.
pub fn process_stats<'a, I>(terminated: I) -> Result<Vec<ProcessStats>, SimError>
where
    I: IntoIterator<Item = &'a Process>,
{
    terminated
        .into_iter()
        .map(|proc| {
            let (start, end) = match (proc.start_time(), proc.end_time()) {
                (Some(start), Some(end)) => (start, end),
                _ => {
                    return Err(SimError::invariant(format!(
                        "process {} has not terminated",
                        proc.pid()
                    )))
                }
            };
            let arrival = proc.spec.arrival;
            Ok(ProcessStats {
                pid: proc.pid(),
                arrival,
                start,
                end,
                turnaround: end - arrival,
                waiting: (start - arrival) + proc.ready_wait(),
            })
        })
        .collect()
}

/// Averages over the Terminated collection. Throughput divides by the end time
/// of the last record in termination order.
pub fn summarize(stats: &[ProcessStats]) -> Result<Summary, SimError> {
    let last = stats.last().ok_or(SimError::Empty)?;
    let count = stats.len() as f64;
    let turnaround: usize = stats.iter().map(|s| s.turnaround).sum();
    let waiting: usize = stats.iter().map(|s| s.waiting).sum();
    Ok(Summary {
        throughput: count / last.end as f64,
        avg_turnaround: turnaround as f64 / count,
        avg_waiting: waiting as f64 / count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(pid: Pid, arrival: usize, start: usize, end: usize, ready_wait: usize) -> ProcessStats {
        ProcessStats {
            pid,
            arrival,
            start,
            end,
            turnaround: end - arrival,
            waiting: start - arrival + ready_wait,
        }
    }

    #[test]
    fn averages() {
        let stats = vec![stat(1, 0, 0, 5, 0), stat(2, 0, 5, 8, 0)];
        let summary = summarize(&stats).unwrap();
        assert_eq!(summary.avg_turnaround, 6.5);
        assert_eq!(summary.avg_waiting, 2.5);
        assert_eq!(summary.throughput, 2.0 / 8.0);
    }

    #[test]
    fn throughput_uses_last_terminated_not_max() {
        let stats = vec![stat(1, 0, 0, 10, 0), stat(2, 0, 1, 6, 0)];
        let summary = summarize(&stats).unwrap();
        assert_eq!(summary.throughput, 2.0 / 6.0);
    }

    #[test]
    fn empty_has_no_summary() {
        assert!(matches!(summarize(&[]), Err(SimError::Empty)));
    }
}
