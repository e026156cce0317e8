//! Reads process descriptors from comma-separated text.
//!
//! Each line holds six integers: `pid,arrival,cpu_time,io_frequency,io_duration,last`
//! where `last` is the priority or the memory demand depending on the simulator.
//! The header line, blank lines and any line without six usable integers are skipped.

use std::fs;
use std::path::Path;

use log::trace;
use regex::Regex;

use crate::error::SimError;
use crate::process::ProcessSpec;

/// Meaning of the sixth column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastField {
    Priority,
    Memory,
}

const LINE_PATTERN: &str = r"^\s*(-?\d+)\s*,\s*(-?\d+)\s*,\s*(-?\d+)\s*,\s*(-?\d+)\s*,\s*(-?\d+)\s*,\s*(-?\d+)\s*(?:,.*)?$";

fn line_regex() -> Regex {
    Regex::new(LINE_PATTERN).expect("line pattern is a valid regex")
}

fn parse_line(re: &Regex, line: &str, last: LastField) -> Option<ProcessSpec> {
    let caps = re.captures(line)?;
    let pid = caps[1].parse().ok()?;
    let arrival = caps[2].parse().ok()?;
    let cpu_time = caps[3].parse().ok()?;
    let io_frequency = caps[4].parse().ok()?;
    let io_duration = caps[5].parse().ok()?;
    let spec = ProcessSpec::new(pid, arrival, cpu_time, io_frequency, io_duration);
    match last {
        LastField::Priority => Some(spec.with_priority(caps[6].parse().ok()?)),
        LastField::Memory => Some(spec.with_memory(caps[6].parse().ok()?)),
    }
}

pub fn parse_processes(text: &str, last: LastField) -> Vec<ProcessSpec> {
    let re = line_regex();
    text.lines()
        .enumerate()
        .filter_map(|(lineno, line)| {
            let spec = parse_line(&re, line, last);
            if spec.is_none() {
                trace!("skipping input line {}: {:?}", lineno + 1, line);
            }
            spec
        })
        .collect()
}

pub fn read_processes(path: &Path, last: LastField) -> Result<Vec<ProcessSpec>, SimError> {
    let text = fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
    Ok(parse_processes(&text, last))
}
