use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use kernel_sim::input::{read_processes, LastField};
use kernel_sim::{PartitionChange, ProcessSpec, SimError, TraceSink, Transition};

// Same layout as the scheduler input, except that the sixth column is the
// memory the process needs. Malformed lines (including negative memory) are skipped.
pub fn read_input_file(filename: &Path) -> Result<Vec<ProcessSpec>, SimError> {
    read_processes(filename, LastField::Memory)
}

pub fn trace_header() -> String {
    format!(
        "{:<8} {:<8} {:<25} {:<25} {:<20} {:<20} {:<23} {:<18} {:<18} {:<15} {:<15}",
        "Time",
        "PID",
        "Partition # of Entry",
        "Partition # of Removal",
        "Total Used Memory",
        "Total Free Memory",
        "Total Usable Memory",
        "Used Partitions",
        "Free Partitions",
        "Old State",
        "New State"
    )
}

fn join(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|idx| idx.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn trace_row(t: &Transition) -> String {
    let (entry, removal) = match t.partition {
        Some(PartitionChange::Entry(idx)) => (idx.to_string(), String::new()),
        Some(PartitionChange::Removal(idx)) => (String::new(), idx.to_string()),
        None => (String::new(), String::new()),
    };
    let (used, free, usable, used_list, free_list) = match &t.memory {
        Some(m) => (
            m.used,
            m.free,
            m.usable,
            join(&m.used_partitions),
            join(&m.free_partitions),
        ),
        None => (0, 0, 0, String::new(), String::new()),
    };
    format!(
        "{:<8} {:<8} {:<25} {:<25} {:<20} {:<20} {:<23} {:<18} {:<18} {:<15} {:<15}",
        t.tick, t.pid, entry, removal, used, free, usable, used_list, free_list, t.from, t.to
    )
}

/// Occupancy figures gathered while writing the trace.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    pub transitions: usize,
    pub peak_used: usize,
    pub peak_partitions: usize,
}

pub struct MemoryTraceWriter {
    path: PathBuf,
    out: BufWriter<File>,
    stats: MemoryStats,
}

impl MemoryTraceWriter {
    pub fn create(path: &Path) -> Result<MemoryTraceWriter, SimError> {
        let file = File::create(path).map_err(|e| SimError::io(path, e))?;
        let mut writer = MemoryTraceWriter {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            stats: MemoryStats::default(),
        };
        writer.write_line(&trace_header())?;
        Ok(writer)
    }

    fn write_line(&mut self, line: &str) -> Result<(), SimError> {
        writeln!(self.out, "{}", line).map_err(|e| SimError::io(&self.path, e))
    }

    /// Flushes the file and hands back the gathered stats.
    pub fn finish(mut self) -> Result<MemoryStats, SimError> {
        self.out.flush().map_err(|e| SimError::io(&self.path, e))?;
        Ok(self.stats)
    }
}

impl TraceSink for MemoryTraceWriter {
    fn record(&mut self, transition: &Transition) -> Result<(), SimError> {
        self.stats.transitions += 1;
        if let Some(m) = &transition.memory {
            self.stats.peak_used = self.stats.peak_used.max(m.used);
            self.stats.peak_partitions = self.stats.peak_partitions.max(m.used_partitions.len());
        }
        let row = trace_row(transition);
        v_trace!("{}", row);
        self.write_line(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_sim::{MemorySnapshot, SimConfig, Simulation, State};
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mmu-{}-{}", std::process::id(), name))
    }

    fn admitted() -> Transition {
        Transition {
            tick: 3,
            pid: 7,
            from: State::New,
            to: State::Ready,
            partition: Some(PartitionChange::Entry(1)),
            memory: Some(MemorySnapshot {
                used: 200,
                free: 1050,
                usable: 1000,
                used_partitions: vec![1],
                free_partitions: vec![0, 2, 3],
            }),
        }
    }

    #[test]
    fn entry_row_fills_entry_column() {
        let row = trace_row(&admitted());
        let expected = format!(
            "{:<8} {:<8} {:<25} {:<25} {:<20} {:<20} {:<23} {:<18} {:<18} {:<15} {:<15}",
            3, 7, "1", "", 200, 1050, 1000, "1", "0 2 3", "New", "Ready"
        );
        assert_eq!(row, expected);
    }

    #[test]
    fn removal_row_fills_removal_column() {
        let mut t = admitted();
        t.from = State::Running;
        t.to = State::Terminated;
        t.partition = Some(PartitionChange::Removal(1));
        let row = trace_row(&t);
        // 8 + 1 + 8 + 1 columns, then an empty entry column
        assert_eq!(&row[18..44], " ".repeat(26));
        assert_eq!(&row[44..45], "1");
    }

    #[test]
    fn header_matches_row_widths() {
        let header = trace_header();
        assert!(header.starts_with("Time     PID      Partition # of Entry"));
        assert_eq!(header.len(), trace_row(&admitted()).len());
    }

    #[test]
    fn writer_records_stats_for_a_run() {
        let path = temp_path("trace.txt");
        let specs = vec![
            ProcessSpec::new(1, 0, 2, 0, 0).with_memory(120),
            ProcessSpec::new(2, 0, 1, 0, 0).with_memory(240),
        ];
        let mut sim = Simulation::new(specs, &SimConfig::memory([500, 250, 150, 100])).unwrap();
        let mut writer = MemoryTraceWriter::create(&path).unwrap();
        sim.run(&mut writer).unwrap();
        let stats = writer.finish().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(text.lines().count(), 1 + stats.transitions);
        assert_eq!(stats.transitions, 6);
        assert_eq!(stats.peak_used, 360);
        assert_eq!(stats.peak_partitions, 2);
    }
}
