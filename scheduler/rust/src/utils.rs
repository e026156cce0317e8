use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use kernel_sim::input::{read_processes, LastField};
use kernel_sim::{ProcessSpec, SimError, Summary, TraceSink, Transition};

// The input file is a CSV with a header line. Every other line describes a process:
// pid, arrival time, total CPU time, I/O frequency, I/O duration, priority.
// Lines without six integers are skipped.
pub fn read_input_file(filename: &Path) -> Result<Vec<ProcessSpec>, SimError> {
    read_processes(filename, LastField::Priority)
}

pub fn trace_header() -> String {
    format!("{:<5} {:<4} {:<10} {:<10}", "Time", "PID", "Old State", "New State")
}

pub fn trace_row(t: &Transition) -> String {
    format!("{:<5} {:<4} {:<10} {:<10}", t.tick, t.pid, t.from, t.to)
}

pub struct TraceWriter {
    path: PathBuf,
    out: BufWriter<File>,
}

impl TraceWriter {
    /// Creates (truncates) the trace file and writes the column header.
    pub fn create(path: &Path) -> Result<TraceWriter, SimError> {
        let file = File::create(path).map_err(|e| SimError::io(path, e))?;
        let mut writer = TraceWriter {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
        };
        writer.write_line(&trace_header())?;
        Ok(writer)
    }

    fn write_line(&mut self, line: &str) -> Result<(), SimError> {
        writeln!(self.out, "{}", line).map_err(|e| SimError::io(&self.path, e))
    }

    pub fn finish(mut self) -> Result<(), SimError> {
        self.out.flush().map_err(|e| SimError::io(&self.path, e))
    }
}

impl TraceSink for TraceWriter {
    fn record(&mut self, transition: &Transition) -> Result<(), SimError> {
        let row = trace_row(transition);
        v_trace!("{}", row);
        self.write_line(&row)
    }
}

pub fn summary_lines(summary: &Summary) -> [String; 2] {
    [
        format!(
            "{:<15} {:<25} {:<25}",
            "Throughput", "Average Turnaround Time", "Average Waiting Time"
        ),
        format!(
            "{:<15.6} {:<25.6} {:<25.6}",
            summary.throughput, summary.avg_turnaround, summary.avg_waiting
        ),
    ]
}

pub fn write_summary(filename: &Path, summary: &Summary) -> Result<(), SimError> {
    let mut file = File::create(filename).map_err(|e| SimError::io(filename, e))?;
    for line in summary_lines(summary) {
        writeln!(file, "{}", line).map_err(|e| SimError::io(filename, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_sim::State;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("scheduler-{}-{}", std::process::id(), name))
    }

    #[test]
    fn rows_use_fixed_width_columns() {
        let t = Transition {
            tick: 12,
            pid: 3,
            from: State::Running,
            to: State::Terminated,
            partition: None,
            memory: None,
        };
        assert_eq!(trace_header(), "Time  PID  Old State  New State ");
        assert_eq!(trace_row(&t), "12    3    Running    Terminated");
    }

    #[test]
    fn summary_has_header_and_values() {
        let lines = summary_lines(&Summary {
            throughput: 0.25,
            avg_turnaround: 4.0,
            avg_waiting: 0.0,
        });
        assert!(lines[0].starts_with("Throughput      Average Turnaround Time"));
        assert!(lines[1].starts_with("0.250000        4.000000"));
    }

    #[test]
    fn trace_file_gets_header_then_rows() {
        let path = temp_path("trace.txt");
        let mut writer = TraceWriter::create(&path).unwrap();
        writer
            .record(&Transition {
                tick: 0,
                pid: 1,
                from: State::New,
                to: State::Ready,
                partition: None,
                memory: None,
            })
            .unwrap();
        writer.finish().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Time"));
        assert!(lines[1].starts_with("0     1    New        Ready"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unwritable_trace_is_an_io_error() {
        let err = TraceWriter::create(Path::new("/nonexistent-dir/trace.txt"))
            .err()
            .unwrap();
        assert!(matches!(err, SimError::Io { .. }));
    }

    #[test]
    fn input_uses_sixth_column_as_priority() {
        let path = temp_path("input.csv");
        fs::write(&path, "PID,Arrival,CPU,IOF,IOD,Priority\n1,0,5,0,0,3\n2,1,3\n").unwrap();
        let procs = read_input_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(procs, vec![ProcessSpec::new(1, 0, 5, 0, 0).with_priority(3)]);
    }
}
