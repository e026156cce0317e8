use std::fmt;

pub type Pid = u32;

/// Lifecycle state of a simulated process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    New,
    Ready,
    Running,
    Waiting,
    Terminated,
}

impl State {
    pub const ALL: [State; 5] = [
        State::New,
        State::Ready,
        State::Running,
        State::Waiting,
        State::Terminated,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            State::New => "New",
            State::Ready => "Ready",
            State::Running => "Running",
            State::Waiting => "Waiting",
            State::Terminated => "Terminated",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `pad` so that width specifiers like `{:<10}` apply
        f.pad(self.name())
    }
}

/// Static description of a process, as read from the input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub pid: Pid,
    pub arrival: usize,
    pub cpu_time: usize,
    /// CPU ticks between I/O requests; 0 means the process never does I/O.
    pub io_frequency: usize,
    pub io_duration: usize,
    pub priority: i32,
    pub memory: usize,
}

impl ProcessSpec {
    pub fn new(
        pid: Pid,
        arrival: usize,
        cpu_time: usize,
        io_frequency: usize,
        io_duration: usize,
    ) -> ProcessSpec {
        ProcessSpec {
            pid,
            arrival,
            cpu_time,
            io_frequency,
            io_duration,
            priority: 0,
            memory: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> ProcessSpec {
        self.priority = priority;
        self
    }

    pub fn with_memory(mut self, memory: usize) -> ProcessSpec {
        self.memory = memory;
        self
    }
}

/// Why a record was pulled out of Running and is now owed ready-time accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeKind {
    Timer,
    Io,
}

/// A pending ready-time reconciliation, opened when the record re-enters Ready
/// and closed at its next dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Episode {
    pub kind: EpisodeKind,
    pub since: usize,
}

/// A process record: static demand plus the counters the engine mutates each tick.
#[derive(Debug, Clone)]
pub struct Process {
    pub spec: ProcessSpec,

    pub(crate) state: State,
    pub(crate) remaining: usize,
    /// ticks spent in the current Waiting episode
    pub(crate) io_elapsed: usize,
    /// CPU ticks since the last I/O request
    pub(crate) run_elapsed: usize,
    /// ticks in the current time slice
    pub(crate) slice_elapsed: usize,
    pub(crate) ready_wait: usize,
    pub(crate) partition: Option<usize>,
    pub(crate) episode: Option<Episode>,

    // stats
    pub(crate) start: Option<usize>,
    pub(crate) end: Option<usize>,
}

impl Process {
    pub fn new(spec: ProcessSpec) -> Process {
        Process {
            remaining: spec.cpu_time,
            spec,
            state: State::New,
            io_elapsed: 0,
            run_elapsed: 0,
            slice_elapsed: 0,
            ready_wait: 0,
            partition: None,
            episode: None,
            start: None,
            end: None,
        }
    }

    pub fn pid(&self) -> Pid {
        self.spec.pid
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn partition(&self) -> Option<usize> {
        self.partition
    }

    pub fn episode(&self) -> Option<Episode> {
        self.episode
    }

    /// Tick of the first dispatch, `None` until the record has run.
    pub fn start_time(&self) -> Option<usize> {
        self.start
    }

    /// Tick at which the record terminated.
    pub fn end_time(&self) -> Option<usize> {
        self.end
    }

    /// Ready-state time accrued from timer and I/O episodes.
    pub fn ready_wait(&self) -> usize {
        self.ready_wait
    }

    /// Opens a ready-time episode; the record has just been moved to Ready.
    pub(crate) fn open_episode(&mut self, kind: EpisodeKind, tick: usize) {
        self.episode = Some(Episode { kind, since: tick });
    }

    /// Bookkeeping for a Ready → Running move at `tick`.
    pub(crate) fn dispatch(&mut self, tick: usize) {
        if self.start.is_none() {
            self.start = Some(tick);
        }
        if let Some(episode) = self.episode.take() {
            self.ready_wait += tick - episode.since;
        }
        self.slice_elapsed = 0;
    }

    /// Runs the record for one tick. Returns true once the CPU burst is exhausted.
    pub(crate) fn tick_cpu(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.run_elapsed += 1;
        self.slice_elapsed += 1;
        self.remaining == 0
    }

    pub(crate) fn io_due(&self) -> bool {
        self.spec.io_frequency != 0 && self.run_elapsed == self.spec.io_frequency
    }

    /// Advances the current I/O episode. Returns true when the I/O has completed.
    pub(crate) fn tick_io(&mut self) -> bool {
        self.io_elapsed += 1;
        if self.io_elapsed >= self.spec.io_duration {
            self.io_elapsed = 0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_starts_in_new_with_full_burst() {
        let p = Process::new(ProcessSpec::new(7, 3, 10, 4, 2));
        assert_eq!(p.state(), State::New);
        assert_eq!(p.remaining(), 10);
        assert_eq!(p.start_time(), None);
        assert_eq!(p.end_time(), None);
        assert_eq!(p.partition(), None);
        assert_eq!(p.episode(), None);
    }

    #[test]
    fn dispatch_reconciles_pending_episode() {
        let mut p = Process::new(ProcessSpec::new(1, 0, 10, 0, 0));
        p.dispatch(2);
        assert_eq!(p.start_time(), Some(2));

        p.open_episode(EpisodeKind::Timer, 5);
        p.dispatch(9);
        assert_eq!(p.ready_wait(), 4);
        assert_eq!(p.episode(), None);
        // start time is set once
        assert_eq!(p.start_time(), Some(2));

        // no episode, nothing accrued
        p.dispatch(12);
        assert_eq!(p.ready_wait(), 4);
    }

    #[test]
    fn zero_burst_saturates() {
        let mut p = Process::new(ProcessSpec::new(1, 0, 0, 0, 0));
        assert!(p.tick_cpu());
        assert_eq!(p.remaining(), 0);
    }

    #[test]
    fn zero_io_frequency_never_requests_io() {
        let mut p = Process::new(ProcessSpec::new(1, 0, 100, 0, 3));
        for _ in 0..10 {
            p.tick_cpu();
            assert!(!p.io_due());
        }
    }

    #[test]
    fn io_completes_after_duration() {
        let mut p = Process::new(ProcessSpec::new(1, 0, 10, 2, 3));
        assert!(!p.tick_io());
        assert!(!p.tick_io());
        assert!(p.tick_io());
        assert_eq!(p.io_elapsed, 0);
    }

    #[test]
    fn state_pads_to_width() {
        assert_eq!(format!("{:<10}|", State::Ready), "Ready     |");
    }
}
