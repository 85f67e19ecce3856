//! Allocation micro-benchmark driving [`FixedKeyMap`].
//!
//! Each iteration creates a map, inserts `"1" -> 1`, `"2" -> 2` and
//! `"3" -> m["1"] + m["2"]`, then drops it. The loop is timed with either
//! the wall clock or the process CPU time.

use std::hint::black_box;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::MapError;
use crate::map::FixedKeyMap;

/// Iterations run when none is given.
pub const DEFAULT_ITERATIONS: u64 = 50_000_000;

/// Where the map lives during an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Boxed, so the map header itself is heap-allocated each iteration.
    Heap,
    /// A local; only the slot storage touches the heap.
    Stack,
}

impl Default for Placement {
    fn default() -> Self {
        if cfg!(feature = "stack") {
            Placement::Stack
        } else {
            Placement::Heap
        }
    }
}

/// Clock used to time the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Monotonic wall-clock time.
    Wall,
    /// User plus system CPU time of this process.
    Cpu,
}

impl Default for Timer {
    fn default() -> Self {
        if cfg!(feature = "wall-clock") {
            Timer::Wall
        } else {
            Timer::Cpu
        }
    }
}

/// Benchmark configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// Number of create/populate/drop cycles.
    pub iterations: u64,
    /// Where each map is placed.
    pub placement: Placement,
    /// Clock used for the measurement.
    pub timer: Timer,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            placement: Placement::default(),
            timer: Timer::default(),
        }
    }
}

impl BenchConfig {
    /// Parse `[ITERATIONS] [--stack|--heap] [--wall|--cpu]`, starting from
    /// the defaults. `args` excludes the program name.
    pub fn from_args<I>(args: I) -> Result<Self, BenchError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut config = Self::default();
        let mut seen_count = false;
        for arg in args {
            match arg.as_ref() {
                "--stack" => config.placement = Placement::Stack,
                "--heap" => config.placement = Placement::Heap,
                "--wall" => config.timer = Timer::Wall,
                "--cpu" => config.timer = Timer::Cpu,
                other if !seen_count && !other.starts_with('-') => {
                    config.iterations = other
                        .replace('_', "")
                        .parse()
                        .map_err(|_| BenchError::Usage(format!("invalid iteration count: {}", other)))?;
                    seen_count = true;
                }
                other => return Err(BenchError::Usage(format!("unexpected argument: {}", other))),
            }
        }
        Ok(config)
    }
}

/// Outcome of a benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchReport {
    /// Iterations completed.
    pub iterations: u64,
    /// Time measured by the configured clock.
    pub elapsed: Duration,
    /// Sum of the derived value over all iterations.
    pub checksum: i64,
}

impl BenchReport {
    /// Elapsed time in fractional seconds.
    pub fn seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

impl std::fmt::Display for BenchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}", self.seconds())
    }
}

/// Error type for benchmark runs.
#[derive(Debug)]
pub enum BenchError {
    /// The workload hit a map contract violation.
    Map(MapError),
    /// The clock could not be read.
    Clock(std::io::Error),
    /// Bad command-line arguments.
    Usage(String),
    /// A logger was already installed.
    Logger(log::SetLoggerError),
}

impl From<MapError> for BenchError {
    fn from(e: MapError) -> Self {
        BenchError::Map(e)
    }
}

impl From<std::io::Error> for BenchError {
    fn from(e: std::io::Error) -> Self {
        BenchError::Clock(e)
    }
}

impl From<log::SetLoggerError> for BenchError {
    fn from(e: log::SetLoggerError) -> Self {
        BenchError::Logger(e)
    }
}

impl std::fmt::Display for BenchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchError::Map(e) => write!(f, "map error: {}", e),
            BenchError::Clock(e) => write!(f, "clock error: {}", e),
            BenchError::Usage(msg) => f.write_str(msg),
            BenchError::Logger(e) => write!(f, "logger error: {}", e),
        }
    }
}

impl BenchError {
    /// Process exit status for this error: 2 for bad arguments, 1 otherwise.
    pub fn exit_status(&self) -> u8 {
        match self {
            BenchError::Usage(_) => 2,
            _ => 1,
        }
    }
}

impl std::error::Error for BenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BenchError::Map(e) => Some(e),
            BenchError::Clock(e) => Some(e),
            BenchError::Usage(_) => None,
            BenchError::Logger(e) => Some(e),
        }
    }
}

/// The per-iteration workload. Returns the derived third value.
#[inline]
pub fn populate(m: &mut FixedKeyMap) -> Result<i32, MapError> {
    m.add_item("1", 1)?;
    m.add_item("2", 2)?;
    let sum = m.value("1")? + m.value("2")?;
    m.add_item("3", sum)?;
    m.value("3")
}

/// Run the benchmark loop described by `config`.
pub fn run(config: &BenchConfig) -> Result<BenchReport, BenchError> {
    debug!("starting {:?}", config);
    let stopwatch = Stopwatch::start(config.timer)?;
    let mut checksum = 0i64;
    match config.placement {
        Placement::Heap => {
            for _ in 0..config.iterations {
                let mut m = black_box(Box::new(FixedKeyMap::new()));
                checksum += i64::from(populate(&mut m)?);
            }
        }
        Placement::Stack => {
            for _ in 0..config.iterations {
                let mut m = FixedKeyMap::new();
                checksum += i64::from(populate(black_box(&mut m))?);
            }
        }
    }
    let elapsed = stopwatch.elapsed()?;
    Ok(BenchReport {
        iterations: config.iterations,
        elapsed,
        checksum,
    })
}

/// A started measurement on one of the [`Timer`] clocks.
#[derive(Debug, Clone, Copy)]
pub enum Stopwatch {
    /// Started at this instant.
    Wall(Instant),
    /// Started at this amount of consumed CPU time.
    Cpu(Duration),
}

impl Stopwatch {
    /// Take the starting reading.
    pub fn start(timer: Timer) -> std::io::Result<Self> {
        match timer {
            Timer::Wall => Ok(Stopwatch::Wall(Instant::now())),
            Timer::Cpu => match cpu_time()? {
                Some(t) => Ok(Stopwatch::Cpu(t)),
                None => {
                    warn!("process CPU time unavailable on this platform, using wall clock");
                    Ok(Stopwatch::Wall(Instant::now()))
                }
            },
        }
    }

    /// Time elapsed since [`start`](Self::start).
    pub fn elapsed(&self) -> std::io::Result<Duration> {
        match self {
            Stopwatch::Wall(start) => Ok(start.elapsed()),
            Stopwatch::Cpu(start) => {
                let now = cpu_time()?.unwrap_or(*start);
                Ok(now.saturating_sub(*start))
            }
        }
    }
}

/// User plus system CPU time consumed by this process, or `None` where the
/// platform has no such clock.
#[cfg(unix)]
pub fn cpu_time() -> std::io::Result<Option<Duration>> {
    // SAFETY: `rusage` is plain old data, so all-zero is a valid value.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    // SAFETY: `usage` is a valid, exclusively borrowed `rusage`.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(Some(timeval_duration(usage.ru_utime) + timeval_duration(usage.ru_stime)))
}

/// Always `None`: no process CPU clock is wired up off unix.
#[cfg(not(unix))]
pub fn cpu_time() -> std::io::Result<Option<Duration>> {
    Ok(None)
}

#[cfg(unix)]
fn timeval_duration(tv: libc::timeval) -> Duration {
    Duration::from_secs(tv.tv_sec.max(0) as u64) + Duration::from_micros(tv.tv_usec.max(0) as u64)
}
