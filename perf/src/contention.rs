//! Reader/writer contention harness.
//!
//! Spawns `writer_count` writers that keep installing their own value and
//! `reader_count` readers that each perform `iterations` reads, tallying which
//! writer produced every value they saw. Only the reader phase is timed;
//! writers are stopped once the last reader is done.
//!
//! ```text
//!  writer 1 ──sleep──write(1)──sleep──write(1)── ... ──────────┐ stop
//!  writer 2 ──sleep──write(2)──sleep──write(2)── ... ──────────┤
//!                                                              │
//!  reader 0 ──read──read──read── ... (iterations) ──┐          │
//!  reader 1 ──read──read──read── ... (iterations) ──┤ join ────┘
//!           |<────────────── timed ────────────────>|
//! ```

use lithos_config::{ContentionConfig, SlotKind};
use lithos_slot::{MutexSlot, RingSlot, SharedSlot};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Instant;

/// Value installed by the harness: which writer produced it plus a check
/// word a torn copy would fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload {
    pub source: u64,
    check: u64,
}

impl Payload {
    /// `source` 0 is the initial value, writers use `1..=writer_count`.
    pub fn new(source: u64) -> Self {
        Self {
            source,
            check: !source.wrapping_mul(0x9E37_79B9_7F4A_7C15),
        }
    }

    pub fn initial() -> Self {
        Self::new(0)
    }

    #[inline]
    pub fn is_intact(&self) -> bool {
        self.check == !self.source.wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }
}

/// What one reader observed.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReaderTally {
    /// `counts[0]` is the initial value, `counts[w]` writer `w`.
    pub counts: Vec<u64>,
    /// Reads that returned a torn payload or an unknown source.
    pub anomalies: u64,
}

impl ReaderTally {
    fn new(writer_count: usize) -> Self {
        Self {
            counts: vec![0; writer_count + 1],
            anomalies: 0,
        }
    }

    #[inline]
    fn record(&mut self, payload: &Payload) {
        match self.counts.get_mut(payload.source as usize) {
            Some(count) if payload.is_intact() => *count += 1,
            _ => self.anomalies += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum::<u64>() + self.anomalies
    }

    /// Share of reads per source, in percent of all reads by this reader.
    pub fn percentages(&self) -> Vec<f64> {
        let total = self.total();
        if total == 0 {
            return vec![0.0; self.counts.len()];
        }
        self.counts
            .iter()
            .map(|&n| 100.0 * n as f64 / total as f64)
            .collect()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ContentionReport {
    pub implementation: &'static str,
    pub reader_count: usize,
    pub writer_count: usize,
    pub iterations: u64,
    pub elapsed_ns: u64,
    pub writes: u64,
    pub readers: Vec<ReaderTally>,
}

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("{implementation}: reader {reader} saw {count} torn or unknown values")]
    Anomalies {
        implementation: &'static str,
        reader: usize,
        count: u64,
    },

    #[error("{implementation}: reader {reader} recorded {got} reads, expected {expected}")]
    MissingReads {
        implementation: &'static str,
        reader: usize,
        expected: u64,
        got: u64,
    },
}

impl ContentionReport {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns / 1_000_000
    }

    pub fn total_reads(&self) -> u64 {
        self.readers.iter().map(ReaderTally::total).sum()
    }

    pub fn reads_per_sec(&self) -> f64 {
        if self.elapsed_ns == 0 {
            return 0.0;
        }
        self.total_reads() as f64 * 1e9 / self.elapsed_ns as f64
    }

    pub fn anomalies(&self) -> u64 {
        self.readers.iter().map(|r| r.anomalies).sum()
    }

    /// Checks that every reader accounted for all its reads and saw only
    /// values some writer (or the constructor) installed.
    pub fn verify(&self) -> Result<(), HarnessError> {
        for (reader, tally) in self.readers.iter().enumerate() {
            if tally.anomalies > 0 {
                return Err(HarnessError::Anomalies {
                    implementation: self.implementation,
                    reader,
                    count: tally.anomalies,
                });
            }
            if tally.total() != self.iterations {
                return Err(HarnessError::MissingReads {
                    implementation: self.implementation,
                    reader,
                    expected: self.iterations,
                    got: tally.total(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for ContentionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} done in {} ms", self.iterations, self.elapsed_ms())?;
        for (reader, tally) in self.readers.iter().enumerate() {
            write!(f, "Reader {reader} :")?;
            for (pct, n) in tally.percentages().iter().zip(&tally.counts) {
                write!(f, " {pct}% ({n})")?;
            }
            if tally.anomalies > 0 {
                write!(f, " anomalies ({})", tally.anomalies)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Runs one contention round against `slot`.
///
/// `slot` should hold [`Payload::initial`]; writer `w` installs
/// `Payload::new(w)` for `w` in `1..=writer_count`.
pub fn run_contention<S>(slot: &S, cfg: &ContentionConfig) -> ContentionReport
where
    S: SharedSlot<Payload>,
{
    let writers_enabled = AtomicBool::new(true);
    let writes = AtomicU64::new(0);
    let interval = cfg.writer_interval();

    tracing::debug!(
        implementation = slot.name(),
        readers = cfg.reader_count,
        writers = cfg.writer_count,
        iterations = cfg.iterations,
        "starting contention run"
    );

    let (elapsed, readers) = thread::scope(|scope| {
        for writer in 1..=cfg.writer_count as u64 {
            let writers_enabled = &writers_enabled;
            let writes = &writes;
            scope.spawn(move || {
                let local = Arc::new(Payload::new(writer));
                let mut count = 0u64;
                while writers_enabled.load(Ordering::Relaxed) {
                    if !interval.is_zero() {
                        thread::sleep(interval);
                    }
                    slot.write(Arc::clone(&local));
                    count += 1;
                }
                writes.fetch_add(count, Ordering::Relaxed);
            });
        }

        let start = Instant::now();
        let handles: Vec<_> = (0..cfg.reader_count)
            .map(|_| {
                scope.spawn(move || {
                    let mut tally = ReaderTally::new(cfg.writer_count);
                    for _ in 0..cfg.iterations {
                        tally.record(&slot.read());
                    }
                    tally
                })
            })
            .collect();

        let readers: Vec<ReaderTally> = handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect();
        let elapsed = start.elapsed();

        writers_enabled.store(false, Ordering::Relaxed);
        (elapsed, readers)
    });

    let report = ContentionReport {
        implementation: slot.name(),
        reader_count: cfg.reader_count,
        writer_count: cfg.writer_count,
        iterations: cfg.iterations,
        elapsed_ns: elapsed.as_nanos() as u64,
        writes: writes.load(Ordering::Relaxed),
        readers,
    };

    tracing::info!(
        implementation = report.implementation,
        elapsed_ms = report.elapsed_ms(),
        writes = report.writes,
        reads_per_sec = report.reads_per_sec() as u64,
        anomalies = report.anomalies(),
        "contention run finished"
    );
    report
}

/// Builds a fresh slot of the given kind and runs one round on it.
pub fn run_kind(kind: SlotKind, cfg: &ContentionConfig) -> ContentionReport {
    match kind {
        SlotKind::Mutex => run_contention(&MutexSlot::from_value(Payload::initial()), cfg),
        SlotKind::Ring => run_contention(&RingSlot::<Payload>::from_value(Payload::initial()), cfg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(iterations: u64) -> ContentionConfig {
        ContentionConfig {
            iterations,
            writer_interval_ns: 0,
            ..ContentionConfig::default()
        }
    }

    fn assert_shares_add_up(report: &ContentionReport) {
        assert_eq!(report.readers.len(), report.reader_count);
        for tally in &report.readers {
            assert_eq!(tally.counts.len(), report.writer_count + 1);
            let pct = tally.percentages();
            assert!(pct.iter().all(|&p| p >= 0.0));
            let sum: f64 = pct.iter().sum();
            assert!((sum - 100.0).abs() < 1e-6, "shares sum to {sum}");
        }
    }

    #[test]
    fn payload_check_detects_mixing() {
        let a = Payload::new(1);
        let b = Payload::new(2);
        assert!(a.is_intact() && b.is_intact());
        let mixed = Payload {
            source: a.source,
            check: b.check,
        };
        assert!(!mixed.is_intact());
    }

    #[test]
    fn tally_counts_unknown_sources_as_anomalies() {
        let mut tally = ReaderTally::new(2);
        tally.record(&Payload::new(0));
        tally.record(&Payload::new(2));
        tally.record(&Payload::new(3));
        assert_eq!(tally.counts, vec![1, 0, 1]);
        assert_eq!(tally.anomalies, 1);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn ring_four_readers_two_writers() {
        let report = run_kind(SlotKind::Ring, &small_config(20_000));
        assert_eq!(report.implementation, "ring");
        report.verify().expect("ring run should be clean");
        assert_eq!(report.anomalies(), 0);
        assert_shares_add_up(&report);
        assert_eq!(report.total_reads(), 4 * 20_000);
    }

    #[test]
    fn mutex_four_readers_two_writers() {
        let report = run_kind(SlotKind::Mutex, &small_config(20_000));
        assert_eq!(report.implementation, "mutex");
        report.verify().expect("mutex run should be clean");
        assert_shares_add_up(&report);
    }

    #[test]
    fn display_lists_every_reader() {
        let cfg = ContentionConfig {
            reader_count: 2,
            writer_count: 1,
            ..small_config(1_000)
        };
        let report = run_kind(SlotKind::Ring, &cfg);
        let text = report.to_string();
        assert!(text.starts_with("1000 done in "));
        assert!(text.contains("Reader 0 :"));
        assert!(text.contains("Reader 1 :"));
        assert!(!text.contains("anomalies"));
    }

    #[test]
    fn verify_flags_short_tallies() {
        let report = ContentionReport {
            implementation: "ring",
            reader_count: 1,
            writer_count: 1,
            iterations: 10,
            elapsed_ns: 1,
            writes: 0,
            readers: vec![ReaderTally {
                counts: vec![4, 5],
                anomalies: 0,
            }],
        };
        assert!(matches!(
            report.verify(),
            Err(HarnessError::MissingReads { got: 9, .. })
        ));
    }

    #[test]
    fn anomalies_are_summed_over_readers() {
        let tally = |anomalies| ReaderTally {
            counts: vec![3, 4],
            anomalies,
        };
        let report = ContentionReport {
            implementation: "ring",
            reader_count: 2,
            writer_count: 1,
            iterations: 9,
            elapsed_ns: 1,
            writes: 0,
            readers: vec![tally(2), tally(0)],
        };
        assert_eq!(report.anomalies(), 2);
        assert!(matches!(
            report.verify(),
            Err(HarnessError::Anomalies { reader: 0, count: 2, .. })
        ));
        assert!(report.to_string().contains("anomalies (2)"));
    }
}
