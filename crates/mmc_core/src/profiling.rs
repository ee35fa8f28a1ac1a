//! Event rate tracking for simulation runs.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::clock::EventKind;

/// Processed-event counts and wall-clock throughput for one run.
#[derive(Debug, Clone, Default)]
pub struct EventMetrics {
    events_processed: u64,
    events_by_kind: HashMap<EventKind, u64>,
    start_time: Option<Instant>,
    end_time: Option<Instant>,
}

impl EventMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one processed event. The first call starts the wall clock.
    pub fn record_event(&mut self, kind: EventKind) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
        self.events_processed += 1;
        *self.events_by_kind.entry(kind).or_insert(0) += 1;
    }

    /// Stop the wall clock.
    pub fn finish(&mut self) {
        if self.end_time.is_none() {
            self.end_time = Some(Instant::now());
        }
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    pub fn count(&self, kind: EventKind) -> u64 {
        self.events_by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Wall time between the first event and [EventMetrics::finish] (or now).
    pub fn elapsed(&self) -> Option<Duration> {
        let start = self.start_time?;
        Some(match self.end_time {
            Some(end) => end.duration_since(start),
            None => start.elapsed(),
        })
    }

    pub fn events_per_second(&self) -> f64 {
        match self.elapsed() {
            Some(elapsed) if elapsed.as_secs_f64() > 0.0 => {
                self.events_processed as f64 / elapsed.as_secs_f64()
            }
            _ => 0.0,
        }
    }

    /// Print summary statistics.
    pub fn print_summary(&self) {
        println!("\n=== Event Processing Summary ===");
        println!("Total events processed: {}", self.events_processed);
        if let Some(elapsed) = self.elapsed() {
            println!("Total time: {:.3}s", elapsed.as_secs_f64());
            println!("Events per second: {:.0}", self.events_per_second());
        }
        println!("\nEvents by kind:");
        let mut kinds: Vec<_> = self.events_by_kind.iter().collect();
        kinds.sort_by_key(|(kind, _)| **kind);
        for (kind, count) in kinds {
            println!("  {:12} : {}", format!("{:?}", kind), count);
        }
    }
}
