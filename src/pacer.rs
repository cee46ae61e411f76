//! Rate-paced packet emission.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use bytes::Bytes;
use chrono::Utc;
use log::{debug, error};

use crate::{
    report::{Progress, Summary},
    socket::Transport,
};

/// Achievable rates are multiples of 100 pps: 60_040 pps goes out as 600 packets per burst.
pub const BURST_INTERVAL: Duration = Duration::from_millis(10);
pub const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// `max(1, round(pps * interval))`, rounding half away from zero.
pub fn burst_size(pps: u64, interval: Duration) -> u64 {
    let size = (pps as u128).saturating_mul(interval.as_millis()).saturating_add(500) / 1000;
    u64::try_from(size.max(1)).unwrap_or(u64::MAX)
}

/// Receives a progress snapshot once per [`REPORT_INTERVAL`].
pub trait Reporter {
    fn progress(&mut self, progress: &Progress);
}

impl<F: FnMut(&Progress)> Reporter for F {
    fn progress(&mut self, progress: &Progress) {
        self(progress)
    }
}

/// Counters owned by a single [`Pacer::run`] call.
struct RunState {
    start: Instant,
    total_sent: u64,
    bursts: u64,
    truncated_bursts: u64,
    next_log: Duration,
}

impl RunState {
    fn new() -> RunState {
        RunState {
            start: Instant::now(),
            total_sent: 0,
            bursts: 0,
            truncated_bursts: 0,
            next_log: REPORT_INTERVAL,
        }
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn record(&mut self, sent: u64, truncated: bool) {
        self.total_sent += sent;
        self.bursts += 1;
        if truncated {
            self.truncated_bursts += 1;
        }
    }

    /// Returns a snapshot when a report checkpoint has been reached.
    fn checkpoint(&mut self) -> Option<Progress> {
        let elapsed = self.elapsed();
        if elapsed < self.next_log {
            return None;
        }
        self.next_log += REPORT_INTERVAL;
        Some(Progress {
            elapsed,
            total_sent: self.total_sent,
        })
    }
}

pub struct Pacer<T> {
    transport: T,
    payload: Bytes,
    burst_size: u64,
    duration: Duration,
    interrupted: Arc<AtomicBool>,
}

impl<T: Transport> Pacer<T> {
    pub fn new(
        transport: T,
        payload: Bytes,
        pps: u64,
        duration: Duration,
        interrupted: Arc<AtomicBool>,
    ) -> Pacer<T> {
        Pacer {
            transport,
            payload,
            burst_size: burst_size(pps, BURST_INTERVAL),
            duration,
            interrupted,
        }
    }

    pub fn burst_size(&self) -> u64 {
        self.burst_size
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Runs until the duration is spent or the interrupt flag is raised.
    pub fn run<R: Reporter>(&mut self, reporter: &mut R) -> Summary {
        let started_at = Utc::now();
        debug!(
            "Bursts of {} packets of {} bytes every {:?}",
            self.burst_size,
            self.payload.len(),
            BURST_INTERVAL
        );

        let mut state = RunState::new();
        loop {
            if self.is_interrupted() {
                debug!("Interrupt observed after {} bursts", state.bursts);
                break;
            }

            let burst_start = Instant::now();
            if burst_start.duration_since(state.start) >= self.duration {
                break;
            }

            let (sent, truncated) = self.send_burst();
            state.record(sent, truncated);

            if let Some(rest) = BURST_INTERVAL.checked_sub(burst_start.elapsed()) {
                if !rest.is_zero() {
                    std::thread::sleep(rest);
                }
            }

            if let Some(progress) = state.checkpoint() {
                reporter.progress(&progress);
            }
        }

        Summary {
            started_at,
            total_sent: state.total_sent,
            bursts: state.bursts,
            truncated_bursts: state.truncated_bursts,
            duration: self.duration,
            elapsed: state.elapsed(),
            interrupted: self.is_interrupted(),
        }
    }

    /// Sends up to `burst_size` datagrams. The first error ends the burst and
    /// is reported through the second tuple field.
    fn send_burst(&mut self) -> (u64, bool) {
        let mut sent = 0;
        for _ in 0..self.burst_size {
            match self.transport.send(&self.payload) {
                Ok(_) => sent += 1,
                Err(err) => {
                    error!("Send error: {}", err);
                    return (sent, true);
                }
            }
        }
        (sent, false)
    }
}
