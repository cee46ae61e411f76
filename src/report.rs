use std::{fmt::Display, time::Duration};

use chrono::{DateTime, Utc};

/// Packets per second, 0 when no time has passed.
fn rate(total: u64, over: Duration) -> f64 {
    let secs = over.as_secs_f64();
    if secs > 0.0 {
        total as f64 / secs
    } else {
        0.0
    }
}

/// Snapshot emitted once per second while the pacer runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub elapsed: Duration,
    pub total_sent: u64,
}

impl Progress {
    pub fn rate(&self) -> f64 {
        rate(self.total_sent, self.elapsed)
    }
}

impl Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.0}s] Sent {} packets (~{:.0} pps)",
            self.elapsed.as_secs_f64(),
            self.total_sent,
            self.rate()
        )
    }
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub started_at: DateTime<Utc>,
    pub total_sent: u64,
    pub bursts: u64,
    pub truncated_bursts: u64,
    pub duration: Duration,
    pub elapsed: Duration,
    pub interrupted: bool,
}

impl Summary {
    /// Average over the configured duration, or over the time actually run
    /// when the loop was interrupted.
    pub fn average_rate(&self) -> f64 {
        if self.interrupted {
            rate(self.total_sent, self.elapsed)
        } else {
            rate(self.total_sent, self.duration)
        }
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.interrupted {
            write!(f, "Stopped after {:.1}s. ", self.elapsed.as_secs_f64())?;
        } else {
            write!(f, "Done. ")?;
        }
        write!(
            f,
            "Total packets sent: {} (~{:.0} pps)",
            self.total_sent,
            self.average_rate()
        )?;
        if self.truncated_bursts > 0 {
            write!(
                f,
                ", {}/{} bursts cut short by send errors",
                self.truncated_bursts, self.bursts
            )?;
        }
        Ok(())
    }
}
