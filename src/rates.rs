// Rate derivation: cumulative counters -> per-second rates.

use crate::models::Timestamp;

/// 8 cores at 100% each.
pub const DEFAULT_CPU_PERCENT_CAP: f64 = 800.0;

const USEC_PER_SEC: f64 = 1_000_000.0;

/// `(current - previous) / elapsed`, or zero when `elapsed` is not positive.
/// A counter that went backwards yields a negative rate; it is not corrected here.
pub fn per_second(previous: f64, current: f64, elapsed_secs: i64) -> f64 {
    if elapsed_secs > 0 {
        (current - previous) / elapsed_secs as f64
    } else {
        0.0
    }
}

/// Carry-over for one entity's N counters (a device, an interface, a container).
///
/// Created empty; every `advance` returns the rates against the previous
/// reading and stores the new one. The first reading has no predecessor and
/// yields zero rates.
#[derive(Debug, Clone, Default)]
pub struct RateState<const N: usize> {
    previous: Option<(Timestamp, [f64; N])>,
}

impl<const N: usize> RateState<N> {
    pub fn new() -> Self {
        Self { previous: None }
    }

    pub fn advance(&mut self, ts: Timestamp, counters: [f64; N]) -> [f64; N] {
        let rates = match self.previous {
            None => [0.0; N],
            Some((prev_ts, prev)) => {
                std::array::from_fn(|i| per_second(prev[i], counters[i], ts - prev_ts))
            }
        };
        self.previous = Some((ts, counters));
        rates
    }
}

/// True when any rate is negative, i.e. a counter was reset or wrapped.
pub fn counter_went_backwards(rates: &[f64]) -> bool {
    rates.iter().any(|r| *r < 0.0)
}

/// CPU microseconds consumed per wall-clock second, as a percentage of one core.
pub fn usec_rate_to_percent(usec_per_sec: f64) -> f64 {
    usec_per_sec / USEC_PER_SEC * 100.0
}

/// Values above `cap` are replaced by exactly `cap`; the flag says whether that happened.
pub fn clamp_percent(value: f64, cap: f64) -> (f64, bool) {
    if value > cap { (cap, true) } else { (value, false) }
}
