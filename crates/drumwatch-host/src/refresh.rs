//! Refresh triggering.
//!
//! Three sources ask for a new snapshot: startup, a periodic ticker and
//! taps read from stdin. They all feed one bounded channel of capacity 1
//! drained by a single renderer. A request that finds the channel full is
//! dropped, since the render already queued will use the current time
//! anyway. Rapid taps therefore collapse into at most one pending render.

use std::io::BufRead;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Why a render was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshSource {
    /// The first render after the host starts.
    Startup,
    /// The periodic refresh interval elapsed.
    Tick,
    /// The user tapped the display, optionally at a known point.
    Tap(Option<(i32, i32)>),
}

/// What happened to a refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The request is waiting for the renderer.
    Queued,
    /// A render was already pending; this request was merged into it.
    Coalesced,
    /// The renderer has shut down.
    Closed,
}

/// Sending half of the refresh channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RefreshTrigger {
    tx: mpsc::Sender<RefreshSource>,
}

impl RefreshTrigger {
    /// Ask for a render without waiting.
    pub fn request(&self, source: RefreshSource) -> Outcome {
        match self.tx.try_send(source) {
            Ok(()) => Outcome::Queued,
            Err(TrySendError::Full(_)) => {
                debug!(?source, "render already pending, request coalesced");
                Outcome::Coalesced
            }
            Err(TrySendError::Closed(_)) => Outcome::Closed,
        }
    }
}

/// Create the refresh channel: at most one pending request.
pub fn channel() -> (RefreshTrigger, mpsc::Receiver<RefreshSource>) {
    let (tx, rx) = mpsc::channel(1);
    (RefreshTrigger { tx }, rx)
}

/// Request a render every `period` until the renderer shuts down.
///
/// The first request fires one full period after the call; the startup
/// render is requested separately. Missed ticks are delayed, not bunched.
pub async fn run_ticker(trigger: RefreshTrigger, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if trigger.request(RefreshSource::Tick) == Outcome::Closed {
            debug!("renderer gone, ticker stopping");
            return;
        }
    }
}

/// Turn each line of `input` into a tap request until end of input.
///
/// A blank line or `tap` taps without a position; `X Y` taps at that
/// pixel. Anything else is logged and ignored. Blocking: run it on its own
/// thread, since a pending read on stdin cannot be cancelled.
pub fn run_taps<R: BufRead>(input: R, trigger: &RefreshTrigger) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to read tap input, taps disabled");
                return;
            }
        };
        let Some(point) = parse_tap(&line) else {
            warn!(line = line.trim(), "ignoring unrecognized tap line");
            continue;
        };
        if trigger.request(RefreshSource::Tap(point)) == Outcome::Closed {
            return;
        }
    }
    debug!("tap input closed");
}

/// Parse one tap line. `Some(None)` is a tap without a position.
pub fn parse_tap(line: &str) -> Option<Option<(i32, i32)>> {
    let line = line.trim();
    if line.is_empty() || line.eq_ignore_ascii_case("tap") {
        return Some(None);
    }
    let mut parts = line.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Some((x, y)))
}
