// Stall detection and recovery for live adaptive playback.
//
// Near the live edge a player can stop advancing without ever raising a
// stream error: the buffer drains, the loader idles, and the session still
// believes it is playing. The watchdog samples playback position on a fixed
// cadence and, when progress stops, applies a best-effort nudge. It never
// raises an error.

use tracing::debug;

use crate::config::WatchdogConfig;
use crate::engine::StreamingEngine;

pub struct StallWatchdog {
    config: WatchdogConfig,
    last_position: Option<f64>,
}

impl StallWatchdog {
    pub fn new(config: WatchdogConfig) -> Self {
        Self {
            config,
            last_position: None,
        }
    }

    /// Forget the sampling baseline. Called when playback (re)starts or
    /// resumes so a legitimate position freeze during a pause is not read
    /// as a stall.
    pub fn reset(&mut self) {
        self.last_position = None;
    }

    /// Record one sample. Returns true when the position failed to advance
    /// past the epsilon since the previous sample. The first sample after a
    /// reset only establishes the baseline.
    pub fn sample(&mut self, position: f64) -> bool {
        let stalled = match self.last_position {
            Some(last) => position <= last + self.config.stall_epsilon_secs,
            None => false,
        };
        self.last_position = Some(position);
        stalled
    }

    /// Best-effort recovery: recreate slack behind the live edge, resume an
    /// unexpectedly paused player, and re-arm the segment loader in case it
    /// silently stopped fetching.
    pub fn nudge(&self, engine: &mut dyn StreamingEngine) {
        let position = engine.position();
        if let Some(end) = engine.buffered_end()
            && end - position < self.config.stall_epsilon_secs
        {
            let target = (end - self.config.live_edge_rewind_secs).max(0.0);
            debug!(position, buffered_end = end, target, "nudge: reseeking behind live edge");
            engine.seek(target);
        }
        if engine.is_paused() {
            debug!(position, "nudge: resuming unexpectedly paused playback");
            engine.play();
        }
        engine.start_load();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEngine;

    fn watchdog() -> StallWatchdog {
        StallWatchdog::new(WatchdogConfig::default())
    }

    #[test]
    fn first_sample_is_never_a_stall() {
        let mut wd = watchdog();
        assert!(!wd.sample(0.0));
    }

    #[test]
    fn advance_past_epsilon_is_progress() {
        let mut wd = watchdog();
        wd.sample(10.0);
        assert!(!wd.sample(10.5));
        // Sub-epsilon advance counts as a stall.
        assert!(wd.sample(10.6));
    }

    #[test]
    fn reset_reestablishes_baseline() {
        let mut wd = watchdog();
        wd.sample(10.0);
        wd.reset();
        // Same position, but the baseline is gone.
        assert!(!wd.sample(10.0));
        assert!(wd.sample(10.1));
    }

    #[test]
    fn nudge_reseeks_when_pinned_to_live_edge() {
        let (mut engine, _events) = FakeEngine::create_pair();
        engine.state().set_position(20.0);
        engine.state().set_buffered_end(Some(20.1));
        watchdog().nudge(&mut engine);
        assert_eq!(engine.state().seeks(), vec![19.6]);
        assert_eq!(engine.state().start_load_calls(), 1);
    }

    #[test]
    fn nudge_skips_reseek_with_buffer_slack() {
        let (mut engine, _events) = FakeEngine::create_pair();
        engine.state().set_position(20.0);
        engine.state().set_buffered_end(Some(25.0));
        watchdog().nudge(&mut engine);
        assert!(engine.state().seeks().is_empty());
        assert_eq!(engine.state().start_load_calls(), 1);
    }

    #[test]
    fn nudge_resumes_paused_playback() {
        let (mut engine, _events) = FakeEngine::create_pair();
        engine.pause();
        watchdog().nudge(&mut engine);
        assert!(!engine.is_paused());
    }

    #[test]
    fn nudge_never_seeks_below_zero() {
        let (mut engine, _events) = FakeEngine::create_pair();
        engine.state().set_position(0.1);
        engine.state().set_buffered_end(Some(0.2));
        watchdog().nudge(&mut engine);
        assert_eq!(engine.state().seeks(), vec![0.0]);
    }
}
