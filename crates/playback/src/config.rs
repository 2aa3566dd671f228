use std::time::Duration;

/// Configuration for the readiness prober.
#[derive(Debug, Clone)]
pub struct ProberConfig {
    /// Hard upper bound on the whole wait. After this elapses the caller is
    /// guaranteed a timeout outcome and no further polling happens.
    pub timeout: Duration,
    /// Fixed delay between existence checks. The first check fires
    /// immediately.
    pub poll_interval: Duration,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            poll_interval: Duration::from_millis(450),
        }
    }
}

/// Configuration for the stall watchdog.
#[derive(Debug, Clone)]
pub struct WatchdogConfig {
    /// Sampling cadence while a session is playing.
    pub interval: Duration,
    /// Minimum position advance per sample to count as forward progress.
    /// Doubles as the live-edge proximity threshold during a nudge.
    pub stall_epsilon_secs: f64,
    /// How far behind the buffered end a nudge reseeks to recreate slack.
    pub live_edge_rewind_secs: f64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            stall_epsilon_secs: 0.2,
            live_edge_rewind_secs: 0.5,
        }
    }
}

/// What happens to grid sessions while a detail view is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridFocusPolicy {
    /// Pause the whole grid while a detail view is open. This is the
    /// reference behavior on both original clients.
    #[default]
    PauseAll,
    /// Pause only the focused camera's grid tile; the rest keep playing.
    PauseFocusedOnly,
}

/// Configuration for the session pool.
#[derive(Debug, Clone, Default)]
pub struct PoolConfig {
    pub grid_focus_policy: GridFocusPolicy,
}

/// Aggregated configuration for the playback core.
#[derive(Debug, Clone, Default)]
pub struct PlaybackConfig {
    pub prober: ProberConfig,
    pub watchdog: WatchdogConfig,
    pub pool: PoolConfig,
}
