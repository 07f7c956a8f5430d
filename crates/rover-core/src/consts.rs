//! Default values for the bot's tunable knobs.

/// Distance covered by one movement step, in meters.
pub const DEFAULT_STEP_SIZE_M: f64 = 200.0;

/// How long a spun landmark stays in the visited set, in seconds.
pub const DEFAULT_VISITED_EXPIRY_SECS: u64 = 600;

/// Upper bound on remembered landmarks.
pub const VISITED_LANDMARK_CAP: usize = 120;

/// Maximum throws per encounter before giving up.
pub const DEFAULT_THROW_RETRY_LIMIT: u32 = 5;

/// Consecutive capture failures before a soft-ban warning is logged.
pub const DEFAULT_FAILURE_WARN_LIMIT: u32 = 10;

/// Every Nth heartbeat forces a full inventory refresh.
pub const DEFAULT_INVENTORY_REFRESH_PERIOD: u64 = 10;

/// Landmarks within this range can be interacted with, in meters.
pub const LANDMARK_INTERACT_RANGE_M: f64 = 40.0;

/// Cap on chained landmarks in visit-all mode.
pub const VISIT_ALL_MAX_LANDMARKS: usize = 20;
