//! Compiled defaults. Single source of truth for every config value.

// Storage
pub const DEFAULT_DB_PATH: &str = "sift.db";
pub const DEFAULT_READ_POOL_SIZE: usize = 4;

// Extractor
pub const DEFAULT_STRIP_ANSI: bool = true;
pub const DEFAULT_MAX_PENDING_LINES: usize = 256;
pub const DEFAULT_EVENT_HISTORY: usize = 500;
pub const DEFAULT_DECISION_HISTORY: usize = 200;
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

// Auto-confirm
pub const DEFAULT_AUTO_CONFIRM_THRESHOLD: f64 = 0.9;

// Learning
pub const DEFAULT_ENABLE_TRAINING: bool = false;
pub const DEFAULT_LEARNING_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_LEARNING_BATCH_LIMIT: usize = 100;
pub const DEFAULT_MIN_GROUP_SIZE: usize = 3;
pub const DEFAULT_MIN_LITERAL_RATIO: f64 = 0.3;
pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 3;

// Server
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8151";
pub const DEFAULT_EVENTS_LIMIT: usize = 50;

// Observability
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
