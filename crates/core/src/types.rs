/// Jobs are numbered per supervisor instance, starting at 1.
pub type JobId = u64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
