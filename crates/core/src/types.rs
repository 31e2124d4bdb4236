/// Product primary keys are UUIDs generated by the writer (v7, time-ordered).
pub type DbId = uuid::Uuid;

/// Product image primary keys are PostgreSQL BIGSERIAL.
pub type ImageId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
