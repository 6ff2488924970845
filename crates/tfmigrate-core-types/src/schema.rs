//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names stable across the runner, the lock
//! protocol and the remote store client.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Migration context
pub const FIELD_MODE: &str = "mode";
pub const FIELD_STAGE: &str = "stage";
pub const FIELD_VERSION: &str = "version";
pub const FIELD_MIGRATION_PATH: &str = "migration_path";

// Lock context
pub const FIELD_LOCK_KEY: &str = "lock_key";

// Remote store context
pub const FIELD_STORE_KEY: &str = "store_key";
pub const FIELD_HTTP_STATUS: &str = "http_status";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
