//! Operation logging macros
//!
//! Every timed operation emits a `start` event and exactly one of `end` or
//! `end_error`. The end events take the `Instant` captured before the work
//! and derive `duration_ms` from it. Extra fields are passed through to
//! `tracing` unchanged.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use tfmigrate_core::log_op_start;
/// log_op_start!("apply");
/// log_op_start!("apply", version = 4u64);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)+)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_START,
            $($($field)+)?
        )
    };
}

/// Log the successful end of an operation started at `$started`
///
/// # Example
///
/// ```
/// # use tfmigrate_core::log_op_end;
/// let started = std::time::Instant::now();
/// log_op_end!("apply", started, version = 4u64);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, $started:expr $(, $($field:tt)+)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_END,
            duration_ms = $crate::logging_facility::elapsed_ms($started),
            $($($field)+)?
        )
    };
}

/// Log the failed end of an operation started at `$started`
///
/// The error goes through `ExError`, so the event carries `err.kind` and a
/// stable `err.code` next to the rendered message.
///
/// # Example
///
/// ```
/// # use tfmigrate_core::{log_op_error, errors::MigrateError};
/// let started = std::time::Instant::now();
/// log_op_error!("apply", started, &MigrateError::LockNotFound);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $started:expr, $err:expr $(, $($field:tt)+)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::EVENT_END_ERROR,
            duration_ms = $crate::logging_facility::elapsed_ms($started),
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            error = %ex_err.message(),
            $($($field)+)?
        );
    }};
}
