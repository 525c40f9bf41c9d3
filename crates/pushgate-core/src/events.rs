//! Application-level log events shared by every front end.

use tracing::{error, info};

use crate::errors::PushgateError;

pub fn log_app_startup() {
    info!(
        event = "core.app.startup_completed",
        version = env!("CARGO_PKG_VERSION")
    );
}

pub fn log_app_error<E: PushgateError>(error: &E) {
    error!(
        event = "core.app.error_occurred",
        error_code = error.error_code(),
        fatal = error.is_fatal(),
        error = %error
    );
}
