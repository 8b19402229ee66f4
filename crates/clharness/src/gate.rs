//! The error-check gate.
//!
//! Every fallible compute-API call passes through [`check`] (or
//! [`check_with`] when a diagnostic is worth collecting) immediately after it
//! returns. Failures become [`HarnessError`] values that travel up with `?`;
//! only the binary decides to exit, after handing the error to [`report`].

use std::io::{self, Write};

use tracing::debug;

use crate::error::{HarnessError, Result, StatusCode};

/// Turn a raw API result into a harness result, labelling failures with `message`.
pub fn check<T>(result: std::result::Result<T, StatusCode>, message: impl Into<String>) -> Result<T> {
    result.map_err(|code| HarnessError::api(message, code))
}

/// Like [`check`], but run `diagnostic` once on failure and attach its output.
///
/// The diagnostic is the hook for fetching a program's build log; when it
/// yields nothing the failure is reported as a plain API error.
pub fn check_with<T, F>(
    result: std::result::Result<T, StatusCode>,
    message: impl Into<String>,
    diagnostic: F,
) -> Result<T>
where
    F: FnOnce() -> Option<String>,
{
    match result {
        Ok(value) => Ok(value),
        Err(code) => {
            let message = message.into();
            match diagnostic() {
                Some(log) => {
                    debug!(code, log_len = log.len(), "collected diagnostic for failed call");
                    Err(HarnessError::Build { message, code, log })
                }
                None => Err(HarnessError::Api { message, code }),
            }
        }
    }
}

/// Write the user-facing diagnostic for `err` and return the exit status.
///
/// API failures print as `"<message>: <code>"`; build failures add the
/// compiler log on the following lines.
pub fn report<W: Write>(err: &HarnessError, out: &mut W) -> i32 {
    if let Err(io_err) = write_report(err, out) {
        debug!(error = %io_err, "failed to write error report");
    }
    err.exit_code()
}

fn write_report<W: Write>(err: &HarnessError, out: &mut W) -> io::Result<()> {
    writeln!(out, "{err}")?;
    if let Some(log) = err.build_log() {
        writeln!(out, "{log}")?;
    }
    out.flush()
}
