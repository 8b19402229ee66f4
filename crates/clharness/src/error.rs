//! Error types, raw OpenCL status codes and process exit codes.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Raw status returned by the compute runtime (`cl_int`).
pub type StatusCode = i32;

/// OpenCL status codes the harness inspects or produces itself (subset).
pub mod status {
    use super::StatusCode;

    pub const CL_SUCCESS: StatusCode = 0;
    pub const CL_DEVICE_NOT_FOUND: StatusCode = -1;
    pub const CL_OUT_OF_RESOURCES: StatusCode = -5;
    pub const CL_BUILD_PROGRAM_FAILURE: StatusCode = -11;
    pub const CL_INVALID_VALUE: StatusCode = -30;
    pub const CL_INVALID_KERNEL_NAME: StatusCode = -46;
    pub const CL_PLATFORM_NOT_FOUND_KHR: StatusCode = -1001;
}

// Exit codes for the demo binary.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Every way the harness can fail.
///
/// There is no recoverable subset: callers propagate these to the top level,
/// which reports them through [`crate::gate::report`] and exits.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("no platforms detected")]
    NoPlatforms,

    #[error("{message}: {code}")]
    Api { message: String, code: StatusCode },

    /// A failed program build, with the compiler's log for the device.
    #[error("{message}: {code}")]
    Build {
        message: String,
        code: StatusCode,
        log: String,
    },

    #[error("kernel source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("kernel source unreadable: {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("kernel source {} contains a nul byte at offset {offset}", path.display())]
    SourceInteriorNul { path: PathBuf, offset: usize },

    #[error("OpenCL runtime support not compiled in (rebuild with the `opencl-runtime` feature)")]
    RuntimeUnavailable,
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, HarnessError>;

impl HarnessError {
    pub fn api(message: impl Into<String>, code: StatusCode) -> Self {
        Self::Api { message: message.into(), code }
    }

    /// Raw runtime status, for failures that came from the compute API.
    pub fn code(&self) -> Option<StatusCode> {
        match self {
            Self::Api { code, .. } | Self::Build { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Compiler output attached to a build failure.
    pub fn build_log(&self) -> Option<&str> {
        match self {
            Self::Build { log, .. } => Some(log),
            _ => None,
        }
    }

    /// Process status the binary exits with. Every failure is fatal.
    pub fn exit_code(&self) -> i32 {
        EXIT_FAILURE
    }
}
