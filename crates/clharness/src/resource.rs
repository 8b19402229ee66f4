//! Scoped ownership of compute-API handles.

use std::fmt;

use tracing::{debug, warn};

use crate::api::ComputeApi;
use crate::error::{Result, StatusCode};
use crate::gate::check;

/// The kinds of handle the pipeline owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Buffer,
    Kernel,
    Queue,
    Program,
    Context,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buffer => "buffer",
            Self::Kernel => "kernel",
            Self::Queue => "queue",
            Self::Program => "program",
            Self::Context => "context",
        }
    }

    /// Gate message for a failed release of this kind.
    pub fn release_message(self) -> &'static str {
        match self {
            Self::Buffer => "Error releasing the memory",
            Self::Kernel => "Error releasing the kernel",
            Self::Queue => "Error releasing the queue",
            Self::Program => "Error releasing the program",
            Self::Context => "Error releasing the context",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An owned handle that is handed back to the API exactly once.
///
/// [`Scoped::release`] gives the handle back and surfaces the runtime status;
/// dropping an unreleased guard releases it too and only logs a failure, so
/// an early `?` return never leaks what was already acquired.
pub struct Scoped<'a, A: ComputeApi + ?Sized, H> {
    api: &'a A,
    kind: ResourceKind,
    handle: Option<H>,
    release: fn(&A, H) -> std::result::Result<(), StatusCode>,
}

impl<'a, A: ComputeApi + ?Sized, H> Scoped<'a, A, H> {
    pub fn new(
        api: &'a A,
        kind: ResourceKind,
        handle: H,
        release: fn(&A, H) -> std::result::Result<(), StatusCode>,
    ) -> Self {
        Self { api, kind, handle: Some(handle), release }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn get(&self) -> &H {
        match &self.handle {
            Some(handle) => handle,
            None => unreachable!("{} handle used after release", self.kind),
        }
    }

    pub fn get_mut(&mut self) -> &mut H {
        match &mut self.handle {
            Some(handle) => handle,
            None => unreachable!("{} handle used after release", self.kind),
        }
    }

    /// Give the handle back to the API, checking the runtime status.
    pub fn release(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => {
                debug!(kind = %self.kind, "releasing");
                check((self.release)(self.api, handle), self.kind.release_message())
            }
            None => Ok(()),
        }
    }
}

impl<A: ComputeApi + ?Sized, H> Drop for Scoped<'_, A, H> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(kind = %self.kind, "releasing on drop");
            if let Err(code) = (self.release)(self.api, handle) {
                warn!(kind = %self.kind, code, "{}", self.kind.release_message());
            }
        }
    }
}

impl<A: ComputeApi + ?Sized, H: fmt::Debug> fmt::Debug for Scoped<'_, A, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scoped").field("kind", &self.kind).field("handle", &self.handle).finish()
    }
}
