//! `clharness`: OpenCL context setup and a vector-multiply demo pipeline.
//!
//! The crate wraps the handful of steps every small OpenCL program repeats:
//!
//! | Step            | Module       | Entry point                      |
//! |-----------------|--------------|----------------------------------|
//! | Context setup   | [`setup`]    | [`ClSetup::create`]              |
//! | Kernel source   | [`source`]   | [`KernelSource::load`]           |
//! | Failure checks  | [`gate`]     | [`check`], [`check_with`]        |
//! | Demo pipeline   | [`vecmult`]  | [`vecmult::run`]                 |
//!
//! All device work goes through the [`ComputeApi`] trait. The real
//! implementation, [`OpenClApi`], is compiled with the `opencl-runtime`
//! feature; without it the pipeline can still be driven by any other
//! `ComputeApi` (the integration tests use a call-recording fake).
//!
//! # Usage
//!
//! ```rust,no_run
//! # #[cfg(feature = "opencl-runtime")]
//! # fn demo() -> clharness::Result<()> {
//! use clharness::{OpenClApi, vecmult::{self, VecMultConfig}};
//!
//! let results = vecmult::run(&OpenClApi, &VecMultConfig::default())?;
//! vecmult::write_results(&mut std::io::stdout(), &results).ok();
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod error;
pub mod gate;
pub mod resource;
pub mod setup;
pub mod source;
pub mod vecmult;

#[cfg(feature = "opencl-runtime")]
pub mod opencl;

pub use api::{BufferAccess, ComputeApi, DeviceType};
pub use error::{HarnessError, Result, StatusCode};
pub use gate::{check, check_with, report};
pub use resource::{ResourceKind, Scoped};
pub use setup::ClSetup;
pub use source::KernelSource;

#[cfg(feature = "opencl-runtime")]
pub use opencl::OpenClApi;
