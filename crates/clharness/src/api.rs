//! The compute-runtime surface the harness relies on.
//!
//! [`ComputeApi`] lists exactly the OpenCL operations the setup procedure and
//! the demo pipeline issue. Abstracted so both can run without GPU hardware;
//! the production implementation is [`crate::opencl::OpenClApi`].

use std::fmt;
use std::str::FromStr;

use crate::error::StatusCode;

/// Device class requested during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceType {
    #[default]
    Gpu,
    Cpu,
    Accelerator,
    Default,
    All,
}

impl DeviceType {
    pub const VARIANTS: &'static [DeviceType] =
        &[Self::Gpu, Self::Cpu, Self::Accelerator, Self::Default, Self::All];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gpu => "gpu",
            Self::Cpu => "cpu",
            Self::Accelerator => "accelerator",
            Self::Default => "default",
            Self::All => "all",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::VARIANTS.iter().copied().find(|t| t.as_str() == wanted).ok_or_else(|| {
            let valid: Vec<&str> = Self::VARIANTS.iter().map(|t| t.as_str()).collect();
            format!("unknown device type '{s}' (expected one of: {})", valid.join(", "))
        })
    }
}

/// How a kernel may access a device buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// OpenCL operations used by the harness.
///
/// Every fallible call returns the raw runtime status on failure; callers
/// route it through [`crate::gate::check`]. Handles are owned values and are
/// given back through the matching `release_*` call exactly once.
pub trait ComputeApi {
    type Platform;
    type Device;
    type Context;
    type Program;
    type Kernel;
    type Queue;
    type Buffer;

    /// All platforms visible to the runtime, in enumeration order.
    fn platforms(&self) -> Result<Vec<Self::Platform>, StatusCode>;

    /// The first device of `device_type` on `platform`.
    fn device(&self, platform: &Self::Platform, device_type: DeviceType) -> Result<Self::Device, StatusCode>;

    fn create_context(&self, device: &Self::Device) -> Result<Self::Context, StatusCode>;

    fn create_program(&self, context: &Self::Context, source: &str) -> Result<Self::Program, StatusCode>;

    /// Compile and link `program` for `device`.
    fn build_program(&self, program: &mut Self::Program, device: &Self::Device) -> Result<(), StatusCode>;

    /// Compiler output for the last build of `program` on `device`.
    fn build_log(&self, program: &Self::Program, device: &Self::Device) -> Result<String, StatusCode>;

    fn create_kernel(&self, program: &Self::Program, name: &str) -> Result<Self::Kernel, StatusCode>;

    fn create_queue(&self, context: &Self::Context, device: &Self::Device) -> Result<Self::Queue, StatusCode>;

    /// A device buffer initialised with a copy of `host`.
    fn create_buffer(
        &self,
        context: &Self::Context,
        access: BufferAccess,
        host: &[f32],
    ) -> Result<Self::Buffer, StatusCode>;

    fn set_kernel_arg(&self, kernel: &Self::Kernel, index: u32, buffer: &Self::Buffer) -> Result<(), StatusCode>;

    /// One-dimensional dispatch of `global_work_size` work units.
    fn enqueue_kernel(
        &self,
        queue: &Self::Queue,
        kernel: &Self::Kernel,
        global_work_size: usize,
    ) -> Result<(), StatusCode>;

    /// Blocking read of `buffer` into `out`.
    fn read_buffer(&self, queue: &Self::Queue, buffer: &Self::Buffer, out: &mut [f32]) -> Result<(), StatusCode>;

    fn release_buffer(&self, buffer: Self::Buffer) -> Result<(), StatusCode>;
    fn release_kernel(&self, kernel: Self::Kernel) -> Result<(), StatusCode>;
    fn release_queue(&self, queue: Self::Queue) -> Result<(), StatusCode>;
    fn release_program(&self, program: Self::Program) -> Result<(), StatusCode>;
    fn release_context(&self, context: Self::Context) -> Result<(), StatusCode>;

    /// Identifier used in diagnostics for `platform`.
    fn describe_platform(&self, platform: &Self::Platform) -> String;

    /// Identifier used in diagnostics for `device`.
    fn describe_device(&self, device: &Self::Device) -> String;
}
