//! Element-wise vector multiply on a compute device.
//!
//! The pipeline is strictly linear:
//!
//! 1. **Setup**: platform, device and context via [`ClSetup::create`]
//! 2. **Compile**: load the kernel file, create and build the program, create the kernel
//! 3. **Dispatch**: copy the inputs to device buffers, run one work unit per element
//! 4. **Read back**: blocking read of the result buffer
//! 5. **Teardown**: buffers, kernel, queue, program, context, setup handle
//!
//! Any failure returns early; guards release whatever was already acquired.

use std::io::{self, Write};
use std::path::PathBuf;

use tracing::{debug, info};

use crate::api::{BufferAccess, ComputeApi, DeviceType};
use crate::error::Result;
use crate::gate::{check, check_with};
use crate::resource::{ResourceKind, Scoped};
use crate::setup::ClSetup;
use crate::source::KernelSource;

/// Conventional kernel file name, resolved against the working directory.
pub const VECMULT_FILE: &str = "vecmult.cl";

/// Kernel entry point inside [`VECMULT_FILE`].
pub const VECMULT_KERNEL: &str = "vecmult";

/// Elements per vector, and work units per dispatch.
pub const VECTOR_LEN: usize = 4;

/// What to run and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VecMultConfig {
    pub device_type: DeviceType,
    pub kernel_path: PathBuf,
    pub kernel_name: String,
}

impl Default for VecMultConfig {
    fn default() -> Self {
        Self {
            device_type: DeviceType::Gpu,
            kernel_path: PathBuf::from(VECMULT_FILE),
            kernel_name: VECMULT_KERNEL.to_string(),
        }
    }
}

/// `vec1[i] = i`, `vec2[i] = 3 * i`.
pub fn synthetic_inputs() -> ([f32; VECTOR_LEN], [f32; VECTOR_LEN]) {
    let mut vec1 = [0.0f32; VECTOR_LEN];
    let mut vec2 = [0.0f32; VECTOR_LEN];
    for (i, (a, b)) in vec1.iter_mut().zip(vec2.iter_mut()).enumerate() {
        *a = i as f32;
        *b = 3.0 * i as f32;
    }
    (vec1, vec2)
}

/// Host-side product the device result should match.
pub fn reference(a: &[f32; VECTOR_LEN], b: &[f32; VECTOR_LEN]) -> [f32; VECTOR_LEN] {
    let mut out = [0.0f32; VECTOR_LEN];
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = x * y;
    }
    out
}

/// Run the whole pipeline and return the device's result vector.
pub fn run<A: ComputeApi + ?Sized>(api: &A, config: &VecMultConfig) -> Result<[f32; VECTOR_LEN]> {
    let setup = ClSetup::create(api, config.device_type)?;

    let source = KernelSource::load(&config.kernel_path)?;
    let mut program = Scoped::new(
        api,
        ResourceKind::Program,
        check(api.create_program(setup.context(), source.as_str()), "Error creating the program")?,
        A::release_program,
    );
    drop(source);

    check_with(
        api.build_program(program.get_mut(), setup.device()),
        "Error building the program",
        || api.build_log(program.get(), setup.device()).ok(),
    )?;
    debug!(kernel = %config.kernel_name, "program built");

    let kernel = Scoped::new(
        api,
        ResourceKind::Kernel,
        check(api.create_kernel(program.get(), &config.kernel_name), "Error creating the kernel")?,
        A::release_kernel,
    );
    let queue = Scoped::new(
        api,
        ResourceKind::Queue,
        check(api.create_queue(setup.context(), setup.device()), "Error creating the queue")?,
        A::release_queue,
    );

    let (vec1, vec2) = synthetic_inputs();
    let mut result = [0.0f32; VECTOR_LEN];

    let buffers = [
        (BufferAccess::ReadOnly, &vec1),
        (BufferAccess::ReadOnly, &vec2),
        (BufferAccess::ReadWrite, &result),
    ]
    .into_iter()
    .map(|(access, host)| {
        check(api.create_buffer(setup.context(), access, host), "Error creating the device buffer")
            .map(|buffer| Scoped::new(api, ResourceKind::Buffer, buffer, A::release_buffer))
    })
    .collect::<Result<Vec<_>>>()?;

    for (index, buffer) in (0u32..).zip(&buffers) {
        check(api.set_kernel_arg(kernel.get(), index, buffer.get()), "Error setting the kernel argument")?;
    }

    check(api.enqueue_kernel(queue.get(), kernel.get(), VECTOR_LEN), "Error enqueuing the kernel")?;
    check(api.read_buffer(queue.get(), buffers[2].get(), &mut result), "Error reading the device buffer")?;
    info!(?result, "vecmult complete");

    for buffer in buffers {
        buffer.release()?;
    }
    kernel.release()?;
    queue.release()?;
    program.release()?;
    setup.release()?;

    Ok(result)
}

/// One line per element, two decimal places.
pub fn write_results<W: Write>(out: &mut W, results: &[f32]) -> io::Result<()> {
    for value in results {
        writeln!(out, "{value:.2}")?;
    }
    out.flush()
}
