//! [`ComputeApi`] backed by the system OpenCL runtime through `opencl3`.
//!
//! Requires the `opencl-runtime` feature and a working OpenCL ICD loader.
//! `opencl3` wrappers release on drop and discard the status, so each
//! `release_*` hook takes an extra reference first, drops the wrapper, and
//! issues the last `clRelease*` itself through `cl3` to get a checked status.

use std::ptr;

use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::device::{
    CL_DEVICE_TYPE_ACCELERATOR, CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_CPU, CL_DEVICE_TYPE_DEFAULT,
    CL_DEVICE_TYPE_GPU, Device,
};
use opencl3::error_codes::ClError;
use opencl3::kernel::Kernel;
use opencl3::memory::{
    Buffer, CL_MEM_COPY_HOST_PTR, CL_MEM_READ_ONLY, CL_MEM_READ_WRITE, CL_MEM_WRITE_ONLY, ClMem,
};
use opencl3::platform::{Platform, get_platforms};
use opencl3::program::Program;
use opencl3::types::{CL_BLOCKING, cl_device_type, cl_float, cl_mem_flags};
use tracing::{debug, warn};

use crate::api::{BufferAccess, ComputeApi, DeviceType};
use crate::error::{StatusCode, status};

fn code(err: ClError) -> StatusCode {
    err.0
}

/// Platform enumeration result with the ICD loader's "no installed
/// platforms" error folded into an empty list.
fn platforms_from<P>(result: Result<Vec<P>, ClError>) -> Result<Vec<P>, StatusCode> {
    match result {
        Ok(platforms) => Ok(platforms),
        Err(err) if err.0 == status::CL_PLATFORM_NOT_FOUND_KHR => {
            debug!("ICD loader found no platforms");
            Ok(Vec::new())
        }
        Err(err) => Err(code(err)),
    }
}

/// Hand `wrapper` back with a checked final release of `raw`.
///
/// `retain` keeps the object alive through the wrapper's own unchecked
/// release; `release` then drops the count to where it was and reports the
/// runtime status. If `retain` fails the wrapper still releases on drop.
fn release_checked<H: Copy, W>(
    raw: H,
    wrapper: W,
    retain: impl FnOnce(H) -> Result<(), StatusCode>,
    release: impl FnOnce(H) -> Result<(), StatusCode>,
) -> Result<(), StatusCode> {
    retain(raw)?;
    drop(wrapper);
    release(raw)
}

fn device_type_bits(device_type: DeviceType) -> cl_device_type {
    match device_type {
        DeviceType::Gpu => CL_DEVICE_TYPE_GPU,
        DeviceType::Cpu => CL_DEVICE_TYPE_CPU,
        DeviceType::Accelerator => CL_DEVICE_TYPE_ACCELERATOR,
        DeviceType::Default => CL_DEVICE_TYPE_DEFAULT,
        DeviceType::All => CL_DEVICE_TYPE_ALL,
    }
}

fn access_flags(access: BufferAccess) -> cl_mem_flags {
    match access {
        BufferAccess::ReadOnly => CL_MEM_READ_ONLY,
        BufferAccess::WriteOnly => CL_MEM_WRITE_ONLY,
        BufferAccess::ReadWrite => CL_MEM_READ_WRITE,
    }
}

/// The system OpenCL runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenClApi;

impl ComputeApi for OpenClApi {
    type Platform = Platform;
    type Device = Device;
    type Context = Context;
    type Program = Program;
    type Kernel = Kernel;
    type Queue = CommandQueue;
    type Buffer = Buffer<cl_float>;

    fn platforms(&self) -> Result<Vec<Platform>, StatusCode> {
        platforms_from(get_platforms())
    }

    fn device(&self, platform: &Platform, device_type: DeviceType) -> Result<Device, StatusCode> {
        let ids = platform.get_devices(device_type_bits(device_type)).map_err(code)?;
        ids.first().copied().map(Device::new).ok_or(status::CL_DEVICE_NOT_FOUND)
    }

    fn create_context(&self, device: &Device) -> Result<Context, StatusCode> {
        Context::from_device(device).map_err(code)
    }

    fn create_program(&self, context: &Context, source: &str) -> Result<Program, StatusCode> {
        Program::create_from_source(context, source).map_err(code)
    }

    fn build_program(&self, program: &mut Program, device: &Device) -> Result<(), StatusCode> {
        program.build(&[device.id()], "").map_err(code)
    }

    fn build_log(&self, program: &Program, device: &Device) -> Result<String, StatusCode> {
        program.get_build_log(device.id()).map_err(code)
    }

    fn create_kernel(&self, program: &Program, name: &str) -> Result<Kernel, StatusCode> {
        Kernel::create(program, name).map_err(code)
    }

    fn create_queue(&self, context: &Context, _device: &Device) -> Result<CommandQueue, StatusCode> {
        // The context holds exactly the selected device, so it is the default.
        CommandQueue::create_default_with_properties(context, 0, 0).map_err(code)
    }

    fn create_buffer(
        &self,
        context: &Context,
        access: BufferAccess,
        host: &[f32],
    ) -> Result<Buffer<cl_float>, StatusCode> {
        // SAFETY: COPY_HOST_PTR copies `host` during the call and never
        // writes through the pointer.
        unsafe {
            Buffer::<cl_float>::create(
                context,
                access_flags(access) | CL_MEM_COPY_HOST_PTR,
                host.len(),
                host.as_ptr().cast_mut().cast(),
            )
        }
        .map_err(code)
    }

    fn set_kernel_arg(&self, kernel: &Kernel, index: u32, buffer: &Buffer<cl_float>) -> Result<(), StatusCode> {
        // SAFETY: the argument is a live cl_mem handle, matching the
        // `__global float*` parameters of the kernel.
        unsafe { kernel.set_arg(index, &buffer.get()) }.map_err(code)
    }

    fn enqueue_kernel(&self, queue: &CommandQueue, kernel: &Kernel, global_work_size: usize) -> Result<(), StatusCode> {
        let global = [global_work_size];
        // SAFETY: all kernel arguments are set and `global` outlives the call.
        let event = unsafe {
            queue.enqueue_nd_range_kernel(kernel.get(), 1, ptr::null(), global.as_ptr(), ptr::null(), &[])
        }
        .map_err(code)?;
        debug!(global_work_size, "kernel enqueued");
        drop(event);
        Ok(())
    }

    fn read_buffer(&self, queue: &CommandQueue, buffer: &Buffer<cl_float>, out: &mut [f32]) -> Result<(), StatusCode> {
        // SAFETY: blocking read, so `out` is fully written before returning.
        let event = unsafe { queue.enqueue_read_buffer(buffer, CL_BLOCKING, 0, out, &[]) }.map_err(code)?;
        if let Err(err) = event.wait() {
            warn!(code = err.0, "read event wait failed after blocking read");
            return Err(code(err));
        }
        Ok(())
    }

    // SAFETY (all release hooks): `raw` is the live handle owned by the
    // wrapper, and nothing uses it after the final release.
    fn release_buffer(&self, buffer: Buffer<cl_float>) -> Result<(), StatusCode> {
        release_checked(
            buffer.get(),
            buffer,
            |raw| unsafe { cl3::memory::retain_mem_object(raw) },
            |raw| unsafe { cl3::memory::release_mem_object(raw) },
        )
    }

    fn release_kernel(&self, kernel: Kernel) -> Result<(), StatusCode> {
        release_checked(
            kernel.get(),
            kernel,
            |raw| unsafe { cl3::kernel::retain_kernel(raw) },
            |raw| unsafe { cl3::kernel::release_kernel(raw) },
        )
    }

    fn release_queue(&self, queue: CommandQueue) -> Result<(), StatusCode> {
        release_checked(
            queue.get(),
            queue,
            |raw| unsafe { cl3::command_queue::retain_command_queue(raw) },
            |raw| unsafe { cl3::command_queue::release_command_queue(raw) },
        )
    }

    fn release_program(&self, program: Program) -> Result<(), StatusCode> {
        release_checked(
            program.get(),
            program,
            |raw| unsafe { cl3::program::retain_program(raw) },
            |raw| unsafe { cl3::program::release_program(raw) },
        )
    }

    fn release_context(&self, context: Context) -> Result<(), StatusCode> {
        release_checked(
            context.get(),
            context,
            |raw| unsafe { cl3::context::retain_context(raw) },
            |raw| unsafe { cl3::context::release_context(raw) },
        )
    }

    fn describe_platform(&self, platform: &Platform) -> String {
        format!("{:?}", platform.id())
    }

    fn describe_device(&self, device: &Device) -> String {
        format!("{:?}", device.id())
    }
}
