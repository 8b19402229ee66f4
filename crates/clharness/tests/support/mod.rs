//! Call-recording fake of the compute runtime.
//!
//! Every `ComputeApi` call is appended to a log so tests can assert the
//! exact sequence the harness issues. Dispatching the `vecmult` kernel
//! multiplies argument buffers 0 and 1 into buffer 2, like the real kernel.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use clharness::error::{StatusCode, status};
use clharness::{BufferAccess, ComputeApi, DeviceType};

/// One recorded API call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Platforms,
    Device(DeviceType),
    CreateContext,
    CreateProgram,
    BuildProgram,
    BuildLog,
    CreateKernel(String),
    CreateQueue,
    CreateBuffer(u32, BufferAccess),
    SetKernelArg(u32, u32),
    EnqueueKernel(usize),
    ReadBuffer(u32),
    ReleaseBuffer(u32),
    ReleaseKernel,
    ReleaseQueue,
    ReleaseProgram,
    ReleaseContext,
}

impl Call {
    pub fn is_release(&self) -> bool {
        matches!(
            self,
            Call::ReleaseBuffer(_)
                | Call::ReleaseKernel
                | Call::ReleaseQueue
                | Call::ReleaseProgram
                | Call::ReleaseContext
        )
    }
}

/// Which call should fail, and with what status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Platforms(StatusCode),
    Device(StatusCode),
    CreateContext(StatusCode),
    CreateProgram(StatusCode),
    CreateKernel(StatusCode),
    CreateQueue(StatusCode),
    /// Fail the nth buffer creation (0-based).
    CreateBuffer(usize, StatusCode),
    EnqueueKernel(StatusCode),
    ReadBuffer(StatusCode),
    ReleaseKernel(StatusCode),
}

pub struct RecordingApi {
    pub platform_count: usize,
    pub failure: Option<Failure>,
    /// Build log returned for sources that do not define the requested entry point.
    pub build_log: String,
    calls: RefCell<Vec<Call>>,
    buffers: RefCell<HashMap<u32, Vec<f32>>>,
    args: RefCell<HashMap<u32, u32>>,
    next_buffer: RefCell<u32>,
    built_source: RefCell<String>,
}

impl Default for RecordingApi {
    fn default() -> Self {
        Self {
            platform_count: 1,
            failure: None,
            build_log: "<kernel>:1:1: error: expected identifier or '('".to_string(),
            calls: RefCell::default(),
            buffers: RefCell::default(),
            args: RefCell::default(),
            next_buffer: RefCell::new(0),
            built_source: RefCell::default(),
        }
    }
}

impl RecordingApi {
    pub fn with_platforms(platform_count: usize) -> Self {
        Self { platform_count, ..Self::default() }
    }

    pub fn failing(failure: Failure) -> Self {
        Self { failure: Some(failure), ..Self::default() }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn releases(&self) -> Vec<Call> {
        self.calls.borrow().iter().filter(|c| c.is_release()).cloned().collect()
    }

    /// Buffers created and not yet released.
    pub fn live_buffers(&self) -> usize {
        self.buffers.borrow().len()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn fail_if(&self, matches: impl Fn(Failure) -> Option<StatusCode>) -> Result<(), StatusCode> {
        match self.failure.and_then(matches) {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }
}

/// Handles in the fake are plain integers.
impl ComputeApi for RecordingApi {
    type Platform = u32;
    type Device = u32;
    type Context = u32;
    type Program = u32;
    type Kernel = u32;
    type Queue = u32;
    type Buffer = u32;

    fn platforms(&self) -> Result<Vec<u32>, StatusCode> {
        self.record(Call::Platforms);
        self.fail_if(|f| match f {
            Failure::Platforms(c) => Some(c),
            _ => None,
        })?;
        Ok((0..self.platform_count as u32).collect())
    }

    fn device(&self, platform: &u32, device_type: DeviceType) -> Result<u32, StatusCode> {
        self.record(Call::Device(device_type));
        self.fail_if(|f| match f {
            Failure::Device(c) => Some(c),
            _ => None,
        })?;
        Ok(100 + platform)
    }

    fn create_context(&self, device: &u32) -> Result<u32, StatusCode> {
        self.record(Call::CreateContext);
        self.fail_if(|f| match f {
            Failure::CreateContext(c) => Some(c),
            _ => None,
        })?;
        Ok(1000 + device)
    }

    fn create_program(&self, _context: &u32, source: &str) -> Result<u32, StatusCode> {
        self.record(Call::CreateProgram);
        self.fail_if(|f| match f {
            Failure::CreateProgram(c) => Some(c),
            _ => None,
        })?;
        *self.built_source.borrow_mut() = source.to_string();
        Ok(1)
    }

    fn build_program(&self, _program: &mut u32, _device: &u32) -> Result<(), StatusCode> {
        self.record(Call::BuildProgram);
        if self.built_source.borrow().contains("__kernel") {
            Ok(())
        } else {
            Err(status::CL_BUILD_PROGRAM_FAILURE)
        }
    }

    fn build_log(&self, _program: &u32, _device: &u32) -> Result<String, StatusCode> {
        self.record(Call::BuildLog);
        Ok(self.build_log.clone())
    }

    fn create_kernel(&self, _program: &u32, name: &str) -> Result<u32, StatusCode> {
        self.record(Call::CreateKernel(name.to_string()));
        self.fail_if(|f| match f {
            Failure::CreateKernel(c) => Some(c),
            _ => None,
        })?;
        if self.built_source.borrow().contains(&format!("void {name}(")) {
            Ok(2)
        } else {
            Err(status::CL_INVALID_KERNEL_NAME)
        }
    }

    fn create_queue(&self, _context: &u32, _device: &u32) -> Result<u32, StatusCode> {
        self.record(Call::CreateQueue);
        self.fail_if(|f| match f {
            Failure::CreateQueue(c) => Some(c),
            _ => None,
        })?;
        Ok(3)
    }

    fn create_buffer(&self, _context: &u32, access: BufferAccess, host: &[f32]) -> Result<u32, StatusCode> {
        let id = {
            let mut next = self.next_buffer.borrow_mut();
            let id = *next;
            *next += 1;
            id
        };
        self.record(Call::CreateBuffer(id, access));
        self.fail_if(|f| match f {
            Failure::CreateBuffer(n, c) if n == id as usize => Some(c),
            _ => None,
        })?;
        self.buffers.borrow_mut().insert(id, host.to_vec());
        Ok(id)
    }

    fn set_kernel_arg(&self, _kernel: &u32, index: u32, buffer: &u32) -> Result<(), StatusCode> {
        self.record(Call::SetKernelArg(index, *buffer));
        if !self.buffers.borrow().contains_key(buffer) {
            return Err(status::CL_INVALID_VALUE);
        }
        self.args.borrow_mut().insert(index, *buffer);
        Ok(())
    }

    fn enqueue_kernel(&self, _queue: &u32, _kernel: &u32, global_work_size: usize) -> Result<(), StatusCode> {
        self.record(Call::EnqueueKernel(global_work_size));
        self.fail_if(|f| match f {
            Failure::EnqueueKernel(c) => Some(c),
            _ => None,
        })?;
        let args = self.args.borrow();
        let (Some(a), Some(b), Some(out)) = (args.get(&0), args.get(&1), args.get(&2)) else {
            return Err(status::CL_INVALID_VALUE);
        };
        let mut buffers = self.buffers.borrow_mut();
        let product: Vec<f32> = buffers[a].iter().zip(&buffers[b]).map(|(x, y)| x * y).collect();
        let target = buffers.get_mut(out).ok_or(status::CL_INVALID_VALUE)?;
        for (slot, value) in target.iter_mut().zip(product).take(global_work_size) {
            *slot = value;
        }
        Ok(())
    }

    fn read_buffer(&self, _queue: &u32, buffer: &u32, out: &mut [f32]) -> Result<(), StatusCode> {
        self.record(Call::ReadBuffer(*buffer));
        self.fail_if(|f| match f {
            Failure::ReadBuffer(c) => Some(c),
            _ => None,
        })?;
        let buffers = self.buffers.borrow();
        let data = buffers.get(buffer).ok_or(status::CL_INVALID_VALUE)?;
        out.copy_from_slice(&data[..out.len()]);
        Ok(())
    }

    fn release_buffer(&self, buffer: u32) -> Result<(), StatusCode> {
        self.record(Call::ReleaseBuffer(buffer));
        self.buffers.borrow_mut().remove(&buffer);
        Ok(())
    }

    fn release_kernel(&self, _kernel: u32) -> Result<(), StatusCode> {
        self.record(Call::ReleaseKernel);
        self.fail_if(|f| match f {
            Failure::ReleaseKernel(c) => Some(c),
            _ => None,
        })
    }

    fn release_queue(&self, _queue: u32) -> Result<(), StatusCode> {
        self.record(Call::ReleaseQueue);
        Ok(())
    }

    fn release_program(&self, _program: u32) -> Result<(), StatusCode> {
        self.record(Call::ReleaseProgram);
        Ok(())
    }

    fn release_context(&self, _context: u32) -> Result<(), StatusCode> {
        self.record(Call::ReleaseContext);
        Ok(())
    }

    fn describe_platform(&self, platform: &u32) -> String {
        platform.to_string()
    }

    fn describe_device(&self, device: &u32) -> String {
        device.to_string()
    }
}

pub const VECMULT_CL: &str = "__kernel void vecmult(__global const float* a,\n\
                              __global const float* b,\n\
                              __global float* c)\n\
{\n\
    int i = get_global_id(0);\n\
    c[i] = a[i] * b[i];\n\
}\n";
