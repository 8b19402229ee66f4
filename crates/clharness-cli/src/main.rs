//! `vecmult`: multiply two small vectors on an OpenCL device.
//!
//! Sets up the first platform's first device of the requested type, builds
//! `vecmult.cl`, runs the `vecmult` kernel over four elements and prints one
//! result per line. Any failure prints a diagnostic to stdout and exits with
//! status 1.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: GPU device, ./vecmult.cl, entry point `vecmult`
//! vecmult
//!
//! # Another kernel file on a CPU device, with debug logging on stderr
//! vecmult --kernel-file crates/clharness-cli/kernels/vecmult.cl --device-type cpu --log-level debug
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use clharness::error::{EXIT_FAILURE, EXIT_SUCCESS};
use clharness::vecmult::{self, VECMULT_FILE, VECMULT_KERNEL, VecMultConfig};
use clharness::{DeviceType, HarnessError, report};
use tracing::{debug, info, warn};

/// Element-wise vector multiply on an OpenCL device
#[derive(Parser, Debug)]
#[command(name = "vecmult")]
#[command(about = "Multiply two 4-element vectors on an OpenCL device")]
#[command(version)]
struct Args {
    /// OpenCL C source file containing the kernel
    #[arg(long, value_name = "PATH", default_value = VECMULT_FILE)]
    kernel_file: PathBuf,

    /// Kernel entry point to run
    #[arg(long, value_name = "NAME", default_value = VECMULT_KERNEL)]
    kernel_name: String,

    /// Device class to request (gpu, cpu, accelerator, default, all)
    #[arg(long, value_name = "TYPE", default_value_t = DeviceType::Gpu)]
    device_type: DeviceType,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

impl Args {
    fn config(&self) -> VecMultConfig {
        VecMultConfig {
            device_type: self.device_type,
            kernel_path: self.kernel_file.clone(),
            kernel_name: self.kernel_name.clone(),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = setup_logging(&args.log_level) {
        eprintln!("{e:#}");
        return exit(EXIT_FAILURE);
    }

    match run(&args) {
        Ok(()) => exit(EXIT_SUCCESS),
        Err(e) => {
            debug!("vecmult failed: {e:#}");
            let mut stdout = io::stdout().lock();
            match e.downcast_ref::<HarnessError>() {
                Some(err) => exit(report(err, &mut stdout)),
                None => {
                    let _ = writeln!(stdout, "{e:#}");
                    exit(EXIT_FAILURE)
                }
            }
        }
    }
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

/// Logs go to stderr; stdout carries only results and diagnostics.
fn setup_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level '{level}'"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let config = args.config();
    info!(
        kernel_file = %config.kernel_path.display(),
        kernel_name = %config.kernel_name,
        device_type = %config.device_type,
        "starting vecmult"
    );

    let results = compute(&config)?;

    let (vec1, vec2) = vecmult::synthetic_inputs();
    let expected = vecmult::reference(&vec1, &vec2);
    if results != expected {
        warn!(?results, ?expected, "device result differs from host reference");
    }

    vecmult::write_results(&mut io::stdout().lock(), &results).context("Failed to write results")?;
    Ok(())
}

#[cfg(feature = "opencl-runtime")]
fn compute(config: &VecMultConfig) -> Result<[f32; vecmult::VECTOR_LEN]> {
    Ok(vecmult::run(&clharness::OpenClApi, config)?)
}

#[cfg(not(feature = "opencl-runtime"))]
fn compute(_config: &VecMultConfig) -> Result<[f32; vecmult::VECTOR_LEN]> {
    Err(HarnessError::RuntimeUnavailable.into())
}
