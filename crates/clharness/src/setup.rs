//! Platform/device/context acquisition.

use tracing::{debug, info};

use crate::api::{ComputeApi, DeviceType};
use crate::error::{HarnessError, Result};
use crate::gate::check;
use crate::resource::{ResourceKind, Scoped};

/// The platform, device and context a compute session runs on.
///
/// Only [`ClSetup::create`] builds one, so a handle is always fully
/// populated. The handle owns the context; the platform and device are
/// plain identifiers.
pub struct ClSetup<'a, A: ComputeApi + ?Sized> {
    platform: A::Platform,
    device: A::Device,
    context: Scoped<'a, A, A::Context>,
}

impl<'a, A: ComputeApi + ?Sized> ClSetup<'a, A> {
    /// Pick the first platform and its first `device_type` device, then
    /// create a context bound to that one device.
    ///
    /// No fallback: zero platforms is [`HarnessError::NoPlatforms`] and no
    /// further API call is made; a platform without a matching device is an
    /// API error.
    pub fn create(api: &'a A, device_type: DeviceType) -> Result<Self> {
        let platforms = check(api.platforms(), "Error getting the platform id")?;
        debug!(count = platforms.len(), "enumerated platforms");

        let Some(platform) = platforms.into_iter().next() else {
            return Err(HarnessError::NoPlatforms);
        };
        let platform_label = api.describe_platform(&platform);

        let device = check(
            api.device(&platform, device_type),
            format!("Error getting the device id for platform {platform_label}"),
        )?;
        let device_label = api.describe_device(&device);
        debug!(platform = %platform_label, device = %device_label, %device_type, "selected device");

        let context = check(
            api.create_context(&device),
            format!("Error creating context for platform {platform_label} and device {device_label}"),
        )?;
        info!(platform = %platform_label, device = %device_label, "compute context ready");

        Ok(Self {
            platform,
            device,
            context: Scoped::new(api, ResourceKind::Context, context, A::release_context),
        })
    }

    pub fn platform(&self) -> &A::Platform {
        &self.platform
    }

    pub fn device(&self) -> &A::Device {
        &self.device
    }

    pub fn context(&self) -> &A::Context {
        self.context.get()
    }

    /// Release the context, then the handle itself.
    pub fn release(self) -> Result<()> {
        let Self { context, .. } = self;
        context.release()?;
        debug!("setup handle released");
        Ok(())
    }
}
