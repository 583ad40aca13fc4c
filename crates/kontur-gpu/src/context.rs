use std::sync::Arc;

use kontur_core::{KonturError, KonturResult};

/// Shared GPU context: instance, adapter, and the device/queue pair.
///
/// Construction is the only fallible GPU entry point that callers are
/// expected to recover from. When no adapter or device is available the
/// init fails with [`KonturError::DeviceUnavailable`] and the caller
/// falls back to the CPU pipeline.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

impl GpuContext {
    /// Initialize a GPU context. Fails if no adapter or device is found.
    pub fn init() -> KonturResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| KonturError::DeviceUnavailable("no suitable GPU adapter found".into()))?;

        let info = adapter.get_info();
        tracing::info!("GPU adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("kontur_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        ))
        .map_err(|e| KonturError::DeviceUnavailable(format!("device request failed: {e}")))?;

        Ok(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }
}
