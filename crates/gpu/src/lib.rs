//! wgpu compute implementation of the 2D SPH tick.
//!
//! One tick is two compute passes over a 2D lane grid (8x8 workgroups):
//! `compute_density` in place in the current particle buffer, then
//! `step_particles` from the current buffer into the other one. The pass
//! boundary is the barrier between the phases. The CPU solver in `sph2d` is
//! the numerical reference.

pub mod distance_field;
pub mod params;
pub mod readback;
pub mod sph_2d;

pub use distance_field::GpuDistanceField;
pub use params::{GpuSimParams, SphConstants};
pub use readback::ParticleReadback;
pub use sph_2d::GpuSph2D;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sph2d::SimError;

/// Global flag indicating GPU device was lost
static GPU_DEVICE_LOST: AtomicBool = AtomicBool::new(false);

/// Check if the GPU device has been lost
pub fn is_device_lost() -> bool {
    GPU_DEVICE_LOST.load(Ordering::SeqCst)
}

/// Reset the device lost flag (call after recreating device)
pub fn reset_device_lost() {
    GPU_DEVICE_LOST.store(false, Ordering::SeqCst);
}

/// GPU error type for setup and buffer operations
#[derive(Debug)]
pub enum GpuError {
    AdapterNotFound,
    RequestDevice(wgpu::RequestDeviceError),
    /// wgpu cannot bind zero-sized storage buffers.
    EmptyParticleSet,
    /// Workgroup grid exceeds `max_compute_workgroups_per_dimension`.
    DispatchTooLarge { columns: u32, rows: u32, limit: u32 },
    InvalidImageSize { width: u32, height: u32 },
    DeviceLost,
    BufferMapFailed(wgpu::BufferAsyncError),
    ChannelDisconnected,
    Sim(SimError),
}

impl std::fmt::Display for GpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuError::AdapterNotFound => write!(f, "No GPU adapter found"),
            GpuError::RequestDevice(e) => write!(f, "Device request failed: {}", e),
            GpuError::EmptyParticleSet => write!(f, "Particle set is empty"),
            GpuError::DispatchTooLarge { columns, rows, limit } => write!(
                f,
                "Dispatch of {}x{} lanes exceeds {} workgroups per dimension",
                columns, rows, limit
            ),
            GpuError::InvalidImageSize { width, height } => {
                write!(f, "Invalid image size {}x{}", width, height)
            }
            GpuError::DeviceLost => write!(f, "GPU device lost"),
            GpuError::BufferMapFailed(e) => write!(f, "Buffer map failed: {:?}", e),
            GpuError::ChannelDisconnected => write!(f, "Channel disconnected"),
            GpuError::Sim(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::RequestDevice(e) => Some(e),
            GpuError::Sim(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SimError> for GpuError {
    fn from(e: SimError) -> Self {
        GpuError::Sim(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::RequestDevice(e)
    }
}

/// Wait for a buffer map operation to complete, returning Result instead of panicking.
pub fn await_buffer_map(
    rx: std::sync::mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>,
) -> Result<(), GpuError> {
    if is_device_lost() {
        return Err(GpuError::DeviceLost);
    }
    match rx.recv() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            log::error!("Buffer map failed: {:?}", e);
            Err(GpuError::BufferMapFailed(e))
        }
        Err(_) => {
            log::error!("Buffer map channel disconnected - possible device lost");
            GPU_DEVICE_LOST.store(true, Ordering::SeqCst);
            Err(GpuError::ChannelDisconnected)
        }
    }
}

/// Device and queue for compute work without a surface.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    pub async fn new_headless() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::AdapterNotFound)?;

        let adapter_info = adapter.get_info();
        log::info!("Using GPU: {:?}", adapter_info);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("SPH 2D Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        device.on_uncaptured_error(Box::new(|error| {
            log::error!("GPU uncaptured error: {:?}", error);
            if matches!(error, wgpu::Error::OutOfMemory { .. }) {
                GPU_DEVICE_LOST.store(true, Ordering::SeqCst);
            }
        }));

        // Fresh device
        reset_device_lost();

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info,
        })
    }

    pub fn new_headless_blocking() -> Result<Self, GpuError> {
        pollster::block_on(Self::new_headless())
    }
}
