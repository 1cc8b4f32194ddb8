use crate::error::{Result, SentimentError};
use candle_core::Device;

/// Loads a device to be used for the model.
/// If `index` is `Some(i)` it will attempt to load the specified CUDA device.
/// When `None` it uses CUDA device 0 if one can be opened and otherwise falls
/// back to CPU, including on `cuda` builds running on a host without a GPU.
pub fn load_device_with(index: Option<usize>) -> Result<Device> {
    match index {
        Some(i) => Device::new_cuda(i).map_err(|e| SentimentError::Device(e.to_string())),
        None => Ok(Device::new_cuda(0).unwrap_or(Device::Cpu)),
    }
}

/// Request for a specific device, used by pipeline builders.
#[derive(Clone, Debug, Default)]
pub enum DeviceRequest {
    /// Use CUDA if available, otherwise CPU (default behavior).
    #[default]
    Default,
    /// Force CPU even if CUDA is available.
    Cpu,
    /// Select a specific CUDA device by index.
    Cuda(usize),
    /// Provide an already constructed device.
    Explicit(Device),
}

impl DeviceRequest {
    /// Resolve the request into an actual [`Device`].
    pub fn resolve(self) -> Result<Device> {
        match self {
            DeviceRequest::Default => load_device_with(None),
            DeviceRequest::Cpu => Ok(Device::Cpu),
            DeviceRequest::Cuda(i) => load_device_with(Some(i)),
            DeviceRequest::Explicit(d) => Ok(d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_request_resolves_to_cpu() {
        let device = DeviceRequest::Cpu.resolve().unwrap();
        assert!(device.is_cpu());
    }

    #[test]
    fn default_request_always_resolves() {
        // CPU-only hosts get the CPU whether or not the crate was built with `cuda`.
        let device = DeviceRequest::Default.resolve().unwrap();
        if !candle_core::utils::cuda_is_available() {
            assert!(device.is_cpu());
        }
    }

    #[test]
    fn explicit_request_is_passed_through() {
        let device = DeviceRequest::Explicit(Device::Cpu).resolve().unwrap();
        assert!(device.is_cpu());
    }
}
