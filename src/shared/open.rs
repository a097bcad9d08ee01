// This is free and unencumbered software released into the public domain.

use super::{CameraConfig, CameraDriver, CameraError, drivers::simulated::SimulatedCameraDriver};

/// Picks a driver for `input_url`.
///
/// `""`, `"sim"` and `"sim:<anything>"` select the built-in simulated HAL.
/// Platform HALs plug in through [`CameraDriver`] directly.
pub fn open_camera(input_url: impl AsRef<str>) -> Result<Box<dyn CameraDriver>, CameraError> {
    let url = input_url.as_ref().trim();
    match url.split_once(':').map_or(url, |(scheme, _)| scheme) {
        "" | "sim" => Ok(Box::new(SimulatedCameraDriver::new())),
        _ => Err(CameraError::NoDriver),
    }
}

impl CameraConfig {
    /// Opens the driver named by [`CameraConfig::device`]; unset selects the
    /// simulated HAL.
    pub fn open_driver(&self) -> Result<Box<dyn CameraDriver>, CameraError> {
        open_camera(self.device.as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::CameraBackend;

    #[test]
    fn simulated_urls_resolve() {
        for url in ["", "sim", "sim:back", "  sim:front "] {
            let driver = open_camera(url).unwrap();
            assert_eq!(driver.backend(), CameraBackend::Simulated, "{url:?}");
        }
    }

    #[test]
    fn config_device_selects_the_driver() {
        let config = CameraConfig::default();
        assert!(config.open_driver().is_ok());
        let config = config.with_device("sim:rear");
        assert_eq!(config.open_driver().unwrap().backend(), CameraBackend::Simulated);
        let config = config.with_device("file:/dev/video0");
        assert!(matches!(config.open_driver(), Err(CameraError::NoDriver)));
    }

    #[test]
    fn unknown_schemes_have_no_driver() {
        for url in ["file:/dev/video0", "avf:0", "simulator"] {
            assert!(matches!(open_camera(url), Err(CameraError::NoDriver)), "{url:?}");
        }
    }
}
