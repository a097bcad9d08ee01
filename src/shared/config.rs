// This is free and unencumbered software released into the public domain.

use core::fmt;
use std::{env, path::PathBuf};

/// Overrides the default gallery directory when set.
pub const GALLERY_DIR_ENV: &str = "ASIMOV_HAL_CAMERA_GALLERY";

/// Which physical camera the session drives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CameraFacing {
    #[default]
    Back,
    Front,
}

impl CameraFacing {
    /// JPEG rotation for still captures. Fixed by how the sensors are mounted.
    pub fn capture_rotation(self) -> u32 {
        match self {
            Self::Back => 90,
            Self::Front => 270,
        }
    }
}

/// A picture or thumbnail resolution in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Driver URL for [`CameraConfig::open_driver`].
    pub device: Option<String>,
    pub facing: CameraFacing,
    /// Default output location; captures landing here also get a thumbnail.
    pub gallery_dir: PathBuf,
    /// Display ratio (long side over short side), when known.
    pub screen_aspect_ratio: Option<f32>,
    pub callback_capacity: usize,
    /// Notifications beyond this many undrained events are dropped.
    pub event_capacity: usize,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: None,
            facing: CameraFacing::Back,
            gallery_dir: default_gallery_dir(),
            screen_aspect_ratio: None,
            callback_capacity: 8,
            event_capacity: 256,
        }
    }
}

impl CameraConfig {
    pub fn new(facing: CameraFacing) -> Self {
        Self {
            facing,
            ..Default::default()
        }
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn with_facing(mut self, facing: CameraFacing) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_gallery_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.gallery_dir = dir.into();
        self
    }

    pub fn with_screen_size(mut self, width: u32, height: u32) -> Self {
        self.screen_aspect_ratio = if width == 0 || height == 0 {
            None
        } else {
            Some(width.max(height) as f32 / width.min(height) as f32)
        };
        self
    }

    pub fn with_callback_capacity(mut self, n: usize) -> Self {
        self.callback_capacity = n.max(1);
        self
    }

    pub fn with_event_capacity(mut self, n: usize) -> Self {
        self.event_capacity = n.max(1);
        self
    }
}

fn default_gallery_dir() -> PathBuf {
    env::var_os(GALLERY_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::picture_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}
