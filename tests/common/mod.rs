// This is free and unencumbered software released into the public domain.

#![allow(dead_code)]

use asimov_hal_camera_module::shared::{
    AutoFocusMode, CallbackSender, CameraBackend, CameraConfig, CameraDriver, CameraError,
    CameraEvent, CameraFacing, CameraService, FocusRegion, Frame, Size,
};
use image::{ExtendedColorType, Rgb, RgbImage, codecs::jpeg::JpegEncoder};
use std::{any::Any, path::Path};

/// Every call the controllers made on the driver, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Start,
    Stop,
    TakeSnapshot,
    StartAutofocus,
    StartPreview,
    SetFocusRegion(FocusRegion),
    SetAutoFocusMode(AutoFocusMode),
    SetRotation(u32),
    SetPictureSize(Size),
    SetThumbnailSize(Size),
    SetJpegQuality(u8),
}

/// A HAL that only records. Callbacks are fired by the test itself through
/// [`MockDriver::callbacks`].
pub struct MockDriver {
    pub commands: Vec<Command>,
    callbacks: Option<CallbackSender>,
    picture_sizes: Vec<Size>,
    thumbnail_sizes: Vec<Size>,
    focus_mode: AutoFocusMode,
    jpeg_quality: u8,
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            callbacks: None,
            picture_sizes: vec![
                Size::new(4000, 3000),
                Size::new(1920, 1080),
                Size::new(1280, 720),
                Size::new(640, 480),
            ],
            thumbnail_sizes: vec![Size::new(320, 240), Size::new(0, 0)],
            focus_mode: AutoFocusMode::ContinuousPicture,
            jpeg_quality: 80,
        }
    }

    pub fn with_picture_sizes(mut self, sizes: impl IntoIterator<Item = Size>) -> Self {
        self.picture_sizes = sizes.into_iter().collect();
        self
    }

    pub fn with_focus_mode(mut self, mode: AutoFocusMode) -> Self {
        self.focus_mode = mode;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn boxed(self) -> Box<dyn CameraDriver> {
        Box::new(self)
    }

    /// The HAL-side handle given to `start`.
    pub fn callbacks(&self) -> CallbackSender {
        self.callbacks.clone().expect("driver was never started")
    }

    pub fn count(&self, command: &Command) -> usize {
        self.commands.iter().filter(|c| *c == command).count()
    }
}

impl CameraDriver for MockDriver {
    fn backend(&self) -> CameraBackend {
        CameraBackend::Other("mock")
    }

    fn start(&mut self, callbacks: CallbackSender) -> Result<(), CameraError> {
        self.commands.push(Command::Start);
        self.callbacks = Some(callbacks);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        self.commands.push(Command::Stop);
        Ok(())
    }

    fn take_snapshot(&mut self) {
        self.commands.push(Command::TakeSnapshot);
    }

    fn start_autofocus(&mut self) {
        self.commands.push(Command::StartAutofocus);
    }

    fn start_preview(&mut self) {
        self.commands.push(Command::StartPreview);
    }

    fn set_focus_region(&mut self, region: &FocusRegion) {
        self.commands.push(Command::SetFocusRegion(*region));
    }

    fn set_auto_focus_mode(&mut self, mode: AutoFocusMode) {
        self.focus_mode = mode;
        self.commands.push(Command::SetAutoFocusMode(mode));
    }

    fn auto_focus_mode(&self) -> AutoFocusMode {
        self.focus_mode
    }

    fn set_rotation(&mut self, degrees: u32) {
        self.commands.push(Command::SetRotation(degrees));
    }

    fn set_picture_size(&mut self, size: Size) {
        self.commands.push(Command::SetPictureSize(size));
    }

    fn set_thumbnail_size(&mut self, size: Size) {
        self.commands.push(Command::SetThumbnailSize(size));
    }

    fn set_jpeg_quality(&mut self, quality: u8) {
        self.jpeg_quality = quality;
        self.commands.push(Command::SetJpegQuality(quality));
    }

    fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    fn enumerate_picture_sizes(&self, f: &mut dyn FnMut(Size)) {
        self.picture_sizes.iter().copied().for_each(f);
    }

    fn enumerate_thumbnail_sizes(&self, f: &mut dyn FnMut(Size)) {
        self.thumbnail_sizes.iter().copied().for_each(f);
    }

    fn grab_preview(&mut self) -> Option<Frame> {
        Some(Frame::new_rgb8(vec![0u8; 4 * 3 * 3], 4, 3, 12))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub fn service(gallery: &Path) -> CameraService {
    service_facing(gallery, CameraFacing::Back)
}

pub fn service_facing(gallery: &Path, facing: CameraFacing) -> CameraService {
    CameraService::new(CameraConfig::new(facing).with_gallery_dir(gallery))
}

/// A service already attached to a fresh [`MockDriver`].
pub fn attached(gallery: &Path) -> CameraService {
    let mut camera = service(gallery);
    camera.attach(MockDriver::new().boxed()).expect("attach");
    camera
}

pub fn mock(camera: &CameraService) -> &MockDriver {
    camera.driver_as::<MockDriver>().expect("mock driver attached")
}

pub fn drain(camera: &CameraService) -> Vec<CameraEvent> {
    camera.events().try_iter().collect()
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([10, 120, 220]));
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 90)
        .encode(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .expect("encode test jpeg");
    out
}
