// This is free and unencumbered software released into the public domain.

use crate::shared::{CallbackSender, CameraError, FocusRegion, Frame, Size};
use std::any::Any;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraBackend {
    Simulated,
    Other(&'static str),
}

/// Autofocus modes as the HAL names them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AutoFocusMode {
    Off,
    ContinuousVideo,
    #[default]
    Auto,
    Macro,
    ContinuousPicture,
    Infinity,
}

/// The camera HAL as seen by the controllers.
///
/// Commands are fire-and-forget: their completion, when there is one, comes
/// back later through the [`CallbackSender`] handed to [`start`]. Queries are
/// expected to be cheap and local.
///
/// [`start`]: CameraDriver::start
pub trait CameraDriver: Send {
    fn backend(&self) -> CameraBackend;

    /// Opens the hardware session. Callbacks must go through `callbacks`,
    /// from whatever thread the HAL likes.
    fn start(&mut self, callbacks: CallbackSender) -> Result<(), CameraError>;

    fn stop(&mut self) -> Result<(), CameraError> {
        Ok(())
    }

    fn take_snapshot(&mut self);
    fn start_autofocus(&mut self);
    fn start_preview(&mut self);

    fn set_focus_region(&mut self, region: &FocusRegion);
    fn set_auto_focus_mode(&mut self, mode: AutoFocusMode);
    fn auto_focus_mode(&self) -> AutoFocusMode;

    fn set_rotation(&mut self, degrees: u32);
    fn set_picture_size(&mut self, size: Size);
    fn set_thumbnail_size(&mut self, size: Size);
    fn set_jpeg_quality(&mut self, quality: u8);
    fn jpeg_quality(&self) -> u8;

    fn enumerate_picture_sizes(&self, f: &mut dyn FnMut(Size));
    fn enumerate_thumbnail_sizes(&self, f: &mut dyn FnMut(Size));

    /// Refreshes and returns the current viewfinder image, if the HAL has one.
    fn grab_preview(&mut self) -> Option<Frame> {
        None
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
