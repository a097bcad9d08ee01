// This is free and unencumbered software released into the public domain.

use crate::shared::{
    AutoFocusMode, CameraEvent, ControlContext, FocusPoint, FocusRegion, point_to_region,
};
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FocusMode {
    Manual,
    Infinity,
    Continuous,
    Macro,
    #[default]
    Auto,
    Hyperfocal,
}

impl FocusMode {
    pub fn is_supported(self) -> bool {
        self != Self::Hyperfocal
    }

    /// Hyperfocal has no HAL counterpart and falls back to plain autofocus.
    pub fn to_hal(self) -> AutoFocusMode {
        match self {
            Self::Manual => AutoFocusMode::Off,
            Self::Infinity => AutoFocusMode::Infinity,
            Self::Continuous => AutoFocusMode::ContinuousPicture,
            Self::Macro => AutoFocusMode::Macro,
            Self::Auto | Self::Hyperfocal => AutoFocusMode::Auto,
        }
    }

    pub fn from_hal(mode: AutoFocusMode) -> Self {
        match mode {
            AutoFocusMode::Off => Self::Manual,
            AutoFocusMode::Infinity => Self::Infinity,
            AutoFocusMode::ContinuousPicture => Self::Continuous,
            AutoFocusMode::Macro => Self::Macro,
            AutoFocusMode::Auto | AutoFocusMode::ContinuousVideo => Self::Auto,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FocusPointMode {
    #[default]
    Auto,
    Custom,
    FaceDetection,
}

impl FocusPointMode {
    pub fn is_supported(self) -> bool {
        self != Self::FaceDetection
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FocusPhase {
    #[default]
    Idle,
    /// A region is waiting for the hardware to attach.
    RegionArmed,
    Focusing,
    /// Mode and region are confirmed against the hardware.
    Applied,
}

/// Owns the focus mode, the custom focus point and whether an autofocus
/// sweep is in flight.
#[derive(Clone, Debug, Default)]
pub struct FocusControl {
    mode: FocusMode,
    point_mode: FocusPointMode,
    point: FocusPoint,
    region: FocusRegion,
    running: bool,
    mode_pending: bool,
    region_pending: bool,
    phase: FocusPhase,
}

impl FocusControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus_mode(&self) -> FocusMode {
        self.mode
    }

    pub fn focus_point_mode(&self) -> FocusPointMode {
        self.point_mode
    }

    pub fn custom_focus_point(&self) -> FocusPoint {
        self.point
    }

    pub fn region(&self) -> FocusRegion {
        self.region
    }

    pub fn phase(&self) -> FocusPhase {
        self.phase
    }

    /// True while an autofocus sweep is in flight.
    pub fn is_busy(&self) -> bool {
        self.running
    }

    pub fn is_apply_pending(&self) -> bool {
        self.mode_pending || self.region_pending
    }

    pub fn set_custom_focus_point(&mut self, point: FocusPoint, ctx: &mut ControlContext<'_>) {
        if self.point == point {
            return;
        }

        self.point = point;
        self.region = point_to_region(point);
        ctx.emit(CameraEvent::FocusPointChanged(point));

        let Some(driver) = ctx.driver() else {
            self.region_pending = true;
            self.phase = FocusPhase::RegionArmed;
            return;
        };
        driver.set_focus_region(&self.region);
        self.start_focus(ctx);
    }

    pub fn set_focus_mode(&mut self, mode: FocusMode, ctx: &mut ControlContext<'_>) {
        if self.mode == mode || !mode.is_supported() {
            return;
        }

        self.mode = mode;
        match ctx.driver() {
            Some(driver) => {
                driver.set_auto_focus_mode(mode.to_hal());
                if !self.running {
                    self.phase = FocusPhase::Applied;
                }
            },
            None => self.mode_pending = true,
        }

        ctx.emit(CameraEvent::FocusModeChanged(mode));
    }

    pub fn set_focus_point_mode(&mut self, mode: FocusPointMode, ctx: &mut ControlContext<'_>) {
        if self.point_mode == mode || !mode.is_supported() {
            return;
        }

        self.point_mode = mode;
        ctx.emit(CameraEvent::FocusPointModeChanged(mode));
    }

    /// Kicks off an autofocus sweep. Returns false, doing nothing, when no
    /// hardware is attached.
    pub fn start_focus(&mut self, ctx: &mut ControlContext<'_>) -> bool {
        let Some(driver) = ctx.driver() else {
            return false;
        };

        self.running = true;
        self.phase = FocusPhase::Focusing;
        driver.start_autofocus();
        true
    }

    /// Runs on the owner context once the HAL reports the sweep finished.
    pub fn on_focus_complete(&mut self) {
        if !self.running {
            debug!("focus complete without a sweep in flight");
        }
        self.running = false;
        self.phase = FocusPhase::Applied;
    }

    /// Applies what was staged before the hardware came up, or adopts the
    /// hardware's mode when nothing was. Returns true when a deferred
    /// autofocus sweep should be scheduled.
    pub fn init(&mut self, ctx: &mut ControlContext<'_>) -> bool {
        let Some(driver) = ctx.driver() else {
            return false;
        };

        if self.mode_pending {
            driver.set_auto_focus_mode(self.mode.to_hal());
            self.mode_pending = false;
        } else {
            self.mode = FocusMode::from_hal(driver.auto_focus_mode());
        }

        let schedule = self.region_pending && self.region.is_set();
        if schedule {
            driver.set_focus_region(&self.region);
        }
        self.region_pending = false;
        self.phase = FocusPhase::Applied;

        debug!(mode = ?self.mode, deferred_focus = schedule, "focus control attached");
        schedule
    }

    /// Back to defaults, as when the hardware session goes away.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
