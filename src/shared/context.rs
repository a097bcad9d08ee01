// This is free and unencumbered software released into the public domain.

use crate::shared::{CameraDriver, CameraEvent, CameraFacing, EventSink};

/// What a controller may touch while it runs: the live driver (if any), the
/// application event sink, and the facing of the attached camera.
pub struct ControlContext<'a> {
    driver: Option<&'a mut (dyn CameraDriver + 'static)>,
    events: &'a EventSink,
    facing: CameraFacing,
}

impl<'a> ControlContext<'a> {
    pub fn new(
        driver: Option<&'a mut (dyn CameraDriver + 'static)>,
        events: &'a EventSink,
        facing: CameraFacing,
    ) -> Self {
        Self {
            driver,
            events,
            facing,
        }
    }

    /// A context with no hardware session.
    pub fn detached(events: &'a EventSink, facing: CameraFacing) -> Self {
        Self::new(None, events, facing)
    }

    pub fn driver(&mut self) -> Option<&mut (dyn CameraDriver + 'static)> {
        self.driver.as_deref_mut()
    }

    pub fn is_live(&self) -> bool {
        self.driver.is_some()
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    pub fn emit(&self, event: CameraEvent) {
        self.events.emit(event);
    }
}
