// This is free and unencumbered software released into the public domain.

use crate::shared::{
    CallbackBridge, CameraConfig, CameraDriver, CameraError, CameraEvent, CameraFacing,
    ControlContext, EncodingQuality, EventSink, FocusControl, FocusMode, FocusPoint,
    FocusPointMode, HalEvent, HalMsg, ImageCaptureControl, ImageEncoderControl,
    ImageEncoderSettings, RequestId, SessionId, Size, StorageManager, event_channel,
};
use std::{
    collections::VecDeque,
    mem,
    path::Path,
    sync::mpsc::Receiver,
    time::Duration,
};
use tracing::{debug, info, warn};

/// Work postponed to the next dispatch tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Deferred {
    StartFocus,
}

struct Session {
    id: SessionId,
    driver: Box<dyn CameraDriver>,
}

/// The owning context for one camera: every controller lives here and is
/// only ever touched from the thread that holds the service. HAL callbacks
/// are queued on the [`CallbackBridge`] and applied by [`dispatch_pending`].
///
/// [`dispatch_pending`]: CameraService::dispatch_pending
pub struct CameraService {
    config: CameraConfig,
    session: Option<Session>,
    last_session: SessionId,
    bridge: CallbackBridge,
    events: EventSink,
    events_rx: Receiver<CameraEvent>,
    focus: FocusControl,
    capture: ImageCaptureControl,
    encoder: ImageEncoderControl,
    deferred: VecDeque<Deferred>,
}

impl CameraService {
    pub fn new(config: CameraConfig) -> Self {
        let (events, events_rx) = event_channel(config.event_capacity);
        Self {
            bridge: CallbackBridge::new(config.callback_capacity),
            capture: ImageCaptureControl::new(StorageManager::new(config.gallery_dir.clone())),
            config,
            session: None,
            last_session: 0,
            events,
            events_rx,
            focus: FocusControl::new(),
            encoder: ImageEncoderControl::new(),
            deferred: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn facing(&self) -> CameraFacing {
        self.config.facing
    }

    /// Application notifications. The queue holds
    /// [`CameraConfig::event_capacity`] events; once it is full, new events
    /// are dropped with a warning, so drain it from the same loop that calls
    /// [`Self::dispatch_pending`] or `ImageSaved`/`Error` for a request may
    /// be lost.
    pub fn events(&self) -> &Receiver<CameraEvent> {
        &self.events_rx
    }

    pub fn is_attached(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn focus(&self) -> &FocusControl {
        &self.focus
    }

    pub fn capture_control(&self) -> &ImageCaptureControl {
        &self.capture
    }

    pub fn encoder(&self) -> &ImageEncoderControl {
        &self.encoder
    }

    pub fn driver_as<T: 'static>(&self) -> Option<&T> {
        self.session.as_ref()?.driver.as_any().downcast_ref::<T>()
    }

    pub fn driver_as_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.session.as_mut()?.driver.as_any_mut().downcast_mut::<T>()
    }

    /// Brings up a hardware session on `driver`, replacing any current one.
    pub fn attach(&mut self, mut driver: Box<dyn CameraDriver>) -> Result<(), CameraError> {
        if self.session.is_some() {
            self.detach()?;
        }

        let id = self.last_session + 1;
        driver.start(self.bridge.sender(id))?;
        self.last_session = id;
        self.session = Some(Session { id, driver });
        info!(session = id, facing = ?self.config.facing, "camera attached");

        let screen_ratio = self.config.screen_aspect_ratio;
        let schedule_focus = {
            let mut ctx = context(&mut self.session, &self.events, self.config.facing);
            self.encoder.init(&mut ctx);
            self.capture.init(&mut self.encoder, &mut ctx, screen_ratio);
            let schedule_focus = self.focus.init(&mut ctx);
            if let Some(driver) = ctx.driver() {
                driver.start_preview();
            }
            schedule_focus
        };
        if schedule_focus {
            self.deferred.push_back(Deferred::StartFocus);
        }

        self.update_capture_ready();
        Ok(())
    }

    /// Tears the hardware session down. Focus and encoder state go back to
    /// their defaults; callbacks still queued or in flight for the old
    /// session are discarded.
    pub fn detach(&mut self) -> Result<(), CameraError> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        // HAL threads may be blocked on a full queue; dropping the receiver
        // fails their sends so `stop` can join them.
        let stale = mem::replace(
            &mut self.bridge,
            CallbackBridge::new(self.config.callback_capacity),
        );
        drop(stale);

        let result = session.driver.stop();
        info!(session = session.id, "camera detached");

        self.deferred.clear();
        self.focus.reset();
        self.encoder.reset_all_settings();
        let ctx = ControlContext::detached(&self.events, self.config.facing);
        self.capture.reset(&ctx);
        result
    }

    /// Swaps between the front and back camera.
    pub fn switch_camera(
        &mut self,
        facing: CameraFacing,
        driver: Box<dyn CameraDriver>,
    ) -> Result<(), CameraError> {
        self.detach()?;
        self.config.facing = facing;
        self.attach(driver)
    }

    pub fn set_custom_focus_point(&mut self, point: FocusPoint) {
        let mut ctx = context(&mut self.session, &self.events, self.config.facing);
        self.focus.set_custom_focus_point(point, &mut ctx);
        self.update_capture_ready();
    }

    pub fn set_focus_mode(&mut self, mode: FocusMode) {
        let mut ctx = context(&mut self.session, &self.events, self.config.facing);
        self.focus.set_focus_mode(mode, &mut ctx);
    }

    pub fn set_focus_point_mode(&mut self, mode: FocusPointMode) {
        let mut ctx = context(&mut self.session, &self.events, self.config.facing);
        self.focus.set_focus_point_mode(mode, &mut ctx);
    }

    pub fn start_focus(&mut self) {
        let mut ctx = context(&mut self.session, &self.events, self.config.facing);
        if self.focus.start_focus(&mut ctx) {
            self.update_capture_ready();
        }
    }

    pub fn is_ready_for_capture(&self) -> bool {
        self.capture.is_ready_for_capture()
    }

    pub fn capture(&mut self, path: impl AsRef<Path>) -> RequestId {
        let mut ctx = context(&mut self.session, &self.events, self.config.facing);
        self.capture.capture(path.as_ref(), &mut ctx)
    }

    pub fn cancel_capture(&mut self) {
        self.capture.cancel_capture();
    }

    pub fn supported_resolutions(&self) -> &[Size] {
        self.encoder.supported_resolutions()
    }

    pub fn supported_thumbnail_resolutions(&self) -> &[Size] {
        self.encoder.supported_thumbnail_resolutions()
    }

    pub fn set_size(&mut self, size: Size) -> Result<(), CameraError> {
        let mut ctx = context(&mut self.session, &self.events, self.config.facing);
        self.encoder.set_size(size, &mut ctx)
    }

    pub fn set_thumbnail_size(&mut self, size: Size) -> Result<(), CameraError> {
        let mut ctx = context(&mut self.session, &self.events, self.config.facing);
        self.encoder.set_thumbnail_size(size, &mut ctx)
    }

    pub fn set_quality(&mut self, quality: EncodingQuality) {
        let mut ctx = context(&mut self.session, &self.events, self.config.facing);
        self.encoder.set_quality(quality, &mut ctx);
    }

    pub fn set_image_settings(&mut self, settings: ImageEncoderSettings) -> Result<(), CameraError> {
        let mut ctx = context(&mut self.session, &self.events, self.config.facing);
        self.encoder.set_image_settings(settings, &mut ctx)
    }

    pub fn enable_photo_mode(&mut self) {
        let mut ctx = context(&mut self.session, &self.events, self.config.facing);
        self.encoder.enable_photo_mode(&mut ctx);
    }

    /// One tick of the owner loop: runs work deferred by the previous tick,
    /// then applies every queued hardware callback. Returns how many items
    /// were handled.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut handled = 0;

        for task in self.deferred.drain(..).collect::<Vec<_>>() {
            match task {
                Deferred::StartFocus => self.start_focus(),
            }
            handled += 1;
        }

        while let Some(msg) = self.bridge.try_next() {
            self.dispatch(msg);
            handled += 1;
        }
        handled
    }

    /// Like [`Self::dispatch_pending`], but waits up to `timeout` for a
    /// hardware callback when nothing is queued yet.
    pub fn wait_and_dispatch(&mut self, timeout: Duration) -> usize {
        if self.deferred.is_empty() {
            if let Some(msg) = self.bridge.next_timeout(timeout) {
                self.dispatch(msg);
                return 1 + self.dispatch_pending();
            }
        }
        self.dispatch_pending()
    }

    fn dispatch(&mut self, msg: HalMsg) {
        if self.session_id() != Some(msg.session) {
            debug!(session = msg.session, event = ?msg.event, "dropping callback from a stale session");
            return;
        }

        let mut ctx = context(&mut self.session, &self.events, self.config.facing);
        match msg.event {
            HalEvent::Shutter => self.capture.on_shutter(&ctx),
            HalEvent::CompressedImage(data) => {
                self.capture.on_image_data(&data, &mut ctx);
                self.update_capture_ready();
            },
            HalEvent::FocusComplete => {
                self.focus.on_focus_complete();
                self.update_capture_ready();
            },
        }
    }

    /// Ready means: hardware attached, no autofocus sweep in flight, and no
    /// capture waiting for its image.
    fn update_capture_ready(&mut self) {
        let ready =
            self.session.is_some() && !self.focus.is_busy() && !self.capture.is_capture_running();
        let ctx = ControlContext::detached(&self.events, self.config.facing);
        self.capture.set_ready(ready, &ctx);
    }
}

impl Drop for CameraService {
    fn drop(&mut self) {
        if let Err(err) = self.detach() {
            warn!(%err, "failed to stop the camera driver");
        }
    }
}

fn context<'a>(
    session: &'a mut Option<Session>,
    events: &'a EventSink,
    facing: CameraFacing,
) -> ControlContext<'a> {
    ControlContext::new(session.as_mut().map(|s| s.driver.as_mut()), events, facing)
}
