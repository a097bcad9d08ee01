// This is free and unencumbered software released into the public domain.

use crate::shared::{
    CameraError, CameraEvent, ControlContext, ImageEncoderControl, RequestId, StorageManager,
    parent_dir,
};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureStatus {
    Pending,
    AwaitingImageData,
    Completed,
    Failed(String),
}

/// One still capture, from `capture()` until the image is saved or dropped.
#[derive(Clone, Debug)]
pub struct CaptureRequest {
    pub id: RequestId,
    pub target_path: PathBuf,
    pub status: CaptureStatus,
}

impl CaptureRequest {
    fn new(id: RequestId, target_path: PathBuf) -> Self {
        Self {
            id,
            target_path,
            status: CaptureStatus::Pending,
        }
    }
}

/// Still-capture lifecycle: readiness gate, snapshot, and persisting the
/// JPEG the hardware hands back.
#[derive(Debug)]
pub struct ImageCaptureControl {
    last_request_id: RequestId,
    ready: bool,
    pending: Option<CaptureRequest>,
    finished: Option<CaptureRequest>,
    storage: StorageManager,
}

impl ImageCaptureControl {
    pub fn new(storage: StorageManager) -> Self {
        Self {
            last_request_id: 0,
            ready: false,
            pending: None,
            finished: None,
            storage,
        }
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    pub fn is_ready_for_capture(&self) -> bool {
        self.ready
    }

    pub fn set_ready(&mut self, ready: bool, ctx: &ControlContext<'_>) {
        if self.ready != ready {
            self.ready = ready;
            ctx.emit(CameraEvent::ReadyForCaptureChanged(ready));
        }
    }

    pub fn is_capture_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_request(&self) -> Option<&CaptureRequest> {
        self.pending.as_ref()
    }

    /// The most recent capture that got as far as the hardware, once resolved.
    pub fn last_finished(&self) -> Option<&CaptureRequest> {
        self.finished.as_ref()
    }

    pub fn last_request_id(&self) -> RequestId {
        self.last_request_id
    }

    /// Picks the initial picture size for a freshly attached camera, unless a
    /// supported size was already staged.
    pub fn init(
        &mut self,
        encoder: &mut ImageEncoderControl,
        ctx: &mut ControlContext<'_>,
        screen_ratio: Option<f32>,
    ) {
        let sizes = encoder.supported_resolutions().to_vec();
        if sizes.is_empty() {
            warn!("no supported resolutions detected for the selected camera");
            return;
        }
        if encoder.current_size().is_some() {
            return;
        }

        match encoder.choose_optimal_size(&sizes, ctx.facing(), screen_ratio) {
            Some(size) => {
                if let Err(err) = encoder.set_size(size, ctx) {
                    warn!(%err, "could not select the optimal picture size");
                }
            },
            None => warn!("no supported resolution matches a preferred aspect ratio"),
        }
    }

    /// Starts a still capture. The returned id is always fresh, even when
    /// the capture is rejected straight away.
    pub fn capture(&mut self, requested: &Path, ctx: &mut ControlContext<'_>) -> RequestId {
        self.last_request_id += 1;
        let id = self.last_request_id;

        if !self.ready || !ctx.is_live() {
            self.reject(id, CameraError::NotReady, ctx);
            return id;
        }

        let target = if requested.as_os_str().is_empty() || requested.is_dir() {
            self.storage.next_photo_file_name(requested)
        } else {
            requested.to_path_buf()
        };

        if let Err(err) = self.storage.check_directory(&target) {
            warn!(%err, path = %target.display(), "won't be able to save the capture");
            self.reject(id, err, ctx);
            return id;
        }

        let facing = ctx.facing();
        let Some(driver) = ctx.driver() else {
            self.reject(id, CameraError::NotAttached, ctx);
            return id;
        };
        driver.set_rotation(facing.capture_rotation());
        driver.take_snapshot();
        let preview = driver.grab_preview();

        let mut request = CaptureRequest::new(id, target);
        request.status = CaptureStatus::AwaitingImageData;
        info!(id, path = %request.target_path.display(), "capture started");
        self.pending = Some(request);

        self.set_ready(false, ctx);
        ctx.emit(CameraEvent::ImageCaptured {
            request_id: id,
            preview,
        });
        id
    }

    /// No-op: a triggered snapshot cannot be called back.
    pub fn cancel_capture(&mut self) {
        debug!("cancelling a capture is not supported");
    }

    pub fn on_shutter(&self, ctx: &ControlContext<'_>) {
        ctx.emit(CameraEvent::ImageExposed {
            request_id: self.last_request_id,
        });
    }

    /// Persists the compressed image for the pending capture. Data arriving
    /// with nothing pending, or after the hardware went away, is dropped.
    pub fn on_image_data(&mut self, data: &[u8], ctx: &mut ControlContext<'_>) {
        if !ctx.is_live() {
            debug!(bytes = data.len(), "dropping image data without a hardware session");
            return;
        }
        let Some(mut request) = self.pending.take() else {
            debug!(bytes = data.len(), "dropping image data without a pending capture");
            return;
        };

        match self.save(data, &request.target_path) {
            Ok(()) => {
                request.status = CaptureStatus::Completed;
                info!(id = request.id, path = %request.target_path.display(), "image saved");
                ctx.emit(CameraEvent::ImageSaved {
                    request_id: request.id,
                    path: request.target_path.clone(),
                });
            },
            Err(err) => {
                warn!(id = request.id, %err, "failed to save captured image");
                request.status = CaptureStatus::Failed(err.to_string());
                ctx.emit(CameraEvent::Error {
                    request_id: request.id,
                    kind: err.kind(),
                    message: err.to_string(),
                });
            },
        }

        self.finished = Some(request);

        if let Some(driver) = ctx.driver() {
            driver.start_preview();
        }
    }

    /// Drops any pending capture and closes the gate; the hardware is gone.
    pub fn reset(&mut self, ctx: &ControlContext<'_>) {
        if let Some(mut request) = self.pending.take() {
            debug!(id = request.id, "abandoning pending capture");
            request.status = CaptureStatus::Failed("hardware session closed".into());
            self.finished = Some(request);
        }
        self.set_ready(false, ctx);
    }

    fn save(&self, data: &[u8], target: &Path) -> Result<(), CameraError> {
        let dir = parent_dir(target);
        let mut file = NamedTempFile::new_in(dir)
            .map_err(|e| CameraError::storage("opening a temporary file", dir, e))?;
        file.write_all(data)
            .and_then(|()| file.flush())
            .map_err(|e| CameraError::storage("writing the temporary file", file.path(), e))?;

        if self.storage.is_in_gallery(target) {
            if let Err(err) = self.storage.save_thumbnail(data, target) {
                warn!(%err, "could not create the gallery thumbnail");
            }
        }

        file.persist(target)
            .map_err(|e| CameraError::storage("saving the image", target, e.error))?;
        Ok(())
    }

    fn reject(&self, id: RequestId, err: CameraError, ctx: &ControlContext<'_>) {
        ctx.emit(CameraEvent::Error {
            request_id: id,
            kind: err.kind(),
            message: err.to_string(),
        });
    }
}
