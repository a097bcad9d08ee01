// This is free and unencumbered software released into the public domain.

//! A software camera HAL.
//!
//! Commands return immediately; a worker thread plays the part of the
//! hardware and answers through the [`CallbackSender`] after a short delay,
//! from its own thread, the same way a real HAL does.

use crate::shared::{
    AutoFocusMode, CallbackSender, CameraBackend, CameraDriver, CameraError, FocusRegion, Frame,
    Size,
};
use image::{ExtendedColorType, Rgb, RgbImage, codecs::jpeg::JpegEncoder};
use std::{
    any::Any,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{RecvTimeoutError, Sender, channel},
    },
    thread::JoinHandle,
    time::Duration,
};
use tracing::{debug, trace, warn};

const DEFAULT_PICTURE_SIZES: [Size; 5] = [
    Size::new(1920, 1080),
    Size::new(1440, 1080),
    Size::new(1280, 960),
    Size::new(1280, 720),
    Size::new(640, 480),
];

const DEFAULT_THUMBNAIL_SIZES: [Size; 3] = [
    Size::new(320, 240),
    Size::new(256, 144),
    Size::new(0, 0),
];

const PREVIEW_SIZE: Size = Size::new(160, 120);

enum Job {
    Snapshot { size: Size, quality: u8, rotation: u32 },
    Autofocus,
    Stop,
}

struct Worker {
    tx: Sender<Job>,
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(callbacks: CallbackSender, latency: Duration) -> Result<Self, CameraError> {
        let (tx, rx) = channel::<Job>();
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = Arc::clone(&stop);

        let join = std::thread::Builder::new()
            .name("sim-camera-hal".into())
            .spawn(move || {
                debug!(session = callbacks.session(), "simulated HAL started");

                while !stop2.load(Ordering::Relaxed) {
                    match rx.recv_timeout(Duration::from_millis(200)) {
                        Ok(Job::Snapshot {
                            size,
                            quality,
                            rotation,
                        }) => {
                            std::thread::sleep(latency);
                            if !callbacks.on_shutter() {
                                break;
                            }
                            match render_jpeg(size, quality) {
                                Ok(data) => {
                                    trace!(%size, rotation, bytes = data.len(), "snapshot encoded");
                                    if !callbacks.on_compressed_image(data) {
                                        break;
                                    }
                                },
                                Err(err) => warn!(%err, "simulated snapshot failed"),
                            }
                        },
                        Ok(Job::Autofocus) => {
                            std::thread::sleep(latency);
                            if !callbacks.on_focus_complete() {
                                break;
                            }
                        },
                        Ok(Job::Stop) => break,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                debug!(session = callbacks.session(), "simulated HAL stopped");
            })
            .map_err(|e| CameraError::driver("spawning the simulated HAL thread", e))?;

        Ok(Self {
            tx,
            stop,
            join: Some(join),
        })
    }

    fn submit(&self, job: Job) {
        if self.tx.send(job).is_err() {
            warn!("simulated HAL thread is gone, dropping command");
        }
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let _ = self.tx.send(Job::Stop);
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

pub struct SimulatedCameraDriver {
    picture_sizes: Vec<Size>,
    thumbnail_sizes: Vec<Size>,
    latency: Duration,
    picture_size: Option<Size>,
    thumbnail_size: Option<Size>,
    jpeg_quality: u8,
    rotation: u32,
    focus_mode: AutoFocusMode,
    focus_region: FocusRegion,
    snapshots: usize,
    previewing: bool,
    worker: Option<Worker>,
}

impl Default for SimulatedCameraDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCameraDriver {
    pub fn new() -> Self {
        Self {
            picture_sizes: DEFAULT_PICTURE_SIZES.to_vec(),
            thumbnail_sizes: DEFAULT_THUMBNAIL_SIZES.to_vec(),
            latency: Duration::from_millis(30),
            picture_size: None,
            thumbnail_size: None,
            jpeg_quality: 95,
            rotation: 0,
            focus_mode: AutoFocusMode::ContinuousPicture,
            focus_region: FocusRegion::UNSET,
            snapshots: 0,
            previewing: false,
            worker: None,
        }
    }

    pub fn with_picture_sizes(mut self, sizes: impl IntoIterator<Item = Size>) -> Self {
        self.picture_sizes = sizes.into_iter().collect();
        self
    }

    pub fn with_thumbnail_sizes(mut self, sizes: impl IntoIterator<Item = Size>) -> Self {
        self.thumbnail_sizes = sizes.into_iter().collect();
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn picture_size(&self) -> Option<Size> {
        self.picture_size
    }

    pub fn thumbnail_size(&self) -> Option<Size> {
        self.thumbnail_size
    }

    pub fn rotation(&self) -> u32 {
        self.rotation
    }

    pub fn focus_region(&self) -> FocusRegion {
        self.focus_region
    }

    pub fn snapshots_taken(&self) -> usize {
        self.snapshots
    }

    pub fn is_previewing(&self) -> bool {
        self.previewing
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    fn effective_picture_size(&self) -> Size {
        self.picture_size
            .or_else(|| self.picture_sizes.first().copied())
            .unwrap_or(PREVIEW_SIZE)
    }
}

impl CameraDriver for SimulatedCameraDriver {
    fn backend(&self) -> CameraBackend {
        CameraBackend::Simulated
    }

    fn start(&mut self, callbacks: CallbackSender) -> Result<(), CameraError> {
        if let Some(mut old) = self.worker.take() {
            old.shutdown();
        }
        self.worker = Some(Worker::spawn(callbacks, self.latency)?);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
        self.previewing = false;
        Ok(())
    }

    fn take_snapshot(&mut self) {
        let Some(worker) = &self.worker else {
            warn!("snapshot requested on a stopped simulated camera");
            return;
        };
        self.previewing = false;
        self.snapshots += 1;
        worker.submit(Job::Snapshot {
            size: self.effective_picture_size(),
            quality: self.jpeg_quality,
            rotation: self.rotation,
        });
    }

    fn start_autofocus(&mut self) {
        if let Some(worker) = &self.worker {
            worker.submit(Job::Autofocus);
        }
    }

    fn start_preview(&mut self) {
        self.previewing = self.worker.is_some();
    }

    fn set_focus_region(&mut self, region: &FocusRegion) {
        self.focus_region = *region;
    }

    fn set_auto_focus_mode(&mut self, mode: AutoFocusMode) {
        self.focus_mode = mode;
    }

    fn auto_focus_mode(&self) -> AutoFocusMode {
        self.focus_mode
    }

    fn set_rotation(&mut self, degrees: u32) {
        self.rotation = degrees;
    }

    fn set_picture_size(&mut self, size: Size) {
        self.picture_size = Some(size);
    }

    fn set_thumbnail_size(&mut self, size: Size) {
        self.thumbnail_size = Some(size);
    }

    fn set_jpeg_quality(&mut self, quality: u8) {
        self.jpeg_quality = quality.clamp(1, 100);
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
        self.worker.as_ref()?;
        let img = test_pattern(PREVIEW_SIZE);
        let stride = PREVIEW_SIZE.width * 3;
        Some(Frame::new_rgb8(
            img.into_raw(),
            PREVIEW_SIZE.width,
            PREVIEW_SIZE.height,
            stride,
        ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for SimulatedCameraDriver {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn test_pattern(size: Size) -> RgbImage {
    let (w, h) = (size.width.max(1), size.height.max(1));
    RgbImage::from_fn(w, h, |x, y| {
        Rgb([
            (x * 255 / w) as u8,
            (y * 255 / h) as u8,
            if (x / 32 + y / 32) % 2 == 0 { 200 } else { 40 },
        ])
    })
}

fn render_jpeg(size: Size, quality: u8) -> Result<Vec<u8>, CameraError> {
    let img = test_pattern(size);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        .map_err(|e| CameraError::image("encoding the simulated snapshot", e))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{CallbackBridge, HalEvent};

    #[test]
    fn snapshot_answers_from_the_worker_thread() {
        let bridge = CallbackBridge::new(4);
        let mut driver = SimulatedCameraDriver::new()
            .with_picture_sizes([Size::new(64, 48)])
            .with_latency(Duration::from_millis(1));
        driver.start(bridge.sender(3)).unwrap();
        driver.take_snapshot();

        let shutter = bridge.next_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(shutter.session, 3);
        assert!(matches!(shutter.event, HalEvent::Shutter));

        let image = bridge.next_timeout(Duration::from_secs(5)).unwrap();
        let HalEvent::CompressedImage(data) = image.event else {
            panic!("expected image data, got {:?}", image.event);
        };
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));

        driver.stop().unwrap();
        assert!(!driver.is_running());
    }

    #[test]
    fn autofocus_completes() {
        let bridge = CallbackBridge::new(4);
        let mut driver = SimulatedCameraDriver::new().with_latency(Duration::from_millis(1));
        driver.start(bridge.sender(1)).unwrap();
        driver.start_autofocus();
        let msg = bridge.next_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(msg.event, HalEvent::FocusComplete));
    }

    #[test]
    fn commands_without_a_session_are_ignored() {
        let mut driver = SimulatedCameraDriver::new();
        driver.take_snapshot();
        driver.start_autofocus();
        driver.start_preview();
        assert_eq!(driver.snapshots_taken(), 0);
        assert!(!driver.is_previewing());
        assert!(driver.grab_preview().is_none());
    }
}
