// This is free and unencumbered software released into the public domain.

use asimov_hal_camera_module::shared::{
    CameraConfig, CameraEvent, CameraFacing, CameraService, FocusPoint, Size, THUMBNAIL_DIR,
    drivers::simulated::SimulatedCameraDriver,
};
use std::time::{Duration, Instant};

fn simulated() -> Box<SimulatedCameraDriver> {
    Box::new(
        SimulatedCameraDriver::new()
            .with_picture_sizes([Size::new(320, 240), Size::new(640, 360)])
            .with_latency(Duration::from_millis(2)),
    )
}

fn pump_until(camera: &mut CameraService, mut done: impl FnMut(&mut CameraService) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !done(camera) {
        assert!(Instant::now() < deadline, "timed out");
        camera.wait_and_dispatch(Duration::from_millis(20));
    }
}

#[test]
fn focus_then_capture_into_the_gallery() {
    let gallery = tempfile::tempdir().expect("tmp dir");
    let mut camera =
        CameraService::new(CameraConfig::new(CameraFacing::Back).with_gallery_dir(gallery.path()));

    camera.set_custom_focus_point(FocusPoint::new(0.5, 0.4));
    camera.attach(simulated()).unwrap();
    assert_eq!(
        camera
            .driver_as::<SimulatedCameraDriver>()
            .unwrap()
            .picture_size(),
        Some(Size::new(640, 360))
    );

    pump_until(&mut camera, |c| c.is_ready_for_capture() && !c.focus().is_busy());

    let id = camera.capture("");
    let mut saved = None;
    let mut exposed = false;
    pump_until(&mut camera, |c| {
        for event in c.events().try_iter() {
            match event {
                CameraEvent::ImageExposed { request_id } if request_id == id => exposed = true,
                CameraEvent::ImageSaved { request_id, path } if request_id == id => {
                    saved = Some(path)
                },
                CameraEvent::Error { message, .. } => panic!("capture failed: {message}"),
                _ => {},
            }
        }
        saved.is_some()
    });

    assert!(exposed);
    let path = saved.unwrap();
    let image = image::open(&path).unwrap();
    assert_eq!((image.width(), image.height()), (640, 360));

    let stem = path.file_stem().unwrap().to_string_lossy().into_owned();
    let thumb = image::open(gallery.path().join(THUMBNAIL_DIR).join(format!("{stem}_th.jpg")))
        .unwrap();
    assert_eq!(thumb.width(), 360);
    assert!(thumb.height() < 360);

    let driver = camera.driver_as::<SimulatedCameraDriver>().unwrap();
    assert_eq!(driver.rotation(), 90);
    assert_eq!(driver.snapshots_taken(), 1);
    assert!(driver.is_previewing());
    assert!(camera.is_ready_for_capture());
}

#[test]
fn detach_stops_the_hal_thread() {
    let gallery = tempfile::tempdir().expect("tmp dir");
    let mut camera = CameraService::new(CameraConfig::default().with_gallery_dir(gallery.path()));
    camera.attach(simulated()).unwrap();
    assert!(camera.driver_as::<SimulatedCameraDriver>().unwrap().is_running());

    camera.capture("");
    camera.detach().unwrap();
    assert!(!camera.is_attached());

    // Whatever the old session still delivers is ignored.
    std::thread::sleep(Duration::from_millis(50));
    camera.dispatch_pending();
    assert!(
        !camera
            .events()
            .try_iter()
            .any(|e| matches!(e, CameraEvent::ImageSaved { .. }))
    );
}

#[test]
fn detach_returns_while_the_hal_is_blocked_on_a_full_queue() {
    let gallery = tempfile::tempdir().expect("tmp dir");
    let mut camera = CameraService::new(CameraConfig::default().with_gallery_dir(gallery.path()));
    let capacity = camera.config().callback_capacity;
    camera
        .attach(Box::new(
            SimulatedCameraDriver::new().with_latency(Duration::from_millis(1)),
        ))
        .unwrap();

    // Nothing is dispatched, so the HAL thread ends up waiting on the queue.
    for _ in 0..capacity + 4 {
        camera.start_focus();
    }
    std::thread::sleep(Duration::from_millis(200));

    let (done_tx, done_rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let result = camera.detach();
        drop(camera);
        let _ = done_tx.send(result.is_ok());
    });
    assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)), Ok(true));
}
