// This is free and unencumbered software released into the public domain.

use crate::shared::{ErrorKind, FocusMode, FocusPoint, FocusPointMode, Frame};
use std::{
    path::PathBuf,
    sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel},
};
use tracing::warn;

/// Correlates notifications with the `capture()` call that caused them.
pub type RequestId = u32;

/// Change notifications delivered to the application.
#[derive(Clone, Debug)]
pub enum CameraEvent {
    FocusPointChanged(FocusPoint),
    FocusModeChanged(FocusMode),
    FocusPointModeChanged(FocusPointMode),
    ImageExposed {
        request_id: RequestId,
    },
    ImageCaptured {
        request_id: RequestId,
        preview: Option<Frame>,
    },
    ImageSaved {
        request_id: RequestId,
        path: PathBuf,
    },
    Error {
        request_id: RequestId,
        kind: ErrorKind,
        message: String,
    },
    ReadyForCaptureChanged(bool),
}

#[derive(Clone, Debug)]
pub struct EventSink {
    tx: SyncSender<CameraEvent>,
}

impl EventSink {
    /// Never blocks the controllers: a full queue drops `event`.
    pub fn emit(&self, event: CameraEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {},
            Err(TrySendError::Full(event)) => {
                warn!(?event, "event queue full, dropping notification");
            },
            Err(TrySendError::Disconnected(_)) => {},
        }
    }
}

pub fn event_channel(capacity: usize) -> (EventSink, Receiver<CameraEvent>) {
    let (tx, rx) = sync_channel(capacity.max(1));
    (EventSink { tx }, rx)
}
