// This is free and unencumbered software released into the public domain.

use bytes::Bytes;
use std::{
    sync::mpsc::{Receiver, RecvTimeoutError, SyncSender, TryRecvError, sync_channel},
    time::Duration,
};
use tracing::debug;

/// Identifies one attach/detach cycle of the hardware.
pub type SessionId = u64;

#[derive(Clone, Debug)]
pub enum HalEvent {
    Shutter,
    CompressedImage(Bytes),
    FocusComplete,
}

#[derive(Clone, Debug)]
pub struct HalMsg {
    pub session: SessionId,
    pub event: HalEvent,
}

/// The HAL-side end of the bridge. Cheap to clone and safe to call from any
/// thread; nothing here touches controller state.
#[derive(Clone, Debug)]
pub struct CallbackSender {
    session: SessionId,
    tx: SyncSender<HalMsg>,
}

impl CallbackSender {
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn on_shutter(&self) -> bool {
        self.send(HalEvent::Shutter)
    }

    pub fn on_compressed_image(&self, data: impl Into<Bytes>) -> bool {
        self.send(HalEvent::CompressedImage(data.into()))
    }

    pub fn on_focus_complete(&self) -> bool {
        self.send(HalEvent::FocusComplete)
    }

    /// Queues `event` for the owner. Blocks while the queue is full so image
    /// data is never dropped; returns false once the owner is gone.
    pub fn send(&self, event: HalEvent) -> bool {
        let msg = HalMsg {
            session: self.session,
            event,
        };
        match self.tx.send(msg) {
            Ok(()) => true,
            Err(_) => {
                debug!(session = self.session, "callback bridge closed, dropping HAL event");
                false
            },
        }
    }
}

/// The owner-side end: a bounded queue drained only by the owning context.
#[derive(Debug)]
pub struct CallbackBridge {
    tx: SyncSender<HalMsg>,
    rx: Receiver<HalMsg>,
}

impl CallbackBridge {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = sync_channel::<HalMsg>(capacity.max(1));
        Self { tx, rx }
    }

    pub fn sender(&self, session: SessionId) -> CallbackSender {
        CallbackSender {
            session,
            tx: self.tx.clone(),
        }
    }

    pub fn try_next(&self) -> Option<HalMsg> {
        match self.rx.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn next_timeout(&self, timeout: Duration) -> Option<HalMsg> {
        match self.rx.recv_timeout(timeout) {
            Ok(msg) => Some(msg),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}
