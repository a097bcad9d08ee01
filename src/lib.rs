// This is free and unencumbered software released into the public domain.

//! Camera HAL shim: drives autofocus, still capture, and encoder settings on
//! top of an asynchronous camera hardware-abstraction layer.
//!
//! Hardware callbacks arrive on the HAL's own threads and are queued onto the
//! owning [`shared::CameraService`], which is the only place controller state
//! is ever mutated.

pub mod cli;
pub mod shared;
