// This is free and unencumbered software released into the public domain.

use std::{error::Error as StdError, io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("no suitable camera backend available")]
    NoDriver,

    #[error("no live hardware session")]
    NotAttached,

    #[error("camera not ready to capture")]
    NotReady,

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("storage error while {context} ({})", .path.display())]
    Storage {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("image error while {context}")]
    Image {
        context: &'static str,
        #[source]
        source: image::ImageError,
    },

    #[error("driver error while {context}")]
    DriverError {
        context: &'static str,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("{0}")]
    Other(String),
}

/// Error classes reported to the application with a capture request id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Capture requested while busy or without hardware.
    NotReady,
    /// Storage unwritable, temporary file I/O failure, or rename failure.
    Resource,
    /// A focus mode, point mode, or resolution was rejected.
    UnsupportedValue,
    Driver,
    Other,
}

impl CameraError {
    #[inline]
    pub fn driver(context: &'static str, source: impl StdError + Send + Sync + 'static) -> Self {
        Self::DriverError {
            context,
            source: Box::new(source),
        }
    }

    #[inline]
    pub fn storage(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            context,
            path: path.into(),
            source,
        }
    }

    #[inline]
    pub fn image(context: &'static str, source: image::ImageError) -> Self {
        Self::Image { context, source }
    }

    #[inline]
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    #[inline]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotReady | Self::NotAttached => ErrorKind::NotReady,
            Self::Storage { .. } | Self::Image { .. } => ErrorKind::Resource,
            Self::Unsupported(_) => ErrorKind::UnsupportedValue,
            Self::NoDriver | Self::DriverError { .. } => ErrorKind::Driver,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}
