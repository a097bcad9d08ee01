// This is free and unencumbered software released into the public domain.

use bytes::Bytes;

/// An uncompressed RGB viewfinder image, as handed out with `ImageCaptured`.
#[derive(Clone, Debug)]
pub struct Frame {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    /// Bytes per row, at least `width * 3`.
    pub stride: u32,
}

impl Frame {
    pub fn new_rgb8(data: impl Into<Bytes>, width: u32, height: u32, stride: u32) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            stride,
        }
    }
}
