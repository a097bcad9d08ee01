// This is free and unencumbered software released into the public domain.

use crate::shared::CameraError;
use image::{ExtendedColorType, codecs::jpeg::JpegEncoder, imageops::FilterType};
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::debug;

/// Longest edge of a gallery thumbnail, in pixels.
pub const THUMBNAIL_MAX_EDGE: u32 = 360;
pub const THUMBNAIL_QUALITY: u8 = 70;
pub const THUMBNAIL_DIR: &str = ".thumbs";
pub const THUMBNAIL_SUFFIX: &str = "_th";
pub const THUMBNAIL_EXTENSION: &str = "jpg";

pub const PHOTO_PREFIX: &str = "IMG_";
pub const PHOTO_EXTENSION: &str = "jpg";

/// Resolves where captures go and writes the gallery thumbnails.
#[derive(Clone, Debug)]
pub struct StorageManager {
    gallery_dir: PathBuf,
}

impl StorageManager {
    pub fn new(gallery_dir: impl Into<PathBuf>) -> Self {
        Self {
            gallery_dir: gallery_dir.into(),
        }
    }

    pub fn gallery_dir(&self) -> &Path {
        &self.gallery_dir
    }

    /// Next free `IMG_<date>_<n>.jpg` in `dir`, or in the gallery when `dir`
    /// is empty.
    pub fn next_photo_file_name(&self, dir: &Path) -> PathBuf {
        let dir = if dir.as_os_str().is_empty() {
            self.gallery_dir.as_path()
        } else {
            dir
        };
        let date = chrono::Local::now().format("%Y%m%d").to_string();

        let mut index = 1u32;
        loop {
            let candidate = dir.join(format!("{PHOTO_PREFIX}{date}_{index:03}.{PHOTO_EXTENSION}"));
            if !candidate.exists() {
                return candidate;
            }
            index += 1;
        }
    }

    /// Makes sure `path` can be written: creates the parent directory and
    /// probes it with a throwaway file.
    pub fn check_directory(&self, path: &Path) -> Result<(), CameraError> {
        let dir = parent_dir(path);
        fs::create_dir_all(dir)
            .map_err(|e| CameraError::storage("creating the target directory", dir, e))?;
        NamedTempFile::new_in(dir)
            .map_err(|e| CameraError::storage("probing the target directory", dir, e))?;
        Ok(())
    }

    pub fn is_in_gallery(&self, path: &Path) -> bool {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                normalize(parent) == normalize(&self.gallery_dir)
            },
            _ => false,
        }
    }

    pub fn thumbnail_path(&self, target: &Path) -> PathBuf {
        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.gallery_dir
            .join(THUMBNAIL_DIR)
            .join(format!("{stem}{THUMBNAIL_SUFFIX}.{THUMBNAIL_EXTENSION}"))
    }

    /// Writes a scaled-down JPEG of `data` next to the gallery.
    pub fn save_thumbnail(&self, data: &[u8], target: &Path) -> Result<PathBuf, CameraError> {
        let dir = self.gallery_dir.join(THUMBNAIL_DIR);
        fs::create_dir_all(&dir)
            .map_err(|e| CameraError::storage("creating the thumbnail directory", &dir, e))?;

        let full = image::load_from_memory(data)
            .map_err(|e| CameraError::image("decoding the captured image", e))?;
        let scaled = if full.width().max(full.height()) > THUMBNAIL_MAX_EDGE {
            full.resize(THUMBNAIL_MAX_EDGE, THUMBNAIL_MAX_EDGE, FilterType::Triangle)
        } else {
            full
        };
        let rgb = scaled.to_rgb8();

        let path = self.thumbnail_path(target);
        let file = fs::File::create(&path)
            .map_err(|e| CameraError::storage("creating the thumbnail", &path, e))?;
        let mut writer = BufWriter::new(file);
        JpegEncoder::new_with_quality(&mut writer, THUMBNAIL_QUALITY)
            .encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| CameraError::image("encoding the thumbnail", e))?;
        writer
            .flush()
            .map_err(|e| CameraError::storage("writing the thumbnail", &path, e))?;

        debug!(path = %path.display(), width = rgb.width(), height = rgb.height(), "thumbnail saved");
        Ok(path)
    }
}

/// The directory `path` lives in; `.` for bare file names.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
