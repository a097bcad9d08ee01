// This is free and unencumbered software released into the public domain.

use crate::shared::{CameraError, CameraFacing, ControlContext, Size};
use tracing::{debug, warn};

/// Two ratios closer than this are considered the same.
pub const ASPECT_RATIO_EPSILON: f32 = 1e-2;

const BACK_ASPECT_RATIOS: [f32; 4] = [16.0 / 9.0, 15.0 / 10.0, 4.0 / 3.0, 5.0 / 4.0];
const FRONT_ASPECT_RATIOS: [f32; 4] = [4.0 / 3.0, 5.0 / 4.0, 16.0 / 9.0, 15.0 / 10.0];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum EncodingQuality {
    VeryLow,
    Low,
    #[default]
    Normal,
    High,
    VeryHigh,
}

impl EncodingQuality {
    pub fn to_jpeg_quality(self) -> u8 {
        match self {
            Self::VeryLow => 40,
            Self::Low => 60,
            Self::Normal => 80,
            Self::High => 90,
            Self::VeryHigh => 100,
        }
    }

    pub fn from_jpeg_quality(quality: u8) -> Self {
        match quality {
            0..=40 => Self::VeryLow,
            41..=60 => Self::Low,
            61..=80 => Self::Normal,
            81..=90 => Self::High,
            _ => Self::VeryHigh,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageEncoderSettings {
    pub quality: Option<EncodingQuality>,
    pub resolution: Option<Size>,
}

/// Aspect ratios to try, best first, for the given camera.
pub fn prioritized_aspect_ratios(facing: CameraFacing, screen_ratio: Option<f32>) -> Vec<f32> {
    match facing {
        CameraFacing::Back => {
            let mut ratios: Vec<f32> = screen_ratio.filter(|r| *r > 0.0).into_iter().collect();
            for ratio in BACK_ASPECT_RATIOS {
                if !ratios.iter().any(|r| (r - ratio).abs() < ASPECT_RATIO_EPSILON) {
                    ratios.push(ratio);
                }
            }
            ratios
        },
        CameraFacing::Front => FRONT_ASPECT_RATIOS.to_vec(),
    }
}

/// Picks the first size matching the highest-priority ratio that any size
/// matches at all. Ratio priority wins over resolution.
pub fn choose_optimal_size(
    sizes: &[Size],
    facing: CameraFacing,
    screen_ratio: Option<f32>,
) -> Option<(Size, f32)> {
    prioritized_aspect_ratios(facing, screen_ratio)
        .into_iter()
        .find_map(|ratio| {
            sizes
                .iter()
                .find(|size| (size.aspect_ratio() - ratio).abs() < ASPECT_RATIO_EPSILON)
                .map(|size| (*size, ratio))
        })
}

/// Supported and selected picture/thumbnail resolutions plus JPEG quality.
#[derive(Clone, Debug, Default)]
pub struct ImageEncoderControl {
    available_sizes: Vec<Size>,
    available_thumbnail_sizes: Vec<Size>,
    current_size: Option<Size>,
    current_thumbnail_size: Option<Size>,
    quality: EncodingQuality,
    aspect_ratio: f32,
}

impl ImageEncoderControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn supported_resolutions(&self) -> &[Size] {
        &self.available_sizes
    }

    pub fn supported_thumbnail_resolutions(&self) -> &[Size] {
        &self.available_thumbnail_sizes
    }

    pub fn current_size(&self) -> Option<Size> {
        self.current_size
    }

    pub fn current_thumbnail_size(&self) -> Option<Size> {
        self.current_thumbnail_size
    }

    pub fn quality(&self) -> EncodingQuality {
        self.quality
    }

    /// Ratio behind the last size picked by [`Self::choose_optimal_size`].
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn image_settings(&self) -> ImageEncoderSettings {
        ImageEncoderSettings {
            quality: Some(self.quality),
            resolution: self.current_size,
        }
    }

    /// Reads the hardware's capabilities once per session and pushes any
    /// selection staged while detached.
    pub fn init(&mut self, ctx: &mut ControlContext<'_>) {
        let Some(driver) = ctx.driver() else {
            return;
        };

        if self.available_sizes.is_empty() {
            let sizes = &mut self.available_sizes;
            driver.enumerate_picture_sizes(&mut |size| push_unique(sizes, size));
            let thumbnails = &mut self.available_thumbnail_sizes;
            driver.enumerate_thumbnail_sizes(&mut |size| push_unique(thumbnails, size));
        }

        self.quality = EncodingQuality::from_jpeg_quality(driver.jpeg_quality());

        if let Some(size) = self.current_size {
            if self.available_sizes.contains(&size) {
                driver.set_picture_size(size);
            } else {
                warn!(%size, "dropping staged picture size the camera does not support");
                self.current_size = None;
            }
        }

        if let Some(size) = self.current_thumbnail_size {
            if self.available_thumbnail_sizes.contains(&size) {
                driver.set_thumbnail_size(size);
            } else {
                warn!(%size, "dropping staged thumbnail size the camera does not support");
                self.current_thumbnail_size = None;
            }
        }

        debug!(
            sizes = self.available_sizes.len(),
            thumbnails = self.available_thumbnail_sizes.len(),
            quality = ?self.quality,
            "image encoder attached"
        );
    }

    pub fn choose_optimal_size(
        &mut self,
        sizes: &[Size],
        facing: CameraFacing,
        screen_ratio: Option<f32>,
    ) -> Option<Size> {
        let (size, ratio) = choose_optimal_size(sizes, facing, screen_ratio)?;
        self.aspect_ratio = ratio;
        Some(size)
    }

    /// Selects the picture size. Without hardware the size is only staged;
    /// with hardware it must be one of the supported sizes.
    pub fn set_size(&mut self, size: Size, ctx: &mut ControlContext<'_>) -> Result<(), CameraError> {
        let Some(driver) = ctx.driver() else {
            self.current_size = Some(size);
            return Ok(());
        };

        if !self.available_sizes.contains(&size) {
            warn!(
                %size,
                supported = %format_sizes(&self.available_sizes),
                "picture size is not supported by the camera"
            );
            return Err(CameraError::unsupported(format!("picture size {size}")));
        }

        self.current_size = Some(size);
        driver.set_picture_size(size);
        Ok(())
    }

    pub fn set_thumbnail_size(
        &mut self,
        size: Size,
        ctx: &mut ControlContext<'_>,
    ) -> Result<(), CameraError> {
        let Some(driver) = ctx.driver() else {
            self.current_thumbnail_size = Some(size);
            return Ok(());
        };

        if !self.available_thumbnail_sizes.contains(&size) {
            warn!(
                %size,
                supported = %format_sizes(&self.available_thumbnail_sizes),
                "thumbnail size is not supported by the camera"
            );
            return Err(CameraError::unsupported(format!("thumbnail size {size}")));
        }

        self.current_thumbnail_size = Some(size);
        driver.set_thumbnail_size(size);
        Ok(())
    }

    pub fn set_quality(&mut self, quality: EncodingQuality, ctx: &mut ControlContext<'_>) {
        self.quality = quality;
        if let Some(driver) = ctx.driver() {
            driver.set_jpeg_quality(quality.to_jpeg_quality());
        }
    }

    pub fn set_image_settings(
        &mut self,
        settings: ImageEncoderSettings,
        ctx: &mut ControlContext<'_>,
    ) -> Result<(), CameraError> {
        if let Some(quality) = settings.quality {
            self.set_quality(quality, ctx);
        }
        match settings.resolution {
            Some(size) => self.set_size(size, ctx),
            None => Ok(()),
        }
    }

    /// Re-pushes the selected sizes, e.g. after the camera left video mode.
    pub fn enable_photo_mode(&mut self, ctx: &mut ControlContext<'_>) {
        let Some(size) = self.current_size.filter(Size::is_valid) else {
            return;
        };
        let Some(driver) = ctx.driver() else {
            return;
        };
        driver.set_picture_size(size);
        if let Some(thumbnail) = self.current_thumbnail_size {
            driver.set_thumbnail_size(thumbnail);
        }
    }

    /// Forgets everything learned from the hardware; used on camera switch.
    pub fn reset_all_settings(&mut self) {
        self.available_sizes.clear();
        self.available_thumbnail_sizes.clear();
        self.current_size = None;
        self.current_thumbnail_size = None;
    }
}

fn push_unique(sizes: &mut Vec<Size>, size: Size) {
    if !sizes.contains(&size) {
        sizes.push(size);
    }
}

fn format_sizes(sizes: &[Size]) -> String {
    sizes
        .iter()
        .map(Size::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{CameraEvent, event_channel};
    use std::sync::mpsc::Receiver;

    fn sizes() -> Vec<Size> {
        vec![
            Size::new(1920, 1080),
            Size::new(1280, 960),
            Size::new(640, 480),
        ]
    }

    fn sink() -> (crate::shared::EventSink, Receiver<CameraEvent>) {
        event_channel(8)
    }

    #[test]
    fn back_camera_prefers_wide_sizes() {
        let chosen = choose_optimal_size(&sizes(), CameraFacing::Back, None);
        assert_eq!(chosen.map(|(s, _)| s), Some(Size::new(1920, 1080)));
    }

    #[test]
    fn front_camera_prefers_four_by_three() {
        let chosen = choose_optimal_size(&sizes(), CameraFacing::Front, None);
        assert_eq!(chosen.map(|(s, _)| s), Some(Size::new(1280, 960)));
    }

    #[test]
    fn ratio_priority_beats_resolution() {
        let sizes = [Size::new(4000, 3000), Size::new(1280, 720)];
        let chosen = choose_optimal_size(&sizes, CameraFacing::Back, None);
        assert_eq!(chosen.map(|(s, _)| s), Some(Size::new(1280, 720)));
    }

    #[test]
    fn screen_ratio_goes_first_for_the_back_camera() {
        let sizes = [Size::new(1920, 1080), Size::new(2160, 1080)];
        let chosen = choose_optimal_size(&sizes, CameraFacing::Back, Some(2.0));
        assert_eq!(chosen.map(|(s, _)| s), Some(Size::new(2160, 1080)));

        let ratios = prioritized_aspect_ratios(CameraFacing::Back, Some(16.0 / 9.0));
        assert_eq!(ratios.len(), 4, "screen ratio duplicates 16:9");
        let ratios = prioritized_aspect_ratios(CameraFacing::Front, Some(2.0));
        assert_eq!(ratios, FRONT_ASPECT_RATIOS.to_vec());
    }

    #[test]
    fn no_matching_ratio_yields_nothing() {
        let sizes = [Size::new(1000, 100)];
        assert!(choose_optimal_size(&sizes, CameraFacing::Back, None).is_none());
        assert!(choose_optimal_size(&[], CameraFacing::Front, None).is_none());
    }

    #[test]
    fn control_remembers_the_chosen_ratio() {
        let mut encoder = ImageEncoderControl::new();
        let size = encoder.choose_optimal_size(&sizes(), CameraFacing::Front, None);
        assert_eq!(size, Some(Size::new(1280, 960)));
        assert!((encoder.aspect_ratio() - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn quality_round_trips_through_percentages() {
        for quality in [
            EncodingQuality::VeryLow,
            EncodingQuality::Low,
            EncodingQuality::Normal,
            EncodingQuality::High,
            EncodingQuality::VeryHigh,
        ] {
            assert_eq!(
                EncodingQuality::from_jpeg_quality(quality.to_jpeg_quality()),
                quality
            );
        }
        assert_eq!(EncodingQuality::VeryLow.to_jpeg_quality(), 40);
        assert_eq!(EncodingQuality::Normal.to_jpeg_quality(), 80);
        assert_eq!(EncodingQuality::VeryHigh.to_jpeg_quality(), 100);
        assert_eq!(EncodingQuality::from_jpeg_quality(75), EncodingQuality::Normal);
        assert_eq!(EncodingQuality::from_jpeg_quality(95), EncodingQuality::VeryHigh);
    }

    #[test]
    fn detached_set_size_stages_without_validation() {
        let (events, _rx) = sink();
        let mut ctx = ControlContext::detached(&events, CameraFacing::Back);
        let mut encoder = ImageEncoderControl::new();

        assert!(encoder.set_size(Size::new(123, 45), &mut ctx).is_ok());
        assert_eq!(encoder.current_size(), Some(Size::new(123, 45)));
        assert!(encoder.set_thumbnail_size(Size::new(9, 9), &mut ctx).is_ok());
        assert_eq!(encoder.current_thumbnail_size(), Some(Size::new(9, 9)));
    }

    #[test]
    fn reset_forgets_selection() {
        let (events, _rx) = sink();
        let mut ctx = ControlContext::detached(&events, CameraFacing::Back);
        let mut encoder = ImageEncoderControl::new();
        encoder.set_size(Size::new(640, 480), &mut ctx).unwrap();
        encoder.reset_all_settings();
        assert_eq!(encoder.current_size(), None);
        assert!(encoder.supported_resolutions().is_empty());
    }
}
