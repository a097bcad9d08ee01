// This is free and unencumbered software released into the public domain.

/// The sensor spans `-FOCUS_FULL_SIZE..=FOCUS_FULL_SIZE` on both axes.
pub const FOCUS_FULL_SIZE: i32 = 1000;

/// Half-width and half-height of a focus region.
pub const FOCUS_REGION_SIZE: i32 = 100;

/// Weight given to regions built from a custom focus point.
pub const FOCUS_REGION_WEIGHT: f32 = 5.0;

/// A point in UI coordinates, `[0, 1]` on both axes, origin top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FocusPoint {
    pub x: f64,
    pub y: f64,
}

impl FocusPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A weighted focus rectangle in hardware coordinates (origin at the
/// sensor center, y pointing up). A weight of zero or less means unset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusRegion {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub weight: f32,
}

impl FocusRegion {
    pub const UNSET: Self = Self {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
        weight: -9.9,
    };

    pub fn is_set(&self) -> bool {
        self.weight > 0.0
    }

    pub fn center(&self) -> (i32, i32) {
        ((self.left + self.right) / 2, (self.top + self.bottom) / 2)
    }
}

impl Default for FocusRegion {
    fn default() -> Self {
        Self::UNSET
    }
}

/// Maps a UI focus point onto a hardware focus region.
pub fn point_to_region(point: FocusPoint) -> FocusRegion {
    let full = f64::from(FOCUS_FULL_SIZE);
    let max_center = FOCUS_FULL_SIZE - FOCUS_REGION_SIZE;

    let center_x = ((point.x * 2.0 * full) - full) as i32;
    let center_x = center_x.clamp(-max_center, max_center);

    // UI y grows downwards, hardware y grows upwards.
    let center_y = (-((point.y * 2.0 * full) - full)) as i32;
    let center_y = center_y.clamp(-max_center, max_center);

    FocusRegion {
        left: center_x - FOCUS_REGION_SIZE,
        right: center_x + FOCUS_REGION_SIZE,
        top: center_y - FOCUS_REGION_SIZE,
        bottom: center_y + FOCUS_REGION_SIZE,
        weight: FOCUS_REGION_WEIGHT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_point_maps_to_sensor_center() {
        let region = point_to_region(FocusPoint::new(0.5, 0.5));
        assert_eq!(
            region,
            FocusRegion {
                left: -100,
                top: -100,
                right: 100,
                bottom: 100,
                weight: 5.0,
            }
        );
    }

    #[test]
    fn vertical_axis_is_inverted() {
        let top = point_to_region(FocusPoint::new(0.5, 0.25));
        assert_eq!(top.center(), (0, 500));
        let bottom = point_to_region(FocusPoint::new(0.5, 0.75));
        assert_eq!(bottom.center(), (0, -500));
    }

    #[test]
    fn corners_are_clamped_inside_the_sensor() {
        let top_left = point_to_region(FocusPoint::new(0.0, 0.0));
        assert_eq!(top_left.center(), (-900, 900));
        assert_eq!(top_left.left, -1000);
        assert_eq!(top_left.bottom, 1000);

        let bottom_right = point_to_region(FocusPoint::new(1.0, 1.0));
        assert_eq!(bottom_right.center(), (900, -900));
        assert_eq!(bottom_right.right, 1000);
        assert_eq!(bottom_right.top, -1000);
    }

    #[test]
    fn regions_stay_in_bounds_with_fixed_extent() {
        for i in 0..=40 {
            for j in 0..=40 {
                let point = FocusPoint::new(i as f64 / 40.0, j as f64 / 40.0);
                let region = point_to_region(point);
                assert_eq!(region.right - region.left, 200, "{point:?}");
                assert_eq!(region.bottom - region.top, 200, "{point:?}");
                for v in [region.left, region.right, region.top, region.bottom] {
                    assert!((-1000..=1000).contains(&v), "{point:?} -> {region:?}");
                }
                assert!(region.is_set());
            }
        }
    }

    #[test]
    fn unset_region_is_a_sentinel() {
        assert!(!FocusRegion::UNSET.is_set());
        assert!(!FocusRegion::default().is_set());
    }
}
