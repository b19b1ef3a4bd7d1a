use crate::types::Seed;

/// Which renderable primitives the view builder emits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewStyle {
    /// Cylinders (or the configured template) and leaf clusters.
    #[default]
    Solid,
    /// Point markers at every structural joint.
    Skeleton,
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Seed used when persisted state is missing or malformed.
    pub default_seed: Seed,
    pub gravity: f32,
    /// Debris below this height is dropped.
    pub floor_y: f32,
    /// Horizontal launch speed of debris is drawn from `(-spread, spread)`.
    pub debris_linear_spread: f32,
    /// Upward launch speed of debris is drawn from `[0, speed)`.
    pub debris_upward_speed: f32,
    pub debris_angular_spread: f32,
    pub highlight_emissive: u32,
    pub style: ViewStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_seed: 12345,
            gravity: 9.8,
            floor_y: -10.0,
            debris_linear_spread: 1.0,
            debris_upward_speed: 1.0,
            debris_angular_spread: 2.5,
            highlight_emissive: 0xffff00,
            style: ViewStyle::Solid,
        }
    }
}
