use crate::limits::Limits;

/// Session configuration consulted by the raster layer.
///
/// ```
/// use zenraster::{GdiSettings, Limits};
///
/// let settings = GdiSettings::new()
///     .with_color_depth(16)
///     .with_dynamic_color_fidelity(false)
///     .with_limits(Limits {
///         max_pixels: Some(4096 * 4096),
///         ..Default::default()
///     });
/// assert_eq!(settings.color_depth, 16);
/// ```
#[derive(Clone, Debug)]
pub struct GdiSettings {
    /// Server color depth; wire colors in glyph and fill orders are packed
    /// in the format this depth implies.
    pub color_depth: u32,
    /// Display-fidelity flag. When set, the planar engine is told to swap
    /// red and blue before each decode.
    pub allow_dynamic_color_fidelity: bool,
    /// Allocation limits for surfaces created from server geometry.
    pub limits: Limits,
}

impl Default for GdiSettings {
    fn default() -> Self {
        Self {
            color_depth: 32,
            allow_dynamic_color_fidelity: true,
            limits: Limits::default(),
        }
    }
}

impl GdiSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color_depth(mut self, bpp: u32) -> Self {
        self.color_depth = bpp;
        self
    }

    pub fn with_dynamic_color_fidelity(mut self, enabled: bool) -> Self {
        self.allow_dynamic_color_fidelity = enabled;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}
