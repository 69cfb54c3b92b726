//! Device contexts: per-target drawing state.

use crate::arena::arena_key;
use crate::pixel::PixelFormat;
use crate::rect::Rect;

arena_key!(
    /// Handle to a surface owned by a [`Gdi`](crate::Gdi).
    SurfaceId
);

arena_key!(
    /// Handle to a device context owned by a [`Gdi`](crate::Gdi).
    DcId
);

/// Raster operation for [`Gdi::bit_blt`](crate::Gdi::bit_blt).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Rop {
    /// Destination takes the source pixels, converted to its format.
    #[default]
    Copy,
    /// Destination takes the context's brush color wherever the source pixel
    /// is set; clear source pixels leave the destination untouched.
    StencilWithBrush,
}

/// Drawing state bound to at most one surface.
///
/// Colors are stored as packed values already in the context's format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceContext {
    format: PixelFormat,
    selected: Option<SurfaceId>,
    clip: Option<Rect>,
    brush: u32,
    text_color: u32,
    back_color: u32,
}

impl DeviceContext {
    pub fn new(format: PixelFormat) -> Self {
        Self {
            format,
            selected: None,
            clip: None,
            brush: 0,
            text_color: 0,
            back_color: 0xFFFF_FFFF,
        }
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub(crate) fn set_format(&mut self, format: PixelFormat) {
        self.format = format;
    }

    /// Surface currently bound to this context.
    #[inline]
    pub fn selected(&self) -> Option<SurfaceId> {
        self.selected
    }

    /// Bind `surface`, returning the previously bound one.
    pub(crate) fn select(&mut self, surface: Option<SurfaceId>) -> Option<SurfaceId> {
        core::mem::replace(&mut self.selected, surface)
    }

    #[inline]
    pub fn clip(&self) -> Option<&Rect> {
        self.clip.as_ref()
    }

    /// Restrict drawing to (`x`, `y`, `w`, `h`). A non-positive extent
    /// clips everything away.
    pub fn set_clip(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.clip = Some(Rect::from_xywh(x, y, w, h));
    }

    pub fn clear_clip(&mut self) {
        self.clip = None;
    }

    #[inline]
    pub fn brush(&self) -> u32 {
        self.brush
    }

    pub fn set_brush(&mut self, color: u32) -> u32 {
        core::mem::replace(&mut self.brush, color)
    }

    #[inline]
    pub fn text_color(&self) -> u32 {
        self.text_color
    }

    /// Set the text color, returning the previous one.
    pub fn set_text_color(&mut self, color: u32) -> u32 {
        core::mem::replace(&mut self.text_color, color)
    }

    #[inline]
    pub fn back_color(&self) -> u32 {
        self.back_color
    }

    /// Set the back color, returning the previous one.
    pub fn set_back_color(&mut self, color: u32) -> u32 {
        core::mem::replace(&mut self.back_color, color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_return_previous() {
        let mut dc = DeviceContext::new(PixelFormat::Bgrx32);
        assert_eq!(dc.set_text_color(5), 0);
        assert_eq!(dc.set_text_color(6), 5);
        assert_eq!(dc.set_back_color(1), 0xFFFF_FFFF);
        assert_eq!(dc.back_color(), 1);
    }

    #[test]
    fn clip_lifecycle() {
        let mut dc = DeviceContext::new(PixelFormat::Bgrx32);
        assert!(dc.clip().is_none());
        dc.set_clip(1, 2, 3, 4);
        assert_eq!(dc.clip(), Some(&Rect::new(1, 2, 3, 5)));
        dc.set_clip(0, 0, 0, 4);
        assert!(dc.clip().is_some_and(|r| r.is_empty()));
        dc.clear_clip();
        assert!(dc.clip().is_none());
    }
}
