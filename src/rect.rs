//! Inclusive rectangles and blit clipping.

/// Rectangle with inclusive edges, as carried by drawing orders.
///
/// A rectangle with `right < left` or `bottom < top` is empty; every
/// consumer treats it as a no-op rather than a huge unsigned extent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle from origin and extent. Non-positive extents yield an
    /// empty rectangle.
    pub fn from_xywh(x: i32, y: i32, w: i32, h: i32) -> Self {
        let right = saturate(i64::from(x) + i64::from(w) - 1);
        let bottom = saturate(i64::from(y) + i64::from(h) - 1);
        Self::new(x, y, right, bottom)
    }

    /// Full-surface rectangle for a `width`x`height` surface.
    pub fn of_size(width: u32, height: u32) -> Self {
        Self::new(
            0,
            0,
            saturate(i64::from(width) - 1),
            saturate(i64::from(height) - 1),
        )
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.right < self.left || self.bottom < self.top
    }

    pub fn width(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (i64::from(self.right) - i64::from(self.left) + 1) as u32
        }
    }

    pub fn height(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (i64::from(self.bottom) - i64::from(self.top) + 1) as u32
        }
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        (!r.is_empty()).then_some(r)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

fn saturate(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// A blit with every coordinate resolved against both surfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlitRegion {
    pub dst_x: u32,
    pub dst_y: u32,
    pub src_x: u32,
    pub src_y: u32,
    pub width: u32,
    pub height: u32,
}

/// Clip a blit of `w`x`h` pixels from (`sx`, `sy`) in a `src_size` surface
/// to (`x`, `y`) in a `dst_size` surface, honoring an optional clip
/// rectangle on the destination.
///
/// Returns `None` when nothing is left to draw.
#[allow(clippy::too_many_arguments)]
pub fn clip_blit(
    dst_size: (u32, u32),
    clip: Option<&Rect>,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    src_size: (u32, u32),
    sx: i32,
    sy: i32,
) -> Option<BlitRegion> {
    let requested = Rect::from_xywh(x, y, w, h);
    if requested.is_empty() {
        return None;
    }
    let mut dst = requested.intersect(&Rect::of_size(dst_size.0, dst_size.1))?;
    if let Some(clip) = clip {
        dst = dst.intersect(clip)?;
    }

    let mut left = i64::from(dst.left);
    let mut top = i64::from(dst.top);
    let right = i64::from(dst.right);
    let bottom = i64::from(dst.bottom);
    let mut src_x = i64::from(sx) + (left - i64::from(x));
    let mut src_y = i64::from(sy) + (top - i64::from(y));

    if src_x < 0 {
        left -= src_x;
        src_x = 0;
    }
    if src_y < 0 {
        top -= src_y;
        src_y = 0;
    }

    let width = (right - left + 1).min(i64::from(src_size.0) - src_x);
    let height = (bottom - top + 1).min(i64::from(src_size.1) - src_y);
    if width <= 0 || height <= 0 {
        return None;
    }

    Some(BlitRegion {
        dst_x: left as u32,
        dst_y: top as u32,
        src_x: src_x as u32,
        src_y: src_y as u32,
        width: width as u32,
        height: height as u32,
    })
}
