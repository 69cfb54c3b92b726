//! The raster context: surfaces, device contexts, palette and the current
//! render target.

use alloc::format;
use alloc::vec::Vec;

use enough::Unstoppable;

use crate::arena::Arena;
use crate::buffer::{PixelBuffer, checked_len};
use crate::codec::Codecs;
use crate::convert::{self, Flip, Plane, PlaneMut};
use crate::dc::{DcId, DeviceContext, Rop, SurfaceId};
use crate::error::RasterError;
use crate::palette::Palette;
use crate::pixel::PixelFormat;
use crate::rect::{BlitRegion, Rect, clip_blit};
use crate::settings::GdiSettings;

/// A surface and the context bound to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target {
    pub dc: DcId,
    pub surface: SurfaceId,
}

/// Software GDI for one session.
///
/// Owns the primary frame buffer plus every surface and device context
/// created for bitmap and glyph objects, the palette, the decode engines and
/// the render-target selector. All drawing goes through `&mut Gdi`, so only
/// one caller issues orders at a time; a multi-threaded client wraps the
/// whole context in a lock held across "redirect, draw, redirect back".
pub struct Gdi {
    pub(crate) settings: GdiSettings,
    pub(crate) palette: Palette,
    pub(crate) codecs: Codecs,
    surfaces: Arena<SurfaceId, PixelBuffer>,
    dcs: Arena<DcId, DeviceContext>,
    primary: Target,
    drawing: DcId,
    frame_width: u32,
    frame_height: u32,
    frame_format: PixelFormat,
}

impl core::fmt::Debug for Gdi {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Gdi")
            .field("frame_width", &self.frame_width)
            .field("frame_height", &self.frame_height)
            .field("frame_format", &self.frame_format)
            .field("surfaces", &self.surfaces.len())
            .field("dcs", &self.dcs.len())
            .field("primary", &self.primary)
            .field("drawing", &self.drawing)
            .field("codecs", &self.codecs)
            .finish_non_exhaustive()
    }
}

impl Gdi {
    /// Create a context with a zeroed `width`x`height` frame buffer.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        settings: GdiSettings,
    ) -> Result<Self, RasterError> {
        let len = checked_len(width, height, format)?;
        settings.limits.check_surface(width, height, len)?;
        let frame = PixelBuffer::new(width, height, format)?;

        let mut surfaces = Arena::new();
        let mut dcs = Arena::new();
        let surface = surfaces.insert(frame);
        let mut dc = DeviceContext::new(format);
        dc.select(Some(surface));
        let dc = dcs.insert(dc);
        log::debug!("gdi: {width}x{height} {format:?} frame buffer");

        Ok(Self {
            settings,
            palette: Palette::default(),
            codecs: Codecs::default(),
            surfaces,
            dcs,
            primary: Target { dc, surface },
            drawing: dc,
            frame_width: width,
            frame_height: height,
            frame_format: format,
        })
    }

    /// Replace the decode engines.
    pub fn with_codecs(mut self, codecs: Codecs) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn codecs_mut(&mut self) -> &mut Codecs {
        &mut self.codecs
    }

    pub fn settings(&self) -> &GdiSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut GdiSettings {
        &mut self.settings
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut Palette {
        &mut self.palette
    }

    /// Pixel format of the frame buffer, which is also the target format
    /// of every bitmap.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.frame_format
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.frame_width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.frame_height
    }

    /// Bytes per frame buffer row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.frame_width as usize * self.frame_format.bytes_per_pixel()
    }

    pub fn primary(&self) -> Target {
        self.primary
    }

    /// The primary frame buffer.
    pub fn frame_buffer(&self) -> Result<&PixelBuffer, RasterError> {
        self.surface_ref(self.primary.surface)
    }

    // ── Render-target redirection ───────────────────────────────────

    /// Context that bitmap paints and glyph draws currently target.
    #[inline]
    pub fn drawing(&self) -> DcId {
        self.drawing
    }

    /// Point the render target at `dc`.
    pub fn set_drawing(&mut self, dc: DcId) -> Result<(), RasterError> {
        self.dc_ref(dc)?;
        self.drawing = dc;
        Ok(())
    }

    pub fn redirect_to_primary(&mut self) {
        self.drawing = self.primary.dc;
    }

    // ── Surfaces ────────────────────────────────────────────────────

    /// Validate geometry against the hard size ceiling and the configured
    /// limits, then allocate.
    pub(crate) fn alloc_buffer(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<PixelBuffer, RasterError> {
        let len = checked_len(width, height, format)?;
        self.settings.limits.check_surface(width, height, len)?;
        PixelBuffer::new(width, height, format)
    }

    /// Create a zeroed surface.
    pub fn create_surface(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<SurfaceId, RasterError> {
        let buf = self.alloc_buffer(width, height, format)?;
        Ok(self.surfaces.insert(buf))
    }

    /// Create a surface from bytes already in `format`.
    pub fn create_surface_from_bytes(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        bytes: &[u8],
    ) -> Result<SurfaceId, RasterError> {
        let len = checked_len(width, height, format)?;
        self.settings.limits.check_surface(width, height, len)?;
        let buf = PixelBuffer::from_bytes(width, height, format, bytes)?;
        Ok(self.surfaces.insert(buf))
    }

    pub(crate) fn insert_surface(&mut self, buf: PixelBuffer) -> SurfaceId {
        self.surfaces.insert(buf)
    }

    /// Swap in new contents for an existing surface; handles stay valid.
    pub(crate) fn replace_surface(
        &mut self,
        id: SurfaceId,
        buf: PixelBuffer,
    ) -> Result<PixelBuffer, RasterError> {
        if id == self.primary.surface {
            return Err(RasterError::precondition("primary surface cannot be replaced"));
        }
        let slot = self
            .surfaces
            .get_mut(id)
            .ok_or_else(|| RasterError::precondition("stale surface handle"))?;
        Ok(core::mem::replace(slot, buf))
    }

    /// Release a surface. The primary frame buffer is never released.
    ///
    /// Contexts still selecting the surface keep a dangling handle that
    /// fails every later draw with `PreconditionViolation`.
    pub fn delete_surface(&mut self, id: SurfaceId) -> Option<PixelBuffer> {
        if id == self.primary.surface {
            return None;
        }
        self.surfaces.remove(id)
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&PixelBuffer> {
        self.surfaces.get(id)
    }

    pub fn surface_mut(&mut self, id: SurfaceId) -> Option<&mut PixelBuffer> {
        self.surfaces.get_mut(id)
    }

    fn surface_ref(&self, id: SurfaceId) -> Result<&PixelBuffer, RasterError> {
        self.surfaces
            .get(id)
            .ok_or_else(|| RasterError::precondition("stale surface handle"))
    }

    // ── Device contexts ─────────────────────────────────────────────

    /// Create a context compatible with the frame buffer and nothing
    /// selected.
    pub fn create_dc(&mut self) -> DcId {
        self.dcs.insert(DeviceContext::new(self.frame_format))
    }

    /// Release a context. If it was the render target, the target falls
    /// back to the primary. The primary context is never released.
    pub fn delete_dc(&mut self, dc: DcId) -> Option<DeviceContext> {
        if dc == self.primary.dc {
            return None;
        }
        if self.drawing == dc {
            self.redirect_to_primary();
        }
        self.dcs.remove(dc)
    }

    pub fn dc(&self, dc: DcId) -> Option<&DeviceContext> {
        self.dcs.get(dc)
    }

    pub fn dc_mut(&mut self, dc: DcId) -> Option<&mut DeviceContext> {
        self.dcs.get_mut(dc)
    }

    pub(crate) fn dc_ref(&self, dc: DcId) -> Result<&DeviceContext, RasterError> {
        self.dcs
            .get(dc)
            .ok_or_else(|| RasterError::precondition("stale device context handle"))
    }

    pub(crate) fn dc_state_mut(&mut self, dc: DcId) -> Result<&mut DeviceContext, RasterError> {
        self.dcs
            .get_mut(dc)
            .ok_or_else(|| RasterError::precondition("stale device context handle"))
    }

    /// Bind `surface` to `dc` (or unbind with `None`), returning what was
    /// bound before. The context takes the surface's format.
    pub fn select_object(
        &mut self,
        dc: DcId,
        surface: Option<SurfaceId>,
    ) -> Result<Option<SurfaceId>, RasterError> {
        let format = match surface {
            Some(id) => Some(self.surface_ref(id)?.format()),
            None => None,
        };
        let state = self.dc_state_mut(dc)?;
        if let Some(format) = format {
            state.set_format(format);
        }
        Ok(state.select(surface))
    }

    fn selected_surface(&self, dc: DcId) -> Result<SurfaceId, RasterError> {
        self.dc_ref(dc)?
            .selected()
            .ok_or_else(|| RasterError::precondition("no surface selected"))
    }

    // ── Drawing primitives ──────────────────────────────────────────

    /// Resolve a wire color, packed in the server's color depth, into
    /// `format` through the palette.
    pub fn decode_color(&self, color: u32, format: PixelFormat) -> Result<u32, RasterError> {
        let depth = self.settings.color_depth;
        let src = wire_color_format(depth).ok_or_else(|| {
            RasterError::UnsupportedFormat(format!("color depth {depth}"))
        })?;
        Ok(src.convert(color & wire_color_mask(depth), format, &self.palette))
    }

    /// Fill `rect` with a packed `color` on the surface bound to `dc`,
    /// clipped to the surface and the context's clip rectangle.
    pub fn fill_rect(&mut self, dc: DcId, rect: &Rect, color: u32) -> Result<(), RasterError> {
        let surface = self.selected_surface(dc)?;
        let clip = self.dc_ref(dc)?.clip().copied();
        let buf = self
            .surfaces
            .get_mut(surface)
            .ok_or_else(|| RasterError::precondition("stale surface handle"))?;

        let Some(mut area) = rect.intersect(&buf.bounds()) else {
            return Ok(());
        };
        if let Some(clip) = clip {
            match area.intersect(&clip) {
                Some(r) => area = r,
                None => return Ok(()),
            }
        }
        convert::fill(
            buf.as_plane_mut(),
            area.left as u32,
            area.top as u32,
            area.width(),
            area.height(),
            color,
        )
    }

    /// Blit `w`x`h` pixels from (`sx`, `sy`) on `src`'s surface to
    /// (`x`, `y`) on `dst`'s surface.
    ///
    /// The destination rectangle is clipped to the destination surface, the
    /// destination context's clip rectangle and the source surface; what
    /// remains may be empty, which is not an error.
    #[allow(clippy::too_many_arguments)]
    pub fn bit_blt(
        &mut self,
        dst: DcId,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        src: DcId,
        sx: i32,
        sy: i32,
        rop: Rop,
    ) -> Result<(), RasterError> {
        let dst_surface = self.selected_surface(dst)?;
        let src_surface = self.selected_surface(src)?;
        let (clip, brush) = {
            let state = self.dc_ref(dst)?;
            (state.clip().copied(), state.brush())
        };
        let dst_size = {
            let b = self.surface_ref(dst_surface)?;
            (b.width(), b.height())
        };
        let src_size = {
            let b = self.surface_ref(src_surface)?;
            (b.width(), b.height())
        };

        let Some(region) = clip_blit(dst_size, clip.as_ref(), x, y, w, h, src_size, sx, sy)
        else {
            log::trace!("bit_blt: nothing left after clipping");
            return Ok(());
        };

        if dst_surface == src_surface {
            let (snapshot, format, stride) = {
                let buf = self.surface_ref(src_surface)?;
                (snapshot_rows(buf, region.src_y, region.height)?, buf.format(), buf.stride())
            };
            let src = Plane {
                data: &snapshot,
                format,
                stride,
            };
            let region = BlitRegion { src_y: 0, ..region };
            let dst_buf = self
                .surfaces
                .get_mut(dst_surface)
                .ok_or_else(|| RasterError::precondition("stale surface handle"))?;
            blit_planes(dst_buf.as_plane_mut(), src, &region, rop, brush, &self.palette)
        } else {
            let (src_buf, dst_buf) = self
                .surfaces
                .get_pair(src_surface, dst_surface)
                .ok_or_else(|| RasterError::precondition("stale surface handle"))?;
            blit_planes(
                dst_buf.as_plane_mut(),
                src_buf.as_plane(),
                &region,
                rop,
                brush,
                &self.palette,
            )
        }
    }
}

/// Copy of the `height` rows starting at `top`, for blits whose source and
/// destination share a surface.
fn snapshot_rows(buf: &PixelBuffer, top: u32, height: u32) -> Result<Vec<u8>, RasterError> {
    let stride = buf.stride();
    let start = top as usize * stride;
    let len = height as usize * stride;
    let rows = buf
        .data()
        .get(start..start + len)
        .ok_or_else(|| RasterError::precondition("blit source outside surface"))?;
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| RasterError::AllocationFailure(len))?;
    out.extend_from_slice(rows);
    Ok(out)
}

fn blit_planes(
    dst: PlaneMut<'_>,
    src: Plane<'_>,
    region: &BlitRegion,
    rop: Rop,
    brush: u32,
    palette: &Palette,
) -> Result<(), RasterError> {
    match rop {
        Rop::Copy => convert::image_copy(dst, src, region, palette, Flip::None, &Unstoppable),
        Rop::StencilWithBrush => stencil(dst, src, region, brush),
    }
}

/// Write `brush` wherever the source pixel is non-zero.
fn stencil(
    dst: PlaneMut<'_>,
    src: Plane<'_>,
    region: &BlitRegion,
    brush: u32,
) -> Result<(), RasterError> {
    let sbpp = src.format.bytes_per_pixel();
    let dbpp = dst.format.bytes_per_pixel();
    let width = region.width as usize;
    for i in 0..region.height as usize {
        let s_start = (region.src_y as usize + i) * src.stride + region.src_x as usize * sbpp;
        let d_start = (region.dst_y as usize + i) * dst.stride + region.dst_x as usize * dbpp;
        let (Some(s_row), Some(d_row)) = (
            src.data.get(s_start..s_start + width * sbpp),
            dst.data.get_mut(d_start..d_start + width * dbpp),
        ) else {
            return Err(RasterError::precondition("stencil region outside surface"));
        };
        for (s, d) in s_row.chunks_exact(sbpp).zip(d_row.chunks_exact_mut(dbpp)) {
            if src.format.read(s) != 0 {
                dst.format.write(brush, d);
            }
        }
    }
    Ok(())
}

/// Format of colors carried in orders at a given server depth.
///
/// Order colors are three bytes R, G, B read little-endian, so at 32 bits
/// the packed value is `0x00BBGGRR`.
fn wire_color_format(depth: u32) -> Option<PixelFormat> {
    match depth {
        32 => Some(PixelFormat::Xbgr32),
        other => PixelFormat::from_wire_depth(other),
    }
}

fn wire_color_mask(depth: u32) -> u32 {
    match depth {
        32 | 24 => 0x00FF_FFFF,
        16 => 0xFFFF,
        15 => 0x7FFF,
        _ => 0xFF,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gdi(w: u32, h: u32) -> Gdi {
        Gdi::new(w, h, PixelFormat::Bgrx32, GdiSettings::default()).unwrap()
    }

    #[test]
    fn primary_is_the_initial_target() {
        let g = gdi(8, 8);
        assert_eq!(g.drawing(), g.primary().dc);
        assert_eq!(
            g.dc(g.primary().dc).unwrap().selected(),
            Some(g.primary().surface)
        );
        assert_eq!(g.stride(), 32);
    }

    #[test]
    fn primary_cannot_be_deleted() {
        let mut g = gdi(4, 4);
        let p = g.primary();
        assert!(g.delete_surface(p.surface).is_none());
        assert!(g.delete_dc(p.dc).is_none());
        assert!(g.frame_buffer().is_ok());
    }

    #[test]
    fn decode_color_32bpp_wire() {
        let g = gdi(1, 1);
        // wire red is 0x0000FF
        let red = g.decode_color(0x0000FF, PixelFormat::Bgrx32).unwrap();
        let mut px = [0u8; 4];
        PixelFormat::Bgrx32.write(red, &mut px);
        assert_eq!(px, [0, 0, 0xFF, 0xFF]);
    }

    #[test]
    fn decode_color_indexed_wire() {
        let mut g = Gdi::new(
            1,
            1,
            PixelFormat::Rgb24,
            GdiSettings::new().with_color_depth(8),
        )
        .unwrap();
        g.palette_mut().set(9, rgb::RGBA8::new(1, 2, 3, 255));
        assert_eq!(g.decode_color(9, PixelFormat::Rgb24).unwrap(), 0x010203);
    }

    #[test]
    fn decode_color_unknown_depth() {
        let g = Gdi::new(
            1,
            1,
            PixelFormat::Rgb24,
            GdiSettings::new().with_color_depth(4),
        )
        .unwrap();
        assert!(matches!(
            g.decode_color(0, PixelFormat::Rgb24),
            Err(RasterError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn fill_respects_clip() {
        let mut g = gdi(4, 4);
        let dc = g.primary().dc;
        g.dc_mut(dc).unwrap().set_clip(1, 1, 2, 2);
        g.fill_rect(dc, &Rect::new(-10, -10, 10, 10), 0x11223344)
            .unwrap();
        let fb = g.frame_buffer().unwrap();
        for y in 0..4 {
            for x in 0..4 {
                let inside = (1..3).contains(&x) && (1..3).contains(&y);
                let expect = if inside { 0x11223344 } else { 0 };
                assert_eq!(fb.pixel(x, y), Some(expect), "({x},{y})");
            }
        }
    }

    #[test]
    fn inverted_fill_is_noop() {
        let mut g = gdi(4, 4);
        let dc = g.primary().dc;
        g.fill_rect(dc, &Rect::new(3, 0, 1, 3), 0xFFFFFFFF).unwrap();
        assert!(g.frame_buffer().unwrap().data().iter().all(|&b| b == 0));
    }

    #[test]
    fn stale_surface_fails_cleanly() {
        let mut g = gdi(4, 4);
        let s = g.create_surface(2, 2, PixelFormat::Bgrx32).unwrap();
        let dc = g.create_dc();
        g.select_object(dc, Some(s)).unwrap();
        assert!(g.delete_surface(s).is_some());
        let err = g
            .bit_blt(g.primary().dc, 0, 0, 2, 2, dc, 0, 0, Rop::Copy)
            .unwrap_err();
        assert!(matches!(err, RasterError::PreconditionViolation(_)));
        assert!(matches!(
            g.select_object(dc, Some(s)),
            Err(RasterError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn blit_onto_same_surface_uses_snapshot() {
        let mut g = gdi(4, 1);
        let dc = g.primary().dc;
        {
            let fb = g.surface_mut(g.primary().surface).unwrap();
            for x in 0..4 {
                fb.set_pixel(x, 0, x + 1);
            }
        }
        g.bit_blt(dc, 1, 0, 3, 1, dc, 0, 0, Rop::Copy).unwrap();
        let fb = g.frame_buffer().unwrap();
        let row: Vec<u32> = (0..4).map(|x| fb.pixel(x, 0).unwrap()).collect();
        assert_eq!(row, [1, 1, 2, 3]);
    }

    #[test]
    fn overlapping_rows_on_same_surface() {
        let mut g = gdi(2, 4);
        let dc = g.primary().dc;
        {
            let fb = g.surface_mut(g.primary().surface).unwrap();
            for y in 0..4 {
                fb.set_pixel(0, y, y + 1);
                fb.set_pixel(1, y, 0x10 * (y + 1));
            }
        }
        // rows 1..=2 shift down by one, column 1 only
        g.bit_blt(dc, 1, 2, 1, 2, dc, 1, 1, Rop::Copy).unwrap();
        let fb = g.frame_buffer().unwrap();
        let col0: Vec<u32> = (0..4).map(|y| fb.pixel(0, y).unwrap()).collect();
        let col1: Vec<u32> = (0..4).map(|y| fb.pixel(1, y).unwrap()).collect();
        assert_eq!(col0, [1, 2, 3, 4]);
        assert_eq!(col1, [0x10, 0x20, 0x20, 0x30]);
    }

    #[test]
    fn snapshot_covers_only_requested_rows() {
        let mut buf = PixelBuffer::new(2, 4, PixelFormat::Rgb8).unwrap();
        buf.data_mut().copy_from_slice(&[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(snapshot_rows(&buf, 1, 2).unwrap(), [2, 3, 4, 5]);
        assert!(matches!(
            snapshot_rows(&buf, 3, 2),
            Err(RasterError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn delete_drawing_dc_falls_back_to_primary() {
        let mut g = gdi(4, 4);
        let dc = g.create_dc();
        g.set_drawing(dc).unwrap();
        assert_eq!(g.drawing(), dc);
        g.delete_dc(dc);
        assert_eq!(g.drawing(), g.primary().dc);
        assert!(g.set_drawing(dc).is_err());
    }

    #[test]
    fn limits_apply_to_surfaces() {
        let settings = GdiSettings::new().with_limits(crate::Limits {
            max_width: Some(16),
            ..Default::default()
        });
        let mut g = Gdi::new(16, 16, PixelFormat::Bgrx32, settings).unwrap();
        assert!(matches!(
            g.create_surface(17, 1, PixelFormat::Bgrx32),
            Err(RasterError::LimitExceeded(_))
        ));
    }
}
