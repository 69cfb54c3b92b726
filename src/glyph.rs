//! Glyph objects: cached 1-bit character cells stencilled onto the current
//! render target in the text color.

use alloc::vec::Vec;

use crate::convert::glyph_to_mono;
use crate::dc::{DcId, Rop, SurfaceId};
use crate::error::RasterError;
use crate::gdi::Gdi;
use crate::pixel::PixelFormat;
use crate::rect::Rect;

/// A glyph shape with its monochrome stencil surface.
#[derive(Debug)]
pub struct GlyphObject {
    cx: u32,
    cy: u32,
    mask: Vec<u8>,
    dc: DcId,
    surface: SurfaceId,
}

impl GlyphObject {
    /// Build the stencil for a `cx`x`cy` cell from its 1-bit `mask`.
    ///
    /// Mask rows are MSB first and padded to whole bytes. The mask is owned
    /// from here on and dropped with the error if creation fails.
    pub fn new(gdi: &mut Gdi, cx: u32, cy: u32, mask: Vec<u8>) -> Result<Self, RasterError> {
        let mono = glyph_to_mono(cx, cy, &mask)?;
        let surface = gdi.create_surface_from_bytes(cx, cy, PixelFormat::Mono, &mono)?;
        let dc = gdi.create_dc();
        if let Err(e) = gdi.select_object(dc, Some(surface)) {
            gdi.delete_dc(dc);
            gdi.delete_surface(surface);
            return Err(e);
        }
        Ok(Self {
            cx,
            cy,
            mask,
            dc,
            surface,
        })
    }

    pub fn cx(&self) -> u32 {
        self.cx
    }

    pub fn cy(&self) -> u32 {
        self.cy
    }

    /// The 1-bit mask as received.
    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    pub fn dc(&self) -> DcId {
        self.dc
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// Start a run of glyphs inside (`x`, `y`, `w`, `h`) on the current
    /// render target.
    ///
    /// `bg` and `fg` are wire colors. They become the back and text colors
    /// of the target context; the clip is set to the run's rectangle. Unless
    /// `op_redundant`, the rectangle is filled with `fg`.
    #[allow(clippy::too_many_arguments)]
    pub fn begin_draw(
        gdi: &mut Gdi,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        bg: u32,
        fg: u32,
        op_redundant: bool,
    ) -> Result<(), RasterError> {
        let target = gdi.drawing();
        let format = gdi.dc_ref(target)?.format();
        let bg = gdi.decode_color(bg, format)?;
        let fg = gdi.decode_color(fg, format)?;

        let state = gdi.dc_state_mut(target)?;
        state.set_clip(x, y, w, h);
        state.set_back_color(bg);
        state.set_text_color(fg);

        if !op_redundant {
            gdi.fill_rect(target, &Rect::from_xywh(x, y, w, h), fg)?;
        }
        Ok(())
    }

    /// Draw this glyph at (`x`, `y`), `w`x`h` pixels of it starting at
    /// (`sx`, `sy`).
    ///
    /// Unless `op_redundant`, the cell is first erased with the back color.
    /// Set mask pixels then take the text color; clear ones are left alone.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        gdi: &mut Gdi,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        sx: i32,
        sy: i32,
        op_redundant: bool,
    ) -> Result<(), RasterError> {
        let target = gdi.drawing();
        let (back, text) = {
            let state = gdi.dc_ref(target)?;
            (state.back_color(), state.text_color())
        };

        if !op_redundant {
            let erase = erase_rect(x, y, w, h);
            if !erase.is_empty() {
                gdi.fill_rect(target, &erase, back)?;
            }
        }

        let prev = gdi.dc_state_mut(target)?.set_brush(text);
        let result = gdi.bit_blt(target, x, y, w, h, self.dc, sx, sy, Rop::StencilWithBrush);
        gdi.dc_state_mut(target)?.set_brush(prev);
        result
    }

    /// Finish a glyph run: drop the clip set by
    /// [`begin_draw`](Self::begin_draw).
    pub fn end_draw(gdi: &mut Gdi) -> Result<(), RasterError> {
        let target = gdi.drawing();
        gdi.dc_state_mut(target)?.clear_clip();
        Ok(())
    }

    /// Release the stencil surface and context. A render target pointing at
    /// this glyph's context falls back to the primary frame buffer.
    pub fn free(self, gdi: &mut Gdi) {
        // Unbinding a live context cannot fail.
        let _ = gdi.select_object(self.dc, None);
        gdi.delete_dc(self.dc);
        gdi.delete_surface(self.surface);
    }
}

/// Cell rectangle with a negative origin clamped to 0.
fn erase_rect(x: i32, y: i32, w: i32, h: i32) -> Rect {
    Rect::new(
        x.max(0),
        y.max(0),
        x.saturating_add(w).saturating_sub(1),
        y.saturating_add(h).saturating_sub(1),
    )
}
