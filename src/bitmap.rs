//! Bitmap objects: decoded server bitmaps and their paint onto the current
//! render target.

use alloc::format;

use enough::Unstoppable;

use crate::buffer::{PixelBuffer, checked_len};
use crate::codec::{CodecError, CodecId, DecodePath, DecodeTarget};
use crate::convert::{self, Flip, Plane};
use crate::dc::{DcId, Rop, SurfaceId};
use crate::error::RasterError;
use crate::gdi::Gdi;
use crate::pixel::PixelFormat;

/// Pixel bytes handed to [`BitmapObject::new`], top-down and tightly packed.
#[derive(Clone, Copy, Debug)]
pub struct BitmapSource<'a> {
    pub data: &'a [u8],
    pub format: PixelFormat,
}

impl<'a> BitmapSource<'a> {
    pub fn new(data: &'a [u8], format: PixelFormat) -> Self {
        Self { data, format }
    }
}

/// A server bitmap with its own surface and device context.
///
/// Geometry is the inclusive destination rectangle used by
/// [`paint`](Self::paint). The handle is consumed by [`free`](Self::free);
/// dropping it without freeing leaks the surface inside the [`Gdi`] until
/// the context itself is dropped.
#[derive(Debug)]
pub struct BitmapObject {
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
    width: u32,
    height: u32,
    compressed: bool,
    format: PixelFormat,
    dc: DcId,
    surface: SurfaceId,
}

impl BitmapObject {
    /// Create a `width`x`height` bitmap in the frame buffer's format.
    ///
    /// With a `source`, its pixels are converted into the new surface as is,
    /// without a flip. Without one the surface starts zeroed. On failure
    /// nothing stays allocated in `gdi`.
    pub fn new(
        gdi: &mut Gdi,
        width: u32,
        height: u32,
        source: Option<BitmapSource<'_>>,
    ) -> Result<Self, RasterError> {
        let format = gdi.format();
        let mut buf = gdi.alloc_buffer(width, height, format)?;

        if let Some(source) = source {
            convert::convert_image(
                buf.as_plane_mut(),
                Plane::packed(source.data, source.format, width),
                width,
                height,
                gdi.palette(),
                Flip::None,
                &Unstoppable,
            )?;
        }

        let surface = gdi.insert_surface(buf);
        let dc = gdi.create_dc();
        if let Err(e) = gdi.select_object(dc, Some(surface)) {
            gdi.delete_dc(dc);
            gdi.delete_surface(surface);
            return Err(e);
        }
        log::trace!("bitmap: new {width}x{height} {format:?}");

        Ok(Self {
            left: 0,
            top: 0,
            right: width.saturating_sub(1),
            bottom: height.saturating_sub(1),
            width,
            height,
            compressed: false,
            format,
            dc,
            surface,
        })
    }

    /// Set the inclusive destination rectangle.
    pub fn set_rectangle(&mut self, left: u32, top: u32, right: u32, bottom: u32) {
        self.left = left;
        self.top = top;
        self.right = right;
        self.bottom = bottom;
    }

    /// Inclusive destination rectangle as (left, top, right, bottom).
    pub fn rectangle(&self) -> (u32, u32, u32, u32) {
        (self.left, self.top, self.right, self.bottom)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn dc(&self) -> DcId {
        self.dc
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// Decode an update into this bitmap's surface.
    ///
    /// `bpp` is the wire depth of `src`. The update is decoded into a fresh
    /// `width`x`height` buffer in the frame buffer's format, which replaces
    /// the current surface only when decoding succeeds; any failure leaves
    /// the previous pixels in place.
    #[allow(clippy::too_many_arguments)]
    pub fn decompress(
        &mut self,
        gdi: &mut Gdi,
        src: &[u8],
        width: u32,
        height: u32,
        bpp: u32,
        compressed: bool,
        codec_id: CodecId,
    ) -> Result<(), RasterError> {
        let format = gdi.format();
        if let Err(e) = checked_len(width, height, format) {
            log::error!("invalid input data");
            return Err(e);
        }
        let mut buf = gdi.alloc_buffer(width, height, format)?;

        let path = DecodePath::select(compressed, codec_id, bpp);
        log::trace!("bitmap: {width}x{height} bpp {bpp} via {path:?}");
        match path {
            DecodePath::Raw => decode_raw(gdi, src, bpp, &mut buf)?,
            DecodePath::TileImage => {
                let stride = gdi.stride();
                let frame_height = gdi.height();
                let (left, top) = (self.left, self.top);
                let engine = gdi.codecs.tile.as_deref_mut().ok_or_else(|| engine_missing(path))?;
                let target = DecodeTarget {
                    data: buf.data_mut(),
                    format,
                    stride,
                    width,
                    height: frame_height,
                };
                engine
                    .decode(src, left, top, target, &Unstoppable)
                    .map_err(|e| engine_failed(path, e))?;
            }
            DecodePath::WaveletPalette => {
                let mut tmp = gdi.alloc_buffer(width, height, PixelFormat::Xrgb32)?;
                let engine = gdi
                    .codecs
                    .wavelet
                    .as_deref_mut()
                    .ok_or_else(|| engine_missing(path))?;
                engine
                    .decode(src, target_of(&mut tmp), &Unstoppable)
                    .map_err(|e| engine_failed(path, e))?;
                convert::convert_image(
                    buf.as_plane_mut(),
                    tmp.as_plane(),
                    width,
                    height,
                    &gdi.palette,
                    Flip::Vertical,
                    &Unstoppable,
                )?;
            }
            DecodePath::RunLength => {
                let engine = gdi
                    .codecs
                    .run_length
                    .as_deref_mut()
                    .ok_or_else(|| engine_missing(path))?;
                engine
                    .decode(src, bpp, target_of(&mut buf), &gdi.palette, &Unstoppable)
                    .map_err(|e| engine_failed(path, e))?;
            }
            DecodePath::Planar => {
                let swap = gdi.settings.allow_dynamic_color_fidelity;
                let engine = gdi.codecs.planar.as_deref_mut().ok_or_else(|| engine_missing(path))?;
                engine.set_bgr_swap(swap);
                engine
                    .decode(src, target_of(&mut buf), &Unstoppable)
                    .map_err(|e| engine_failed(path, e))?;
            }
        }

        gdi.replace_surface(self.surface, buf)?;
        gdi.select_object(self.dc, Some(self.surface))?;
        self.width = width;
        self.height = height;
        self.compressed = false;
        self.format = format;
        Ok(())
    }

    /// Blit the whole bitmap onto the current render target at its
    /// destination rectangle.
    pub fn paint(&self, gdi: &mut Gdi) -> Result<(), RasterError> {
        if self.right < self.left || self.bottom < self.top {
            return Err(RasterError::precondition(format!(
                "inverted paint rectangle ({}, {})-({}, {})",
                self.left, self.top, self.right, self.bottom
            )));
        }
        let w = extent(self.left, self.right)?;
        let h = extent(self.top, self.bottom)?;
        let x = coord(self.left)?;
        let y = coord(self.top)?;
        gdi.bit_blt(gdi.drawing(), x, y, w, h, self.dc, 0, 0, Rop::Copy)
    }

    /// Point the render target at the primary frame buffer, or at this
    /// bitmap's own context.
    pub fn set_surface(&self, gdi: &mut Gdi, primary: bool) -> Result<(), RasterError> {
        if primary {
            gdi.redirect_to_primary();
            Ok(())
        } else {
            gdi.set_drawing(self.dc)
        }
    }

    /// Release the surface and context. Rendering that targeted this bitmap
    /// falls back to the primary frame buffer.
    pub fn free(self, gdi: &mut Gdi) {
        if gdi.drawing() == self.dc {
            gdi.redirect_to_primary();
        }
        // Unbinding a live context cannot fail.
        let _ = gdi.select_object(self.dc, None);
        gdi.delete_dc(self.dc);
        gdi.delete_surface(self.surface);
        log::trace!("bitmap: freed {}x{}", self.width, self.height);
    }
}

fn decode_raw(
    gdi: &Gdi,
    src: &[u8],
    bpp: u32,
    buf: &mut PixelBuffer,
) -> Result<(), RasterError> {
    let src_format = PixelFormat::from_wire_depth(bpp)
        .ok_or_else(|| RasterError::UnsupportedFormat(format!("wire depth {bpp}")))?;
    let (width, height) = (buf.width(), buf.height());
    let needed = width as usize * height as usize * src_format.bytes_per_pixel();
    if src.len() < needed {
        log::error!("raw bitmap needs {needed} bytes, got {}", src.len());
        return Err(RasterError::DecodeFailure {
            path: DecodePath::Raw,
            source: CodecError::Truncated {
                needed,
                actual: src.len(),
            },
        });
    }
    convert::convert_image(
        buf.as_plane_mut(),
        Plane::packed(src, src_format, width),
        width,
        height,
        &gdi.palette,
        Flip::Vertical,
        &Unstoppable,
    )
    .inspect_err(|e| log::error!("image copy failed: {e}"))
}

fn target_of(buf: &mut PixelBuffer) -> DecodeTarget<'_> {
    let (format, stride, width, height) = (buf.format(), buf.stride(), buf.width(), buf.height());
    DecodeTarget {
        data: buf.data_mut(),
        format,
        stride,
        width,
        height,
    }
}

fn engine_missing(path: DecodePath) -> RasterError {
    log::error!("{path:?} decode failed: no engine registered");
    RasterError::DecodeFailure {
        path,
        source: CodecError::NoEngine,
    }
}

fn engine_failed(path: DecodePath, source: CodecError) -> RasterError {
    log::error!("{path:?} decode failed: {source}");
    RasterError::DecodeFailure { path, source }
}

/// Pixel count of the inclusive span `lo..=hi` as a blit extent.
fn extent(lo: u32, hi: u32) -> Result<i32, RasterError> {
    hi.checked_sub(lo)
        .and_then(|d| d.checked_add(1))
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| RasterError::precondition("paint rectangle too large"))
}

fn coord(v: u32) -> Result<i32, RasterError> {
    i32::try_from(v).map_err(|_| RasterError::precondition("paint origin out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::GdiSettings;

    fn gdi() -> Gdi {
        Gdi::new(8, 8, PixelFormat::Bgra32, GdiSettings::default()).unwrap()
    }

    #[test]
    fn new_defaults_rectangle_to_size() {
        let mut g = gdi();
        let bmp = BitmapObject::new(&mut g, 3, 2, None).unwrap();
        assert_eq!(bmp.rectangle(), (0, 0, 2, 1));
        assert_eq!(bmp.format(), PixelFormat::Bgra32);
        assert!(!bmp.is_compressed());
        bmp.free(&mut g);
    }

    #[test]
    fn new_with_source_keeps_row_order() {
        let mut g = gdi();
        // two rows of 24-bit BGR: blue then red
        let src = [0xFF, 0, 0, 0, 0, 0xFF];
        let bmp =
            BitmapObject::new(&mut g, 1, 2, Some(BitmapSource::new(&src, PixelFormat::Bgr24)))
                .unwrap();
        let buf = g.surface(bmp.surface()).unwrap();
        assert_eq!(buf.row(0).unwrap(), &[0xFF, 0, 0, 0xFF]);
        assert_eq!(buf.row(1).unwrap(), &[0, 0, 0xFF, 0xFF]);
    }

    #[test]
    fn new_failure_leaves_nothing_behind() {
        let mut g = gdi();
        let before = format!("{g:?}");
        let src = [0u8; 3];
        let err =
            BitmapObject::new(&mut g, 2, 2, Some(BitmapSource::new(&src, PixelFormat::Bgr24)))
                .unwrap_err();
        assert!(matches!(err, RasterError::BufferTooSmall { .. }));
        assert_eq!(format!("{g:?}"), before);
    }

    #[test]
    fn extent_rejects_overflow() {
        assert_eq!(extent(0, 0).unwrap(), 1);
        assert!(extent(0, u32::MAX).is_err());
        assert!(coord(u32::MAX).is_err());
    }

    #[test]
    fn raw_unknown_depth_is_unsupported() {
        let mut g = gdi();
        let mut bmp = BitmapObject::new(&mut g, 1, 1, None).unwrap();
        let err = bmp
            .decompress(&mut g, &[0; 4], 1, 1, 12, false, CodecId::None)
            .unwrap_err();
        assert!(matches!(err, RasterError::UnsupportedFormat(_)));
    }
}
