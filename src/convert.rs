//! Format-converting copies and glyph mask expansion.
//!
//! Bit expansion is adapted from zune-bmp by Caleb Etemesi
//! (MIT/Apache-2.0/Zlib).

use alloc::vec::Vec;

use enough::Stop;

use crate::buffer::checked_len;
use crate::error::RasterError;
use crate::palette::Palette;
use crate::pixel::PixelFormat;
use crate::rect::BlitRegion;

/// Row order applied while copying.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Flip {
    #[default]
    None,
    /// Last source row lands on the first destination row. Wire bitmaps are
    /// bottom-up, so importing them takes exactly one of these.
    Vertical,
}

/// Read-only view of pixel rows in some format.
#[derive(Clone, Copy, Debug)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    pub format: PixelFormat,
    pub stride: usize,
}

/// Writable view of pixel rows in some format.
#[derive(Debug)]
pub struct PlaneMut<'a> {
    pub data: &'a mut [u8],
    pub format: PixelFormat,
    pub stride: usize,
}

impl<'a> Plane<'a> {
    /// View with a tight stride for `width` pixels.
    pub fn packed(data: &'a [u8], format: PixelFormat, width: u32) -> Self {
        Self {
            data,
            format,
            stride: width as usize * format.bytes_per_pixel(),
        }
    }
}

impl<'a> PlaneMut<'a> {
    pub fn packed(data: &'a mut [u8], format: PixelFormat, width: u32) -> Self {
        Self {
            data,
            format,
            stride: width as usize * format.bytes_per_pixel(),
        }
    }
}

/// Bytes a plane must hold for a `width`x`height` window at (`x`, `y`).
fn required_len(
    stride: usize,
    format: PixelFormat,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<usize, RasterError> {
    let bpp = format.bytes_per_pixel();
    let row_end = (x as usize + width as usize)
        .checked_mul(bpp)
        .ok_or(RasterError::InvalidDimension { width, height })?;
    if row_end > stride {
        return Err(RasterError::precondition(alloc::format!(
            "row of {row_end} bytes exceeds stride {stride}"
        )));
    }
    (y as usize + height as usize - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_end))
        .ok_or(RasterError::InvalidDimension { width, height })
}

/// Copy `region` from `src` into `dst`, converting pixel formats and
/// optionally flipping rows.
///
/// Both planes are validated against the region before any byte is written.
/// Identical formats take a row `memcpy`, so a same-format copy is
/// byte-identical.
pub fn image_copy(
    dst: PlaneMut<'_>,
    src: Plane<'_>,
    region: &BlitRegion,
    palette: &Palette,
    flip: Flip,
    stop: &dyn Stop,
) -> Result<(), RasterError> {
    if region.width == 0 || region.height == 0 {
        return Ok(());
    }
    let needed_dst = required_len(
        dst.stride,
        dst.format,
        region.dst_x,
        region.dst_y,
        region.width,
        region.height,
    )?;
    if dst.data.len() < needed_dst {
        return Err(RasterError::BufferTooSmall {
            needed: needed_dst,
            actual: dst.data.len(),
        });
    }
    let needed_src = required_len(
        src.stride,
        src.format,
        region.src_x,
        region.src_y,
        region.width,
        region.height,
    )?;
    if src.data.len() < needed_src {
        return Err(RasterError::BufferTooSmall {
            needed: needed_src,
            actual: src.data.len(),
        });
    }

    let sbpp = src.format.bytes_per_pixel();
    let dbpp = dst.format.bytes_per_pixel();
    let width = region.width as usize;
    let same_format = src.format == dst.format;

    for i in 0..region.height as usize {
        if i % 16 == 0 {
            stop.check()?;
        }
        let src_row_idx = match flip {
            Flip::None => region.src_y as usize + i,
            Flip::Vertical => region.src_y as usize + region.height as usize - 1 - i,
        };
        let src_start = src_row_idx * src.stride + region.src_x as usize * sbpp;
        let dst_start = (region.dst_y as usize + i) * dst.stride + region.dst_x as usize * dbpp;
        let src_row = &src.data[src_start..src_start + width * sbpp];
        let dst_row = &mut dst.data[dst_start..dst_start + width * dbpp];

        if same_format {
            dst_row.copy_from_slice(src_row);
            continue;
        }
        for (s, d) in src_row
            .chunks_exact(sbpp)
            .zip(dst_row.chunks_exact_mut(dbpp))
        {
            let value = src.format.convert(src.format.read(s), dst.format, palette);
            dst.format.write(value, d);
        }
    }
    Ok(())
}

/// Convert a whole tightly packed image, as used for surfaces that share a
/// geometry.
pub fn convert_image(
    dst: PlaneMut<'_>,
    src: Plane<'_>,
    width: u32,
    height: u32,
    palette: &Palette,
    flip: Flip,
    stop: &dyn Stop,
) -> Result<(), RasterError> {
    let region = BlitRegion {
        dst_x: 0,
        dst_y: 0,
        src_x: 0,
        src_y: 0,
        width,
        height,
    };
    image_copy(dst, src, &region, palette, flip, stop)
}

/// Fill a window of `dst` with one packed value.
pub fn fill(
    dst: PlaneMut<'_>,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    value: u32,
) -> Result<(), RasterError> {
    if width == 0 || height == 0 {
        return Ok(());
    }
    let needed = required_len(dst.stride, dst.format, x, y, width, height)?;
    if dst.data.len() < needed {
        return Err(RasterError::BufferTooSmall {
            needed,
            actual: dst.data.len(),
        });
    }
    let bpp = dst.format.bytes_per_pixel();
    let mut pixel = [0u8; 4];
    dst.format.write(value, &mut pixel);
    let pixel = &pixel[..bpp];

    let first = y as usize * dst.stride + x as usize * bpp;
    let span = first..first + width as usize * bpp;
    for chunk in dst.data[span.clone()].chunks_exact_mut(bpp) {
        chunk.copy_from_slice(pixel);
    }
    // Replicate the first row instead of re-encoding every pixel.
    for i in 1..height as usize {
        dst.data.copy_within(span.clone(), first + i * dst.stride);
    }
    Ok(())
}

/// Expand a 1-bit-per-pixel glyph mask into the stencil format.
///
/// Mask rows are MSB first and padded to whole bytes, so the mask must hold
/// at least `ceil(cx / 8) * cy` bytes. Output is `cx * cy` bytes of
/// 0x00/0xFF.
pub fn glyph_to_mono(cx: u32, cy: u32, mask: &[u8]) -> Result<Vec<u8>, RasterError> {
    let out_len = checked_len(cx, cy, PixelFormat::Mono)?;
    let scanline = cx.div_ceil(8) as usize;
    let needed = scanline * cy as usize;
    if mask.len() < needed {
        return Err(RasterError::BufferTooSmall {
            needed,
            actual: mask.len(),
        });
    }

    let mut out = Vec::new();
    out.try_reserve_exact(out_len)
        .map_err(|_| RasterError::AllocationFailure(out_len))?;
    out.resize(out_len, 0u8);
    for (out_row, in_row) in out
        .chunks_exact_mut(cx as usize)
        .zip(mask.chunks_exact(scanline))
    {
        expand_bits(in_row, out_row);
    }
    Ok(out)
}

/// Expand MSB-first bits to 0x00/0xFF bytes until `out` is full.
fn expand_bits(input: &[u8], out: &mut [u8]) {
    let mut in_iter = input.iter();
    let mut out_iter = out.chunks_exact_mut(8);

    (&mut out_iter)
        .zip(&mut in_iter)
        .for_each(|(cur, in_val)| {
            for (bit, o) in cur.iter_mut().enumerate() {
                *o = 0xFF_u8.wrapping_mul((in_val >> (7 - bit)) & 0x01);
            }
        });

    if let Some(in_val) = in_iter.next() {
        out_iter
            .into_remainder()
            .iter_mut()
            .enumerate()
            .for_each(|(pos, o)| {
                *o = 0xFF_u8.wrapping_mul((in_val >> (7 - pos)) & 0x01);
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use enough::Unstoppable;

    fn ramp(len: usize) -> Vec<u8> {
        (0..len).map(|i| i as u8).collect()
    }

    fn flipped_rows(data: &[u8], stride: usize) -> Vec<u8> {
        let mut out = vec![0u8; data.len()];
        for (dst, src) in out
            .chunks_exact_mut(stride)
            .zip(data.rchunks_exact(stride))
        {
            dst.copy_from_slice(src);
        }
        out
    }

    #[test]
    fn same_format_copy_is_identical() {
        let src = ramp(4 * 4 * 4);
        let mut dst = vec![0u8; src.len()];
        convert_image(
            PlaneMut::packed(&mut dst, PixelFormat::Bgra32, 4),
            Plane::packed(&src, PixelFormat::Bgra32, 4),
            4,
            4,
            &Palette::default(),
            Flip::None,
            &Unstoppable,
        )
        .unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn vertical_flip_reverses_rows() {
        let src = ramp(3 * 4);
        let mut dst = vec![0u8; src.len()];
        convert_image(
            PlaneMut::packed(&mut dst, PixelFormat::Rgb8, 3),
            Plane::packed(&src, PixelFormat::Rgb8, 3),
            3,
            4,
            &Palette::default(),
            Flip::Vertical,
            &Unstoppable,
        )
        .unwrap();
        assert_eq!(dst, flipped_rows(&src, 3));
        assert_eq!(&dst[..3], &[9, 10, 11]);
    }

    #[test]
    fn converts_between_formats() {
        // one BGR24 pixel -> RGBA32
        let src = [0x30u8, 0x20, 0x10];
        let mut dst = [0u8; 4];
        convert_image(
            PlaneMut::packed(&mut dst, PixelFormat::Rgba32, 1),
            Plane::packed(&src, PixelFormat::Bgr24, 1),
            1,
            1,
            &Palette::default(),
            Flip::None,
            &Unstoppable,
        )
        .unwrap();
        assert_eq!(dst, [0x10, 0x20, 0x30, 0xFF]);
    }

    #[test]
    fn indexed_source_uses_palette() {
        let mut palette = Palette::default();
        palette.set(3, rgb::RGBA8::new(1, 2, 3, 255));
        let src = [3u8, 0];
        let mut dst = [0u8; 6];
        convert_image(
            PlaneMut::packed(&mut dst, PixelFormat::Rgb24, 2),
            Plane::packed(&src, PixelFormat::Rgb8, 2),
            2,
            1,
            &palette,
            Flip::None,
            &Unstoppable,
        )
        .unwrap();
        assert_eq!(dst, [1, 2, 3, 0, 0, 0]);
    }

    #[test]
    fn short_source_rejected_before_writing() {
        let src = [0u8; 15];
        let mut dst = [0xAAu8; 16];
        let err = convert_image(
            PlaneMut::packed(&mut dst, PixelFormat::Bgra32, 2),
            Plane::packed(&src, PixelFormat::Bgra32, 2),
            2,
            2,
            &Palette::default(),
            Flip::Vertical,
            &Unstoppable,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RasterError::BufferTooSmall {
                needed: 16,
                actual: 15
            }
        ));
        assert!(dst.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn window_past_stride_rejected() {
        let src = [0u8; 16];
        let mut dst = [0u8; 16];
        let region = BlitRegion {
            dst_x: 1,
            dst_y: 0,
            src_x: 0,
            src_y: 0,
            width: 2,
            height: 1,
        };
        let err = image_copy(
            PlaneMut::packed(&mut dst, PixelFormat::Bgra32, 2),
            Plane::packed(&src, PixelFormat::Bgra32, 2),
            &region,
            &Palette::default(),
            Flip::None,
            &Unstoppable,
        )
        .unwrap_err();
        assert!(matches!(err, RasterError::PreconditionViolation(_)));
    }

    #[test]
    fn fill_window() {
        let mut dst = vec![0u8; 4 * 3 * 2];
        fill(PlaneMut::packed(&mut dst, PixelFormat::Rgb16, 4), 1, 1, 2, 2, 0xF800).unwrap();
        let expect_row = [0, 0, 0x00, 0xF8, 0x00, 0xF8, 0, 0];
        assert_eq!(&dst[..8], &[0u8; 8]);
        assert_eq!(&dst[8..16], &expect_row);
        assert_eq!(&dst[16..24], &expect_row);
    }

    #[test]
    fn fill_last_row_of_trimmed_plane() {
        // 2x2 BGRA plane cut off right after the second row's first pixel
        let mut dst = [0u8; 12];
        fill(
            PlaneMut::packed(&mut dst, PixelFormat::Bgra32, 2),
            0,
            1,
            1,
            1,
            0xFFFF_FFFF,
        )
        .unwrap();
        assert_eq!(&dst[..8], &[0u8; 8]);
        assert_eq!(&dst[8..], &[0xFF; 4]);

        // the same window is accepted by image_copy
        let src = [0x55u8; 4];
        let mut dst = [0u8; 12];
        let region = BlitRegion {
            dst_x: 0,
            dst_y: 1,
            src_x: 0,
            src_y: 0,
            width: 1,
            height: 1,
        };
        image_copy(
            PlaneMut::packed(&mut dst, PixelFormat::Bgra32, 2),
            Plane::packed(&src, PixelFormat::Bgra32, 1),
            &region,
            &Palette::default(),
            Flip::None,
            &Unstoppable,
        )
        .unwrap();
        assert_eq!(&dst[8..], &[0x55; 4]);
    }

    #[test]
    fn fill_multi_row_window_on_trimmed_plane() {
        // 3 wide RGB565; the buffer ends right after the window's last pixel
        let mut dst = vec![0u8; 2 * 6 + 4];
        fill(PlaneMut::packed(&mut dst, PixelFormat::Rgb16, 3), 0, 1, 2, 2, 0xF800).unwrap();
        assert_eq!(&dst[..6], &[0u8; 6]);
        assert_eq!(&dst[6..12], &[0x00, 0xF8, 0x00, 0xF8, 0, 0]);
        assert_eq!(&dst[12..], &[0x00, 0xF8, 0x00, 0xF8]);
    }

    #[test]
    fn glyph_mask_expansion() {
        // 10 pixels wide: two bytes per row
        let mask = [0b1010_0000, 0b0100_0000, 0b0000_0001, 0b1000_0000];
        let mono = glyph_to_mono(10, 2, &mask).unwrap();
        assert_eq!(
            &mono[..10],
            &[0xFF, 0, 0xFF, 0, 0, 0, 0, 0, 0, 0xFF]
        );
        assert_eq!(&mono[10..], &[0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF, 0]);
    }

    #[test]
    fn glyph_mask_too_short() {
        assert!(matches!(
            glyph_to_mono(9, 3, &[0u8; 5]),
            Err(RasterError::BufferTooSmall { needed: 6, actual: 5 })
        ));
        assert!(matches!(
            glyph_to_mono(0, 3, &[]),
            Err(RasterError::InvalidDimension { .. })
        ));
    }
}
