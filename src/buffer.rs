//! Row-major pixel storage.

use alloc::format;
use alloc::vec::Vec;

use crate::convert::{Plane, PlaneMut};
use crate::error::RasterError;
use crate::pixel::PixelFormat;
use crate::rect::Rect;

/// Byte length of a `width`x`height` buffer in `format`.
///
/// Rejects zero dimensions and any geometry whose pixel count or byte size
/// does not fit in 32 bits. Nothing is allocated here, so a hostile
/// `0x10000 x 0x10000` update fails before touching the allocator.
pub fn checked_len(width: u32, height: u32, format: PixelFormat) -> Result<usize, RasterError> {
    let bpp = format.bytes_per_pixel();
    if bpp == 0 {
        return Err(RasterError::UnsupportedFormat(format!("{format:?}")));
    }
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidDimension { width, height });
    }
    let bytes = width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(bpp as u32))
        .ok_or(RasterError::InvalidDimension { width, height })?;
    Ok(bytes as usize)
}

/// A pixel buffer: `height` rows of `stride = width * bpp` bytes.
///
/// The backing store is a `Vec<u128>` viewed as bytes, so rows start on a
/// 16-byte boundary on targets where `u128` is 16-byte aligned (x86_64,
/// aarch64).
#[derive(Clone)]
pub struct PixelBuffer {
    blocks: Vec<u128>,
    len: usize,
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
}

impl core::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl PixelBuffer {
    /// Allocate a zero-filled buffer.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self, RasterError> {
        let len = checked_len(width, height, format)?;
        let n_blocks = len.div_ceil(16);
        let mut blocks = Vec::new();
        blocks
            .try_reserve_exact(n_blocks)
            .map_err(|_| RasterError::AllocationFailure(len))?;
        blocks.resize(n_blocks, 0u128);
        Ok(Self {
            blocks,
            len,
            width,
            height,
            stride: width as usize * format.bytes_per_pixel(),
            format,
        })
    }

    /// Import `bytes` already laid out in `format` with a tight stride.
    ///
    /// Extra trailing bytes are ignored; a short span is an error.
    pub fn from_bytes(
        width: u32,
        height: u32,
        format: PixelFormat,
        bytes: &[u8],
    ) -> Result<Self, RasterError> {
        let mut buf = Self::new(width, height, format)?;
        if bytes.len() < buf.len {
            return Err(RasterError::BufferTooSmall {
                needed: buf.len,
                actual: bytes.len(),
            });
        }
        let len = buf.len;
        buf.data_mut().copy_from_slice(&bytes[..len]);
        Ok(buf)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Total byte length (`height * stride`).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whole surface as an inclusive rectangle anchored at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::of_size(self.width, self.height)
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &bytemuck::cast_slice::<u128, u8>(&self.blocks)[..self.len]
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        let len = self.len;
        &mut bytemuck::cast_slice_mut::<u128, u8>(&mut self.blocks)[..len]
    }

    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        Some(&self.data()[start..start + self.stride])
    }

    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        let stride = self.stride;
        Some(&mut self.data_mut()[start..start + stride])
    }

    /// Packed value of the pixel at (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let row = self.row(y)?;
        Some(self.format.read(&row[x as usize * bpp..]))
    }

    /// Store a packed value at (x, y). Out-of-bounds writes are ignored and
    /// reported as `false`.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: u32) -> bool {
        if x >= self.width {
            return false;
        }
        let bpp = self.format.bytes_per_pixel();
        let format = self.format;
        match self.row_mut(y) {
            Some(row) => {
                format.write(value, &mut row[x as usize * bpp..]);
                true
            }
            None => false,
        }
    }

    /// Whole buffer as a read-only plane.
    pub fn as_plane(&self) -> Plane<'_> {
        Plane {
            data: self.data(),
            format: self.format,
            stride: self.stride,
        }
    }

    /// Whole buffer as a writable plane.
    pub fn as_plane_mut(&mut self) -> PlaneMut<'_> {
        let format = self.format;
        let stride = self.stride;
        PlaneMut {
            data: self.data_mut(),
            format,
            stride,
        }
    }

    /// Whether the first byte sits on a 16-byte boundary.
    pub fn is_aligned(&self) -> bool {
        self.data().as_ptr() as usize % 16 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_and_len() {
        let buf = PixelBuffer::new(5, 3, PixelFormat::Bgr24).unwrap();
        assert_eq!(buf.stride(), 15);
        assert_eq!(buf.len(), 45);
        assert_eq!(buf.data().len(), 45);
        assert!(buf.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_dimension_rejected() {
        assert!(matches!(
            PixelBuffer::new(0, 4, PixelFormat::Bgra32),
            Err(RasterError::InvalidDimension { width: 0, height: 4 })
        ));
        assert!(matches!(
            PixelBuffer::new(4, 0, PixelFormat::Bgra32),
            Err(RasterError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn overflow_rejected_before_allocation() {
        assert!(matches!(
            checked_len(0x10000, 0x10000, PixelFormat::Bgra32),
            Err(RasterError::InvalidDimension {
                width: 0x10000,
                height: 0x10000
            })
        ));
        // pixel count fits, byte size does not
        assert!(matches!(
            checked_len(0x8000, 0x8000, PixelFormat::Bgra32),
            Err(RasterError::InvalidDimension { .. })
        ));
        assert_eq!(
            checked_len(0x8000, 0x8000, PixelFormat::Rgb15).unwrap(),
            0x8000 * 0x8000 * 2
        );
    }

    #[test]
    fn aligned_storage() {
        if core::mem::align_of::<u128>() < 16 {
            return;
        }
        for w in 1..8 {
            let buf = PixelBuffer::new(w, 3, PixelFormat::Bgr24).unwrap();
            assert!(buf.is_aligned());
        }
    }

    #[test]
    fn pixel_access_is_bounds_checked() {
        let mut buf = PixelBuffer::new(2, 2, PixelFormat::Bgra32).unwrap();
        assert!(buf.set_pixel(1, 1, 0xDEADBEEF));
        assert_eq!(buf.pixel(1, 1), Some(0xDEADBEEF));
        assert!(!buf.set_pixel(2, 0, 1));
        assert!(!buf.set_pixel(0, 2, 1));
        assert_eq!(buf.pixel(2, 0), None);
        assert_eq!(&buf.data()[12..16], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn import_requires_full_span() {
        let bytes = [1u8, 2, 3, 4, 5, 6, 7];
        let buf = PixelBuffer::from_bytes(2, 3, PixelFormat::Rgb8, &bytes).unwrap();
        assert_eq!(buf.data(), &bytes[..6]);
        assert!(matches!(
            PixelBuffer::from_bytes(4, 2, PixelFormat::Rgb8, &bytes),
            Err(RasterError::BufferTooSmall { needed: 8, actual: 7 })
        ));
    }
}
