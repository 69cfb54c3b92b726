use rgb::RGBA8;

use crate::palette::Palette;

/// Pixel memory format of a surface or of a wire span.
///
/// For the 32- and 24-bit formats the name lists the channels in memory
/// order, which is also high-to-low bit order of the packed value. The 16-
/// and 15-bit formats are little-endian words with the first named channel
/// in the high bits.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 4 bytes: B, G, R, A.
    Bgra32,
    /// 4 bytes: B, G, R, padding (opaque).
    Bgrx32,
    /// 4 bytes: R, G, B, A.
    Rgba32,
    /// 4 bytes: R, G, B, padding (opaque).
    Rgbx32,
    /// 4 bytes: A, R, G, B.
    Argb32,
    /// 4 bytes: padding, R, G, B (opaque).
    Xrgb32,
    /// 4 bytes: A, B, G, R.
    Abgr32,
    /// 4 bytes: padding, B, G, R (opaque).
    Xbgr32,
    /// 3 bytes: B, G, R.
    Bgr24,
    /// 3 bytes: R, G, B.
    Rgb24,
    /// 16-bit word, 5-6-5, red in the high bits.
    Rgb16,
    /// 16-bit word, 5-6-5, blue in the high bits.
    Bgr16,
    /// 16-bit word, x-5-5-5, red in the high bits.
    Rgb15,
    /// 16-bit word, x-5-5-5, blue in the high bits.
    Bgr15,
    /// 1 byte palette index.
    Rgb8,
    /// Stencil format: one byte per pixel, 0x00 clear, 0xFF set.
    Mono,
}

impl PixelFormat {
    /// Source format implied by a wire bit depth.
    ///
    /// Returns `None` for depths the protocol does not define, which callers
    /// report as an unsupported format.
    pub fn from_wire_depth(bpp: u32) -> Option<Self> {
        match bpp {
            32 => Some(Self::Bgra32),
            24 => Some(Self::Bgr24),
            16 => Some(Self::Rgb16),
            15 => Some(Self::Rgb15),
            8 => Some(Self::Rgb8),
            _ => None,
        }
    }

    /// Significant bits per pixel.
    pub fn bits_per_pixel(&self) -> u32 {
        match self {
            Self::Bgra32
            | Self::Bgrx32
            | Self::Rgba32
            | Self::Rgbx32
            | Self::Argb32
            | Self::Xrgb32
            | Self::Abgr32
            | Self::Xbgr32 => 32,
            Self::Bgr24 | Self::Rgb24 => 24,
            Self::Rgb16 | Self::Bgr16 => 16,
            Self::Rgb15 | Self::Bgr15 => 15,
            Self::Rgb8 => 8,
            Self::Mono => 1,
        }
    }

    /// Bytes per pixel in memory. Never zero; the stencil format is stored
    /// expanded to one byte per pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        (self.bits_per_pixel() as usize).div_ceil(8)
    }

    /// Whether the format carries a real alpha channel.
    pub fn has_alpha(&self) -> bool {
        matches!(
            self,
            Self::Bgra32 | Self::Rgba32 | Self::Argb32 | Self::Abgr32
        )
    }

    /// Whether pixel values are palette indices.
    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Rgb8)
    }

    /// Read one packed pixel value from the start of `bytes`.
    ///
    /// `bytes` must hold at least [`bytes_per_pixel`](Self::bytes_per_pixel) bytes.
    #[inline]
    pub fn read(&self, bytes: &[u8]) -> u32 {
        match self.bytes_per_pixel() {
            4 => u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            3 => (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2]),
            2 => u32::from(u16::from_le_bytes([bytes[0], bytes[1]])),
            _ => u32::from(bytes[0]),
        }
    }

    /// Write one packed pixel value to the start of `bytes`.
    #[inline]
    pub fn write(&self, value: u32, bytes: &mut [u8]) {
        match self.bytes_per_pixel() {
            4 => bytes[..4].copy_from_slice(&value.to_be_bytes()),
            3 => {
                bytes[0] = (value >> 16) as u8;
                bytes[1] = (value >> 8) as u8;
                bytes[2] = value as u8;
            }
            2 => bytes[..2].copy_from_slice(&(value as u16).to_le_bytes()),
            _ => bytes[0] = value as u8,
        }
    }

    /// Split a packed value of this format into channels.
    pub fn split(&self, value: u32, palette: &Palette) -> RGBA8 {
        let byte = |shift: u32| (value >> shift) as u8;
        match self {
            Self::Bgra32 => RGBA8::new(byte(8), byte(16), byte(24), byte(0)),
            Self::Bgrx32 => RGBA8::new(byte(8), byte(16), byte(24), 0xFF),
            Self::Rgba32 => RGBA8::new(byte(24), byte(16), byte(8), byte(0)),
            Self::Rgbx32 => RGBA8::new(byte(24), byte(16), byte(8), 0xFF),
            Self::Argb32 => RGBA8::new(byte(16), byte(8), byte(0), byte(24)),
            Self::Xrgb32 => RGBA8::new(byte(16), byte(8), byte(0), 0xFF),
            Self::Abgr32 => RGBA8::new(byte(0), byte(8), byte(16), byte(24)),
            Self::Xbgr32 => RGBA8::new(byte(0), byte(8), byte(16), 0xFF),
            Self::Bgr24 => RGBA8::new(byte(0), byte(8), byte(16), 0xFF),
            Self::Rgb24 => RGBA8::new(byte(16), byte(8), byte(0), 0xFF),
            Self::Rgb16 => RGBA8::new(
                expand5((value >> 11) & 0x1F),
                expand6((value >> 5) & 0x3F),
                expand5(value & 0x1F),
                0xFF,
            ),
            Self::Bgr16 => RGBA8::new(
                expand5(value & 0x1F),
                expand6((value >> 5) & 0x3F),
                expand5((value >> 11) & 0x1F),
                0xFF,
            ),
            Self::Rgb15 => RGBA8::new(
                expand5((value >> 10) & 0x1F),
                expand5((value >> 5) & 0x1F),
                expand5(value & 0x1F),
                0xFF,
            ),
            Self::Bgr15 => RGBA8::new(
                expand5(value & 0x1F),
                expand5((value >> 5) & 0x1F),
                expand5((value >> 10) & 0x1F),
                0xFF,
            ),
            Self::Rgb8 => palette.get(value as u8),
            Self::Mono => {
                if value != 0 {
                    RGBA8::new(0xFF, 0xFF, 0xFF, 0xFF)
                } else {
                    RGBA8::new(0, 0, 0, 0xFF)
                }
            }
        }
    }

    /// Pack channels into a value of this format.
    ///
    /// Padding bytes of the `x` formats are written as 0xFF. Indexed targets
    /// pick the nearest palette entry.
    pub fn make(&self, c: RGBA8, palette: &Palette) -> u32 {
        let (r, g, b, a) = (
            u32::from(c.r),
            u32::from(c.g),
            u32::from(c.b),
            u32::from(c.a),
        );
        match self {
            Self::Bgra32 => (b << 24) | (g << 16) | (r << 8) | a,
            Self::Bgrx32 => (b << 24) | (g << 16) | (r << 8) | 0xFF,
            Self::Rgba32 => (r << 24) | (g << 16) | (b << 8) | a,
            Self::Rgbx32 => (r << 24) | (g << 16) | (b << 8) | 0xFF,
            Self::Argb32 => (a << 24) | (r << 16) | (g << 8) | b,
            Self::Xrgb32 => (0xFF << 24) | (r << 16) | (g << 8) | b,
            Self::Abgr32 => (a << 24) | (b << 16) | (g << 8) | r,
            Self::Xbgr32 => (0xFF << 24) | (b << 16) | (g << 8) | r,
            Self::Bgr24 => (b << 16) | (g << 8) | r,
            Self::Rgb24 => (r << 16) | (g << 8) | b,
            Self::Rgb16 => ((r >> 3) << 11) | ((g >> 2) << 5) | (b >> 3),
            Self::Bgr16 => ((b >> 3) << 11) | ((g >> 2) << 5) | (r >> 3),
            Self::Rgb15 => ((r >> 3) << 10) | ((g >> 3) << 5) | (b >> 3),
            Self::Bgr15 => ((b >> 3) << 10) | ((g >> 3) << 5) | (r >> 3),
            Self::Rgb8 => u32::from(palette.nearest(c)),
            Self::Mono => {
                if (r | g | b) != 0 {
                    0xFF
                } else {
                    0
                }
            }
        }
    }

    /// Convert a packed value from this format into `dst`.
    #[inline]
    pub fn convert(&self, value: u32, dst: PixelFormat, palette: &Palette) -> u32 {
        if *self == dst {
            return value;
        }
        dst.make(self.split(value, palette), palette)
    }
}

#[inline]
fn expand5(v: u32) -> u8 {
    ((v << 3) | (v >> 2)) as u8
}

#[inline]
fn expand6(v: u32) -> u8 {
    ((v << 2) | (v >> 4)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_8BIT: [PixelFormat; 10] = [
        PixelFormat::Bgra32,
        PixelFormat::Bgrx32,
        PixelFormat::Rgba32,
        PixelFormat::Rgbx32,
        PixelFormat::Argb32,
        PixelFormat::Xrgb32,
        PixelFormat::Abgr32,
        PixelFormat::Xbgr32,
        PixelFormat::Bgr24,
        PixelFormat::Rgb24,
    ];

    #[test]
    fn wire_depths() {
        assert_eq!(PixelFormat::from_wire_depth(32), Some(PixelFormat::Bgra32));
        assert_eq!(PixelFormat::from_wire_depth(24), Some(PixelFormat::Bgr24));
        assert_eq!(PixelFormat::from_wire_depth(16), Some(PixelFormat::Rgb16));
        assert_eq!(PixelFormat::from_wire_depth(15), Some(PixelFormat::Rgb15));
        assert_eq!(PixelFormat::from_wire_depth(8), Some(PixelFormat::Rgb8));
        assert_eq!(PixelFormat::from_wire_depth(0), None);
        assert_eq!(PixelFormat::from_wire_depth(12), None);
    }

    #[test]
    fn bytes_per_pixel_never_zero() {
        for fmt in FULL_8BIT {
            assert!(fmt.bytes_per_pixel() >= 3);
        }
        assert_eq!(PixelFormat::Rgb15.bytes_per_pixel(), 2);
        assert_eq!(PixelFormat::Rgb8.bytes_per_pixel(), 1);
        assert_eq!(PixelFormat::Mono.bytes_per_pixel(), 1);
    }

    #[test]
    fn memory_order_matches_name() {
        let palette = Palette::default();
        let c = RGBA8::new(0x11, 0x22, 0x33, 0x44);
        let mut px = [0u8; 4];

        PixelFormat::Bgra32.write(PixelFormat::Bgra32.make(c, &palette), &mut px);
        assert_eq!(px, [0x33, 0x22, 0x11, 0x44]);

        PixelFormat::Rgba32.write(PixelFormat::Rgba32.make(c, &palette), &mut px);
        assert_eq!(px, [0x11, 0x22, 0x33, 0x44]);

        PixelFormat::Xrgb32.write(PixelFormat::Xrgb32.make(c, &palette), &mut px);
        assert_eq!(px, [0xFF, 0x11, 0x22, 0x33]);

        let mut px3 = [0u8; 3];
        PixelFormat::Bgr24.write(PixelFormat::Bgr24.make(c, &palette), &mut px3);
        assert_eq!(px3, [0x33, 0x22, 0x11]);
    }

    #[test]
    fn full_8bit_formats_preserve_channels() {
        let palette = Palette::default();
        let c = RGBA8::new(0x12, 0xAB, 0xF0, 0xFF);
        for src in FULL_8BIT {
            for dst in FULL_8BIT {
                let v = src.convert(src.make(c, &palette), dst, &palette);
                assert_eq!(dst.split(v, &palette), c, "{src:?} -> {dst:?}");
            }
        }
    }

    #[test]
    fn rgb565_extremes() {
        let palette = Palette::default();
        let white = PixelFormat::Rgb16.make(RGBA8::new(255, 255, 255, 255), &palette);
        assert_eq!(white, 0xFFFF);
        assert_eq!(
            PixelFormat::Rgb16.split(0xF800, &palette),
            RGBA8::new(255, 0, 0, 255)
        );
        assert_eq!(
            PixelFormat::Bgr16.split(0xF800, &palette),
            RGBA8::new(0, 0, 255, 255)
        );
        let mut px = [0u8; 2];
        PixelFormat::Rgb16.write(0xF800, &mut px);
        assert_eq!(px, [0x00, 0xF8]);
        assert_eq!(PixelFormat::Rgb16.read(&px), 0xF800);
    }

    #[test]
    fn rgb555_channels() {
        let palette = Palette::default();
        assert_eq!(
            PixelFormat::Rgb15.split(0x7C00, &palette),
            RGBA8::new(255, 0, 0, 255)
        );
        assert_eq!(
            PixelFormat::Rgb15.split(0x03E0, &palette),
            RGBA8::new(0, 255, 0, 255)
        );
    }

    #[test]
    fn indexed_goes_through_palette() {
        let mut palette = Palette::default();
        palette.set(7, RGBA8::new(10, 20, 30, 255));
        assert_eq!(
            PixelFormat::Rgb8.split(7, &palette),
            RGBA8::new(10, 20, 30, 255)
        );
        assert_eq!(
            PixelFormat::Rgb8.make(RGBA8::new(10, 20, 30, 255), &palette),
            7
        );
    }

    #[test]
    fn mono_is_binary() {
        let palette = Palette::default();
        assert_eq!(
            PixelFormat::Mono.make(RGBA8::new(0, 0, 1, 255), &palette),
            0xFF
        );
        assert_eq!(PixelFormat::Mono.make(RGBA8::new(0, 0, 0, 255), &palette), 0);
        assert_eq!(
            PixelFormat::Mono.split(0xFF, &palette),
            RGBA8::new(255, 255, 255, 255)
        );
    }
}
