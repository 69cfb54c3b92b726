//! # zenraster
//!
//! Software GDI raster back end for remote-display clients. Takes bitmap
//! updates and glyph orders that a protocol layer has already parsed, decodes
//! them into pixel buffers and composites them onto a frame buffer.
//!
//! ## Pieces
//!
//! - [`Gdi`]: the per-session context. Owns the frame buffer, every surface
//!   and device context, the palette, the decode engines and the current
//!   render target.
//! - [`BitmapObject`]: a server bitmap. Decoded through one of five paths
//!   ([`DecodePath`]) and painted onto the render target.
//! - [`GlyphObject`]: a cached 1-bit glyph stencilled in the text color.
//! - [`PixelFormat`] and [`Palette`]: the packed color model.
//!
//! The compressed codecs themselves are not part of this crate. Plug them
//! in through [`Codecs`]; a path without an engine fails with
//! [`RasterError::DecodeFailure`].
//!
//! ## Non-Goals
//!
//! - Protocol parsing and network I/O
//! - Codec internals (RemoteFX, NSCodec, interleaved RLE, planar)
//! - Hardware acceleration
//!
//! ## Usage
//!
//! ```
//! use zenraster::{BitmapObject, CodecId, Gdi, GdiSettings, PixelFormat};
//!
//! let mut gdi = Gdi::new(64, 64, PixelFormat::Bgrx32, GdiSettings::default())?;
//!
//! // 2x2 uncompressed 24-bit update, rows bottom-up as sent on the wire
//! let wire = [0u8; 2 * 2 * 3];
//! let mut bitmap = BitmapObject::new(&mut gdi, 2, 2, None)?;
//! bitmap.decompress(&mut gdi, &wire, 2, 2, 24, false, CodecId::None)?;
//! bitmap.set_rectangle(10, 10, 11, 11);
//! bitmap.paint(&mut gdi)?;
//! bitmap.free(&mut gdi);
//! # Ok::<(), zenraster::RasterError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod arena;
mod bitmap;
mod buffer;
mod codec;
mod convert;
mod dc;
mod error;
mod gdi;
mod glyph;
mod limits;
mod palette;
mod pixel;
mod rect;
mod settings;

// Re-exports
pub use bitmap::{BitmapObject, BitmapSource};
pub use buffer::{PixelBuffer, checked_len};
pub use codec::{
    CodecError, CodecId, Codecs, DecodePath, DecodeTarget, PlanarDecoder, RunLengthDecoder,
    TileDecoder, WaveletDecoder,
};
pub use convert::{Flip, Plane, PlaneMut, convert_image, fill, glyph_to_mono, image_copy};
pub use dc::{DcId, DeviceContext, Rop, SurfaceId};
pub use enough::{Stop, StopReason, Unstoppable};
pub use error::RasterError;
pub use gdi::{Gdi, Target};
pub use glyph::GlyphObject;
pub use limits::Limits;
pub use palette::{PALETTE_SIZE, Palette};
pub use pixel::PixelFormat;
pub use rect::{BlitRegion, Rect, clip_blit};
pub use rgb::RGBA8;
pub use settings::GdiSettings;
