//! Codec dispatch and the call contract for external decode engines.
//!
//! The engines themselves (tile-based image codec, wavelet/palette codec,
//! run-length codec, planar codec) live outside this crate. Each one is
//! plugged into [`Codecs`] as a trait object and receives caller-owned
//! buffers only.

use alloc::boxed::Box;
use alloc::string::String;

use enough::{Stop, StopReason};

use crate::palette::Palette;
use crate::pixel::PixelFormat;

/// Codec identifier announced by the server for compressed bitmaps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodecId {
    None,
    NsCodec,
    Jpeg,
    RemoteFx,
    ImageRemoteFx,
    /// Any identifier this layer has no dedicated path for.
    Other(u32),
}

impl CodecId {
    pub fn from_u32(id: u32) -> Self {
        match id {
            0x00 => Self::None,
            0x01 => Self::NsCodec,
            0x02 => Self::Jpeg,
            0x03 => Self::RemoteFx,
            0x04 => Self::ImageRemoteFx,
            other => Self::Other(other),
        }
    }
}

impl From<u32> for CodecId {
    fn from(id: u32) -> Self {
        Self::from_u32(id)
    }
}

/// The decode path chosen for one bitmap update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecodePath {
    /// Uncompressed wire pixels: format conversion plus one vertical flip.
    Raw,
    /// Tile-based image codec, written at the frame buffer's geometry.
    TileImage,
    /// Wavelet/palette codec through a temporary 32-bit buffer.
    WaveletPalette,
    /// Run-length codec for depths below 32.
    RunLength,
    /// Planar codec for 32-bit updates.
    Planar,
}

impl DecodePath {
    /// Pick the path for an update. Evaluated in a fixed priority order;
    /// exactly one path is returned.
    pub fn select(compressed: bool, codec_id: CodecId, bpp: u32) -> Self {
        if !compressed {
            return Self::Raw;
        }
        match codec_id {
            CodecId::RemoteFx | CodecId::ImageRemoteFx => Self::TileImage,
            CodecId::NsCodec => Self::WaveletPalette,
            _ if bpp < 32 => Self::RunLength,
            _ => Self::Planar,
        }
    }
}

/// Failure reported by a decode engine.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CodecError {
    #[error("no engine registered")]
    NoEngine,

    #[error("input truncated: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("malformed stream: {0}")]
    Malformed(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for CodecError {
    fn from(r: StopReason) -> Self {
        CodecError::Cancelled(r)
    }
}

/// Output window handed to an engine.
///
/// `data` is exactly the caller's buffer. `stride` and `height` describe the
/// layout the engine must write with; for the tile path they are the frame
/// buffer's, which may describe more rows than `data` holds. Engines must
/// treat running off the end of `data` as a failure.
#[derive(Debug)]
pub struct DecodeTarget<'a> {
    pub data: &'a mut [u8],
    pub format: PixelFormat,
    pub stride: usize,
    pub width: u32,
    pub height: u32,
}

/// Tile-based image codec (RemoteFX family).
pub trait TileDecoder {
    /// Decode one message, placing tiles relative to (`left`, `top`).
    fn decode(
        &mut self,
        src: &[u8],
        left: u32,
        top: u32,
        dst: DecodeTarget<'_>,
        stop: &dyn Stop,
    ) -> Result<(), CodecError>;
}

/// Wavelet/palette codec (NSCodec).
pub trait WaveletDecoder {
    /// Decode into a `dst.width`x`dst.height` 32-bit buffer.
    fn decode(&mut self, src: &[u8], dst: DecodeTarget<'_>, stop: &dyn Stop)
    -> Result<(), CodecError>;
}

/// Interleaved run-length codec for 8/15/16/24-bit updates.
pub trait RunLengthDecoder {
    fn decode(
        &mut self,
        src: &[u8],
        bpp: u32,
        dst: DecodeTarget<'_>,
        palette: &Palette,
        stop: &dyn Stop,
    ) -> Result<(), CodecError>;
}

/// Planar codec for 32-bit updates.
pub trait PlanarDecoder {
    /// Swap red and blue on output. Set before every decode.
    fn set_bgr_swap(&mut self, swap: bool);

    fn decode(&mut self, src: &[u8], dst: DecodeTarget<'_>, stop: &dyn Stop)
    -> Result<(), CodecError>;
}

/// Registered decode engines. A path whose engine is missing fails with
/// [`CodecError::NoEngine`].
#[derive(Default)]
pub struct Codecs {
    pub tile: Option<Box<dyn TileDecoder>>,
    pub wavelet: Option<Box<dyn WaveletDecoder>>,
    pub run_length: Option<Box<dyn RunLengthDecoder>>,
    pub planar: Option<Box<dyn PlanarDecoder>>,
}

impl core::fmt::Debug for Codecs {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Codecs")
            .field("tile", &self.tile.is_some())
            .field("wavelet", &self.wavelet.is_some())
            .field("run_length", &self.run_length.is_some())
            .field("planar", &self.planar.is_some())
            .finish()
    }
}

impl Codecs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tile(mut self, engine: impl TileDecoder + 'static) -> Self {
        self.tile = Some(Box::new(engine));
        self
    }

    pub fn with_wavelet(mut self, engine: impl WaveletDecoder + 'static) -> Self {
        self.wavelet = Some(Box::new(engine));
        self
    }

    pub fn with_run_length(mut self, engine: impl RunLengthDecoder + 'static) -> Self {
        self.run_length = Some(Box::new(engine));
        self
    }

    pub fn with_planar(mut self, engine: impl PlanarDecoder + 'static) -> Self {
        self.planar = Some(Box::new(engine));
        self
    }
}
