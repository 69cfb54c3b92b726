//! Color table for palette-indexed sources.

use rgb::RGBA8;

/// Number of entries in a palette.
pub const PALETTE_SIZE: usize = 256;

/// Index -> color table consulted whenever a source format is indexed.
///
/// Starts as a grayscale ramp until the server sends a palette update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    entries: [RGBA8; PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        let mut entries = [RGBA8::new(0, 0, 0, 0xFF); PALETTE_SIZE];
        for (i, entry) in entries.iter_mut().enumerate() {
            let v = i as u8;
            *entry = RGBA8::new(v, v, v, 0xFF);
        }
        Self { entries }
    }
}

impl Palette {
    /// Build a palette from the first 256 colors of `colors`; missing
    /// entries keep the grayscale default.
    pub fn from_colors(colors: &[RGBA8]) -> Self {
        let mut palette = Self::default();
        palette.update(0, colors);
        palette
    }

    #[inline]
    pub fn get(&self, index: u8) -> RGBA8 {
        self.entries[usize::from(index)]
    }

    #[inline]
    pub fn set(&mut self, index: u8, color: RGBA8) {
        self.entries[usize::from(index)] = color;
    }

    /// Overwrite entries starting at `first`. Colors past the end of the
    /// table are ignored.
    pub fn update(&mut self, first: u8, colors: &[RGBA8]) {
        for (slot, color) in self.entries[usize::from(first)..]
            .iter_mut()
            .zip(colors.iter())
        {
            *slot = *color;
        }
    }

    pub fn entries(&self) -> &[RGBA8; PALETTE_SIZE] {
        &self.entries
    }

    /// Index of the entry closest to `color` (squared RGB distance, first
    /// match wins on ties).
    pub fn nearest(&self, color: RGBA8) -> u8 {
        let dist = |e: &RGBA8| {
            let dr = i32::from(e.r) - i32::from(color.r);
            let dg = i32::from(e.g) - i32::from(color.g);
            let db = i32::from(e.b) - i32::from(color.b);
            dr * dr + dg * dg + db * db
        };
        let mut best = 0usize;
        let mut best_dist = i32::MAX;
        for (i, entry) in self.entries.iter().enumerate() {
            let d = dist(entry);
            if d < best_dist {
                best = i;
                best_dist = d;
                if d == 0 {
                    break;
                }
            }
        }
        best as u8
    }
}
