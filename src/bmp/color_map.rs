//! Colour table loading and the built-in default palettes.

use std::io::{Read, Seek};

use rgb::alt::BGRA8;

use super::file_header::FileHeader;
use super::info_header::InfoHeader;
use crate::error::BmpError;
use crate::stream::ByteStream;
use crate::warning::{Warning, Warnings};

/// Largest palette a bitmap can index.
pub const MAX_COLORS: usize = 256;

const fn rgb(r: u8, g: u8, b: u8) -> BGRA8 {
    BGRA8 { b, g, r, a: 255 }
}

const BLACK: BGRA8 = rgb(0, 0, 0);

const MONO: [BGRA8; 2] = [BLACK, rgb(255, 255, 255)];

const SIXTEEN: [BGRA8; 16] = [
    BLACK,
    rgb(128, 0, 0),
    rgb(0, 128, 0),
    rgb(128, 128, 0),
    rgb(0, 0, 128),
    rgb(128, 0, 128),
    rgb(0, 128, 128),
    rgb(192, 192, 192),
    rgb(128, 128, 128),
    rgb(255, 0, 0),
    rgb(0, 255, 0),
    rgb(255, 255, 0),
    rgb(0, 0, 255),
    rgb(255, 0, 255),
    rgb(0, 255, 255),
    rgb(255, 255, 255),
];

/// The 16 system colours, a 6x6x6 colour cube and a 24 step gray ramp.
const FULL: [BGRA8; 256] = {
    let mut table = [BLACK; 256];
    let mut i = 0;
    while i < 16 {
        table[i] = SIXTEEN[i];
        i += 1;
    }
    let mut c = 0;
    while c < 216 {
        let (r, g, b) = (c / 36, (c / 6) % 6, c % 6);
        table[16 + c] = rgb((r * 51) as u8, (g * 51) as u8, (b * 51) as u8);
        c += 1;
    }
    let mut s = 0;
    while s < 24 {
        let v = (8 + s * 10) as u8;
        table[232 + s] = rgb(v, v, v);
        s += 1;
    }
    table
};

static BUILTIN: DefaultPalettes = DefaultPalettes {
    mono: MONO,
    sixteen: SIXTEEN,
    full: FULL,
};

/// Palettes used when a bitmap has no stored colour table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefaultPalettes {
    pub mono: [BGRA8; 2],
    pub sixteen: [BGRA8; 16],
    pub full: [BGRA8; 256],
}

impl DefaultPalettes {
    /// The built-in tables.
    pub fn builtin() -> &'static DefaultPalettes {
        &BUILTIN
    }

    /// Table for a palette of `colors` entries: 2, 16, or 256.
    pub fn for_colors(&self, colors: u32) -> &[BGRA8] {
        match colors {
            0..=2 => &self.mono,
            3..=16 => &self.sixteen,
            _ => &self.full,
        }
    }
}

impl Default for DefaultPalettes {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

/// Colour table of up to 256 entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorMap {
    entries: [BGRA8; MAX_COLORS],
    colors_count: usize,
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::empty()
    }
}

impl ColorMap {
    pub fn empty() -> Self {
        Self {
            entries: [BLACK; MAX_COLORS],
            colors_count: 0,
        }
    }

    /// Build from the first 256 of `colors`.
    pub fn from_colors(colors: &[BGRA8]) -> Self {
        let mut map = Self::empty();
        let n = colors.len().min(MAX_COLORS);
        map.entries[..n].copy_from_slice(&colors[..n]);
        map.colors_count = n;
        map
    }

    /// Number of valid entries.
    pub fn colors_count(&self) -> usize {
        self.colors_count
    }

    pub fn colors(&self) -> &[BGRA8] {
        &self.entries[..self.colors_count]
    }

    /// Resolve an index. Indices past `colors_count` resolve to entry 0 and
    /// set `bad` so the caller can raise one warning per image.
    #[inline]
    pub(crate) fn lookup(&self, index: u8, bad: &mut bool) -> BGRA8 {
        let i = usize::from(index);
        if i < self.colors_count {
            self.entries[i]
        } else {
            *bad = true;
            self.entries[0]
        }
    }
}

/// Load the colour table following the info header.
///
/// The stream must sit at the first palette entry. It is left after the last
/// entry read. With `check_gap`, the palette size is compared against the
/// room left before the pixel data offset.
pub(crate) fn load_color_map<R: Read + Seek>(
    stream: &mut ByteStream<R>,
    file: &FileHeader,
    header: &InfoHeader,
    defaults: &DefaultPalettes,
    check_gap: bool,
    warnings: &mut Warnings,
) -> Result<ColorMap, BmpError> {
    let bpp = header.bits_per_pixel();
    if !header.has_stored_palette() {
        return Ok(default_map(defaults, bpp));
    }

    let declared = u64::from(header.colors_count());
    let mut count = declared;
    if count > MAX_COLORS as u64 {
        warnings.push(Warning::PaletteTruncated);
        count = MAX_COLORS as u64;
    }

    let entry_size = header.palette_entry_size();
    if let Some(offset) = file.content_offset().filter(|_| check_gap) {
        let gap = u64::from(offset).saturating_sub(stream.position());
        let declared_bytes = declared.saturating_mul(entry_size);
        if declared_bytes > gap {
            warnings.push(Warning::MissingPaletteEntries);
            count = count.min(gap / entry_size);
        } else if declared_bytes < gap {
            warnings.push(Warning::GapBeforeBitmap);
        }
    }

    let raw = stream.read_vec((count * entry_size) as usize)?;
    let colors: Vec<BGRA8> = raw
        .chunks_exact(entry_size as usize)
        .map(|e| rgb(e[2], e[1], e[0]))
        .collect();

    if colors.is_empty() && bpp <= 8 {
        warnings.push(Warning::DefaultPaletteSubstituted);
        return Ok(default_map(defaults, bpp));
    }
    Ok(ColorMap::from_colors(&colors))
}

/// The first `1 << bpp` default colours; empty for direct-colour depths.
fn default_map(defaults: &DefaultPalettes, bpp: u16) -> ColorMap {
    if bpp > 8 {
        return ColorMap::empty();
    }
    let n = 1usize << bpp;
    ColorMap::from_colors(&defaults.for_colors(n as u32)[..n])
}
