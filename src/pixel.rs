use rgb::alt::{BGR8, BGRA, BGRA8};
use rgb::{RGB8, RGBA8};

/// 16-bit-per-channel BGRA pixel used for 64 bpp (HDR) bitmaps.
///
/// Channels hold 13-bit fixed point values: `8192` is 1.0 and anything above
/// it is over-range.
pub type Bgra16 = BGRA<u16>;

/// One in the 13-bit fixed point HDR domain.
pub(crate) const HDR_ONE: u16 = 8192;

/// Pixel memory layout of a decoded image.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// 3 channels, 8-bit RGB.
    Rgb8,
    /// 4 channels, 8-bit RGBA.
    Rgba8,
    /// 3 channels, 8-bit BGR.
    Bgr8,
    /// 4 channels, 8-bit BGRA.
    Bgra8,
    /// 4 channels, 16-bit fixed point BGRA (native endian).
    Bgra16,
}

impl PixelLayout {
    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::Rgba8 | Self::Bgra8 => 4,
            Self::Bgra16 => 8,
        }
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        match self {
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::Rgba8 | Self::Bgra8 | Self::Bgra16 => 4,
        }
    }

    /// Whether the layout carries an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.channels() == 4
    }
}

/// A pixel type the decoder can produce.
///
/// Every implementor converts losslessly to and from [`Bgra16`] for 8-bit
/// content, which makes [`BmpPixel::convert`] total between any two layouts.
/// Missing alpha reads as opaque.
pub trait BmpPixel: Copy + Default + PartialEq + core::fmt::Debug + Send + Sync + 'static {
    const LAYOUT: PixelLayout;

    fn from_bgra8(c: BGRA8) -> Self;
    fn to_bgra8(self) -> BGRA8;

    fn from_bgra16(c: Bgra16) -> Self {
        Self::from_bgra8(BGRA8 {
            b: hdr_to_u8(c.b),
            g: hdr_to_u8(c.g),
            r: hdr_to_u8(c.r),
            a: hdr_to_u8(c.a),
        })
    }

    fn to_bgra16(self) -> Bgra16 {
        let c = self.to_bgra8();
        BGRA {
            b: u8_to_hdr(c.b),
            g: u8_to_hdr(c.g),
            r: u8_to_hdr(c.r),
            a: u8_to_hdr(c.a),
        }
    }

    /// Convert to another pixel layout.
    fn convert<Q: BmpPixel>(self) -> Q {
        Q::from_bgra16(self.to_bgra16())
    }
}

/// Widen an 8-bit channel into the HDR domain (255 maps to just below 1.0).
#[inline]
pub(crate) fn u8_to_hdr(v: u8) -> u16 {
    (u16::from(v) << 5) | (u16::from(v) >> 3)
}

/// Narrow an HDR channel to 8 bits: values of 1.0 and above clamp to 255, the
/// rest keeps its top 8 of 13 bits.
#[inline]
pub(crate) fn hdr_to_u8(v: u16) -> u8 {
    if v >= HDR_ONE { 255 } else { (v >> 5) as u8 }
}

impl BmpPixel for RGB8 {
    const LAYOUT: PixelLayout = PixelLayout::Rgb8;

    fn from_bgra8(c: BGRA8) -> Self {
        RGB8 {
            r: c.r,
            g: c.g,
            b: c.b,
        }
    }

    fn to_bgra8(self) -> BGRA8 {
        BGRA8 {
            b: self.b,
            g: self.g,
            r: self.r,
            a: 255,
        }
    }
}

impl BmpPixel for RGBA8 {
    const LAYOUT: PixelLayout = PixelLayout::Rgba8;

    fn from_bgra8(c: BGRA8) -> Self {
        RGBA8 {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }

    fn to_bgra8(self) -> BGRA8 {
        BGRA8 {
            b: self.b,
            g: self.g,
            r: self.r,
            a: self.a,
        }
    }
}

impl BmpPixel for BGR8 {
    const LAYOUT: PixelLayout = PixelLayout::Bgr8;

    fn from_bgra8(c: BGRA8) -> Self {
        BGR8 {
            b: c.b,
            g: c.g,
            r: c.r,
        }
    }

    fn to_bgra8(self) -> BGRA8 {
        BGRA8 {
            b: self.b,
            g: self.g,
            r: self.r,
            a: 255,
        }
    }
}

impl BmpPixel for BGRA8 {
    const LAYOUT: PixelLayout = PixelLayout::Bgra8;

    fn from_bgra8(c: BGRA8) -> Self {
        c
    }

    fn to_bgra8(self) -> BGRA8 {
        self
    }
}

impl BmpPixel for Bgra16 {
    const LAYOUT: PixelLayout = PixelLayout::Bgra16;

    fn from_bgra8(c: BGRA8) -> Self {
        BGRA {
            b: u8_to_hdr(c.b),
            g: u8_to_hdr(c.g),
            r: u8_to_hdr(c.r),
            a: u8_to_hdr(c.a),
        }
    }

    fn to_bgra8(self) -> BGRA8 {
        BGRA8 {
            b: hdr_to_u8(self.b),
            g: hdr_to_u8(self.g),
            r: hdr_to_u8(self.r),
            a: hdr_to_u8(self.a),
        }
    }

    fn from_bgra16(c: Bgra16) -> Self {
        c
    }

    fn to_bgra16(self) -> Bgra16 {
        self
    }
}
