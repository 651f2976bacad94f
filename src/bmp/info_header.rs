//! Info header revisions and the size-based dispatch between them.
//!
//! Two header sizes are ambiguous on disk. A 12-byte header is either a
//! Windows 2.x header (signed dimensions, 4-byte palette entries) or an OS/2 1.x
//! header (unsigned dimensions, 3-byte palette entries); it is parsed as the
//! former first and re-parsed as the latter when the palette it implies does
//! not fit the file. A 40-byte header with bitfield compression is re-parsed
//! as the NT layout, which stores its masks right after the header.

use core::fmt;
use std::io::{Read, Seek};

use super::file_header::FileHeader;
use crate::error::BmpError;
use crate::stream::ByteStream;
use crate::warning::{Warning, Warnings};

const SIZE_CORE: u32 = 0x0c;
const SIZE_OS22X_SHORT: u32 = 0x10;
const SIZE_V3: u32 = 0x28;
const SIZE_V3_NT: u32 = 0x34;
const SIZE_V3_NT4: u32 = 0x38;
const SIZE_OS22X: u32 = 0x40;
const SIZE_V4: u32 = 0x6c;
const SIZE_V5: u32 = 0x7c;

/// Resolution ratio above which the X/Y resolutions are considered incoherent.
const MAX_RESOLUTION_RATIO: f64 = 2.5;

/// `LCS_CALIBRATED_RGB`.
const LCS_CALIBRATED_RGB: u32 = 0;

/// Info header revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeaderVersion {
    /// Windows 1.x bitmap.
    V1,
    /// Windows 2.x `BITMAPCOREHEADER`.
    V2,
    /// Windows 3.x `BITMAPINFOHEADER`.
    V3,
    /// Windows NT `BITMAPINFOHEADER` followed by RGB masks.
    V3Nt,
    /// Windows NT 4 / CE header with RGBA masks.
    V3Nt4,
    /// `BITMAPV4HEADER`.
    V4,
    /// `BITMAPV5HEADER`.
    V5,
    /// OS/2 1.x `BITMAPCOREHEADER`.
    Os21x,
    /// OS/2 2.x header truncated to 16 bytes.
    Os22xShort,
    /// Full OS/2 2.x `BITMAPINFOHEADER2`.
    Os22x,
}

impl fmt::Display for HeaderVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::V1 => "Windows 1.x",
            Self::V2 => "Windows 2.x",
            Self::V3 => "Windows 3.x",
            Self::V3Nt => "Windows NT",
            Self::V3Nt4 => "Windows NT 4",
            Self::V4 => "Windows V4",
            Self::V5 => "Windows V5",
            Self::Os21x => "OS/2 1.x",
            Self::Os22xShort => "short OS/2 2.x",
            Self::Os22x => "OS/2 2.x",
        })
    }
}

/// Pixel data encoding.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Compression {
    Rgb,
    Rle8,
    Rle4,
    Bitfields,
    Jpeg,
    Png,
    AlphaBitfields,
    Cmyk,
    CmykRle8,
    CmykRle4,
    /// OS/2 2.x CCITT group 3 1D.
    Huffman1d,
    /// OS/2 2.x 24-bit run-length encoding.
    Rle24,
}

impl Compression {
    fn from_windows(value: u32) -> Result<Self, BmpError> {
        Ok(match value {
            0 => Self::Rgb,
            1 => Self::Rle8,
            2 => Self::Rle4,
            3 => Self::Bitfields,
            4 => Self::Jpeg,
            5 => Self::Png,
            6 => Self::AlphaBitfields,
            11 => Self::Cmyk,
            12 => Self::CmykRle8,
            13 => Self::CmykRle4,
            other => return Err(BmpError::UnknownCompression(other)),
        })
    }

    /// OS/2 2.x reuses 3 and 4 for its own encodings.
    fn from_os2(value: u32) -> Result<Self, BmpError> {
        Ok(match value {
            0 => Self::Rgb,
            1 => Self::Rle8,
            2 => Self::Rle4,
            3 => Self::Huffman1d,
            4 => Self::Rle24,
            other => return Err(BmpError::UnknownCompression(other)),
        })
    }

    pub fn is_bitfields(self) -> bool {
        matches!(self, Self::Bitfields | Self::AlphaBitfields)
    }

    pub fn is_run_length(self) -> bool {
        matches!(self, Self::Rle4 | Self::Rle8 | Self::Rle24)
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rgb => "RGB",
            Self::Rle8 => "RLE-8",
            Self::Rle4 => "RLE-4",
            Self::Bitfields => "BITFIELDS",
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::AlphaBitfields => "ALPHABITFIELDS",
            Self::Cmyk => "CMYK",
            Self::CmykRle8 => "CMYK RLE-8",
            Self::CmykRle4 => "CMYK RLE-4",
            Self::Huffman1d => "Huffman 1D",
            Self::Rle24 => "RLE-24",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoV1 {
    pub width: u16,
    pub height: u16,
    /// Bytes per scanline, always even.
    pub byte_width: u16,
    pub planes: u8,
    pub bits_per_pixel: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoV2 {
    pub width: i16,
    pub height: i16,
    pub planes: u16,
    pub bits_per_pixel: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoOs21x {
    pub width: u16,
    pub height: u16,
    pub planes: u16,
    pub bits_per_pixel: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoOs22xShort {
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bits_per_pixel: u16,
}

/// Fields shared by every 40-byte-or-larger header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoV3 {
    pub width: i32,
    /// Negative for top-down bitmaps.
    pub height: i32,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub compression: Compression,
    /// Size of the pixel data; may be 0 for uncompressed bitmaps.
    pub image_size: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub colors_used: u32,
    pub colors_important: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RgbMasks {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoV3Nt {
    pub base: InfoV3,
    pub masks: RgbMasks,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoV3Nt4 {
    pub base: InfoV3,
    pub masks: RgbMasks,
    pub alpha_mask: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoOs22x {
    pub base: InfoV3,
    pub units: u16,
    pub reserved: u16,
    pub recording: u16,
    pub rendering: u16,
    pub size1: u32,
    pub size2: u32,
    pub color_encoding: u32,
    pub identifier: u32,
}

/// CIE XYZ coordinate in 2.30 fixed point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CieXyz {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CieXyzTriple {
    pub red: CieXyz,
    pub green: CieXyz,
    pub blue: CieXyz,
}

/// Colour space block of V4 and V5 headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorSpace {
    pub cs_type: u32,
    pub endpoints: CieXyzTriple,
    /// Red, green and blue tone response in 16.16 fixed point.
    pub gamma: [u32; 3],
}

impl ColorSpace {
    pub fn is_calibrated(&self) -> bool {
        self.cs_type == LCS_CALIBRATED_RGB
    }

    /// Per-channel gamma as floating point, when calibrated and non-zero.
    pub fn gamma_f32(&self) -> Option<[f32; 3]> {
        if !self.is_calibrated() || self.gamma.contains(&0) {
            return None;
        }
        Some(self.gamma.map(|g| g as f32 / 65536.0))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoV4 {
    pub base: InfoV3,
    pub masks: RgbMasks,
    pub alpha_mask: u32,
    pub color_space: ColorSpace,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoV5 {
    pub v4: InfoV4,
    pub intent: u32,
    pub profile_data: u32,
    pub profile_size: u32,
    pub reserved: u32,
}

/// Decoded info header, one variant per on-disk revision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InfoHeader {
    V1(InfoV1),
    V2(InfoV2),
    V3(InfoV3),
    V3Nt(InfoV3Nt),
    V3Nt4(InfoV3Nt4),
    V4(InfoV4),
    V5(InfoV5),
    Os21x(InfoOs21x),
    Os22xShort(InfoOs22xShort),
    Os22x(InfoOs22x),
}

/// Validated image geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Geometry {
    pub width: u32,
    pub height: u32,
    pub top_down: bool,
}

impl InfoHeader {
    pub fn version(&self) -> HeaderVersion {
        match self {
            Self::V1(_) => HeaderVersion::V1,
            Self::V2(_) => HeaderVersion::V2,
            Self::V3(_) => HeaderVersion::V3,
            Self::V3Nt(_) => HeaderVersion::V3Nt,
            Self::V3Nt4(_) => HeaderVersion::V3Nt4,
            Self::V4(_) => HeaderVersion::V4,
            Self::V5(_) => HeaderVersion::V5,
            Self::Os21x(_) => HeaderVersion::Os21x,
            Self::Os22xShort(_) => HeaderVersion::Os22xShort,
            Self::Os22x(_) => HeaderVersion::Os22x,
        }
    }

    /// The 40-byte core, for revisions that have one.
    fn base(&self) -> Option<&InfoV3> {
        match self {
            Self::V3(h) => Some(h),
            Self::V3Nt(h) => Some(&h.base),
            Self::V3Nt4(h) => Some(&h.base),
            Self::V4(h) => Some(&h.base),
            Self::V5(h) => Some(&h.v4.base),
            Self::Os22x(h) => Some(&h.base),
            Self::V1(_) | Self::V2(_) | Self::Os21x(_) | Self::Os22xShort(_) => None,
        }
    }

    /// Declared width, sign preserved.
    pub fn width(&self) -> i64 {
        match self {
            Self::V1(h) => h.width.into(),
            Self::V2(h) => h.width.into(),
            Self::Os21x(h) => h.width.into(),
            Self::Os22xShort(h) => h.width.into(),
            _ => self.base().map_or(0, |b| b.width.into()),
        }
    }

    /// Declared height, negative for top-down bitmaps.
    pub fn height(&self) -> i64 {
        match self {
            Self::V1(h) => h.height.into(),
            Self::V2(h) => h.height.into(),
            Self::Os21x(h) => h.height.into(),
            Self::Os22xShort(h) => h.height.into(),
            _ => self.base().map_or(0, |b| b.height.into()),
        }
    }

    pub fn planes(&self) -> u16 {
        match self {
            Self::V1(h) => h.planes.into(),
            Self::V2(h) => h.planes,
            Self::Os21x(h) => h.planes,
            Self::Os22xShort(h) => h.planes,
            _ => self.base().map_or(1, |b| b.planes),
        }
    }

    pub fn bits_per_pixel(&self) -> u16 {
        match self {
            Self::V1(h) => h.bits_per_pixel.into(),
            Self::V2(h) => h.bits_per_pixel,
            Self::Os21x(h) => h.bits_per_pixel,
            Self::Os22xShort(h) => h.bits_per_pixel,
            _ => self.base().map_or(0, |b| b.bits_per_pixel),
        }
    }

    pub fn compression(&self) -> Compression {
        self.base().map_or(Compression::Rgb, |b| b.compression)
    }

    /// Declared pixel data size, 0 when unknown.
    pub fn image_size(&self) -> u32 {
        self.base().map_or(0, |b| b.image_size)
    }

    /// Resolution in pixels per meter, (0, 0) when the header has none.
    pub fn pels_per_meter(&self) -> (i32, i32) {
        self.base()
            .map_or((0, 0), |b| (b.x_pels_per_meter, b.y_pels_per_meter))
    }

    /// Resolution converted to dots per inch.
    pub fn dpi(&self) -> (u32, u32) {
        let (x, y) = self.pels_per_meter();
        (ppm_to_dpi(x), ppm_to_dpi(y))
    }

    pub fn colors_used(&self) -> u32 {
        self.base().map_or(0, |b| b.colors_used)
    }

    pub fn colors_important(&self) -> u32 {
        self.base().map_or(0, |b| b.colors_important)
    }

    /// Number of palette entries the header calls for.
    ///
    /// Indexed depths default to `1 << bits_per_pixel` when the header
    /// declares none; direct-colour depths only have the optional palette
    /// they declare.
    pub fn colors_count(&self) -> u32 {
        let bpp = self.bits_per_pixel();
        let used = self.colors_used();
        if bpp <= 8 && used == 0 {
            1 << bpp
        } else {
            used
        }
    }

    /// Red, green, blue and alpha masks stored in the header.
    pub fn masks(&self) -> Option<[u32; 4]> {
        let (rgb, alpha) = match self {
            Self::V3Nt(h) => (h.masks, 0),
            Self::V3Nt4(h) => (h.masks, h.alpha_mask),
            Self::V4(h) => (h.masks, h.alpha_mask),
            Self::V5(h) => (h.v4.masks, h.v4.alpha_mask),
            _ => return None,
        };
        Some([rgb.red, rgb.green, rgb.blue, alpha])
    }

    pub fn color_space(&self) -> Option<&ColorSpace> {
        match self {
            Self::V4(h) => Some(&h.color_space),
            Self::V5(h) => Some(&h.v4.color_space),
            _ => None,
        }
    }

    /// Bytes per palette entry on disk.
    pub fn palette_entry_size(&self) -> u64 {
        match self {
            Self::Os21x(_) => 3,
            _ => 4,
        }
    }

    /// Whether the palette is stored in the file (V1 bitmaps never store one).
    pub fn has_stored_palette(&self) -> bool {
        !matches!(self, Self::V1(_))
    }

    /// Bytes per stored scanline, padding included.
    pub(crate) fn stride(&self, width: u32) -> u64 {
        match self {
            Self::V1(h) => h.byte_width.into(),
            _ => padded_stride(width, self.bits_per_pixel()),
        }
    }

    /// Check the header for coherence, collecting warnings.
    pub(crate) fn validate(&self, warnings: &mut Warnings) -> Result<Geometry, BmpError> {
        let bpp = self.bits_per_pixel();
        match bpp {
            1 | 4 | 8 | 16 | 24 | 32 | 64 => {}
            2 => warnings.push(Warning::WindowsCeBitsPerPixel),
            65..=u16::MAX => return Err(BmpError::BitsPerPixelTooLarge(bpp)),
            _ => return Err(BmpError::BadBitsPerPixelValue(bpp)),
        }

        let (width, height) = (self.width(), self.height());
        if width < 0 {
            return Err(BmpError::NegativeWidth(width as i32));
        }
        if width == 0 || height == 0 {
            return Err(BmpError::InvalidImageDimensions { width, height });
        }
        let top_down = height < 0 || matches!(self, Self::V1(_));
        let geometry = Geometry {
            width: width as u32,
            height: height.unsigned_abs() as u32,
            top_down,
        };

        if let Self::V1(h) = self {
            if !matches!(bpp, 1 | 4 | 8) {
                return Err(BmpError::BadBitsPerPixelValue(bpp));
            }
            if h.planes != 1 {
                return Err(BmpError::UnsupportedPlanes(h.planes.into()));
            }
            let packed = (u32::from(h.width) * u32::from(h.bits_per_pixel)).div_ceil(8);
            if u32::from(h.byte_width) < packed || h.byte_width % 2 != 0 {
                return Err(BmpError::InvalidByteWidth {
                    byte_width: h.byte_width,
                    width: h.width,
                });
            }
        } else if self.planes() != 1 {
            warnings.push(Warning::UnusualPlanesValue);
        }

        self.validate_compression(bpp, height < 0, warnings)?;

        let (x, y) = self.pels_per_meter();
        if x < 0 || y < 0 {
            warnings.push(Warning::NegativeResolution);
        } else if x > 0 && y > 0 {
            let (lo, hi) = (x.min(y) as f64, x.max(y) as f64);
            if hi / lo > MAX_RESOLUTION_RATIO {
                warnings.push(Warning::IncoherentResolution);
            }
        }

        Ok(geometry)
    }

    fn validate_compression(
        &self,
        bpp: u16,
        top_down: bool,
        warnings: &mut Warnings,
    ) -> Result<(), BmpError> {
        let compression = self.compression();
        let incompatible = || BmpError::IncompatibleCompression {
            compression,
            bits_per_pixel: bpp,
        };
        match compression {
            Compression::Rgb => Ok(()),
            Compression::Jpeg | Compression::Png if top_down => {
                Err(BmpError::ForbiddenTopDownOrientation(compression))
            }
            Compression::Jpeg => Err(BmpError::NotYetImplementedJpegDecoding),
            Compression::Png => Err(BmpError::NotYetImplementedPngDecoding),
            Compression::Huffman1d if bpp != 1 => Err(incompatible()),
            Compression::Huffman1d => Err(BmpError::NotYetImplementedHuffmanDecoding),
            Compression::Cmyk | Compression::CmykRle8 | Compression::CmykRle4 => {
                Err(BmpError::UnsupportedCompression(compression))
            }
            Compression::Rle4 | Compression::Rle8 | Compression::Rle24 => {
                let expected = match compression {
                    Compression::Rle4 => 4,
                    Compression::Rle8 => 8,
                    _ => 24,
                };
                if bpp != expected {
                    return Err(incompatible());
                }
                if top_down {
                    warnings.push(Warning::ForbiddenTopDownOrientation);
                }
                Ok(())
            }
            Compression::Bitfields | Compression::AlphaBitfields => {
                if bpp != 16 && bpp != 32 {
                    return Err(incompatible());
                }
                if self.masks().is_none() {
                    return Err(BmpError::CompressionNotAllowedForHeader {
                        compression,
                        header: self.version(),
                    });
                }
                Ok(())
            }
        }
    }
}

/// `round(ppm * 2.54 / 100)`, negatives clamp to 0.
fn ppm_to_dpi(ppm: i32) -> u32 {
    (f64::from(ppm) * 0.0254).round().max(0.0) as u32
}

/// Scanline length rounded up to a 4-byte boundary.
pub(crate) fn padded_stride(width: u32, bits_per_pixel: u16) -> u64 {
    (u64::from(width) * u64::from(bits_per_pixel)).div_ceil(32) * 4
}

/// Scanline length without padding.
pub(crate) fn packed_row_bytes(width: u32, bits_per_pixel: u16) -> u64 {
    (u64::from(width) * u64::from(bits_per_pixel)).div_ceil(8)
}

/// Read the info header that follows `file`, dispatching on its size field.
///
/// On return the stream is positioned just past the header and any masks
/// stored after it, at the start of the palette.
pub(crate) fn read_info_header<R: Read + Seek>(
    stream: &mut ByteStream<R>,
    file: &FileHeader,
) -> Result<InfoHeader, BmpError> {
    if let FileHeader::V1 = file {
        return read_v1(stream);
    }

    let size = stream.read_u32()?;
    let body_start = stream.position();
    match size {
        SIZE_CORE => {
            let v2 = read_v2(stream)?;
            if core_header_is_os21x(&v2, stream.position(), file, stream.len()) {
                stream.seek_to(body_start)?;
                Ok(InfoHeader::Os21x(read_os21x(stream)?))
            } else {
                Ok(InfoHeader::V2(v2))
            }
        }
        SIZE_OS22X_SHORT => Ok(InfoHeader::Os22xShort(InfoOs22xShort {
            width: stream.read_i32()?,
            height: stream.read_i32()?,
            planes: stream.read_u16()?,
            bits_per_pixel: stream.read_u16()?,
        })),
        SIZE_V3 => {
            let v3 = read_v3_base(stream, false)?;
            if !v3.compression.is_bitfields() {
                return Ok(InfoHeader::V3(v3));
            }
            // The masks trail the 40-byte header; load again in the NT layout.
            stream.seek_to(body_start)?;
            let base = read_v3_base(stream, false)?;
            let masks = read_rgb_masks(stream)?;
            if base.compression == Compression::AlphaBitfields {
                let alpha_mask = stream.read_u32()?;
                Ok(InfoHeader::V3Nt4(InfoV3Nt4 {
                    base,
                    masks,
                    alpha_mask,
                }))
            } else {
                Ok(InfoHeader::V3Nt(InfoV3Nt { base, masks }))
            }
        }
        SIZE_V3_NT => Ok(InfoHeader::V3Nt(InfoV3Nt {
            base: read_v3_base(stream, false)?,
            masks: read_rgb_masks(stream)?,
        })),
        SIZE_V3_NT4 => Ok(InfoHeader::V3Nt4(InfoV3Nt4 {
            base: read_v3_base(stream, false)?,
            masks: read_rgb_masks(stream)?,
            alpha_mask: stream.read_u32()?,
        })),
        SIZE_OS22X => Ok(InfoHeader::Os22x(InfoOs22x {
            base: read_v3_base(stream, true)?,
            units: stream.read_u16()?,
            reserved: stream.read_u16()?,
            recording: stream.read_u16()?,
            rendering: stream.read_u16()?,
            size1: stream.read_u32()?,
            size2: stream.read_u32()?,
            color_encoding: stream.read_u32()?,
            identifier: stream.read_u32()?,
        })),
        SIZE_V4 => Ok(InfoHeader::V4(read_v4(stream)?)),
        SIZE_V5 => Ok(InfoHeader::V5(InfoV5 {
            v4: read_v4(stream)?,
            intent: stream.read_u32()?,
            profile_data: stream.read_u32()?,
            profile_size: stream.read_u32()?,
            reserved: stream.read_u32()?,
        })),
        other => Err(BmpError::InvalidHeaderSize(other)),
    }
}

/// Whether a 12-byte header parsed as Windows 2.x should rather be OS/2 1.x.
///
/// A Windows 2.x palette uses 4-byte entries; when that palette would run into
/// the declared pixel data, or leave too little room for the bitmap, the file
/// was written with the 3-byte OS/2 1.x entries.
fn core_header_is_os21x(v2: &InfoV2, header_end: u64, file: &FileHeader, stream_len: u64) -> bool {
    let colors: u64 = if v2.bits_per_pixel <= 8 {
        1 << v2.bits_per_pixel
    } else {
        0
    };
    let palette_end = header_end + colors * 4;
    match file.content_offset() {
        Some(offset) => u64::from(offset) < palette_end,
        None => {
            let bitmap = padded_stride(u32::from(v2.width.unsigned_abs()), v2.bits_per_pixel)
                * u64::from(v2.height.unsigned_abs());
            stream_len < palette_end + bitmap
        }
    }
}

fn read_v1<R: Read + Seek>(stream: &mut ByteStream<R>) -> Result<InfoHeader, BmpError> {
    Ok(InfoHeader::V1(InfoV1 {
        width: stream.read_u16()?,
        height: stream.read_u16()?,
        byte_width: stream.read_u16()?,
        planes: stream.read_u8()?,
        bits_per_pixel: stream.read_u8()?,
    }))
}

fn read_v2<R: Read + Seek>(stream: &mut ByteStream<R>) -> Result<InfoV2, BmpError> {
    Ok(InfoV2 {
        width: stream.read_i16()?,
        height: stream.read_i16()?,
        planes: stream.read_u16()?,
        bits_per_pixel: stream.read_u16()?,
    })
}

fn read_os21x<R: Read + Seek>(stream: &mut ByteStream<R>) -> Result<InfoOs21x, BmpError> {
    Ok(InfoOs21x {
        width: stream.read_u16()?,
        height: stream.read_u16()?,
        planes: stream.read_u16()?,
        bits_per_pixel: stream.read_u16()?,
    })
}

fn read_v3_base<R: Read + Seek>(stream: &mut ByteStream<R>, os2: bool) -> Result<InfoV3, BmpError> {
    let width = stream.read_i32()?;
    let height = stream.read_i32()?;
    let planes = stream.read_u16()?;
    let bits_per_pixel = stream.read_u16()?;
    let raw = stream.read_u32()?;
    let compression = if os2 {
        Compression::from_os2(raw)?
    } else {
        Compression::from_windows(raw)?
    };
    Ok(InfoV3 {
        width,
        height,
        planes,
        bits_per_pixel,
        compression,
        image_size: stream.read_u32()?,
        x_pels_per_meter: stream.read_i32()?,
        y_pels_per_meter: stream.read_i32()?,
        colors_used: stream.read_u32()?,
        colors_important: stream.read_u32()?,
    })
}

fn read_rgb_masks<R: Read + Seek>(stream: &mut ByteStream<R>) -> Result<RgbMasks, BmpError> {
    Ok(RgbMasks {
        red: stream.read_u32()?,
        green: stream.read_u32()?,
        blue: stream.read_u32()?,
    })
}

fn read_xyz<R: Read + Seek>(stream: &mut ByteStream<R>) -> Result<CieXyz, BmpError> {
    Ok(CieXyz {
        x: stream.read_i32()?,
        y: stream.read_i32()?,
        z: stream.read_i32()?,
    })
}

fn read_v4<R: Read + Seek>(stream: &mut ByteStream<R>) -> Result<InfoV4, BmpError> {
    let base = read_v3_base(stream, false)?;
    let masks = read_rgb_masks(stream)?;
    let alpha_mask = stream.read_u32()?;
    let cs_type = stream.read_u32()?;
    let endpoints = CieXyzTriple {
        red: read_xyz(stream)?,
        green: read_xyz(stream)?,
        blue: read_xyz(stream)?,
    };
    let gamma = [stream.read_u32()?, stream.read_u32()?, stream.read_u32()?];
    Ok(InfoV4 {
        base,
        masks,
        alpha_mask,
        color_space: ColorSpace {
            cs_type,
            endpoints,
            gamma,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bmp::file_header::BitmapFileHeader;

    fn bm_file(offset: u32) -> FileHeader {
        FileHeader::Bitmap(BitmapFileHeader {
            file_size: 0,
            reserved: [0, 0],
            content_offset: offset,
        })
    }

    /// Info headers follow the 14-byte file header; tests leave it zeroed.
    fn stream_at_header(data: &[u8]) -> ByteStream<std::io::Cursor<&[u8]>> {
        let mut s = ByteStream::from_bytes(data);
        s.seek_to(14).unwrap();
        s
    }

    fn v3_bytes(size: u32, width: i32, height: i32, bpp: u16, compression: u32) -> Vec<u8> {
        let mut v = vec![0u8; 14];
        v.extend_from_slice(&size.to_le_bytes());
        v.extend_from_slice(&width.to_le_bytes());
        v.extend_from_slice(&height.to_le_bytes());
        v.extend_from_slice(&1u16.to_le_bytes());
        v.extend_from_slice(&bpp.to_le_bytes());
        v.extend_from_slice(&compression.to_le_bytes());
        v.extend_from_slice(&[0u8; 20]);
        v
    }

    fn core_bytes(width: u16, height: u16, bpp: u16) -> Vec<u8> {
        let mut v = vec![0u8; 14];
        v.extend_from_slice(&12u32.to_le_bytes());
        v.extend_from_slice(&width.to_le_bytes());
        v.extend_from_slice(&height.to_le_bytes());
        v.extend_from_slice(&1u16.to_le_bytes());
        v.extend_from_slice(&bpp.to_le_bytes());
        v
    }

    #[test]
    fn forty_byte_header_is_v3() {
        let mut data = v3_bytes(40, 4, 2, 24, 0);
        data.resize(100, 0);
        let mut s = stream_at_header(&data);
        let h = read_info_header(&mut s, &bm_file(54)).unwrap();
        assert_eq!(h.version(), HeaderVersion::V3);
        assert_eq!(s.position(), 54);
    }

    #[test]
    fn forty_byte_bitfields_header_reloads_as_nt() {
        let mut data = v3_bytes(40, 4, 2, 16, 3);
        for mask in [0xf800u32, 0x07e0, 0x001f] {
            data.extend_from_slice(&mask.to_le_bytes());
        }
        data.resize(100, 0);
        let mut s = stream_at_header(&data);
        let h = read_info_header(&mut s, &bm_file(66)).unwrap();
        assert_eq!(h.version(), HeaderVersion::V3Nt);
        assert_eq!(h.masks(), Some([0xf800, 0x07e0, 0x001f, 0]));
        assert_eq!(s.position(), 66);
    }

    #[test]
    fn core_header_with_three_byte_palette_is_os2() {
        // 1 bpp: two 3-byte entries end at 14 + 12 + 6 = 32, four-byte ones at 34.
        let mut data = core_bytes(8, 1, 1);
        data.resize(100, 0);
        let mut s = stream_at_header(&data);
        let h = read_info_header(&mut s, &bm_file(32)).unwrap();
        assert_eq!(h.version(), HeaderVersion::Os21x);
        assert_eq!(h.palette_entry_size(), 3);
    }

    #[test]
    fn core_header_with_four_byte_palette_stays_v2() {
        let mut data = core_bytes(8, 1, 1);
        data.resize(100, 0);
        let mut s = stream_at_header(&data);
        let h = read_info_header(&mut s, &bm_file(34)).unwrap();
        assert_eq!(h.version(), HeaderVersion::V2);
        assert_eq!(h.palette_entry_size(), 4);
    }

    #[test]
    fn core_header_sign_does_not_pick_os2() {
        let mut data = core_bytes(2, (-2i16) as u16, 24);
        data.resize(100, 0);
        let mut s = stream_at_header(&data);
        let h = read_info_header(&mut s, &bm_file(26)).unwrap();
        assert_eq!(h.version(), HeaderVersion::V2);
        assert_eq!(h.height(), -2);

        let mut data = core_bytes((-2i16) as u16, 2, 24);
        data.resize(100, 0);
        let mut s = stream_at_header(&data);
        let h = read_info_header(&mut s, &bm_file(26)).unwrap();
        assert!(matches!(
            h.validate(&mut Warnings::new()),
            Err(BmpError::NegativeWidth(-2))
        ));
    }

    #[test]
    fn unknown_size_is_invalid_header_size() {
        let mut data = vec![0u8; 14];
        data.extend_from_slice(&41u32.to_le_bytes());
        let mut s = stream_at_header(&data);
        assert!(matches!(
            read_info_header(&mut s, &bm_file(54)),
            Err(BmpError::InvalidHeaderSize(41))
        ));
    }

    fn parse_v3(width: i32, height: i32, bpp: u16, compression: u32) -> InfoHeader {
        let mut data = v3_bytes(40, width, height, bpp, compression);
        data.resize(100, 0);
        let mut s = stream_at_header(&data);
        read_info_header(&mut s, &bm_file(54)).unwrap()
    }

    #[test]
    fn three_bits_per_pixel_is_rejected() {
        let h = parse_v3(4, 4, 3, 0);
        assert!(matches!(
            h.validate(&mut Warnings::new()),
            Err(BmpError::BadBitsPerPixelValue(3))
        ));
        let h = parse_v3(4, 4, 65, 0);
        assert!(matches!(
            h.validate(&mut Warnings::new()),
            Err(BmpError::BitsPerPixelTooLarge(65))
        ));
    }

    #[test]
    fn two_bits_per_pixel_warns() {
        let h = parse_v3(4, 4, 2, 0);
        let mut w = Warnings::new();
        h.validate(&mut w).unwrap();
        assert_eq!(w.as_slice(), &[Warning::WindowsCeBitsPerPixel]);
        assert_eq!(h.colors_count(), 4);
    }

    #[test]
    fn dimensions_are_validated() {
        assert!(matches!(
            parse_v3(-4, 4, 24, 0).validate(&mut Warnings::new()),
            Err(BmpError::NegativeWidth(-4))
        ));
        assert!(matches!(
            parse_v3(4, 0, 24, 0).validate(&mut Warnings::new()),
            Err(BmpError::InvalidImageDimensions { .. })
        ));
        let g = parse_v3(4, -3, 24, 0)
            .validate(&mut Warnings::new())
            .unwrap();
        assert_eq!((g.width, g.height, g.top_down), (4, 3, true));
    }

    #[test]
    fn compression_must_match_depth() {
        assert!(matches!(
            parse_v3(4, 4, 24, 1).validate(&mut Warnings::new()),
            Err(BmpError::IncompatibleCompression { .. })
        ));
        assert!(matches!(
            parse_v3(4, 4, 24, 4).validate(&mut Warnings::new()),
            Err(BmpError::NotYetImplementedJpegDecoding)
        ));
        assert!(matches!(
            parse_v3(4, -4, 24, 5).validate(&mut Warnings::new()),
            Err(BmpError::ForbiddenTopDownOrientation(Compression::Png))
        ));
    }

    #[test]
    fn top_down_rle_warns() {
        let mut w = Warnings::new();
        parse_v3(4, -4, 8, 1).validate(&mut w).unwrap();
        assert_eq!(w.as_slice(), &[Warning::ForbiddenTopDownOrientation]);
    }

    #[test]
    fn dpi_conversion_rounds() {
        let mut data = v3_bytes(40, 1, 1, 24, 0);
        data[38..42].copy_from_slice(&2835i32.to_le_bytes());
        data[42..46].copy_from_slice(&11811i32.to_le_bytes());
        data.resize(100, 0);
        let mut s = stream_at_header(&data);
        let h = read_info_header(&mut s, &bm_file(54)).unwrap();
        assert_eq!(h.dpi(), (72, 300));
        let mut w = Warnings::new();
        h.validate(&mut w).unwrap();
        assert_eq!(w.as_slice(), &[Warning::IncoherentResolution]);
    }
}
