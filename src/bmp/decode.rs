//! Pixel decoders, one per (bits per pixel, compression) combination.
//!
//! Every decoder writes `width * height` pixels in the order the scanlines are
//! stored on disk. Reordering to top-down happens once, after decoding.

use std::io::{Read, Seek};

use rgb::alt::BGRA8;

use super::bitfield::PixelMasks;
use super::color_map::ColorMap;
use super::gamma::hdr_to_u8_table;
use super::info_header::{Compression, Geometry, InfoHeader, packed_row_bytes};
use super::rle::{RleKind, decode_rle};
use crate::error::BmpError;
use crate::pixel::{BmpPixel, Bgra16, HDR_ONE, PixelLayout, hdr_to_u8};
use crate::stream::ByteStream;
use crate::warning::{Warning, Warnings};

/// Everything a decoder needs besides the stream and the output buffer.
pub(crate) struct BitmapInput<'a> {
    pub header: &'a InfoHeader,
    pub geometry: Geometry,
    pub color_map: &'a ColorMap,
    /// Exponent applied when narrowing 64 bpp channels to 8 bits.
    pub hdr_exponent: f32,
    /// Nothing but pixel data follows `data_start` in the stream.
    pub whole_file: bool,
}

impl BitmapInput<'_> {
    pub(super) fn width(&self) -> usize {
        self.geometry.width as usize
    }

    pub(super) fn height(&self) -> usize {
        self.geometry.height as usize
    }
}

/// Concrete decoder for one bitmap encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BitmapDecoder {
    /// Uncompressed 1, 2, 4 or 8 bit palette indices.
    Indexed(u16),
    Rle(RleKind),
    Bitfields16,
    Bgr24,
    Bitfields32,
    Hdr64,
}

impl BitmapDecoder {
    /// Pick the decoder for a depth and compression, `None` when the pair has
    /// no decoder.
    pub(crate) fn select(bits_per_pixel: u16, compression: Compression) -> Option<Self> {
        use Compression::*;
        Some(match (bits_per_pixel, compression) {
            (1 | 2 | 4 | 8, Rgb) => Self::Indexed(bits_per_pixel),
            (4, Rle4) => Self::Rle(RleKind::Four),
            (8, Rle8) => Self::Rle(RleKind::Eight),
            (24, Rle24) => Self::Rle(RleKind::TwentyFour),
            (16, Rgb | Bitfields | AlphaBitfields) => Self::Bitfields16,
            (24, Rgb) => Self::Bgr24,
            (32, Rgb | Bitfields | AlphaBitfields) => Self::Bitfields32,
            (64, Rgb) => Self::Hdr64,
            _ => return None,
        })
    }

    /// Decode into `out`, which holds `width * height` pixels pre-set to the
    /// fill value. The stream must be at the first byte of pixel data.
    pub(crate) fn decode<P: BmpPixel, R: Read + Seek>(
        self,
        stream: &mut ByteStream<R>,
        input: &BitmapInput<'_>,
        out: &mut [P],
        warnings: &mut Warnings,
    ) -> Result<(), BmpError> {
        match self {
            Self::Indexed(bits) => decode_indexed(bits, stream, input, out, warnings),
            Self::Rle(kind) => decode_rle(kind, stream, input, out, warnings),
            Self::Bitfields16 | Self::Bitfields32 => {
                decode_bitfields(stream, input, out, warnings)
            }
            Self::Bgr24 => decode_direct(stream, input, out, 3, |px| {
                P::from_bgra8(BGRA8 {
                    b: px[0],
                    g: px[1],
                    r: px[2],
                    a: 255,
                })
            }),
            Self::Hdr64 => decode_hdr(stream, input, out),
        }
    }
}

// ── Scanlines ───────────────────────────────────────────────────────

/// Feed scanlines to `row` in disk order, dropping the row padding.
///
/// Returns the number of complete rows. When the stream ends early, the
/// partial row left is passed to `row` before returning.
fn for_each_scanline<R: Read + Seek>(
    stream: &mut ByteStream<R>,
    stride: u64,
    row_bytes: usize,
    height: usize,
    mut row: impl FnMut(usize, &[u8]),
) -> Result<usize, BmpError> {
    let total = stride.saturating_mul(height as u64);
    if stride == row_bytes as u64 && stream.remaining() >= total {
        let data = stream.read_vec(total as usize)?;
        for (y, line) in data.chunks_exact(row_bytes).enumerate() {
            row(y, line);
        }
        return Ok(height);
    }

    let padding = stride.saturating_sub(row_bytes as u64);
    let mut line = vec![0u8; row_bytes];
    for y in 0..height {
        let remaining = stream.remaining();
        if remaining < row_bytes as u64 {
            let partial = &mut line[..remaining as usize];
            stream.read_exact(partial)?;
            if !partial.is_empty() {
                row(y, partial);
            }
            return Ok(y);
        }
        stream.read_exact(&mut line)?;
        row(y, &line);
        stream.skip(padding.min(stream.remaining()))?;
    }
    Ok(height)
}

fn scanline_bytes(input: &BitmapInput<'_>) -> Result<usize, BmpError> {
    let bytes = packed_row_bytes(input.geometry.width, input.header.bits_per_pixel());
    usize::try_from(bytes).map_err(|_| BmpError::DimensionsTooLarge {
        width: input.geometry.width,
        height: input.geometry.height,
    })
}

// ── Indexed ─────────────────────────────────────────────────────────

/// Split packed indices, most significant bits first, into one byte each.
/// Returns how many indices were produced.
fn unpack_indices(bits: u16, packed: &[u8], out: &mut [u8]) -> usize {
    if bits == 8 {
        let n = out.len().min(packed.len());
        out[..n].copy_from_slice(&packed[..n]);
        return n;
    }
    let per_byte = usize::from(8 / bits);
    let mask = (1u8 << bits) - 1;
    let n = out.len().min(packed.len() * per_byte);
    for (chunk, &byte) in out[..n].chunks_mut(per_byte).zip(packed) {
        for (i, v) in chunk.iter_mut().enumerate() {
            let shift = 8 - bits as usize * (i + 1);
            *v = (byte >> shift) & mask;
        }
    }
    n
}

fn decode_indexed<P: BmpPixel, R: Read + Seek>(
    bits: u16,
    stream: &mut ByteStream<R>,
    input: &BitmapInput<'_>,
    out: &mut [P],
    warnings: &mut Warnings,
) -> Result<(), BmpError> {
    let (width, height) = (input.width(), input.height());
    let stride = input.header.stride(input.geometry.width);
    let row_bytes = scanline_bytes(input)?;
    let map = input.color_map;

    let mut indices = vec![0u8; width];
    let mut bad = false;
    let rows = for_each_scanline(stream, stride, row_bytes, height, |y, line| {
        let n = unpack_indices(bits, line, &mut indices);
        for (dst, &i) in out[y * width..][..n].iter_mut().zip(&indices[..n]) {
            *dst = P::from_bgra8(map.lookup(i, &mut bad));
        }
    })?;

    if rows < height {
        warnings.push(Warning::NotEnoughIndicesInBitmap);
    }
    if u64::from(input.header.image_size()) > stride * height as u64 {
        warnings.push(Warning::TooManyIndicesInBitmap);
    }
    if bad {
        warnings.push(Warning::BadPaletteIndices);
    }
    Ok(())
}

// ── Direct colour ───────────────────────────────────────────────────

fn decode_direct<P: BmpPixel, R: Read + Seek>(
    stream: &mut ByteStream<R>,
    input: &BitmapInput<'_>,
    out: &mut [P],
    pixel_bytes: usize,
    mut convert: impl FnMut(&[u8]) -> P,
) -> Result<(), BmpError> {
    let (width, height) = (input.width(), input.height());
    let stride = input.header.stride(input.geometry.width);
    let rows = for_each_scanline(stream, stride, scanline_bytes(input)?, height, |y, line| {
        for (dst, px) in out[y * width..][..width]
            .iter_mut()
            .zip(line.chunks_exact(pixel_bytes))
        {
            *dst = convert(px);
        }
    })?;
    if rows < height {
        return Err(BmpError::EndOfFile);
    }
    Ok(())
}

fn decode_bitfields<P: BmpPixel, R: Read + Seek>(
    stream: &mut ByteStream<R>,
    input: &BitmapInput<'_>,
    out: &mut [P],
    warnings: &mut Warnings,
) -> Result<(), BmpError> {
    let masks = PixelMasks::for_header(input.header, warnings)?;
    let pixel_bytes = if input.header.bits_per_pixel() == 16 { 2 } else { 4 };
    let mut alpha_seen = false;

    decode_direct(stream, input, out, pixel_bytes, |px| {
        let word = match *px {
            [lo, hi] => u32::from(u16::from_le_bytes([lo, hi])),
            [b0, b1, b2, b3] => u32::from_le_bytes([b0, b1, b2, b3]),
            _ => 0,
        };
        let a = if masks.alpha.is_empty() {
            255
        } else {
            let a = masks.alpha.component(word);
            alpha_seen |= a != 0;
            a
        };
        P::from_bgra8(BGRA8 {
            b: masks.blue.component(word),
            g: masks.green.component(word),
            r: masks.red.component(word),
            a,
        })
    })?;

    // Default masks read the unused top bits as alpha; all zero means opaque.
    if masks.defaulted && !alpha_seen && !masks.alpha.is_empty() && P::LAYOUT.has_alpha() {
        for px in out.iter_mut() {
            let mut c = px.to_bgra8();
            c.a = 255;
            *px = P::from_bgra8(c);
        }
    }
    Ok(())
}

fn decode_hdr<P: BmpPixel, R: Read + Seek>(
    stream: &mut ByteStream<R>,
    input: &BitmapInput<'_>,
    out: &mut [P],
) -> Result<(), BmpError> {
    let channel = |px: &[u8], i: usize| u16::from_le_bytes([px[2 * i], px[2 * i + 1]]);

    if P::LAYOUT == PixelLayout::Bgra16 {
        return decode_direct(stream, input, out, 8, |px| {
            P::from_bgra16(Bgra16 {
                b: channel(px, 0),
                g: channel(px, 1),
                r: channel(px, 2),
                a: channel(px, 3),
            })
        });
    }

    let table = (input.hdr_exponent != 1.0).then(|| hdr_to_u8_table(input.hdr_exponent));
    let narrow = |v: u16| match &table {
        Some(t) => t[usize::from(v.min(HDR_ONE))],
        None => hdr_to_u8(v),
    };
    decode_direct(stream, input, out, 8, |px| {
        P::from_bgra8(BGRA8 {
            b: narrow(channel(px, 0)),
            g: narrow(channel(px, 1)),
            r: narrow(channel(px, 2)),
            a: hdr_to_u8(channel(px, 3)),
        })
    })
}
