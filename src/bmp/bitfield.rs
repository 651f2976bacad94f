//! Colour component extraction from 16- and 32-bit pixel words.

use super::info_header::InfoHeader;
use crate::error::BmpError;
use crate::warning::{Warning, Warnings};

/// Multiplier that replicates an N-bit value across 8 bits (indexed by N).
const MUL_TABLE: [u32; 9] = [
    0,    // 0 bits
    0xff, // 1 bit:  0b11111111
    0x55, // 2 bits: 0b01010101
    0x49, // 3 bits: 0b01001001
    0x11, // 4 bits: 0b00010001
    0x21, // 5 bits: 0b00100001
    0x41, // 6 bits: 0b01000001
    0x81, // 7 bits: 0b10000001
    0x01, // 8 bits: 0b00000001
];

const SHIFT_TABLE: [u32; 9] = [0, 0, 0, 1, 0, 2, 4, 6, 0];

/// Rescale an N-bit component to the full 8-bit range.
#[inline]
pub(crate) fn scale_to_u8(value: u32, bits: u32) -> u8 {
    if bits > 8 {
        (value >> (bits - 8)) as u8
    } else {
        ((value * MUL_TABLE[bits as usize]) >> SHIFT_TABLE[bits as usize]) as u8
    }
}

/// One channel's mask, analysed once per decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BitfieldMask {
    /// Channel not present.
    Empty,
    /// A single run of set bits.
    Contiguous { mask: u32, shift: u32, bits: u32 },
    /// Scattered bits, stored as bit positions from most to least significant.
    Discontiguous { indices: Vec<u8> },
}

impl BitfieldMask {
    pub fn new(mask: u32) -> Self {
        if mask == 0 {
            return Self::Empty;
        }
        let shift = mask.trailing_zeros();
        let bits = mask.count_ones();
        if (mask >> shift).count_ones() == (mask >> shift).trailing_ones() {
            Self::Contiguous { mask, shift, bits }
        } else {
            let indices = (0..32u8).rev().filter(|&i| mask & (1 << i) != 0).collect();
            Self::Discontiguous { indices }
        }
    }

    /// Width of the component in bits.
    pub fn bits(&self) -> u32 {
        match self {
            Self::Empty => 0,
            Self::Contiguous { bits, .. } => *bits,
            Self::Discontiguous { indices } => indices.len() as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Raw component value, right-aligned.
    #[inline]
    pub fn extract(&self, word: u32) -> u32 {
        match self {
            Self::Empty => 0,
            Self::Contiguous { mask, shift, .. } => (word & mask) >> shift,
            Self::Discontiguous { indices } => indices
                .iter()
                .fold(0, |acc, &i| (acc << 1) | ((word >> i) & 1)),
        }
    }

    /// Component value rescaled to 0..=255.
    #[inline]
    pub fn component(&self, word: u32) -> u8 {
        scale_to_u8(self.extract(word), self.bits())
    }
}

/// Masks for the four channels of a 16- or 32-bit bitmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PixelMasks {
    pub red: BitfieldMask,
    pub green: BitfieldMask,
    pub blue: BitfieldMask,
    pub alpha: BitfieldMask,
    /// The masks are the per-depth defaults rather than stored in the header.
    pub defaulted: bool,
}

const DEFAULT_MASKS_16: [u32; 4] = [0x7c00, 0x03e0, 0x001f, 0x8000];
const DEFAULT_MASKS_32: [u32; 4] = [0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0xff00_0000];

impl PixelMasks {
    /// Analyse the masks that apply to `header`.
    ///
    /// Stored masks are only honoured with bitfield compression; everything
    /// else uses 5-5-5-1 for 16 bits and 8-8-8-8 for 32 bits.
    pub(crate) fn for_header(header: &InfoHeader, warnings: &mut Warnings) -> Result<Self, BmpError> {
        let bpp = header.bits_per_pixel();
        let stored = if header.compression().is_bitfields() {
            header.masks()
        } else {
            None
        };
        let defaulted = stored.is_none();
        let mut masks = stored.unwrap_or(if bpp == 16 {
            DEFAULT_MASKS_16
        } else {
            DEFAULT_MASKS_32
        });

        if bpp < 32 {
            let depth = (1u32 << bpp) - 1;
            if masks.iter().any(|m| m & !depth != 0) {
                warnings.push(Warning::BitfieldMaskExceedsPixelDepth);
                masks.iter_mut().for_each(|m| *m &= depth);
            }
        }

        for (i, &a) in masks.iter().enumerate() {
            for &b in &masks[i + 1..] {
                if a & b != 0 {
                    return Err(BmpError::OverlappingBitfieldMasks(a, b));
                }
            }
        }

        let [red, green, blue, alpha] = masks.map(BitfieldMask::new);
        Ok(Self {
            red,
            green,
            blue,
            alpha,
            defaulted,
        })
    }
}
