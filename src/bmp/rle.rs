//! Run-length decoding for RLE-4, RLE-8 and the OS/2 RLE-24 variant.
//!
//! The stream is a sequence of byte pairs. A non-zero first byte is a run
//! count; a zero first byte is an escape whose second byte selects end of
//! line (0), end of bitmap (1), a delta move (2) or an absolute run.

use std::io::{Read, Seek};

use rgb::alt::BGRA8;

use super::decode::BitmapInput;
use crate::error::BmpError;
use crate::pixel::BmpPixel;
use crate::stream::ByteStream;
use crate::warning::{Warning, Warnings};

const ESCAPE: u8 = 0;
const END_OF_LINE: u8 = 0;
const END_OF_BITMAP: u8 = 1;
const DELTA: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RleKind {
    Four,
    Eight,
    /// OS/2 2.x: runs and literals are BGR triples.
    TwentyFour,
}

impl RleKind {
    /// Stored bytes for `count` literal pixels.
    fn literal_bytes(self, count: usize) -> usize {
        match self {
            Self::Four => count.div_ceil(2),
            Self::Eight => count,
            Self::TwentyFour => count * 3,
        }
    }
}

/// Command bytes; running out of them means the end-of-bitmap marker is missing.
struct Commands<'d> {
    data: &'d [u8],
    pos: usize,
}

impl<'d> Commands<'d> {
    fn byte(&mut self) -> Result<u8, BmpError> {
        let b = *self.data.get(self.pos).ok_or(BmpError::MissingEndOfBitmap)?;
        self.pos += 1;
        Ok(b)
    }

    fn bytes(&mut self, n: usize) -> Result<&'d [u8], BmpError> {
        let end = self.pos.checked_add(n).ok_or(BmpError::MissingEndOfBitmap)?;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(BmpError::MissingEndOfBitmap)?;
        self.pos = end;
        Ok(slice)
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn rest(&self) -> &'d [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }
}

/// Output cursor over the disk-ordered pixel buffer.
struct Canvas<'o, P> {
    out: &'o mut [P],
    width: usize,
    x: usize,
    y: usize,
    wrapped: bool,
}

impl<P: Copy> Canvas<'_, P> {
    fn index(&self) -> usize {
        self.y * self.width + self.x
    }

    /// Fail before writing anything when `count` pixels do not fit.
    fn reserve(&self, count: usize) -> Result<(), BmpError> {
        let end = self.index() + count;
        if end > self.out.len() {
            return Err(BmpError::BufferOverflow {
                index: end - 1,
                len: self.out.len(),
            });
        }
        Ok(())
    }

    fn put(&mut self, px: P) {
        if self.x >= self.width {
            self.x = 0;
            self.y += 1;
            self.wrapped = true;
        }
        let i = self.index();
        self.out[i] = px;
        self.x += 1;
    }
}

pub(crate) fn decode_rle<P: BmpPixel, R: Read + Seek>(
    kind: RleKind,
    stream: &mut ByteStream<R>,
    input: &BitmapInput<'_>,
    out: &mut [P],
    warnings: &mut Warnings,
) -> Result<(), BmpError> {
    let declared = u64::from(input.header.image_size());
    let available = stream.remaining();
    let length = if declared == 0 {
        available
    } else {
        declared.min(available)
    };
    let data = stream.read_vec(usize::try_from(length).map_err(|_| BmpError::EndOfFile)?)?;

    let height = input.height();
    let map = input.color_map;
    let mut bad = false;
    let mut cmd = Commands { data: &data, pos: 0 };
    let mut canvas = Canvas {
        out,
        width: input.width(),
        x: 0,
        y: 0,
        wrapped: false,
    };
    let mut ended = false;

    while !cmd.is_empty() {
        let first = cmd.byte()?;
        let second = cmd.byte()?;

        if first != ESCAPE {
            let count = usize::from(first);
            canvas.reserve(count)?;
            match kind {
                RleKind::Eight => {
                    let c = P::from_bgra8(map.lookup(second, &mut bad));
                    (0..count).for_each(|_| canvas.put(c));
                }
                RleKind::Four => {
                    let hi = P::from_bgra8(map.lookup(second >> 4, &mut bad));
                    let lo = P::from_bgra8(map.lookup(second & 0x0f, &mut bad));
                    (0..count).for_each(|k| canvas.put(if k % 2 == 0 { hi } else { lo }));
                }
                RleKind::TwentyFour => {
                    let gr = cmd.bytes(2)?;
                    let c = P::from_bgra8(BGRA8 {
                        b: second,
                        g: gr[0],
                        r: gr[1],
                        a: 255,
                    });
                    (0..count).for_each(|_| canvas.put(c));
                }
            }
            continue;
        }

        match second {
            END_OF_LINE => {
                if canvas.y + 1 >= height {
                    return Err(BmpError::IncoherentRunLengthEncoding(
                        "end of line on the last scanline",
                    ));
                }
                canvas.x = 0;
                canvas.y += 1;
            }
            END_OF_BITMAP => {
                ended = true;
                break;
            }
            DELTA => {
                let dx = usize::from(cmd.byte()?);
                let dy = usize::from(cmd.byte()?);
                let mut x = canvas.x + dx;
                let mut y = canvas.y + dy;
                if x > canvas.width {
                    warnings.push(Warning::DeltaModeMayOverflow);
                    y += x / canvas.width;
                    x %= canvas.width;
                }
                if y * canvas.width + x > canvas.out.len() {
                    return Err(BmpError::DeltaModeOverflow { x, y });
                }
                canvas.x = x;
                canvas.y = y;
            }
            literal => {
                let count = usize::from(literal);
                canvas.reserve(count)?;
                let stored = kind.literal_bytes(count);
                let bytes = cmd.bytes(stored)?;
                match kind {
                    RleKind::Eight => {
                        for &i in bytes {
                            canvas.put(P::from_bgra8(map.lookup(i, &mut bad)));
                        }
                    }
                    RleKind::Four => {
                        for k in 0..count {
                            let byte = bytes[k / 2];
                            let i = if k % 2 == 0 { byte >> 4 } else { byte & 0x0f };
                            canvas.put(P::from_bgra8(map.lookup(i, &mut bad)));
                        }
                    }
                    RleKind::TwentyFour => {
                        for px in bytes.chunks_exact(3) {
                            canvas.put(P::from_bgra8(BGRA8 {
                                b: px[0],
                                g: px[1],
                                r: px[2],
                                a: 255,
                            }));
                        }
                    }
                }
                // Literal runs are padded to a 16-bit boundary.
                if stored % 2 == 1 {
                    cmd.byte()?;
                }
            }
        }
    }

    if !ended {
        return Err(BmpError::MissingEndOfBitmap);
    }
    // Zeros up to the declared size, or up to the next 4-byte boundary of an
    // undeclared size, are padding.
    let rest = cmd.rest();
    let padding = rest.iter().all(|&b| b == 0) && (declared != 0 || rest.len() < 4);
    if (declared != 0 || input.whole_file) && !padding {
        return Err(BmpError::DataAfterEndOfBitmap);
    }
    if canvas.wrapped {
        warnings.push(Warning::RunCrossesScanline);
    }
    if bad {
        warnings.push(Warning::BadPaletteIndices);
    }
    Ok(())
}
