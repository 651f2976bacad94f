//! OS/2 bitmap arrays: a chain of `BA` headers, each wrapping one bitmap.

use std::io::{Read, Seek};

use super::best_fit::Candidate;
use super::color_map::{ColorMap, DefaultPalettes};
use super::file_header::{BM_FILE_HEADER_SIZE, FileHeader, TAG_BA, TAG_BM};
use super::info_header::InfoHeader;
use super::{ImageHeaders, read_headers};
use crate::error::BmpError;
use crate::stream::ByteStream;
use crate::warning::{Warning, Warnings};

/// Size of the `BA` header preceding each entry's file header.
pub(crate) const BA_HEADER_SIZE: u64 = 14;

/// The 14-byte `BA` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaHeader {
    /// Size of this header structure as written by the encoder.
    pub header_size: u32,
    /// Absolute offset of the next `BA` header, 0 for the last entry.
    pub offset_to_next: u32,
    /// Intended display width, 0 when device independent.
    pub display_width: u16,
    pub display_height: u16,
}

/// One image of a bitmap array.
#[derive(Clone, Debug)]
pub struct BaEntry {
    /// Stream offset of this entry's `BA` header.
    pub position: u64,
    pub header: BaHeader,
    pub(crate) image: ImageHeaders,
    pub(crate) warnings: Warnings,
}

impl BaEntry {
    pub fn file_header(&self) -> &FileHeader {
        &self.image.file
    }

    pub fn info_header(&self) -> &InfoHeader {
        &self.image.info
    }

    pub fn color_map(&self) -> &ColorMap {
        &self.image.color_map
    }

    /// Warnings raised while reading this entry's headers.
    pub fn warnings(&self) -> &[Warning] {
        self.warnings.as_slice()
    }

    pub(crate) fn candidate(&self) -> Candidate {
        let info = &self.image.info;
        Candidate {
            width: info.width().unsigned_abs(),
            height: info.height().unsigned_abs(),
            dpi: info.dpi(),
            bits_per_pixel: info.bits_per_pixel(),
        }
    }
}

/// Every entry read from a bitmap array, in chain order.
///
/// When walking the chain fails part way, the entries read so far are kept
/// together with the error that stopped the walk.
#[derive(Debug)]
pub struct BitmapArray {
    entries: Vec<BaEntry>,
    error: Option<BmpError>,
}

impl BitmapArray {
    pub fn entries(&self) -> &[BaEntry] {
        &self.entries
    }

    /// The error that ended the walk early, if any.
    pub fn error(&self) -> Option<&BmpError> {
        self.error.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_parts(self) -> (Vec<BaEntry>, Option<BmpError>) {
        (self.entries, self.error)
    }

    /// All entries, or the error when the chain is broken.
    pub fn into_result(self) -> Result<Vec<BaEntry>, BmpError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.entries),
        }
    }
}

/// Walk the chain from the start of the stream.
///
/// Fails with [`BmpError::NotBitmapArrayFileHeader`] when the stream does not
/// start with a `BA` header; later failures are recorded in the result.
pub(crate) fn read_bitmap_array<R: Read + Seek>(
    stream: &mut ByteStream<R>,
    defaults: &DefaultPalettes,
) -> Result<BitmapArray, BmpError> {
    stream.seek_to(0)?;
    if stream.read_u16()? != TAG_BA {
        return Err(BmpError::NotBitmapArrayFileHeader);
    }

    let mut entries = Vec::new();
    let mut position = 0;
    loop {
        match read_entry(stream, position, defaults) {
            Ok(entry) => {
                let next = entry.header.offset_to_next;
                entries.push(entry);
                if next == 0 {
                    return Ok(BitmapArray {
                        entries,
                        error: None,
                    });
                }
                position = u64::from(next);
            }
            Err(e) => {
                return Ok(BitmapArray {
                    entries,
                    error: Some(e),
                });
            }
        }
    }
}

fn read_entry<R: Read + Seek>(
    stream: &mut ByteStream<R>,
    position: u64,
    defaults: &DefaultPalettes,
) -> Result<BaEntry, BmpError> {
    stream.seek_to(position)?;
    if stream.read_u16()? != TAG_BA {
        return Err(BmpError::NotBitmapArrayFileHeader);
    }
    let header = BaHeader {
        header_size: stream.read_u32()?,
        offset_to_next: stream.read_u32()?,
        display_width: stream.read_u16()?,
        display_height: stream.read_u16()?,
    };

    let next = u64::from(header.offset_to_next);
    if next != 0 {
        // Links only ever point forward, past at least this entry's headers.
        if next < position + BA_HEADER_SIZE + BM_FILE_HEADER_SIZE {
            return Err(BmpError::InvalidOffsetToNext {
                offset: header.offset_to_next,
            });
        }
        if next >= stream.len() {
            return Err(BmpError::OffsetToNextBeyondFile {
                offset: header.offset_to_next,
                file_size: stream.len(),
            });
        }
    }

    let start = stream.position();
    let tag = stream.read_u16()?;
    if tag != TAG_BM {
        return Err(BmpError::UnknownFileType(tag));
    }
    stream.seek_to(start)?;

    let mut warnings = Warnings::new();
    let image = read_headers(stream, false, defaults, &mut warnings)?;
    Ok(BaEntry {
        position,
        header,
        image,
        warnings,
    })
}
