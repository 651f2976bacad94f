//! The outermost file header: type tag, file size and pixel data offset.

use std::io::{Read, Seek};

use crate::error::BmpError;
use crate::stream::ByteStream;
use crate::warning::{Warning, Warnings};

pub(crate) const TAG_V1: u16 = 0x0000;
pub(crate) const TAG_BA: u16 = 0x4142;
pub(crate) const TAG_BM: u16 = 0x4d42;

/// Size of the `BM` file header on disk.
pub(crate) const BM_FILE_HEADER_SIZE: u64 = 14;

/// Kind of file, from the 16-bit tag at the start of the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Windows 1.x device dependent bitmap (tag `0x0000`).
    V1,
    /// Windows / OS/2 bitmap (`BM`).
    Bitmap,
    /// OS/2 bitmap array (`BA`).
    BitmapArray,
}

impl FileKind {
    pub(crate) fn from_tag(tag: u16) -> Result<Self, BmpError> {
        match tag {
            TAG_V1 => Ok(Self::V1),
            TAG_BM => Ok(Self::Bitmap),
            TAG_BA => Ok(Self::BitmapArray),
            other => Err(BmpError::UnknownFileType(other)),
        }
    }
}

/// Read the tag at the current position and rewind to it.
pub(crate) fn peek_kind<R: Read + Seek>(stream: &mut ByteStream<R>) -> Result<FileKind, BmpError> {
    let start = stream.position();
    let tag = stream.read_u16()?;
    stream.seek_to(start)?;
    FileKind::from_tag(tag)
}

/// File header of a single image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileHeader {
    /// Windows 1.x: the tag is the whole file header and the bitmap follows
    /// the info header directly.
    V1,
    /// 14-byte `BM` header.
    Bitmap(BitmapFileHeader),
}

impl FileHeader {
    pub fn kind(&self) -> FileKind {
        match self {
            Self::V1 => FileKind::V1,
            Self::Bitmap(_) => FileKind::Bitmap,
        }
    }

    /// Absolute stream offset of the pixel data, when the header declares one.
    pub fn content_offset(&self) -> Option<u32> {
        match self {
            Self::V1 => None,
            Self::Bitmap(h) if h.content_offset == 0 => None,
            Self::Bitmap(h) => Some(h.content_offset),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitmapFileHeader {
    /// Declared size of the file in bytes.
    pub file_size: u32,
    /// "Hot spot" fields; zero for plain bitmaps.
    pub reserved: [u16; 2],
    /// Offset of the pixel data from the start of the stream.
    pub content_offset: u32,
}

impl BitmapFileHeader {
    /// Read the 12 bytes after a `BM` tag.
    ///
    /// `whole_file` is set for standalone bitmaps, where the declared file size
    /// should match the stream. Bitmap-array entries carry a structure size
    /// in that field instead.
    pub(crate) fn read_body<R: Read + Seek>(
        stream: &mut ByteStream<R>,
        whole_file: bool,
        warnings: &mut Warnings,
    ) -> Result<Self, BmpError> {
        let file_size = stream.read_u32()?;
        let reserved = [stream.read_u16()?, stream.read_u16()?];
        let content_offset = stream.read_u32()?;

        if reserved != [0, 0] {
            warnings.push(Warning::NonZeroReservedFields);
        }
        if whole_file && u64::from(file_size) != stream.len() {
            warnings.push(Warning::FileSizeMismatch);
        }
        if u64::from(content_offset) >= stream.len() {
            return Err(BmpError::InvalidContentOffset {
                offset: content_offset,
                file_size: stream.len(),
            });
        }

        Ok(Self {
            file_size,
            reserved,
            content_offset,
        })
    }
}

/// Read a single-image file header (V1 or `BM`) at the current position.
pub(crate) fn read_file_header<R: Read + Seek>(
    stream: &mut ByteStream<R>,
    whole_file: bool,
    warnings: &mut Warnings,
) -> Result<FileHeader, BmpError> {
    match FileKind::from_tag(stream.read_u16()?)? {
        FileKind::V1 => Ok(FileHeader::V1),
        FileKind::Bitmap => Ok(FileHeader::Bitmap(BitmapFileHeader::read_body(
            stream, whole_file, warnings,
        )?)),
        FileKind::BitmapArray => Err(BmpError::UnknownFileType(TAG_BA)),
    }
}
