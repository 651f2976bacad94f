use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fatal errors from BMP decoding.
///
/// Every variant aborts the current decode. Recoverable oddities are reported
/// as [`crate::Warning`]s on the decoded image instead.
#[derive(Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BmpError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("read failure: {0}")]
    Io(#[source] Arc<io::Error>),

    #[error("unexpected end of file")]
    EndOfFile,

    #[error("stream corrupted: cannot position at byte {0}")]
    StreamCorrupted(u64),

    #[error("unrecognized file type tag {0:#06x}")]
    UnknownFileType(u16),

    #[error("content offset {offset} is not inside the file ({file_size} bytes)")]
    InvalidContentOffset { offset: u32, file_size: u64 },

    #[error("invalid info header size {0}")]
    InvalidHeaderSize(u32),

    #[error("negative image width {0}")]
    NegativeWidth(i32),

    #[error("invalid image dimensions {width}x{height}")]
    InvalidImageDimensions { width: i64, height: i64 },

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("bad bits per pixel value {0}")]
    BadBitsPerPixelValue(u16),

    #[error("bits per pixel value {0} exceeds 64")]
    BitsPerPixelTooLarge(u16),

    #[error("unknown compression mode {0}")]
    UnknownCompression(u32),

    #[error("compression {compression} cannot be used with {bits_per_pixel} bits per pixel")]
    IncompatibleCompression {
        compression: crate::Compression,
        bits_per_pixel: u16,
    },

    #[error("compression {compression} is not defined for the {header} header")]
    CompressionNotAllowedForHeader {
        compression: crate::Compression,
        header: crate::HeaderVersion,
    },

    #[error("unsupported compression {0}")]
    UnsupportedCompression(crate::Compression),

    #[error("embedded JPEG decoding is not implemented")]
    NotYetImplementedJpegDecoding,

    #[error("embedded PNG decoding is not implemented")]
    NotYetImplementedPngDecoding,

    #[error("OS/2 Huffman 1D decoding is not implemented")]
    NotYetImplementedHuffmanDecoding,

    #[error("top-down orientation is forbidden for embedded {0} data")]
    ForbiddenTopDownOrientation(crate::Compression),

    #[error("{0} planes cannot be decoded")]
    UnsupportedPlanes(u16),

    #[error("byte width {byte_width} too small for a {width} pixel wide line")]
    InvalidByteWidth { byte_width: u16, width: u16 },

    #[error("bitfield masks overlap: {0:#010x} and {1:#010x}")]
    OverlappingBitfieldMasks(u32, u32),

    #[error("pixel write at index {index} overflows a {len} pixel buffer")]
    BufferOverflow { index: usize, len: usize },

    #[error("incoherent run-length encoding: {0}")]
    IncoherentRunLengthEncoding(&'static str),

    #[error("delta move to ({x}, {y}) leaves the bitmap")]
    DeltaModeOverflow { x: usize, y: usize },

    #[error("run-length stream ended without an end-of-bitmap marker")]
    MissingEndOfBitmap,

    #[error("stray data after the end-of-bitmap marker")]
    DataAfterEndOfBitmap,

    #[error("not a bitmap array file header")]
    NotBitmapArrayFileHeader,

    #[error("offset to next bitmap array entry {offset} is invalid")]
    InvalidOffsetToNext { offset: u32 },

    #[error("offset to next bitmap array entry {offset} is beyond the file ({file_size} bytes)")]
    OffsetToNextBeyondFile { offset: u32, file_size: u64 },

    #[error("no more images in the bitmap array")]
    EndOfSequence,

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
}

impl BmpError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::Io(_) => "READ_FAILURE",
            Self::EndOfFile => "END_OF_FILE",
            Self::StreamCorrupted(_) => "STREAM_CORRUPTED",
            Self::UnknownFileType(_) => "UNKNOWN_FILE_TYPE",
            Self::InvalidContentOffset { .. } => "INVALID_CONTENT_OFFSET",
            Self::InvalidHeaderSize(_) => "INVALID_HEADER_SIZE",
            Self::NegativeWidth(_) => "NEGATIVE_WIDTH",
            Self::InvalidImageDimensions { .. } => "INVALID_IMAGE_DIMENSIONS",
            Self::DimensionsTooLarge { .. } => "DIMENSIONS_TOO_LARGE",
            Self::BadBitsPerPixelValue(_) => "BAD_BITS_PER_PIXEL_VALUE",
            Self::BitsPerPixelTooLarge(_) => "TOO_LARGE_BITS_PER_PIXEL_VALUE",
            Self::UnknownCompression(_) => "UNKNOWN_COMPRESSION",
            Self::IncompatibleCompression { .. } => "INCOMPATIBLE_COMPRESSION",
            Self::CompressionNotAllowedForHeader { .. } => "COMPRESSION_NOT_ALLOWED_FOR_HEADER",
            Self::UnsupportedCompression(_) => "UNSUPPORTED_COMPRESSION",
            Self::NotYetImplementedJpegDecoding => "NOT_YET_IMPLEMENTED_JPEG_DECODING",
            Self::NotYetImplementedPngDecoding => "NOT_YET_IMPLEMENTED_PNG_DECODING",
            Self::NotYetImplementedHuffmanDecoding => "NOT_YET_IMPLEMENTED_HUFFMAN_DECODING",
            Self::ForbiddenTopDownOrientation(_) => "FORBIDDEN_TOP_DOWN_ORIENTATION",
            Self::UnsupportedPlanes(_) => "UNSUPPORTED_PLANES",
            Self::InvalidByteWidth { .. } => "INVALID_BYTE_WIDTH",
            Self::OverlappingBitfieldMasks(..) => "OVERLAPPING_BITFIELD_MASKS",
            Self::BufferOverflow { .. } => "BUFFER_OVERFLOW",
            Self::IncoherentRunLengthEncoding(_) => "INCOHERENT_RUN_LENGTH_ENCODING",
            Self::DeltaModeOverflow { .. } => "DELTA_MODE_OVERFLOW",
            Self::MissingEndOfBitmap => "MISSING_END_OF_BITMAP",
            Self::DataAfterEndOfBitmap => "DATA_AFTER_END_OF_BITMAP",
            Self::NotBitmapArrayFileHeader => "NOT_BITMAP_ARRAY_FILE_HEADER",
            Self::InvalidOffsetToNext { .. } => "INVALID_OFFSET_TO_NEXT",
            Self::OffsetToNextBeyondFile { .. } => "OFFSET_TO_NEXT_BEYOND_FILE",
            Self::EndOfSequence => "END_OF_SEQUENCE",
            Self::LimitExceeded(_) => "LIMIT_EXCEEDED",
        }
    }

    /// Render the one-line report shown to users: `path: CODE: description`.
    pub fn message(&self, path: Option<&Path>) -> String {
        match path {
            Some(path) => format!("{}: {}: {self}", path.display(), self.code()),
            None => format!("{}: {self}", self.code()),
        }
    }
}

impl From<io::Error> for BmpError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => BmpError::EndOfFile,
            _ => BmpError::Io(Arc::new(e)),
        }
    }
}
