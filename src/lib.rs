//! # zenbmp
//!
//! Decoder for the Windows and OS/2 bitmap family.
//!
//! ## Supported Formats
//!
//! - **Windows 1.x** device dependent bitmaps (tag `0x0000`)
//! - **BM** bitmaps with every info header revision: Windows 2.x, 3.x, NT,
//!   NT 4 / CE, V4 and V5, OS/2 1.x and both OS/2 2.x variants
//! - **BA** OS/2 bitmap arrays, decoded whole, image by image
//!   ([`BitmapSequence`]) or by picking the best fitting entry
//! - 1, 2, 4, 8, 16, 24, 32 and 64 bits per pixel; RLE-4, RLE-8, OS/2 RLE-24;
//!   bitfield masks, contiguous or not
//!
//! Problems that leave the image decodable are reported as [`Warning`]s on the
//! result. Everything else is a [`BmpError`].
//!
//! ## Non-Goals
//!
//! - Encoding
//! - Embedded JPEG / PNG payloads (reported as distinct errors)
//! - Colour management beyond the calibrated gamma of V4/V5 headers
//!
//! ## Usage
//!
//! ```no_run
//! use zenbmp::{DecodeOptions, DecodeRequest, FitConstraints, RGBA8};
//!
//! let data: &[u8] = &[]; // your BMP bytes
//!
//! // Probe without decoding
//! let info = DecodeRequest::new(data).probe()?;
//! println!("{}x{} {} bpp", info.width, info.height, info.bits_per_pixel);
//!
//! // Decode to RGBA, rows top-down
//! let image = zenbmp::decode::<RGBA8>(data, &DecodeOptions::default())?;
//! for line in image.warning_messages() {
//!     eprintln!("{line}");
//! }
//!
//! // Best 32x32 entry of a bitmap array
//! let icon = DecodeRequest::new(data)
//!     .decode_best_fit::<RGBA8>(&FitConstraints::Size { width: 32, height: 32 })?;
//! # let _ = icon;
//! # Ok::<(), zenbmp::BmpError>(())
//! ```

#![forbid(unsafe_code)]

mod bmp;
mod decode;
mod error;
mod limits;
mod pixel;
mod sequence;
mod stream;
mod warning;

// Re-exports
pub use bmp::array::{BaEntry, BaHeader, BitmapArray};
pub use bmp::best_fit::FitConstraints;
pub use bmp::bitfield::BitfieldMask;
pub use bmp::color_map::{ColorMap, DefaultPalettes, MAX_COLORS};
pub use bmp::file_header::{BitmapFileHeader, FileHeader, FileKind};
pub use bmp::info_header::{
    CieXyz, CieXyzTriple, ColorSpace, Compression, HeaderVersion, InfoHeader, InfoOs21x, InfoOs22x,
    InfoOs22xShort, InfoV1, InfoV2, InfoV3, InfoV3Nt, InfoV3Nt4, InfoV4, InfoV5, RgbMasks,
};
pub use decode::{
    BmpInfo, DecodeFileRequest, DecodeOptions, DecodeRequest, DecodedImage, HdrGamma,
    SkippedPixelFill, decode, decode_all, decode_all_file, decode_best_fit, decode_best_fit_file,
    decode_file, probe, probe_file, read_array,
};
pub use error::BmpError;
pub use limits::Limits;
pub use pixel::{BmpPixel, Bgra16, PixelLayout};
pub use rgb::alt::{BGR8, BGRA8};
pub use rgb::{RGB8, RGBA8};
pub use sequence::BitmapSequence;
pub use warning::Warning;
