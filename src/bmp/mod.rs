//! BMP container parsing and the per-image decode pipeline.
//!
//! Use the top-level [`crate::decode()`], [`crate::decode_all()`] and
//! [`crate::decode_best_fit()`] entry points; the types here describe what was
//! found in the file.

pub(crate) mod array;
pub(crate) mod best_fit;
pub(crate) mod bitfield;
pub(crate) mod color_map;
mod decode;
pub(crate) mod file_header;
mod gamma;
pub(crate) mod info_header;
mod rle;

use std::io::{Read, Seek};

use rgb::alt::BGRA8;

use self::color_map::{ColorMap, DefaultPalettes, load_color_map};
use self::decode::{BitmapDecoder, BitmapInput};
use self::file_header::{FileHeader, read_file_header};
use self::info_header::{InfoHeader, read_info_header};
use crate::decode::{DecodeOptions, DecodedImage, SkippedPixelFill};
use crate::error::BmpError;
use crate::limits::Limits;
use crate::pixel::BmpPixel;
use crate::stream::ByteStream;
use crate::warning::Warnings;

/// Headers and palette of one image, plus where its pixel data starts.
#[derive(Clone, Debug)]
pub(crate) struct ImageHeaders {
    pub file: FileHeader,
    pub info: InfoHeader,
    pub color_map: ColorMap,
    pub data_start: u64,
    /// Standalone bitmap: its pixel data runs to the end of the stream.
    pub whole_file: bool,
}

/// Read file header, info header and colour table at the current position.
///
/// `whole_file` is set for standalone bitmaps; bitmap-array entries skip the
/// checks that relate the header to the size and layout of the whole file.
pub(crate) fn read_headers<R: Read + Seek>(
    stream: &mut ByteStream<R>,
    whole_file: bool,
    defaults: &DefaultPalettes,
    warnings: &mut Warnings,
) -> Result<ImageHeaders, BmpError> {
    let file = read_file_header(stream, whole_file, warnings)?;
    let info = read_info_header(stream, &file)?;
    let color_map = load_color_map(stream, &file, &info, defaults, whole_file, warnings)?;
    let data_start = file
        .content_offset()
        .map_or(stream.position(), u64::from);
    Ok(ImageHeaders {
        file,
        info,
        color_map,
        data_start,
        whole_file,
    })
}

fn fill_pixel(fill: SkippedPixelFill, color_map: &ColorMap) -> BGRA8 {
    const BLACK: BGRA8 = BGRA8 {
        b: 0,
        g: 0,
        r: 0,
        a: 255,
    };
    match fill {
        SkippedPixelFill::Black => BLACK,
        SkippedPixelFill::Transparent => BGRA8 { a: 0, ..BLACK },
        SkippedPixelFill::PaletteIndexZero => color_map.colors().first().copied().unwrap_or(BLACK),
    }
}

/// Swap scanlines `y` and `height - 1 - y` for the top half of the image.
pub(crate) fn flip_rows<P>(pixels: &mut [P], width: usize) {
    if width == 0 {
        return;
    }
    let height = pixels.len() / width;
    for y in 0..height / 2 {
        let (top, bottom) = pixels.split_at_mut((height - 1 - y) * width);
        top[y * width..(y + 1) * width].swap_with_slice(&mut bottom[..width]);
    }
}

/// Decode the pixel data described by `headers`.
pub(crate) fn decode_image<P: BmpPixel, R: Read + Seek>(
    stream: &mut ByteStream<R>,
    headers: &ImageHeaders,
    mut warnings: Warnings,
    options: &DecodeOptions,
    limits: &Limits,
) -> Result<DecodedImage<P>, BmpError> {
    let info = &headers.info;
    let geometry = info.validate(&mut warnings)?;
    let bpp = info.bits_per_pixel();
    let decoder =
        BitmapDecoder::select(bpp, info.compression()).ok_or(BmpError::BadBitsPerPixelValue(bpp))?;
    let count = limits.check_output(
        geometry.width,
        geometry.height,
        P::LAYOUT.bytes_per_pixel(),
    )?;

    stream.seek_to(headers.data_start)?;
    let fill = P::from_bgra8(fill_pixel(options.skipped_pixel_fill, &headers.color_map));
    let mut pixels = vec![fill; count];
    let input = BitmapInput {
        header: info,
        geometry,
        color_map: &headers.color_map,
        hdr_exponent: options.hdr_gamma.exponent(),
        whole_file: headers.whole_file,
    };
    decoder.decode(stream, &input, &mut pixels, &mut warnings)?;

    let top_down = !options.force_bottom_up;
    if geometry.top_down != top_down {
        flip_rows(&mut pixels, geometry.width as usize);
    }

    if options.apply_gamma_correction
        && let Some(g) = info.color_space().and_then(|cs| cs.gamma_f32())
    {
        gamma::apply(&mut pixels, g.map(|g| g / gamma::DISPLAY_GAMMA));
    }

    Ok(DecodedImage::new(
        geometry.width,
        geometry.height,
        top_down,
        pixels,
        info,
        headers.color_map.colors_count(),
        warnings.finish(),
    ))
}
