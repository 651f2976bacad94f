use std::io::{Read, Seek};
use std::path::Path;
use std::sync::Arc;

use crate::bmp::array::{BitmapArray, read_bitmap_array};
use crate::bmp::best_fit::{FitConstraints, select_best_fit};
use crate::bmp::color_map::DefaultPalettes;
use crate::bmp::file_header::{FileKind, peek_kind};
use crate::bmp::info_header::{Compression, HeaderVersion, InfoHeader};
use crate::bmp::{ImageHeaders, decode_image, read_headers};
use crate::error::BmpError;
use crate::limits::Limits;
use crate::pixel::{BmpPixel, PixelLayout};
use crate::stream::ByteStream;
use crate::warning::{Warning, Warnings};

// ── Options ─────────────────────────────────────────────────────────

/// Value given to pixels the bitmap data never writes (RLE skips, short data).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SkippedPixelFill {
    /// Opaque black.
    #[default]
    Black,
    /// Fully transparent black.
    Transparent,
    /// The first palette entry.
    PaletteIndexZero,
}

/// How 64 bpp channels are narrowed to 8 bits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HdrGamma {
    /// Keep the linear values.
    Linear,
    /// Encode the linear values with `1 / gamma`; `None` means 2.2.
    Undo(Option<f32>),
}

impl Default for HdrGamma {
    fn default() -> Self {
        Self::Undo(None)
    }
}

impl HdrGamma {
    pub(crate) fn exponent(self) -> f32 {
        match self {
            Self::Linear => 1.0,
            Self::Undo(None) => 1.0 / 2.2,
            Self::Undo(Some(gamma)) if gamma > 0.0 => 1.0 / gamma,
            Self::Undo(Some(_)) => 1.0,
        }
    }
}

/// Decode-time behaviour switches.
#[derive(Clone, Debug, Default)]
pub struct DecodeOptions {
    /// Apply the gamma of calibrated V4/V5 colour spaces.
    pub apply_gamma_correction: bool,
    pub skipped_pixel_fill: SkippedPixelFill,
    /// Return rows bottom-up (last row first) instead of top-down.
    pub force_bottom_up: bool,
    pub hdr_gamma: HdrGamma,
    /// Replacement for the built-in default palettes.
    pub default_palettes: Option<Arc<DefaultPalettes>>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gamma_correction(mut self, apply: bool) -> Self {
        self.apply_gamma_correction = apply;
        self
    }

    pub fn with_skipped_pixel_fill(mut self, fill: SkippedPixelFill) -> Self {
        self.skipped_pixel_fill = fill;
        self
    }

    pub fn with_force_bottom_up(mut self, bottom_up: bool) -> Self {
        self.force_bottom_up = bottom_up;
        self
    }

    pub fn with_hdr_gamma(mut self, gamma: HdrGamma) -> Self {
        self.hdr_gamma = gamma;
        self
    }

    pub fn with_default_palettes(mut self, palettes: Arc<DefaultPalettes>) -> Self {
        self.default_palettes = Some(palettes);
        self
    }

    pub(crate) fn palettes(&self) -> &DefaultPalettes {
        self.default_palettes
            .as_deref()
            .unwrap_or(DefaultPalettes::builtin())
    }
}

// ── Output ──────────────────────────────────────────────────────────

/// A decoded bitmap.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage<P> {
    pub width: u32,
    pub height: u32,
    /// Whether the first row of `pixels` is the top of the image.
    pub top_down: bool,
    /// Resolution in dots per inch, (0, 0) when the header has none.
    pub dpi: (u32, u32),
    /// Entries in the colour table.
    pub colors_count: usize,
    pub bits_per_pixel: u16,
    pub compression: Compression,
    pub version: HeaderVersion,
    pixels: Vec<P>,
    warnings: Vec<Warning>,
}

impl<P: BmpPixel> DecodedImage<P> {
    pub(crate) fn new(
        width: u32,
        height: u32,
        top_down: bool,
        pixels: Vec<P>,
        info: &InfoHeader,
        colors_count: usize,
        warnings: Vec<Warning>,
    ) -> Self {
        Self {
            width,
            height,
            top_down,
            dpi: info.dpi(),
            colors_count,
            bits_per_pixel: info.bits_per_pixel(),
            compression: info.compression(),
            version: info.version(),
            pixels,
            warnings,
        }
    }

    pub fn layout(&self) -> PixelLayout {
        P::LAYOUT
    }

    /// Pixels, row-major.
    pub fn pixels(&self) -> &[P] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<P> {
        self.pixels
    }

    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[P]> {
        self.pixels.chunks_exact((self.width as usize).max(1))
    }

    /// Pixel at column `x` of row `y`, counting rows in storage order.
    pub fn pixel(&self, x: u32, y: u32) -> Option<P> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Warnings raised while decoding, sorted and without repeats.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// One `CODE: description` line per warning.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings
            .iter()
            .map(|w| format!("{}: {w}", w.code()))
            .collect()
    }

    /// The same image in another pixel layout.
    pub fn convert<Q: BmpPixel>(&self) -> DecodedImage<Q> {
        DecodedImage {
            width: self.width,
            height: self.height,
            top_down: self.top_down,
            dpi: self.dpi,
            colors_count: self.colors_count,
            bits_per_pixel: self.bits_per_pixel,
            compression: self.compression,
            version: self.version,
            pixels: self.pixels.iter().map(|p| p.convert()).collect(),
            warnings: self.warnings.clone(),
        }
    }

    /// Zero-copy [`imgref::ImgRef`] view of the pixels.
    #[cfg(feature = "imgref")]
    pub fn as_imgref(&self) -> imgref::ImgRef<'_, P> {
        imgref::ImgRef::new(&self.pixels, self.width as usize, self.height as usize)
    }

    /// Convert into an owned [`imgref::ImgVec`].
    #[cfg(feature = "imgref")]
    pub fn into_imgvec(self) -> imgref::ImgVec<P> {
        let (w, h) = (self.width as usize, self.height as usize);
        imgref::ImgVec::new(self.pixels, w, h)
    }
}

/// Header-level description of a bitmap, read without decoding pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BmpInfo {
    pub kind: FileKind,
    pub version: HeaderVersion,
    pub width: u32,
    pub height: u32,
    /// Stored orientation of the scanlines.
    pub top_down: bool,
    pub bits_per_pixel: u16,
    pub compression: Compression,
    pub dpi: (u32, u32),
    pub colors_count: usize,
    /// Number of images; 1 unless the file is a bitmap array.
    pub image_count: usize,
    pub warnings: Vec<Warning>,
}

// ── Pipeline ────────────────────────────────────────────────────────

fn log_headers(headers: &ImageHeaders) {
    let info = &headers.info;
    log::debug!(
        "{} header: {}x{}, {} bpp, {} compression, {} colors",
        info.version(),
        info.width(),
        info.height(),
        info.bits_per_pixel(),
        info.compression(),
        headers.color_map.colors_count(),
    );
}

fn log_warnings(warnings: &[Warning]) {
    for w in warnings {
        log::trace!("warning {}: {w}", w.code());
    }
}

fn log_result<P>(result: &Result<DecodedImage<P>, BmpError>, path: Option<&Path>) {
    match result {
        Ok(image) => log_warnings(&image.warnings),
        Err(e) => log::debug!("{}", e.message(path)),
    }
}

fn log_all_result<P>(result: &Result<Vec<DecodedImage<P>>, BmpError>, path: Option<&Path>) {
    match result {
        Ok(images) => images.iter().for_each(|image| log_warnings(&image.warnings)),
        Err(e) => log::debug!("{}", e.message(path)),
    }
}

fn decode_stream<P: BmpPixel, R: Read + Seek>(
    stream: &mut ByteStream<R>,
    options: &DecodeOptions,
    limits: &Limits,
) -> Result<DecodedImage<P>, BmpError> {
    if peek_kind(stream)? == FileKind::BitmapArray {
        let (entries, error) = read_bitmap_array(stream, options.palettes())?.into_parts();
        let Some(first) = entries.first() else {
            return Err(error.unwrap_or(BmpError::NotBitmapArrayFileHeader));
        };
        log::debug!("bitmap array; decoding the first of {} entries", entries.len());
        log_headers(&first.image);
        return decode_image(stream, &first.image, first.warnings.clone(), options, limits);
    }

    let mut warnings = Warnings::new();
    let headers = read_headers(stream, true, options.palettes(), &mut warnings)?;
    log_headers(&headers);
    decode_image(stream, &headers, warnings, options, limits)
}

fn decode_all_stream<P: BmpPixel, R: Read + Seek>(
    stream: &mut ByteStream<R>,
    options: &DecodeOptions,
    limits: &Limits,
) -> Result<Vec<DecodedImage<P>>, BmpError> {
    let entries = read_bitmap_array(stream, options.palettes())?.into_result()?;
    log::debug!("bitmap array with {} entries", entries.len());
    entries
        .iter()
        .map(|entry| {
            log_headers(&entry.image);
            decode_image(stream, &entry.image, entry.warnings.clone(), options, limits)
        })
        .collect()
}

fn decode_best_fit_stream<P: BmpPixel, R: Read + Seek>(
    stream: &mut ByteStream<R>,
    constraints: &FitConstraints,
    options: &DecodeOptions,
    limits: &Limits,
) -> Result<DecodedImage<P>, BmpError> {
    if peek_kind(stream)? != FileKind::BitmapArray {
        // A single bitmap is the only candidate.
        return decode_stream(stream, options, limits);
    }
    let entries = read_bitmap_array(stream, options.palettes())?.into_result()?;
    let index = select_best_fit(entries.iter().map(|e| e.candidate()), constraints);
    let entry = entries.get(index).ok_or(BmpError::NotBitmapArrayFileHeader)?;
    log::debug!(
        "best fit for {constraints:?} is entry {index} of {}",
        entries.len()
    );
    log_headers(&entry.image);
    decode_image(stream, &entry.image, entry.warnings.clone(), options, limits)
}

fn probe_stream<R: Read + Seek>(
    stream: &mut ByteStream<R>,
    defaults: &DefaultPalettes,
) -> Result<BmpInfo, BmpError> {
    let kind = peek_kind(stream)?;
    let (headers, mut warnings, image_count) = if kind == FileKind::BitmapArray {
        let (mut entries, error) = read_bitmap_array(stream, defaults)?.into_parts();
        if entries.is_empty() {
            return Err(error.unwrap_or(BmpError::NotBitmapArrayFileHeader));
        }
        let count = entries.len();
        let first = entries.swap_remove(0);
        (first.image, first.warnings, count)
    } else {
        let mut warnings = Warnings::new();
        let headers = read_headers(stream, true, defaults, &mut warnings)?;
        (headers, warnings, 1)
    };
    let info = &headers.info;
    let geometry = info.validate(&mut warnings)?;
    Ok(BmpInfo {
        kind,
        version: info.version(),
        width: geometry.width,
        height: geometry.height,
        top_down: geometry.top_down,
        bits_per_pixel: info.bits_per_pixel(),
        compression: info.compression(),
        dpi: info.dpi(),
        colors_count: headers.color_map.colors_count(),
        image_count,
        warnings: warnings.finish(),
    })
}

// ── Request ─────────────────────────────────────────────────────────

/// Builder for decoding a BMP held in memory.
#[derive(Clone, Debug)]
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    options: DecodeOptions,
    limits: Limits,
}

impl<'a> DecodeRequest<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            options: DecodeOptions::default(),
            limits: Limits::none(),
        }
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Decode the image, or the first image of a bitmap array.
    pub fn decode<P: BmpPixel>(&self) -> Result<DecodedImage<P>, BmpError> {
        let result = decode_stream(
            &mut ByteStream::from_bytes(self.data),
            &self.options,
            &self.limits,
        );
        log_result(&result, None);
        result
    }

    /// Decode every image of a bitmap array.
    pub fn decode_all<P: BmpPixel>(&self) -> Result<Vec<DecodedImage<P>>, BmpError> {
        let result = decode_all_stream(
            &mut ByteStream::from_bytes(self.data),
            &self.options,
            &self.limits,
        );
        log_all_result(&result, None);
        result
    }

    /// Decode the bitmap-array entry that best fits `constraints`.
    pub fn decode_best_fit<P: BmpPixel>(
        &self,
        constraints: &FitConstraints,
    ) -> Result<DecodedImage<P>, BmpError> {
        let result = decode_best_fit_stream(
            &mut ByteStream::from_bytes(self.data),
            constraints,
            &self.options,
            &self.limits,
        );
        log_result(&result, None);
        result
    }

    /// Read the headers without decoding pixel data.
    pub fn probe(&self) -> Result<BmpInfo, BmpError> {
        probe_stream(
            &mut ByteStream::from_bytes(self.data),
            self.options.palettes(),
        )
    }

    /// Walk the chain of a bitmap array.
    pub fn bitmap_array(&self) -> Result<BitmapArray, BmpError> {
        read_bitmap_array(
            &mut ByteStream::from_bytes(self.data),
            self.options.palettes(),
        )
    }
}

/// Builder for decoding a BMP file.
///
/// The file is opened anew by every call.
#[derive(Clone, Debug)]
pub struct DecodeFileRequest<'p> {
    path: &'p Path,
    options: DecodeOptions,
    limits: Limits,
}

impl<'p> DecodeFileRequest<'p> {
    pub fn new(path: &'p Path) -> Self {
        Self {
            path,
            options: DecodeOptions::default(),
            limits: Limits::none(),
        }
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn decode<P: BmpPixel>(&self) -> Result<DecodedImage<P>, BmpError> {
        let result = ByteStream::open(self.path)
            .and_then(|mut stream| decode_stream(&mut stream, &self.options, &self.limits));
        log_result(&result, Some(self.path));
        result
    }

    pub fn decode_all<P: BmpPixel>(&self) -> Result<Vec<DecodedImage<P>>, BmpError> {
        let result = ByteStream::open(self.path)
            .and_then(|mut stream| decode_all_stream(&mut stream, &self.options, &self.limits));
        log_all_result(&result, Some(self.path));
        result
    }

    pub fn decode_best_fit<P: BmpPixel>(
        &self,
        constraints: &FitConstraints,
    ) -> Result<DecodedImage<P>, BmpError> {
        let result = ByteStream::open(self.path).and_then(|mut stream| {
            decode_best_fit_stream(&mut stream, constraints, &self.options, &self.limits)
        });
        log_result(&result, Some(self.path));
        result
    }

    pub fn probe(&self) -> Result<BmpInfo, BmpError> {
        ByteStream::open(self.path)
            .and_then(|mut stream| probe_stream(&mut stream, self.options.palettes()))
    }
}

// ── Entry points ────────────────────────────────────────────────────

/// Decode a BMP from memory.
pub fn decode<P: BmpPixel>(data: &[u8], options: &DecodeOptions) -> Result<DecodedImage<P>, BmpError> {
    DecodeRequest::new(data)
        .with_options(options.clone())
        .decode()
}

/// Decode a BMP file.
pub fn decode_file<P: BmpPixel>(
    path: impl AsRef<Path>,
    options: &DecodeOptions,
) -> Result<DecodedImage<P>, BmpError> {
    DecodeFileRequest::new(path.as_ref())
        .with_options(options.clone())
        .decode()
}

/// Decode every image of an in-memory bitmap array.
pub fn decode_all<P: BmpPixel>(
    data: &[u8],
    options: &DecodeOptions,
) -> Result<Vec<DecodedImage<P>>, BmpError> {
    DecodeRequest::new(data)
        .with_options(options.clone())
        .decode_all()
}

/// Decode every image of a bitmap-array file.
pub fn decode_all_file<P: BmpPixel>(
    path: impl AsRef<Path>,
    options: &DecodeOptions,
) -> Result<Vec<DecodedImage<P>>, BmpError> {
    DecodeFileRequest::new(path.as_ref())
        .with_options(options.clone())
        .decode_all()
}

/// Decode the entry of an in-memory bitmap array that best fits `constraints`.
pub fn decode_best_fit<P: BmpPixel>(
    data: &[u8],
    constraints: &FitConstraints,
    options: &DecodeOptions,
) -> Result<DecodedImage<P>, BmpError> {
    DecodeRequest::new(data)
        .with_options(options.clone())
        .decode_best_fit(constraints)
}

/// Decode the entry of a bitmap-array file that best fits `constraints`.
pub fn decode_best_fit_file<P: BmpPixel>(
    path: impl AsRef<Path>,
    constraints: &FitConstraints,
    options: &DecodeOptions,
) -> Result<DecodedImage<P>, BmpError> {
    DecodeFileRequest::new(path.as_ref())
        .with_options(options.clone())
        .decode_best_fit(constraints)
}

/// Read the headers of an in-memory BMP.
pub fn probe(data: &[u8]) -> Result<BmpInfo, BmpError> {
    DecodeRequest::new(data).probe()
}

/// Read the headers of a BMP file.
pub fn probe_file(path: impl AsRef<Path>) -> Result<BmpInfo, BmpError> {
    DecodeFileRequest::new(path.as_ref()).probe()
}

/// Walk the chain of an in-memory bitmap array.
pub fn read_array(data: &[u8]) -> Result<BitmapArray, BmpError> {
    DecodeRequest::new(data).bitmap_array()
}
