use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use crate::bmp::array::{BaEntry, read_bitmap_array};
use crate::bmp::color_map::DefaultPalettes;
use crate::bmp::decode_image;
use crate::decode::{DecodeOptions, DecodedImage};
use crate::error::BmpError;
use crate::limits::Limits;
use crate::pixel::BmpPixel;
use crate::stream::ByteStream;

/// Image-by-image access to a bitmap array.
///
/// The chain is read when the sequence is opened; each call to
/// [`BitmapSequence::next`] decodes one entry from the owned stream.
pub struct BitmapSequence<R = BufReader<File>> {
    stream: ByteStream<R>,
    entries: Vec<BaEntry>,
    chain_error: Option<BmpError>,
    cursor: usize,
    limits: Limits,
}

impl BitmapSequence<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BmpError> {
        Self::open_with_options(path, &DecodeOptions::default())
    }

    /// Open with the default palettes of `options`.
    pub fn open_with_options(
        path: impl AsRef<Path>,
        options: &DecodeOptions,
    ) -> Result<Self, BmpError> {
        Self::with_stream(ByteStream::open(path.as_ref())?, options.palettes())
    }
}

impl<R: Read + Seek> BitmapSequence<R> {
    /// Read the chain from any seekable reader.
    pub fn from_reader(reader: R) -> Result<Self, BmpError> {
        Self::from_reader_with_options(reader, &DecodeOptions::default())
    }

    pub fn from_reader_with_options(reader: R, options: &DecodeOptions) -> Result<Self, BmpError> {
        Self::with_stream(ByteStream::new(reader)?, options.palettes())
    }

    fn with_stream(mut stream: ByteStream<R>, defaults: &DefaultPalettes) -> Result<Self, BmpError> {
        let (entries, chain_error) = read_bitmap_array(&mut stream, defaults)?.into_parts();
        if entries.is_empty() {
            return Err(chain_error.unwrap_or(BmpError::NotBitmapArrayFileHeader));
        }
        Ok(Self {
            stream,
            entries,
            chain_error,
            cursor: 0,
            limits: Limits::none(),
        })
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Entries read from the chain.
    pub fn entries(&self) -> &[BaEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode the next image.
    ///
    /// After the last entry this returns the error that cut the chain short,
    /// if there was one, and [`BmpError::EndOfSequence`] from then on. Each
    /// pass after [`BitmapSequence::reset`] reports the chain error again.
    pub fn next<P: BmpPixel>(&mut self, options: &DecodeOptions) -> Result<DecodedImage<P>, BmpError> {
        let Some(entry) = self.entries.get(self.cursor) else {
            let at_end = self.cursor == self.entries.len();
            self.cursor = self.entries.len() + 1;
            return Err(match &self.chain_error {
                Some(e) if at_end => e.clone(),
                _ => BmpError::EndOfSequence,
            });
        };
        self.cursor += 1;
        decode_image(
            &mut self.stream,
            &entry.image,
            entry.warnings.clone(),
            options,
            &self.limits,
        )
    }

    /// Go back to the first entry.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}
