use core::fmt;

/// Non-fatal oddities found while decoding. Decoding continues past all of these.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Warning {
    /// The file header reserved ("hot spot") fields are not zero.
    NonZeroReservedFields,
    /// The file size declared in the file header differs from the stream size.
    FileSizeMismatch,
    /// The planes field is not 1.
    UnusualPlanesValue,
    /// 2 bits per pixel is only defined for Windows CE.
    WindowsCeBitsPerPixel,
    /// Run-length compressed bitmaps must be stored bottom-up.
    ForbiddenTopDownOrientation,
    /// Horizontal and vertical resolutions differ by more than a factor of 2.5.
    IncoherentResolution,
    /// A resolution field is negative.
    NegativeResolution,
    /// The palette declares more than 256 entries; the extra ones were ignored.
    PaletteTruncated,
    /// There are unused bytes between the palette and the pixel data.
    GapBeforeBitmap,
    /// The pixel data starts before the end of the declared palette.
    MissingPaletteEntries,
    /// No palette was stored; a built-in default palette was used.
    DefaultPaletteSubstituted,
    /// A pixel references an index past the end of the palette.
    BadPaletteIndices,
    /// The declared bitmap size holds more pixel data than the image needs.
    TooManyIndicesInBitmap,
    /// The stream ends before every pixel of the image was read.
    NotEnoughIndicesInBitmap,
    /// A run-length delta move crossed the end of the current line.
    DeltaModeMayOverflow,
    /// A run-length run continued past the end of the current line.
    RunCrossesScanline,
    /// A bitfield mask selects bits outside the pixel word.
    BitfieldMaskExceedsPixelDepth,
}

impl Warning {
    /// Stable machine-readable code for this warning.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NonZeroReservedFields => "NON_ZERO_RESERVED_FIELDS",
            Self::FileSizeMismatch => "FILE_SIZE_MISMATCH",
            Self::UnusualPlanesValue => "UNUSUAL_PLANES_VALUE",
            Self::WindowsCeBitsPerPixel => "WINDOWS_CE_BITS_PER_PIXEL",
            Self::ForbiddenTopDownOrientation => "FORBIDDEN_TOP_DOWN_ORIENTATION",
            Self::IncoherentResolution => "INCOHERENT_RESOLUTION",
            Self::NegativeResolution => "NEGATIVE_RESOLUTION",
            Self::PaletteTruncated => "PALETTE_TRUNCATED",
            Self::GapBeforeBitmap => "GAP_BEFORE_BITMAP",
            Self::MissingPaletteEntries => "MISSING_PALETTE_ENTRIES",
            Self::DefaultPaletteSubstituted => "DEFAULT_PALETTE_SUBSTITUTED",
            Self::BadPaletteIndices => "BAD_PALETTE_INDICES",
            Self::TooManyIndicesInBitmap => "TOO_MANY_INDICES_IN_BITMAP",
            Self::NotEnoughIndicesInBitmap => "NOT_ENOUGH_INDICES_IN_BITMAP",
            Self::DeltaModeMayOverflow => "DELTA_MODE_MAY_OVERFLOW",
            Self::RunCrossesScanline => "RUN_CROSSES_SCANLINE",
            Self::BitfieldMaskExceedsPixelDepth => "BITFIELD_MASK_EXCEEDS_PIXEL_DEPTH",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NonZeroReservedFields => "file header reserved fields are not zero",
            Self::FileSizeMismatch => "declared file size differs from the actual size",
            Self::UnusualPlanesValue => "planes field is not 1",
            Self::WindowsCeBitsPerPixel => "2 bits per pixel is only valid on Windows CE",
            Self::ForbiddenTopDownOrientation => {
                "run-length compressed bitmaps must be stored bottom-up"
            }
            Self::IncoherentResolution => "horizontal and vertical resolutions are incoherent",
            Self::NegativeResolution => "resolution is negative",
            Self::PaletteTruncated => "palette has more than 256 entries",
            Self::GapBeforeBitmap => "unused bytes between the palette and the bitmap",
            Self::MissingPaletteEntries => "palette overlaps the bitmap data",
            Self::DefaultPaletteSubstituted => "palette missing, default palette used",
            Self::BadPaletteIndices => "bitmap references indices beyond the palette",
            Self::TooManyIndicesInBitmap => "bitmap holds more data than the image needs",
            Self::NotEnoughIndicesInBitmap => "bitmap data ends before the image is complete",
            Self::DeltaModeMayOverflow => "delta move wraps past the end of the line",
            Self::RunCrossesScanline => "run wraps past the end of the line",
            Self::BitfieldMaskExceedsPixelDepth => "bitfield mask is wider than the pixel",
        };
        f.write_str(text)
    }
}

/// Ordered warning accumulator threaded through every decode layer.
#[derive(Clone, Debug, Default)]
pub(crate) struct Warnings {
    list: Vec<Warning>,
}

impl Warnings {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a warning. Repeats are dropped.
    pub(crate) fn push(&mut self, warning: Warning) {
        if !self.list.contains(&warning) {
            self.list.push(warning);
        }
    }

    pub(crate) fn as_slice(&self) -> &[Warning] {
        &self.list
    }

    /// Sorted, de-duplicated list for the final result.
    pub(crate) fn finish(mut self) -> Vec<Warning> {
        self.list.sort();
        self.list.dedup();
        self.list
    }
}
