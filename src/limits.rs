use crate::error::BmpError;

/// Resource limits for a decode.
///
/// All fields default to `None` (no limit). Limits are checked once the info
/// header is known and before the output buffer is allocated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum memory bytes for the output pixel buffer.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// Limits that reject nothing.
    pub const fn none() -> Self {
        Self {
            max_width: None,
            max_height: None,
            max_pixels: None,
            max_memory_bytes: None,
        }
    }

    /// Validate an output image of `width * height` pixels of `pixel_bytes`
    /// each, returning the pixel count to allocate.
    pub(crate) fn check_output(
        &self,
        width: u32,
        height: u32,
        pixel_bytes: usize,
    ) -> Result<usize, BmpError> {
        exceeds("width", u64::from(width), self.max_width)?;
        exceeds("height", u64::from(height), self.max_height)?;
        let pixels = u64::from(width) * u64::from(height);
        exceeds("pixel count", pixels, self.max_pixels)?;

        let count = usize::try_from(pixels)
            .ok()
            .filter(|n| n.checked_mul(pixel_bytes).is_some())
            .ok_or(BmpError::DimensionsTooLarge { width, height })?;
        exceeds(
            "output buffer bytes",
            (count * pixel_bytes) as u64,
            self.max_memory_bytes,
        )?;
        Ok(count)
    }
}

fn exceeds(what: &str, value: u64, limit: Option<u64>) -> Result<(), BmpError> {
    match limit {
        Some(max) if value > max => Err(BmpError::LimitExceeded(format!(
            "{what} {value} exceeds limit {max}"
        ))),
        _ => Ok(()),
    }
}
