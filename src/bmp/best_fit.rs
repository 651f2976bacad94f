//! Choosing the bitmap-array entry that best matches a target.

/// What a caller wants from a bitmap array.
///
/// A candidate fits a dimension when it does not exceed the target on it.
/// Among fitting candidates the smallest difference wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitConstraints {
    /// Size first, then resolution, then colour depth.
    Full {
        width: u32,
        height: u32,
        dpi: (u32, u32),
        bits_per_pixel: u16,
    },
    Colors { bits_per_pixel: u16 },
    Resolution { dpi: (u32, u32) },
    Size { width: u32, height: u32 },
}

/// What the selector knows about one entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub width: u64,
    pub height: u64,
    pub dpi: (u32, u32),
    pub bits_per_pixel: u16,
}

const NO_FIT: u64 = u64::MAX;

fn size_score(c: &Candidate, width: u32, height: u32) -> u64 {
    let (tw, th) = (u64::from(width), u64::from(height));
    if c.width <= tw && c.height <= th {
        (tw - c.width) + (th - c.height)
    } else {
        NO_FIT
    }
}

fn resolution_score(c: &Candidate, dpi: (u32, u32)) -> u64 {
    if c.dpi.0 <= dpi.0 && c.dpi.1 <= dpi.1 {
        u64::from(dpi.0 - c.dpi.0) + u64::from(dpi.1 - c.dpi.1)
    } else {
        NO_FIT
    }
}

fn color_score(c: &Candidate, bits_per_pixel: u16) -> u64 {
    if c.bits_per_pixel <= bits_per_pixel {
        u64::from(bits_per_pixel - c.bits_per_pixel)
    } else {
        NO_FIT
    }
}

impl FitConstraints {
    /// Scores in comparison order; unused levels are 0.
    fn score(&self, c: &Candidate) -> [u64; 3] {
        match *self {
            Self::Full {
                width,
                height,
                dpi,
                bits_per_pixel,
            } => [
                size_score(c, width, height),
                resolution_score(c, dpi),
                color_score(c, bits_per_pixel),
            ],
            Self::Colors { bits_per_pixel } => [color_score(c, bits_per_pixel), 0, 0],
            Self::Resolution { dpi } => [resolution_score(c, dpi), 0, 0],
            Self::Size { width, height } => [size_score(c, width, height), 0, 0],
        }
    }
}

/// Index of the best candidate, or 0 when none fits the primary dimension.
pub(crate) fn select_best_fit(
    candidates: impl IntoIterator<Item = Candidate>,
    constraints: &FitConstraints,
) -> usize {
    let mut best: Option<(usize, [u64; 3])> = None;
    for (i, c) in candidates.into_iter().enumerate() {
        let score = constraints.score(&c);
        if best.is_none_or(|(_, b)| score < b) {
            best = Some((i, score));
            if score == [0; 3] {
                break;
            }
        }
    }
    match best {
        Some((i, score)) if score[0] != NO_FIT => i,
        _ => 0,
    }
}
