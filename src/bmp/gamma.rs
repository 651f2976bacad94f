//! Tone curve application for calibrated headers and HDR output.

use rgb::alt::BGRA8;

use crate::pixel::{BmpPixel, Bgra16, HDR_ONE, PixelLayout};

/// Display gamma that stored values are assumed to be encoded for.
pub(crate) const DISPLAY_GAMMA: f32 = 2.2;

fn curve(exponent: f32) -> [u8; 256] {
    core::array::from_fn(|v| {
        let x = v as f32 / 255.0;
        (x.powf(exponent) * 255.0).round().clamp(0.0, 255.0) as u8
    })
}

fn apply_hdr(v: u16, exponent: f32) -> u16 {
    if v == 0 {
        return 0;
    }
    let x = f32::from(v) / f32::from(HDR_ONE);
    (x.powf(exponent) * f32::from(HDR_ONE))
        .round()
        .clamp(0.0, f32::from(u16::MAX)) as u16
}

/// Raise the colour channels of every pixel to the per-channel exponents
/// `[red, green, blue]`. Alpha is left alone.
pub(crate) fn apply<P: BmpPixel>(pixels: &mut [P], exponents: [f32; 3]) {
    if exponents.iter().all(|&e| e == 1.0) {
        return;
    }
    if P::LAYOUT == PixelLayout::Bgra16 {
        let [er, eg, eb] = exponents;
        for px in pixels.iter_mut() {
            let c = px.to_bgra16();
            *px = P::from_bgra16(Bgra16 {
                b: apply_hdr(c.b, eb),
                g: apply_hdr(c.g, eg),
                r: apply_hdr(c.r, er),
                a: c.a,
            });
        }
        return;
    }
    let [red, green, blue] = exponents.map(curve);
    for px in pixels.iter_mut() {
        let c = px.to_bgra8();
        *px = P::from_bgra8(BGRA8 {
            b: blue[usize::from(c.b)],
            g: green[usize::from(c.g)],
            r: red[usize::from(c.r)],
            a: c.a,
        });
    }
}

/// Lookup from a 13-bit HDR channel to 8 bits with `exponent` applied.
///
/// Negative values map to 0 and values of 1.0 or more to 255.
pub(crate) fn hdr_to_u8_table(exponent: f32) -> Vec<u8> {
    (0..=HDR_ONE)
        .map(|v| {
            let x = f32::from(v) / f32::from(HDR_ONE);
            (x.powf(exponent) * 255.0).round().clamp(0.0, 255.0) as u8
        })
        .collect()
}
