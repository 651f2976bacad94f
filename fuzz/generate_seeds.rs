#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

/// `BM` file with a 40-byte info header; `palette` is BGRX quads.
fn bmp(width: i32, height: i32, bpp: u16, compression: u32, palette: &[[u8; 4]], data: &[u8]) -> Vec<u8> {
    let offset = 14 + 40 + palette.len() * 4;
    let mut out = Vec::with_capacity(offset + data.len());
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&((offset + data.len()) as u32).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&(offset as u32).to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // planes
    out.extend_from_slice(&bpp.to_le_bytes());
    out.extend_from_slice(&compression.to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&2835i32.to_le_bytes());
    out.extend_from_slice(&2835i32.to_le_bytes());
    out.extend_from_slice(&(palette.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    for quad in palette {
        out.extend_from_slice(quad);
    }
    out.extend_from_slice(data);
    out
}

/// Wrap `images` in a `BA` chain.
fn bitmap_array(images: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, image) in images.iter().enumerate() {
        let start = out.len();
        let next = if i + 1 == images.len() { 0 } else { start + 14 + image.len() };
        out.extend_from_slice(b"BA");
        out.extend_from_slice(&14u32.to_le_bytes());
        out.extend_from_slice(&(next as u32).to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        // Offsets inside an entry are absolute.
        let mut image = image.clone();
        let offset = u32::from_le_bytes([image[10], image[11], image[12], image[13]]) as usize;
        image[10..14].copy_from_slice(&((offset + start + 14) as u32).to_le_bytes());
        out.extend_from_slice(&image);
    }
    out
}

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    let gray = [[0, 0, 0, 0], [255, 255, 255, 0]];

    fs::write(format!("{dir}/bgr24_1x1.bmp"), bmp(1, 1, 24, 0, &[], &[0, 0, 255, 0])).unwrap();
    fs::write(format!("{dir}/mono_8x2.bmp"), bmp(8, 2, 1, 0, &gray, &[0xAA, 0, 0, 0, 0x55, 0, 0, 0])).unwrap();
    fs::write(
        format!("{dir}/rle8_4x2.bmp"),
        bmp(4, 2, 8, 1, &gray, &[4, 1, 0, 0, 0, 3, 0, 1, 0, 0, 0, 1]),
    )
    .unwrap();
    fs::write(format!("{dir}/rle4_4x1.bmp"), bmp(4, 1, 4, 2, &gray, &[4, 0x10, 0, 1])).unwrap();
    fs::write(format!("{dir}/top_down_argb.bmp"), bmp(1, -1, 32, 0, &[], &[1, 2, 3, 4])).unwrap();

    let small = bmp(1, 1, 24, 0, &[], &[0, 0, 255, 0]);
    let large = bmp(2, 2, 24, 0, &[], &[0; 16]);
    fs::write(format!("{dir}/array_2.bmp"), bitmap_array(&[small, large])).unwrap();

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/bm_short.bin"), b"BM\x00\x00").unwrap();
    fs::write(format!("{dir}/ba_short.bin"), b"BA\x0e\x00\x00\x00").unwrap();
    fs::write(format!("{dir}/rle8_no_eob.bmp"), bmp(4, 1, 8, 1, &gray, &[4, 1])).unwrap();

    println!("Generated seed corpus in {dir}/");
}
