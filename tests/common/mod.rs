//! Byte-level builders for test bitmaps.
#![allow(dead_code)]

pub const RGB: u32 = 0;
pub const RLE8: u32 = 1;
pub const RLE4: u32 = 2;
pub const BITFIELDS: u32 = 3;
pub const ALPHA_BITFIELDS: u32 = 6;

/// 72 dpi.
pub const PPM_72: i32 = 2835;

/// A `BM` file with a Windows info header.
#[derive(Clone, Debug)]
pub struct Bmp {
    pub header_size: u32,
    pub width: i32,
    pub height: i32,
    pub bpp: u16,
    pub compression: u32,
    /// Overrides the image size field, which defaults to `data.len()`.
    pub image_size: Option<u32>,
    pub ppm: (i32, i32),
    /// BGRX quads.
    pub palette: Vec<[u8; 4]>,
    /// Overrides the colours-used field, which defaults to `palette.len()`.
    pub colors_used: Option<u32>,
    pub masks: [u32; 4],
    pub gamma: Option<[u32; 3]>,
    pub data: Vec<u8>,
}

impl Bmp {
    pub fn new(width: i32, height: i32, bpp: u16) -> Self {
        Self {
            header_size: 40,
            width,
            height,
            bpp,
            compression: RGB,
            image_size: None,
            ppm: (PPM_72, PPM_72),
            palette: Vec::new(),
            colors_used: None,
            masks: [0; 4],
            gamma: None,
            data: Vec::new(),
        }
    }

    pub fn compression(mut self, compression: u32) -> Self {
        self.compression = compression;
        self
    }

    pub fn header_size(mut self, size: u32) -> Self {
        self.header_size = size;
        self
    }

    pub fn palette(mut self, palette: &[[u8; 4]]) -> Self {
        self.palette = palette.to_vec();
        self
    }

    pub fn masks(mut self, masks: [u32; 4]) -> Self {
        self.masks = masks;
        self
    }

    pub fn data(mut self, data: &[u8]) -> Self {
        self.data = data.to_vec();
        self
    }

    /// Rows given top to bottom; stored bottom-up for positive heights, each
    /// padded to 4 bytes.
    pub fn rows(mut self, rows: &[&[u8]]) -> Self {
        let mut ordered: Vec<&[u8]> = rows.to_vec();
        if self.height > 0 {
            ordered.reverse();
        }
        self.data.clear();
        for row in ordered {
            self.data.extend_from_slice(row);
            while self.data.len() % 4 != 0 {
                self.data.push(0);
            }
        }
        self
    }

    /// Bytes of masks stored after a 40-byte header.
    fn trailing_masks(&self) -> usize {
        match (self.header_size, self.compression) {
            (40, BITFIELDS) => 12,
            (40, ALPHA_BITFIELDS) => 16,
            _ => 0,
        }
    }

    pub fn content_offset(&self) -> usize {
        14 + self.header_size as usize + self.trailing_masks() + self.palette.len() * 4
    }

    fn put_info_header(&self, out: &mut Vec<u8>) {
        put_i32(out, self.width);
        put_i32(out, self.height);
        put_u16(out, 1);
        put_u16(out, self.bpp);
        put_u32(out, self.compression);
        put_u32(out, self.image_size.unwrap_or(self.data.len() as u32));
        put_i32(out, self.ppm.0);
        put_i32(out, self.ppm.1);
        put_u32(out, self.colors_used.unwrap_or(self.palette.len() as u32));
        put_u32(out, 0);

        let mask_bytes = match self.header_size {
            40 => self.trailing_masks(),
            52 => 12,
            64 => 0,
            _ => 16,
        };
        for &m in &self.masks[..mask_bytes / 4] {
            put_u32(out, m);
        }
        if self.header_size == 64 {
            // Units, reserved, recording, rendering, two sizes, encoding, id.
            out.extend_from_slice(&[0; 24]);
        }
        if self.header_size >= 108 {
            // LCS_CALIBRATED_RGB when a gamma is given, sRGB otherwise.
            put_u32(out, if self.gamma.is_some() { 0 } else { 0x7352_4742 });
            out.extend_from_slice(&[0; 36]);
            for g in self.gamma.unwrap_or([0; 3]) {
                put_u32(out, g);
            }
        }
        if self.header_size == 124 {
            out.extend_from_slice(&[0; 16]);
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let offset = self.content_offset();
        let mut out = Vec::with_capacity(offset + self.data.len());
        out.extend_from_slice(b"BM");
        put_u32(&mut out, (offset + self.data.len()) as u32);
        put_u32(&mut out, 0);
        put_u32(&mut out, offset as u32);

        put_u32(&mut out, self.header_size);
        match self.header_size {
            // Windows 2.x core header: 16-bit dimensions.
            12 => {
                put_u16(&mut out, self.width as i16 as u16);
                put_u16(&mut out, self.height as i16 as u16);
                put_u16(&mut out, 1);
                put_u16(&mut out, self.bpp);
            }
            // OS/2 2.x header cut short after the depth.
            16 => {
                put_i32(&mut out, self.width);
                put_i32(&mut out, self.height);
                put_u16(&mut out, 1);
                put_u16(&mut out, self.bpp);
            }
            _ => self.put_info_header(&mut out),
        }
        assert_eq!(out.len(), 14 + self.header_size as usize + self.trailing_masks());

        for quad in &self.palette {
            out.extend_from_slice(quad);
        }
        out.extend_from_slice(&self.data);
        out
    }
}

/// Windows 1.x bitmap: 10 header bytes then top-down rows of `byte_width`.
pub fn v1(width: u16, height: u16, byte_width: u16, bpp: u8, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    put_u16(&mut out, 0);
    put_u16(&mut out, width);
    put_u16(&mut out, height);
    put_u16(&mut out, byte_width);
    out.push(1);
    out.push(bpp);
    out.extend_from_slice(data);
    out
}

/// OS/2 1.x bitmap: 12-byte core header with 3-byte palette entries.
pub fn os21x(width: u16, height: u16, bpp: u16, palette: &[[u8; 3]], data: &[u8]) -> Vec<u8> {
    let offset = 14 + 12 + palette.len() * 3;
    let mut out = Vec::new();
    out.extend_from_slice(b"BM");
    put_u32(&mut out, (offset + data.len()) as u32);
    put_u32(&mut out, 0);
    put_u32(&mut out, offset as u32);
    put_u32(&mut out, 12);
    put_u16(&mut out, width);
    put_u16(&mut out, height);
    put_u16(&mut out, 1);
    put_u16(&mut out, bpp);
    for entry in palette {
        out.extend_from_slice(entry);
    }
    out.extend_from_slice(data);
    out
}

/// Chain standalone `BM` files into a `BA` array, rebasing their pixel data
/// offsets to absolute positions.
pub fn bitmap_array(images: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, image) in images.iter().enumerate() {
        let start = out.len();
        let next = if i + 1 == images.len() {
            0
        } else {
            start + 14 + image.len()
        };
        out.extend_from_slice(b"BA");
        put_u32(&mut out, 14);
        put_u32(&mut out, next as u32);
        put_u16(&mut out, 0);
        put_u16(&mut out, 0);

        let mut image = image.clone();
        let offset = u32::from_le_bytes([image[10], image[11], image[12], image[13]]);
        let rebased = offset + (start + 14) as u32;
        image[10..14].copy_from_slice(&rebased.to_le_bytes());
        out.extend_from_slice(&image);
    }
    out
}

/// Absolute offset of the `offset_to_next` field of the `BA` header at `entry`.
pub fn next_field(entry: usize) -> usize {
    entry + 6
}

/// A `width`x`height` 24-bit image filled with one BGR colour.
pub fn solid24(width: i32, height: i32, bgr: [u8; 3]) -> Vec<u8> {
    let row: Vec<u8> = (0..width).flat_map(|_| bgr).collect();
    let rows: Vec<&[u8]> = (0..height).map(|_| row.as_slice()).collect();
    Bmp::new(width, height, 24).rows(&rows).build()
}

pub const GRAY4: [[u8; 4]; 4] = [
    [0, 0, 0, 0],
    [85, 85, 85, 0],
    [170, 170, 170, 0],
    [255, 255, 255, 0],
];

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}
