//! Bitmap arrays: chain walking, whole-array decode, best fit selection and
//! the sequential handle.

mod common;

use std::io::Cursor;

use common::*;
use zenbmp::*;

const RED: [u8; 3] = [0, 0, 255];
const GREEN: [u8; 3] = [0, 255, 0];
const BLUE: [u8; 3] = [255, 0, 0];

fn three_sizes() -> Vec<u8> {
    bitmap_array(&[
        solid24(10, 10, RED),
        solid24(20, 20, GREEN),
        solid24(30, 30, BLUE),
    ])
}

fn size(width: u32, height: u32) -> FitConstraints {
    FitConstraints::Size { width, height }
}

#[test]
fn chain_is_walked_in_order() {
    let data = three_sizes();
    let array = read_array(&data).unwrap();
    assert!(array.is_complete());
    let widths: Vec<i64> = array
        .entries()
        .iter()
        .map(|e| e.info_header().width())
        .collect();
    assert_eq!(widths, vec![10, 20, 30]);
    assert_eq!(array.entries()[0].position, 0);
    assert_eq!(array.entries()[2].header.offset_to_next, 0);
    assert_eq!(array.entries()[1].file_header().kind(), FileKind::Bitmap);
}

#[test]
fn decode_all_returns_every_image() {
    let images = decode_all::<RGB8>(&three_sizes(), &DecodeOptions::default()).unwrap();
    assert_eq!(images.len(), 3);
    assert_eq!((images[1].width, images[1].height), (20, 20));
    assert!(images[2].pixels().iter().all(|p| *p == RGB8 { r: 0, g: 0, b: 255 }));
}

#[test]
fn decode_all_rejects_single_bitmaps() {
    let single = solid24(2, 2, RED);
    assert!(matches!(
        decode_all::<RGB8>(&single, &DecodeOptions::default()),
        Err(BmpError::NotBitmapArrayFileHeader)
    ));
}

#[test]
fn plain_decode_takes_the_first_entry() {
    let image = decode::<RGB8>(&three_sizes(), &DecodeOptions::default()).unwrap();
    assert_eq!((image.width, image.height), (10, 10));
    assert_eq!(image.pixels()[0], RGB8 { r: 255, g: 0, b: 0 });
}

#[test]
fn best_fit_picks_largest_fitting_size() {
    let data = three_sizes();
    let image = decode_best_fit::<RGB8>(&data, &size(25, 25), &DecodeOptions::default()).unwrap();
    assert_eq!((image.width, image.height), (20, 20));
    assert_eq!(image.pixels()[0], RGB8 { r: 0, g: 255, b: 0 });

    let exact = decode_best_fit::<RGB8>(&data, &size(30, 30), &DecodeOptions::default()).unwrap();
    assert_eq!(exact.width, 30);
}

#[test]
fn best_fit_without_candidate_falls_back_to_first() {
    let image =
        decode_best_fit::<RGB8>(&three_sizes(), &size(5, 5), &DecodeOptions::default()).unwrap();
    assert_eq!((image.width, image.height), (10, 10));
}

#[test]
fn best_fit_on_colour_depth() {
    let data = bitmap_array(&[
        solid24(4, 4, RED),
        Bmp::new(4, 4, 8)
            .palette(&GRAY4)
            .data(&[3; 16])
            .build(),
    ]);
    let image = DecodeRequest::new(&data)
        .decode_best_fit::<RGB8>(&FitConstraints::Colors { bits_per_pixel: 8 })
        .unwrap();
    assert_eq!(image.bits_per_pixel, 8);
    assert_eq!(image.pixels()[0], RGB8 { r: 255, g: 255, b: 255 });
}

#[test]
fn best_fit_on_a_single_bitmap_decodes_it() {
    let single = solid24(3, 3, GREEN);
    let image = decode_best_fit::<RGB8>(&single, &size(1, 1), &DecodeOptions::default()).unwrap();
    assert_eq!(image.width, 3);
}

#[test]
fn broken_link_keeps_the_entries_read_so_far() {
    let mut data = three_sizes();
    let second = u32::from_le_bytes(data[6..10].try_into().unwrap()) as usize;
    data[next_field(second)..next_field(second) + 4].copy_from_slice(&3u32.to_le_bytes());

    let array = read_array(&data).unwrap();
    assert_eq!(array.entries().len(), 1);
    assert!(matches!(
        array.error(),
        Some(BmpError::InvalidOffsetToNext { offset: 3 })
    ));
    assert!(matches!(
        decode_all::<RGB8>(&data, &DecodeOptions::default()),
        Err(BmpError::InvalidOffsetToNext { .. })
    ));
}

#[test]
fn link_beyond_the_file_is_rejected() {
    let mut data = three_sizes();
    let past = data.len() as u32 + 100;
    data[next_field(0)..next_field(0) + 4].copy_from_slice(&past.to_le_bytes());
    let array = read_array(&data).unwrap();
    assert!(array.entries().is_empty());
    assert!(matches!(
        array.error(),
        Some(BmpError::OffsetToNextBeyondFile { .. })
    ));
}

#[test]
fn sequence_walks_then_reports_the_end() {
    let mut seq = BitmapSequence::from_reader(Cursor::new(three_sizes())).unwrap();
    assert_eq!(seq.len(), 3);
    let options = DecodeOptions::default();
    let widths: Vec<u32> = (0..3)
        .map(|_| seq.next::<RGB8>(&options).unwrap().width)
        .collect();
    assert_eq!(widths, vec![10, 20, 30]);
    assert!(matches!(
        seq.next::<RGB8>(&options),
        Err(BmpError::EndOfSequence)
    ));

    seq.reset();
    assert_eq!(seq.next::<RGB8>(&options).unwrap().width, 10);
}

#[test]
fn sequence_reports_a_broken_chain_on_every_pass() {
    let mut data = three_sizes();
    let second = u32::from_le_bytes(data[6..10].try_into().unwrap()) as usize;
    data[next_field(second)..next_field(second) + 4].copy_from_slice(&3u32.to_le_bytes());

    let options = DecodeOptions::default()
        .with_default_palettes(std::sync::Arc::new(DefaultPalettes::default()));
    let mut seq = BitmapSequence::from_reader_with_options(Cursor::new(data), &options).unwrap();
    assert_eq!(seq.len(), 1);
    for _ in 0..2 {
        assert_eq!(seq.next::<RGB8>(&options).unwrap().width, 10);
        assert!(matches!(
            seq.next::<RGB8>(&options),
            Err(BmpError::InvalidOffsetToNext { offset: 3 })
        ));
        assert!(matches!(
            seq.next::<RGB8>(&options),
            Err(BmpError::EndOfSequence)
        ));
        seq.reset();
    }
}

#[test]
fn file_requests_honour_limits() {
    let path = std::env::temp_dir().join(format!("zenbmp-limits-{}.bmp", std::process::id()));
    std::fs::write(&path, three_sizes()).unwrap();

    let request = DecodeFileRequest::new(&path).with_limits(Limits {
        max_pixels: Some(150),
        ..Limits::default()
    });
    assert_eq!(request.decode::<RGB8>().unwrap().width, 10);
    assert!(matches!(
        request.decode_all::<RGB8>(),
        Err(BmpError::LimitExceeded(_))
    ));
    assert_eq!(request.decode_best_fit::<RGB8>(&size(10, 10)).unwrap().width, 10);
    assert!(matches!(
        request.decode_best_fit::<RGB8>(&size(30, 30)),
        Err(BmpError::LimitExceeded(_))
    ));
    assert_eq!(probe_file(&path).unwrap().image_count, 3);
    assert_eq!(decode_all_file::<RGB8>(&path, &DecodeOptions::default()).unwrap().len(), 3);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn sequence_needs_an_array() {
    assert!(matches!(
        BitmapSequence::from_reader(Cursor::new(solid24(1, 1, RED))),
        Err(BmpError::NotBitmapArrayFileHeader)
    ));
}

#[test]
fn probe_counts_array_entries() {
    let info = probe(&three_sizes()).unwrap();
    assert_eq!(info.kind, FileKind::BitmapArray);
    assert_eq!(info.image_count, 3);
    assert_eq!((info.width, info.height), (10, 10));
}
