#![no_main]
use libfuzzer_sys::fuzz_target;
use zenbmp::*;

fn limits() -> Limits {
    Limits {
        max_pixels: Some(1 << 22),
        ..Limits::default()
    }
}

fuzz_target!(|data: &[u8]| {
    // Every entry point must return, never panic.
    let request = DecodeRequest::new(data).with_limits(limits());
    let _ = request.probe();
    let _ = request.decode::<RGBA8>();
    let _ = request.decode::<Bgra16>();
    let _ = request.decode_all::<RGB8>();
    let _ = request.decode_best_fit::<BGRA8>(&FitConstraints::Size {
        width: 32,
        height: 32,
    });

    if let Ok(seq) = BitmapSequence::from_reader(std::io::Cursor::new(data)) {
        let mut seq = seq.with_limits(limits());
        let options = DecodeOptions::default();
        while !matches!(seq.next::<RGBA8>(&options), Err(BmpError::EndOfSequence)) {}
    }
});
