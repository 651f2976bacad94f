#![no_main]
use libfuzzer_sys::fuzz_target;
use zenbmp::*;

fuzz_target!(|data: &[u8]| {
    // Decoding the same bytes twice must give the same image.
    let request = DecodeRequest::new(data).with_limits(Limits {
        max_pixels: Some(1 << 22),
        ..Limits::default()
    });
    let Ok(first) = request.decode::<RGBA8>() else {
        return;
    };
    let second = request.decode::<RGBA8>().expect("second decode failed");
    assert_eq!(first, second);

    // 8-bit pixels survive a trip through the HDR layout.
    let back: DecodedImage<RGBA8> = first.convert::<Bgra16>().convert();
    assert_eq!(back.pixels(), first.pixels());
});
