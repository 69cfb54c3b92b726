#![no_main]
use libfuzzer_sys::fuzz_target;
use zenraster::*;

const DEPTHS: [u32; 6] = [8, 15, 16, 24, 32, 12];

// Input: width, height, depth selector, flags, left, top, then the update.
fuzz_target!(|data: &[u8]| {
    let Some((head, src)) = data.split_first_chunk::<6>() else {
        return;
    };
    let [w, h, depth, flags, left, top] = *head;
    let bpp = DEPTHS[depth as usize % DEPTHS.len()];
    let compressed = flags & 0x80 != 0;
    let codec_id = CodecId::from_u32(u32::from(flags & 0x07));

    let Ok(mut gdi) = Gdi::new(32, 32, PixelFormat::Bgrx32, GdiSettings::default()) else {
        return;
    };
    let Ok(mut bitmap) = BitmapObject::new(&mut gdi, 1, 1, None) else {
        return;
    };

    // Must never panic, whatever the geometry claims
    let _ = bitmap.decompress(
        &mut gdi,
        src,
        u32::from(w),
        u32::from(h),
        bpp,
        compressed,
        codec_id,
    );
    let (left, top) = (u32::from(left), u32::from(top));
    bitmap.set_rectangle(left, top, left + u32::from(w), top + u32::from(h));
    let _ = bitmap.paint(&mut gdi);
    bitmap.free(&mut gdi);
});
