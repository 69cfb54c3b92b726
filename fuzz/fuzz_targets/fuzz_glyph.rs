#![no_main]
use libfuzzer_sys::fuzz_target;
use zenraster::*;

// Input: cx, cy, x, y, sx, sy (signed), then the 1-bit mask.
fuzz_target!(|data: &[u8]| {
    let Some((head, mask)) = data.split_first_chunk::<6>() else {
        return;
    };
    let [cx, cy, x, y, sx, sy] = *head;

    let Ok(mut gdi) = Gdi::new(16, 16, PixelFormat::Rgb16, GdiSettings::new().with_color_depth(16))
    else {
        return;
    };
    let Ok(glyph) = GlyphObject::new(&mut gdi, u32::from(cx), u32::from(cy), mask.to_vec()) else {
        return;
    };

    let (x, y) = (i32::from(x as i8), i32::from(y as i8));
    let _ = GlyphObject::begin_draw(&mut gdi, x, y, 12, 12, 0x001F, 0xF800, false);
    let _ = glyph.draw(
        &mut gdi,
        x,
        y,
        i32::from(cx),
        i32::from(cy),
        i32::from(sx as i8),
        i32::from(sy as i8),
        false,
    );
    let _ = GlyphObject::end_draw(&mut gdi);
    glyph.free(&mut gdi);
});
