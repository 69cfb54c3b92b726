#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decompress";
    fs::create_dir_all(dir).unwrap();

    // 2x2 uncompressed 24-bit at (1, 1)
    let mut raw24 = vec![2u8, 2, 3, 0x00, 1, 1];
    raw24.extend_from_slice(&[0xff, 0x00, 0x00, 0x00, 0xff, 0x00, 0x00, 0x00, 0xff, 0x80, 0x80, 0x80]);
    fs::write(format!("{dir}/raw24_2x2.bin"), raw24).unwrap();

    // 4x1 uncompressed 8-bit palette indices
    let raw8 = vec![4u8, 1, 0, 0x00, 0, 0, 0, 64, 128, 255];
    fs::write(format!("{dir}/raw8_4x1.bin"), raw8).unwrap();

    // 1x1 uncompressed 32-bit, truncated
    let short32 = vec![1u8, 1, 4, 0x00, 0, 0, 0xff, 0xff];
    fs::write(format!("{dir}/raw32_short.bin"), short32).unwrap();

    // compressed planar with no engine registered
    let planar = vec![8u8, 8, 4, 0x80, 0, 0, 0x10, 0x20];
    fs::write(format!("{dir}/planar_8x8.bin"), planar).unwrap();

    let dir = "fuzz/corpus/fuzz_glyph";
    fs::create_dir_all(dir).unwrap();

    // 8x2 glyph at (2, 3)
    let glyph = vec![8u8, 2, 2, 3, 0, 0, 0b1010_0101, 0b0101_1010];
    fs::write(format!("{dir}/glyph_8x2.bin"), glyph).unwrap();

    // 10x1 glyph, padded row, negative origin
    let padded = vec![10u8, 1, 0xfe, 0, 0, 0, 0xff, 0xc0];
    fs::write(format!("{dir}/glyph_10x1_neg.bin"), padded).unwrap();

    println!("Seeds written");
}
