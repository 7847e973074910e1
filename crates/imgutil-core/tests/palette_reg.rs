//! Palette and effective palette regression test

use imgutil_core::{Palette, PixelFormat, Rgba, color, effective_palette};
use imgutil_test::RegParams;

#[test]
fn palette_reg() {
    let mut rp = RegParams::new("palette");

    // --- Test 1: worked example (2x2 RGBA) ---
    let red = color::compose_rgba(255, 0, 0, 255);
    let green = color::compose_rgba(0, 255, 0, 255);
    let blue = color::compose_rgba(0, 0, 255, 255);
    let ep = effective_palette(&[red, green, red, blue]).unwrap();
    rp.compare_values(3.0, ep.len() as f64, 0.0);
    rp.compare_bytes(&[0, 1, 0, 2], &ep.indices);
    rp.compare_values(2.0, ep.format().bits_per_pixel() as f64, 0.0);
    let expected =
        Palette::from_colors(2, &[Rgba::rgb(255, 0, 0), Rgba::rgb(0, 255, 0), Rgba::rgb(0, 0, 255)])
            .unwrap();
    rp.compare_palettes(&expected, &ep.to_palette().unwrap());

    // --- Test 2: count equals true unique count; expansion is exact ---
    let input: Vec<u32> = (0..5000u32).map(|i| (i * i) % 211 | 0xFF00_0000).collect();
    let ep = effective_palette(&input).unwrap();
    let mut unique = input.clone();
    unique.sort_unstable();
    unique.dedup();
    rp.compare_values(unique.len() as f64, ep.len() as f64, 0.0);
    rp.compare_values(1.0, if ep.expand() == input { 1.0 } else { 0.0 }, 0.0);

    // --- Test 3: same RGB, different alpha are distinct ---
    let ep = effective_palette(&[0x10203040, 0x102030FF, 0x10203040]).unwrap();
    rp.compare_bytes(&[0, 1, 0], &ep.indices);

    // --- Test 4: default palettes have the format's capacity ---
    for format in [
        PixelFormat::Index1,
        PixelFormat::Index2,
        PixelFormat::Index4,
        PixelFormat::Index8,
    ] {
        let pal = Palette::default_for(format).unwrap();
        rp.compare_values(
            format.palette_capacity().unwrap() as f64,
            pal.len() as f64,
            0.0,
        );
        // Every default palette entry is distinct
        let ep = effective_palette(&pal.to_packed()).unwrap();
        rp.compare_values(pal.len() as f64, ep.len() as f64, 0.0);
    }

    assert!(rp.cleanup());
}
