use labelcard::{Dpi, FaceOptions, FontFace, Hinting};

#[test]
fn face_exposes_family_from_bytes() {
    let font_bytes = std::fs::read("tests/data/fonts/DejaVuSans.ttf").unwrap();

    let mut face = FontFace::load(font_bytes, FaceOptions::default()).unwrap();
    assert!(!face.family().trim().is_empty());
    assert!(face.measure("labelcard").unwrap() > 0.0);
    face.release();
}

#[test]
fn screen_dpi_widens_text_by_a_third() {
    let font_bytes = std::fs::read("tests/data/fonts/DejaVuSans.ttf").unwrap();
    let opts = |dpi| FaceOptions {
        size_pt: 30.0,
        dpi,
        hinting: Hinting::None,
    };

    let mut print = FontFace::load(font_bytes.clone(), opts(Dpi::Print72)).unwrap();
    let mut screen = FontFace::load(font_bytes, opts(Dpi::Screen96)).unwrap();
    assert_eq!(screen.size_px(), 40.0);

    let ratio = screen.measure("Wavelength").unwrap() / print.measure("Wavelength").unwrap();
    assert!((ratio - 4.0 / 3.0).abs() < 0.05, "{ratio}");
    assert!(screen.metrics().line_height > print.metrics().line_height);
}
