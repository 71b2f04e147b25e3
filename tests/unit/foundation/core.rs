use std::io::Cursor;

use super::*;

fn tiny_png() -> Vec<u8> {
    let img = image::RgbaImage::from_raw(1, 1, vec![1u8, 2, 3, 255]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn grid_point_serializes_as_row_col_pair() {
    let p = GridPoint::new(100, 150);
    assert_eq!(serde_json::to_string(&p).unwrap(), "[100,150]");
    let back: GridPoint = serde_json::from_str("[7,9]").unwrap();
    assert_eq!(back, GridPoint::new(7, 9));
}

#[test]
fn grid_point_from_xy_rounds_and_swaps_axes() {
    assert_eq!(GridPoint::from_xy(10.4, 20.6), GridPoint::new(21, 10));
}

#[test]
fn canvas_size_rejects_zero() {
    assert!(CanvasSize::new(0, 10).is_err());
    assert_eq!(CanvasSize::new(4, 3).unwrap().pixel_count(), 12);
}

#[test]
fn from_bytes_sniffs_png() {
    let img = EncodedImage::from_bytes(tiny_png());
    assert_eq!(img.media_type(), "image/png");
    assert!(img.is_image());

    let junk = EncodedImage::from_bytes(b"hello".to_vec());
    assert_eq!(junk.media_type(), "application/octet-stream");
    assert!(!junk.is_image());
}

#[test]
fn data_url_round_trip_keeps_media_type_and_bytes() {
    let img = EncodedImage::png(tiny_png());
    let url = img.to_data_url();
    assert!(url.starts_with("data:image/png;base64,"));
    assert_eq!(EncodedImage::from_data_url(&url).unwrap(), img);
}

#[test]
fn data_url_parse_errors_are_validation_errors() {
    for bad in ["image/png;base64,AAAA", "data:image/png;base64", "data:image/png,AAAA"] {
        let err = EncodedImage::from_data_url(bad).unwrap_err();
        assert!(matches!(err, BrushError::Validation(_)), "{bad}: {err}");
    }
}

#[test]
fn debug_does_not_dump_bytes() {
    let img = EncodedImage::new("image/png", vec![0u8; 4096]);
    let dbg = format!("{img:?}");
    assert!(dbg.contains("len: 4096"));
    assert!(dbg.len() < 100);
}
