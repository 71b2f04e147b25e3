use super::*;

fn png_of(w: u32, h: u32, rgba: [u8; 4]) -> EncodedImage {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    EncodedImage::png(buf)
}

#[test]
fn decode_premultiplies() {
    let r = decode_raster(&png_of(1, 1, [100, 50, 200, 128])).unwrap();
    assert_eq!((r.width, r.height), (1, 1));
    assert_eq!(
        r.data,
        vec![
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_garbage_is_composition_error() {
    let err = decode_raster(&EncodedImage::new("image/png", b"not a png".to_vec())).unwrap_err();
    assert!(matches!(err, BrushError::Composition(_)));
}

#[test]
fn encode_then_decode_opaque_is_lossless() {
    let size = CanvasSize::new(3, 2).unwrap();
    let r = RgbaRaster::filled(size, [12, 34, 56, 255]).unwrap();
    let png = encode_png(&r).unwrap();
    assert_eq!(png.media_type(), "image/png");
    assert_eq!(decode_raster(&png).unwrap(), r);
}

#[test]
fn encode_rejects_inconsistent_buffer() {
    let r = RgbaRaster {
        width: 2,
        height: 2,
        data: vec![0u8; 4],
    };
    assert!(matches!(encode_png(&r), Err(BrushError::Composition(_))));
}

#[test]
fn stretch_changes_dimensions_and_keeps_solid_color() {
    let small = decode_raster(&png_of(2, 2, [255, 0, 0, 255])).unwrap();
    let big = small.stretched_to(CanvasSize::new(8, 6).unwrap()).unwrap();
    assert_eq!((big.width, big.height), (8, 6));
    assert_eq!(big.data.len(), 8 * 6 * 4);
    assert_eq!(big.pixel(7, 5), Some([255, 0, 0, 255]));
    assert_eq!(big.pixel(8, 0), None);
}

#[test]
fn stretch_to_same_size_is_identity() {
    let r = decode_raster(&png_of(4, 4, [1, 2, 3, 255])).unwrap();
    let same = r.clone().stretched_to(r.size()).unwrap();
    assert_eq!(same, r);
}
