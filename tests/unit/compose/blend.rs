use super::*;

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    let src = [255, 255, 255, 0];
    assert_eq!(over(dst, src), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src), src);
}

#[test]
fn over_dst_transparent_returns_src() {
    let dst = [0, 0, 0, 0];
    let src = [100, 110, 120, 200];
    assert_eq!(over(dst, src), src);
}

#[test]
fn half_orange_over_white_blends() {
    // straight (255,165,0) at alpha 128, premultiplied
    let src = [128, 83, 0, 128];
    let white = [255, 255, 255, 255];
    let out = over(white, src);
    assert_eq!(out[3], 255);
    assert_eq!(out[0], 255);
    assert!(out[1] > 165 && out[1] < 255, "{out:?}");
    assert!(out[2] > 100 && out[2] < 140, "{out:?}");
}

#[test]
fn over_in_place_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4]).is_err());
    let mut odd = vec![0u8; 3];
    assert!(over_in_place(&mut odd, &[0u8; 3]).is_err());
}

#[test]
fn over_in_place_blends_every_pixel() {
    let mut dst = [0u8, 0, 255, 255].repeat(3);
    let src = [[255u8, 0, 0, 255], [0, 0, 0, 0], [255, 0, 0, 255]].concat();
    over_in_place(&mut dst, &src).unwrap();
    assert_eq!(&dst[0..4], &[255, 0, 0, 255]);
    assert_eq!(&dst[4..8], &[0, 0, 255, 255]);
    assert_eq!(&dst[8..12], &[255, 0, 0, 255]);
}
