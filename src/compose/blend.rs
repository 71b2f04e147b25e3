use crate::foundation::error::{BrushError, BrushResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

/// Source-over for one premultiplied pixel. A fully transparent `src` leaves `dst` as is.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(sa);
    std::array::from_fn(|i| src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv)))
}

/// Layer `src` over `dst` pixel by pixel. Both buffers are premultiplied RGBA8 of equal size.
pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> BrushResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(BrushError::composition(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/compose/blend.rs"]
mod tests;
