pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

pub(crate) fn premul_rgba8(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    let a16 = u16::from(a);
    let premul = |c: u8| -> u8 { mul_div255_u8(u16::from(c), a16) };
    [premul(r), premul(g), premul(b), a]
}

pub(crate) fn unpremul_rgba8(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    if a == 0 {
        return [0, 0, 0, 0];
    }
    if a == 255 {
        return rgba;
    }
    let a32 = u32::from(a);
    let unpremul = |c: u8| -> u8 { ((u32::from(c) * 255 + a32 / 2) / a32).min(255) as u8 };
    [unpremul(r), unpremul(g), unpremul(b), a]
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let out = premul_rgba8([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&out);
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let out = unpremul_rgba8([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div255_rounds_to_nearest() {
        assert_eq!(mul_div255_u8(255, 255), 255);
        assert_eq!(mul_div255_u8(0, 255), 0);
        assert_eq!(mul_div255_u8(128, 255), 128);
        assert_eq!(mul_div255_u8(255, 128), 128);
        assert_eq!(mul_div255_u8(100, 128), 50);
    }

    #[test]
    fn premul_zero_alpha_clears_color() {
        assert_eq!(premul_rgba8([200, 100, 50, 0]), [0, 0, 0, 0]);
        assert_eq!(unpremul_rgba8([0, 0, 0, 0]), [0, 0, 0, 0]);
    }

    #[test]
    fn opaque_pixels_pass_through_unchanged() {
        let px = [12, 34, 56, 255];
        assert_eq!(premul_rgba8(px), px);
        assert_eq!(unpremul_rgba8(px), px);
    }

    #[test]
    fn half_alpha_roundtrip_is_close() {
        let straight = [200, 100, 50, 128];
        let back = unpremul_rgba8(premul_rgba8(straight));
        for c in 0..3 {
            assert!((i16::from(back[c]) - i16::from(straight[c])).abs() <= 1);
        }
        assert_eq!(back[3], 128);
    }
}
