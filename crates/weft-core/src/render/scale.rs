//! Nearest-neighbour placement of an RGBA8888 image inside a 0RGB frame.

use weft_common::{ScaleMode, Size};

/// Where the scaled source lands in the destination. Offsets may be
/// negative when the scaled image is larger than the destination and gets
/// cropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

pub fn placement(src: Size, dst: Size, mode: ScaleMode) -> Placement {
    let centred = |width: u32, height: u32| Placement {
        x: (i64::from(dst.width) - i64::from(width)) / 2,
        y: (i64::from(dst.height) - i64::from(height)) / 2,
        width,
        height,
    };

    if src.area() == 0 || dst.area() == 0 {
        return centred(0, 0);
    }

    let scale_x = f64::from(dst.width) / f64::from(src.width);
    let scale_y = f64::from(dst.height) / f64::from(src.height);
    let uniform = |scale: f64| {
        let w = (f64::from(src.width) * scale).round().max(1.0) as u32;
        let h = (f64::from(src.height) * scale).round().max(1.0) as u32;
        centred(w, h)
    };

    match mode {
        ScaleMode::Stretch => centred(dst.width, dst.height),
        ScaleMode::Fit => uniform(scale_x.min(scale_y)),
        ScaleMode::Fill => uniform(scale_x.max(scale_y)),
        ScaleMode::Integer => {
            let k = (scale_x.min(scale_y).floor() as u32).max(1);
            centred(src.width.saturating_mul(k), src.height.saturating_mul(k))
        }
        ScaleMode::None => centred(src.width, src.height),
    }
}

/// Pack one RGBA pixel as 0RGB. Alpha is ignored.
#[inline]
pub fn rgba_to_xrgb(px: &[u8]) -> u32 {
    u32::from_le_bytes([px[2], px[1], px[0], 0])
}

/// Fill `dst` with `background`, then copy `src` into it at `place`.
///
/// `src` must hold exactly `src_size.area() * 4` bytes and `dst` exactly
/// `dst_size.area()` pixels.
pub fn blit(
    dst: &mut [u32],
    dst_size: Size,
    src: &[u8],
    src_size: Size,
    place: Placement,
    background: u32,
) {
    dst.fill(background);
    if place.width == 0 || place.height == 0 || src_size.area() == 0 {
        return;
    }

    // Source column for every visible destination column.
    let dst_w = i64::from(dst_size.width);
    let x0 = place.x.max(0);
    let x1 = (place.x + i64::from(place.width)).min(dst_w);
    if x0 >= x1 {
        return;
    }
    let columns: Vec<usize> = (x0..x1)
        .map(|x| {
            let rel = (x - place.x) as u64;
            (rel * u64::from(src_size.width) / u64::from(place.width)) as usize
        })
        .collect();

    let y0 = place.y.max(0);
    let y1 = (place.y + i64::from(place.height)).min(i64::from(dst_size.height));
    let src_stride = src_size.width as usize * 4;

    for y in y0..y1 {
        let rel = (y - place.y) as u64;
        let src_y = (rel * u64::from(src_size.height) / u64::from(place.height)) as usize;
        let src_row = &src[src_y * src_stride..(src_y + 1) * src_stride];
        let dst_start = y as usize * dst_size.width as usize + x0 as usize;
        let dst_row = &mut dst[dst_start..dst_start + columns.len()];
        for (out, &sx) in dst_row.iter_mut().zip(&columns) {
            *out = rgba_to_xrgb(&src_row[sx * 4..sx * 4 + 4]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
        rgba.iter().copied().cycle().take((w * h * 4) as usize).collect()
    }

    #[test]
    fn fit_letterboxes_wide_window() {
        let p = placement(Size::new(10, 10), Size::new(40, 20), ScaleMode::Fit);
        assert_eq!(p, Placement { x: 10, y: 0, width: 20, height: 20 });
    }

    #[test]
    fn fill_crops_with_negative_offset() {
        let p = placement(Size::new(10, 10), Size::new(40, 20), ScaleMode::Fill);
        assert_eq!(p, Placement { x: 0, y: -10, width: 40, height: 40 });
    }

    #[test]
    fn integer_scale_is_whole_and_at_least_one() {
        let p = placement(Size::new(10, 10), Size::new(35, 25), ScaleMode::Integer);
        assert_eq!((p.width, p.height), (20, 20));

        let p = placement(Size::new(100, 100), Size::new(50, 50), ScaleMode::Integer);
        assert_eq!((p.width, p.height), (100, 100));
        assert_eq!((p.x, p.y), (-25, -25));
    }

    #[test]
    fn none_centres_without_scaling() {
        let p = placement(Size::new(4, 2), Size::new(10, 10), ScaleMode::None);
        assert_eq!(p, Placement { x: 3, y: 4, width: 4, height: 2 });
    }

    #[test]
    fn stretch_covers_destination() {
        let p = placement(Size::new(3, 7), Size::new(40, 20), ScaleMode::Stretch);
        assert_eq!(p, Placement { x: 0, y: 0, width: 40, height: 20 });
    }

    #[test]
    fn empty_source_places_nothing() {
        let p = placement(Size::new(0, 0), Size::new(40, 20), ScaleMode::Fit);
        assert_eq!((p.width, p.height), (0, 0));
    }

    #[test]
    fn rgba_conversion_ignores_alpha() {
        assert_eq!(rgba_to_xrgb(&[0x11, 0x22, 0x33, 0x00]), 0x0011_2233);
        assert_eq!(rgba_to_xrgb(&[0x11, 0x22, 0x33, 0xff]), 0x0011_2233);
    }

    #[test]
    fn blit_letterbox_keeps_background() {
        let src = solid(2, 2, [255, 0, 0, 255]);
        let dst_size = Size::new(4, 2);
        let mut dst = vec![0u32; 8];
        let place = placement(Size::new(2, 2), dst_size, ScaleMode::Fit);
        blit(&mut dst, dst_size, &src, Size::new(2, 2), place, 0x0000_00ff);
        assert_eq!(
            dst,
            vec![
                0xff, 0xff_0000, 0xff_0000, 0xff, //
                0xff, 0xff_0000, 0xff_0000, 0xff,
            ]
        );
    }

    #[test]
    fn blit_nearest_neighbour_doubles_pixels() {
        // 2x1 source: red, green
        let src = vec![255, 0, 0, 255, 0, 255, 0, 255];
        let dst_size = Size::new(4, 2);
        let mut dst = vec![0u32; 8];
        let place = placement(Size::new(2, 1), dst_size, ScaleMode::Stretch);
        blit(&mut dst, dst_size, &src, Size::new(2, 1), place, 0);
        let (r, g) = (0xff_0000, 0x00_ff00);
        assert_eq!(dst, vec![r, r, g, g, r, r, g, g]);
    }

    #[test]
    fn blit_crop_stays_in_bounds() {
        let src = solid(8, 8, [0, 0, 255, 255]);
        let dst_size = Size::new(3, 3);
        let mut dst = vec![0u32; 9];
        let place = placement(Size::new(8, 8), dst_size, ScaleMode::None);
        blit(&mut dst, dst_size, &src, Size::new(8, 8), place, 0);
        assert!(dst.iter().all(|&p| p == 0x0000_00ff));
    }
}
