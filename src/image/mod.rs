//! Pure image kernels operating on row-major `f32` buffers.
//!
//! All kernels take explicit dimensions and write into caller-provided
//! output buffers. Rotation uses nearest-neighbour sampling with the pixel
//! centre at `(i + 0.5, j + 0.5)`; crops are centred with per-axis offset
//! `(in - out) / 2`.

/// Copies the centred `h_dst x w_dst` sub-image of `src` into `dst`.
///
/// Preconditions: `h_dst <= h_src`, `w_dst <= w_src`, buffer lengths match
/// the stated dimensions.
pub fn crop(src: &[f32], h_src: usize, w_src: usize, dst: &mut [f32], h_dst: usize, w_dst: usize) {
    debug_assert_eq!(src.len(), h_src * w_src);
    debug_assert_eq!(dst.len(), h_dst * w_dst);
    debug_assert!(h_dst <= h_src && w_dst <= w_src);

    let off_y = (h_src - h_dst) / 2;
    let off_x = (w_src - w_dst) / 2;

    for y in 0..h_dst {
        let src_row = (y + off_y) * w_src + off_x;
        dst[y * w_dst..(y + 1) * w_dst].copy_from_slice(&src[src_row..src_row + w_dst]);
    }
}

/// Horizontally flips `src` into `dst`: `dst[y][x] = src[y][w - 1 - x]`.
pub fn flip(src: &[f32], h: usize, w: usize, dst: &mut [f32]) {
    debug_assert_eq!(src.len(), h * w);
    debug_assert_eq!(dst.len(), h * w);

    for y in 0..h {
        let row = y * w;
        for x in 0..w {
            dst[row + x] = src[row + w - 1 - x];
        }
    }
}

/// Rotates `src` by `angle` radians about its centre, then writes the
/// centred `h_dst x w_dst` crop into `dst`.
///
/// Sampling is nearest-neighbour; source samples falling outside the image
/// are treated as 0. With `angle == 0` this is exactly [`crop`].
pub fn rotate_and_crop(
    src: &[f32],
    h_src: usize,
    w_src: usize,
    dst: &mut [f32],
    h_dst: usize,
    w_dst: usize,
    angle: f32,
) {
    debug_assert_eq!(src.len(), h_src * w_src);
    debug_assert_eq!(dst.len(), h_dst * w_dst);
    debug_assert!(h_dst <= h_src && w_dst <= w_src);

    let center_y = h_src as f32 / 2.0;
    let center_x = w_src as f32 / 2.0;
    let off_y = (h_src - h_dst) / 2;
    let off_x = (w_src - w_dst) / 2;

    let (sin, cos) = angle.sin_cos();

    for y in 0..h_dst {
        let dy = (y + off_y) as f32 + 0.5 - center_y;
        for x in 0..w_dst {
            let dx = (x + off_x) as f32 + 0.5 - center_x;

            // Inverse mapping: rotate the destination offset by -angle.
            let px = center_x + dx * cos + dy * sin;
            let py = center_y - dx * sin + dy * cos;

            let sx = px.floor();
            let sy = py.floor();

            dst[y * w_dst + x] = if sx >= 0.0
                && sy >= 0.0
                && (sx as usize) < w_src
                && (sy as usize) < h_src
            {
                src[sy as usize * w_src + sx as usize]
            } else {
                0.0
            };
        }
    }
}

/// Euclidean distance between two equally sized buffers.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(h: usize, w: usize) -> Vec<f32> {
        (0..h * w).map(|i| i as f32).collect()
    }

    #[test]
    fn test_crop_identity() {
        let src = ramp(4, 4);
        let mut dst = vec![0.0; 16];
        crop(&src, 4, 4, &mut dst, 4, 4);
        assert_eq!(src, dst);
    }

    #[test]
    fn test_crop_centered() {
        let src = ramp(4, 4);
        let mut dst = vec![0.0; 4];
        crop(&src, 4, 4, &mut dst, 2, 2);
        // Center 2x2 of a 4x4 ramp: rows 1..3, cols 1..3.
        assert_eq!(dst, vec![5.0, 6.0, 9.0, 10.0]);
    }

    #[test]
    fn test_crop_odd_offset() {
        let src = ramp(5, 5);
        let mut dst = vec![0.0; 9];
        crop(&src, 5, 5, &mut dst, 3, 3);
        assert_eq!(dst, vec![6.0, 7.0, 8.0, 11.0, 12.0, 13.0, 16.0, 17.0, 18.0]);
    }

    #[test]
    fn test_flip_is_involution() {
        let src = ramp(3, 5);
        let mut once = vec![0.0; 15];
        let mut twice = vec![0.0; 15];
        flip(&src, 3, 5, &mut once);
        flip(&once, 3, 5, &mut twice);
        assert_eq!(src, twice);
    }

    #[test]
    fn test_flip_mirrors_rows() {
        let src = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut dst = vec![0.0; 6];
        flip(&src, 2, 3, &mut dst);
        assert_eq!(dst, vec![3.0, 2.0, 1.0, 6.0, 5.0, 4.0]);
    }

    #[test]
    fn test_rotate_zero_equals_crop() {
        let src = ramp(6, 6);
        let mut cropped = vec![0.0; 16];
        let mut rotated = vec![0.0; 16];
        crop(&src, 6, 6, &mut cropped, 4, 4);
        rotate_and_crop(&src, 6, 6, &mut rotated, 4, 4, 0.0);
        assert_eq!(cropped, rotated);
    }

    #[test]
    fn test_rotate_full_turn_equals_crop() {
        let src = ramp(8, 8);
        let mut cropped = vec![0.0; 36];
        let mut rotated = vec![0.0; 36];
        crop(&src, 8, 8, &mut cropped, 6, 6);
        rotate_and_crop(&src, 8, 8, &mut rotated, 6, 6, 2.0 * std::f32::consts::PI);
        for (a, b) in cropped.iter().zip(rotated.iter()) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn test_rotate_preserves_center_pixel() {
        // Odd dimensions: the center pixel maps onto itself for any angle.
        let mut src = vec![0.0; 25];
        src[12] = 9.0;
        let mut dst = vec![0.0; 25];
        for &angle in &[0.3f32, 1.1, 2.7, 4.0] {
            rotate_and_crop(&src, 5, 5, &mut dst, 5, 5, angle);
            assert_eq!(dst[12], 9.0);
        }
    }

    #[test]
    fn test_rotate_out_of_range_is_zero() {
        let src = vec![1.0; 16];
        let mut dst = vec![0.0; 16];
        // 45 degrees swings the corners of a square outside the source.
        rotate_and_crop(&src, 4, 4, &mut dst, 4, 4, std::f32::consts::FRAC_PI_4);
        assert!(dst.iter().any(|&p| p == 0.0));
        assert!(dst.iter().any(|&p| p == 1.0));
    }

    #[test]
    fn test_euclidean_distance() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert_eq!(euclidean_distance(&a, &a), 0.0);
        assert!((euclidean_distance(&a, &b) - std::f32::consts::SQRT_2).abs() < 1e-6);
        assert!(euclidean_distance(&a, &b) >= 0.0);
    }
}
