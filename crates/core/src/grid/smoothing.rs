//! Two-pass kernel smoothing of footprint fields
//!
//! The analytical footprint switches abruptly from zero to non-zero at the
//! `xstar = d` boundary, which leaves grid-scale noise. Two passes of a small
//! normalised kernel approximate a broader Gaussian blur. Convolution is
//! zero-padded and shape-preserving, so cells on the border lose some mass.

use nalgebra::DMatrix;

/// Normalised 3×3 smoothing kernel (sums to 1).
pub const SMOOTHING_KERNEL: [[f64; 3]; 3] = [
    [0.05, 0.1, 0.05],
    [0.1, 0.4, 0.1],
    [0.05, 0.1, 0.05],
];

/// Apply both smoothing passes.
pub fn smooth(field: &DMatrix<f64>) -> DMatrix<f64> {
    convolve_same(&convolve_same(field))
}

/// One zero-padded 3×3 convolution with output shape equal to input shape.
fn convolve_same(field: &DMatrix<f64>) -> DMatrix<f64> {
    let (rows, cols) = field.shape();
    DMatrix::from_fn(rows, cols, |r, c| {
        let mut acc = 0.0;
        for (kr, kernel_row) in SMOOTHING_KERNEL.iter().enumerate() {
            let Some(rr) = (r + kr).checked_sub(1).filter(|&v| v < rows) else {
                continue;
            };
            for (kc, weight) in kernel_row.iter().enumerate() {
                let Some(cc) = (c + kc).checked_sub(1).filter(|&v| v < cols) else {
                    continue;
                };
                acc += weight * field[(rr, cc)];
            }
        }
        acc
    })
}
