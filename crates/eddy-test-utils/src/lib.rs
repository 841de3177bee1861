//! Test utilities for eddy development.
//!
//! - [`fixtures`]: ready-made lattices, channels and particle clouds.
//! - [`mocks`]: trivial [`Solver`](eddy_core::Solver) implementations for
//!   exercising drivers.
//! - [`assert_close`] / [`assert_slices_close`]: relative float checks.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod mocks;

/// Panic unless `a` and `b` agree to `rel_tol` relative to the larger
/// magnitude (absolute below 1).
#[track_caller]
pub fn assert_close(a: f64, b: f64, rel_tol: f64) {
    let scale = a.abs().max(b.abs()).max(1.0);
    assert!(
        (a - b).abs() <= rel_tol * scale,
        "{a} and {b} differ by {} (tolerance {rel_tol} x {scale})",
        (a - b).abs()
    );
}

/// Element-wise [`assert_close`].
#[track_caller]
pub fn assert_slices_close(a: &[f64], b: &[f64], rel_tol: f64) {
    assert_eq!(a.len(), b.len(), "slice lengths differ");
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        let scale = x.abs().max(y.abs()).max(1.0);
        assert!(
            (x - y).abs() <= rel_tol * scale,
            "index {i}: {x} and {y} differ by {}",
            (x - y).abs()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_values_pass() {
        assert_close(1000.0, 1000.0 + 1e-7, 1e-9);
        assert_slices_close(&[0.0, 1e-12], &[1e-12, 0.0], 1e-9);
    }

    #[test]
    #[should_panic(expected = "differ")]
    fn distant_values_fail() {
        assert_close(1.0, 1.1, 1e-3);
    }
}
