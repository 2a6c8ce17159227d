//! Dense vector kernels.
//!
//! With the `innr` feature (default) the dot product and norm come from the
//! `innr` crate's SIMD implementations. Without it, a portable kernel
//! accumulates in eight independent lanes so the compiler can vectorize the
//! inner loop. Both similarity backends share [`dot`], which keeps their scores
//! bit-identical for the same row.
//!
//! ```rust
//! use ivfscan::simd::{dot, norm, normalize};
//!
//! let a = [1.0_f32, 0.0, 0.0];
//! let b = [0.707, 0.707, 0.0];
//!
//! let d = dot(&a, &b);
//! let n = norm(&a);
//! let unit = normalize(&[3.0, 4.0]);
//! ```

#[cfg(feature = "innr")]
pub use innr::{dot, norm};

#[cfg(not(feature = "innr"))]
mod fallback {
    //! Portable kernels used when innr is not available.

    const LANES: usize = 8;

    /// Dot product of two vectors.
    ///
    /// Only the common prefix is used when lengths differ; callers validate dimensions.
    #[inline]
    #[must_use]
    pub fn dot(a: &[f32], b: &[f32]) -> f32 {
        let n = a.len().min(b.len());
        let (a, b) = (&a[..n], &b[..n]);

        let mut acc = [0.0_f32; LANES];
        let a_chunks = a.chunks_exact(LANES);
        let b_chunks = b.chunks_exact(LANES);
        let a_tail = a_chunks.remainder();
        let b_tail = b_chunks.remainder();

        for (ca, cb) in a_chunks.zip(b_chunks) {
            for lane in 0..LANES {
                acc[lane] += ca[lane] * cb[lane];
            }
        }

        let mut sum =
            (acc[0] + acc[4]) + (acc[1] + acc[5]) + (acc[2] + acc[6]) + (acc[3] + acc[7]);
        for (x, y) in a_tail.iter().zip(b_tail) {
            sum += x * y;
        }
        sum
    }

    /// L2 norm of a vector.
    #[inline]
    #[must_use]
    pub fn norm(v: &[f32]) -> f32 {
        dot(v, v).sqrt()
    }
}

#[cfg(not(feature = "innr"))]
pub use fallback::{dot, norm};

const NORM_EPSILON: f32 = 1e-10;

/// Normalize a vector to unit L2 norm. Near-zero vectors map to the zero vector.
#[inline]
#[must_use]
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let n = norm(v);
    if n < NORM_EPSILON {
        return vec![0.0; v.len()];
    }
    v.iter().map(|x| x / n).collect()
}
