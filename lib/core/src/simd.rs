// Lane-parallel kernels for dense f32 vectors.
//
// Accumulation uses a fixed number of lanes folded in a fixed order, so the
// result of `dot(a, b)` depends only on the inputs, never on the CPU features
// of the machine. LLVM vectorizes the inner loop on every target we build for.

const LANES: usize = 8;

/// Dot product of two equally sized slices.
///
/// Returns 0.0 when the lengths differ.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut acc = [0.0f32; LANES];
    let a_chunks = a.chunks_exact(LANES);
    let b_chunks = b.chunks_exact(LANES);
    let a_rem = a_chunks.remainder();
    let b_rem = b_chunks.remainder();

    for (xa, xb) in a_chunks.zip(b_chunks) {
        for lane in 0..LANES {
            acc[lane] += xa[lane] * xb[lane];
        }
    }

    let mut tail = 0.0f32;
    for (x, y) in a_rem.iter().zip(b_rem) {
        tail += x * y;
    }

    fold(acc) + tail
}

/// Squared euclidean length.
#[inline]
pub fn norm_squared(v: &[f32]) -> f32 {
    dot(v, v)
}

/// Euclidean length.
#[inline]
pub fn norm(v: &[f32]) -> f32 {
    norm_squared(v).sqrt()
}

/// Cosine similarity with precomputed norms.
///
/// A zero norm on either side yields 0.0. The result is clamped to [-1, 1]
/// to absorb rounding on near-parallel vectors.
#[inline]
pub fn cosine_with_norms(a: &[f32], b: &[f32], norm_a: f32, norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot(a, b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

// Pairwise fold: (0+4)+(1+5) ... keeps the tree shape fixed.
#[inline]
fn fold(acc: [f32; LANES]) -> f32 {
    let s0 = acc[0] + acc[4];
    let s1 = acc[1] + acc[5];
    let s2 = acc[2] + acc[6];
    let s3 = acc[3] + acc[7];
    (s0 + s2) + (s1 + s3)
}
