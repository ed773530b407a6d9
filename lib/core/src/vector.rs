use serde::{Deserialize, Serialize};

/// A dense vector of `f32` components
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            data: vec![0.0; dim],
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        crate::simd::norm(&self.data)
    }

    /// Scale to unit length in place; zero vectors are left untouched
    #[inline]
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > f32::EPSILON {
            let inv_norm = 1.0 / norm;
            for x in &mut self.data {
                *x *= inv_norm;
            }
        }
    }

    /// `self` followed by `other`
    #[must_use]
    pub fn concat(&self, other: &Vector) -> Self {
        let mut data = Vec::with_capacity(self.dim() + other.dim());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        Self { data }
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_keeps_order() {
        let text = Vector::new(vec![0.5, 0.5]);
        let numeric = Vector::new(vec![1.0, -1.0, 0.0, 2.0]);
        let fused = text.concat(&numeric);
        assert_eq!(fused.as_slice(), &[0.5, 0.5, 1.0, -1.0, 0.0, 2.0]);
    }

    #[test]
    fn test_normalize_zero_vector() {
        let mut v = Vector::zeros(3);
        v.normalize();
        assert_eq!(v.as_slice(), &[0.0, 0.0, 0.0]);
    }
}
