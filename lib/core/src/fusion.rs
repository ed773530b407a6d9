// Text + numeric concatenation into one item vector
use crate::numeric::NUMERIC_DIM;
use crate::{Error, Result, Vector};

/// `text` followed by `numeric`; width `text_dim + 4`.
pub fn fuse(text: &Vector, numeric: &Vector, text_dim: usize) -> Result<Vector> {
    if text.dim() != text_dim {
        return Err(Error::InvalidDimension {
            expected: text_dim,
            actual: text.dim(),
        });
    }
    if numeric.dim() != NUMERIC_DIM {
        return Err(Error::InvalidDimension {
            expected: NUMERIC_DIM,
            actual: numeric.dim(),
        });
    }
    Ok(text.concat(numeric))
}

/// Row-wise [`fuse`]; both inputs must have one row per item.
pub fn fuse_all(text: &[Vector], numeric: &[Vector], text_dim: usize) -> Result<Vec<Vector>> {
    if text.len() != numeric.len() {
        return Err(Error::InvalidDimension {
            expected: text.len(),
            actual: numeric.len(),
        });
    }
    text.iter()
        .zip(numeric)
        .map(|(t, n)| fuse(t, n, text_dim))
        .collect()
}

#[inline]
pub fn fused_dim(text_dim: usize) -> usize {
    text_dim + NUMERIC_DIM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuse_order() {
        let text = Vector::new(vec![0.6, 0.8]);
        let numeric = Vector::new(vec![1.0, 2.0, 3.0, 4.0]);
        let fused = fuse(&text, &numeric, 2).unwrap();
        assert_eq!(fused.dim(), fused_dim(2));
        assert_eq!(fused.as_slice(), &[0.6, 0.8, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_fuse_dimension_mismatch() {
        let text = Vector::new(vec![0.6, 0.8]);
        let numeric = Vector::new(vec![1.0, 2.0]);
        assert!(matches!(
            fuse(&text, &numeric, 2),
            Err(Error::InvalidDimension { expected: 4, actual: 2 })
        ));
        assert!(matches!(
            fuse(&text, &Vector::zeros(4), 3),
            Err(Error::InvalidDimension { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_fuse_all_row_count() {
        let text = vec![Vector::zeros(2)];
        let numeric = vec![Vector::zeros(4), Vector::zeros(4)];
        assert!(fuse_all(&text, &numeric, 2).is_err());
    }
}
