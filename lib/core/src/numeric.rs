// Z-score standardization of [price_tier, rating, review_count, rank]
use crate::item::Item;
use crate::{Error, Result, Vector};
use serde::{Deserialize, Serialize};

pub const NUMERIC_DIM: usize = 4;

pub const NUMERIC_FIELDS: [&str; NUMERIC_DIM] = ["price_tier", "rating", "review_count", "rank"];

/// Per-column mean and population standard deviation, fitted once per build.
///
/// A column with zero spread keeps a scale of 1, so every item maps to 0
/// there instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericNormalizer {
    mean: [f64; NUMERIC_DIM],
    scale: [f64; NUMERIC_DIM],
}

impl NumericNormalizer {
    pub fn fit(rows: &[[f64; NUMERIC_DIM]]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        for (i, row) in rows.iter().enumerate() {
            if let Some(col) = row.iter().position(|x| !x.is_finite()) {
                return Err(Error::NumericParse {
                    item: format!("row {i}"),
                    field: NUMERIC_FIELDS[col],
                    value: row[col].to_string(),
                });
            }
        }
        let n = rows.len() as f64;

        let mut mean = [0.0; NUMERIC_DIM];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut scale = [0.0; NUMERIC_DIM];
        for row in rows {
            for ((s, x), m) in scale.iter_mut().zip(row).zip(&mean) {
                *s += (x - m) * (x - m);
            }
        }
        for s in &mut scale {
            *s = (*s / n).sqrt();
            if !s.is_finite() || *s <= f64::EPSILON {
                *s = 1.0;
            }
        }

        Ok(Self { mean, scale })
    }

    pub fn fit_items(items: &[Item]) -> Result<Self> {
        let rows: Vec<_> = items.iter().map(Item::numeric_features).collect();
        Self::fit(&rows)
    }

    pub fn transform(&self, row: &[f64; NUMERIC_DIM]) -> Vector {
        let data = row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| ((x - m) / s) as f32)
            .collect();
        Vector::new(data)
    }

    pub fn fit_transform(rows: &[[f64; NUMERIC_DIM]]) -> Result<(Self, Vec<Vector>)> {
        let normalizer = Self::fit(rows)?;
        let vectors = rows.iter().map(|row| normalizer.transform(row)).collect();
        Ok((normalizer, vectors))
    }

    pub fn mean(&self) -> &[f64; NUMERIC_DIM] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64; NUMERIC_DIM] {
        &self.scale
    }
}
