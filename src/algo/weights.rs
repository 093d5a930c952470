//! Per-vertex scalar solution of a harmonic solve.

use nalgebra::DVector;

/// One value per mesh vertex, indexed like the input vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightMap {
    values: Vec<f64>,
}

impl WeightMap {
    /// Wrap a vector of per-vertex values.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Value at vertex `v`.
    #[inline]
    pub fn get(&self, v: usize) -> f64 {
        self.values[v]
    }

    /// Number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the map holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over values in vertex order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// The values as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Smallest and largest value, or `None` if empty.
    pub fn range(&self) -> Option<(f64, f64)> {
        let first = *self.values.first()?;
        Some(
            self.values
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }

    /// Values rescaled to `[0, 1]`. A constant map becomes all zeros.
    pub fn normalized(&self) -> WeightMap {
        let Some((lo, hi)) = self.range() else {
            return WeightMap::default();
        };
        let span = hi - lo;
        if span <= f64::EPSILON * lo.abs().max(hi.abs()).max(1.0) {
            return WeightMap::new(vec![0.0; self.values.len()]);
        }
        WeightMap::new(self.values.iter().map(|v| (v - lo) / span).collect())
    }

    /// Consume the map, returning the raw values.
    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

impl From<DVector<f64>> for WeightMap {
    fn from(v: DVector<f64>) -> Self {
        Self {
            values: v.data.into(),
        }
    }
}

impl From<Vec<f64>> for WeightMap {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

impl std::ops::Index<usize> for WeightMap {
    type Output = f64;

    fn index(&self, v: usize) -> &f64 {
        &self.values[v]
    }
}
