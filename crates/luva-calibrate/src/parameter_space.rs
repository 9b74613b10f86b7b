//! Bounded search space over named model coefficients

use crate::{Error, Result};
use indexmap::IndexMap;
use luva_model::parameters::ParameterSet;
use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive range for one coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    /// Coefficient name as accepted by [`ParameterSet::with_overrides`]
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

impl Bound {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn midpoint(&self) -> f64 {
        0.5 * (self.lower + self.upper)
    }
}

/// Ordered list of bounded coefficients.
///
/// A point in the space is a `Vec<f64>` with one value per bound, in the
/// order the bounds were added. Optimisers work in the unit cube and map
/// back with [`ParameterSpace::from_unit`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpace {
    bounds: Vec<Bound>,
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a coefficient to the space.
    ///
    /// Fails if the name is already present or the range is empty or not finite.
    pub fn add(mut self, name: impl Into<String>, lower: f64, upper: f64) -> Result<Self> {
        let name = name.into();
        if !(lower.is_finite() && upper.is_finite()) || lower >= upper {
            return Err(Error::InvalidBounds(format!(
                "'{}' needs finite lower < upper, got [{}, {}]",
                name, lower, upper
            )));
        }
        if self.bounds.iter().any(|b| b.name == name) {
            return Err(Error::InvalidBounds(format!("'{}' is bounded twice", name)));
        }
        self.bounds.push(Bound { name, lower, upper });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn bounds(&self) -> &[Bound] {
        &self.bounds
    }

    pub fn names(&self) -> Vec<String> {
        self.bounds.iter().map(|b| b.name.clone()).collect()
    }

    pub fn midpoint(&self) -> Vec<f64> {
        self.bounds.iter().map(Bound::midpoint).collect()
    }

    pub fn check_dimension(&self, x: &[f64]) -> Result<()> {
        if x.len() != self.len() {
            return Err(Error::DimensionMismatch {
                expected: self.len(),
                got: x.len(),
            });
        }
        Ok(())
    }

    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.len()
            && self
                .bounds
                .iter()
                .zip(x)
                .all(|(b, v)| *v >= b.lower && *v <= b.upper)
    }

    pub fn clip(&self, x: &[f64]) -> Vec<f64> {
        self.bounds
            .iter()
            .zip(x)
            .map(|(b, v)| v.clamp(b.lower, b.upper))
            .collect()
    }

    /// Map a point of the unit cube onto the bounds.
    pub fn from_unit(&self, u: &[f64]) -> Vec<f64> {
        self.bounds
            .iter()
            .zip(u)
            .map(|(b, v)| b.lower + v.clamp(0.0, 1.0) * b.width())
            .collect()
    }

    /// Map a point within the bounds onto the unit cube.
    pub fn to_unit(&self, x: &[f64]) -> Vec<f64> {
        self.bounds
            .iter()
            .zip(x)
            .map(|(b, v)| ((v - b.lower) / b.width()).clamp(0.0, 1.0))
            .collect()
    }

    /// Flat coefficient overrides for a point.
    pub fn to_overrides(&self, x: &[f64]) -> Result<IndexMap<String, f64>> {
        self.check_dimension(x)?;
        Ok(self
            .bounds
            .iter()
            .zip(x)
            .map(|(b, v)| (b.name.clone(), *v))
            .collect())
    }

    /// Check that every bounded name is a coefficient of `parameters`.
    pub fn validate_against(&self, parameters: &ParameterSet) -> Result<()> {
        for bound in &self.bounds {
            parameters.get(&bound.name)?;
        }
        Ok(())
    }

    /// Latin hypercube sample of `n` points in the unit cube.
    ///
    /// Each dimension is split into `n` equal strata and every stratum is
    /// hit exactly once, at a uniformly random offset.
    pub fn latin_hypercube<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<f64> {
        let d = self.len();
        let mut samples = Array2::zeros((n, d));
        let mut strata: Vec<usize> = (0..n).collect();
        for j in 0..d {
            strata.shuffle(rng);
            for (i, &stratum) in strata.iter().enumerate() {
                samples[[i, j]] = (stratum as f64 + rng.gen::<f64>()) / n as f64;
            }
        }
        samples
    }

    /// Uniform random sample of `n` points in the unit cube.
    pub fn sample_uniform<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<f64> {
        Array2::from_shape_fn((n, self.len()), |_| rng.gen::<f64>())
    }
}
