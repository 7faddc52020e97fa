//! Parcel-size sampling.
//!
//! A distribution supplies the diameter of each new parcel plus a mean
//! parcel volume used to turn volume quotas into counts. Samplers hold no
//! RNG of their own: the owning injection model passes its `StdRng` in,
//! so cloning a model duplicates the entire sampling state.

use crate::error::{FeedError, FeedResult};
use crate::parcel::sphere_volume;
use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

/// Midpoint-rule resolution for inverse-CDF mean estimates.
const MEAN_QUADRATURE_POINTS: usize = 1024;

/// Attempts before truncated rejection sampling falls back to a bound.
const MAX_REJECTION_TRIES: usize = 100;

/// Diameter sampler for newly injected parcels.
pub trait SizeDistribution: Send + Sync {
    /// Draw one parcel diameter.
    fn sample(&self, rng: &mut StdRng) -> f64;

    /// Expected diameter of a draw.
    fn mean_diameter(&self) -> f64;

    /// Mean per-parcel volume: the sphere volume at the mean diameter.
    ///
    /// Low for wide distributions (E[d]^3 <= E[d^3]); the quota remainder
    /// carry absorbs the resulting count drift.
    fn mean_volume(&self) -> f64 {
        sphere_volume(self.mean_diameter())
    }

    fn boxed_clone(&self) -> Box<dyn SizeDistribution>;
}

impl Clone for Box<dyn SizeDistribution> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// Every parcel gets the same diameter.
#[derive(Clone, Copy, Debug)]
pub struct FixedValue {
    value: f64,
}

impl FixedValue {
    pub fn new(value: f64) -> FeedResult<Self> {
        if !(value > 0.0 && value.is_finite()) {
            return Err(FeedError::InvalidDistribution {
                kind: "fixedValue",
                reason: format!("value must be positive, got {}", value),
            });
        }
        Ok(Self { value })
    }
}

impl SizeDistribution for FixedValue {
    fn sample(&self, _rng: &mut StdRng) -> f64 {
        self.value
    }

    fn mean_diameter(&self) -> f64 {
        self.value
    }

    fn boxed_clone(&self) -> Box<dyn SizeDistribution> {
        Box::new(*self)
    }
}

/// Diameters uniform over `[min, max]`.
#[derive(Clone, Copy, Debug)]
pub struct Uniform {
    min: f64,
    max: f64,
}

impl Uniform {
    pub fn new(min: f64, max: f64) -> FeedResult<Self> {
        if !(min > 0.0 && max > min) {
            return Err(FeedError::InvalidDistribution {
                kind: "uniform",
                reason: format!("need 0 < minValue < maxValue, got [{}, {}]", min, max),
            });
        }
        Ok(Self { min, max })
    }
}

impl SizeDistribution for Uniform {
    fn sample(&self, rng: &mut StdRng) -> f64 {
        rng.random_range(self.min..=self.max)
    }

    fn mean_diameter(&self) -> f64 {
        0.5 * (self.min + self.max)
    }

    fn boxed_clone(&self) -> Box<dyn SizeDistribution> {
        Box::new(*self)
    }
}

/// Gaussian diameters truncated to `[min, max]` by rejection.
///
/// When the bounds exclude essentially all of the Gaussian mass the
/// rejection loop gives up after [`MAX_REJECTION_TRIES`] and returns the
/// bound nearest the expectation.
#[derive(Clone, Copy, Debug)]
pub struct TruncatedNormal {
    expectation: f64,
    min: f64,
    max: f64,
    inner: Normal<f64>,
}

impl TruncatedNormal {
    pub fn new(expectation: f64, std_dev: f64, min: f64, max: f64) -> FeedResult<Self> {
        if !(min > 0.0 && max > min) {
            return Err(FeedError::InvalidDistribution {
                kind: "normal",
                reason: format!("need 0 < minValue < maxValue, got [{}, {}]", min, max),
            });
        }
        if !(std_dev > 0.0 && std_dev.is_finite()) {
            return Err(FeedError::InvalidDistribution {
                kind: "normal",
                reason: format!("stdDev must be positive, got {}", std_dev),
            });
        }
        let inner = Normal::new(expectation, std_dev).map_err(|e| FeedError::InvalidDistribution {
            kind: "normal",
            reason: e.to_string(),
        })?;
        Ok(Self {
            expectation,
            min,
            max,
            inner,
        })
    }
}

impl SizeDistribution for TruncatedNormal {
    fn sample(&self, rng: &mut StdRng) -> f64 {
        for _ in 0..MAX_REJECTION_TRIES {
            let d = self.inner.sample(rng);
            if d >= self.min && d <= self.max {
                return d;
            }
        }
        self.expectation.clamp(self.min, self.max)
    }

    fn mean_diameter(&self) -> f64 {
        self.expectation.clamp(self.min, self.max)
    }

    fn boxed_clone(&self) -> Box<dyn SizeDistribution> {
        Box::new(*self)
    }
}

/// Rosin-Rammler (Weibull) diameters restricted to `[min, max]`.
///
/// Sampled through the inverse CDF over the `[F(min), F(max)]` slice, so
/// no draw is ever rejected. `d` is the characteristic diameter (63.2%
/// passing), `n` the spread exponent.
#[derive(Clone, Copy, Debug)]
pub struct RosinRammler {
    min: f64,
    max: f64,
    d: f64,
    n: f64,
    cdf_min: f64,
    cdf_span: f64,
}

fn weibull_cdf(x: f64, d: f64, n: f64) -> f64 {
    1.0 - (-(x / d).powf(n)).exp()
}

impl RosinRammler {
    pub fn new(min: f64, max: f64, d: f64, n: f64) -> FeedResult<Self> {
        if !(min > 0.0 && max > min) {
            return Err(FeedError::InvalidDistribution {
                kind: "RosinRammler",
                reason: format!("need 0 < minValue < maxValue, got [{}, {}]", min, max),
            });
        }
        if !(d > 0.0 && d.is_finite()) {
            return Err(FeedError::InvalidDistribution {
                kind: "RosinRammler",
                reason: format!("characteristic diameter d must be positive, got {}", d),
            });
        }
        if !(n > 0.0 && n.is_finite()) {
            return Err(FeedError::InvalidDistribution {
                kind: "RosinRammler",
                reason: format!("spread exponent n must be positive, got {}", n),
            });
        }
        let cdf_min = weibull_cdf(min, d, n);
        let cdf_span = weibull_cdf(max, d, n) - cdf_min;
        if !(cdf_span > 0.0) {
            // both bounds so deep in a tail the CDF difference underflows
            return Err(FeedError::InvalidDistribution {
                kind: "RosinRammler",
                reason: format!(
                    "bounds [{}, {}] carry no distribution mass for d = {}, n = {}",
                    min, max, d, n
                ),
            });
        }
        Ok(Self {
            min,
            max,
            d,
            n,
            cdf_min,
            cdf_span,
        })
    }

    /// Inverse CDF of the unrestricted distribution.
    fn quantile(&self, p: f64) -> f64 {
        self.d * (-(1.0 - p).ln()).powf(1.0 / self.n)
    }

    /// Quantile of the restricted distribution for `u` in `[0, 1)`.
    fn truncated_quantile(&self, u: f64) -> f64 {
        self.quantile(self.cdf_min + u * self.cdf_span)
            .clamp(self.min, self.max)
    }
}

impl SizeDistribution for RosinRammler {
    fn sample(&self, rng: &mut StdRng) -> f64 {
        self.truncated_quantile(rng.random::<f64>())
    }

    fn mean_diameter(&self) -> f64 {
        // midpoint rule over the inverse CDF; no special functions needed
        let mut sum = 0.0;
        for k in 0..MEAN_QUADRATURE_POINTS {
            let u = (k as f64 + 0.5) / MEAN_QUADRATURE_POINTS as f64;
            sum += self.truncated_quantile(u);
        }
        sum / MEAN_QUADRATURE_POINTS as f64
    }

    fn boxed_clone(&self) -> Box<dyn SizeDistribution> {
        Box::new(*self)
    }
}
