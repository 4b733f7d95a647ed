use std::fmt;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{HepatoError, Result};

/// Test-set fraction, held as a whole percentage so it can key maps.
/// Serialized as the bare percentage; deserialization goes through
/// [`SplitConfig::from_percent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SplitConfig {
    test_percent: u8,
}

impl SplitConfig {
    /// Default fractions: 80/20, 70/30, 60/40, 50/50.
    pub const DEFAULT_FRACTIONS: [f64; 4] = [0.20, 0.30, 0.40, 0.50];

    pub fn from_fraction(fraction: f64) -> Result<Self> {
        if !fraction.is_finite() || fraction <= 0.0 || fraction >= 1.0 {
            return Err(HepatoError::InvalidSplit(fraction));
        }
        let percent = (fraction * 100.0).round();
        if (percent - fraction * 100.0).abs() > 1e-6 {
            return Err(HepatoError::InvalidSplit(fraction));
        }
        Self::from_percent(percent as u8)
    }

    pub fn from_percent(test_percent: u8) -> Result<Self> {
        if test_percent == 0 || test_percent >= 100 {
            return Err(HepatoError::InvalidSplit(f64::from(test_percent) / 100.0));
        }
        Ok(Self { test_percent })
    }

    pub fn test_percent(&self) -> u8 {
        self.test_percent
    }

    pub fn train_percent(&self) -> u8 {
        100 - self.test_percent
    }

    pub fn test_fraction(&self) -> f64 {
        f64::from(self.test_percent) / 100.0
    }

    pub fn defaults() -> Vec<Self> {
        Self::DEFAULT_FRACTIONS
            .iter()
            .filter_map(|&f| Self::from_fraction(f).ok())
            .collect()
    }
}

impl TryFrom<u8> for SplitConfig {
    type Error = HepatoError;

    fn try_from(test_percent: u8) -> Result<Self> {
        Self::from_percent(test_percent)
    }
}

impl From<SplitConfig> for u8 {
    fn from(split: SplitConfig) -> Self {
        split.test_percent
    }
}

impl fmt::Display for SplitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.train_percent(), self.test_percent)
    }
}

/// Row indices of one train/test partition, each list sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified train/test partition preserving the class ratio.
///
/// Each class is shuffled with a seeded ChaCha8 stream and
/// `round(n_class * fraction)` of its rows go to the test side, keeping at
/// least one training row per class.
pub fn stratified_split(labels: &[f64], split: SplitConfig, seed: u64) -> SplitIndices {
    let mut class0: Vec<usize> = Vec::new();
    let mut class1: Vec<usize> = Vec::new();
    for (i, &label) in labels.iter().enumerate() {
        if label == 1.0 {
            class1.push(i);
        } else {
            class0.push(i);
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    class0.shuffle(&mut rng);
    class1.shuffle(&mut rng);

    let fraction = split.test_fraction();
    let test_count = |n: usize| -> usize {
        let wanted = (n as f64 * fraction).round() as usize;
        wanted.min(n.saturating_sub(1))
    };
    let test0 = test_count(class0.len());
    let test1 = test_count(class1.len());

    let mut test: Vec<usize> = class0[..test0]
        .iter()
        .chain(class1[..test1].iter())
        .copied()
        .collect();
    let mut train: Vec<usize> = class0[test0..]
        .iter()
        .chain(class1[test1..].iter())
        .copied()
        .collect();
    test.sort_unstable();
    train.sort_unstable();

    tracing::debug!(
        split = %split,
        train = train.len(),
        test = test.len(),
        "stratified split"
    );

    SplitIndices { train, test }
}
