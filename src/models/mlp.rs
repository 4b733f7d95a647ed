//! Feed-forward classifier on `candle_nn` linear layers.
//!
//! Weights live in a [`VarMap`] so the optimizer and the layers share the
//! same tensors. Persistence flattens every variable into the JSON artifact.

use std::collections::BTreeMap;
use std::fmt;

use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{AdamW, Linear, Module, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::{check_width, matrix_rows, sigmoid, IModel, TrainingOutcome};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpParams {
    pub hidden_layers: Vec<usize>,
    /// Epoch cap.
    pub max_iter: usize,
    pub learning_rate: f64,
    /// Decoupled weight decay passed to AdamW.
    pub alpha: f64,
    pub batch_size: usize,
    pub tol: f64,
    pub n_iter_no_change: usize,
}

impl Default for MlpParams {
    fn default() -> Self {
        Self {
            hidden_layers: vec![50, 25],
            max_iter: 1000,
            learning_rate: 1e-3,
            alpha: 1e-4,
            batch_size: 200,
            tol: 1e-4,
            n_iter_no_change: 10,
        }
    }
}

/// ReLU hidden layers, one logistic output unit, AdamW over seeded
/// mini-batches. Stops early once the training loss plateaus.
#[derive(Clone)]
pub struct MlpClassifier {
    params: MlpParams,
    seed: u64,
    n_features: usize,
    varmap: VarMap,
    layers: Vec<Linear>,
    loss_curve: Vec<f64>,
}

fn layer_name(idx: usize) -> String {
    format!("layer{idx}")
}

/// Numerically stable mean of `max(z, 0) - z * y + ln(1 + e^-|z|)`.
fn logit_loss(logits: &Tensor, targets: &Tensor) -> candle_core::Result<Tensor> {
    let softplus = logits.abs()?.neg()?.exp()?.affine(1.0, 1.0)?.log()?;
    logits
        .relu()?
        .sub(&logits.mul(targets)?)?
        .add(&softplus)?
        .mean_all()
}

impl MlpClassifier {
    pub fn new(params: MlpParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            n_features: 0,
            varmap: VarMap::new(),
            layers: Vec::new(),
            loss_curve: Vec::new(),
        }
    }

    pub fn loss_curve(&self) -> &[f64] {
        &self.loss_curve
    }

    fn layer_sizes(&self, n_features: usize) -> Vec<usize> {
        let mut sizes = vec![n_features];
        sizes.extend(self.params.hidden_layers.iter().copied());
        sizes.push(1);
        sizes
    }

    /// Builds the layers from variables already present in `varmap`.
    fn build_layers(varmap: &VarMap, sizes: &[usize]) -> Result<Vec<Linear>> {
        let vb = VarBuilder::from_varmap(varmap, DType::F64, &Device::Cpu);
        let layers = sizes
            .windows(2)
            .enumerate()
            .map(|(idx, w)| candle_nn::linear(w[0], w[1], vb.pp(layer_name(idx))))
            .collect::<candle_core::Result<Vec<_>>>()?;
        Ok(layers)
    }

    /// Glorot-uniform weights and biases drawn from the seeded stream, so
    /// two fits with the same seed start from the same point.
    fn init_varmap(sizes: &[usize], rng: &mut ChaCha8Rng) -> Result<VarMap> {
        let varmap = VarMap::new();
        {
            let mut vars = varmap
                .data()
                .lock()
                .map_err(|_| candle_core::Error::Msg("parameter map lock poisoned".into()))?;
            for (idx, w) in sizes.windows(2).enumerate() {
                let (n_in, n_out) = (w[0], w[1]);
                let bound = (6.0 / (n_in + n_out) as f64).sqrt();
                let weights: Vec<f64> = (0..n_in * n_out)
                    .map(|_| rng.gen_range(-bound..bound))
                    .collect();
                let biases: Vec<f64> = (0..n_out).map(|_| rng.gen_range(-bound..bound)).collect();
                let name = layer_name(idx);
                vars.insert(
                    format!("{name}.weight"),
                    Var::from_tensor(&Tensor::from_vec(weights, (n_out, n_in), &Device::Cpu)?)?,
                );
                vars.insert(
                    format!("{name}.bias"),
                    Var::from_tensor(&Tensor::from_vec(biases, n_out, &Device::Cpu)?)?,
                );
            }
        }
        Ok(varmap)
    }

    fn forward_logits(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let mut h = x.clone();
        for (idx, layer) in self.layers.iter().enumerate() {
            h = layer.forward(&h)?;
            if idx + 1 < self.layers.len() {
                h = h.relu()?;
            }
        }
        Ok(h)
    }

    fn probabilities(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = Tensor::from_vec(rows.concat(), (rows.len(), self.n_features), &Device::Cpu)?;
        let logits = self.forward_logits(&x)?.flatten_all()?.to_vec1::<f64>()?;
        Ok(logits.into_iter().map(sigmoid).collect())
    }

    fn snapshot(&self) -> Result<MlpSnapshot> {
        let vars = self
            .varmap
            .data()
            .lock()
            .map_err(|_| candle_core::Error::Msg("parameter map lock poisoned".into()))?;
        let mut tensors = BTreeMap::new();
        for (name, var) in vars.iter() {
            let t = var.as_tensor();
            tensors.insert(
                name.clone(),
                TensorData {
                    shape: t.dims().to_vec(),
                    values: t.flatten_all()?.to_vec1::<f64>()?,
                },
            );
        }
        Ok(MlpSnapshot {
            params: self.params.clone(),
            seed: self.seed,
            n_features: self.n_features,
            loss_curve: self.loss_curve.clone(),
            tensors,
        })
    }

    fn from_snapshot(snapshot: MlpSnapshot) -> Result<Self> {
        let mut model = Self::new(snapshot.params, snapshot.seed);
        model.loss_curve = snapshot.loss_curve;
        if snapshot.n_features == 0 {
            return Ok(model);
        }

        let sizes = model.layer_sizes(snapshot.n_features);
        let expected: Vec<String> = (0..sizes.len() - 1)
            .flat_map(|idx| {
                let name = layer_name(idx);
                [format!("{name}.weight"), format!("{name}.bias")]
            })
            .collect();
        if expected.len() != snapshot.tensors.len()
            || expected.iter().any(|k| !snapshot.tensors.contains_key(k))
        {
            return Err(candle_core::Error::Msg("stored layers do not match hidden_layers".into()).into());
        }

        {
            let mut vars = model
                .varmap
                .data()
                .lock()
                .map_err(|_| candle_core::Error::Msg("parameter map lock poisoned".into()))?;
            for (name, data) in snapshot.tensors {
                let t = Tensor::from_vec(data.values, data.shape, &Device::Cpu)?;
                vars.insert(name, Var::from_tensor(&t)?);
            }
        }
        model.layers = Self::build_layers(&model.varmap, &sizes)?;
        model.n_features = snapshot.n_features;
        Ok(model)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TensorData {
    shape: Vec<usize>,
    values: Vec<f64>,
}

/// Serialized form: hyperparameters plus every variable, keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MlpSnapshot {
    params: MlpParams,
    seed: u64,
    n_features: usize,
    loss_curve: Vec<f64>,
    tensors: BTreeMap<String, TensorData>,
}

impl Serialize for MlpClassifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.snapshot()
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MlpClassifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let snapshot = MlpSnapshot::deserialize(deserializer)?;
        Self::from_snapshot(snapshot).map_err(<D::Error as serde::de::Error>::custom)
    }
}

impl PartialEq for MlpClassifier {
    fn eq(&self, other: &Self) -> bool {
        match (self.snapshot(), other.snapshot()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for MlpClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MlpClassifier")
            .field("params", &self.params)
            .field("seed", &self.seed)
            .field("n_features", &self.n_features)
            .field("layers", &self.layers.len())
            .field("epochs", &self.loss_curve.len())
            .finish()
    }
}

impl IModel for MlpClassifier {
    fn get_name(&self) -> &str {
        "Multi-layer Perceptron"
    }

    fn train(&mut self, x: &DenseMatrix<f64>, y: &[f64]) -> Result<TrainingOutcome> {
        let rows = matrix_rows(x);
        let n = rows.len();
        let n_features = rows.first().map_or(0, Vec::len);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let sizes = self.layer_sizes(n_features);
        self.varmap = Self::init_varmap(&sizes, &mut rng)?;
        self.layers = Self::build_layers(&self.varmap, &sizes)?;
        self.n_features = n_features;
        self.loss_curve.clear();

        if n == 0 {
            return Ok(TrainingOutcome {
                iterations: 0,
                converged: false,
            });
        }

        let device = Device::Cpu;
        let inputs = Tensor::from_vec(rows.concat(), (n, n_features), &device)?;
        let targets = Tensor::from_vec(y.to_vec(), (n, 1), &device)?;
        let mut optimizer = AdamW::new(
            self.varmap.all_vars(),
            ParamsAdamW {
                lr: self.params.learning_rate,
                weight_decay: self.params.alpha,
                ..Default::default()
            },
        )?;

        let batch_size = self.params.batch_size.clamp(1, n);
        let mut order: Vec<u32> = (0..n as u32).collect();
        let mut best_loss = f64::INFINITY;
        let mut no_improvement = 0usize;
        let mut converged = false;
        let mut epochs = 0;

        for _ in 0..self.params.max_iter {
            epochs += 1;
            order.shuffle(&mut rng);
            let mut epoch_loss = 0.0;

            for batch in order.chunks(batch_size) {
                let idx = Tensor::new(batch, &device)?;
                let xb = inputs.index_select(&idx, 0)?;
                let yb = targets.index_select(&idx, 0)?;

                let loss = logit_loss(&self.forward_logits(&xb)?, &yb)?;
                optimizer.backward_step(&loss)?;
                epoch_loss += loss.to_scalar::<f64>()? * batch.len() as f64;
            }

            let loss = epoch_loss / n as f64;
            self.loss_curve.push(loss);

            if loss > best_loss - self.params.tol {
                no_improvement += 1;
            } else {
                no_improvement = 0;
            }
            if loss < best_loss {
                best_loss = loss;
            }
            if no_improvement > self.params.n_iter_no_change {
                converged = true;
                break;
            }
        }

        Ok(TrainingOutcome {
            iterations: epochs,
            converged,
        })
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64> {
        let p = self.predict_proba_row(row)?;
        Ok(if p > 0.5 { 1.0 } else { 0.0 })
    }

    fn predict_proba_row(&self, row: &[f64]) -> Result<f64> {
        check_width(self, row)?;
        let probs = self.probabilities(&[row.to_vec()])?;
        Ok(probs.first().copied().unwrap_or(0.5))
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn is_fitted(&self) -> bool {
        self.n_features > 0 && !self.layers.is_empty()
    }

    fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| if p > 0.5 { 1.0 } else { 0.0 })
            .collect())
    }

    /// One batched forward pass over all rows.
    fn predict_proba(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>> {
        let rows = matrix_rows(x);
        if let Some(first) = rows.first() {
            check_width(self, first)?;
        }
        self.probabilities(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loading::data_loader::dense_from_rows;
    use crate::error::HepatoError;

    fn small_params() -> MlpParams {
        MlpParams {
            hidden_layers: vec![8, 4],
            max_iter: 300,
            learning_rate: 0.01,
            ..MlpParams::default()
        }
    }

    fn blobs() -> (DenseMatrix<f64>, Vec<f64>) {
        let rows = vec![
            vec![-1.5, -1.0],
            vec![-1.2, -1.4],
            vec![-1.8, -0.9],
            vec![-1.0, -1.6],
            vec![1.4, 1.1],
            vec![1.1, 1.5],
            vec![1.7, 0.8],
            vec![0.9, 1.6],
        ];
        let y = vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (dense_from_rows(&rows).unwrap(), y)
    }

    #[test]
    fn learns_separable_blobs() {
        let (x, y) = blobs();
        let mut mlp = MlpClassifier::new(small_params(), 42);
        mlp.train(&x, &y).unwrap();

        assert!(mlp.is_fitted());
        assert_eq!(mlp.n_features(), 2);
        assert_eq!(mlp.predict(&x).unwrap(), y);
        let first = mlp.loss_curve()[0];
        let last = *mlp.loss_curve().last().unwrap();
        assert!(last < first);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let (x, y) = blobs();
        let mut a = MlpClassifier::new(small_params(), 42);
        let mut b = MlpClassifier::new(small_params(), 42);
        a.train(&x, &y).unwrap();
        b.train(&x, &y).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.predict_proba_row(&[0.2, 0.1]).unwrap(),
            b.predict_proba_row(&[0.2, 0.1]).unwrap()
        );
    }

    #[test]
    fn epoch_cap_reports_non_convergence() {
        let (x, y) = blobs();
        let mut mlp = MlpClassifier::new(
            MlpParams {
                max_iter: 2,
                ..small_params()
            },
            42,
        );
        let outcome = mlp.train(&x, &y).unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 2);
        let p = mlp.predict_proba_row(&[0.0, 0.0]).unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn json_round_trip_keeps_weights() {
        let (x, y) = blobs();
        let mut mlp = MlpClassifier::new(small_params(), 7);
        mlp.train(&x, &y).unwrap();

        let json = serde_json::to_string(&mlp).unwrap();
        let restored: MlpClassifier = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, mlp);
        assert_eq!(restored.predict_proba(&x).unwrap(), mlp.predict_proba(&x).unwrap());
    }

    #[test]
    fn unfitted_model_round_trips_as_unfitted() {
        let mlp = MlpClassifier::new(MlpParams::default(), 42);
        let json = serde_json::to_string(&mlp).unwrap();
        let restored: MlpClassifier = serde_json::from_str(&json).unwrap();
        assert!(!restored.is_fitted());
        assert!(matches!(
            restored.predict_proba_row(&[0.0; 10]),
            Err(HepatoError::InvalidFeatureVector { expected: 0, .. })
        ));
    }

    #[test]
    fn layer_shapes_must_match_params() {
        let (x, y) = blobs();
        let mut mlp = MlpClassifier::new(small_params(), 42);
        mlp.train(&x, &y).unwrap();

        let mut value: serde_json::Value = serde_json::to_value(&mlp).unwrap();
        value["params"]["hidden_layers"] = serde_json::json!([8, 4, 2]);
        assert!(serde_json::from_value::<MlpClassifier>(value).is_err());
    }
}
