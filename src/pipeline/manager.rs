//! Load-or-train orchestration across all configured splits.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::JoinHandle;

use serde::{Deserialize, Serialize};

use super::bundle::ArtifactBundle;
use super::inference::{self, Prediction};
use super::trainer::{Trainer, TrainerConfig};
use crate::artifacts::{ArtifactIds, ArtifactStore};
use crate::data_loading::{DataLoader, Dataset, DatasetSource};
use crate::error::{HepatoError, Result};
use crate::models::ClassifierKind;
use crate::processing::SplitConfig;

/// How a split's bundle was obtained during initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Loaded,
    Trained,
}

#[derive(Debug, Clone)]
struct RegistryEntry {
    bundle: Arc<ArtifactBundle>,
    resolution: Resolution,
}

/// Immutable split -> bundle map produced by a successful initialization.
///
/// Cheap to share: bundles sit behind `Arc` and nothing mutates them.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    entries: BTreeMap<SplitConfig, RegistryEntry>,
    dataset: Arc<Dataset>,
    seed: u64,
}

impl ModelRegistry {
    pub fn get_bundle(&self, split: SplitConfig) -> Option<Arc<ArtifactBundle>> {
        self.entries.get(&split).map(|e| Arc::clone(&e.bundle))
    }

    pub fn bundle(&self, split: SplitConfig) -> Result<&ArtifactBundle> {
        self.entries
            .get(&split)
            .map(|e| e.bundle.as_ref())
            .ok_or(HepatoError::UnknownSplit(split))
    }

    pub fn splits(&self) -> Vec<SplitConfig> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SplitConfig, &ArtifactBundle)> {
        self.entries.iter().map(|(s, e)| (*s, e.bundle.as_ref()))
    }

    pub fn resolution(&self, split: SplitConfig) -> Option<Resolution> {
        self.entries.get(&split).map(|e| e.resolution)
    }

    pub fn loaded_count(&self) -> usize {
        self.count(Resolution::Loaded)
    }

    pub fn trained_count(&self) -> usize {
        self.count(Resolution::Trained)
    }

    fn count(&self, resolution: Resolution) -> usize {
        self.entries
            .values()
            .filter(|e| e.resolution == resolution)
            .count()
    }

    /// Cleaned table the registry was initialized from.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Seed used for the stratified splits.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn predict(
        &self,
        split: SplitConfig,
        features: &[f64],
        kind: ClassifierKind,
    ) -> Result<Prediction> {
        inference::predict(self.bundle(split)?, features, kind)
    }
}

/// Owns the dataset source, artifact store and trainer; builds the registry.
pub struct ModelLifecycleManager<S, L> {
    store: S,
    loader: L,
    source: DatasetSource,
    trainer: Trainer,
}

impl<S: ArtifactStore, L: DataLoader> ModelLifecycleManager<S, L> {
    pub fn new(store: S, loader: L, source: DatasetSource, config: TrainerConfig) -> Self {
        Self {
            store,
            loader,
            source,
            trainer: Trainer::new(config),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolves every split, loading complete artifact sets and retraining
    /// the rest. A dataset failure aborts the whole run.
    pub fn initialize(&self, splits: &[SplitConfig]) -> Result<ModelRegistry> {
        let dataset = self.loader.load(&self.source)?;

        let mut entries = BTreeMap::new();
        for &split in splits {
            if entries.contains_key(&split) {
                continue;
            }
            let (bundle, resolution) = self.resolve_split(&dataset, split)?;
            entries.insert(
                split,
                RegistryEntry {
                    bundle: Arc::new(bundle),
                    resolution,
                },
            );
        }

        let registry = ModelRegistry {
            entries,
            dataset: Arc::new(dataset),
            seed: self.trainer.config().seed,
        };
        tracing::info!(
            splits = registry.entries.len(),
            loaded = registry.loaded_count(),
            trained = registry.trained_count(),
            "model registry ready"
        );
        Ok(registry)
    }

    fn resolve_split(
        &self,
        dataset: &Dataset,
        split: SplitConfig,
    ) -> Result<(ArtifactBundle, Resolution)> {
        let ids = ArtifactIds::for_split(split);
        let missing: Vec<&str> = ids
            .all()
            .into_iter()
            .filter(|id| !self.store.exists(id))
            .collect();

        if missing.is_empty() {
            match self.load_bundle(&ids, dataset.num_features()) {
                Ok(bundle) => {
                    tracing::info!(split = %split, "loaded persisted models");
                    return Ok((bundle, Resolution::Loaded));
                }
                Err(e) if e.is_recoverable_artifact_error() => {
                    tracing::warn!(split = %split, error = %e, "discarding unreadable artifacts, retraining");
                }
                Err(e) => return Err(e),
            }
        } else {
            tracing::info!(split = %split, missing = ?missing, "artifacts incomplete, training");
        }

        let trained = self.trainer.train(dataset, split)?;
        let bundle = trained.bundle;
        // clear the old set first so an interrupted save leaves it incomplete,
        // never a mix of old and new artifacts
        for id in ids.all() {
            self.store.remove(id)?;
        }
        self.store.save(&ids.svm, &bundle.svm)?;
        self.store.save(&ids.mlp, &bundle.mlp)?;
        self.store.save(&ids.scaler, &bundle.scaler)?;
        tracing::info!(split = %split, "models trained and saved");

        Ok((bundle, Resolution::Trained))
    }

    /// All three or nothing.
    fn load_bundle(&self, ids: &ArtifactIds, n_features: usize) -> Result<ArtifactBundle> {
        let bundle = ArtifactBundle {
            svm: self.store.load(&ids.svm)?,
            mlp: self.store.load(&ids.mlp)?,
            scaler: self.store.load(&ids.scaler)?,
        };
        for (id, model) in [
            (&ids.svm, bundle.classifier(ClassifierKind::Svm)),
            (&ids.mlp, bundle.classifier(ClassifierKind::Mlp)),
        ] {
            if !model.is_fitted() || model.n_features() != n_features {
                return Err(HepatoError::corrupt(
                    id,
                    format!(
                        "{} is unfitted or expects {} features, dataset has {}",
                        model.get_name(),
                        model.n_features(),
                        n_features
                    ),
                ));
            }
        }
        if !bundle.scaler.is_fitted() || bundle.scaler.n_features() != n_features {
            return Err(HepatoError::corrupt(
                &ids.scaler,
                format!(
                    "scaler expects {} features, dataset has {}",
                    bundle.scaler.n_features(),
                    n_features
                ),
            ));
        }
        Ok(bundle)
    }
}

impl<S, L> ModelLifecycleManager<S, L>
where
    S: ArtifactStore + 'static,
    L: DataLoader + 'static,
{
    /// Runs `initialize` on a worker thread. The registry only becomes
    /// reachable through the handle once every split is resolved.
    pub fn spawn_initialize(self, splits: Vec<SplitConfig>) -> JoinHandle<Result<ModelRegistry>> {
        std::thread::spawn(move || self.initialize(&splits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::FsArtifactStore;
    use crate::test_support::{fast_trainer_config, toy_csv};
    use crate::data_loading::IlpdCsvLoader;
    use tempfile::tempdir;

    fn manager(dir: &std::path::Path) -> ModelLifecycleManager<FsArtifactStore, IlpdCsvLoader> {
        ModelLifecycleManager::new(
            FsArtifactStore::new(dir),
            IlpdCsvLoader::new(),
            DatasetSource::Inline(toy_csv()),
            fast_trainer_config(),
        )
    }

    #[test]
    fn duplicate_splits_resolve_once() {
        let dir = tempdir().unwrap();
        let split = SplitConfig::from_percent(20).unwrap();
        let registry = manager(dir.path()).initialize(&[split, split]).unwrap();
        assert_eq!(registry.splits(), vec![split]);
        assert_eq!(registry.trained_count(), 1);
    }

    #[test]
    fn unknown_split_is_reported() {
        let dir = tempdir().unwrap();
        let registry = manager(dir.path())
            .initialize(&[SplitConfig::from_percent(20).unwrap()])
            .unwrap();
        let other = SplitConfig::from_percent(40).unwrap();
        assert!(registry.get_bundle(other).is_none());
        let err = registry
            .predict(other, &[0.0; 10], ClassifierKind::Svm)
            .unwrap_err();
        assert!(matches!(err, HepatoError::UnknownSplit(_)));
    }

    #[test]
    fn scaler_width_mismatch_forces_retrain() {
        let dir = tempdir().unwrap();
        let split = SplitConfig::from_percent(30).unwrap();
        let mgr = manager(dir.path());
        mgr.initialize(&[split]).unwrap();

        let narrow = {
            use crate::processing::{DataProcessor, StandardScaler};
            let x = crate::data_loading::data_loader::dense_from_rows(&[vec![1.0], vec![2.0]])
                .unwrap();
            let mut s = StandardScaler::new();
            s.fit(&x);
            s
        };
        mgr.store().save("scaler_30", &narrow).unwrap();

        let registry = mgr.initialize(&[split]).unwrap();
        assert_eq!(registry.resolution(split), Some(Resolution::Trained));
        assert_eq!(registry.bundle(split).unwrap().scaler.n_features(), 10);
    }

    #[test]
    fn unfitted_classifiers_force_retrain() {
        use crate::models::{IModel, MlpClassifier, MlpParams, SvmClassifier, SvmParams};

        let dir = tempdir().unwrap();
        let split = SplitConfig::from_percent(20).unwrap();
        let mgr = manager(dir.path());
        mgr.initialize(&[split]).unwrap();

        mgr.store()
            .save("mlp_20", &MlpClassifier::new(MlpParams::default(), 42))
            .unwrap();
        let registry = mgr.initialize(&[split]).unwrap();
        assert_eq!(registry.resolution(split), Some(Resolution::Trained));
        let mlp = registry.bundle(split).unwrap().classifier(ClassifierKind::Mlp);
        assert!(mlp.is_fitted());
        assert_eq!(mlp.n_features(), 10);

        mgr.store()
            .save("svm_20", &SvmClassifier::new(SvmParams::default()))
            .unwrap();
        let registry = mgr.initialize(&[split]).unwrap();
        assert_eq!(registry.resolution(split), Some(Resolution::Trained));
        assert!(registry.bundle(split).unwrap().svm.is_fitted());
    }

    #[test]
    fn classifier_width_mismatch_forces_retrain() {
        use crate::data_loading::data_loader::dense_from_rows;
        use crate::models::{IModel, MlpClassifier};

        let dir = tempdir().unwrap();
        let split = SplitConfig::from_percent(30).unwrap();
        let mgr = manager(dir.path());
        mgr.initialize(&[split]).unwrap();

        let x = dense_from_rows(&[vec![-1.0, -1.0], vec![1.0, 1.0]]).unwrap();
        let mut narrow = MlpClassifier::new(fast_trainer_config().mlp, 42);
        narrow.train(&x, &[0.0, 1.0]).unwrap();
        mgr.store().save("mlp_30", &narrow).unwrap();

        let registry = mgr.initialize(&[split]).unwrap();
        assert_eq!(registry.resolution(split), Some(Resolution::Trained));
        assert_eq!(registry.bundle(split).unwrap().mlp.n_features(), 10);
    }

    /// Delegates to the filesystem store but refuses to write MLP artifacts.
    struct FailingMlpStore(FsArtifactStore);

    impl ArtifactStore for FailingMlpStore {
        fn exists(&self, id: &str) -> bool {
            self.0.exists(id)
        }

        fn save<T: Serialize + crate::artifacts::ArtifactKind>(&self, id: &str, artifact: &T) -> Result<()> {
            if id.starts_with("mlp_") {
                return Err(HepatoError::ArtifactIo {
                    operation: "write",
                    path: self.0.path_for(id),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.0.save(id, artifact)
        }

        fn load<T: serde::de::DeserializeOwned + crate::artifacts::ArtifactKind>(&self, id: &str) -> Result<T> {
            self.0.load(id)
        }

        fn remove(&self, id: &str) -> Result<()> {
            self.0.remove(id)
        }
    }

    #[test]
    fn interrupted_save_never_leaves_a_mixed_set() {
        let dir = tempdir().unwrap();
        let split = SplitConfig::from_percent(20).unwrap();
        manager(dir.path()).initialize(&[split]).unwrap();
        std::fs::write(dir.path().join("svm_20.json"), b"{").unwrap();

        let failing = ModelLifecycleManager::new(
            FailingMlpStore(FsArtifactStore::new(dir.path())),
            IlpdCsvLoader::new(),
            DatasetSource::Inline(toy_csv()),
            fast_trainer_config(),
        );
        let err = failing.initialize(&[split]).unwrap_err();
        assert!(matches!(err, HepatoError::ArtifactIo { .. }));

        // the old scaler and MLP are gone, so the next run cannot load a
        // new SVM next to stale siblings
        let store = FsArtifactStore::new(dir.path());
        assert!(store.exists("svm_20"));
        assert!(!store.exists("mlp_20"));
        assert!(!store.exists("scaler_20"));

        let registry = manager(dir.path()).initialize(&[split]).unwrap();
        assert_eq!(registry.resolution(split), Some(Resolution::Trained));
    }

    #[test]
    fn spawned_initialization_yields_registry() {
        let dir = tempdir().unwrap();
        let handle = manager(dir.path()).spawn_initialize(vec![SplitConfig::from_percent(50).unwrap()]);
        let registry = handle.join().unwrap().unwrap();
        assert_eq!(registry.trained_count(), 1);
    }
}
