#![allow(dead_code)]

use std::path::Path;

use hepatoscreen::models::MlpParams;
use hepatoscreen::{
    DatasetSource, FsArtifactStore, IlpdCsvLoader, ModelLifecycleManager, SplitConfig,
    TrainerConfig,
};

/// Header-less ILPD-style CSV with `n` rows; every third row is healthy
/// and the two classes are far apart in bilirubin and enzymes.
pub fn separable_csv(n: usize) -> String {
    let mut out = String::new();
    for i in 0..n {
        let k = (i % 4) as f64;
        let gender = if i % 2 == 0 { "Male" } else { "Female" };
        let age = 25 + i;
        if i % 3 == 0 {
            out.push_str(&format!(
                "{age},{gender},{},{},{},{},{},7.1,3.7,1.2,2\n",
                0.6 + 0.1 * k,
                0.1 + 0.05 * k,
                160.0 + 6.0 * k,
                18.0 + 3.0 * k,
                21.0 + 3.0 * k
            ));
        } else {
            out.push_str(&format!(
                "{age},{gender},{},{},{},{},{},6.1,2.9,0.8,1\n",
                3.0 + 0.7 * k,
                1.4 + 0.3 * k,
                310.0 + 12.0 * k,
                90.0 + 7.0 * k,
                110.0 + 8.0 * k
            ));
        }
    }
    out
}

pub fn fast_config() -> TrainerConfig {
    TrainerConfig {
        mlp: MlpParams {
            hidden_layers: vec![8, 4],
            max_iter: 200,
            learning_rate: 0.01,
            ..MlpParams::default()
        },
        ..TrainerConfig::default()
    }
}

pub fn manager(
    dir: &Path,
    source: DatasetSource,
) -> ModelLifecycleManager<FsArtifactStore, IlpdCsvLoader> {
    ModelLifecycleManager::new(
        FsArtifactStore::new(dir),
        IlpdCsvLoader::new(),
        source,
        fast_config(),
    )
}

pub fn default_splits() -> Vec<SplitConfig> {
    SplitConfig::defaults()
}

pub fn split(percent: u8) -> SplitConfig {
    SplitConfig::from_percent(percent).unwrap()
}
