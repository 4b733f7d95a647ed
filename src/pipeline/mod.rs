pub mod bundle;
pub mod inference;
pub mod manager;
pub mod trainer;

pub use bundle::ArtifactBundle;
pub use inference::{predict, Prediction};
pub use manager::{ModelLifecycleManager, ModelRegistry, Resolution};
pub use trainer::{TrainedBundle, Trainer, TrainerConfig};
