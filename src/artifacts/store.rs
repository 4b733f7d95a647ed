//! Persistence of fitted artifacts keyed by identifier.
//!
//! Each artifact is a JSON envelope `{ format_version, kind, payload }`
//! written atomically (temp file + rename). Anything that fails to
//! deserialize is reported as `ArtifactCorrupt`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{HepatoError, Result};
use crate::models::{MlpClassifier, SvmClassifier};
use crate::processing::StandardScaler;

pub const FORMAT_VERSION: u32 = 1;

/// Tag stored with each artifact so a scaler is never loaded as a model.
pub trait ArtifactKind {
    const KIND: &'static str;
}

impl ArtifactKind for SvmClassifier {
    const KIND: &'static str = "svm";
}

impl ArtifactKind for MlpClassifier {
    const KIND: &'static str = "mlp";
}

impl ArtifactKind for StandardScaler {
    const KIND: &'static str = "scaler";
}

pub trait ArtifactStore: Send + Sync {
    fn exists(&self, id: &str) -> bool;

    fn save<T: Serialize + ArtifactKind>(&self, id: &str, artifact: &T) -> Result<()>;

    fn load<T: DeserializeOwned + ArtifactKind>(&self, id: &str) -> Result<T>;

    /// Deletes the artifact. Removing an absent id is not an error.
    fn remove(&self, id: &str) -> Result<()>;
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    format_version: u32,
    kind: &'a str,
    payload: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    format_version: u32,
    kind: String,
    payload: T,
}

/// Stores artifacts as `<root>/<id>.json`.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    fn io_error(operation: &'static str, path: &Path, source: std::io::Error) -> HepatoError {
        HepatoError::ArtifactIo {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn exists(&self, id: &str) -> bool {
        self.path_for(id).is_file()
    }

    fn save<T: Serialize + ArtifactKind>(&self, id: &str, artifact: &T) -> Result<()> {
        fs::create_dir_all(&self.root)
            .map_err(|e| Self::io_error("create directory", &self.root, e))?;

        let path = self.path_for(id);
        let temp_path = path.with_extension("json.tmp");
        {
            let file =
                File::create(&temp_path).map_err(|e| Self::io_error("create", &temp_path, e))?;
            let mut writer = BufWriter::new(file);
            let envelope = EnvelopeRef {
                format_version: FORMAT_VERSION,
                kind: T::KIND,
                payload: artifact,
            };
            serde_json::to_writer(&mut writer, &envelope).map_err(|e| {
                Self::io_error("serialize", &temp_path, std::io::Error::other(e))
            })?;
            writer
                .flush()
                .map_err(|e| Self::io_error("write", &temp_path, e))?;
            writer
                .get_ref()
                .sync_all()
                .map_err(|e| Self::io_error("sync", &temp_path, e))?;
        }
        fs::rename(&temp_path, &path).map_err(|e| Self::io_error("rename", &path, e))?;

        tracing::debug!(id, path = %path.display(), "artifact saved");
        Ok(())
    }

    fn load<T: DeserializeOwned + ArtifactKind>(&self, id: &str) -> Result<T> {
        let path = self.path_for(id);
        let file = File::open(&path).map_err(|e| Self::io_error("open", &path, e))?;
        let envelope: Envelope<T> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| HepatoError::corrupt(id, e.to_string()))?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(HepatoError::corrupt(
                id,
                format!(
                    "format version {} is not supported (expected {})",
                    envelope.format_version, FORMAT_VERSION
                ),
            ));
        }
        if envelope.kind != T::KIND {
            return Err(HepatoError::corrupt(
                id,
                format!("holds a '{}' artifact, expected '{}'", envelope.kind, T::KIND),
            ));
        }
        Ok(envelope.payload)
    }

    fn remove(&self, id: &str) -> Result<()> {
        let path = self.path_for(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(id, path = %path.display(), "artifact removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error("remove", &path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::DataProcessor;
    use crate::data_loading::data_loader::dense_from_rows;
    use tempfile::tempdir;

    fn fitted_scaler() -> StandardScaler {
        let x = dense_from_rows(&[vec![1.0, 10.0], vec![3.0, 30.0]]).unwrap();
        let mut scaler = StandardScaler::new();
        scaler.fit(&x);
        scaler
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path().join("models"));
        let scaler = fitted_scaler();

        assert!(!store.exists("scaler_20"));
        store.save("scaler_20", &scaler).unwrap();
        assert!(store.exists("scaler_20"));
        assert!(!store.path_for("scaler_20").with_extension("json.tmp").exists());

        let loaded: StandardScaler = store.load("scaler_20").unwrap();
        assert_eq!(loaded, scaler);
        assert_eq!(loaded.transform_row(&[2.0, 5.0]), scaler.transform_row(&[2.0, 5.0]));
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        fs::write(store.path_for("svm_20"), b"not json").unwrap();

        let err = store.load::<SvmClassifier>("svm_20").unwrap_err();
        assert!(matches!(err, HepatoError::ArtifactCorrupt { .. }));
    }

    #[test]
    fn kind_mismatch_is_corrupt() {
        let dir = tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        store.save("scaler_30", &fitted_scaler()).unwrap();
        fs::copy(store.path_for("scaler_30"), store.path_for("mlp_30")).unwrap();

        let err = store.load::<MlpClassifier>("mlp_30").unwrap_err();
        assert!(matches!(err, HepatoError::ArtifactCorrupt { .. }));
    }

    #[test]
    fn remove_deletes_and_tolerates_absent_ids() {
        let dir = tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        store.save("scaler_20", &fitted_scaler()).unwrap();

        store.remove("scaler_20").unwrap();
        assert!(!store.exists("scaler_20"));
        store.remove("scaler_20").unwrap();
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let err = store.load::<StandardScaler>("scaler_50").unwrap_err();
        assert!(err.is_recoverable_artifact_error());
        assert!(matches!(err, HepatoError::ArtifactIo { .. }));
    }
}
