use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::activation::activation::Activation;
use crate::error::Result;

/// Annotations stored next to a binary model file.
///
/// The binary layout carries neither the activation nor class names, so a
/// loader that needs them reads this sidecar. Optional fields keep older
/// sidecars readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    #[serde(default)]
    pub activation: Activation,
    pub description: Option<String>,
    /// Human-readable class labels for the output layer, in output order.
    pub output_labels: Option<Vec<String>>,
}

impl ModelMetadata {
    /// Sidecar location for a model file: `model.bin` -> `model.json`.
    pub fn sidecar_path(model_path: impl AsRef<Path>) -> PathBuf {
        model_path.as_ref().with_extension("json")
    }

    /// Label of output `class`, if labels are known.
    pub fn label(&self, class: usize) -> Option<&str> {
        self.output_labels
            .as_ref()
            .and_then(|labels| labels.get(class))
            .map(String::as_str)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<ModelMetadata> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
