use std::path::Path;

use anyhow::{bail, Result};
use modelport_core::OptimizerArgs;

/// A model to convert, as seen by the conversion run.
pub trait ModelSource {
    fn name(&self) -> &str;

    /// Whether [`ModelSource::save_auxiliary_data`] has anything to write.
    fn auxiliary_data(&self) -> bool;

    fn optimizer_args(&self) -> Result<OptimizerArgs>;

    /// Pre/post-processing logic shipped next to the generated pipeline code.
    fn pipeline_file(&self) -> &Path;

    /// Writes files the pipeline needs at serving time (labels, vocabularies).
    fn save_auxiliary_data(&self, dir: &Path) -> Result<()> {
        bail!(
            "model `{}` declares no auxiliary data (target {})",
            self.name(),
            dir.display()
        )
    }
}

/// Model names become directory names in the repository.
pub fn is_valid_model_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::is_valid_model_name;

    #[test]
    fn model_names_must_be_plain_directory_names() {
        assert!(is_valid_model_name("ResNet50"));
        assert!(is_valid_model_name("CIFA10_Net"));
        for bad in ["", ".", "..", ".hidden", "a/b", "a\\b"] {
            assert!(!is_valid_model_name(bad), "{bad:?} accepted");
        }
    }
}
