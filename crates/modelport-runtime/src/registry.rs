use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;

use crate::{ConvertError, ManifestModel, ModelSource};

/// Registry key of the built-in manifest loader.
pub const MANIFEST_KIND: &str = "manifest";

pub type ModelFactory = Box<dyn Fn(&Path) -> Result<Box<dyn ModelSource>>>;

/// Named factories producing model descriptions from a model path.
pub struct ModelRegistry {
    factories: HashMap<String, ModelFactory>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        let mut reg = Self::new();
        reg.register(MANIFEST_KIND, |path| {
            Ok(Box::new(ManifestModel::load(path)?) as Box<dyn ModelSource>)
        });
        reg
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&Path) -> Result<Box<dyn ModelSource>> + 'static,
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn load(&self, kind: &str, model_path: &Path) -> Result<Box<dyn ModelSource>, ConvertError> {
        let load_err = |source| ConvertError::ModelLoad {
            path: model_path.to_path_buf(),
            source,
        };
        let factory = self.factories.get(kind).ok_or_else(|| {
            load_err(anyhow::anyhow!(
                "no model loader registered as `{kind}` (known: {})",
                self.kinds().join(", ")
            ))
        })?;
        factory(model_path).map_err(load_err)
    }
}
