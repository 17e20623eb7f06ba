use std::fmt;
use std::str::FromStr;

use modelport_core::ModelDescription;
use serde_json::Value;

use crate::{Bindings, TaskError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Task {
    ImageClassification,
    TextClassification,
}

/// Binding dictionaries for the config template and the code template.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskBindings {
    pub config: Bindings,
    pub code: Bindings,
}

impl Task {
    pub const ALL: [Task; 2] = [Task::ImageClassification, Task::TextClassification];

    pub fn as_str(&self) -> &'static str {
        match self {
            Task::ImageClassification => "image_classification",
            Task::TextClassification => "text_classification",
        }
    }

    /// Fails for tasks that are recognized but have no pipeline yet.
    pub fn ensure_supported(&self) -> Result<(), TaskError> {
        match self {
            Task::ImageClassification => Ok(()),
            Task::TextClassification => Err(TaskError::NotImplemented(self.as_str())),
        }
    }

    /// Builds the bindings for the `<model>_pipeline` stage that calls
    /// into the compiled model named `model_config_name`.
    pub fn bindings(
        &self,
        pipeline_name: &str,
        model_config_name: &str,
        desc: &ModelDescription,
    ) -> Result<TaskBindings, TaskError> {
        self.ensure_supported()?;

        let input = desc.input_names.first().ok_or(TaskError::MissingTensor {
            task: self.as_str(),
            kind: "input",
        })?;
        let output = desc.output_names.first().ok_or(TaskError::MissingTensor {
            task: self.as_str(),
            kind: "output",
        })?;

        let mut bindings = TaskBindings::default();
        bindings
            .config
            .insert("name".to_string(), Value::from(pipeline_name));
        bindings
            .code
            .insert("model_name".to_string(), Value::from(model_config_name));
        bindings
            .code
            .insert("input_name".to_string(), Value::from(input.as_str()));
        bindings
            .code
            .insert("output_name".to_string(), Value::from(output.as_str()));
        Ok(bindings)
    }
}

impl FromStr for Task {
    type Err = TaskError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Task::ALL
            .into_iter()
            .find(|t| t.as_str() == raw)
            .ok_or_else(|| TaskError::UnknownTask(raw.to_string()))
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
