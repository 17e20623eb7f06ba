//! Two-stage pipeline rendering: a serving config and the generated glue code.
//!
//! The composer knows nothing about tasks; the binding dictionaries carry
//! all content. Templates are rendered with strict undefined handling so a
//! reference to an unbound key is an error rather than an empty string.

use std::collections::BTreeMap;

use minijinja::{Environment, ErrorKind, Template, UndefinedBehavior};
use serde_json::Value;
use tracing::debug;

use crate::{TemplateError, TemplateSource};

pub const CONFIG_TEMPLATE: &str = "config.pbtxt.jinja2";
pub const CODE_TEMPLATE: &str = "model.py.jinja2";

pub type Bindings = BTreeMap<String, Value>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineArtifact {
    pub configuration_text: String,
    pub generated_code_text: String,
}

pub struct PipelineComposer {
    env: Environment<'static>,
}

impl PipelineComposer {
    pub fn new(source: &TemplateSource) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        source.install(&mut env)?;
        Ok(Self { env })
    }

    pub fn compose(
        &self,
        configuration_bindings: &Bindings,
        code_bindings: &Bindings,
    ) -> Result<PipelineArtifact, TemplateError> {
        Ok(PipelineArtifact {
            configuration_text: self.render(CONFIG_TEMPLATE, configuration_bindings)?,
            generated_code_text: self.render(CODE_TEMPLATE, code_bindings)?,
        })
    }

    pub fn render(&self, name: &str, bindings: &Bindings) -> Result<String, TemplateError> {
        let template = self.env.get_template(name).map_err(|err| match err.kind() {
            ErrorKind::TemplateNotFound => TemplateError::TemplateNotFound(name.to_string()),
            _ => TemplateError::Render {
                template: name.to_string(),
                source: err,
            },
        })?;

        debug!(template = name, keys = bindings.len(), "rendering template");
        template.render(bindings).map_err(|err| match err.kind() {
            ErrorKind::UndefinedError => TemplateError::MissingBinding {
                template: name.to_string(),
                key: unbound_key(&template, bindings)
                    .or_else(|| err.detail().map(str::to_string))
                    .unwrap_or_else(|| "<unknown>".to_string()),
            },
            _ => TemplateError::Render {
                template: name.to_string(),
                source: err,
            },
        })
    }
}

// Undefined errors carry no variable name, so report the first referenced
// key that has no binding. Guarded keys only get here if rendering failed.
fn unbound_key(template: &Template<'_, '_>, bindings: &Bindings) -> Option<String> {
    let mut referenced: Vec<String> = template.undeclared_variables(false).into_iter().collect();
    referenced.sort();
    referenced.into_iter().find(|k| !bindings.contains_key(k))
}

/// Loads the template pair from `source` and renders both against their bindings.
pub fn compose(
    source: &TemplateSource,
    configuration_bindings: &Bindings,
    code_bindings: &Bindings,
) -> Result<PipelineArtifact, TemplateError> {
    PipelineComposer::new(source)?.compose(configuration_bindings, code_bindings)
}
