use std::path::PathBuf;

use minijinja::Environment;

use crate::{Task, TemplateError, CODE_TEMPLATE, CONFIG_TEMPLATE};

const IMAGE_CLASSIFICATION_CONFIG: &str =
    include_str!("../templates/image_classification/config.pbtxt.jinja2");
const IMAGE_CLASSIFICATION_CODE: &str =
    include_str!("../templates/image_classification/model.py.jinja2");

/// Where the pipeline template pair is loaded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateSource {
    /// A directory holding `config.pbtxt.jinja2` and `model.py.jinja2`.
    Directory(PathBuf),
    /// Templates compiled into the binary for a task.
    Builtin(Task),
}

impl TemplateSource {
    /// Per-task subdirectory of `root` when given, built-in templates otherwise.
    pub fn for_task(task: Task, root: Option<PathBuf>) -> Self {
        match root {
            Some(root) => TemplateSource::Directory(root.join(task.as_str())),
            None => TemplateSource::Builtin(task),
        }
    }

    pub(crate) fn install(&self, env: &mut Environment<'static>) -> Result<(), TemplateError> {
        match self {
            TemplateSource::Directory(dir) => {
                env.set_loader(minijinja::path_loader(dir));
            }
            TemplateSource::Builtin(task) => {
                for (name, source) in builtin_templates(*task) {
                    env.add_template(name, source)
                        .map_err(|source| TemplateError::Render {
                            template: name.to_string(),
                            source,
                        })?;
                }
            }
        }
        Ok(())
    }
}

fn builtin_templates(task: Task) -> Vec<(&'static str, &'static str)> {
    match task {
        Task::ImageClassification => vec![
            (CONFIG_TEMPLATE, IMAGE_CLASSIFICATION_CONFIG),
            (CODE_TEMPLATE, IMAGE_CLASSIFICATION_CODE),
        ],
        Task::TextClassification => Vec::new(),
    }
}
