use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template `{0}` not found")]
    TemplateNotFound(String),

    #[error("template `{template}` references `{key}`, which is not bound")]
    MissingBinding { template: String, key: String },

    #[error("failed to render template `{template}`: {source}")]
    Render {
        template: String,
        #[source]
        source: minijinja::Error,
    },
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("unknown task: {0} (expected image_classification or text_classification)")]
    UnknownTask(String),

    #[error("task {0} is not implemented yet")]
    NotImplemented(&'static str),

    #[error("task {task} needs at least one model {kind}")]
    MissingTensor { task: &'static str, kind: &'static str },
}
