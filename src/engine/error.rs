use std::path::PathBuf;

/// Failures that stop initialisation or a model load.
///
/// Per-resource problems (a texture that fails to decode, a channel with NaN
/// data, an unsupported uniform) never surface here; they are logged where
/// they happen and rendering continues.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to acquire a GL context: {0}")]
    Context(String),

    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: &'static str, log: String },

    #[error("shader program failed to link: {0}")]
    ProgramLink(String),

    #[error("GPU allocation failed: {0}")]
    Allocation(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Why a single texture never became ready. Kept inside the texture cache;
/// the slot is marked failed and the placeholder stays bound.
#[derive(Debug, thiserror::Error)]
pub enum TextureLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("texture task for {path} did not finish: {reason}")]
    Task { path: PathBuf, reason: String },
}

pub type RenderResult<T> = Result<T, RenderError>;
