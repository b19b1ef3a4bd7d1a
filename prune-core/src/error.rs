use thiserror::Error;

/// Failures while reading persisted tree state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("malformed tree state JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not access state file: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while turning an external mesh into a segment template.
#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("mesh has no triangles")]
    EmptyMesh,
    #[error("triangle index {index} is out of range for {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: usize },
    #[error("mesh height is zero")]
    ZeroHeight,
}
