/// Errors that can cross a `tangent-core` boundary.
///
/// Components further up the stack generally work in `anyhow::Result`
/// internally; this enum exists for the handful of call sites that need
/// to match on the cause rather than just propagate a message.
#[derive(Debug, thiserror::Error)]
pub enum TangentError {
    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("upstream collaborator failed: {0}")]
    Upstream(String),
}
