use thiserror::Error;

/// Errors returned by [`crate::scan`] and [`crate::scan_timed`].
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("buffer length {got} does not match width*height ({expected})")]
    InvalidInput { expected: usize, got: usize },

    #[error("no round code found in image")]
    NotFound,
}

/// Internal-only failure, folded into [`ScanError::NotFound`] at the public
/// boundary. Kept distinct so callers debugging via `RUST_LOG=debug` can see
/// *why* a candidate was rejected without it becoming part of the public
/// error contract.
#[derive(Debug)]
pub(crate) struct InternalGeometryFailure(pub(crate) anyhow::Error);

impl From<anyhow::Error> for InternalGeometryFailure {
    fn from(e: anyhow::Error) -> Self {
        InternalGeometryFailure(e)
    }
}
