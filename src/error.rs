use std::path::PathBuf;

use thiserror::Error;

/// The failure kinds of the baker. Parse and Singular errors are raised per
/// fragment or per mesh and are absorbed inside the driver; the other kinds
/// surface per file and never abort a batch.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to {action} \"{}\"", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("\"{}\" is a binary FBX file", .0.display())]
    BinarySkipped(PathBuf),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("matrix is not invertible")]
    SingularMatrix,
    #[error("{0}")]
    Unexpected(String),
}
