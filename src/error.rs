use std::path::PathBuf;

/// Errors surfaced by topology loading and path computation.
///
/// Malformed individual links encountered while loading a topology are not
/// represented here; they are logged and skipped so that one bad link does
/// not reject an otherwise usable document. Everything in this enum is a
/// hard failure for the operation that returned it.
#[derive(Debug, thiserror::Error)]
pub enum FrrError {
    #[error("couldn't read topology file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("couldn't parse topology JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid topology: {message}")]
    InvalidTopology { message: String },
    #[error("invalid value: {message}")]
    InvalidValue { message: String },
    /// A path was appended to a collection keyed by a different
    /// (source, target) pair. Always a programming error in the caller.
    #[error(
        "path endpoints {path_source} -> {path_target} don't match \
         collection endpoints {expected_source} -> {expected_target}"
    )]
    EndpointMismatch {
        path_source: String,
        path_target: String,
        expected_source: String,
        expected_target: String,
    },
    #[error("no path between {source_name} and {target_name}")]
    NoPath {
        source_name: String,
        target_name: String,
    },
    #[error("node {name} not found in topology")]
    UnknownNode { name: String },
    /// A graph index failed to resolve. Indexes are only minted by the
    /// owning topology, which is immutable once built, so this firing means
    /// a bug rather than bad input.
    #[error("internal error: {message}")]
    Internal { message: String },
}
