use std::path::PathBuf;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while decoding a save document or indexing a world.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The document is not valid JSON or does not have the save document shape.
    #[error("malformed save document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The document could not be read from disk.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A power circuit declares no membership list.
    #[error("power circuit \"{instance_name}\" has no {property} property")]
    MissingCircuitComponents {
        /// Instance name of the offending circuit.
        instance_name: String,
        /// The property that was expected to hold the member references.
        property: &'static str,
    },
}
