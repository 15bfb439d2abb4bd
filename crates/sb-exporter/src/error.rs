use std::path::PathBuf;

use sb_core::CoreError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Why a refresh cycle failed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The saves directory holds no regular file.
    #[error("no save files found in {}", .0.display())]
    NoSaveFound(PathBuf),

    /// The saves directory could not be listed.
    #[error("cannot read saves directory {}: {source}", path.display())]
    SavesDirUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The converter program could not be started.
    #[error("failed to start converter `{program}`: {source}")]
    ConverterSpawn {
        program: String,
        source: std::io::Error,
    },

    /// The converter exited unsuccessfully.
    #[error("converter failed ({status}):\nstderr:\n{stderr}\nstdout:\n{stdout}")]
    ConverterFailed {
        status: String,
        stdout: String,
        stderr: String,
    },

    /// A path handed to the converter could not be made absolute.
    #[error("cannot resolve {}: {source}", path.display())]
    PathUnresolvable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The converter succeeded but wrote nothing.
    #[error("converter produced no output at {}", .0.display())]
    OutputMissing(PathBuf),

    /// The converted document could not be loaded as a world.
    #[error(transparent)]
    World(#[from] CoreError),
}
