use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use tracing::debug;

use crate::config::ConverterConfig;
use crate::error::{PipelineError, PipelineResult};

/// Turns a binary save into a JSON save document.
pub trait SaveConverter: Send + Sync {
    /// Convert `save` and write the document to `output`.
    fn convert(&self, save: &Path, output: &Path) -> PipelineResult<()>;
}

impl<F> SaveConverter for F
where
    F: Fn(&Path, &Path) -> PipelineResult<()> + Send + Sync,
{
    fn convert(&self, save: &Path, output: &Path) -> PipelineResult<()> {
        self(save, output)
    }
}

/// Runs an external program as `<program> <args..> <save> <output>`.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    config: ConverterConfig,
}

impl CommandConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }
}

impl SaveConverter for CommandConverter {
    fn convert(&self, save: &Path, output: &Path) -> PipelineResult<()> {
        let ConverterConfig {
            program,
            args,
            working_dir,
        } = &self.config;
        // The program runs in its own working directory.
        let save = absolute(save)?;
        let output = absolute(output)?;
        debug!(%program, save = %save.display(), output = %output.display(), "running converter");

        let result = Command::new(program)
            .args(args)
            .arg(&save)
            .arg(&output)
            .current_dir(working_dir)
            .output()
            .map_err(|source| PipelineError::ConverterSpawn {
                program: program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(PipelineError::ConverterFailed {
                status: result.status.to_string(),
                stdout: String::from_utf8_lossy(&result.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

fn absolute(path: &Path) -> PipelineResult<PathBuf> {
    std::path::absolute(path).map_err(|source| PipelineError::PathUnresolvable {
        path: path.to_path_buf(),
        source,
    })
}

/// The most recently modified regular file in `dir`.
pub fn latest_save(dir: &Path) -> PipelineResult<PathBuf> {
    let unreadable = |source| PipelineError::SavesDirUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if latest.as_ref().is_none_or(|(best, _)| modified > *best) {
            latest = Some((modified, entry.path()));
        }
    }

    latest
        .map(|(_, path)| path)
        .ok_or_else(|| PipelineError::NoSaveFound(dir.to_path_buf()))
}

/// Where the converted document for `save` is written: `<json_dir>/<file name>.json`.
pub fn output_path(json_dir: &Path, save: &Path) -> PathBuf {
    let mut name = save.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".json");
    json_dir.join(name)
}
