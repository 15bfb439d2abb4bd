use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// How to run the external save converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterConfig {
    /// Program to execute.
    pub program: String,
    /// Arguments placed before the save path and the output path.
    pub args: Vec<String>,
    /// Directory the program runs in.
    pub working_dir: PathBuf,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: "npm".into(),
            args: vec!["run".into(), "parse".into()],
            working_dir: PathBuf::from("./frontend"),
        }
    }
}

impl ConverterConfig {
    /// Set the program to execute.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the leading arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }
}

/// Configuration for the exporter service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    /// Directory scanned for save files.
    pub saves_dir: PathBuf,
    /// Directory the converter writes JSON documents into.
    pub json_dir: PathBuf,
    /// The external converter.
    pub converter: ConverterConfig,
    /// HTTP listen address.
    pub bind: SocketAddr,
    /// Delay between successful refresh cycles.
    pub refresh_interval: Duration,
    /// Delay after the first failed cycle. Doubles per consecutive failure,
    /// never exceeding `refresh_interval`.
    pub initial_retry: Duration,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            saves_dir: PathBuf::from("."),
            json_dir: PathBuf::from("."),
            converter: ConverterConfig::default(),
            bind: SocketAddr::from(([0, 0, 0, 0], 8081)),
            refresh_interval: Duration::from_secs(30),
            initial_retry: Duration::from_secs(5),
        }
    }
}

impl ExporterConfig {
    /// Set the directory scanned for save files.
    pub fn with_saves_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.saves_dir = dir.into();
        self
    }

    /// Set the directory converted documents are written to.
    pub fn with_json_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.json_dir = dir.into();
        self
    }

    /// Set the external converter.
    pub fn with_converter(mut self, converter: ConverterConfig) -> Self {
        self.converter = converter;
        self
    }

    /// Set the HTTP listen address.
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Set the delay between successful refresh cycles.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the delay after the first failed cycle.
    pub fn with_initial_retry(mut self, delay: Duration) -> Self {
        self.initial_retry = delay;
        self
    }

    /// Delay before the next cycle after `failures` consecutive failures.
    pub fn retry_delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return self.refresh_interval;
        }
        let factor = 1u32.checked_shl(failures - 1).unwrap_or(u32::MAX);
        self.initial_retry
            .checked_mul(factor)
            .unwrap_or(self.refresh_interval)
            .min(self.refresh_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = ExporterConfig::default();
        assert_eq!(config.bind.port(), 8081);
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
        assert_eq!(config.initial_retry, Duration::from_secs(5));
        assert_eq!(config.converter.program, "npm");
        assert_eq!(config.converter.args, ["run", "parse"]);
        assert_eq!(config.converter.working_dir, PathBuf::from("./frontend"));
    }

    #[test]
    fn builder_chain() {
        let config = ExporterConfig::default()
            .with_saves_dir("/saves")
            .with_json_dir("/json")
            .with_refresh_interval(Duration::from_secs(60))
            .with_converter(ConverterConfig::default().with_program("node").with_args(["parse.js"]));
        assert_eq!(config.saves_dir, PathBuf::from("/saves"));
        assert_eq!(config.json_dir, PathBuf::from("/json"));
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.converter.program, "node");
        assert_eq!(config.converter.args, ["parse.js"]);
    }

    #[test]
    fn retry_backoff_doubles_and_caps() {
        let config = ExporterConfig::default();
        assert_eq!(config.retry_delay(0), Duration::from_secs(30));
        assert_eq!(config.retry_delay(1), Duration::from_secs(5));
        assert_eq!(config.retry_delay(2), Duration::from_secs(10));
        assert_eq!(config.retry_delay(3), Duration::from_secs(20));
        assert_eq!(config.retry_delay(4), Duration::from_secs(30));
        assert_eq!(config.retry_delay(40), Duration::from_secs(30));
    }
}
