use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sb_core::World;
use sb_metrics::{Registry, derive_power_facts};
use tracing::{info, warn};

use crate::config::ExporterConfig;
use crate::converter::{SaveConverter, latest_save, output_path};
use crate::error::{PipelineError, PipelineResult};

/// The world most recently loaded by a successful cycle.
#[derive(Debug)]
pub struct Snapshot {
    /// The indexed world.
    pub world: World,
    /// The save file the world was converted from.
    pub source: PathBuf,
    /// When the cycle finished loading it.
    pub loaded_at: DateTime<Utc>,
    /// Number of power facts published for it.
    pub fact_count: usize,
}

/// Outcome of the most recent cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Health {
    /// No cycle has finished yet.
    #[default]
    Starting,
    /// The last cycle succeeded.
    Healthy {
        at: DateTime<Utc>,
    },
    /// The last cycle failed.
    Failing {
        error: String,
        /// Consecutive failed cycles.
        failures: u32,
    },
}

impl Health {
    fn failures(&self) -> u32 {
        match self {
            Self::Failing { failures, .. } => *failures,
            _ => 0,
        }
    }
}

/// Locates the newest save, converts it, indexes it, and publishes facts.
///
/// Readers never block a cycle: the world is swapped in with a single atomic
/// store and the facts with a single registry replacement. A failed cycle
/// leaves both exactly as the last successful one left them.
pub struct Pipeline {
    config: ExporterConfig,
    converter: Box<dyn SaveConverter>,
    snapshot: ArcSwapOption<Snapshot>,
    registry: Arc<Registry>,
    health: Mutex<Health>,
}

impl Pipeline {
    pub fn new(
        config: ExporterConfig,
        converter: impl SaveConverter + 'static,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            config,
            converter: Box::new(converter),
            snapshot: ArcSwapOption::empty(),
            registry,
            health: Mutex::new(Health::default()),
        }
    }

    /// Run one cycle without touching health bookkeeping.
    pub fn run_cycle(&self) -> PipelineResult<Arc<Snapshot>> {
        let save = latest_save(&self.config.saves_dir)?;
        let output = output_path(&self.config.json_dir, &save);
        info!(save = %save.display(), "refreshing from latest save");

        self.converter.convert(&save, &output)?;
        if !output.is_file() {
            return Err(PipelineError::OutputMissing(output));
        }

        let world = World::load(&output)?;
        let facts = derive_power_facts(&world);
        let snapshot = Arc::new(Snapshot {
            world,
            source: save,
            loaded_at: Utc::now(),
            fact_count: facts.len(),
        });

        // Facts never run ahead of the world they were derived from.
        self.snapshot.store(Some(Arc::clone(&snapshot)));
        self.registry.replace(facts);
        Ok(snapshot)
    }

    /// Run one cycle, record its outcome, and return how long to wait before
    /// the next one.
    pub fn tick(&self) -> Duration {
        match self.run_cycle() {
            Ok(snapshot) => {
                info!(
                    save_name = %snapshot.world.header().save_name,
                    levels = snapshot.world.document().levels.len(),
                    facts = snapshot.fact_count,
                    "loaded save"
                );
                *self.health.lock() = Health::Healthy {
                    at: snapshot.loaded_at,
                };
                self.config.refresh_interval
            }
            Err(err) => {
                let mut health = self.health.lock();
                let failures = health.failures().saturating_add(1);
                let delay = self.config.retry_delay(failures);
                warn!(error = %err, failures, retry_in = ?delay, "refresh failed");
                *health = Health::Failing {
                    error: err.to_string(),
                    failures,
                };
                delay
            }
        }
    }

    /// The current world, if any cycle has succeeded.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.load_full()
    }

    /// Outcome of the most recent cycle.
    pub fn health(&self) -> Health {
        self.health.lock().clone()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &ExporterConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn save_json(target_consumption: f64) -> String {
        json!({
            "header": { "saveName": "Pipeline" },
            "levels": {
                "Persistent_Level": {
                    "name": "Persistent_Level",
                    "objects": [
                        {
                            "typePath": "/Game/Build_SmelterMk1.Build_SmelterMk1_C",
                            "instanceName": "Persistent_Level:PersistentLevel.Build_SmelterMk1_C_1"
                        },
                        {
                            "typePath": "/Script/FactoryGame.FGPowerInfoComponent",
                            "instanceName": "Persistent_Level:PersistentLevel.Build_SmelterMk1_C_1.powerInfo",
                            "parentEntityName": "Persistent_Level:PersistentLevel.Build_SmelterMk1_C_1",
                            "properties": {
                                "mTargetConsumption": {
                                    "type": "FloatProperty",
                                    "name": "mTargetConsumption",
                                    "value": target_consumption
                                }
                            }
                        }
                    ]
                }
            }
        })
        .to_string()
    }

    struct Dirs {
        saves: TempDir,
        json: TempDir,
    }

    fn dirs() -> Dirs {
        let dirs = Dirs {
            saves: TempDir::new().unwrap(),
            json: TempDir::new().unwrap(),
        };
        fs::write(dirs.saves.path().join("Factory.sav"), b"binary").unwrap();
        dirs
    }

    fn config(dirs: &Dirs) -> ExporterConfig {
        ExporterConfig::default()
            .with_saves_dir(dirs.saves.path())
            .with_json_dir(dirs.json.path())
    }

    /// A converter that writes a fixed document until told to fail.
    struct Scripted {
        document: String,
        fail: Arc<AtomicBool>,
    }

    impl SaveConverter for Scripted {
        fn convert(&self, _save: &Path, output: &Path) -> PipelineResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PipelineError::ConverterFailed {
                    status: "exit status: 1".into(),
                    stdout: String::new(),
                    stderr: "corrupt save".into(),
                });
            }
            fs::write(output, &self.document).unwrap();
            Ok(())
        }
    }

    #[test]
    fn successful_cycle_publishes_world_and_facts() {
        let dirs = dirs();
        let registry = Arc::new(Registry::new());
        let converter = |_: &Path, output: &Path| -> PipelineResult<()> {
            fs::write(output, save_json(7.5)).unwrap();
            Ok(())
        };
        let pipeline = Pipeline::new(config(&dirs), converter, Arc::clone(&registry));

        assert_eq!(pipeline.health(), Health::Starting);
        assert!(pipeline.snapshot().is_none());

        assert_eq!(pipeline.tick(), Duration::from_secs(30));

        let snapshot = pipeline.snapshot().unwrap();
        assert_eq!(snapshot.world.header().save_name, "Pipeline");
        assert_eq!(snapshot.source, dirs.saves.path().join("Factory.sav"));
        assert_eq!(snapshot.fact_count, 1);
        assert!(matches!(pipeline.health(), Health::Healthy { .. }));
        assert!(registry.render().contains("power_consumption_mw"));
        assert!(dirs.json.path().join("Factory.sav.json").is_file());
    }

    #[test]
    fn facts_match_the_published_world() {
        let dirs = dirs();
        let registry = Arc::new(Registry::new());
        let converter = |save: &Path, output: &Path| -> PipelineResult<()> {
            let document = if save.ends_with("Factory.sav") {
                save_json(7.5)
            } else {
                json!({ "header": { "saveName": "Bare" }, "levels": {} }).to_string()
            };
            fs::write(output, document).unwrap();
            Ok(())
        };
        let pipeline = Pipeline::new(config(&dirs), converter, Arc::clone(&registry));

        pipeline.tick();
        assert_eq!(registry.snapshot().len(), 1);

        let newer = dirs.saves.path().join("Bare.sav");
        fs::write(&newer, b"binary").unwrap();
        fs::File::options()
            .write(true)
            .open(&newer)
            .unwrap()
            .set_modified(std::time::SystemTime::now() + Duration::from_secs(60))
            .unwrap();
        pipeline.tick();

        let snapshot = pipeline.snapshot().unwrap();
        assert_eq!(snapshot.source, newer);
        assert_eq!(snapshot.fact_count, 0);
        assert_eq!(registry.snapshot().len(), snapshot.fact_count);
        assert_eq!(registry.render(), "");
    }

    #[test]
    fn failed_cycle_keeps_previous_state() {
        let dirs = dirs();
        let registry = Arc::new(Registry::new());
        let fail = Arc::new(AtomicBool::new(false));
        let converter = Scripted {
            document: save_json(7.5),
            fail: Arc::clone(&fail),
        };
        let pipeline = Pipeline::new(config(&dirs), converter, Arc::clone(&registry));

        pipeline.tick();
        let before = pipeline.snapshot().unwrap();
        let facts = registry.snapshot();

        fail.store(true, Ordering::SeqCst);
        assert_eq!(pipeline.tick(), Duration::from_secs(5));
        assert_eq!(pipeline.tick(), Duration::from_secs(10));

        assert!(Arc::ptr_eq(&before, &pipeline.snapshot().unwrap()));
        assert_eq!(registry.snapshot(), facts);
        match pipeline.health() {
            Health::Failing { error, failures } => {
                assert_eq!(failures, 2);
                assert!(error.contains("corrupt save"));
            }
            other => panic!("expected failing health, got {other:?}"),
        }

        fail.store(false, Ordering::SeqCst);
        assert_eq!(pipeline.tick(), Duration::from_secs(30));
        assert!(matches!(pipeline.health(), Health::Healthy { .. }));
    }

    #[test]
    fn converter_without_output_fails() {
        let dirs = dirs();
        let converter = |_: &Path, _: &Path| -> PipelineResult<()> { Ok(()) };
        let pipeline = Pipeline::new(config(&dirs), converter, Arc::new(Registry::new()));

        assert!(matches!(
            pipeline.run_cycle(),
            Err(PipelineError::OutputMissing(_))
        ));
    }

    #[test]
    fn malformed_output_fails_with_world_error() {
        let dirs = dirs();
        let converter = |_: &Path, output: &Path| -> PipelineResult<()> {
            fs::write(output, "{ not json").unwrap();
            Ok(())
        };
        let pipeline = Pipeline::new(config(&dirs), converter, Arc::new(Registry::new()));

        assert!(matches!(pipeline.run_cycle(), Err(PipelineError::World(_))));
        assert!(pipeline.snapshot().is_none());
    }

    #[test]
    fn empty_saves_dir_fails() {
        let dirs = Dirs {
            saves: TempDir::new().unwrap(),
            json: TempDir::new().unwrap(),
        };
        let converter = |_: &Path, _: &Path| -> PipelineResult<()> { Ok(()) };
        let pipeline = Pipeline::new(config(&dirs), converter, Arc::new(Registry::new()));

        pipeline.tick();
        match pipeline.health() {
            Health::Failing { error, .. } => assert!(error.contains("no save files")),
            other => panic!("expected failing health, got {other:?}"),
        }
    }
}
