//! Builder for creating and configuring Dispatcher instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::debug;
use tokio::task;

use super::Dispatcher;
use crate::{
    error::{KitchenError, Result},
    machine::{Machine, MachineSpec, EMBEDDED_SPEC},
    scheduler::{ResourceClassifier, Scheduler, SchedulerConfig},
};

/// Builder for creating and configuring Dispatcher instances.
#[derive(Debug, Clone)]
pub struct DispatcherBuilder {
    machine_path: Option<PathBuf>,
    machine_spec: Option<MachineSpec>,
    scheduler_config: SchedulerConfig,
    classifier: Option<Arc<dyn ResourceClassifier>>,
}

impl DispatcherBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            machine_path: None,
            machine_spec: None,
            scheduler_config: SchedulerConfig::default(),
            classifier: None,
        }
    }

    /// Sets a machine specification file.
    ///
    /// If not specified, uses `$XDG_CONFIG_HOME/brigade/machine.json` when
    /// that file exists and the embedded specification otherwise.
    pub fn with_machine_spec_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.machine_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Uses an in-memory specification; takes precedence over any path.
    pub fn with_machine_spec(mut self, spec: MachineSpec) -> Self {
        self.machine_spec = Some(spec);
        self
    }

    pub fn with_scheduler_config(mut self, config: SchedulerConfig) -> Self {
        self.scheduler_config = config;
        self
    }

    /// Enables shared-resource exclusivity with the given classifier.
    pub fn with_resource_classifier(mut self, classifier: Arc<dyn ResourceClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Builds the configured dispatcher.
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::FileSystem` if the specification file cannot be
    /// read. Returns `KitchenError::Configuration` if the specification or
    /// the scheduler configuration is invalid.
    pub async fn build(self) -> Result<Dispatcher> {
        let spec = match (self.machine_spec, self.machine_path) {
            (Some(spec), _) => spec,
            (None, Some(path)) => Self::read_spec(path).await?,
            (None, None) => match Self::user_spec_path() {
                Some(path) => Self::read_spec(path).await?,
                None => MachineSpec::from_json(EMBEDDED_SPEC)?,
            },
        };
        let machine = Machine::new(spec)?;

        let mut scheduler = Scheduler::new(self.scheduler_config)?;
        if let Some(classifier) = self.classifier {
            scheduler = scheduler.with_classifier(classifier);
        }

        Ok(Dispatcher::new(machine, scheduler))
    }

    async fn read_spec(path: PathBuf) -> Result<MachineSpec> {
        debug!("loading machine specification from {}", path.display());
        task::spawn_blocking(move || MachineSpec::from_path(&path))
            .await
            .map_err(|e| KitchenError::Configuration {
                message: format!("Task join error: {e}"),
            })?
    }

    /// The user's machine specification, following the XDG Base Directory
    /// specification, if one exists.
    fn user_spec_path() -> Option<PathBuf> {
        xdg::BaseDirectories::with_prefix("brigade").find_config_file("machine.json")
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
