//! Engine configuration
//!
//! Builds and validates the [`EngineConfig`] an engine is constructed from.
//! A value of [`EngineConfig`] only exists once validation has passed.

use std::collections::HashMap;
use std::time::Duration;

use crate::cycle::error::ConfigurationError;
use crate::cycle::stage::{ErrorHandler, Observer, StageTransform};

/// Validated engine configuration, retained for the lifetime of the engine
/// so that `reset` can restore the initial state.
pub struct EngineConfig<S> {
    pub(crate) stages: Vec<String>,
    pub(crate) initial_state: S,
    pub(crate) observer: Box<dyn Observer<S>>,
    pub(crate) transforms: HashMap<String, Box<dyn StageTransform<S>>>,
    pub(crate) interval: Duration,
    pub(crate) error_handler: Option<Box<dyn ErrorHandler<S>>>,
}

impl<S> EngineConfig<S> {
    /// Start building a configuration for the given ordered stages
    #[must_use]
    pub fn builder<I, T>(stages: I) -> EngineConfigBuilder<S>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        EngineConfigBuilder {
            stages: stages.into_iter().map(Into::into).collect(),
            initial_state: None,
            observer: None,
            transforms: Vec::new(),
            interval: Duration::ZERO,
            error_handler: None,
        }
    }

    /// The ordered stage names
    #[must_use]
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    /// The state the engine starts from and resets to
    #[must_use]
    pub const fn initial_state(&self) -> &S {
        &self.initial_state
    }

    /// Default driver period. Zero means manual stepping.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a transform is registered for `stage`
    #[must_use]
    pub fn has_transform(&self, stage: &str) -> bool {
        self.transforms.contains_key(stage)
    }
}

/// Builder for [`EngineConfig`]
pub struct EngineConfigBuilder<S> {
    stages: Vec<String>,
    initial_state: Option<S>,
    observer: Option<Box<dyn Observer<S>>>,
    transforms: Vec<(String, Box<dyn StageTransform<S>>)>,
    interval: Duration,
    error_handler: Option<Box<dyn ErrorHandler<S>>>,
}

impl<S> EngineConfigBuilder<S> {
    /// Set the initial state (defaults to `S::default()`)
    #[must_use]
    pub fn initial_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the observer notified after every committed transition
    #[must_use]
    pub fn observer(mut self, observer: impl Observer<S> + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Register the transform for `stage`. A later registration for the
    /// same stage replaces the earlier one.
    #[must_use]
    pub fn transform(
        mut self,
        stage: impl Into<String>,
        transform: impl StageTransform<S> + 'static,
    ) -> Self {
        self.transforms.push((stage.into(), Box::new(transform)));
        self
    }

    /// Set the default driver period
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the default driver period in milliseconds
    #[must_use]
    pub fn interval_ms(self, millis: u64) -> Self {
        self.interval(Duration::from_millis(millis))
    }

    /// Set the handler invoked when a stage transform fails
    #[must_use]
    pub fn error_handler(mut self, handler: impl ErrorHandler<S> + 'static) -> Self {
        self.error_handler = Some(Box::new(handler));
        self
    }

    /// Validate and produce the configuration
    pub fn build(self) -> Result<EngineConfig<S>, ConfigurationError>
    where
        S: Default,
    {
        validate_stages(&self.stages)?;

        let observer = self.observer.ok_or(ConfigurationError::MissingObserver)?;

        let mut transforms = HashMap::with_capacity(self.transforms.len());
        for (stage, transform) in self.transforms {
            if !self.stages.contains(&stage) {
                return Err(ConfigurationError::UnknownTransformStage {
                    stage,
                    stages: self.stages.join(", "),
                });
            }
            transforms.insert(stage, transform);
        }

        Ok(EngineConfig {
            stages: self.stages,
            initial_state: self.initial_state.unwrap_or_default(),
            observer,
            transforms,
            interval: self.interval,
            error_handler: self.error_handler,
        })
    }
}

/// Check that the stage list is non-empty and has no blank names.
///
/// Duplicate names are accepted.
pub(crate) fn validate_stages(stages: &[String]) -> Result<(), ConfigurationError> {
    if stages.is_empty() {
        return Err(ConfigurationError::EmptyStages);
    }
    if let Some(index) = stages.iter().position(|s| s.trim().is_empty()) {
        return Err(ConfigurationError::BlankStageName { index });
    }
    Ok(())
}
