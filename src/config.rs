use bevy::prelude::Resource;

use crate::{
    error::{MetaballError, Result},
    field::DEFAULT_BOUNDS_MARGIN,
    normal::DEFAULT_NORMAL_EPSILON,
    types::Value,
};

/// Number of cubes along each axis of the sampling grid.
pub const DEFAULT_STEPS: usize = 20;

/// Settings shared by every extraction cycle.
///
/// Inserted as a resource by [`MetaballPlugin`](crate::plugin::MetaballPlugin). Modify it at
/// any time; the next cycle picks up the change:
///
/// ```rust,ignore
/// fn sharpen(mut config: ResMut<MetaballConfig>) {
///     config.steps = 40;
/// }
/// ```
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct MetaballConfig {
    /// Cubes per axis. The cube size is the longest bounding-box extent divided by this,
    /// so shorter axes may be covered by fewer cubes than the box needs. Default: `20`.
    pub steps: usize,
    /// Central-difference step for normals, in world units. Default: `0.001`.
    pub normal_epsilon: Value,
    /// Margin around the sources, as a multiple of the radius. Default: `1.25`.
    pub bounds_margin: Value,
    /// Walk X slices of the grid on the Rayon pool. Output is identical either way.
    /// Default: `false`.
    pub parallel: bool,
}

impl Default for MetaballConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            normal_epsilon: DEFAULT_NORMAL_EPSILON,
            bounds_margin: DEFAULT_BOUNDS_MARGIN,
            parallel: false,
        }
    }
}

impl MetaballConfig {
    /// Sets the number of cubes per axis.
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Sets the central-difference step used for normals.
    pub fn with_normal_epsilon(mut self, epsilon: Value) -> Self {
        self.normal_epsilon = epsilon;
        self
    }

    /// Sets the bounding-box margin, as a multiple of the radius.
    pub fn with_bounds_margin(mut self, margin: Value) -> Self {
        self.bounds_margin = margin;
        self
    }

    /// Walks the grid on the Rayon pool when `true`.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(MetaballError::InvalidSteps(self.steps));
        }
        if !self.normal_epsilon.is_finite() || self.normal_epsilon <= 0. {
            return Err(MetaballError::InvalidEpsilon(self.normal_epsilon));
        }
        if !self.bounds_margin.is_finite() || self.bounds_margin < 0. {
            return Err(MetaballError::InvalidMargin(self.bounds_margin));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MetaballConfig::default();
        assert_eq!(config.steps, 20);
        assert_eq!(config.normal_epsilon, 0.001);
        assert_eq!(config.bounds_margin, 1.25);
        assert!(!config.parallel);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_invalid_settings() {
        let config = MetaballConfig::default();
        assert_eq!(
            config.clone().with_steps(0).validate(),
            Err(MetaballError::InvalidSteps(0))
        );
        assert_eq!(
            config.clone().with_normal_epsilon(0.).validate(),
            Err(MetaballError::InvalidEpsilon(0.))
        );
        assert!(config.clone().with_normal_epsilon(Value::NAN).validate().is_err());
        assert_eq!(
            config.clone().with_bounds_margin(-0.5).validate(),
            Err(MetaballError::InvalidMargin(-0.5))
        );
        assert_eq!(config.with_steps(1).with_bounds_margin(0.).validate(), Ok(()));
    }
}
