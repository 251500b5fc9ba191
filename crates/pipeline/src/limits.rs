//! Edits to the active limit configuration.

use vibewatch_core::error::CoreError;
use vibewatch_core::limits::{Bound, LimitConfig, SigmaTier};
use vibewatch_core::reading::Axis;
use vibewatch_core::store::VibrationStore;

use crate::error::PipelineError;

/// A single-bound edit such as "raise the x sigma2 upper bound to 2.5".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitChange {
    pub axis: Axis,
    pub tier: SigmaTier,
    pub bound: Bound,
    pub value: f64,
}

impl LimitChange {
    /// Build a change from its textual parts ("x|y|z", "sigma2|sigma3",
    /// "lower|upper").
    pub fn parse(axis: &str, tier: &str, bound: &str, value: f64) -> Result<Self, CoreError> {
        Ok(Self {
            axis: axis.parse()?,
            tier: tier.parse()?,
            bound: bound.parse()?,
            value,
        })
    }
}

/// The stored configuration, or the factory defaults if none was saved.
pub async fn active_limits<S: VibrationStore + ?Sized>(store: &S) -> Result<LimitConfig, PipelineError> {
    Ok(store.get_limit_config().await?.unwrap_or_default())
}

/// Apply `change` to the active configuration and save the result.
///
/// The whole configuration is re-validated; on a validation error nothing is
/// saved.
pub async fn update_limit<S: VibrationStore + ?Sized>(
    store: &S,
    change: LimitChange,
) -> Result<LimitConfig, PipelineError> {
    let current = active_limits(store).await?;
    let updated = current.with_bound(change.axis, change.tier, change.bound, change.value)?;
    store.save_limit_config(&updated).await?;
    tracing::info!(
        axis = %change.axis,
        tier = %change.tier,
        bound = %change.bound,
        value = change.value,
        "Limit updated"
    );
    Ok(updated)
}

/// Restore and save the factory defaults.
pub async fn reset_limits<S: VibrationStore + ?Sized>(store: &S) -> Result<LimitConfig, PipelineError> {
    let defaults = LimitConfig::default();
    store.save_limit_config(&defaults).await?;
    tracing::info!("Limits reset to factory defaults");
    Ok(defaults)
}
