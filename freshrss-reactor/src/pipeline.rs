//! Per-trigger entrypoint shared by the CLI and any hosting framework glue.

use freshrss_core::{CharmConfig, ConfigChanges, UnitState};

use crate::context::{Collaborators, Context};
use crate::engine::{Engine, PassReport, Trigger};
use crate::error::ReconcileError;

/// Handle one trigger for this unit.
///
/// Config changes are computed against the snapshot stored by the previous
/// successful pass. The snapshot is only refreshed when the pass completes,
/// so a failed pass sees the same changes again on retry.
pub fn reconcile_unit<'a>(
    engine: &Engine,
    trigger: Trigger,
    state: &'a mut UnitState,
    config: &'a CharmConfig,
    world: Collaborators<'a>,
) -> Result<PassReport, ReconcileError> {
    let previous = state.config_snapshot()?;
    let changes = ConfigChanges::between(previous.as_ref(), config);
    if !changes.is_empty() {
        let keys: Vec<_> = changes.keys().collect();
        tracing::info!(changed = ?keys, "config changed since last pass");
    }

    let mut ctx = Context {
        state,
        config,
        changes,
        world,
    };
    let report = engine.reconcile(trigger, &mut ctx)?;

    if previous.as_ref() != Some(config) {
        ctx.state.set_config_snapshot(config)?;
    }
    Ok(report)
}
