use crate::config::BloodbendingConfig;
use crate::env::WorldOracle;
use crate::state::EntityId;

/// Upper bound on probe steps, whatever the scaled range.
const MAX_PROBE_STEPS: u32 = u16::MAX as u32;

/// Walks the actor's aim in unit steps and returns the first candidate found.
///
/// Step `i` (for every integer `0 <= i < range`) collects live entities within
/// [`BloodbendingConfig::PROBE_RADIUS`] of the point `i` blocks ahead, dropping
/// the actor itself and anything non-living or decorative. The first step with
/// a candidate wins; within that step the host's iteration order decides.
pub fn probe_line(world: &dyn WorldOracle, actor: EntityId, range: f64) -> Option<EntityId> {
    let steps = (range.max(0.0).ceil() as u32).min(MAX_PROBE_STEPS);
    (0..steps).find_map(|step| {
        let point = world.targeted_location(actor, f64::from(step))?;
        world
            .entities_near(&point, BloodbendingConfig::PROBE_RADIUS)
            .into_iter()
            .find(|&candidate| {
                candidate != actor
                    && world
                        .kind(candidate)
                        .is_some_and(|kind| kind.is_living() && !kind.is_decorative())
            })
    })
}
