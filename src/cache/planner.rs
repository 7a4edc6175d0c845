//! Consumption plan generation.
//!
//! Merges multiple cache events into an optimized execution plan.

use std::collections::{HashMap, HashSet};
use std::fmt;

use uuid::Uuid;

use super::events::{CacheEvent, EventKind};
use super::keys::EntityKey;

/// Actions to execute for cache consistency.
///
/// The planner merges multiple events into a single plan, deduplicating
/// and keeping only the latest state for each entity.
#[derive(Debug, Default)]
pub struct ConsumptionPlan {
    /// Entities to invalidate from cache.
    pub invalidate_entities: HashSet<EntityKey>,
}

impl fmt::Display for ConsumptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConsumptionPlan {{ invalidate: {} }}",
            self.invalidate_entities.len(),
        )
    }
}

impl ConsumptionPlan {
    /// Merge multiple events into an optimized plan.
    ///
    /// - Deduplicates by event ID
    /// - Groups tool events by tool, keeping latest epoch
    /// - Generates invalidation actions
    pub fn from_events(events: Vec<CacheEvent>) -> Self {
        let mut plan = Self::default();
        let mut seen_ids = HashSet::new();

        // Dedupe by event ID
        let events: Vec<_> = events
            .into_iter()
            .filter(|e| seen_ids.insert(e.id))
            .collect();

        // Track latest event per tool so an upsert-then-delete burst acts
        // on the final state only.
        let mut tool_epochs: HashMap<Uuid, (u64, EventKind)> = HashMap::new();

        for event in events {
            match &event.kind {
                EventKind::ToolUpserted { tool_id, .. }
                | EventKind::ToolDeleted { tool_id, .. } => {
                    let entry = tool_epochs.entry(*tool_id);
                    entry
                        .and_modify(|(e, k)| {
                            if event.epoch > *e {
                                *e = event.epoch;
                                *k = event.kind.clone();
                            }
                        })
                        .or_insert((event.epoch, event.kind.clone()));
                }
                EventKind::CategoryUpserted { .. } => {
                    plan.invalidate_entities.insert(EntityKey::Categories);
                    // List entries embed the category name, so renames must
                    // flush the memoized lists too.
                    plan.invalidate_entities.insert(EntityKey::ToolLists);
                }
                EventKind::CategoryDeleted { .. } => {
                    plan.invalidate_entities.insert(EntityKey::Categories);
                    // Tools that referenced the category were re-pointed to
                    // no category; the affected tools cannot be enumerated
                    // from here.
                    plan.invalidate_entities.insert(EntityKey::ToolsAll);
                    plan.invalidate_entities.insert(EntityKey::ToolLists);
                }
                EventKind::RatingUpserted { tool_id, user_id } => {
                    plan.invalidate_entities
                        .insert(EntityKey::Aggregate(*tool_id));
                    plan.invalidate_entities.insert(EntityKey::UserRating {
                        tool_id: *tool_id,
                        user_id: *user_id,
                    });
                    // List entries embed the aggregate.
                    plan.invalidate_entities.insert(EntityKey::ToolLists);
                }
            }
        }

        // Process merged tool events
        let mut any_tool_changed = false;
        for (tool_id, (_, kind)) in tool_epochs {
            any_tool_changed = true;
            match kind {
                EventKind::ToolDeleted { slug, .. } => {
                    plan.invalidate_entities.insert(EntityKey::Tool(tool_id));
                    plan.invalidate_entities
                        .insert(EntityKey::ToolSlug(slug.clone()));
                    plan.invalidate_entities
                        .insert(EntityKey::Aggregate(tool_id));
                    // Cascade-deleted ratings: the (tool, user) pairs cannot
                    // be enumerated from the event.
                    plan.invalidate_entities.insert(EntityKey::UserRatingsAll);
                }
                EventKind::ToolUpserted {
                    slug,
                    previous_slug,
                    ..
                } => {
                    plan.invalidate_entities.insert(EntityKey::Tool(tool_id));
                    plan.invalidate_entities
                        .insert(EntityKey::ToolSlug(slug.clone()));
                    if let Some(previous) = previous_slug {
                        plan.invalidate_entities
                            .insert(EntityKey::ToolSlug(previous.clone()));
                    }
                }
                _ => {}
            }
        }

        // Any tool change reshuffles the listings
        if any_tool_changed {
            plan.invalidate_entities.insert(EntityKey::ToolLists);
        }

        plan
    }

    /// Check if the plan has any actions to execute.
    pub fn is_empty(&self) -> bool {
        self.invalidate_entities.is_empty()
    }
}
