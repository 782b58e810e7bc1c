//! Merges candidate spans from every extractor into a non-overlapping set.
//!
//! Candidates are visited by start ascending, longer first on ties. A
//! candidate that overlaps nothing is accepted. Otherwise it is compared
//! against the *first* overlapping accepted range only: a strictly higher
//! type priority replaces that range in place, anything else is discarded.
//! Outcomes therefore depend on visiting order; this is not an optimal
//! interval scheduler.

use crate::models::{ranges_overlap, EntityType, Span};
use tracing::debug;

/// Conflict rank of a label; higher wins. Unlisted labels rank 0.
pub fn type_priority(entity_type: &EntityType) -> u8 {
    match entity_type {
        EntityType::CaseCitation => 10,
        EntityType::Statute => 9,
        EntityType::Law => 8,
        EntityType::LegalTerm => 7,
        EntityType::Judge => 6,
        EntityType::Court => 5,
        EntityType::Jurisdiction => 4,
        EntityType::Party => 3,
        EntityType::Person => 2,
        EntityType::Org => 1,
        EntityType::Gpe | EntityType::Date | EntityType::Money => 0,
        EntityType::Regulation | EntityType::Other(_) => 0,
    }
}

#[derive(Debug, Clone, Copy)]
struct Occupied {
    start: usize,
    end: usize,
    priority: u8,
}

/// Resolves overlapping candidates into a Resolved Entity Set.
///
/// The result is in order of first acceptance. Degenerate spans
/// (`start >= end`) are dropped.
pub fn resolve<I>(spans: I) -> Vec<Span>
where
    I: IntoIterator<Item = Span>,
{
    let mut candidates: Vec<Span> = spans
        .into_iter()
        .filter(|s| {
            if s.is_degenerate() {
                debug!(start = s.start, end = s.end, label = %s.entity_type, "dropping degenerate span");
                false
            } else {
                true
            }
        })
        .collect();
    // Stable: equal (start, len) keeps input order.
    candidates.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.len().cmp(&a.len())));

    let mut accepted: Vec<Span> = Vec::with_capacity(candidates.len());
    let mut occupied: Vec<Occupied> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let priority = type_priority(&candidate.entity_type);
        let first_overlap = occupied
            .iter()
            .position(|o| ranges_overlap(candidate.start, candidate.end, o.start, o.end));

        match first_overlap {
            None => {
                occupied.push(Occupied {
                    start: candidate.start,
                    end: candidate.end,
                    priority,
                });
                accepted.push(candidate);
            }
            Some(i) if priority > occupied[i].priority => {
                debug!(
                    replaced = %accepted[i].entity_type,
                    by = %candidate.entity_type,
                    start = candidate.start,
                    "higher priority span replaces overlap"
                );
                occupied[i] = Occupied {
                    start: candidate.start,
                    end: candidate.end,
                    priority,
                };
                accepted[i] = candidate;
            }
            Some(_) => {}
        }
    }

    accepted
}

/// Start-ascending copy for consumers that need positional order.
pub fn sort_by_position(entities: &[Span]) -> Vec<Span> {
    let mut sorted = entities.to_vec();
    sorted.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.end.cmp(&b.end)));
    sorted
}

/// True when no two spans overlap.
pub fn is_non_overlapping(entities: &[Span]) -> bool {
    let sorted = sort_by_position(entities);
    sorted.windows(2).all(|w| !w[0].overlaps(&w[1]))
}
