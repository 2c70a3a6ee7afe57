//! Deterministic turn ordering

use crate::core::ids::ParticipantId;
use crate::debate::participant::{Participant, Position};

/// Computes the order in which active participants take their turns.
///
/// - Registration order when positions need not be balanced.
/// - Otherwise participants are grouped by position (groups ordered by the
///   first registration of that position) and the groups are interleaved
///   round-robin: `pro1, con1, pro2, con2, ...`.
pub struct TurnOrder;

impl TurnOrder {
    pub fn compute(participants: &[Participant], balanced: bool) -> Vec<ParticipantId> {
        let active: Vec<&Participant> = participants.iter().filter(|p| p.active).collect();

        if !balanced {
            return active.iter().map(|p| p.id).collect();
        }

        let groups = Self::group_by_position(&active);
        let longest = groups.iter().map(|(_, g)| g.len()).max().unwrap_or(0);

        let mut order = Vec::with_capacity(active.len());
        for i in 0..longest {
            for (_, group) in &groups {
                if let Some(id) = group.get(i) {
                    order.push(*id);
                }
            }
        }
        order
    }

    /// Whether every position is held by the same number of active
    /// participants, with at least two positions represented.
    pub fn is_balanced(participants: &[Participant]) -> bool {
        let active: Vec<&Participant> = participants.iter().filter(|p| p.active).collect();
        let groups = Self::group_by_position(&active);
        if groups.len() < 2 {
            return false;
        }
        let first = groups[0].1.len();
        groups.iter().all(|(_, g)| g.len() == first)
    }

    fn group_by_position(participants: &[&Participant]) -> Vec<(Position, Vec<ParticipantId>)> {
        let mut groups: Vec<(Position, Vec<ParticipantId>)> = Vec::new();
        for p in participants {
            match groups.iter_mut().find(|(pos, _)| *pos == p.position) {
                Some((_, ids)) => ids.push(p.id),
                None => groups.push((p.position.clone(), vec![p.id])),
            }
        }
        groups
    }
}
