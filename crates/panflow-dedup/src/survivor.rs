use crate::equivalence::Candidate;
use panflow_model::SurvivorStrategy;

/// Index of the survivor within `candidates`, per `strategy`. Ties always
/// keep whichever candidate was discovered first — stable regardless of
/// strategy, so repeated runs over the same tree agree.
pub fn select_survivor(candidates: &[Candidate], strategy: SurvivorStrategy) -> usize {
    let mut best = 0;
    for (i, candidate) in candidates.iter().enumerate().skip(1) {
        let incumbent = &candidates[best];
        let better = match strategy {
            SurvivorStrategy::First => false,
            SurvivorStrategy::ShortestName => candidate.name.len() < incumbent.name.len(),
            SurvivorStrategy::LongestName => candidate.name.len() > incumbent.name.len(),
            SurvivorStrategy::Alphabetical => candidate.name < incumbent.name,
            SurvivorStrategy::HighestContext => candidate.scope_rank > incumbent.scope_rank,
        };
        if better {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use panflow_model::{ContainerKind, DeviceKind};

    fn candidate(name: &str, scope_rank: usize) -> Candidate {
        Candidate {
            name: name.to_string(),
            context: panflow_model::ContextDescriptor::new(DeviceKind::Firewall, ContainerKind::Vsys).with_identifier("vsys1"),
            scope_rank,
            value: "v".to_string(),
        }
    }

    #[test]
    fn first_always_keeps_the_first_candidate() {
        let candidates = vec![candidate("zzz", 0), candidate("a", 0)];
        assert_eq!(select_survivor(&candidates, SurvivorStrategy::First), 0);
    }

    #[test]
    fn shortest_name_picks_the_shortest() {
        let candidates = vec![candidate("H1_alt", 0), candidate("H1", 0)];
        assert_eq!(select_survivor(&candidates, SurvivorStrategy::ShortestName), 1);
    }

    #[test]
    fn longest_name_picks_the_longest() {
        let candidates = vec![candidate("H1", 0), candidate("H1_alt", 0)];
        assert_eq!(select_survivor(&candidates, SurvivorStrategy::LongestName), 1);
    }

    #[test]
    fn alphabetical_picks_lexicographically_first() {
        let candidates = vec![candidate("zz", 0), candidate("aa", 0)];
        assert_eq!(select_survivor(&candidates, SurvivorStrategy::Alphabetical), 1);
    }

    #[test]
    fn highest_context_prefers_the_larger_scope_rank() {
        let candidates = vec![candidate("leaf", 0), candidate("root", 2)];
        assert_eq!(select_survivor(&candidates, SurvivorStrategy::HighestContext), 1);
    }

    #[test]
    fn ties_keep_the_first_candidate_regardless_of_strategy() {
        let candidates = vec![candidate("same", 0), candidate("same", 0)];
        assert_eq!(select_survivor(&candidates, SurvivorStrategy::Alphabetical), 0);
    }
}
