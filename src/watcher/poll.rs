use std::collections::BTreeSet;

/// One change to the set of mounted external volumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyEvent {
    Added(String),
    Removed(String),
}

/// Set of external volume names the registry currently reflects.
///
/// Each tick applies at most one event, removals first. The set only moves
/// by the applied event, so a change that was not applied this tick is seen
/// again on the next one.
#[derive(Debug, Default)]
pub struct PollState {
    known: BTreeSet<String>,
}

impl PollState {
    pub fn known(&self) -> &BTreeSet<String> {
        &self.known
    }

    pub fn tick(&mut self, current: &BTreeSet<String>) -> Option<TopologyEvent> {
        if let Some(gone) = self.known.difference(current).next().cloned() {
            self.known.remove(&gone);
            return Some(TopologyEvent::Removed(gone));
        }
        if let Some(new) = current.difference(&self.known).next().cloned() {
            self.known.insert(new.clone());
            return Some(TopologyEvent::Added(new));
        }
        None
    }
}
