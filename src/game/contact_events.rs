use std::collections::HashSet;

/// Contact lifecycle event delivered to a subscribed body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEvent {
    /// The body started touching the collider identified by `other`.
    Started { other: u64 },
    /// The body stopped touching `other`.
    Stopped { other: u64 },
}

/// Per-body contact lifecycle for one physics step.
#[derive(Debug, Default, Clone)]
pub struct ContactTransitions {
    pub started: Vec<u64>,
    pub stopped: Vec<u64>,
}

impl ContactTransitions {
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.stopped.is_empty()
    }

    /// Flattens the transitions into channel events, stops first.
    pub fn into_events(self) -> impl Iterator<Item = ContactEvent> {
        self.stopped
            .into_iter()
            .map(|other| ContactEvent::Stopped { other })
            .chain(
                self.started
                    .into_iter()
                    .map(|other| ContactEvent::Started { other }),
            )
    }
}

/// Compute contact start/stop transitions from current and previous contact sets.
pub fn compute_contact_transitions(current: &HashSet<u64>, previous: &HashSet<u64>) -> ContactTransitions {
    let mut started: Vec<u64> = current
        .iter()
        .filter(|other| !previous.contains(other))
        .copied()
        .collect();

    let mut stopped: Vec<u64> = previous
        .iter()
        .filter(|other| !current.contains(other))
        .copied()
        .collect();

    started.sort_unstable();
    stopped.sort_unstable();
    ContactTransitions { started, stopped }
}
