//! Edge detection on the target group's restricted flag.

use tracing::{debug, info};

use crate::domain::{GroupId, ResourceUpdate};

/// How an observation changed the known state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Restricted went from true to false. Fire.
    Opened,
    /// Restricted went from false to true.
    Restricted,
    /// First value seen for the target.
    Initialized,
    /// Same value as before.
    Unchanged,
    /// The observation was for another group.
    Ignored,
}

impl Transition {
    #[must_use]
    pub const fn fires(self) -> bool {
        matches!(self, Self::Opened)
    }
}

/// Tracks the last known restricted flag of one group.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    target: GroupId,
    current: Option<bool>,
}

impl ChangeDetector {
    #[must_use]
    pub const fn new(target: GroupId) -> Self {
        Self {
            target,
            current: None,
        }
    }

    #[must_use]
    pub const fn target(&self) -> &GroupId {
        &self.target
    }

    /// Last known value, `None` before the first observation.
    #[must_use]
    pub const fn current(&self) -> Option<bool> {
        self.current
    }

    /// Apply one observation.
    pub fn observe(&mut self, id: &GroupId, restricted: bool) -> Transition {
        if *id != self.target {
            return Transition::Ignored;
        }

        let transition = match (self.current, restricted) {
            (Some(true), false) => Transition::Opened,
            (Some(false), true) => Transition::Restricted,
            (None, _) => Transition::Initialized,
            _ => Transition::Unchanged,
        };
        self.current = Some(restricted);

        match transition {
            Transition::Opened => info!(group = %self.target, "Group opened"),
            Transition::Restricted => info!(group = %self.target, "Group is now admin-only"),
            _ => debug!(group = %self.target, restricted, ?transition, "Observed group state"),
        }
        transition
    }

    /// Seed from a full fetch taken right after the session opened.
    ///
    /// An open group always fires, including on a reconnect to a group that
    /// was already open before the session dropped.
    pub fn seed(&mut self, restricted: bool) -> Transition {
        let previous = self.current;
        self.current = Some(restricted);

        match (previous, restricted) {
            (_, false) => Transition::Opened,
            (Some(true), true) => Transition::Unchanged,
            (Some(false), true) => Transition::Restricted,
            (None, true) => Transition::Initialized,
        }
    }

    /// Apply a delivery of updates in order, returning how many edges fired.
    ///
    /// Updates for other groups and updates that do not carry the restricted
    /// flag are skipped.
    pub fn observe_batch(&mut self, updates: &[ResourceUpdate]) -> usize {
        updates
            .iter()
            .filter_map(|update| update.restricted.map(|value| (&update.id, value)))
            .map(|(id, value)| self.observe(id, value))
            .filter(|transition| transition.fires())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> GroupId {
        GroupId::from("target@g.us")
    }

    fn detector() -> ChangeDetector {
        ChangeDetector::new(target())
    }

    /// Count consecutive (true, false) pairs, the reference for edge counts.
    fn reference_edges(values: &[bool]) -> usize {
        values.windows(2).filter(|w| w[0] && !w[1]).count()
    }

    #[test]
    fn true_to_false_fires_once() {
        let mut d = detector();
        assert_eq!(d.observe(&target(), true), Transition::Initialized);
        assert_eq!(d.observe(&target(), false), Transition::Opened);
        assert_eq!(d.observe(&target(), false), Transition::Unchanged);
        assert_eq!(d.current(), Some(false));
    }

    #[test]
    fn false_to_true_records_without_firing() {
        let mut d = detector();
        d.observe(&target(), false);
        let transition = d.observe(&target(), true);
        assert_eq!(transition, Transition::Restricted);
        assert!(!transition.fires());
        assert_eq!(d.current(), Some(true));
    }

    #[test]
    fn first_observation_never_fires() {
        let mut d = detector();
        assert_eq!(d.observe(&target(), false), Transition::Initialized);
        assert_eq!(d.current(), Some(false));
    }

    #[test]
    fn other_groups_are_ignored() {
        let mut d = detector();
        d.observe(&target(), true);

        let other = GroupId::from("other@g.us");
        assert_eq!(d.observe(&other, false), Transition::Ignored);
        assert_eq!(d.current(), Some(true));
    }

    #[test]
    fn fires_once_per_consecutive_pair() {
        let sequences: &[&[bool]] = &[
            &[true, false, true, false],
            &[true, true, false, false, false],
            &[false, false, true],
            &[true, false, false, true, true, false],
            &[false, true, false, true, false, true, false],
            &[],
            &[true],
        ];

        for values in sequences {
            let mut d = detector();
            let fired = values
                .iter()
                .filter(|value| d.observe(&target(), **value).fires())
                .count();
            assert_eq!(fired, reference_edges(values), "sequence {values:?}");
        }
    }

    #[test]
    fn batch_applies_edge_rule_after_each_update() {
        let mut d = detector();
        d.observe(&target(), true);

        let batch = vec![
            ResourceUpdate::restricted("target@g.us", false),
            ResourceUpdate::restricted("target@g.us", true),
            ResourceUpdate::restricted("target@g.us", false),
        ];

        assert_eq!(d.observe_batch(&batch), 2);
        assert_eq!(d.current(), Some(false));
    }

    #[test]
    fn batch_skips_foreign_and_partial_updates() {
        let mut d = detector();
        d.observe(&target(), true);

        let batch = vec![
            ResourceUpdate::restricted("other@g.us", false),
            ResourceUpdate {
                id: target(),
                restricted: None,
                display_name: Some("Renamed".into()),
            },
        ];

        assert_eq!(d.observe_batch(&batch), 0);
        assert_eq!(d.current(), Some(true));
    }

    #[test]
    fn seed_open_on_first_connect_fires() {
        let mut d = detector();
        assert_eq!(d.seed(false), Transition::Opened);
        assert_eq!(d.current(), Some(false));
    }

    #[test]
    fn seed_restricted_on_first_connect_waits() {
        let mut d = detector();
        assert_eq!(d.seed(true), Transition::Initialized);
    }

    #[test]
    fn reseed_after_missed_edge_fires() {
        let mut d = detector();
        d.seed(true);
        assert_eq!(d.seed(false), Transition::Opened);
    }

    #[test]
    fn reseed_already_open_fires_again() {
        let mut d = detector();
        d.seed(false);
        assert_eq!(d.seed(false), Transition::Opened);
    }
}
