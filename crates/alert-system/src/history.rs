use quality_core::{EngineError, EngineResult};

use crate::models::*;

/// Append-only alert arena.
///
/// An [`AlertId`] is the slot index and is never reused; deleting an alert
/// empties its slot. The only in-place mutation is the read flag.
#[derive(Debug, Clone, Default)]
pub struct AlertHistory {
    slots: Vec<Option<Alert>>,
}

impl AlertHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, draft: AlertDraft) -> Alert {
        let id = AlertId(self.slots.len());
        let alert = Alert::from_draft(id, draft);
        self.slots.push(Some(alert.clone()));
        alert
    }

    pub fn get(&self, id: AlertId) -> Option<&Alert> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Live alerts in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mark_read(&mut self, id: AlertId) -> EngineResult<()> {
        match self.slots.get_mut(id.0).and_then(Option::as_mut) {
            Some(alert) => {
                alert.read = true;
                Ok(())
            }
            None => Err(EngineError::NotFound(format!("{} does not exist", id))),
        }
    }

    /// Returns how many alerts changed state
    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for alert in self.slots.iter_mut().flatten() {
            if !alert.read {
                alert.read = true;
                changed += 1;
            }
        }
        changed
    }

    pub fn remove(&mut self, id: AlertId) -> EngineResult<Alert> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(|| EngineError::NotFound(format!("{} does not exist", id)))
    }

    pub fn stats(&self) -> AlertStats {
        let mut stats = AlertStats::default();
        for alert in self.iter() {
            stats.total += 1;
            if alert.read {
                stats.read += 1;
            } else {
                stats.unread += 1;
            }
            *stats.by_type.entry(alert.alert_type).or_insert(0) += 1;
            *stats.by_priority.entry(alert.priority).or_insert(0) += 1;
        }
        stats
    }
}
