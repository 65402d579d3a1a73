//! Per-event provenance: which generator produced each primary, with the
//! kinematics it sampled.
//!
//! The record collection belongs to the output side (`ProvenanceSink`);
//! generators only append. `begin_event` clears the previous event.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub generator_code: u32,
    pub label: String,
    /// Kinetic energy, MeV.
    pub energy: f64,
    pub direction: [f64; 3],
}

impl ProvenanceRecord {
    pub fn new(generator_code: u32, label: &str, energy: f64, direction: &Vector3<f64>) -> Self {
        Self {
            generator_code,
            label: label.to_string(),
            energy,
            direction: [direction.x, direction.y, direction.z],
        }
    }
}

pub trait ProvenanceSink {
    fn begin_event(&mut self, event_id: u64);
    fn record(&mut self, record: ProvenanceRecord);
}

/// In-memory sink holding the current event's records in append order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EventProvenance {
    pub event_id: u64,
    pub records: Vec<ProvenanceRecord>,
}

impl EventProvenance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ProvenanceSink for EventProvenance {
    fn begin_event(&mut self, event_id: u64) {
        self.event_id = event_id;
        self.records.clear();
    }

    fn record(&mut self, record: ProvenanceRecord) {
        self.records.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_event_clears_previous_records() {
        let mut sink = EventProvenance::new();
        sink.begin_event(1);
        sink.record(ProvenanceRecord::new(1, "gun", 2.0, &Vector3::z()));
        sink.record(ProvenanceRecord::new(1, "gun", 3.0, &Vector3::x()));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.records[1].energy, 3.0);
        sink.begin_event(2);
        assert!(sink.is_empty());
        assert_eq!(sink.event_id, 2);
    }
}
