//! Per-slot timeline construction.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use auris_core::types::{EventCount, SlotSummary, TimeSlot};

use crate::extract::extract_labels;
use crate::normalize::Normalizer;

/// Build the 48-slot timeline from fetched slot payloads.
///
/// The result always has exactly 48 entries. A slot with no fetched payload
/// is `Unknown`; a slot whose payload yields zero normalized labels is
/// `Empty`. The distinction tells consumers "sensor had no data" apart from
/// "sensor ran but detected silence".
pub fn build_timeline(
    slot_data: &BTreeMap<TimeSlot, Value>,
    normalizer: &Normalizer,
) -> BTreeMap<TimeSlot, SlotSummary> {
    let mut timeline = BTreeMap::new();
    for slot in TimeSlot::all() {
        let summary = match slot_data.get(&slot) {
            None => SlotSummary::Unknown,
            Some(payload) => {
                let normalized: Vec<String> = extract_labels(payload)
                    .iter()
                    .filter_map(|raw| normalizer.normalize(raw))
                    .collect();
                if normalized.is_empty() {
                    SlotSummary::Empty
                } else {
                    SlotSummary::Events(count_stable(&normalized))
                }
            }
        };
        timeline.insert(slot, summary);
    }
    timeline
}

/// Count occurrences preserving first-seen order, then sort by descending
/// count. The sort is stable, so equal counts keep insertion order, which
/// is the tie-break downstream consumers rely on.
pub(crate) fn count_stable(labels: &[String]) -> Vec<EventCount> {
    let mut order: Vec<&String> = Vec::new();
    let mut counts: HashMap<&String, u32> = HashMap::new();
    for label in labels {
        let entry = counts.entry(label).or_insert(0);
        if *entry == 0 {
            order.push(label);
        }
        *entry += 1;
    }
    let mut events: Vec<EventCount> = order
        .into_iter()
        .map(|label| EventCount {
            event: label.clone(),
            count: counts[label],
        })
        .collect();
    events.sort_by(|a, b| b.count.cmp(&a.count));
    events
}
