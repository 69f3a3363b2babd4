//! Shared domain types for the Auris aggregation pipeline.
//!
//! The wire shapes here (slot keys, null/[]/list slot summaries, the ranked
//! summary entries) are consumed by downstream dashboards, so their JSON
//! forms are part of the public contract and covered by tests.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of 30-minute slots in a day.
pub const SLOT_COUNT: usize = 48;

/// Wire labels for all 48 slots, chronological. `"HH-MM"` with a dash, the
/// key format the upstream detector writes into its `time_block` column.
const SLOT_LABELS: [&str; SLOT_COUNT] = [
    "00-00", "00-30", "01-00", "01-30", "02-00", "02-30", "03-00", "03-30",
    "04-00", "04-30", "05-00", "05-30", "06-00", "06-30", "07-00", "07-30",
    "08-00", "08-30", "09-00", "09-30", "10-00", "10-30", "11-00", "11-30",
    "12-00", "12-30", "13-00", "13-30", "14-00", "14-30", "15-00", "15-30",
    "16-00", "16-30", "17-00", "17-30", "18-00", "18-30", "19-00", "19-30",
    "20-00", "20-30", "21-00", "21-30", "22-00", "22-30", "23-00", "23-30",
];

/// One fixed 30-minute slot of a day.
///
/// The slot set is fixed and known in advance: 48 slots, `00-00` through
/// `23-30`. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(u8);

impl TimeSlot {
    /// Slot for the given index (0 = `00-00`, 47 = `23-30`).
    pub fn from_index(index: usize) -> Option<Self> {
        if index < SLOT_COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Chronological index, 0..48.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Hour component, 0..24.
    pub fn hour(self) -> u8 {
        self.0 / 2
    }

    /// Minute component, 0 or 30.
    pub fn minute(self) -> u8 {
        (self.0 % 2) * 30
    }

    /// Wire form, e.g. `"08-30"`.
    pub fn as_str(self) -> &'static str {
        SLOT_LABELS[self.0 as usize]
    }

    /// Parse the wire form back into a slot.
    pub fn parse(s: &str) -> Option<Self> {
        SLOT_LABELS
            .iter()
            .position(|label| *label == s)
            .map(|i| Self(i as u8))
    }

    /// All 48 slots in chronological order.
    pub fn all() -> impl Iterator<Item = TimeSlot> {
        (0..SLOT_COUNT as u8).map(TimeSlot)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TimeSlot::parse(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid time slot '{}'", s)))
    }
}

/// One normalized event label and how many times it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCount {
    pub event: String,
    pub count: u32,
}

/// Aggregated view of a single slot.
///
/// The three-way distinction is load-bearing for consumers: `Unknown` means
/// the sensor produced no row for the slot, `Empty` means it ran and
/// detected nothing that survived filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotSummary {
    /// No payload was fetched for this slot. Serializes as `null`.
    Unknown,
    /// A payload existed but zero events survived. Serializes as `[]`.
    Empty,
    /// Counted events, descending by count, ties in first-seen order.
    Events(Vec<EventCount>),
}

impl SlotSummary {
    /// Whether the slot carries at least one counted event.
    pub fn has_events(&self) -> bool {
        matches!(self, SlotSummary::Events(v) if !v.is_empty())
    }
}

impl Serialize for SlotSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SlotSummary::Unknown => serializer.serialize_none(),
            SlotSummary::Empty => Vec::<EventCount>::new().serialize(serializer),
            SlotSummary::Events(events) => events.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for SlotSummary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let opt = Option::<Vec<EventCount>>::deserialize(deserializer)?;
        Ok(match opt {
            None => SlotSummary::Unknown,
            Some(v) if v.is_empty() => SlotSummary::Empty,
            Some(v) => SlotSummary::Events(v),
        })
    }
}

/// Priority grouping used by the category-based ranking policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Biometric,
    Voice,
    DailyLife,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Biometric => "biometric",
            Self::Voice => "voice",
            Self::DailyLife => "daily_life",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "biometric" => Some(Self::Biometric),
            "voice" => Some(Self::Voice),
            "daily_life" => Some(Self::DailyLife),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the day-wide ranking.
///
/// `category` is present under the category-priority policy and absent under
/// flat-top-N (including the synthetic overflow entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEvent {
    pub event: String,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// The sole externally visible artifact of an aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Exactly 48 entries, one per slot, chronological.
    pub time_blocks: BTreeMap<TimeSlot, SlotSummary>,
    /// Capped, priority-ordered daily ranking.
    pub summary_ranking: Vec<RankedEvent>,
}

impl AggregationResult {
    /// Total post-filter events for the day, as reflected by the ranking.
    pub fn total_events(&self) -> u64 {
        self.summary_ranking.iter().map(|e| e.count as u64).sum()
    }

    /// Slots that carry at least one counted event.
    pub fn active_slot_count(&self) -> usize {
        self.time_blocks.values().filter(|s| s.has_events()).count()
    }
}

/// Machine-checkable reason attached to a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The fetch returned zero slots for the date. Expected, not an error.
    NoData,
    /// Persistence failed; the aggregation result is retained for retry.
    SaveError,
    /// Anything else, caught at the orchestrator boundary.
    Unexpected,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoData => "no_data",
            Self::SaveError => "save_error",
            Self::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_slot_all_covers_day() {
        let slots: Vec<TimeSlot> = TimeSlot::all().collect();
        assert_eq!(slots.len(), SLOT_COUNT);
        assert_eq!(slots[0].as_str(), "00-00");
        assert_eq!(slots[47].as_str(), "23-30");
        assert_eq!(slots[17].hour(), 8);
        assert_eq!(slots[17].minute(), 30);
    }

    #[test]
    fn test_time_slot_parse_roundtrip() {
        for slot in TimeSlot::all() {
            assert_eq!(TimeSlot::parse(slot.as_str()), Some(slot));
        }
        assert_eq!(TimeSlot::parse("24-00"), None);
        assert_eq!(TimeSlot::parse("08:30"), None);
        assert_eq!(TimeSlot::parse(""), None);
    }

    #[test]
    fn test_time_slot_ordering_is_chronological() {
        let a = TimeSlot::parse("00-30").unwrap();
        let b = TimeSlot::parse("23-00").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_slot_summary_unknown_serializes_as_null() {
        let json = serde_json::to_string(&SlotSummary::Unknown).unwrap();
        assert_eq!(json, "null");
    }

    #[test]
    fn test_slot_summary_empty_serializes_as_empty_array() {
        let json = serde_json::to_string(&SlotSummary::Empty).unwrap();
        assert_eq!(json, "[]");
    }

    #[test]
    fn test_slot_summary_null_and_empty_never_conflated() {
        let unknown: SlotSummary = serde_json::from_str("null").unwrap();
        let empty: SlotSummary = serde_json::from_str("[]").unwrap();
        assert_eq!(unknown, SlotSummary::Unknown);
        assert_eq!(empty, SlotSummary::Empty);
        assert_ne!(unknown, empty);
    }

    #[test]
    fn test_slot_summary_events_wire_shape() {
        let summary = SlotSummary::Events(vec![
            EventCount { event: "Speech".into(), count: 12 },
            EventCount { event: "Water".into(), count: 3 },
        ]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json[0]["event"], "Speech");
        assert_eq!(json[0]["count"], 12);
        assert_eq!(json[1]["event"], "Water");
    }

    #[test]
    fn test_category_parse_as_str() {
        for c in [
            Category::Biometric,
            Category::Voice,
            Category::DailyLife,
            Category::Other,
        ] {
            assert_eq!(Category::parse(c.as_str()), Some(c));
        }
        assert_eq!(Category::parse("Biometric"), None);
    }

    #[test]
    fn test_ranked_event_omits_absent_category() {
        let entry = RankedEvent { event: "other".into(), count: 4, category: None };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("category").is_none());

        let entry = RankedEvent {
            event: "Cough".into(),
            count: 2,
            category: Some(Category::Biometric),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["category"], "biometric");
    }

    #[test]
    fn test_aggregation_result_roundtrip() {
        let mut time_blocks = BTreeMap::new();
        for slot in TimeSlot::all() {
            time_blocks.insert(slot, SlotSummary::Unknown);
        }
        time_blocks.insert(
            TimeSlot::parse("09-00").unwrap(),
            SlotSummary::Events(vec![EventCount { event: "Speech".into(), count: 7 }]),
        );
        time_blocks.insert(TimeSlot::parse("09-30").unwrap(), SlotSummary::Empty);

        let result = AggregationResult {
            time_blocks,
            summary_ranking: vec![RankedEvent {
                event: "Speech".into(),
                count: 7,
                category: Some(Category::Voice),
            }],
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: AggregationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
        assert_eq!(back.time_blocks.len(), SLOT_COUNT);
        assert_eq!(back.total_events(), 7);
        assert_eq!(back.active_slot_count(), 1);
    }

    #[test]
    fn test_failure_reason_wire_strings() {
        assert_eq!(FailureReason::NoData.as_str(), "no_data");
        assert_eq!(FailureReason::SaveError.as_str(), "save_error");
        assert_eq!(FailureReason::Unexpected.as_str(), "unexpected");
        let json = serde_json::to_string(&FailureReason::NoData).unwrap();
        assert_eq!(json, r#""no_data""#);
    }
}
