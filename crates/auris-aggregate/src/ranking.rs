//! Day-wide summary ranking.
//!
//! Two historical policies coexist. `FlatTopN` keeps the N busiest labels
//! and folds the remainder into one overflow entry. `CategoryPriority`
//! buckets labels by category and fills a hard cap in priority order, with
//! biometric events exempt from the cap because they are clinically
//! significant. Both are pure functions of the timeline's per-slot counts.

use std::collections::{BTreeMap, HashMap};

use auris_core::config::{AggregationConfig, RankingPolicyKind};
use auris_core::types::{Category, EventCount, RankedEvent, SlotSummary, TimeSlot};

use crate::tables;

/// Label of the synthetic overflow entry under the flat policy.
pub const OVERFLOW_LABEL: &str = "other";

/// Selected ranking policy with its parameters.
#[derive(Debug, Clone)]
pub enum RankingPolicy {
    FlatTopN { top_n: usize },
    CategoryPriority { cap: usize, priority: Vec<Category> },
}

impl RankingPolicy {
    pub fn from_config(config: &AggregationConfig) -> Self {
        match config.ranking_policy {
            RankingPolicyKind::FlatTopN => RankingPolicy::FlatTopN {
                top_n: config.top_n,
            },
            RankingPolicyKind::CategoryPriority => RankingPolicy::CategoryPriority {
                cap: config.cap,
                priority: config.category_priority.clone(),
            },
        }
    }
}

/// Label -> category lookup.
///
/// Membership is keyed on canonical labels and on their localized display
/// forms, so a translated timeline still buckets correctly. First category
/// match wins; unlisted labels are `other`.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    map: HashMap<String, Category>,
}

impl CategoryMap {
    pub fn from_config(config: &AggregationConfig) -> Self {
        let mut map = HashMap::new();

        let mut add = |label: &str, category: Category| {
            map.entry(label.to_string()).or_insert(category);
            if let Some(display) = tables::display_name(label) {
                map.entry(display.to_string()).or_insert(category);
            }
        };

        for (category, labels) in tables::BUILTIN_CATEGORIES {
            for label in *labels {
                add(label, *category);
            }
        }
        for label in &config.categories.biometric {
            add(label, Category::Biometric);
        }
        for label in &config.categories.voice {
            add(label, Category::Voice);
        }
        for label in &config.categories.daily_life {
            add(label, Category::DailyLife);
        }

        Self { map }
    }

    pub fn category_of(&self, label: &str) -> Category {
        self.map.get(label).copied().unwrap_or(Category::Other)
    }
}

/// Collapse the timeline into the capped daily ranking.
pub fn build_ranking(
    timeline: &BTreeMap<TimeSlot, SlotSummary>,
    policy: &RankingPolicy,
    categories: &CategoryMap,
) -> Vec<RankedEvent> {
    let day_counts = day_counts(timeline);
    if day_counts.is_empty() {
        return Vec::new();
    }
    match policy {
        RankingPolicy::FlatTopN { top_n } => flat_top_n(day_counts, *top_n),
        RankingPolicy::CategoryPriority { cap, priority } => {
            category_priority(day_counts, *cap, priority, categories)
        }
    }
}

/// Sum per-slot counts into day-wide counts, descending, ties broken by
/// first appearance over chronological slot iteration.
fn day_counts(timeline: &BTreeMap<TimeSlot, SlotSummary>) -> Vec<EventCount> {
    let mut order: Vec<&String> = Vec::new();
    let mut counts: HashMap<&String, u32> = HashMap::new();
    for summary in timeline.values() {
        if let SlotSummary::Events(events) = summary {
            for entry in events {
                let total = counts.entry(&entry.event).or_insert(0);
                if *total == 0 {
                    order.push(&entry.event);
                }
                *total += entry.count;
            }
        }
    }
    let mut totals: Vec<EventCount> = order
        .into_iter()
        .map(|event| EventCount {
            event: event.clone(),
            count: counts[event],
        })
        .collect();
    totals.sort_by(|a, b| b.count.cmp(&a.count));
    totals
}

fn flat_top_n(day_counts: Vec<EventCount>, top_n: usize) -> Vec<RankedEvent> {
    let mut ranking: Vec<RankedEvent> = Vec::with_capacity(top_n + 1);
    let mut overflow: u32 = 0;
    for (i, entry) in day_counts.into_iter().enumerate() {
        if i < top_n {
            ranking.push(RankedEvent {
                event: entry.event,
                count: entry.count,
                category: None,
            });
        } else {
            overflow += entry.count;
        }
    }
    if overflow > 0 {
        ranking.push(RankedEvent {
            event: OVERFLOW_LABEL.to_string(),
            count: overflow,
            category: None,
        });
    }
    ranking
}

fn category_priority(
    day_counts: Vec<EventCount>,
    cap: usize,
    priority: &[Category],
    categories: &CategoryMap,
) -> Vec<RankedEvent> {
    let mut buckets: HashMap<Category, Vec<EventCount>> = HashMap::new();
    for entry in day_counts {
        let category = categories.category_of(&entry.event);
        buckets.entry(category).or_default().push(entry);
    }
    // day_counts is already descending with stable ties, and each bucket
    // preserves that order.

    let mut ranking: Vec<RankedEvent> = Vec::new();
    let mut used = 0usize;
    for category in priority {
        let Some(bucket) = buckets.remove(category) else {
            continue;
        };
        for entry in bucket {
            // Biometric is exempt from the cap.
            if *category != Category::Biometric && used >= cap {
                break;
            }
            ranking.push(RankedEvent {
                event: entry.event,
                count: entry.count,
                category: Some(*category),
            });
            used += 1;
        }
    }
    ranking
}
