//! Built-in label tables: exclusions, consolidations, localized display
//! names, and category membership.
//!
//! These mirror the detector's AudioSet-style vocabulary. They are built
//! once, shared read-only for the process lifetime, and extended (never
//! replaced in place) by configuration.

use std::collections::HashMap;
use std::sync::OnceLock;

use auris_core::types::Category;

/// Detector outputs that are noise artifacts, dropped from all aggregation.
pub const BUILTIN_EXCLUDED: &[&str] = &[
    "Silence",
    "White noise",
    "Pink noise",
    "Static",
    "Mains hum",
];

/// Raw label -> canonical label merges. Several detector labels describe the
/// same household sound at different granularities.
pub const BUILTIN_CONSOLIDATION: &[(&str, &str)] = &[
    ("Water tap, faucet", "Water"),
    ("Sink (filling or washing)", "Water"),
    ("Pour", "Water"),
    ("Trickle, dribble", "Water"),
    ("Splash, splatter", "Water"),
    ("Narration, monologue", "Speech"),
    ("Conversation", "Speech"),
    ("Speech synthesizer", "Speech"),
    ("Babbling", "Speech"),
    ("Giggle", "Laughter"),
    ("Chuckle, chortle", "Laughter"),
    ("Snicker", "Laughter"),
    ("Walk, footsteps", "Footsteps"),
    ("Run", "Footsteps"),
    ("Cutlery, silverware", "Dishes"),
    ("Dishes, pots, and pans", "Dishes"),
    ("Door knock", "Door"),
    ("Slam", "Door"),
    ("Squeak", "Door"),
    ("Keys jangling", "Door"),
    ("Gasp", "Breathing"),
    ("Pant", "Breathing"),
    ("Wheeze", "Breathing"),
    ("Throat clearing", "Cough"),
];

/// Canonical label -> localized display name. Labels absent here pass
/// through unchanged.
pub const BUILTIN_TRANSLATION: &[(&str, &str)] = &[
    ("Speech", "会話・発話"),
    ("Laughter", "笑い声"),
    ("Crying, sobbing", "泣き声"),
    ("Shout", "叫び声"),
    ("Whispering", "ささやき声"),
    ("Singing", "歌声"),
    ("Cough", "咳"),
    ("Sneeze", "くしゃみ"),
    ("Snoring", "いびき"),
    ("Breathing", "呼吸音"),
    ("Burping, eructation", "げっぷ"),
    ("Hiccup", "しゃっくり"),
    ("Sniff", "鼻をすする音"),
    ("Water", "水の音"),
    ("Dishes", "食器の音"),
    ("Door", "ドアの音"),
    ("Footsteps", "足音"),
    ("Vacuum cleaner", "掃除機"),
    ("Microwave oven", "電子レンジ"),
    ("Blender", "ミキサー"),
    ("Frying (food)", "調理音(炒め物)"),
    ("Chopping (food)", "調理音(刻み)"),
    ("Boiling", "調理音(煮沸)"),
    ("Chewing, mastication", "咀嚼音"),
    ("Toothbrush", "歯磨き"),
    ("Toilet flush", "トイレの水洗音"),
    ("Washing machine", "洗濯機"),
    ("Telephone bell ringing", "電話の着信音"),
    ("Alarm clock", "目覚まし時計"),
    ("Doorbell", "呼び鈴"),
    ("Television", "テレビ"),
    ("Music", "音楽"),
    ("Dog", "犬の鳴き声"),
    ("Cat", "猫の鳴き声"),
    ("Typing", "タイピング音"),
    ("Writing", "筆記音"),
    ("Rain", "雨音"),
    ("Wind", "風の音"),
    ("Thunder", "雷鳴"),
    ("Vehicle", "車両の音"),
];

/// Category membership for canonical labels. First match wins; anything
/// unlisted is `other`.
pub const BUILTIN_CATEGORIES: &[(Category, &[&str])] = &[
    (
        Category::Biometric,
        &[
            "Cough",
            "Sneeze",
            "Snoring",
            "Breathing",
            "Burping, eructation",
            "Hiccup",
            "Sniff",
            "Chewing, mastication",
        ],
    ),
    (
        Category::Voice,
        &[
            "Speech",
            "Laughter",
            "Crying, sobbing",
            "Shout",
            "Whispering",
            "Singing",
        ],
    ),
    (
        Category::DailyLife,
        &[
            "Water",
            "Dishes",
            "Door",
            "Footsteps",
            "Vacuum cleaner",
            "Microwave oven",
            "Blender",
            "Frying (food)",
            "Chopping (food)",
            "Boiling",
            "Toothbrush",
            "Toilet flush",
            "Washing machine",
            "Telephone bell ringing",
            "Alarm clock",
            "Doorbell",
        ],
    ),
];

/// Shared translation lookup, built once.
pub fn translation_map() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| BUILTIN_TRANSLATION.iter().copied().collect())
}

/// Localized display name for a canonical label, if one exists.
pub fn display_name(label: &str) -> Option<&'static str> {
    translation_map().get(label).copied()
}
