//! Keyword-based topic detection for user messages.

/// Topic labels and the keywords that trigger them.
pub const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("printers", &["impresora", "printer"]),
    ("speakers", &["bocina", "speaker"]),
    ("monitors", &["monitor", "pantalla"]),
    ("computers", &["pc", "computadora", "laptop"]),
    ("english_practice", &["ingles", "english"]),
    ("business", &["trifusion", "tienda"]),
];

/// Topics whose keywords appear as substrings of the lowercased text.
pub fn detect_topics(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|keyword| lower.contains(keyword)))
        .map(|(topic, _)| *topic)
        .collect()
}
