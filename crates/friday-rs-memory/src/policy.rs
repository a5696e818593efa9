//! Retention and summary limits for long-term memory.

/// Limits applied when recording events and building summaries.
#[derive(Debug, Clone)]
pub struct MemoryPolicy {
    /// Maximum number of recent messages kept per user.
    pub max_recent_messages: usize,
    /// Number of topics listed in a summary.
    pub summary_top_topics: usize,
    /// Number of recent messages listed in a summary.
    pub summary_recent_messages: usize,
    /// Prefix applied to assistant replies in the recent-message log.
    pub reply_prefix: String,
}

impl Default for MemoryPolicy {
    /// Default retention settings.
    fn default() -> Self {
        Self {
            max_recent_messages: 12,
            summary_top_topics: 4,
            summary_recent_messages: 3,
            reply_prefix: "FRIDAY: ".to_string(),
        }
    }
}
