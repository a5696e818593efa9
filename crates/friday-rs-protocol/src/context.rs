use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counts and display name of the signed-in user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Display name.
    pub name: String,
    /// Number of stored notes.
    pub notes: usize,
    /// Number of stored birthdays.
    pub birthdays: usize,
    /// Number of private vault items.
    pub private_items: usize,
    /// Number of study sources.
    pub study_sources: usize,
}

/// User-supplied reference document kept in the vault.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudySource {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Synchronous accessors for the current user's profile and study sources.
pub trait UserContext: Send + Sync {
    /// Profile of the signed-in user, if any.
    fn profile(&self) -> Option<UserProfile>;

    /// Study sources in vault order.
    fn study_sources(&self) -> Vec<StudySource>;
}
