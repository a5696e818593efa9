use friday_rs_protocol::{StudySource, UserContext, UserProfile};
use parking_lot::Mutex;

/// User context with a fixed profile and mutable study sources.
#[derive(Debug, Default)]
pub struct StaticUserContext {
    profile: Option<UserProfile>,
    sources: Mutex<Vec<StudySource>>,
}

impl StaticUserContext {
    pub fn new(profile: Option<UserProfile>) -> Self {
        Self {
            profile,
            sources: Mutex::new(Vec::new()),
        }
    }

    /// Profile named `name` with zero counts.
    pub fn named(name: &str) -> Self {
        Self::new(Some(UserProfile {
            name: name.to_string(),
            ..UserProfile::default()
        }))
    }

    pub fn add_source(&self, title: &str, content: &str) {
        self.sources.lock().push(StudySource {
            title: Some(title.to_string()),
            origin: None,
            content: content.to_string(),
            created_at: None,
        });
    }
}

impl UserContext for StaticUserContext {
    fn profile(&self) -> Option<UserProfile> {
        self.profile.clone()
    }

    fn study_sources(&self) -> Vec<StudySource> {
        self.sources.lock().clone()
    }
}
