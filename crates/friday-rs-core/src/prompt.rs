//! System prompt assembly for the first turn of a session.

use friday_rs_config::{AssistantConfig, ReplyConfig};
use friday_rs_protocol::{ReplyLabels, UserProfile};

/// Profile text used when no user is signed in.
pub const NO_PROFILE_TEXT: &str = "No structured data yet.";

/// Builds the persona, reply-format, and context prompt.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    assistant_name: String,
    user_fallback_name: String,
    labels: ReplyLabels,
    answer_language: String,
    translation_language: String,
    include_follow_up: bool,
}

impl PromptBuilder {
    pub fn new(assistant: &AssistantConfig, reply: &ReplyConfig) -> Self {
        Self {
            assistant_name: assistant.name.clone(),
            user_fallback_name: assistant.user_fallback_name.clone(),
            labels: reply.labels.clone(),
            answer_language: reply.answer_language.clone(),
            translation_language: reply.translation_language.clone(),
            include_follow_up: reply.include_follow_up,
        }
    }

    /// Compose the system prompt from the profile and a memory summary.
    ///
    /// Pure: the same inputs always produce the same prompt.
    pub fn build_system_prompt(
        &self,
        profile: Option<&UserProfile>,
        memory_summary: &str,
    ) -> String {
        let user_name = profile
            .map(|profile| profile.name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(self.user_fallback_name.as_str());

        let sections = [
            self.persona_section(user_name),
            self.format_section(),
            self.rules_section(),
            self.documents_section(),
            format!(
                "CONTEXT ABOUT THE USER (for you only, never repeat it literally):\n{}",
                render_profile(profile)
            ),
            format!(
                "LONG-TERM MEMORY (for you only, never repeat it literally):\n{}",
                memory_summary.trim()
            ),
        ];
        sections.join("\n\n")
    }

    fn persona_section(&self, user_name: &str) -> String {
        format!(
            "You are \"{name}\", a warm, human-like assistant and {answer} tutor for \"{user_name}\".\n\n\
PERSONALITY:\n\
- Friendly, supportive, and expressive.\n\
- Talk like a real person, not a robot. An occasional emoji is fine.\n\
- Use what you remember about the user to personalize answers.",
            name = self.assistant_name,
            answer = self.answer_language,
        )
    }

    fn format_section(&self) -> String {
        let labels = &self.labels;
        let mut lines = vec![
            "OUTPUT FORMAT (always exactly this order, one field per line):".to_string(),
            format!(
                "{}: <natural answer in {} (2-4 sentences) about what the user just said>",
                labels.answer, self.answer_language
            ),
            format!(
                "{}: <simple, natural {} translation of the {} answer>",
                labels.translation, self.translation_language, labels.answer
            ),
        ];
        if self.include_follow_up {
            lines.push(format!(
                "{}: <short follow-up question that keeps the conversation going>",
                labels.follow_up
            ));
        }
        lines.push(format!(
            "{}: <if the user's {} had a mistake, write \"You can say: ...\" with the corrected version; otherwise write \"OK\">",
            labels.correction, self.answer_language
        ));
        lines.join("\n")
    }

    fn rules_section(&self) -> String {
        let mut rules = vec![
            "CONVERSATION RULES:".to_string(),
            "- Focus on the user's last message but keep the tone of the conversation.".to_string(),
            "- React like a person (\"Nice!\", \"I get you\", \"That makes sense\").".to_string(),
            "- If the user is tired, angry, or sad, respond with empathy.".to_string(),
            format!(
                "- If the user wants quick answers, keep {} and {} short.",
                self.labels.answer, self.labels.translation
            ),
        ];
        if self.include_follow_up {
            rules.push(format!(
                "- {} almost always contains a question, unless the user says goodbye.",
                self.labels.follow_up
            ));
        }
        rules.push(format!(
            "- As a tutor: check the user's {answer} and correct it in {fix}. If they write in {translation}, encourage them to try in {answer}.",
            answer = self.answer_language,
            translation = self.translation_language,
            fix = self.labels.correction,
        ));
        rules.join("\n")
    }

    fn documents_section(&self) -> String {
        let mut text = "USE OF DOCUMENTS (study sources):\n\
- When documents are provided, use them as the main reference if they are relevant."
            .to_string();
        if self.include_follow_up {
            text.push_str(&format!(
                "\n- {} may ask about the document, such as which part is harder.",
                self.labels.follow_up
            ));
        }
        text
    }
}

/// Render profile counts, or the placeholder when there is no profile.
pub fn render_profile(profile: Option<&UserProfile>) -> String {
    let Some(profile) = profile else {
        return NO_PROFILE_TEXT.to_string();
    };
    format!(
        "User:\n- Name: {}\n- Notes: {}\n- Birthdays: {}\n- Private items: {}\n- Study sources: {}",
        profile.name, profile.notes, profile.birthdays, profile.private_items, profile.study_sources
    )
}

#[cfg(test)]
mod tests {
    use super::{NO_PROFILE_TEXT, PromptBuilder, render_profile};
    use friday_rs_config::{AssistantConfig, ReplyConfig};
    use friday_rs_protocol::UserProfile;
    use pretty_assertions::assert_eq;

    fn builder(include_follow_up: bool) -> PromptBuilder {
        let reply = ReplyConfig {
            include_follow_up,
            ..ReplyConfig::default()
        };
        PromptBuilder::new(&AssistantConfig::default(), &reply)
    }

    fn profile() -> UserProfile {
        UserProfile {
            name: "Ana".to_string(),
            notes: 3,
            birthdays: 1,
            private_items: 0,
            study_sources: 2,
        }
    }

    #[test]
    fn renders_profile_counts() {
        assert_eq!(
            render_profile(Some(&profile())),
            "User:\n- Name: Ana\n- Notes: 3\n- Birthdays: 1\n- Private items: 0\n- Study sources: 2"
        );
        assert_eq!(render_profile(None), NO_PROFILE_TEXT);
    }

    #[test]
    fn prompt_includes_persona_format_and_context() {
        let prompt = builder(true).build_system_prompt(Some(&profile()), "Long-term memory:\n- x");
        assert!(prompt.starts_with("You are \"Friday Ultra\""));
        assert!(prompt.contains("tutor for \"Ana\""));
        assert!(prompt.contains("\nEN: <natural answer in English"));
        assert!(prompt.contains("\nES: <simple, natural Spanish translation"));
        assert!(prompt.contains("\nASK: <short follow-up question"));
        assert!(prompt.contains("\nFIX: <if the user's English had a mistake"));
        assert!(prompt.contains("- Study sources: 2"));
        assert!(prompt.ends_with("LONG-TERM MEMORY (for you only, never repeat it literally):\nLong-term memory:\n- x"));

        let en = prompt.find("\nEN:").expect("en");
        let es = prompt.find("\nES:").expect("es");
        let ask = prompt.find("\nASK:").expect("ask");
        let fix = prompt.find("\nFIX:").expect("fix");
        assert!(en < es && es < ask && ask < fix);
    }

    #[test]
    fn missing_profile_uses_fallback_name_and_placeholder() {
        let prompt = builder(true).build_system_prompt(None, "No long-term memory for this user yet.");
        assert!(prompt.contains("tutor for \"Boss\""));
        assert!(prompt.contains(&format!("literally):\n{NO_PROFILE_TEXT}")));
    }

    #[test]
    fn follow_up_field_is_omitted_when_disabled() {
        let prompt = builder(false).build_system_prompt(None, "");
        assert!(!prompt.contains("ASK"));
        assert!(prompt.contains("\nFIX:"));
    }

    #[test]
    fn build_is_deterministic() {
        let builder = builder(true);
        assert_eq!(
            builder.build_system_prompt(Some(&profile()), "m"),
            builder.build_system_prompt(Some(&profile()), "m")
        );
    }
}
