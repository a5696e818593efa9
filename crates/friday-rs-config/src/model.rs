//! Configuration schema for Friday.

use friday_rs_protocol::ReplyLabels;
use serde::{Deserialize, Serialize};

/// Root config for the Friday assistant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FridayConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl FridayConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> FridayConfigBuilder {
        FridayConfigBuilder::new()
    }
}

/// Builder for assembling a `FridayConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct FridayConfigBuilder {
    config: FridayConfig,
}

impl FridayConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: FridayConfig::default(),
        }
    }

    /// Replace the persona configuration.
    pub fn assistant(mut self, assistant: AssistantConfig) -> Self {
        self.config.assistant = assistant;
        self
    }

    /// Replace the completion endpoint configuration.
    pub fn completion(mut self, completion: CompletionConfig) -> Self {
        self.config.completion = completion;
        self
    }

    /// Replace the reply format configuration.
    pub fn reply(mut self, reply: ReplyConfig) -> Self {
        self.config.reply = reply;
        self
    }

    /// Replace the long-term memory configuration.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Replace the document context configuration.
    pub fn documents(mut self, documents: DocumentsConfig) -> Self {
        self.config.documents = documents;
        self
    }

    /// Replace the speech output configuration.
    pub fn speech(mut self, speech: SpeechConfig) -> Self {
        self.config.speech = speech;
        self
    }

    /// Finalize and return the built `FridayConfig`.
    pub fn build(self) -> FridayConfig {
        self.config
    }
}

/// Persona and control-phrase settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_name")]
    pub name: String,
    #[serde(default = "default_user_fallback_name")]
    pub user_fallback_name: String,
    #[serde(default = "default_stop_phrases")]
    pub stop_phrases: Vec<String>,
    #[serde(default = "default_test_prompt")]
    pub test_prompt: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            user_fallback_name: default_user_fallback_name(),
            stop_phrases: default_stop_phrases(),
            test_prompt: default_test_prompt(),
        }
    }
}

fn default_assistant_name() -> String {
    "Friday Ultra".to_string()
}

fn default_user_fallback_name() -> String {
    "Boss".to_string()
}

fn default_stop_phrases() -> Vec<String> {
    vec!["friday stop for today".to_string(), "friday stop".to_string()]
}

fn default_test_prompt() -> String {
    "Hello Friday, this is a short test. Answer in your normal style.".to_string()
}

/// Chat-completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Number of most recent history turns sent per request.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Inline API key; takes precedence over `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
}

impl CompletionConfig {
    /// Resolve the API key from config or environment. Blank keys count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        let inline = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);
        inline.or_else(|| {
            self.api_key_env
                .as_deref()
                .and_then(|name| std::env::var(name).ok())
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty())
        })
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            history_window: default_history_window(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    260
}

fn default_history_window() -> usize {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_api_key_env() -> Option<String> {
    Some("GROQ_API_KEY".to_string())
}

/// Structured reply contract shared by the prompt and the parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    #[serde(default)]
    pub labels: ReplyLabels,
    #[serde(default = "default_answer_language")]
    pub answer_language: String,
    #[serde(default = "default_translation_language")]
    pub translation_language: String,
    #[serde(default = "default_include_follow_up")]
    pub include_follow_up: bool,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            labels: ReplyLabels::default(),
            answer_language: default_answer_language(),
            translation_language: default_translation_language(),
            include_follow_up: default_include_follow_up(),
        }
    }
}

fn default_answer_language() -> String {
    "English".to_string()
}

fn default_translation_language() -> String {
    "Spanish".to_string()
}

fn default_include_follow_up() -> bool {
    true
}

/// Upper bound on `memory.max_recent_messages`.
pub const MAX_RECENT_MESSAGES: usize = 12;

/// Upper bound on `memory.summary_top_topics`.
pub const MAX_SUMMARY_TOP_TOPICS: usize = 4;

/// Long-term memory persistence and summary limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Directory for the file-backed store; in-memory when unset.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default = "default_max_recent_messages")]
    pub max_recent_messages: usize,
    #[serde(default = "default_summary_top_topics")]
    pub summary_top_topics: usize,
    #[serde(default = "default_summary_recent_messages")]
    pub summary_recent_messages: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            storage_key: default_storage_key(),
            max_recent_messages: default_max_recent_messages(),
            summary_top_topics: default_summary_top_topics(),
            summary_recent_messages: default_summary_recent_messages(),
        }
    }
}

fn default_storage_key() -> String {
    "friday_ultra_memory".to_string()
}

fn default_max_recent_messages() -> usize {
    MAX_RECENT_MESSAGES
}

fn default_summary_top_topics() -> usize {
    MAX_SUMMARY_TOP_TOPICS
}

fn default_summary_recent_messages() -> usize {
    3
}

/// Study-source document limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default)]
    pub max_documents: Option<usize>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            max_documents: None,
        }
    }
}

fn default_max_chars() -> usize {
    8000
}

/// Voice parameters for speech output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_rate")]
    pub rate: f32,
    #[serde(default = "default_pitch")]
    pub pitch: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            rate: default_rate(),
            pitch: default_pitch(),
        }
    }
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_rate() -> f32 {
    1.02
}

fn default_pitch() -> f32 {
    1.0
}
