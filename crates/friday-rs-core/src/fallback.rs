//! Fixed replies used when the model is not consulted or cannot answer.

use friday_rs_protocol::ParsedReply;
use serde::{Deserialize, Serialize};

/// Where a delivered reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// Parsed model output.
    Model,
    /// A stop phrase ended the conversation.
    Farewell,
    /// No API key was configured.
    MissingCredential,
    /// The endpoint answered with a non-success status.
    ServerRejected,
    /// The endpoint could not be reached or timed out.
    TransportFailure,
    /// The endpoint answered without usable content.
    MalformedResponse,
}

impl ReplyKind {
    /// Fixed reply for this kind; `None` for model output.
    ///
    /// The follow-up question is dropped when the reply format disables it.
    pub fn fixed_reply(self, include_follow_up: bool) -> Option<ParsedReply> {
        let (answer, translation, follow_up) = match self {
            ReplyKind::Model => return None,
            ReplyKind::Farewell => (
                "Alright, I'll stop for today.",
                "Está bien, paro por hoy.",
                "Do you want to continue later?",
            ),
            ReplyKind::MissingCredential => (
                "I need your API key first.",
                "Necesito tu API key primero.",
                "Can you add your API key in the settings?",
            ),
            ReplyKind::ServerRejected => (
                "I had a problem talking to the server.",
                "Tuve un problema al conectar con el servidor.",
                "Can you check your internet or API key?",
            ),
            ReplyKind::TransportFailure => (
                "I could not reach the server.",
                "No pude conectar con el servidor.",
                "Do you want to try again in a moment?",
            ),
            ReplyKind::MalformedResponse => (
                "I could not understand the response.",
                "No pude entender la respuesta.",
                "Can you ask me again in another way?",
            ),
        };
        let follow_up = if include_follow_up { follow_up } else { "" };
        Some(ParsedReply::new(answer, translation, follow_up, "OK"))
    }

    /// True for the fixed replies that stand in for a failed turn.
    pub fn is_fallback(self) -> bool {
        !matches!(self, ReplyKind::Model | ReplyKind::Farewell)
    }
}
