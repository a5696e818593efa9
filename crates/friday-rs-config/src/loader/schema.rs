//! Schema validation for Friday JSON5 configuration layers.
//!
//! Each layer is checked on its own before merging, so unknown keys and type
//! mismatches are reported against the file that introduced them.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    let allowed = [
        "$schema",
        "assistant",
        "completion",
        "reply",
        "memory",
        "documents",
        "speech",
    ];
    ensure_allowed_keys(map, &allowed, layer, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("assistant") {
        validate_assistant(value, layer, "assistant")?;
    }
    if let Some(value) = map.get("completion") {
        validate_completion(value, layer, "completion")?;
    }
    if let Some(value) = map.get("reply") {
        validate_reply(value, layer, "reply")?;
    }
    if let Some(value) = map.get("memory") {
        validate_memory(value, layer, "memory")?;
    }
    if let Some(value) = map.get("documents") {
        validate_documents(value, layer, "documents")?;
    }
    if let Some(value) = map.get("speech") {
        validate_speech(value, layer, "speech")?;
    }
    Ok(())
}

fn validate_assistant(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["name", "user_fallback_name", "stop_phrases", "test_prompt"],
        layer,
        path,
    )?;
    for key in ["name", "user_fallback_name", "test_prompt"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("stop_phrases") {
        validate_string_array(value, layer, &join_path(path, "stop_phrases"))?;
    }
    Ok(())
}

fn validate_completion(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "endpoint",
            "model",
            "temperature",
            "max_tokens",
            "history_window",
            "timeout_secs",
            "api_key",
            "api_key_env",
        ],
        layer,
        path,
    )?;
    for key in ["endpoint", "model"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    for key in ["api_key", "api_key_env"] {
        if let Some(value) = map.get(key) {
            expect_optional_string(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("temperature") {
        expect_f64(value, layer, &join_path(path, "temperature"))?;
    }
    for key in ["max_tokens", "history_window", "timeout_secs"] {
        if let Some(value) = map.get(key) {
            expect_u64(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

fn validate_reply(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "labels",
            "answer_language",
            "translation_language",
            "include_follow_up",
        ],
        layer,
        path,
    )?;
    if let Some(value) = map.get("labels") {
        let labels_path = join_path(path, "labels");
        let labels = expect_object(value, layer, &labels_path)?;
        let keys = ["answer", "translation", "follow_up", "correction"];
        ensure_allowed_keys(labels, &keys, layer, &labels_path)?;
        for key in keys {
            if let Some(value) = labels.get(key) {
                expect_string(value, layer, &join_path(&labels_path, key))?;
            }
        }
    }
    for key in ["answer_language", "translation_language"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("include_follow_up") {
        expect_bool(value, layer, &join_path(path, "include_follow_up"))?;
    }
    Ok(())
}

fn validate_memory(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "path",
            "storage_key",
            "max_recent_messages",
            "summary_top_topics",
            "summary_recent_messages",
        ],
        layer,
        path,
    )?;
    if let Some(value) = map.get("path") {
        expect_optional_string(value, layer, &join_path(path, "path"))?;
    }
    if let Some(value) = map.get("storage_key") {
        expect_string(value, layer, &join_path(path, "storage_key"))?;
    }
    for key in [
        "max_recent_messages",
        "summary_top_topics",
        "summary_recent_messages",
    ] {
        if let Some(value) = map.get(key) {
            expect_u64(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

fn validate_documents(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["max_chars", "max_documents"], layer, path)?;
    if let Some(value) = map.get("max_chars") {
        expect_u64(value, layer, &join_path(path, "max_chars"))?;
    }
    if let Some(value) = map.get("max_documents").filter(|value| !value.is_null()) {
        expect_u64(value, layer, &join_path(path, "max_documents"))?;
    }
    Ok(())
}

fn validate_speech(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["language", "rate", "pitch"], layer, path)?;
    if let Some(value) = map.get("language") {
        expect_string(value, layer, &join_path(path, "language"))?;
    }
    for key in ["rate", "pitch"] {
        if let Some(value) = map.get(key) {
            expect_f64(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

fn expect_optional_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() || value.is_null() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string or null"))
    }
}

fn expect_bool(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected bool"))
    }
}

/// Non-negative integers only; `-1` is rejected here rather than by serde.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

fn expect_f64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_number() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected number"))
    }
}

fn validate_string_array(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Value::Array(entries) = value else {
        return Err(invalid_field(layer, path, "expected array"));
    };
    for (idx, entry) in entries.iter().enumerate() {
        if !entry.is_string() {
            return Err(invalid_field(
                layer,
                &format!("{path}[{idx}]"),
                "expected string",
            ));
        }
    }
    Ok(())
}

fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
