//! Structured reply parsing.
//!
//! Replies are scanned line by line. A line that starts with a known label
//! followed by a colon switches the current field; any other line extends the
//! current field. Text before the first label is discarded.

use friday_rs_protocol::{ParsedReply, ReplyField, ReplyLabels};

/// Classification of a single trimmed reply line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    /// `LABEL: rest`, with `rest` already trimmed.
    Label(ReplyField, &'a str),
    Text(&'a str),
}

/// Splits raw model output into labeled reply fields.
#[derive(Debug, Clone)]
pub struct ReplyParser {
    labels: ReplyLabels,
    /// Fields ordered by descending label length so longer labels win.
    match_order: Vec<ReplyField>,
}

impl ReplyParser {
    pub fn new(labels: ReplyLabels) -> Self {
        let mut match_order = ReplyField::ALL.to_vec();
        match_order.sort_by_key(|field| std::cmp::Reverse(labels.label(*field).len()));
        Self {
            labels,
            match_order,
        }
    }

    pub fn labels(&self) -> &ReplyLabels {
        &self.labels
    }

    /// Parse raw text. Non-blank input always yields at least one field.
    pub fn parse(&self, raw: &str) -> ParsedReply {
        let mut parts: [Vec<&str>; 4] = Default::default();
        let mut current: Option<ReplyField> = None;

        for line in raw.lines() {
            match self.classify(line.trim()) {
                Line::Label(field, rest) => {
                    current = Some(field);
                    if !rest.is_empty() {
                        parts[slot(field)].push(rest);
                    }
                }
                Line::Text(text) => {
                    if let Some(field) = current
                        && !text.is_empty()
                    {
                        parts[slot(field)].push(text);
                    }
                }
            }
        }

        let mut reply = ParsedReply::default();
        for field in ReplyField::ALL {
            *reply.field_mut(field) = parts[slot(field)].join(" ").trim().to_string();
        }
        if reply.is_empty() {
            reply.answer = raw.trim().to_string();
        }
        reply
    }

    fn classify<'a>(&self, line: &'a str) -> Line<'a> {
        for field in &self.match_order {
            let label = self.labels.label(*field);
            let Some(head) = line.get(..label.len()) else {
                continue;
            };
            if !head.eq_ignore_ascii_case(label) {
                continue;
            }
            if let Some(rest) = line[label.len()..].strip_prefix(':') {
                return Line::Label(*field, rest.trim());
            }
        }
        Line::Text(line)
    }
}

impl Default for ReplyParser {
    fn default() -> Self {
        Self::new(ReplyLabels::default())
    }
}

fn slot(field: ReplyField) -> usize {
    match field {
        ReplyField::Answer => 0,
        ReplyField::Translation => 1,
        ReplyField::FollowUp => 2,
        ReplyField::Correction => 3,
    }
}
