//! Maps decoded webhook events to what the bridge should do about them.

use serde::Serialize;

use crate::adf::collect_text;
use crate::webhooks::Event;

/// Comment prefix that asks for a fresh Mayil run, after normalization.
pub const RERUN_COMMAND: &str = "mayil-ai rerun";

/// Issue fields whose change warrants a new submission.
const RELEVANT_FIELDS: [&str; 3] = ["summary", "description", "attachment"];

/// What an event asks the bridge to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    /// Submit the issue to Mayil
    StartProcessing {
        /// Issue key
        issue_key: String,
    },
    /// Delete the trigger comment and resubmit the issue
    Rerun {
        /// Issue key
        issue_key: String,
        /// Comment that contained the rerun command
        comment_id: String,
    },
    /// Nothing to do
    Ignore {
        /// Why the event was ignored
        reason: &'static str,
    },
}

/// Classify an event. Pure; performs no I/O.
#[must_use]
pub fn classify(event: &Event) -> Intent {
    match event {
        Event::Created { issue_key } => Intent::StartProcessing {
            issue_key: issue_key.clone(),
        },
        Event::Updated {
            issue_key,
            changed_fields,
        } => {
            if changed_fields.iter().any(|f| is_relevant_field(f)) {
                Intent::StartProcessing {
                    issue_key: issue_key.clone(),
                }
            } else {
                Intent::Ignore {
                    reason: "no_relevant_fields_changed",
                }
            }
        }
        Event::Commented {
            issue_key,
            comment_id,
            body,
        } => {
            if is_rerun_command(&collect_text(body)) {
                Intent::Rerun {
                    issue_key: issue_key.clone(),
                    comment_id: comment_id.clone(),
                }
            } else {
                Intent::Ignore {
                    reason: "not_a_rerun_comment",
                }
            }
        }
        Event::Other { .. } => Intent::Ignore {
            reason: "unsupported_event_type",
        },
    }
}

fn is_relevant_field(field: &str) -> bool {
    RELEVANT_FIELDS
        .iter()
        .any(|relevant| field.eq_ignore_ascii_case(relevant))
}

/// Normalize comment text for command matching: drop `@` and backticks, lower-case, trim.
#[must_use]
pub fn normalize_comment(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '@' | '`'))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// Whether comment text is a rerun request.
#[must_use]
pub fn is_rerun_command(text: &str) -> bool {
    normalize_comment(text).starts_with(RERUN_COMMAND)
}
