//! The validation result attached to each checked record.

use serde::{Deserialize, Serialize};

use crate::config::ValidatorConfig;
use crate::message::ValidationMessage;

/// Outcome of checking one file.
///
/// `success` is `false` exactly when at least one message that survived the
/// verification predicate is not `info`. It is computed before `info`
/// messages are stripped for reporting, so `show_info` never changes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ValidationResult {
    /// Whether the file passed.
    pub success: bool,
    /// Messages kept for reporting, in checker order.
    pub messages: Vec<ValidationMessage>,
}

impl ValidationResult {
    /// A passing result with no messages.
    #[must_use]
    pub fn passed() -> Self {
        Self {
            success: true,
            messages: Vec::new(),
        }
    }

    /// Build a result directly. Intended for custom producers and tests;
    /// the validator stage always goes through [`ValidationResult::from_messages`].
    #[must_use]
    pub fn new(success: bool, messages: Vec<ValidationMessage>) -> Self {
        Self { success, messages }
    }

    /// Apply the stage policy to the checker's messages.
    ///
    /// 1. drop messages rejected by `verify_message` (order preserved)
    /// 2. compute success from what is left
    /// 3. strip `info` messages unless `show_info` is set
    #[must_use]
    pub fn from_messages(raw: Vec<ValidationMessage>, config: &ValidatorConfig) -> Self {
        let verified: Vec<ValidationMessage> = raw
            .into_iter()
            .filter(|m| config.accepts(&m.kind, &m.message))
            .collect();

        let success = verified.iter().all(|m| m.kind.is_info());

        let messages = if config.show_info {
            verified
        } else {
            verified.into_iter().filter(|m| !m.kind.is_info()).collect()
        };

        Self { success, messages }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Number of attached messages that are not `info`.
    #[must_use]
    pub fn errors_count(&self) -> usize {
        self.messages.iter().filter(|m| !m.kind.is_info()).count()
    }
}
