//! Collaborator traits for document and preferences lookups.
//!
//! The library never queries storage itself. Callers register a
//! [`DocumentRepository`] per namespace with the [`Mailer`](crate::Mailer)
//! and pass a [`PreferencesRepository`] to
//! [`Message::from_preferences`](crate::Message::from_preferences). Any
//! backing store works: an ORM, a flat directory, a test fixture.

use std::path::PathBuf;
use std::sync::Arc;

/// A stored document that can be attached or inline-embedded.
pub trait Document: Send + Sync {
    /// Numeric identifier, referenced from body text as `{#id#}` or `[#id#]`.
    fn id(&self) -> i64;

    /// Absolute path to the document's file on disk.
    fn file(&self) -> PathBuf;

    /// Filename shown to the recipient when the document is attached.
    ///
    /// Defaults to the file's basename.
    fn display_name(&self) -> String {
        self.file()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string()
    }
}

/// Resolves document ids referenced in a message body.
pub trait DocumentRepository: Send + Sync {
    /// Fetch all documents whose id is in `ids`.
    ///
    /// Unknown ids are simply absent from the result; that is not an error.
    fn find_by_ids(&self, ids: &[i64]) -> Vec<Arc<dyn Document>>;
}

/// A stored message template: subject, body, sender, and fallback recipient,
/// optionally with pre-attached documents.
pub struct PreferencesGroup {
    /// Subject template (may contain `{{key}}` tokens).
    pub subject: String,
    /// Body template (may contain `{{key}}` and document tokens).
    pub body: String,
    /// Sender address.
    pub from: Option<String>,
    /// Address used when the caller supplies no recipients.
    pub fallback_address: String,
    /// Documents to attach to every message built from this group.
    pub documents: Vec<Arc<dyn Document>>,
}

/// Looks up preferences groups by code.
pub trait PreferencesRepository: Send + Sync {
    /// Fetch the group registered under `code`, if any.
    fn find_by_code(&self, code: &str) -> Option<PreferencesGroup>;
}
