//! Message transformers, organized into named groups.
//!
//! Transformers mutate a message in place before it is sent. The mailer runs
//! one named group per send; the built-in `"default"` group performs
//! placeholder substitution.
//!
//! # Example
//!
//! ```
//! use herald::{Message, Transformer, TransformerGroups};
//!
//! let mut groups = TransformerGroups::new();
//! groups.add("branding", |message: &mut Message| {
//!     let subject = format!("[Acme] {}", message.subject());
//!     message.set_subject(subject);
//! });
//!
//! let mut message = Message::new();
//! message.set_subject("Hello");
//! groups.apply("branding", &mut message);
//! assert_eq!(message.subject(), "[Acme] Hello");
//! ```

use std::collections::HashMap;

use crate::message::Message;
use crate::placeholder::replace_placeholders;

/// A pluggable step that mutates a message before sending.
///
/// For simple cases use a closure; for stateful logic implement the trait on
/// a struct.
pub trait Transformer: Send + Sync {
    /// Mutate the message in place.
    fn transform(&self, message: &mut Message);
}

/// Blanket implementation for closures.
impl<F> Transformer for F
where
    F: Fn(&mut Message) + Send + Sync,
{
    fn transform(&self, message: &mut Message) {
        (self)(message)
    }
}

/// Substitutes `{{key}}` tokens in the subject and body using the message's
/// own params. Registered under the `"default"` group at mailer construction.
pub struct PlaceholderSubstitution;

impl Transformer for PlaceholderSubstitution {
    fn transform(&self, message: &mut Message) {
        let subject = replace_placeholders(message.subject(), message.params());
        let body = replace_placeholders(message.body(), message.params());
        message.set_subject(subject).set_body(body);
    }
}

/// Named, insertion-ordered groups of transformers.
///
/// Groups are registered during the mailer's configuration phase and are
/// read-only during sends; no internal locking is provided.
#[derive(Default)]
pub struct TransformerGroups {
    groups: HashMap<String, Vec<Box<dyn Transformer>>>,
}

impl TransformerGroups {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transformer to a named group, creating the group if absent.
    pub fn add(&mut self, group: impl Into<String>, transformer: impl Transformer + 'static) {
        self.groups
            .entry(group.into())
            .or_default()
            .push(Box::new(transformer));
    }

    /// Remove an entire group.
    pub fn clear(&mut self, group: &str) {
        self.groups.remove(group);
    }

    /// Whether a group is registered.
    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Run each transformer in the group over the message, in registration
    /// order. An unknown group name is a silent no-op.
    pub fn apply(&self, group: &str, message: &mut Message) {
        if let Some(transformers) = self.groups.get(group) {
            for transformer in transformers {
                transformer.transform(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_substitution_transformer() {
        let mut message = Message::new();
        message
            .set_subject("Hi {{name}}")
            .set_body("Dear {{name}}")
            .set_param("name", "Alice");

        PlaceholderSubstitution.transform(&mut message);

        assert_eq!(message.subject(), "Hi Alice");
        assert_eq!(message.body(), "Dear Alice");
    }

    #[test]
    fn test_apply_in_registration_order() {
        let mut groups = TransformerGroups::new();
        groups.add("default", |m: &mut Message| {
            let s = format!("{}a", m.subject());
            m.set_subject(s);
        });
        groups.add("default", |m: &mut Message| {
            // Sees the previous transformer's mutation.
            let s = format!("{}b", m.subject());
            m.set_subject(s);
        });

        let mut message = Message::new();
        groups.apply("default", &mut message);
        assert_eq!(message.subject(), "ab");
    }

    #[test]
    fn test_unknown_group_is_noop() {
        let groups = TransformerGroups::new();
        let mut message = Message::new();
        message.set_subject("untouched");
        groups.apply("nope", &mut message);
        assert_eq!(message.subject(), "untouched");
    }

    #[test]
    fn test_clear_removes_group() {
        let mut groups = TransformerGroups::new();
        groups.add("default", PlaceholderSubstitution);
        assert!(groups.contains("default"));

        groups.clear("default");
        assert!(!groups.contains("default"));

        let mut message = Message::new();
        message.set_subject("Hi {{name}}").set_param("name", "Alice");
        groups.apply("default", &mut message);
        assert_eq!(message.subject(), "Hi {{name}}");
    }
}
