//! The mutable message value object.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::address::Address;
use crate::attachment::Attachment;
use crate::error::MailError;
use crate::placeholder::replace_placeholders;
use crate::repository::{Document, PreferencesRepository};

/// An email message under composition.
///
/// A `Message` is built fresh for each send, mutated by transformers, and
/// handed to the [`Mailer`](crate::Mailer) for delivery. Recipient addresses
/// are validated at assignment time; an invalid address rejects the whole
/// assignment and leaves prior state unchanged.
///
/// ```
/// use herald::Message;
///
/// let mut message = Message::new();
/// message
///     .set_subject("Welcome, {{name}}")
///     .set_body("<p>Hello {{name}}</p>")
///     .set_from("noreply@example.com")
///     .set_param("name", "Alice");
/// message.set_to(["alice@example.com"]).unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    from_address: Option<String>,
    from_name: Option<String>,
    to: Vec<Address>,
    /// Destination used when no `to` address is set.
    default_to: Option<String>,
    subject: String,
    body: String,
    /// Parameters substituted into `{{key}}` tokens by transformers.
    params: BTreeMap<String, String>,
    /// Selects which document repository resolves embedded-document tokens.
    namespace: Option<String>,
    attachments: Vec<Attachment>,
}

impl Message {
    /// Create a new empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a message from a stored preferences group.
    ///
    /// Looks up the group by `code`, takes its subject, body, and sender, and
    /// attaches its documents. When `to` is empty the group's fallback
    /// address is used. An explicit `from` overrides the group's sender.
    pub fn from_preferences(
        namespace: &str,
        repo: &dyn PreferencesRepository,
        code: &str,
        to: &[&str],
        from: Option<&str>,
    ) -> Result<Self, MailError> {
        let group = repo.find_by_code(code).ok_or_else(|| {
            MailError::Configuration(format!("preferences group '{}' does not exist", code))
        })?;

        let mut message = Message::new();
        message
            .set_subject(group.subject)
            .set_body(group.body)
            .set_namespace(namespace)
            .set_default_to(&group.fallback_address);

        if to.is_empty() {
            message.set_to([group.fallback_address.as_str()])?;
        } else {
            message.set_to(to.iter().copied())?;
        }

        if let Some(from) = from.map(str::to_string).or(group.from) {
            message.set_from(from);
        }

        for doc in &group.documents {
            message.add_document(doc.as_ref())?;
        }

        Ok(message)
    }

    /// Set the subject line.
    pub fn set_subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = subject.into();
        self
    }

    /// Get the subject line.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Get the subject with the message's own params substituted.
    pub fn ready_subject(&self) -> String {
        replace_placeholders(&self.subject, &self.params)
    }

    /// Set the HTML body.
    pub fn set_body(&mut self, body: impl Into<String>) -> &mut Self {
        self.body = body.into();
        self
    }

    /// Get the HTML body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Get the body with the message's own params substituted.
    pub fn ready_body(&self) -> String {
        replace_placeholders(&self.body, &self.params)
    }

    /// Set the sender address.
    pub fn set_from(&mut self, address: impl Into<String>) -> &mut Self {
        self.from_address = Some(address.into());
        self
    }

    /// Set the sender display name.
    pub fn set_from_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.from_name = Some(name.into());
        self
    }

    /// Get the sender address.
    pub fn from_address(&self) -> Option<&str> {
        self.from_address.as_deref()
    }

    /// Get the sender display name.
    pub fn from_name(&self) -> Option<&str> {
        self.from_name.as_deref()
    }

    /// Replace all recipients.
    ///
    /// Every address is validated before any is assigned; one invalid address
    /// fails the whole call and the previous recipient list is kept.
    pub fn set_to<I, S>(&mut self, contacts: I) -> Result<&mut Self, MailError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = contacts
            .into_iter()
            .map(|c| Address::parse(c.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        self.to = parsed;
        Ok(self)
    }

    /// Add a single recipient, optionally with a display name.
    pub fn add_to(&mut self, email: &str, name: Option<&str>) -> Result<&mut Self, MailError> {
        let address = match name {
            Some(name) => Address::parse_with_name(name, email)?,
            None => Address::parse(email)?,
        };
        self.to.push(address);
        Ok(self)
    }

    /// Get the recipient list as assigned.
    pub fn to(&self) -> &[Address] {
        &self.to
    }

    /// Set the fallback destination used when no recipient is assigned.
    pub fn set_default_to(&mut self, address: impl Into<String>) -> &mut Self {
        self.default_to = Some(address.into());
        self
    }

    /// Effective recipients: the assigned list, or the fallback address when
    /// the list is empty.
    pub fn recipients(&self) -> Vec<Address> {
        if !self.to.is_empty() {
            self.to.clone()
        } else {
            self.default_to
                .as_ref()
                .map(|d| vec![Address::new(d)])
                .unwrap_or_default()
        }
    }

    /// Replace the substitution parameters.
    pub fn set_params(&mut self, params: BTreeMap<String, String>) -> &mut Self {
        self.params = params;
        self
    }

    /// Set a single substitution parameter.
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Get the substitution parameters.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Set the namespace used to resolve embedded-document tokens.
    pub fn set_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Get the document namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Replace all attachments.
    pub fn set_attachments(&mut self, attachments: Vec<Attachment>) -> &mut Self {
        self.attachments = attachments;
        self
    }

    /// Add an attachment.
    pub fn add_attachment(&mut self, attachment: Attachment) -> &mut Self {
        self.attachments.push(attachment);
        self
    }

    /// Attach a stored document under its display name.
    pub fn add_document(&mut self, doc: &dyn Document) -> Result<&mut Self, MailError> {
        let attachment = Attachment::new(doc.file(), doc.display_name())?;
        self.attachments.push(attachment);
        Ok(self)
    }

    /// Get the attachments.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }
}
