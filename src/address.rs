//! Email address type with optional display name.

use email_address::EmailAddress;
use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::MailError;

/// An email address with an optional display name.
///
/// Recipients may be plain addresses or (name, address) pairs:
///
/// ```
/// use herald::Address;
///
/// let plain = Address::parse("user@example.com").unwrap();
/// assert_eq!(plain.name, None);
///
/// let named = Address::parse_with_name("Alice", "alice@example.com").unwrap();
/// assert_eq!(named.name, Some("Alice".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Optional display name (e.g., "Alice Smith")
    pub name: Option<String>,
    /// Email address (e.g., "alice@example.com")
    pub email: String,
}

impl Address {
    /// Create a new address without validating it.
    ///
    /// Used internally for addresses that come from configuration. Prefer
    /// [`Address::parse`] for anything caller-supplied.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Create a new address with a display name, without validating it.
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
        }
    }

    /// Parse and validate an email address.
    ///
    /// Uses RFC 5321/5322 compliant validation.
    pub fn parse(email: &str) -> Result<Self, MailError> {
        if !EmailAddress::is_valid(email) {
            return Err(MailError::InvalidAddress(format!(
                "'{}' is not a valid email address",
                email
            )));
        }

        Ok(Self {
            name: None,
            email: email.to_string(),
        })
    }

    /// Parse and validate an email address with a display name.
    ///
    /// An empty name is treated as no name.
    pub fn parse_with_name(name: &str, email: &str) -> Result<Self, MailError> {
        let mut addr = Self::parse(email)?;
        if !name.is_empty() {
            addr.name = Some(name.to_string());
        }
        Ok(addr)
    }

    /// Format as "Name <email>" or just "email" if no name.
    pub fn formatted(&self) -> String {
        match &self.name {
            Some(name) if name.is_empty() => self.email.clone(),
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }

    /// Convert to a lettre [`Mailbox`] for transport-message construction.
    pub fn to_mailbox(&self) -> Result<Mailbox, MailError> {
        let email = self
            .email
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::InvalidAddress(e.to_string()))?;
        Ok(Mailbox::new(self.name.clone(), email))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted())
    }
}
