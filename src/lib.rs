//! # Herald
//!
//! Compose, transform, and deliver templated HTML emails over SMTP.
//!
//! Herald is a thin layer over [lettre]: you build a [`Message`] (subject,
//! body, recipients, attachments), let transformer groups rewrite it
//! (placeholder substitution is built in), have document references in the
//! body embedded inline, and hand the result to an SMTP transport.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use herald::{Environment, Mailer, Message, SmtpSettings};
//!
//! let mailer = Mailer::builder()
//!     .smtp(SmtpSettings::new("mail.example.com", 587).credentials("app", "secret"))
//!     .details("dev-inbox@example.com", "Acme Ltd")
//!     .environment(Environment::Production)
//!     .build();
//!
//! let mut message = Message::new();
//! message
//!     .set_subject("Welcome, {{name}}")
//!     .set_body("<p>Hello {{name}}, from {{companyname}}</p>")
//!     .set_from("noreply@example.com")
//!     .set_param("name", "Alice");
//! message.set_to(["alice@example.com"])?;
//!
//! if mailer.send(&mut message).await? {
//!     println!("sent");
//! }
//! ```
//!
//! ## Environment variables
//!
//! [`MailerBuilder::from_env`] reads:
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `SMTP_HOST` | SMTP server host (required) |
//! | `SMTP_PORT` | SMTP server port (default: 25) |
//! | `SMTP_USERNAME` | SMTP username |
//! | `SMTP_PASSWORD` | SMTP password |
//! | `SMTP_LOCAL_DOMAIN` | EHLO hostname |
//! | `MAIL_FALLBACK_TO` | Non-production redirect address |
//! | `MAIL_COMPANY_NAME` | Value for the `{{companyname}}` token |
//! | `APP_ENV` | `production`, or anything else for development |
//!
//! ## Inline documents
//!
//! Body text may reference stored documents as `{#12#}` or `[#12#]`. Register
//! a [`DocumentRepository`] per namespace with the mailer; matching files are
//! embedded and the tokens rewritten to `cid:` references before sending.
//! Unresolved references are left as literal text.

/// The version of the herald crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod address;
mod attachment;
mod embed;
mod error;
mod mailer;
mod message;
mod placeholder;
mod repository;
mod smtp;
mod transformer;

// Re-exports
pub use address::Address;
pub use attachment::Attachment;
pub use embed::{embed_documents, replace_embedded_ids, scan_document_ids, EmbedSink};
pub use error::MailError;
pub use mailer::{Environment, Mailer, MailerBuilder, DEFAULT_GROUP};
pub use message::Message;
pub use placeholder::{replace_placeholders, replace_token};
pub use repository::{Document, DocumentRepository, PreferencesGroup, PreferencesRepository};
pub use smtp::{LettreSender, SmtpSender, SmtpSettings, TlsMode};
pub use transformer::{PlaceholderSubstitution, Transformer, TransformerGroups};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::Address;
    pub use crate::Attachment;
    pub use crate::Environment;
    pub use crate::MailError;
    pub use crate::Mailer;
    pub use crate::Message;
    pub use crate::SmtpSettings;
    pub use crate::Transformer;
}
