//! The mailer facade: transforms, embeds, and dispatches messages.

use lettre::message::header::ContentType;
use lettre::message::{Attachment as LettreAttachment, MultiPart, SinglePart};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::address::Address;
use crate::attachment::Attachment;
use crate::embed::{embed_documents, EmbedSink};
use crate::error::MailError;
use crate::message::Message;
use crate::placeholder;
use crate::repository::{Document, DocumentRepository};
use crate::smtp::{LettreSender, SmtpSender, SmtpSettings};
use crate::transformer::{PlaceholderSubstitution, Transformer, TransformerGroups};

/// The transformer group applied by [`Mailer::send`].
pub const DEFAULT_GROUP: &str = "default";

/// Runtime environment. Outside production, every message is redirected to
/// the configured fallback address with the original recipients noted in the
/// subject line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Deliver to the real recipients.
    Production,
    /// Redirect delivery to the fallback address.
    Development,
}

impl Environment {
    /// Parse an environment name; anything other than `"production"` is
    /// treated as development.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }

    /// Whether this is the production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

type FileAccessor = Arc<dyn Fn(&dyn Document) -> PathBuf + Send + Sync>;

/// Composes and sends messages over SMTP.
///
/// Construction happens through [`Mailer::builder`]; transformer groups and
/// document repositories are registered during the configuration phase and
/// are read-only once sending begins.
///
/// ```no_run
/// use herald::{Environment, Mailer, Message, SmtpSettings};
///
/// # async fn demo() -> Result<(), herald::MailError> {
/// let mailer = Mailer::builder()
///     .smtp(SmtpSettings::new("mail.example.com", 587).credentials("app", "secret"))
///     .details("dev-inbox@example.com", "Acme Ltd")
///     .environment(Environment::Production)
///     .build();
///
/// let mut message = Message::new();
/// message
///     .set_subject("Welcome, {{name}}")
///     .set_body("<p>Hello {{name}}</p>")
///     .set_from("noreply@example.com")
///     .set_param("name", "Alice");
/// message.set_to(["alice@example.com"])?;
///
/// let sent = mailer.send(&mut message).await?;
/// # Ok(())
/// # }
/// ```
pub struct Mailer {
    settings: SmtpSettings,
    sender: Arc<dyn SmtpSender>,
    /// Destination for redirected non-production mail.
    fallback_to: Option<String>,
    company_name: Option<String>,
    environment: Environment,
    transformers: TransformerGroups,
    repositories: HashMap<String, Arc<dyn DocumentRepository>>,
    file_accessor: FileAccessor,
}

impl Mailer {
    /// Start building a mailer.
    pub fn builder() -> MailerBuilder {
        MailerBuilder::new()
    }

    /// The configured SMTP settings.
    pub fn settings(&self) -> &SmtpSettings {
        &self.settings
    }

    /// Append a transformer to a named group, creating the group if absent.
    pub fn add_transformer(
        &mut self,
        group: impl Into<String>,
        transformer: impl Transformer + 'static,
    ) -> &mut Self {
        self.transformers.add(group, transformer);
        self
    }

    /// Remove an entire transformer group.
    pub fn clear_transformer_group(&mut self, group: &str) -> &mut Self {
        self.transformers.clear(group);
        self
    }

    /// Register the document repository for a namespace.
    pub fn register_repository(
        &mut self,
        namespace: impl Into<String>,
        repository: Arc<dyn DocumentRepository>,
    ) -> &mut Self {
        self.repositories.insert(namespace.into(), repository);
        self
    }

    /// Substitute `{{key}}` tokens from `params`, then the fixed
    /// `{{companyname}}` token from the configured company name.
    pub fn replace_placeholders(&self, text: &str, params: &BTreeMap<String, String>) -> String {
        let text = placeholder::replace_placeholders(text, params);
        match &self.company_name {
            Some(name) => placeholder::replace_token(&text, "companyname", name),
            None => text,
        }
    }

    /// Send a message using the `"default"` transformer group.
    pub async fn send(&self, message: &mut Message) -> Result<bool, MailError> {
        self.send_with_group(message, DEFAULT_GROUP).await
    }

    /// Send a message, applying the named transformer group.
    ///
    /// Returns `Ok(true)` on delivery and `Ok(false)` when the SMTP server
    /// rejects the send; composition errors (invalid addresses, unreadable
    /// attachments) propagate as `Err`.
    pub async fn send_with_group(
        &self,
        message: &mut Message,
        group: &str,
    ) -> Result<bool, MailError> {
        let email = self.compose(message, group)?;

        match self.sender.send(email).await {
            Ok(message_id) => {
                tracing::info!(message_id = %message_id, subject = %message.subject(), "email sent");
                Ok(true)
            }
            Err(MailError::SendError(e)) => {
                tracing::error!(error = %e, subject = %message.subject(), "smtp send failed");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Build the transport message: environment override, transformers,
    /// inline embedding, attachments.
    fn compose(&self, message: &mut Message, group: &str) -> Result<lettre::Message, MailError> {
        let span = tracing::debug_span!("herald.compose", group = group);
        let _guard = span.enter();

        let mut recipients = message.recipients();
        if recipients.is_empty() {
            return Err(MailError::MissingField("to"));
        }
        let from_address = message
            .from_address()
            .ok_or(MailError::MissingField("from"))?
            .to_string();

        // Outside production, note the intended recipients in the subject and
        // redirect delivery. Must happen before transformers run, since they
        // may re-read the subject.
        if !self.environment.is_production() {
            let originals: Vec<&str> = recipients.iter().map(|a| a.email.as_str()).collect();
            let subject = format!("{} ({})", message.subject(), originals.join(" - "));
            message.set_subject(subject);

            let fallback = self.fallback_to.as_deref().ok_or_else(|| {
                MailError::Configuration(
                    "no fallback address configured for non-production delivery".into(),
                )
            })?;
            recipients = vec![Address::parse(fallback)?];
            tracing::debug!(fallback = fallback, "redirecting non-production delivery");
        }

        self.transformers.apply(group, message);

        let from = match message.from_name() {
            Some(name) => Address::with_name(name, from_address),
            None => Address::new(from_address),
        };

        let mut builder = lettre::Message::builder()
            .from(from.to_mailbox()?)
            .subject(message.subject());
        for recipient in &recipients {
            builder = builder.to(recipient.to_mailbox()?);
        }

        // Inline embedding rewrites document tokens into cid: references and
        // collects the parts to ship alongside the HTML.
        let mut inline = InlineParts::default();
        let repository = message
            .namespace()
            .and_then(|ns| self.repositories.get(ns))
            .map(|r| r.as_ref());
        let body = embed_documents(
            repository,
            self.file_accessor.as_ref(),
            message.body(),
            &mut inline,
        );

        let octet_stream: ContentType = "application/octet-stream"
            .parse()
            .map_err(|e: lettre::message::header::ContentTypeErr| {
                MailError::BuildError(e.to_string())
            })?;
        let html = SinglePart::builder()
            .header(ContentType::TEXT_HTML)
            .body(body);

        let email = match (inline.parts.is_empty(), message.attachments().is_empty()) {
            (true, true) => builder.singlepart(html)?,
            (false, true) => {
                let mut related = MultiPart::related().singlepart(html);
                for part in inline.parts {
                    related = related.singlepart(part);
                }
                builder.multipart(related)?
            }
            (true, false) => {
                let mut mixed = MultiPart::mixed().singlepart(html);
                for attachment in message.attachments() {
                    mixed = mixed.singlepart(attachment_part(attachment, &octet_stream)?);
                }
                builder.multipart(mixed)?
            }
            (false, false) => {
                let mut related = MultiPart::related().singlepart(html);
                for part in inline.parts {
                    related = related.singlepart(part);
                }
                let mut mixed = MultiPart::mixed().multipart(related);
                for attachment in message.attachments() {
                    mixed = mixed.singlepart(attachment_part(attachment, &octet_stream)?);
                }
                builder.multipart(mixed)?
            }
        };

        Ok(email)
    }
}

/// Attach a file as application/octet-stream under its display filename.
fn attachment_part(
    attachment: &Attachment,
    content_type: &ContentType,
) -> Result<SinglePart, MailError> {
    let data = attachment.read()?;
    Ok(LettreAttachment::new(attachment.filename.clone()).body(data, content_type.clone()))
}

/// Collects inline parts produced by the embedder.
#[derive(Default)]
struct InlineParts {
    parts: Vec<SinglePart>,
}

impl EmbedSink for InlineParts {
    fn embed(&mut self, path: &Path, cid: &str) -> Result<String, MailError> {
        let data = std::fs::read(path)
            .map_err(|e| MailError::AttachmentReadError(format!("{}: {}", path.display(), e)))?;
        let content_type: ContentType = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string()
            .parse()
            .unwrap_or(ContentType::TEXT_PLAIN);

        self.parts
            .push(LettreAttachment::new_inline(cid.to_string()).body(data, content_type));
        Ok(format!("cid:{}", cid))
    }
}

/// Builder for [`Mailer`].
pub struct MailerBuilder {
    settings: SmtpSettings,
    fallback_to: Option<String>,
    company_name: Option<String>,
    environment: Environment,
    file_accessor: Option<FileAccessor>,
    sender: Option<Arc<dyn SmtpSender>>,
}

impl MailerBuilder {
    fn new() -> Self {
        Self {
            settings: SmtpSettings::localhost(),
            fallback_to: None,
            company_name: None,
            // Development by default: a misconfigured deployment fails loudly
            // instead of emailing real users.
            environment: Environment::Development,
            file_accessor: None,
            sender: None,
        }
    }

    /// Read settings from the environment.
    ///
    /// `SMTP_HOST` is required; `SMTP_PORT` (default 25), `SMTP_USERNAME`,
    /// `SMTP_PASSWORD`, `SMTP_LOCAL_DOMAIN`, `MAIL_FALLBACK_TO`,
    /// `MAIL_COMPANY_NAME`, and `APP_ENV` are optional.
    pub fn from_env() -> Result<Self, MailError> {
        let host = std::env::var("SMTP_HOST")
            .map_err(|_| MailError::Configuration("SMTP_HOST not set".into()))?;
        let port: u16 = std::env::var("SMTP_PORT")
            .unwrap_or_else(|_| "25".to_string())
            .parse()
            .unwrap_or(25);

        let mut settings = SmtpSettings::new(&host, port);
        let username = std::env::var("SMTP_USERNAME").unwrap_or_default();
        if !username.is_empty() {
            let password = std::env::var("SMTP_PASSWORD").unwrap_or_default();
            settings = settings.credentials(username, password);
        }
        if let Ok(domain) = std::env::var("SMTP_LOCAL_DOMAIN") {
            settings = settings.local_domain(domain);
        }

        let mut builder = Self::new().smtp(settings);
        if let Ok(fallback) = std::env::var("MAIL_FALLBACK_TO") {
            builder.fallback_to = Some(fallback);
        }
        if let Ok(company) = std::env::var("MAIL_COMPANY_NAME") {
            builder.company_name = Some(company);
        }
        if let Ok(env_name) = std::env::var("APP_ENV") {
            builder.environment = Environment::from_name(&env_name);
        }

        Ok(builder)
    }

    /// Set the SMTP endpoint settings.
    pub fn smtp(mut self, settings: SmtpSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the non-production fallback address and the company name used for
    /// `{{companyname}}` substitution.
    pub fn details(
        mut self,
        fallback_to: impl Into<String>,
        company_name: impl Into<String>,
    ) -> Self {
        self.fallback_to = Some(fallback_to.into());
        self.company_name = Some(company_name.into());
        self
    }

    /// Set the runtime environment.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Override how a document's file path is obtained during embedding.
    ///
    /// Defaults to [`Document::file`].
    pub fn file_accessor<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&dyn Document) -> PathBuf + Send + Sync + 'static,
    {
        self.file_accessor = Some(Arc::new(accessor));
        self
    }

    /// Override the delivery seam. Tests use this to capture outgoing
    /// messages without a network.
    pub fn sender(mut self, sender: Arc<dyn SmtpSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Build the mailer.
    ///
    /// The `"default"` transformer group is pre-registered with
    /// [`PlaceholderSubstitution`].
    pub fn build(self) -> Mailer {
        let sender = self
            .sender
            .unwrap_or_else(|| Arc::new(LettreSender::new(&self.settings)));

        let mut transformers = TransformerGroups::new();
        transformers.add(DEFAULT_GROUP, PlaceholderSubstitution);

        Mailer {
            settings: self.settings,
            sender,
            fallback_to: self.fallback_to,
            company_name: self.company_name,
            environment: self.environment,
            transformers,
            repositories: HashMap::new(),
            file_accessor: self
                .file_accessor
                .unwrap_or_else(|| Arc::new(|doc: &dyn Document| doc.file())),
        }
    }
}
