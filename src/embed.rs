//! Inline document embedding.
//!
//! Body text may reference stored documents with `{#id#}` or `[#id#]`
//! tokens. Before sending, the mailer resolves the ids through the
//! namespace's [`DocumentRepository`], embeds each existing file into the
//! outgoing message, and rewrites the tokens into `cid:` references so the
//! HTML can display the embedded content inline.
//!
//! Ids that resolve to nothing, or whose file is missing, are skipped and
//! their tokens left as literal text. A body without tokens never touches
//! the repository.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::MailError;
use crate::repository::{Document, DocumentRepository};

static CURLY_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{#([0-9]+)#\}").expect("valid token pattern"));
static SQUARE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[#([0-9]+)#\]").expect("valid token pattern"));

/// Receives files to embed and hands back a content reference for each.
///
/// The mailer's sink collects lettre inline parts; tests substitute their
/// own.
pub trait EmbedSink {
    /// Embed the file at `path` under content id `cid`, returning the
    /// reference to substitute into the body (e.g. `cid:file-id-12`).
    fn embed(&mut self, path: &Path, cid: &str) -> Result<String, MailError>;
}

/// Extract referenced document ids from both token syntaxes, in discovery
/// order. Duplicates are preserved.
pub fn scan_document_ids(body: &str) -> Vec<i64> {
    CURLY_TOKEN
        .captures_iter(body)
        .chain(SQUARE_TOKEN.captures_iter(body))
        .filter_map(|c| c[1].parse().ok())
        .collect()
}

/// Replace every `{#id#}` and `[#id#]` token with its recorded reference.
pub fn replace_embedded_ids(refs: &[(i64, String)], body: &str) -> String {
    let mut text = body.to_string();
    for (id, reference) in refs {
        text = text.replace(&format!("{{#{}#}}", id), reference);
        text = text.replace(&format!("[#{}#]", id), reference);
    }
    text
}

/// Resolve and embed every document referenced in `body`, returning the
/// rewritten body.
///
/// `repo` is the repository registered for the message's namespace, if any;
/// with tokens present but no repository the body is returned unchanged.
pub fn embed_documents(
    repo: Option<&dyn DocumentRepository>,
    accessor: &dyn Fn(&dyn Document) -> PathBuf,
    body: &str,
    sink: &mut dyn EmbedSink,
) -> String {
    let ids = scan_document_ids(body);
    if ids.is_empty() {
        return body.to_string();
    }

    let Some(repo) = repo else {
        tracing::warn!(
            ids = ?ids,
            "body references documents but no repository is registered for the namespace"
        );
        return body.to_string();
    };

    let mut refs: Vec<(i64, String)> = Vec::new();
    for doc in repo.find_by_ids(&ids) {
        let path = accessor(doc.as_ref());
        if !path.is_file() {
            tracing::warn!(
                id = doc.id(),
                path = %path.display(),
                "embedded document file missing, token left unresolved"
            );
            continue;
        }

        let cid = format!("file-id-{}", doc.id());
        match sink.embed(&path, &cid) {
            Ok(reference) => refs.push((doc.id(), reference)),
            Err(e) => {
                tracing::warn!(id = doc.id(), error = %e, "failed to embed document");
            }
        }
    }

    replace_embedded_ids(&refs, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct TempDoc {
        id: i64,
        path: PathBuf,
    }

    impl Document for TempDoc {
        fn id(&self) -> i64 {
            self.id
        }

        fn file(&self) -> PathBuf {
            self.path.clone()
        }
    }

    struct FixtureRepo {
        docs: Vec<Arc<dyn Document>>,
        lookups: AtomicUsize,
    }

    impl FixtureRepo {
        fn new(docs: Vec<Arc<dyn Document>>) -> Self {
            Self {
                docs,
                lookups: AtomicUsize::new(0),
            }
        }
    }

    impl DocumentRepository for FixtureRepo {
        fn find_by_ids(&self, ids: &[i64]) -> Vec<Arc<dyn Document>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.docs
                .iter()
                .filter(|d| ids.contains(&d.id()))
                .cloned()
                .collect()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        embedded: Vec<(PathBuf, String)>,
    }

    impl EmbedSink for RecordingSink {
        fn embed(&mut self, path: &Path, cid: &str) -> Result<String, MailError> {
            self.embedded.push((path.to_path_buf(), cid.to_string()));
            Ok(format!("cid:{}", cid))
        }
    }

    fn temp_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("herald-embed-{}-{}", uuid::Uuid::new_v4(), name));
        std::fs::write(&path, b"png-bytes").unwrap();
        path
    }

    fn default_accessor() -> impl Fn(&dyn Document) -> PathBuf {
        |doc: &dyn Document| doc.file()
    }

    #[test]
    fn test_scan_both_syntaxes() {
        let ids = scan_document_ids("See {#12#}, also [#7#] and {#12#}");
        assert_eq!(ids, vec![12, 12, 7]);
    }

    #[test]
    fn test_scan_ignores_malformed_tokens() {
        let ids = scan_document_ids("{#abc#} [#12] {#3# } [#4#]");
        assert_eq!(ids, vec![4]);
    }

    #[test]
    fn test_no_tokens_skips_repository() {
        let repo = FixtureRepo::new(vec![]);
        let mut sink = RecordingSink::default();
        let body = "<p>No references here</p>";

        let out = embed_documents(Some(&repo), &default_accessor(), body, &mut sink);

        assert_eq!(out, body);
        assert_eq!(repo.lookups.load(Ordering::SeqCst), 0);
        assert!(sink.embedded.is_empty());
    }

    #[test]
    fn test_both_token_forms_replaced_identically() {
        let path = temp_file("logo.png");
        let repo = FixtureRepo::new(vec![Arc::new(TempDoc { id: 12, path: path.clone() })]);
        let mut sink = RecordingSink::default();

        let out = embed_documents(
            Some(&repo),
            &default_accessor(),
            "See {#12#} and [#12#]",
            &mut sink,
        );

        assert_eq!(out, "See cid:file-id-12 and cid:file-id-12");
        assert_eq!(sink.embedded.len(), 1);
        assert_eq!(sink.embedded[0].1, "file-id-12");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_unresolved_id_left_literal() {
        let repo = FixtureRepo::new(vec![]);
        let mut sink = RecordingSink::default();

        let out = embed_documents(Some(&repo), &default_accessor(), "See {#99#}", &mut sink);

        assert_eq!(out, "See {#99#}");
        assert_eq!(repo.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_file_left_literal() {
        let repo = FixtureRepo::new(vec![Arc::new(TempDoc {
            id: 5,
            path: PathBuf::from("/nonexistent/herald-missing.png"),
        })]);
        let mut sink = RecordingSink::default();

        let out = embed_documents(Some(&repo), &default_accessor(), "See [#5#]", &mut sink);

        assert_eq!(out, "See [#5#]");
        assert!(sink.embedded.is_empty());
    }

    #[test]
    fn test_no_repository_leaves_body_unchanged() {
        let mut sink = RecordingSink::default();
        let out = embed_documents(None, &default_accessor(), "See {#3#}", &mut sink);
        assert_eq!(out, "See {#3#}");
    }

    #[test]
    fn test_custom_accessor() {
        let path = temp_file("thumb.png");
        let repo = FixtureRepo::new(vec![Arc::new(TempDoc {
            id: 2,
            path: PathBuf::from("/nonexistent/full-size.png"),
        })]);
        let mut sink = RecordingSink::default();
        let thumb = path.clone();
        let accessor = move |_doc: &dyn Document| thumb.clone();

        let out = embed_documents(Some(&repo), &accessor, "Pic: {#2#}", &mut sink);

        assert_eq!(out, "Pic: cid:file-id-2");
        std::fs::remove_file(path).unwrap();
    }
}
