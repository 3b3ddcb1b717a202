//! Text normalization and chunk splitting.
//!
//! Both operations are suspension points supplied by the session owner;
//! the defaults here cover the common cases: a markdown-aware
//! normalizer that measures text after formatting is stripped, and a
//! pass-through normalizer for sessions with no markup.

use pulldown_cmark::{Event, Parser, TagEnd};

use crate::BoxFuture;
use crate::errors::DispatchError;
use crate::params::{Params, Value};

/// Markup normalization and oversized-payload splitting.
pub trait Normalizer: Send + Sync {
    /// Apply markup/formatting normalization to the arguments.
    fn normalize(&self, args: Params) -> BoxFuture<'_, Result<Params, DispatchError>>;

    /// Split the arguments into an ordered sequence whose text fields
    /// each fit in `max` characters.
    fn split(&self, args: Params, max: usize) -> BoxFuture<'_, Result<Vec<Params>, DispatchError>>;
}

/// The text field normalization and chunking operate on.
const TEXT_FIELD: &str = "message";

/// Split `text` into chunks of at most `max` characters.
fn split_text(text: &str, max: usize) -> Result<Vec<String>, DispatchError> {
    let len = text.chars().count();
    if max == 0 {
        return Err(DispatchError::Oversized { len, max });
    }
    let mut chunks = Vec::with_capacity(len.div_ceil(max));
    let mut current = String::new();
    let mut count = 0;
    for c in text.chars() {
        current.push(c);
        count += 1;
        if count == max {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    Ok(chunks)
}

/// Clone `args` once per chunk, replacing the text field.
fn split_args(args: Params, max: usize) -> Result<Vec<Params>, DispatchError> {
    let Some(text) = args.str(TEXT_FIELD).map(str::to_string) else {
        return Ok(vec![args]);
    };
    let chunks = split_text(&text, max)?;
    Ok(chunks
        .into_iter()
        .map(|chunk| {
            let mut piece = args.clone();
            piece.set(TEXT_FIELD, Value::Text(chunk));
            piece
        })
        .collect())
}

// ─── PlainNormalizer ──────────────────────────────────────────────────────────

/// Pass-through normalizer: text carries no markup.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainNormalizer;

impl Normalizer for PlainNormalizer {
    fn normalize(&self, args: Params) -> BoxFuture<'_, Result<Params, DispatchError>> {
        Box::pin(async move { Ok(args) })
    }

    fn split(&self, args: Params, max: usize) -> BoxFuture<'_, Result<Vec<Params>, DispatchError>> {
        Box::pin(async move { split_args(args, max) })
    }
}

// ─── MarkdownNormalizer ───────────────────────────────────────────────────────

/// Strips markdown formatting so length checks see the rendered text.
///
/// `**bold**`, `__italic__`, `` `code` ``, links and the rest collapse
/// to their visible characters; block boundaries become newlines.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkdownNormalizer;

/// Render markdown to its plain-text form.
pub fn strip_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for event in Parser::new(text) {
        match event {
            Event::Text(t) => out.push_str(&t),
            Event::Code(t) => out.push_str(&t),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::End(TagEnd::Paragraph) => out.push('\n'),
            Event::End(TagEnd::Item) => out.push('\n'),
            _ => {}
        }
    }
    while out.ends_with('\n') {
        out.pop();
    }
    out
}

impl Normalizer for MarkdownNormalizer {
    fn normalize(&self, mut args: Params) -> BoxFuture<'_, Result<Params, DispatchError>> {
        Box::pin(async move {
            if let Some(text) = args.str(TEXT_FIELD) {
                let plain = strip_markdown(text);
                args.set(TEXT_FIELD, Value::Text(plain));
            }
            Ok(args)
        })
    }

    fn split(&self, args: Params, max: usize) -> BoxFuture<'_, Result<Vec<Params>, DispatchError>> {
        Box::pin(async move {
            let normalized = MarkdownNormalizer.normalize(args).await?;
            split_args(normalized, max)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_markdown_keeps_visible_characters() {
        assert_eq!(strip_markdown("**bold** and `code`"), "bold and code");
        assert_eq!(strip_markdown("[label](https://example.com)"), "label");
    }

    #[test]
    fn split_text_is_exact() {
        let chunks = split_text("abcdefghij", 4).unwrap();
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn split_with_zero_limit_is_an_error() {
        assert!(matches!(
            split_text("abc", 0),
            Err(DispatchError::Oversized { len: 3, max: 0 })
        ));
    }

    #[tokio::test]
    async fn split_args_copies_other_fields() {
        let args = Params::new().with("peer", "@x").with("message", "abcdef");
        let pieces = PlainNormalizer.split(args, 3).await.unwrap();
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].str("message"), Some("abc"));
        assert_eq!(pieces[1].str("message"), Some("def"));
        assert!(pieces.iter().all(|p| p.str("peer") == Some("@x")));
    }
}
