//! Capability objects the engine consumes but never implements itself: the
//! text embedder and the tree-sitter-based symbol extractor. Keeping these as
//! traits rather than concrete model/tokenizer code is what lets
//! `memonic-core` stay free of any particular embedding runtime — the daemon
//! binary is the one place a concrete implementation gets wired in.

use crate::vector::Vector;

/// A position in source text, used by [`Symbol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceSpan {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: u32,
    pub end_line: u32,
}

/// A code symbol as extracted by the (external) tree-sitter layer. The core
/// only ever stores these as node payloads/tags; it does not parse source.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: String,
    pub span: SourceSpan,
    pub signature: Option<String>,
}

/// Failure modes an embedder can report. A transient failure lets
/// `remember` fall back to a zero vector per the error taxonomy; this type
/// does not otherwise appear on the wire.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("embedder timed out")]
    Timeout,
    #[error("embedder unavailable: {0}")]
    Unavailable(String),
}

/// `embed(text) -> Vector` with a fixed dimension decided at construction.
/// Synchronous from the caller's point of view but expected to be bounded by
/// a timeout upstream (the daemon wraps calls with [`Config::max_wait_seconds`](crate::config::Config)).
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vector, EmbedError>;
}

/// `extract(source, lang) -> [Symbol]`. Pure function contract: no I/O, no
/// mutation of engine state.
pub trait SymbolExtractor: Send + Sync {
    fn extract(&self, source: &str, language: &str) -> Vec<Symbol>;
}

/// Used wherever no embedder is configured (tests, `--no-embeddings`
/// deployments). Every call reports unavailable so callers exercise the same
/// zero-vector fallback path a real transient failure would.
pub struct NullEmbedder {
    dim: usize,
}

impl NullEmbedder {
    pub fn new(dim: usize) -> Self {
        NullEmbedder { dim }
    }
}

impl Embedder for NullEmbedder {
    fn dimensions(&self) -> usize {
        self.dim
    }

    fn embed(&self, _text: &str) -> Result<Vector, EmbedError> {
        Err(EmbedError::Unavailable("no embedder configured".into()))
    }
}

/// Used wherever no symbol extractor is configured. Always returns no
/// symbols rather than erroring — code-symbol extraction is best-effort.
pub struct NullSymbolExtractor;

impl SymbolExtractor for NullSymbolExtractor {
    fn extract(&self, _source: &str, _language: &str) -> Vec<Symbol> {
        Vec::new()
    }
}

/// Caller-supplied summarization strategy for wisdom synthesis (§4.7.3): the
/// core only assembles the cluster of source texts and writes the resulting
/// node; it has no opinion on how a summary is produced.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, cluster_texts: &[String]) -> String;
}

/// Concatenates the first sentence of each input, a summarizer with no
/// language-model behind it. Used by deployments that don't want to wire a
/// real summarizer, and by tests.
pub struct NaiveSummarizer;

impl Summarizer for NaiveSummarizer {
    fn summarize(&self, cluster_texts: &[String]) -> String {
        let parts: Vec<&str> = cluster_texts
            .iter()
            .map(|t| t.split(['.', '\n']).next().unwrap_or(t.as_str()).trim())
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            return "synthesized wisdom (no source text)".to_string();
        }
        format!("Synthesized pattern across {} memories: {}", parts.len(), parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_embedder_always_reports_unavailable() {
        let e = NullEmbedder::new(384);
        assert_eq!(e.dimensions(), 384);
        assert!(e.embed("hello").is_err());
    }

    #[test]
    fn null_symbol_extractor_returns_nothing() {
        let e = NullSymbolExtractor;
        assert!(e.extract("fn main() {}", "rust").is_empty());
    }

    #[test]
    fn naive_summarizer_joins_first_sentences() {
        let s = NaiveSummarizer.summarize(&[
            "Always validate inputs. Extra detail.".to_string(),
            "Tests catch regressions\nSecond line".to_string(),
        ]);
        assert!(s.contains("Always validate inputs"));
        assert!(s.contains("Tests catch regressions"));
    }
}
