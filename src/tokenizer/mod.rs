//! Text normalization shared by the corpus and the relevance engine.
//!
//! Both sides run the same tantivy analyzer chain
//! (`WordTokenizer -> LowerCaser -> AsciiFoldingFilter`), so a query token and
//! a field token compare equal whenever they differ only in case or accents.

pub mod word_tokenizer;

pub use word_tokenizer::WordTokenizer;

use once_cell::sync::Lazy;
use tantivy::tokenizer::{AsciiFoldingFilter, LowerCaser, TextAnalyzer, TokenStream};

static ANALYZER: Lazy<TextAnalyzer> = Lazy::new(|| {
    TextAnalyzer::builder(WordTokenizer)
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build()
});

/// Lowercased, accent-folded tokens of `text`, in order.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut analyzer = ANALYZER.clone();
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    while stream.advance() {
        tokens.push(stream.token().text.clone());
    }
    tokens
}

/// Tokens of `text` joined by single spaces.
///
/// Used as the per-field match target: a query token hits a field when this
/// string contains it.
pub fn normalize(text: &str) -> String {
    tokenize(text).join(" ")
}

/// Normalize every element and join with a newline so no token match can
/// span two elements.
pub fn normalize_all<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    values
        .into_iter()
        .map(normalize)
        .collect::<Vec<_>>()
        .join("\n")
}
