use tantivy::tokenizer::{Token, TokenStream, Tokenizer};

/// Splits text into alphanumeric runs. CJK characters become one token each
/// since they carry no whitespace between words.
#[derive(Clone, Default)]
pub struct WordTokenizer;

pub(crate) fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}' |
        '\u{3400}'..='\u{4DBF}' |
        '\u{F900}'..='\u{FAFF}' |
        '\u{3040}'..='\u{309F}' |
        '\u{30A0}'..='\u{30FF}' |
        '\u{AC00}'..='\u{D7AF}' |
        '\u{20000}'..='\u{2A6DF}'
    )
}

pub struct WordTokenStream {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenStream for WordTokenStream {
    fn advance(&mut self) -> bool {
        if self.index < self.tokens.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn token(&self) -> &Token {
        &self.tokens[self.index - 1]
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.tokens[self.index - 1]
    }
}

impl Tokenizer for WordTokenizer {
    type TokenStream<'a> = WordTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        let mut tokens = Vec::new();
        let mut position = 0;
        let mut word_start: Option<usize> = None;

        for (byte_offset, c) in text.char_indices() {
            let in_word = c.is_alphanumeric() && !is_cjk(c);
            if in_word {
                word_start.get_or_insert(byte_offset);
                continue;
            }
            if let Some(start) = word_start.take() {
                tokens.push(Token {
                    offset_from: start,
                    offset_to: byte_offset,
                    position,
                    text: text[start..byte_offset].to_string(),
                    ..Default::default()
                });
                position += 1;
            }
            if is_cjk(c) {
                tokens.push(Token {
                    offset_from: byte_offset,
                    offset_to: byte_offset + c.len_utf8(),
                    position,
                    text: c.to_string(),
                    ..Default::default()
                });
                position += 1;
            }
        }

        if let Some(start) = word_start {
            tokens.push(Token {
                offset_from: start,
                offset_to: text.len(),
                position,
                text: text[start..].to_string(),
                ..Default::default()
            });
        }

        WordTokenStream { tokens, index: 0 }
    }
}
