use std::fmt;

use super::AnnotateOptions;

/// TokenKind defines the kinds of tokens a source line is split into.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    /// Run of whitespace, kept verbatim for alignment
    Whitespace,
    /// Label definition, e.g. `loop:`
    LabelDefinition,
    /// Comment marker and the rest of the line after it
    Comment,
    /// Mnemonic, operand or anything else that is not whitespace.
    ///
    /// Whether it is an opcode or a label reference is decided during annotation.
    Word,
}

/// Token is a slice of a source line together with its byte column.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub column: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, column: usize) -> Self {
        Self { kind, text, column }
    }

    /// Name of the label defined by this token, with the markers stripped.
    pub fn label_name(&self, options: &AnnotateOptions) -> Option<&'a str> {
        if self.kind != TokenKind::LabelDefinition {
            return None;
        }

        let mut name = self.text;
        if !options.label_suffix.is_empty() {
            name = name.strip_suffix(options.label_suffix.as_str()).unwrap_or(name);
        }
        if let Some(prefix) = options.label_prefix.as_deref() {
            name = name.strip_prefix(prefix).unwrap_or(name);
        }
        Some(name)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?} '{}'", self.column, self.kind, self.text)
    }
}

fn is_label_definition(word: &str, first_word: bool, options: &AnnotateOptions) -> bool {
    let suffix = options.label_suffix.as_str();
    if !suffix.is_empty() && word.len() > suffix.len() && word.ends_with(suffix) {
        return true;
    }

    match options.label_prefix.as_deref() {
        Some(prefix) if !prefix.is_empty() => {
            first_word && word.len() > prefix.len() && word.starts_with(prefix)
        }
        _ => false,
    }
}

/// Split a line into whitespace, words, label definitions and a trailing comment.
///
/// Concatenating the text of all returned tokens gives back the input line.
pub fn tokenize<'a>(line: &'a str, options: &AnnotateOptions) -> Vec<Token<'a>> {
    let mut tokens = vec![];
    let mut column = 0;
    let mut first_word = true;

    while column < line.len() {
        let rest = &line[column..];

        let whitespace = rest.len() - rest.trim_start().len();
        if whitespace > 0 {
            tokens.push(Token::new(
                TokenKind::Whitespace,
                &rest[..whitespace],
                column,
            ));
            column += whitespace;
            continue;
        }

        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let word = &rest[..end];

        let comment_start = match options.comment_prefix.as_str() {
            "" => None,
            prefix => word.find(prefix),
        };
        if let Some(ix) = comment_start {
            if ix > 0 {
                let kind = if is_label_definition(&word[..ix], first_word, options) {
                    TokenKind::LabelDefinition
                } else {
                    TokenKind::Word
                };
                tokens.push(Token::new(kind, &word[..ix], column));
            }
            tokens.push(Token::new(TokenKind::Comment, &rest[ix..], column + ix));
            break;
        }

        let kind = if is_label_definition(word, first_word, options) {
            TokenKind::LabelDefinition
        } else {
            TokenKind::Word
        };
        tokens.push(Token::new(kind, word, column));
        first_word = false;
        column += end;
    }

    tokens
}
