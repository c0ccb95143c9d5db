use html_escape::{encode_double_quoted_attribute, encode_text};

use self::{
    labels::LabelRegistry,
    token::{tokenize, Token, TokenKind},
};
use crate::opcodes::OpcodeTable;

/// Registry of label definitions and their anchors.
pub mod labels;

/// Splitting of source lines into tokens.
pub mod token;

/// Markers and switches controlling how source lines are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotateOptions {
    /// Start of a comment that runs to the end of the line
    pub comment_prefix: String,
    /// Trailing marker of a label definition, e.g. `loop:`
    pub label_suffix: String,
    /// Leading marker of a label definition in the first column, e.g. `.loop`
    pub label_prefix: Option<String>,
    pub wrap_comments: bool,
    pub case_sensitive: bool,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            comment_prefix: ";".to_owned(),
            label_suffix: ":".to_owned(),
            label_prefix: None,
            wrap_comments: true,
            case_sensitive: false,
        }
    }
}

/// A line of source code and its 1-based line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine<'a> {
    pub number: usize,
    pub text: &'a str,
}

impl<'a> SourceLine<'a> {
    pub fn new(number: usize, text: &'a str) -> Self {
        Self { number, text }
    }
}

/// Register all label definitions found on `line`.
///
/// Running this over the whole file before annotating lets references resolve to labels
/// defined further down.
pub fn collect_labels(line: &SourceLine, labels: &mut LabelRegistry, options: &AnnotateOptions) {
    for token in tokenize(line.text, options) {
        if let Some(name) = token.label_name(options) {
            labels.register(name);
        }
    }
}

/// Annotate a single source line with HTML markup.
#[tracing::instrument(skip(table, labels, options))]
pub fn annotate(
    line: &SourceLine,
    table: &OpcodeTable,
    labels: &mut LabelRegistry,
    options: &AnnotateOptions,
) -> String {
    let mut html = String::with_capacity(line.text.len() * 4);

    for token in tokenize(line.text, options) {
        match token.kind {
            TokenKind::Whitespace => html.push_str(token.text),
            TokenKind::Comment => annotate_comment(&mut html, &token, options),
            TokenKind::LabelDefinition => annotate_label(&mut html, &token, labels, options),
            TokenKind::Word => annotate_word(&mut html, &token, table, labels),
        }
    }

    html
}

fn annotate_comment(html: &mut String, token: &Token, options: &AnnotateOptions) {
    if options.wrap_comments {
        html.push_str(&format!(
            r#"<span class="comment" data-type="Comment">{}</span>"#,
            encode_text(token.text)
        ));
    } else {
        html.push_str(&encode_text(token.text));
    }
}

fn annotate_label(
    html: &mut String,
    token: &Token,
    labels: &mut LabelRegistry,
    options: &AnnotateOptions,
) {
    let Some(name) = token.label_name(options) else {
        return;
    };

    let anchor = labels.register(name).anchor.clone();
    // A label defined twice keeps the anchor of its first definition
    let attribute = if labels.place(name) { "id" } else { "href" };
    let target = if attribute == "id" {
        anchor
    } else {
        format!("#{}", anchor)
    };

    html.push_str(&format!(
        r#"<span class="label" data-type="Label"><a {}="{}">{}</a></span>"#,
        attribute,
        encode_double_quoted_attribute(&target),
        encode_text(token.text)
    ));
}

fn annotate_word(html: &mut String, token: &Token, table: &OpcodeTable, labels: &LabelRegistry) {
    if let Some(entry) = table.lookup(token.text) {
        let description = encode_double_quoted_attribute(&entry.description);
        html.push_str(&format!(
            r#"<span class="opcode" data-type="{}" data-description="{}" title="{}">{}</span>"#,
            encode_double_quoted_attribute(&entry.category),
            description,
            description,
            encode_text(token.text)
        ));
        return;
    }

    if let Some(label) = labels.find(token.text) {
        html.push_str(&format!(
            r##"<span class="branch" data-type="Branch"><a href="#{}">{}</a></span>"##,
            encode_double_quoted_attribute(&label.anchor),
            encode_text(token.text)
        ));
        return;
    }

    // Operands like `#table,X` or `(ptr),Y` may still mention labels
    let mut body = String::new();
    let mut linked = false;
    for (is_identifier, piece) in split_identifiers(token.text) {
        match labels.find(piece).filter(|_| is_identifier) {
            Some(label) => {
                linked = true;
                body.push_str(&format!(
                    r##"<a href="#{}">{}</a>"##,
                    encode_double_quoted_attribute(&label.anchor),
                    encode_text(piece)
                ));
            }
            None => body.push_str(&encode_text(piece)),
        }
    }

    if linked {
        html.push_str(&format!(
            r#"<span class="branch" data-type="Branch">{}</span>"#,
            body
        ));
    } else {
        html.push_str(&format!(r#"<span class="operand">{}</span>"#, body));
    }
}

/// Split a word into alternating runs of identifier and non identifier characters.
fn split_identifiers(word: &str) -> Vec<(bool, &str)> {
    let is_identifier = |ch: char| ch.is_alphanumeric() || ch == '_';

    let mut pieces = vec![];
    let mut start = 0;
    let mut current = None;
    for (ix, ch) in word.char_indices() {
        let kind = is_identifier(ch);
        match current {
            Some(prev) if prev != kind => {
                pieces.push((prev, &word[start..ix]));
                start = ix;
            }
            _ => (),
        }
        current = Some(kind);
    }
    if let Some(kind) = current {
        pieces.push((kind, &word[start..]));
    }

    pieces
}
