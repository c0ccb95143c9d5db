use std::{
    fs, io,
    path::{Path, PathBuf},
};

use html_escape::{encode_double_quoted_attribute, encode_text};
use thiserror::Error;

use crate::{
    annotator::{
        annotate, collect_labels,
        labels::{Label, LabelRegistry, CODE_BLOCK_ID},
        AnnotateOptions, SourceLine,
    },
    opcodes::{OpcodeTable, TableError},
};

/// Stylesheet embedded into the page unless an external one is linked.
pub const STYLESHEET: &str = include_str!("document/style.css");

/// Script toggling comment visibility and night mode.
pub const TOGGLE_SCRIPT: &str = include_str!("document/toggle.js");

const TOGGLE_COMMENTS_ICON: &str = "\u{1f441}\u{fe0f}\u{200d}\u{1f5e8}\u{fe0f}";
const TOGGLE_NIGHT_ICON: &str = "\u{1f31d}";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Source file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Table(#[from] TableError),
}

/// How the page pulls in its stylesheet and script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Link this stylesheet instead of embedding the default one
    pub stylesheet_href: Option<String>,
    /// Link this script instead of embedding the default one
    pub script_href: Option<String>,
}

/// The annotated lines of a source file together with its labels.
#[derive(Debug)]
pub struct AnnotatedDocument {
    pub title: String,
    /// One HTML fragment per source line
    pub lines: Vec<String>,
    /// Labels in order of first appearance
    pub labels: Vec<Label>,
    pub render_options: RenderOptions,
}

impl AnnotatedDocument {
    /// Read and annotate the source file at `source_path`.
    #[tracing::instrument(skip(table, options))]
    pub fn assemble(
        source_path: &Path,
        table: &OpcodeTable,
        options: &AnnotateOptions,
    ) -> Result<Self, DocumentError> {
        let source = fs::read_to_string(source_path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => DocumentError::NotFound {
                path: source_path.to_owned(),
            },
            _ => DocumentError::Io {
                path: source_path.to_owned(),
                source,
            },
        })?;

        Ok(Self::from_source(
            &source_path.display().to_string(),
            &source,
            table,
            options,
        ))
    }

    /// Annotate source code that is already in memory.
    ///
    /// Labels are collected in a first pass so that references to labels defined further
    /// down the file resolve as well.
    #[tracing::instrument(skip(source, table, options))]
    pub fn from_source(
        title: &str,
        source: &str,
        table: &OpcodeTable,
        options: &AnnotateOptions,
    ) -> Self {
        let lines: Vec<SourceLine> = source
            .lines()
            .enumerate()
            .map(|(ix, text)| SourceLine::new(ix + 1, text))
            .collect();

        let mut labels = LabelRegistry::new(options.case_sensitive);
        for line in &lines {
            collect_labels(line, &mut labels, options);
        }
        tracing::debug!("Found {} labels in {} lines", labels.len(), lines.len());

        let fragments: Vec<String> = lines
            .iter()
            .map(|line| {
                format!(
                    r#"<span data-line="{}">{}</span>"#,
                    line.number,
                    annotate(line, table, &mut labels, options)
                )
            })
            .collect();

        Self {
            title: title.to_owned(),
            lines: fragments,
            labels: labels.into_labels(),
            render_options: RenderOptions::default(),
        }
    }

    pub fn with_render_options(mut self, render_options: RenderOptions) -> Self {
        self.render_options = render_options;
        self
    }

    fn render_sidebar(&self, html: &mut String) {
        html.push_str("<nav class=\"toc-wrap\"><div class=\"toc\">\n");
        for label in &self.labels {
            html.push_str(&format!(
                r##"<a data-type="Branch" href="#{}">{}</a>"##,
                encode_double_quoted_attribute(&label.anchor),
                encode_text(&label.name)
            ));
            html.push('\n');
        }
        html.push_str("</div></nav>\n");
    }

    /// Render the complete HTML page.
    #[tracing::instrument(skip(self))]
    pub fn render(&self) -> String {
        let code_len: usize = self.lines.iter().map(|line| line.len() + 1).sum();
        let mut html = String::with_capacity(code_len + STYLESHEET.len() + TOGGLE_SCRIPT.len() + 1024);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\" />\n");
        html.push_str(&format!(
            "<title>Annotated Source Code: {}</title>\n",
            encode_text(&self.title)
        ));
        match &self.render_options.stylesheet_href {
            Some(href) => {
                html.push_str(&format!(
                    r#"<link rel="stylesheet" href="{}" />"#,
                    encode_double_quoted_attribute(href)
                ));
                html.push('\n');
            }
            None => {
                html.push_str(&format!("<style>\n{}</style>\n", STYLESHEET));
            }
        }
        html.push_str("</head>\n<body>\n");

        html.push_str(&format!(
            r#"<div class="options"><button class="toggle_comments" title="Toggle comments">{}</button><button class="toggle_night" title="Toggle night mode">{}</button></div>"#,
            TOGGLE_COMMENTS_ICON, TOGGLE_NIGHT_ICON
        ));
        html.push('\n');
        self.render_sidebar(&mut html);

        html.push_str(&format!(r#"<pre id="{}"><code>"#, CODE_BLOCK_ID));
        html.push_str(&self.lines.join("\n"));
        html.push_str("</code></pre>\n");

        match &self.render_options.script_href {
            Some(src) => {
                html.push_str(&format!(
                    r#"<script src="{}"></script>"#,
                    encode_double_quoted_attribute(src)
                ));
                html.push('\n');
            }
            None => {
                html.push_str(&format!("<script>\n{}</script>\n", TOGGLE_SCRIPT));
            }
        }
        html.push_str("</body>\n</html>\n");

        html
    }

    /// Render the page and write it to `dest`.
    ///
    /// The page is written to a temporary file next to `dest` and renamed into place, so a
    /// failed run never leaves a truncated page behind.
    #[tracing::instrument(skip(self))]
    pub fn write(&self, dest: &Path) -> Result<(), DocumentError> {
        let file_name = dest
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = dest.with_file_name(format!(".{}.tmp", file_name));

        let result = fs::write(&tmp, self.render())
            .map_err(|source| DocumentError::Io {
                path: tmp.clone(),
                source,
            })
            .and_then(|()| {
                fs::rename(&tmp, dest).map_err(|source| DocumentError::Io {
                    path: dest.to_owned(),
                    source,
                })
            });

        if result.is_err() && tmp.exists() {
            // Partly written pages must not be left behind
            if let Err(err) = fs::remove_file(&tmp) {
                tracing::warn!("Unable to remove {}: {}", tmp.display(), err);
            }
        }
        result?;

        tracing::debug!("Wrote {}", dest.display());
        Ok(())
    }
}
