use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::{
    annotator::AnnotateOptions,
    document::{AnnotatedDocument, DocumentError, RenderOptions},
    opcodes::OpcodeTable,
};

#[derive(Args, Debug, Clone)]
pub struct ConversionArgs {
    #[clap(help = "Assembly source file")]
    pub source: PathBuf,
    #[clap(help = "CSV table of mnemonics and descriptions")]
    pub opcodes: PathBuf,
    #[clap(help = "HTML file to write")]
    pub output: PathBuf,

    #[clap(long, default_value = ";")]
    #[clap(help = "Character(s) starting a comment")]
    pub comment_prefix: String,
    #[clap(long, default_value = ":")]
    #[clap(help = "Character(s) ending a label definition")]
    pub label_suffix: String,
    #[clap(long)]
    #[clap(help = "Character(s) starting a label definition in the first column, e.g. '.'")]
    pub label_prefix: Option<String>,
    #[clap(long)]
    #[clap(help = "Do not wrap comments in spans")]
    pub no_comment_wrap: bool,
    #[clap(long)]
    #[clap(help = "Match mnemonics and labels case-sensitively")]
    pub case_sensitive: bool,

    #[clap(long, value_name = "HREF")]
    #[clap(help = "Link this stylesheet instead of embedding the default one")]
    pub stylesheet: Option<String>,
    #[clap(long, value_name = "HREF")]
    #[clap(help = "Link this script instead of embedding the default one")]
    pub script: Option<String>,
    #[clap(long)]
    #[clap(help = "Page title, defaults to the source file name")]
    pub title: Option<String>,
}

impl ConversionArgs {
    pub fn annotate_options(&self) -> AnnotateOptions {
        AnnotateOptions {
            comment_prefix: self.comment_prefix.clone(),
            label_suffix: self.label_suffix.clone(),
            label_prefix: self.label_prefix.clone(),
            wrap_comments: !self.no_comment_wrap,
            case_sensitive: self.case_sensitive,
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            stylesheet_href: self.stylesheet.clone(),
            script_href: self.script.clone(),
        }
    }
}

/// Load the opcode table, annotate the source file and write the page.
///
/// Nothing is written unless both inputs could be read.
#[tracing::instrument]
pub fn convert_files(args: &ConversionArgs) -> Result<AnnotatedDocument, DocumentError> {
    let table = OpcodeTable::load_with(&args.opcodes, args.case_sensitive)?;

    let mut document = AnnotatedDocument::assemble(&args.source, &table, &args.annotate_options())?
        .with_render_options(args.render_options());
    if let Some(title) = &args.title {
        document.title = title.clone();
    }

    document.write(&args.output)?;
    Ok(document)
}

/// Entry point of the `convert` command.
pub fn convert(args: &ConversionArgs) -> Result<()> {
    let document = convert_files(args).with_context(|| {
        format!(
            "Unable to convert {} to {}",
            args.source.display(),
            args.output.display()
        )
    })?;

    tracing::info!(
        "Converted {} to {} ({} lines, {} labels)",
        args.source.display(),
        args.output.display(),
        document.lines.len(),
        document.labels.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        args: ConversionArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["asm2html", "prog.s", "ops.csv", "prog.html"]);
        assert_eq!(cli.args.source, PathBuf::from("prog.s"));
        assert_eq!(cli.args.annotate_options(), AnnotateOptions::default());
        assert_eq!(cli.args.render_options(), RenderOptions::default());
    }

    #[test]
    fn test_options() {
        let cli = Cli::parse_from([
            "asm2html",
            "prog.s",
            "ops.csv",
            "prog.html",
            "--comment-prefix",
            "@",
            "--label-prefix",
            ".",
            "--no-comment-wrap",
            "--case-sensitive",
            "--stylesheet",
            "style.css",
        ]);
        assert_eq!(
            cli.args.annotate_options(),
            AnnotateOptions {
                comment_prefix: "@".to_owned(),
                label_suffix: ":".to_owned(),
                label_prefix: Some(".".to_owned()),
                wrap_comments: false,
                case_sensitive: true,
            }
        );
        assert_eq!(
            cli.args.render_options().stylesheet_href.as_deref(),
            Some("style.css")
        );
    }
}
