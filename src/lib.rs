/// Loads the table of mnemonics and their descriptions.
pub mod opcodes;

/// Annotates single lines of assembly with HTML markup.
///
/// Each line is split into tokens which are classified as
/// 1. **Label definitions** - wrapped in an anchor, e.g. `loop:`
/// 2. **Opcodes** - wrapped in a span carrying the description as hover text
/// 3. **Label references** - wrapped in a link to the anchor of the label
/// 4. **Comments** - wrapped in a span that can be toggled on the page
pub mod annotator;

/// Builds the complete HTML page from a source file.
pub mod document;

/// The `convert` command.
pub mod convert;

/// Logging and tracing setup.
pub mod instrumentation;

use annotator::AnnotateOptions;
use opcodes::OpcodeTable;

/// Utility function for annotating an assembly program held in memory.
#[tracing::instrument(skip(input, table))]
pub fn annotate_code(title: &str, input: &str, table: &OpcodeTable) -> String {
    document::AnnotatedDocument::from_source(title, input, table, &AnnotateOptions::default())
        .render()
}
