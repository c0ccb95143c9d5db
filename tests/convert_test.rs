use std::{
    fs,
    path::{Path, PathBuf},
};

use asm2html::{
    annotate_code,
    convert::{convert_files, ConversionArgs},
    document::DocumentError,
    opcodes::{OpcodeTable, TableError},
};

use pretty_assertions::assert_eq;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn output(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("asm2html-convert-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = fs::remove_file(&path);
    path
}

fn args(source: PathBuf, opcodes: PathBuf, output: PathBuf) -> ConversionArgs {
    ConversionArgs {
        source,
        opcodes,
        output,
        comment_prefix: ";".to_owned(),
        label_suffix: ":".to_owned(),
        label_prefix: None,
        no_comment_wrap: false,
        case_sensitive: false,
        stylesheet: None,
        script: None,
        title: None,
    }
}

#[test]
fn test_convert_demo() {
    let dest = output("demo.html");
    let document = convert_files(&args(
        fixture("demo.s"),
        fixture("opcodes.csv"),
        dest.clone(),
    ))
    .unwrap();

    let html = fs::read_to_string(&dest).unwrap();
    assert_eq!(html, document.render());

    let names: Vec<&str> = document.labels.iter().map(|label| label.name.as_str()).collect();
    assert_eq!(names, vec!["LOOP", "START", "done", "msg"]);

    // Label definition, opcode with its description and the trailing comment
    assert!(html.contains(r#"<a id="LOOP">LOOP:</a>"#));
    assert!(html.contains(
        r#"<span class="opcode" data-type="Instruction" data-description="move data" title="move data">MOV</span>"#
    ));
    assert!(html.contains(r#"<span class="comment" data-type="Comment">; copy</span>"#));

    // Forward and backward references
    assert!(html.contains(r##"<a href="#START">START</a>"##));
    assert!(html.contains(r##"<a href="#LOOP">LOOP</a>"##));
    assert!(html.contains(r##"<a href="#done">done</a>"##));

    // Mnemonics match in any case
    assert!(html.contains(r#"title="add, without carry">add</span>"#));

    // Raw text is escaped
    assert!(html.contains(r#"<span class="operand">&lt;</span> <span class="operand">b</span> <span class="operand">&amp;</span>"#));
    assert!(!html.contains("a < b"));

    assert_eq!(html.matches(r#"class="toggle_comments""#).count(), 1);
    assert_eq!(html.matches(r#"class="toggle_night""#).count(), 1);
}

#[test]
fn test_convert_title_and_assets() {
    let dest = output("title.html");
    let mut conversion = args(fixture("demo.s"), fixture("opcodes.csv"), dest.clone());
    conversion.title = Some("Demo".to_owned());
    conversion.stylesheet = Some("style.css".to_owned());
    conversion.script = Some("script.js".to_owned());
    convert_files(&conversion).unwrap();

    let html = fs::read_to_string(&dest).unwrap();
    assert!(html.contains("<title>Annotated Source Code: Demo</title>"));
    assert!(html.contains(r#"<link rel="stylesheet" href="style.css" />"#));
    assert!(html.contains(r#"<script src="script.js"></script>"#));
}

#[test]
fn test_malformed_table_writes_nothing() {
    let dest = output("malformed.html");
    let err = convert_files(&args(
        fixture("demo.s"),
        fixture("malformed.csv"),
        dest.clone(),
    ))
    .unwrap_err();

    match err {
        DocumentError::Table(TableError::Malformed { path, line, .. }) => {
            assert_eq!(path, fixture("malformed.csv"));
            assert_eq!(line, 3);
        }
        other => panic!("Unexpected error: {other}"),
    }
    assert!(!dest.exists());
}

#[test]
fn test_missing_inputs() {
    let dest = output("missing.html");

    let err = convert_files(&args(
        fixture("missing.s"),
        fixture("opcodes.csv"),
        dest.clone(),
    ))
    .unwrap_err();
    assert!(matches!(err, DocumentError::NotFound { .. }));

    let err = convert_files(&args(
        fixture("demo.s"),
        fixture("missing.csv"),
        dest.clone(),
    ))
    .unwrap_err();
    assert!(matches!(
        err,
        DocumentError::Table(TableError::NotFound { .. })
    ));
    assert!(!dest.exists());
}

#[test]
fn test_annotate_code() {
    let table: OpcodeTable = [("MOV", "move data"), ("JMP", "jump")].into_iter().collect();
    let html = annotate_code(
        "inline",
        "LOOP: MOV R1,R2 ; copy\n  JMP LOOP\n",
        &table,
    );

    assert!(html.contains(r#"<a id="LOOP">LOOP:</a>"#));
    assert!(html.contains(r#"title="move data">MOV</span>"#));
    assert!(html.contains(r#"<span class="comment" data-type="Comment">; copy</span>"#));
    assert!(html.contains(r##"<a href="#LOOP">LOOP</a>"##));
    assert!(html.contains(r##"<a data-type="Branch" href="#LOOP">LOOP</a>"##));
}
