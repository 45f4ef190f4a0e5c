//! End-to-end tests of the engine API.
//!
//! Copyright (c) 2025 Posit, PBC

use std::fs;
use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sassc_core::{Encoding, Engine, EngineOptions, SassError, Source, Syntax};
use sassc_system_runtime::MemoryRuntime;

fn render(text: &str) -> String {
    render_with(text, EngineOptions::default())
}

fn render_with(text: &str, options: EngineOptions) -> String {
    let mut engine = Engine::with_runtime(text, options, Arc::new(MemoryRuntime::new()));
    engine.render().unwrap().into_string()
}

fn render_err(text: &str, options: EngineOptions) -> SassError {
    let mut engine = Engine::with_runtime(text, options, Arc::new(MemoryRuntime::new()));
    engine.render().unwrap_err()
}

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn test_line_comments() {
    let options = EngineOptions::default().with_line_comments(true);
    assert_eq!(
        render_with(".foo {\n  baz: bang; }", options),
        "/* line 1, stdin */\n.foo {\n  baz: bang; }\n"
    );
}

#[test]
fn test_one_line_comments() {
    assert_eq!(
        render(".foo {// bang: baz\n  baz: bang; //foo\n}\n"),
        ".foo {\n  baz: bang; }\n"
    );
    assert_eq!(
        render(".foo bar[val=\"//\"] {\n  baz: bang; //foo\n}\n"),
        ".foo bar[val=\"//\"] {\n  baz: bang; }\n"
    );
}

#[test]
fn test_comment_style_inside_value_does_not_matter() {
    let line = render(".foo {\n  baz: bang; // trailing\n}\n");
    let block = render(".foo {\n  baz: bang /* same position */;\n}\n");
    assert_eq!(line, block);
}

#[test]
fn test_loud_comments_preserved() {
    assert_eq!(
        render("/* header */\n.foo {\n  /* inside */\n  baz: bang; }"),
        "/* header */\n.foo {\n  /* inside */\n  baz: bang; }\n"
    );
}

#[test]
fn test_variables_and_precision() {
    let template = "$var: 1;\n.foo {\n  baz: $var / 3; }";
    assert_eq!(render(template), ".foo {\n  baz: 0.33333; }\n");
    assert_eq!(
        render_with(template, EngineOptions::default().with_precision(8)),
        ".foo {\n  baz: 0.33333333; }\n"
    );
}

#[test]
fn test_precision_from_json_options() {
    let options = EngineOptions::from_json(r#"{ "precision": 8, "syntax": "scss" }"#).unwrap();
    assert_eq!(
        render_with("$var: 1;\n.foo {\n  baz: $var / 3; }", options),
        ".foo {\n  baz: 0.33333333; }\n"
    );
}

#[test]
fn test_unknown_option_rejected() {
    let err = EngineOptions::from_json(r#"{ "precission": 8 }"#).unwrap_err();
    assert!(matches!(err, SassError::InvalidOptions { .. }));
}

#[test]
fn test_not_rendered() {
    let engine = Engine::new(".a { b: c; }", EngineOptions::default());
    assert!(matches!(engine.dependencies(), Err(SassError::NotRendered)));
}

#[test]
fn test_no_dependencies() {
    let mut engine = Engine::new(".a { b: c; }", EngineOptions::default());
    engine.render().unwrap();
    assert!(engine.dependencies().unwrap().is_empty());
}

#[test]
fn test_dependency_filenames_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "not_included.scss", "$size: 30px;");
    write(dir.path(), "import_parent.scss", "$size: 30px;");
    write(dir.path(), "import.scss", "@import 'import_parent'; $size: 30px;");
    write(
        dir.path(),
        "styles.scss",
        "@import 'import.scss'; .hi { width: $size; }",
    );

    let text = fs::read_to_string(dir.path().join("styles.scss")).unwrap();
    let options = EngineOptions::default().with_filename(dir.path().join("styles.scss"));
    let mut engine = Engine::new(text, options);
    assert_eq!(engine.render().unwrap(), ".hi {\n  width: 30px; }\n");

    let mut names: Vec<_> = engine
        .dependencies()
        .unwrap()
        .iter()
        .map(|dep| {
            dep.options
                .filename
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    assert_eq!(names, vec!["import.scss", "import_parent.scss"]);
}

#[test]
fn test_load_paths() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "included_1/import_parent.scss", "$s: 30px;");
    write(
        dir.path(),
        "included_2/import.scss",
        "@import 'import_parent'; $size: $s;",
    );
    let text = "@import 'import.scss'; .hi { width: $size; }";

    let options = EngineOptions::default()
        .with_filename(dir.path().join("styles.scss"))
        .with_load_paths([dir.path().join("included_1"), dir.path().join("included_2")]);
    let mut engine = Engine::new(text, options);
    assert_eq!(engine.render().unwrap(), ".hi {\n  width: 30px; }\n");

    // without the directory holding import_parent the chain cannot resolve
    let options = EngineOptions::default()
        .with_filename(dir.path().join("styles.scss"))
        .with_load_path(dir.path().join("included_2"));
    let err = Engine::new(text, options).render().unwrap_err();
    assert!(err.is_syntax());
    assert!(
        err.message().contains("import_parent"),
        "unexpected message: {}",
        err.message()
    );
}

#[test]
fn test_sass_syntax() {
    let input = ".foo\n  baz: bang\n";
    assert_eq!(
        render_with(input, EngineOptions::default().with_syntax(Syntax::Indented)),
        ".foo {\n  baz: bang; }\n"
    );
    assert!(render_err(input, EngineOptions::default()).is_syntax());
}

#[test]
fn test_syntax_from_string() {
    let syntax: Syntax = "sass".parse().unwrap();
    let input = "$w: 10px\n.foo\n  width: $w * 2\n";
    assert_eq!(
        render_with(input, EngineOptions::default().with_syntax(syntax)),
        ".foo {\n  width: 20px; }\n"
    );
    assert!("less".parse::<Syntax>().is_err());
}

#[test]
fn test_encoding_carried_through() {
    let bytes = b".foo { content: \"caf\xe9\"; }";
    let source = Source::from_bytes(bytes, Encoding::Latin1).unwrap();
    let mut engine = Engine::with_runtime(
        source,
        EngineOptions::default(),
        Arc::new(MemoryRuntime::new()),
    );
    let css = engine.render().unwrap();
    assert_eq!(css.encoding(), &Encoding::Latin1);
    assert_eq!(css.as_str(), ".foo {\n  content: \"caf\u{e9}\"; }\n");
    assert_eq!(css.to_bytes(), b".foo {\n  content: \"caf\xe9\"; }\n".to_vec());
}

#[test]
fn test_empty_template() {
    for encoding in [Encoding::Utf8, Encoding::from_label("Shift_JIS")] {
        let source = Source::new("").with_encoding(encoding.clone());
        let mut engine = Engine::with_runtime(
            source,
            EngineOptions::default(),
            Arc::new(MemoryRuntime::new()),
        );
        let css = engine.render().unwrap();
        assert_eq!(css.as_str(), "");
        assert_eq!(css.encoding(), &encoding);
    }
}

#[test]
fn test_non_ascii_value_starting_with_u() {
    assert_eq!(render(".a { b: uéé; }"), ".a {\n  b: uéé; }\n");
}

#[test]
fn test_arithmetic_at_integer_limit() {
    let css = render(".a { b: -170141183460469231731687303715884105727 - 1; }");
    assert!(css.starts_with(".a {\n  b: -17014118346046923"), "{css}");
}

#[test]
fn test_syntax_error_display() {
    let err = render_err(".foo {\n  baz: $nope; }", EngineOptions::default());
    assert_eq!(
        err.to_string(),
        "Error: Undefined variable: \"$nope\".\n        on line 2:8 of stdin"
    );
}

#[test]
fn test_engines_on_threads() {
    let handles: Vec<_> = (1..=8)
        .map(|precision| {
            std::thread::spawn(move || {
                let options = EngineOptions::default().with_precision(precision);
                let mut engine = Engine::with_runtime(
                    "$var: 1;\n.foo {\n  baz: $var / 3; }",
                    options,
                    Arc::new(MemoryRuntime::new()),
                );
                engine.render().unwrap().into_string()
            })
        })
        .collect();
    for (index, handle) in handles.into_iter().enumerate() {
        let digits = "3".repeat(index + 1);
        assert_eq!(
            handle.join().unwrap(),
            format!(".foo {{\n  baz: 0.{digits}; }}\n")
        );
    }
}

#[test]
fn test_shared_runtime_across_threads() {
    let rt = Arc::new(MemoryRuntime::new());
    rt.add_file("/project/_shared.scss", "$gap: 4px;");
    let handles: Vec<_> = (1..=4)
        .map(|n| {
            let rt = rt.clone();
            std::thread::spawn(move || {
                let text = format!("@import 'shared';\n.c{n} {{ gap: $gap * {n}; }}");
                let mut engine = Engine::with_runtime(text, EngineOptions::default(), rt);
                engine.render().unwrap().into_string()
            })
        })
        .collect();
    for (index, handle) in handles.into_iter().enumerate() {
        let n = index + 1;
        assert_eq!(
            handle.join().unwrap(),
            format!(".c{n} {{\n  gap: {}px; }}\n", 4 * n)
        );
    }
}
