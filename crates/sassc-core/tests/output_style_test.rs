//! Whole stylesheets through each output style and both syntaxes.
//!
//! Copyright (c) 2025 Posit, PBC

use pretty_assertions::assert_eq;
use sassc_core::{EngineOptions, OutputStyle, SassError, Syntax, compile};
use sassc_system_runtime::MemoryRuntime;

const NAV: &str = "$w: 10px;
.nav, .menu {
  width: $w * 2;
  a { color: red; }
}
@media print { .nav { display: none; } }
";

fn css(text: &str, options: &EngineOptions) -> String {
    compile(text, options, &MemoryRuntime::new())
        .unwrap()
        .css
        .into_string()
}

fn css_err(text: &str, options: &EngineOptions) -> SassError {
    compile(text, options, &MemoryRuntime::new()).unwrap_err()
}

fn styled(style: OutputStyle) -> EngineOptions {
    EngineOptions::default().with_output_style(style)
}

#[test]
fn test_nested_style() {
    assert_eq!(
        css(NAV, &styled(OutputStyle::Nested)),
        ".nav, .menu {\n  width: 20px; }\n  .nav a, .menu a {\n    color: red; }\n\n\
         @media print {\n  .nav {\n    display: none; } }\n"
    );
}

#[test]
fn test_expanded_style() {
    assert_eq!(
        css(NAV, &styled(OutputStyle::Expanded)),
        ".nav,\n.menu {\n  width: 20px;\n}\n\n.nav a,\n.menu a {\n  color: red;\n}\n\n\
         @media print {\n  .nav {\n    display: none;\n  }\n}\n"
    );
}

#[test]
fn test_compact_style() {
    assert_eq!(
        css(NAV, &styled(OutputStyle::Compact)),
        ".nav, .menu { width: 20px; }\n\n.nav a, .menu a { color: red; }\n\n\
         @media print {\n  .nav { display: none; } }\n"
    );
}

#[test]
fn test_compressed_style() {
    assert_eq!(
        css(NAV, &styled(OutputStyle::Compressed)),
        ".nav,.menu{width:20px}.nav a,.menu a{color:red}@media print{.nav{display:none}}\n"
    );
}

#[test]
fn test_compressed_keeps_only_bang_comments() {
    let text = "/*! license */\n/* dropped */\na { b: 0.5em; }";
    assert_eq!(
        css(text, &styled(OutputStyle::Compressed)),
        "/*! license */a{b:.5em}\n"
    );
}

#[test]
fn test_media_bubbles_out_of_rule() {
    let text = ".a {\n  color: red;\n  @media print { color: blue; }\n}";
    assert_eq!(
        css(text, &EngineOptions::default()),
        ".a {\n  color: red; }\n  @media print {\n    .a {\n      color: blue; } }\n"
    );
    assert_eq!(
        css(text, &styled(OutputStyle::Expanded)),
        ".a {\n  color: red;\n}\n\n@media print {\n  .a {\n    color: blue;\n  }\n}\n"
    );
}

#[test]
fn test_font_face_declarations() {
    assert_eq!(
        css("@font-face { font-family: x; }", &styled(OutputStyle::Expanded)),
        "@font-face {\n  font-family: x;\n}\n"
    );
}

#[test]
fn test_placeholders_are_not_printed() {
    assert_eq!(
        css("%p { x: y; }\n.q, %r { s: t; }", &EngineOptions::default()),
        ".q {\n  s: t; }\n"
    );
}

#[test]
fn test_parent_suffix() {
    assert_eq!(
        css(".btn { &-primary { a: b; } &:hover { c: d; } }", &styled(OutputStyle::Compact)),
        ".btn-primary { a: b; }\n\n.btn:hover { c: d; }\n"
    );
}

#[test]
fn test_unit_arithmetic() {
    let text = "a {\n  w: 1in + 2.54cm;\n  h: (10px / 4);\n  r: 10px/4;\n  p: percentage(0.25);\n}";
    assert_eq!(
        css(text, &EngineOptions::default()),
        "a {\n  w: 2in;\n  h: 2.5px;\n  r: 10px/4;\n  p: 25%; }\n"
    );
    let err = css_err("a { w: 1px + 1em; }", &EngineOptions::default());
    assert_eq!(err.message(), "Incompatible units: 'em' and 'px'.");
}

#[test]
fn test_indented_syntax() {
    let text = "$c: blue\n// silent\n.a\n  color: $c\n  .b\n    margin: 0 auto\n";
    let options = EngineOptions::default().with_syntax(Syntax::Indented);
    assert_eq!(
        css(text, &options),
        ".a {\n  color: blue; }\n  .a .b {\n    margin: 0 auto; }\n"
    );
}

#[test]
fn test_indented_media_and_comment() {
    let text = "/* top */\n@media screen\n  .x\n    y: z\n";
    let options = EngineOptions::default()
        .with_syntax(Syntax::Indented)
        .with_output_style(OutputStyle::Expanded);
    assert_eq!(
        css(text, &options),
        "/* top */\n@media screen {\n  .x {\n    y: z;\n  }\n}\n"
    );
}

#[test]
fn test_inconsistent_indentation() {
    let options = EngineOptions::default().with_syntax(Syntax::Indented);
    let err = css_err(".a\n    b: c\n  d: e\n", &options);
    assert_eq!(err.message(), "Inconsistent indentation.");
}

#[test]
fn test_scss_source_in_indented_mode_fails() {
    let options = EngineOptions::default().with_syntax(Syntax::Indented);
    assert!(css_err(".a { b: c; }", &options).is_syntax());
}

#[test]
fn test_control_directives_unsupported() {
    let err = css_err("@mixin foo { a: b; }", &EngineOptions::default());
    assert_eq!(err.message(), "@mixin is not supported.");
    assert_eq!(err.line(), Some(1));
}
