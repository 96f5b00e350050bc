//! File-bound templates: auto-reload on and off.

use cinder_common::Value;
use cinder_config::TemplateOptions;
use cinder_conformance::{engine_with, vars, write_template, CountingCompiler};
use cinder_template::RenderError;

#[test]
fn without_auto_reload_edits_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_template(dir.path(), "page.html", "v1 {name}", 1_000);

    let compiler = CountingCompiler::new();
    let t = engine_with(&compiler, TemplateOptions::default())
        .template_file(&path)
        .unwrap();
    let v = vars(&[("name", Value::from("x"))]);
    assert_eq!(t.render(None, &v).unwrap(), "v1 x");

    write_template(dir.path(), "page.html", "v2 {name}", 2_000);
    assert_eq!(t.render(None, &v).unwrap(), "v1 x");
    assert_eq!(compiler.compiles(), 1);
}

#[test]
fn with_auto_reload_edits_are_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_template(dir.path(), "page.html", "v1 {name}", 1_000);

    let compiler = CountingCompiler::new();
    let t = engine_with(&compiler, TemplateOptions::default().with_auto_reload(true))
        .template_file(&path)
        .unwrap();
    let v = vars(&[("name", Value::from("x"))]);
    assert_eq!(t.render(None, &v).unwrap(), "v1 x");
    let before = t.signature();

    write_template(dir.path(), "page.html", "v2 {name}", 2_000);
    assert_eq!(t.render(None, &v).unwrap(), "v2 x");
    assert_ne!(t.signature(), before);
    assert_eq!(compiler.compiles(), 2);
    // The artifact of the superseded body is dropped.
    assert_eq!(t.registry().len(), 1);

    // No further change: served from cache.
    assert_eq!(t.render(None, &v).unwrap(), "v2 x");
    assert_eq!(compiler.compiles(), 2);
}

#[test]
fn stamp_change_with_same_body_keeps_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_template(dir.path(), "page.html", "same {name}", 1_000);

    let compiler = CountingCompiler::new();
    let t = engine_with(&compiler, TemplateOptions::default().with_auto_reload(true))
        .template_file(&path)
        .unwrap();
    let v = vars(&[("name", Value::from("x"))]);
    assert_eq!(t.render(None, &v).unwrap(), "same x");

    write_template(dir.path(), "page.html", "same {name}", 5_000);
    assert_eq!(t.render(None, &v).unwrap(), "same x");
    // Same signature and variable names: same key, still cached in memory.
    assert_eq!(compiler.compiles(), 1);
}

#[test]
fn deleted_file_is_a_source_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_template(dir.path(), "page.html", "hi", 1_000);

    let compiler = CountingCompiler::new();
    let t = engine_with(&compiler, TemplateOptions::default().with_auto_reload(true))
        .template_file(&path)
        .unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(
        t.render(None, &vars(&[])),
        Err(RenderError::SourceRead { .. })
    ));
}

#[test]
fn missing_file_fails_at_creation() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = CountingCompiler::new();
    let err = engine_with(&compiler, TemplateOptions::default())
        .template_file(dir.path().join("absent.html"))
        .unwrap_err();
    assert!(matches!(err, RenderError::SourceRead { .. }));
}
