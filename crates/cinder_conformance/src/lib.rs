//! Conformance test helpers for the cinder template engine.
//!
//! Builds engines over the brace backend, counts backend invocations so
//! tests can tell a cache hit from a compile, and writes template files with
//! controlled modification times.

#![warn(missing_docs)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use cinder_brace::{standard_dialects, BraceCompiler};
use cinder_common::{Value, Variables};
use cinder_config::TemplateOptions;
use cinder_template::{CompileError, CompilerOutput, DialectTable, Engine, TemplateCompiler};

/// The brace backend, counting how often it is invoked.
#[derive(Debug, Clone, Default)]
pub struct CountingCompiler {
    count: Arc<AtomicUsize>,
}

impl CountingCompiler {
    /// Creates a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of compiles so far, across all clones.
    pub fn compiles(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl TemplateCompiler for CountingCompiler {
    fn compile(
        &self,
        body: &str,
        dialects: &DialectTable,
        default_dialect: &str,
        macro_name: Option<&str>,
    ) -> Result<CompilerOutput, CompileError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        BraceCompiler.compile(body, dialects, default_dialect, macro_name)
    }
}

/// Creates a brace engine with the given options over `compiler`.
pub fn engine_with(compiler: &CountingCompiler, options: TemplateOptions) -> Engine {
    Engine::new(compiler.clone())
        .with_dialects(standard_dialects())
        .with_options(options)
}

/// Builds a variable map from name/value pairs.
pub fn vars(pairs: &[(&str, Value)]) -> Variables {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Writes `body` to `dir/name` and sets its mtime to `secs` after the epoch.
///
/// Explicit stamps keep reload detection independent of filesystem
/// timestamp granularity.
pub fn write_template(dir: &Path, name: &str, body: &str, secs: u64) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
    path
}

/// Counts persisted artifact files under `cachedir`.
pub fn persisted_artifacts(cachedir: &Path) -> usize {
    let Ok(scopes) = std::fs::read_dir(cachedir) else {
        return 0;
    };
    scopes
        .flatten()
        .filter_map(|scope| std::fs::read_dir(scope.path()).ok())
        .flat_map(|entries| entries.flatten())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "cpt"))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_compiler_counts() {
        let compiler = CountingCompiler::new();
        let engine = engine_with(&compiler, TemplateOptions::default());
        let t = engine.template("Hi {name}");
        let out = t.render(None, &vars(&[("name", Value::from("Bo"))])).unwrap();
        assert_eq!(out, "Hi Bo");
        assert_eq!(compiler.compiles(), 1);
    }

    #[test]
    fn write_template_sets_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path(), "t.html", "x", 42);
        let mtime = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(mtime, SystemTime::UNIX_EPOCH + Duration::from_secs(42));
    }

    #[test]
    fn no_cachedir_means_no_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(persisted_artifacts(&dir.path().join("missing")), 0);
    }
}
