//! Template factory holding the shared compile and render environment.

use std::path::PathBuf;
use std::sync::Arc;

use cinder_config::{EngineConfig, TemplateOptions};
use cinder_runtime::Builtins;

use crate::compiler::{Dialect, DialectTable, TemplateCompiler};
use crate::error::RenderError;
use crate::source::SourceState;
use crate::template::Template;

/// Creates templates that share a compiler backend, dialects, and builtins.
///
/// Cloning an engine is cheap. Templates created from it each own their
/// artifact registry.
#[derive(Clone)]
pub struct Engine {
    compiler: Arc<dyn TemplateCompiler>,
    dialects: Arc<DialectTable>,
    builtins: Arc<Builtins>,
    options: TemplateOptions,
}

impl Engine {
    /// Creates an engine with no dialects, the standard builtins, and
    /// default options.
    pub fn new(compiler: impl TemplateCompiler + 'static) -> Self {
        Self {
            compiler: Arc::new(compiler),
            dialects: Arc::new(DialectTable::new()),
            builtins: Arc::new(Builtins::standard()),
            options: TemplateOptions::default(),
        }
    }

    /// Creates an engine whose template options come from `config`.
    pub fn from_config(compiler: impl TemplateCompiler + 'static, config: &EngineConfig) -> Self {
        Self::new(compiler).with_options(config.template_options())
    }

    /// Registers an expression dialect under `name`.
    pub fn with_dialect(mut self, name: impl Into<String>, dialect: impl Dialect + 'static) -> Self {
        Arc::make_mut(&mut self.dialects).insert(name.into(), Arc::new(dialect));
        self
    }

    /// Registers every dialect in `dialects`, replacing same-named ones.
    pub fn with_dialects(mut self, dialects: DialectTable) -> Self {
        Arc::make_mut(&mut self.dialects).extend(dialects);
        self
    }

    /// Replaces the builtins visible to rendered templates.
    pub fn with_builtins(mut self, builtins: Builtins) -> Self {
        self.builtins = Arc::new(builtins);
        self
    }

    /// Replaces the default options for new templates.
    pub fn with_options(mut self, options: TemplateOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the default options for new templates.
    pub fn options(&self) -> &TemplateOptions {
        &self.options
    }

    /// Returns the registered dialects.
    pub fn dialects(&self) -> &DialectTable {
        &self.dialects
    }

    /// Creates a template from a string with the engine's options.
    pub fn template(&self, body: impl Into<String>) -> Template {
        self.template_with(body, self.options.clone())
    }

    /// Creates a template from a string with explicit options.
    pub fn template_with(&self, body: impl Into<String>, options: TemplateOptions) -> Template {
        let body: String = body.into();
        self.build(SourceState::inline(body), options)
    }

    /// Creates a template bound to a file with the engine's options.
    ///
    /// The file is read immediately; a missing or unreadable file is a
    /// [`RenderError::SourceRead`].
    pub fn template_file(&self, path: impl Into<PathBuf>) -> Result<Template, RenderError> {
        self.template_file_with(path, self.options.clone())
    }

    /// Creates a template bound to a file with explicit options.
    ///
    /// A relative path is resolved against the current directory once, here;
    /// reloads, the template identity, and the cache scope all use the
    /// absolute path.
    pub fn template_file_with(
        &self,
        path: impl Into<PathBuf>,
        options: TemplateOptions,
    ) -> Result<Template, RenderError> {
        let given = path.into();
        let path = std::path::absolute(&given).map_err(|e| RenderError::SourceRead {
            path: given.clone(),
            source: e,
        })?;
        let source = SourceState::file(path.clone(), options.auto_reload)?;
        tracing::debug!(path = %path.display(), "loaded template file");
        Ok(self.build(source, options))
    }

    fn build(&self, source: SourceState, options: TemplateOptions) -> Template {
        Template::new(
            source,
            Arc::clone(&self.compiler),
            Arc::clone(&self.dialects),
            Arc::clone(&self.builtins),
            options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubCompiler;
    use cinder_config::RenderMode;
    use cinder_runtime::Expr;

    struct Upper;

    impl Dialect for Upper {
        fn translate(&self, source: &str) -> Result<Expr, String> {
            Ok(Expr::lit(source.to_uppercase()))
        }
    }

    #[test]
    fn options_flow_into_templates() {
        let mut config = EngineConfig::default();
        config.engine.mode = RenderMode::Diagnostic;
        let engine = Engine::from_config(StubCompiler::default(), &config);
        let t = engine.template("x");
        assert_eq!(t.options().mode, RenderMode::Diagnostic);
        assert!(t.options().write_source);

        let fast = engine.template_with("x", TemplateOptions::default());
        assert_eq!(fast.options().mode, RenderMode::Fast);
    }

    #[test]
    fn dialects_registered() {
        let engine = Engine::new(StubCompiler::default()).with_dialect("upper", Upper);
        let clone = engine.clone().with_dialect("other", Upper);
        assert_eq!(engine.dialects().len(), 1);
        assert_eq!(clone.dialects().len(), 2);
        let expr = engine.dialects()["upper"].translate("abc").unwrap();
        assert_eq!(expr, Expr::lit("ABC"));
    }

    #[test]
    fn missing_file_is_source_read() {
        let dir = tempfile::tempdir().unwrap();
        let err = Engine::new(StubCompiler::default())
            .template_file(dir.path().join("absent.txt"))
            .unwrap_err();
        assert!(matches!(err, RenderError::SourceRead { .. }));
    }

    #[test]
    fn file_path_is_stored_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("..").join("page.txt");
        std::fs::write(dir.path().join("page.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let t = Engine::new(StubCompiler::default()).template_file(&path).unwrap();
        assert!(t.path().unwrap().is_absolute());
        assert!(t.identity().contains(&dir.path().display().to_string()));
    }

    #[test]
    fn empty_path_is_source_read() {
        let err = Engine::new(StubCompiler::default())
            .template_file("")
            .unwrap_err();
        assert!(matches!(err, RenderError::SourceRead { .. }));
    }
}
