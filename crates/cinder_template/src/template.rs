//! Templates and the render path.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cinder_cache::{build_key, ArtifactRegistry, CompiledArtifact, DiskStore};
use cinder_common::{ContentHash, Variables};
use cinder_config::{RenderMode, TemplateOptions};
use cinder_diagnostics::map_failure;
use cinder_runtime::{execute, Builtins, Namespace};

use crate::compiler::{compile_artifact, DialectTable, TemplateCompiler};
use crate::error::{CompileError, RenderError};
use crate::macros::Macros;
use crate::source::{listing_path, SourceSnapshot, SourceState};

/// A compiled-on-demand template.
///
/// Created by an [`Engine`](crate::Engine) from a string or a file. Each
/// template owns its artifact registry, so independent templates never share
/// cache state. Templates are `Send + Sync`; concurrent renders are safe.
pub struct Template {
    source: SourceState,
    compiler: Arc<dyn TemplateCompiler>,
    dialects: Arc<DialectTable>,
    builtins: Arc<Builtins>,
    options: TemplateOptions,
    registry: ArtifactRegistry,
    disk: Option<DiskStore>,
}

impl Template {
    pub(crate) fn new(
        source: SourceState,
        compiler: Arc<dyn TemplateCompiler>,
        dialects: Arc<DialectTable>,
        builtins: Arc<Builtins>,
        options: TemplateOptions,
    ) -> Self {
        let mut registry = ArtifactRegistry::new(options.compile_policy);
        let disk = match (&options.cachedir, source.path()) {
            (Some(cachedir), Some(path)) => Some(DiskStore::new(cachedir, path)),
            _ => None,
        };
        if let Some(disk) = &disk {
            registry = registry.with_store(Box::new(disk.clone()));
        }
        Self {
            source,
            compiler,
            dialects,
            builtins,
            options,
            registry,
            disk,
        }
    }

    /// Renders the whole template, or the macro `macro_name`.
    ///
    /// The cache key is derived from the names in `variables`, so each
    /// distinct set of names gets its own compiled artifact. Selectors the
    /// artifact declares override caller variables of the same name.
    pub fn render(
        &self,
        macro_name: Option<&str>,
        variables: &Variables,
    ) -> Result<String, RenderError> {
        let source = self.refresh()?;
        let key = build_key(source.signature, macro_name, variables.keys().map(String::as_str));
        let artifact = self.registry.get_or_compile(&key, source.stamp, || {
            self.compile(&source.body, macro_name)
        })?;
        self.execute(&artifact, variables)
    }

    /// Returns the macros view of this template.
    pub fn macros(&self) -> Macros<'_> {
        Macros::new(self)
    }

    /// Returns the current template body.
    pub fn body(&self) -> Arc<str> {
        self.source.snapshot().body
    }

    /// Returns the signature of the current body.
    pub fn signature(&self) -> ContentHash {
        self.source.snapshot().signature
    }

    /// Returns the template file, for file-bound templates.
    pub fn path(&self) -> Option<&Path> {
        self.source.path()
    }

    /// Returns the options this template was created with.
    pub fn options(&self) -> &TemplateOptions {
        &self.options
    }

    /// Returns the artifact registry backing this template.
    pub fn registry(&self) -> &ArtifactRegistry {
        &self.registry
    }

    /// Returns the identity used in diagnostics:
    /// `<TemplateFile {path}>` or `<Template {signature}>`.
    pub fn identity(&self) -> String {
        match self.source.path() {
            Some(path) => format!("<TemplateFile {}>", path.display()),
            None => format!("<Template {}>", self.signature()),
        }
    }

    /// Runs the reload check and drops artifacts of a superseded body.
    fn refresh(&self) -> Result<SourceSnapshot, RenderError> {
        let (snapshot, reloaded) = self.source.refresh()?;
        if reloaded {
            let dropped = self.registry.retain_signature(snapshot.signature);
            tracing::debug!(dropped, "dropped artifacts of the previous template body");
            if let (Some(disk), Some(stamp)) = (&self.disk, snapshot.stamp) {
                if let Err(e) = disk.gc(stamp) {
                    tracing::warn!(error = %e, "failed to collect stale persisted artifacts");
                }
            }
        }
        Ok(snapshot)
    }

    fn compile(&self, body: &str, macro_name: Option<&str>) -> Result<CompiledArtifact, CompileError> {
        let artifact = compile_artifact(
            self.compiler.as_ref(),
            body,
            &self.dialects,
            &self.options.default_dialect,
            macro_name,
        )
        .map_err(|e| e.with_excerpt(body, &self.identity()))?;

        if self.options.write_source {
            if let Some(path) = self.source.path() {
                write_listing(path, &artifact);
            }
        }
        Ok(artifact)
    }

    fn execute(&self, artifact: &CompiledArtifact, variables: &Variables) -> Result<String, RenderError> {
        let variables = if artifact.selectors.is_empty() {
            Cow::Borrowed(variables)
        } else {
            let mut merged = variables.clone();
            merged.extend(artifact.selectors.iter().map(|(k, v)| (k.clone(), v.clone())));
            Cow::Owned(merged)
        };
        let namespace = Namespace::new(&variables, &artifact.globals, &self.builtins);

        match execute(&artifact.program, &namespace) {
            Ok(out) => Ok(out),
            Err(e) if self.options.mode == RenderMode::Diagnostic && !e.has_context() => {
                let context = map_failure(&self.identity(), &artifact.annotations, e.line, &e.frames);
                tracing::debug!(line = e.line, mapped = context.is_mapped(), "mapped render failure");
                Err(e.with_context(context).into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn write_listing(path: &Path, artifact: &CompiledArtifact) {
    let target: PathBuf = listing_path(path);
    if let Err(e) = std::fs::write(&target, artifact.program.listing()) {
        tracing::warn!(path = %target.display(), error = %e, "failed to write generated source listing");
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("identity", &self.identity())
            .field("options", &self.options)
            .field("registry", &self.registry)
            .finish()
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}
