//! Formatter factory and layout cache.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use recfmt_encoding::{Charset, PackSettings};
use tracing::{debug, info};

use crate::config::{ConfigError, RecfmtConfig};
use crate::convertor::ConvertorRegistry;
use crate::error::SyntaxError;
use crate::formatter::FixedLengthFormatter;
use crate::layout::{parse_layout_file, CompiledLayout, LayoutDefinition};

static GLOBAL: OnceLock<FormatterFactory> = OnceLock::new();

/// Creates formatters from layout files.
///
/// Clones share the layout cache and the cache switch. Parsed layouts are
/// cached; converters are bound fresh for every formatter.
#[derive(Debug, Clone)]
pub struct FormatterFactory {
    cache: Arc<DashMap<PathBuf, Arc<LayoutDefinition>>>,
    cache_enabled: Arc<AtomicBool>,
    registry: Arc<ConvertorRegistry>,
    default_charset: Charset,
    pack_defaults: Option<PackSettings>,
}

impl Default for FormatterFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatterFactory {
    /// Factory with the built-in converters, UTF-8 default charset and the
    /// cache enabled.
    pub fn new() -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            cache_enabled: Arc::new(AtomicBool::new(true)),
            registry: Arc::new(ConvertorRegistry::with_builtins()),
            default_charset: Charset::default(),
            pack_defaults: None,
        }
    }

    /// Factory configured from a [`RecfmtConfig`].
    pub fn from_config(config: &RecfmtConfig) -> Result<Self, ConfigError> {
        let factory = Self::new()
            .with_default_charset(config.text_encoding()?)
            .with_pack_defaults(config.pack_settings()?);
        factory.set_cache_layout_file_definition(config.cache_layouts);
        Ok(factory)
    }

    /// The process-wide factory.
    pub fn global() -> &'static FormatterFactory {
        GLOBAL.get_or_init(FormatterFactory::new)
    }

    /// Replace the converter registry.
    pub fn with_registry(mut self, registry: ConvertorRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Charset for layouts without `text-encoding`.
    pub fn with_default_charset(mut self, charset: Charset) -> Self {
        self.default_charset = charset;
        self
    }

    /// Sign nibbles used instead of the charset convention.
    pub fn with_pack_defaults(mut self, pack: Option<PackSettings>) -> Self {
        self.pack_defaults = pack;
        self
    }

    /// Enable or disable the layout cache. Disabling also clears it.
    pub fn set_cache_layout_file_definition(&self, enabled: bool) -> &Self {
        self.cache_enabled.store(enabled, Ordering::Relaxed);
        if !enabled {
            self.cache.clear();
        }
        self
    }

    /// Whether the layout cache is enabled.
    pub fn is_cache_enabled(&self) -> bool {
        self.cache_enabled.load(Ordering::Relaxed)
    }

    /// Create a formatter for `layout_path`. The layout is compiled by
    /// [`FixedLengthFormatter::initialize`].
    pub fn create_formatter(&self, layout_path: impl AsRef<Path>) -> FixedLengthFormatter {
        FixedLengthFormatter::new(self.clone(), layout_path.as_ref().to_path_buf())
    }

    /// Parse `layout_path` (or fetch it from the cache).
    pub fn layout_definition(
        &self,
        layout_path: &Path,
    ) -> Result<Arc<LayoutDefinition>, SyntaxError> {
        if !self.is_cache_enabled() {
            return parse_layout_file(layout_path).map(Arc::new);
        }

        let key = cache_key(layout_path);
        if let Some(cached) = self.cache.get(&key) {
            debug!(path = %key.display(), "layout cache hit");
            return Ok(Arc::clone(cached.value()));
        }

        debug!(path = %key.display(), "layout cache miss");
        let parsed = Arc::new(parse_layout_file(layout_path)?);
        let entry = self.cache.entry(key).or_insert(parsed);
        Ok(Arc::clone(entry.value()))
    }

    /// Parse and bind `layout_path`.
    pub fn compile(&self, layout_path: &Path) -> Result<CompiledLayout, SyntaxError> {
        let definition = self.layout_definition(layout_path)?;
        let compiled = CompiledLayout::bind(
            definition,
            &self.registry,
            self.default_charset,
            self.pack_defaults,
        )?;
        info!(
            path = %layout_path.display(),
            record_length = compiled.record_length(),
            fields = compiled.fields().len(),
            "compiled layout"
        );
        Ok(compiled)
    }

    /// Drop every cached layout.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Paths currently in the cache.
    pub fn cached_layouts(&self) -> Vec<PathBuf> {
        self.cache.iter().map(|e| e.key().clone()).collect()
    }
}

/// Canonical path when it resolves, the path as given otherwise.
fn cache_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const LAYOUT: &str = "file-type: \"Fixed\"\nrecord-length: 4\n[R]\n1 a X(4)\n";

    fn layout_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_cache_hit_returns_same_definition() {
        let dir = tempfile::tempdir().unwrap();
        let path = layout_file(&dir, "a.fmt", LAYOUT);
        let factory = FormatterFactory::new();

        let first = factory.layout_definition(&path).unwrap();
        fs::write(&path, "garbage").unwrap();
        let second = factory.layout_definition(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.cached_layouts().len(), 1);

        factory.clear_cache();
        assert!(factory.cached_layouts().is_empty());
        assert!(factory.layout_definition(&path).is_err());
    }

    #[test]
    fn test_cache_disabled_rereads() {
        let dir = tempfile::tempdir().unwrap();
        let path = layout_file(&dir, "a.fmt", LAYOUT);
        let factory = FormatterFactory::new();
        factory.set_cache_layout_file_definition(false);

        let first = factory.layout_definition(&path).unwrap();
        let second = factory.layout_definition(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(factory.cached_layouts().is_empty());
    }

    #[test]
    fn test_clones_share_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = layout_file(&dir, "a.fmt", LAYOUT);
        let factory = FormatterFactory::new();
        let clone = factory.clone();
        clone.compile(&path).unwrap();
        assert_eq!(factory.cached_layouts().len(), 1);
    }

    #[test]
    fn test_compile_binds_fresh_converters() {
        let dir = tempfile::tempdir().unwrap();
        let path = layout_file(&dir, "a.fmt", LAYOUT);
        let factory = FormatterFactory::new();
        let a = factory.compile(&path).unwrap();
        let b = factory.compile(&path).unwrap();
        assert!(Arc::ptr_eq(a.definition(), b.definition()));
        let pa = a.fields()[0].convertor() as *const dyn crate::convertor::DataType as *const u8;
        let pb = b.fields()[0].convertor() as *const dyn crate::convertor::DataType as *const u8;
        assert_ne!(pa, pb);
    }

    #[test]
    fn test_syntax_error_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = layout_file(
            &dir,
            "format.fmt",
            "file-type: \"Fixed\"\nrecord-length: 10\n[Default]\n1 singleByteString X()\n",
        );
        let err = FormatterFactory::new().compile(&path).unwrap_err();
        assert!(err
            .message()
            .starts_with("parameter was not specified. parameter must be specified. convertor=[SingleByteCharacterString]."));
        assert!(err.file_path().unwrap().ends_with("format.fmt"));
        assert_eq!(err.line(), Some(4));
    }

    #[test]
    fn test_from_config() {
        let config = RecfmtConfig {
            cache_layouts: false,
            default_text_encoding: "IBM-037".to_string(),
            ..RecfmtConfig::default()
        };
        let factory = FormatterFactory::from_config(&config).unwrap();
        assert!(!factory.is_cache_enabled());

        let dir = tempfile::tempdir().unwrap();
        let path = layout_file(&dir, "a.fmt", LAYOUT);
        let compiled = factory.compile(&path).unwrap();
        assert!(compiled.charset().is_ebcdic());
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(FormatterFactory::global(), FormatterFactory::global()));
    }
}
