//! Message sources and the walker that turns them into locale-tagged files.
//!
//! A [`Source`] is any hierarchical tree of bytes: a directory on disk
//! ([`DirSource`]), an archive compiled into the binary ([`EmbeddedSource`])
//! or an in-memory map ([`MemorySource`]). A [`Loader`] pairs a source with a
//! path filter and loader-scoped decoders, and [`walk`] visits its files in
//! lexical order.
//!
//! File names follow `<name>.<lang>.<format>` or `<lang>.<format>`:
//! `hello.en.json`, `zh-Hans.yaml`, `admin/errors.uk.toml`.

use crate::i18n::format::UnmarshalFn;
use crate::i18n::{I18nError, LanguageTag};
use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// A hierarchical tree of message files.
pub trait Source: Send + Sync {
    /// Human-readable description used in logs.
    fn describe(&self) -> String;

    /// Relative paths of every leaf, `/`-separated.
    fn list(&self) -> Result<Vec<String>, I18nError>;

    /// Bytes of the leaf at `path` (as returned by [`Source::list`]).
    fn read(&self, path: &str) -> Result<Cow<'_, [u8]>, I18nError>;
}

fn unreadable(path: impl Into<String>, source: io::Error) -> I18nError {
    I18nError::SourceUnreadable {
        path: path.into(),
        source,
    }
}

// ==================== Directory Source ====================

/// Files under a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Source for DirSource {
    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }

    fn list(&self) -> Result<Vec<String>, I18nError> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| self.root.display().to_string());
                unreadable(path, io::Error::from(e))
            })?;
            if entry.file_type().is_dir() {
                continue;
            }
            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            let joined = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            paths.push(joined);
        }
        Ok(paths)
    }

    fn read(&self, path: &str) -> Result<Cow<'_, [u8]>, I18nError> {
        let full = self.root.join(path);
        std::fs::read(&full)
            .map(Cow::Owned)
            .map_err(|e| unreadable(full.display().to_string(), e))
    }
}

// ==================== Embedded Source ====================

/// Files compiled into the binary with `#[derive(RustEmbed)]`.
///
/// An optional prefix restricts the walk to one sub-directory of the
/// archive; paths handed to the walker are relative to it.
pub struct EmbeddedSource<E: RustEmbed> {
    prefix: String,
    _archive: PhantomData<fn() -> E>,
}

impl<E: RustEmbed> EmbeddedSource<E> {
    pub fn new() -> Self {
        Self {
            prefix: String::new(),
            _archive: PhantomData,
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into().trim_matches('/').to_string();
        if !prefix.is_empty() {
            prefix.push('/');
        }
        Self {
            prefix,
            _archive: PhantomData,
        }
    }
}

impl<E: RustEmbed> Default for EmbeddedSource<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: RustEmbed> fmt::Debug for EmbeddedSource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedSource")
            .field("archive", &std::any::type_name::<E>())
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl<E: RustEmbed> Source for EmbeddedSource<E> {
    fn describe(&self) -> String {
        let name = std::any::type_name::<E>();
        let short = name.rsplit("::").next().unwrap_or(name);
        if self.prefix.is_empty() {
            format!("embedded {}", short)
        } else {
            format!("embedded {}/{}", short, self.prefix.trim_end_matches('/'))
        }
    }

    fn list(&self) -> Result<Vec<String>, I18nError> {
        let mut paths: Vec<String> = E::iter()
            .filter_map(|name| {
                name.strip_prefix(self.prefix.as_str())
                    .map(|rest| rest.to_string())
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn read(&self, path: &str) -> Result<Cow<'_, [u8]>, I18nError> {
        let full = format!("{}{}", self.prefix, path);
        E::get(&full)
            .map(|file| file.data)
            .ok_or_else(|| {
                unreadable(
                    full.clone(),
                    io::Error::new(io::ErrorKind::NotFound, "not in embedded archive"),
                )
            })
    }
}

// ==================== Memory Source ====================

/// Files held in memory, mostly for tests and generated catalogs.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }
}

impl Source for MemorySource {
    fn describe(&self) -> String {
        format!("memory ({} files)", self.files.len())
    }

    fn list(&self) -> Result<Vec<String>, I18nError> {
        Ok(self.files.keys().cloned().collect())
    }

    fn read(&self, path: &str) -> Result<Cow<'_, [u8]>, I18nError> {
        self.files
            .get(path)
            .map(|bytes| Cow::Borrowed(bytes.as_slice()))
            .ok_or_else(|| unreadable(path, io::Error::from(io::ErrorKind::NotFound)))
    }
}

// ==================== Path Filter ====================

/// Decides which leaf paths are skipped by the walker.
#[derive(Clone, Default)]
pub enum PathFilter {
    /// Skip paths whose file name has no extension (marker files, `LICENSE`).
    #[default]
    NoExtension,
    /// Skip paths for which the predicate returns `true`.
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl PathFilter {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        PathFilter::Custom(Arc::new(f))
    }

    /// Whether `path` should be skipped.
    pub fn skips(&self, path: &str) -> bool {
        match self {
            PathFilter::NoExtension => {
                let name = file_name(path);
                !name.contains('.') || (name.starts_with('.') && name.matches('.').count() == 1)
            }
            PathFilter::Custom(predicate) => predicate(path),
        }
    }
}

impl fmt::Debug for PathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathFilter::NoExtension => f.write_str("NoExtension"),
            PathFilter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

// ==================== Loader ====================

/// A source together with how to walk it.
pub struct Loader {
    source: Box<dyn Source>,
    filter: PathFilter,
    formats: Vec<(String, UnmarshalFn)>,
}

impl Loader {
    pub fn new(source: impl Source + 'static) -> Self {
        Self {
            source: Box::new(source),
            filter: PathFilter::default(),
            formats: Vec::new(),
        }
    }

    /// Loader over a directory on disk.
    pub fn dir(root: impl Into<PathBuf>) -> Self {
        Self::new(DirSource::new(root))
    }

    /// Loader over a `RustEmbed` archive.
    pub fn embedded<E: RustEmbed + 'static>() -> Self {
        Self::new(EmbeddedSource::<E>::new())
    }

    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Decoder used for `format` files, registered before this loader walks.
    pub fn with_format(mut self, format: impl Into<String>, decoder: UnmarshalFn) -> Self {
        self.formats.push((format.into(), decoder));
        self
    }

    pub fn source(&self) -> &dyn Source {
        self.source.as_ref()
    }

    pub fn formats(&self) -> &[(String, UnmarshalFn)] {
        &self.formats
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("source", &self.source.describe())
            .field("filter", &self.filter)
            .field(
                "formats",
                &self.formats.iter().map(|(f, _)| f.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ==================== Walker ====================

/// One locale-tagged message file found by [`walk`].
#[derive(Debug, Clone)]
pub struct SourceFile<'a> {
    pub path: String,
    pub format: String,
    pub language: LanguageTag,
    pub bytes: Cow<'a, [u8]>,
}

/// Derive `(language, format)` from a file name.
///
/// The format is the last dot-delimited segment and the language the one
/// before it.
pub fn locale_of(path: &str) -> Result<(LanguageTag, String), I18nError> {
    let name = file_name(path);
    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
        return Err(I18nError::InvalidLocaleFilename {
            path: path.to_string(),
            reason: "expected <name>.<lang>.<format> or <lang>.<format>".to_string(),
        });
    }

    let format = segments[segments.len() - 1].to_ascii_lowercase();
    let raw_lang = segments[segments.len() - 2];
    let language = LanguageTag::parse(raw_lang).map_err(|e| I18nError::InvalidLocaleFilename {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    Ok((language, format))
}

/// Visit every qualifying file of `loader` in lexical path order.
///
/// The first error, whether from a file name or from `visit`, stops the walk.
pub fn walk<F>(loader: &Loader, mut visit: F) -> Result<usize, I18nError>
where
    F: FnMut(SourceFile<'_>) -> Result<(), I18nError>,
{
    let mut paths = loader.source.list()?;
    paths.sort();

    let mut visited = 0;
    for path in paths {
        if loader.filter.skips(&path) {
            continue;
        }
        let (language, format) = locale_of(&path)?;
        let bytes = loader.source.read(&path)?;
        visit(SourceFile {
            path,
            format,
            language,
            bytes,
        })?;
        visited += 1;
    }
    Ok(visited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths_of(loader: &Loader) -> Result<Vec<(String, String, String)>, I18nError> {
        let mut seen = Vec::new();
        walk(loader, |file| {
            seen.push((file.path, file.language.to_string(), file.format));
            Ok(())
        })?;
        Ok(seen)
    }

    // ==================== File Name Tests ====================

    #[test]
    fn test_locale_of_name_lang_format() {
        let (lang, format) = locale_of("hello.en.json").unwrap();
        assert_eq!(lang.to_string(), "en");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_locale_of_lang_format() {
        let (lang, format) = locale_of("nested/dir/zh-Hans.YAML").unwrap();
        assert_eq!(lang.to_string(), "zh-Hans");
        assert_eq!(format, "yaml");
    }

    #[test]
    fn test_locale_of_missing_locale_segment() {
        let err = locale_of("hello.json").unwrap_err();
        assert!(matches!(err, I18nError::InvalidLocaleFilename { .. }));
        assert!(err.to_string().contains("hello.json"));
    }

    #[test]
    fn test_locale_of_unregistered_language() {
        for path in ["faq.json", "ui.json", "docs/faq.json"] {
            let err = locale_of(path).unwrap_err();
            assert!(matches!(err, I18nError::InvalidLocaleFilename { .. }), "{}", path);
        }
    }

    #[test]
    fn test_locale_of_no_extension() {
        assert!(locale_of("README").is_err());
    }

    // ==================== Filter Tests ====================

    #[test]
    fn test_default_filter_skips_extensionless() {
        let filter = PathFilter::default();
        assert!(filter.skips("README"));
        assert!(filter.skips("dir/.keep"));
        assert!(!filter.skips("dir/en.json"));
    }

    #[test]
    fn test_custom_filter() {
        let filter = PathFilter::custom(|path| path.starts_with("drafts/"));
        assert!(filter.skips("drafts/en.json"));
        assert!(!filter.skips("en.json"));
    }

    // ==================== Walk Tests ====================

    #[test]
    fn test_walk_memory_source_in_lexical_order() {
        let source = MemorySource::new()
            .with_file("b/hello.zh.json", "{}")
            .with_file("a/hello.en.json", "{}")
            .with_file("LICENSE", "text");
        let seen = paths_of(&Loader::new(source)).unwrap();
        assert_eq!(
            seen,
            vec![
                ("a/hello.en.json".to_string(), "en".to_string(), "json".to_string()),
                ("b/hello.zh.json".to_string(), "zh".to_string(), "json".to_string()),
            ]
        );
    }

    #[test]
    fn test_walk_fails_on_malformed_name() {
        let source = MemorySource::new()
            .with_file("a.en.json", "{}")
            .with_file("hello.json", "{}");
        let err = paths_of(&Loader::new(source)).unwrap_err();
        assert!(matches!(err, I18nError::InvalidLocaleFilename { .. }));
    }

    #[test]
    fn test_walk_visit_error_aborts() {
        let source = MemorySource::new()
            .with_file("a.en.json", "{}")
            .with_file("b.en.json", "{}");
        let mut calls = 0;
        let result = walk(&Loader::new(source), |_| {
            calls += 1;
            Err(I18nError::UnsupportedFormat {
                format: "json".to_string(),
                path: "a.en.json".to_string(),
            })
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_walk_counts_visited_files() {
        let source = MemorySource::new()
            .with_file("a.en.json", "{}")
            .with_file("marker", "");
        assert_eq!(walk(&Loader::new(source), |_| Ok(())).unwrap(), 1);
    }

    #[test]
    fn test_dir_source_recurses() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        std::fs::write(dir.path().join("en.json"), "{}").unwrap();
        std::fs::write(dir.path().join("nested/deeper/app.uk.yaml"), "{}").unwrap();
        std::fs::write(dir.path().join("nested/.gitkeep"), "").unwrap();

        let seen = paths_of(&Loader::dir(dir.path())).unwrap();
        let paths: Vec<&str> = seen.iter().map(|(p, _, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["en.json", "nested/deeper/app.uk.yaml"]);
    }

    #[test]
    fn test_dir_source_reads_bytes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("hello.en.json"), r#"{"Hello":"hello"}"#).unwrap();
        let source = DirSource::new(dir.path());
        let bytes = source.read("hello.en.json").unwrap();
        assert_eq!(bytes.as_ref(), br#"{"Hello":"hello"}"#);
    }

    #[test]
    fn test_dir_source_missing_root_is_unreadable() {
        let source = DirSource::new("/definitely/not/here");
        let err = source.list().unwrap_err();
        assert!(matches!(err, I18nError::SourceUnreadable { .. }));
    }

    #[test]
    fn test_memory_source_missing_file() {
        let err = MemorySource::new().read("en.json").unwrap_err();
        assert!(matches!(err, I18nError::SourceUnreadable { .. }));
    }
}
