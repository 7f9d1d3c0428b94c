//! Catalog consistency checks.
//!
//! Compares every loaded language against the default language:
//! - ids missing from a language (served through fallback),
//! - ids only a non-default language defines (never reachable through fallback),
//! - placeholders a translation uses that the default text does not,
//!   or drops,
//! - definitions without any text.
//!
//! Nothing here is fatal to the engine; callers decide what to do with the
//! report. The demo server logs it at startup.

use crate::i18n::catalog::Catalog;
use crate::i18n::LanguageTag;
use std::collections::BTreeSet;

/// Validation report containing errors and warnings about a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Problems that change what callers see (e.g. `<no value>` in output)
    pub errors: Vec<String>,

    /// Gaps that fallback papers over
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Create a new empty validation report
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if the report has any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the report is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for loaded catalogs.
pub struct CatalogValidator;

impl CatalogValidator {
    pub fn validate(catalog: &Catalog) -> ValidationReport {
        let mut report = ValidationReport::new();
        let default = catalog.default_language();
        let default_ids: BTreeSet<&str> = catalog.message_ids(default).into_iter().collect();

        Self::check_empty(catalog, default, &mut report);

        for language in catalog.languages() {
            if &language == default {
                continue;
            }
            Self::check_empty(catalog, &language, &mut report);

            let ids: BTreeSet<&str> = catalog.message_ids(&language).into_iter().collect();

            let untranslated: Vec<&str> = default_ids.difference(&ids).copied().collect();
            if !untranslated.is_empty() {
                report.warnings.push(format!(
                    "Untranslated in '{}': {:?}",
                    language, untranslated
                ));
            }

            let orphans: Vec<&str> = ids.difference(&default_ids).copied().collect();
            if !orphans.is_empty() {
                report.warnings.push(format!(
                    "Not in default language '{}' but defined in '{}': {:?}",
                    default, language, orphans
                ));
            }

            for id in ids.intersection(&default_ids) {
                Self::check_placeholders(catalog, &language, id, &mut report);
            }
        }

        report
    }

    fn check_empty(catalog: &Catalog, language: &LanguageTag, report: &mut ValidationReport) {
        for id in catalog.message_ids(language) {
            let has_text = catalog
                .get_definition(language, id)
                .map(|definition| definition.categories().next().is_some())
                .unwrap_or(false);
            if !has_text {
                report
                    .errors
                    .push(format!("'{}' in '{}' has no text", id, language));
            }
        }
    }

    fn check_placeholders(
        catalog: &Catalog,
        language: &LanguageTag,
        id: &str,
        report: &mut ValidationReport,
    ) {
        let (Some(translated), Some(original)) = (
            catalog.get_definition(language, id),
            catalog.get_definition(catalog.default_language(), id),
        ) else {
            return;
        };

        let expected: BTreeSet<String> = original.placeholders().into_iter().collect();
        let actual: BTreeSet<String> = translated.placeholders().into_iter().collect();

        let extra: Vec<&String> = actual.difference(&expected).collect();
        if !extra.is_empty() {
            report.errors.push(format!(
                "'{}' in '{}' uses placeholders the default text does not: {:?}",
                id, language, extra
            ));
        }

        let dropped: Vec<&String> = expected.difference(&actual).collect();
        if !dropped.is_empty() {
            report.warnings.push(format!(
                "'{}' in '{}' drops placeholders: {:?}",
                id, language, dropped
            ));
        }
    }
}
