//! CLDR plural categories and counts.
//!
//! Category selection is delegated to the CLDR cardinal tables shipped with
//! `intl_pluralrules`. Tags the tables do not know exactly (`en-US`) fall back
//! to their primary language; languages missing from the tables entirely
//! always select `other`.

use crate::i18n::{I18nError, LanguageTag};
use intl_pluralrules::{operands::PluralOperands, PluralRuleType, PluralRules};
use serde::Serialize;
use std::fmt;

/// A CLDR plural category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub const ALL: [PluralCategory; 6] = [
        PluralCategory::Zero,
        PluralCategory::One,
        PluralCategory::Two,
        PluralCategory::Few,
        PluralCategory::Many,
        PluralCategory::Other,
    ];

    /// Lower-case key used in message files.
    pub fn as_str(&self) -> &'static str {
        match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }

    /// Parse a message file key, case-insensitively.
    pub fn from_key(key: &str) -> Option<PluralCategory> {
        PluralCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<intl_pluralrules::PluralCategory> for PluralCategory {
    fn from(category: intl_pluralrules::PluralCategory) -> Self {
        use intl_pluralrules::PluralCategory as Cldr;
        match category {
            Cldr::ZERO => PluralCategory::Zero,
            Cldr::ONE => PluralCategory::One,
            Cldr::TWO => PluralCategory::Two,
            Cldr::FEW => PluralCategory::Few,
            Cldr::MANY => PluralCategory::Many,
            Cldr::OTHER => PluralCategory::Other,
        }
    }
}

/// The number a plural message is selected by.
///
/// Kept in its textual form so that decimals such as `"1.50"` keep their
/// visible fraction digits, which CLDR rules depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralCount(String);

impl PluralCount {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn operands(&self) -> Result<PluralOperands, I18nError> {
        PluralOperands::try_from(self.0.trim())
            .map_err(|_| I18nError::InvalidPluralCount(self.0.clone()))
    }
}

impl fmt::Display for PluralCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! plural_count_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PluralCount {
                fn from(value: $ty) -> Self {
                    PluralCount(value.to_string())
                }
            }
        )*
    };
}

plural_count_from_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for PluralCount {
    fn from(value: f64) -> Self {
        PluralCount(value.to_string())
    }
}

impl From<&str> for PluralCount {
    fn from(value: &str) -> Self {
        PluralCount(value.to_string())
    }
}

impl From<String> for PluralCount {
    fn from(value: String) -> Self {
        PluralCount(value)
    }
}

/// Cardinal plural rules for one language.
pub struct PluralSelector {
    rules: Option<PluralRules>,
}

impl PluralSelector {
    /// Look up the CLDR table for `tag`, then for its primary language.
    pub fn for_language(tag: &LanguageTag) -> PluralSelector {
        let rules = PluralRules::create(tag.as_langid().clone(), PluralRuleType::CARDINAL)
            .or_else(|_| {
                PluralRules::create(tag.primary().as_langid().clone(), PluralRuleType::CARDINAL)
            })
            .ok();
        PluralSelector { rules }
    }

    /// Whether a CLDR table was found for the language.
    pub fn has_rules(&self) -> bool {
        self.rules.is_some()
    }

    /// Select the category for `count`.
    pub fn select(&self, count: &PluralCount) -> Result<PluralCategory, I18nError> {
        let operands = count.operands()?;
        match &self.rules {
            Some(rules) => rules
                .select(operands)
                .map(PluralCategory::from)
                .map_err(|_| I18nError::InvalidPluralCount(count.0.clone())),
            None => Ok(PluralCategory::Other),
        }
    }
}

impl fmt::Debug for PluralSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluralSelector")
            .field("has_rules", &self.has_rules())
            .finish()
    }
}
