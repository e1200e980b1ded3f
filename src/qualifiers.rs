//! Qualifier model for a function's prototype and definition.
//!
//! Qualifiers are parsed once into a closed token set so rule evaluation never
//! sees free-form text.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single qualifier as written in front of `int foo()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualifierToken {
    /// `inline`
    InlineKeyword,
    /// `__inline__`, accepted even by the pre-standard dialect.
    CompilerInlineKeyword,
    /// `__attribute__((gnu_inline))`
    GnuInlineAttribute,
    /// `__attribute__((always_inline))`
    AlwaysInlineAttribute,
    Static,
    Extern,
}

impl QualifierToken {
    /// Fixed universe, in the order the exhaustive domain assigns bits.
    pub const UNIVERSE: [QualifierToken; 6] = [
        QualifierToken::InlineKeyword,
        QualifierToken::CompilerInlineKeyword,
        QualifierToken::GnuInlineAttribute,
        QualifierToken::AlwaysInlineAttribute,
        QualifierToken::Static,
        QualifierToken::Extern,
    ];

    /// Source spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            QualifierToken::InlineKeyword => "inline",
            QualifierToken::CompilerInlineKeyword => "__inline__",
            QualifierToken::GnuInlineAttribute => "__attribute__((gnu_inline))",
            QualifierToken::AlwaysInlineAttribute => "__attribute__((always_inline))",
            QualifierToken::Static => "static",
            QualifierToken::Extern => "extern",
        }
    }

    /// One-letter code used in case summaries.
    pub fn summary_code(&self) -> char {
        match self {
            QualifierToken::InlineKeyword => 'i',
            QualifierToken::CompilerInlineKeyword => 'I',
            QualifierToken::GnuInlineAttribute => 'g',
            QualifierToken::AlwaysInlineAttribute => 'a',
            QualifierToken::Static => 's',
            QualifierToken::Extern => 'e',
        }
    }

    fn is_inline_spelling(&self) -> bool {
        matches!(
            self,
            QualifierToken::InlineKeyword | QualifierToken::CompilerInlineKeyword
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized qualifier {token:?} (expected one of inline, __inline__, __attribute__((gnu_inline)), __attribute__((always_inline)), static, extern)")]
pub struct QualifierParseError {
    pub token: String,
}

impl FromStr for QualifierToken {
    type Err = QualifierParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        QualifierToken::UNIVERSE
            .iter()
            .copied()
            .find(|token| token.as_str() == raw)
            .ok_or_else(|| QualifierParseError {
                token: raw.to_string(),
            })
    }
}

impl fmt::Display for QualifierToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualifiers in written order. Order and repetition are preserved because the
/// rendered source must match what a programmer would have typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifierSet {
    tokens: Vec<QualifierToken>,
}

impl QualifierSet {
    pub fn new(tokens: Vec<QualifierToken>) -> Self {
        Self { tokens }
    }

    pub fn contains(&self, token: QualifierToken) -> bool {
        self.tokens.contains(&token)
    }

    pub fn has_inline(&self) -> bool {
        self.contains(QualifierToken::InlineKeyword)
    }

    pub fn has_compiler_inline(&self) -> bool {
        self.contains(QualifierToken::CompilerInlineKeyword)
    }

    /// Either inline spelling is present.
    pub fn has_any_inline(&self) -> bool {
        self.tokens.iter().any(QualifierToken::is_inline_spelling)
    }

    pub fn has_gnu_inline_attribute(&self) -> bool {
        self.contains(QualifierToken::GnuInlineAttribute)
    }

    pub fn has_always_inline_attribute(&self) -> bool {
        self.contains(QualifierToken::AlwaysInlineAttribute)
    }

    pub fn is_static(&self) -> bool {
        self.contains(QualifierToken::Static)
    }

    pub fn is_extern(&self) -> bool {
        self.contains(QualifierToken::Extern)
    }

    pub fn has_duplicate_inline_spelling(&self) -> bool {
        self.has_inline() && self.has_compiler_inline()
    }

    /// True when the set is exactly `extern` and nothing else.
    pub fn is_extern_only(&self) -> bool {
        self.tokens == [QualifierToken::Extern]
    }

    pub fn summary(&self) -> String {
        self.tokens.iter().map(QualifierToken::summary_code).collect()
    }
}

impl FromStr for QualifierSet {
    type Err = QualifierParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let tokens = raw
            .split_whitespace()
            .map(QualifierToken::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tokens })
    }
}

impl fmt::Display for QualifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, token) in self.tokens.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            f.write_str(token.as_str())?;
        }
        Ok(())
    }
}

impl FromIterator<QualifierToken> for QualifierSet {
    fn from_iter<I: IntoIterator<Item = QualifierToken>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

/// Qualifiers on the forward declaration (if one is emitted) and on the
/// definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InliningSpecification {
    /// `None` means no forward declaration is rendered at all; `Some` of an
    /// empty set still renders a bare `int foo();`.
    pub prototype_qualifiers: Option<QualifierSet>,
    pub definition_qualifiers: QualifierSet,
}

impl InliningSpecification {
    pub fn new(prototype_qualifiers: Option<QualifierSet>, definition_qualifiers: QualifierSet) -> Self {
        Self {
            prototype_qualifiers,
            definition_qualifiers,
        }
    }

    /// Same qualifiers on the prototype and the definition.
    pub fn symmetric(qualifiers: QualifierSet) -> Self {
        Self {
            prototype_qualifiers: Some(qualifiers.clone()),
            definition_qualifiers: qualifiers,
        }
    }

    /// Definition only, no forward declaration.
    pub fn definition_only(qualifiers: QualifierSet) -> Self {
        Self {
            prototype_qualifiers: None,
            definition_qualifiers: qualifiers,
        }
    }

    /// Parse both sides from source spellings.
    pub fn parse(prototype: Option<&str>, definition: &str) -> Result<Self, QualifierParseError> {
        let prototype_qualifiers = prototype.map(QualifierSet::from_str).transpose()?;
        let definition_qualifiers = definition.parse()?;
        Ok(Self {
            prototype_qualifiers,
            definition_qualifiers,
        })
    }

    /// Qualifiers of the first declaration the compiler sees: the prototype,
    /// or the definition itself when no prototype is emitted.
    pub fn prototype(&self) -> &QualifierSet {
        self.prototype_qualifiers
            .as_ref()
            .unwrap_or(&self.definition_qualifiers)
    }

    pub fn definition(&self) -> &QualifierSet {
        &self.definition_qualifiers
    }

    pub fn summary(&self) -> String {
        let prototype = match &self.prototype_qualifiers {
            Some(set) => set.summary(),
            None => "-".to_string(),
        };
        format!("{};{}", prototype, self.definition_qualifiers.summary())
    }
}
