//! Predicted toolchain behavior for one specification.
//!
//! The serde encoding of [`Outcome`] is also the input to the regression
//! digest, so variant names and field order are part of the recorded fixture.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outcome {
    pub verdict: Verdict,
    pub warnings: BTreeSet<Warning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Success(SuccessMode),
    Diagnostic(Diagnostic),
}

/// Which definition ends up being called from both translation units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessMode {
    /// Each unit calls its own body: the program prints `1` then `2`.
    UseInlineDefinition,
    /// One out-of-line copy wins at link time; file1's copy is first on the
    /// command line, so both calls print `1`.
    LinkOnceEither,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnostic {
    InlineNotSupported,
    MultipleStorageClasses,
    ConflictingSpecifiers,
    DuplicateInline,
    StaticInconsistent(StaticStyle),
    GnuInlineInconsistent(GnuInlineStyle),
    MultipleDefinition,
    UndefinedReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticStyle {
    /// "static declaration of 'foo' follows non-static declaration"
    Plain,
    /// "'int foo()' was declared 'extern' and later 'static'"
    ExternQualified,
    /// Plain wording plus an "inline function declared but never defined" warning.
    NeverDefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GnuInlineStyle {
    /// C: "'gnu_inline' attribute present on 'foo'" ... "but not here"
    Present,
    /// C++: the definition adds the attribute.
    RedeclaredWith,
    /// C++: the prototype had the attribute, the definition drops it.
    RedeclaredWithout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    GnuInlineIgnored,
    AlwaysInlineIgnored,
    InlineNeverDefined,
}

impl Outcome {
    pub fn new(verdict: Verdict, warnings: BTreeSet<Warning>) -> Self {
        Self { verdict, warnings }
    }
}

impl Diagnostic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnostic::InlineNotSupported => "inline_not_supported",
            Diagnostic::MultipleStorageClasses => "multiple_storage_classes",
            Diagnostic::ConflictingSpecifiers => "conflicting_specifiers",
            Diagnostic::DuplicateInline => "duplicate_inline",
            Diagnostic::StaticInconsistent(_) => "static_inconsistent",
            Diagnostic::GnuInlineInconsistent(_) => "gnu_inline_inconsistent",
            Diagnostic::MultipleDefinition => "multiple_definition",
            Diagnostic::UndefinedReference => "undefined_reference",
        }
    }
}

impl Warning {
    pub fn as_str(&self) -> &'static str {
        match self {
            Warning::GnuInlineIgnored => "gnu_inline_ignored",
            Warning::AlwaysInlineIgnored => "always_inline_ignored",
            Warning::InlineNeverDefined => "inline_never_defined",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verdict {
            Verdict::Success(SuccessMode::UseInlineDefinition) => {
                f.write_str("success(use_inline_definition)")?
            }
            Verdict::Success(SuccessMode::LinkOnceEither) => {
                f.write_str("success(link_once_either)")?
            }
            Verdict::Diagnostic(Diagnostic::StaticInconsistent(style)) => {
                write!(f, "static_inconsistent({style:?})")?
            }
            Verdict::Diagnostic(Diagnostic::GnuInlineInconsistent(style)) => {
                write!(f, "gnu_inline_inconsistent({style:?})")?
            }
            Verdict::Diagnostic(diagnostic) => f.write_str(diagnostic.as_str())?,
        }
        for warning in &self.warnings {
            write!(f, " +{}", warning.as_str())?;
        }
        Ok(())
    }
}
