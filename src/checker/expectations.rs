//! Outcome -> expected toolchain messages.
//!
//! This is the only place that knows GCC's diagnostic wording. When the
//! toolchain rewords a message, update the pattern here.
use crate::outcome::{Diagnostic, GnuInlineStyle, StaticStyle, SuccessMode, Verdict, Warning};

/// Translation units every compile-time diagnostic must be reported against.
pub(crate) const SOURCE_FILES: [&str; 2] = ["file1", "file2"];

/// Symbol named by linker diagnostics.
pub(crate) const SYMBOL: &str = "foo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Check {
    /// Each pattern must match the text of an `error:` line in every source
    /// file. An empty list still requires some error per file.
    CompileErrors(&'static [&'static str]),
    /// A linker line matching `<pattern> .*foo`.
    LinkError(&'static str),
    /// Exit 0 with exactly this stdout.
    Runs(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Expectation {
    pub(crate) check: Check,
    /// Warnings that accompany this diagnostic even though the oracle does not
    /// list them as separate warnings.
    pub(crate) implied_warnings: &'static [Warning],
    /// Compile errors may bring along warnings the oracle does not model, so
    /// the no-warning check is skipped.
    pub(crate) tolerates_unlisted_warnings: bool,
    /// Listed warnings the toolchain cannot emit alongside this diagnostic.
    pub(crate) unreachable_warnings: &'static [Warning],
}

/// `always_inline` is only diagnosed once a unit compiles.
const AFTER_ERRORS: &[Warning] = &[Warning::AlwaysInlineIgnored];

const fn compile(patterns: &'static [&'static str]) -> Expectation {
    Expectation {
        check: Check::CompileErrors(patterns),
        implied_warnings: &[],
        tolerates_unlisted_warnings: true,
        unreachable_warnings: AFTER_ERRORS,
    }
}

const fn link(pattern: &'static str) -> Expectation {
    Expectation {
        check: Check::LinkError(pattern),
        implied_warnings: &[],
        tolerates_unlisted_warnings: false,
        unreachable_warnings: &[],
    }
}

const fn runs(stdout: &'static str) -> Expectation {
    Expectation {
        check: Check::Runs(stdout),
        implied_warnings: &[],
        tolerates_unlisted_warnings: false,
        unreachable_warnings: &[],
    }
}

const STATIC_FOLLOWS_NON_STATIC: &str = "static declaration .* follows non-static declaration";

pub(crate) fn expectation_for(verdict: Verdict) -> Expectation {
    match verdict {
        Verdict::Success(SuccessMode::UseInlineDefinition) => runs("1\n2\n"),
        Verdict::Success(SuccessMode::LinkOnceEither) => runs("1\n1\n"),
        Verdict::Diagnostic(diagnostic) => match diagnostic {
            // Parsing stops before any attribute is processed.
            Diagnostic::InlineNotSupported => Expectation {
                unreachable_warnings: &[
                    Warning::GnuInlineIgnored,
                    Warning::AlwaysInlineIgnored,
                    Warning::InlineNeverDefined,
                ],
                ..compile(&[])
            },
            Diagnostic::MultipleStorageClasses => {
                compile(&["multiple storage classes .*declaration"])
            }
            // g++ drops the declaration before reading its attributes.
            Diagnostic::ConflictingSpecifiers => Expectation {
                unreachable_warnings: &[Warning::GnuInlineIgnored, Warning::AlwaysInlineIgnored],
                ..compile(&["conflicting specifiers in declaration"])
            },
            Diagnostic::DuplicateInline => compile(&["duplicate .inline"]),
            Diagnostic::StaticInconsistent(StaticStyle::Plain) => {
                compile(&[STATIC_FOLLOWS_NON_STATIC])
            }
            Diagnostic::StaticInconsistent(StaticStyle::ExternQualified) => {
                compile(&["was declared .extern. and later .static."])
            }
            Diagnostic::StaticInconsistent(StaticStyle::NeverDefined) => Expectation {
                implied_warnings: &[Warning::InlineNeverDefined],
                ..compile(&[STATIC_FOLLOWS_NON_STATIC])
            },
            Diagnostic::GnuInlineInconsistent(GnuInlineStyle::Present) => {
                compile(&["gnu_inline", ".gnu_inline. attribute present", "but not here"])
            }
            Diagnostic::GnuInlineInconsistent(GnuInlineStyle::RedeclaredWith) => {
                compile(&["gnu_inline", "redeclared inline with .gnu_inline. attribute"])
            }
            Diagnostic::GnuInlineInconsistent(GnuInlineStyle::RedeclaredWithout) => {
                compile(&["gnu_inline", "redeclared inline without .gnu_inline. attribute"])
            }
            Diagnostic::MultipleDefinition => link("multiple definition"),
            Diagnostic::UndefinedReference => link("undefined reference"),
        },
    }
}

/// Pattern matched against the text after `warning: `.
pub(crate) fn warning_pattern(warning: Warning) -> &'static str {
    match warning {
        Warning::GnuInlineIgnored => "gnu_inline.* attribute ignored",
        Warning::AlwaysInlineIgnored => ".always_inline. function might not be inlinable",
        Warning::InlineNeverDefined => "inline function .* declared but never defined",
    }
}
