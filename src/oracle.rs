//! Decision oracle: predicts how GCC treats a qualifier combination.
//!
//! Rules are evaluated in priority order and the first match wins. The order
//! mirrors which diagnostic the compiler reports first when several apply.
//! Warnings ride along with the verdict and never change it.
use crate::outcome::{
    Diagnostic, GnuInlineStyle, Outcome, StaticStyle, SuccessMode, Verdict, Warning,
};
use crate::qualifiers::QualifierSet;
use crate::specification::{Compiler, LanguageStandard, OptimizationLevel, Specification};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The rule table has no entry for this point; never guessed.
    #[error("unknown case: no rule models {spec} ({reason})")]
    UnknownCase {
        spec: Box<Specification>,
        reason: &'static str,
    },
}

/// Per-side facts the rules read. Without a forward declaration the
/// definition is the first declaration, so `prototype` is the definition.
struct Sides<'a> {
    prototype: &'a QualifierSet,
    definition: &'a QualifierSet,
}

impl Sides<'_> {
    fn inline_prototype(&self) -> bool {
        self.prototype.has_any_inline()
    }

    fn inline_definition(&self) -> bool {
        self.definition.has_any_inline()
    }

    fn inline_specified(&self) -> bool {
        self.inline_prototype() || self.inline_definition()
    }

    fn gnu_inline(&self) -> bool {
        self.prototype.has_gnu_inline_attribute() || self.definition.has_gnu_inline_attribute()
    }

    fn always_inline(&self) -> bool {
        self.prototype.has_always_inline_attribute()
            || self.definition.has_always_inline_attribute()
    }

    fn is_static(&self) -> bool {
        self.prototype.is_static() || self.definition.is_static()
    }

    /// The definition is `static` but an earlier declaration was not.
    fn static_mismatch(&self) -> bool {
        !self.prototype.is_static() && self.definition.is_static()
    }

    fn storage_class_conflict(&self) -> bool {
        (self.prototype.is_static() && self.prototype.is_extern())
            || (self.definition.is_static() && self.definition.is_extern())
    }

    fn duplicate_inline(&self) -> bool {
        self.prototype.has_duplicate_inline_spelling()
            || self.definition.has_duplicate_inline_spelling()
    }

    fn uses_inline_keyword(&self) -> bool {
        self.prototype.has_inline() || self.definition.has_inline()
    }
}

/// Classify one specification.
pub fn classify(spec: &Specification) -> Result<Outcome, OracleError> {
    if spec.compiler != Compiler::Gcc {
        return Err(OracleError::UnknownCase {
            spec: Box::new(spec.clone()),
            reason: "only gcc diagnostics are modeled",
        });
    }

    let sides = Sides {
        prototype: spec.inlining.prototype(),
        definition: spec.inlining.definition(),
    };
    let mut warnings = gnu_inline_ignored(&sides);
    let verdict = decide(&sides, spec.language, spec.optimization, &mut warnings);
    Ok(Outcome::new(verdict, warnings))
}

/// `gnu_inline` is dropped from any declaration that carries no inline spelling.
fn gnu_inline_ignored(sides: &Sides<'_>) -> BTreeSet<Warning> {
    let mut warnings = BTreeSet::new();
    if [sides.prototype, sides.definition]
        .iter()
        .any(|side| side.has_gnu_inline_attribute() && !side.has_any_inline())
    {
        warnings.insert(Warning::GnuInlineIgnored);
    }
    warnings
}

fn decide(
    sides: &Sides<'_>,
    language: LanguageStandard,
    optimization: OptimizationLevel,
    warnings: &mut BTreeSet<Warning>,
) -> Verdict {
    let cpp = language.is_cpp();

    if !language.supports_inline_keyword() && sides.uses_inline_keyword() {
        return Verdict::Diagnostic(Diagnostic::InlineNotSupported);
    }

    if sides.storage_class_conflict() {
        return Verdict::Diagnostic(if cpp {
            Diagnostic::ConflictingSpecifiers
        } else {
            Diagnostic::MultipleStorageClasses
        });
    }

    if cpp && sides.duplicate_inline() {
        return Verdict::Diagnostic(Diagnostic::DuplicateInline);
    }

    // In C a static mismatch is reported, or tolerated, ahead of attribute drift.
    let gnu_inline_drift = sides.inline_prototype()
        && sides.inline_definition()
        && sides.prototype.has_gnu_inline_attribute()
            != sides.definition.has_gnu_inline_attribute();
    if gnu_inline_drift && (cpp || !sides.static_mismatch()) {
        let style = if !cpp {
            GnuInlineStyle::Present
        } else if sides.prototype.has_gnu_inline_attribute() {
            GnuInlineStyle::RedeclaredWithout
        } else {
            GnuInlineStyle::RedeclaredWith
        };
        return Verdict::Diagnostic(Diagnostic::GnuInlineInconsistent(style));
    }

    if sides.static_mismatch() {
        if !static_mismatch_allowed(sides, language) {
            return Verdict::Diagnostic(Diagnostic::StaticInconsistent(static_style(
                sides, language,
            )));
        }
        if language.is_c99_inline_family()
            && sides.inline_specified()
            && !sides.prototype.has_gnu_inline_attribute()
        {
            warnings.insert(Warning::InlineNeverDefined);
        }
    }

    // Only reported once the translation unit compiles, and only when no
    // declaration of the function is inline.
    if sides.always_inline() && !sides.inline_specified() {
        warnings.insert(Warning::AlwaysInlineIgnored);
    }

    if sides.is_static() {
        return Verdict::Success(SuccessMode::UseInlineDefinition);
    }

    if !sides.inline_specified() {
        return Verdict::Diagnostic(Diagnostic::MultipleDefinition);
    }

    if language.is_gnu89_inline_family() {
        return gnu89_inline(sides, optimization);
    }
    if language.is_c99_inline_family() {
        return c99_inline(sides, optimization);
    }
    cxx_inline(sides, optimization)
}

/// Mismatched `static` that GCC accepts without an error.
fn static_mismatch_allowed(sides: &Sides<'_>, language: LanguageStandard) -> bool {
    let prototype = sides.prototype;
    if language.is_c99_inline_family() {
        if sides.inline_prototype() && !prototype.has_gnu_inline_attribute() && !prototype.is_extern()
        {
            return true;
        }
        if sides.inline_prototype()
            && prototype.has_gnu_inline_attribute()
            && prototype.is_extern()
            && !sides.definition.is_extern()
        {
            return true;
        }
    }
    if language.is_gnu89_inline_family() && sides.inline_prototype() && prototype.is_extern() {
        return true;
    }
    false
}

fn static_style(sides: &Sides<'_>, language: LanguageStandard) -> StaticStyle {
    if language.is_cpp() {
        StaticStyle::ExternQualified
    } else if language.is_c99_inline_family()
        && sides.inline_prototype()
        && !sides.prototype.has_gnu_inline_attribute()
        && !sides.definition.is_extern()
    {
        StaticStyle::NeverDefined
    } else {
        StaticStyle::Plain
    }
}

/// Without optimization nothing is inlined, so a body that never emits an
/// out-of-line copy leaves the call unresolved. `always_inline` forces inlining
/// even at `-O0`.
fn inline_or_unresolved(sides: &Sides<'_>, optimization: OptimizationLevel) -> Verdict {
    if optimization.is_unoptimized() && !sides.always_inline() {
        Verdict::Diagnostic(Diagnostic::UndefinedReference)
    } else {
        Verdict::Success(SuccessMode::UseInlineDefinition)
    }
}

fn gnu89_inline(sides: &Sides<'_>, optimization: OptimizationLevel) -> Verdict {
    let extern_inline = (sides.prototype.is_extern() || !sides.inline_prototype())
        && sides.definition.is_extern()
        && sides.inline_definition();
    if extern_inline {
        return inline_or_unresolved(sides, optimization);
    }
    Verdict::Diagnostic(Diagnostic::MultipleDefinition)
}

fn c99_inline(sides: &Sides<'_>, optimization: OptimizationLevel) -> Verdict {
    let prototype = sides.prototype;
    let definition = sides.definition;
    let multiple = Verdict::Diagnostic(Diagnostic::MultipleDefinition);

    if sides.inline_prototype()
        && prototype.is_extern()
        && sides.inline_definition()
        && !definition.is_extern()
    {
        return multiple;
    }
    if sides.inline_prototype() && prototype.has_gnu_inline_attribute() && !prototype.is_extern() {
        return multiple;
    }
    if !sides.inline_prototype()
        && prototype.has_gnu_inline_attribute()
        && sides.inline_definition()
        && definition.is_extern()
        && !definition.has_gnu_inline_attribute()
    {
        return multiple;
    }
    // `extern inline` with gnu_inline keeps GNU89 semantics.
    if definition.is_extern() && sides.inline_definition() && sides.gnu_inline() {
        return inline_or_unresolved(sides, optimization);
    }
    if !sides.inline_prototype() || !sides.inline_definition() {
        return multiple;
    }
    if definition.is_extern() || sides.gnu_inline() || prototype.is_extern_only() {
        return multiple;
    }
    inline_or_unresolved(sides, optimization)
}

fn cxx_inline(sides: &Sides<'_>, optimization: OptimizationLevel) -> Verdict {
    if optimization.is_unoptimized() && !sides.always_inline() {
        if sides.inline_definition() && sides.definition.has_gnu_inline_attribute() {
            return Verdict::Diagnostic(Diagnostic::UndefinedReference);
        }
        return Verdict::Success(SuccessMode::LinkOnceEither);
    }
    Verdict::Success(SuccessMode::UseInlineDefinition)
}

#[cfg(test)]
#[path = "oracle_tests.rs"]
mod tests;
