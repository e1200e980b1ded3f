//! Test domain generation.
//!
//! Both modes are finite and restartable: iterating twice yields the same
//! sequence, and case indices are stable so resume tokens stay meaningful.
use crate::qualifiers::{InliningSpecification, QualifierSet, QualifierToken};
use crate::specification::{Compiler, LanguageStandard, OptimizationLevel, Specification};
use serde::{Deserialize, Serialize};

/// Size of the exhaustive domain: 4096 qualifier pairs x 14 dialects x 5 levels.
pub const EXHAUSTIVE_CASE_COUNT: usize = 286_720;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainMode {
    /// Hand-picked representatives for fast iteration.
    Minimal,
    /// Every subset of the qualifier universe on each side.
    Exhaustive,
}

impl DomainMode {
    pub fn from_minimal_flag(minimal: bool) -> Self {
        if minimal {
            DomainMode::Minimal
        } else {
            DomainMode::Exhaustive
        }
    }
}

/// Materialized axes of the domain. Cases are the cross product, ordered with
/// the optimization level outermost and the dialect innermost.
#[derive(Debug, Clone)]
pub struct TestDomain {
    inlinings: Vec<InliningSpecification>,
    compilers: Vec<Compiler>,
    languages: Vec<LanguageStandard>,
    optimizations: Vec<OptimizationLevel>,
}

pub fn enumerate(mode: DomainMode) -> TestDomain {
    match mode {
        DomainMode::Minimal => TestDomain {
            inlinings: minimal_inlinings(),
            compilers: vec![Compiler::Gcc],
            languages: vec![
                LanguageStandard::C89,
                LanguageStandard::Gnu89,
                LanguageStandard::Gnu99,
                LanguageStandard::GnuCxx11,
            ],
            optimizations: vec![OptimizationLevel::O0, OptimizationLevel::O1],
        },
        DomainMode::Exhaustive => TestDomain {
            inlinings: exhaustive_inlinings(),
            compilers: vec![Compiler::Gcc],
            languages: LanguageStandard::ALL.to_vec(),
            optimizations: OptimizationLevel::ALL.to_vec(),
        },
    }
}

impl TestDomain {
    pub fn case_count(&self) -> usize {
        self.inlinings.len() * self.compilers.len() * self.languages.len() * self.optimizations.len()
    }

    /// Every (compiler, dialect) pair the domain compiles with.
    pub fn toolchains(&self) -> Vec<(Compiler, LanguageStandard)> {
        self.compilers
            .iter()
            .flat_map(|&compiler| self.languages.iter().map(move |&language| (compiler, language)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Specification> + '_ {
        self.optimizations.iter().flat_map(move |&optimization| {
            self.inlinings.iter().flat_map(move |inlining| {
                self.compilers.iter().flat_map(move |&compiler| {
                    self.languages.iter().map(move |&language| {
                        Specification::new(inlining.clone(), compiler, language, optimization)
                    })
                })
            })
        })
    }
}

fn qualifiers(tokens: &[QualifierToken]) -> QualifierSet {
    tokens.iter().copied().collect()
}

fn same(tokens: &[QualifierToken]) -> InliningSpecification {
    InliningSpecification::symmetric(qualifiers(tokens))
}

fn split(prototype: &[QualifierToken], definition: &[QualifierToken]) -> InliningSpecification {
    InliningSpecification::new(Some(qualifiers(prototype)), qualifiers(definition))
}

fn minimal_inlinings() -> Vec<InliningSpecification> {
    use QualifierToken::{
        AlwaysInlineAttribute as A, CompilerInlineKeyword as CI, Extern as E,
        GnuInlineAttribute as G, InlineKeyword as I, Static as S,
    };
    vec![
        same(&[]),
        same(&[I]),
        split(&[], &[I]),
        split(&[I], &[]),
        same(&[CI]),
        same(&[I, CI]),
        same(&[S]),
        same(&[S, I]),
        split(&[S], &[I]),
        same(&[S, CI]),
        same(&[E, I]),
        split(&[E], &[I]),
        same(&[G]),
        same(&[I, G]),
        split(&[G], &[I, G]),
        split(&[I, G], &[G]),
        split(&[I], &[I, G]),
        split(&[I, G], &[I]),
        same(&[E, G]),
        same(&[E, I, G]),
        same(&[S, G]),
        same(&[A]),
        same(&[I, A]),
        same(&[E, A]),
        same(&[E, I, A]),
        same(&[S, A]),
        split(&[I], &[I, G, S]),
        InliningSpecification::definition_only(qualifiers(&[I])),
        InliningSpecification::definition_only(qualifiers(&[S, I])),
    ]
}

/// Two bits per qualifier: bit0 puts it on the prototype, bit0 ^ bit1 puts it
/// on the definition. Simpler patterns come first so the smallest reproducer
/// of a failure is hit before more complex ones.
fn exhaustive_inlinings() -> Vec<InliningSpecification> {
    let bits = QualifierToken::UNIVERSE.len() * 2;
    let mut patterns: Vec<u32> = (0..(1u32 << bits)).collect();
    patterns.sort_by_key(|pattern| (pattern.count_ones(), *pattern));
    patterns.into_iter().map(decode_pattern).collect()
}

fn decode_pattern(pattern: u32) -> InliningSpecification {
    let mut remaining = pattern;
    let mut prototype = Vec::new();
    let mut definition = Vec::new();
    for token in QualifierToken::UNIVERSE {
        let bit0 = remaining & 1;
        let bit1 = (remaining >> 1) & 1;
        remaining >>= 2;
        if bit0 == 1 {
            prototype.push(token);
        }
        if bit0 ^ bit1 == 1 {
            definition.push(token);
        }
    }
    InliningSpecification::new(Some(QualifierSet::new(prototype)), QualifierSet::new(definition))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn exhaustive_domain_has_the_recorded_size() {
        let domain = enumerate(DomainMode::Exhaustive);
        assert_eq!(domain.case_count(), EXHAUSTIVE_CASE_COUNT);
        assert_eq!(domain.iter().count(), EXHAUSTIVE_CASE_COUNT);
    }

    #[test]
    fn exhaustive_pairs_are_distinct_and_complete() {
        let inlinings = exhaustive_inlinings();
        assert_eq!(inlinings.len(), 4096);
        let unique: HashSet<_> = inlinings.iter().collect();
        assert_eq!(unique.len(), 4096);
        assert!(inlinings.iter().all(|inlining| inlining.prototype_qualifiers.is_some()));
    }

    #[test]
    fn simpler_combinations_come_first() {
        let inlinings = exhaustive_inlinings();
        assert_eq!(inlinings[0], same(&[]));
        // Pattern 1 sets bit0 of `inline`: on the prototype and, since bit1 is
        // clear, on the definition too.
        assert_eq!(inlinings[1], same(&[QualifierToken::InlineKeyword]));
        // Pattern 2 sets only bit1: definition-only `inline`.
        assert_eq!(
            inlinings[2],
            split(&[], &[QualifierToken::InlineKeyword])
        );
        let popcounts: Vec<u32> = {
            let mut patterns: Vec<u32> = (0..4096).collect();
            patterns.sort_by_key(|pattern| (pattern.count_ones(), *pattern));
            patterns.iter().map(|pattern| pattern.count_ones()).collect()
        };
        assert!(popcounts.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn iteration_is_restartable() {
        let domain = enumerate(DomainMode::Minimal);
        let first: Vec<_> = domain.iter().collect();
        let second: Vec<_> = enumerate(DomainMode::Minimal).iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), domain.case_count());
    }

    #[test]
    fn dialect_varies_fastest() {
        let domain = enumerate(DomainMode::Exhaustive);
        let cases: Vec<_> = domain.iter().take(15).collect();
        let languages: Vec<_> = cases.iter().take(14).map(|case| case.language).collect();
        assert_eq!(languages, LanguageStandard::ALL.to_vec());
        assert_eq!(cases[14].language, LanguageStandard::C89);
        assert_ne!(cases[14].inlining, cases[0].inlining);
        assert!(cases
            .iter()
            .all(|case| case.optimization == OptimizationLevel::O0));
    }

    #[test]
    fn minimal_domain_covers_absent_prototypes() {
        let domain = enumerate(DomainMode::Minimal);
        assert!(domain.iter().any(|case| case.inlining.prototype_qualifiers.is_none()));
        assert_eq!(domain.case_count(), 29 * 4 * 2);
    }
}
