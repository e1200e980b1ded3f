//! Dialect, optimization level, compiler, and the full specification tuple.
use crate::qualifiers::InliningSpecification;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} {value:?}")]
pub struct SpecificationParseError {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LanguageStandard {
    C89,
    Gnu89,
    C99,
    Gnu99,
    C11,
    Gnu11,
    Cxx98,
    GnuCxx98,
    Cxx11,
    GnuCxx11,
    Cxx14,
    GnuCxx14,
    Cxx1z,
    GnuCxx1z,
}

impl LanguageStandard {
    pub const ALL: [LanguageStandard; 14] = [
        LanguageStandard::C89,
        LanguageStandard::Gnu89,
        LanguageStandard::C99,
        LanguageStandard::Gnu99,
        LanguageStandard::C11,
        LanguageStandard::Gnu11,
        LanguageStandard::Cxx98,
        LanguageStandard::GnuCxx98,
        LanguageStandard::Cxx11,
        LanguageStandard::GnuCxx11,
        LanguageStandard::Cxx14,
        LanguageStandard::GnuCxx14,
        LanguageStandard::Cxx1z,
        LanguageStandard::GnuCxx1z,
    ];

    /// Spelling accepted by `-std=`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageStandard::C89 => "c89",
            LanguageStandard::Gnu89 => "gnu89",
            LanguageStandard::C99 => "c99",
            LanguageStandard::Gnu99 => "gnu99",
            LanguageStandard::C11 => "c11",
            LanguageStandard::Gnu11 => "gnu11",
            LanguageStandard::Cxx98 => "c++98",
            LanguageStandard::GnuCxx98 => "gnu++98",
            LanguageStandard::Cxx11 => "c++11",
            LanguageStandard::GnuCxx11 => "gnu++11",
            LanguageStandard::Cxx14 => "c++14",
            LanguageStandard::GnuCxx14 => "gnu++14",
            LanguageStandard::Cxx1z => "c++1z",
            LanguageStandard::GnuCxx1z => "gnu++1z",
        }
    }

    pub fn is_cpp(&self) -> bool {
        matches!(
            self,
            LanguageStandard::Cxx98
                | LanguageStandard::GnuCxx98
                | LanguageStandard::Cxx11
                | LanguageStandard::GnuCxx11
                | LanguageStandard::Cxx14
                | LanguageStandard::GnuCxx14
                | LanguageStandard::Cxx1z
                | LanguageStandard::GnuCxx1z
        )
    }

    /// GNU extensions enabled (`-std=gnu*`).
    pub fn is_gnu_dialect(&self) -> bool {
        matches!(
            self,
            LanguageStandard::Gnu89
                | LanguageStandard::Gnu99
                | LanguageStandard::Gnu11
                | LanguageStandard::GnuCxx98
                | LanguageStandard::GnuCxx11
                | LanguageStandard::GnuCxx14
                | LanguageStandard::GnuCxx1z
        )
    }

    /// `inline` is a keyword in C++, in every GNU dialect and from C99 on.
    /// Strict C89 only has `__inline__`.
    pub fn supports_inline_keyword(&self) -> bool {
        self.is_cpp() || self.is_gnu_dialect() || self.is_c99_inline_family()
    }

    /// C89 and GNU89: `extern inline` means "use this body if you inline, link elsewhere otherwise".
    pub fn is_gnu89_inline_family(&self) -> bool {
        matches!(self, LanguageStandard::C89 | LanguageStandard::Gnu89)
    }

    /// C99 and C11 with their GNU variants share C99 inline semantics.
    pub fn is_c99_inline_family(&self) -> bool {
        matches!(
            self,
            LanguageStandard::C99
                | LanguageStandard::Gnu99
                | LanguageStandard::C11
                | LanguageStandard::Gnu11
        )
    }

    pub fn source_extension(&self) -> &'static str {
        if self.is_cpp() {
            ".cpp"
        } else {
            ".c"
        }
    }
}

impl FromStr for LanguageStandard {
    type Err = SpecificationParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let raw = raw.strip_prefix("-std=").unwrap_or(raw);
        LanguageStandard::ALL
            .iter()
            .copied()
            .find(|std| std.as_str() == raw)
            .ok_or_else(|| SpecificationParseError {
                kind: "language standard",
                value: raw.to_string(),
            })
    }
}

impl fmt::Display for LanguageStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptimizationLevel {
    O0,
    O1,
    O2,
    O3,
    Os,
}

impl OptimizationLevel {
    pub const ALL: [OptimizationLevel; 5] = [
        OptimizationLevel::O0,
        OptimizationLevel::O1,
        OptimizationLevel::O2,
        OptimizationLevel::O3,
        OptimizationLevel::Os,
    ];

    /// Compiler flag, e.g. `-O2`.
    pub fn as_flag(&self) -> &'static str {
        match self {
            OptimizationLevel::O0 => "-O0",
            OptimizationLevel::O1 => "-O1",
            OptimizationLevel::O2 => "-O2",
            OptimizationLevel::O3 => "-O3",
            OptimizationLevel::Os => "-Os",
        }
    }

    pub fn is_unoptimized(&self) -> bool {
        *self == OptimizationLevel::O0
    }
}

impl FromStr for OptimizationLevel {
    type Err = SpecificationParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let flag = trimmed.strip_prefix('-').unwrap_or(trimmed);
        OptimizationLevel::ALL
            .iter()
            .copied()
            .find(|level| &level.as_flag()[1..] == flag)
            .ok_or_else(|| SpecificationParseError {
                kind: "optimization level",
                value: raw.to_string(),
            })
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_flag())
    }
}

/// Compiler family under test. Only GCC is modeled by the oracle; Clang can be
/// rendered and run but classifies as an unknown case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compiler {
    Gcc,
    Clang,
}

impl Compiler {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compiler::Gcc => "gcc",
            Compiler::Clang => "clang",
        }
    }

    /// Driver executable for the given dialect.
    pub fn driver(&self, language: LanguageStandard) -> &'static str {
        match (self, language.is_cpp()) {
            (Compiler::Gcc, false) => "gcc",
            (Compiler::Gcc, true) => "g++",
            (Compiler::Clang, false) => "clang",
            (Compiler::Clang, true) => "clang++",
        }
    }
}

impl FromStr for Compiler {
    type Err = SpecificationParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "gcc" => Ok(Compiler::Gcc),
            "clang" => Ok(Compiler::Clang),
            other => Err(SpecificationParseError {
                kind: "compiler",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit of work: one point in the test domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Specification {
    pub inlining: InliningSpecification,
    pub compiler: Compiler,
    pub language: LanguageStandard,
    pub optimization: OptimizationLevel,
}

impl Specification {
    pub fn new(
        inlining: InliningSpecification,
        compiler: Compiler,
        language: LanguageStandard,
        optimization: OptimizationLevel,
    ) -> Self {
        Self {
            inlining,
            compiler,
            language,
            optimization,
        }
    }

    /// Flags passed to the driver: `-std=<dialect> <opt> -Wall -Wextra`.
    pub fn compiler_flags(&self) -> String {
        format!(
            "-std={} {} -Wall -Wextra",
            self.language.as_str(),
            self.optimization.as_flag()
        )
    }
}

impl fmt::Display for Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12} {:<5} {:<7} {:<3}",
            self.inlining.summary(),
            self.compiler.as_str(),
            self.language.as_str(),
            self.optimization.as_flag()
        )
    }
}
