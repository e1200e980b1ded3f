//! CLI argument parsing for the oracle and its differential runner.
use crate::qualifiers::{InliningSpecification, QualifierParseError};
use crate::specification::{Compiler, LanguageStandard, OptimizationLevel, Specification};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "inline-oracle",
    version,
    about = "Differential testing of GCC inline and storage-class qualifiers",
    after_help = "Examples:\n  inline-oracle run --minimal\n  inline-oracle run --skip 1200:3f9a0c1e\n  inline-oracle classify --prototype inline --definition inline --std gnu++11 --opt O0\n  inline-oracle check --definition 'static inline' --std c99 --opt O2\n  inline-oracle digest",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log internal events at debug level (RUST_LOG overrides)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every case of the domain against the real toolchain
    Run(RunArgs),
    /// Run a single case against the real toolchain
    Check(CheckArgs),
    /// Print the predicted outcome for a single case
    Classify(ClassifyArgs),
    /// Print the shell script for a single case
    Render(RenderArgs),
    /// Classify the whole domain and print its outcome digest
    Digest(DigestArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Use the small hand-picked domain instead of the exhaustive one
    #[arg(long)]
    pub minimal: bool,

    /// Resume token: N or N:hexprefix (default: $INLINE_ORACLE_SKIP)
    #[arg(long, value_name = "TOKEN")]
    pub skip: Option<String>,

    /// Config file (default: <config dir>/inline-oracle/config.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// One point of the domain, spelled out on the command line.
#[derive(Args, Debug, Clone)]
pub struct CaseArgs {
    /// Qualifiers on the definition, e.g. 'extern inline'
    #[arg(long, value_name = "QUALIFIERS")]
    pub definition: String,

    /// Qualifiers on the forward declaration; omit for no declaration
    #[arg(long, value_name = "QUALIFIERS")]
    pub prototype: Option<String>,

    /// Language standard, as passed to -std=
    #[arg(long = "std", value_name = "STD")]
    pub language: LanguageStandard,

    /// Optimization level, e.g. O0 or -O2
    #[arg(long = "opt", value_name = "LEVEL", allow_hyphen_values = true)]
    pub optimization: OptimizationLevel,

    #[arg(long, value_name = "COMPILER", default_value = "gcc")]
    pub compiler: Compiler,
}

impl CaseArgs {
    pub fn specification(&self) -> Result<Specification, QualifierParseError> {
        let inlining =
            InliningSpecification::parse(self.prototype.as_deref(), &self.definition)?;
        Ok(Specification::new(
            inlining,
            self.compiler,
            self.language,
            self.optimization,
        ))
    }
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub case: CaseArgs,

    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub case: CaseArgs,

    /// Emit the outcome as JSON (the digest encoding)
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub case: CaseArgs,

    /// Config file supplying compiler overrides
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DigestArgs {
    #[arg(long)]
    pub minimal: bool,

    /// Fail unless the digest starts with this hex string
    #[arg(long, value_name = "HEX")]
    pub expect: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        RootArgs::command().debug_assert();
    }

    #[test]
    fn parses_a_case() {
        let args = RootArgs::try_parse_from([
            "inline-oracle",
            "classify",
            "--prototype",
            "extern inline",
            "--definition",
            "extern inline",
            "--std",
            "gnu89",
            "--opt",
            "-O0",
        ])
        .expect("parse args");
        let Command::Classify(classify) = args.command else {
            panic!("expected classify");
        };
        let spec = classify.case.specification().expect("qualifiers");
        assert_eq!(spec.language, LanguageStandard::Gnu89);
        assert_eq!(spec.optimization, OptimizationLevel::O0);
        assert_eq!(spec.compiler, Compiler::Gcc);
        assert_eq!(spec.inlining.summary(), "ei;ei");
    }

    #[test]
    fn rejects_unknown_dialects() {
        let err = RootArgs::try_parse_from([
            "inline-oracle",
            "render",
            "--definition",
            "inline",
            "--std",
            "c17",
            "--opt",
            "O0",
        ])
        .expect_err("c17 is not modeled");
        assert!(err.to_string().contains("c17"));
    }
}
