use anyhow::{anyhow, Context, Result};
use clap::Parser;

mod checker;
mod cli;
mod config;
mod digest;
mod domain;
mod oracle;
mod outcome;
mod qualifiers;
mod runner;
mod sandbox;
mod script;
mod specification;
mod summary;

use cli::{CaseArgs, CheckArgs, ClassifyArgs, Command, DigestArgs, RenderArgs, RootArgs, RunArgs};
use config::RunConfig;
use domain::{DomainMode, TestDomain};
use runner::Runner;
use specification::Specification;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Run(args) => cmd_run(args),
        Command::Check(args) => cmd_check(args),
        Command::Classify(args) => cmd_classify(args),
        Command::Render(args) => cmd_render(args),
        Command::Digest(args) => cmd_digest(args),
    }
}

/// Logs go to stderr so progress lines on stdout stay parseable.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let config = config::resolve_config(args.config.as_deref())?;
    let env_skip = std::env::var(config::SKIP_ENV_VAR).ok();
    let resume = config::resolve_resume_token(args.skip.as_deref(), env_skip.as_deref())?;

    let mode = DomainMode::from_minimal_flag(args.minimal);
    let domain = domain::enumerate(mode);
    require_toolchain(&config, &domain)?;
    tracing::info!(mode = ?mode, cases = domain.case_count(), "starting run");

    let sandbox = config.sandbox();
    let drivers = config.drivers();
    let report = Runner::new(&sandbox, &drivers).run(&domain, resume.as_ref())?;

    println!(
        "{} cases passed ({} skipped, {} executed)",
        report.case_count, report.skipped, report.executed
    );
    println!("digest: {}", report.digest);
    if mode == DomainMode::Exhaustive {
        if report.case_count != domain::EXHAUSTIVE_CASE_COUNT {
            return Err(anyhow!(
                "regression drift: {} cases enumerated, recorded {}",
                report.case_count,
                domain::EXHAUSTIVE_CASE_COUNT
            ));
        }
        if report.digest != digest::EXHAUSTIVE_OUTCOME_DIGEST {
            return Err(anyhow!(
                "regression drift: outcome digest {} differs from recorded {}",
                report.digest,
                digest::EXHAUSTIVE_OUTCOME_DIGEST
            ));
        }
    }
    Ok(())
}

fn cmd_check(args: CheckArgs) -> Result<()> {
    let config = config::resolve_config(args.config.as_deref())?;
    let spec = case_specification(&args.case)?;
    let drivers = config.drivers();
    sandbox::require_executable(&config.shell)?;
    sandbox::require_executable(&drivers.driver_for(&spec))?;

    let run = runner::execute_case(&spec, &config.sandbox(), &drivers)?;
    print!("{}", summary::case_report(&spec, &run));
    if !run.passed() {
        return Err(anyhow!(
            "prediction did not hold for {spec} ({} failures)",
            run.failures.len()
        ));
    }
    Ok(())
}

fn cmd_classify(args: ClassifyArgs) -> Result<()> {
    let spec = case_specification(&args.case)?;
    let outcome = oracle::classify(&spec)?;
    if args.json {
        let text = serde_json::to_string(&outcome).context("serialize outcome")?;
        println!("{text}");
    } else {
        println!("{outcome}");
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let config = config::resolve_config(args.config.as_deref())?;
    let spec = case_specification(&args.case)?;
    let rendered = script::render(&spec, &config.drivers());
    print!("{}", rendered.script());
    Ok(())
}

fn cmd_digest(args: DigestArgs) -> Result<()> {
    let mode = DomainMode::from_minimal_flag(args.minimal);
    let digest = digest::domain_digest(mode)?;
    println!("cases: {}", digest.case_count);
    println!("digest: {}", digest.hex);

    if let Some(expected) = args.expect.as_deref() {
        let expected = expected.trim().to_ascii_lowercase();
        if expected.is_empty() || !digest.hex.starts_with(&expected) {
            return Err(anyhow!(
                "regression drift: expected digest {expected}, got {}",
                digest.hex
            ));
        }
    }
    Ok(())
}

fn case_specification(case: &CaseArgs) -> Result<Specification> {
    case.specification().context("parse qualifiers")
}

/// Every executable a run needs must be on PATH before the first case.
fn require_toolchain(config: &RunConfig, domain: &TestDomain) -> Result<()> {
    sandbox::require_executable(&config.shell)?;
    let drivers = config.drivers();
    let mut checked = Vec::new();
    for (compiler, language) in domain.toolchains() {
        let driver = drivers.driver(compiler, language);
        if !checked.contains(&driver) {
            sandbox::require_executable(&driver)?;
            checked.push(driver);
        }
    }
    Ok(())
}
