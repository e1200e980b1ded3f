//! Human-readable case lines and failure reports.
use crate::outcome::Outcome;
use crate::runner::{CaseFailure, CaseRun};
use crate::specification::Specification;
use std::fmt::Write as _;

const INDENT: &str = "    ";

/// Indent every line of `text`, including blank ones.
pub fn indented(text: &str) -> String {
    let mut out = String::new();
    for line in text.lines() {
        out.push_str(INDENT);
        out.push_str(line);
        out.push('\n');
    }
    out
}

pub fn progress_line(index: usize, spec: &Specification, outcome: &Outcome) -> String {
    format!("{index:>6} {spec} {outcome}")
}

/// Tuple, script, captured output and failures for one executed case.
pub fn case_report(spec: &Specification, run: &CaseRun) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "case:      {spec}");
    let _ = writeln!(out, "predicted: {}", run.outcome);
    let _ = writeln!(out, "script:");
    out.push_str(&indented(&run.rendered.script()));
    let _ = writeln!(out, "stdout:");
    out.push_str(&indented(&run.captured.stdout));
    let _ = writeln!(out, "stderr:");
    out.push_str(&indented(&run.captured.stderr));
    let exit = match run.captured.exit_code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    };
    let _ = writeln!(
        out,
        "exit code: {exit}{}",
        if run.captured.timed_out {
            " (timed out)"
        } else {
            ""
        }
    );
    if run.failures.is_empty() {
        let _ = writeln!(out, "result:    pass");
    } else {
        let _ = writeln!(out, "failures:");
        for failure in &run.failures {
            let _ = writeln!(out, "{INDENT}- {failure}");
        }
    }
    out
}

pub fn failure_report(failure: &CaseFailure) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "prediction failed at case {}", failure.index);
    out.push_str(&case_report(&failure.spec, &failure.run));
    let _ = writeln!(out, "resume at:  --skip {}", failure.resume_at);
    let _ = write!(out, "skip past:  --skip {}", failure.skip_past);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{Diagnostic, SuccessMode, Verdict};
    use crate::qualifiers::InliningSpecification;
    use crate::runner::ResumeToken;
    use crate::sandbox::CapturedOutput;
    use crate::script::{self, DriverOverrides};
    use crate::specification::{Compiler, LanguageStandard, OptimizationLevel};
    use std::collections::BTreeSet;

    fn sample_spec() -> Specification {
        Specification::new(
            InliningSpecification::parse(Some("extern"), "inline").expect("parse"),
            Compiler::Gcc,
            LanguageStandard::Gnu99,
            OptimizationLevel::O1,
        )
    }

    fn sample_run(spec: &Specification) -> CaseRun {
        CaseRun {
            outcome: Outcome::new(
                Verdict::Diagnostic(Diagnostic::MultipleDefinition),
                BTreeSet::new(),
            ),
            rendered: script::render(spec, &DriverOverrides::default()),
            captured: CapturedOutput {
                stdout: "1\n2\n".to_string(),
                stderr: String::new(),
                exit_code: Some(0),
                timed_out: false,
            },
            failures: vec!["expected a linker error matching \"multiple definition .*foo\"".to_string()],
        }
    }

    #[test]
    fn progress_line_uses_compact_summary() {
        let outcome = Outcome::new(
            Verdict::Success(SuccessMode::UseInlineDefinition),
            BTreeSet::new(),
        );
        let line = progress_line(12, &sample_spec(), &outcome);
        assert_eq!(
            line,
            "    12 e;i          gcc   gnu99   -O1 success(use_inline_definition)"
        );
    }

    #[test]
    fn indents_every_line() {
        assert_eq!(indented("a\n\nb\n"), "    a\n    \n    b\n");
        assert_eq!(indented(""), "");
    }

    #[test]
    fn failure_report_ends_with_both_tokens() {
        let spec = sample_spec();
        let failure = CaseFailure {
            index: 40,
            spec: spec.clone(),
            run: sample_run(&spec),
            resume_at: ResumeToken {
                index: 40,
                hash_prefix: Some("0123abcd".to_string()),
            },
            skip_past: ResumeToken {
                index: 41,
                hash_prefix: Some("89ef4567".to_string()),
            },
        };
        let report = failure_report(&failure);
        assert!(report.starts_with("prediction failed at case 40\n"));
        assert!(report.contains("predicted: multiple_definition\n"));
        assert!(report.contains("    extern int foo();\n"));
        assert!(report.contains("    - expected a linker error"));
        assert!(report.contains("resume at:  --skip 40:0123abcd\n"));
        assert!(report.ends_with("skip past:  --skip 41:89ef4567"));
        assert_eq!(failure.to_string(), report);
    }
}
