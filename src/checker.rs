//! Checks captured toolchain output against an oracle prediction.
//!
//! Returns a list of failures, empty when the prediction holds.
mod expectations;

use crate::outcome::{Outcome, Warning};
use crate::sandbox::CapturedOutput;
use expectations::{expectation_for, warning_pattern, Check, SOURCE_FILES, SYMBOL};
use regex::Regex;

pub fn verify(outcome: &Outcome, captured: &CapturedOutput) -> Vec<String> {
    let mut failures = Vec::new();
    let expectation = expectation_for(outcome.verdict);

    if captured.timed_out {
        failures.push("script timed out".to_string());
    }

    match expectation.check {
        Check::CompileErrors(patterns) => {
            for file in SOURCE_FILES {
                expect_compile_error(captured, file, None, &mut failures);
                for pattern in patterns {
                    expect_compile_error(captured, file, Some(pattern), &mut failures);
                }
            }
        }
        Check::LinkError(pattern) => {
            let full = format!("{pattern} .*{SYMBOL}");
            match Regex::new(&full) {
                Ok(re) => {
                    if !captured.stderr.lines().any(|line| re.is_match(line)) {
                        failures.push(format!("expected a linker error matching {full:?}"));
                    }
                }
                Err(err) => failures.push(format!("invalid linker regex {full:?}: {err}")),
            }
        }
        Check::Runs(expected_stdout) => {
            if captured.exit_code != Some(0) {
                failures.push(format!(
                    "expected exit code 0, got {}",
                    describe_exit(captured.exit_code)
                ));
            }
            if captured.stdout != expected_stdout {
                failures.push(format!(
                    "stdout differs from expected: expected {:?}, got {:?}",
                    expected_stdout, captured.stdout
                ));
            }
        }
    }

    let listed = outcome
        .warnings
        .iter()
        .filter(|warning| !expectation.unreachable_warnings.contains(warning));
    for warning in listed.chain(expectation.implied_warnings) {
        expect_warning(captured, *warning, &mut failures);
    }

    let expects_no_warnings = outcome.warnings.is_empty()
        && expectation.implied_warnings.is_empty()
        && !expectation.tolerates_unlisted_warnings;
    if expects_no_warnings && captured.stderr.contains("warning") {
        failures.push("expected no warnings, but stderr had a warning".to_string());
    }

    failures
}

fn expect_compile_error(
    captured: &CapturedOutput,
    file: &str,
    pattern: Option<&str>,
    failures: &mut Vec<String>,
) {
    if captured.exit_code == Some(0) {
        if pattern.is_none() {
            failures.push(format!("expected a compiler error in {file}, but the build succeeded"));
        }
        return;
    }
    let line_re = match Regex::new(&format!(r"^{file}(\.c|\.cpp)?:\d+:\d+: error: (.*)$")) {
        Ok(re) => re,
        Err(err) => {
            failures.push(format!("invalid error-line regex for {file}: {err}"));
            return;
        }
    };
    let message_re = match pattern.map(Regex::new).transpose() {
        Ok(re) => re,
        Err(err) => {
            failures.push(format!("invalid error regex {pattern:?}: {err}"));
            return;
        }
    };
    let found = captured.stderr.lines().any(|line| {
        line_re.captures(line).is_some_and(|caps| {
            let message = caps.get(2).map_or("", |m| m.as_str());
            match &message_re {
                Some(re) => re.is_match(message),
                None => true,
            }
        })
    });
    if !found {
        match pattern {
            Some(pattern) => failures.push(format!(
                "expected a compiler error in {file} matching {pattern:?}, but did not find one"
            )),
            None => failures.push(format!(
                "expected a compiler error in {file}, but did not find one"
            )),
        }
    }
}

fn expect_warning(captured: &CapturedOutput, warning: Warning, failures: &mut Vec<String>) {
    let pattern = warning_pattern(warning);
    let re = match Regex::new(&format!("warning: .*{pattern}")) {
        Ok(re) => re,
        Err(err) => {
            failures.push(format!("invalid warning regex {pattern:?}: {err}"));
            return;
        }
    };
    if !captured.stderr.lines().any(|line| re.is_match(line)) {
        failures.push(format!(
            "expected a {} warning matching {pattern:?}, none found",
            warning.as_str()
        ));
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::expectations::{expectation_for, warning_pattern};
    use super::*;
    use crate::outcome::{Diagnostic, GnuInlineStyle, StaticStyle, SuccessMode, Verdict};
    use std::collections::BTreeSet;

    fn captured(stdout: &str, stderr: &str, exit_code: i32) -> CapturedOutput {
        CapturedOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code: Some(exit_code),
            timed_out: false,
        }
    }

    fn outcome(verdict: Verdict, warnings: &[Warning]) -> Outcome {
        Outcome {
            verdict,
            warnings: warnings.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn every_pattern_in_the_table_compiles() {
        let verdicts = [
            Verdict::Success(SuccessMode::UseInlineDefinition),
            Verdict::Success(SuccessMode::LinkOnceEither),
            Verdict::Diagnostic(Diagnostic::InlineNotSupported),
            Verdict::Diagnostic(Diagnostic::MultipleStorageClasses),
            Verdict::Diagnostic(Diagnostic::ConflictingSpecifiers),
            Verdict::Diagnostic(Diagnostic::DuplicateInline),
            Verdict::Diagnostic(Diagnostic::StaticInconsistent(StaticStyle::Plain)),
            Verdict::Diagnostic(Diagnostic::StaticInconsistent(StaticStyle::ExternQualified)),
            Verdict::Diagnostic(Diagnostic::StaticInconsistent(StaticStyle::NeverDefined)),
            Verdict::Diagnostic(Diagnostic::GnuInlineInconsistent(GnuInlineStyle::Present)),
            Verdict::Diagnostic(Diagnostic::GnuInlineInconsistent(GnuInlineStyle::RedeclaredWith)),
            Verdict::Diagnostic(Diagnostic::GnuInlineInconsistent(
                GnuInlineStyle::RedeclaredWithout,
            )),
            Verdict::Diagnostic(Diagnostic::MultipleDefinition),
            Verdict::Diagnostic(Diagnostic::UndefinedReference),
        ];
        for verdict in verdicts {
            match expectation_for(verdict).check {
                Check::CompileErrors(patterns) => {
                    for pattern in patterns {
                        Regex::new(pattern).expect("compile error pattern");
                    }
                }
                Check::LinkError(pattern) => {
                    Regex::new(pattern).expect("link pattern");
                }
                Check::Runs(_) => {}
            }
        }
        for warning in [
            Warning::GnuInlineIgnored,
            Warning::AlwaysInlineIgnored,
            Warning::InlineNeverDefined,
        ] {
            Regex::new(warning_pattern(warning)).expect("warning pattern");
        }
    }

    #[test]
    fn success_requires_exact_stdout() {
        let predicted = outcome(Verdict::Success(SuccessMode::UseInlineDefinition), &[]);
        assert!(verify(&predicted, &captured("1\n2\n", "", 0)).is_empty());

        let failures = verify(&predicted, &captured("1\n1\n", "", 0));
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("stdout differs"));
    }

    #[test]
    fn clean_cases_must_stay_clean() {
        let predicted = outcome(Verdict::Success(SuccessMode::LinkOnceEither), &[]);
        let stderr = "file1.cpp:2:5: warning: unused variable 'x' [-Wunused-variable]\n";
        let failures = verify(&predicted, &captured("1\n1\n", stderr, 0));
        assert_eq!(failures, vec!["expected no warnings, but stderr had a warning".to_string()]);
    }

    #[test]
    fn listed_warnings_are_required() {
        let predicted = outcome(
            Verdict::Success(SuccessMode::UseInlineDefinition),
            &[Warning::GnuInlineIgnored],
        );
        let stderr = "file1.c:1:1: warning: 'gnu_inline' attribute ignored [-Wattributes]\n";
        assert!(verify(&predicted, &captured("1\n2\n", stderr, 0)).is_empty());

        let failures = verify(&predicted, &captured("1\n2\n", "", 0));
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("gnu_inline_ignored"));
    }

    #[test]
    fn compile_errors_must_appear_in_both_files() {
        let predicted = outcome(Verdict::Diagnostic(Diagnostic::DuplicateInline), &[]);
        let both = "file1.cpp:1:8: error: duplicate 'inline'\n\
                    file2.cpp:1:8: error: duplicate 'inline'\n";
        assert!(verify(&predicted, &captured("", both, 1)).is_empty());

        let one = "file1.cpp:1:8: error: duplicate 'inline'\n";
        let failures = verify(&predicted, &captured("", one, 1));
        assert!(failures.iter().all(|failure| failure.contains("file2")));
        assert_eq!(failures.len(), 2);
    }

    #[test]
    fn compile_errors_require_a_failed_build() {
        let predicted = outcome(Verdict::Diagnostic(Diagnostic::InlineNotSupported), &[]);
        let failures = verify(&predicted, &captured("1\n2\n", "", 0));
        assert_eq!(failures.len(), 2);
    }

    #[test]
    fn linker_errors_name_the_symbol() {
        let predicted = outcome(Verdict::Diagnostic(Diagnostic::UndefinedReference), &[]);
        let stderr = "/usr/bin/ld: /tmp/ccX.o: in function `main':\n\
                      file1.c:(.text+0x5): undefined reference to `foo'\n\
                      collect2: error: ld returned 1 exit status\n";
        assert!(verify(&predicted, &captured("", stderr, 1)).is_empty());

        let multiple = outcome(Verdict::Diagnostic(Diagnostic::MultipleDefinition), &[]);
        let failures = verify(&multiple, &captured("", stderr, 1));
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn never_defined_style_implies_its_warning() {
        let predicted = outcome(
            Verdict::Diagnostic(Diagnostic::StaticInconsistent(StaticStyle::NeverDefined)),
            &[],
        );
        let errors = "file1.c:2:12: error: static declaration of 'foo' follows non-static declaration\n\
                      file2.c:2:12: error: static declaration of 'foo' follows non-static declaration\n";
        let failures = verify(&predicted, &captured("", errors, 1));
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("inline_never_defined"));

        let with_warning = format!(
            "{errors}file1.c:1:37: warning: inline function 'foo' declared but never defined\n"
        );
        assert!(verify(&predicted, &captured("", &with_warning, 1)).is_empty());
    }

    #[test]
    fn inline_not_supported_skips_attribute_warnings() {
        let predicted = outcome(
            Verdict::Diagnostic(Diagnostic::InlineNotSupported),
            &[Warning::AlwaysInlineIgnored],
        );
        let stderr = "file1.c:1:8: error: expected '=', ',', ';', 'asm' or '__attribute__' before 'int'\n\
                      file2.c:1:8: error: expected '=', ',', ';', 'asm' or '__attribute__' before 'int'\n";
        assert!(verify(&predicted, &captured("", stderr, 1)).is_empty());
    }

    #[test]
    fn always_inline_warning_matches_quoted_attribute_name() {
        let predicted = outcome(
            Verdict::Diagnostic(Diagnostic::MultipleDefinition),
            &[Warning::AlwaysInlineIgnored],
        );
        let stderr = "file1.c:2:36: warning: 'always_inline' function might not be inlinable [-Wattributes]\n\
                      /usr/bin/ld: /tmp/ccB.o: in function `foo':\n\
                      file2.c:(.text+0x0): multiple definition of `foo'; /tmp/ccA.o:file1.c:(.text+0x0): first defined here\n\
                      collect2: error: ld returned 1 exit status\n";
        assert!(verify(&predicted, &captured("", stderr, 1)).is_empty());
    }

    #[test]
    fn conflicting_specifiers_do_not_require_attribute_warnings() {
        let predicted = outcome(
            Verdict::Diagnostic(Diagnostic::ConflictingSpecifiers),
            &[Warning::GnuInlineIgnored],
        );
        let stderr = "file1.cpp:1:43: error: conflicting specifiers in declaration of 'foo'\n\
                      file2.cpp:1:43: error: conflicting specifiers in declaration of 'foo'\n";
        assert!(verify(&predicted, &captured("", stderr, 1)).is_empty());
    }

    #[test]
    fn compile_errors_do_not_require_always_inline_warning() {
        let predicted = outcome(
            Verdict::Diagnostic(Diagnostic::StaticInconsistent(StaticStyle::Plain)),
            &[Warning::AlwaysInlineIgnored, Warning::GnuInlineIgnored],
        );
        let errors = "file1.c:2:12: error: static declaration of 'foo' follows non-static declaration\n\
                      file2.c:2:12: error: static declaration of 'foo' follows non-static declaration\n";
        let failures = verify(&predicted, &captured("", errors, 1));
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("gnu_inline_ignored"));
    }

    #[test]
    fn timeouts_always_fail() {
        let predicted = outcome(Verdict::Success(SuccessMode::UseInlineDefinition), &[]);
        let mut output = captured("1\n2\n", "", 0);
        output.timed_out = true;
        assert_eq!(verify(&predicted, &output), vec!["script timed out".to_string()]);
    }
}
