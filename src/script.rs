//! Renders a specification into two translation units and a build-and-run script.
//!
//! Qualifiers are written verbatim and the line layout is fixed, since several
//! diagnostics are matched by file and line.
use crate::specification::{Compiler, LanguageStandard, Specification};

/// Executable overrides for the compiler drivers; `None` uses the compiler's
/// default driver name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverOverrides {
    pub c_compiler: Option<String>,
    pub cxx_compiler: Option<String>,
}

impl DriverOverrides {
    pub fn driver(&self, compiler: Compiler, language: LanguageStandard) -> String {
        let override_name = if language.is_cpp() {
            self.cxx_compiler.as_deref()
        } else {
            self.c_compiler.as_deref()
        };
        override_name
            .unwrap_or_else(|| compiler.driver(language))
            .to_string()
    }

    pub fn driver_for(&self, spec: &Specification) -> String {
        self.driver(spec.compiler, spec.language)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedScript {
    pub file1: String,
    pub file2: String,
    pub source_extension: &'static str,
    pub compile_command: String,
}

impl RenderedScript {
    /// Full shell script: writes both sources, compiles, runs `./test`.
    pub fn script(&self) -> String {
        let ext = self.source_extension;
        let mut script = String::new();
        push_heredoc(&mut script, &format!("file1{ext}"), &self.file1);
        push_heredoc(&mut script, &format!("file2{ext}"), &self.file2);
        script.push_str(&self.compile_command);
        script.push('\n');
        script.push_str("./test\n");
        script
    }
}

pub fn render(spec: &Specification, drivers: &DriverOverrides) -> RenderedScript {
    let declaration = declaration_line(spec);
    let definition = &spec.inlining.definition_qualifiers;

    let mut file1 = String::new();
    file1.push_str(&declaration);
    file1.push_str(&format!("{definition} int foo() {{ return 1; }}\n"));
    file1.push_str("void file2(void);\n");
    file1.push_str("#include <stdio.h>\n");
    file1.push_str("int main() {\n");
    file1.push_str("  printf(\"%d\\n\", foo());\n");
    file1.push_str("  file2();\n");
    file1.push_str("  return 0;\n");
    file1.push_str("}\n");

    let mut file2 = String::new();
    file2.push_str(&declaration);
    file2.push_str(&format!("{definition} int foo() {{ return 2; }}\n"));
    file2.push_str("#include <stdio.h>\n");
    file2.push_str("void file2() {\n");
    file2.push_str("  printf(\"%d\\n\", foo());\n");
    file2.push_str("}\n");

    let ext = spec.language.source_extension();
    let compile_command = format!(
        "{} {} file1{ext} file2{ext} -o test",
        drivers.driver_for(spec),
        spec.compiler_flags()
    );

    RenderedScript {
        file1,
        file2,
        source_extension: ext,
        compile_command,
    }
}

/// An absent prototype still occupies line 1 so line numbers match across cases.
fn declaration_line(spec: &Specification) -> String {
    match &spec.inlining.prototype_qualifiers {
        Some(prototype) => format!("{prototype} int foo();\n"),
        None => "\n".to_string(),
    }
}

fn push_heredoc(script: &mut String, file_name: &str, body: &str) {
    // Quoted delimiter: the body is written without shell expansion.
    script.push_str(&format!("cat > {file_name} <<'EOF'\n"));
    script.push_str(body);
    script.push_str("EOF\n\n");
}
