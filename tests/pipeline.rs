//! End-to-end scenarios through the public `analyze` entry point.

use std::time::{Duration, Instant};

use polyglot_analyzer::analyze;
use polyglot_analyzer::diagnostics::{Diagnostic, Phase, Severity};
use polyglot_analyzer::language::Language;
use polyglot_analyzer::lexer::TokenCategory;
use polyglot_analyzer::pipeline::AnalysisReport;

fn of_phase(report: &AnalysisReport, phase: Phase) -> Vec<&Diagnostic> {
    report.diagnostics_of(phase).collect()
}

#[test]
fn test_console_log_runs() {
    let report = analyze("console.log(\"hi\")", Language::JavaScript);

    let categories: Vec<TokenCategory> = report.tokens.iter().map(|t| t.category).collect();
    assert_eq!(
        categories,
        [
            TokenCategory::Identifier,
            TokenCategory::Delimiter,
            TokenCategory::Identifier,
            TokenCategory::Delimiter,
            TokenCategory::String,
            TokenCategory::Delimiter,
        ]
    );
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert!(report.can_execute);
    let result = report.execution_result.unwrap();
    assert!(result.success);
    assert!(result.output.contains("hi"));
}

#[test]
fn test_unterminated_string() {
    let report = analyze("\"unterminated", Language::JavaScript);
    let lexical = of_phase(&report, Phase::Lexical);
    assert_eq!(lexical.len(), 1);
    assert!(lexical[0].message.contains("unterminated"));
    assert_eq!(report.tokens.len(), 1);
    assert_eq!(report.tokens[0].category, TokenCategory::String);
    assert!(!report.can_execute);
    assert!(report.execution_result.is_none());
}

#[test]
fn test_unbalanced_parentheses() {
    let report = analyze("(a, b", Language::JavaScript);
    let syntax = of_phase(&report, Phase::Syntactic);
    assert_eq!(syntax.len(), 1);
    assert_eq!(syntax[0].severity, Severity::Error);
    assert!(syntax[0].message.contains("unclosed `(`"));
    assert_eq!((syntax[0].line, syntax[0].column), (1, 1));
    assert!(!report.can_execute);
}

#[test]
fn test_undeclared_severity_by_language() {
    let cpp = analyze("int main() {\n    return total;\n}\n", Language::Cpp);
    let semantic = of_phase(&cpp, Phase::Semantic);
    assert_eq!(semantic.len(), 1, "{semantic:?}");
    assert_eq!(semantic[0].severity, Severity::Error);
    assert!(semantic[0].message.contains("`total`"));
    assert!(!cpp.can_execute);

    let js = analyze("console.log(total);\n", Language::JavaScript);
    let semantic = of_phase(&js, Phase::Semantic);
    assert_eq!(semantic.len(), 1);
    assert_eq!(semantic[0].severity, Severity::Warning);
    assert!(semantic[0].message.contains("`total`"));
    assert!(js.can_execute);
}

#[test]
fn test_create_table_without_columns() {
    let tsql = analyze("CREATE TABLE Users;", Language::TSql);
    let syntax = of_phase(&tsql, Phase::Syntactic);
    assert_eq!(syntax.len(), 1);
    assert!(syntax[0].message.contains("column definitions"));
    assert!(!tsql.analysis_phases.semantic.completed);

    let plsql = analyze("CREATE TABLE Users;", Language::PlSql);
    assert!(of_phase(&plsql, Phase::Syntactic).is_empty());
    let semantic = of_phase(&plsql, Phase::Semantic);
    assert!(
        semantic
            .iter()
            .any(|d| d.is_error() && d.message.contains("column definitions")),
        "{semantic:?}"
    );
}

#[test]
fn test_adversarial_input_terminates() {
    let source = "(".repeat(10_000);
    let started = Instant::now();
    let report = analyze(&source, Language::JavaScript);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(report.tokens.len(), 10_000);
    assert!(report.analysis_phases.syntax.completed);
    assert!(report.analysis_phases.syntax.errors_found > 0);
    assert!(!report.can_execute);
}

#[test]
fn test_binary_garbage_yields_report() {
    let source: String = (128u8..=255).chain(0..128).map(char::from).collect();
    for language in Language::ALL {
        let report = analyze(&source, language);
        assert!(!report.errors.is_empty(), "{language}");
        assert!(!report.can_execute, "{language}");
    }
}

#[test]
fn test_analysis_is_idempotent() {
    let source = "def area(r):\n    return 3.14 * r * r\n\nprint(area(2))\nunknown_name\n";
    let first = analyze(source, Language::Python);
    let second = analyze(source, Language::Python);
    assert_eq!(first.tokens, second.tokens);
    assert_eq!(first.parse_tree, second.parse_tree);
    assert_eq!(first.errors, second.errors);
    assert_eq!(first.symbol_table, second.symbol_table);
    assert_eq!(first.execution_result, second.execution_result);
}

#[test]
fn test_clean_programs_execute() {
    let programs = [
        (Language::JavaScript, "function add(a, b) {\n    return a + b;\n}\nconsole.log(add(1, 2));\n"),
        (Language::Python, "def greet(name):\n    print(\"Hello\", name)\n\ngreet(\"world\")\n"),
        (
            Language::Cpp,
            "#include <iostream>\nusing namespace std;\n\nint main() {\n    cout << \"Hello\" << endl;\n    return 0;\n}\n",
        ),
        (Language::Pascal, "program Hello;\nbegin\n  writeln('Hello');\nend.\n"),
        (Language::TSql, "CREATE TABLE users (id INT, name VARCHAR(50));\nSELECT name FROM users;\n"),
        (
            Language::Html,
            "<!DOCTYPE html>\n<html>\n<head><title>Home</title></head>\n<body><p>Hi</p></body>\n</html>\n",
        ),
    ];
    for (language, source) in programs {
        let report = analyze(source, language);
        let errors: Vec<_> = report.errors.iter().filter(|d| d.is_error()).collect();
        assert!(errors.is_empty(), "{language}: {errors:?}");
        assert!(report.can_execute, "{language}");
        let result = report.execution_result.unwrap();
        assert!(result.success, "{language}: {result:?}");
        assert!(!result.output.is_empty(), "{language}");
    }
}

#[test]
fn test_report_json_shape() {
    let report = analyze("let x = 1;\nconsole.log(x);\n", Language::JavaScript);
    let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(value["language"], "javascript");
    assert_eq!(value["canExecute"], true);
    assert_eq!(value["tokens"][0]["type"], "KEYWORD");
    assert_eq!(value["tokens"][0]["value"], "let");
    assert_eq!(value["symbolTable"][0]["name"], "x");
    assert_eq!(value["analysisPhases"]["semantic"]["symbolsFound"], 1);
    assert_eq!(value["executionResult"]["success"], true);
    assert!(value["processingTime"].is_number());
}

#[test]
fn test_python_bound_names_resolve() {
    let programs = [
        "with open(\"f\") as fh:\n    data = fh.read()\n    print(data)\n",
        "try:\n    value = int(\"x\")\nexcept ValueError as e:\n    print(e)\n",
        "double = lambda x: x * 2\nprint(double(3))\n",
    ];
    for source in programs {
        let report = analyze(source, Language::Python);
        assert!(report.errors.is_empty(), "{source:?}: {:?}", report.errors);
        assert!(report.can_execute, "{source:?}");
    }
}

#[test]
fn test_pascal_function_named_like_a_type() {
    let source = "program P;\nfunction Double(x: integer): integer;\nbegin\n  Double := x * 2;\nend;\nbegin\n  writeln(Double(2));\nend.\n";
    let report = analyze(source, Language::Pascal);
    let errors: Vec<_> = report.errors.iter().filter(|d| d.is_error()).collect();
    assert!(errors.is_empty(), "{errors:?}");
    assert!(report.can_execute);
    assert!(report.symbol_table.iter().any(|s| s.name == "Double"));
}

#[test]
fn test_cpp_declaration_after_missing_semicolon() {
    let source = "int main() {\n    int x = 5\n    int y = 6;\n    return x + y;\n}\n";
    let report = analyze(source, Language::Cpp);
    assert!(of_phase(&report, Phase::Semantic).is_empty(), "{:?}", report.errors);
    assert!(report.can_execute);
}
