//! Integration Test: Panic-Free Library Code
//!
//! **Policy**: `reveal-core` reports failures through `RevealError` or
//! `ConfigError`. Production code must not `unwrap()`, `expect()`, or
//! `panic!()`; the CLI may only use them in tests.

use architectural_enforcement::{find_violations, report, CodeLine};

fn panics(line: &CodeLine) -> bool {
    let code = line.code.trim_start();
    // Doc examples are comments and already stripped; skip attribute lines too
    if code.starts_with("#[") {
        return false;
    }
    line.code.contains(".unwrap()")
        || line.code.contains(".expect(")
        || line.code.contains("panic!(")
        || line.code.contains("unreachable!(")
}

#[test]
fn test_no_panics_in_core() {
    let violations = find_violations("reveal/core/src", panics);
    report("Panicking call in reveal-core production code", &violations);
}

#[test]
fn test_no_panics_in_cli() {
    let violations = find_violations("reveal/cli/src", panics);
    report("Panicking call in reveal-cli production code", &violations);
}
