//! Integration Test: Timer Ownership
//!
//! **Policy**: The reveal sequencer's round driver owns every timer. Layout,
//! lottery, config, host glue, and the CLI are event driven and never sleep.
//! Blocking sleeps are forbidden everywhere.
//!
//! **Exceptions**: test code (anything inside a `#[cfg(test)]` module).

use architectural_enforcement::{find_violations, report, CodeLine};

/// The only production file allowed to create timers
const TIMER_OWNER: &str = "reveal/core/src/sequencer/driver.rs";

const CRATES: &[&str] = &["reveal/core/src", "reveal/cli/src"];

fn is_timer(line: &CodeLine) -> bool {
    let code = &line.code;
    code.contains("::sleep(")
        || code.contains("sleep_until(")
        || code.contains("time::interval(")
        || code.contains("interval_at(")
        || code.contains("time::timeout(")
}

#[test]
fn test_timers_only_in_round_driver() {
    let mut violations = Vec::new();
    for dir in CRATES {
        violations.extend(find_violations(dir, |line| {
            is_timer(line) && !line.path.ends_with(TIMER_OWNER)
        }));
    }

    report(
        "Timers found outside the round driver (the sequencer owns all timers)",
        &violations,
    );
}

#[test]
fn test_no_blocking_sleep() {
    let mut violations = Vec::new();
    for dir in CRATES {
        violations.extend(find_violations(dir, |line| {
            line.code.contains("thread::sleep")
        }));
    }

    report("Blocking std::thread::sleep in production code", &violations);
}

#[test]
fn test_round_driver_exists() {
    let driver = architectural_enforcement::workspace_root().join(TIMER_OWNER);
    assert!(
        driver.exists(),
        "{TIMER_OWNER} moved; update the timer ownership policy"
    );
}
