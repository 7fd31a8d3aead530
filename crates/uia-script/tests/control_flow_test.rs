//! Control-flow semantics: goto, labels, loops, break
//!
//! Covers label visibility (strictly scope-local), cursor movement on
//! goto, loop iteration counts, and the documented no-op for break/return
//! outside their natural context.

use std::sync::Arc;
use uia_driver::MockDriver;
use uia_script::{ExecutionResult, Script, ScriptExecutor};

async fn run(yaml: &str, driver: &MockDriver) -> ExecutionResult {
    let script = Script::from_yaml_str(yaml).expect("script must parse");
    ScriptExecutor::new(Arc::new(driver.clone()), script)
        .execute()
        .await
}

#[tokio::test]
async fn test_goto_skips_to_label() {
    let driver = MockDriver::new();
    let outcome = run(
        r#"
name: "Goto Test Script"
steps:
  - wait:
      duration: 10
      on_success: { action: "goto", target: "3" }
  - label: "1"
  - wait: { duration: 20 }
  - label: "2"
  - wait: { duration: 20 }
  - label: "3"
  - wait: { duration: 20 }
  - label: "4"
  - wait: { duration: 20 }
"#,
        &driver,
    )
    .await;

    // Labels "1" and "2" are skipped entirely; the jump lands on label "3",
    // which contributes its own no-op result before the next wait runs.
    assert!(outcome.success);
    assert_eq!(outcome.results.len(), 5);
    assert_eq!(outcome.summary.successful, 5);

    let commands: Vec<_> = outcome.results.iter().map(|r| r.command.as_str()).collect();
    assert_eq!(commands, vec!["wait", "label", "wait", "label", "wait"]);
    assert_eq!(outcome.results[1].params, serde_json::json!("3"));
}

#[tokio::test]
async fn test_goto_cannot_cross_scope_boundaries() {
    let driver = MockDriver::new();
    let outcome = run(
        r#"
steps:
  - wait: { duration: 1 }
  - label: "1"
  - loop:
      count: 3
      steps:
        - wait:
            duration: 1
            on_success: { action: "goto", target: "1" }
  - wait: { duration: 1 }
"#,
        &driver,
    )
    .await;

    // The label lives in the root scope; from inside the loop body it is
    // unreachable and the run aborts.
    assert!(!outcome.success);
    assert!(outcome
        .error
        .as_deref()
        .unwrap()
        .contains("label not found: 1"));
    assert_eq!(outcome.results.len(), 3);
    assert!(!outcome.results[2].success);
}

#[tokio::test]
async fn test_goto_within_loop_scope() {
    let driver = MockDriver::new();
    driver.set_element("button.next", true);

    let outcome = run(
        r#"
steps:
  - loop:
      count: 2
      steps:
        - wait:
            duration: 1
            on_success: { action: "goto", target: "tap" }
        - launch_app: { app_id: "com.never" }
        - label: "tap"
        - click: { selector: "button.next" }
"#,
        &driver,
    )
    .await;

    assert!(outcome.success);
    let taps = driver
        .actions()
        .iter()
        .filter(|a| a.as_str() == "tap button.next")
        .count();
    assert_eq!(taps, 2);
    assert!(!driver.actions().contains(&"activate com.never".to_string()));
}

#[tokio::test]
async fn test_loop_runs_body_exactly_count_times() {
    let driver = MockDriver::new();
    driver.set_element("button.next", true);

    let outcome = run(
        r#"
steps:
  - loop:
      count: 3
      steps:
        - click: { selector: "button.next" }
"#,
        &driver,
    )
    .await;

    assert!(outcome.success);
    // The loop collapses into one result entry
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].command, "loop");

    let taps = driver
        .actions()
        .iter()
        .filter(|a| a.starts_with("tap "))
        .count();
    assert_eq!(taps, 3);
}

#[tokio::test]
async fn test_break_on_failure_stops_loop_without_raising() {
    let driver = MockDriver::new();
    let outcome = run(
        r#"
steps:
  - loop:
      count: 5
      steps:
        - click:
            selector: "button.flaky"
            on_failure: { action: "break" }
  - wait: { duration: 1 }
"#,
        &driver,
    )
    .await;

    assert!(outcome.success);
    assert_eq!(outcome.results.len(), 2);
    // The loop step succeeds, carrying the breaking step's error as result
    assert!(outcome.results[0].success);
    assert!(outcome.results[0]
        .result
        .as_ref()
        .unwrap()
        .as_str()
        .unwrap()
        .contains("button.flaky"));

    // Only the first iteration looked for the element
    let finds = driver
        .actions()
        .iter()
        .filter(|a| a.starts_with("find "))
        .count();
    assert_eq!(finds, 1);
}

#[tokio::test]
async fn test_break_on_success_stops_loop_early() {
    let driver = MockDriver::new();
    driver.set_element("button.next", true);

    let outcome = run(
        r#"
steps:
  - loop:
      count: 5
      steps:
        - click:
            selector: "button.next"
            on_success: { action: "break" }
"#,
        &driver,
    )
    .await;

    assert!(outcome.success);
    let taps = driver
        .actions()
        .iter()
        .filter(|a| a.starts_with("tap "))
        .count();
    assert_eq!(taps, 1);
}

#[tokio::test]
async fn test_loop_count_must_be_positive() {
    let driver = MockDriver::new();
    for count in ["0", "-2"] {
        let outcome = run(
            &format!(
                r#"
steps:
  - loop:
      count: {count}
      steps:
        - wait: {{ duration: 1 }}
"#
            ),
            &driver,
        )
        .await;

        assert!(!outcome.success);
        assert!(outcome
            .error
            .as_deref()
            .unwrap()
            .contains("loop count must be a positive integer"));
    }
}

#[tokio::test]
async fn test_malformed_control_flow_steps_are_fatal() {
    let driver = MockDriver::new();

    let outcome = run(
        r#"
steps:
  - loop:
      count: "three"
      steps:
        - wait: { duration: 1 }
"#,
        &driver,
    )
    .await;
    assert!(!outcome.success);
    assert!(outcome
        .error
        .as_deref()
        .unwrap()
        .contains("malformed loop step"));

    let outcome = run(
        r#"
steps:
  - callfunc: { func: "no name attribute" }
"#,
        &driver,
    )
    .await;
    assert!(!outcome.success);
    assert!(outcome
        .error
        .as_deref()
        .unwrap()
        .contains("malformed callfunc step"));
}

#[tokio::test]
async fn test_break_outside_loop_is_a_no_op() {
    let driver = MockDriver::new();
    let outcome = run(
        r#"
steps:
  - wait:
      duration: 1
      on_success: { action: "break" }
  - launch_app: { app_id: "com.example.app" }
"#,
        &driver,
    )
    .await;

    assert!(outcome.success);
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(driver.actions(), vec!["activate com.example.app"]);
}

#[tokio::test]
async fn test_return_outside_function_is_a_no_op() {
    let driver = MockDriver::new();
    let outcome = run(
        r#"
steps:
  - wait:
      duration: 1
      on_success: { action: "return" }
  - launch_app: { app_id: "com.example.app" }
"#,
        &driver,
    )
    .await;

    assert!(outcome.success);
    assert_eq!(driver.actions(), vec!["activate com.example.app"]);
}

#[tokio::test]
async fn test_duplicate_label_aborts_before_any_step() {
    let driver = MockDriver::new();
    let outcome = run(
        r#"
steps:
  - label: "a"
  - launch_app: { app_id: "com.example.app" }
  - label: "a"
"#,
        &driver,
    )
    .await;

    assert!(!outcome.success);
    assert!(outcome.error.as_deref().unwrap().contains("duplicate label: a"));
    assert!(outcome.results.is_empty());
    assert!(driver.actions().is_empty());
}

#[tokio::test]
async fn test_empty_label_aborts() {
    let driver = MockDriver::new();
    let outcome = run(
        r#"
steps:
  - label: ""
"#,
        &driver,
    )
    .await;

    assert!(!outcome.success);
    assert!(outcome
        .error
        .as_deref()
        .unwrap()
        .contains("label name must not be empty"));
}

#[tokio::test]
async fn test_on_failure_goto_unknown_label_is_fatal() {
    let driver = MockDriver::new();
    let outcome = run(
        r#"
steps:
  - click:
      selector: "button.missing"
      on_failure: { action: "goto", target: "nowhere" }
  - wait: { duration: 1 }
"#,
        &driver,
    )
    .await;

    // Control-resolution errors abort even though the step had a handler
    assert!(!outcome.success);
    assert!(outcome
        .error
        .as_deref()
        .unwrap()
        .contains("label not found: nowhere"));
    assert_eq!(outcome.results.len(), 1);
}

#[tokio::test]
async fn test_on_failure_goto_takes_fallback_path() {
    let driver = MockDriver::new();
    driver.set_element("button.secondary", true);

    let outcome = run(
        r#"
steps:
  - click:
      selector: "button.primary"
      on_failure: { action: "goto", target: "fallback" }
  - launch_app: { app_id: "com.primary" }
  - label: "fallback"
  - click: { selector: "button.secondary" }
"#,
        &driver,
    )
    .await;

    assert!(outcome.success);
    assert_eq!(outcome.summary.failed, 1);
    let actions = driver.actions();
    assert!(actions.contains(&"tap button.secondary".to_string()));
    assert!(!actions.contains(&"activate com.primary".to_string()));
}

#[tokio::test]
async fn test_loop_inside_function_breaks_only_the_loop() {
    let driver = MockDriver::new();
    driver.set_element("button.next", true);

    let outcome = run(
        r#"
functions:
  - name: "tap_until_gone"
    steps:
      - loop:
          count: 4
          steps:
            - click:
                selector: "button.next"
                on_success: { action: "break" }
      - launch_app: { app_id: "com.after.loop" }
steps:
  - callfunc: { name: "tap_until_gone" }
"#,
        &driver,
    )
    .await;

    // Break stops the loop, not the surrounding function body
    assert!(outcome.success);
    let actions = driver.actions();
    assert_eq!(
        actions.iter().filter(|a| a.starts_with("tap ")).count(),
        1
    );
    assert!(actions.contains(&"activate com.after.loop".to_string()));
}
