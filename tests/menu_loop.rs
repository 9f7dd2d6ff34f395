//! Interactive menu behaviour.

mod common;

use async_trait::async_trait;
use common::{FakeHost, FakeRuntime, Harness, IMAGE};
use edgectl::cli::{OutputFormat, run_menu, run_menu_until};
use edgectl::manager::{Prompt, USAGE};
use std::io;
use std::time::Duration;

/// An operator who never types anything.
struct IdlePrompt;

#[async_trait]
impl Prompt for IdlePrompt {
    async fn read_line(&self) -> io::Result<Option<String>> {
        std::future::pending().await
    }
}

fn one_gateway() -> FakeRuntime {
    FakeRuntime::new().with_container(
        "edge-gateway-container",
        "running",
        &[("edge.gateway_id", "gw"), ("edge.container_version", "2")],
    )
}

#[tokio::test]
async fn test_unrecognized_command_then_exit() {
    let harness = Harness::new(one_gateway(), FakeHost::x86(Some(535)))
        .with_input(&["reboot", "LIST", "exit", "list"]);

    let mut controller = harness.controller(OutputFormat::Table);
    run_menu(&mut controller, &harness.prompt).await.unwrap();

    // "exit" stops reading; the trailing "list" is never consumed
    assert_eq!(harness.prompt.reads(), 3);

    let output = harness.out.contents();
    assert!(output.contains("Error: Command is not recognized! Please select a valid command"));
    assert_eq!(output.matches(USAGE).count(), 2);
    assert_eq!(output.matches("List of containers installed:").count(), 2);
    assert_eq!(output.matches("Enter the command:").count(), 3);
}

#[tokio::test]
async fn test_end_of_input_quits() {
    let harness = Harness::new(one_gateway(), FakeHost::x86(Some(535)));

    let mut controller = harness.controller(OutputFormat::Table);
    run_menu(&mut controller, &harness.prompt).await.unwrap();

    assert_eq!(harness.prompt.reads(), 1);
    assert!(harness.runtime.mutations().is_empty());
}

#[tokio::test]
async fn test_first_boot_installs_and_exits() {
    let harness = Harness::new(FakeRuntime::new(), FakeHost::x86(Some(535))).with_input(&["list"]);

    let mut controller = harness.controller(OutputFormat::Table);
    run_menu(&mut controller, &harness.prompt).await.unwrap();

    assert_eq!(harness.prompt.reads(), 0);
    let created = harness.runtime.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].0, "edge-gateway-container");
    assert!(harness.out.contents().contains("Container started! "));
}

#[tokio::test]
async fn test_first_boot_without_provisioning_only_pulls() {
    let mut harness =
        Harness::new(FakeRuntime::new(), FakeHost::x86(Some(535))).with_input(&["exit"]);
    harness.config.no_provision = true;

    let mut controller = harness.controller(OutputFormat::Table);
    run_menu(&mut controller, &harness.prompt).await.unwrap();

    assert!(harness.runtime.created().is_empty());
    assert_eq!(harness.runtime.mutations(), vec![format!("pull {}", IMAGE)]);
    assert_eq!(harness.prompt.reads(), 1);
    assert!(harness.out.contents().contains("No edge containers found"));
}

#[tokio::test]
async fn test_menu_reports_soft_failures_and_continues() {
    let harness = Harness::new(one_gateway(), FakeHost::jetson("32.7.1"))
        .with_input(&["restart", "exit"]);

    let mut controller = harness.controller(OutputFormat::Table);
    run_menu(&mut controller, &harness.prompt).await.unwrap();

    assert_eq!(harness.prompt.reads(), 2);
    assert!(harness.runtime.created().is_empty());
    assert!(
        harness
            .out
            .contents()
            .contains("Couldn't restart the container because JetPack is outdated")
    );
}

#[tokio::test]
async fn test_interrupt_while_waiting_for_input_quits() {
    let harness = Harness::new(one_gateway(), FakeHost::x86(Some(535)));
    let idle = IdlePrompt;

    let mut controller = harness.controller(OutputFormat::Table);
    let quit = tokio::time::timeout(
        Duration::from_secs(5),
        run_menu_until(&mut controller, &idle, || {
            tokio::time::sleep(Duration::from_millis(20))
        }),
    )
    .await;

    assert!(matches!(quit, Ok(Ok(()))));
    assert!(harness.runtime.mutations().is_empty());
    assert_eq!(harness.out.contents().matches("Enter the command:").count(), 1);
}

#[tokio::test]
async fn test_line_after_shell_reaches_the_menu() {
    let harness = Harness::new(one_gateway(), FakeHost::x86(Some(535)))
        .with_input(&["shell", "1", "ls", "stop", "1", "exit"]);

    let mut controller = harness.controller(OutputFormat::Table);
    run_menu(&mut controller, &harness.prompt).await.unwrap();

    assert_eq!(harness.runtime.shell_input(), vec!["ls"]);
    assert_eq!(
        harness.runtime.mutations(),
        vec![
            "shell edge-gateway-container".to_string(),
            "kill edge-gateway-container".to_string(),
        ]
    );
    assert_eq!(harness.prompt.reads(), 6);
}
