//! Interactive menu loop.

use super::output::Status;
use crate::manager::{Command, LifecycleController, ListFilter, Prompt, Result, USAGE};
use std::future::Future;
use tokio::signal;
use tracing::{error, info};

const ENTER_COMMAND: &str = "\nEnter the command: ";
const NOT_RECOGNIZED: &str = "Error: Command is not recognized! Please select a valid command\n";

/// What one round of the menu decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Quit,
}

/// Run the menu until `exit`, end of input or Ctrl-C.
///
/// On a host without managed containers the gateway is installed and the menu
/// returns, unless provisioning is disabled, in which case only the image is
/// pulled and the menu continues.
pub async fn run_menu(controller: &mut LifecycleController<'_>, prompt: &dyn Prompt) -> Result<()> {
    run_menu_until(controller, prompt, signal::ctrl_c).await
}

/// [`run_menu`], quitting when a future made by `interrupted` resolves.
///
/// A fresh future is made for every wait, so an interrupt consumed by an
/// attached shell does not also end the menu. Waiting for input and running
/// a command are both abandoned on interrupt; a shell session is not.
pub async fn run_menu_until<F, Fut, T>(
    controller: &mut LifecycleController<'_>,
    prompt: &dyn Prompt,
    mut interrupted: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
{
    info!("Running in interactive mode");

    let existing = controller.managed_containers(ListFilter::All, None).await?;
    if existing.is_empty() {
        if !controller.config().no_provision {
            return controller.execute(Command::Install).await;
        }
        controller.execute(Command::Download).await?;
    }

    controller.execute(Command::List(ListFilter::All)).await?;
    controller.reporter().note(USAGE)?;

    while menu_step(controller, prompt, &mut interrupted).await? == Step::Continue {}

    info!("Leaving interactive mode");
    Ok(())
}

async fn menu_step<F, Fut, T>(
    controller: &mut LifecycleController<'_>,
    prompt: &dyn Prompt,
    interrupted: &mut F,
) -> Result<Step>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
{
    controller.reporter().prompt(ENTER_COMMAND)?;

    let read = tokio::select! {
        line = prompt.read_line() => Some(line),
        _ = interrupted() => None,
    };
    let Some(line) = read.transpose()?.flatten() else {
        return Ok(Step::Quit);
    };
    let input = line.trim().to_lowercase();
    if input == "exit" {
        return Ok(Step::Quit);
    }

    let Ok(command) = input.parse::<Command>() else {
        let reporter = controller.reporter();
        reporter.message(Status::Error, NOT_RECOGNIZED)?;
        reporter.note(USAGE)?;
        return Ok(Step::Continue);
    };

    let result = if matches!(command, Command::Shell(_)) {
        controller.execute(command).await
    } else {
        let outcome = tokio::select! {
            result = controller.execute(command) => Some(result),
            _ = interrupted() => None,
        };
        match outcome {
            Some(result) => result,
            None => return Ok(Step::Quit),
        }
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        controller
            .reporter()
            .message(Status::Error, &format!("Error: {}", e))?;
    }
    Ok(Step::Continue)
}
