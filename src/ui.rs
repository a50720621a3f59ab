// UI layer: interactive prompts via `dialoguer` and a progress spinner via
// `indicatif`. Only used for values missing from the command line.

use std::time::Duration;

use anyhow::Result;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};

pub const HOST_PROMPT: &str = "Your pinry-instance host like 'https://pin.xxx.com'";
pub const TOKEN_PROMPT: &str = "Your token in My -> Profile page";

/// Return `value` if given, otherwise prompt for the host.
pub fn host_or_prompt(value: Option<String>) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::new().with_prompt(HOST_PROMPT).interact_text()?),
    }
}

/// Return `value` if given, otherwise prompt for the token with hidden
/// input.
pub fn token_or_prompt(value: Option<String>) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Password::new().with_prompt(TOKEN_PROMPT).interact()?),
    }
}

/// Spinner drawn on stderr while a blocking request runs. Hidden when
/// stderr is not a terminal.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
