//! Interactive prompts.

use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use crate::error::{Result, UpsyncError};

use super::{Prompt, PromptOption, PromptResult, PromptType, UserInterface};

/// Convert dialoguer errors to UpsyncError.
fn map_dialoguer_err(e: dialoguer::Error) -> UpsyncError {
    UpsyncError::Io(e.into())
}

/// Dialoguer theme without the default yellow `?` prefix.
fn prompt_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("".to_string()),
        ..ColorfulTheme::default()
    }
}

/// Prompt the user on a real terminal.
pub fn prompt_user(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    match &prompt.prompt_type {
        PromptType::Confirm => prompt_confirm(prompt, term),
        PromptType::Input => prompt_input(prompt, term),
        PromptType::Select { options } => prompt_select(prompt, options, term),
    }
}

fn prompt_confirm(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    let default = prompt
        .default
        .as_ref()
        .map(|s| s.to_lowercase() == "true" || s == "y" || s == "yes")
        .unwrap_or(true);

    let result = Confirm::with_theme(&prompt_theme())
        .with_prompt(&prompt.question)
        .default(default)
        .interact_on(term)
        .map_err(map_dialoguer_err)?;

    Ok(PromptResult::Bool(result))
}

fn prompt_input(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    let theme = prompt_theme();
    let input = Input::<String>::with_theme(&theme)
        .with_prompt(&prompt.question)
        .allow_empty(true);

    let result: String = if let Some(default) = &prompt.default {
        input
            .default(default.clone())
            .interact_text_on(term)
            .map_err(map_dialoguer_err)?
    } else {
        input.interact_text_on(term).map_err(map_dialoguer_err)?
    };

    Ok(PromptResult::String(result))
}

fn prompt_select(prompt: &Prompt, options: &[PromptOption], term: &Term) -> Result<PromptResult> {
    let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();

    let default_idx = prompt
        .default
        .as_ref()
        .and_then(|d| options.iter().position(|o| o.value == *d))
        .unwrap_or(0);

    let selection = Select::with_theme(&prompt_theme())
        .with_prompt(&prompt.question)
        .items(&labels)
        .default(default_idx)
        .interact_on(term)
        .map_err(map_dialoguer_err)?;

    options
        .get(selection)
        .map(|o| PromptResult::String(o.value.clone()))
        .ok_or_else(|| UpsyncError::InvalidParameter {
            name: prompt.key.clone(),
            message: format!("selection {} out of range", selection),
        })
}

/// Ask a yes/no question.
pub fn ask_confirm(
    ui: &mut dyn UserInterface,
    key: &str,
    question: &str,
    default: bool,
) -> Result<bool> {
    let prompt = Prompt {
        key: key.to_string(),
        question: question.to_string(),
        prompt_type: PromptType::Confirm,
        default: Some(if default { "yes" } else { "no" }.to_string()),
    };
    Ok(ui.prompt(&prompt)?.as_bool().unwrap_or(default))
}

/// Ask for free text. Surrounding whitespace is trimmed; the result may be empty.
pub fn ask_input(
    ui: &mut dyn UserInterface,
    key: &str,
    question: &str,
    default: Option<&str>,
) -> Result<String> {
    let prompt = Prompt {
        key: key.to_string(),
        question: question.to_string(),
        prompt_type: PromptType::Input,
        default: default.map(str::to_string),
    };
    Ok(ui.prompt(&prompt)?.as_string().trim().to_string())
}

/// Ask the user to pick one option; returns the option's value.
///
/// Answers that match no option fall back to `default`.
pub fn ask_select(
    ui: &mut dyn UserInterface,
    key: &str,
    question: &str,
    options: Vec<PromptOption>,
    default: &str,
) -> Result<String> {
    let prompt = Prompt {
        key: key.to_string(),
        question: question.to_string(),
        prompt_type: PromptType::Select {
            options: options.clone(),
        },
        default: Some(default.to_string()),
    };
    let answer = ui.prompt(&prompt)?.as_string();
    if options.iter().any(|o| o.value == answer) {
        Ok(answer)
    } else {
        Ok(default.to_string())
    }
}
