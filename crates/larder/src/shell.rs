// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `larder shell` command implementation.
//!
//! Interactive loop with readline history. Plain lines ask for a recipe,
//! slash commands cover the rest. Ctrl+C while a response streams cancels
//! it; Ctrl+C or Ctrl+D at the prompt leaves.

use colored::Colorize;
use larder_agent::GenerationRequest;
use larder_core::LarderError;
use larder_recipes::IdeaContext;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::app::App;
use crate::commands;
use crate::generate::{conclude, follow};

const HELP: &str = "\
  <text>              ask for a recipe
  /ideas <text>       ask for recipe ideas
  /use <id>           turn a stored idea into a recipe
  /retry              run the last request again
  /provider [id]      show or switch the provider
  /model [name]       set or clear the model override
  /history            list saved recipes
  /pantry             list pantry items
  /shopping           show the shopping list
  /clear              clear chat and recipe history
  /quit               leave";

/// A parsed shell line.
#[derive(Debug, PartialEq, Eq)]
pub enum ShellInput<'a> {
    Empty,
    Quit,
    Help,
    Recipe(&'a str),
    Ideas(&'a str),
    UseIdea(&'a str),
    Retry,
    Provider(Option<&'a str>),
    Model(Option<&'a str>),
    History,
    Pantry,
    Shopping,
    Clear,
    Unknown(&'a str),
}

pub fn parse_line(line: &str) -> ShellInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ShellInput::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ShellInput::Recipe(line);
    };
    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    let arg = (!rest.is_empty()).then_some(rest);
    match name {
        "quit" | "exit" | "q" => ShellInput::Quit,
        "help" | "?" => ShellInput::Help,
        "ideas" => ShellInput::Ideas(rest),
        "use" => arg.map_or(ShellInput::Unknown(line), ShellInput::UseIdea),
        "retry" => ShellInput::Retry,
        "provider" => ShellInput::Provider(arg),
        "model" => ShellInput::Model(arg),
        "history" => ShellInput::History,
        "pantry" => ShellInput::Pantry,
        "shopping" => ShellInput::Shopping,
        "clear" => ShellInput::Clear,
        _ => ShellInput::Unknown(line),
    }
}

/// Per-session selections.
struct Session {
    provider: String,
    model: Option<String>,
}

impl Session {
    fn target(&self, request: GenerationRequest) -> GenerationRequest {
        match &self.model {
            Some(model) => request.with_model(model.clone()),
            None => request,
        }
    }
}

/// Runs the `larder shell` loop.
pub async fn run_shell(app: &App) -> Result<(), LarderError> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| LarderError::Internal(format!("failed to initialize readline: {e}")))?;
    let mut session = Session {
        provider: app.provider(None).await,
        model: None,
    };

    println!("{}", "larder shell".bold().green());
    println!(
        "Provider {}. Type {} for commands, {} to exit.\n",
        session.provider.cyan(),
        "/help".yellow(),
        "/quit".yellow()
    );

    let prompt = format!("{}> ", "larder".green());
    loop {
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };
        let input = parse_line(&line);
        if input == ShellInput::Empty {
            continue;
        }
        let _ = rl.add_history_entry(line.as_str());
        if input == ShellInput::Quit {
            break;
        }
        if let Err(e) = handle_input(app, &mut session, input).await {
            eprintln!("{}: {e}", "error".red());
        }
    }

    app.orchestrator.reset();
    println!("{}", "goodbye".dimmed());
    Ok(())
}

async fn handle_input(app: &App, session: &mut Session, input: ShellInput<'_>) -> Result<(), LarderError> {
    let locale = app.locale().await;
    match input {
        ShellInput::Empty | ShellInput::Quit => Ok(()),
        ShellInput::Help => {
            println!("{HELP}");
            Ok(())
        }
        ShellInput::Recipe(text) => {
            let request = session.target(GenerationRequest::recipe(session.provider.clone(), text));
            conclude(follow(&app.orchestrator, request, locale).await, locale)
        }
        ShellInput::Ideas(text) => {
            let preferences = app.store().preferences().await;
            let context = IdeaContext {
                servings: preferences.default_servings,
                ingredients: app.store().pantry().await.into_iter().map(|p| p.name).collect(),
                ..Default::default()
            };
            let notes = (!text.is_empty()).then_some(text);
            let prompt = larder_agent::prompt::ideas_prompt(
                &context,
                app.config.generation.ideas_count,
                notes,
                locale,
            );
            let request = session.target(GenerationRequest::ideas(session.provider.clone(), prompt, context));
            conclude(follow(&app.orchestrator, request, locale).await, locale)
        }
        ShellInput::UseIdea(id) => {
            let ideas = app.store().recipe_ideas().await;
            let idea = crate::generate::find_idea(&ideas, id)?;
            let prompt = larder_agent::prompt::idea_recipe_prompt(idea, locale);
            let request = session.target(
                GenerationRequest::recipe(session.provider.clone(), prompt).from_idea(idea.id.clone()),
            );
            conclude(follow(&app.orchestrator, request, locale).await, locale)
        }
        ShellInput::Retry => match app.orchestrator.last_request() {
            Some(request) => conclude(follow(&app.orchestrator, request, locale).await, locale),
            None => {
                println!("Nothing to retry yet.");
                Ok(())
            }
        },
        ShellInput::Provider(None) => {
            println!("provider: {}", session.provider.cyan());
            Ok(())
        }
        ShellInput::Provider(Some(id)) => {
            if !app.orchestrator.registry().contains(id) {
                return Err(LarderError::AdapterNotFound {
                    adapter_type: "provider".to_string(),
                    name: id.to_string(),
                });
            }
            session.provider = id.to_string();
            debug!(provider = id, "shell provider switched");
            println!("provider: {}", session.provider.cyan());
            Ok(())
        }
        ShellInput::Model(model) => {
            session.model = model.map(str::to_string);
            match &session.model {
                Some(model) => println!("model: {}", model.cyan()),
                None => println!("model: provider default"),
            }
            Ok(())
        }
        ShellInput::History => commands::show_history(app, None, false).await,
        ShellInput::Pantry => commands::list_pantry(app).await,
        ShellInput::Shopping => commands::show_shopping_list(app).await,
        ShellInput::Clear => commands::clear_history(app, false).await,
        ShellInput::Unknown(line) => {
            eprintln!("unknown command `{line}`, try /help");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_recipe_request() {
        assert_eq!(parse_line("  rice and beans "), ShellInput::Recipe("rice and beans"));
        assert_eq!(parse_line("   "), ShellInput::Empty);
    }

    #[test]
    fn slash_commands_parse_arguments() {
        assert_eq!(parse_line("/quit"), ShellInput::Quit);
        assert_eq!(parse_line("/exit"), ShellInput::Quit);
        assert_eq!(parse_line("/ideas something cozy"), ShellInput::Ideas("something cozy"));
        assert_eq!(parse_line("/ideas"), ShellInput::Ideas(""));
        assert_eq!(parse_line("/use 3f2a"), ShellInput::UseIdea("3f2a"));
        assert_eq!(parse_line("/provider"), ShellInput::Provider(None));
        assert_eq!(parse_line("/provider  gemini "), ShellInput::Provider(Some("gemini")));
        assert_eq!(parse_line("/model gpt-4o"), ShellInput::Model(Some("gpt-4o")));
        assert_eq!(parse_line("/retry"), ShellInput::Retry);
    }

    #[test]
    fn unknown_and_incomplete_commands() {
        assert_eq!(parse_line("/bake"), ShellInput::Unknown("/bake"));
        assert_eq!(parse_line("/use"), ShellInput::Unknown("/use"));
    }
}
