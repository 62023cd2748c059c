// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Larder - recipes from the ingredients you have.
//!
//! This is the binary entry point for the `larder` command.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod check;
mod commands;
mod generate;
mod render;
mod shell;

use clap::{Parser, Subcommand};
use colored::Colorize;
use larder_core::LarderError;

use crate::app::App;
use crate::commands::{IdeaListArgs, ProfileArgs};
use crate::generate::{IdeasArgs, RecipeArgs, TargetArgs};

/// Larder - recipes from the ingredients you have.
#[derive(Parser, Debug)]
#[command(name = "larder", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a recipe from ingredients.
    Generate(RecipeArgs),
    /// Ask for, browse and cook recipe ideas.
    Ideas {
        #[command(subcommand)]
        action: IdeasCommand,
    },
    /// Saved recipes and chat history.
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
    /// Consolidated shopping list built from saved recipes.
    Shopping {
        #[command(subcommand)]
        action: ShoppingCommand,
    },
    /// Ingredients you already have.
    Pantry {
        #[command(subcommand)]
        action: PantryCommand,
    },
    /// Provider API keys.
    Key {
        #[command(subcommand)]
        action: KeyCommand,
    },
    /// Cooking profile and preferences.
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
    /// List available providers.
    Providers {
        /// Filter by id or name.
        query: Option<String>,
    },
    /// Launch an interactive session.
    Shell,
    /// Inspect Larder configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum IdeasCommand {
    /// Ask for a fresh batch of ideas.
    New(IdeasArgs),
    /// List stored ideas.
    List(IdeaListArgs),
    /// Turn a stored idea into a full recipe.
    Use {
        /// Idea id (a prefix is enough) or title.
        id: String,
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// List saved recipes, or print one in full.
    Show {
        /// Recipe id prefix or title.
        id: Option<String>,
        /// Show the chat transcript instead.
        #[arg(long)]
        chat: bool,
    },
    /// Forget chat and recipe history.
    Clear {
        /// Also forget stored ideas.
        #[arg(long)]
        ideas: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ShoppingCommand {
    /// Add the ingredients of saved recipes. Defaults to the newest recipe.
    Add {
        /// Recipe id prefixes or titles.
        recipes: Vec<String>,
        /// Keep ingredients the pantry already covers.
        #[arg(long)]
        include_pantry: bool,
    },
    Show,
    Clear,
}

#[derive(Subcommand, Debug)]
enum PantryCommand {
    Add {
        #[arg(required = true)]
        names: Vec<String>,
        /// Quantity on hand, e.g. "2 kg".
        #[arg(long)]
        amount: Option<String>,
    },
    List,
    Clear,
}

#[derive(Subcommand, Debug)]
enum KeyCommand {
    /// Store an API key for a provider.
    Set { provider: String, key: String },
    /// Remove a stored API key.
    Remove { provider: String },
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Show,
    /// Change profile fields; unspecified fields are kept.
    Set(ProfileArgs),
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate configuration, storage and provider setup.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match larder_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            larder_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.app.log_level);

    let Some(command) = cli.command else {
        println!("larder: use --help for available commands");
        return;
    };

    let app = match App::open(config).await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{}: {e}", "error".red());
            std::process::exit(1);
        }
    };

    if let Err(e) = dispatch(&app, command).await {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

async fn dispatch(app: &App, command: Commands) -> Result<(), LarderError> {
    match command {
        Commands::Generate(args) => generate::run_generate(app, args).await,
        Commands::Ideas { action } => match action {
            IdeasCommand::New(args) => generate::run_ideas_new(app, args).await,
            IdeasCommand::List(args) => commands::list_ideas(app, &args).await,
            IdeasCommand::Use { id, target } => generate::run_ideas_use(app, &id, target).await,
        },
        Commands::History { action } => match action {
            HistoryCommand::Show { id, chat } => commands::show_history(app, id.as_deref(), chat).await,
            HistoryCommand::Clear { ideas } => commands::clear_history(app, ideas).await,
        },
        Commands::Shopping { action } => match action {
            ShoppingCommand::Add {
                recipes,
                include_pantry,
            } => commands::add_to_shopping_list(app, &recipes, include_pantry).await,
            ShoppingCommand::Show => commands::show_shopping_list(app).await,
            ShoppingCommand::Clear => commands::clear_shopping_list(app).await,
        },
        Commands::Pantry { action } => match action {
            PantryCommand::Add { names, amount } => {
                commands::add_pantry_items(app, &names, amount.as_deref()).await
            }
            PantryCommand::List => commands::list_pantry(app).await,
            PantryCommand::Clear => commands::clear_pantry(app).await,
        },
        Commands::Key { action } => match action {
            KeyCommand::Set { provider, key } => commands::set_key(app, &provider, &key).await,
            KeyCommand::Remove { provider } => commands::remove_key(app, &provider).await,
        },
        Commands::Profile { action } => match action {
            ProfileCommand::Show => commands::show_profile(app).await,
            ProfileCommand::Set(args) => commands::set_profile(app, &args).await,
        },
        Commands::Providers { query } => commands::list_providers(app, query.as_deref()).await,
        Commands::Shell => shell::run_shell(app).await,
        Commands::Config {
            action: ConfigCommand::Check,
        } => {
            if check::run_check(&app.config, app.store()).await? {
                Ok(())
            } else {
                Err(LarderError::Config("configuration check failed".to_string()))
            }
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("larder={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use larder_core::types::MealType;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = larder_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.app.name, "larder");
    }

    #[test]
    fn generate_takes_ingredients_and_target() {
        let cli = Cli::try_parse_from([
            "larder", "generate", "rice", "beans", "-s", "4", "--provider", "gemini", "--model", "gemini-2.0-flash",
        ])
        .unwrap();
        let Some(Commands::Generate(args)) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.ingredients, vec!["rice", "beans"]);
        assert_eq!(args.servings, Some(4));
        assert_eq!(args.target.provider.as_deref(), Some("gemini"));
        assert_eq!(args.target.model.as_deref(), Some("gemini-2.0-flash"));
    }

    #[test]
    fn ideas_new_parses_meal_and_vibes() {
        let cli = Cli::try_parse_from([
            "larder", "ideas", "new", "--meal", "Breakfast", "--vibe", "quick", "--vibe", "cozy",
        ])
        .unwrap();
        let Some(Commands::Ideas {
            action: IdeasCommand::New(args),
        }) = cli.command
        else {
            panic!("expected ideas new");
        };
        assert_eq!(args.meal, MealType::Breakfast);
        assert_eq!(args.vibes, vec!["quick", "cozy"]);
        assert!(args.ingredients.is_empty());
    }

    #[test]
    fn used_and_unused_conflict() {
        assert!(Cli::try_parse_from(["larder", "ideas", "list", "--used", "--unused"]).is_err());
    }

    #[test]
    fn pantry_add_requires_a_name() {
        assert!(Cli::try_parse_from(["larder", "pantry", "add"]).is_err());
        assert!(Cli::try_parse_from(["larder", "pantry", "add", "rice", "--amount", "2 kg"]).is_ok());
    }
}
