// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `larder generate` and `larder ideas new|use`.
//!
//! [`follow`] runs one request through the orchestrator and mirrors its
//! status on the terminal until nothing is running or scheduled, so an
//! automatic retry is followed through as well. Ctrl+C cancels.

use std::io::Write;
use std::time::Duration;

use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use larder_agent::prompt::{idea_recipe_prompt, ideas_prompt, recipe_prompt};
use larder_agent::{AttemptReport, Flavor, GenerationOrchestrator, GenerationRequest, RequestStatus};
use larder_core::LarderError;
use larder_core::types::{Locale, MealType, RecipeIdea, normalize_key};
use larder_recipes::IdeaContext;
use larder_resilience::ApiError;
use tracing::{debug, error};

use crate::app::App;
use crate::render::{StreamPrinter, countdown_line, error_lines, idea_line, progress_line, short_id};

/// Arguments shared by commands that produce a recipe.
#[derive(Args, Debug, Default)]
pub struct RecipeArgs {
    /// Ingredients at hand. Defaults to the pantry.
    pub ingredients: Vec<String>,

    #[arg(short, long)]
    pub servings: Option<u32>,

    /// Free-text wishes appended to the prompt.
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Do not fall back to pantry items when no ingredients are given.
    #[arg(long)]
    pub no_pantry: bool,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Provider and model selection.
#[derive(Args, Debug, Default, Clone)]
pub struct TargetArgs {
    /// Provider id, e.g. groq. Defaults to the last one used.
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model override for this request.
    #[arg(short, long)]
    pub model: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct IdeasArgs {
    /// Ingredients to build ideas around. Defaults to the pantry.
    pub ingredients: Vec<String>,

    #[arg(long, default_value_t = MealType::Dinner)]
    pub meal: MealType,

    /// Mood tags such as "quick" or "cozy". Repeatable.
    #[arg(long = "vibe")]
    pub vibes: Vec<String>,

    #[arg(short, long)]
    pub servings: Option<u32>,

    /// How many ideas to ask for.
    #[arg(short, long)]
    pub count: Option<u32>,

    #[arg(short, long)]
    pub notes: Option<String>,

    #[arg(long)]
    pub no_pantry: bool,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// How a followed generation ended.
#[derive(Debug)]
pub enum Outcome {
    Completed(AttemptReport),
    Failed(ApiError),
    Cancelled,
}

/// Terminal mirror of the orchestrator status.
struct LiveView {
    flavor: Flavor,
    locale: Locale,
    printer: StreamPrinter,
    spinner: Option<ProgressBar>,
}

impl LiveView {
    fn new(flavor: Flavor, locale: Locale) -> Self {
        Self {
            flavor,
            locale,
            printer: StreamPrinter::default(),
            spinner: None,
        }
    }

    fn spin(&mut self, message: String) {
        let spinner = self.spinner.get_or_insert_with(|| {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        spinner.set_message(message);
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn end_stream_line(&mut self) {
        if self.printer.has_printed() {
            println!();
            self.printer.reset();
        }
    }

    fn show(&mut self, status: &RequestStatus, pending: Option<Duration>) {
        match status {
            RequestStatus::Idle => self.stop_spinner(),
            RequestStatus::Validating => {
                self.end_stream_line();
                self.spin("checking request".to_string());
            }
            RequestStatus::Connecting => self.spin("connecting".to_string()),
            RequestStatus::Streaming {
                tokens,
                chars,
                content,
            } => match self.flavor {
                Flavor::Recipe => {
                    self.stop_spinner();
                    let delta = self.printer.delta(content);
                    if !delta.is_empty() {
                        print!("{delta}");
                        std::io::stdout().flush().ok();
                    }
                }
                Flavor::Ideas => self.spin(progress_line(*tokens, *chars)),
            },
            RequestStatus::Completed { .. } => {
                self.stop_spinner();
                self.end_stream_line();
            }
            RequestStatus::Error { error } => {
                self.stop_spinner();
                self.end_stream_line();
                let mut lines = error_lines(error, self.locale).into_iter();
                if let Some(title) = lines.next() {
                    eprintln!("{}", title.red().bold());
                }
                for line in lines {
                    eprintln!("{line}");
                }
                if let Some(remaining) = pending {
                    self.spin(countdown_line(remaining));
                }
            }
        }
    }

    /// Refreshes the countdown while a retry is pending.
    fn tick(&mut self, pending: Option<Duration>) {
        if let (Some(remaining), Some(spinner)) = (pending, &self.spinner) {
            spinner.set_message(countdown_line(remaining));
        }
    }
}

/// Runs `request` and everything it schedules to the end.
pub async fn follow(
    orchestrator: &GenerationOrchestrator,
    request: GenerationRequest,
    locale: Locale,
) -> Outcome {
    let mut view = LiveView::new(request.flavor, locale);
    let mut rx = orchestrator.subscribe();
    let mut task = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.generate(request).await })
    };
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    let mut interrupted = false;
    let mut joined = false;
    let mut ticker = tokio::time::interval(Duration::from_millis(250));

    loop {
        tokio::select! {
            result = &mut task, if !joined => {
                joined = true;
                if let Err(e) = result {
                    error!(error = %e, "generation task failed");
                }
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = rx.borrow_and_update().clone();
                view.show(&status, orchestrator.pending_retry());
            }
            _ = &mut interrupt, if !interrupted => {
                interrupted = true;
                debug!("interrupted, cancelling generation");
                orchestrator.cancel();
            }
            _ = ticker.tick() => view.tick(orchestrator.pending_retry()),
        }
        if joined && !orchestrator.is_busy() {
            break;
        }
    }
    if rx.has_changed().unwrap_or(false) {
        let status = rx.borrow_and_update().clone();
        view.show(&status, None);
    }
    view.stop_spinner();
    view.end_stream_line();

    match orchestrator.last_report() {
        Some(report) => match &report.status {
            RequestStatus::Completed { .. } => Outcome::Completed(report),
            RequestStatus::Error { error } => Outcome::Failed(error.clone()),
            _ => Outcome::Cancelled,
        },
        None => Outcome::Cancelled,
    }
}

/// Prints what a finished generation produced. A failure becomes an error
/// so the process exits non-zero.
pub fn conclude(outcome: Outcome, locale: Locale) -> Result<(), LarderError> {
    match outcome {
        Outcome::Completed(report) => {
            if let Some(recipe) = &report.recipe {
                println!(
                    "{} {} ({})",
                    "saved".green(),
                    recipe.title.bold(),
                    short_id(&recipe.id)
                );
            }
            if !report.ideas.is_empty() {
                println!();
                for idea in &report.ideas {
                    println!("{}", idea_line(idea));
                }
                println!(
                    "\n{}",
                    "Turn one into a recipe with `larder ideas use <id>`".dimmed()
                );
            }
            if let Some(notice) = &report.notice {
                eprintln!(
                    "{} {}",
                    notice.title(locale).yellow(),
                    notice.message(locale)
                );
            }
            Ok(())
        }
        Outcome::Failed(error) => Err(LarderError::Provider {
            message: format!("generation failed ({})", error.code),
            source: None,
        }),
        Outcome::Cancelled => {
            eprintln!("{}", "cancelled".dimmed());
            Ok(())
        }
    }
}

/// `ingredients`, or the pantry when none were given.
async fn ingredients_or_pantry(app: &App, ingredients: &[String], no_pantry: bool) -> Vec<String> {
    let given: Vec<String> = ingredients
        .iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect();
    if !given.is_empty() || no_pantry {
        return given;
    }
    app.store()
        .pantry()
        .await
        .into_iter()
        .map(|item| item.name)
        .collect()
}

impl TargetArgs {
    fn apply(&self, request: GenerationRequest) -> GenerationRequest {
        match &self.model {
            Some(model) => request.with_model(model.clone()),
            None => request,
        }
    }
}

pub async fn run_generate(app: &App, args: RecipeArgs) -> Result<(), LarderError> {
    let locale = app.locale().await;
    let preferences = app.store().preferences().await;
    let ingredients = ingredients_or_pantry(app, &args.ingredients, args.no_pantry).await;
    let servings = args.servings.unwrap_or(preferences.default_servings);
    let prompt = recipe_prompt(&ingredients, servings, args.notes.as_deref(), locale);

    let provider = app.provider(args.target.provider.as_deref()).await;
    let request = args.target.apply(GenerationRequest::recipe(provider, prompt));
    conclude(follow(&app.orchestrator, request, locale).await, locale)
}

pub async fn run_ideas_new(app: &App, args: IdeasArgs) -> Result<(), LarderError> {
    let locale = app.locale().await;
    let preferences = app.store().preferences().await;
    let context = IdeaContext {
        meal_type: args.meal,
        vibes: args.vibes.clone(),
        ingredients: ingredients_or_pantry(app, &args.ingredients, args.no_pantry).await,
        servings: args.servings.unwrap_or(preferences.default_servings),
    };
    let count = args.count.unwrap_or(app.config.generation.ideas_count);
    let prompt = ideas_prompt(&context, count, args.notes.as_deref(), locale);

    let provider = app.provider(args.target.provider.as_deref()).await;
    let request = args.target.apply(GenerationRequest::ideas(provider, prompt, context));
    conclude(follow(&app.orchestrator, request, locale).await, locale)
}

pub async fn run_ideas_use(app: &App, id: &str, target: TargetArgs) -> Result<(), LarderError> {
    let locale = app.locale().await;
    let ideas = app.store().recipe_ideas().await;
    let idea = find_idea(&ideas, id)?;
    let prompt = idea_recipe_prompt(idea, locale);

    let provider = app.provider(target.provider.as_deref()).await;
    let request = target.apply(GenerationRequest::recipe(provider, prompt).from_idea(idea.id.clone()));
    conclude(follow(&app.orchestrator, request, locale).await, locale)
}

/// The idea whose id starts with `prefix`; the prefix must be unambiguous.
pub fn find_idea<'a>(ideas: &'a [RecipeIdea], prefix: &str) -> Result<&'a RecipeIdea, LarderError> {
    let prefix = prefix.trim();
    let mut matches = ideas
        .iter()
        .filter(|idea| !prefix.is_empty() && idea.id.starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(idea), None) => Ok(idea),
        (Some(_), Some(_)) => Err(LarderError::Parse(format!(
            "idea id `{prefix}` is ambiguous, use more characters"
        ))),
        (None, _) => {
            let key = normalize_key(prefix);
            ideas
                .iter()
                .find(|idea| !key.is_empty() && normalize_key(&idea.title) == key)
                .ok_or_else(|| LarderError::Parse(format!("no idea matches `{prefix}`")))
        }
    }
}
