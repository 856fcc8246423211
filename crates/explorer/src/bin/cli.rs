//! Explorer CLI - browse mentions and run analysis rules.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::disallowed_macros)]
#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;

use explorer::config::ExplorerConfig;
use explorer::domain::ExplorerSession;
use explorer::entities::{DateRange, ListTab, RuleId, RulePatch};
use explorer::errors::{ExplorerError, ExplorerResult};
use explorer::pagination::MergeOutcome;
use explorer::storage::FileStore;
use explorer::{ui, HttpApi};

/// Pages searched for a mention before giving up
const DEFAULT_SEARCH_PAGES: usize = 5;

#[derive(Parser)]
#[command(name = "explorer")]
#[command(about = "Explore social mentions and run analysis rules", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Analysis service base URL
    #[arg(long, global = true, env = "EXPLORER_API_URL")]
    api_url: Option<String>,

    /// Directory holding persisted session state
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List monitored keywords with mention counts
    Keywords,

    /// Show or change the filter selection
    #[command(subcommand)]
    Filter(FilterCommands),

    /// List mentions matching the filter
    Mentions {
        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: usize,
    },

    /// List authors matching the filter
    Authors {
        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: usize,
    },

    /// List whichever result list is active
    List {
        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: usize,
    },

    /// Set the active result list (mentions or authors)
    Tab {
        /// List name
        tab: ListTab,
    },

    /// Show daily counts and sentiment for the filter
    Stats,

    /// Show a mention with highlighted content
    Show {
        /// Mention ID; defaults to the selected mention
        id: Option<i64>,

        /// Pages to search for the mention
        #[arg(short, long, default_value_t = DEFAULT_SEARCH_PAGES)]
        pages: usize,
    },

    /// Manage and run rules
    #[command(subcommand)]
    Rules(RulesCommands),
}

#[derive(Subcommand)]
enum FilterCommands {
    /// Show the current filter
    Show,

    /// Replace the keyword selection ("All" or nothing clears it)
    Keywords {
        /// Keywords
        keywords: Vec<String>,
    },

    /// Replace the source selection (nothing restores the default)
    Sources {
        /// Source ids (reddit, fda, pharmacy, medical)
        sources: Vec<String>,
    },

    /// Set or clear the date range
    Dates {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day, YYYY-MM-DD
        #[arg(long)]
        end: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum RulesCommands {
    /// List rules in chaining order
    List,

    /// Create a rule and make it active
    Create {
        /// Rule title
        #[arg(short, long)]
        title: Option<String>,

        /// Natural-language instruction
        #[arg(short, long)]
        instruction: Option<String>,

        /// Use the previous rule's result as context
        #[arg(long)]
        chaining: bool,
    },

    /// Update a rule
    Update {
        /// Rule ID
        id: RuleId,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New instruction
        #[arg(short, long)]
        instruction: Option<String>,

        /// Enable or disable chaining
        #[arg(long)]
        chaining: Option<bool>,
    },

    /// Delete a rule
    Delete {
        /// Rule ID
        id: RuleId,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Make a rule active
    Select {
        /// Rule ID
        id: RuleId,
    },

    /// Run the active rule, or the given one
    Run {
        /// Rule ID
        #[arg(long)]
        id: Option<RuleId>,
    },

    /// Run every rule in list order
    RunAll,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        ui::print_error(&e.to_string());
        std::process::exit(1);
    }
}

async fn load_config(cli: &Cli) -> ExplorerResult<ExplorerConfig> {
    let mut config = match &cli.config {
        Some(path) => ExplorerConfig::load(path).await?,
        None => ExplorerConfig::from_env()?,
    };
    if let Some(url) = &cli.api_url {
        config = config.with_api_base_url(url);
    }
    if let Some(dir) = &cli.state_dir {
        config.state_dir.clone_from(dir);
    }
    config.validate()?;
    Ok(config)
}

/// Load `pages` pages of the given list, the first one included
async fn load_pages<F, Fut>(pages: usize, mut load_next: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Option<MergeOutcome>>,
{
    for _ in 1..pages {
        if load_next().await.is_none() {
            break;
        }
    }
}

async fn run(cli: Cli) -> Result<(), ExplorerError> {
    let config = load_config(&cli).await?;
    let api = Arc::new(HttpApi::from_config(&config)?);
    let store = Arc::new(FileStore::new(&config.state_dir));
    let session = ExplorerSession::restore(api, store, config).await;

    match cli.command {
        Commands::Keywords => {
            let keywords = session.refresh_keywords().await;
            println!("{}", ui::keyword_table(&keywords, &session.filter()));
        }

        Commands::Filter(filter_cmd) => match filter_cmd {
            FilterCommands::Show => {
                session.start().await?;
                ui::display_filter(&session.filter(), session.unique_author_count());
                ui::print_info(&format!(
                    "{} mention(s), active list: {}",
                    session.mentions().total(),
                    session.list_tab()
                ));
            }
            FilterCommands::Keywords { keywords } => {
                let filter = session.set_keywords(keywords).await;
                ui::print_success(&format!("Filter updated ({})", filter.describe()));
                ui::print_info(&format!("{} mention(s) match", session.mentions().total()));
            }
            FilterCommands::Sources { sources } => {
                let filter = session.set_sources(sources).await;
                ui::print_success(&format!("Filter updated ({})", filter.describe()));
                ui::print_info(&format!("{} mention(s) match", session.mentions().total()));
            }
            FilterCommands::Dates { start, end } => {
                let range = DateRange::new(start, end);
                let filter = session.set_date_range(Some(range)).await;
                if filter.date_range.is_none() {
                    ui::print_success("Date range cleared");
                } else {
                    ui::print_success(&format!("Filter updated ({})", filter.describe()));
                }
            }
        },

        Commands::Mentions { pages } => {
            session.start().await?;
            load_pages(pages, || session.load_more_mentions()).await;
            print_mentions(&session);
        }

        Commands::Authors { pages } => {
            session.start().await?;
            load_pages(pages, || session.load_more_authors()).await;
            print_authors(&session);
        }

        Commands::List { pages } => {
            session.start().await?;
            load_pages(pages, || session.load_more()).await;
            match session.list_tab() {
                ListTab::Mentions => print_mentions(&session),
                ListTab::Authors => print_authors(&session),
            }
        }

        Commands::Tab { tab } => {
            session.set_list_tab(tab).await;
            ui::print_success(&format!("Active list: {tab}"));
        }

        Commands::Stats => {
            let stats = session.stats().await?;
            ui::display_filter(&session.filter(), None);
            println!();
            ui::display_stats(&stats.counts_by_day, &stats.sentiment);
        }

        Commands::Show { id, pages } => {
            let Some(id) = id else {
                match session.selected_post() {
                    Some(mention) => ui::display_mention_details(&mention, &session.filter()),
                    None => ui::print_info("No mention selected"),
                }
                return Ok(());
            };

            session.start().await?;
            let mut searched = 1;
            while session.mentions().find(|m| m.id == id).is_none()
                && searched < pages
                && session.load_more_mentions().await.is_some()
            {
                searched += 1;
            }
            let mention = session.select_post(id).await?;
            ui::display_mention_details(&mention, &session.filter());
        }

        Commands::Rules(rules_cmd) => {
            run_rules(&session, rules_cmd).await?;
        }
    }

    Ok(())
}

async fn run_rules(session: &ExplorerSession, command: RulesCommands) -> ExplorerResult<()> {
    session.reload_rules().await?;

    match command {
        RulesCommands::List => {
            let rules = session.rules();
            if rules.is_empty() {
                ui::print_info("No rules defined");
            } else {
                let table =
                    ui::rule_table(&rules, session.active_rule_id(), |id| session.result(id));
                println!("{table}");
                println!();
                ui::print_info(&format!("{} rule(s) total", rules.len()));
            }
        }

        RulesCommands::Create {
            title,
            instruction,
            chaining,
        } => {
            let mut rule = session.create_rule().await?;
            let patch = RulePatch {
                title,
                instruction,
                is_chaining: chaining.then_some(true),
            };
            if !patch.is_empty() {
                rule = session.update_rule(rule.id, &patch).await?;
            }
            ui::print_success(&format!("Created rule {}: {}", rule.id, rule.title));
        }

        RulesCommands::Update {
            id,
            title,
            instruction,
            chaining,
        } => {
            let patch = RulePatch {
                title,
                instruction,
                is_chaining: chaining,
            };
            if patch.is_empty() {
                ui::print_warning("Nothing to update");
                return Ok(());
            }
            let rule = session.update_rule(id, &patch).await?;
            ui::print_success(&format!("Updated rule {}: {}", rule.id, rule.title));
        }

        RulesCommands::Delete { id, yes } => {
            if !yes {
                ui::print_warning(&format!("About to delete rule {id}. Use --yes to confirm."));
                return Ok(());
            }

            let active = session.delete_rule(id).await?;
            ui::print_success(&format!("Deleted rule {id}"));
            match active {
                Some(active) => ui::print_info(&format!("Active rule: {active}")),
                None => ui::print_info("No rules left"),
            }
        }

        RulesCommands::Select { id } => {
            session.set_active_rule(id).await?;
            ui::print_success(&format!("Active rule: {id}"));
        }

        RulesCommands::Run { id } => {
            let id = match id {
                Some(id) => id,
                None => session.active_rule_id().ok_or(ExplorerError::NoActiveRule)?,
            };
            let rule = session
                .rule(id)
                .ok_or(ExplorerError::RuleNotFound { rule_id: id })?;
            if rule.is_chaining {
                ui::print_info(&format!(
                    "{} runs with its predecessor's result from this session",
                    rule.title
                ));
            }
            let result = session.execute(id).await?;
            ui::display_rule_result(&rule, &result);
        }

        RulesCommands::RunAll => {
            let results = session.run_all().await?;
            if results.is_empty() {
                ui::print_info("No rules defined");
            }
            for (rule, result) in &results {
                ui::display_rule_result(rule, result);
            }
            let failed = results.iter().filter(|(_, r)| r.is_error()).count();
            if failed > 0 {
                ui::print_warning(&format!("{failed} rule(s) failed"));
            } else if !results.is_empty() {
                ui::print_success(&format!("Ran {} rule(s)", results.len()));
            }
        }
    }

    Ok(())
}

fn print_mentions(session: &ExplorerSession) {
    let mentions = session.mentions().items();
    if mentions.is_empty() {
        ui::print_info("No mentions found");
        return;
    }
    println!("{}", ui::mention_table(&mentions));
    println!();
    let more = if session.mentions().has_more() {
        " (more available)".dimmed().to_string()
    } else {
        String::new()
    };
    ui::print_info(&format!(
        "{} of {} mention(s){more}",
        mentions.len(),
        session.mentions().total()
    ));
}

fn print_authors(session: &ExplorerSession) {
    let authors = session.authors().items();
    if authors.is_empty() {
        ui::print_info("No authors found");
        return;
    }
    println!("{}", ui::author_table(&authors));
    println!();
    let unique = session
        .unique_author_count()
        .map_or_else(String::new, |n| format!(", {n} unique"));
    ui::print_info(&format!(
        "{} of {} author(s){unique}",
        authors.len(),
        session.authors().total()
    ));
}
