#![forbid(unsafe_code)]

mod actor;
mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "verso: version lineage for generated creative content",
    long_about = None
)]
struct Cli {
    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Actor recorded on new versions (overrides `VERSO_ACTOR`).
    #[arg(long, global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }

    fn actor_flag(&self) -> Option<&str> {
        self.actor.as_deref()
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Project",
        about = "Initialize a verso project",
        long_about = "Create .verso/ with a default config.toml and an empty journal.",
        after_help = "EXAMPLES:\n    # Initialize the current directory\n    verso init\n\n    # Emit machine-readable output\n    verso init --json"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Record",
        about = "Start a new lineage",
        long_about = "Create a lineage and its root version from a JSON content payload.",
        after_help = "EXAMPLES:\n    # Inline content\n    verso create character_analysis --content '{\"persona\": \"A\"}' --prompt \"Describe the baker\"\n\n    # Content from a file, with generation settings\n    verso create story_content --content @draft.json --provider claude --temperature 0.9 --param max_tokens=512"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Record",
        about = "Record a new version under a parent",
        long_about = "Append a modification or regeneration to a lineage; the new version becomes current.",
        after_help = "EXAMPLES:\n    # Edit on main\n    verso commit --parent <version-id> --content '{\"persona\": \"B\"}' -d \"Add entrepreneur backstory\"\n\n    # Regenerate on a branch\n    verso commit --parent <version-id> --change-type regeneration --branch villain-arc --content @v2.json"
    )]
    Commit(cmd::commit::CommitArgs),

    #[command(
        next_help_heading = "Record",
        about = "Fork a named branch",
        long_about = "Create a branch version that copies the base version's content and context.",
        after_help = "EXAMPLES:\n    # Fork from a version\n    verso branch <version-id> villain-arc -d \"darker take\""
    )]
    Branch(cmd::branch::BranchArgs),

    #[command(
        next_help_heading = "Record",
        about = "Restore an earlier version",
        long_about = "Copy an earlier version's content into a new rollback version on main.",
        after_help = "EXAMPLES:\n    # Roll back\n    verso rollback <version-id> -d \"too wet\""
    )]
    Rollback(cmd::rollback::RollbackArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one version",
        after_help = "EXAMPLES:\n    verso show <version-id>\n    verso show <version-id> --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Compare two versions",
        long_about = "Field-level content diff plus generation-setting and tag changes.",
        after_help = "EXAMPLES:\n    verso diff <older-id> <newer-id>"
    )]
    Diff(cmd::diff::DiffArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show a lineage as a tree",
        after_help = "EXAMPLES:\n    verso tree <content-id>"
    )]
    Tree(cmd::tree::TreeArgs),

    #[command(
        next_help_heading = "Read",
        about = "List a branch's versions",
        after_help = "EXAMPLES:\n    verso history <content-id>\n    verso history <content-id> --branch villain-arc"
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Read",
        about = "Search versions",
        long_about = "Case-insensitive substring search over content, descriptions, tags and notes.",
        after_help = "EXAMPLES:\n    verso search entrepreneur\n    verso search \"act two\" --type beat_sheet"
    )]
    Search(cmd::search::SearchArgs),

    #[command(
        next_help_heading = "Read",
        about = "Generation analytics for a lineage",
        after_help = "EXAMPLES:\n    verso analytics <content-id> --json"
    )]
    Analytics(cmd::analytics::AnalyticsArgs),

    #[command(
        next_help_heading = "Read",
        about = "List lineages",
        after_help = "EXAMPLES:\n    verso list\n    verso list --type story_content"
    )]
    List(cmd::list::ListArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("VERSO_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "verso=debug,info"
        } else {
            "verso=info,warn"
        })
    });

    let format = env::var("VERSO_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let project_root = env::current_dir()?;
    let output = cli.output_mode();
    let actor = cli.actor_flag();
    debug!(?output, root = %project_root.display(), "starting");

    let command_result = match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, output, &project_root),
        Commands::Create(args) => cmd::create::run_create(args, actor, output, &project_root),
        Commands::Commit(args) => cmd::commit::run_commit(args, actor, output, &project_root),
        Commands::Branch(args) => cmd::branch::run_branch(args, actor, output, &project_root),
        Commands::Rollback(args) => {
            cmd::rollback::run_rollback(args, actor, output, &project_root)
        }
        Commands::Show(args) => cmd::show::run_show(args, output, &project_root),
        Commands::Diff(args) => cmd::diff::run_diff(args, output, &project_root),
        Commands::Tree(args) => cmd::tree::run_tree(args, output, &project_root),
        Commands::History(args) => cmd::history::run_history(args, output, &project_root),
        Commands::Search(args) => cmd::search::run_search(args, output, &project_root),
        Commands::Analytics(args) => cmd::analytics::run_analytics(args, output, &project_root),
        Commands::List(args) => cmd::list::run_list(args, output, &project_root),
    };

    if let Err(err) = command_result {
        render_error(output, &CliError::from(&err))?;
        std::process::exit(1);
    }
    Ok(())
}
