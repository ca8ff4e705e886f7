//! branchcraft CLI - the build-script front end to merges and versioning.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use branchcraft_lib::commands::{
    current_version, merge, resolve_next_version, tag_next_version, BranchHeads, Bump,
    MergeOptions, VersioningConfig,
};
use branchcraft_lib::error::ErrorResponse;
use branchcraft_lib::{GitGateway, MergeOutcome, VcsError};

#[derive(Parser)]
#[command(
    name = "branchcraft",
    about = "Branch-aware merges and tag-driven versions for Git repositories",
    version
)]
struct Cli {
    /// Repository to operate on.
    #[arg(long, short = 'R', global = true, default_value = ".")]
    repo: PathBuf,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a branch or revision into the checked-out branch.
    ///
    /// Exits 0 on a committed merge, 1 when files conflict or nothing
    /// needed merging, 3 when the merge was aborted.
    Merge {
        /// Branch name or revision to merge.
        target: String,

        /// Land the merge on this branch instead of the checked-out one.
        #[arg(long)]
        into: Option<String>,

        /// Commit message for the merge commit.
        #[arg(long, short)]
        message: Option<String>,
    },

    /// List the heads of a branch, oldest first.
    Heads {
        branch: String,
    },

    /// Show the current version, or the next one with --next.
    Version {
        /// Branch whose history scopes the version tags.
        #[arg(long)]
        branch: Option<String>,

        /// Increment strategy: default, major, minor, build, revision.
        #[arg(long)]
        increment: Option<Bump>,

        /// Prefix stripped from tag names before parsing.
        #[arg(long)]
        tag_prefix: Option<String>,

        /// Print the next version instead of the current one.
        #[arg(long)]
        next: bool,

        /// Record the next version as a tag on the branch head.
        #[arg(long, requires = "next")]
        tag: bool,
    },

    /// Show or update the versioning defaults stored in git config.
    Config {
        #[arg(long)]
        branch: Option<String>,

        #[arg(long)]
        increment: Option<Bump>,

        #[arg(long)]
        tag_prefix: Option<String>,
    },
}

fn main() -> ExitCode {
    branchcraft_lib::init_tracing("branchcraft=info,branchcraft_lib=info,git2=warn");

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            let vcs_error = err.downcast_ref::<VcsError>();
            if cli.json {
                let response = match vcs_error {
                    Some(e) => ErrorResponse::from(e),
                    None => ErrorResponse {
                        code: "ERROR".to_string(),
                        message: err.to_string(),
                        details: None,
                    },
                };
                print_json(&response);
            } else {
                eprintln!("error: {:#}", err);
            }

            match vcs_error.and_then(VcsError::merge_outcome) {
                Some(MergeOutcome::Aborted) => ExitCode::from(3),
                _ => ExitCode::from(2),
            }
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let gateway = GitGateway::new();
    let path = cli.repo.as_path();

    match &cli.command {
        Commands::Merge {
            target,
            into,
            message,
        } => {
            let options = MergeOptions {
                destination: into.clone(),
                message: message.clone(),
            };
            let summary = merge(&gateway, path, target, &options)
                .with_context(|| format!("merging '{}'", target))?;

            if cli.json {
                print_json(&summary);
            } else {
                match (&summary.outcome, &summary.commit) {
                    (MergeOutcome::Success, Some(commit)) => {
                        println!("merged {} as {}", target, commit.short_hash())
                    }
                    (MergeOutcome::UnresolvedFiles, _) => {
                        println!("merge of {} has unresolved files:", target);
                        for file in &summary.unresolved_files {
                            println!("  {}", file);
                        }
                    }
                    (outcome, _) => println!("{}: {}", target, outcome),
                }
            }

            Ok(if summary.outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }

        Commands::Heads { branch } => {
            let heads = BranchHeads::load(&gateway, path, branch)?;
            if cli.json {
                print_json(&heads);
            } else {
                for head in &heads.heads {
                    println!("{} {}", head.short_hash(), head.message.lines().next().unwrap_or(""));
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Version {
            branch,
            increment,
            tag_prefix,
            next,
            tag,
        } => {
            let config = effective_config(&gateway, path, branch, increment, tag_prefix)?;
            let settings = config.settings();

            if *tag {
                let tagged = tag_next_version(&gateway, path, &settings)?;
                emit(cli.json, &tagged, &tagged.tag);
            } else if *next {
                let version = resolve_next_version(&gateway, path, &settings)?;
                emit(cli.json, &version, &version.to_string());
            } else {
                let current = current_version(&gateway, path, &settings)?;
                let label = current
                    .as_ref()
                    .map(|t| t.version.to_string())
                    .unwrap_or_else(|| "none".to_string());
                emit(cli.json, &current, &label);
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Config {
            branch,
            increment,
            tag_prefix,
        } => {
            let config = effective_config(&gateway, path, branch, increment, tag_prefix)?;
            if branch.is_some() || increment.is_some() || tag_prefix.is_some() {
                config.save(&gateway, path).context("writing git config")?;
                tracing::info!(branch = %config.branch, "saved versioning config");
            }

            if cli.json {
                print_json(&config);
            } else {
                println!("branch     = {}", config.branch);
                println!("tag prefix = {}", config.tag_prefix);
                println!("increment  = {}", config.increment);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Git config values with command-line overrides applied
fn effective_config(
    gateway: &GitGateway,
    path: &Path,
    branch: &Option<String>,
    increment: &Option<Bump>,
    tag_prefix: &Option<String>,
) -> anyhow::Result<VersioningConfig> {
    let mut config =
        VersioningConfig::load(gateway, path).context("reading versioning config")?;
    if let Some(branch) = branch {
        config.branch = branch.clone();
    }
    if let Some(increment) = increment {
        config.increment = *increment;
    }
    if let Some(prefix) = tag_prefix {
        config.tag_prefix = prefix.clone();
    }
    Ok(config)
}

fn emit<T: Serialize>(json: bool, value: &T, text: &str) {
    if json {
        print_json(value);
    } else {
        println!("{}", text);
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(out) => println!("{}", out),
        Err(e) => eprintln!("error: failed to serialize output: {}", e),
    }
}
