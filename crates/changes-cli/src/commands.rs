use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use tracing::debug;

use changes_diff::render_change;
use changes_register::{
    AutoResolve, AutoResolvePreferClosing, ChangesetId, EntityModel, EntityRef, RegisterError,
    RevisionDraft, UpdateOutcome, UpdateReport,
};
use changes_sync::open_source;
use changes_types::AttrMap;

use crate::cli::*;
use crate::config::Config;
use crate::prompt::{Prompt, TerminalModerator, TerminalResolver};
use crate::state::{self, Register};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.config)?;
    let author = cli.author.unwrap_or_else(|| config.changeset.author.clone());
    let state_path = cli.state.unwrap_or_else(|| config.changeset.state.clone());

    let register = state::open(&state_path)?.with_author(author);
    let register = match &config.changeset.branch {
        Some(branch) => register.with_branch(branch.clone()),
        None => register,
    };
    debug!(state = %state_path.display(), changesets = register.len()?, "opened register");

    match cli.command {
        Command::Commit(_) => cmd_commit(&register, &state_path),
        Command::Diff(args) => cmd_diff(&register, args),
        Command::Heads(_) => cmd_heads(&register),
        Command::Log(args) => cmd_log(&register, args),
        Command::Merge(args) => cmd_merge(&register, &state_path, args),
        Command::Update(args) => cmd_update(&register, &state_path, args, false),
        Command::Moderate(args) => cmd_update(&register, &state_path, args, true),
        Command::Pull(args) => cmd_pull(&register, &state_path, &config, args).await,
        Command::Working(_) => cmd_working(&register),
        Command::Record(args) => cmd_record(&register, &state_path, args),
        Command::Masks(_) => cmd_masks(&register),
    }
}

/// Accept a full id or an unambiguous prefix of one.
fn resolve_id(register: &Register, reference: &str) -> anyhow::Result<ChangesetId> {
    if let Ok(id) = reference.parse::<ChangesetId>() {
        return Ok(id);
    }
    let matches: Vec<ChangesetId> = register
        .changesets()?
        .iter()
        .map(|c| c.id())
        .filter(|id| id.to_string().starts_with(reference))
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("unknown changeset: {reference}"),
        _ => bail!("ambiguous changeset prefix {reference:?} ({} matches)", matches.len()),
    }
}

fn cmd_commit(register: &Register, state_path: &Path) -> anyhow::Result<()> {
    let ids = register.commit()?;
    state::save(state_path, register)?;
    if ids.is_empty() {
        println!("Nothing to commit.");
        return Ok(());
    }
    println!("{} Committed {} changeset(s)", "✓".green().bold(), ids.len());
    for id in &ids {
        println!("  {}", id.to_string().yellow());
    }
    Ok(())
}

fn cmd_diff(register: &Register, args: DiffArgs) -> anyhow::Result<()> {
    let (start, stop) = match &args.stop {
        Some(stop) => (Some(resolve_id(register, &args.first)?), resolve_id(register, stop)?),
        None => (None, resolve_id(register, &args.first)?),
    };
    let changes = register.diff(start, stop)?;
    if changes.is_empty() {
        println!("No changes.");
    }
    for change in &changes {
        print!("{}", render_change(change));
    }
    Ok(())
}

fn cmd_heads(register: &Register) -> anyhow::Result<()> {
    let heads = register.heads()?;
    if heads.is_empty() {
        println!("No changesets.");
        return Ok(());
    }
    let working = register.get_working()?.map(|c| c.id());
    for id in heads.iter().rev() {
        let changeset = register.require(id)?;
        let marker = if working == Some(*id) { "*" } else { " " };
        println!(
            "{} {} {}",
            marker.green().bold(),
            changeset.summary(),
            format!("[{}]", changeset.branch()).cyan()
        );
    }
    Ok(())
}

fn cmd_log(register: &Register, args: LogArgs) -> anyhow::Result<()> {
    let id = args
        .changeset
        .as_deref()
        .map(|reference| resolve_id(register, reference))
        .transpose()?;
    let logs = register.log(id)?;
    if logs.is_empty() {
        println!("No changesets.");
    }
    for (i, log) in logs.iter().rev().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{log}");
    }
    Ok(())
}

fn cmd_merge(register: &Register, state_path: &Path, args: MergeArgs) -> anyhow::Result<()> {
    let Some(working) = register.get_working()? else {
        bail!("no working changeset; commit or update first");
    };
    let target = resolve_id(register, &args.target)?;
    let mergeset = match args.mode {
        MergeMode::Auto => register.merge(working.id(), target, &mut AutoResolve)?,
        MergeMode::PreferClosing => {
            register.merge(working.id(), target, &mut AutoResolvePreferClosing)?
        }
        MergeMode::Interactive => {
            let mut resolver = TerminalResolver(Prompt::terminal());
            register.merge(working.id(), target, &mut resolver)?
        }
    };
    state::save(state_path, register)?;

    println!("{} Created mergeset {}", "✓".green().bold(), mergeset.summary());
    println!("  Run {} to apply it.", "changes update".bold());
    Ok(())
}

fn cmd_update(
    register: &Register,
    state_path: &Path,
    args: UpdateArgs,
    moderated: bool,
) -> anyhow::Result<()> {
    let target = args
        .target
        .as_deref()
        .map(|reference| resolve_id(register, reference))
        .transpose()?;
    let result = if moderated {
        let mut moderator = TerminalModerator(Prompt::terminal());
        register.update_moderated(target, &mut moderator)
    } else {
        register.update(target)
    };
    // Changesets applied before a failure stay applied.
    state::save(state_path, register)?;

    match result.map_err(explain_update_error)? {
        UpdateOutcome::Applied(report) => print_report(&report),
        UpdateOutcome::AlreadyAtHead => println!("Working changeset is already at head."),
        UpdateOutcome::NothingCommitted => println!("Nothing committed yet."),
    }
    Ok(())
}

fn explain_update_error(err: RegisterError) -> anyhow::Error {
    let is_conflict = err.conflict().is_some();
    let err = anyhow::Error::new(err);
    if is_conflict {
        err.context("update stopped on a conflict; run `changes moderate` to decide")
    } else {
        err
    }
}

fn print_report(report: &UpdateReport) {
    println!("{} {report}", "✓".green().bold());
    for entity in report.created() {
        println!("  {} {entity}", "created".green());
    }
    for entity in report.updated() {
        println!("  {} {entity}", "updated".yellow());
    }
    for entity in report.deleted() {
        println!("  {} {entity}", "deleted".red());
    }
    for entity in &report.skipped {
        println!("  {} {entity}", "skipped".dimmed());
    }
    for entity in &report.masked {
        println!("  {} {entity}", "masked".magenta());
    }
}

async fn cmd_pull(
    register: &Register,
    state_path: &Path,
    config: &Config,
    args: PullArgs,
) -> anyhow::Result<()> {
    let sources = if args.sources.is_empty() {
        config.sources()
    } else {
        args.sources
    };
    if sources.is_empty() {
        bail!("no sources given and none configured under [changeset] sources");
    }

    let mut total = 0;
    for location in &sources {
        let source = open_source(location);
        let added = register
            .pull(source.as_ref())
            .await
            .with_context(|| format!("pulling from {location}"))?;
        state::save(state_path, register)?;
        println!("  {} {} new changeset(s)", location.bold(), added.len());
        total += added.len();
    }
    println!("{} Pulled {total} changeset(s)", "✓".green().bold());
    Ok(())
}

fn cmd_working(register: &Register) -> anyhow::Result<()> {
    match register.get_working()? {
        Some(working) => {
            for log in register.log(Some(working.id()))? {
                println!("{log}");
            }
        }
        None => println!("No working changeset."),
    }
    Ok(())
}

fn cmd_record(register: &Register, state_path: &Path, args: RecordArgs) -> anyhow::Result<()> {
    let entity = EntityRef::parse(&args.reference)?;
    let message = args.message.unwrap_or_else(|| format!("edit {entity}"));
    let draft = RevisionDraft::new(register.author(), message);
    let draft = if args.delete {
        draft.remove(entity)
    } else {
        let Some(attrs) = args.attrs else {
            bail!("attributes are required unless --delete is given");
        };
        let state: AttrMap =
            serde_json::from_str(&attrs).context("attributes must be a JSON object")?;
        draft.put(entity, state)
    };

    let revision = register.model().record(draft)?;
    state::save(state_path, register)?;
    println!(
        "{} Recorded revision {} ({} entity change(s))",
        "✓".green().bold(),
        revision.id.short_id().yellow(),
        revision.entries.len()
    );
    Ok(())
}

fn cmd_masks(register: &Register) -> anyhow::Result<()> {
    let masks = register.changemasks()?;
    if masks.is_empty() {
        println!("No changemasks.");
    }
    for mask in &masks {
        println!(
            "{} masked by {} on {}",
            mask.entity.to_string().magenta(),
            mask.author,
            mask.created.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}
