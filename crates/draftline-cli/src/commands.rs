use std::path::Path;

use anyhow::{bail, Context as _};
use colored::{ColoredString, Colorize};
use draftline_sdk::{
    ChangeHighlight, ChangeKind, CommitRequest, DocumentId, DocumentStore, Draftline, EngineConfig,
    FieldChange, FieldPath, FieldValue, JsonDirStore, SectionTree, Version, VersionBump,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::cli::*;

const CONFIG_FILE: &str = "draftline.toml";

type Engine = Draftline<JsonDirStore>;

/// Options shared by every command.
struct Context {
    format: OutputFormat,
    author: Option<String>,
    doc: Option<String>,
}

impl Context {
    fn json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}

/// Open the store named by `cli` and run its subcommand.
pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = EngineConfig::load_or_default(&cli.store.join(CONFIG_FILE))?;
    let store = JsonDirStore::open(&cli.store)
        .with_context(|| format!("opening store {}", cli.store.display()))?;
    debug!(store = %cli.store.display(), "store opened");
    let mut engine = Draftline::with_config(store, config);
    let ctx = Context {
        format: cli.format,
        author: cli.author,
        doc: cli.doc,
    };

    match cli.command {
        Command::Init(args) => cmd_init(&mut engine, &ctx, args, &cli.store),
        Command::Status(_) => cmd_status(&mut engine, &ctx),
        Command::Set(args) => cmd_set(&mut engine, &ctx, args),
        Command::Unset(args) => cmd_unset(&mut engine, &ctx, args),
        Command::Discard(_) => cmd_discard(&mut engine, &ctx),
        Command::Commit(args) => cmd_commit(&mut engine, &ctx, args),
        Command::Log(args) => cmd_log(&mut engine, &ctx, args),
        Command::Show(args) => cmd_show(&mut engine, &ctx, args),
        Command::Diff(args) => cmd_diff(&mut engine, &ctx, args),
        Command::Revert(args) => cmd_revert(&mut engine, &ctx, args),
        Command::Verify(_) => cmd_verify(&engine, &ctx),
    }
}

fn select_document(engine: &Engine, requested: Option<&str>) -> anyhow::Result<DocumentId> {
    let ids = engine.document_ids()?;
    let mut candidates: Vec<DocumentId> = match requested {
        Some(prefix) => ids
            .into_iter()
            .filter(|id| id.to_string().starts_with(prefix))
            .collect(),
        None => ids,
    };
    match (candidates.len(), requested) {
        (1, _) => Ok(candidates.remove(0)),
        (0, Some(prefix)) => bail!("no document matches `{prefix}`"),
        (0, None) => bail!("the store holds no documents; run `draftline init <title>` first"),
        (_, Some(prefix)) => bail!("`{prefix}` matches several documents; use a longer prefix"),
        (_, None) => bail!("the store holds several documents; choose one with --doc"),
    }
}

/// JSON when `raw` parses as JSON, otherwise plain text.
fn parse_value(raw: &str) -> anyhow::Result<FieldValue> {
    match serde_json::from_str::<Value>(raw) {
        Ok(json) => Ok(FieldValue::from_json(json)?),
        Err(_) => Ok(FieldValue::text(raw)),
    }
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn marker(kind: ChangeKind) -> ColoredString {
    match kind {
        ChangeKind::Added => "+".green().bold(),
        ChangeKind::Modified => "~".yellow().bold(),
        ChangeKind::Deleted => "-".red().bold(),
    }
}

fn print_highlights(highlights: &[ChangeHighlight]) {
    for h in highlights {
        println!("  {} {}  {}", marker(h.kind), h.path.to_string().bold(), h.tooltip.dimmed());
    }
}

fn print_changes(engine: &Engine, changes: &[FieldChange]) {
    if changes.is_empty() {
        println!("  {}", "no changes".dimmed());
    } else {
        print_highlights(&engine.build_highlights(changes));
    }
}

fn cmd_init(engine: &mut Engine, ctx: &Context, args: InitArgs, root: &Path) -> anyhow::Result<()> {
    let sections = match &args.from {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            SectionTree::from_json(serde_json::from_str(&text)?)?
        }
        None => SectionTree::new(),
    };
    let id = engine.create_document(&args.title, sections, ctx.author.as_deref())?;

    let config_path = root.join(CONFIG_FILE);
    if args.config && !config_path.exists() {
        std::fs::write(&config_path, engine.config().to_toml_string()?)?;
    }

    if ctx.json() {
        return print_json(&json!({"document": id, "title": args.title, "version": "1.0"}));
    }
    println!("{} Created {} ({})", "✓".green().bold(), args.title.bold(), id.to_string().cyan());
    println!("  Version: {}", "v1.0".yellow());
    println!("  Store: {}", root.display());
    Ok(())
}

fn cmd_status(engine: &mut Engine, ctx: &Context) -> anyhow::Result<()> {
    let id = select_document(engine, ctx.doc.as_deref())?;
    let document = engine.open(&id)?;
    let head = document.head().clone();
    let title = document.title().to_string();
    let latest = document.history().latest().number;
    let state = document.working_copy().map(|wc| wc.state()).unwrap_or_default();
    let pending = engine.pending_changes(&id)?;

    if ctx.json() {
        return print_json(&json!({
            "document": id,
            "title": title,
            "head": head.number,
            "latest": latest,
            "state": state,
            "pending": pending,
        }));
    }
    println!("{} ({})", title.bold(), id.to_string().cyan());
    let head_note = if head.number == latest {
        String::new()
    } else {
        format!(" (latest is v{latest})")
    };
    println!("Head: {}{}", format!("v{}", head.number).yellow().bold(), head_note);
    if pending.is_empty() {
        println!("\nNo uncommitted changes.");
    } else {
        println!("\nUncommitted changes ({}):", pending.len());
        print_changes(engine, &pending);
    }
    Ok(())
}

fn cmd_set(engine: &mut Engine, ctx: &Context, args: SetArgs) -> anyhow::Result<()> {
    let id = select_document(engine, ctx.doc.as_deref())?;
    let path = FieldPath::parse(&args.path)?;
    let pending = engine.apply_edit(&id, &path, parse_value(&args.value)?, ctx.author.as_deref())?;
    report_pending(engine, ctx, &pending)
}

fn cmd_unset(engine: &mut Engine, ctx: &Context, args: UnsetArgs) -> anyhow::Result<()> {
    let id = select_document(engine, ctx.doc.as_deref())?;
    let path = FieldPath::parse(&args.path)?;
    let pending = engine.remove_field(&id, &path, ctx.author.as_deref())?;
    report_pending(engine, ctx, &pending)
}

fn report_pending(engine: &Engine, ctx: &Context, pending: &[FieldChange]) -> anyhow::Result<()> {
    if ctx.json() {
        return print_json(&pending);
    }
    println!("{} {} uncommitted change(s)", "✓".green().bold(), pending.len());
    print_changes(engine, pending);
    Ok(())
}

fn cmd_discard(engine: &mut Engine, ctx: &Context) -> anyhow::Result<()> {
    let id = select_document(engine, ctx.doc.as_deref())?;
    let dropped = engine.pending_changes(&id)?.len();
    engine.discard(&id)?;
    if ctx.json() {
        return print_json(&json!({"discarded": dropped}));
    }
    println!("{} Discarded {} change(s)", "✓".green().bold(), dropped);
    Ok(())
}

fn cmd_commit(engine: &mut Engine, ctx: &Context, args: CommitArgs) -> anyhow::Result<()> {
    let id = select_document(engine, ctx.doc.as_deref())?;
    let author = ctx
        .author
        .clone()
        .unwrap_or_else(|| engine.config().default_author.clone());
    let bump = if args.major {
        VersionBump::Major
    } else {
        engine.config().default_bump
    };
    let version = engine.commit_with(&id, CommitRequest::new(args.message, author).with_bump(bump))?;

    if ctx.json() {
        return print_json(&version);
    }
    println!(
        "{} Committed {} {}",
        "✓".green().bold(),
        format!("v{}", version.number).yellow().bold(),
        version.id.short_id().dimmed()
    );
    println!("  Message: {}", version.message);
    println!("  Author: {}", version.author);
    println!("  Changes: {}", version.changes.len());
    Ok(())
}

fn cmd_log(engine: &mut Engine, ctx: &Context, args: LogArgs) -> anyhow::Result<()> {
    let id = select_document(engine, ctx.doc.as_deref())?;
    let head = engine.open(&id)?.head().id.clone();
    let versions: Vec<Version> = engine
        .history(&id)?
        .iter()
        .rev()
        .take(args.limit)
        .cloned()
        .collect();

    if ctx.json() {
        let entries: Vec<Value> = versions
            .iter()
            .map(|v| {
                json!({
                    "id": v.id,
                    "number": v.number,
                    "parent": v.parent_id,
                    "message": v.message,
                    "author": v.author,
                    "timestamp": v.timestamp,
                    "changes": v.changes.len(),
                    "head": v.id == head,
                })
            })
            .collect();
        return print_json(&entries);
    }

    for v in &versions {
        let head_tag = if v.id == head {
            format!(" ({})", "head".green())
        } else {
            String::new()
        };
        if args.oneline {
            println!(
                "{} {} {}{}",
                format!("v{}", v.number).yellow(),
                v.id.short_id().dimmed(),
                v.message,
                head_tag
            );
        } else {
            println!(
                "{}  {}{}",
                format!("v{}", v.number).yellow().bold(),
                v.id.short_id().dimmed(),
                head_tag
            );
            println!("  Author: {}  Date: {}", v.author, v.timestamp.to_rfc3339());
            println!("  {}", v.message);
            println!("  {} change(s)\n", v.changes.len());
        }
    }
    Ok(())
}

fn cmd_show(engine: &mut Engine, ctx: &Context, args: ShowArgs) -> anyhow::Result<()> {
    let id = select_document(engine, ctx.doc.as_deref())?;
    let vid = engine.resolve_version(&id, &args.version)?;
    let document = engine.open(&id)?;
    let version = document.version(&vid)?.clone();
    let parent = match &version.parent_id {
        Some(p) => Some(document.version(p)?.number),
        None => None,
    };

    if ctx.json() {
        return print_json(&version);
    }
    println!("{}  {}", format!("v{}", version.number).yellow().bold(), version.id);
    match parent {
        Some(number) => println!("Parent: v{number}"),
        None => println!("Parent: {}", "none (initial version)".dimmed()),
    }
    println!("Author: {}", version.author);
    println!("Date: {}", version.timestamp.to_rfc3339());
    println!("Content: {}", version.content_hash.dimmed());
    println!("\n  {}\n", version.message);
    print_changes(engine, &version.changes);
    Ok(())
}

fn cmd_diff(engine: &mut Engine, ctx: &Context, args: DiffArgs) -> anyhow::Result<()> {
    let id = select_document(engine, ctx.doc.as_deref())?;
    let Some(from) = args.from else {
        let pending = engine.pending_changes(&id)?;
        if ctx.json() {
            return print_json(&engine.build_highlights(&pending));
        }
        println!("Uncommitted changes:");
        print_changes(engine, &pending);
        return Ok(());
    };

    let from = engine.resolve_version(&id, &from)?;
    let to = engine.resolve_version(&id, args.to.as_deref().unwrap_or("head"))?;
    let diff = engine.compare_versions(&id, &from, &to)?;

    if ctx.json() {
        return print_json(&diff);
    }
    println!(
        "{} {} {}",
        format!("v{}", diff.from_number).yellow(),
        "→".dimmed(),
        format!("v{}", diff.to_number).yellow()
    );
    let s = &diff.summary;
    println!(
        "{} section(s): {} added, {} modified, {} deleted\n",
        s.sections_touched,
        s.added.to_string().green(),
        s.modified.to_string().yellow(),
        s.deleted.to_string().red()
    );
    print_changes(engine, &diff.changes);
    Ok(())
}

fn cmd_revert(engine: &mut Engine, ctx: &Context, args: RevertArgs) -> anyhow::Result<()> {
    let id = select_document(engine, ctx.doc.as_deref())?;
    let target = engine.resolve_version(&id, &args.version)?;
    let pending = engine.pending_changes(&id)?.len();
    if pending > 0 && !args.yes {
        bail!("reverting discards {pending} uncommitted change(s); pass --yes to confirm");
    }
    engine.revert(&id, &target)?;
    let number = engine.open(&id)?.head().number;

    if ctx.json() {
        return print_json(&json!({"head": number, "discarded": pending}));
    }
    println!(
        "{} Working copy now starts from {}",
        "✓".green().bold(),
        format!("v{number}").yellow().bold()
    );
    if pending > 0 {
        println!("  Discarded {pending} uncommitted change(s)");
    }
    Ok(())
}

fn cmd_verify(engine: &Engine, ctx: &Context) -> anyhow::Result<()> {
    let id = select_document(engine, ctx.doc.as_deref())?;
    let report = engine.verify(&id)?;

    if ctx.json() {
        let violations: Vec<Value> = report
            .violations
            .iter()
            .map(|v| {
                json!({
                    "version": v.number,
                    "kind": format!("{:?}", v.kind),
                    "description": v.description,
                })
            })
            .collect();
        print_json(&json!({
            "versions": report.version_count,
            "valid": report.is_valid(),
            "violations": violations,
        }))?;
    } else {
        let check = |ok: bool, good: &str| {
            if ok {
                good.green()
            } else {
                "FAILED".red().bold()
            }
        };
        println!("History of {} ({} versions)", id.to_string().cyan(), report.version_count);
        println!("  Numbers: {}", check(report.numbers_monotonic, "monotonic"));
        println!("  Parents: {}", check(report.parents_linked, "linked"));
        println!("  Content: {}", check(report.content_intact, "intact"));
        for v in &report.violations {
            println!("  {} v{}: {}", "✗".red(), v.number, v.description);
        }
    }

    if !report.is_valid() {
        bail!("{} integrity violation(s)", report.violations.len());
    }
    if !ctx.json() {
        println!("{} History integrity verified", "✓".green().bold());
    }
    Ok(())
}
