use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};

use anyhow::{anyhow, Context};
use chrono::Utc;
use colored::Colorize;
use serde_json::{json, Value};
use vellum_document::{Document, Storage, StorageConfig};
use vellum_types::DocumentId;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let storage = open_storage(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Save(args) => cmd_save(&storage, args, format),
        Command::Promote(args) => cmd_promote(&storage, args, format),
        Command::History(args) => cmd_history(&storage, args, format),
        Command::Promoted(args) => cmd_promoted(&storage, args, format),
        Command::Show(args) => cmd_show(&storage, args, format),
        Command::Dump(args) => cmd_dump(&storage, args),
        Command::Load(args) => cmd_load(&storage, args, format),
        Command::List => cmd_list(&storage, format),
    }
}

fn open_storage(cli: &Cli) -> anyhow::Result<Storage> {
    let mut config = match &cli.config {
        Some(path) => StorageConfig::load(path)?,
        None => StorageConfig::default(),
    };
    if let Some(dir) = &cli.storage {
        config.storage_path = dir.clone();
    }
    Ok(Storage::new(config)?)
}

fn open_document(storage: &Storage, id: &str, rev: Option<&str>) -> anyhow::Result<Document> {
    let id = DocumentId::parse(id)?;
    Document::open(storage, id.clone(), rev)?.ok_or_else(|| anyhow!("no such document: {id}"))
}

/// Bind to an existing document without loading a revision.
fn attach_document(storage: &Storage, id: &str) -> anyhow::Result<Document> {
    let id = DocumentId::parse(id)?;
    if storage.open(&id)?.is_none() {
        return Err(anyhow!("no such document: {id}"));
    }
    Ok(Document::attach(storage, id)?)
}

fn read_content(arg: &str) -> anyhow::Result<Value> {
    let text = if arg == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        arg.to_string()
    };
    serde_json::from_str(&text).context("content must be valid JSON")
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_save(storage: &Storage, args: SaveArgs, format: OutputFormat) -> anyhow::Result<()> {
    let content = read_content(&args.content)?;
    let mut doc = match &args.id {
        Some(id) => {
            let id = DocumentId::parse(id.as_str())?;
            match args.type_tag.as_deref() {
                Some(t) => Document::with_id(storage, id, Some(t), content)?,
                None => {
                    let mut doc = Document::attach(storage, id)?;
                    doc.set_content(content);
                    doc
                }
            }
        }
        None => Document::with_id(
            storage,
            DocumentId::generate(),
            args.type_tag.as_deref(),
            content,
        )?,
    };

    let message = args.author.message.unwrap_or_else(|| "Save".into());
    let author = &args.author.author;
    let revision = match &args.state {
        Some(state) => doc.save_in(state, author, &message, Utc::now())?,
        None => doc.save(author, &message, Utc::now())?,
    };
    let state = args
        .state
        .unwrap_or_else(|| storage.config().draft_state.clone());

    match format {
        OutputFormat::Json => print_json(&json!({
            "id": doc.id(),
            "type": doc.type_tag(),
            "state": state,
            "revision": revision,
        })),
        OutputFormat::Text => {
            println!(
                "{} Saved {} to {} at {}",
                "✓".green().bold(),
                doc.id().to_string().bold(),
                state.yellow(),
                revision.short_hex().dimmed()
            );
            Ok(())
        }
    }
}

fn cmd_promote(storage: &Storage, args: PromoteArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut doc = attach_document(storage, &args.id)?;
    let message = args
        .author
        .message
        .unwrap_or_else(|| format!("Promote {} to {}", args.from, args.to));
    let revision = doc.promote(
        &args.from,
        &args.to,
        &args.author.author,
        &message,
        Utc::now(),
    )?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "id": doc.id(),
            "from": args.from,
            "to": args.to,
            "revision": revision,
        })),
        OutputFormat::Text => {
            println!(
                "{} Promoted {} → {} at {}",
                "✓".green().bold(),
                args.from.yellow(),
                args.to.yellow(),
                revision.short_hex().dimmed()
            );
            Ok(())
        }
    }
}

fn cmd_history(storage: &Storage, args: HistoryArgs, format: OutputFormat) -> anyhow::Result<()> {
    let doc = attach_document(storage, &args.id)?;
    let state = args
        .state
        .unwrap_or_else(|| storage.config().draft_state.clone());
    let limit = args.limit.unwrap_or(usize::MAX);
    let entries = doc
        .history(Some(state.as_str()))?
        .take(limit)
        .collect::<Result<Vec<_>, _>>()?;

    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(&entries)?);
    }
    if entries.is_empty() {
        println!("No revisions on {}.", state.yellow());
    }
    for entry in &entries {
        let rev = &entry.revision;
        if args.oneline {
            println!(
                "{} {:<9} {}",
                rev.id.short_hex().yellow(),
                entry.kind.to_string().cyan(),
                rev.message
            );
            continue;
        }
        println!(
            "{}  {}",
            rev.id.to_hex().yellow().bold(),
            entry.kind.to_string().cyan()
        );
        println!("  Author: {}", rev.author);
        println!("  Date:   {}", rev.timestamp.to_rfc3339());
        if let Some(previous) = entry.parents.previous {
            println!("  Previous: {}", previous.short_hex().dimmed());
        }
        if let Some(source) = entry.parents.source {
            println!("  Source:   {}", source.short_hex().dimmed());
        }
        println!("\n    {}\n", rev.message);
    }
    Ok(())
}

fn cmd_promoted(storage: &Storage, args: PromotedArgs, format: OutputFormat) -> anyhow::Result<()> {
    let doc = open_document(storage, &args.id, args.rev.as_deref())?;
    let promoted = doc.has_been_promoted(&args.to, None)?;
    let revision = doc.revision();

    match format {
        OutputFormat::Json => print_json(&json!({
            "id": doc.id(),
            "revision": revision,
            "to": args.to,
            "promoted": promoted,
        })),
        OutputFormat::Text => {
            let rev = revision.map(|r| r.short_hex()).unwrap_or_default();
            if promoted {
                println!(
                    "{} {} has been promoted to {}",
                    "✓".green().bold(),
                    rev.yellow(),
                    args.to.yellow()
                );
            } else {
                println!(
                    "{} {} has not been promoted to {}",
                    "✗".red().bold(),
                    rev.yellow(),
                    args.to.yellow()
                );
            }
            Ok(())
        }
    }
}

fn cmd_show(storage: &Storage, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let doc = open_document(storage, &args.id, args.rev.as_deref())?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "id": doc.id(),
            "type": doc.type_tag(),
            "revision": doc.revision(),
            "content": doc.content(),
        })),
        OutputFormat::Text => {
            let rev = doc.revision().map(|r| r.short_hex()).unwrap_or_default();
            println!(
                "{} {} ({}) at {}",
                "Document".bold(),
                doc.id(),
                doc.type_tag().cyan(),
                rev.yellow()
            );
            print_json(doc.content())
        }
    }
}

fn cmd_dump(storage: &Storage, args: DumpArgs) -> anyhow::Result<()> {
    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let summary = if args.ids.is_empty() {
        vellum_pack::dump_storage(storage, out)?
    } else {
        let docs = args
            .ids
            .iter()
            .map(|id| attach_document(storage, id))
            .collect::<anyhow::Result<Vec<_>>>()?;
        vellum_pack::dump(&docs, out)?
    };

    if args.output.is_some() {
        println!(
            "{} Dumped {} documents ({} objects, {} refs)",
            "✓".green().bold(),
            summary.documents,
            summary.objects,
            summary.references
        );
    }
    Ok(())
}

fn cmd_load(storage: &Storage, args: LoadArgs, format: OutputFormat) -> anyhow::Result<()> {
    let input: Box<dyn io::BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let mut loaded = Vec::new();
    for doc in vellum_pack::Loader::new(storage, input) {
        let doc = doc?;
        if format == OutputFormat::Text {
            let rev = doc.revision().map(|r| r.short_hex()).unwrap_or_default();
            println!(
                "{} Loaded {} at {}",
                "✓".green(),
                doc.id().to_string().bold(),
                rev.dimmed()
            );
        }
        loaded.push(doc.id().to_string());
    }

    if format == OutputFormat::Json {
        return print_json(&json!({ "loaded": loaded }));
    }
    Ok(())
}

fn cmd_list(storage: &Storage, format: OutputFormat) -> anyhow::Result<()> {
    let documents = storage.documents()?;
    match format {
        OutputFormat::Json => print_json(&Value::Array(
            documents
                .iter()
                .map(|(id, t)| json!({"id": id, "type": t}))
                .collect(),
        )),
        OutputFormat::Text => {
            if documents.is_empty() {
                println!("No documents.");
            }
            for (id, type_tag) in &documents {
                println!("{}  {}", id.to_string().yellow(), type_tag.cyan());
            }
            Ok(())
        }
    }
}
