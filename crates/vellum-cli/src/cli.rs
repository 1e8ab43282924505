use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vellum_types::Signature;

#[derive(Parser)]
#[command(
    name = "vellum",
    about = "Vellum: versioned documents with publishing states",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML storage configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage directory, overriding the configuration
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Save content as a new revision
    Save(SaveArgs),
    /// Promote one state's tip into another state
    Promote(PromoteArgs),
    /// Show the revision history of a state
    History(HistoryArgs),
    /// Check whether a revision has been promoted into a state
    Promoted(PromotedArgs),
    /// Show a document's content at a revision
    Show(ShowArgs),
    /// Write documents with full history to a dump
    Dump(DumpArgs),
    /// Restore documents from a dump
    Load(LoadArgs),
    /// List registered documents
    List,
}

#[derive(Args)]
pub struct AuthorArgs {
    /// Author as "Name <email>"
    #[arg(long, default_value = "Vellum <vellum@localhost>", value_parser = parse_signature)]
    pub author: Signature,
    #[arg(short, long)]
    pub message: Option<String>,
}

#[derive(Args)]
pub struct SaveArgs {
    /// JSON content, or "-" to read it from stdin
    pub content: String,
    /// Existing document id; a new document is created when omitted
    #[arg(long)]
    pub id: Option<String>,
    /// Type recorded for a new document
    #[arg(long = "type")]
    pub type_tag: Option<String>,
    /// State to save to instead of the draft state
    #[arg(long)]
    pub state: Option<String>,
    #[command(flatten)]
    pub author: AuthorArgs,
}

#[derive(Args)]
pub struct PromoteArgs {
    pub id: String,
    pub from: String,
    pub to: String,
    #[command(flatten)]
    pub author: AuthorArgs,
}

#[derive(Args)]
pub struct HistoryArgs {
    pub id: String,
    /// State to walk; the draft state when omitted
    #[arg(long)]
    pub state: Option<String>,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct PromotedArgs {
    pub id: String,
    /// Destination state
    pub to: String,
    /// Commit hash or state name; HEAD's state when omitted
    #[arg(long)]
    pub rev: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: String,
    #[arg(long)]
    pub rev: Option<String>,
}

#[derive(Args)]
pub struct DumpArgs {
    /// Documents to dump; every registered document when empty
    pub ids: Vec<String>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct LoadArgs {
    /// Dump file; stdin when omitted
    pub input: Option<PathBuf>,
}

/// Parse `Name <email>`. A bare name gets an empty email.
pub fn parse_signature(s: &str) -> Result<Signature, String> {
    let s = s.trim();
    match s.split_once('<') {
        Some((name, rest)) => {
            let email = rest
                .strip_suffix('>')
                .ok_or_else(|| format!("missing closing '>' in {s:?}"))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(format!("missing name in {s:?}"));
            }
            Ok(Signature::new(name, email.trim()))
        }
        None if s.is_empty() => Err("author must not be empty".into()),
        None => Ok(Signature::new(s, "")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_save() {
        let cli = Cli::try_parse_from(["vellum", "save", r#"{"a":1}"#, "-m", "first"]).unwrap();
        if let Command::Save(args) = cli.command {
            assert_eq!(args.content, r#"{"a":1}"#);
            assert_eq!(args.author.message, Some("first".into()));
            assert_eq!(args.author.author.name, "Vellum");
            assert!(args.id.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_save_into_state() {
        let cli = Cli::try_parse_from([
            "vellum", "save", "{}", "--id", "doc1", "--state", "published", "--type", "article",
        ])
        .unwrap();
        if let Command::Save(args) = cli.command {
            assert_eq!(args.id.as_deref(), Some("doc1"));
            assert_eq!(args.state.as_deref(), Some("published"));
            assert_eq!(args.type_tag.as_deref(), Some("article"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_promote_with_author() {
        let cli = Cli::try_parse_from([
            "vellum",
            "promote",
            "doc1",
            "master",
            "published",
            "--author",
            "Jane <jane@example.com>",
        ])
        .unwrap();
        if let Command::Promote(args) = cli.command {
            assert_eq!(args.from, "master");
            assert_eq!(args.to, "published");
            assert_eq!(args.author.author, Signature::new("Jane", "jane@example.com"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_history_oneline() {
        let cli =
            Cli::try_parse_from(["vellum", "history", "doc1", "--oneline", "-n", "5"]).unwrap();
        if let Command::History(args) = cli.command {
            assert!(args.oneline);
            assert_eq!(args.limit, Some(5));
            assert!(args.state.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_promoted() {
        let cli = Cli::try_parse_from([
            "vellum", "promoted", "doc1", "published", "--rev", "master",
        ])
        .unwrap();
        if let Command::Promoted(args) = cli.command {
            assert_eq!(args.to, "published");
            assert_eq!(args.rev.as_deref(), Some("master"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_dump_and_load() {
        let cli = Cli::try_parse_from(["vellum", "dump", "a", "b", "-o", "out.dump"]).unwrap();
        if let Command::Dump(args) = cli.command {
            assert_eq!(args.ids, vec!["a", "b"]);
            assert_eq!(args.output, Some(PathBuf::from("out.dump")));
        } else {
            panic!("wrong command");
        }

        let cli = Cli::try_parse_from(["vellum", "load"]).unwrap();
        assert!(matches!(cli.command, Command::Load(LoadArgs { input: None })));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "vellum",
            "list",
            "--storage",
            "/tmp/docs",
            "--config",
            "vellum.toml",
            "-v",
            "--format",
            "json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::List));
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.storage, Some(PathBuf::from("/tmp/docs")));
        assert_eq!(cli.config, Some(PathBuf::from("vellum.toml")));
    }

    #[test]
    fn unknown_command_rejected() {
        assert!(Cli::try_parse_from(["vellum", "merge"]).is_err());
    }

    #[test]
    fn signature_parsing() {
        assert_eq!(
            parse_signature(" Jane Doe <jane@example.com> ").unwrap(),
            Signature::new("Jane Doe", "jane@example.com")
        );
        assert_eq!(parse_signature("bot").unwrap(), Signature::new("bot", ""));
        assert!(parse_signature("<x@y>").is_err());
        assert!(parse_signature("Jane <jane").is_err());
        assert!(parse_signature("").is_err());
    }
}
