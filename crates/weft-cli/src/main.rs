use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;
use weft_dom::Document;
use weft_editor_core::{
    AutoLinkOptions, CommandValue, Composer, EditorConfig, ListType, auto_link_with,
    convert_to_list, is_list, resolve_list,
};

#[derive(Parser)]
#[command(version, about = "Weft - rich-text editing over HTML", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Editor configuration as a JSON file
    #[arg(long, global = true, env = "WEFT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn plain-text URLs into links
    Autolink {
        /// HTML fragment to read (stdin if omitted)
        input: Option<PathBuf>,
    },
    /// Turn a fragment into a list, one item per line
    ConvertList {
        input: Option<PathBuf>,

        /// Build an <ol> instead of a <ul>
        #[arg(long)]
        ordered: bool,
    },
    /// Replace every top-level list by its content
    ResolveList {
        input: Option<PathBuf>,
    },
    /// Run an editor command over a fragment
    Exec {
        /// Command name, e.g. bold, createLink, insertUnorderedList
        command: String,

        input: Option<PathBuf>,

        /// Plain command value
        #[arg(long, conflicts_with = "attr")]
        value: Option<String>,

        /// Attribute value, as name=value (repeatable)
        #[arg(long)]
        attr: Vec<String>,

        /// Selection start, in characters of text
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Selection end (defaults to start)
        #[arg(long)]
        end: Option<usize>,

        /// Print a JSON report instead of the resulting HTML
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    init_miette();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Autolink { input } => {
            let mut doc = Document::parse(&read_input(input.as_deref())?);
            let body = doc.body();
            let options = AutoLinkOptions {
                max_display_length: config.max_link_display_length,
            };
            auto_link_with(&mut doc, body, &options)?;
            println!("{}", doc.inner_html(body));
        }
        Commands::ConvertList { input, ordered } => {
            let html = read_input(input.as_deref())?;
            let mut doc = Document::parse(&format!("<div>{html}</div>"));
            let body = doc.body();
            let container = doc
                .first_child(body)
                .ok_or_else(|| miette::miette!("nothing to convert"))?;
            let list_type = if ordered {
                ListType::Ordered
            } else {
                ListType::Unordered
            };
            convert_to_list(&mut doc, container, list_type)?;
            println!("{}", doc.inner_html(body));
        }
        Commands::ResolveList { input } => {
            let mut doc = Document::parse(&read_input(input.as_deref())?);
            let body = doc.body();
            let lists: Vec<_> = doc
                .children(body)
                .iter()
                .copied()
                .filter(|&n| is_list(&doc, n))
                .collect();
            tracing::debug!(lists = lists.len(), "resolving lists");
            for list in lists {
                resolve_list(&mut doc, list, config.use_line_breaks)?;
            }
            println!("{}", doc.inner_html(body));
        }
        Commands::Exec {
            command,
            input,
            value,
            attr,
            start,
            end,
            json,
        } => {
            let value = command_value(value, &attr)?;
            let mut composer = Composer::from_html(&read_input(input.as_deref())?, config);
            composer.set_caret(start, end.unwrap_or(start));

            let changed = composer.exec(&command, value.as_ref());
            if json {
                let report = serde_json::json!({
                    "command": command,
                    "changed": changed,
                    "active": composer.state(&command, value.as_ref()).is_active(),
                    "value": composer.value(&command),
                    "html": composer.get_value(),
                });
                let report = serde_json::to_string_pretty(&report).into_diagnostic()?;
                println!("{report}");
            } else {
                if !changed {
                    tracing::info!(%command, "command made no change");
                }
                println!("{}", composer.get_value());
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let json = std::fs::read_to_string(path).into_diagnostic()?;
    Ok(EditorConfig::from_json(&json)?)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).into_diagnostic(),
        None => {
            let mut html = String::new();
            std::io::stdin()
                .read_to_string(&mut html)
                .into_diagnostic()?;
            Ok(html)
        }
    }
}

fn command_value(value: Option<String>, attrs: &[String]) -> Result<Option<CommandValue>> {
    if attrs.is_empty() {
        return Ok(value.map(CommandValue::text));
    }
    let pairs = attrs
        .iter()
        .map(|a| {
            a.split_once('=')
                .ok_or_else(|| miette::miette!("expected name=value, got {a:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(CommandValue::attributes(pairs)))
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .context_lines(3)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
