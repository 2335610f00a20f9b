use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use rulescope::scope_names::style_index;
use rulescope::{Chunk, DEFAULT_MAX_NESTING_DEPTH, ParseOptions, Registry, Scope};

/// Tokenize a file and print its chunks and scopes
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Grammar id or alias, eg `html` or `js`
    lang: Option<String>,

    /// File to tokenize. Reads from stdin if missing
    file: Option<PathBuf>,

    /// Extra JSON grammar definitions to register
    #[arg(short, long = "grammar")]
    grammars: Vec<PathBuf>,

    /// List the registered grammars and exit
    #[arg(long)]
    list: bool,

    /// Print the chunks as JSON
    #[arg(long, conflicts_with = "color")]
    json: bool,

    /// Print the source with ANSI colours instead of the scope trees
    #[arg(long)]
    color: bool,

    /// Maximum nesting of embedded languages
    #[arg(long, default_value_t = DEFAULT_MAX_NESTING_DEPTH)]
    max_depth: usize,
}

const PALETTE: &[u8] = &[244, 204, 114, 215, 110, 244, 109, 174, 180, 114, 215, 174, 110, 114, 180];

fn print_scope_tree(chunk: &Chunk) {
    println!("{:?}", chunk.text);
    for root in &chunk.scopes {
        for (ancestors, scope) in root.walk() {
            let indent = "  ".repeat(ancestors.len() + 1);
            println!(
                "{indent}{} [{}..{}] {:?}",
                scope.name,
                scope.start,
                scope.end(),
                &chunk.text[scope.span()]
            );
        }
    }
}

fn print_colored(text: &str, scopes: &[Scope]) {
    let mut out = String::new();
    for token in rulescope::flatten(scopes, text.len()) {
        let piece = &text[token.span];
        // innermost scope with a style wins
        match token
            .scopes
            .iter()
            .rev()
            .find_map(|s| style_index(s))
            .and_then(|i| PALETTE.get(i))
        {
            Some(colour) => out.push_str(&format!("\x1b[38;5;{colour}m{piece}\x1b[0m")),
            None => out.push_str(piece),
        }
    }
    print!("{out}");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let registry = Registry::with_builtin_grammars()
        .with_options(ParseOptions::new().max_nesting_depth(cli.max_depth));
    for path in &cli.grammars {
        registry.register_from_path(path)?;
    }

    if cli.list {
        for id in registry.repository().ids() {
            if let Some(definition) = registry.find(&id) {
                println!("{id}: {}", definition.name);
            }
        }
        return Ok(());
    }

    let Some(lang) = cli.lang else {
        return Err("a grammar id is required unless --list is given".into());
    };

    let source = match &cli.file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    if cli.color {
        registry.parse(&lang, &source, print_colored)?;
        println!();
    } else if cli.json {
        let chunks = registry.tokenize(&lang, &source)?;
        println!("{}", serde_json::to_string_pretty(&chunks)?);
    } else {
        for chunk in registry.tokenize(&lang, &source)? {
            print_scope_tree(&chunk);
        }
    }

    Ok(())
}
