//! bridgechart CLI
//!
//! Usage:
//!   bridgechart [OPTIONS] [FILE]
//!
//! Options:
//!   -o, --output <FILE>  Write to a file instead of stdout
//!   -f, --format <FMT>   svg (default), png or json
//!   -t, --theme <FILE>   Color theme (TOML format)
//!   -g, --grammar        Show the notation reference
//!   -h, --help           Print help

use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use bridgechart::{build_scene, export, ExportOptions, RenderConfig, RenderError, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Svg,
    Png,
    Json,
}

#[derive(Parser)]
#[command(name = "bridgechart")]
#[command(about = "Flowcharts from Bridge notation")]
struct Cli {
    /// Input file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Output file (writes to stdout if not provided)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "svg")]
    format: Format,

    /// Color theme file (TOML format)
    #[arg(short, long)]
    theme: Option<PathBuf>,

    /// Show the notation reference
    #[arg(short, long)]
    grammar: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if cli.grammar {
        print_grammar();
        return;
    }

    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    let theme = match &cli.theme {
        Some(path) => match Theme::from_file(path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Error loading theme '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Theme::default(),
    };

    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let config = RenderConfig::new().with_theme(theme);
    let (scene, diagnostics) = match build_scene(&source, &config.layout) {
        Ok(built) => built,
        Err(RenderError::Empty) => {
            eprintln!("Nothing to draw: the input declares no blocks. Run --grammar for the notation.");
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let color = io::stderr().is_terminal();
    for diagnostic in &diagnostics {
        eprint!("{}", diagnostic.format_with_color(&source, &filename, color));
    }

    let bytes = match cli.format {
        Format::Svg => {
            export::export_svg(&scene, &config.theme, &config.layout, &config.svg).into_bytes()
        }
        Format::Png => {
            match export::export_png(
                &scene,
                &config.theme,
                &config.layout,
                &config.svg,
                &ExportOptions::default(),
            ) {
                Ok(png) => png,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Format::Json => match serde_json::to_string_pretty(&scene.snapshot()) {
            Ok(json) => json.into_bytes(),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
    };

    if let Err(e) = write_output(cli.output.as_deref(), &bytes) {
        eprintln!("Error writing output: {}", e);
        std::process::exit(1);
    }
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> io::Result<()> {
    match path {
        Some(path) => fs::write(path, bytes),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes)?;
            if !bytes.ends_with(b"\n") {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()
        }
    }
}

fn print_intro() {
    println!(
        r#"bridgechart - Flowcharts from Bridge notation

USAGE:
    bridgechart [OPTIONS] [FILE]
    cat chart.bridge | bridgechart > chart.svg

OPTIONS:
    -o, --output     Write to a file instead of stdout
    -f, --format     svg (default), png or json
    -t, --theme      Color theme (TOML file)
    -g, --grammar    Show the notation reference
    -h, --help       Print help

Run --grammar for the notation reference."#
    );
}

fn print_grammar() {
    println!(
        r#"BRIDGE NOTATION
===============

A chart has two phases separated by a line of dots (`...`).

DECLARATIONS (one block per line)
---------------------------------
    ts()             start terminator, labelled "Start"
    te()             end terminator, labelled "End"
    t(text)          terminator
    p[text]          process
    l[text]          input or output
    d<text>          decision
    c[)              connector
    B{{ *tm:... }}     composite block; fields *tm *bm *tl *tr *bl *br

Text may be quoted with "...", '...', """...""" or '''...'''.
A B{{ block may span several lines until its braces balance.

STRUCTURE (how declared blocks connect)
---------------------------------------
    a>               arrow from the previous block to the next one
    a<               arrow from the next block to the previous one
    a*label*>        labelled arrow
    a>!p[Ask]        back-reference: loop back to an earlier block
    p[Retry] a>!p[Ask]
                     block followed by an inline back-reference
    ma*label*>[      branch out: the previous block connects to every
      a*Yes*         block listed until a line holding only `]`;
      te()           an arrow line labels the next block only
      p[Retry]
    ]
    p[Join] ma<[     merge in: every listed block flows into p[Join]
      p[Left]
      p[Right]
    ]

Blocks are referred to by repeating their declaration; whitespace does
not matter. Unknown lines and references are reported and skipped."#
    );
}
