use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rlox_tree as lox;

use lox::ast_printer::AstPrinter;
use lox::error::LoxError;
use lox::interpreter::{Interpreter, DEFAULT_MAX_CALL_DEPTH};
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::{scan_tokens, Scanner};

const EXIT_STATIC_ERROR: i32 = 65;
const EXIT_RUNTIME_ERROR: i32 = 70;
const EXIT_IO_ERROR: i32 = 74;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,

    /// Maximum nesting of Lox calls before a stack overflow is reported
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: Option<PathBuf> },

    /// Parses input from a file as a single expression and prints its AST
    Parse {
        filename: Option<PathBuf>,

        /// Print the tree as JSON instead of prefix form
        #[arg(long)]
        json: bool,
    },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program; starts a prompt without one
    Run { filename: Option<PathBuf> },
}

/// Source bytes of a file, memory mapped.  Empty files cannot be mapped.
enum Source {
    Mapped(Mmap),
    Empty,
}

impl Source {
    fn open(filename: &Path) -> Result<Self> {
        info!("Reading file: {:?}", filename);

        let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
        let len = file
            .metadata()
            .context(format!("Failed to stat file {:?}", filename))?
            .len();

        if len == 0 {
            return Ok(Source::Empty);
        }

        // SAFETY: the mapping is read-only and lives until the process exits;
        // the file is not expected to change underneath us.
        let map = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

        info!("Mapped {} bytes from {:?}", map.len(), filename);
        Ok(Source::Mapped(map))
    }

    fn text(&self) -> Result<&str> {
        match self {
            Source::Mapped(map) => std::str::from_utf8(map)
                .map_err(LoxError::Utf8)
                .context("Source is not valid UTF-8"),
            Source::Empty => Ok(""),
        }
    }
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let path = record.module_path().unwrap_or("<unnamed>");
            let module = path.strip_prefix("rlox_tree::").unwrap_or(path);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Diagnostics on stderr, then the exit status they call for.
fn report(errors: &[LoxError]) -> ! {
    for error in errors {
        debug!("Reporting error (line {:?}): {}", error.line(), error);
        eprintln!("{}", error);
    }

    let code = if errors.iter().any(LoxError::is_static) {
        EXIT_STATIC_ERROR
    } else {
        EXIT_RUNTIME_ERROR
    };

    process::exit(code)
}

fn read_or_exit(filename: &Path) -> Source {
    match Source::open(filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(EXIT_IO_ERROR);
        }
    }
}

fn text_or_exit(source: &Source) -> &str {
    match source.text() {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(EXIT_IO_ERROR);
        }
    }
}

fn no_input() -> ! {
    info!("No filepath provided");
    println!("No input filepath was provided. Exiting...");
    process::exit(0)
}

fn tokenize(text: &str) {
    let mut tokenized = true;

    for token in Scanner::new(text) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);
                println!("{}", token);
            }
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC_ERROR);
        process::exit(EXIT_STATIC_ERROR);
    }

    info!("Tokenization completed successfully");
}

fn parse(text: &str, json: bool) -> Result<()> {
    let (tokens, errors) = scan_tokens(text);
    if !errors.is_empty() {
        report(&errors);
    }

    let expr = Parser::new(&tokens)
        .parse_expression()
        .unwrap_or_else(|errors| report(&errors));

    info!("Expression parsed successfully");

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&expr).context("Failed to serialize AST")?
        );
    } else {
        println!("{}", AstPrinter::print(&expr));
    }

    Ok(())
}

fn evaluate(text: &str, max_call_depth: usize) {
    let (tokens, errors) = scan_tokens(text);
    if !errors.is_empty() {
        report(&errors);
    }

    let expr = Parser::new(&tokens)
        .parse_expression()
        .unwrap_or_else(|errors| report(&errors));

    let mut interpreter = Interpreter::new().with_max_call_depth(max_call_depth);

    match interpreter.evaluate(&expr) {
        Ok(value) => {
            debug!("Evaluated to: {}", value);
            println!("{}", value);
        }
        Err(e) => report(&[LoxError::Runtime(e)]),
    }
}

/// Interactive prompt.  One interpreter lives for the whole session so
/// globals persist between lines; each line's text is leaked so the trees
/// that borrow it can outlive the iteration.
fn repl(max_call_depth: usize) -> Result<()> {
    info!("Starting REPL");

    let mut interpreter: Interpreter<'static> =
        Interpreter::new().with_max_call_depth(max_call_depth);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line: &'static str = Box::leak(line.context("Failed to read line")?.into_boxed_str());

        let (tokens, mut errors) = scan_tokens(line);
        let (statements, parse_errors) = Parser::new(&tokens).parse();
        errors.extend(parse_errors);

        if !errors.is_empty() {
            errors.iter().for_each(|e| eprintln!("{}", e));
            continue;
        }

        if let Err(errors) = Resolver::new(&mut interpreter).resolve(&statements) {
            errors.iter().for_each(|e| eprintln!("{}", e));
            continue;
        }

        if let Err(e) = interpreter.interpret(&statements) {
            eprintln!("{}", e);
        }
    }

    info!("REPL finished");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename } => {
            let Some(filename) = filename else { no_input() };
            info!("Running Tokenize subcommand");

            let source = read_or_exit(&filename);
            tokenize(text_or_exit(&source));
        }

        Commands::Parse { filename, json } => {
            let Some(filename) = filename else { no_input() };
            info!("Running Parse subcommand");

            let source = read_or_exit(&filename);
            parse(text_or_exit(&source), json)?;
        }

        Commands::Evaluate { filename } => {
            let Some(filename) = filename else { no_input() };
            info!("Running Evaluate subcommand");

            let source = read_or_exit(&filename);
            evaluate(text_or_exit(&source), args.max_call_depth);
        }

        Commands::Run { filename: None } => repl(args.max_call_depth)?,

        Commands::Run {
            filename: Some(filename),
        } => {
            info!("Running Run subcommand");

            let source = read_or_exit(&filename);
            let text = text_or_exit(&source);

            if let Err(errors) = lox::run(text, io::stdout().lock(), args.max_call_depth) {
                report(&errors);
            }

            info!("Program executed successfully");
        }
    }

    Ok(())
}
