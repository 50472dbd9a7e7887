use std::{fs, io, path::PathBuf, process::exit};

use clap::{Arg, ArgAction, ArgMatches, Command, crate_name, crate_version, value_parser};
use clap_complete::Shell;
use log::{LevelFilter, debug};
use rustyline::{DefaultEditor, error::ReadlineError};

use fun::{
    Config,
    context::Context,
    error, evaluate,
    layout::Layout,
    lexer::Token,
    parse_whole_expr, parser, run,
};

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error(transparent)]
    Clap(#[from] clap::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Readline(#[from] ReadlineError),

    #[error("{}", .error.report(.name, .text))]
    Fun {
        name: String,
        text: String,
        error: error::Error,
    },

    #[error("missing argument '{0}'")]
    MissingArgument(&'static str),
}

type Result<T> = std::result::Result<T, Error>;

impl Error {
    fn fun(name: &str, text: &str, error: impl Into<error::Error>) -> Self {
        Error::Fun {
            name: name.to_string(),
            text: text.to_string(),
            error: error.into(),
        }
    }
}

fn command() -> Command {
    let file = || {
        Arg::new("file")
            .value_parser(value_parser!(PathBuf))
            .help("source file")
    };

    Command::new(crate_name!())
        .version(crate_version!())
        .disable_colored_help(true)
        .disable_help_subcommand(true)
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("log debug output, twice for trace output"),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .value_parser(value_parser!(usize))
                .global(true)
                .help("deepest evaluation nesting before giving up"),
        )
        .arg(
            Arg::new("render-limit")
                .long("render-limit")
                .value_parser(value_parser!(usize))
                .global(true)
                .help("most list or tuple elements printed"),
        )
        .arg(
            Arg::new("stack-size")
                .long("stack-size")
                .value_parser(value_parser!(usize))
                .global(true)
                .help("evaluation thread stack in MiB, sized from --max-depth if unset"),
        )
        .subcommand(Command::new("tokens").arg(file().required(true)))
        .subcommand(Command::new("nodes").arg(file().required(true)))
        .subcommand(
            Command::new("eval")
                .arg(file().required_unless_present("expr"))
                .arg(
                    Arg::new("expr")
                        .short('e')
                        .long("expr")
                        .conflicts_with("file")
                        .help("expression to evaluate"),
                ),
        )
        .subcommand(Command::new("repl"))
        .subcommand(
            Command::new("completions").arg(
                Arg::new("shell")
                    .required(true)
                    .value_parser(value_parser!(Shell)),
            ),
        )
}

fn config(matches: &ArgMatches) -> Config {
    let mut config = Config::default();
    if let Some(max_depth) = matches.get_one::<usize>("max-depth") {
        config = config.with_max_depth(*max_depth);
    }
    if let Some(render_limit) = matches.get_one::<usize>("render-limit") {
        config = config.with_render_limit(*render_limit);
    }
    if let Some(stack_mib) = matches.get_one::<usize>("stack-size") {
        config = config.with_stack_size(stack_mib.saturating_mul(1024 * 1024));
    }
    config
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn read_file(matches: &ArgMatches) -> Result<(String, String)> {
    let path = matches
        .get_one::<PathBuf>("file")
        .ok_or(Error::MissingArgument("file"))?;
    let contents = fs::read_to_string(path)?;
    Ok((path.display().to_string(), contents))
}

fn tokens(matches: &ArgMatches) -> Result<()> {
    let (name, contents) = read_file(matches)?;
    let mut layout = Layout::new(&contents);
    loop {
        let token = layout
            .next_token()
            .map_err(|err| Error::fun(&name, &contents, parser::Error::from(err)))?;
        if token.value == Token::Eof {
            break;
        }
        println!(
            "{}:{}:{}: {:?}",
            name, token.span.start.line, token.span.start.column, token.value
        );
    }
    Ok(())
}

fn nodes(matches: &ArgMatches) -> Result<()> {
    let (name, contents) = read_file(matches)?;
    let mut ctx = Context::new();
    let expr =
        parse_whole_expr(&mut ctx, &contents).map_err(|err| Error::fun(&name, &contents, err))?;
    println!("{}", expr.display(&ctx));
    Ok(())
}

fn eval(matches: &ArgMatches, config: &Config) -> Result<()> {
    let (name, contents) = match matches.get_one::<String>("expr") {
        Some(expr) => ("<expr>".to_string(), expr.clone()),
        None => read_file(matches)?,
    };
    let mut ctx = Context::new();
    let expr =
        parse_whole_expr(&mut ctx, &contents).map_err(|err| Error::fun(&name, &contents, err))?;
    let value = evaluate(&ctx, expr, config).map_err(|err| Error::fun(&name, &contents, err))?;
    println!("{value}");
    Ok(())
}

fn repl(config: &Config) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut input = String::new();

    loop {
        let prompt = if input.is_empty() { "> " } else { "| " };
        let line = match rl.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                input.clear();
                continue;
            }
            Err(_) => break,
        };

        if input.is_empty() && line.trim().is_empty() {
            continue;
        }
        let finishing = !input.is_empty() && line.trim().is_empty();
        input.push_str(&line);
        input.push('\n');

        match run(&input, config) {
            Ok(value) => println!("{value}"),
            Err(err) if err.is_incomplete() && !finishing => continue,
            Err(err) => print!("{}", err.report("<repl>", &input)),
        }

        rl.add_history_entry(input.trim_end())?;
        input.clear();
    }

    Ok(())
}

fn completions(matches: &ArgMatches) -> Result<()> {
    let shell = *matches
        .get_one::<Shell>("shell")
        .ok_or(Error::MissingArgument("shell"))?;
    clap_complete::generate(shell, &mut command(), crate_name!(), &mut io::stdout());
    Ok(())
}

fn execute(matches: &ArgMatches) -> Result<()> {
    let config = config(leaf(matches));
    debug!("{config:?}");

    match matches.subcommand() {
        Some(("tokens", sub_matches)) => tokens(sub_matches),
        Some(("nodes", sub_matches)) => nodes(sub_matches),
        Some(("eval", sub_matches)) => eval(sub_matches, &config),
        Some(("repl", _)) => repl(&config),
        Some(("completions", sub_matches)) => completions(sub_matches),
        _ => unreachable!(),
    }
}

/// Global flags may follow the subcommand, so read them from the innermost
/// matches.
fn leaf(matches: &ArgMatches) -> &ArgMatches {
    matches.subcommand().map_or(matches, |(_, sub_matches)| sub_matches)
}

fn run_cli() -> Result<()> {
    let matches = command().try_get_matches()?;
    init_logging(leaf(&matches).get_count("verbose"));
    execute(&matches)
}

fn main() {
    if let Err(error) = run_cli() {
        match error {
            Error::Clap(error) => {
                let _ = error.print();
                match error.kind() {
                    clap::error::ErrorKind::DisplayHelp
                    | clap::error::ErrorKind::DisplayVersion
                    | clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => exit(0),
                    _ => exit(1),
                }
            }
            Error::Fun { .. } => {
                eprint!("{error}");
                exit(1);
            }
            _ => {
                eprintln!("{error}");
                exit(1);
            }
        }
    }
}
