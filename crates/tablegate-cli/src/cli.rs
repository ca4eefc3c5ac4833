use std::path::PathBuf;
use tablegate::config::DEFAULT_CONFIG_FILE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Compile,
    Query,
    Init,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Compile(CompileArgs),
    Query(QueryArgs),
    Init(InitArgs),
}

#[derive(Debug, Clone)]
pub struct CompileArgs {
    pub table: String,
    pub query: String,
    pub count: bool,
}

#[derive(Debug, Clone)]
pub struct QueryArgs {
    pub config: PathBuf,
    pub database: Option<String>,
    pub table: String,
    pub query: String,
}

#[derive(Debug, Clone)]
pub struct InitArgs {
    pub config: PathBuf,
    pub force: bool,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "compile" => parse_compile(it.map(|s| s.as_str())),
        "query" => parse_query(it.map(|s| s.as_str())),
        "init" => parse_init(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

/// Split `<table> [query-string]` positionals.
fn table_and_query(command: &str, positionals: Vec<&str>) -> anyhow::Result<(String, String)> {
    let mut positionals = positionals.into_iter();
    let Some(table) = positionals.next() else {
        anyhow::bail!("missing table: expected `tablegate {command} <table> [query-string]`");
    };
    let query = positionals.next().unwrap_or_default();
    if let Some(extra) = positionals.next() {
        anyhow::bail!("unexpected argument: {extra}");
    }
    Ok((table.to_string(), query.to_string()))
}

fn parse_compile<'a>(it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut count = false;
    let mut positionals: Vec<&str> = Vec::new();

    for token in it {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Compile)),
            "--count" => count = true,
            other if other.starts_with("--") => anyhow::bail!("unknown argument: {other}"),
            other => positionals.push(other),
        }
    }

    let (table, query) = table_and_query("compile", positionals)?;
    Ok(Command::Compile(CompileArgs {
        table,
        query,
        count,
    }))
}

fn parse_query<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG_FILE);
    let mut database: Option<String> = None;
    let mut positionals: Vec<&str> = Vec::new();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Query)),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = PathBuf::from(v);
            }
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            "--database" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--database requires a value");
                };
                database = Some(v.to_string());
            }
            _ if token.starts_with("--database=") => {
                database = Some(token.trim_start_matches("--database=").to_string());
            }
            other if other.starts_with("--") => anyhow::bail!("unknown argument: {other}"),
            other => positionals.push(other),
        }
    }

    let (table, query) = table_and_query("query", positionals)?;
    Ok(Command::Query(QueryArgs {
        config,
        database,
        table,
        query,
    }))
}

fn parse_init<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG_FILE);
    let mut force = false;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Init)),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = PathBuf::from(v);
            }
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            "--force" => force = true,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::Init(InitArgs { config, force }))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
tablegate - query whitelisted PostgreSQL tables with URL query parameters

USAGE:
  tablegate <COMMAND> [OPTIONS]

COMMANDS:
  compile       Print the SQL and arguments for a query string
  query         Run a query string against the database
  init          Write a template tablegate.toml

Run `tablegate <command> --help` for more."
            );
        }
        HelpTopic::Compile => {
            println!(
                "\
USAGE:
  tablegate compile <TABLE> [QUERY-STRING] [OPTIONS]

Compiles without a database or allow-list.

OPTIONS:
  --count               Compile the COUNT form (same as passing _count)
  -h, --help            Print help

EXAMPLE:
  tablegate compile users 'status=1,2,_null&name=_lkjoh_lk&_limit=10'"
            );
        }
        HelpTopic::Query => {
            println!(
                "\
USAGE:
  tablegate query <TABLE> [QUERY-STRING] [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: tablegate.toml)
  --database <URL>      Override database.url from config
  -h, --help            Print help"
            );
        }
        HelpTopic::Init => {
            println!(
                "\
USAGE:
  tablegate init [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: tablegate.toml)
  --force               Overwrite an existing file
  -h, --help            Print help"
            );
        }
    }
}
