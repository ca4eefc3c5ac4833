mod cli;
mod compile_cmd;
mod init;
mod query_cmd;

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Compile(args) => compile_cmd::run(args),
        cli::Command::Query(args) => query_cmd::run(args).await,
        cli::Command::Init(args) => init::run(args),
    }
}
