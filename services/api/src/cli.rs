use crate::demo::{run_classify, run_demo, run_import, ClassifyArgs, DemoArgs, ImportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use scholar_review::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Scholar Review",
    about = "Classify, route, and rank doctoral admission applications",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Classify a single programme description
    Classify(ClassifyArgs),
    /// Import an application sheet and print the faculty/department grouping
    Import(ImportArgs),
    /// Walk sample records through intake, review, and rank publication
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Faculty directory JSON file (defaults to the built-in directory)
    #[arg(long)]
    pub(crate) directory: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Classify(args) => run_classify(args),
        Command::Import(args) => run_import(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["scholar-review-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_classify_arguments() {
        let cli = Cli::try_parse_from([
            "scholar-review-api",
            "classify",
            "--program",
            "Ph.D. - Chemistry (Ph.D. - Ft)",
            "--json",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Classify(args)) => {
                assert_eq!(args.program, "Ph.D. - Chemistry (Ph.D. - Ft)");
                assert!(args.institution.is_none());
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn import_requires_a_csv_path() {
        assert!(Cli::try_parse_from(["scholar-review-api", "import"]).is_err());
        let cli = Cli::try_parse_from(["scholar-review-api", "import", "--csv", "intake.csv"])
            .expect("parses");
        assert!(matches!(cli.command, Some(Command::Import(_))));
    }
}
