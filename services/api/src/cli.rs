use crate::render::{run_report, run_schema, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use sales_insights::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Sales Insights",
    about = "Validate sales spreadsheets and report KPIs, trends and upselling insights",
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
    /// Validate a spreadsheet and print the dashboard report
    Report(ReportArgs),
    /// Print the column headers an upload must contain
    Schema,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args),
        Command::Schema => {
            run_schema();
            Ok(())
        }
    }
}
