use clap::Parser;
use pmp_auth_service::cli::{self, Cli, Command};
use pmp_auth_service::infrastructure::auth::generate_secret;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Migrate => cli::migrate::run().await,
        Command::GenerateSecret { bytes } => {
            println!("{}", generate_secret(bytes));
            Ok(())
        }
        Command::Client(args) => cli::client::run(args).await,
    }
}
