use clap::Parser;
use leaddesk_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    leaddesk_cli::init_tracing();
    let cli = Cli::parse();
    leaddesk_cli::run(cli).await
}
