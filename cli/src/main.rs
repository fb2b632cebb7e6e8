use clap::Parser;
use survey_cli::SurveyCli;

fn main() -> anyhow::Result<()> {
    run_main()
}

#[tokio::main]
async fn run_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    SurveyCli::parse().run().await
}
