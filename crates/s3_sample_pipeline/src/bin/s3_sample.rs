use anyhow::Context;
use clap::Parser;
use s3_sample_pipeline::adapters::aws::{load_sdk_config, S3ObjectStore, StsRoleAssumer};
use s3_sample_pipeline::cli::{render_job_manifest, synth_template, write_template, Cli, Commands};
use s3_sample_pipeline::handlers::job::run_load_s3;
use s3_sample_pipeline::logging::init_logging;

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => {
            let config = args.into_pipeline_config();
            let sdk_config = load_sdk_config().await;
            let assumer = StsRoleAssumer::from_sdk_config(&sdk_config);

            let report = run_load_s3(&config, &assumer, |credentials| {
                S3ObjectStore::from_sdk_config(&sdk_config, credentials)
            })
            .context("load_s3 run failed")?;

            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to render run report")?
            );
        }
        Commands::Synth(args) => {
            let template = synth_template(&args)?;
            write_template(&template, args.output.as_deref())?;
        }
        Commands::Job => println!("{}", render_job_manifest()?),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        tracing::error!(component = "s3_sample", event = "command_failed", error = %error);
        for cause in error.chain().skip(1) {
            tracing::error!(
                component = "s3_sample",
                event = "command_failed_cause",
                cause = %cause,
            );
        }
        std::process::exit(1);
    }
}
