use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use s3_sample_core::contract::{
    optional_env, GenerateConfig, PipelineConfig, UploadConfig, LOAD_S3_JOB,
};
use s3_sample_stack::stack::default_tags;
use s3_sample_stack::{SampleStack, StackProps, TagContext, Template};

#[derive(Debug, Parser)]
#[command(
    name = "s3_sample",
    about = "Run the load_s3 pipeline or render its CloudFormation stack",
    long_about = "Generates a random integer table, uploads it as CSV to S3 (optionally\n\
                  through an assumed IAM role), and renders the KMS/S3/IAM/SSM stack\n\
                  the pipeline depends on."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a table and upload it to the bucket
    Run(RunArgs),
    /// Render the CloudFormation template
    Synth(SynthArgs),
    /// Print the job definition, schedule and default run config for a scheduler
    Job,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Lower bound (inclusive) for generated values
    #[arg(long, env = "RANDOM_MIN_SIZE", allow_hyphen_values = true)]
    pub min_value: i64,
    /// Upper bound (exclusive) for generated values
    #[arg(long, env = "RANDOM_MAX_SIZE", allow_hyphen_values = true)]
    pub max_value: i64,
    /// Number of generated rows
    #[arg(long, env = "N_ROWS")]
    pub rows: usize,
    /// Number of generated columns
    #[arg(long, env = "N_COLS")]
    pub cols: usize,
    /// Comma-separated column labels; must match --cols
    #[arg(long, env = "COLUMN_NAMES", value_delimiter = ',')]
    pub column_names: Option<Vec<String>>,
    /// Seed for reproducible contents
    #[arg(long, env = "RANDOM_SEED")]
    pub seed: Option<u64>,
    /// Destination bucket
    #[arg(long, env = "S3_BUCKET")]
    pub bucket: String,
    /// Key prefix inside the bucket
    #[arg(long, env = "S3_KEY_PREFIX")]
    pub key_prefix: Option<String>,
    /// Role to assume before writing
    #[arg(long, env = "IAM_ROLE_ARN")]
    pub role_arn: Option<String>,
}

impl RunArgs {
    pub fn into_pipeline_config(self) -> PipelineConfig {
        PipelineConfig {
            generate: GenerateConfig {
                min_value: self.min_value,
                max_value: self.max_value,
                n_rows: self.rows,
                n_cols: self.cols,
                column_names: self.column_names,
                seed: self.seed,
            },
            upload: UploadConfig {
                bucket_name: self.bucket,
                key_prefix: self.key_prefix,
            },
            role_arn: self.role_arn,
        }
    }
}

#[derive(Debug, Args)]
pub struct SynthArgs {
    /// Write the template here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// JSON file with stack properties
    #[arg(long)]
    pub props: Option<PathBuf>,
    /// Target account id
    #[arg(long, env = "STACK_ACCOUNT")]
    pub account: Option<String>,
    /// Target region
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,
    /// Prefix for the published SSM parameters
    #[arg(long)]
    pub parameter_prefix: Option<String>,
    /// Owning team, recorded as the `NameTeam` tag
    #[arg(long, env = "STACK_TEAM")]
    pub team: Option<String>,
    /// Personal id of the stack owner, recorded as the `StackOwnerPersonalID` tag
    #[arg(long, env = "STACK_OWNER")]
    pub owner: Option<String>,
}

/// Tag context from the CI environment plus the synth flags.
pub fn tag_context(args: &SynthArgs) -> TagContext {
    let defaults = TagContext::default();
    TagContext {
        repository: optional_env("CI_PROJECT_NAME"),
        repository_location: optional_env("CI_SERVER_NAME").or(defaults.repository_location),
        team: args.team.clone(),
        branch: optional_env("CI_COMMIT_BRANCH"),
        owner: args.owner.clone(),
    }
}

/// Resolves stack properties: the props file, or defaults tagged from [`tag_context`],
/// then flag overrides.
pub fn stack_props(args: &SynthArgs) -> anyhow::Result<StackProps> {
    let mut props = match &args.props {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read stack props '{}'", path.display()))?;
            serde_json::from_str::<StackProps>(&raw)
                .with_context(|| format!("invalid stack props in '{}'", path.display()))?
        }
        None => StackProps {
            tags: default_tags(&tag_context(args)),
            ..StackProps::default()
        },
    };

    if let Some(team) = &args.team {
        props.tags.insert("NameTeam".to_string(), team.clone());
    }
    if let Some(owner) = &args.owner {
        props.tags.insert("StackOwnerPersonalID".to_string(), owner.clone());
    }

    if let Some(account) = &args.account {
        props.account = Some(account.clone());
    }
    if let Some(region) = &args.region {
        props.region = Some(region.clone());
    }
    if let Some(prefix) = &args.parameter_prefix {
        props.parameter_prefix = prefix.clone();
    }
    Ok(props)
}

pub fn synth_template(args: &SynthArgs) -> anyhow::Result<Template> {
    Ok(SampleStack::synth(stack_props(args)?))
}

pub fn render_job_manifest() -> anyhow::Result<String> {
    serde_json::to_string_pretty(&LOAD_S3_JOB.manifest()).context("failed to render job manifest")
}

pub fn write_template(template: &Template, output: Option<&Path>) -> anyhow::Result<()> {
    let rendered = template
        .to_json_pretty()
        .context("failed to serialize template")?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create '{}'", parent.display()))?;
            }
            fs::write(path, rendered + "\n")
                .with_context(|| format!("failed to write template to '{}'", path.display()))?;
            tracing::info!(
                component = "synth",
                event = "template_written",
                path = %path.display(),
            );
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
