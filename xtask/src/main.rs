use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const WORKSPACE_CRATES: [&str; 3] = ["s3_sample_core", "s3_sample_stack", "s3_sample_pipeline"];
const PIPELINE_PACKAGE: &str = "s3_sample_pipeline";
const LAMBDA_BIN: &str = "load_s3_lambda";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the s3-sample workspace",
    long_about = "Runs CI checks, renders the CloudFormation template, and packages\n\
                  the load_s3 Lambda for deployment."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        #[arg(value_enum, default_value_t = CiJob::All)]
        job: CiJob,
    },
    /// Render the stack template into the dist directory
    Synth {
        /// Output file path
        #[arg(long, default_value = "dist/s3-sample.template.json")]
        output: PathBuf,
        /// Optional JSON file with stack properties
        #[arg(long)]
        props: Option<PathBuf>,
    },
    /// Build and zip the load_s3 Lambda as a `bootstrap` artifact
    LambdaPackage {
        /// Compilation target triple for the Lambda binary
        #[arg(long, env = "LAMBDA_TARGET", default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory receiving the zip artifact
        #[arg(long, default_value = "dist")]
        dist_dir: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Unit and integration tests for every crate
    Test,
    /// Lint + test
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn ensure_rust_target_installed(target: &str) {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(output) if output.status.success() => output,
        Ok(_) | Err(_) => {
            eprintln!("warning: could not list installed rust targets; skipping target preflight");
            return;
        }
    };

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        eprintln!(
            "error: rust target `{target}` is not installed; run `rustup target add {target}`"
        );
        exit(1);
    }
}

fn write_bootstrap_zip(binary_path: &Path, zip_path: &Path) {
    if !binary_path.exists() {
        eprintln!("error: expected lambda binary at '{}'", binary_path.display());
        exit(1);
    }

    let binary = fs::read(binary_path).expect("failed to read lambda binary");
    let file = fs::File::create(zip_path).expect("failed to create lambda zip");
    let mut zip = ZipWriter::new(file);
    // The provided.al2023 runtime executes an entry named `bootstrap`.
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .expect("failed to start bootstrap entry");
    zip.write_all(&binary)
        .expect("failed to write bootstrap entry");
    zip.finish().expect("failed to finish lambda zip");
}

// ── tasks ──────────────────────────────────────────────────────────

fn ci_lint() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"]);
}

fn ci_test() {
    for package in WORKSPACE_CRATES {
        step(&format!("Test {package}"));
        run_cargo(&["test", "-p", package]);
    }
}

fn synth(output: &Path, props: Option<&Path>) {
    step("Render stack template");
    let output = output.to_string_lossy().into_owned();
    let props = props.map(|path| path.to_string_lossy().into_owned());
    let mut args = vec![
        "run",
        "-q",
        "-p",
        PIPELINE_PACKAGE,
        "--bin",
        "s3_sample",
        "--",
        "synth",
        "--output",
        output.as_str(),
    ];
    if let Some(props) = props.as_deref() {
        args.extend(["--props", props]);
    }
    run_cargo(&args);
}

fn package_lambda(target: &str, profile: BuildProfile, dist_dir: &Path) {
    ensure_rust_target_installed(target);

    step("Build load_s3 lambda");
    let mut args = vec!["build", "-p", PIPELINE_PACKAGE, "--bin", LAMBDA_BIN, "--target", target];
    if let Some(flag) = profile.as_cargo_flag() {
        args.push(flag);
    }
    run_cargo(&args);

    step("Package lambda zip");
    fs::create_dir_all(dist_dir).expect("failed to create dist directory");
    let binary_path = Path::new("target")
        .join(target)
        .join(profile.dir_name())
        .join(LAMBDA_BIN);
    let zip_path = dist_dir.join(format!("{LAMBDA_BIN}.zip"));
    write_bootstrap_zip(&binary_path, &zip_path);

    eprintln!("\nPackaged artifact:\n- {}", zip_path.display());
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => {
            match job {
                CiJob::Lint => ci_lint(),
                CiJob::Test => ci_test(),
                CiJob::All => {
                    ci_lint();
                    ci_test();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::Synth { output, props } => synth(&output, props.as_deref()),
        Commands::LambdaPackage {
            target,
            profile,
            dist_dir,
        } => package_lambda(&target, profile, &dist_dir),
    }
}
