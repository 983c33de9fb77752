//! amp-allowed-tags 命令行入口
//! 无参数运行即执行固定生成流程：拼接规则 → 解码 → 展平 → 输出 PHP 类

use std::path::PathBuf;
use std::process::ExitCode;

use amp_allowed_tags::{AllowedTagsGenerator, ConfigManager, CustomConfigBuilder};
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Generate the AMP allowed-tags PHP class from validator protoascii rules
#[derive(Parser, Debug)]
#[command(name = "amp-allowed-tags")]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON configuration file (missing fields fall back to defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing validator-main.protoascii
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Output directory name, relative to the work directory
    #[arg(long)]
    out_dir: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigManager::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ConfigManager::get_default(),
    };
    let verbose = config.verbose || cli.verbose;

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut builder = CustomConfigBuilder::from_config(config).verbose(verbose);
    if let Some(work_dir) = cli.work_dir {
        builder = builder.work_dir(work_dir);
    }
    if let Some(out_dir) = cli.out_dir {
        builder = builder.out_dir(out_dir);
    }

    let generator = AllowedTagsGenerator::new(builder.build());
    let report = generator.run().with_context(|| {
        format!(
            "failed to generate allowed tags in {}",
            generator.config().work_dir.display()
        )
    })?;
    println!("{}", report.output_path.display());
    Ok(())
}
