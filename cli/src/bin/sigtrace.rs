use clap::{Parser, Subcommand, ValueEnum};
use cli::{config_schema_json, load_config, save_config, SampleLayout};
use color_eyre::eyre::Result;
use sigtrace::{algorithms::ResizePolicy, process_signature, SignatureConfig};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    Default,
    Simple,
    Extended,
}

impl Preset {
    fn config(self) -> SignatureConfig {
        match self {
            Preset::Default => SignatureConfig::default(),
            Preset::Simple => SignatureConfig::simple(),
            Preset::Extended => SignatureConfig::extended(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Clean one scanned signature into a PNG mask and an optional SVG outline
    Process {
        /// Scanned signature image
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the binary mask (always PNG)
        #[arg(short, long)]
        mask_output: PathBuf,
        /// Where to write the SVG outline
        #[arg(short, long)]
        vector_output: Option<PathBuf>,
        /// TOML or JSON configuration file (overrides --preset)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Built-in parameter set used when no config file is given
        #[arg(long, value_enum, default_value_t = Preset::Default)]
        preset: Preset,
        /// Override the resize policy (downscale_only, always_fit)
        #[arg(long)]
        resize_policy: Option<ResizePolicy>,
    },
    /// Clean <base-dir>/testing_images/unclean_sample.jpg next to itself
    Sample {
        /// Base directory holding testing_images/
        #[arg(long, env = "DIR")]
        base_dir: Option<PathBuf>,
        /// TOML or JSON configuration file (overrides --preset)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Built-in parameter set used when no config file is given
        #[arg(long, value_enum, default_value_t = Preset::Simple)]
        preset: Preset,
    },
    /// Write the default configuration as TOML or JSON
    InitConfig {
        /// Output path (.toml or .json)
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = Preset::Default)]
        preset: Preset,
    },
    /// Print the configuration JSON schema
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Process {
            input,
            mask_output,
            vector_output,
            config,
            preset,
            resize_policy,
        } => {
            let mut config = resolve_config(config.as_deref(), *preset)?;
            if let Some(policy) = resize_policy {
                config.normalize.policy = *policy;
            }
            run(input, mask_output, vector_output.as_deref(), &config)?;
        }
        Commands::Sample {
            base_dir,
            config,
            preset,
        } => {
            let layout = SampleLayout::resolve(base_dir.as_deref())?;
            let config = resolve_config(config.as_deref(), *preset)?;
            run(
                &layout.input,
                &layout.mask_output,
                Some(&layout.vector_output),
                &config,
            )?;
        }
        Commands::InitConfig { output, preset } => {
            save_config(&preset.config(), output)?;
            info!("Wrote configuration to {}", output.display());
        }
        Commands::Schema => {
            println!("{}", config_schema_json()?);
        }
    }

    Ok(())
}

fn resolve_config(path: Option<&Path>, preset: Preset) -> Result<SignatureConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Ok(load_config(path)?)
        }
        None => Ok(preset.config()),
    }
}

fn run(
    input: &Path,
    mask_output: &Path,
    vector_output: Option<&Path>,
    config: &SignatureConfig,
) -> Result<()> {
    info!("Cleaning signature: {}", input.display());
    let outputs = process_signature(input, mask_output, vector_output, config)?;

    info!("✅ Mask written to {}", outputs.mask_path.display());
    if let Some(vector_path) = outputs.vector_path {
        info!("✅ Outline written to {}", vector_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_preset(args: &[&str]) -> Preset {
        let cli = Cli::try_parse_from(args.iter().copied()).expect("Should parse arguments");
        match cli.command {
            Commands::Sample { preset, .. } => preset,
            _ => panic!("Should parse the sample command"),
        }
    }

    #[test]
    fn test_sample_runs_simple_preset_by_default() {
        let preset = sample_preset(&["sigtrace", "sample", "--base-dir", "/data/sigs"]);
        assert_eq!(preset, Preset::Simple);
        assert_eq!(preset.config(), SignatureConfig::simple());
    }

    #[test]
    fn test_sample_preset_can_be_overridden() {
        let preset = sample_preset(&["sigtrace", "sample", "--base-dir", "/data/sigs", "--preset", "extended"]);
        assert_eq!(preset, Preset::Extended);
    }

    #[test]
    fn test_process_defaults_to_default_preset() {
        let cli = Cli::try_parse_from(["sigtrace", "process", "-i", "in.jpg", "-m", "out.png"])
            .expect("Should parse arguments");
        assert!(matches!(cli.command, Commands::Process { preset: Preset::Default, .. }));
    }
}
