use clap::Parser;
use generator::profile::{write_am_recording, GeneratorConfig};
use report::model::DiagnosticReport;
use std::path::PathBuf;
use workflow::config::{WorkflowConfig, DEFAULT_INPUT, DEFAULT_OUTPUT};
use workflow::runner::Runner;

mod generator;
mod report;
mod workflow;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Recover AM baseband audio from a noisy carrier recording"
)]
struct Args {
    /// Load a workflow config from YAML instead of the flags below
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_INPUT)]
    input: PathBuf,
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
    /// Bins at or below this frequency are ignored by the carrier search
    #[arg(long, default_value_t = 1000.0)]
    carrier_floor: f64,
    #[arg(long, default_value_t = 20.0)]
    band_low: f64,
    #[arg(long, default_value_t = 6000.0)]
    band_high: f64,
    #[arg(long, default_value_t = 5)]
    order: usize,
    /// Upper frequency of the spectra written to the report
    #[arg(long, default_value_t = 20_000.0)]
    display_ceiling: f64,
    /// Write spectra, filter response and signal excerpts as JSON
    #[arg(long)]
    report: Option<PathBuf>,
    /// Write a synthetic noisy AM recording to the input path before running
    #[arg(long, default_value_t = false)]
    synthesize: bool,
    /// Noise seed for --synthesize
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig {
            input_path: args.input,
            carrier_search_floor_hz: args.carrier_floor,
            band_low_hz: args.band_low,
            band_high_hz: args.band_high,
            filter_order: args.order,
            output_path: args.output,
            display_ceiling_hz: args.display_ceiling,
        }
    };

    if args.synthesize {
        let generator = GeneratorConfig {
            seed: args.seed,
            ..Default::default()
        };
        write_am_recording(&workflow_config.input_path, &generator)?;
        println!(
            "Synthesized {} ({} Hz carrier, {} Hz tone)",
            workflow_config.input_path.display(),
            generator.carrier_hz,
            generator.tone_hz
        );
    }

    let runner = Runner::new(workflow_config.clone());
    let result = runner.execute()?;

    println!(
        "Carrier {:.2} Hz (bin {}), {} samples at {} Hz -> {}",
        result.carrier.frequency_hz,
        result.carrier.bin,
        result.filtered.len(),
        result.sample_rate,
        runner.config().output_path.display()
    );

    if let Some(path) = args.report {
        DiagnosticReport::from_result(&result, runner.config())?.write(&path)?;
        println!("Diagnostics written to {}", path.display());
    }

    Ok(())
}
