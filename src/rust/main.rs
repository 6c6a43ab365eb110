use symptomatic::{DiagnosisEngine, InferenceMode, ModelManager, Outcome, PredictionResult};
use anyhow::{bail, Context, Result};
use log::info;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about = "Predict diseases from a set of symptoms", long_about = None)]
struct Args {
    /// Name of a model bundle in the models directory
    #[arg(short, long, default_value = "disease", conflicts_with = "model_dir")]
    model: String,

    /// Explicit bundle directory containing model.onnx and metadata.json
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Symptom to include (repeatable)
    #[arg(short, long = "symptom")]
    symptoms: Vec<String>,

    /// Report every disease above this probability instead of only the most likely one
    #[arg(short, long)]
    threshold: Option<f32>,

    /// Symptom count below which the prediction is flagged as low confidence
    #[arg(long, default_value_t = symptomatic::DEFAULT_MIN_SYMPTOMS)]
    min_symptoms: usize,

    /// Print the symptoms the model knows and exit
    #[arg(long)]
    list_symptoms: bool,

    /// Check the bundle's model hash against its metadata before loading it
    #[arg(long)]
    verify: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

fn resolve_bundle(args: &Args) -> Result<PathBuf> {
    let dir = match &args.model_dir {
        Some(dir) => dir.clone(),
        None => {
            let manager = ModelManager::new_default().context("Failed to open models directory")?;
            if !manager.is_model_downloaded(&args.model) {
                bail!(
                    "Model '{}' not found in {}",
                    args.model,
                    manager.models_dir().display()
                );
            }
            manager.get_model_dir(&args.model)
        }
    };
    if args.verify && !ModelManager::verify_bundle_dir(&dir)? {
        bail!("Model bundle {} failed hash verification", dir.display());
    }
    Ok(dir)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start_time = Instant::now();
    let bundle = resolve_bundle(&args)?;
    info!("Loading model bundle from {}", bundle.display());

    let engine = DiagnosisEngine::builder()
        .with_min_symptoms(args.min_symptoms)
        .with_model_dir(&bundle)
        .with_context(|| format!("Failed to load model bundle {}", bundle.display()))?
        .build()?;
    info!("Engine built in {:.2?}", start_time.elapsed());

    if args.list_symptoms {
        for name in engine.feature_schema().names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let unknown = engine.feature_schema().unknown(&args.symptoms);
    if !unknown.is_empty() {
        bail!("Unknown symptom(s): {}", unknown.join(", "));
    }
    if args.symptoms.is_empty() {
        bail!("Please select at least one symptom");
    }

    let mode = match args.threshold {
        Some(threshold) => InferenceMode::Threshold(threshold),
        None => InferenceMode::TopOne,
    };

    let classify_start = Instant::now();
    let result = engine.predict(&args.symptoms, mode)?;
    info!("Prediction took {:.2?}", classify_start.elapsed());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &PredictionResult) {
    match &result.outcome {
        Outcome::TopOne { class } => {
            println!("Predicted disease: {} ({:.1}%)", class.label, class.probability * 100.0);
        }
        Outcome::AboveThreshold { threshold, classes } => {
            println!("Diseases above {:.1}%:", threshold * 100.0);
            for class in classes {
                println!("  {}: {:.1}%", class.label, class.probability * 100.0);
            }
        }
        Outcome::NoneAboveThreshold { threshold } => {
            println!("No disease above {:.1}%", threshold * 100.0);
        }
    }
    if result.low_confidence_input {
        println!(
            "Note: only {} symptom(s) selected; the prediction may be unreliable.",
            result.symptom_count
        );
    }
}
