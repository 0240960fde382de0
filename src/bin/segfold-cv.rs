//! Build segment-aware cross-validation folds over the merged class tables.

use std::path::PathBuf;

use segfold::config::PipelineConfig;
use segfold::dataset::{self, SegmentCrossValidator};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    if let Err(err) = segfold::logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    let mut config = match &options.config {
        Some(path) => PipelineConfig::load(path),
        None => PipelineConfig::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    if let Some(path) = options.features {
        config.loader.feature_folder = path;
    }
    config.loader.rebuild |= options.rebuild;
    config.split.shuffle |= options.shuffle;
    config.validate().map_err(|err| err.to_string())?;

    let loader = config.csv_loader().map_err(|err| err.to_string())?;
    let frames =
        dataset::load_data_frames(&config.loader.feature_folder, &loader, &config.loader_options())
            .map_err(|err| err.to_string())?;
    let merged =
        dataset::merge_interictal_preictal(&frames.interictal, &frames.preictal, &config.merge_options())
            .map_err(|err| err.to_string())?;
    let validator = SegmentCrossValidator::new(
        &merged,
        options.folds,
        config.split.shuffle,
        config.split.seed,
    )
    .map_err(|err| err.to_string())?;

    println!(
        "{} folds over {} rows in {} segments",
        validator.len(),
        merged.len(),
        validator.segments().len()
    );
    for (idx, fold) in validator.iter().enumerate() {
        println!(
            "  fold {idx}: {} held-out segments, {} held-out rows, {} training rows",
            validator.held_out_segments(idx).len(),
            fold.test.len(),
            fold.train.len()
        );
    }
    Ok(())
}

#[derive(Debug)]
struct CliOptions {
    config: Option<PathBuf>,
    features: Option<PathBuf>,
    folds: usize,
    shuffle: bool,
    rebuild: bool,
}

fn parse_args(args: Vec<String>) -> Result<Option<CliOptions>, String> {
    let mut options = CliOptions {
        config: None,
        features: None,
        folds: 5,
        shuffle: false,
        rebuild: false,
    };
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                options.config = Some(PathBuf::from(value));
            }
            "--features" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--features requires a value".to_string())?;
                options.features = Some(PathBuf::from(value));
            }
            "--folds" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--folds requires a value".to_string())?;
                options.folds = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --folds value: {value}"))?;
            }
            "--shuffle" => options.shuffle = true,
            "--rebuild" => options.rebuild = true,
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(Some(options))
}

fn help_text() -> String {
    [
        "segfold-cv",
        "",
        "Prints the held-out segments and rows of every segment-aware fold.",
        "",
        "Usage:",
        "  segfold-cv [--config <segfold.toml>] [--features <dir>] [--folds <k>]",
        "",
        "Options:",
        "  --config <path>    Pipeline config (default: ~/.config/.segfold/segfold.toml).",
        "  --features <dir>   Feature folder (overrides loader.feature_folder).",
        "  --folds <k>        Number of folds (default: 5).",
        "  --shuffle          Shuffle segments of each class before folding.",
        "  --rebuild          Ignore cached feature tables.",
    ]
    .join("\n")
}
