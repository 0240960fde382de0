//! Load class feature tables, merge them and print one segment-aware train/test split.

use std::path::PathBuf;

use segfold::config::PipelineConfig;
use segfold::dataset::{self, FeatureTable};

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
    let config = options.resolve_config()?;
    config.validate().map_err(|err| err.to_string())?;

    let loader = config.csv_loader().map_err(|err| err.to_string())?;
    let frames =
        dataset::load_data_frames(&config.loader.feature_folder, &loader, &config.loader_options())
            .map_err(|err| err.to_string())?;
    println!(
        "Loaded {} interictal, {} preictal and {} test rows from {}",
        frames.interictal.len(),
        frames.preictal.len(),
        frames.test.len(),
        config.loader.feature_folder.display()
    );

    let (train, test) = dataset::split_experiment_data(
        &frames.interictal,
        &frames.preictal,
        config.split.training_ratio,
        &config.merge_options(),
        &config.split_options(),
    )
    .map_err(|err| err.to_string())?;
    print_side("train", &train)?;
    print_side("test", &test)?;
    let total = (train.len() + test.len()).max(1);
    println!(
        "Achieved training ratio {:.4} (requested {})",
        train.len() as f64 / total as f64,
        config.split.training_ratio
    );
    Ok(())
}

fn print_side(name: &str, table: &FeatureTable) -> Result<(), String> {
    let counts = table.class_counts().map_err(|err| err.to_string())?;
    println!(
        "{name}: {} rows in {} segments",
        table.len(),
        table.segment_count()
    );
    for (class, count) in &counts {
        println!("  {class}: {count}");
    }
    Ok(())
}

#[derive(Debug, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    features: Option<PathBuf>,
    cache: Option<PathBuf>,
    training_ratio: Option<f64>,
    frame_length: Option<usize>,
    sliding: bool,
    workers: Option<usize>,
    rebuild: bool,
    row_level: bool,
    seed: Option<u64>,
}

impl CliOptions {
    fn resolve_config(&self) -> Result<PipelineConfig, String> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path),
            None => PipelineConfig::load_or_default(),
        }
        .map_err(|err| err.to_string())?;
        if let Some(path) = &self.features {
            config.loader.feature_folder = path.clone();
        }
        if let Some(path) = &self.cache {
            config.loader.output_folder = Some(path.clone());
        }
        if let Some(ratio) = self.training_ratio {
            config.split.training_ratio = ratio;
        }
        if let Some(frame_length) = self.frame_length {
            config.loader.frame_length = frame_length;
        }
        if let Some(workers) = self.workers {
            config.loader.workers = workers;
        }
        if let Some(seed) = self.seed {
            config.split.seed = seed;
        }
        config.loader.sliding_frames |= self.sliding;
        config.loader.rebuild |= self.rebuild;
        if self.row_level {
            config.split.segment_level = false;
        }
        Ok(config)
    }
}

fn parse_args(args: Vec<String>) -> Result<Option<CliOptions>, String> {
    let mut options = CliOptions::default();
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
            "--cache" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--cache requires a value".to_string())?;
                options.cache = Some(PathBuf::from(value));
            }
            "--ratio" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--ratio requires a value".to_string())?;
                options.training_ratio = Some(
                    value
                        .parse::<f64>()
                        .map_err(|_| format!("Invalid --ratio value: {value}"))?,
                );
            }
            "--frame-length" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--frame-length requires a value".to_string())?;
                options.frame_length = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --frame-length value: {value}"))?,
                );
            }
            "--workers" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--workers requires a value".to_string())?;
                options.workers = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --workers value: {value}"))?,
                );
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                options.seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                );
            }
            "--sliding" => options.sliding = true,
            "--rebuild" => options.rebuild = true,
            "--row-level" => options.row_level = true,
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(Some(options))
}

fn help_text() -> String {
    [
        "segfold-split",
        "",
        "Loads interictal/preictal feature tables, merges and downsamples them,",
        "then prints a train/test split that never splits a segment.",
        "",
        "Usage:",
        "  segfold-split [--config <segfold.toml>] [--features <dir>] [--ratio <f>]",
        "",
        "Options:",
        "  --config <path>       Pipeline config (default: ~/.config/.segfold/segfold.toml).",
        "  --features <dir>      Feature folder (overrides loader.feature_folder).",
        "  --cache <dir>         Cache folder (overrides loader.output_folder).",
        "  --ratio <f>           Training ratio in [0.5, 1.0) (default: 0.8).",
        "  --frame-length <n>    Windows per frame (default: 12).",
        "  --sliding             Build sliding frames for the training classes.",
        "  --workers <n>         Parallel segment loaders (default: 1).",
        "  --rebuild             Ignore cached feature tables.",
        "  --row-level           Split rows instead of whole segments.",
        "  --seed <n>            Seed for downsampling and shuffling (default: 42).",
    ]
    .join("\n")
}
