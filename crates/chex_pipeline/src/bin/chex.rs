use std::path::PathBuf;

use chex_pipeline::{config::PipelineConfig, tasks};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "chex",
    about = "Chest X-ray classification pipeline: EDA, training, evaluation, prediction"
)]
struct Args {
    /// Path of config file, e.g. configs/config_conv.yaml
    #[arg(long, default_value = "configs/config_conv.yaml")]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg = PipelineConfig::from_path(&args.config)?;
    println!("Config params: {cfg:?}\n");

    if let Some(gpus) = &cfg.gpus {
        if cfg!(feature = "backend-wgpu") {
            println!("backend: wgpu (device hint {gpus})");
        } else {
            println!("note: gpus=\"{gpus}\" set; the ndarray backend runs on CPU");
        }
    }

    // Resolve every task name before running any of them.
    let resolved = tasks::resolve(&cfg.tasks)?;
    for (name, task) in resolved {
        println!("== task: {name} ==");
        task(&cfg)?;
    }
    Ok(())
}
