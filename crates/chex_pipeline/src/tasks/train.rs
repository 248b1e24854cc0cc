use crate::config::PipelineConfig;
use training::TrainConfig;

pub fn run(cfg: &PipelineConfig) -> anyhow::Result<()> {
    let section = &cfg.train;
    let train_cfg = TrainConfig {
        model: cfg.model,
        datadir: cfg.datadir.clone(),
        epochs: section.epochs,
        batch_size: section.batch_size,
        lr: section.lr,
        checkpoint_out: section.checkpoint_out.clone(),
        seed: section.seed,
        flip_horizontal_prob: section.flip_horizontal_prob,
        color_jitter_prob: section.color_jitter_prob,
        color_jitter_strength: section.color_jitter_strength,
        ..TrainConfig::default()
    };
    training::run_train(&train_cfg)
}
