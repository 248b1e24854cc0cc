use std::fs;
use std::path::PathBuf;

use chex_pipeline::config::PipelineConfig;
use chex_pipeline::tasks;
use training::ModelKind;
use xray_dataset::Split;

fn write_temp_config(name: &str, contents: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("chex-config-{name}-{}.yaml", std::process::id()));
    fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn loads_minimal_config_with_defaults() {
    let path = write_temp_config(
        "minimal",
        "run_name: smoke\ndatadir: assets/chest_xray\ntasks: [evaluate]\n",
    );
    let cfg = PipelineConfig::from_path(&path).expect("load config");
    assert_eq!(cfg.run_name, "smoke");
    assert_eq!(cfg.tasks, vec!["evaluate"]);
    assert_eq!(cfg.model, ModelKind::Conv);
    assert_eq!(cfg.evaluate.batch_size, 8);
    assert!(cfg.evaluate.data_split.is_none());
    assert_eq!(cfg.train.epochs, 10);
    let _ = fs::remove_file(&path);
}

#[test]
fn loads_full_config() {
    let path = write_temp_config(
        "full",
        concat!(
        "gpus: \"0\"\n",
        "run_name: conv_baseline\n",
        "datadir: assets/chest_xray\n",
        "model: linear\n",
        "tasks: [EDA, train, evaluate, predict]\n",
        "train:\n",
        "  epochs: 3\n",
        "  batch_size: 4\n",
        "  lr: 0.01\n",
        "  seed: 7\n",
        "evaluate:\n",
        "  batch_size: 2\n",
        "  data_split: [val, test]\n",
        "predict:\n",
        "  image_path: assets/chest_xray/test/PNEUMONIA/person1_virus_6.jpeg\n",
    ));
    let cfg = PipelineConfig::from_path(&path).expect("load config");
    assert_eq!(cfg.gpus.as_deref(), Some("0"));
    assert_eq!(cfg.model, ModelKind::Linear);
    assert_eq!(cfg.train.epochs, 3);
    assert_eq!(cfg.train.seed, Some(7));
    assert_eq!(
        cfg.evaluate.data_split,
        Some(vec![Split::Val, Split::Test])
    );
    assert!(cfg.predict.image_path.is_some());
    let _ = fs::remove_file(&path);
}

#[test]
fn checkpoint_fallback_prefers_explicit_then_trained() {
    let path = write_temp_config(
        "fallback",
        concat!(
        "run_name: smoke\n",
        "datadir: assets/chest_xray\n",
        "tasks: [evaluate]\n",
        "train:\n",
        "  checkpoint_out: checkpoints/custom.bin\n",
    ));
    let cfg = PipelineConfig::from_path(&path).expect("load config");
    assert_eq!(
        cfg.checkpoint_for(&Some("explicit.bin".to_string())),
        "explicit.bin"
    );
    assert_eq!(cfg.checkpoint_for(&None), "checkpoints/custom.bin");
    let _ = fs::remove_file(&path);
}

#[test]
fn unknown_task_in_config_fails_before_running() {
    let path = write_temp_config(
        "unknown-task",
        "run_name: smoke\ndatadir: assets/chest_xray\ntasks: [train, EDAA]\n",
    );
    let cfg = PipelineConfig::from_path(&path).expect("load config");
    let err = tasks::resolve(&cfg.tasks).unwrap_err().to_string();
    assert!(err.contains("EDAA"));
    let _ = fs::remove_file(&path);
}
