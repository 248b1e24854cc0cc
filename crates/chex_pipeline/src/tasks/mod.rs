//! Task registry: name-to-function lookup, validated before any task runs.

pub mod eda;
pub mod evaluate;
pub mod predict;
pub mod train;

use crate::config::PipelineConfig;

pub type TaskFn = fn(&PipelineConfig) -> anyhow::Result<()>;

pub const TASKS: &[(&str, TaskFn)] = &[
    ("EDA", eda::run),
    ("train", train::run),
    ("evaluate", evaluate::run),
    ("predict", predict::run),
];

pub fn lookup(name: &str) -> Option<TaskFn> {
    TASKS
        .iter()
        .find(|(task, _)| *task == name)
        .map(|(_, f)| *f)
}

/// Resolve every configured task name up front so an unknown name fails
/// before any dataset or checkpoint I/O happens.
pub fn resolve(names: &[String]) -> anyhow::Result<Vec<(String, TaskFn)>> {
    if names.is_empty() {
        anyhow::bail!("no tasks configured");
    }
    let mut resolved = Vec::with_capacity(names.len());
    for name in names {
        match lookup(name) {
            Some(task) => resolved.push((name.clone(), task)),
            None => {
                let known: Vec<&str> = TASKS.iter().map(|(task, _)| *task).collect();
                anyhow::bail!("unknown task {name:?}; known tasks: {}", known.join(", "));
            }
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_task_resolves() {
        let names: Vec<String> = TASKS.iter().map(|(name, _)| name.to_string()).collect();
        assert_eq!(resolve(&names).unwrap().len(), TASKS.len());
    }

    #[test]
    fn unknown_task_fails_fast() {
        let names = vec!["train".to_string(), "deploy".to_string()];
        let err = resolve(&names).unwrap_err().to_string();
        assert!(err.contains("deploy"));
        assert!(err.contains("evaluate"));
    }

    #[test]
    fn empty_task_list_is_rejected() {
        assert!(resolve(&[]).is_err());
    }
}
