use anyhow::{ensure, Context};
use std::fs;
use std::path::{Path, PathBuf};

pub const PROJECT_PREFIX: &str = "project";

/// `project*` directories directly below `root`, sorted by name.
pub fn discover_projects(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(root).with_context(|| format!("listing projects in {}", root.display()))?;
    let mut projects = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("listing projects in {}", root.display()))?
            .path();
        let is_project = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(PROJECT_PREFIX))
            .unwrap_or(false);
        if is_project && path.is_dir() {
            projects.push(path);
        }
    }
    projects.sort();
    Ok(projects)
}

/// Round-robin share of job `job_id` out of `n_jobs`.
pub fn partition(projects: &[PathBuf], job_id: usize, n_jobs: usize) -> anyhow::Result<Vec<PathBuf>> {
    ensure!(n_jobs > 0, "n_jobs must be positive");
    ensure!(
        job_id < n_jobs,
        "job_id {} out of range for {} jobs",
        job_id,
        n_jobs
    );
    Ok(projects
        .iter()
        .enumerate()
        .filter(|(idx, _)| idx % n_jobs == job_id)
        .map(|(_, path)| path.clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_keeps_sorted_project_directories() {
        let root = tempfile::tempdir().unwrap();
        for name in ["project_2", "project_0", "scratch", "project_1"] {
            fs::create_dir(root.path().join(name)).unwrap();
        }
        fs::write(root.path().join("project_notes.txt"), "").unwrap();
        let projects = discover_projects(root.path()).unwrap();
        let names: Vec<_> = projects
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["project_0", "project_1", "project_2"]);
    }

    #[test]
    fn jobs_cover_every_project_once() {
        let projects: Vec<PathBuf> = (0..11).map(|i| PathBuf::from(format!("project_{:02}", i))).collect();
        let mut seen: Vec<PathBuf> = Vec::new();
        for job_id in 0..3 {
            seen.extend(partition(&projects, job_id, 3).unwrap());
        }
        seen.sort();
        assert_eq!(seen, projects);
        assert_eq!(partition(&projects, 1, 3).unwrap()[1], projects[4]);
    }

    #[test]
    fn invalid_job_layout_is_rejected() {
        let projects = vec![PathBuf::from("project_0")];
        assert!(partition(&projects, 0, 0).is_err());
        assert!(partition(&projects, 2, 2).is_err());
    }
}
