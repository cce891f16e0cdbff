//! Optional `qmd` semantic-search collaborator (spec §4.3).
//!
//! `qmd` is an external tool this crate never bundles or assumes is
//! present: every entry point here treats "binary not found" as a plain
//! fallback signal rather than an error, per the spec's explicit "failure
//! to find qmd is not an error".

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;
use std::process::Output;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::error::SearchError;

static PROJECT_NAME: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("static pattern is valid regex")
});

static RESULT_PATH: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"/(\d+)-[A-Za-z0-9_-]*\.md").expect("static pattern is valid regex")
});

pub(crate) fn validate_project_name(name: &str) -> Result<()> {
    if PROJECT_NAME.is_match(name) {
        Ok(())
    } else {
        Err(SearchError::UnsafeProjectName {
            name: name.to_string(),
        })
    }
}

fn slug(title: &str) -> String {
    let mut out: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    out.truncate(40);
    out.trim_matches('-').to_string()
}

/// Writes one markdown file per observation into `export_dir/<project>/`,
/// creating the directory if needed. Caller must have already validated
/// `project` via [`validate_project_name`].
pub(crate) fn export_markdown(
    export_dir: &Path,
    project: &str,
    observations: &[turnmem_store::Observation],
) -> Result<()> {
    let project_dir = export_dir.join(project);
    std::fs::create_dir_all(&project_dir).map_err(|source| SearchError::ExportWrite {
        path: project_dir.clone(),
        source,
    })?;
    for obs in observations {
        let path = project_dir.join(format!("{}-{}.md", obs.id, slug(&obs.title)));
        let body = format!(
            "# {}\n\ntype: {}\ncreated_at: {}\n\n{}\n",
            obs.title,
            obs.obs_type.as_str(),
            obs.created_at,
            obs.narrative
        );
        std::fs::write(&path, body).map_err(|source| SearchError::ExportWrite { path, source })?;
    }
    Ok(())
}

/// Runs `qmd` with the given argv, returning `Ok(None)` if the binary is
/// not installed rather than erroring.
fn run_qmd(args: &[&str]) -> Result<Option<Output>> {
    match Command::new("qmd").args(args).output() {
        Ok(output) => Ok(Some(output)),
        Err(source) if source.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SearchError::QmdSpawn { source }),
    }
}

/// Exports `observations`, runs `qmd update` and `qmd embed -c
/// c-mem-<project>`, then `qmd query <query>` and parses the ranked id
/// list out of its output. Returns `Ok(None)` anywhere `qmd` is absent so
/// callers fall back to Layer 1/3 search.
pub fn semantic_search(
    export_dir: &Path,
    project: &str,
    query: &str,
    observations: &[turnmem_store::Observation],
) -> Result<Option<Vec<i64>>> {
    validate_project_name(project)?;
    export_markdown(export_dir, project, observations)?;

    let collection = format!("c-mem-{project}");

    let Some(update_out) = run_qmd(&["update"])? else {
        return Ok(None);
    };
    check_status(&update_out)?;

    let Some(embed_out) = run_qmd(&["embed", "-c", &collection])? else {
        return Ok(None);
    };
    check_status(&embed_out)?;

    let Some(query_out) = run_qmd(&["query", "-c", &collection, query])? else {
        return Ok(None);
    };
    check_status(&query_out)?;

    let stdout = String::from_utf8_lossy(&query_out.stdout);
    let ids: Vec<i64> = RESULT_PATH
        .captures_iter(&stdout)
        .filter_map(|cap| cap[1].parse::<i64>().ok())
        .collect();
    Ok(Some(ids))
}

fn check_status(output: &Output) -> Result<()> {
    if output.status.success() {
        Ok(())
    } else {
        Err(SearchError::QmdExitStatus {
            status: output.status.code().unwrap_or(-1),
        })
    }
}

#[cfg(test)]
#[path = "qmd.test.rs"]
mod tests;
