use crate::existence::ExistenceOracle;
use crate::planner::{RenamePair, RenamePlan};
use crate::scanner::file_name_of;
use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteMode {
    pub dry_run: bool,
    pub skip_confirmation: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenameFailure {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ApplyResult {
    pub applied: usize,
    pub unchanged: usize,
    pub failures: Vec<RenameFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// Nothing was changed on purpose; `planned` renames would have run.
    DryRun { planned: usize },
    /// The user did not confirm. Nothing was changed.
    Declined,
    Applied(ApplyResult),
}

/// Writes one line per pair and a summary. No-ops are only listed when
/// `verbose` is set. Returns the number of real renames.
pub fn report_plan<W: Write>(plan: &RenamePlan, verbose: bool, out: &mut W) -> Result<usize> {
    let mut count = 0usize;
    for pair in &plan.pairs {
        if pair.do_rename {
            count += 1;
            writeln!(
                out,
                "{} -> {}",
                pair.source_path.display(),
                file_name_of(&pair.target_path)
            )?;
        } else if verbose {
            writeln!(out, "{} (no-op)", pair.source_path.display())?;
        }
    }
    writeln!(out, "{count} file(s) to rename")?;
    Ok(count)
}

/// Reports the plan, asks for confirmation when needed and renames files.
///
/// Renames run one by one in plan order. A failing rename is recorded in
/// [`ApplyResult::failures`] and the remaining pairs still run.
pub fn execute_plan<R, W>(
    plan: &RenamePlan,
    mode: &ExecuteMode,
    input: &mut R,
    out: &mut W,
) -> Result<ExecuteOutcome>
where
    R: BufRead,
    W: Write,
{
    let planned = report_plan(plan, mode.verbose, out)?;

    if mode.dry_run {
        writeln!(out, "dry run: no files were renamed")?;
        return Ok(ExecuteOutcome::DryRun { planned });
    }

    if planned > 0 && !mode.skip_confirmation && !confirm(input, out)? {
        return Ok(ExecuteOutcome::Declined);
    }

    Ok(ExecuteOutcome::Applied(apply_plan(plan)))
}

/// Renames every pair with `do_rename` set, without asking.
pub fn apply_plan(plan: &RenamePlan) -> ApplyResult {
    let mut oracle = ExistenceOracle::new();
    let mut result = ApplyResult {
        unchanged: plan.pairs.len() - plan.rename_count(),
        ..ApplyResult::default()
    };

    for pair in plan.renames() {
        match rename_pair(pair, &mut oracle) {
            Ok(()) => {
                info!(
                    "renamed {} -> {}",
                    pair.source_path.display(),
                    pair.target_path.display()
                );
                result.applied += 1;
            }
            Err(err) => {
                warn!(
                    "rename failed: {} -> {}: {err:#}",
                    pair.source_path.display(),
                    pair.target_path.display()
                );
                result.failures.push(RenameFailure {
                    source_path: pair.source_path.clone(),
                    target_path: pair.target_path.clone(),
                    error: format!("{err:#}"),
                });
            }
        }
    }

    result
}

fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<bool> {
    write!(out, "Proceed? [y/N] ")?;
    out.flush()?;
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("could not read confirmation")?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn rename_pair(pair: &RenamePair, oracle: &mut ExistenceOracle) -> Result<()> {
    let parent = pair
        .target_path
        .parent()
        .context("rename target has no parent directory")?;
    let source_name = file_name_of(&pair.source_path);
    let target_name = file_name_of(&pair.target_path);

    // Earlier renames in this run changed the directory, so probe fresh.
    let lookup = oracle
        .exists_ci(parent, &target_name, false)
        .with_context(|| format!("could not list directory: {}", parent.display()))?;
    if lookup.has_other_than(&source_name) {
        anyhow::bail!(
            "target already exists: {}",
            lookup.original_name().unwrap_or(&target_name)
        );
    }

    fs::rename(&pair.source_path, &pair.target_path).with_context(|| {
        format!(
            "rename failed: {} -> {}",
            pair.source_path.display(),
            pair.target_path.display()
        )
    })
}
