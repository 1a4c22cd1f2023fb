use crate::cli::CountArgs;
use crate::config::Settings;
use crate::counter::LocCounter;
use crate::model::{parse_date, CountOutput, CountResult, FilterCriteria, SCHEMA_VERSION};
use anyhow::{bail, Context};
use chrono::Utc;
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub fn exec(settings: &Settings, args: CountArgs) -> anyhow::Result<()> {
    let args = if args.root_dir.is_none() || args.branch.is_none() {
        if args.no_input || !std::io::stdin().is_terminal() {
            bail!("--dir and --branch are required when not running interactively");
        }
        prompt_for_missing(args)?
    } else {
        args
    };

    let (Some(root_dir), Some(branch)) = (args.root_dir.clone(), args.branch.clone()) else {
        bail!("--dir and --branch are required");
    };
    if !root_dir.is_dir() {
        bail!("Directory '{}' does not exist", root_dir.display());
    }

    let criteria = build_criteria(&args, branch).context("Invalid count options")?;
    let counter = LocCounter::new(&root_dir, settings.tool_config());

    let structured = args.json || args.ndjson;
    let pb = if structured {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };
    pb.set_message("Computing...");

    let result = counter.count(&criteria);
    pb.finish_and_clear();
    let result = result.with_context(|| {
        format!(
            "Failed to count LOC on branch '{}' in {}",
            criteria.branch,
            root_dir.display()
        )
    })?;

    if args.json {
        output_json(&result, &root_dir, &criteria)?;
    } else if args.ndjson {
        output_ndjson(&result)?;
    } else {
        output_table(&result, &root_dir, &criteria);
    }

    Ok(())
}

fn build_criteria(args: &CountArgs, branch: String) -> crate::error::Result<FilterCriteria> {
    let mut criteria = FilterCriteria::new(branch).ignoring(args.files_to_ignore.iter().cloned());
    if let Some(author) = args.author.as_deref().filter(|a| !a.is_empty()) {
        criteria = criteria.with_author(author);
    }
    if let Some(start) = args.start_date.as_deref() {
        criteria = criteria.since(start)?;
    }
    if let Some(end) = args.end_date.as_deref() {
        criteria = criteria.until(end)?;
    }
    Ok(criteria)
}

fn prompt_for_missing(mut args: CountArgs) -> anyhow::Result<CountArgs> {
    if args.root_dir.is_none() {
        let dir: String = Input::<String>::new()
            .with_prompt("Git root dir")
            .validate_with(|input: &String| -> Result<(), String> {
                if Path::new(input).is_dir() {
                    Ok(())
                } else {
                    Err(format!("Directory '{input}' does not exist"))
                }
            })
            .interact_text()?;
        args.root_dir = Some(PathBuf::from(dir));
    }

    if args.branch.is_none() {
        let branch: String = Input::<String>::new().with_prompt("Git branch").interact_text()?;
        args.branch = Some(branch);
    }

    if args.author.is_none() {
        let author: String = Input::<String>::new()
            .with_prompt("Commits author name or email [not required]")
            .allow_empty(true)
            .interact_text()?;
        args.author = non_empty(author);
    }

    if args.start_date.is_none() {
        args.start_date = prompt_for_date("start date")?;
    }
    if args.end_date.is_none() {
        args.end_date = prompt_for_date("end date")?;
    }

    if args.files_to_ignore.is_empty() {
        let raw: String = Input::<String>::new()
            .with_prompt("File names to ignore (use ; as separator) [not required]")
            .allow_empty(true)
            .interact_text()?;
        args.files_to_ignore = split_ignore_list(&raw);
    }

    Ok(args)
}

fn prompt_for_date(description: &str) -> anyhow::Result<Option<String>> {
    let date: String = Input::<String>::new()
        .with_prompt(format!("Commits {description} (eg.: 2020-01-12) [not required]"))
        .allow_empty(true)
        .validate_with(|input: &String| -> Result<(), String> {
            if input.is_empty() || parse_date(input).is_ok() {
                Ok(())
            } else {
                Err("Not a valid date (eg.: 2020-01-12)".to_string())
            }
        })
        .interact_text()?;
    Ok(non_empty(date))
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

fn split_ignore_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn output_json(result: &CountResult, root_dir: &Path, criteria: &FilterCriteria) -> anyhow::Result<()> {
    let output = CountOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository_path: root_dir.to_string_lossy().to_string(),
        branch: criteria.branch.clone(),
        author: criteria.author.clone(),
        start_date: criteria.start_date,
        end_date: criteria.end_date,
        ignored_paths: criteria.ignored_paths.clone(),
        total: result.total,
        commits: result.commits,
        files: result.files.clone(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn output_ndjson(result: &CountResult) -> anyhow::Result<()> {
    for row in &result.files {
        println!("{}", serde_json::to_string(row)?);
    }
    Ok(())
}

fn output_table(result: &CountResult, root_dir: &Path, criteria: &FilterCriteria) {
    println!("{}", style("Files").bold().underlined());
    println!(
        "{:<10} {:>10} {:>10}  {}",
        style("commit").bold(),
        style("insertions").bold(),
        style("deletions").bold(),
        style("file path").bold()
    );
    println!("{}", "─".repeat(60));
    for row in &result.files {
        let line = format!(
            "{:<10} {:>10} {:>10}  {}",
            row.commit,
            row.insertions_display(),
            row.deletions_display(),
            row.path
        );
        if row.ignored {
            println!("{}", style(line).dim());
        } else {
            println!("{line}");
        }
    }

    let or_dash = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
    println!();
    println!("Repo root dir: {}", root_dir.display());
    println!("Branch: {}", criteria.branch);
    println!("Author: {}", criteria.author.as_deref().unwrap_or("-"));
    println!("Start date: {}", or_dash(criteria.start_date));
    println!("End date: {}", or_dash(criteria.end_date));
    println!("Ignored files: {:?}", criteria.ignored_paths);
    println!("Commits: {}", result.commits);
    println!("{}", style(format!("LOC: {}", result.total)).bold().blue().on_yellow());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_list_is_semicolon_separated() {
        assert_eq!(
            split_ignore_list(" package-lock.json; .gitignore ;"),
            vec!["package-lock.json".to_string(), ".gitignore".to_string()]
        );
        assert!(split_ignore_list("").is_empty());
    }

    #[test]
    fn criteria_rejects_bad_dates() {
        let args = CountArgs {
            start_date: Some("2020-01-01".to_string()),
            end_date: Some("last tuesday".to_string()),
            author: Some(String::new()),
            ..CountArgs::default()
        };
        let err = build_criteria(&args, "master".to_string()).unwrap_err();
        assert!(matches!(err, crate::error::GitLocError::InvalidDateArgument(s) if s == "last tuesday"));
    }
}
