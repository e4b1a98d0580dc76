use anyhow::{Result, anyhow};
use async_trait::async_trait;
use colored::*;

use super::{Command, ShellState};
use crate::location::LocationReport;
use crate::namespace::{ClusterPath, glob};
use crate::print_line;

/// Lists the hosts holding each block of one or more files
pub struct LocationCommand;

#[async_trait]
impl Command for LocationCommand {
    fn name(&self) -> &str {
        "location"
    }

    fn usage(&self) -> &str {
        "location [-v] PATH... - Display the hosts storing the given files"
    }

    async fn execute(&self, state: &mut ShellState, args: &[String]) -> Result<()> {
        let mut verbose = false;
        let mut patterns = Vec::new();
        for arg in args {
            match arg.as_str() {
                "-v" | "--verbose" => verbose = true,
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    return Err(anyhow!("location: unknown option {flag}"));
                }
                _ => patterns.push(arg.as_str()),
            }
        }
        if patterns.is_empty() {
            return Err(anyhow!("Usage: location [-v] PATH..."));
        }

        // Metrics cover one invocation at a time
        state.client().metrics().reset();
        if verbose {
            state.client().metrics().start_operation();
        }

        // Expand wildcards first; a pattern matching nothing is a failure of its own
        let mut targets: Vec<ClusterPath> = Vec::new();
        let mut failures: Vec<(String, anyhow::Error)> = Vec::new();
        for pattern in &patterns {
            match glob::expand(state.client(), state.cwd(), pattern).await {
                Ok(paths) => targets.extend(paths),
                Err(e) => failures.push((pattern.to_string(), e.into())),
            }
        }

        let resolver = state.resolver();
        let aggregator = state.aggregator();
        for target in &targets {
            let path = target.to_string();
            let outcome = match resolver.resolve(&path).await {
                Ok(status) => aggregator.aggregate(status).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(report) => Self::print_report(&report, verbose)?,
                Err(e) => failures.push((path, e.into())),
            }
        }

        if verbose {
            eprintln!("{}", state.client().metrics().to_string().dimmed());
        }

        let attempted = patterns.len().max(targets.len());
        match failures.len() {
            0 => Ok(()),
            1 if attempted == 1 => Err(failures.remove(0).1),
            n => {
                for (path, error) in &failures {
                    eprintln!("{} {path}: {error}", "location:".red().bold());
                }
                Err(anyhow!("location: {n} of {attempted} paths failed"))
            }
        }
    }
}

impl LocationCommand {
    fn print_report(report: &LocationReport, verbose: bool) -> Result<()> {
        for line in report.lines() {
            print_line!("{line}");
        }

        if verbose {
            eprintln!(
                "  {}",
                format!("{} bytes in {} blocks", report.file.length, report.blocks.len()).dimmed()
            );
            for line in report.block_lines() {
                eprintln!("  {}", line.dimmed());
            }
        }
        Ok(())
    }
}
