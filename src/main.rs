use blocksh::cluster::{ClusterClient, SnapshotCluster};
use blocksh::config::Cli;
use blocksh::logging::init_logging;
use blocksh::shell;
use clap::Parser;
use colored::*;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(snapshot_path) = cli.snapshot_path() else {
        eprintln!("{} No cluster snapshot given and no home directory found", "Error:".red().bold());
        std::process::exit(1);
    };

    let cluster = match SnapshotCluster::load(&snapshot_path).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            eprintln!("Pass --snapshot PATH or set BLOCKSH_SNAPSHOT.");
            std::process::exit(1);
        }
    };
    tracing::info!(snapshot = %snapshot_path.display(), "loaded cluster snapshot");

    let client = ClusterClient::from_backend(Arc::new(cluster));
    let mut state = shell::ShellState::new(client, cli.shell_config());

    // One-shot mode
    if let Some(line) = &cli.command {
        if let Err(e) = state.execute(line).await {
            if e.to_string() != "exit" {
                eprintln!("{} {}", "Error:".red().bold(), e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    println!("{}", "=".repeat(60).cyan());
    println!("{}", "  blocksh - block placement shell".bold().cyan());
    println!("{}", "=".repeat(60).cyan());
    println!();
    println!("Type 'help' for available commands or 'exit' to quit");
    println!();

    let completer = shell::ShellCompleter::new(state.completion_cache().clone());
    let mut rl = Editor::new()?;
    rl.set_helper(Some(completer));

    let history_file = dirs::home_dir().map(|mut p| {
        p.push(".blocksh_history");
        p
    });

    if let Some(path) = &history_file {
        let _ = rl.load_history(path);
    }

    loop {
        let prompt = state.prompt();

        match rl.readline(&prompt) {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());

                // Ctrl-C while a command runs abandons its in-flight queries
                let outcome = tokio::select! {
                    result = state.execute(&line) => Some(result),
                    _ = tokio::signal::ctrl_c() => None,
                };

                match outcome {
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        if e.to_string() == "exit" {
                            break;
                        }
                        eprintln!("{} {}", "Error:".red().bold(), e);
                    }
                    None => println!("^C"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("exit");
                break;
            }
            Err(err) => {
                eprintln!("{} {:?}", "Error:".red().bold(), err);
                break;
            }
        }
    }

    if let Some(path) = &history_file {
        let _ = rl.save_history(path);
    }

    println!("Goodbye!");
    Ok(())
}
