pub mod commands;
pub mod completion;

use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use std::io::Write;
use std::process::{Command as ProcessCommand, Stdio};
use std::sync::Arc;

use crate::cluster::ClusterClient;
use crate::config::ShellConfig;
use crate::location::{LocationAggregator, PathResolver};
use crate::namespace::ClusterPath;
use commands::Command;
pub use completion::{CompletionCache, ShellCompleter};

/// Shell state - tracks the working directory and dispatches commands
pub struct ShellState {
    /// Current directory in the cluster namespace
    cwd: ClusterPath,
    /// Handle to the metadata and placement services
    client: ClusterClient,
    config: ShellConfig,
    /// Tab completion cache
    completion_cache: CompletionCache,
    /// Registered commands
    commands: BTreeMap<String, Arc<dyn Command>>,
}

impl ShellState {
    /// Create a shell state with all built-in commands registered
    pub fn new(client: ClusterClient, config: ShellConfig) -> Self {
        let completion_cache = CompletionCache::new(client.clone());
        let mut state = Self::from_components(ClusterPath::root(), client, config, completion_cache);

        state.register_command(Arc::new(commands::location::LocationCommand));
        state.register_command(Arc::new(commands::cd::CdCommand));
        state.completion_cache.set_commands(state.command_names());

        state
    }

    /// Create a shell state from components without any commands (useful for testing)
    pub fn from_components(
        cwd: ClusterPath,
        client: ClusterClient,
        config: ShellConfig,
        completion_cache: CompletionCache,
    ) -> Self {
        completion_cache.set_cwd(cwd.clone());
        ShellState {
            cwd,
            client,
            config,
            completion_cache,
            commands: BTreeMap::new(),
        }
    }

    /// Register a command
    pub fn register_command(&mut self, command: Arc<dyn Command>) {
        self.commands.insert(command.name().to_string(), command);
    }

    /// Execute a command line
    pub async fn execute(&mut self, line: &str) -> Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        match split_pipeline(line) {
            (command, Some(pipeline)) => self.execute_with_pipe(&command, &pipeline).await,
            (_, None) => self.execute_internal(line).await,
        }
    }

    /// Execute a command with its output piped to a shell command
    #[cfg(unix)]
    async fn execute_with_pipe(&mut self, command: &str, pipeline: &str) -> Result<()> {
        use std::os::unix::io::AsRawFd;

        let mut child = ProcessCommand::new("sh")
            .arg("-c")
            .arg(pipeline)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| anyhow!("Failed to spawn shell: {}", e))?;

        let child_stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("Failed to open stdin"))?;

        let result = match StdoutRedirect::to(child_stdin.as_raw_fd()) {
            Ok(redirect) => {
                // Output of the command now goes into the pipe
                let result = self.execute_internal(command).await;
                drop(redirect);
                result
            }
            Err(e) => {
                drop(child_stdin);
                child.kill().ok();
                return Err(e);
            }
        };

        // EOF for the child
        drop(child_stdin);

        child
            .wait()
            .map_err(|e| anyhow!("Failed to wait for child: {}", e))?;

        // The pipeline's exit status is its own business (grep with no match, head closing early)
        result
    }

    #[cfg(not(unix))]
    async fn execute_with_pipe(&mut self, _command: &str, _pipeline: &str) -> Result<()> {
        Err(anyhow!("Pipe support is only available on Unix systems"))
    }

    /// Execute a command line without pipes
    async fn execute_internal(&mut self, line: &str) -> Result<()> {
        let parts = parse_command_line(line)?;
        let Some((cmd_name, args)) = parts.split_first() else {
            return Ok(());
        };

        match cmd_name.as_str() {
            "exit" | "quit" => return Err(anyhow!("exit")),
            "help" => {
                self.print_help();
                return Ok(());
            }
            "pwd" => {
                println!("{}", self.cwd);
                return Ok(());
            }
            _ => {}
        }

        let command = self
            .commands
            .get(cmd_name)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown command: {cmd_name}"))?;
        command.execute(self, args).await
    }

    /// Current working directory
    pub fn cwd(&self) -> &ClusterPath {
        &self.cwd
    }

    /// Change the working directory
    pub fn set_cwd(&mut self, cwd: ClusterPath) {
        self.completion_cache.set_cwd(cwd.clone());
        self.cwd = cwd;
    }

    pub fn client(&self) -> &ClusterClient {
        &self.client
    }

    pub fn completion_cache(&self) -> &CompletionCache {
        &self.completion_cache
    }

    /// Path resolver bound to this shell's cluster
    pub fn resolver(&self) -> PathResolver {
        PathResolver::new(self.client.clone())
    }

    /// Location aggregator bound to this shell's cluster and settings
    pub fn aggregator(&self) -> LocationAggregator {
        LocationAggregator::new(self.client.clone(), self.config.parallelism)
    }

    /// Names of built-in and registered commands
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.extend(["pwd", "help", "exit"].map(String::from));
        names
    }

    fn print_help(&self) {
        println!("Available commands:");
        for command in self.commands.values() {
            println!("  {}", command.usage());
        }
        println!("  pwd - Print working directory");
        println!("  help - Show this help");
        println!("  exit/quit - Exit the shell");
        println!();
        println!("Paths may use * and ? wildcards within a segment.");
        println!("Output can be piped to external tools:");
        println!("  location /data/* | sort | uniq -c");
    }

    /// Get the prompt string
    pub fn prompt(&self) -> String {
        format!("blocksh:{} $ ", self.cwd)
    }
}

/// Points stdout at another file descriptor until dropped.
///
/// Dropping restores the original stdout, also when the command future is
/// abandoned halfway (Ctrl-C).
#[cfg(unix)]
struct StdoutRedirect {
    saved_stdout: i32,
}

#[cfg(unix)]
impl StdoutRedirect {
    fn to(fd: i32) -> Result<Self> {
        use std::os::unix::io::AsRawFd;

        let stdout_fd = std::io::stdout().as_raw_fd();
        let saved_stdout = unsafe { libc::dup(stdout_fd) };
        if saved_stdout < 0 {
            return Err(anyhow!("Failed to duplicate stdout"));
        }
        if unsafe { libc::dup2(fd, stdout_fd) } < 0 {
            unsafe {
                libc::close(saved_stdout);
            }
            return Err(anyhow!("Failed to redirect stdout"));
        }
        Ok(StdoutRedirect { saved_stdout })
    }
}

#[cfg(unix)]
impl Drop for StdoutRedirect {
    fn drop(&mut self) {
        use std::os::unix::io::AsRawFd;

        let _ = std::io::stdout().flush();
        let stdout_fd = std::io::stdout().as_raw_fd();
        unsafe {
            libc::dup2(self.saved_stdout, stdout_fd);
            libc::close(self.saved_stdout);
        }
    }
}

/// Quote-aware scan of a command line.
///
/// Calls `on_char` with every character that is not consumed as quoting or
/// escaping syntax, and whether it sits outside of any quotes. Returning
/// `false` stops the scan early.
fn scan_unquoted(line: &str, mut on_char: impl FnMut(usize, char, bool) -> bool) -> Result<()> {
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escape_next = false;

    for (i, ch) in line.char_indices() {
        if escape_next {
            escape_next = false;
            if !on_char(i, ch, false) {
                return Ok(());
            }
            continue;
        }

        match ch {
            '\\' if !in_single_quote => escape_next = true,
            '\'' if !in_double_quote => in_single_quote = !in_single_quote,
            '"' if !in_single_quote => in_double_quote = !in_double_quote,
            _ => {
                if !on_char(i, ch, !in_single_quote && !in_double_quote) {
                    return Ok(());
                }
            }
        }
    }

    if in_single_quote {
        return Err(anyhow!("Unclosed single quote"));
    }
    if in_double_quote {
        return Err(anyhow!("Unclosed double quote"));
    }
    Ok(())
}

/// Split a command line on the first unquoted pipe.
/// Returns (command, Some(pipeline)) or (line, None)
fn split_pipeline(line: &str) -> (String, Option<String>) {
    let mut pipe_at = None;
    // Quoting errors surface later from parse_command_line
    let _ = scan_unquoted(line, |i, ch, unquoted| {
        if ch == '|' && unquoted {
            pipe_at = Some(i);
            return false;
        }
        true
    });

    match pipe_at {
        Some(i) => (
            line[..i].trim().to_string(),
            Some(line[i + 1..].trim().to_string()),
        ),
        None => (line.to_string(), None),
    }
}

/// Split a command line into arguments, honouring quotes and backslash escapes
fn parse_command_line(line: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current_arg = String::new();

    scan_unquoted(line, |_, ch, unquoted| {
        if unquoted && (ch == ' ' || ch == '\t') {
            if !current_arg.is_empty() {
                args.push(std::mem::take(&mut current_arg));
            }
        } else {
            current_arg.push(ch);
        }
        true
    })?;

    if !current_arg.is_empty() {
        args.push(current_arg);
    }
    Ok(args)
}
