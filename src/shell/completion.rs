use rustyline::Context;
use rustyline::completion::{Completer, Pair};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::cluster::ClusterClient;
use crate::namespace::ClusterPath;

/// Entry in completion cache with metadata
#[derive(Clone, Debug)]
pub struct CompletionEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Cache of directory listings used for tab completion
#[derive(Clone)]
pub struct CompletionCache {
    /// Cached listings by absolute directory path
    entries: Arc<RwLock<HashMap<String, Vec<CompletionEntry>>>>,
    /// Available commands
    commands: Arc<RwLock<Vec<String>>>,
    /// Shell working directory
    cwd: Arc<RwLock<ClusterPath>>,
    /// Client for lazy loading
    client: ClusterClient,
}

impl CompletionCache {
    pub fn new(client: ClusterClient) -> Self {
        CompletionCache {
            entries: Arc::new(RwLock::new(HashMap::new())),
            commands: Arc::new(RwLock::new(Vec::new())),
            cwd: Arc::new(RwLock::new(ClusterPath::root())),
            client,
        }
    }

    pub fn set_cwd(&self, cwd: ClusterPath) {
        if let Ok(mut current) = self.cwd.write() {
            *current = cwd;
        }
    }

    pub fn cwd(&self) -> ClusterPath {
        self.cwd
            .read()
            .map(|c| c.clone())
            .unwrap_or_else(|_| ClusterPath::root())
    }

    pub fn set_commands(&self, commands: Vec<String>) {
        if let Ok(mut current) = self.commands.write() {
            *current = commands;
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.read().map(|c| c.clone()).unwrap_or_default()
    }

    /// Update the cached entries for a directory
    pub fn update_entries(&self, dir: String, entries: Vec<CompletionEntry>) {
        if let Ok(mut cache) = self.entries.write() {
            cache.insert(dir, entries);
        }
    }

    /// Get cached entries for a directory
    pub fn get_entries(&self, dir: &str) -> Option<Vec<CompletionEntry>> {
        self.entries
            .read()
            .ok()
            .and_then(|cache| cache.get(dir).cloned())
    }

    pub fn client(&self) -> &ClusterClient {
        &self.client
    }
}

/// Tab completion helper for the shell
pub struct ShellCompleter {
    cache: CompletionCache,
}

impl ShellCompleter {
    pub fn new(cache: CompletionCache) -> Self {
        ShellCompleter { cache }
    }

    /// Complete a command at the start of the line
    fn complete_command(&self, word: &str) -> Vec<Pair> {
        self.cache
            .commands()
            .into_iter()
            .filter(|cmd| cmd.starts_with(word))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: cmd,
            })
            .collect()
    }

    /// Complete a cluster path typed after a command
    fn complete_path(&self, word: &str, command: &str) -> Vec<Pair> {
        // "data/pa" -> list "data/", match "pa"
        let (dir_part, name_prefix) = match word.rfind('/') {
            Some(pos) => word.split_at(pos + 1),
            None => ("", word),
        };
        let dir = ClusterPath::resolve(&self.cache.cwd(), dir_part);

        let entries = self.entries_for(&dir);
        entries
            .into_iter()
            .filter(|entry| entry.name.starts_with(name_prefix))
            .filter(|entry| command != "cd" || entry.is_dir)
            .map(|entry| {
                let suffix = if entry.is_dir { "/" } else { "" };
                Pair {
                    replacement: format!("{}{}{}", dir_part, entry.name, suffix),
                    display: format!("{}{}", entry.name, suffix),
                }
            })
            .collect()
    }

    /// Cached listing of a directory, fetched on first use
    fn entries_for(&self, dir: &ClusterPath) -> Vec<CompletionEntry> {
        let key = dir.to_string();
        if let Some(cached) = self.cache.get_entries(&key) {
            return cached;
        }
        match self.fetch_entries(&key) {
            Some(entries) => {
                self.cache.update_entries(key, entries.clone());
                entries
            }
            None => Vec::new(),
        }
    }

    /// Fetch a listing (blocks on the async client call)
    fn fetch_entries(&self, dir: &str) -> Option<Vec<CompletionEntry>> {
        let client = self.cache.client().clone();
        let dir = dir.to_string();

        // Bridge the sync completer and the async client through a channel
        let (tx, rx) = std::sync::mpsc::channel();
        let handle = tokio::runtime::Handle::try_current().ok()?;

        handle.spawn(async move {
            let result = client.list_status(&dir).await.map(|children| {
                children
                    .into_iter()
                    .map(|status| CompletionEntry {
                        name: status.name().to_string(),
                        is_dir: status.folder,
                    })
                    .collect::<Vec<_>>()
            });
            let _ = tx.send(result);
        });

        rx.recv().ok()?.ok()
    }
}

impl Completer for ShellCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        let words: Vec<&str> = line.split_whitespace().collect();
        let Some(command) = words.first() else {
            return Ok((0, Vec::new()));
        };

        // First word: complete commands
        if words.len() == 1 && !line.ends_with(char::is_whitespace) {
            let start = line.len() - command.len();
            return Ok((start, self.complete_command(command)));
        }

        // Otherwise complete the word under the cursor as a path
        let word = if line.ends_with(char::is_whitespace) {
            ""
        } else {
            words.last().copied().unwrap_or("")
        };
        let start = pos - word.len();
        Ok((start, self.complete_path(word, command)))
    }
}

impl rustyline::Helper for ShellCompleter {}
impl rustyline::highlight::Highlighter for ShellCompleter {}
impl rustyline::hint::Hinter for ShellCompleter {
    type Hint = String;
}
impl rustyline::validate::Validator for ShellCompleter {}
