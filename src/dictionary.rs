use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use tokio::io::AsyncWriteExt;

use crate::local_dictionary::WordSet;

pub const BASE_DICTIONARY_PREFIX: &str = "dictionary";
pub const BASE_DICTIONARY_EXTENSION: &str = ".txt";
pub const USER_DICTIONARY_FILE: &str = "userDictionary.txt";
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    /// Recovered during a load: the file is skipped.
    #[error("failed to read dictionary {path:?}: {source}")]
    FileRead { path: PathBuf, source: io::Error },
    /// Recovered during a load: treated as an empty folder.
    #[error("failed to scan dictionary folder {path:?}: {source}")]
    FolderScan { path: PathBuf, source: io::Error },
    #[error("failed to append to user dictionary {path:?}: {source}")]
    FileAppend { path: PathBuf, source: io::Error },
    #[error("failed to export user dictionary to {path:?}: {source}")]
    ExportWrite { path: PathBuf, source: io::Error },
    #[error("cannot add an empty word to the user dictionary")]
    EmptyWord,
    /// One line per word on disk, so a word cannot span several.
    #[error("cannot add {0:?} to the user dictionary: words must not contain whitespace")]
    InvalidWord(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryRole {
    Base,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryFile {
    pub path: PathBuf,
    pub role: DictionaryRole,
}

impl DictionaryFile {
    /// Tags a path by its file name, `None` for files that are not
    /// dictionaries at all.
    pub fn classify(path: PathBuf) -> Option<DictionaryFile> {
        let name = path.file_name()?.to_str()?;
        let role = if name == USER_DICTIONARY_FILE {
            DictionaryRole::User
        } else if name.starts_with(BASE_DICTIONARY_PREFIX)
            && name.ends_with(BASE_DICTIONARY_EXTENSION)
        {
            DictionaryRole::Base
        } else {
            return None;
        };
        Some(DictionaryFile { path, role })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The previous load is still within the cooldown window.
    Skipped,
    Loaded { base_words: usize, user_words: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(String),
    AlreadyPresent(String),
}

impl AddOutcome {
    pub fn word(&self) -> &str {
        match self {
            AddOutcome::Added(w) | AddOutcome::AlreadyPresent(w) => w,
        }
    }
}

/// Both word sets as they were when the snapshot was taken.
#[derive(Debug, Clone)]
pub struct Snapshot {
    base: Arc<WordSet>,
    user: Arc<WordSet>,
}

impl Snapshot {
    pub fn contains(&self, word: &str) -> bool {
        self.base.contains(word) || self.user.contains(word)
    }
}

/// Base and user word sets loaded from one dictionary folder.
///
/// A reload builds fresh sets and swaps them in, adding a user word inserts
/// into the live user set. Scans hold a [`Snapshot`] and never see a half
/// built set.
#[derive(Debug)]
pub struct DictionaryStore {
    folder: PathBuf,
    cooldown: Duration,
    base: RwLock<Arc<WordSet>>,
    user: RwLock<Arc<WordSet>>,
    last_load: Mutex<Option<Instant>>,
    append_lock: tokio::sync::Mutex<()>,
}

impl DictionaryStore {
    #[cfg(test)]
    pub fn new<P: Into<PathBuf>>(folder: P) -> Self {
        Self::with_cooldown(folder, DEFAULT_COOLDOWN)
    }

    pub fn with_cooldown<P: Into<PathBuf>>(folder: P, cooldown: Duration) -> Self {
        Self {
            folder: folder.into(),
            cooldown,
            base: RwLock::new(Arc::new(WordSet::new())),
            user: RwLock::new(Arc::new(WordSet::new())),
            last_load: Mutex::new(None),
            append_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn user_dictionary_path(&self) -> PathBuf {
        self.folder.join(USER_DICTIONARY_FILE)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            base: self.base.read().clone(),
            user: self.user.read().clone(),
        }
    }

    #[cfg(test)]
    pub fn contains(&self, word: &str) -> bool {
        self.snapshot().contains(word)
    }

    #[cfg(test)]
    pub fn base_len(&self) -> usize {
        self.base.read().len()
    }

    #[cfg(test)]
    pub fn user_len(&self) -> usize {
        self.user.read().len()
    }

    pub fn user_words(&self) -> Vec<String> {
        self.user.read().sorted_words()
    }

    fn is_fresh(&self) -> bool {
        self.last_load
            .lock()
            .is_some_and(|at| at.elapsed() < self.cooldown)
    }

    /// Reloads both sets from disk unless the last load is younger than the
    /// cooldown and `force` is not set.
    pub fn load_all(&self, force: bool) -> LoadOutcome {
        if !force && self.is_fresh() {
            debug!("dictionaries are fresh, skipping reload");
            return LoadOutcome::Skipped;
        }

        let files = self.scan_dictionary_files();

        let base: WordSet = files
            .iter()
            .filter(|f| f.role == DictionaryRole::Base)
            .flat_map(|f| read_words_or_skip(&f.path))
            .collect();
        if base.is_empty() {
            warn!("No base dictionary words found in {:?}", self.folder);
        }
        let base_words = base.len();
        *self.base.write() = Arc::new(base);

        // Held across the read so an add that lands meanwhile inserts into
        // the new set rather than the one being replaced.
        let user_words = {
            let mut user = self.user.write();
            let set: WordSet = files
                .iter()
                .filter(|f| f.role == DictionaryRole::User)
                .flat_map(|f| read_words_or_skip(&f.path))
                .collect();
            let len = set.len();
            *user = Arc::new(set);
            len
        };

        *self.last_load.lock() = Some(Instant::now());
        info!("Loaded {base_words} words from dictionary");
        info!("Loaded {user_words} words from user dictionary");

        LoadOutcome::Loaded {
            base_words,
            user_words,
        }
    }

    /// [`load_all`](Self::load_all) on the blocking pool, for callers on the
    /// async runtime.
    pub async fn reload(self: Arc<Self>, force: bool) -> LoadOutcome {
        match tokio::task::spawn_blocking(move || self.load_all(force)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("Dictionary load failed: {err}");
                LoadOutcome::Skipped
            }
        }
    }

    pub fn scan_dictionary_files(&self) -> Vec<DictionaryFile> {
        match list_dictionary_files(&self.folder) {
            Ok(files) => files,
            Err(err) => {
                error!("{err}");
                Vec::new()
            }
        }
    }

    /// Appends `word` to the user dictionary file and then to the in-memory
    /// set. Appends are serialized, and nothing is inserted in memory unless
    /// the write went through.
    pub async fn add_word(&self, word: &str) -> Result<AddOutcome, DictionaryError> {
        let word = normalize(word);
        if word.is_empty() {
            return Err(DictionaryError::EmptyWord);
        }
        if word.contains(char::is_whitespace) {
            return Err(DictionaryError::InvalidWord(word));
        }

        let _guard = self.append_lock.lock().await;

        let present = self.user.read().contains(&word);
        if present {
            debug!("{word:?} is already in the user dictionary");
            return Ok(AddOutcome::AlreadyPresent(word));
        }

        let path = self.user_dictionary_path();
        if let Err(source) = append_line(&path, &word).await {
            error!("Failed to add {word:?} to {path:?}: {source}");
            return Err(DictionaryError::FileAppend { path, source });
        }

        self.user.read().insert(&word);
        info!("Added {word:?} to user dictionary");
        Ok(AddOutcome::Added(word))
    }

    /// Writes the user dictionary, one word per line, and returns how many
    /// words went out.
    pub async fn export_user_dictionary<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<usize, DictionaryError> {
        let path = path.as_ref();
        let words = self.user_words();
        tokio::fs::write(path, words.join("\n"))
            .await
            .map_err(|source| DictionaryError::ExportWrite {
                path: path.to_path_buf(),
                source,
            })?;
        info!("Exported {} words to {path:?}", words.len());
        Ok(words.len())
    }
}

pub fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

pub fn parse_words(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .lines()
        .map(normalize)
        .filter(|line| !line.is_empty())
}

fn list_dictionary_files(folder: &Path) -> Result<Vec<DictionaryFile>, DictionaryError> {
    let scan_error = |source: io::Error| DictionaryError::FolderScan {
        path: folder.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(folder).map_err(scan_error)? {
        let entry = entry.map_err(scan_error)?;
        if let Some(file) = DictionaryFile::classify(entry.path()) {
            files.push(file);
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

pub fn read_words(path: &Path) -> Result<Vec<String>, DictionaryError> {
    let content = fs::read_to_string(path).map_err(|source| DictionaryError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_words(&content).collect())
}

fn read_words_or_skip(path: &Path) -> Vec<String> {
    match read_words(path) {
        Ok(words) => words,
        Err(err) => {
            warn!("{err}, skipping");
            Vec::new()
        }
    }
}

async fn append_line(path: &Path, word: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(format!("{word}\n").as_bytes()).await?;
    file.flush().await?;
    file.sync_all().await
}
