use dashmap::DashSet;

/// Lowercase word set. Inserts and lookups go through `&self`, so one
/// instance can be shared between the scanner and the writer.
#[derive(Debug, Default)]
pub struct WordSet(DashSet<String>);

impl WordSet {
    pub fn new() -> Self {
        Self(DashSet::new())
    }

    pub fn contains(&self, v: &str) -> bool {
        if v.chars().any(char::is_uppercase) {
            return self.0.contains(&v.to_lowercase());
        }
        self.0.contains(v)
    }

    /// Returns `false` when the word was already present.
    pub fn insert(&self, v: &str) -> bool {
        self.0.insert(v.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sorted_words(&self) -> Vec<String> {
        let mut words: Vec<String> = self.0.iter().map(|w| w.key().clone()).collect();
        words.sort();
        words
    }
}

impl<S: AsRef<str>> FromIterator<S> for WordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let set = WordSet::new();
        for word in iter {
            set.insert(word.as_ref());
        }
        set
    }
}
