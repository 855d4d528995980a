use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::{Command, Position, Url};

pub const COMMAND_RELOAD_DICTIONARY: &str = "miniSpellChecker.reloadDictionary";
pub const COMMAND_ADD_TO_USER_DICTIONARY: &str = "miniSpellChecker.addToUserDictionary";
pub const COMMAND_EXPORT_USER_DICTIONARY: &str = "miniSpellChecker.exportUserDictionary";

pub fn all() -> Vec<String> {
    [
        COMMAND_RELOAD_DICTIONARY,
        COMMAND_ADD_TO_USER_DICTIONARY,
        COMMAND_EXPORT_USER_DICTIONARY,
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// What `addToUserDictionary` should add: a word, or the word under a
/// cursor in an open document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WordTarget {
    Word(String),
    Cursor { uri: Url, position: Position },
}

impl WordTarget {
    /// Turns the target into a word. Cursors are handed to `lookup`, which
    /// knows the open documents.
    pub fn resolve<F>(self, lookup: F) -> Option<String>
    where
        F: FnOnce(&Url, Position) -> Option<String>,
    {
        let word = match self {
            WordTarget::Word(word) => Some(word),
            WordTarget::Cursor { uri, position } => lookup(&uri, position),
        }?;
        if word.trim().is_empty() {
            return None;
        }
        Some(word)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpellCommand {
    Reload,
    AddWord(Option<WordTarget>),
    Export(PathBuf),
}

impl SpellCommand {
    pub fn parse(command: &str, arguments: &[Value]) -> Result<SpellCommand> {
        match command {
            COMMAND_RELOAD_DICTIONARY => Ok(SpellCommand::Reload),
            COMMAND_ADD_TO_USER_DICTIONARY => {
                let target = match arguments.first() {
                    None | Some(Value::Null) => None,
                    Some(v) => Some(serde_json::from_value(v.clone()).map_err(|e| {
                        Error::invalid_params(format!("Invalid word argument: {e}"))
                    })?),
                };
                Ok(SpellCommand::AddWord(target))
            }
            COMMAND_EXPORT_USER_DICTIONARY => {
                let path = arguments
                    .first()
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| Error::invalid_params("Missing 'path' argument"))?;
                Ok(SpellCommand::Export(PathBuf::from(path)))
            }
            _ => Err(Error::invalid_params(format!("Unknown command: {command}"))),
        }
    }
}

pub fn add_to_dictionary(word: &str) -> Command {
    Command {
        title: format!("Add \"{word}\" to dictionary"),
        command: COMMAND_ADD_TO_USER_DICTIONARY.to_string(),
        arguments: Some(vec![Value::String(word.to_string())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_reload() {
        assert_eq!(
            SpellCommand::parse(COMMAND_RELOAD_DICTIONARY, &[]).unwrap(),
            SpellCommand::Reload
        );
    }

    #[test]
    fn parses_add_word_targets() {
        assert_eq!(
            SpellCommand::parse(COMMAND_ADD_TO_USER_DICTIONARY, &[]).unwrap(),
            SpellCommand::AddWord(None)
        );
        assert_eq!(
            SpellCommand::parse(COMMAND_ADD_TO_USER_DICTIONARY, &[json!("ferris")]).unwrap(),
            SpellCommand::AddWord(Some(WordTarget::Word("ferris".into())))
        );

        let cursor = json!({
            "uri": "file:///tmp/notes.md",
            "position": { "line": 2, "character": 4 }
        });
        let parsed = SpellCommand::parse(COMMAND_ADD_TO_USER_DICTIONARY, &[cursor]).unwrap();
        let SpellCommand::AddWord(Some(WordTarget::Cursor { uri, position })) = parsed else {
            panic!("expected a cursor target, got {parsed:?}");
        };
        assert_eq!(uri.as_str(), "file:///tmp/notes.md");
        assert_eq!(position, Position::new(2, 4));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(SpellCommand::parse(COMMAND_ADD_TO_USER_DICTIONARY, &[json!(42)]).is_err());
        assert!(SpellCommand::parse(COMMAND_EXPORT_USER_DICTIONARY, &[]).is_err());
        assert!(SpellCommand::parse("something.else", &[]).is_err());
    }

    #[test]
    fn parses_export_path() {
        assert_eq!(
            SpellCommand::parse(COMMAND_EXPORT_USER_DICTIONARY, &[json!("/tmp/words.txt")])
                .unwrap(),
            SpellCommand::Export(PathBuf::from("/tmp/words.txt"))
        );
    }

    #[test]
    fn resolves_targets() {
        let word = WordTarget::Word("ferris".into()).resolve(|_, _| None);
        assert_eq!(word.as_deref(), Some("ferris"));

        let blank = WordTarget::Word("  ".into()).resolve(|_, _| None);
        assert_eq!(blank, None);

        let uri = Url::parse("file:///tmp/a.txt").unwrap();
        let cursor = WordTarget::Cursor {
            uri: uri.clone(),
            position: Position::new(0, 1),
        };
        let resolved = cursor.resolve(|u, p| {
            assert_eq!(u, &uri);
            assert_eq!(p, Position::new(0, 1));
            Some("crab".to_string())
        });
        assert_eq!(resolved.as_deref(), Some("crab"));
    }

    #[test]
    fn add_command_carries_the_word() {
        let command = add_to_dictionary("wrold");
        assert_eq!(command.command, COMMAND_ADD_TO_USER_DICTIONARY);
        assert_eq!(command.arguments, Some(vec![json!("wrold")]));
    }
}
