use crop::Rope;
use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent};

use crate::lexer::{Lexer, Pos};

/// An open document as the server sees it.
pub struct TextDocument {
    pub language_id: String,
    pub version: i32,
    rope: Rope,
}

impl TextDocument {
    pub fn new(language_id: String, version: i32, text: &str) -> Self {
        Self {
            language_id,
            version,
            rope: Rope::from(text),
        }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn apply_changes(&mut self, version: i32, changes: Vec<TextDocumentContentChangeEvent>) {
        for change in changes {
            match change.range {
                Some(range) => {
                    let start = self.byte_of(range.start);
                    let end = self.byte_of(range.end).max(start);
                    self.rope.replace(start..end, &change.text);
                }
                None => self.rope = Rope::from(change.text.as_str()),
            }
        }
        self.version = version;
    }

    /// Byte offset of an LSP position. Positions past the end of a line
    /// clamp to the line end, lines past the end of the text to the end of
    /// the text.
    fn byte_of(&self, position: Position) -> usize {
        let line = position.line as usize;
        if line >= self.rope.line_len() {
            return self.rope.byte_len();
        }
        let mut utf16 = 0;
        let mut bytes = 0;
        for c in self.rope.line(line).chars() {
            if utf16 >= position.character as usize {
                break;
            }
            utf16 += c.len_utf16();
            bytes += c.len_utf8();
        }
        self.rope.byte_of_line(line) + bytes
    }

    /// The word the cursor sits on or right after.
    pub fn word_at(&self, position: Position) -> Option<String> {
        let text = self.text();
        let cursor = Pos(position.line, position.character);
        Lexer::new(&text)
            .skip_while(|t| t.end.line() < cursor.line())
            .take_while(|t| t.start.line() <= cursor.line())
            .find(|t| t.contains(cursor))
            .map(|t| t.lexeme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Range;

    fn edit(start: (u32, u32), end: (u32, u32), text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(Range::new(
                Position::new(start.0, start.1),
                Position::new(end.0, end.1),
            )),
            range_length: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn incremental_edits() {
        let mut doc = TextDocument::new("plaintext".into(), 1, "hello wrold\nbye");
        doc.apply_changes(2, vec![edit((0, 6), (0, 11), "world")]);
        assert_eq!(doc.text(), "hello world\nbye");

        doc.apply_changes(3, vec![edit((1, 3), (1, 3), "!"), edit((0, 0), (0, 0), "oh ")]);
        assert_eq!(doc.text(), "oh hello world\nbye!");
        assert_eq!(doc.version, 3);
    }

    #[test]
    fn edits_past_the_end_append() {
        let mut doc = TextDocument::new("plaintext".into(), 1, "one\n");
        doc.apply_changes(2, vec![edit((5, 0), (5, 0), "two")]);
        assert_eq!(doc.text(), "one\ntwo");
    }

    #[test]
    fn utf16_columns() {
        let mut doc = TextDocument::new("plaintext".into(), 1, "🦀 crab");
        doc.apply_changes(2, vec![edit((0, 3), (0, 7), "ferris")]);
        assert_eq!(doc.text(), "🦀 ferris");
    }

    #[test]
    fn full_replacement() {
        let mut doc = TextDocument::new("plaintext".into(), 1, "old");
        doc.apply_changes(
            2,
            vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: "new text".into(),
            }],
        );
        assert_eq!(doc.text(), "new text");
    }

    #[test]
    fn word_under_cursor() {
        let doc = TextDocument::new("plaintext".into(), 1, "first line\n  second-word here");
        assert_eq!(doc.word_at(Position::new(0, 2)).as_deref(), Some("first"));
        assert_eq!(doc.word_at(Position::new(1, 5)).as_deref(), Some("second-word"));
        assert_eq!(doc.word_at(Position::new(1, 13)).as_deref(), Some("second-word"));
        assert_eq!(doc.word_at(Position::new(1, 0)), None);
        assert_eq!(doc.word_at(Position::new(7, 0)), None);
    }
}
