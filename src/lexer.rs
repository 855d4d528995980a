use once_cell::sync::Lazy;
use regex::Regex;

/// Runs of letters optionally joined by single hyphens/underscores, or
/// camelCase runs. Boundaries are ASCII, so a non-ASCII letter ends a run.
static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?-u:\b)[a-zA-Z]+(?:[-_][a-zA-Z]+)*(?-u:\b)",
        r"|(?-u:\b)[a-z]+(?:[A-Z][a-z]*)*(?-u:\b)",
    ))
    .expect("word pattern must compile")
});

/// Zero-based line and UTF-16 column, the unit LSP clients count in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pos(pub u32, pub u32);

impl Pos {
    pub fn line(&self) -> u32 {
        self.0
    }

    pub fn column(&self) -> u32 {
        self.1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub start: Pos,
    pub end: Pos,
}

impl Location {
    pub fn new<T: Into<Pos>>(start: T, end: T) -> Location {
        Location {
            start: start.into(),
            end: end.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub start: Pos,
    pub end: Pos,
    /// Byte offset of the first character in the scanned text.
    pub offset: usize,
    pub lexeme: String,
}

impl Token {
    pub fn len(&self) -> usize {
        self.lexeme.len()
    }

    pub fn location(&self) -> Location {
        Location::new(self.start, self.end)
    }

    /// Whether `pos` touches the token, end position included so a cursor
    /// sitting right after the last letter still counts.
    pub fn contains(&self, pos: Pos) -> bool {
        self.start.line() == pos.line()
            && self.start.column() <= pos.column()
            && pos.column() <= self.end.column()
    }
}

/// Left-to-right, non-overlapping word matcher over a document.
#[derive(Debug)]
pub struct Lexer<'a> {
    text: &'a str,
    offset: usize,
    tracked: usize,
    line: u32,
    col: u32,
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Lexer<'a> {
        Lexer {
            text,
            offset: 0,
            tracked: 0,
            line: 0,
            col: 0,
        }
    }

    fn pos(&self) -> Pos {
        Pos(self.line, self.col)
    }

    /// Moves the line/column cursor forward to `offset`. Offsets only ever
    /// grow, so the whole document is walked once per scan.
    fn advance_to(&mut self, offset: usize) -> Pos {
        for c in self.text[self.tracked..offset].chars() {
            if c == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += c.len_utf16() as u32;
            }
        }
        self.tracked = offset;
        self.pos()
    }

    fn next_token(&mut self) -> Option<Token> {
        if self.offset > self.text.len() {
            return None;
        }
        let (from, to) = {
            let found = WORD_PATTERN.find_at(self.text, self.offset)?;
            (found.start(), found.end())
        };
        self.offset = to;

        let start = self.advance_to(from);
        let end = self.advance_to(to);

        Some(Token {
            start,
            end,
            offset: from,
            lexeme: self.text[from..to].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexemes(text: &str) -> Vec<String> {
        Lexer::new(text).map(|t| t.lexeme).collect()
    }

    #[test]
    fn lex_source() {
        let src = "
fn fizz_buzz(n: int) {
  if 0 == i % 15 {
    printLine(\"FizzBuzz\", i)
  }
}
";
        assert_eq!(
            lexemes(src),
            vec!["fn", "fizz_buzz", "n", "int", "if", "i", "printLine", "FizzBuzz", "i"]
        );
    }

    #[test]
    fn empty_and_wordless_text() {
        assert!(lexemes("").is_empty());
        assert!(lexemes("  12 + 34 == 46; // ").is_empty());
    }

    #[test]
    fn compounds_stay_whole() {
        assert_eq!(
            lexemes("well-known snake_case camelCase"),
            vec!["well-known", "snake_case", "camelCase"]
        );
    }

    #[test]
    fn doubled_delimiters_split_the_token() {
        assert_eq!(lexemes("foo--bar"), vec!["foo", "bar"]);
    }

    #[test]
    fn letters_glued_to_digits_are_skipped() {
        assert_eq!(lexemes("utf8 abc x86 ok"), vec!["abc", "ok"]);
    }

    #[test]
    fn non_ascii_letters_break_words() {
        assert_eq!(
            lexemes("café naïve Zürich résumé"),
            vec!["caf", "na", "ve", "Z", "rich", "r", "sum"]
        );
        assert_eq!(lexemes("日本語 über"), vec!["ber"]);
    }

    #[test]
    fn tracks_offsets_and_positions() {
        let tokens: Vec<Token> = Lexer::new("hello\n  wrold").collect();
        assert_eq!(tokens.len(), 2);

        assert_eq!(tokens[0].offset, 0);
        assert_eq!(tokens[0].start, Pos(0, 0));
        assert_eq!(tokens[0].end, Pos(0, 5));

        assert_eq!(tokens[1].offset, 8);
        assert_eq!(tokens[1].len(), 5);
        assert_eq!(tokens[1].start, Pos(1, 2));
        assert_eq!(tokens[1].end, Pos(1, 7));
    }

    #[test]
    fn columns_count_utf16_units() {
        let tokens: Vec<Token> = Lexer::new("🦀 crab").collect();
        assert_eq!(tokens[0].lexeme, "crab");
        assert_eq!(tokens[0].offset, 5);
        assert_eq!(tokens[0].start, Pos(0, 3));
    }

    #[test]
    fn contains_includes_both_edges() {
        let token = Lexer::new("  word").next().unwrap();
        assert!(!token.contains(Pos(0, 1)));
        assert!(token.contains(Pos(0, 2)));
        assert!(token.contains(Pos(0, 6)));
        assert!(!token.contains(Pos(1, 3)));
    }
}
