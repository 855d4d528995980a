use camel::expand_camel;
use delimited::{expand_delimited, is_delimited};

use crate::lexer::Token;
pub mod camel;
pub mod delimited;

/// Breaks a compound token into the sub-words that get looked up.
pub trait Expandable {
    fn expand(&self) -> Vec<String>;
}

impl Expandable for Token {
    fn expand(&self) -> Vec<String> {
        split_compound_word(&self.lexeme)
    }
}

impl Expandable for str {
    fn expand(&self) -> Vec<String> {
        split_compound_word(self)
    }
}

/// Hyphen/underscore compounds split on their delimiters and keep their
/// case; anything else is treated as camelCase and lowercased.
pub fn split_compound_word(word: &str) -> Vec<String> {
    if is_delimited(word) {
        return expand_delimited(word);
    }
    expand_camel(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    #[test]
    fn splits_compounds() {
        assert_eq!(split_compound_word("foo-bar_baz"), vec!["foo", "bar", "baz"]);
        assert_eq!(split_compound_word("fooBarBaz"), vec!["foo", "bar", "baz"]);
        assert_eq!(split_compound_word("plainword"), vec!["plainword"]);
    }

    #[test]
    fn delimiters_win_over_case() {
        assert_eq!(split_compound_word("Foo-barBaz"), vec!["Foo", "barBaz"]);
    }

    #[test]
    fn empty_word_has_no_parts() {
        assert!(split_compound_word("").is_empty());
    }

    #[test]
    fn tokens_expand_their_lexeme() {
        let token = Lexer::new("let userName").nth(1).unwrap();
        assert_eq!(token.expand(), vec!["user", "name"]);
        assert_eq!("snake_case".expand(), vec!["snake", "case"]);
    }
}
