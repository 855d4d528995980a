/// Splits before every uppercase letter and lowercases the pieces, so
/// acronyms fall apart letter by letter: `ABBRCase` becomes
/// `a b b r case`.
pub fn expand_camel(word: &str) -> Vec<String> {
    split_on_uppercase(word)
        .into_iter()
        .map(|v| v.to_lowercase())
        .collect()
}

fn split_on_uppercase(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current_word = String::new();

    for c in s.chars() {
        if c.is_ascii_uppercase() && !current_word.is_empty() {
            words.push(current_word);
            current_word = String::new();
        }
        current_word.push(c);
    }

    if !current_word.is_empty() {
        words.push(current_word);
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_and_pascal() {
        assert_eq!(expand_camel("helloWorld"), vec!["hello", "world"]);
        assert_eq!(expand_camel("HelloWorld"), vec!["hello", "world"]);
    }

    #[test]
    fn acronyms_split_per_letter() {
        assert_eq!(expand_camel("DataJSON"), vec!["data", "j", "s", "o", "n"]);
    }

    #[test]
    fn single_word() {
        assert_eq!(expand_camel("Word"), vec!["word"]);
        assert_eq!(expand_camel("word"), vec!["word"]);
    }
}
