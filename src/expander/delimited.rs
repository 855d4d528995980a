const DELIMITERS: [char; 2] = ['-', '_'];

pub fn is_delimited(word: &str) -> bool {
    word.contains(DELIMITERS)
}

pub fn expand_delimited(word: &str) -> Vec<String> {
    word.split(DELIMITERS)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}
