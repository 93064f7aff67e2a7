/// Cleans raw comment text into lowercase tokens.
///
/// Keeps ASCII letters, Spanish accented letters and whitespace; every
/// other character is removed before splitting. Whitespace-only input
/// yields an empty token list. This stage never fails.
pub fn normalize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| keep_char(*c))
        .collect();

    cleaned.split_whitespace().map(str::to_owned).collect()
}

fn keep_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c.is_whitespace() || matches!(c, 'á' | 'é' | 'í' | 'ó' | 'ú' | 'ü' | 'ñ')
}
