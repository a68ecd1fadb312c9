//! Shared line tokenizer for the configuration, block, and schedule file
//! formats (§6.1), plus the simpler M3U line rule.

/// Pulls one token off the front of `line`, per the configuration tokenizer:
/// skip leading blanks; `#`/empty/NUL lines yield no token; quoted (`"`/`'`)
/// or parenthesized (`(...)`) runs are taken verbatim; otherwise the token
/// runs to the next whitespace.
///
/// Returns `(token, rest)` on success, `None` if the line has no more tokens.
pub fn next_configuration_token(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start_matches([' ', '\t']);
    let mut chars = trimmed.char_indices();
    let (_, first) = chars.next()?;

    match first {
        '#' | '\0' => None,
        '"' => copy_to_delimiter(&trimmed[1..], '"'),
        '\'' => copy_to_delimiter(&trimmed[1..], '\''),
        '(' => copy_to_delimiter(&trimmed[1..], ')'),
        _ => copy_to_whitespace(trimmed),
    }
}

fn copy_to_delimiter(s: &str, delim: char) -> Option<(&str, &str)> {
    match s.find(delim) {
        Some(idx) => Some((&s[..idx], &s[idx + delim.len_utf8()..])),
        None => Some((s, "")),
    }
}

fn copy_to_whitespace(s: &str) -> Option<(&str, &str)> {
    match s.find(|c: char| c == '\n' || c == ' ' || c == '\t') {
        Some(idx) => Some((&s[..idx], &s[idx..])),
        None => Some((s, "")),
    }
}

/// Splits a configuration-format line into exactly `n` tokens. Returns `None`
/// if fewer than `n` tokens are present (the line is dropped by the caller).
pub fn tokenize_n(line: &str, n: usize) -> Option<Vec<String>> {
    let mut rest = line;
    let mut tokens = Vec::with_capacity(n);
    for _ in 0..n {
        let (tok, next_rest) = next_configuration_token(rest)?;
        tokens.push(tok.to_string());
        rest = next_rest;
    }
    Some(tokens)
}

/// The M3U line rule: skip leading blanks; `#`/empty lines are comments;
/// everything else is the (unquoted, possibly still containing spaces) entry
/// up to the newline.
pub fn m3u_entry(line: &str) -> Option<&str> {
    let trimmed = line.trim_start_matches([' ', '\t']);
    let mut chars = trimmed.chars();
    match chars.next() {
        None | Some('#') | Some('\0') => None,
        Some('"') => {
            let rest = &trimmed[1..];
            rest.find('"').map(|idx| &rest[..idx])
        }
        Some('\'') => {
            let rest = &trimmed[1..];
            rest.find('\'').map(|idx| &rest[..idx])
        }
        _ => Some(trimmed.trim_end_matches(['\r', '\n'])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_three_plain_tokens() {
        let tokens = tokenize_n("monday 08:00:00 news", 3).unwrap();
        assert_eq!(tokens, vec!["monday", "08:00:00", "news"]);
    }

    #[test]
    fn quoted_token_may_contain_spaces() {
        let tokens = tokenize_n("jazz file \"/mnt/my music/song.mp3\"", 3).unwrap();
        assert_eq!(tokens[2], "/mnt/my music/song.mp3");
    }

    #[test]
    fn paren_token() {
        let (tok, rest) = next_configuration_token("(1 2 3) tail").unwrap();
        assert_eq!(tok, "1 2 3");
        assert_eq!(rest.trim_start(), "tail");
    }

    #[test]
    fn comment_line_yields_no_token() {
        assert_eq!(next_configuration_token("# a comment"), None);
    }

    #[test]
    fn missing_token_drops_the_line() {
        assert_eq!(tokenize_n("onlyone", 3), None);
    }

    #[test]
    fn m3u_skips_comments_and_blanks() {
        assert_eq!(m3u_entry("#EXTINF:0,foo"), None);
        assert_eq!(m3u_entry(""), None);
        assert_eq!(m3u_entry("song.mp3\n"), Some("song.mp3"));
    }
}
