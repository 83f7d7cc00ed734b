//! Shell quoting for the remote command
//!
//! The remote login shell parses everything ssh sends after the host, so the
//! joined command has to survive that parse as one word before `/bin/sh -c`
//! sees it.

/// Escape a string for use inside single quotes.
///
/// Each `'` becomes `'"'"'`: close the quote, emit a double-quoted single
/// quote, reopen.
///
/// # Example
/// ```
/// use scw_exec::ssh::sanitize::escape_for_shell;
///
/// assert_eq!(escape_for_shell("it's"), "it'\"'\"'s");
/// ```
pub fn escape_for_shell(s: &str) -> String {
    s.replace('\'', "'\"'\"'")
}

/// Quote a string as a single POSIX shell word.
///
/// Nothing is special inside single quotes, so `$`, backslashes, double
/// quotes and newlines pass through untouched.
///
/// # Example
/// ```
/// use scw_exec::ssh::sanitize::quote_word;
///
/// assert_eq!(quote_word("echo $HOME"), "'echo $HOME'");
/// assert_eq!(quote_word(""), "''");
/// ```
pub fn quote_word(s: &str) -> String {
    format!("'{}'", escape_for_shell(s))
}

/// Join command tokens with single spaces and quote the result as one word
pub fn quote_command<S: AsRef<str>>(tokens: &[S]) -> String {
    let joined = tokens
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ");
    quote_word(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal POSIX word splitter covering the quoting `quote_word` emits
    fn shell_words(input: &str) -> Vec<String> {
        let mut words = Vec::new();
        let mut current = String::new();
        let mut in_word = false;
        let mut chars = input.chars();
        while let Some(c) = chars.next() {
            match c {
                '\'' => {
                    in_word = true;
                    for q in chars.by_ref() {
                        if q == '\'' {
                            break;
                        }
                        current.push(q);
                    }
                }
                '"' => {
                    in_word = true;
                    while let Some(q) = chars.next() {
                        match q {
                            '"' => break,
                            '\\' => {
                                if let Some(next) = chars.next() {
                                    current.push(next);
                                }
                            }
                            _ => current.push(q),
                        }
                    }
                }
                ' ' => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                _ => {
                    in_word = true;
                    current.push(c);
                }
            }
        }
        if in_word {
            words.push(current);
        }
        words
    }

    #[test]
    fn test_escape_for_shell_no_quotes() {
        assert_eq!(escape_for_shell("ls -la"), "ls -la");
    }

    #[test]
    fn test_escape_for_shell_multiple_quotes() {
        assert_eq!(
            escape_for_shell("'a' and 'b'"),
            "'\"'\"'a'\"'\"' and '\"'\"'b'\"'\"'"
        );
    }

    #[test]
    fn test_quote_command_joins_with_single_spaces() {
        assert_eq!(quote_command(&["ls", "-la", "/tmp"]), "'ls -la /tmp'");
    }

    #[test]
    fn test_quote_command_single_token_script() {
        assert_eq!(
            quote_command(&["tmux a -t joe || tmux new -s joe || bash"]),
            "'tmux a -t joe || tmux new -s joe || bash'"
        );
    }

    #[test]
    fn test_quoted_command_reparses_to_joined_tokens() {
        let cases: &[&[&str]] = &[
            &["echo", "hello"],
            &["echo", "it's", "fine"],
            &["echo", "\"double\"", "and\\backslash"],
            &["sh", "-c", "echo $HOME; exit 1"],
            &["printf", "'%s\\n'", "a'b'c"],
            &["echo", "line1\nline2"],
            &[""],
        ];
        for tokens in cases.iter().copied() {
            let quoted = quote_command(tokens);
            let words = shell_words(&quoted);
            assert_eq!(words, vec![tokens.join(" ")], "quoted form: {}", quoted);
        }
    }
}
