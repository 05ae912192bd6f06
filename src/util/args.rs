//! Command-line splitting and shell quoting.
//!
//! Rendered parameter sets hold flag strings such as `-S "my src"` or
//! `-DCMAKE_C_COMPILER="clang"`. Before a process is spawned those strings are
//! flattened into a plain argument vector:
//!
//! 1. each fragment is cut into words, where a word is a run of non-space
//!    characters and quoted spans (`"..."` or `'...'`);
//! 2. one layer of quoting is removed from every word, undoing the XSI
//!    escaping applied by [`quote_for_shell`];
//! 3. words that still start with a short option (`-Sdir`, `-DFOO=1`,
//!    `-Wdev`) are split into the option and its glued value;
//! 4. a value exposed by that split is un-quoted once more if it is wrapped
//!    in quotes of its own.
//!
//! Words after a bare `--` belong to the native build tool and are never
//! split. Unbalanced quotes extend to the end of the fragment.

/// Glued spellings CMake only accepts whole.
const WHOLE_SHORT_OPTIONS: &[&str] = &["-LA", "-LH", "-LAH"];

/// Separates CMake's options from those of the native build tool.
const NATIVE_SEPARATOR: &str = "--";

/// Characters escaped with a backslash by [`escape_xsi`].
const XSI_SPECIAL: &[char] = &[
    '|', '&', ';', '<', '>', '(', ')', '$', '`', '\\', '"', '\'', ' ', '\t', '*', '?', '[', '#',
    '~', '=', '%',
];

/// Flatten fragments into a quote-free argument vector.
///
/// Empty fragments and whitespace-only fragments contribute nothing.
pub fn split_into_arguments<I, S>(fragments: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut args = Vec::new();
    let mut native = false;

    for fragment in fragments {
        for word in raw_words(fragment.as_ref()) {
            let word = unquote(word);
            if native {
                args.push(word);
                continue;
            }
            match split_glued_option(&word) {
                Some((option, value)) => {
                    args.push(option.to_string());
                    args.push(unwrap_quoted(value));
                }
                None => {
                    native = word == NATIVE_SEPARATOR;
                    args.push(word);
                }
            }
        }
    }

    args
}

/// Wrap a value in double quotes, escaping shell-special characters.
///
/// `unquote(&quote_for_shell(s)) == s` for any `s` without line breaks.
pub fn quote_for_shell(value: &str) -> String {
    format!("\"{}\"", escape_xsi(value))
}

/// Backslash-escape XSI shell-special characters. Line breaks are dropped.
pub fn escape_xsi(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '\n' | '\r' => {}
            c if XSI_SPECIAL.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Remove one layer of quoting from a single word.
///
/// Single quotes are literal. A backslash escapes the next character both
/// outside quotes and inside double quotes.
pub fn unquote(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut quote: Option<char> = None;
    let mut chars = word.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some('\''), '\'') => quote = None,
            (Some('\''), c) => out.push(c),
            (Some(_), '"') => quote = None,
            (_, '\\') => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            (None, '"' | '\'') => quote = Some(c),
            (_, c) => out.push(c),
        }
    }

    out
}

/// Render an argument vector as a single line for logs and error messages.
pub fn display_command(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.is_empty() || arg.chars().any(char::is_whitespace) {
                quote_for_shell(arg)
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut a fragment into words, keeping quotes and escapes intact.
fn raw_words(input: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }

        match quote {
            Some('\'') => {
                if c == '\'' {
                    quote = None;
                }
            }
            Some(_) => match c {
                '\\' => escaped = true,
                '"' => quote = None,
                _ => {}
            },
            None => {
                if c.is_whitespace() {
                    if let Some(s) = start.take() {
                        words.push(&input[s..i]);
                    }
                    continue;
                }
                start.get_or_insert(i);
                match c {
                    '\\' => escaped = true,
                    '"' | '\'' => quote = Some(c),
                    _ => {}
                }
            }
        }
    }

    if let Some(s) = start {
        words.push(&input[s..]);
    }

    words
}

/// `-Sdir` → (`-S`, `dir`), `-DFOO=1` → (`-D`, `FOO=1`).
fn split_glued_option(word: &str) -> Option<(&str, &str)> {
    if WHOLE_SHORT_OPTIONS.contains(&word) {
        return None;
    }
    let mut chars = word.chars();
    if chars.next() != Some('-') {
        return None;
    }
    let letter = chars.next()?;
    if !(letter.is_alphanumeric() || letter == '_') {
        return None;
    }
    let value = chars.as_str();
    if value.is_empty() {
        return None;
    }
    Some(word.split_at(1 + letter.len_utf8()))
}

/// Un-quote `value` only when it is wrapped in matching quotes.
fn unwrap_quoted(value: &str) -> String {
    let wrapped = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if wrapped {
        unquote(value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_strips_quotes_from_separate_value() {
        let args = split_into_arguments(["-S", "\"my src\""]);
        assert_eq!(args, vec!["-S", "my src"]);
    }

    #[test]
    fn test_split_flag_and_quoted_value_in_one_fragment() {
        let args = split_into_arguments(["-S \"/proj/my src\"", "-B \"/proj/build\""]);
        assert_eq!(args, vec!["-S", "/proj/my src", "-B", "/proj/build"]);
    }

    #[test]
    fn test_split_glued_short_option() {
        assert_eq!(split_into_arguments(["-Stest"]), vec!["-S", "test"]);
        assert_eq!(
            split_into_arguments(["-G\"Unix Makefiles\""]),
            vec!["-G", "Unix Makefiles"]
        );
    }

    #[test]
    fn test_split_any_glued_short_option() {
        let args = split_into_arguments(["-DFOO=\"a b\"", "-Wno-dev", "-UBAR", "-E"]);
        assert_eq!(args, vec!["-D", "FOO=a b", "-W", "no-dev", "-U", "BAR", "-E"]);

        assert_eq!(split_into_arguments(["-D\"FOO=a b\""]), vec!["-D", "FOO=a b"]);
    }

    #[test]
    fn test_split_keeps_list_cache_switches_whole() {
        let args = split_into_arguments(["-LAH", "-LA", "-LH", "-L", "-N"]);
        assert_eq!(args, vec!["-LAH", "-LA", "-LH", "-L", "-N"]);
    }

    #[test]
    fn test_split_quoted_whole_option() {
        assert_eq!(split_into_arguments(["\"-S/proj src\""]), vec!["-S", "/proj src"]);
    }

    #[test]
    fn test_second_unquote_pass_on_exposed_value() {
        // the glued value is itself quoted once the outer quotes are gone
        assert_eq!(
            split_into_arguments(["-S\"'/proj/my src'\""]),
            vec!["-S", "/proj/my src"]
        );
        assert_eq!(split_into_arguments(["-DFOO=\"a\\\"b\""]), vec!["-D", "FOO=a\"b"]);
    }

    #[test]
    fn test_split_leaves_native_options_alone() {
        let args = split_into_arguments(["--build \"/b\"", "--", "-j8", "\"-k\""]);
        assert_eq!(args, vec!["--build", "/b", "--", "-j8", "-k"]);
    }

    #[test]
    fn test_split_drops_empty_fragments() {
        let args = split_into_arguments(["", "   ", "--fresh"]);
        assert_eq!(args, vec!["--fresh"]);
    }

    #[test]
    fn test_split_single_quotes_are_literal() {
        let args = split_into_arguments(["'a \\b'"]);
        assert_eq!(args, vec!["a \\b"]);
    }

    #[test]
    fn test_quote_free_value_passes_through() {
        assert_eq!(split_into_arguments(["--verbose"]), vec!["--verbose"]);
        assert_eq!(unquote("plain"), "plain");
    }

    #[test]
    fn test_quote_for_shell_round_trip() {
        let quoted = quote_for_shell("a b");
        assert_eq!(quoted, "\"a\\ b\"");
        assert_eq!(unquote(&quoted), "a b");

        for value in ["C:\\Program Files\\x", "-fuse-ld=\"lld\"", "$HOME/a;b", "100%"] {
            assert_eq!(unquote(&quote_for_shell(value)), value);
        }
    }

    #[test]
    fn test_nested_quoted_value_survives_split() {
        // what `force_linker` produces once rendered as a cache entry
        let entry = format!(
            "-DCMAKE_EXE_LINKER_FLAGS_INIT={}",
            quote_for_shell(&format!("-fuse-ld={}", quote_for_shell("lld")))
        );
        assert_eq!(
            split_into_arguments([entry]),
            vec!["-D", "CMAKE_EXE_LINKER_FLAGS_INIT=-fuse-ld=\"lld\""]
        );
    }

    #[test]
    fn test_display_command_quotes_spaces() {
        let args = vec!["cmake".to_string(), "-S".to_string(), "my src".to_string()];
        assert_eq!(display_command(&args), "cmake -S \"my\\ src\"");
    }
}
