//! Command-line grammar.
//!
//! `<site> [login] [options]`, where options are long (`--length 20`) or clustered short
//! flags (`-lds -n20`). Parsing is all-or-nothing: the first bad token discards everything.

use crate::engine::{Charset, CharsetSelection};
use crate::error::Error;
use std::str::Chars;
use tracing::debug;

pub const USAGE: &str = "\
Usage: sitepass <site> [login] [options]
Options:
  --lowercase, -l     include lowercase characters
  --uppercase, -u     include uppercase characters
  --digits, -d        include digits
  --symbols, -s       include symbols

  --length, -n        number of characters (default 16)
  --counter, -c       number to add to salt (default 1)

  --print, -p         print instead of copying to clipboard.
";

/// Options as typed by the user. Unset fields stay `None` so that an explicit zero is
/// distinguishable from "not given".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOptions {
    pub site: String,
    pub login: String,
    pub charsets: Option<CharsetSelection>,
    pub length: Option<i64>,
    pub counter: Option<i64>,
    pub print: bool,
}

impl ParsedOptions {
    pub fn new(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            login: String::new(),
            charsets: None,
            length: None,
            counter: None,
            print: false,
        }
    }

    #[must_use]
    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = login.into();
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charsets = Some(self.charsets.unwrap_or_default().with(charset));
        self
    }

    #[must_use]
    pub fn with_length(mut self, length: i64) -> Self {
        self.length = Some(length);
        self
    }

    #[must_use]
    pub fn with_counter(mut self, counter: i64) -> Self {
        self.counter = Some(counter);
        self
    }

    #[must_use]
    pub fn with_print(mut self) -> Self {
        self.print = true;
        self
    }
}

/// True when the invocation only asks for usage: no arguments, or a lone `-h`/`--help`.
pub fn is_usage_request<S: AsRef<str>>(args: &[S]) -> bool {
    match args {
        [] => true,
        [only] => matches!(only.as_ref(), "-h" | "--help"),
        _ => false,
    }
}

/// Parse the arguments that follow the program name.
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<ParsedOptions, Error> {
    let mut tokens = args.iter().map(|arg| arg.as_ref()).peekable();

    let site = tokens
        .next()
        .filter(|site| !site.is_empty())
        .ok_or_else(|| option_error("missing site"))?;
    let mut options = ParsedOptions::new(site);

    if let Some(login) = tokens.next_if(|token| !token.starts_with('-')) {
        options = options.with_login(login);
    }

    let mut lexer = Lexer::new(tokens);
    while let Some(flag) = lexer.next_flag()? {
        options = match flag {
            Flag::Long(name) => apply_long(options, name, &mut lexer)?,
            Flag::Short(ch) => apply_short(options, ch, &mut lexer)?,
        };
    }
    Ok(options)
}

fn apply_long<'a, I>(
    options: ParsedOptions,
    name: &str,
    lexer: &mut Lexer<'a, I>,
) -> Result<ParsedOptions, Error>
where
    I: Iterator<Item = &'a str>,
{
    let options = match name {
        "lowercase" => options.with_charset(Charset::Lowercase),
        "uppercase" => options.with_charset(Charset::Uppercase),
        "digits" => options.with_charset(Charset::Digits),
        "symbols" => options.with_charset(Charset::Symbols),
        "print" => options.with_print(),
        "length" => options.with_length(parse_number(lexer.value()?)?),
        "counter" => options.with_counter(parse_number(lexer.value()?)?),
        _ => return Err(option_error("unknown long option")),
    };
    Ok(options)
}

fn apply_short<'a, I>(
    options: ParsedOptions,
    ch: char,
    lexer: &mut Lexer<'a, I>,
) -> Result<ParsedOptions, Error>
where
    I: Iterator<Item = &'a str>,
{
    let options = match ch {
        'l' => options.with_charset(Charset::Lowercase),
        'u' => options.with_charset(Charset::Uppercase),
        'd' => options.with_charset(Charset::Digits),
        's' => options.with_charset(Charset::Symbols),
        'p' => options.with_print(),
        'n' => options.with_length(parse_number(lexer.value()?)?),
        'c' => options.with_counter(parse_number(lexer.value()?)?),
        _ => return Err(option_error("unknown short option")),
    };
    Ok(options)
}

/// Decimal integer that must consume the whole token. Range checks happen later.
fn parse_number(raw: &str) -> Result<i64, Error> {
    raw.parse::<i64>()
        .map_err(|_| option_error("option value is not a decimal integer"))
}

fn option_error(reason: &'static str) -> Error {
    debug!(reason, "rejecting command line");
    Error::Option { reason }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag<'a> {
    Long(&'a str),
    Short(char),
}

/// Where the lexer stands: between arguments, or inside a short-option cluster.
enum Mode<'a> {
    Boundary,
    Cluster(Chars<'a>),
}

/// Two-level cursor: arguments on the outside, characters of a short cluster on the inside.
struct Lexer<'a, I: Iterator<Item = &'a str>> {
    args: I,
    mode: Mode<'a>,
}

impl<'a, I: Iterator<Item = &'a str>> Lexer<'a, I> {
    fn new(args: I) -> Self {
        Self {
            args,
            mode: Mode::Boundary,
        }
    }

    fn next_flag(&mut self) -> Result<Option<Flag<'a>>, Error> {
        if let Mode::Cluster(chars) = &mut self.mode {
            if let Some(ch) = chars.next() {
                return Ok(Some(Flag::Short(ch)));
            }
            self.mode = Mode::Boundary;
        }

        let Some(token) = self.args.next() else {
            return Ok(None);
        };
        if let Some(name) = token.strip_prefix("--") {
            return Ok(Some(Flag::Long(name)));
        }
        let Some(cluster) = token.strip_prefix('-') else {
            return Err(option_error("expected an option"));
        };
        let mut chars = cluster.chars();
        let Some(first) = chars.next() else {
            return Err(option_error("bare '-' is not an option"));
        };
        self.mode = Mode::Cluster(chars);
        Ok(Some(Flag::Short(first)))
    }

    /// Value for the flag just returned: the rest of the current cluster if any, otherwise the
    /// whole next argument. Either way the cluster ends here.
    fn value(&mut self) -> Result<&'a str, Error> {
        if let Mode::Cluster(chars) = std::mem::replace(&mut self.mode, Mode::Boundary) {
            let inline = chars.as_str();
            if !inline.is_empty() {
                return Ok(inline);
            }
        }
        self.args
            .next()
            .ok_or_else(|| option_error("option requires a value"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<ParsedOptions, Error> {
        parse_args(args)
    }

    fn rejects(args: &[&str]) {
        let err = parse(args).expect_err(&format!("{args:?} should fail"));
        assert_eq!(err.kind(), ErrorKind::Option, "{args:?}");
    }

    #[test]
    fn site_only() {
        assert_eq!(parse(&["site.example"]).unwrap(), ParsedOptions::new("site.example"));
    }

    #[test]
    fn site_login_and_cluster_with_detached_value() {
        let parsed = parse(&["site.example", "alice", "-lds", "-n", "20"]).unwrap();
        assert_eq!(
            parsed,
            ParsedOptions::new("site.example")
                .with_login("alice")
                .with_charset(Charset::Lowercase)
                .with_charset(Charset::Digits)
                .with_charset(Charset::Symbols)
                .with_length(20)
        );
        assert!(!parsed.print);
    }

    #[test]
    fn short_and_long_forms_agree() {
        let short = parse(&["site.example", "-lds", "-n20", "-c3", "-p"]).unwrap();
        let long = parse(&[
            "site.example",
            "--lowercase",
            "--digits",
            "--symbols",
            "--length",
            "20",
            "--counter",
            "3",
            "--print",
        ])
        .unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn inline_value_ends_cluster() {
        let parsed = parse(&["site.example", "-ln12", "-u"]).unwrap();
        assert_eq!(parsed.length, Some(12));
        assert_eq!(
            parsed.charsets,
            Some(
                CharsetSelection::empty()
                    .with(Charset::Lowercase)
                    .with(Charset::Uppercase)
            )
        );
    }

    #[test]
    fn detached_value_may_look_like_a_flag() {
        let parsed = parse(&["site.example", "-c", "-5"]).unwrap();
        assert_eq!(parsed.counter, Some(-5));
        let parsed = parse(&["site.example", "--length", "-5"]).unwrap();
        assert_eq!(parsed.length, Some(-5));
    }

    #[test]
    fn login_is_skipped_when_first_option_follows_site() {
        let parsed = parse(&["site.example", "-p"]).unwrap();
        assert_eq!(parsed.login, "");
        assert!(parsed.print);
    }

    #[test]
    fn repeated_flags_accumulate() {
        let parsed = parse(&["site.example", "-n", "8", "--length", "10", "-ll"]).unwrap();
        assert_eq!(parsed.length, Some(10));
        assert_eq!(
            parsed.charsets,
            Some(CharsetSelection::empty().with(Charset::Lowercase))
        );
    }

    #[test]
    fn missing_values_fail() {
        rejects(&["site.example", "-n"]);
        rejects(&["site.example", "-ldc"]);
        rejects(&["site.example", "--length"]);
        rejects(&["site.example", "alice", "--counter"]);
    }

    #[test]
    fn values_must_be_fully_consumed() {
        rejects(&["site.example", "--length", "12x"]);
        rejects(&["site.example", "-n12l"]);
        rejects(&["site.example", "-n", ""]);
        rejects(&["site.example", "-c", " 3"]);
        rejects(&["site.example", "-n", "99999999999999999999"]);
    }

    #[test]
    fn malformed_tokens_fail() {
        rejects(&[]);
        rejects(&[""]);
        rejects(&["site.example", "alice", "bob"]);
        rejects(&["site.example", "-"]);
        rejects(&["site.example", "--"]);
        rejects(&["site.example", "-l-"]);
        rejects(&["site.example", "-lx"]);
        rejects(&["site.example", "--colour"]);
        rejects(&["site.example", "-l", "stray"]);
    }

    #[test]
    fn usage_requests() {
        assert!(is_usage_request::<&str>(&[]));
        assert!(is_usage_request(&["--help"]));
        assert!(is_usage_request(&["-h"]));
        assert!(!is_usage_request(&["site.example"]));
        assert!(!is_usage_request(&["site.example", "--help"]));
    }
}
