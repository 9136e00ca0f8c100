//! Property-based tests for the command-line grammar and the fingerprint.

use proptest::prelude::*;
use sitepass::cli::{parse_args, ParsedOptions};
use sitepass::engine::Charset;
use sitepass::fingerprint::Fingerprint;
use sitepass::ErrorKind;

fn charset_strategy() -> impl Strategy<Value = Charset> {
    prop_oneof![
        Just(Charset::Lowercase),
        Just(Charset::Uppercase),
        Just(Charset::Digits),
        Just(Charset::Symbols),
    ]
}

fn long_name(charset: Charset) -> &'static str {
    match charset {
        Charset::Lowercase => "--lowercase",
        Charset::Uppercase => "--uppercase",
        Charset::Digits => "--digits",
        Charset::Symbols => "--symbols",
    }
}

/// Site-like text that never starts with '-'.
fn word_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9.@_]{0,15}"
}

proptest! {
    /// A short cluster and the equivalent long options parse to the same record.
    #[test]
    fn short_and_long_forms_are_equivalent(
        site in word_strategy(),
        login in proptest::option::of(word_strategy()),
        charsets in proptest::collection::vec(charset_strategy(), 0..6),
        length in proptest::option::of(-50i64..100),
        counter in proptest::option::of(-5i64..1000),
        print in any::<bool>(),
        attached in any::<bool>(),
    ) {
        let mut short = vec![site.clone()];
        let mut long = vec![site.clone()];
        if let Some(login) = &login {
            short.push(login.clone());
            long.push(login.clone());
        }

        let mut cluster: String = charsets.iter().map(|c| c.flag()).collect();
        if print {
            cluster.push('p');
            long.push("--print".into());
        }
        for c in &charsets {
            long.push(long_name(*c).into());
        }
        if !cluster.is_empty() {
            short.push(format!("-{cluster}"));
        }

        for (flag, name, value) in [('n', "--length", length), ('c', "--counter", counter)] {
            if let Some(value) = value {
                if attached {
                    short.push(format!("-{flag}{value}"));
                } else {
                    short.push(format!("-{flag}"));
                    short.push(value.to_string());
                }
                long.push(name.into());
                long.push(value.to_string());
            }
        }

        let short = parse_args(&short).expect("short form parses");
        let long = parse_args(&long).expect("long form parses");
        prop_assert_eq!(&short, &long);

        let mut expected = ParsedOptions::new(site);
        if let Some(login) = login {
            expected = expected.with_login(login);
        }
        for c in charsets {
            expected = expected.with_charset(c);
        }
        if let Some(n) = length {
            expected = expected.with_length(n);
        }
        if let Some(n) = counter {
            expected = expected.with_counter(n);
        }
        if print {
            expected = expected.with_print();
        }
        prop_assert_eq!(short, expected);
    }

    /// One bad token anywhere fails the whole parse.
    #[test]
    fn a_single_bad_token_fails_everything(
        position in 0usize..4,
        bad in prop_oneof![
            Just("-x".to_string()),
            Just("--bogus".to_string()),
            Just("stray".to_string()),
            Just("-".to_string()),
            Just("-n12x".to_string()),
        ],
    ) {
        let mut args: Vec<String> = ["site.example", "-ld", "--length", "20", "-p"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        // Insert after the site, never between --length and its value.
        let slots = [1usize, 2, 4, 5];
        args.insert(slots[position], bad);
        if slots[position] == 1 && !args[1].starts_with('-') {
            // A leading bare word would be the login; put a flag before it.
            args.insert(1, "-u".to_string());
        }

        let err = parse_args(&args).expect_err("bad token must fail");
        prop_assert_eq!(err.kind(), ErrorKind::Option);
    }

    /// Trailing junk after digits is never silently dropped.
    #[test]
    fn numeric_values_must_be_whole(n in 0u32..1000, junk in "[a-zA-Z ]{1,3}") {
        let args = ["site.example".to_string(), "--length".to_string(), format!("{n}{junk}")];
        prop_assert!(parse_args(&args).is_err());
        let args = ["site.example".to_string(), format!("-c{n}{junk}")];
        prop_assert!(parse_args(&args).is_err());
    }

    /// The fingerprint is a pure function of the master password.
    #[test]
    fn fingerprint_is_deterministic(secret in proptest::collection::vec(any::<u8>(), 0..64)) {
        prop_assert_eq!(Fingerprint::of(&secret), Fingerprint::of(&secret));
        prop_assert_eq!(Fingerprint::of(&secret).glyphs().len(), 3);
    }
}
