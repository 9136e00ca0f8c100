#![no_main]
#[cfg(not(windows))]
use libfuzzer_sys::fuzz_target;
#[cfg(not(windows))]
use sitepass::cli;

#[cfg(not(windows))]
fuzz_target!(|data: &[u8]| {
    // Split the input on NUL into an argument vector, the way the OS hands it over.
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let args: Vec<&str> = text.split('\0').collect();

    // Parsing must never panic, only return Result
    let _ = cli::is_usage_request(&args);
    if let Ok(options) = cli::parse_args(&args) {
        // A successful parse always carries a non-empty site taken verbatim from argv[0]
        assert!(!options.site.is_empty());
        assert_eq!(options.site, args[0]);
    }
});
