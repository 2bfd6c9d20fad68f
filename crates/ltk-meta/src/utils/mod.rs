use tracing_subscriber::EnvFilter;

#[macro_export]
macro_rules! println_pad {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        for __line in __s.lines() {
            println!("    {}", __line);
        }
    }};
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects `debug` for the
/// meta crates and `info` everywhere else.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "ltk_meta=debug,ltk_meta_cache=debug,info"
    } else {
        "ltk_meta=info,ltk_meta_cache=info,warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `count` followed by the singular or plural form of `noun`.
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "file"), "1 file");
        assert_eq!(plural(0, "file"), "0 files");
        assert_eq!(plural(3, "conflict"), "3 conflicts");
    }
}
