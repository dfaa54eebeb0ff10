//! Logging to stderr, stdout is reserved for the resolved URLs.

use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins when set. Otherwise each `-v` raises this crate's level.
pub fn init(verbose: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

const fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "warn,rai_relinker=info",
        _ => "warn,rai_relinker=debug",
    }
}

#[test]
fn verbosity_raises_only_this_crate() {
    assert_eq!(default_directive(0), "warn");
    assert_eq!(default_directive(1), "warn,rai_relinker=info");
    assert_eq!(default_directive(2), "warn,rai_relinker=debug");
    assert_eq!(default_directive(7), "warn,rai_relinker=debug");
}
