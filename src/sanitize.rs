use lazy_regex::regex;

const REPLACEMENT: &str = "!";

const MAX_FILENAME_BYTES: usize = 248;

const WINDOWS_RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Turn a video name into a file name usable on both Unix and Windows.
pub fn sanitize_filename(name: &str) -> String {
    let name = truncate(name, MAX_FILENAME_BYTES);
    let mut sanitized = regex!(r#"[<>:"/\\|?*\x00-\x1F]"#)
        .replace_all(name, REPLACEMENT)
        .into_owned();

    let trimmed = sanitized.trim();
    if WINDOWS_RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(trimmed))
    {
        sanitized += REPLACEMENT;
    }
    sanitized
}

fn truncate(name: &str, max_bytes: usize) -> &str {
    if name.len() <= max_bytes {
        return name;
    }
    let end = (0..=max_bytes)
        .rev()
        .find(|index| name.is_char_boundary(*index))
        .unwrap_or(0);
    &name[..end]
}

#[test]
fn keeps_plain_names() {
    assert_eq!(
        sanitize_filename("Sanremo 2020 - Vince Diodato"),
        "Sanremo 2020 - Vince Diodato"
    );
    assert_eq!(sanitize_filename("Perché è così"), "Perché è così");
}

#[test]
fn replaces_banned_chars() {
    assert_eq!(
        sanitize_filename(r#"a<b>c:d"e/f\g|h?i*j"#),
        "a!b!c!d!e!f!g!h!i!j"
    );
    assert_eq!(sanitize_filename("Narcos: III / ep8?"), "Narcos! III ! ep8!");
}

#[test]
fn replaces_control_chars() {
    assert_eq!(sanitize_filename("tab\there\0nul\u{1f}"), "tab!here!nul!");
    assert_eq!(sanitize_filename("del\u{7f}"), "del\u{7f}");
}

#[test]
fn marks_reserved_names() {
    assert_eq!(sanitize_filename("CON"), "CON!");
    assert_eq!(sanitize_filename("lpt1"), "lpt1!");
    assert_eq!(sanitize_filename("  NUL "), "  NUL !");
    assert_eq!(sanitize_filename("CONSOLE"), "CONSOLE");
}

#[test]
fn truncates_on_char_boundary() {
    let long = "a".repeat(MAX_FILENAME_BYTES + 100);
    assert_eq!(sanitize_filename(&long).len(), MAX_FILENAME_BYTES);

    // 'è' is two bytes, the limit falls in the middle of the last one
    let long = format!("a{}", "è".repeat(MAX_FILENAME_BYTES));
    let sanitized = sanitize_filename(&long);
    assert_eq!(sanitized.len(), MAX_FILENAME_BYTES - 1);
    assert!(sanitized.ends_with('è'));
}
