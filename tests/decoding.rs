// tests/decoding.rs

use proptest::prelude::*;
use vcs_runner::decode::{decode, encode, is_known_label};

#[test]
fn falls_back_in_order_when_primary_fails() {
    let bytes = b"caf\xe9";

    assert_eq!(
        decode(bytes, "utf-8", &["latin-1".to_string()]).unwrap(),
        "café"
    );

    let err = decode(bytes, "utf-8", &[]).unwrap_err();
    assert_eq!(err.attempted, vec!["utf-8".to_string()]);
}

#[test]
fn first_successful_fallback_wins() {
    // Valid Shift_JIS for "日本", and also decodable as latin-1.
    let bytes = b"\x93\xfa\x96\x7b";

    let sjis_first = decode(
        bytes,
        "utf-8",
        &["shift_jis".to_string(), "latin-1".to_string()],
    )
    .unwrap();
    assert_eq!(sjis_first, "日本");

    let latin_first = decode(
        bytes,
        "utf-8",
        &["latin-1".to_string(), "shift_jis".to_string()],
    )
    .unwrap();
    assert_ne!(latin_first, "日本");
}

#[test]
fn error_lists_every_attempt_including_unknown_labels() {
    let err = decode(
        b"\xff\xfe\xfd",
        "utf-8",
        &["no-such-encoding".to_string(), "utf_8".to_string()],
    )
    .unwrap_err();

    assert_eq!(err.attempted, vec!["utf-8", "no-such-encoding", "utf_8"]);
    assert!(err.to_string().contains("no-such-encoding"));
}

#[test]
fn labels_accept_common_spellings() {
    for label in ["utf-8", "UTF8", "utf_8", "latin-1", "latin1", "ISO-8859-1", "shift_jis"] {
        assert!(is_known_label(label), "{label} should be known");
    }
    assert!(!is_known_label("klingon"));
}

#[test]
fn stdin_text_is_encoded_with_the_job_encoding() {
    assert_eq!(encode("café", "utf-8"), "café".as_bytes());
    assert_eq!(encode("café", "latin-1"), b"caf\xe9");
    // Unknown label falls back to utf-8.
    assert_eq!(encode("café", "klingon"), "café".as_bytes());
}

#[test]
fn latin1_is_iso_8859_1_not_windows_1252() {
    let bytes = b"\x80\x9f";

    for label in ["latin-1", "iso-8859-1", "latin_1"] {
        assert_eq!(
            decode(bytes, label, &[]).unwrap(),
            "\u{80}\u{9f}",
            "{label}"
        );
    }
    assert_eq!(decode(bytes, "windows-1252", &[]).unwrap(), "\u{20ac}\u{178}");

    assert_eq!(encode("\u{80}", "latin-1"), b"\x80");
    assert_eq!(encode("\u{20ac}", "latin-1"), b"?");
}

proptest! {
    #[test]
    fn valid_utf8_never_needs_a_fallback(text in ".*") {
        let decoded = decode(text.as_bytes(), "utf-8", &[]).unwrap();
        prop_assert_eq!(decoded, text);
    }

    #[test]
    fn single_byte_fallback_always_succeeds(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let decoded = decode(&bytes, "utf-8", &["latin-1".to_string()]);
        prop_assert!(decoded.is_ok());
    }
}
