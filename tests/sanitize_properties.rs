//! Property-based tests for filename sanitizing and block naming.

use chat_page_export::namer::{ExtensionWhitelist, HintKind, UsedNameSet, name_block};
use chat_page_export::sanitize::{basename_like, extract_ext_from_token, sanitize};
use proptest::prelude::*;

const FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Sanitizing a sanitized name changes nothing.
    #[test]
    fn sanitize_is_idempotent(raw in any::<String>()) {
        let once = sanitize(&raw);
        prop_assert_eq!(sanitize(&once), once);
    }

    /// Output is never empty and never holds a path or reserved character.
    #[test]
    fn sanitize_is_total(raw in any::<String>()) {
        let out = sanitize(&raw);
        prop_assert!(!out.is_empty());
        prop_assert!(!out.contains(FORBIDDEN), "{:?} -> {:?}", raw, out);
        prop_assert!(!out.starts_with('_') && !out.ends_with('_'));
        prop_assert!(!out.contains("__"));
    }

    /// Path-looking input keeps only safe characters.
    #[test]
    fn sanitize_handles_paths(parts in prop::collection::vec("[a-z]{1,8}", 1..5), ext in "[a-z]{1,4}") {
        let raw = format!("{}.{}", parts.join("/"), ext);
        let out = sanitize(&raw);
        prop_assert_eq!(out, format!("{}.{}", parts.join("_"), ext));
    }

    #[test]
    fn basename_has_no_separators(token in any::<String>()) {
        let base = basename_like(&token);
        prop_assert!(!base.contains('/') && !base.contains('\\'));
        prop_assert_eq!(base.trim(), base.as_str());
    }

    #[test]
    fn extension_is_word_characters(token in any::<String>()) {
        let ext = extract_ext_from_token(&token);
        prop_assert!(ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    /// Within one run every assigned name is distinct (short names only,
    /// so the 180-character cut cannot merge two of them).
    #[test]
    fn assigned_names_are_unique(hints in prop::collection::vec("[a-c]{1,2}(\\.py)?", 1..40)) {
        let whitelist = ExtensionWhitelist::default();
        let mut used = UsedNameSet::new();
        let mut seen = std::collections::HashSet::new();
        for (i, hint) in hints.iter().enumerate() {
            let lines = vec![format!("checkpoint: {hint}")];
            let name = name_block(i + 1, &lines, "conv", &whitelist, &mut used);
            prop_assert_eq!(name.kind, HintKind::Checkpoint);
            prop_assert!(seen.insert(name.file_name.clone()), "duplicate {}", name.file_name);
        }
        prop_assert_eq!(used.len(), hints.len());
    }
}
