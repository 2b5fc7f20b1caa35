//! Property-based tests for tracegen-javagen.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use tracegen_javagen::codegen::{char_literal, string_literal};
use tracegen_javagen::prelude::*;

// === Identifier Property Tests ===

proptest! {
    /// Well-formed names that are not keywords are accepted.
    #[test]
    fn prop_valid_identifier_accepted(name in "[a-zA-Z_$][a-zA-Z0-9_$]{0,20}") {
        if !Identifier::RESERVED_WORDS.contains(&name.as_str()) {
            prop_assert!(Identifier::new(&name).is_ok(), "rejected: {}", name);
        }
    }

    #[test]
    fn prop_digit_start_rejected(digit in "[0-9]", suffix in "[a-zA-Z0-9_$]{0,10}") {
        let name = format!("{digit}{suffix}");
        prop_assert!(Identifier::new(&name).is_err());
    }

    #[test]
    fn prop_reserved_word_rejected(idx in 0..Identifier::RESERVED_WORDS.len()) {
        prop_assert!(Identifier::new(Identifier::RESERVED_WORDS[idx]).is_err());
    }

    #[test]
    fn prop_invalid_chars_rejected(
        prefix in "[a-zA-Z_$]{1,5}",
        bad in "[-!@#%^&*()+=\\[\\]{};':\"<>,./? ]",
        suffix in "[a-zA-Z0-9_$]{0,5}"
    ) {
        let name = format!("{prefix}{bad}{suffix}");
        prop_assert!(Identifier::new(&name).is_err());
    }

    /// Sanitizing anything yields something `Identifier::new` accepts.
    #[test]
    fn prop_sanitize_is_valid(raw in ".{0,24}") {
        let sanitized = Identifier::sanitize(&raw);
        prop_assert!(Identifier::new(sanitized.as_str()).is_ok(), "{:?}", sanitized);
    }
}

// === Literal Property Tests ===

proptest! {
    /// Rendered string literals never contain raw line breaks and stay quoted.
    #[test]
    fn prop_string_literal_single_line(s in any::<String>()) {
        let lit = string_literal(&s);
        prop_assert!(lit.starts_with('"') && lit.ends_with('"'));
        prop_assert!(!lit.contains('\n') && !lit.contains('\r'));
    }

    /// Every quote inside a rendered string literal is escaped.
    #[test]
    fn prop_string_literal_quotes_escaped(s in "[a-z\"\\\\]{0,16}") {
        let lit = string_literal(&s);
        let body = &lit[1..lit.len() - 1];
        let mut escaped = false;
        for c in body.chars() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else {
                prop_assert_ne!(c, '"');
            }
        }
        prop_assert!(!escaped);
    }

    #[test]
    fn prop_char_literal_bmp_quoted(c in (0u32..=0xFFFF).prop_filter_map("scalar value", char::from_u32)) {
        let lit = char_literal(c);
        prop_assert!(lit.starts_with('\'') && lit.ends_with('\''));
    }

    /// Integer literals round-trip through their rendered text.
    #[test]
    fn prop_int_literal_roundtrip(n in any::<i32>()) {
        let text = expr_to_string(&Expr::int(n));
        prop_assert_eq!(text.parse::<i32>().ok(), Some(n));
    }

    #[test]
    fn prop_long_literal_suffix(n in any::<i64>()) {
        let text = expr_to_string(&Expr::long(n));
        prop_assert!(text.ends_with('L'));
        prop_assert_eq!(text.trim_end_matches('L').parse::<i64>().ok(), Some(n));
    }
}

// === Rendering Property Tests ===

proptest! {
    /// Same IR renders to the same text.
    #[test]
    fn prop_render_deterministic(names in prop::collection::vec("[a-z][a-zA-Z0-9]{0,8}", 1..6)) {
        let mut class = ClassBuilder::new("GeneratedTest").unwrap();
        for (i, name) in names.iter().enumerate() {
            let method = MethodBuilder::new(format!("{name}{i}"))
                .unwrap()
                .annotate(Annotation::marker("Test").unwrap())
                .stmt(Stmt::local("int", "value", Expr::int(i as i32)).unwrap())
                .build();
            class = class.method(method);
        }
        let unit = CompilationUnitBuilder::new()
            .package("com.example")
            .unwrap()
            .class(class.build())
            .build();
        prop_assert_eq!(render(&unit), render(&unit.clone()));
    }

    /// Braces in rendered classes are balanced.
    #[test]
    fn prop_render_balanced_braces(count in 0usize..8) {
        let mut class = ClassBuilder::new("Balanced").unwrap();
        for i in 0..count {
            let method = MethodBuilder::new(format!("m{i}"))
                .unwrap()
                .stmt(Stmt::if_then(Expr::bool(true), vec![Stmt::ret()]))
                .build();
            class = class.method(method);
        }
        let source = render(&CompilationUnitBuilder::new().class(class.build()).build());
        let open = source.matches('{').count();
        let close = source.matches('}').count();
        prop_assert_eq!(open, close);
    }
}
