//! Identifier casing shared by every generator.
//!
//! All derived names (types, members, packages) go through the functions in
//! this module so the same input string always yields the same identifier no
//! matter which artifact asks for it.

/// Domain abbreviations rewritten in the raw input before it is split;
/// matched ignoring ASCII case, so `3DS` and `3ds` both become `ThreeDs`.
pub const ABBREVIATIONS: &[(&str, &str)] = &[("3ds", "ThreeDs"), ("2fa", "TwoFa")];

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final",
    "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
    "interface", "long", "native", "new", "null", "package", "private", "protected", "public",
    "record", "return", "short", "static", "strictfp", "super", "switch", "synchronized",
    "this", "throw", "throws", "transient", "true", "try", "var", "void", "volatile", "while",
    "yield",
];

fn is_separator(c: char) -> bool {
    c == '-' || c == '_' || c.is_whitespace()
}

fn substitute_abbreviations(input: &str) -> String {
    ABBREVIATIONS.iter().fold(input.to_string(), |acc, (from, to)| {
        // ASCII lower-casing keeps byte offsets, so matches index `acc` directly.
        let lower = acc.to_ascii_lowercase();
        let mut out = String::with_capacity(acc.len());
        let mut last = 0;
        for (at, _) in lower.match_indices(from) {
            out.push_str(&acc[last..at]);
            out.push_str(to);
            last = at + from.len();
        }
        out.push_str(&acc[last..]);
        out
    })
}

fn join_segments(input: &str) -> String {
    substitute_abbreviations(input)
        .split(is_separator)
        .map(|segment| {
            let cleaned: String = segment.chars().filter(char::is_ascii_alphanumeric).collect();
            capitalize(&cleaned)
        })
        .collect()
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Whether `word` is reserved in the generated language.
pub fn is_reserved_word(word: &str) -> bool {
    JAVA_KEYWORDS.contains(&word)
}

/// Type-name casing: `payment-method` → `PaymentMethod`, `3ds_auth` → `ThreeDsAuth`.
///
/// Segments are split on `-`, `_` and whitespace, stripped of characters that
/// cannot appear in an identifier, and concatenated with their first letter
/// upper-cased. The rest of each segment keeps its casing, which makes the
/// function idempotent. Blank input yields `Default`.
pub fn type_case(input: &str) -> String {
    let mut joined = join_segments(input);
    // Joining can bring an abbreviation together (`3-ds` → `3Ds`); every
    // substitution drops a digit, so this ends.
    while substitute_abbreviations(&joined) != joined {
        joined = join_segments(&joined);
    }
    if joined.is_empty() {
        return "Default".to_string();
    }
    if joined.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("_{joined}");
    }
    joined
}

/// Member casing: the type-cased name with a lower-case first letter.
///
/// Reserved words get a trailing underscore.
pub fn member_case(input: &str) -> String {
    let type_name = type_case(input);
    let mut chars = type_name.chars();
    let member = match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    };
    if is_reserved_word(&member) {
        format!("{member}_")
    } else {
        member
    }
}

/// Package casing: lower-cased, abbreviations expanded, non-alphanumerics removed.
///
/// A result that is a reserved word (for example the fallback tag `default`)
/// gets a `pkg` suffix; one that starts with a digit gets a `p` prefix.
pub fn package_case(input: &str) -> String {
    let lowered: String = type_case(input)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if is_reserved_word(&lowered) {
        format!("{lowered}pkg")
    } else if lowered.starts_with(|c: char| c.is_ascii_digit()) {
        format!("p{lowered}")
    } else {
        lowered
    }
}

/// Make free text safe to embed inside a block comment.
pub fn sanitize_comment(text: &str) -> String {
    text.replace("*/", "*\\/")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim()
        .to_string()
}

/// Escape text for a double-quoted string literal.
pub fn escape_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_case() {
        assert_eq!(type_case("payment-method"), "PaymentMethod");
        assert_eq!(type_case("card_details"), "CardDetails");
        assert_eq!(type_case("processPayment"), "ProcessPayment");
        assert_eq!(type_case("  line  items "), "LineItems");
        assert_eq!(type_case(""), "Default");
        assert_eq!(type_case("   "), "Default");
        assert_eq!(type_case("v2.payments"), "V2payments");
        assert_eq!(type_case("2023-report"), "_2023Report");
    }

    #[test]
    fn test_abbreviations() {
        assert_eq!(type_case("3ds-authentication"), "ThreeDsAuthentication");
        assert_eq!(type_case("verify_2fa"), "VerifyTwoFa");
        assert_eq!(package_case("3ds Authentication"), "threedsauthentication");
        assert_eq!(package_case("2fa"), "twofa");
    }

    #[test]
    fn test_member_case() {
        assert_eq!(member_case("ProcessPayment"), "processPayment");
        assert_eq!(member_case("transaction-id"), "transactionId");
        assert_eq!(member_case("class"), "class_");
    }

    #[test]
    fn test_package_case() {
        assert_eq!(package_case("Transactions"), "transactions");
        assert_eq!(package_case("Card Payments!"), "cardpayments");
        assert_eq!(package_case("default"), "defaultpkg");
        assert_eq!(package_case(""), "defaultpkg");
    }

    #[test]
    fn test_type_case_idempotent_samples() {
        for input in ["a3-ds", "3.ds", "x-3ds-2fa", "Already Cased", "__x__", "ß-key"] {
            let once = type_case(input);
            assert_eq!(type_case(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn test_sanitize_comment() {
        assert_eq!(sanitize_comment(" ends */ here\r\n"), "ends *\\/ here");
    }

    #[test]
    fn test_escape_string_literal() {
        assert_eq!(escape_string_literal(r#"^\d{4}"$"#), r#"^\\d{4}\"$"#);
    }
}
