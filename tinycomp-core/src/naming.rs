//! Generated JavaScript identifiers.
//!
//! Ids map to letter sequences in bijective base 26: 1 is `a`, 26 is `z`,
//! 27 is `aa`. Sequences that would clash with a JavaScript reserved word,
//! or a global the generated program uses, get a trailing `_`.

const RESERVED: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "console", "const", "continue",
    "debugger", "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false",
    "finally", "for", "function", "if", "implements", "import", "in", "instanceof", "interface",
    "let", "new", "null", "package", "private", "process", "protected", "public", "require",
    "return", "static", "super", "switch", "this", "throw", "true", "try", "typeof", "undefined",
    "var", "void", "while", "with", "yield",
];

/// Identifier for `id`. Ids start at 1.
pub fn ident(id: usize) -> String {
    let mut letters = Vec::new();
    let mut rest = id;
    while rest > 0 {
        let digit = (rest - 1) % 26;
        letters.push(char::from(b'a' + digit as u8));
        rest = (rest - 1) / 26;
    }
    let name: String = letters.into_iter().rev().collect();
    if is_reserved(&name) {
        format!("{name}_")
    } else {
        name
    }
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inverse of the letter sequence, for checking the numbering.
    fn id_of(name: &str) -> usize {
        name.trim_end_matches('_')
            .bytes()
            .fold(0, |acc, byte| acc * 26 + usize::from(byte - b'a' + 1))
    }

    #[test]
    fn bijective_base_26() {
        assert_eq!(ident(1), "a");
        assert_eq!(ident(26), "z");
        assert_eq!(ident(27), "aa");
        assert_eq!(ident(52), "az");
        assert_eq!(ident(53), "ba");
        assert_eq!(ident(702), "zz");
        assert_eq!(ident(703), "aaa");
    }

    #[test]
    fn every_id_round_trips() {
        for id in 1..2000 {
            assert_eq!(id_of(&ident(id)), id);
        }
    }

    #[test]
    fn reserved_words_get_suffix() {
        // "do" is 4 * 26 + 15, "if" is 9 * 26 + 6.
        assert_eq!(ident(4 * 26 + 15), "do_");
        assert_eq!(ident(9 * 26 + 6), "if_");
        assert!(!is_reserved("ab"));
    }
}
