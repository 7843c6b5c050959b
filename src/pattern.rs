//! Compiles the optional `subwords` pattern string into the token list the
//! search walk consumes left to right.

/// What a single pattern token has to line up with during the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Leading `$`: the match must begin at the root.
    Root,
    /// Trailing `$`: a word must end exactly here.
    Terminal,
    /// `?`: any single letter at this position.
    Any,
    /// A specific letter, folded to uppercase.
    Letter(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub target: Target,
    pub required: bool,
}

impl Token {
    fn required(target: Target) -> Self {
        Self {
            target,
            required: true,
        }
    }

    fn optional(target: Target) -> Self {
        Self {
            target,
            required: false,
        }
    }
}

/// Parses a pattern of the form `$?[A-Z?]*$?` (case-insensitive) into
/// tokens. An absent or empty pattern compiles to no tokens; anything
/// outside the grammar yields `None`.
///
/// Without a start anchor the first character compiles to an optional
/// token, so the walk may accept any number of prefix letters before the
/// pattern starts matching.
pub fn compile(pattern: Option<&str>) -> Option<Vec<Token>> {
    let pattern = match pattern {
        None => return Some(Vec::new()),
        Some(pattern) => pattern.to_ascii_uppercase(),
    };

    let mut rest = pattern.as_bytes();
    let mut tokens = Vec::with_capacity(rest.len() + 1);

    if rest.first() == Some(&b'$') {
        tokens.push(Token::required(Target::Root));
        rest = &rest[1..];
    }
    let anchored_end = rest.last() == Some(&b'$');
    if anchored_end {
        rest = &rest[..rest.len() - 1];
    }

    for (i, &ch) in rest.iter().enumerate() {
        let target = match ch {
            b'?' => Target::Any,
            b'A'..=b'Z' => Target::Letter(ch),
            _ => return None,
        };
        if i == 0 && tokens.is_empty() {
            tokens.push(Token::optional(target));
        } else {
            tokens.push(Token::required(target));
        }
    }

    if anchored_end {
        tokens.push(Token::required(Target::Terminal));
    }
    Some(tokens)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_pattern_compiles_to_nothing() {
        assert_eq!(compile(None), Some(Vec::new()));
        assert_eq!(compile(Some("")), Some(Vec::new()));
    }

    #[test]
    fn first_character_is_optional() {
        let tokens = compile(Some("CAT")).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::optional(Target::Letter(b'C')),
                Token::required(Target::Letter(b'A')),
                Token::required(Target::Letter(b'T')),
            ]
        );
    }

    #[test]
    fn anchors_compile_to_root_and_terminal() {
        let tokens = compile(Some("$CAT$")).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::required(Target::Root),
                Token::required(Target::Letter(b'C')),
                Token::required(Target::Letter(b'A')),
                Token::required(Target::Letter(b'T')),
                Token::required(Target::Terminal),
            ]
        );
    }

    #[test]
    fn start_anchor_makes_first_letter_required() {
        let tokens = compile(Some("$AB")).unwrap();
        assert!(tokens.iter().all(|token| token.required));
    }

    #[test]
    fn question_mark_compiles_to_any() {
        let tokens = compile(Some("C?T")).unwrap();
        assert_eq!(tokens[1], Token::required(Target::Any));
    }

    #[test]
    fn lowercase_is_folded() {
        assert_eq!(compile(Some("cat")), compile(Some("CAT")));
    }

    #[test]
    fn lone_anchor_is_a_start_anchor() {
        assert_eq!(
            compile(Some("$")),
            Some(vec![Token::required(Target::Root)])
        );
        assert_eq!(
            compile(Some("$$")),
            Some(vec![
                Token::required(Target::Root),
                Token::required(Target::Terminal),
            ])
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(compile(Some("bad\\pattern")), None);
        assert_eq!(compile(Some("A$B")), None);
        assert_eq!(compile(Some("C4T")), None);
    }
}
