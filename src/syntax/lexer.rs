/// Coarse token classes; enough to find declarations without a grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    /// String, character, text block or numeric literal.
    Literal,
    Punct,
    Whitespace,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl Token<'_> {
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct && self.text.len() == c.len_utf8() && self.text.starts_with(c)
    }

    pub fn is_ident(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Split Java source into tokens whose texts concatenate back to `src`.
///
/// Unterminated comments and literals run to the end of the input (strings and
/// characters to the end of the line) instead of failing.
pub fn tokenize(src: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = src;
    while let Some(c) = rest.chars().next() {
        let (kind, len) = if c.is_whitespace() {
            (TokenKind::Whitespace, span_while(rest, char::is_whitespace))
        } else if rest.starts_with("//") {
            (TokenKind::Comment, rest.find('\n').unwrap_or(rest.len()))
        } else if rest.starts_with("/*") {
            (TokenKind::Comment, rest[2..].find("*/").map_or(rest.len(), |i| i + 4))
        } else if rest.starts_with("\"\"\"") {
            (TokenKind::Literal, text_block_len(rest))
        } else if c == '"' || c == '\'' {
            (TokenKind::Literal, quoted_len(rest, c))
        } else if is_ident_start(c) {
            (TokenKind::Ident, span_while(rest, is_ident_continue))
        } else if c.is_ascii_digit() {
            (
                TokenKind::Literal,
                span_while(rest, |c| c.is_ascii_alphanumeric() || c == '.' || c == '_'),
            )
        } else {
            (TokenKind::Punct, c.len_utf8())
        };
        let (text, tail) = rest.split_at(len);
        tokens.push(Token { kind, text });
        rest = tail;
    }
    tokens
}

fn span_while(s: &str, pred: impl Fn(char) -> bool) -> usize {
    s.char_indices()
        .find(|&(_, c)| !pred(c))
        .map_or(s.len(), |(i, _)| i)
}

fn quoted_len(s: &str, quote: char) -> usize {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        match c {
            '\n' => return i,
            '\\' if !escaped => escaped = true,
            c if c == quote && !escaped => return i + c.len_utf8(),
            _ => escaped = false,
        }
    }
    s.len()
}

fn text_block_len(s: &str) -> usize {
    let body = &s[3..];
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if body[i..].starts_with("\"\"\"") {
            return i + 6;
        }
    }
    s.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, &str)> {
        tokenize(src).into_iter().map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn test_round_trips() {
        let src = "package a.b;\n/* c */ class X { String s = \"a\\\"}\"; char q = '\\''; // tail\n}";
        let joined: String = tokenize(src).iter().map(|t| t.text).collect();
        assert_eq!(joined, src);
    }

    #[test]
    fn test_literals_hide_braces() {
        let tokens = kinds("x(\"{)\")");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Ident, "x"),
                (TokenKind::Punct, "("),
                (TokenKind::Literal, "\"{)\""),
                (TokenKind::Punct, ")"),
            ]
        );
    }

    #[test]
    fn test_text_block() {
        let src = "s = \"\"\"\n  <a>\"</a>\n\"\"\";";
        let tokens = tokenize(src);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Literal && t.text.ends_with("\"\"\"")));
        assert_eq!(tokens.last().map(|t| t.text), Some(";"));
    }

    #[test]
    fn test_unterminated_comment_runs_to_end() {
        let tokens = kinds("a /* never closed");
        assert_eq!(tokens.last(), Some(&(TokenKind::Comment, "/* never closed")));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("1_000L")[0], (TokenKind::Literal, "1_000L"));
        assert_eq!(kinds("0.5f")[0], (TokenKind::Literal, "0.5f"));
    }
}
