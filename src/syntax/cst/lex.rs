//! Lexer / tokenizer

use thiserror::Error;

use crate::syntax::{cst::SyntaxKind, span::ByteSpan};

/// Text span with syntactic kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: ByteSpan,
}

impl Token {
    pub fn slice<'s>(&self, src: &'s str) -> &'s str {
        self.span.slice(src)
    }
}

/// Lexical error type
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated string")]
    UnterminatedString { span: ByteSpan },
    #[error("unterminated character literal")]
    UnterminatedChar { span: ByteSpan },
    #[error("unterminated block comment")]
    UnterminatedBlockComment { span: ByteSpan },
    #[error("unexpected character")]
    UnexpectedCharacter { span: ByteSpan },
}

impl LexError {
    pub fn span(&self) -> ByteSpan {
        match self {
            LexError::UnterminatedString { span }
            | LexError::UnterminatedChar { span }
            | LexError::UnterminatedBlockComment { span }
            | LexError::UnexpectedCharacter { span } => *span,
        }
    }
}

/// Converts text into tokens. It doesn't fail even if the given text has
/// wrong syntax; offending spans come back as [`LexError`]s.
pub fn from_str(src: &str) -> (Vec<Token>, Vec<LexError>) {
    let lex = Lexer {
        src: src.as_bytes(),
        sp: ByteSpan::default(),
        tks: vec![],
        errs: vec![],
    };
    lex.run()
}

/// Stateful lexer that converts given string into simple [`Token`] s
///
/// The UTF-8 source is treated as bytes: everything the lexer branches on is
/// ASCII, and ASCII bytes never occur inside a multi-byte UTF-8 character.
#[derive(Debug)]
struct Lexer<'s> {
    src: &'s [u8],
    sp: ByteSpan,
    tks: Vec<Token>,
    errs: Vec<LexError>,
}

/// "Whitespace" = trivia
fn is_ws(c: u8) -> bool {
    matches!(c, b' ' | b'\n' | b'\t' | b'\r')
}

/// Bytes an operator token is made of
///
/// `-` is included: `->` and the comment opener `--` are carved out before
/// operator lexing runs.
fn is_op_byte(c: u8) -> bool {
    matches!(
        c,
        b'+' | b'-' | b'/' | b'*' | b'=' | b'.' | b'<' | b'>' | b':' | b'&' | b'|' | b'^' | b'?'
            | b'%' | b'!'
    )
}

fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_lower_start(c: u8) -> bool {
    c.is_ascii_lowercase()
}

fn is_upper_start(c: u8) -> bool {
    c.is_ascii_uppercase()
}

fn is_ident_body(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Lexing utilities
impl<'s> Lexer<'s> {
    fn consume_span(&mut self) -> ByteSpan {
        let sp = self.sp;
        self.sp.lo = self.sp.hi;
        sp
    }

    fn consume_span_as(&mut self, kind: SyntaxKind) -> Token {
        let span = self.consume_span();
        Token { kind, span }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.src.get(self.sp.hi).copied()
    }

    fn peek_byte_n(&self, n: usize) -> Option<u8> {
        self.src.get(self.sp.hi + n).copied()
    }

    /// The predicate returns if we should consume the peeked byte
    fn advance_if(&mut self, p: impl Fn(u8) -> bool) -> Option<()> {
        let peek = self.peek_byte()?;

        if p(peek) {
            self.sp.hi += 1;
            Some(())
        } else {
            None
        }
    }

    fn advance_while(&mut self, p: impl Fn(u8) -> bool) {
        while let Some(peek) = self.peek_byte() {
            if !p(peek) {
                return;
            }
            self.sp.hi += 1;
        }
    }

    fn starts_with(&self, prefix: &[u8]) -> bool {
        self.src[self.sp.hi..].starts_with(prefix)
    }
}

macro_rules! apply_syntax {
    ($obj:ident, $syn:tt) => {
        if let Some(tk) = $obj.$syn() {
            $obj.tks.push(tk);
            return;
        }
    };
    ($obj:ident, $($syn:tt),* $(,)?) => {
        $(apply_syntax!($obj, $syn);)*
    };
}

impl<'s> Lexer<'s> {
    pub fn run(mut self) -> (Vec<Token>, Vec<LexError>) {
        while self.sp.lo < self.src.len() {
            self.process_forward();
        }

        (self.tks, self.errs)
    }

    /// Lexes one token and stores it in `self.tks`
    fn process_forward(&mut self) {
        apply_syntax!(
            self,
            lex_ws,
            lex_block_comment,
            lex_line_comment,
            lex_delimiter,
            lex_operator,
            lex_num,
            lex_str,
            lex_char,
            lex_lower_ident_or_kwd,
            lex_upper_ident,
            lex_underscore,
        );

        // not a token we know; consume one UTF-8 character as an error token
        self.sp.hi += 1;
        self.advance_while(|b| b & 0xC0 == 0x80);
        self.errs.push(LexError::UnexpectedCharacter { span: self.sp });
        let tk = self.consume_span_as(SyntaxKind::Error);
        self.tks.push(tk);
    }
}

/// Grammars (`&mut self` → `Option<Token>`)
impl<'s> Lexer<'s> {
    /// Trivia
    fn lex_ws(&mut self) -> Option<Token> {
        self.advance_if(self::is_ws)?;
        self.advance_while(self::is_ws);
        Some(self.consume_span_as(SyntaxKind::Ws))
    }

    /// `{- ... -}`, nestable
    fn lex_block_comment(&mut self) -> Option<Token> {
        if !self.starts_with(b"{-") {
            return None;
        }

        self.sp.hi += 2;
        let mut depth = 1usize;

        while depth > 0 {
            if self.starts_with(b"{-") {
                self.sp.hi += 2;
                depth += 1;
            } else if self.starts_with(b"-}") {
                self.sp.hi += 2;
                depth -= 1;
            } else if self.sp.hi < self.src.len() {
                self.sp.hi += 1;
            } else {
                self.errs
                    .push(LexError::UnterminatedBlockComment { span: self.sp });
                break;
            }
        }

        Some(self.consume_span_as(SyntaxKind::Comment))
    }

    /// `-- ...` to the end of the line
    fn lex_line_comment(&mut self) -> Option<Token> {
        if !self.starts_with(b"--") {
            return None;
        }

        self.sp.hi += 2;
        self.advance_while(|b| b != b'\n');
        Some(self.consume_span_as(SyntaxKind::Comment))
    }

    /// Single-byte delimiters: `()[]{},\`
    fn lex_delimiter(&mut self) -> Option<Token> {
        let kind = match self.peek_byte()? {
            b'(' => SyntaxKind::LParen,
            b')' => SyntaxKind::RParen,
            b'[' => SyntaxKind::LBracket,
            b']' => SyntaxKind::RBracket,
            b'{' => SyntaxKind::LBrace,
            b'}' => SyntaxKind::RBrace,
            b',' => SyntaxKind::Comma,
            b'\\' => SyntaxKind::Backslash,
            _ => return None,
        };

        self.sp.hi += 1;
        Some(self.consume_span_as(kind))
    }

    /// A run of operator bytes, then classified by its exact text
    fn lex_operator(&mut self) -> Option<Token> {
        self.advance_if(self::is_op_byte)?;
        self.advance_while(self::is_op_byte);

        let s: &str = unsafe { std::str::from_utf8_unchecked(self.src) };
        let kind = match self.sp.slice(s) {
            "=" => SyntaxKind::Eq,
            "->" => SyntaxKind::Arrow,
            ":" => SyntaxKind::Colon,
            "|" => SyntaxKind::Pipe,
            "." => SyntaxKind::Dot,
            ".." => SyntaxKind::DotDot,
            _ => SyntaxKind::Operator,
        };

        Some(self.consume_span_as(kind))
    }

    /// Decimal with optional fraction/exponent, or `0x` hexadecimal
    fn lex_num(&mut self) -> Option<Token> {
        self.advance_if(self::is_digit)?;

        if self.sp.len() == 1
            && self.src[self.sp.lo] == b'0'
            && self.peek_byte() == Some(b'x')
        {
            self.sp.hi += 1;
            self.advance_while(|b| b.is_ascii_hexdigit());
            return Some(self.consume_span_as(SyntaxKind::Number));
        }

        self.advance_while(self::is_digit);

        // fraction, only when a digit follows the dot (`1..` is not a number)
        if self.peek_byte() == Some(b'.') && self.peek_byte_n(1).is_some_and(self::is_digit) {
            self.sp.hi += 1;
            self.advance_while(self::is_digit);
        }

        // exponent
        if matches!(self.peek_byte(), Some(b'e') | Some(b'E')) {
            let digits_at = match self.peek_byte_n(1) {
                Some(b'+') | Some(b'-') => 2,
                _ => 1,
            };
            if self.peek_byte_n(digits_at).is_some_and(self::is_digit) {
                self.sp.hi += digits_at;
                self.advance_while(self::is_digit);
            }
        }

        Some(self.consume_span_as(SyntaxKind::Number))
    }

    /// `"..."` with backslash escapes, or `"""..."""`
    fn lex_str(&mut self) -> Option<Token> {
        if self.peek_byte() != Some(b'"') {
            return None;
        }

        if self.starts_with(b"\"\"\"") {
            self.sp.hi += 3;
            loop {
                if self.starts_with(b"\"\"\"") {
                    self.sp.hi += 3;
                    break;
                }
                if self.sp.hi >= self.src.len() {
                    self.errs.push(LexError::UnterminatedString { span: self.sp });
                    break;
                }
                self.sp.hi += 1;
            }
            return Some(self.consume_span_as(SyntaxKind::StringLiteral));
        }

        self.sp.hi += 1;
        loop {
            match self.peek_byte() {
                Some(b'\\') => self.sp.hi += 2,
                Some(b'"') => {
                    self.sp.hi += 1;
                    break;
                }
                Some(_) => self.sp.hi += 1,
                None => {
                    self.sp.hi = self.src.len();
                    self.errs.push(LexError::UnterminatedString { span: self.sp });
                    break;
                }
            }
        }

        Some(self.consume_span_as(SyntaxKind::StringLiteral))
    }

    /// `'c'` with backslash escapes
    fn lex_char(&mut self) -> Option<Token> {
        if self.peek_byte() != Some(b'\'') {
            return None;
        }

        self.sp.hi += 1;
        loop {
            match self.peek_byte() {
                Some(b'\\') => self.sp.hi += 2,
                Some(b'\'') => {
                    self.sp.hi += 1;
                    break;
                }
                Some(b'\n') | None => {
                    self.sp.hi = usize::min(self.sp.hi, self.src.len());
                    self.errs.push(LexError::UnterminatedChar { span: self.sp });
                    break;
                }
                Some(_) => self.sp.hi += 1,
            }
        }

        Some(self.consume_span_as(SyntaxKind::CharLiteral))
    }

    /// Lower-case identifier, with keywords overridden to their own kinds
    fn lex_lower_ident_or_kwd(&mut self) -> Option<Token> {
        self.advance_if(self::is_lower_start)?;
        self.advance_while(self::is_ident_body);

        let mut tk = self.consume_span_as(SyntaxKind::LowerCaseIdentifier);

        let s: &str = unsafe { std::str::from_utf8_unchecked(self.src) };
        if let Some(kind) = SyntaxKind::from_keyword(tk.slice(s)) {
            tk.kind = kind;
        }

        Some(tk)
    }

    fn lex_upper_ident(&mut self) -> Option<Token> {
        self.advance_if(self::is_upper_start)?;
        self.advance_while(self::is_ident_body);
        Some(self.consume_span_as(SyntaxKind::UpperCaseIdentifier))
    }

    /// `_` alone is a wildcard; `_foo` is an identifier
    fn lex_underscore(&mut self) -> Option<Token> {
        self.advance_if(|b| b == b'_')?;

        if self.peek_byte().is_some_and(self::is_ident_body) {
            self.advance_while(self::is_ident_body);
            Some(self.consume_span_as(SyntaxKind::LowerCaseIdentifier))
        } else {
            Some(self.consume_span_as(SyntaxKind::Underscore))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::cst::SyntaxKind::*;

    fn kinds(src: &str) -> Vec<SyntaxKind> {
        let (tks, errs) = from_str(src);
        assert!(errs.is_empty(), "lex errors for `{}`: {:?}", src, errs);
        tks.iter()
            .map(|t| t.kind)
            .filter(|k| !k.is_trivia())
            .collect()
    }

    #[test]
    fn punctuation_and_operators() {
        assert_eq!(
            kinds("x = a |> b"),
            vec![LowerCaseIdentifier, Eq, LowerCaseIdentifier, Operator, LowerCaseIdentifier]
        );
        assert_eq!(kinds("->"), vec![Arrow]);
        assert_eq!(kinds(".."), vec![DotDot]);
        assert_eq!(kinds("=="), vec![Operator]);
        assert_eq!(kinds("List.map"), vec![UpperCaseIdentifier, Dot, LowerCaseIdentifier]);
    }

    #[test]
    fn keywords_override_identifiers() {
        assert_eq!(
            kinds("module exposing letter"),
            vec![ModuleKw, ExposingKw, LowerCaseIdentifier]
        );
        assert_eq!(kinds("if then else"), vec![IfKw, ThenKw, ElseKw]);
    }

    #[test]
    fn literals() {
        assert_eq!(kinds("42 3.14 0x1F 1e3"), vec![Number, Number, Number, Number]);
        assert_eq!(kinds(r#""hi \" there""#), vec![StringLiteral]);
        assert_eq!(kinds("\"\"\"multi\nline\"\"\""), vec![StringLiteral]);
        assert_eq!(kinds(r"'\n'"), vec![CharLiteral]);
    }

    #[test]
    fn comments_are_trivia() {
        let (tks, errs) = from_str("x -- line\n{- block {- nested -} -} y");
        assert!(errs.is_empty());
        let sig: Vec<SyntaxKind> = tks.iter().map(|t| t.kind).filter(|k| !k.is_trivia()).collect();
        assert_eq!(sig, vec![LowerCaseIdentifier, LowerCaseIdentifier]);
    }

    #[test]
    fn unterminated_string_is_reported() {
        let (_tks, errs) = from_str("x = \"oops");
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], LexError::UnterminatedString { .. }));
    }

    #[test]
    fn tokens_cover_the_text() {
        let src = "foo = bar Baz.quux 1.5";
        let (tks, _) = from_str(src);
        let total: usize = tks.iter().map(|t| t.span.len()).sum();
        assert_eq!(total, src.len());
    }
}
