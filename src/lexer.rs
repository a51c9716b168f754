use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

use crate::limits::CompilerLimits;

// Token types

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Type,
    Extends,
    Globals,
    EndGlobals,
    Constant,
    Native,
    Array,
    And,
    Or,
    Not,
    Takes,
    Returns,
    Nothing,
    Function,
    EndFunction,
    Local,
    Set,
    Call,
    If,
    Then,
    ElseIf,
    Else,
    EndIf,
    Loop,
    EndLoop,
    ExitWhen,
    Return,
    Debug,
    True,
    False,
    Null,

    // Identifiers and Literals
    Identifier(String),
    Integer(i32),
    Real(f32),
    String(String),
    FourCC([u8; 4]),

    // Operators
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    Assign,    // =
    EqEq,      // ==
    NotEq,     // !=
    Lt,        // <
    LtEq,      // <=
    Gt,        // >
    GtEq,      // >=
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    Comma,     // ,

    // Special
    Newline,
    Eof,
}

impl TokenKind {
    /// Short description used in parse error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("identifier '{}'", name),
            TokenKind::Integer(value) => format!("integer {}", value),
            TokenKind::Real(value) => format!("real {}", value),
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::FourCC(_) => "four-character code".to_string(),
            TokenKind::Newline => "newline".to_string(),
            TokenKind::Eof => "end of file".to_string(),
            other => match keyword_text(other).or_else(|| operator_text(other)) {
                Some(text) => format!("'{}'", text),
                None => format!("{:?}", other),
            },
        }
    }
}

fn keyword_text(kind: &TokenKind) -> Option<&'static str> {
    KEYWORDS
        .iter()
        .find(|(_, keyword)| keyword == kind)
        .map(|(text, _)| *text)
}

fn operator_text(kind: &TokenKind) -> Option<&'static str> {
    let text = match kind {
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Star => "*",
        TokenKind::Slash => "/",
        TokenKind::Assign => "=",
        TokenKind::EqEq => "==",
        TokenKind::NotEq => "!=",
        TokenKind::Lt => "<",
        TokenKind::LtEq => "<=",
        TokenKind::Gt => ">",
        TokenKind::GtEq => ">=",
        TokenKind::LParen => "(",
        TokenKind::RParen => ")",
        TokenKind::LBracket => "[",
        TokenKind::RBracket => "]",
        TokenKind::Comma => ",",
        _ => return None,
    };
    Some(text)
}

const KEYWORDS: [(&str, TokenKind); 31] = [
    ("type", TokenKind::Type),
    ("extends", TokenKind::Extends),
    ("globals", TokenKind::Globals),
    ("endglobals", TokenKind::EndGlobals),
    ("constant", TokenKind::Constant),
    ("native", TokenKind::Native),
    ("array", TokenKind::Array),
    ("and", TokenKind::And),
    ("or", TokenKind::Or),
    ("not", TokenKind::Not),
    ("takes", TokenKind::Takes),
    ("returns", TokenKind::Returns),
    ("nothing", TokenKind::Nothing),
    ("function", TokenKind::Function),
    ("endfunction", TokenKind::EndFunction),
    ("local", TokenKind::Local),
    ("set", TokenKind::Set),
    ("call", TokenKind::Call),
    ("if", TokenKind::If),
    ("then", TokenKind::Then),
    ("elseif", TokenKind::ElseIf),
    ("else", TokenKind::Else),
    ("endif", TokenKind::EndIf),
    ("loop", TokenKind::Loop),
    ("endloop", TokenKind::EndLoop),
    ("exitwhen", TokenKind::ExitWhen),
    ("return", TokenKind::Return),
    ("debug", TokenKind::Debug),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("null", TokenKind::Null),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,   // 1-indexed
    pub column: usize, // 1-indexed
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Lexical error at {line}:{column}: {message}")]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    /// Set when a `CompilerLimits` bound was hit rather than bad input
    pub limit_exceeded: bool,
}

// Lexer

pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    pos: usize,
    line: usize,
    column: usize,
    limits: &'a CompilerLimits,
    token_count: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, limits: &'a CompilerLimits) -> Result<Self, LexError> {
        if source.len() > limits.max_input_size {
            return Err(LexError {
                message: format!(
                    "Input too large: {} bytes (max: {} bytes)",
                    source.len(),
                    limits.max_input_size
                ),
                line: 1,
                column: 1,
                limit_exceeded: true,
            });
        }

        Ok(Self {
            source,
            chars: source.char_indices().peekable(),
            pos: 0,
            line: 1,
            column: 1,
            limits,
            token_count: 0,
        })
    }

    // Character navigation methods

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_char2(&mut self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.peek().map(|(_, c)| *c)
    }

    fn consume_char(&mut self) -> Option<char> {
        let (pos, ch) = self.chars.next()?;
        self.pos = pos + ch.len_utf8();

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn consume_if(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.consume_char();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == ' ' || c == '\t' || c == '\r' {
                self.consume_char();
            } else {
                break;
            }
        }
    }

    fn consume_while<F>(&mut self, predicate: F) -> bool
    where
        F: Fn(char) -> bool,
    {
        let mut consumed = false;
        while let Some(c) = self.peek_char() {
            if predicate(c) {
                self.consume_char();
                consumed = true;
            } else {
                break;
            }
        }
        consumed
    }

    fn error(&self, message: String) -> LexError {
        LexError {
            message,
            line: self.line,
            column: self.column,
            limit_exceeded: false,
        }
    }

    fn limit_error(&self, message: String) -> LexError {
        LexError {
            limit_exceeded: true,
            ..self.error(message)
        }
    }

    // Main tokenization method

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if self.token_count >= self.limits.max_token_count {
            return Err(self.limit_error(format!(
                "Token limit exceeded: {} tokens (max: {})",
                self.token_count, self.limits.max_token_count
            )));
        }

        self.skip_whitespace();
        if self.peek_char() == Some('/') && self.peek_char2() == Some('/') {
            self.skip_comment()?;
        }

        let start_line = self.line;
        let start_column = self.column;

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some('\n') => {
                self.consume_char();
                TokenKind::Newline
            }
            Some(c) if c.is_ascii_digit() => self.lex_number()?,
            Some('.') if self.peek_char2().is_some_and(|c| c.is_ascii_digit()) => {
                self.lex_number()?
            }
            Some('$') => self.lex_dollar_hex()?,
            Some(c) if is_ident_start(c) => self.lex_ident_or_keyword()?,
            Some('"') => self.lex_string()?,
            Some('\'') => self.lex_fourcc()?,
            Some(c) => self.lex_operator(c)?,
        };

        self.token_count += 1;

        Ok(Token {
            kind,
            line: start_line,
            column: start_column,
        })
    }

    // Comment handling

    /// Skips `//` up to (not including) the line break, which stays a token
    fn skip_comment(&mut self) -> Result<(), LexError> {
        let comment_start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.consume_char();

            let comment_len = self.pos - comment_start;
            if comment_len > self.limits.max_comment_length {
                return Err(self.limit_error(format!(
                    "Comment too long: {} bytes (max: {} bytes)",
                    comment_len, self.limits.max_comment_length
                )));
            }
        }
        Ok(())
    }

    fn lex_operator(&mut self, c: char) -> Result<TokenKind, LexError> {
        self.consume_char();
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            '=' if self.consume_if('=') => TokenKind::EqEq,
            '=' => TokenKind::Assign,
            '!' if self.consume_if('=') => TokenKind::NotEq,
            '<' if self.consume_if('=') => TokenKind::LtEq,
            '<' => TokenKind::Lt,
            '>' if self.consume_if('=') => TokenKind::GtEq,
            '>' => TokenKind::Gt,
            _ => return Err(self.error(format!("Unexpected character: '{}'", c))),
        };
        Ok(kind)
    }

    // Identifier and keyword lexing

    fn lex_ident_or_keyword(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        self.consume_while(is_ident_continue);
        let text = &self.source[start..self.pos];

        if text.len() > self.limits.max_identifier_length {
            return Err(self.limit_error(format!(
                "Identifier too long: {} bytes (max: {} bytes)",
                text.len(),
                self.limits.max_identifier_length
            )));
        }

        let kind = KEYWORDS
            .iter()
            .find(|(keyword, _)| *keyword == text)
            .map(|(_, kind)| kind.clone())
            .unwrap_or_else(|| TokenKind::Identifier(text.to_string()));
        Ok(kind)
    }

    // Number lexing

    /// Decimal, `0`-prefixed octal, `0x` hexadecimal or unsigned real
    fn lex_number(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;

        if self.peek_char() == Some('0') && matches!(self.peek_char2(), Some('x') | Some('X')) {
            self.consume_char(); // '0'
            self.consume_char(); // 'x' or 'X'
            return self.lex_hex_digits();
        }

        self.consume_while(|c| c.is_ascii_digit());

        if self.peek_char() == Some('.') {
            self.consume_char();
            self.consume_while(|c| c.is_ascii_digit());
            let text = &self.source[start..self.pos];
            return text
                .parse::<f32>()
                .map(TokenKind::Real)
                .map_err(|_| self.error(format!("Invalid real literal '{}'", text)));
        }

        let text = &self.source[start..self.pos];
        let (digits, radix) = if text.len() > 1 && text.starts_with('0') {
            (&text[1..], 8)
        } else {
            (text, 10)
        };
        self.integer_value(digits, radix)
    }

    fn lex_dollar_hex(&mut self) -> Result<TokenKind, LexError> {
        self.consume_char(); // '$'
        self.lex_hex_digits()
    }

    fn lex_hex_digits(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        if !self.consume_while(|c| c.is_ascii_hexdigit()) {
            return Err(self.error("Hex number must have at least one digit".into()));
        }
        let digits = &self.source[start..self.pos];
        self.integer_value(digits, 16)
    }

    /// Integers are 32-bit words: anything up to 0xFFFFFFFF wraps into i32
    fn integer_value(&self, digits: &str, radix: u32) -> Result<TokenKind, LexError> {
        u32::from_str_radix(digits, radix)
            .map(|value| TokenKind::Integer(value as i32))
            .map_err(|_| {
                self.error(format!(
                    "Invalid or out of range integer literal '{}' (base {})",
                    digits, radix
                ))
            })
    }

    // String lexing

    fn lex_string(&mut self) -> Result<TokenKind, LexError> {
        let string_start = self.pos;
        self.consume_char(); // opening "
        let mut content = String::new();

        loop {
            match self.consume_char() {
                None => return Err(self.error("Unterminated string literal".into())),
                Some('"') => break,
                Some('\\') => match self.consume_char() {
                    None => return Err(self.error("Unterminated escape sequence".into())),
                    Some('"') => content.push('"'),
                    Some('\\') => content.push('\\'),
                    Some('n') => content.push('\n'),
                    Some('t') => content.push('\t'),
                    Some('r') => content.push('\r'),
                    Some('b') => content.push('\u{8}'),
                    Some('f') => content.push('\u{c}'),
                    Some(other) => {
                        content.push('\\');
                        content.push(other);
                    }
                },
                Some(c) => content.push(c),
            }

            let string_len = self.pos - string_start;
            if string_len > self.limits.max_string_length {
                return Err(self.limit_error(format!(
                    "String literal too long: {} bytes (max: {} bytes)",
                    string_len, self.limits.max_string_length
                )));
            }
        }

        Ok(TokenKind::String(content))
    }

    /// `'AbCd'` is a four-character code; a single byte `'a'` is its integer code
    fn lex_fourcc(&mut self) -> Result<TokenKind, LexError> {
        self.consume_char(); // opening '
        let content_start = self.pos;

        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return Err(self.error("Unterminated four-character code".into()));
                }
                Some('\'') => break,
                Some(_) => {
                    self.consume_char();
                }
            }
        }

        let source = self.source;
        let bytes = source[content_start..self.pos].as_bytes();
        self.consume_char(); // closing '

        match *bytes {
            [a, b, c, d] => Ok(TokenKind::FourCC([a, b, c, d])),
            [single] => Ok(TokenKind::Integer(single as i32)),
            _ => Err(self.error(format!(
                "Four-character code must be exactly 4 bytes, found {}",
                bytes.len()
            ))),
        }
    }
}

// Helper functions

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// Public API

pub fn lex(source: &str, limits: &CompilerLimits) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source, limits)?;
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token()?;
        let is_eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if is_eof {
            break;
        }
    }

    Ok(tokens)
}

// Tests

#[cfg(test)]
mod tests {
    use super::*;

    // Helper
    fn lex_single(source: &str) -> Result<Token, LexError> {
        let limits = CompilerLimits::default();
        let mut lexer = Lexer::new(source, &limits)?;
        lexer.next_token()
    }

    fn kind(source: &str) -> TokenKind {
        lex_single(source).unwrap().kind
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        let limits = CompilerLimits::default();
        lex(source, &limits)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(kind("globals"), TokenKind::Globals);
        assert_eq!(kind("endglobals"), TokenKind::EndGlobals);
        assert_eq!(kind("function"), TokenKind::Function);
        assert_eq!(kind("endfunction"), TokenKind::EndFunction);
        assert_eq!(kind("exitwhen"), TokenKind::ExitWhen);
        assert_eq!(kind("elseif"), TokenKind::ElseIf);
        assert_eq!(kind("nothing"), TokenKind::Nothing);
        assert_eq!(kind("null"), TokenKind::Null);

        // Keywords are case-sensitive
        assert_eq!(kind("Function"), TokenKind::Identifier("Function".into()));
        assert_eq!(kind("NULL"), TokenKind::Identifier("NULL".into()));
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(kind("udg_Hero"), TokenKind::Identifier("udg_Hero".into()));
        assert_eq!(kind("_tmp"), TokenKind::Identifier("_tmp".into()));
        assert_eq!(kind("loopCount"), TokenKind::Identifier("loopCount".into()));
    }

    #[test]
    fn test_integers() {
        assert_eq!(kind("200"), TokenKind::Integer(200));
        assert_eq!(kind("0"), TokenKind::Integer(0));
        assert_eq!(kind("010"), TokenKind::Integer(8));
        assert_eq!(kind("$2FA83"), TokenKind::Integer(0x2FA83));
        assert_eq!(kind("0xff"), TokenKind::Integer(255));
        assert_eq!(kind("0XFF"), TokenKind::Integer(255));
        assert_eq!(kind("$FFFFFFFF"), TokenKind::Integer(-1));
    }

    #[test]
    fn test_integer_errors() {
        assert!(lex_single("$").is_err());
        assert!(lex_single("0x").is_err());
        assert!(lex_single("09").is_err()); // not an octal digit
        assert!(lex_single("99999999999").is_err());
    }

    #[test]
    fn test_reals() {
        assert_eq!(kind("4.34"), TokenKind::Real(4.34));
        assert_eq!(kind("5."), TokenKind::Real(5.0));
        assert_eq!(kind(".5"), TokenKind::Real(0.5));
        assert_eq!(kind("0.25"), TokenKind::Real(0.25));
    }

    #[test]
    fn test_sign_is_not_part_of_literal() {
        assert_eq!(
            kinds("-5"),
            vec![TokenKind::Minus, TokenKind::Integer(5), TokenKind::Eof]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(kind(r#""text""#), TokenKind::String("text".into()));
        assert_eq!(kind(r#""""#), TokenKind::String(String::new()));
        assert_eq!(
            kind(r#""quote: \"hi\"""#),
            TokenKind::String("quote: \"hi\"".into())
        );
        assert_eq!(kind(r#""a\\b\n""#), TokenKind::String("a\\b\n".into()));
        assert_eq!(kind(r#""keep \q""#), TokenKind::String("keep \\q".into()));
    }

    #[test]
    fn test_string_may_span_lines() {
        let token = lex_single("\"first\nsecond\"").unwrap();
        assert_eq!(token.kind, TokenKind::String("first\nsecond".into()));
        assert_eq!(token.line, 1);
    }

    #[test]
    fn test_fourcc() {
        assert_eq!(kind("'AFDe'"), TokenKind::FourCC(*b"AFDe"));
        assert_eq!(kind("'a'"), TokenKind::Integer(97));
        assert!(lex_single("'ABC'").is_err());
        assert!(lex_single("'ABCDE'").is_err());
        assert!(lex_single("'AB").is_err());
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+ - * / = == != < <= > >= ( ) [ ] ,"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Assign,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Comma,
                TokenKind::Eof,
            ]
        );
        assert!(lex_single("!").is_err());
        assert!(lex_single("#").is_err());
    }

    #[test]
    fn test_comments_keep_line_break() {
        assert_eq!(
            kinds("// header\nset x = 1 // trailing\n"),
            vec![
                TokenKind::Newline,
                TokenKind::Set,
                TokenKind::Identifier("x".into()),
                TokenKind::Assign,
                TokenKind::Integer(1),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_position_tracking() {
        let limits = CompilerLimits::default();
        let tokens = lex("local integer i\r\n  set i = 2", &limits).unwrap();

        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[2].line, tokens[2].column), (1, 15));
        assert_eq!(tokens[3].kind, TokenKind::Newline);
        assert_eq!((tokens[4].line, tokens[4].column), (2, 3));
    }

    #[test]
    fn test_token_limit() {
        let mut limits = CompilerLimits::default();
        limits.max_token_count = 3;
        let err = lex("a b c d", &limits).unwrap_err();
        assert!(err.message.contains("Token limit exceeded"));
        assert!(err.limit_exceeded);
    }

    #[test]
    fn test_describe() {
        assert_eq!(TokenKind::EndIf.describe(), "'endif'");
        assert_eq!(TokenKind::GtEq.describe(), "'>='");
        assert_eq!(TokenKind::Identifier("x".into()).describe(), "identifier 'x'");
        assert_eq!(TokenKind::Newline.describe(), "newline");
    }
}
