//! Scanner: turns a preprocessed UTF-8 byte buffer into a token vector.
//!
//! Grounded in the original `lex.cpp`/`lex.h`: trigraph and digraph
//! replacement, `# <line> "<file>"` linemarker handling, and the
//! preprocessing-number classification algorithm of C17 §6.4.4.1.

use crate::diagnostics::{Fatal, Result};
use crate::loc::SourceLocation;
use crate::token::{Tag, Token};
use std::rc::Rc;

/// Classification of an integer suffix combination, used by the parser to
/// pick the smallest arithmetic type that can hold the literal's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntegerSuffix {
    pub unsigned: bool,
    /// 0 = no `l`/`ll`, 1 = `l`, 2 = `ll`
    pub long_count: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatSuffix {
    Float,
    Double,
    LongDouble,
}

/// Result of classifying a preprocessing-number lexeme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumericLiteral {
    Integer { base: u32, digits: String, suffix: IntegerSuffix },
    Floating { digits: String, suffix: FloatSuffix },
}

/// Encoding prefix recognized on character/string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    None,
    Utf8,
    Utf16,
    Utf32,
    Wide,
}

pub struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
    loc: SourceLocation,
    tokens: Vec<Token>,
    /// Set by `skip_whitespace_and_linemarkers` whenever it actually
    /// consumed something ahead of the token about to be scanned; cleared
    /// at the start of each iteration of `tokenize`'s loop.
    leading_blank: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a [u8], file_name: Rc<str>) -> Self {
        Scanner {
            src,
            pos: 0,
            loc: SourceLocation::new(file_name),
            tokens: Vec::new(),
            leading_blank: false,
        }
    }

    fn peek(&self) -> u8 {
        self.src.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.src.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn advance(&mut self) -> u8 {
        let b = self.peek();
        self.pos += 1;
        if b == b'\n' {
            self.loc.row += 1;
            self.loc.column = 1;
            self.loc.line_start = self.pos as u32;
        } else {
            self.loc.column += 1;
        }
        b
    }

    fn starts_with(&self, s: &str) -> bool {
        self.src[self.pos..].starts_with(s.as_bytes())
    }

    /// Entry point: tokenizes the whole buffer, including a trailing
    /// [`Tag::Eof`] token.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        loop {
            self.leading_blank = false;
            self.skip_whitespace_and_linemarkers()?;
            if self.eof() {
                let loc = self.loc.clone();
                let blank = self.leading_blank;
                self.tokens.push(Token::new(Tag::Eof, b"", loc, blank));
                return Ok(self.tokens);
            }
            let tok = self.scan_one()?;
            self.tokens.push(tok);
        }
    }

    fn skip_whitespace_and_linemarkers(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\x0b' | b'\x0c' | b'\n' => {
                    self.leading_blank = true;
                    self.advance();
                }
                b'/' if self.peek_at(1) == b'/' => {
                    self.leading_blank = true;
                    while !self.eof() && self.peek() != b'\n' {
                        self.advance();
                    }
                }
                b'/' if self.peek_at(1) == b'*' => {
                    self.leading_blank = true;
                    self.advance();
                    self.advance();
                    loop {
                        if self.eof() {
                            return Err(Fatal::UnterminatedLiteral {
                                loc: self.loc.clone(),
                                kind: "comment",
                            });
                        }
                        if self.peek() == b'*' && self.peek_at(1) == b'/' {
                            self.advance();
                            self.advance();
                            break;
                        }
                        self.advance();
                    }
                }
                b'#' if self.loc.column == 1 && self.looks_like_linemarker() => {
                    self.leading_blank = true;
                    self.consume_linemarker()?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn looks_like_linemarker(&self) -> bool {
        let mut i = self.pos + 1;
        while self.src.get(i).copied().unwrap_or(0) == b' ' {
            i += 1;
        }
        self.src.get(i).map(|b| b.is_ascii_digit()).unwrap_or(false)
    }

    /// `# <line> "<file>" <flags...>\n` — consumes the directive and
    /// retargets `loc.row`/`loc.file_name`.
    fn consume_linemarker(&mut self) -> Result<()> {
        self.advance(); // '#'
        while self.peek() == b' ' {
            self.advance();
        }
        let mut digits = String::new();
        while self.peek().is_ascii_digit() {
            digits.push(self.advance() as char);
        }
        let line: u32 = digits.parse().unwrap_or(1);
        while self.peek() == b' ' {
            self.advance();
        }
        if self.peek() == b'"' {
            self.advance();
            let mut name = String::new();
            while !self.eof() && self.peek() != b'"' {
                name.push(self.advance() as char);
            }
            if self.eof() {
                return Err(Fatal::UnterminatedLiteral { loc: self.loc.clone(), kind: "linemarker" });
            }
            self.advance(); // closing quote
            self.loc.file_name = Rc::from(name.as_str());
        }
        while !self.eof() && self.peek() != b'\n' {
            self.advance();
        }
        self.loc.row = line;
        self.loc.column = 1;
        Ok(())
    }

    fn scan_one(&mut self) -> Result<Token> {
        let start_loc = self.loc.clone();
        let start = self.pos;

        if is_ident_start(self.peek()) {
            return Ok(self.scan_identifier(start, start_loc));
        }
        if self.peek().is_ascii_digit()
            || (self.peek() == b'.' && self.peek_at(1).is_ascii_digit())
        {
            return Ok(self.scan_number(start, start_loc));
        }
        match self.peek() {
            b'\'' => self.scan_char_literal(start, start_loc, Encoding::None),
            b'"' => Ok(self.scan_string_literal(start, start_loc, Encoding::None)),
            b'L' | b'U' | b'u' if self.is_prefixed_literal() => {
                self.scan_prefixed_literal(start, start_loc)
            }
            _ => self.scan_punctuator(start_loc),
        }
    }

    fn is_prefixed_literal(&self) -> bool {
        match self.peek() {
            b'L' => matches!(self.peek_at(1), b'\'' | b'"'),
            b'U' => matches!(self.peek_at(1), b'\'' | b'"'),
            b'u' => {
                matches!(self.peek_at(1), b'\'' | b'"')
                    || (self.peek_at(1) == b'8' && matches!(self.peek_at(2), b'\'' | b'"'))
            }
            _ => false,
        }
    }

    fn scan_prefixed_literal(&mut self, start: usize, loc: SourceLocation) -> Result<Token> {
        let enc = match self.peek() {
            b'L' => {
                self.advance();
                Encoding::Wide
            }
            b'U' => {
                self.advance();
                Encoding::Utf32
            }
            b'u' => {
                self.advance();
                if self.peek() == b'8' {
                    self.advance();
                    Encoding::Utf8
                } else {
                    Encoding::Utf16
                }
            }
            _ => unreachable!(),
        };
        if self.peek() == b'\'' {
            self.scan_char_literal(start, loc, enc)
        } else {
            Ok(self.scan_string_literal(start, loc, enc))
        }
    }

    fn scan_identifier(&mut self, start: usize, loc: SourceLocation) -> Token {
        while is_ident_continue(self.peek()) {
            self.advance();
        }
        let lexeme = &self.src[start..self.pos];
        let text = std::str::from_utf8(lexeme).unwrap_or("");
        let tag = Tag::keyword(text).unwrap_or(Tag::Identifier);
        Token::new(tag, lexeme, loc, self.leading_blank)
    }

    /// Classifies a preprocessing-number per C17 §6.4.4.1 and returns the
    /// generic [`Tag::IntegerConstant`]/[`Tag::FloatingConstant`] token;
    /// callers re-derive the [`NumericLiteral`] from the lexeme via
    /// [`classify_numeric`].
    fn scan_number(&mut self, start: usize, loc: SourceLocation) -> Token {
        let is_hex = self.peek() == b'0' && matches!(self.peek_at(1), b'x' | b'X');
        if is_hex {
            self.advance();
            self.advance();
        }
        let mut is_float = false;
        while !self.eof() {
            let c = self.peek();
            if c.is_ascii_digit() || (is_hex && c.is_ascii_hexdigit()) {
                self.advance();
            } else if c == b'.' {
                is_float = true;
                self.advance();
            } else if (c == b'e' || c == b'E') && !is_hex {
                is_float = true;
                self.advance();
                if matches!(self.peek(), b'+' | b'-') {
                    self.advance();
                }
            } else if (c == b'p' || c == b'P') && is_hex {
                is_float = true;
                self.advance();
                if matches!(self.peek(), b'+' | b'-') {
                    self.advance();
                }
            } else if is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }
        let lexeme = &self.src[start..self.pos];
        let tag = if is_float { Tag::FloatingConstant } else { Tag::IntegerConstant };
        Token::new(tag, lexeme, loc, self.leading_blank)
    }

    fn scan_char_literal(
        &mut self,
        start: usize,
        loc: SourceLocation,
        _enc: Encoding,
    ) -> Result<Token> {
        self.advance(); // opening '
        loop {
            if self.eof() || self.peek() == b'\n' {
                return Err(Fatal::UnterminatedLiteral {
                    loc: loc.clone(),
                    kind: "character constant",
                });
            }
            if self.peek() == b'\\' {
                self.advance();
                if !self.eof() {
                    self.advance();
                }
                continue;
            }
            if self.peek() == b'\'' {
                self.advance();
                break;
            }
            self.advance();
        }
        let lexeme = &self.src[start..self.pos];
        Ok(Token::new(Tag::CharacterConstant, lexeme, loc, self.leading_blank))
    }

    fn scan_string_literal(&mut self, start: usize, loc: SourceLocation, _enc: Encoding) -> Token {
        self.advance(); // opening "
        loop {
            if self.eof() || self.peek() == b'\n' {
                break;
            }
            if self.peek() == b'\\' {
                self.advance();
                if !self.eof() {
                    self.advance();
                }
                continue;
            }
            if self.peek() == b'"' {
                self.advance();
                break;
            }
            self.advance();
        }
        let lexeme = &self.src[start..self.pos];
        Token::new(Tag::StringLiteral, lexeme, loc, self.leading_blank)
    }

    fn scan_punctuator(&mut self, loc: SourceLocation) -> Result<Token> {
        use Tag::*;
        macro_rules! tok {
            ($tag:expr, $len:expr) => {{
                let start = self.pos;
                for _ in 0..$len {
                    self.advance();
                }
                return Ok(Token::new($tag, &self.src[start..self.pos], loc, self.leading_blank));
            }};
        }
        if self.starts_with("...") {
            tok!(Ellipsis, 3)
        }
        if self.starts_with("<<=") {
            tok!(LessLessEqual, 3)
        }
        if self.starts_with(">>=") {
            tok!(GreaterGreaterEqual, 3)
        }
        if self.starts_with("%:%:") {
            tok!(HashHash, 4)
        }
        if self.starts_with("->") {
            tok!(Arrow, 2)
        }
        if self.starts_with("++") {
            tok!(PlusPlus, 2)
        }
        if self.starts_with("--") {
            tok!(MinusMinus, 2)
        }
        if self.starts_with("<<") {
            tok!(LessLess, 2)
        }
        if self.starts_with(">>") {
            tok!(GreaterGreater, 2)
        }
        if self.starts_with("<=") {
            tok!(LessEqual, 2)
        }
        if self.starts_with(">=") {
            tok!(GreaterEqual, 2)
        }
        if self.starts_with("==") {
            tok!(EqualEqual, 2)
        }
        if self.starts_with("!=") {
            tok!(ExclaimEqual, 2)
        }
        if self.starts_with("&&") {
            tok!(AmpAmp, 2)
        }
        if self.starts_with("||") {
            tok!(PipePipe, 2)
        }
        if self.starts_with("*=") {
            tok!(StarEqual, 2)
        }
        if self.starts_with("/=") {
            tok!(SlashEqual, 2)
        }
        if self.starts_with("%=") {
            tok!(PercentEqual, 2)
        }
        if self.starts_with("+=") {
            tok!(PlusEqual, 2)
        }
        if self.starts_with("-=") {
            tok!(MinusEqual, 2)
        }
        if self.starts_with("&=") {
            tok!(AmpEqual, 2)
        }
        if self.starts_with("^=") {
            tok!(CaretEqual, 2)
        }
        if self.starts_with("|=") {
            tok!(PipeEqual, 2)
        }
        if self.starts_with("##") {
            tok!(HashHash, 2)
        }
        // Digraphs (GNU/C99): scanned as their equivalent punctuator tag.
        if self.starts_with("<:") {
            tok!(LeftBracket, 2)
        }
        if self.starts_with(":>") {
            tok!(RightBracket, 2)
        }
        if self.starts_with("<%") {
            tok!(LeftBrace, 2)
        }
        if self.starts_with("%>") {
            tok!(RightBrace, 2)
        }
        if self.starts_with("%:") {
            tok!(Hash, 2)
        }
        let single = match self.peek() {
            b'[' => LeftBracket,
            b']' => RightBracket,
            b'(' => LeftParen,
            b')' => RightParen,
            b'{' => LeftBrace,
            b'}' => RightBrace,
            b'.' => Dot,
            b'&' => Amp,
            b'*' => Star,
            b'+' => Plus,
            b'-' => Minus,
            b'~' => Tilde,
            b'!' => Exclaim,
            b'/' => Slash,
            b'%' => Percent,
            b'<' => Less,
            b'>' => Greater,
            b'^' => Caret,
            b'|' => Pipe,
            b'?' => Question,
            b':' => Colon,
            b';' => Semicolon,
            b'=' => Equal,
            b',' => Comma,
            b'#' => Hash,
            _ => return Err(Fatal::InvalidByte { loc }),
        };
        tok!(single, 1)
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || (0x80..=0xfd).contains(&b)
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

pub fn tokenize(src: &[u8], file_name: impl Into<Rc<str>>) -> Result<Vec<Token>> {
    let replaced = replace_trigraphs(src);
    Scanner::new(&replaced, file_name.into()).tokenize()
}

/// Trigraph replacement (C17 §5.2.1.1): each `??x` sequence below is
/// replaced textually before tokenization begins, unlike digraphs, which
/// the scanner recognizes token-for-token during `scan_punctuator`.
const TRIGRAPHS: &[(u8, u8)] = &[
    (b'=', b'#'),
    (b'(', b'['),
    (b')', b']'),
    (b'<', b'{'),
    (b'>', b'}'),
    (b'/', b'\\'),
    (b'\'', b'^'),
    (b'!', b'|'),
    (b'-', b'~'),
];

fn replace_trigraphs(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;
    while i < src.len() {
        if src[i] == b'?' && i + 2 < src.len() && src[i + 1] == b'?' {
            if let Some(&(_, repl)) = TRIGRAPHS.iter().find(|(c, _)| *c == src[i + 2]) {
                out.push(repl);
                i += 3;
                continue;
            }
        }
        out.push(src[i]);
        i += 1;
    }
    out
}

/// Classifies a preprocessing-number lexeme per C17 §6.4.4.1: integer
/// unless it contains `.`, a non-hex-prefixed `e`/`E`, or a hex-prefixed
/// `p`/`P`.
pub fn classify_numeric(lexeme: &str) -> NumericLiteral {
    let (body, is_hex) = if let Some(rest) = lexeme.strip_prefix("0x").or_else(|| lexeme.strip_prefix("0X")) {
        (rest, true)
    } else {
        (lexeme, false)
    };

    let mut is_float = body.contains('.');
    if is_hex {
        is_float |= body.contains('p') || body.contains('P');
    } else {
        // `e`/`E` outside a hex prefix signals a float, e.g. 1e10.
        is_float |= has_exponent_marker(body);
    }

    if is_float {
        let (digits, suffix) = split_float_suffix(lexeme);
        return NumericLiteral::Floating { digits, suffix };
    }

    let (base, digits) = if is_hex {
        (16u32, body.to_string())
    } else if lexeme.starts_with('0') && lexeme.len() > 1 {
        (8u32, lexeme.to_string())
    } else {
        (10u32, lexeme.to_string())
    };
    let (digits, suffix) = split_integer_suffix(&digits);
    NumericLiteral::Integer { base, digits, suffix }
}

fn has_exponent_marker(body: &str) -> bool {
    body.chars().enumerate().any(|(i, c)| {
        (c == 'e' || c == 'E') && body.as_bytes().get(..i).map(|s| s.iter().all(|b| b.is_ascii_digit())).unwrap_or(false)
    })
}

fn split_integer_suffix(digits: &str) -> (String, IntegerSuffix) {
    let mut end = digits.len();
    let mut suffix = IntegerSuffix::default();
    let bytes = digits.as_bytes();
    while end > 0 {
        match bytes[end - 1] {
            b'u' | b'U' => {
                suffix.unsigned = true;
                end -= 1;
            }
            b'l' | b'L' => {
                suffix.long_count = (suffix.long_count + 1).min(2);
                end -= 1;
            }
            _ => break,
        }
    }
    (digits[..end].to_string(), suffix)
}

fn split_float_suffix(lexeme: &str) -> (String, FloatSuffix) {
    if let Some(body) = lexeme.strip_suffix('f').or_else(|| lexeme.strip_suffix('F')) {
        (body.to_string(), FloatSuffix::Float)
    } else if let Some(body) = lexeme.strip_suffix('l').or_else(|| lexeme.strip_suffix('L')) {
        (body.to_string(), FloatSuffix::LongDouble)
    } else {
        (lexeme.to_string(), FloatSuffix::Double)
    }
}

/// Re-parses a character-literal lexeme (including any encoding prefix and
/// surrounding quotes) to its numeric value. Honors the simple escapes,
/// the GNU `\e` extension, octal escapes of 1-3 digits, hex escapes of any
/// length, and universal character names. Multi-character constants
/// accumulate left-shifted by 8 per byte and are reported via `warn`.
pub fn handle_character(
    lexeme: &str,
    loc: &SourceLocation,
    warn: &mut dyn FnMut(&SourceLocation, String),
) -> Result<(i64, Encoding)> {
    let (enc, rest) = strip_encoding_prefix(lexeme);
    let inner = rest
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .ok_or_else(|| Fatal::UnterminatedLiteral { loc: loc.clone(), kind: "character constant" })?;

    let chars = decode_escapes(inner, loc)?;
    if chars.is_empty() {
        return Err(Fatal::UnterminatedLiteral { loc: loc.clone(), kind: "character constant" });
    }
    if chars.len() > 1 {
        warn(loc, "multi-character character constant".to_string());
    }
    let mut value: i64 = 0;
    for c in &chars {
        value = (value << 8) | (*c as i64 & 0xff);
    }
    Ok((value, enc))
}

/// Re-parses a string-literal lexeme to its decoded byte sequence (NUL
/// terminator not included — callers append it). `decode_escapes` can be
/// set to `false` to retrieve the raw inter-quote bytes instead (used by
/// GNU `__asm__` string operands, which are not escape-processed here).
pub fn handle_string(
    lexeme: &str,
    loc: &SourceLocation,
    decode_escape_sequences: bool,
) -> Result<(Vec<u8>, Encoding)> {
    let (enc, rest) = strip_encoding_prefix(lexeme);
    let inner = rest
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| Fatal::UnterminatedLiteral { loc: loc.clone(), kind: "string literal" })?;

    if !decode_escape_sequences {
        return Ok((inner.as_bytes().to_vec(), enc));
    }
    let chars = decode_escapes(inner, loc)?;
    Ok((chars.into_iter().map(|c| c as u8).collect(), enc))
}

fn strip_encoding_prefix(lexeme: &str) -> (Encoding, &str) {
    if let Some(rest) = lexeme.strip_prefix("u8") {
        (Encoding::Utf8, rest)
    } else if let Some(rest) = lexeme.strip_prefix('u') {
        (Encoding::Utf16, rest)
    } else if let Some(rest) = lexeme.strip_prefix('U') {
        (Encoding::Utf32, rest)
    } else if let Some(rest) = lexeme.strip_prefix('L') {
        (Encoding::Wide, rest)
    } else {
        (Encoding::None, lexeme)
    }
}

/// Decodes the escape sequences inside the quotes of a character/string
/// literal, returning one numeric codepoint per logical character.
fn decode_escapes(inner: &str, loc: &SourceLocation) -> Result<Vec<u32>> {
    let bytes = inner.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i] as u32);
            i += 1;
            continue;
        }
        i += 1;
        if i >= bytes.len() {
            return Err(Fatal::InvalidEscape { loc: loc.clone() });
        }
        let c = bytes[i];
        let value = match c {
            b'\'' => {
                i += 1;
                b'\'' as u32
            }
            b'"' => {
                i += 1;
                b'"' as u32
            }
            b'?' => {
                i += 1;
                b'?' as u32
            }
            b'\\' => {
                i += 1;
                b'\\' as u32
            }
            b'a' => {
                i += 1;
                0x07
            }
            b'b' => {
                i += 1;
                0x08
            }
            b'f' => {
                i += 1;
                0x0c
            }
            b'n' => {
                i += 1;
                b'\n' as u32
            }
            b'r' => {
                i += 1;
                b'\r' as u32
            }
            b't' => {
                i += 1;
                b'\t' as u32
            }
            b'v' => {
                i += 1;
                0x0b
            }
            b'e' => {
                // GNU extension: ESC (0x1b)
                i += 1;
                0x1b
            }
            b'x' => {
                i += 1;
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_hexdigit() {
                    i += 1;
                }
                if i == start {
                    return Err(Fatal::InvalidEscape { loc: loc.clone() });
                }
                u32::from_str_radix(std::str::from_utf8(&bytes[start..i]).unwrap(), 16)
                    .map_err(|_| Fatal::InvalidEscape { loc: loc.clone() })?
            }
            b'u' | b'U' => {
                let width = if c == b'u' { 4 } else { 8 };
                i += 1;
                let start = i;
                let end = (start + width).min(bytes.len());
                if end - start != width {
                    return Err(Fatal::InvalidEscape { loc: loc.clone() });
                }
                i = end;
                u32::from_str_radix(std::str::from_utf8(&bytes[start..end]).unwrap(), 16)
                    .map_err(|_| Fatal::InvalidEscape { loc: loc.clone() })?
            }
            b'0'..=b'7' => {
                let start = i;
                let end = (start + 3).min(bytes.len());
                let mut j = start;
                while j < end && bytes[j].is_ascii_digit() && bytes[j] < b'8' {
                    j += 1;
                }
                i = j;
                u32::from_str_radix(std::str::from_utf8(&bytes[start..j]).unwrap(), 8)
                    .map_err(|_| Fatal::InvalidEscape { loc: loc.clone() })?
            }
            _ => return Err(Fatal::InvalidEscape { loc: loc.clone() }),
        };
        out.push(value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Token> {
        tokenize(src.as_bytes(), "t.c").unwrap()
    }

    #[test]
    fn scans_keywords_and_identifiers() {
        let t = toks("int foo_bar return");
        assert_eq!(t[0].tag, Tag::Int);
        assert_eq!(t[1].tag, Tag::Identifier);
        assert_eq!(t[1].text(), "foo_bar");
        assert_eq!(t[2].tag, Tag::Return);
        assert_eq!(t[3].tag, Tag::Eof);
    }

    #[test]
    fn classifies_integer_suffixes() {
        match classify_numeric("123ULL") {
            NumericLiteral::Integer { base, digits, suffix } => {
                assert_eq!(base, 10);
                assert_eq!(digits, "123");
                assert!(suffix.unsigned);
                assert_eq!(suffix.long_count, 2);
            }
            _ => panic!("expected integer"),
        }
    }

    #[test]
    fn classifies_hex_and_float() {
        assert!(matches!(classify_numeric("0x1A"), NumericLiteral::Integer { base: 16, .. }));
        assert!(matches!(classify_numeric("1.5e10"), NumericLiteral::Floating { .. }));
        assert!(matches!(classify_numeric("0x1p4"), NumericLiteral::Floating { .. }));
    }

    #[test]
    fn linemarker_updates_location() {
        let t = toks("# 10 \"foo.c\"\nx;");
        assert_eq!(t[0].loc.row, 10);
        assert_eq!(&*t[0].loc.file_name, "foo.c");
    }

    #[test]
    fn decodes_octal_and_hex_escapes() {
        let loc = SourceLocation::new(Rc::from("t.c"));
        let mut warned = false;
        let (v, _) = handle_character("'\\101'", &loc, &mut |_, _| warned = true).unwrap();
        assert_eq!(v, 'A' as i64);
        assert!(!warned);
        let (v, _) = handle_character("'\\x41'", &loc, &mut |_, _| {}).unwrap();
        assert_eq!(v, 'A' as i64);
    }

    #[test]
    fn multi_character_constant_warns() {
        let loc = SourceLocation::new(Rc::from("t.c"));
        let mut warned = false;
        let (v, _) = handle_character("'ab'", &loc, &mut |_, _| warned = true).unwrap();
        assert!(warned);
        assert_eq!(v, (('a' as i64) << 8) | 'b' as i64);
    }

    #[test]
    fn digraphs_scan_as_punctuators() {
        let t = toks("<: :>");
        assert_eq!(t[0].tag, Tag::LeftBracket);
        assert_eq!(t[1].tag, Tag::RightBracket);
    }

    #[test]
    fn trigraphs_are_replaced_before_tokenizing() {
        let t = toks("??(a??)");
        assert_eq!(t[0].tag, Tag::LeftBracket);
        assert_eq!(t[1].tag, Tag::Identifier);
        assert_eq!(t[2].tag, Tag::RightBracket);
    }

    #[test]
    fn leading_blank_tracks_preceding_whitespace() {
        let t = toks("a  b");
        assert!(!t[0].leading_blank);
        assert!(t[1].leading_blank);
    }
}
