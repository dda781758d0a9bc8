//! ToUnicode CMap parsing for span decoding
//!
//! Report generators usually embed subset fonts with `Identity-H` encoding,
//! so the glyph codes in `Tj`/`TJ` strings only become readable text through
//! the font's `/ToUnicode` stream.

use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;

/// A parsed ToUnicode CMap mapping character codes to Unicode strings
#[derive(Debug, Default, Clone)]
pub struct ToUnicodeCMap {
    /// Direct code mappings from `bfchar` sections and array-form `bfrange`s
    pub char_map: HashMap<u32, String>,
    /// Incrementing ranges: (first code, last code, first code point)
    pub ranges: Vec<(u32, u32, u32)>,
    /// Width in bytes of one character code (1 for simple fonts, 2 for CID fonts)
    pub code_width: usize,
}

/// Lexical pieces of a CMap section body
#[derive(Debug, PartialEq)]
enum Token {
    Hex(String),
    OpenArray,
    CloseArray,
}

impl ToUnicodeCMap {
    /// Parse a ToUnicode CMap from its decompressed content
    pub fn parse(content: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(content);
        let mut cmap = ToUnicodeCMap {
            code_width: detect_code_width(&text),
            ..Default::default()
        };

        for section in sections(&text, "beginbfchar", "endbfchar") {
            let tokens = tokenize(section);
            for pair in tokens.chunks(2) {
                if let [Token::Hex(src), Token::Hex(dst)] = pair {
                    if let (Some(code), Some(value)) = (parse_hex(src), hex_to_unicode_string(dst)) {
                        cmap.char_map.insert(code, value);
                    }
                }
            }
        }

        for section in sections(&text, "beginbfrange", "endbfrange") {
            cmap.parse_bfrange_tokens(&tokenize(section));
        }

        if cmap.char_map.is_empty() && cmap.ranges.is_empty() {
            None
        } else {
            Some(cmap)
        }
    }

    /// Load and parse the `/ToUnicode` stream of a font dictionary, if any
    pub fn for_font(doc: &Document, font: &Dictionary) -> Option<Self> {
        let (_, object) = doc.dereference(font.get(b"ToUnicode").ok()?).ok()?;
        let stream = object.as_stream().ok()?;
        let content = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let mut cmap = Self::parse(&content)?;
        if is_composite(font) {
            cmap.code_width = 2;
        }
        Some(cmap)
    }

    fn parse_bfrange_tokens(&mut self, tokens: &[Token]) {
        let mut i = 0;
        while i + 2 < tokens.len() {
            let (Token::Hex(start), Token::Hex(end)) = (&tokens[i], &tokens[i + 1]) else {
                i += 1;
                continue;
            };
            let (Some(start), Some(end)) = (parse_hex(start), parse_hex(end)) else {
                i += 3;
                continue;
            };
            match &tokens[i + 2] {
                Token::Hex(base) => {
                    if let Some(base) = parse_hex(base) {
                        self.ranges.push((start, end, base));
                    }
                    i += 3;
                }
                Token::OpenArray => {
                    let mut j = i + 3;
                    let mut code = start;
                    while j < tokens.len() && tokens[j] != Token::CloseArray {
                        if let Token::Hex(dst) = &tokens[j] {
                            if let Some(value) = hex_to_unicode_string(dst) {
                                self.char_map.insert(code, value);
                            }
                            code = code.saturating_add(1);
                        }
                        j += 1;
                    }
                    i = j + 1;
                }
                Token::CloseArray => i += 3,
            }
        }
    }

    /// Look up one character code
    pub fn lookup(&self, code: u32) -> Option<String> {
        if let Some(s) = self.char_map.get(&code) {
            return Some(s.clone());
        }

        self.ranges
            .iter()
            .find(|&&(start, end, _)| code >= start && code <= end)
            .and_then(|&(start, _, base)| char::from_u32(base + (code - start)))
            .map(|c| c.to_string())
    }

    /// Decode a string operand's bytes into Unicode text
    pub fn decode(&self, bytes: &[u8]) -> String {
        let width = self.code_width.clamp(1, 4);
        let mut result = String::new();

        for chunk in bytes.chunks(width) {
            let code = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
            match self.lookup(code) {
                Some(s) => result.push_str(&s),
                None => {
                    // Unmapped codes are often plain Latin-1 in simple fonts
                    if let Some(c) = char::from_u32(code) {
                        if !c.is_control() {
                            result.push(c);
                        }
                    }
                }
            }
        }

        result
    }
}

/// Whether a font is a Type0 (composite) font with multi-byte codes
fn is_composite(font: &Dictionary) -> bool {
    matches!(font.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Type0")
}

/// Code width from the first `begincodespacerange` entry, defaulting to 2 bytes
fn detect_code_width(text: &str) -> usize {
    sections(text, "begincodespacerange", "endcodespacerange")
        .next()
        .and_then(|section| {
            tokenize(section).into_iter().find_map(|t| match t {
                Token::Hex(h) => Some(h.trim().len().div_ceil(2)),
                _ => None,
            })
        })
        .filter(|w| (1..=4).contains(w))
        .unwrap_or(2)
}

/// Iterate over the bodies between `begin` and `end` markers
fn sections<'a>(text: &'a str, begin: &'a str, end: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    let mut pos = 0;
    std::iter::from_fn(move || {
        let start = pos + text[pos..].find(begin)? + begin.len();
        let len = text[start..].find(end)?;
        pos = start + len + end.len();
        Some(&text[start..start + len])
    })
}

fn tokenize(section: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = section.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '<' => {
                let mut hex = String::new();
                for c in chars.by_ref() {
                    if c == '>' {
                        break;
                    }
                    if !c.is_whitespace() {
                        hex.push(c);
                    }
                }
                tokens.push(Token::Hex(hex));
            }
            '[' => tokens.push(Token::OpenArray),
            ']' => tokens.push(Token::CloseArray),
            _ => {}
        }
    }

    tokens
}

fn parse_hex(hex: &str) -> Option<u32> {
    u32::from_str_radix(hex.trim(), 16).ok()
}

/// Convert a UTF-16BE hex string to text, joining surrogate pairs
fn hex_to_unicode_string(hex: &str) -> Option<String> {
    let hex = hex.trim();
    let units: Vec<u16> = (0..hex.len() / 4)
        .filter_map(|i| u16::from_str_radix(&hex[i * 4..i * 4 + 4], 16).ok())
        .collect();

    if units.is_empty() {
        // Two-digit destinations show up in some hand-written CMaps
        return parse_hex(hex)
            .and_then(char::from_u32)
            .map(|c| c.to_string());
    }

    let result = String::from_utf16_lossy(&units);
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}
