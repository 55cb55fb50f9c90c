//! [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
//!
//! Resolves `&name;`, `&#123;` and `&#x7B;` by lookahead from just after the
//! ampersand. Only the common named references are known; anything else is
//! left in the text as written.

use super::core::HTMLTokenizer;

/// Named references from [§ 13.5](https://html.spec.whatwg.org/multipage/named-characters.html)
/// that this tokenizer resolves, and whether the legacy form without a
/// trailing semicolon is also accepted.
const NAMED_REFERENCES: &[(&str, char, bool)] = &[
    ("amp", '&', true),
    ("lt", '<', true),
    ("gt", '>', true),
    ("quot", '"', true),
    ("apos", '\'', false),
    ("nbsp", '\u{A0}', true),
    ("copy", '\u{A9}', true),
    ("reg", '\u{AE}', true),
];

/// Look up a named reference (without `&` and `;`).
#[must_use]
pub fn lookup_entity(name: &str) -> Option<char> {
    NAMED_REFERENCES
        .iter()
        .find(|(entity, _, _)| *entity == name)
        .map(|&(_, c, _)| c)
}

fn lookup_legacy_entity(name: &str) -> Option<char> {
    NAMED_REFERENCES
        .iter()
        .find(|(entity, _, legacy)| *legacy && *entity == name)
        .map(|&(_, c, _)| c)
}

impl HTMLTokenizer {
    /// Consume a character reference that starts right after `&`.
    ///
    /// Returns the replacement text, or `None` when nothing was consumed and
    /// the ampersand should be emitted literally.
    pub(super) fn consume_character_reference(&mut self, in_attribute: bool) -> Option<String> {
        match self.peek_codepoint(0) {
            // "U+0023 NUMBER SIGN (#) - Append the current input character to the
            // temporary buffer. Switch to the numeric character reference state."
            Some('#') => self.consume_numeric_character_reference(),
            // "ASCII alphanumeric - Reconsume in the named character reference state."
            Some(c) if c.is_ascii_alphanumeric() => self.consume_named_character_reference(in_attribute),
            _ => None,
        }
    }

    /// [§ 13.2.5.73 Named character reference state](https://html.spec.whatwg.org/multipage/parsing.html#named-character-reference-state)
    fn consume_named_character_reference(&mut self, in_attribute: bool) -> Option<String> {
        let word: String = self.input[self.current_pos..]
            .iter()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        let word_len = word.len();

        if self.peek_codepoint(word_len) == Some(';')
            && let Some(c) = lookup_entity(&word)
        {
            self.current_pos += word_len + 1;
            return Some(c.to_string());
        }

        // "Consume the maximum number of characters possible, where the consumed
        // characters are one of the identifiers in the named character references
        // table."
        let matched = (1..=word_len)
            .rev()
            .find_map(|len| lookup_legacy_entity(&word[..len]).map(|c| (len, c)));

        let Some((len, c)) = matched else {
            if word_len > 0 && self.peek_codepoint(word_len) == Some(';') {
                self.log_parse_error("unknown-named-character-reference");
            }
            return None;
        };

        // "If the character reference was consumed as part of an attribute, and
        // the last character matched is not a U+003B SEMICOLON character (;), and
        // the next input character is either a U+003D EQUALS SIGN character (=) or
        // an ASCII alphanumeric, then, for historical reasons, flush code points
        // consumed as a character reference and switch to the return state."
        let next = self.peek_codepoint(len);
        if in_attribute && next.is_some_and(|n| n == '=' || n.is_ascii_alphanumeric()) {
            return None;
        }

        self.log_parse_error("missing-semicolon-after-character-reference");
        self.current_pos += len;
        Some(c.to_string())
    }

    /// [§ 13.2.5.75 Numeric character reference state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-state)
    /// [§ 13.2.5.80 Numeric character reference end state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-end-state)
    fn consume_numeric_character_reference(&mut self) -> Option<String> {
        let hex = matches!(self.peek_codepoint(1), Some('x' | 'X'));
        let prefix_len = if hex { 2 } else { 1 };
        let radix = if hex { 16 } else { 10 };

        let digits: String = self.input[self.current_pos + prefix_len..]
            .iter()
            .take_while(|c| c.is_digit(radix))
            .collect();

        // "This is an absence-of-digits-in-numeric-character-reference parse error."
        if digits.is_empty() {
            self.log_parse_error("absence-of-digits-in-numeric-character-reference");
            return None;
        }

        self.current_pos += prefix_len + digits.len();
        if self.peek_codepoint(0) == Some(';') {
            self.current_pos += 1;
        } else {
            self.log_parse_error("missing-semicolon-after-character-reference");
        }

        // Saturate well above the Unicode range so huge inputs cannot overflow.
        let code = digits.chars().fold(0_u32, |acc, d| {
            let digit = d.to_digit(radix).unwrap_or(0);
            acc.saturating_mul(radix).saturating_add(digit).min(0x0011_0000)
        });

        // "If the number is 0x00, then this is a null-character-reference parse
        // error. Set the character reference code to 0xFFFD."
        // "If the number is greater than 0x10FFFF ... If the number is a surrogate ..."
        let c = match code {
            0 => {
                self.log_parse_error("null-character-reference");
                '\u{FFFD}'
            }
            _ => char::from_u32(code).unwrap_or_else(|| {
                self.log_parse_error("character-reference-outside-unicode-range");
                '\u{FFFD}'
            }),
        };
        Some(c.to_string())
    }
}
