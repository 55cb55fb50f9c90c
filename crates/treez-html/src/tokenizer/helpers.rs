//! Helper functions for the HTML tokenizer.
//!
//! [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
//!
//! State transitions, input lookahead, token emission and the raw text
//! end-tag bookkeeping shared by the state handlers in [`super::core`].

use treez_common::warning::warn_once;

use super::core::{HTMLTokenizer, TokenizerState};
use super::token::Token;
use crate::ParseIssue;

/// "A start tag whose tag name is one of: "style", "xmp", "iframe", "noembed",
/// "noframes"" plus `script` and, with scripting enabled, `noscript`.
const RAWTEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "noscript",
];

/// "A start tag whose tag name is "title"" / ""textarea"".
const RCDATA_ELEMENTS: &[&str] = &["title", "textarea"];

// =============================================================================
// State Transition Helpers
// =============================================================================

impl HTMLTokenizer {
    /// "Switch to the X state"
    ///
    /// Transitions to a new state. The next character will be consumed on the
    /// next iteration of the main loop.
    pub(super) const fn switch_to(&mut self, new_state: TokenizerState) {
        self.state = new_state;
    }

    /// "Reconsume in the X state"
    ///
    /// Transitions to a new state without consuming the current character.
    pub(super) const fn reconsume_in(&mut self, new_state: TokenizerState) {
        self.reconsume = true;
        self.state = new_state;
    }
}

// =============================================================================
// Input/Character Helpers
// =============================================================================

impl HTMLTokenizer {
    /// "Consume the next input character"
    ///
    /// Returns None once the input is exhausted.
    pub(super) fn consume(&mut self) -> Option<char> {
        let c = self.input.get(self.current_pos).copied();
        if c.is_some() {
            self.current_pos += 1;
        }
        c
    }

    /// Peek at a codepoint at the given offset from the current position without
    /// consuming it.
    #[must_use]
    pub fn peek_codepoint(&self, offset: usize) -> Option<char> {
        self.input.get(self.current_pos + offset).copied()
    }

    /// "If the next few characters are..."
    #[must_use]
    pub fn next_few_characters_are(&self, target: &str) -> bool {
        target
            .chars()
            .enumerate()
            .all(|(i, expected)| self.peek_codepoint(i) == Some(expected))
    }

    /// "ASCII case-insensitive match for the word 'DOCTYPE'"
    #[must_use]
    pub fn next_few_characters_are_case_insensitive(&self, target: &str) -> bool {
        target.chars().enumerate().all(|(i, expected)| {
            self.peek_codepoint(i)
                .is_some_and(|c| c.eq_ignore_ascii_case(&expected))
        })
    }

    /// Consume the given string from the input.
    /// Caller must have already verified the characters are present.
    pub(super) fn consume_string(&mut self, target: &str) {
        self.current_pos += target.chars().count();
    }

    /// [§ 12.1.4 ASCII whitespace](https://infra.spec.whatwg.org/#ascii-whitespace)
    ///
    /// NOTE: HTML tokenizer uses a subset excluding CR (which is normalized earlier).
    pub(super) const fn is_whitespace_char(input_char: char) -> bool {
        matches!(input_char, ' ' | '\t' | '\n' | '\x0C')
    }
}

// =============================================================================
// Token Emission Helpers
// =============================================================================

impl HTMLTokenizer {
    /// Emit buffered character tokens as one `Text` token.
    pub(super) fn flush_text(&mut self) {
        if !self.pending_text.is_empty() {
            let data = std::mem::take(&mut self.pending_text);
            self.token_stream.push(Token::Text { data });
        }
    }

    /// "Emit the current token"
    ///
    /// A start tag for a raw text element switches the tokenizer into RAWTEXT
    /// or RCDATA, the way the tree builder would in
    /// [§ 13.2.6.2](https://html.spec.whatwg.org/multipage/parsing.html#generic-raw-text-element-parsing-algorithm).
    pub(super) fn emit_current_token(&mut self) {
        let Some(token) = self.current_token.take() else {
            return;
        };
        self.flush_text();

        if let Token::StartTag { ref name, .. } = token {
            if RAWTEXT_ELEMENTS.contains(&name.as_str()) {
                self.raw_text_state = TokenizerState::RawText;
                self.switch_to(TokenizerState::RawText);
            } else if RCDATA_ELEMENTS.contains(&name.as_str()) {
                self.raw_text_state = TokenizerState::Rcdata;
                self.switch_to(TokenizerState::Rcdata);
            }
            self.last_start_tag_name = Some(name.clone());
        }
        self.token_stream.push(token);
    }

    /// "Emit the current comment token."
    pub(super) fn emit_comment_token(&mut self) {
        self.flush_text();
        let data = std::mem::take(&mut self.comment);
        self.token_stream.push(Token::Comment { data });
    }

    /// "Emit the current DOCTYPE token."
    pub(super) fn emit_doctype_token(&mut self) {
        self.flush_text();
        let name = self.doctype_name.take();
        self.token_stream.push(Token::Doctype { name });
    }

    /// "Emit an end-of-file token."
    pub(super) fn emit_eof_token(&mut self) {
        self.flush_text();
        self.token_stream.push(Token::EndOfFile);
        self.at_eof = true;
    }

    /// Append to the value of the attribute being built.
    pub(super) fn append_to_attribute_value(&mut self, s: &str) {
        if let Some(token) = self.current_token.as_mut() {
            token.append_to_current_attribute_value(s);
        }
    }

    /// Resolve a character reference after `&` and append it to the text or
    /// attribute value being built. An unresolved reference is kept literally.
    pub(super) fn flush_character_reference(&mut self, in_attribute: bool) {
        let resolved = self
            .consume_character_reference(in_attribute)
            .unwrap_or_else(|| "&".to_string());
        if in_attribute {
            self.append_to_attribute_value(&resolved);
        } else {
            self.pending_text.push_str(&resolved);
        }
    }
}

// =============================================================================
// RCDATA/RAWTEXT Helpers
// =============================================================================

impl HTMLTokenizer {
    /// [§ 13.2.5.14 RAWTEXT end tag name state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-end-tag-name-state)
    ///
    /// "An appropriate end tag token is an end tag token whose tag name matches
    /// the tag name of the last start tag to have been emitted from this
    /// tokenizer, if any."
    pub(super) fn is_appropriate_end_tag_token(&self) -> bool {
        match (&self.last_start_tag_name, &self.current_token) {
            (Some(last_start_tag), Some(Token::EndTag { name })) => name == last_start_tag,
            _ => false,
        }
    }

    /// "Anything else":
    /// "Emit a U+003C LESS-THAN SIGN character token, a U+002F SOLIDUS character
    /// token, and a character token for each of the characters in the temporary
    /// buffer... Reconsume in the RAWTEXT state."
    pub(super) fn emit_rawtext_end_tag_name_anything_else(&mut self) {
        self.pending_text.push_str("</");
        self.pending_text.push_str(&self.temporary_buffer);
        self.current_token = None;
        self.reconsume_in(self.raw_text_state);
    }
}

// =============================================================================
// Error Handling
// =============================================================================

impl HTMLTokenizer {
    /// [§ 13.2.2 Parse errors](https://html.spec.whatwg.org/multipage/parsing.html#parse-errors)
    ///
    /// Parse errors are not fatal: they are recorded, logged once, and the
    /// tokenizer recovers.
    pub(super) fn log_parse_error(&mut self, code: &str) {
        let _ = warn_once("HTML Tokenizer", code);
        self.issues.push(ParseIssue::new(
            "HTML Tokenizer",
            format!("{code} at character {}", self.current_pos),
        ));
    }
}
