//! Integration tests for the HTML tokenizer.

use treez_dom::Attribute;
use treez_html::{HTMLTokenizer, Token};

/// Helper to tokenize a string and return the tokens
fn tokenize(input: &str) -> Vec<Token> {
    let mut tokenizer = HTMLTokenizer::new(input);
    tokenizer.run();
    tokenizer.into_tokens()
}

/// Helper to tokenize and return only the parse error messages
fn tokenizer_issues(input: &str) -> Vec<String> {
    let mut tokenizer = HTMLTokenizer::new(input);
    tokenizer.run();
    let (_, issues) = tokenizer.into_parts();
    issues.into_iter().map(|issue| issue.message).collect()
}

fn start(name: &str, attributes: Vec<Attribute>, self_closing: bool) -> Token {
    Token::StartTag {
        name: name.to_string(),
        self_closing,
        attributes,
    }
}

#[test]
fn test_plain_text_is_one_token() {
    let tokens = tokenize("Hello");
    assert_eq!(tokens, vec![Token::text("Hello"), Token::EndOfFile]);
}

#[test]
fn test_empty_input_is_just_eof() {
    assert_eq!(tokenize(""), vec![Token::EndOfFile]);
}

#[test]
fn test_doctype() {
    let tokens = tokenize("<!DOCTYPE html>");
    assert_eq!(
        tokens,
        vec![
            Token::Doctype {
                name: Some("html".to_string())
            },
            Token::EndOfFile
        ]
    );
}

#[test]
fn test_doctype_is_case_insensitive_and_skips_identifiers() {
    let tokens = tokenize(
        r#"<!doctype HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">"#,
    );
    assert_eq!(
        tokens[0],
        Token::Doctype {
            name: Some("html".to_string())
        }
    );
    assert_eq!(tokens.len(), 2);
}

#[test]
fn test_doctype_without_name() {
    let tokens = tokenize("<!DOCTYPE>");
    assert_eq!(tokens[0], Token::Doctype { name: None });
}

#[test]
fn test_tags_are_lowercased() {
    let tokens = tokenize("<DiV></DIV>");
    assert_eq!(
        tokens,
        vec![
            Token::start_tag("div", Vec::new()),
            Token::end_tag("div"),
            Token::EndOfFile
        ]
    );
}

#[test]
fn test_attributes_in_all_quoting_styles() {
    let tokens = tokenize(r#"<a HREF="/x" title='t' data-n=5 hidden>"#);
    assert_eq!(
        tokens[0],
        start(
            "a",
            vec![
                Attribute::new("href", "/x"),
                Attribute::new("title", "t"),
                Attribute::new("data-n", "5"),
                Attribute::new("hidden", ""),
            ],
            false
        )
    );
}

#[test]
fn test_duplicate_attributes_are_kept_in_order() {
    let tokens = tokenize(r#"<p class="a" class="b">"#);
    assert_eq!(
        tokens[0],
        start(
            "p",
            vec![Attribute::new("class", "a"), Attribute::new("class", "b")],
            false
        )
    );
}

#[test]
fn test_self_closing_flag() {
    let tokens = tokenize("<br/><img src=x />");
    assert_eq!(tokens[0], start("br", Vec::new(), true));
    assert_eq!(
        tokens[1],
        start("img", vec![Attribute::new("src", "x")], true)
    );
}

#[test]
fn test_text_between_tags_is_coalesced() {
    let tokens = tokenize("<p>one two</p>three");
    assert_eq!(
        tokens,
        vec![
            Token::start_tag("p", Vec::new()),
            Token::text("one two"),
            Token::end_tag("p"),
            Token::text("three"),
            Token::EndOfFile
        ]
    );
}

#[test]
fn test_comment() {
    let tokens = tokenize("<!-- hi -- there -->x");
    assert_eq!(
        tokens,
        vec![
            Token::Comment {
                data: " hi -- there ".to_string()
            },
            Token::text("x"),
            Token::EndOfFile
        ]
    );
}

#[test]
fn test_abruptly_closed_empty_comments() {
    let tokens = tokenize("<!--><!--->");
    assert_eq!(
        tokens,
        vec![
            Token::Comment {
                data: String::new()
            },
            Token::Comment {
                data: String::new()
            },
            Token::EndOfFile
        ]
    );
}

#[test]
fn test_bogus_comments() {
    let tokens = tokenize("<?xml version?><!foo>");
    assert_eq!(
        tokens,
        vec![
            Token::Comment {
                data: "?xml version?".to_string()
            },
            Token::Comment {
                data: "foo".to_string()
            },
            Token::EndOfFile
        ]
    );
}

#[test]
fn test_unterminated_comment_is_emitted_at_eof() {
    let tokens = tokenize("<!-- open");
    assert_eq!(
        tokens,
        vec![
            Token::Comment {
                data: " open".to_string()
            },
            Token::EndOfFile
        ]
    );
    assert!(tokenizer_issues("<!-- open")[0].starts_with("eof-in-comment"));
}

#[test]
fn test_script_content_is_raw_text() {
    let tokens = tokenize("<script>if (a < b && c) { x = '</div>'; }</script>");
    assert_eq!(
        tokens,
        vec![
            Token::start_tag("script", Vec::new()),
            Token::text("if (a < b && c) { x = '</div>'; }"),
            Token::end_tag("script"),
            Token::EndOfFile
        ]
    );
}

#[test]
fn test_raw_text_end_tag_is_case_insensitive() {
    let tokens = tokenize("<style>p{}</STYLE>");
    assert_eq!(tokens[2], Token::end_tag("style"));
}

#[test]
fn test_title_decodes_character_references() {
    let tokens = tokenize("<title>a &amp; <b></title>");
    assert_eq!(tokens[1], Token::text("a & <b>"));
    assert_eq!(tokens[2], Token::end_tag("title"));
}

#[test]
fn test_named_character_references() {
    let tokens = tokenize("&lt;&gt;&quot;&apos;&nbsp;&copy;&reg;");
    assert_eq!(tokens[0], Token::text("<>\"'\u{A0}\u{A9}\u{AE}"));
}

#[test]
fn test_legacy_reference_without_semicolon() {
    let tokens = tokenize("fish &amp chips &ampx");
    assert_eq!(tokens[0], Token::text("fish & chips &x"));
}

#[test]
fn test_unknown_references_pass_through() {
    let tokens = tokenize("&bogus; & &; &#;");
    assert_eq!(tokens[0], Token::text("&bogus; & &; &#;"));
}

#[test]
fn test_numeric_character_references() {
    let tokens = tokenize("&#65;&#x42;&#X43;&#100");
    assert_eq!(tokens[0], Token::text("ABCd"));
}

#[test]
fn test_invalid_numeric_references_become_replacement_character() {
    let tokens = tokenize("&#0;&#xD800;&#x110000;&#99999999999;");
    assert_eq!(tokens[0], Token::text("\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}"));
}

#[test]
fn test_references_in_attributes() {
    let tokens = tokenize(r#"<a href="?a=1&amp;b=2&copy=3" title="&lt;x&gt">"#);
    assert_eq!(
        tokens[0],
        start(
            "a",
            vec![
                Attribute::new("href", "?a=1&b=2&copy=3"),
                Attribute::new("title", "<x>"),
            ],
            false
        )
    );
}

#[test]
fn test_lone_less_than_is_text() {
    let tokens = tokenize("a < b <");
    assert_eq!(tokens, vec![Token::text("a < b <"), Token::EndOfFile]);
}

#[test]
fn test_newlines_are_normalized() {
    let tokens = tokenize("a\r\nb\rc");
    assert_eq!(tokens[0], Token::text("a\nb\nc"));
}

#[test]
fn test_tag_cut_off_by_eof_is_dropped() {
    let tokens = tokenize("text<div class=");
    assert_eq!(tokens, vec![Token::text("text"), Token::EndOfFile]);
    assert!(
        tokenizer_issues("text<div class=")
            .iter()
            .any(|m| m.starts_with("eof-in-tag"))
    );
}

#[test]
fn test_end_tag_attributes_are_dropped() {
    let tokens = tokenize(r#"</p class="x">"#);
    assert_eq!(tokens[0], Token::end_tag("p"));
}
