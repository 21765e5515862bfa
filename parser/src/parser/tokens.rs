use std::fmt::{Display, Formatter};

use logos::{Logos, Span};

use crate::parser::parse_error::positioned;
use crate::parser::ParseResult;

#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[logos(subpattern decimal = r"[0-9]+")]
#[logos(subpattern exponent = r"[eE][+-]?[0-9]+")]
#[logos(skip r"[ \t\n\r\f]+")]
#[logos(skip r"#[^\r\n]*")] // single line comment
pub enum Token {
    #[token("and", ignore(ascii_case))]
    OpAnd,

    #[token("atan2", ignore(ascii_case))]
    OpAtan2,

    #[token("bool", ignore(ascii_case))]
    Bool,

    #[token("by", ignore(ascii_case))]
    By,

    #[token("group_left", ignore(ascii_case))]
    GroupLeft,

    #[token("group_right", ignore(ascii_case))]
    GroupRight,

    #[token("ignoring", ignore(ascii_case))]
    Ignoring,

    #[token("offset", ignore(ascii_case))]
    Offset,

    #[token("on", ignore(ascii_case))]
    On,

    #[token("or", ignore(ascii_case))]
    OpOr,

    #[token("unless", ignore(ascii_case))]
    OpUnless,

    #[token("without", ignore(ascii_case))]
    Without,

    #[regex(r"((?&decimal)(ms|s|m|h|d|w|y))+")]
    Duration,

    #[token("inf", ignore(ascii_case))]
    #[token("nan", ignore(ascii_case))]
    #[regex(r"(?&decimal)(\.[0-9]*)?(?&exponent)?")]
    #[regex(r"\.(?&decimal)(?&exponent)?")]
    #[regex(r"0[xX][0-9a-fA-F]+")]
    Number,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_:]*")]
    Identifier,

    #[regex(r#""(?:[^"\\\n]|\\.)*""#)]
    #[regex(r#"'(?:[^'\\\n]|\\.)*'"#)]
    #[regex(r"`[^`]*`")]
    StringLiteral,

    #[token("@")]
    At,

    #[token("{")]
    LeftBrace,

    #[token("}")]
    RightBrace,

    #[token("[")]
    LeftBracket,

    #[token("]")]
    RightBracket,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("=")]
    Equal,

    #[token("==")]
    OpEqual,

    #[token("!=")]
    OpNotEqual,

    #[token("<")]
    OpLessThan,

    #[token("<=")]
    OpLessThanOrEqual,

    #[token(">")]
    OpGreaterThan,

    #[token(">=")]
    OpGreaterThanOrEqual,

    #[token("+")]
    OpPlus,

    #[token("-")]
    OpMinus,

    #[token("/")]
    OpDiv,

    #[token("*")]
    OpMul,

    #[token("^")]
    OpPow,

    #[token("%")]
    OpMod,

    #[token("=~")]
    RegexEqual,

    #[token("!~")]
    RegexNotEqual,
}

impl Token {
    #[inline]
    pub fn is_group_modifier(&self) -> bool {
        use Token::*;
        matches!(self, On | Ignoring)
    }

    #[inline]
    pub fn is_join_modifier(&self) -> bool {
        use Token::*;
        matches!(self, GroupLeft | GroupRight)
    }

    #[inline]
    pub fn is_aggregate_modifier(&self) -> bool {
        use Token::*;
        matches!(self, By | Without)
    }

    pub fn is_keyword(&self) -> bool {
        use Token::*;
        matches!(
            self,
            OpAnd
                | OpAtan2
                | Bool
                | By
                | GroupLeft
                | GroupRight
                | Ignoring
                | Offset
                | On
                | OpOr
                | OpUnless
                | Without
        )
    }

    /// Keywords are valid label names inside grouping lists and selectors.
    pub fn is_label_name(&self) -> bool {
        *self == Token::Identifier || self.is_keyword()
    }

    pub fn as_str(&self) -> &'static str {
        use Token::*;
        match self {
            OpAnd => "and",
            OpAtan2 => "atan2",
            Bool => "bool",
            By => "by",
            GroupLeft => "group_left",
            GroupRight => "group_right",
            Ignoring => "ignoring",
            Offset => "offset",
            On => "on",
            OpOr => "or",
            OpUnless => "unless",
            Without => "without",
            Duration => "duration",
            Number => "number",
            Identifier => "identifier",
            StringLiteral => "string",
            At => "@",
            LeftBrace => "{",
            RightBrace => "}",
            LeftBracket => "[",
            RightBracket => "]",
            Comma => ",",
            Colon => ":",
            LeftParen => "(",
            RightParen => ")",
            Equal => "=",
            OpEqual => "==",
            OpNotEqual => "!=",
            OpLessThan => "<",
            OpLessThanOrEqual => "<=",
            OpGreaterThan => ">",
            OpGreaterThanOrEqual => ">=",
            OpPlus => "+",
            OpMinus => "-",
            OpDiv => "/",
            OpMul => "*",
            OpPow => "^",
            OpMod => "%",
            RegexEqual => "=~",
            RegexNotEqual => "!~",
        }
    }

    /// Human readable description of a token occurrence for error messages.
    pub fn describe(&self, text: &str) -> String {
        use Token::*;
        match self {
            Duration | Number | Identifier | StringLiteral => {
                format!("{} {:?}", self.as_str(), text)
            }
            _ => format!("{:?}", text),
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A token together with its source text and byte range.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithLocation<'a> {
    pub kind: Token,
    pub text: &'a str,
    pub span: Span,
}

/// Splits a query into tokens, failing on the first character that starts no valid token.
pub fn tokenize(input: &str) -> ParseResult<Vec<TokenWithLocation<'_>>> {
    let mut lexer = Token::lexer(input);
    let mut tokens = Vec::with_capacity(input.len() / 3 + 1);

    while let Some(next) = lexer.next() {
        let span = lexer.span();
        let text = lexer.slice();
        match next {
            Ok(kind) => tokens.push(TokenWithLocation { kind, text, span }),
            Err(_) => {
                let msg = match text.chars().next() {
                    Some(ch @ ('"' | '\'' | '`')) => {
                        format!("unterminated quoted string {ch}")
                    }
                    Some(ch) => format!("unexpected character: {ch:?}"),
                    None => "unexpected end of input".to_string(),
                };
                return Err(positioned(input, &msg, &span));
            }
        }
    }

    Ok(tokens)
}
