//! Primary lexer for the QuickSFC language. The lexer transforms
//! text into tokens (tokens are the input to the parser).
//!
//! Most tokens are plain lexemes. Two are context sensitive:
//! * the name after `@` is always a name, even if it spells a keyword
//! * the text after `(` is captured verbatim up to the first top-level
//!   `,` or `)` and becomes an action or a condition depending on the most
//!   recent declaration keyword
use logos::{Lexer, Logos};
use quicksfc_dsl::{
    core::{FileId, SourceLoc},
    diagnostic::{Diagnostic, Label},
    error::TokenizeError,
};
use quicksfc_problems::Problem;

use crate::token::{Comment, Token, TokenStream, TokenType};

#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
#[logos(skip r"[ \t\r]+")]
enum Lexeme {
    #[token("\n")]
    Newline,

    #[regex(r"#[^\n]*")]
    Comment,

    #[token("//\\\\")]
    AndDiverge,
    #[token("\\\\//")]
    AndConverge,
    #[token(">>")]
    Jump,
    #[token("->")]
    Arrow,
    #[token("/\\")]
    OrDiverge,
    #[token("\\/")]
    OrConverge,
    #[token("|")]
    LegSeparator,

    #[token("SI")]
    InitialStep,
    #[token("S", priority = 3)]
    Step,
    #[token("T", priority = 3)]
    Transition,
    #[token("END")]
    End,

    #[token("@")]
    At,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token(",")]
    Comma,

    #[regex("[0-9]+")]
    Number,

    #[regex("[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,
}

impl Lexeme {
    /// The token type for lexemes that map one to one onto a token.
    fn token_type(&self) -> Option<TokenType> {
        match self {
            Lexeme::Newline => Some(TokenType::Newline),
            Lexeme::AndDiverge => Some(TokenType::AndDiverge),
            Lexeme::AndConverge => Some(TokenType::AndConverge),
            Lexeme::Jump => Some(TokenType::Jump),
            Lexeme::Arrow => Some(TokenType::Arrow),
            Lexeme::OrDiverge => Some(TokenType::OrDiverge),
            Lexeme::OrConverge => Some(TokenType::OrConverge),
            Lexeme::LegSeparator => Some(TokenType::LegSeparator),
            Lexeme::InitialStep => Some(TokenType::InitialStep),
            Lexeme::Step => Some(TokenType::Step),
            Lexeme::Transition => Some(TokenType::Transition),
            Lexeme::End => Some(TokenType::End),
            Lexeme::At => Some(TokenType::At),
            Lexeme::LeftParen => Some(TokenType::LeftParen),
            Lexeme::RightParen => Some(TokenType::RightParen),
            Lexeme::Comma => Some(TokenType::Comma),
            Lexeme::Number => Some(TokenType::Number),
            Lexeme::Identifier => Some(TokenType::Name),
            Lexeme::Comment => None,
        }
    }

    /// True for lexemes that can be used as a name after `@`.
    fn is_word(&self) -> bool {
        matches!(
            self,
            Lexeme::Identifier
                | Lexeme::InitialStep
                | Lexeme::Step
                | Lexeme::Transition
                | Lexeme::End
        )
    }
}

/// Tokenize a QuickSFC document.
///
/// Returns the tokens, terminated by a single EOF token, and the comments
/// that were skipped. The first malformed character stops tokenizing.
pub fn tokenize(source: &str, file_id: &FileId) -> Result<TokenStream, TokenizeError> {
    let mut lexer = Lexeme::lexer(source);
    let mut stream = TokenStream::default();

    let mut line: usize = 1;
    let mut line_has_token = false;
    // Bodies are conditions until a step keyword says otherwise.
    let mut body_type = TokenType::Condition;

    while let Some(lexeme) = lexer.next() {
        let span = lexer.span();
        let loc = SourceLoc::new(line, span.start, span.end);

        let lexeme = match lexeme {
            Ok(lexeme) => lexeme,
            Err(_) => {
                return Err(error(
                    Problem::UnexpectedCharacter,
                    file_id,
                    &loc,
                    format!("Unexpected character: '{}'", lexer.slice()),
                ))
            }
        };

        match lexeme {
            Lexeme::Comment => {
                stream.comments.push(Comment {
                    text: lexer.slice()[1..].trim().to_string(),
                    loc,
                    full_line: !line_has_token,
                });
                continue;
            }
            Lexeme::At => {
                stream.tokens.push(token(TokenType::At, lexer.slice(), loc));
                let name = read_name(&mut lexer, file_id, line)?;
                stream.tokens.push(name);
            }
            Lexeme::LeftParen => {
                stream
                    .tokens
                    .push(token(TokenType::LeftParen, lexer.slice(), loc));
                let body = capture_body(&mut lexer, line, body_type);
                stream.tokens.push(body);
            }
            Lexeme::InitialStep | Lexeme::Step => {
                body_type = TokenType::Action;
                push_lexeme(&mut stream, lexeme, lexer.slice(), loc);
            }
            Lexeme::Transition => {
                body_type = TokenType::Condition;
                push_lexeme(&mut stream, lexeme, lexer.slice(), loc);
            }
            _ => push_lexeme(&mut stream, lexeme, lexer.slice(), loc),
        }

        if lexeme == Lexeme::Newline {
            line += 1;
            line_has_token = false;
        } else {
            line_has_token = true;
        }
    }

    let end = source.len();
    stream.tokens.push(token(
        TokenType::Eof,
        "",
        SourceLoc::new(line, end, end),
    ));

    Ok(stream)
}

fn token(token_type: TokenType, text: &str, loc: SourceLoc) -> Token {
    Token {
        token_type,
        text: text.to_string(),
        loc,
    }
}

fn push_lexeme(stream: &mut TokenStream, lexeme: Lexeme, text: &str, loc: SourceLoc) {
    if let Some(token_type) = lexeme.token_type() {
        stream.tokens.push(token(token_type, text, loc));
    }
}

/// Reads the name that must immediately follow `@`.
fn read_name(
    lexer: &mut Lexer<Lexeme>,
    file_id: &FileId,
    line: usize,
) -> Result<Token, TokenizeError> {
    let at_end = lexer.span().end;
    let expected = |start: usize, end: usize| {
        error(
            Problem::NameExpectedAfterAt,
            file_id,
            &SourceLoc::new(line, start, end),
            "Expected identifier after '@'",
        )
    };

    match lexer.next() {
        Some(Ok(lexeme)) if lexeme.is_word() && lexer.span().start == at_end => {
            let span = lexer.span();
            Ok(token(
                TokenType::Name,
                lexer.slice(),
                SourceLoc::new(line, span.start, span.end),
            ))
        }
        Some(_) => Err(expected(at_end, lexer.span().end)),
        None => Err(expected(at_end, at_end)),
    }
}

/// Captures the text following `(` up to the first `,` or `)` that is not
/// nested inside parentheses. The capture never crosses a newline.
fn capture_body(lexer: &mut Lexer<Lexeme>, line: usize, body_type: TokenType) -> Token {
    let start = lexer.span().end;
    let remainder = lexer.remainder();

    let mut depth: usize = 0;
    let mut length = remainder.len();
    for (idx, ch) in remainder.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' if depth == 0 => {
                length = idx;
                break;
            }
            ')' => depth -= 1,
            ',' if depth == 0 => {
                length = idx;
                break;
            }
            '\n' => {
                length = idx;
                break;
            }
            _ => {}
        }
    }

    let text = remainder[..length].trim();
    lexer.bump(length);

    token(body_type, text, SourceLoc::new(line, start, start + length))
}

fn error(
    problem: Problem,
    file_id: &FileId,
    loc: &SourceLoc,
    message: impl Into<String>,
) -> TokenizeError {
    TokenizeError::new(Diagnostic::problem(
        problem,
        Label::source_loc(file_id, loc, message),
    ))
}
