//! Provides definitions of tokens from the QuickSFC language.
use std::fmt;

use quicksfc_dsl::core::SourceLoc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// `SI`, declares the initial step.
    InitialStep,
    /// `S`, declares a step.
    Step,
    /// `T`, declares a transition.
    Transition,
    /// `END`, closes the document.
    End,
    LeftParen,
    RightParen,
    Comma,
    /// Text inside the parentheses of a step.
    Action,
    /// Text inside the parentheses of a transition.
    Condition,
    Number,
    /// Identifier, including the name after `@`.
    Name,
    At,
    /// `>>`
    Jump,
    /// `->`
    Arrow,
    /// `|`
    LegSeparator,
    /// `/\`
    OrDiverge,
    /// `\/`
    OrConverge,
    /// `//\\`
    AndDiverge,
    /// `\\//`
    AndConverge,
    Newline,
    Eof,
}

impl TokenType {
    /// The name used for the token type in messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenType::InitialStep => "SI",
            TokenType::Step => "S",
            TokenType::Transition => "T",
            TokenType::End => "END",
            TokenType::LeftParen => "LPAREN",
            TokenType::RightParen => "RPAREN",
            TokenType::Comma => "COMMA",
            TokenType::Action => "ACTION",
            TokenType::Condition => "CONDITION",
            TokenType::Number => "NUMBER",
            TokenType::Name => "NAME",
            TokenType::At => "AT",
            TokenType::Jump => "JUMP",
            TokenType::Arrow => "ARROW",
            TokenType::LegSeparator => "LEG_SEPARATOR",
            TokenType::OrDiverge => "OR_DIVERGE",
            TokenType::OrConverge => "OR_CONVERGE",
            TokenType::AndDiverge => "AND_DIVERGE",
            TokenType::AndConverge => "AND_CONVERGE",
            TokenType::Newline => "NEWLINE",
            TokenType::Eof => "EOF",
        }
    }

    /// True for the keywords that declare a step or a transition.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            TokenType::InitialStep | TokenType::Step | TokenType::Transition
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    /// The literal value. For actions and conditions this is the captured
    /// text without surrounding whitespace.
    pub text: String,
    pub loc: SourceLoc,
}

impl Token {
    pub fn line(&self) -> usize {
        self.loc.line
    }

    /// Describes the token for messages, including the text when the type
    /// alone is not enough.
    pub fn describe(&self) -> String {
        match self.token_type {
            TokenType::Name | TokenType::Number => {
                format!("{} '{}'", self.token_type, self.text)
            }
            _ => self.token_type.describe().to_string(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type: {}, Value: '{}', At: Ln {}",
            self.token_type,
            self.text.escape_debug(),
            self.loc.line
        )
    }
}

/// A `#` comment. Comments are not tokens but are kept so that they can
/// be attached to the elements they describe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    /// Comment text without the leading `#`.
    pub text: String,
    pub loc: SourceLoc,
    /// True when the comment is the only content of its line.
    pub full_line: bool,
}

/// The result of tokenizing a document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
}

impl TokenStream {
    pub fn types(&self) -> Vec<TokenType> {
        self.tokens.iter().map(|t| t.token_type).collect()
    }
}

impl From<Vec<Token>> for TokenStream {
    fn from(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            comments: vec![],
        }
    }
}
