mod lexer;
mod parser;

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::Exception;
use crate::flags::Flags;
use crate::operators::OperatorTable;
use crate::stream::{ByteSource, CharStream};
use crate::term::{Term, Var};

pub(crate) use parser::Parser;

/// Everything the reader needs from the engine: the live operator table,
/// flags, and the character conversion map.
pub(crate) struct ReadContext<'a> {
    pub ops: &'a OperatorTable,
    pub flags: &'a Flags,
    pub conversions: &'a HashMap<char, char>,
}

/// A variable met while parsing, with its source name and occurrence count
/// (`read_term/3` derives `singletons`/`variables`/`variable_names` from
/// these).
#[derive(Debug, Clone)]
pub struct ParsedVar {
    pub name: String,
    pub var: Var,
    pub count: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing closing {0}")]
    Missing(char),
    #[error("bad escape sequence \\{0}")]
    BadEscape(String),
    #[error("bad integer literal {0}")]
    BadInteger(String),
    #[error("bad float literal {0}")]
    BadFloat(String),
    #[error("unexpected input {0}")]
    Unexpected(String),
    #[error("unexpected token {0}")]
    UnexpectedToken(String),
    #[error("unexpected end of input")]
    Insufficient,
    #[error("operand expected after operator")]
    MissingOperand,
    #[error("not a number")]
    NotANumber,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when more input could turn this into a valid clause; the REPL
    /// keeps reading lines on this.
    pub fn is_insufficient(&self) -> bool {
        matches!(self, Error::Insufficient)
    }

    pub(crate) fn to_ball(&self) -> Exception {
        match self {
            Error::Insufficient => crate::error::syntax_error("insufficient_input"),
            Error::NotANumber => crate::error::syntax_error("not_a_number"),
            Error::UnexpectedToken(_) | Error::Unexpected(_) => {
                crate::error::syntax_error("unexpected_token")
            }
            Error::Missing(_) | Error::MissingOperand => {
                crate::error::syntax_error("unexpected_token")
            }
            Error::BadEscape(_) => crate::error::syntax_error("bad_escape"),
            Error::BadInteger(_) | Error::BadFloat(_) => {
                crate::error::syntax_error("not_a_number")
            }
            Error::Io(e) => crate::error::system_error(e),
        }
    }
}

/// Reads one clause from src. Returns None at a clean end of input.
pub(crate) fn parse_term(
    src: &mut dyn CharStream,
    ctx: &ReadContext,
) -> Result<Option<(Rc<Term>, Vec<ParsedVar>)>, Error> {
    let mut p = Parser::new(ctx, src)?;
    p.next_clause()
}

/// Parses the text of a number, as `number_chars/2` and `number_codes/2`
/// require: an optional sign followed by a single numeric literal.
pub(crate) fn parse_number(text: &str) -> Result<Rc<Term>, Error> {
    let flags = Flags::default();
    let ops = OperatorTable::new();
    let conversions = HashMap::new();
    let ctx = ReadContext {
        ops: &ops,
        flags: &flags,
        conversions: &conversions,
    };
    let mut src = ByteSource::from_string(text);
    let mut negative = false;
    let mut tok = lexer::next(&ctx, &mut src)?;
    if let lexer::Token::Name(s) = &tok {
        if s == "-" {
            negative = true;
            tok = lexer::next(&ctx, &mut src)?;
        } else {
            return Err(Error::NotANumber);
        }
    }
    let t = match tok {
        lexer::Token::Int(i) => Term::new_integer(if negative { -i } else { i }),
        lexer::Token::Float(f) => Term::new_float(if negative { -f } else { f }),
        _ => return Err(Error::NotANumber),
    };
    match lexer::next(&ctx, &mut src)? {
        lexer::Token::Eof => Ok(t),
        _ => Err(Error::NotANumber),
    }
}
