use std::rc::Rc;

use super::lexer::{self, Token};
use super::{Error, ParsedVar, ReadContext};
use crate::flags::QuoteFlag;
use crate::operators::{Operator, Specifier};
use crate::stream::CharStream;
use crate::term::{Term, Var};

/// A Pratt parser over the token stream, parameterized by the operator
/// table. Priorities invert into binding powers (1201 - priority), so
/// `expr(1)` reads a full 1200-priority term.
pub(crate) struct Parser<'a> {
    ctx: &'a ReadContext<'a>,
    stream: &'a mut dyn CharStream,
    current: Token,
    vars: Vec<ParsedVar>,
}

impl<'a> Parser<'a> {
    pub fn new(ctx: &'a ReadContext<'a>, stream: &'a mut dyn CharStream) -> Result<Self, Error> {
        let current = lexer::next(ctx, stream)?;
        Ok(Self {
            ctx,
            stream,
            current,
            vars: Vec::new(),
        })
    }

    fn advance(&mut self) -> Result<Token, Error> {
        let next = lexer::next(self.ctx, self.stream)?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// Reads one clause: a term followed by the end token. None on a clean
    /// end of input; Error::Insufficient when input stops mid-clause.
    /// Nothing beyond the end token is consumed, so the underlying stream
    /// stays positioned at the next clause.
    pub fn next_clause(&mut self) -> Result<Option<(Rc<Term>, Vec<ParsedVar>)>, Error> {
        if matches!(self.current, Token::Eof) {
            return Ok(None);
        }
        self.vars.clear();
        let t = self.expr(1, false)?;
        match &self.current {
            Token::End => Ok(Some((t, std::mem::take(&mut self.vars)))),
            Token::Eof => Err(Error::Insufficient),
            tok => Err(Error::UnexpectedToken(format!("{:?}", tok))),
        }
    }

    // Pratt loop: a primary, then operators whose left power clears min_bp.
    fn expr(&mut self, min_bp: u16, in_args: bool) -> Result<Rc<Term>, Error> {
        let mut lhs = self.primary(min_bp, in_args)?;
        loop {
            let op = match &self.current {
                Token::Name(s) => match self.ctx.ops.lookup_trailing(s) {
                    Some(op) => op.clone(),
                    None => break,
                },
                Token::Comma if !in_args => Operator {
                    priority: 1000,
                    specifier: Specifier::xfy,
                    name: ",".to_string(),
                },
                Token::Bar if !in_args => match self.ctx.ops.lookup_trailing("|") {
                    Some(op) => op.clone(),
                    None => break,
                },
                _ => break,
            };
            let (l, r) = op.binding_powers();
            if l < min_bp {
                break;
            }
            self.advance()?;
            if r == 0 {
                lhs = Term::new_compound(&op.name, vec![lhs]);
            } else {
                let rhs = self.expr(r, in_args)?;
                lhs = Term::new_compound(&op.name, vec![lhs, rhs]);
            }
        }
        Ok(lhs)
    }

    fn primary(&mut self, min_bp: u16, in_args: bool) -> Result<Rc<Term>, Error> {
        match self.advance()? {
            Token::Eof => Err(Error::Insufficient),
            Token::Name(s) => self.name(s, min_bp, in_args),
            Token::Var(name) => Ok(self.variable(name)),
            Token::Int(i) => Ok(Term::new_integer(i)),
            Token::Float(f) => Ok(Term::new_float(f)),
            Token::Str(s) => Ok(self.expand_string(&s)),
            Token::Open | Token::OpenCt => {
                let t = self.expr(1, false)?;
                match self.advance()? {
                    Token::Close => Ok(t),
                    Token::Eof => Err(Error::Insufficient),
                    _ => Err(Error::Missing(')')),
                }
            }
            Token::OpenL => self.list(),
            Token::OpenC => {
                if matches!(self.current, Token::CloseC) {
                    self.advance()?;
                    return Ok(Term::new_atom("{}"));
                }
                let t = self.expr(1, false)?;
                match self.advance()? {
                    Token::CloseC => Ok(Term::new_compound("{}", vec![t])),
                    Token::Eof => Err(Error::Insufficient),
                    _ => Err(Error::Missing('}')),
                }
            }
            tok => Err(Error::UnexpectedToken(format!("{:?}", tok))),
        }
    }

    // A name starts a compound, a negative number literal, a prefix
    // operator application, or stands as a plain atom.
    fn name(&mut self, s: String, _min_bp: u16, in_args: bool) -> Result<Rc<Term>, Error> {
        match &self.current {
            Token::OpenCt => {
                self.advance()?;
                self.compound(s)
            }
            Token::Int(i) if s == "-" => {
                let i = *i;
                self.advance()?;
                Ok(Term::new_integer(i.wrapping_neg()))
            }
            Token::Float(f) if s == "-" => {
                let f = *f;
                self.advance()?;
                Ok(Term::new_float(-f))
            }
            _ => {
                if let Some(op) = self.ctx.ops.lookup_prefix(&s) {
                    if self.starts_term() {
                        let (_, r) = op.binding_powers();
                        let operand = self.expr(r, in_args)?;
                        return Ok(Term::new_compound(&s, vec![operand]));
                    }
                }
                Ok(Term::new_atom(s))
            }
        }
    }

    // Whether the current token can begin an operand.
    fn starts_term(&self) -> bool {
        match &self.current {
            Token::Eof
            | Token::Close
            | Token::CloseL
            | Token::CloseC
            | Token::Bar
            | Token::Comma
            | Token::End => false,
            Token::Name(s) => {
                // an infix-only operator cannot start an operand
                !(self.ctx.ops.lookup_trailing(s).is_some()
                    && self.ctx.ops.lookup_prefix(s).is_none())
            }
            _ => true,
        }
    }

    fn compound(&mut self, functor: String) -> Result<Rc<Term>, Error> {
        let mut args = Vec::new();
        loop {
            args.push(self.expr(1, true)?);
            match self.advance()? {
                Token::Comma => {}
                Token::Close => return Ok(Term::new_compound(&functor, args)),
                Token::Eof => return Err(Error::Insufficient),
                _ => return Err(Error::Missing(')')),
            }
        }
    }

    fn list(&mut self) -> Result<Rc<Term>, Error> {
        if matches!(self.current, Token::CloseL) {
            self.advance()?;
            return Ok(Term::nil());
        }
        let mut items = Vec::new();
        loop {
            items.push(self.expr(1, true)?);
            match self.advance()? {
                Token::Comma => {}
                Token::Bar => {
                    let tail = self.expr(1, true)?;
                    return match self.advance()? {
                        Token::CloseL => Ok(Term::new_partial_list(items, tail)),
                        Token::Eof => Err(Error::Insufficient),
                        _ => Err(Error::Missing(']')),
                    };
                }
                Token::CloseL => return Ok(Term::new_list(items)),
                Token::Eof => return Err(Error::Insufficient),
                _ => return Err(Error::Missing(']')),
            }
        }
    }

    fn variable(&mut self, name: String) -> Rc<Term> {
        if name == "_" {
            return Term::new_var();
        }
        for v in &mut self.vars {
            if v.name == name {
                v.count += 1;
                return Rc::new(Term::Var(v.var));
            }
        }
        let var = Var::new();
        self.vars.push(ParsedVar {
            name,
            var,
            count: 1,
        });
        Rc::new(Term::Var(var))
    }

    fn expand_string(&self, s: &str) -> Rc<Term> {
        match self.ctx.flags.double_quotes {
            QuoteFlag::Atom => Term::new_atom(s),
            QuoteFlag::Chars => Term::new_list(
                s.chars()
                    .map(|c| Term::new_atom(c.to_string()))
                    .collect(),
            ),
            QuoteFlag::Codes => Term::new_list(
                s.chars()
                    .map(|c| Term::new_integer(c as i64))
                    .collect(),
            ),
        }
    }
}
