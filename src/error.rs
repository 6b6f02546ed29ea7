use std::rc::Rc;

use crate::term::{Pi, Term};

/// An error travelling up the promise tree. Balls are catchable by
/// `catch/3`; an interrupt is not.
#[derive(Debug, Clone)]
pub enum Exception {
    Ball(Rc<Term>),
    Interrupted,
}

impl Exception {
    pub fn ball(&self) -> Option<&Rc<Term>> {
        match self {
            Exception::Ball(t) => Some(t),
            Exception::Interrupted => None,
        }
    }
}

/// The error surface of the host API: what `consult` and `query` return.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("uncaught exception: {0}")]
    Uncaught(Rc<Term>),

    #[error(transparent)]
    Syntax(#[from] crate::read_term::Error),

    #[error("directive failed: {0}")]
    DirectiveFailed(Rc<Term>),

    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<Exception> for Error {
    fn from(e: Exception) -> Self {
        match e {
            Exception::Ball(t) => Error::Uncaught(t),
            Exception::Interrupted => Error::Interrupted,
        }
    }
}

// All ISO balls have the shape error(Descriptor, Context).

fn ball(descriptor: Rc<Term>, context: Rc<Term>) -> Exception {
    Exception::Ball(Term::new_compound("error", vec![descriptor, context]))
}

pub(crate) fn instantiation_error(culprit: &Rc<Term>) -> Exception {
    ball(Term::new_atom("instantiation_error"), culprit.clone())
}

pub(crate) fn type_error(kind: &str, culprit: &Rc<Term>) -> Exception {
    ball(
        Term::new_compound("type_error", vec![Term::new_atom(kind), culprit.clone()]),
        culprit.clone(),
    )
}

pub(crate) fn domain_error(kind: &str, culprit: &Rc<Term>) -> Exception {
    ball(
        Term::new_compound("domain_error", vec![Term::new_atom(kind), culprit.clone()]),
        culprit.clone(),
    )
}

pub(crate) fn existence_error(kind: &str, culprit: &Rc<Term>) -> Exception {
    ball(
        Term::new_compound(
            "existence_error",
            vec![Term::new_atom(kind), culprit.clone()],
        ),
        culprit.clone(),
    )
}

pub(crate) fn existence_error_procedure(pi: &Pi) -> Exception {
    existence_error("procedure", &pi.as_term())
}

pub(crate) fn permission_error(operation: &str, kind: &str, culprit: &Rc<Term>) -> Exception {
    ball(
        Term::new_compound(
            "permission_error",
            vec![
                Term::new_atom(operation),
                Term::new_atom(kind),
                culprit.clone(),
            ],
        ),
        culprit.clone(),
    )
}

pub(crate) fn representation_error(kind: &str, info: &str) -> Exception {
    ball(
        Term::new_compound("representation_error", vec![Term::new_atom(kind)]),
        Term::new_atom(info),
    )
}

pub(crate) fn evaluation_error(kind: &str) -> Exception {
    ball(
        Term::new_compound("evaluation_error", vec![Term::new_atom(kind)]),
        Term::new_atom(kind),
    )
}

pub(crate) fn syntax_error(detail: &str) -> Exception {
    ball(
        Term::new_compound("syntax_error", vec![Term::new_atom(detail)]),
        Term::new_atom(detail),
    )
}

pub(crate) fn system_error(info: impl std::fmt::Display) -> Exception {
    ball(
        Term::new_atom("system_error"),
        Term::new_atom(info.to_string()),
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn type_error_ball_shape() {
        let e = type_error("integer", &Term::new_atom("a"));
        let t = e.ball().unwrap();
        let c = t.as_compound("error", 2).unwrap();
        let d = c.args[0].as_compound("type_error", 2).unwrap();
        assert!(d.args[0].is_atom("integer"));
        assert!(d.args[1].is_atom("a"));
    }

    #[test]
    fn interrupts_are_not_balls() {
        assert!(Exception::Interrupted.ball().is_none());
    }
}
