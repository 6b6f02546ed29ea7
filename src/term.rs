use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::env::Env;
use crate::error::Exception;

/// A logic variable, identified by a process-unique id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(u64);

static VAR_COUNTER: AtomicU64 = AtomicU64::new(0);

impl Var {
    pub fn new() -> Self {
        Var(VAR_COUNTER.fetch_add(1, AtomicOrdering::Relaxed) + 1)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Default for Var {
    fn default() -> Self {
        Var::new()
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    pub functor: String,
    pub args: Vec<Rc<Term>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Var(Var),
    Atom(String),
    Integer(i64),
    Float(f64),
    Compound(Compound),
}

impl Term {
    pub fn new_var() -> Rc<Term> {
        Rc::new(Term::Var(Var::new()))
    }

    pub fn new_atom(s: impl Into<String>) -> Rc<Term> {
        Rc::new(Term::Atom(s.into()))
    }

    pub fn new_integer(i: i64) -> Rc<Term> {
        Rc::new(Term::Integer(i))
    }

    pub fn new_float(f: f64) -> Rc<Term> {
        Rc::new(Term::Float(f))
    }

    /// An arity-0 "compound" collapses to the atom of the same name.
    pub fn new_compound(functor: &str, args: Vec<Rc<Term>>) -> Rc<Term> {
        if args.is_empty() {
            Term::new_atom(functor)
        } else {
            Rc::new(Term::Compound(Compound {
                functor: functor.to_string(),
                args,
            }))
        }
    }

    pub fn nil() -> Rc<Term> {
        Term::new_atom("[]")
    }

    pub fn new_list(items: Vec<Rc<Term>>) -> Rc<Term> {
        Self::new_partial_list(items, Term::nil())
    }

    pub fn new_partial_list(items: Vec<Rc<Term>>, tail: Rc<Term>) -> Rc<Term> {
        let mut list = tail;
        for item in items.into_iter().rev() {
            list = Term::new_compound(".", vec![item, list]);
        }
        list
    }

    pub fn is_atom(&self, name: &str) -> bool {
        matches!(self, Term::Atom(s) if s == name)
    }

    pub fn as_compound(&self, functor: &str, arity: usize) -> Option<&Compound> {
        match self {
            Term::Compound(c) if c.functor == functor && c.args.len() == arity => Some(c),
            _ => None,
        }
    }
}

/// The (name, arity) pair keying the procedure database.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pi {
    pub name: String,
    pub arity: usize,
}

impl Pi {
    pub fn new(name: &str, arity: usize) -> Self {
        Pi {
            name: name.to_string(),
            arity,
        }
    }

    /// The `Name/Arity` term form.
    pub fn as_term(&self) -> Rc<Term> {
        Term::new_compound(
            "/",
            vec![
                Term::new_atom(&self.name),
                Term::new_integer(self.arity as i64),
            ],
        )
    }
}

impl fmt::Display for Pi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

/// Splits a callable term into its procedure indicator and argument list.
pub(crate) fn pi_args(t: &Rc<Term>, env: &Env) -> Result<(Pi, Vec<Rc<Term>>), Exception> {
    let t = env.resolve(t);
    match &*t {
        Term::Var(_) => Err(crate::error::instantiation_error(&t)),
        Term::Atom(s) => Ok((Pi::new(s, 0), Vec::new())),
        Term::Compound(c) => Ok((Pi::new(&c.functor, c.args.len()), c.args.clone())),
        _ => Err(crate::error::type_error("callable", &t)),
    }
}

/// Returns t if t is already in `P :- Q` form, `t :- true` otherwise.
pub(crate) fn rulify(t: &Rc<Term>, env: &Env) -> Rc<Term> {
    let t = env.resolve(t);
    if t.as_compound(":-", 2).is_some() {
        t
    } else {
        Term::new_compound(":-", vec![t, Term::new_atom("true")])
    }
}

/// Standard order of terms: Var < Float|Integer < Atom < Compound.
/// Cycle-safe: a revisited pair of compounds compares equal.
pub fn compare(a: &Rc<Term>, b: &Rc<Term>, env: &Env) -> Ordering {
    let mut seen = Vec::new();
    compare_guarded(a, b, env, &mut seen)
}

fn compare_guarded(
    a: &Rc<Term>,
    b: &Rc<Term>,
    env: &Env,
    seen: &mut Vec<(*const Term, *const Term)>,
) -> Ordering {
    let a = env.resolve(a);
    let b = env.resolve(b);
    match (&*a, &*b) {
        (Term::Var(x), Term::Var(y)) => x.cmp(y),
        (Term::Var(_), _) => Ordering::Less,
        (_, Term::Var(_)) => Ordering::Greater,
        (Term::Float(x), Term::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Term::Float(x), Term::Integer(y)) => match x.partial_cmp(&(*y as f64)) {
            Some(Ordering::Equal) | None => Ordering::Less,
            Some(o) => o,
        },
        (Term::Integer(x), Term::Float(y)) => match (*x as f64).partial_cmp(y) {
            Some(Ordering::Equal) | None => Ordering::Greater,
            Some(o) => o,
        },
        (Term::Integer(x), Term::Integer(y)) => x.cmp(y),
        (Term::Float(_), _) | (Term::Integer(_), _) => Ordering::Less,
        (_, Term::Float(_)) | (_, Term::Integer(_)) => Ordering::Greater,
        (Term::Atom(x), Term::Atom(y)) => x.cmp(y),
        (Term::Atom(_), _) => Ordering::Less,
        (_, Term::Atom(_)) => Ordering::Greater,
        (Term::Compound(x), Term::Compound(y)) => {
            let pair = (Rc::as_ptr(&a), Rc::as_ptr(&b));
            if seen.contains(&pair) {
                return Ordering::Equal;
            }
            seen.push(pair);
            match x.functor.cmp(&y.functor) {
                Ordering::Equal => {}
                o => return o,
            }
            match x.args.len().cmp(&y.args.len()) {
                Ordering::Equal => {}
                o => return o,
            }
            for (p, q) in x.args.iter().zip(y.args.iter()) {
                match compare_guarded(p, q, env, seen) {
                    Ordering::Equal => {}
                    o => return o,
                }
            }
            Ordering::Equal
        }
    }
}

/// Calls f on each element of the list t, resolving through env.
/// A partial list with a variable tail raises an instantiation error; any
/// other malformed tail is a type error.
pub(crate) fn each_list<F>(t: &Rc<Term>, env: &Env, mut f: F) -> Result<(), Exception>
where
    F: FnMut(&Rc<Term>) -> Result<(), Exception>,
{
    let whole = env.resolve(t);
    let mut t = whole.clone();
    let mut seen: Vec<*const Term> = Vec::new();
    loop {
        if seen.contains(&Rc::as_ptr(&t)) {
            return Err(crate::error::type_error("list", &whole));
        }
        seen.push(Rc::as_ptr(&t));
        let next = match &*t {
            Term::Atom(s) if s == "[]" => return Ok(()),
            Term::Compound(c) if c.functor == "." && c.args.len() == 2 => {
                f(&c.args[0])?;
                env.resolve(&c.args[1])
            }
            Term::Var(_) => return Err(crate::error::instantiation_error(&t)),
            _ => return Err(crate::error::type_error("list", &whole)),
        };
        t = next;
    }
}

/// Collects the elements of the list t into a Vec.
pub(crate) fn list_elements(t: &Rc<Term>, env: &Env) -> Result<Vec<Rc<Term>>, Exception> {
    let mut out = Vec::new();
    each_list(t, env, |e| {
        out.push(e.clone());
        Ok(())
    })?;
    Ok(out)
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::write::fmt_term(f, self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fresh_vars_are_distinct() {
        assert_ne!(Var::new(), Var::new());
    }

    #[test]
    fn zero_arity_compound_collapses() {
        let t = Term::new_compound("foo", vec![]);
        assert!(t.is_atom("foo"));
    }

    #[test]
    fn list_construction_and_iteration() {
        let l = Term::new_list(vec![
            Term::new_atom("a"),
            Term::new_atom("b"),
            Term::new_atom("c"),
        ]);
        let env = Env::new();
        let items = list_elements(&l, &env).unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[0].is_atom("a"));
        assert!(items[2].is_atom("c"));
    }

    #[test]
    fn partial_list_with_var_tail_is_instantiation_error() {
        let l = Term::new_partial_list(vec![Term::new_atom("a")], Term::new_var());
        let env = Env::new();
        assert!(list_elements(&l, &env).is_err());
    }

    #[test]
    fn standard_order() {
        let env = Env::new();
        let v = Term::new_var();
        let i = Term::new_integer(1);
        let fl = Term::new_float(1.5);
        let a = Term::new_atom("a");
        let c = Term::new_compound("f", vec![Term::new_atom("x")]);
        assert_eq!(compare(&v, &i, &env), Ordering::Less);
        assert_eq!(compare(&fl, &a, &env), Ordering::Less);
        assert_eq!(compare(&a, &c, &env), Ordering::Less);
        assert_eq!(compare(&c, &c, &env), Ordering::Equal);
        // equal value: float sorts before integer
        assert_eq!(
            compare(&Term::new_float(1.0), &Term::new_integer(1), &env),
            Ordering::Less
        );
    }

    #[test]
    fn compound_order_is_functor_then_arity_then_args() {
        let env = Env::new();
        let fa = Term::new_compound("f", vec![Term::new_atom("a")]);
        let fb = Term::new_compound("f", vec![Term::new_atom("b")]);
        let ga = Term::new_compound("g", vec![Term::new_atom("a")]);
        assert_eq!(compare(&fa, &fb, &env), Ordering::Less);
        assert_eq!(compare(&fb, &ga, &env), Ordering::Less);
    }

    #[test]
    fn rulify_wraps_facts() {
        let env = Env::new();
        let fact = Term::new_atom("p");
        let r = rulify(&fact, &env);
        let c = r.as_compound(":-", 2).unwrap();
        assert!(c.args[0].is_atom("p"));
        assert!(c.args[1].is_atom("true"));
    }
}
