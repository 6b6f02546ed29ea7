use std::cmp::Ordering;
use std::rc::Rc;

use super::{Cont, Engine};
use crate::env::Env;
use crate::nondet::Promise;
use crate::term::{compare, Term};
use crate::unify::unify;

pub(super) fn solve_unify(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    match unify(&args[0], &args[1], false, env) {
        Some(env) => k(env),
        None => Promise::Bool(false),
    }
}

pub(super) fn solve_unify_with_occurs_check(
    _: &Engine,
    args: &[Rc<Term>],
    k: Cont,
    env: &Env,
) -> Promise {
    match unify(&args[0], &args[1], true, env) {
        Some(env) => k(env),
        None => Promise::Bool(false),
    }
}

fn type_test(
    args: &[Rc<Term>],
    k: Cont,
    env: &Env,
    pred: impl FnOnce(&Term) -> bool,
) -> Promise {
    if pred(&env.resolve(&args[0])) {
        k(env.clone())
    } else {
        Promise::Bool(false)
    }
}

pub(super) fn solve_var(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    type_test(args, k, env, |t| matches!(t, Term::Var(_)))
}

pub(super) fn solve_nonvar(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    type_test(args, k, env, |t| !matches!(t, Term::Var(_)))
}

pub(super) fn solve_atom(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    type_test(args, k, env, |t| matches!(t, Term::Atom(_)))
}

pub(super) fn solve_integer(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    type_test(args, k, env, |t| matches!(t, Term::Integer(_)))
}

pub(super) fn solve_float(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    type_test(args, k, env, |t| matches!(t, Term::Float(_)))
}

pub(super) fn solve_number(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    type_test(args, k, env, |t| {
        matches!(t, Term::Integer(_) | Term::Float(_))
    })
}

pub(super) fn solve_atomic(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    type_test(args, k, env, |t| {
        matches!(t, Term::Atom(_) | Term::Integer(_) | Term::Float(_))
    })
}

pub(super) fn solve_compound(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    type_test(args, k, env, |t| matches!(t, Term::Compound(_)))
}

pub(super) fn solve_callable(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    type_test(args, k, env, |t| {
        matches!(t, Term::Atom(_) | Term::Compound(_))
    })
}

pub(super) fn solve_is_list(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let mut t = env.resolve(&args[0]);
    let mut seen: Vec<*const Term> = Vec::new();
    loop {
        if seen.contains(&Rc::as_ptr(&t)) {
            return Promise::Bool(false);
        }
        seen.push(Rc::as_ptr(&t));
        match &*t.clone() {
            Term::Atom(s) if s == "[]" => return k(env.clone()),
            Term::Compound(c) if c.functor == "." && c.args.len() == 2 => {
                t = env.resolve(&c.args[1]);
            }
            _ => return Promise::Bool(false),
        }
    }
}

fn order_test(
    args: &[Rc<Term>],
    k: Cont,
    env: &Env,
    pred: impl FnOnce(Ordering) -> bool,
) -> Promise {
    if pred(compare(&args[0], &args[1], env)) {
        k(env.clone())
    } else {
        Promise::Bool(false)
    }
}

pub(super) fn solve_term_eq(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    order_test(args, k, env, |o| o == Ordering::Equal)
}

pub(super) fn solve_term_neq(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    order_test(args, k, env, |o| o != Ordering::Equal)
}

pub(super) fn solve_term_lss(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    order_test(args, k, env, |o| o == Ordering::Less)
}

pub(super) fn solve_term_leq(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    order_test(args, k, env, |o| o != Ordering::Greater)
}

pub(super) fn solve_term_gtr(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    order_test(args, k, env, |o| o == Ordering::Greater)
}

pub(super) fn solve_term_geq(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    order_test(args, k, env, |o| o != Ordering::Less)
}

pub(super) fn solve_compare(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let order = env.resolve(&args[0]);
    match &*order {
        Term::Var(_) => {}
        Term::Atom(s) => match s.as_str() {
            "<" | "=" | ">" => {}
            _ => return Promise::Error(crate::error::domain_error("order", &order)),
        },
        _ => return Promise::Error(crate::error::type_error("atom", &order)),
    }
    let atom = match compare(&args[1], &args[2], env) {
        Ordering::Less => Term::new_atom("<"),
        Ordering::Equal => Term::new_atom("="),
        Ordering::Greater => Term::new_atom(">"),
    };
    match unify(&order, &atom, false, env) {
        Some(env) => k(env),
        None => Promise::Bool(false),
    }
}
