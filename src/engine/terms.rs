use std::collections::HashMap;
use std::rc::Rc;

use super::{Cont, Engine};
use crate::env::Env;
use crate::nondet::Promise;
use crate::term::{list_elements, Term, Var};
use crate::unify::unify;

/// A copy of t with every distinct unbound variable renamed to one fresh
/// variable, preserving sharing. A cyclic binding is cut at the variable
/// closing the cycle.
pub(super) fn copy(t: &Rc<Term>, env: &Env) -> Rc<Term> {
    let mut map = HashMap::new();
    let mut path = Vec::new();
    copy_guarded(t, env, &mut map, &mut path)
}

fn copy_guarded(
    t: &Rc<Term>,
    env: &Env,
    map: &mut HashMap<Var, Var>,
    path: &mut Vec<Var>,
) -> Rc<Term> {
    let mut t = t.clone();
    let mut chain: Vec<Var> = Vec::new();
    loop {
        let v = match &*t {
            Term::Var(v) => *v,
            _ => break,
        };
        if path.contains(&v) || chain.contains(&v) {
            let nv = *map.entry(v).or_insert_with(Var::new);
            return Rc::new(Term::Var(nv));
        }
        match env.lookup(v) {
            Some(next) => {
                chain.push(v);
                t = next;
            }
            None => {
                let nv = *map.entry(v).or_insert_with(Var::new);
                return Rc::new(Term::Var(nv));
            }
        }
    }
    if let Term::Compound(c) = &*t {
        let depth = path.len();
        path.extend(chain);
        let args = c
            .args
            .iter()
            .map(|a| copy_guarded(a, env, map, path))
            .collect();
        path.truncate(depth);
        Term::new_compound(&c.functor, args)
    } else {
        t.clone()
    }
}

pub(super) fn solve_copy_term(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    match unify(&copy(&args[0], env), &args[1], false, env) {
        Some(env) => k(env),
        None => Promise::Bool(false),
    }
}

fn unify2(
    a1: &Rc<Term>,
    b1: &Rc<Term>,
    a2: &Rc<Term>,
    b2: &Rc<Term>,
    k: Cont,
    env: &Env,
) -> Promise {
    match unify(a1, b1, false, env).and_then(|env| unify(a2, b2, false, &env)) {
        Some(env) => k(env),
        None => Promise::Bool(false),
    }
}

pub(super) fn solve_functor(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let t = env.resolve(&args[0]);
    match &*t {
        Term::Var(_) => {
            let arity = env.resolve(&args[2]);
            let n = match &*arity {
                Term::Var(_) => {
                    return Promise::Error(crate::error::instantiation_error(&arity))
                }
                Term::Integer(n) => *n,
                _ => return Promise::Error(crate::error::type_error("integer", &arity)),
            };
            if n < 0 {
                return Promise::Error(crate::error::domain_error(
                    "not_less_than_zero",
                    &arity,
                ));
            }
            let name = env.resolve(&args[1]);
            match &*name {
                Term::Var(_) => Promise::Error(crate::error::instantiation_error(&name)),
                Term::Compound(_) => {
                    Promise::Error(crate::error::type_error("atomic", &name))
                }
                Term::Atom(s) => {
                    if n == 0 {
                        match unify(&t, &name, false, env) {
                            Some(env) => k(env),
                            None => Promise::Bool(false),
                        }
                    } else {
                        let vs: Vec<Rc<Term>> = (0..n).map(|_| Term::new_var()).collect();
                        let built = Term::new_compound(s, vs);
                        match unify(&t, &built, false, env) {
                            Some(env) => k(env),
                            None => Promise::Bool(false),
                        }
                    }
                }
                _ => {
                    // a number is a valid functor only at arity 0
                    if n == 0 {
                        match unify(&t, &name, false, env) {
                            Some(env) => k(env),
                            None => Promise::Bool(false),
                        }
                    } else {
                        Promise::Error(crate::error::type_error("atom", &name))
                    }
                }
            }
        }
        Term::Compound(c) => {
            let name = Term::new_atom(&c.functor);
            let arity = Term::new_integer(c.args.len() as i64);
            unify2(&args[1], &name, &args[2], &arity, k, env)
        }
        _ => {
            let zero = Term::new_integer(0);
            unify2(&args[1], &t, &args[2], &zero, k, env)
        }
    }
}

pub(super) fn solve_arg(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let t = env.resolve(&args[1]);
    match &*t {
        Term::Var(_) => Promise::Error(crate::error::instantiation_error(&t)),
        Term::Compound(c) => {
            let n = env.resolve(&args[0]);
            match &*n {
                Term::Var(_) => Promise::Error(crate::error::instantiation_error(&n)),
                Term::Integer(i) => {
                    if *i < 0 {
                        return Promise::Error(crate::error::domain_error(
                            "not_less_than_zero",
                            &n,
                        ));
                    }
                    if *i == 0 || *i as usize > c.args.len() {
                        return Promise::Bool(false);
                    }
                    match unify(&args[2], &c.args[*i as usize - 1], false, env) {
                        Some(env) => k(env),
                        None => Promise::Bool(false),
                    }
                }
                _ => Promise::Error(crate::error::type_error("integer", &n)),
            }
        }
        _ => Promise::Error(crate::error::type_error("compound", &t)),
    }
}

pub(super) fn solve_univ(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let t = env.resolve(&args[0]);
    match &*t {
        Term::Var(_) => {
            let list = env.resolve(&args[1]);
            if list.is_atom("[]") {
                return Promise::Error(crate::error::domain_error("not_empty_list", &list));
            }
            let elements = match list_elements(&list, env) {
                Ok(es) => es,
                Err(e) => return Promise::Error(e),
            };
            let head = env.resolve(&elements[0]);
            let rest = &elements[1..];
            if rest.is_empty() {
                match &*head {
                    Term::Var(_) => {
                        return Promise::Error(crate::error::instantiation_error(&head))
                    }
                    Term::Compound(_) => {
                        return Promise::Error(crate::error::type_error("atomic", &head))
                    }
                    _ => {}
                }
                match unify(&t, &head, false, env) {
                    Some(env) => k(env),
                    None => Promise::Bool(false),
                }
            } else {
                let f = match &*head {
                    Term::Var(_) => {
                        return Promise::Error(crate::error::instantiation_error(&head))
                    }
                    Term::Atom(s) => s.clone(),
                    _ => return Promise::Error(crate::error::type_error("atom", &head)),
                };
                let built = Term::new_compound(&f, rest.to_vec());
                match unify(&t, &built, false, env) {
                    Some(env) => k(env),
                    None => Promise::Bool(false),
                }
            }
        }
        Term::Compound(c) => {
            let mut items = vec![Term::new_atom(&c.functor)];
            items.extend(c.args.iter().cloned());
            match unify(&args[1], &Term::new_list(items), false, env) {
                Some(env) => k(env),
                None => Promise::Bool(false),
            }
        }
        _ => match unify(&args[1], &Term::new_list(vec![t.clone()]), false, env) {
            Some(env) => k(env),
            None => Promise::Bool(false),
        },
    }
}
