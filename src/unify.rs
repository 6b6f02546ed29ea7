use std::rc::Rc;

use crate::env::Env;
use crate::term::{Term, Var};

/// Unifies t1 with t2 under env, returning the extended environment on
/// success. The input env is untouched either way; failure simply means the
/// caller keeps using the environment it already holds.
pub fn unify(t1: &Rc<Term>, t2: &Rc<Term>, occurs_check: bool, env: &Env) -> Option<Env> {
    let a = env.resolve(t1);
    let b = env.resolve(t2);
    match (&*a, &*b) {
        (Term::Var(x), Term::Var(y)) if x == y => Some(env.clone()),
        (Term::Var(x), _) => {
            if occurs_check && contains_var(&b, *x, env) {
                None
            } else {
                Some(env.bind(*x, b.clone()))
            }
        }
        (_, Term::Var(y)) => {
            if occurs_check && contains_var(&a, *y, env) {
                None
            } else {
                Some(env.bind(*y, a.clone()))
            }
        }
        (Term::Atom(x), Term::Atom(y)) => (x == y).then(|| env.clone()),
        (Term::Integer(x), Term::Integer(y)) => (x == y).then(|| env.clone()),
        (Term::Float(x), Term::Float(y)) => (x == y).then(|| env.clone()),
        (Term::Compound(x), Term::Compound(y))
            if x.functor == y.functor && x.args.len() == y.args.len() =>
        {
            let mut env = env.clone();
            for (p, q) in x.args.iter().zip(y.args.iter()) {
                env = unify(p, q, occurs_check, &env)?;
            }
            Some(env)
        }
        _ => None,
    }
}

/// Checks whether the variable v occurs in t. Guards against cyclic
/// bindings by never expanding the same variable twice.
pub(crate) fn contains_var(t: &Rc<Term>, v: Var, env: &Env) -> bool {
    let mut expanded = Vec::new();
    contains_guarded(t, v, env, &mut expanded)
}

fn contains_guarded(t: &Rc<Term>, v: Var, env: &Env, expanded: &mut Vec<Var>) -> bool {
    let mut t = t.clone();
    loop {
        let w = match &*t {
            Term::Var(w) => *w,
            _ => break,
        };
        if w == v {
            return true;
        }
        match env.lookup(w) {
            Some(next) => {
                if expanded.contains(&w) {
                    return false;
                }
                expanded.push(w);
                t = next;
            }
            None => return false,
        }
    }
    if let Term::Compound(c) = &*t {
        for a in &c.args {
            if contains_guarded(a, v, env, expanded) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::term::compare;
    use std::cmp::Ordering;

    fn f(args: Vec<Rc<Term>>) -> Rc<Term> {
        Term::new_compound("f", args)
    }

    #[test]
    fn identical_terms_unify() {
        let env = Env::new();
        let t = f(vec![Term::new_atom("a"), Term::new_integer(1)]);
        assert!(unify(&t, &t, false, &env).is_some());
        assert!(unify(&t, &t, true, &env).is_some());
    }

    #[test]
    fn unified_terms_resolve_equal() {
        let env = Env::new();
        let x = Term::new_var();
        let y = Term::new_var();
        let t1 = f(vec![x.clone(), Term::new_atom("b")]);
        let t2 = f(vec![Term::new_atom("a"), y.clone()]);
        let env = unify(&t1, &t2, false, &env).unwrap();
        assert_eq!(compare(&t1, &t2, &env), Ordering::Equal);
        assert!(env.resolve(&x).is_atom("a"));
        assert!(env.resolve(&y).is_atom("b"));
    }

    #[test]
    fn atoms_unify_only_when_equal() {
        let env = Env::new();
        assert!(unify(&Term::new_atom("a"), &Term::new_atom("a"), false, &env).is_some());
        assert!(unify(&Term::new_atom("a"), &Term::new_atom("b"), false, &env).is_none());
    }

    #[test]
    fn no_cross_numeric_unification() {
        let env = Env::new();
        assert!(unify(&Term::new_integer(1), &Term::new_float(1.0), false, &env).is_none());
    }

    #[test]
    fn arity_mismatch_fails() {
        let env = Env::new();
        let t1 = f(vec![Term::new_atom("a")]);
        let t2 = f(vec![Term::new_atom("a"), Term::new_atom("b")]);
        assert!(unify(&t1, &t2, false, &env).is_none());
    }

    #[test]
    fn failed_unification_leaves_env_intact() {
        let x = Term::new_var();
        let xv = match &*x {
            Term::Var(v) => *v,
            _ => unreachable!(),
        };
        let env = Env::new().bind(xv, Term::new_atom("a"));
        let t1 = f(vec![x.clone(), Term::new_integer(1)]);
        let t2 = f(vec![Term::new_atom("a"), Term::new_integer(2)]);
        assert!(unify(&t1, &t2, false, &env).is_none());
        // caller's env still holds exactly its old binding
        assert!(env.resolve(&x).is_atom("a"));
    }

    #[test]
    fn occurs_check_rejects_cyclic_binding() {
        let env = Env::new();
        let x = Term::new_var();
        let t = f(vec![x.clone()]);
        assert!(unify(&x, &t, true, &env).is_none());
        // without occurs check the binding is made and resolve terminates
        let env = unify(&x, &t, false, &env).unwrap();
        let r = env.resolve(&x);
        assert!(r.as_compound("f", 1).is_some());
    }

    #[test]
    fn variable_chains_unify_by_identity() {
        let env = Env::new();
        let x = Term::new_var();
        let y = Term::new_var();
        let env = unify(&x, &y, false, &env).unwrap();
        // both sides now resolve to the same variable
        let env2 = unify(&x, &y, false, &env).unwrap();
        assert_eq!(compare(&x, &y, &env2), Ordering::Equal);
    }
}
