use std::rc::Rc;

use super::{clause, control, Cont, Engine, Procedure};
use crate::env::Env;
use crate::error::Exception;
use crate::nondet::{force, Promise, Thunk};
use crate::term::{pi_args, rulify, Pi, Term};
use crate::unify::unify;

/// Compiles and stores one clause; shared by the assert builtins and
/// `consult`. Compilation happens before the database changes so an invalid
/// clause leaves it untouched.
pub(super) fn assert_term(
    engine: &Engine,
    t: &Rc<Term>,
    env: &Env,
    append: bool,
) -> Result<(), Exception> {
    let (mut pi, args) = pi_args(t, env)?;
    if pi == Pi::new(":-", 2) {
        let (head_pi, _) = pi_args(&args[0], env)?;
        pi = head_pi;
    }
    let compiled = Rc::new(clause::compile(t, env)?);
    engine.with_state(|st| match st.procedures.get(&pi) {
        Some(Procedure::Builtin(_)) => Err(crate::error::permission_error(
            "modify",
            "static_procedure",
            &pi.as_term(),
        )),
        Some(Procedure::Clauses(cs)) => {
            let mut v = (**cs).clone();
            if append {
                v.push(compiled);
            } else {
                v.insert(0, compiled);
            }
            st.procedures.insert(pi.clone(), Procedure::Clauses(Rc::new(v)));
            Ok(())
        }
        None => {
            st.procedures
                .insert(pi.clone(), Procedure::Clauses(Rc::new(vec![compiled])));
            Ok(())
        }
    })
}

fn solve_assert(
    engine: &Engine,
    args: &[Rc<Term>],
    k: Cont,
    env: &Env,
    append: bool,
) -> Promise {
    let t = env.resolve(&args[0]);
    // a top-level :- Goal runs as a directive instead of being stored
    if let Some(c) = t.as_compound(":-", 1) {
        return control::call_goal(engine, &c.args[0], k, env);
    }
    match assert_term(engine, &t, env, append) {
        Ok(()) => k(env.clone()),
        Err(e) => Promise::Error(e),
    }
}

pub(super) fn solve_assertz(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    solve_assert(engine, args, k, env, true)
}

pub(super) fn solve_asserta(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    solve_assert(engine, args, k, env, false)
}

pub(super) fn solve_retract(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let t = rulify(&args[0], env);
    let head = match t.as_compound(":-", 2) {
        Some(c) => c.args[0].clone(),
        None => return Promise::Error(crate::error::type_error("callable", &t)),
    };
    let (pi, _) = match pi_args(&head, env) {
        Ok(x) => x,
        Err(e) => return Promise::Error(e),
    };
    let proc = engine.with_state(|st| st.procedures.get(&pi).cloned());
    let cs = match proc {
        None => return Promise::Bool(false),
        Some(Procedure::Builtin(_)) => {
            return Promise::Error(crate::error::permission_error(
                "modify",
                "static_procedure",
                &pi.as_term(),
            ))
        }
        Some(Procedure::Clauses(cs)) => cs,
    };
    let engine = engine.clone();
    let env = env.clone();
    Promise::delay(move |ctx| {
        for c in cs.iter() {
            let raw = rulify(&c.raw, &env);
            if let Some(env2) = unify(&t, &raw, false, &env) {
                match force(k(env2), ctx) {
                    Err(e) => return Promise::Error(e),
                    Ok(true) => {
                        // committed: drop exactly this clause, keep the rest
                        engine.with_state(|st| {
                            if let Some(Procedure::Clauses(cur)) = st.procedures.get(&pi) {
                                let mut v = (**cur).clone();
                                if let Some(j) = v.iter().position(|x| Rc::ptr_eq(x, c)) {
                                    v.remove(j);
                                }
                                st.procedures
                                    .insert(pi.clone(), Procedure::Clauses(Rc::new(v)));
                            }
                        });
                        return Promise::Bool(true);
                    }
                    Ok(false) => {}
                }
            }
        }
        Promise::Bool(false)
    })
}

pub(super) fn solve_abolish(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let pi = env.resolve(&args[0]);
    let c = match &*pi {
        Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&pi)),
        Term::Compound(c) if c.functor == "/" && c.args.len() == 2 => c,
        _ => {
            return Promise::Error(crate::error::type_error("predicate_indicator", &pi))
        }
    };
    let name = env.resolve(&c.args[0]);
    let arity = env.resolve(&c.args[1]);
    let name = match &*name {
        Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&name)),
        Term::Atom(s) => s.clone(),
        _ => return Promise::Error(crate::error::type_error("atom", &name)),
    };
    let arity = match &*arity {
        Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&arity)),
        Term::Integer(i) => {
            if *i < 0 {
                return Promise::Error(crate::error::domain_error(
                    "not_less_than_zero",
                    &arity,
                ));
            }
            *i as usize
        }
        _ => return Promise::Error(crate::error::type_error("integer", &arity)),
    };
    let key = Pi::new(&name, arity);
    let removed = engine.with_state(|st| match st.procedures.get(&key) {
        Some(Procedure::Clauses(_)) => {
            st.procedures.remove(&key);
            Ok(())
        }
        _ => Err(crate::error::permission_error(
            "modify",
            "static_procedure",
            &key.as_term(),
        )),
    });
    match removed {
        Ok(()) => k(env.clone()),
        Err(e) => Promise::Error(e),
    }
}

pub(super) fn solve_clause(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let (pi, _) = match pi_args(&args[0], env) {
        Ok(x) => x,
        Err(e) => return Promise::Error(e),
    };
    let body = env.resolve(&args[1]);
    match &*body {
        Term::Var(_) | Term::Atom(_) | Term::Compound(_) => {}
        _ => return Promise::Error(crate::error::type_error("callable", &body)),
    }
    let proc = engine.with_state(|st| st.procedures.get(&pi).cloned());
    let cs = match proc {
        None => return Promise::Bool(false),
        Some(Procedure::Builtin(_)) => {
            return Promise::Error(crate::error::permission_error(
                "access",
                "private_procedure",
                &pi.as_term(),
            ))
        }
        Some(Procedure::Clauses(cs)) => cs,
    };
    let pattern = Term::new_compound(":-", vec![args[0].clone(), args[1].clone()]);
    let mut ks: Vec<Thunk> = Vec::with_capacity(cs.len());
    for c in cs.iter() {
        let renamed = rulify(&super::terms::copy(&c.raw, env), env);
        let pattern = pattern.clone();
        let k = k.clone();
        let env = env.clone();
        ks.push(Box::new(move |_| {
            match unify(&pattern, &renamed, false, &env) {
                Some(env) => k(env),
                None => Promise::Bool(false),
            }
        }));
    }
    Promise::Delay(ks)
}

pub(super) fn solve_current_predicate(
    engine: &Engine,
    args: &[Rc<Term>],
    k: Cont,
    env: &Env,
) -> Promise {
    let pi = env.resolve(&args[0]);
    match &*pi {
        Term::Var(_) => {}
        Term::Compound(c) if c.functor == "/" && c.args.len() == 2 => {
            match &*env.resolve(&c.args[0]) {
                Term::Var(_) | Term::Atom(_) => {}
                _ => {
                    return Promise::Error(crate::error::type_error(
                        "predicate_indicator",
                        &pi,
                    ))
                }
            }
            match &*env.resolve(&c.args[1]) {
                Term::Var(_) | Term::Integer(_) => {}
                _ => {
                    return Promise::Error(crate::error::type_error(
                        "predicate_indicator",
                        &pi,
                    ))
                }
            }
        }
        _ => return Promise::Error(crate::error::type_error("predicate_indicator", &pi)),
    }
    let mut keys: Vec<Pi> = engine.with_state(|st| {
        st.procedures
            .iter()
            .filter(|(_, p)| matches!(p, Procedure::Clauses(_)))
            .map(|(key, _)| key.clone())
            .collect()
    });
    keys.sort();
    let ks: Vec<Thunk> = keys
        .into_iter()
        .map(|key| {
            let pi = args[0].clone();
            let k = k.clone();
            let env = env.clone();
            Box::new(move |_: &crate::nondet::Ctx| {
                match unify(&pi, &key.as_term(), false, &env) {
                    Some(env) => k(env),
                    None => Promise::Bool(false),
                }
            }) as Thunk
        })
        .collect();
    Promise::Delay(ks)
}

/// Declares a procedure dynamic: an empty user-defined procedure is created
/// when absent, so calling it fails instead of raising existence_error.
pub(super) fn solve_dynamic(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let pi = env.resolve(&args[0]);
    let c = match &*pi {
        Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&pi)),
        Term::Compound(c) if c.functor == "/" && c.args.len() == 2 => c,
        _ => {
            return Promise::Error(crate::error::type_error("predicate_indicator", &pi))
        }
    };
    let name = match &*env.resolve(&c.args[0]) {
        Term::Atom(s) => s.clone(),
        Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&pi)),
        _ => {
            return Promise::Error(crate::error::type_error("predicate_indicator", &pi))
        }
    };
    let arity = match &*env.resolve(&c.args[1]) {
        Term::Integer(i) if *i >= 0 => *i as usize,
        Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&pi)),
        _ => {
            return Promise::Error(crate::error::type_error("predicate_indicator", &pi))
        }
    };
    let key = Pi::new(&name, arity);
    let ok = engine.with_state(|st| match st.procedures.get(&key) {
        None => {
            st.procedures
                .insert(key.clone(), Procedure::Clauses(Rc::new(Vec::new())));
            true
        }
        Some(Procedure::Clauses(_)) => true,
        Some(Procedure::Builtin(_)) => false,
    });
    if ok {
        k(env.clone())
    } else {
        Promise::Bool(false)
    }
}
