use std::rc::Rc;

use super::{Cont, Engine};
use crate::env::Env;
use crate::nondet::{Promise, Thunk};
use crate::operators::{Operator, Specifier};
use crate::term::Term;
use crate::unify::unify;

pub(super) fn solve_op(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let priority = env.resolve(&args[0]);
    let p = match &*priority {
        Term::Integer(p) => *p,
        _ => return Promise::Error(crate::error::type_error("integer", &priority)),
    };
    if !(0..=1200).contains(&p) {
        return Promise::Error(crate::error::domain_error("operator_priority", &priority));
    }
    let specifier = env.resolve(&args[1]);
    let spec = match &*specifier {
        Term::Atom(s) => match Specifier::from_atom(s) {
            Some(spec) => spec,
            None => {
                return Promise::Error(crate::error::domain_error(
                    "operator_specifier",
                    &specifier,
                ))
            }
        },
        _ => return Promise::Error(crate::error::type_error("atom", &specifier)),
    };
    let name = env.resolve(&args[2]);
    let name = match &*name {
        Term::Atom(s) => s.clone(),
        _ => return Promise::Error(crate::error::type_error("atom", &name)),
    };
    engine.with_state(|st| st.operators.define(p as u16, spec, &name));
    k(env.clone())
}

pub(super) fn solve_current_op(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let priority = env.resolve(&args[0]);
    match &*priority {
        Term::Var(_) => {}
        Term::Integer(p) if (0..=1200).contains(p) => {}
        _ => {
            return Promise::Error(crate::error::domain_error("operator_priority", &priority))
        }
    }
    let specifier = env.resolve(&args[1]);
    match &*specifier {
        Term::Var(_) => {}
        Term::Atom(s) if Specifier::from_atom(s).is_some() => {}
        _ => {
            return Promise::Error(crate::error::domain_error(
                "operator_specifier",
                &specifier,
            ))
        }
    }
    let name = env.resolve(&args[2]);
    match &*name {
        Term::Var(_) | Term::Atom(_) => {}
        _ => return Promise::Error(crate::error::type_error("atom", &name)),
    }

    let ops: Vec<Operator> = engine.with_state(|st| st.operators.iter().cloned().collect());
    let pattern = Term::new_compound(
        "$op",
        vec![args[0].clone(), args[1].clone(), args[2].clone()],
    );
    let ks: Vec<Thunk> = ops
        .into_iter()
        .map(|op| {
            let pattern = pattern.clone();
            let k = k.clone();
            let env = env.clone();
            Box::new(move |_: &crate::nondet::Ctx| {
                let candidate = Term::new_compound(
                    "$op",
                    vec![
                        Term::new_integer(op.priority as i64),
                        Term::new_atom(op.specifier.as_atom()),
                        Term::new_atom(&op.name),
                    ],
                );
                match unify(&pattern, &candidate, false, &env) {
                    Some(env) => k(env),
                    None => Promise::Bool(false),
                }
            }) as Thunk
        })
        .collect();
    Promise::Delay(ks)
}
