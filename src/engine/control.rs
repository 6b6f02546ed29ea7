use std::rc::Rc;

use super::{clause, terms, Cont, Engine};
use crate::env::Env;
use crate::error::Exception;
use crate::nondet::{force, Promise};
use crate::term::Term;

/// Calls a goal term. The goal is compiled into a one-off `$call` clause
/// whose head carries the goal's free variables, which gives the goal its
/// own cut barrier: a cut inside is not transparent to the caller.
pub(super) fn call_goal(engine: &Engine, goal: &Rc<Term>, k: Cont, env: &Env) -> Promise {
    let g = env.resolve(goal);
    if matches!(&*g, Term::Var(_)) {
        return Promise::Error(crate::error::instantiation_error(&g));
    }
    let fvs = env.free_variables(&[g.clone()]);
    let args: Vec<Rc<Term>> = fvs.iter().map(|v| Rc::new(Term::Var(*v))).collect();
    let head = Term::new_compound("$call", args.clone());
    let rule = Term::new_compound(":-", vec![head, g]);
    match clause::compile(&rule, env) {
        Ok(c) => {
            let pi = c.pi.clone();
            engine.call_clauses(&pi, Rc::new(vec![Rc::new(c)]), args, k, env)
        }
        Err(e) => Promise::Error(e),
    }
}

pub(super) fn solve_true(_: &Engine, _: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    k(env.clone())
}

pub(super) fn solve_fail(_: &Engine, _: &[Rc<Term>], _: Cont, _: &Env) -> Promise {
    Promise::Bool(false)
}

pub(super) fn solve_call(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    call_goal(engine, &args[0], k, env)
}

/// call/2..call/8: the goal with the extra arguments appended.
pub(super) fn solve_call_n(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let g = env.resolve(&args[0]);
    let extra = &args[1..];
    let goal = match &*g {
        Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&g)),
        Term::Atom(s) => Term::new_compound(s, extra.to_vec()),
        Term::Compound(c) => {
            let mut a = c.args.clone();
            a.extend(extra.iter().cloned());
            Term::new_compound(&c.functor, a)
        }
        _ => return Promise::Error(crate::error::type_error("callable", &g)),
    };
    call_goal(engine, &goal, k, env)
}

/// Negation as failure, for both `\+/1` and `not/1`: the goal runs to its
/// first solution in a nested search.
pub(super) fn solve_not_provable(
    engine: &Engine,
    args: &[Rc<Term>],
    k: Cont,
    env: &Env,
) -> Promise {
    let engine = engine.clone();
    let goal = args[0].clone();
    let env = env.clone();
    Promise::delay(move |ctx| {
        let succeed: Cont = Rc::new(|_| Promise::Bool(true));
        match force(call_goal(&engine, &goal, succeed, &env), ctx) {
            Err(e) => Promise::Error(e),
            Ok(true) => Promise::Bool(false),
            Ok(false) => k(env),
        }
    })
}

pub(super) fn solve_throw(_: &Engine, args: &[Rc<Term>], _: Cont, env: &Env) -> Promise {
    let ball = env.resolve(&args[0]);
    if matches!(&*ball, Term::Var(_)) {
        return Promise::Error(crate::error::instantiation_error(&ball));
    }
    // the ball is copied so it stays valid when the thrower's bindings are
    // unwound
    Promise::Error(Exception::Ball(terms::copy(&ball, env)))
}

pub(super) fn solve_catch(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let engine = engine.clone();
    let goal = args[0].clone();
    let catcher = args[1].clone();
    let recover = args[2].clone();
    let env = env.clone();
    Promise::delay(move |ctx| {
        match force(call_goal(&engine, &goal, k.clone(), &env), ctx) {
            Ok(b) => Promise::Bool(b),
            Err(Exception::Interrupted) => Promise::Error(Exception::Interrupted),
            Err(Exception::Ball(ball)) => {
                match crate::unify::unify(&catcher, &ball, false, &env) {
                    Some(env2) => {
                        Promise::delay(move |_| call_goal(&engine, &recover, k, &env2))
                    }
                    None => Promise::Error(Exception::Ball(ball)),
                }
            }
        }
    })
}

pub(super) fn solve_repeat(_: &Engine, _: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let env = env.clone();
    Promise::Repeat(Rc::new(move |_| k(env.clone())))
}

pub(super) fn solve_halt(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let code = env.resolve(&args[0]);
    match &*code {
        Term::Var(_) => Promise::Error(crate::error::instantiation_error(&code)),
        Term::Integer(i) => {
            // the exit effect is injectable; a test harness records the code
            // and lets execution continue
            let i = *i as i32;
            engine.with_state(|st| (st.exit)(i));
            k(env.clone())
        }
        _ => Promise::Error(crate::error::type_error("integer", &code)),
    }
}
