use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use super::{control, Cont, Engine};
use crate::env::Env;
use crate::nondet::{force, Promise, Thunk};
use crate::term::{compare, Term, Var};
use crate::unify::unify;

fn continue_unify(a: &Rc<Term>, b: &Rc<Term>, k: Cont, env: &Env) -> Promise {
    match unify(a, b, false, env) {
        Some(env) => k(env),
        None => Promise::Bool(false),
    }
}

/// findall/3: all solutions of the goal, in generation order, duplicates
/// preserved. An empty list when the goal has none.
pub(super) fn solve_findall(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let engine = engine.clone();
    let template = args[0].clone();
    let goal = args[1].clone();
    let instances = args[2].clone();
    let env = env.clone();
    Promise::delay(move |ctx| {
        let answers = Rc::new(RefCell::new(Vec::new()));
        let collect: Cont = {
            let answers = answers.clone();
            let template = template.clone();
            Rc::new(move |env: Env| {
                answers.borrow_mut().push(env.simplify(&template));
                Promise::Bool(false) // ask for the next solution
            })
        };
        if let Err(e) = force(control::call_goal(&engine, &goal, collect, &env), ctx) {
            return Promise::Error(e);
        }
        let list = Term::new_list(answers.borrow().clone());
        continue_unify(&instances, &list, k, &env)
    })
}

pub(super) fn solve_bagof(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    collection_of(engine, args, k, env, false)
}

pub(super) fn solve_setof(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    collection_of(engine, args, k, env, true)
}

/// bagof/setof: solutions grouped by the witnesses, the free variables of
/// the goal that occur neither in the template nor under a `^` qualifier.
/// Groups are emitted in ascending standard order of the witness tuple;
/// with no solutions the call fails.
fn collection_of(
    engine: &Engine,
    args: &[Rc<Term>],
    k: Cont,
    env: &Env,
    dedup_sorted: bool,
) -> Promise {
    let mut body = env.resolve(&args[1]);
    if matches!(&*body, Term::Var(_)) {
        return Promise::Error(crate::error::instantiation_error(&body));
    }
    let mut qualified: Vec<Rc<Term>> = vec![args[0].clone()];
    loop {
        let next = match body.as_compound("^", 2) {
            Some(c) => {
                qualified.push(c.args[0].clone());
                env.resolve(&c.args[1])
            }
            None => break,
        };
        body = next;
        if matches!(&*body, Term::Var(_)) {
            return Promise::Error(crate::error::instantiation_error(&body));
        }
    }

    let excluded = env.free_variables(&qualified);
    let witnesses: Vec<Var> = env
        .free_variables(&[body.clone()])
        .into_iter()
        .filter(|v| !excluded.contains(v))
        .collect();
    let witness_term = Term::new_compound(
        "$witness",
        witnesses.iter().map(|v| Rc::new(Term::Var(*v))).collect(),
    );

    let engine = engine.clone();
    let template = args[0].clone();
    let instances = args[2].clone();
    let env = env.clone();
    Promise::delay(move |ctx| {
        let pairs: Rc<RefCell<Vec<(Rc<Term>, Rc<Term>)>>> = Rc::new(RefCell::new(Vec::new()));
        let collect: Cont = {
            let pairs = pairs.clone();
            let witness_term = witness_term.clone();
            let template = template.clone();
            Rc::new(move |env: Env| {
                pairs
                    .borrow_mut()
                    .push((env.simplify(&witness_term), env.simplify(&template)));
                Promise::Bool(false)
            })
        };
        if let Err(e) = force(control::call_goal(&engine, &body, collect, &env), ctx) {
            return Promise::Error(e);
        }

        // group consecutive-by-equality against all groups seen so far
        let mut groups: Vec<(Rc<Term>, Vec<Rc<Term>>)> = Vec::new();
        for (w, inst) in pairs.borrow().iter() {
            match groups
                .iter_mut()
                .find(|(gw, _)| compare(gw, w, &env) == Ordering::Equal)
            {
                Some((_, insts)) => insts.push(inst.clone()),
                None => groups.push((w.clone(), vec![inst.clone()])),
            }
        }
        groups.sort_by(|a, b| compare(&a.0, &b.0, &env));

        let mut ks: Vec<Thunk> = Vec::with_capacity(groups.len());
        for (group_witness, mut insts) in groups {
            if dedup_sorted {
                insts.sort_by(|a, b| compare(a, b, &env));
                insts.dedup_by(|a, b| compare(a, b, &env) == Ordering::Equal);
            }
            let witness_term = witness_term.clone();
            let instances = instances.clone();
            let k = k.clone();
            let env = env.clone();
            ks.push(Box::new(move |_| {
                match unify(&witness_term, &group_witness, false, &env) {
                    Some(env) => {
                        continue_unify(&instances, &Term::new_list(insts), k, &env)
                    }
                    None => Promise::Bool(false),
                }
            }));
        }
        Promise::Delay(ks)
    })
}
