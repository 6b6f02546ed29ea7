use std::cmp::Ordering;
use std::rc::Rc;

use phf::phf_map;

use super::{Cont, Engine};
use crate::env::Env;
use crate::error::Exception;
use crate::nondet::Promise;
use crate::term::{Pi, Term};
use crate::unify::unify;

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_term(&self) -> Rc<Term> {
        match self {
            Num::Int(i) => Term::new_integer(*i),
            Num::Float(f) => Term::new_float(*f),
        }
    }
}

fn float_of(n: &Num) -> f64 {
    match n {
        Num::Int(i) => *i as f64,
        Num::Float(f) => *f,
    }
}

fn int_of(n: &Num) -> Result<i64, Exception> {
    match n {
        Num::Int(i) => Ok(*i),
        Num::Float(f) => Err(crate::error::type_error(
            "integer",
            &Term::new_float(*f),
        )),
    }
}

fn promote2(a: &Num, b: &Num, fi: impl Fn(i64, i64) -> i64, ff: impl Fn(f64, f64) -> f64) -> Num {
    match (a, b) {
        (Num::Int(i), Num::Int(j)) => Num::Int(fi(*i, *j)),
        _ => Num::Float(ff(float_of(a), float_of(b))),
    }
}

fn eval(t: &Rc<Term>, env: &Env) -> Result<Num, Exception> {
    let t = env.resolve(t);
    match &*t {
        Term::Var(_) => Err(crate::error::instantiation_error(&t)),
        Term::Integer(i) => Ok(Num::Int(*i)),
        Term::Float(f) => Ok(Num::Float(*f)),
        Term::Atom(s) => Err(crate::error::type_error(
            "evaluable",
            &Pi::new(s, 0).as_term(),
        )),
        Term::Compound(c) => {
            let key = format!("{}/{}", c.functor, c.args.len());
            match EVALUABLES.get(key.as_str()) {
                None => Err(crate::error::type_error(
                    "evaluable",
                    &Pi::new(&c.functor, c.args.len()).as_term(),
                )),
                Some(f) => {
                    let mut vals = Vec::with_capacity(c.args.len());
                    for a in &c.args {
                        vals.push(eval(a, env)?);
                    }
                    f(&vals)
                }
            }
        }
    }
}

type EvalFn = fn(&[Num]) -> Result<Num, Exception>;

// Integer arithmetic wraps on overflow; the bounded flag advertises 64-bit
// two's complement.

fn eval_add(args: &[Num]) -> Result<Num, Exception> {
    Ok(promote2(&args[0], &args[1], i64::wrapping_add, |a, b| a + b))
}

fn eval_sub(args: &[Num]) -> Result<Num, Exception> {
    Ok(promote2(&args[0], &args[1], i64::wrapping_sub, |a, b| a - b))
}

fn eval_mul(args: &[Num]) -> Result<Num, Exception> {
    Ok(promote2(&args[0], &args[1], i64::wrapping_mul, |a, b| a * b))
}

fn eval_div(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Float(float_of(&args[0]) / float_of(&args[1])))
}

fn eval_int_div(args: &[Num]) -> Result<Num, Exception> {
    let (i, j) = (int_of(&args[0])?, int_of(&args[1])?);
    if j == 0 {
        return Err(crate::error::evaluation_error("zero_divisor"));
    }
    Ok(Num::Int(i.wrapping_div(j)))
}

fn eval_rem(args: &[Num]) -> Result<Num, Exception> {
    let (i, j) = (int_of(&args[0])?, int_of(&args[1])?);
    if j == 0 {
        return Err(crate::error::evaluation_error("zero_divisor"));
    }
    Ok(Num::Int(i.wrapping_rem(j)))
}

fn eval_mod(args: &[Num]) -> Result<Num, Exception> {
    let (i, j) = (int_of(&args[0])?, int_of(&args[1])?);
    if j == 0 {
        return Err(crate::error::evaluation_error("zero_divisor"));
    }
    Ok(Num::Int(i.wrapping_rem(j).wrapping_add(j).wrapping_rem(j)))
}

fn eval_pow(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Float(float_of(&args[0]).powf(float_of(&args[1]))))
}

fn eval_neg(args: &[Num]) -> Result<Num, Exception> {
    Ok(match &args[0] {
        Num::Int(i) => Num::Int(i.wrapping_neg()),
        Num::Float(f) => Num::Float(-f),
    })
}

fn eval_abs(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Float(float_of(&args[0]).abs()))
}

fn eval_sign(args: &[Num]) -> Result<Num, Exception> {
    Ok(match &args[0] {
        Num::Int(i) => Num::Int(i.signum()),
        Num::Float(f) => Num::Float(match f.partial_cmp(&0.0) {
            Some(Ordering::Less) => -1.0,
            Some(Ordering::Equal) => 0.0,
            Some(Ordering::Greater) => 1.0,
            None => *f,
        }),
    })
}

fn eval_float(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Float(float_of(&args[0])))
}

fn eval_floor(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Float(float_of(&args[0]).floor()))
}

fn eval_ceiling(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Float(float_of(&args[0]).ceil()))
}

fn eval_truncate(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Float(float_of(&args[0]).trunc()))
}

fn eval_round(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Float(float_of(&args[0]).round()))
}

fn eval_sqrt(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Float(float_of(&args[0]).sqrt()))
}

fn eval_sin(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Float(float_of(&args[0]).sin()))
}

fn eval_cos(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Float(float_of(&args[0]).cos()))
}

fn eval_atan(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Float(float_of(&args[0]).atan()))
}

fn eval_exp(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Float(float_of(&args[0]).exp()))
}

fn eval_log(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Float(float_of(&args[0]).ln()))
}

fn eval_complement(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Int(!int_of(&args[0])?))
}

fn eval_and(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Int(int_of(&args[0])? & int_of(&args[1])?))
}

fn eval_or(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Int(int_of(&args[0])? | int_of(&args[1])?))
}

fn eval_shr(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Int(int_of(&args[0])?.wrapping_shr(int_of(&args[1])? as u32)))
}

fn eval_shl(args: &[Num]) -> Result<Num, Exception> {
    Ok(Num::Int(int_of(&args[0])?.wrapping_shl(int_of(&args[1])? as u32)))
}

static EVALUABLES: phf::Map<&'static str, EvalFn> = phf_map! {
    "+/2" => eval_add,
    "-/2" => eval_sub,
    "*/2" => eval_mul,
    "//2" => eval_div,
    "///2" => eval_int_div,
    "rem/2" => eval_rem,
    "mod/2" => eval_mod,
    "**/2" => eval_pow,
    "-/1" => eval_neg,
    "abs/1" => eval_abs,
    "sign/1" => eval_sign,
    "float/1" => eval_float,
    "floor/1" => eval_floor,
    "ceiling/1" => eval_ceiling,
    "truncate/1" => eval_truncate,
    "round/1" => eval_round,
    "sqrt/1" => eval_sqrt,
    "sin/1" => eval_sin,
    "cos/1" => eval_cos,
    "atan/1" => eval_atan,
    "exp/1" => eval_exp,
    "log/1" => eval_log,
    "\\/1" => eval_complement,
    "/\\/2" => eval_and,
    "\\//2" => eval_or,
    ">>/2" => eval_shr,
    "<</2" => eval_shl,
};

pub(super) fn solve_is(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    match eval(&args[1], env) {
        Err(e) => Promise::Error(e),
        Ok(v) => match unify(&args[0], &v.as_term(), false, env) {
            Some(env) => k(env),
            None => Promise::Bool(false),
        },
    }
}

fn arith_compare(args: &[Rc<Term>], env: &Env) -> Result<Option<Ordering>, Exception> {
    let a = eval(&args[0], env)?;
    let b = eval(&args[1], env)?;
    Ok(match (a, b) {
        (Num::Int(i), Num::Int(j)) => i.partial_cmp(&j),
        (a, b) => float_of(&a).partial_cmp(&float_of(&b)),
    })
}

fn arith_test(
    args: &[Rc<Term>],
    k: Cont,
    env: &Env,
    pred: impl FnOnce(Ordering) -> bool,
) -> Promise {
    match arith_compare(args, env) {
        Err(e) => Promise::Error(e),
        Ok(Some(o)) if pred(o) => k(env.clone()),
        Ok(_) => Promise::Bool(false),
    }
}

pub(super) fn solve_arith_eq(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    arith_test(args, k, env, |o| o == Ordering::Equal)
}

pub(super) fn solve_arith_neq(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    arith_test(args, k, env, |o| o != Ordering::Equal)
}

pub(super) fn solve_arith_lss(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    arith_test(args, k, env, |o| o == Ordering::Less)
}

pub(super) fn solve_arith_leq(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    arith_test(args, k, env, |o| o != Ordering::Greater)
}

pub(super) fn solve_arith_gtr(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    arith_test(args, k, env, |o| o == Ordering::Greater)
}

pub(super) fn solve_arith_geq(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    arith_test(args, k, env, |o| o != Ordering::Less)
}
