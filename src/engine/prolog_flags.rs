use std::rc::Rc;

use super::{Cont, Engine};
use crate::env::Env;
use crate::flags::{QuoteFlag, UnknownFlag};
use crate::nondet::{Promise, Thunk};
use crate::term::Term;
use crate::unify::unify;

fn flag_value_error(flag: &Rc<Term>, value: &Rc<Term>) -> Promise {
    Promise::Error(crate::error::domain_error(
        "flag_value",
        &Term::new_compound("+", vec![flag.clone(), value.clone()]),
    ))
}

pub(super) fn solve_set_prolog_flag(
    engine: &Engine,
    args: &[Rc<Term>],
    k: Cont,
    env: &Env,
) -> Promise {
    let flag = env.resolve(&args[0]);
    let name = match &*flag {
        Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&flag)),
        Term::Atom(s) => s.clone(),
        _ => return Promise::Error(crate::error::type_error("atom", &flag)),
    };
    match name.as_str() {
        "bounded" | "max_integer" | "min_integer" | "integer_rounding_function"
        | "max_arity" => {
            return Promise::Error(crate::error::permission_error("modify", "flag", &flag))
        }
        "char_conversion" | "debug" | "unknown" | "double_quotes" => {}
        _ => return Promise::Error(crate::error::domain_error("prolog_flag", &flag)),
    }
    let value = env.resolve(&args[1]);
    let v = match &*value {
        Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&value)),
        Term::Atom(s) => s.clone(),
        _ => return flag_value_error(&flag, &value),
    };
    let ok = engine.with_state(|st| match (name.as_str(), v.as_str()) {
        ("char_conversion", "on") => {
            st.flags.char_conversion = true;
            true
        }
        ("char_conversion", "off") => {
            st.flags.char_conversion = false;
            true
        }
        ("debug", "on") => {
            st.flags.debug = true;
            true
        }
        ("debug", "off") => {
            st.flags.debug = false;
            true
        }
        ("unknown", "error") => {
            st.flags.unknown = UnknownFlag::Error;
            true
        }
        ("unknown", "warning") => {
            st.flags.unknown = UnknownFlag::Warning;
            true
        }
        ("unknown", "fail") => {
            st.flags.unknown = UnknownFlag::Fail;
            true
        }
        ("double_quotes", "codes") => {
            st.flags.double_quotes = QuoteFlag::Codes;
            true
        }
        ("double_quotes", "chars") => {
            st.flags.double_quotes = QuoteFlag::Chars;
            true
        }
        ("double_quotes", "atom") => {
            st.flags.double_quotes = QuoteFlag::Atom;
            true
        }
        _ => false,
    });
    if ok {
        k(env.clone())
    } else {
        flag_value_error(&flag, &value)
    }
}

fn on_off(b: bool) -> Rc<Term> {
    Term::new_atom(if b { "on" } else { "off" })
}

pub(super) fn solve_current_prolog_flag(
    engine: &Engine,
    args: &[Rc<Term>],
    k: Cont,
    env: &Env,
) -> Promise {
    let flag = env.resolve(&args[0]);
    match &*flag {
        Term::Var(_) => {}
        Term::Atom(s) => match s.as_str() {
            "bounded" | "max_integer" | "min_integer" | "integer_rounding_function"
            | "char_conversion" | "debug" | "max_arity" | "unknown" | "double_quotes" => {}
            _ => return Promise::Error(crate::error::domain_error("prolog_flag", &flag)),
        },
        _ => return Promise::Error(crate::error::type_error("atom", &flag)),
    }

    let flags = engine.with_state(|st| st.flags.clone());
    let table: Vec<(&str, Rc<Term>)> = vec![
        ("bounded", Term::new_atom("true")),
        ("max_integer", Term::new_integer(i64::MAX)),
        ("min_integer", Term::new_integer(i64::MIN)),
        ("integer_rounding_function", Term::new_atom("toward_zero")),
        ("char_conversion", on_off(flags.char_conversion)),
        ("debug", on_off(flags.debug)),
        ("max_arity", Term::new_atom("unbounded")),
        ("unknown", Term::new_atom(flags.unknown.as_atom())),
        ("double_quotes", Term::new_atom(flags.double_quotes.as_atom())),
    ];
    let pattern = Term::new_compound("$flag", vec![args[0].clone(), args[1].clone()]);
    let ks: Vec<Thunk> = table
        .into_iter()
        .map(|(name, value)| {
            let pattern = pattern.clone();
            let k = k.clone();
            let env = env.clone();
            Box::new(move |_: &crate::nondet::Ctx| {
                let candidate =
                    Term::new_compound("$flag", vec![Term::new_atom(name), value]);
                match unify(&pattern, &candidate, false, &env) {
                    Some(env) => k(env),
                    None => Promise::Bool(false),
                }
            }) as Thunk
        })
        .collect();
    Promise::Delay(ks)
}

fn single_char(t: &Rc<Term>, env: &Env) -> Result<Option<char>, crate::error::Exception> {
    let t = env.resolve(t);
    match &*t {
        Term::Var(_) => Ok(None),
        Term::Atom(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Some(c)),
                _ => Err(crate::error::representation_error(
                    "character",
                    "not a one char atom",
                )),
            }
        }
        _ => Err(crate::error::representation_error(
            "character",
            "not a one char atom",
        )),
    }
}

pub(super) fn solve_char_conversion(
    engine: &Engine,
    args: &[Rc<Term>],
    k: Cont,
    env: &Env,
) -> Promise {
    let input = match single_char(&args[0], env) {
        Ok(Some(c)) => c,
        Ok(None) => {
            return Promise::Error(crate::error::instantiation_error(&env.resolve(&args[0])))
        }
        Err(e) => return Promise::Error(e),
    };
    let output = match single_char(&args[1], env) {
        Ok(Some(c)) => c,
        Ok(None) => {
            return Promise::Error(crate::error::instantiation_error(&env.resolve(&args[1])))
        }
        Err(e) => return Promise::Error(e),
    };
    engine.with_state(|st| {
        if input == output {
            st.char_conversions.remove(&input);
        } else {
            st.char_conversions.insert(input, output);
        }
    });
    k(env.clone())
}

pub(super) fn solve_current_char_conversion(
    engine: &Engine,
    args: &[Rc<Term>],
    k: Cont,
    env: &Env,
) -> Promise {
    let input = match single_char(&args[0], env) {
        Ok(c) => c,
        Err(e) => return Promise::Error(e),
    };
    if let Err(e) = single_char(&args[1], env) {
        return Promise::Error(e);
    }

    if let Some(c) = input {
        let out = engine.with_state(|st| st.char_conversions.get(&c).copied().unwrap_or(c));
        return match unify(&args[1], &Term::new_atom(out.to_string()), false, env) {
            Some(env) => k(env),
            None => Promise::Bool(false),
        };
    }

    // enumerate the defined conversions in a stable order
    let mut pairs: Vec<(char, char)> =
        engine.with_state(|st| st.char_conversions.iter().map(|(a, b)| (*a, *b)).collect());
    pairs.sort_unstable();
    let pattern = Term::new_compound("$conv", vec![args[0].clone(), args[1].clone()]);
    let ks: Vec<Thunk> = pairs
        .into_iter()
        .map(|(a, b)| {
            let pattern = pattern.clone();
            let k = k.clone();
            let env = env.clone();
            Box::new(move |_: &crate::nondet::Ctx| {
                let candidate = Term::new_compound(
                    "$conv",
                    vec![
                        Term::new_atom(a.to_string()),
                        Term::new_atom(b.to_string()),
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
