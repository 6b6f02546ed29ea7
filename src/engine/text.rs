use std::rc::Rc;

use super::{Cont, Engine};
use crate::env::Env;
use crate::error::Exception;
use crate::nondet::{Promise, Thunk};
use crate::term::{each_list, Term};
use crate::unify::unify;

fn continue_unify(a: &Rc<Term>, b: &Rc<Term>, k: Cont, env: &Env) -> Promise {
    match unify(a, b, false, env) {
        Some(env) => k(env),
        None => Promise::Bool(false),
    }
}

fn continue_unify2(
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

// length arguments share this validation: unbound or a non-negative integer
fn check_length(t: &Rc<Term>, env: &Env) -> Result<(), Exception> {
    let t = env.resolve(t);
    match &*t {
        Term::Var(_) => Ok(()),
        Term::Integer(i) => {
            if *i < 0 {
                Err(crate::error::domain_error("not_less_than_zero", &t))
            } else {
                Ok(())
            }
        }
        _ => Err(crate::error::type_error("integer", &t)),
    }
}

pub(super) fn solve_atom_length(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let a = env.resolve(&args[0]);
    match &*a {
        Term::Var(_) => Promise::Error(crate::error::instantiation_error(&a)),
        Term::Atom(s) => {
            if let Err(e) = check_length(&args[1], env) {
                return Promise::Error(e);
            }
            let len = Term::new_integer(s.chars().count() as i64);
            continue_unify(&args[1], &len, k, env)
        }
        _ => Promise::Error(crate::error::type_error("atom", &a)),
    }
}

pub(super) fn solve_atom_concat(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let whole = env.resolve(&args[2]);
    match &*whole {
        Term::Var(_) => {
            let a1 = env.resolve(&args[0]);
            let a2 = env.resolve(&args[1]);
            let s1 = match &*a1 {
                Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&a1)),
                Term::Atom(s) => s.clone(),
                _ => return Promise::Error(crate::error::type_error("atom", &a1)),
            };
            let s2 = match &*a2 {
                Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&a2)),
                Term::Atom(s) => s.clone(),
                _ => return Promise::Error(crate::error::type_error("atom", &a2)),
            };
            continue_unify(&whole, &Term::new_atom(format!("{}{}", s1, s2)), k, env)
        }
        Term::Atom(s) => {
            for a in &args[0..2] {
                match &*env.resolve(a) {
                    Term::Var(_) | Term::Atom(_) => {}
                    t => {
                        return Promise::Error(crate::error::type_error(
                            "atom",
                            &Rc::new(t.clone()),
                        ))
                    }
                }
            }
            // all splits, including the empty prefix and suffix
            let chars: Vec<char> = s.chars().collect();
            let mut ks: Vec<Thunk> = Vec::with_capacity(chars.len() + 1);
            for i in 0..=chars.len() {
                let prefix: String = chars[..i].iter().collect();
                let suffix: String = chars[i..].iter().collect();
                let a1 = args[0].clone();
                let a2 = args[1].clone();
                let k = k.clone();
                let env = env.clone();
                ks.push(Box::new(move |_| {
                    continue_unify2(
                        &a1,
                        &Term::new_atom(prefix),
                        &a2,
                        &Term::new_atom(suffix),
                        k,
                        &env,
                    )
                }));
            }
            Promise::Delay(ks)
        }
        _ => Promise::Error(crate::error::type_error("atom", &whole)),
    }
}

pub(super) fn solve_sub_atom(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let whole = env.resolve(&args[0]);
    let s = match &*whole {
        Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&whole)),
        Term::Atom(s) => s.clone(),
        _ => return Promise::Error(crate::error::type_error("atom", &whole)),
    };
    for t in &args[1..4] {
        if let Err(e) = check_length(t, env) {
            return Promise::Error(e);
        }
    }
    match &*env.resolve(&args[4]) {
        Term::Var(_) | Term::Atom(_) => {}
        t => {
            return Promise::Error(crate::error::type_error("atom", &Rc::new(t.clone())))
        }
    }
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len();
    let pattern = Term::new_compound(
        "$sub_atom",
        vec![
            args[1].clone(),
            args[2].clone(),
            args[3].clone(),
            args[4].clone(),
        ],
    );
    // enumerate ascending by before, then by length
    let mut ks: Vec<Thunk> = Vec::new();
    for i in 0..=n {
        for j in i..=n {
            let sub: String = chars[i..j].iter().collect();
            let candidate = Term::new_compound(
                "$sub_atom",
                vec![
                    Term::new_integer(i as i64),
                    Term::new_integer((j - i) as i64),
                    Term::new_integer((n - j) as i64),
                    Term::new_atom(sub),
                ],
            );
            let pattern = pattern.clone();
            let k = k.clone();
            let env = env.clone();
            ks.push(Box::new(move |_| {
                continue_unify(&pattern, &candidate, k, &env)
            }));
        }
    }
    Promise::Delay(ks)
}

// builds the text of a char list (type_error(character) on anything else)
fn chars_text(t: &Rc<Term>, env: &Env) -> Result<String, Exception> {
    let mut s = String::new();
    each_list(t, env, |e| {
        let e = env.resolve(e);
        match &*e {
            Term::Var(_) => Err(crate::error::instantiation_error(&e)),
            Term::Atom(a) if a.chars().count() == 1 => {
                s.push(a.chars().next().unwrap());
                Ok(())
            }
            _ => Err(crate::error::type_error("character", &e)),
        }
    })?;
    Ok(s)
}

// builds the text of a code list
fn codes_text(t: &Rc<Term>, env: &Env) -> Result<String, Exception> {
    let mut s = String::new();
    each_list(t, env, |e| {
        let e = env.resolve(e);
        match &*e {
            Term::Var(_) => Err(crate::error::instantiation_error(&e)),
            Term::Integer(i) => match u32::try_from(*i).ok().and_then(char::from_u32) {
                Some(c) => {
                    s.push(c);
                    Ok(())
                }
                None => Err(crate::error::representation_error(
                    "character_code",
                    "not a valid unicode code point",
                )),
            },
            _ => Err(crate::error::representation_error(
                "character_code",
                "not a valid character code",
            )),
        }
    })?;
    Ok(s)
}

fn text_chars(s: &str) -> Rc<Term> {
    Term::new_list(s.chars().map(|c| Term::new_atom(c.to_string())).collect())
}

fn text_codes(s: &str) -> Rc<Term> {
    Term::new_list(s.chars().map(|c| Term::new_integer(c as i64)).collect())
}

pub(super) fn solve_atom_chars(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let a = env.resolve(&args[0]);
    match &*a {
        Term::Var(_) => match chars_text(&args[1], env) {
            Ok(s) => continue_unify(&a, &Term::new_atom(s), k, env),
            Err(e) => Promise::Error(e),
        },
        Term::Atom(s) => continue_unify(&args[1], &text_chars(s), k, env),
        _ => Promise::Error(crate::error::type_error("atom", &a)),
    }
}

pub(super) fn solve_atom_codes(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let a = env.resolve(&args[0]);
    match &*a {
        Term::Var(_) => match codes_text(&args[1], env) {
            Ok(s) => continue_unify(&a, &Term::new_atom(s), k, env),
            Err(e) => Promise::Error(e),
        },
        Term::Atom(s) => continue_unify(&args[1], &text_codes(s), k, env),
        _ => Promise::Error(crate::error::type_error("atom", &a)),
    }
}

pub(super) fn solve_char_code(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let ch = env.resolve(&args[0]);
    match &*ch {
        Term::Var(_) => {
            let code = env.resolve(&args[1]);
            match &*code {
                Term::Var(_) => Promise::Error(crate::error::instantiation_error(&ch)),
                Term::Integer(i) => match u32::try_from(*i).ok().and_then(char::from_u32) {
                    Some(c) => {
                        continue_unify(&ch, &Term::new_atom(c.to_string()), k, env)
                    }
                    None => Promise::Error(crate::error::representation_error(
                        "character_code",
                        "not a valid unicode code point",
                    )),
                },
                _ => Promise::Error(crate::error::type_error("integer", &code)),
            }
        }
        Term::Atom(s) => {
            match &*env.resolve(&args[1]) {
                Term::Var(_) | Term::Integer(_) => {}
                t => {
                    return Promise::Error(crate::error::type_error(
                        "integer",
                        &Rc::new(t.clone()),
                    ))
                }
            }
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => {
                    continue_unify(&args[1], &Term::new_integer(c as i64), k, env)
                }
                _ => Promise::Error(crate::error::type_error("character", &ch)),
            }
        }
        _ => Promise::Error(crate::error::type_error("character", &ch)),
    }
}

fn number_text(n: &Rc<Term>) -> String {
    match &**n {
        Term::Integer(i) => i.to_string(),
        Term::Float(f) => format!("{:?}", f),
        _ => unreachable!(),
    }
}

fn solve_number_text(
    args: &[Rc<Term>],
    k: Cont,
    env: &Env,
    text_of: fn(&Rc<Term>, &Env) -> Result<String, Exception>,
    term_of: fn(&str) -> Rc<Term>,
) -> Promise {
    let list = env.resolve(&args[1]);
    if !matches!(&*list, Term::Var(_)) {
        let num = env.resolve(&args[0]);
        match &*num {
            Term::Var(_) | Term::Integer(_) | Term::Float(_) => {}
            _ => return Promise::Error(crate::error::type_error("number", &num)),
        }
        let text = match text_of(&list, env) {
            Ok(s) => s,
            Err(e) => return Promise::Error(e),
        };
        return match crate::read_term::parse_number(&text) {
            Ok(t) => continue_unify(&args[0], &t, k, env),
            Err(_) => Promise::Error(crate::error::syntax_error("not_a_number")),
        };
    }
    let num = env.resolve(&args[0]);
    match &*num {
        Term::Var(_) => Promise::Error(crate::error::instantiation_error(&num)),
        Term::Integer(_) | Term::Float(_) => {
            continue_unify(&args[1], &term_of(&number_text(&num)), k, env)
        }
        _ => Promise::Error(crate::error::type_error("number", &num)),
    }
}

pub(super) fn solve_number_chars(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    solve_number_text(args, k, env, chars_text, text_chars)
}

pub(super) fn solve_number_codes(_: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    solve_number_text(args, k, env, codes_text, text_codes)
}
