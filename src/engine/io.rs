use std::cell::RefCell;
use std::io::{Seek, Write};
use std::rc::Rc;

use super::{Cont, Engine};
use crate::env::Env;
use crate::error::Exception;
use crate::nondet::{Promise, Thunk};
use crate::read_term::{self, ReadContext};
use crate::stream::{ByteSource, EofAction, Stream, StreamMode, StreamType};
use crate::term::{each_list, Term};
use crate::unify::unify;
use crate::write::{term_to_string, WriteOptions};

fn continue_unify(a: &Rc<Term>, b: &Rc<Term>, k: Cont, env: &Env) -> Promise {
    match unify(a, b, false, env) {
        Some(env) => k(env),
        None => Promise::Bool(false),
    }
}

fn input_stream(
    engine: &Engine,
    arg: &Rc<Term>,
    env: &Env,
    binary: bool,
) -> Result<Rc<RefCell<Stream>>, Exception> {
    let id = engine.stream_id(arg, env)?;
    let s = engine
        .get_stream(id)
        .ok_or_else(|| crate::error::existence_error("stream", arg))?;
    {
        let st = s.borrow();
        if !st.is_input() {
            return Err(crate::error::permission_error("input", "stream", arg));
        }
        match (st.stream_type, binary) {
            (StreamType::Text, true) => {
                return Err(crate::error::permission_error("input", "text_stream", arg))
            }
            (StreamType::Binary, false) => {
                return Err(crate::error::permission_error(
                    "input",
                    "binary_stream",
                    arg,
                ))
            }
            _ => {}
        }
    }
    Ok(s)
}

fn output_stream(
    engine: &Engine,
    arg: &Rc<Term>,
    env: &Env,
    binary: bool,
) -> Result<Rc<RefCell<Stream>>, Exception> {
    let id = engine.stream_id(arg, env)?;
    let s = engine
        .get_stream(id)
        .ok_or_else(|| crate::error::existence_error("stream", arg))?;
    {
        let st = s.borrow();
        if !st.is_output() {
            return Err(crate::error::permission_error("output", "stream", arg));
        }
        match (st.stream_type, binary) {
            (StreamType::Text, true) => {
                return Err(crate::error::permission_error("output", "text_stream", arg))
            }
            (StreamType::Binary, false) => {
                return Err(crate::error::permission_error(
                    "output",
                    "binary_stream",
                    arg,
                ))
            }
            _ => {}
        }
    }
    Ok(s)
}

pub(super) fn solve_current_input(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    match &*env.resolve(&args[0]) {
        Term::Var(_) => {}
        Term::Compound(c) if c.functor == "$stream" && c.args.len() == 1 => {}
        t => return Promise::Error(crate::error::domain_error("stream", &Rc::new(t.clone()))),
    }
    let id = engine.with_state(|st| st.input);
    continue_unify(&args[0], &Engine::stream_term(id), k, env)
}

pub(super) fn solve_current_output(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    match &*env.resolve(&args[0]) {
        Term::Var(_) => {}
        Term::Compound(c) if c.functor == "$stream" && c.args.len() == 1 => {}
        t => return Promise::Error(crate::error::domain_error("stream", &Rc::new(t.clone()))),
    }
    let id = engine.with_state(|st| st.output);
    continue_unify(&args[0], &Engine::stream_term(id), k, env)
}

pub(super) fn solve_set_input(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let id = match engine.stream_id(&args[0], env) {
        Ok(id) => id,
        Err(e) => return Promise::Error(e),
    };
    let s = engine.get_stream(id).expect("stream table");
    if !s.borrow().is_input() {
        return Promise::Error(crate::error::permission_error("input", "stream", &args[0]));
    }
    engine.with_state(|st| st.input = id);
    k(env.clone())
}

pub(super) fn solve_set_output(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let id = match engine.stream_id(&args[0], env) {
        Ok(id) => id,
        Err(e) => return Promise::Error(e),
    };
    let s = engine.get_stream(id).expect("stream table");
    if !s.borrow().is_output() {
        return Promise::Error(crate::error::permission_error(
            "output", "stream", &args[0],
        ));
    }
    engine.with_state(|st| st.output = id);
    k(env.clone())
}

pub(super) fn solve_open(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let source_sink = env.resolve(&args[0]);
    let path = match &*source_sink {
        Term::Var(_) => {
            return Promise::Error(crate::error::instantiation_error(&source_sink))
        }
        Term::Atom(s) => s.clone(),
        _ => return Promise::Error(crate::error::domain_error("source_sink", &source_sink)),
    };
    let mode_term = env.resolve(&args[1]);
    let mode = match &*mode_term {
        Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&mode_term)),
        Term::Atom(s) => match s.as_str() {
            "read" => StreamMode::Read,
            "write" => StreamMode::Write,
            "append" => StreamMode::Append,
            _ => return Promise::Error(crate::error::domain_error("io_mode", &mode_term)),
        },
        _ => return Promise::Error(crate::error::type_error("atom", &mode_term)),
    };
    if !matches!(&*env.resolve(&args[2]), Term::Var(_)) {
        return Promise::Error(crate::error::type_error("variable", &args[2]));
    }

    let mut stream_type = StreamType::Text;
    let mut eof_action = EofAction::EofCode;
    let mut reposition = false;
    let mut alias: Option<String> = None;
    let parsed = each_list(&args[3], env, |option| {
        let option = env.resolve(option);
        let c = match &*option {
            Term::Var(_) => return Err(crate::error::instantiation_error(&option)),
            Term::Compound(c) if c.args.len() == 1 => c.clone(),
            _ => return Err(crate::error::domain_error("stream_option", &option)),
        };
        let arg = env.resolve(&c.args[0]);
        let atom = match &*arg {
            Term::Var(_) => return Err(crate::error::instantiation_error(&arg)),
            Term::Atom(s) => s.clone(),
            _ => return Err(crate::error::domain_error("stream_option", &option)),
        };
        match (c.functor.as_str(), atom.as_str()) {
            ("type", "text") => stream_type = StreamType::Text,
            ("type", "binary") => stream_type = StreamType::Binary,
            ("reposition", "true") => reposition = true,
            ("reposition", "false") => reposition = false,
            ("eof_action", "error") => eof_action = EofAction::Error,
            ("eof_action", "eof_code") => eof_action = EofAction::EofCode,
            ("eof_action", "reset") => eof_action = EofAction::Reset,
            ("alias", a) => {
                if engine.with_state(|st| st.aliases.contains_key(a)) {
                    return Err(crate::error::permission_error(
                        "open",
                        "source_sink",
                        &option,
                    ));
                }
                alias = Some(a.to_string());
            }
            _ => return Err(crate::error::domain_error("stream_option", &option)),
        }
        Ok(())
    });
    if let Err(e) = parsed {
        return Promise::Error(e);
    }

    let open_result = match mode {
        StreamMode::Read => std::fs::File::open(&path),
        StreamMode::Write => std::fs::File::create(&path),
        StreamMode::Append => std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path),
    };
    let file = match open_result {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Promise::Error(crate::error::existence_error("source_sink", &source_sink))
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Promise::Error(crate::error::permission_error(
                "open",
                "source_sink",
                &source_sink,
            ))
        }
        Err(e) => return Promise::Error(crate::error::system_error(e)),
    };
    let handle = file.try_clone().ok();

    let mut stream = Stream {
        mode,
        stream_type,
        eof_action,
        alias: alias.clone(),
        reposition,
        file_name: Some(path),
        source: None,
        sink: None,
        file: handle,
    };
    match mode {
        StreamMode::Read => stream.source = Some(ByteSource::new(Box::new(file))),
        StreamMode::Write | StreamMode::Append => stream.sink = Some(Box::new(file)),
    }

    let id = engine.with_state(|st| {
        let id = st.next_stream;
        st.next_stream += 1;
        st.streams.insert(id, Rc::new(RefCell::new(stream)));
        if let Some(a) = &alias {
            st.aliases.insert(a.clone(), id);
        }
        id
    });
    continue_unify(&args[2], &Engine::stream_term(id), k, env)
}

pub(super) fn solve_close(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let id = match engine.stream_id(&args[0], env) {
        Ok(id) => id,
        Err(e) => return Promise::Error(e),
    };
    let mut force_close = false;
    let parsed = each_list(&args[1], env, |option| {
        let option = env.resolve(option);
        match option.as_compound("force", 1) {
            Some(c) => match &*env.resolve(&c.args[0]) {
                Term::Atom(s) if s == "true" => {
                    force_close = true;
                    Ok(())
                }
                Term::Atom(s) if s == "false" => {
                    force_close = false;
                    Ok(())
                }
                Term::Var(_) => Err(crate::error::instantiation_error(&option)),
                _ => Err(crate::error::domain_error("stream_option", &option)),
            },
            None => match &*option {
                Term::Var(_) => Err(crate::error::instantiation_error(&option)),
                _ => Err(crate::error::domain_error("stream_option", &option)),
            },
        }
    });
    if let Err(e) = parsed {
        return Promise::Error(e);
    }
    let stream = engine.with_state(|st| st.streams.remove(&id));
    if let Some(s) = stream {
        let alias = s.borrow().alias.clone();
        if let Some(a) = alias {
            engine.with_state(|st| {
                st.aliases.remove(&a);
            });
        }
        if let Err(e) = s.borrow_mut().flush() {
            if !force_close {
                return Promise::Error(crate::error::system_error(e));
            }
        }
        // dropping the stream closes the underlying handles
    }
    k(env.clone())
}

pub(super) fn solve_flush_output(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let s = match output_stream(engine, &args[0], env, false) {
        Ok(s) => s,
        Err(e) => return Promise::Error(e),
    };
    if let Err(e) = s.borrow_mut().flush() {
        return Promise::Error(crate::error::system_error(e));
    }
    k(env.clone())
}

pub(super) fn solve_write_term(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let s = match output_stream(engine, &args[0], env, false) {
        Ok(s) => s,
        Err(e) => return Promise::Error(e),
    };
    let mut quoted = false;
    let mut ignore_ops = false;
    let mut numbervars = false;
    let parsed = each_list(&args[2], env, |option| {
        let option = env.resolve(option);
        let c = match &*option {
            Term::Var(_) => return Err(crate::error::instantiation_error(&option)),
            Term::Compound(c) if c.args.len() == 1 => c.clone(),
            _ => return Err(crate::error::domain_error("write_option", &option)),
        };
        let value = match &*env.resolve(&c.args[0]) {
            Term::Var(_) => return Err(crate::error::instantiation_error(&option)),
            Term::Atom(s) if s == "true" => true,
            Term::Atom(s) if s == "false" => false,
            _ => return Err(crate::error::domain_error("write_option", &option)),
        };
        match c.functor.as_str() {
            "quoted" => quoted = value,
            "ignore_ops" => ignore_ops = value,
            "numbervars" => numbervars = value,
            _ => return Err(crate::error::domain_error("write_option", &option)),
        }
        Ok(())
    });
    if let Err(e) = parsed {
        return Promise::Error(e);
    }
    let ops = engine.with_state(|st| st.operators.clone());
    let opts = WriteOptions {
        quoted,
        ops: if ignore_ops { None } else { Some(&ops) },
        numbervars,
    };
    let text = term_to_string(&args[1], &opts, env);
    if let Err(e) = s
        .borrow_mut()
        .sink
        .as_mut()
        .expect("output stream")
        .write_all(text.as_bytes())
    {
        return Promise::Error(crate::error::system_error(e));
    }
    k(env.clone())
}

pub(super) fn solve_read_term(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let s = match input_stream(engine, &args[0], env, false) {
        Ok(s) => s,
        Err(e) => return Promise::Error(e),
    };
    let mut singletons = None;
    let mut variables = None;
    let mut variable_names = None;
    let parsed = each_list(&args[2], env, |option| {
        let option = env.resolve(option);
        let c = match &*option {
            Term::Var(_) => return Err(crate::error::instantiation_error(&option)),
            Term::Compound(c) if c.args.len() == 1 => c.clone(),
            _ => return Err(crate::error::domain_error("read_option", &option)),
        };
        match c.functor.as_str() {
            "singletons" => singletons = Some(c.args[0].clone()),
            "variables" => variables = Some(c.args[0].clone()),
            "variable_names" => variable_names = Some(c.args[0].clone()),
            _ => return Err(crate::error::domain_error("read_option", &option)),
        }
        Ok(())
    });
    if let Err(e) = parsed {
        return Promise::Error(e);
    }

    let (ops, flags, conversions) = engine.with_state(|st| {
        (
            st.operators.clone(),
            st.flags.clone(),
            st.char_conversions.clone(),
        )
    });
    let rctx = ReadContext {
        ops: &ops,
        flags: &flags,
        conversions: &conversions,
    };
    let result = {
        let mut stream = s.borrow_mut();
        let source = stream.source.as_mut().expect("input stream");
        read_term::parse_term(source, &rctx)
    };
    match result {
        Ok(Some((t, vars))) => {
            let singleton_list = Term::new_list(
                vars.iter()
                    .filter(|v| v.count == 1)
                    .map(|v| Rc::new(Term::Var(v.var)))
                    .collect(),
            );
            let variable_list =
                Term::new_list(vars.iter().map(|v| Rc::new(Term::Var(v.var))).collect());
            let name_list = Term::new_list(
                vars.iter()
                    .map(|v| {
                        Term::new_compound(
                            "=",
                            vec![Term::new_atom(&v.name), Rc::new(Term::Var(v.var))],
                        )
                    })
                    .collect(),
            );
            let mut env = env.clone();
            for (opt, list) in [
                (&singletons, singleton_list),
                (&variables, variable_list),
                (&variable_names, name_list),
            ] {
                if let Some(target) = opt {
                    match unify(target, &list, false, &env) {
                        Some(e) => env = e,
                        None => return Promise::Bool(false),
                    }
                }
            }
            continue_unify(&args[1], &t, k, &env)
        }
        Ok(None) => {
            let eof_action = s.borrow().eof_action;
            match eof_action {
                EofAction::Error => Promise::Error(crate::error::permission_error(
                    "input",
                    "past_end_of_stream",
                    &args[0],
                )),
                EofAction::EofCode => {
                    continue_unify(&args[1], &Term::new_atom("end_of_file"), k, env)
                }
                EofAction::Reset => solve_read_term(engine, args, k, env),
            }
        }
        Err(e) => Promise::Error(e.to_ball()),
    }
}

fn eof_input<F>(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env, s: &Rc<RefCell<Stream>>, eof_term: Rc<Term>, retry: F) -> Promise
where
    F: FnOnce(&Engine, &[Rc<Term>], Cont, &Env) -> Promise,
{
    let eof_action = s.borrow().eof_action;
    match eof_action {
        EofAction::Error => Promise::Error(crate::error::permission_error(
            "input",
            "past_end_of_stream",
            &args[0],
        )),
        EofAction::EofCode => continue_unify(&args[1], &eof_term, k, env),
        EofAction::Reset => retry(engine, args, k, env),
    }
}

fn check_in_character(t: &Rc<Term>, env: &Env) -> Result<(), Exception> {
    let t = env.resolve(t);
    match &*t {
        Term::Var(_) => Ok(()),
        Term::Atom(s) if s.chars().count() == 1 => Ok(()),
        _ => Err(crate::error::type_error("in_character", &t)),
    }
}

fn check_in_byte(t: &Rc<Term>, env: &Env) -> Result<(), Exception> {
    let t = env.resolve(t);
    match &*t {
        Term::Var(_) => Ok(()),
        Term::Integer(i) if (0..=255).contains(i) => Ok(()),
        _ => Err(crate::error::type_error("in_byte", &t)),
    }
}

pub(super) fn solve_get_char(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let s = match input_stream(engine, &args[0], env, false) {
        Ok(s) => s,
        Err(e) => return Promise::Error(e),
    };
    if let Err(e) = check_in_character(&args[1], env) {
        return Promise::Error(e);
    }
    let read = s.borrow_mut().source.as_mut().expect("input stream").get_char();
    match read {
        Err(e) => Promise::Error(crate::error::system_error(e)),
        Ok(Some(c)) => {
            if c == char::REPLACEMENT_CHARACTER {
                return Promise::Error(crate::error::representation_error(
                    "character",
                    "invalid character",
                ));
            }
            continue_unify(&args[1], &Term::new_atom(c.to_string()), k, env)
        }
        Ok(None) => eof_input(engine, args, k, env, &s, Term::new_atom("end_of_file"), solve_get_char),
    }
}

pub(super) fn solve_peek_char(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let s = match input_stream(engine, &args[0], env, false) {
        Ok(s) => s,
        Err(e) => return Promise::Error(e),
    };
    if let Err(e) = check_in_character(&args[1], env) {
        return Promise::Error(e);
    }
    let read = s.borrow_mut().source.as_mut().expect("input stream").peek_char();
    match read {
        Err(e) => Promise::Error(crate::error::system_error(e)),
        Ok(Some(c)) => {
            if c == char::REPLACEMENT_CHARACTER {
                return Promise::Error(crate::error::representation_error(
                    "character",
                    "invalid character",
                ));
            }
            continue_unify(&args[1], &Term::new_atom(c.to_string()), k, env)
        }
        Ok(None) => eof_input(engine, args, k, env, &s, Term::new_atom("end_of_file"), solve_peek_char),
    }
}

pub(super) fn solve_get_byte(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let s = match input_stream(engine, &args[0], env, true) {
        Ok(s) => s,
        Err(e) => return Promise::Error(e),
    };
    if let Err(e) = check_in_byte(&args[1], env) {
        return Promise::Error(e);
    }
    let read = s.borrow_mut().source.as_mut().expect("input stream").get_byte();
    match read {
        Err(e) => Promise::Error(crate::error::system_error(e)),
        Ok(Some(b)) => continue_unify(&args[1], &Term::new_integer(b as i64), k, env),
        Ok(None) => eof_input(engine, args, k, env, &s, Term::new_integer(-1), solve_get_byte),
    }
}

pub(super) fn solve_peek_byte(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let s = match input_stream(engine, &args[0], env, true) {
        Ok(s) => s,
        Err(e) => return Promise::Error(e),
    };
    if let Err(e) = check_in_byte(&args[1], env) {
        return Promise::Error(e);
    }
    let read = s.borrow_mut().source.as_mut().expect("input stream").peek_byte();
    match read {
        Err(e) => Promise::Error(crate::error::system_error(e)),
        Ok(Some(b)) => continue_unify(&args[1], &Term::new_integer(b as i64), k, env),
        Ok(None) => eof_input(engine, args, k, env, &s, Term::new_integer(-1), solve_peek_byte),
    }
}

pub(super) fn solve_put_char(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let s = match output_stream(engine, &args[0], env, false) {
        Ok(s) => s,
        Err(e) => return Promise::Error(e),
    };
    let c = env.resolve(&args[1]);
    let ch = match &*c {
        Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&c)),
        Term::Atom(a) => {
            let mut chars = a.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => ch,
                _ => return Promise::Error(crate::error::type_error("character", &c)),
            }
        }
        _ => return Promise::Error(crate::error::type_error("character", &c)),
    };
    let mut buf = [0u8; 4];
    let bytes = ch.encode_utf8(&mut buf).as_bytes().to_vec();
    if let Err(e) = s.borrow_mut().sink.as_mut().expect("output stream").write_all(&bytes) {
        return Promise::Error(crate::error::system_error(e));
    }
    k(env.clone())
}

pub(super) fn solve_put_code(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let s = match output_stream(engine, &args[0], env, false) {
        Ok(s) => s,
        Err(e) => return Promise::Error(e),
    };
    let c = env.resolve(&args[1]);
    let ch = match &*c {
        Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&c)),
        Term::Integer(i) => match u32::try_from(*i).ok().and_then(char::from_u32) {
            Some(ch) => ch,
            None => {
                return Promise::Error(crate::error::representation_error(
                    "character_code",
                    "not a valid unicode code point",
                ))
            }
        },
        _ => return Promise::Error(crate::error::type_error("integer", &c)),
    };
    let mut buf = [0u8; 4];
    let bytes = ch.encode_utf8(&mut buf).as_bytes().to_vec();
    if let Err(e) = s.borrow_mut().sink.as_mut().expect("output stream").write_all(&bytes) {
        return Promise::Error(crate::error::system_error(e));
    }
    k(env.clone())
}

pub(super) fn solve_put_byte(engine: &Engine, args: &[Rc<Term>], k: Cont, env: &Env) -> Promise {
    let s = match output_stream(engine, &args[0], env, true) {
        Ok(s) => s,
        Err(e) => return Promise::Error(e),
    };
    let b = env.resolve(&args[1]);
    let byte = match &*b {
        Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&b)),
        Term::Integer(i) if (0..=255).contains(i) => *i as u8,
        _ => return Promise::Error(crate::error::type_error("byte", &b)),
    };
    if let Err(e) = s.borrow_mut().sink.as_mut().expect("output stream").write_all(&[byte]) {
        return Promise::Error(crate::error::system_error(e));
    }
    k(env.clone())
}

pub(super) fn solve_stream_property(
    engine: &Engine,
    args: &[Rc<Term>],
    k: Cont,
    env: &Env,
) -> Promise {
    let selector = env.resolve(&args[0]);
    let ids: Vec<usize> = match &*selector {
        Term::Var(_) => {
            let mut ids: Vec<usize> =
                engine.with_state(|st| st.streams.keys().copied().collect());
            ids.sort_unstable();
            ids
        }
        _ => match engine.stream_id(&selector, env) {
            Ok(id) => vec![id],
            Err(e) => return Promise::Error(e),
        },
    };

    let property = env.resolve(&args[1]);
    match &*property {
        Term::Var(_) => {}
        Term::Atom(s) if s == "input" || s == "output" => {}
        Term::Compound(c) if c.args.len() == 1 => match c.functor.as_str() {
            "file_name" | "mode" | "alias" | "position" | "end_of_stream" | "eof_action"
            | "reposition" | "type" => {}
            _ => {
                return Promise::Error(crate::error::domain_error(
                    "stream_property",
                    &property,
                ))
            }
        },
        _ => {
            return Promise::Error(crate::error::domain_error("stream_property", &property))
        }
    }

    let mut ks: Vec<Thunk> = Vec::new();
    for id in ids {
        let stream = match engine.get_stream(id) {
            Some(s) => s,
            None => continue,
        };
        let mut props: Vec<Rc<Term>> = Vec::new();
        {
            let mut s = stream.borrow_mut();
            props.push(Term::new_compound(
                "mode",
                vec![Term::new_atom(s.mode.as_atom())],
            ));
            if let Some(a) = &s.alias {
                props.push(Term::new_compound("alias", vec![Term::new_atom(a)]));
            }
            props.push(Term::new_compound(
                "eof_action",
                vec![Term::new_atom(s.eof_action.as_atom())],
            ));
            props.push(Term::new_compound(
                "type",
                vec![Term::new_atom(s.stream_type.as_atom())],
            ));
            props.push(Term::new_compound(
                "reposition",
                vec![Term::new_atom(if s.reposition { "true" } else { "false" })],
            ));
            if let Some(f) = &s.file_name {
                props.push(Term::new_compound("file_name", vec![Term::new_atom(f)]));
            }
            if s.is_output() {
                props.push(Term::new_atom("output"));
            }
            if let Some(source) = &mut s.source {
                props.push(Term::new_atom("input"));
                props.push(Term::new_compound(
                    "position",
                    vec![Term::new_integer(source.position() as i64)],
                ));
                let eos = if source.past_eof() {
                    "past"
                } else {
                    match source.peek_byte() {
                        Ok(None) => "at",
                        _ => "not",
                    }
                };
                props.push(Term::new_compound(
                    "end_of_stream",
                    vec![Term::new_atom(eos)],
                ));
            }
        }
        for p in props {
            let pattern = Term::new_compound("$sp", vec![args[0].clone(), args[1].clone()]);
            let candidate = Term::new_compound("$sp", vec![Engine::stream_term(id), p]);
            let k = k.clone();
            let env = env.clone();
            ks.push(Box::new(move |_| {
                continue_unify(&pattern, &candidate, k, &env)
            }));
        }
    }
    Promise::Delay(ks)
}

pub(super) fn solve_set_stream_position(
    engine: &Engine,
    args: &[Rc<Term>],
    k: Cont,
    env: &Env,
) -> Promise {
    let id = match engine.stream_id(&args[0], env) {
        Ok(id) => id,
        Err(e) => return Promise::Error(e),
    };
    let stream = engine.get_stream(id).expect("stream table");
    let position = env.resolve(&args[1]);
    let pos = match &*position {
        Term::Var(_) => return Promise::Error(crate::error::instantiation_error(&position)),
        Term::Integer(i) if *i >= 0 => *i as u64,
        Term::Integer(_) => {
            return Promise::Error(crate::error::domain_error(
                "not_less_than_zero",
                &position,
            ))
        }
        _ => return Promise::Error(crate::error::type_error("integer", &position)),
    };
    let mut s = stream.borrow_mut();
    if !s.reposition || s.file.is_none() {
        return Promise::Error(crate::error::permission_error(
            "reposition",
            "stream",
            &args[0],
        ));
    }
    if let Err(e) = s.file.as_mut().unwrap().seek(std::io::SeekFrom::Start(pos)) {
        return Promise::Error(crate::error::system_error(e));
    }
    if let Some(source) = &mut s.source {
        source.reset(pos);
    }
    drop(s);
    k(env.clone())
}
