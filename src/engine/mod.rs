mod arith;
mod bootstrap;
mod builtins;
mod clause;
mod collect;
mod control;
mod database;
mod io;
mod ops;
mod prolog_flags;
mod terms;
mod text;
mod typing;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::env::Env;
use crate::error::{Error, Exception};
use crate::flags::{Flags, UnknownFlag};
use crate::nondet::{force, Ctx, Promise, Thunk};
use crate::operators::OperatorTable;
use crate::read_term::{self, ParsedVar, ReadContext};
use crate::stream::{ByteSource, Stream};
use crate::term::{Pi, Term};

pub(crate) use clause::Clause;

/// Success continuation: receives the extended environment and returns the
/// rest of the search tree. Returning Bool(false) asks for more solutions.
pub type Cont = Rc<dyn Fn(Env) -> Promise>;

/// The effect function of a built-in predicate.
pub type BuiltinFn = fn(&Engine, &[Rc<Term>], Cont, &Env) -> Promise;

/// Trace hook: (procedure, arguments, environment).
pub type Hook = Rc<dyn Fn(&Pi, &[Rc<Term>], &Env)>;

#[derive(Clone)]
pub(crate) enum Procedure {
    Builtin(BuiltinFn),
    Clauses(Rc<Vec<Rc<Clause>>>),
}

#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub on_call: Option<Hook>,
    pub on_exit: Option<Hook>,
    pub on_fail: Option<Hook>,
    pub on_redo: Option<Hook>,
    pub on_unknown: Option<Hook>,
}

pub(crate) struct State {
    pub procedures: HashMap<Pi, Procedure>,
    pub operators: OperatorTable,
    pub flags: Flags,
    pub char_conversions: HashMap<char, char>,
    pub streams: HashMap<usize, Rc<RefCell<Stream>>>,
    pub aliases: HashMap<String, usize>,
    pub next_stream: usize,
    pub input: usize,
    pub output: usize,
    pub next_barrier: u64,
    pub hooks: Hooks,
    pub exit: Box<dyn FnMut(i32)>,
}

/// One interpreter instance: procedure database, operator table, streams,
/// flags and hooks. Clones share the same underlying state; an Engine is
/// single-threaded and must not run concurrent queries.
#[derive(Clone)]
pub struct Engine {
    state: Rc<RefCell<State>>,
}

/// One answer of a query: the named query variables and their terms.
#[derive(Debug, Clone)]
pub struct Solution {
    bindings: Vec<(String, Rc<Term>)>,
}

impl Solution {
    fn new(vars: &[ParsedVar], env: &Env) -> Self {
        let bindings = vars
            .iter()
            .map(|v| (v.name.clone(), env.simplify(&Rc::new(Term::Var(v.var)))))
            .collect();
        Solution { bindings }
    }

    pub fn get(&self, name: &str) -> Option<&Rc<Term>> {
        self.bindings
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    pub fn bindings(&self) -> &[(String, Rc<Term>)] {
        &self.bindings
    }
}

impl Engine {
    /// A fresh engine reading from stdin and writing to stdout.
    pub fn new() -> Self {
        Self::with_io(std::io::stdin(), std::io::stdout())
    }

    /// A fresh engine with the given standard streams.
    pub fn with_io(input: impl std::io::Read + 'static, output: impl std::io::Write + 'static) -> Self {
        let mut procedures = HashMap::new();
        for (key, f) in builtins::BUILTINS.entries() {
            let (name, arity) = key.rsplit_once('/').expect("builtin key");
            procedures.insert(
                Pi::new(name, arity.parse().expect("builtin arity")),
                Procedure::Builtin(*f),
            );
        }

        let mut streams = HashMap::new();
        let mut aliases = HashMap::new();
        let mut stdin = Stream::input_text(Box::new(input));
        stdin.alias = Some("user_input".to_string());
        let mut stdout = Stream::output_text(Box::new(output));
        stdout.alias = Some("user_output".to_string());
        streams.insert(0, Rc::new(RefCell::new(stdin)));
        streams.insert(1, Rc::new(RefCell::new(stdout)));
        aliases.insert("user_input".to_string(), 0);
        aliases.insert("user_output".to_string(), 1);

        let engine = Engine {
            state: Rc::new(RefCell::new(State {
                procedures,
                operators: OperatorTable::new(),
                flags: Flags::default(),
                char_conversions: HashMap::new(),
                streams,
                aliases,
                next_stream: 2,
                input: 0,
                output: 1,
                next_barrier: 0,
                hooks: Hooks::default(),
                exit: Box::new(|code| std::process::exit(code)),
            })),
        };
        engine
            .consult(bootstrap::BOOTSTRAP)
            .expect("bootstrap library");
        engine
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }

    pub(crate) fn new_barrier(&self) -> u64 {
        self.with_state(|st| {
            st.next_barrier += 1;
            st.next_barrier
        })
    }

    /// Registers a built-in predicate under name/arity, replacing any
    /// existing procedure.
    pub fn register_builtin(&self, name: &str, arity: usize, f: BuiltinFn) {
        self.with_state(|st| {
            st.procedures
                .insert(Pi::new(name, arity), Procedure::Builtin(f))
        });
    }

    pub fn on_call(&self, h: impl Fn(&Pi, &[Rc<Term>], &Env) + 'static) {
        self.with_state(|st| st.hooks.on_call = Some(Rc::new(h)));
    }

    pub fn on_exit(&self, h: impl Fn(&Pi, &[Rc<Term>], &Env) + 'static) {
        self.with_state(|st| st.hooks.on_exit = Some(Rc::new(h)));
    }

    pub fn on_fail(&self, h: impl Fn(&Pi, &[Rc<Term>], &Env) + 'static) {
        self.with_state(|st| st.hooks.on_fail = Some(Rc::new(h)));
    }

    pub fn on_redo(&self, h: impl Fn(&Pi, &[Rc<Term>], &Env) + 'static) {
        self.with_state(|st| st.hooks.on_redo = Some(Rc::new(h)));
    }

    pub fn on_unknown(&self, h: impl Fn(&Pi, &[Rc<Term>], &Env) + 'static) {
        self.with_state(|st| st.hooks.on_unknown = Some(Rc::new(h)));
    }

    /// Replaces the process-exit effect used by halt/0 and halt/1.
    pub fn set_exit_handler(&self, f: impl FnMut(i32) + 'static) {
        self.with_state(|st| st.exit = Box::new(f));
    }

    /// Dispatches a goal arrival to a built-in or the database.
    pub(crate) fn arrive(&self, pi: Pi, args: Vec<Rc<Term>>, k: Cont, env: &Env) -> Promise {
        tracing::trace!(target: "modus::engine", procedure = %pi, "arrive");
        let proc = self.state.borrow().procedures.get(&pi).cloned();
        match proc {
            Some(Procedure::Builtin(f)) => f(self, &args, k, env),
            Some(Procedure::Clauses(cs)) => self.call_clauses(&pi, cs, args, k, env),
            None => {
                let (unknown, hook) = {
                    let st = self.state.borrow();
                    (st.flags.unknown, st.hooks.on_unknown.clone())
                };
                if let Some(h) = hook {
                    h(&pi, &args, env);
                }
                match unknown {
                    UnknownFlag::Error => {
                        Promise::Error(crate::error::existence_error_procedure(&pi))
                    }
                    UnknownFlag::Warning => {
                        tracing::warn!(target: "modus::engine", procedure = %pi, "unknown procedure");
                        Promise::Bool(false)
                    }
                    UnknownFlag::Fail => Promise::Bool(false),
                }
            }
        }
    }

    /// Builds the lazy alternatives for a user-defined procedure: one per
    /// clause, in source order, under a fresh cut barrier.
    pub(crate) fn call_clauses(
        &self,
        pi: &Pi,
        cs: Rc<Vec<Rc<Clause>>>,
        args: Vec<Rc<Term>>,
        k: Cont,
        env: &Env,
    ) -> Promise {
        if cs.is_empty() {
            return Promise::Bool(false);
        }
        let barrier = self.new_barrier();
        let mut alternatives: Vec<Thunk> = Vec::with_capacity(cs.len());
        for (i, c) in cs.iter().enumerate() {
            let c = c.clone();
            let engine = self.clone();
            let args = args.clone();
            let k = k.clone();
            let env = env.clone();
            let pi = pi.clone();
            alternatives.push(Box::new(move |_ctx: &Ctx| {
                let hooks = engine.state.borrow().hooks.clone();
                let fired = if i == 0 {
                    hooks.on_call.as_ref()
                } else {
                    hooks.on_redo.as_ref()
                };
                if let Some(h) = fired {
                    h(&pi, &args, &env);
                }
                let exit_cont: Cont = {
                    let k = k.clone();
                    let h = hooks.on_exit.clone();
                    let pi = pi.clone();
                    let args = args.clone();
                    Rc::new(move |env: Env| {
                        if let Some(h) = &h {
                            h(&pi, &args, &env);
                        }
                        k(env)
                    })
                };
                let try_clause: Thunk = {
                    let engine = engine.clone();
                    let c = c.clone();
                    let args = args.clone();
                    let env = env.clone();
                    Box::new(move |_: &Ctx| {
                        clause::solve(engine, c, args, exit_cont, env, barrier)
                    })
                };
                let notify_fail: Thunk = {
                    let h = hooks.on_fail.clone();
                    let pi = pi.clone();
                    let args = args.clone();
                    let env = env.clone();
                    Box::new(move |_: &Ctx| {
                        if let Some(h) = &h {
                            h(&pi, &args, &env);
                        }
                        Promise::Bool(false)
                    })
                };
                Promise::Delay(vec![try_clause, notify_fail])
            }));
        }
        Promise::Barrier(barrier, alternatives)
    }

    fn reader_snapshot(&self) -> (OperatorTable, Flags, HashMap<char, char>) {
        let st = self.state.borrow();
        (
            st.operators.clone(),
            st.flags.clone(),
            st.char_conversions.clone(),
        )
    }

    /// Loads program text: clauses are asserted in order, `:- Goal`
    /// directives run immediately.
    pub fn consult(&self, text: &str) -> Result<(), Error> {
        let mut src = ByteSource::from_string(text);
        loop {
            // a directive may change operators or flags mid-file, so the
            // reader context is renewed per clause
            let (ops, flags, conversions) = self.reader_snapshot();
            let ctx = ReadContext {
                ops: &ops,
                flags: &flags,
                conversions: &conversions,
            };
            match read_term::parse_term(&mut src, &ctx)? {
                None => return Ok(()),
                Some((t, _)) => self.load(&t)?,
            }
        }
    }

    fn load(&self, t: &Rc<Term>) -> Result<(), Error> {
        let env = Env::new();
        if let Some(c) = t.as_compound(":-", 1) {
            let goal = c.args[0].clone();
            let k: Cont = Rc::new(|_env| Promise::Bool(true));
            let p = control::call_goal(self, &goal, k, &env);
            match force(p, &Ctx::new()) {
                Ok(true) => Ok(()),
                Ok(false) => Err(Error::DirectiveFailed(env.simplify(&goal))),
                Err(e) => Err(e.into()),
            }
        } else {
            database::assert_term(self, t, &env, true).map_err(Error::from)
        }
    }

    /// Parses and runs a query. The sink receives each solution and returns
    /// true to ask for another one. The result is whether any solution was
    /// found.
    pub fn query<F>(&self, text: &str, sink: F) -> Result<bool, Error>
    where
        F: FnMut(&Solution) -> bool + 'static,
    {
        self.query_ctx(text, &Ctx::new(), sink)
    }

    /// Like `query`, under a caller-supplied cancellation context.
    pub fn query_ctx<F>(&self, text: &str, ctx: &Ctx, sink: F) -> Result<bool, Error>
    where
        F: FnMut(&Solution) -> bool + 'static,
    {
        let (ops, flags, conversions) = self.reader_snapshot();
        let rctx = ReadContext {
            ops: &ops,
            flags: &flags,
            conversions: &conversions,
        };
        let mut src = ByteSource::from_string(text);
        let (goal, vars) = match read_term::parse_term(&mut src, &rctx)? {
            Some(r) => r,
            None => return Ok(false),
        };

        let env = Env::new();
        let found = Rc::new(std::cell::Cell::new(false));
        let sink = Rc::new(RefCell::new(sink));
        let k: Cont = {
            let found = found.clone();
            Rc::new(move |env: Env| {
                found.set(true);
                let solution = Solution::new(&vars, &env);
                let more = (*sink.borrow_mut())(&solution);
                if more {
                    Promise::Bool(false)
                } else {
                    Promise::Bool(true)
                }
            })
        };
        let p = control::call_goal(self, &goal, k, &env);
        force(p, ctx)?;
        Ok(found.get())
    }

    // stream plumbing shared by the I/O builtins

    pub(crate) fn stream_term(id: usize) -> Rc<Term> {
        Term::new_compound("$stream", vec![Term::new_integer(id as i64)])
    }

    /// Resolves a stream-or-alias term to a stream table id.
    pub(crate) fn stream_id(&self, t: &Rc<Term>, env: &Env) -> Result<usize, Exception> {
        let t = env.resolve(t);
        match &*t {
            Term::Var(_) => Err(crate::error::instantiation_error(&t)),
            Term::Atom(alias) => {
                let id = self.state.borrow().aliases.get(alias).copied();
                id.ok_or_else(|| crate::error::existence_error("stream", &t))
            }
            Term::Compound(c) if c.functor == "$stream" && c.args.len() == 1 => {
                match &*env.resolve(&c.args[0]) {
                    Term::Integer(i) if *i >= 0 => {
                        let id = *i as usize;
                        if self.state.borrow().streams.contains_key(&id) {
                            Ok(id)
                        } else {
                            Err(crate::error::existence_error("stream", &t))
                        }
                    }
                    _ => Err(crate::error::domain_error("stream_or_alias", &t)),
                }
            }
            _ => Err(crate::error::domain_error("stream_or_alias", &t)),
        }
    }

    pub(crate) fn get_stream(&self, id: usize) -> Option<Rc<RefCell<Stream>>> {
        self.state.borrow().streams.get(&id).cloned()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

#[cfg(test)]
mod test;
