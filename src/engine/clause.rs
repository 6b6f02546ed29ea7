use std::collections::VecDeque;
use std::rc::Rc;

use super::{Cont, Engine};
use crate::env::Env;
use crate::error::Exception;
use crate::nondet::Promise;
use crate::term::{Pi, Term, Var};
use crate::unify::unify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpCode {
    Var,
    Const,
    Functor,
    Pop,
    Enter,
    Call,
    Cut,
    Repeat,
    Exit,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Instruction {
    pub opcode: OpCode,
    pub operand: u8,
}

/// One compiled clause. The xr, pi and var tables are per-clause and
/// deduplicated; operands index into them byte-wide.
#[derive(Debug)]
pub(crate) struct Clause {
    pub pi: Pi,
    pub raw: Rc<Term>,
    pub xr: Vec<Rc<Term>>,
    pub pis: Vec<Pi>,
    pub vars: Vec<Var>,
    pub code: Vec<Instruction>,
}

/// Lowers a clause term (`H` or `H :- B`, resolved under env) to bytecode.
pub(crate) fn compile(t: &Rc<Term>, env: &Env) -> Result<Clause, Exception> {
    let t = env.simplify(t);
    let mut c = Clause {
        pi: Pi::new("", 0),
        raw: t.clone(),
        xr: Vec::new(),
        pis: Vec::new(),
        vars: Vec::new(),
        code: Vec::new(),
    };
    match &*t {
        Term::Var(_) => return Err(crate::error::instantiation_error(&t)),
        Term::Compound(comp) if comp.functor == ":-" && comp.args.len() == 2 => {
            let head = comp.args[0].clone();
            let body = comp.args[1].clone();
            c.compile_clause(&head, Some(&body))?;
        }
        Term::Atom(_) | Term::Compound(_) => {
            c.compile_clause(&t, None)?;
        }
        _ => return Err(crate::error::type_error("callable", &t)),
    }
    Ok(c)
}

impl Clause {
    fn compile_clause(&mut self, head: &Rc<Term>, body: Option<&Rc<Term>>) -> Result<(), Exception> {
        match &**head {
            Term::Var(_) => return Err(crate::error::instantiation_error(head)),
            Term::Atom(s) => {
                self.pi = Pi::new(s, 0);
            }
            Term::Compound(c) => {
                self.pi = Pi::new(&c.functor, c.args.len());
                for a in &c.args {
                    self.compile_arg(a)?;
                }
            }
            _ => return Err(crate::error::type_error("callable", head)),
        }
        if let Some(body) = body {
            self.compile_body(body)?;
        }
        self.emit(OpCode::Exit, 0);
        Ok(())
    }

    fn compile_body(&mut self, body: &Rc<Term>) -> Result<(), Exception> {
        self.emit(OpCode::Enter, 0);
        let mut body = body.clone();
        loop {
            let next = match body.as_compound(",", 2) {
                Some(c) => {
                    let first = c.args[0].clone();
                    let rest = c.args[1].clone();
                    self.compile_pred(&first)?;
                    rest
                }
                None => break,
            };
            body = next;
        }
        self.compile_pred(&body)
    }

    fn compile_pred(&mut self, p: &Rc<Term>) -> Result<(), Exception> {
        match &**p {
            Term::Var(_) => {
                // a variable in goal position becomes call(Var)
                self.compile_arg(p)?;
                let idx = self.pi_offset(&Pi::new("call", 1))?;
                self.emit(OpCode::Call, idx);
                Ok(())
            }
            Term::Atom(s) => {
                match s.as_str() {
                    "!" => self.emit(OpCode::Cut, 0),
                    "repeat" => self.emit(OpCode::Repeat, 0),
                    _ => {
                        let idx = self.pi_offset(&Pi::new(s, 0))?;
                        self.emit(OpCode::Call, idx);
                    }
                }
                Ok(())
            }
            Term::Compound(c) => {
                for a in &c.args {
                    self.compile_arg(a)?;
                }
                let idx = self.pi_offset(&Pi::new(&c.functor, c.args.len()))?;
                self.emit(OpCode::Call, idx);
                Ok(())
            }
            _ => Err(crate::error::type_error("callable", p)),
        }
    }

    fn compile_arg(&mut self, a: &Rc<Term>) -> Result<(), Exception> {
        match &**a {
            Term::Var(v) => {
                let idx = self.var_offset(*v)?;
                self.emit(OpCode::Var, idx);
            }
            Term::Atom(_) | Term::Integer(_) | Term::Float(_) => {
                let idx = self.xr_offset(a)?;
                self.emit(OpCode::Const, idx);
            }
            Term::Compound(c) => {
                let idx = self.pi_offset(&Pi::new(&c.functor, c.args.len()))?;
                self.emit(OpCode::Functor, idx);
                for n in &c.args {
                    self.compile_arg(n)?;
                }
                self.emit(OpCode::Pop, 0);
            }
        }
        Ok(())
    }

    fn emit(&mut self, opcode: OpCode, operand: u8) {
        self.code.push(Instruction { opcode, operand });
    }

    fn xr_offset(&mut self, t: &Rc<Term>) -> Result<u8, Exception> {
        if let Some(i) = self.xr.iter().position(|x| **x == **t) {
            return Ok(i as u8);
        }
        self.xr.push(t.clone());
        narrow(self.xr.len() - 1, t)
    }

    fn var_offset(&mut self, v: Var) -> Result<u8, Exception> {
        if let Some(i) = self.vars.iter().position(|x| *x == v) {
            return Ok(i as u8);
        }
        self.vars.push(v);
        narrow(self.vars.len() - 1, &Rc::new(Term::Var(v)))
    }

    fn pi_offset(&mut self, pi: &Pi) -> Result<u8, Exception> {
        if let Some(i) = self.pis.iter().position(|x| x == pi) {
            return Ok(i as u8);
        }
        self.pis.push(pi.clone());
        narrow(self.pis.len() - 1, &pi.as_term())
    }
}

fn narrow(i: usize, culprit: &Rc<Term>) -> Result<u8, Exception> {
    u8::try_from(i).map_err(|_| {
        crate::error::system_error(format!("clause literal table overflow at {}", culprit))
    })
}

/// Per-invocation VM registers.
#[derive(Clone)]
pub(crate) struct Registers {
    clause: Rc<Clause>,
    vars: Rc<Vec<Var>>,
    pc: usize,
    body: bool,
    args: VecDeque<Rc<Term>>,
    astack: Vec<(u8, VecDeque<Rc<Term>>)>,
    cont: Cont,
    env: Env,
    cut_parent: u64,
}

/// Runs one clause against the caller's arguments: fresh variables per
/// var-table entry, head matching by unification, then the body.
pub(crate) fn solve(
    engine: Engine,
    clause: Rc<Clause>,
    args: Vec<Rc<Term>>,
    cont: Cont,
    env: Env,
    cut_parent: u64,
) -> Promise {
    let vars = Rc::new(clause.vars.iter().map(|_| Var::new()).collect::<Vec<_>>());
    exec(
        engine,
        Registers {
            clause,
            vars,
            pc: 0,
            body: false,
            args: args.into(),
            astack: Vec::new(),
            cont,
            env,
            cut_parent,
        },
    )
}

fn corrupt() -> Promise {
    Promise::Error(crate::error::system_error("argument stack corrupt"))
}

fn exec(engine: Engine, mut r: Registers) -> Promise {
    loop {
        let inst = match r.clause.code.get(r.pc) {
            Some(i) => *i,
            None => return corrupt(),
        };
        match inst.opcode {
            OpCode::Var => {
                let vt = Rc::new(Term::Var(r.vars[inst.operand as usize]));
                if r.body {
                    r.args.push_back(vt);
                } else {
                    let a = match r.args.pop_front() {
                        Some(a) => a,
                        None => return corrupt(),
                    };
                    match unify(&vt, &a, false, &r.env) {
                        Some(e) => r.env = e,
                        None => return Promise::Bool(false),
                    }
                }
            }
            OpCode::Const => {
                let c = r.clause.xr[inst.operand as usize].clone();
                if r.body {
                    r.args.push_back(c);
                } else {
                    let a = match r.args.pop_front() {
                        Some(a) => a,
                        None => return corrupt(),
                    };
                    match unify(&c, &a, false, &r.env) {
                        Some(e) => r.env = e,
                        None => return Promise::Bool(false),
                    }
                }
            }
            OpCode::Functor => {
                if r.body {
                    r.astack.push((inst.operand, std::mem::take(&mut r.args)));
                } else {
                    let pi = &r.clause.pis[inst.operand as usize];
                    let a = match r.args.pop_front() {
                        Some(a) => a,
                        None => return corrupt(),
                    };
                    let fresh: Vec<Rc<Term>> = (0..pi.arity).map(|_| Term::new_var()).collect();
                    let pattern = Term::new_compound(&pi.name, fresh.clone());
                    match unify(&pattern, &a, false, &r.env) {
                        Some(e) => r.env = e,
                        None => return Promise::Bool(false),
                    }
                    r.astack.push((inst.operand, std::mem::take(&mut r.args)));
                    r.args = fresh.into();
                }
            }
            OpCode::Pop => {
                let (op, outer) = match r.astack.pop() {
                    Some(f) => f,
                    None => return corrupt(),
                };
                if r.body {
                    let pi = &r.clause.pis[op as usize];
                    let built =
                        Term::new_compound(&pi.name, std::mem::take(&mut r.args).into());
                    r.args = outer;
                    r.args.push_back(built);
                } else {
                    r.args = outer;
                }
            }
            OpCode::Enter => {
                r.body = true;
                r.args.clear();
            }
            OpCode::Call => {
                let pi = r.clause.pis[inst.operand as usize].clone();
                let call_args: Vec<Rc<Term>> = std::mem::take(&mut r.args).into();
                let resume: Cont = {
                    let engine = engine.clone();
                    let clause = r.clause.clone();
                    let vars = r.vars.clone();
                    let cont = r.cont.clone();
                    let cut_parent = r.cut_parent;
                    let pc = r.pc + 1;
                    Rc::new(move |env: Env| {
                        let engine = engine.clone();
                        let clause = clause.clone();
                        let vars = vars.clone();
                        let cont = cont.clone();
                        Promise::delay(move |_| {
                            exec(
                                engine,
                                Registers {
                                    clause,
                                    vars,
                                    pc,
                                    body: true,
                                    args: VecDeque::new(),
                                    astack: Vec::new(),
                                    cont,
                                    env,
                                    cut_parent,
                                },
                            )
                        })
                    })
                };
                let env = r.env.clone();
                let engine2 = engine.clone();
                return Promise::delay(move |_| engine2.arrive(pi, call_args, resume, &env));
            }
            OpCode::Cut => {
                let barrier = r.cut_parent;
                let mut rest = r;
                rest.pc += 1;
                return Promise::Cut(barrier, Box::new(move |_| exec(engine, rest)));
            }
            OpCode::Repeat => {
                let clause = r.clause.clone();
                let vars = r.vars.clone();
                let cont = r.cont.clone();
                let env = r.env.clone();
                let cut_parent = r.cut_parent;
                let pc = r.pc + 1;
                let engine2 = engine.clone();
                return Promise::Repeat(Rc::new(move |_| {
                    exec(
                        engine2.clone(),
                        Registers {
                            clause: clause.clone(),
                            vars: vars.clone(),
                            pc,
                            body: true,
                            args: VecDeque::new(),
                            astack: Vec::new(),
                            cont: cont.clone(),
                            env: env.clone(),
                            cut_parent,
                        },
                    )
                }));
            }
            OpCode::Exit => return (r.cont)(r.env),
        }
        r.pc += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(s: &str) -> Rc<Term> {
        let ops = {
            let mut t = crate::operators::OperatorTable::new();
            t.define(1200, crate::operators::Specifier::xfx, ":-");
            t.define(1000, crate::operators::Specifier::xfy, ",");
            t
        };
        let flags = crate::flags::Flags::default();
        let conversions = std::collections::HashMap::new();
        let ctx = crate::read_term::ReadContext {
            ops: &ops,
            flags: &flags,
            conversions: &conversions,
        };
        let mut src = crate::stream::ByteSource::from_string(s);
        crate::read_term::parse_term(&mut src, &ctx)
            .unwrap()
            .unwrap()
            .0
    }

    fn ops_of(c: &Clause) -> Vec<OpCode> {
        c.code.iter().map(|i| i.opcode).collect()
    }

    #[test]
    fn fact_compiles_to_head_matching_and_exit() {
        let c = compile(&parse("p(X, a)."), &Env::new()).unwrap();
        assert_eq!(c.pi, Pi::new("p", 2));
        assert_eq!(ops_of(&c), vec![OpCode::Var, OpCode::Const, OpCode::Exit]);
        assert_eq!(c.vars.len(), 1);
        assert_eq!(c.xr.len(), 1);
    }

    #[test]
    fn rule_body_is_flattened_into_calls() {
        let c = compile(&parse("p :- q, r, s."), &Env::new()).unwrap();
        assert_eq!(
            ops_of(&c),
            vec![
                OpCode::Enter,
                OpCode::Call,
                OpCode::Call,
                OpCode::Call,
                OpCode::Exit
            ]
        );
        assert_eq!(c.pis.len(), 3);
    }

    #[test]
    fn nested_head_compounds_use_functor_frames() {
        let c = compile(&parse("p(f(g(X)))."), &Env::new()).unwrap();
        assert_eq!(
            ops_of(&c),
            vec![
                OpCode::Functor,
                OpCode::Functor,
                OpCode::Var,
                OpCode::Pop,
                OpCode::Pop,
                OpCode::Exit
            ]
        );
    }

    #[test]
    fn cut_and_repeat_lower_to_dedicated_opcodes() {
        let c = compile(&parse("p :- repeat, q, !."), &Env::new()).unwrap();
        assert_eq!(
            ops_of(&c),
            vec![
                OpCode::Enter,
                OpCode::Repeat,
                OpCode::Call,
                OpCode::Cut,
                OpCode::Exit
            ]
        );
    }

    #[test]
    fn variable_goal_becomes_call() {
        let c = compile(&parse("p(X) :- X."), &Env::new()).unwrap();
        assert_eq!(
            ops_of(&c),
            vec![
                OpCode::Var,
                OpCode::Enter,
                OpCode::Var,
                OpCode::Call,
                OpCode::Exit
            ]
        );
        assert_eq!(c.pis[0], Pi::new("call", 1));
        // the head X and the body X share one var-table slot
        assert_eq!(c.vars.len(), 1);
    }

    #[test]
    fn non_callable_terms_are_rejected() {
        let e = compile(&parse("1."), &Env::new());
        assert!(e.is_err());
        let e = compile(&parse("p :- 1."), &Env::new());
        assert!(e.is_err());
    }

    #[test]
    fn tables_are_deduplicated() {
        let c = compile(&parse("p(a, a, X, X, a)."), &Env::new()).unwrap();
        assert_eq!(c.xr.len(), 1);
        assert_eq!(c.vars.len(), 1);
    }
}
