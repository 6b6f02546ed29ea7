use std::fmt::{self, Write};
use std::rc::Rc;

use crate::env::Env;
use crate::operators::{OperatorTable, Specifier};
use crate::term::Term;

/// Options honoured by `write_term/3` and friends.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions<'a> {
    pub quoted: bool,
    /// None means canonical notation (`ignore_ops(true)`).
    pub ops: Option<&'a OperatorTable>,
    pub numbervars: bool,
}

/// Writes t under env into out.
pub fn write_term(
    out: &mut dyn Write,
    t: &Rc<Term>,
    opts: &WriteOptions,
    env: &Env,
) -> fmt::Result {
    let mut path = Vec::new();
    write_prec(out, t, opts, env, 1200, &mut path)
}

/// Ground, canonical, quoted rendering used by Display impls.
pub(crate) fn fmt_term(f: &mut fmt::Formatter<'_>, t: &Term) -> fmt::Result {
    let t = Rc::new(t.clone());
    let opts = WriteOptions {
        quoted: true,
        ops: None,
        numbervars: false,
    };
    write_term(f, &t, &opts, &Env::new())
}

fn write_prec(
    out: &mut dyn Write,
    t: &Rc<Term>,
    opts: &WriteOptions,
    env: &Env,
    max_prec: u16,
    path: &mut Vec<*const Term>,
) -> fmt::Result {
    let t = env.resolve(t);
    match &*t {
        Term::Var(v) => write!(out, "{}", v),
        Term::Integer(i) => write!(out, "{}", i),
        Term::Float(f) => write!(out, "{:?}", f),
        Term::Atom(s) => write_atom(out, s, opts),
        Term::Compound(c) => {
            if path.contains(&Rc::as_ptr(&t)) {
                return out.write_str("...");
            }
            path.push(Rc::as_ptr(&t));
            let r = write_compound(out, &t, opts, env, max_prec, path);
            path.pop();
            r
        }
    }
}

fn write_compound(
    out: &mut dyn Write,
    t: &Rc<Term>,
    opts: &WriteOptions,
    env: &Env,
    max_prec: u16,
    path: &mut Vec<*const Term>,
) -> fmt::Result {
    let c = match &**t {
        Term::Compound(c) => c,
        _ => unreachable!(),
    };

    if opts.numbervars && c.functor == "$VAR" && c.args.len() == 1 {
        if let Term::Integer(n) = &*env.resolve(&c.args[0]) {
            if *n >= 0 {
                return write_numbervar(out, *n);
            }
        }
    }

    if let Some(ops) = opts.ops {
        if c.functor == "." && c.args.len() == 2 {
            return write_list(out, t, opts, env, path);
        }
        if c.functor == "{}" && c.args.len() == 1 {
            out.write_char('{')?;
            write_prec(out, &c.args[0], opts, env, 1200, path)?;
            return out.write_char('}');
        }
        if c.args.len() == 2 {
            if let Some(op) = ops.lookup_infix(&c.functor) {
                let p = op.priority;
                let (lp, rp) = match op.specifier {
                    Specifier::yfx => (p, p - 1),
                    Specifier::xfy => (p - 1, p),
                    _ => (p - 1, p - 1),
                };
                let parens = p > max_prec;
                if parens {
                    out.write_char('(')?;
                }
                write_prec(out, &c.args[0], opts, env, lp, path)?;
                if is_alpha_functor(&c.functor) {
                    write!(out, " {} ", c.functor)?;
                } else {
                    out.write_str(&c.functor)?;
                }
                // a negative number would lex together with a symbolic
                // operator, so it gets its own parentheses
                let negative_rhs = !is_alpha_functor(&c.functor)
                    && matches!(
                        &*env.resolve(&c.args[1]),
                        Term::Integer(i) if *i < 0
                    )
                    || !is_alpha_functor(&c.functor)
                        && matches!(
                            &*env.resolve(&c.args[1]),
                            Term::Float(f) if *f < 0.0
                        );
                if negative_rhs {
                    out.write_char('(')?;
                    write_prec(out, &c.args[1], opts, env, 1200, path)?;
                    out.write_char(')')?;
                } else {
                    write_prec(out, &c.args[1], opts, env, rp, path)?;
                }
                if parens {
                    out.write_char(')')?;
                }
                return Ok(());
            }
        }
        if c.args.len() == 1 {
            if let Some(op) = ops.lookup_prefix(&c.functor) {
                let p = op.priority;
                let rp = match op.specifier {
                    Specifier::fy => p,
                    _ => p - 1,
                };
                // a numeric operand would lex together with a sign, so force
                // canonical notation there
                let num_arg = matches!(
                    &*env.resolve(&c.args[0]),
                    Term::Integer(_) | Term::Float(_)
                );
                if !num_arg {
                    let parens = p > max_prec;
                    if parens {
                        out.write_char('(')?;
                    }
                    write_atom(out, &c.functor, opts)?;
                    out.write_char(' ')?;
                    write_prec(out, &c.args[0], opts, env, rp, path)?;
                    if parens {
                        out.write_char(')')?;
                    }
                    return Ok(());
                }
            }
            if let Some(op) = ops.lookup_postfix(&c.functor) {
                let p = op.priority;
                let lp = match op.specifier {
                    Specifier::yf => p,
                    _ => p - 1,
                };
                let parens = p > max_prec;
                if parens {
                    out.write_char('(')?;
                }
                write_prec(out, &c.args[0], opts, env, lp, path)?;
                write_atom(out, &c.functor, opts)?;
                if parens {
                    out.write_char(')')?;
                }
                return Ok(());
            }
        }
    }

    write_atom(out, &c.functor, opts)?;
    out.write_char('(')?;
    for (i, a) in c.args.iter().enumerate() {
        if i > 0 {
            out.write_char(',')?;
        }
        write_prec(out, a, opts, env, 999, path)?;
    }
    out.write_char(')')
}

fn write_list(
    out: &mut dyn Write,
    t: &Rc<Term>,
    opts: &WriteOptions,
    env: &Env,
    path: &mut Vec<*const Term>,
) -> fmt::Result {
    out.write_char('[')?;
    let mut t = t.clone();
    let mut first = true;
    loop {
        let c = match &*t {
            Term::Compound(c) if c.functor == "." && c.args.len() == 2 => c.clone(),
            _ => unreachable!(),
        };
        if !first {
            out.write_char(',')?;
        }
        first = false;
        write_prec(out, &c.args[0], opts, env, 999, path)?;
        let tail = env.resolve(&c.args[1]);
        match &*tail {
            Term::Atom(s) if s == "[]" => break,
            Term::Compound(tc) if tc.functor == "." && tc.args.len() == 2 => {
                if path.contains(&Rc::as_ptr(&tail)) {
                    out.write_str("|...")?;
                    break;
                }
                path.push(Rc::as_ptr(&tail));
                t = tail;
            }
            _ => {
                out.write_char('|')?;
                write_prec(out, &tail, opts, env, 999, path)?;
                break;
            }
        }
    }
    out.write_char(']')
}

fn write_numbervar(out: &mut dyn Write, n: i64) -> fmt::Result {
    let letter = (b'A' + (n % 26) as u8) as char;
    let index = n / 26;
    if index > 0 {
        write!(out, "{}{}", letter, index)
    } else {
        out.write_char(letter)
    }
}

fn is_alpha_functor(s: &str) -> bool {
    s.chars().next().map_or(false, |c| c.is_ascii_lowercase())
}

const GRAPHIC: &str = "#$&*+-./:<=>?@^~\\";

fn atom_needs_quotes(s: &str) -> bool {
    match s {
        "[]" | "{}" | "!" | ";" => return false,
        "" => return true,
        _ => {}
    }
    let mut chars = s.chars();
    let first = chars.next().unwrap();
    if first.is_ascii_lowercase() {
        return !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    }
    !s.chars().all(|c| GRAPHIC.contains(c))
}

fn write_atom(out: &mut dyn Write, s: &str, opts: &WriteOptions) -> fmt::Result {
    if opts.quoted && atom_needs_quotes(s) {
        out.write_char('\'')?;
        for c in s.chars() {
            match c {
                '\'' => out.write_str("\\'")?,
                '\\' => out.write_str("\\\\")?,
                '\n' => out.write_str("\\n")?,
                '\t' => out.write_str("\\t")?,
                '\r' => out.write_str("\\r")?,
                '\x07' => out.write_str("\\a")?,
                '\x08' => out.write_str("\\b")?,
                '\x0C' => out.write_str("\\f")?,
                '\x0B' => out.write_str("\\v")?,
                c if (c as u32) < 0x20 => write!(out, "\\x{:x}\\", c as u32)?,
                c => out.write_char(c)?,
            }
        }
        out.write_char('\'')
    } else {
        out.write_str(s)
    }
}

/// Convenience wrapper rendering into a String.
pub fn term_to_string(t: &Rc<Term>, opts: &WriteOptions, env: &Env) -> String {
    let mut s = String::new();
    let _ = write_term(&mut s, t, opts, env);
    s
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::operators::OperatorTable;

    fn ops() -> OperatorTable {
        let mut t = OperatorTable::new();
        t.define(1200, Specifier::xfx, ":-");
        t.define(1000, Specifier::xfy, ",");
        t.define(700, Specifier::xfx, "=");
        t.define(500, Specifier::yfx, "+");
        t.define(400, Specifier::yfx, "*");
        t.define(200, Specifier::fy, "-");
        t
    }

    fn s(t: &Rc<Term>, quoted: bool, with_ops: bool) -> String {
        let table = ops();
        let opts = WriteOptions {
            quoted,
            ops: with_ops.then_some(&table),
            numbervars: false,
        };
        term_to_string(t, &opts, &Env::new())
    }

    #[test]
    fn atoms_and_numbers() {
        assert_eq!(s(&Term::new_atom("foo"), false, true), "foo");
        assert_eq!(s(&Term::new_integer(-42), false, true), "-42");
        assert_eq!(s(&Term::new_float(1024.0), false, true), "1024.0");
    }

    #[test]
    fn quoting() {
        assert_eq!(s(&Term::new_atom("hello world"), true, true), "'hello world'");
        assert_eq!(s(&Term::new_atom("hello world"), false, true), "hello world");
        assert_eq!(s(&Term::new_atom("it's"), true, true), "'it\\'s'");
        assert_eq!(s(&Term::new_atom("[]"), true, true), "[]");
        assert_eq!(s(&Term::new_atom("+"), true, true), "+");
    }

    #[test]
    fn lists() {
        let l = Term::new_list(vec![Term::new_integer(1), Term::new_integer(2)]);
        assert_eq!(s(&l, false, true), "[1,2]");
        let p = Term::new_partial_list(vec![Term::new_atom("a")], Term::new_var());
        assert!(s(&p, false, true).starts_with("[a|_"));
    }

    #[test]
    fn operators_and_priorities() {
        let plus = Term::new_compound("+", vec![Term::new_integer(1), Term::new_integer(2)]);
        let t = Term::new_compound("*", vec![plus.clone(), Term::new_integer(3)]);
        assert_eq!(s(&t, false, true), "(1+2)*3");
        let t2 = Term::new_compound("+", vec![plus, Term::new_integer(3)]);
        assert_eq!(s(&t2, false, true), "1+2+3");
    }

    #[test]
    fn canonical_when_ops_ignored() {
        let t = Term::new_compound("+", vec![Term::new_integer(1), Term::new_integer(2)]);
        assert_eq!(s(&t, false, false), "+(1,2)");
    }

    #[test]
    fn numbervars_render_as_letters() {
        let table = ops();
        let opts = WriteOptions {
            quoted: false,
            ops: Some(&table),
            numbervars: true,
        };
        let t = Term::new_compound("$VAR", vec![Term::new_integer(0)]);
        assert_eq!(term_to_string(&t, &opts, &Env::new()), "A");
        let t = Term::new_compound("$VAR", vec![Term::new_integer(27)]);
        assert_eq!(term_to_string(&t, &opts, &Env::new()), "B1");
    }

    #[test]
    fn cyclic_term_writing_terminates() {
        let x = crate::term::Var::new();
        let f = Term::new_compound("f", vec![Rc::new(Term::Var(x))]);
        let env = Env::new().bind(x, f.clone());
        let table = ops();
        let opts = WriteOptions {
            quoted: false,
            ops: Some(&table),
            numbervars: false,
        };
        let out = term_to_string(&Rc::new(Term::Var(x)), &opts, &env);
        assert!(out.contains("f("));
    }
}
