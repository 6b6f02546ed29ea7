use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::term::compare;

fn engine() -> Engine {
    Engine::with_io(std::io::empty(), std::io::sink())
}

fn solutions(e: &Engine, q: &str) -> Vec<Solution> {
    let out = Rc::new(RefCell::new(Vec::new()));
    let sink = out.clone();
    e.query(q, move |s| {
        sink.borrow_mut().push(s.clone());
        true
    })
    .unwrap();
    let result = out.borrow().clone();
    result
}

fn succeeds(e: &Engine, q: &str) -> bool {
    e.query(q, |_| false).unwrap()
}

fn parse(e: &Engine, s: &str) -> Rc<Term> {
    let (ops, flags, conversions) = e.with_state(|st| {
        (
            st.operators.clone(),
            st.flags.clone(),
            st.char_conversions.clone(),
        )
    });
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

fn assert_bound(sol: &Solution, name: &str, e: &Engine, expected: &str) {
    let t = sol.get(name).unwrap_or_else(|| panic!("no {}", name));
    let want = parse(e, &format!("{}.", expected));
    assert_eq!(
        compare(t, &want, &Env::new()),
        std::cmp::Ordering::Equal,
        "{} = {} (wanted {})",
        name,
        t,
        expected
    );
}

#[test]
fn conjunction_and_arithmetic() {
    let e = engine();
    assert!(succeeds(&e, "X = 1, Y = 2, X + Y =:= 3."));
    assert!(!succeeds(&e, "X = 1, Y = 2, X + Y =:= 4."));
}

#[test]
fn member_enumerates_in_order() {
    let e = engine();
    e.consult("member(X, [X|_]). member(X, [_|T]) :- member(X, T).")
        .unwrap();
    let sols = solutions(&e, "member(X, [a, b, c]).");
    assert_eq!(sols.len(), 3);
    assert_bound(&sols[0], "X", &e, "a");
    assert_bound(&sols[1], "X", &e, "b");
    assert_bound(&sols[2], "X", &e, "c");
}

#[test]
fn append_builds_lists() {
    let e = engine();
    e.consult(
        "append([], L, L).
         append([H|T], L, [H|R]) :- append(T, L, R).",
    )
    .unwrap();
    let sols = solutions(&e, "append([1, 2], [3, 4], L).");
    assert_eq!(sols.len(), 1);
    assert_bound(&sols[0], "L", &e, "[1, 2, 3, 4]");

    // backward: enumerate the splits of a list
    let sols = solutions(&e, "append(A, B, [x, y]).");
    assert_eq!(sols.len(), 3);
    assert_bound(&sols[0], "A", &e, "[]");
    assert_bound(&sols[0], "B", &e, "[x, y]");
    assert_bound(&sols[2], "A", &e, "[x, y]");
}

#[test]
fn assert_and_findall() {
    let e = engine();
    let sols = solutions(&e, "assertz(p(1)), assertz(p(2)), findall(X, p(X), L).");
    assert_eq!(sols.len(), 1);
    assert_bound(&sols[0], "L", &e, "[1, 2]");
}

#[test]
fn asserta_prepends() {
    let e = engine();
    assert!(succeeds(
        &e,
        "assertz(q(1)), asserta(q(0)), findall(X, q(X), [0, 1])."
    ));
}

#[test]
fn catch_binds_the_ball() {
    let e = engine();
    let sols = solutions(&e, "catch(throw(boom), E, true).");
    assert_eq!(sols.len(), 1);
    assert_bound(&sols[0], "E", &e, "boom");
}

#[test]
fn uncaught_errors_reach_the_caller() {
    let e = engine();
    match e.query("throw(kaboom).", |_| false) {
        Err(Error::Uncaught(t)) => assert!(t.is_atom("kaboom")),
        r => panic!("unexpected {:?}", r),
    }
}

#[test]
fn power_returns_float() {
    let e = engine();
    let sols = solutions(&e, "X is 2 ** 10.");
    assert_eq!(sols.len(), 1);
    match &**sols[0].get("X").unwrap() {
        Term::Float(f) => assert_eq!(*f, 1024.0),
        t => panic!("unexpected {:?}", t),
    }
}

#[test]
fn arithmetic_functions() {
    let e = engine();
    assert!(succeeds(&e, "X is 7 // 2, X =:= 3."));
    assert!(succeeds(&e, "X is -7 rem 2, X =:= -1."));
    assert!(succeeds(&e, "X is -7 mod 2, X =:= 1."));
    assert!(succeeds(&e, "X is \\ 0, X =:= -1."));
    assert!(succeeds(&e, "X is 5 /\\ 3, X =:= 1."));
    assert!(succeeds(&e, "X is 5 \\/ 3, X =:= 7."));
    assert!(succeeds(&e, "X is 1 << 4, X =:= 16."));
    assert!(succeeds(&e, "X is 16 >> 2, X =:= 4."));
    assert!(succeeds(&e, "X is abs(-3.5), X =:= 3.5."));
    assert!(succeeds(&e, "X is sign(-9), X =:= -1."));
    assert!(succeeds(&e, "X is floor(3.7), X =:= 3."));
    assert!(succeeds(&e, "X is sqrt(16.0), X =:= 4.0."));
    assert!(succeeds(&e, "X is - 3 + 5, X =:= 2."));
}

#[test]
fn arithmetic_errors() {
    let e = engine();
    assert!(succeeds(
        &e,
        "catch(_ is 1 // 0, error(evaluation_error(zero_divisor), _), true)."
    ));
    assert!(succeeds(
        &e,
        "catch(_ is foo + 1, error(type_error(evaluable, foo/0), _), true)."
    ));
    assert!(succeeds(
        &e,
        "catch(_ is X + 1, error(instantiation_error, _), true)."
    ));
}

#[test]
fn atom_chars_both_ways() {
    let e = engine();
    let sols = solutions(&e, "atom_chars(hello, Cs).");
    assert_bound(&sols[0], "Cs", &e, "[h, e, l, l, o]");
    assert!(succeeds(&e, "atom_chars(A, [a, b]), A == ab."));
}

#[test]
fn cut_commits_to_a_clause() {
    let e = engine();
    e.consult(
        "max(X, Y, X) :- X >= Y, !.
         max(_, Y, Y).",
    )
    .unwrap();
    let sols = solutions(&e, "max(3, 1, R).");
    assert_eq!(sols.len(), 1);
    assert_bound(&sols[0], "R", &e, "3");
    let sols = solutions(&e, "max(1, 3, R).");
    assert_eq!(sols.len(), 1);
    assert_bound(&sols[0], "R", &e, "3");
}

#[test]
fn cut_prunes_earlier_choice_points_in_the_clause() {
    let e = engine();
    e.consult(
        "t(1). t(2). t(3).
         first(X) :- t(X), !.",
    )
    .unwrap();
    let sols = solutions(&e, "first(X).");
    assert_eq!(sols.len(), 1);
    assert_bound(&sols[0], "X", &e, "1");
}

#[test]
fn cut_is_local_to_call() {
    let e = engine();
    e.consult("t(1). t(2).").unwrap();
    // the cut inside call/1 must not prune t/1's alternatives
    let sols = solutions(&e, "t(X), call((true, !)).");
    assert_eq!(sols.len(), 2);
}

#[test]
fn negation_as_failure() {
    let e = engine();
    assert!(succeeds(&e, "\\+ fail."));
    assert!(!succeeds(&e, "\\+ true."));
    assert!(succeeds(&e, "not(fail)."));
}

#[test]
fn if_then_else() {
    let e = engine();
    let sols = solutions(&e, "(2 > 1 -> X = a ; X = b).");
    assert_eq!(sols.len(), 1);
    assert_bound(&sols[0], "X", &e, "a");

    let sols = solutions(&e, "(1 > 2 -> X = a ; X = b).");
    assert_eq!(sols.len(), 1);
    assert_bound(&sols[0], "X", &e, "b");

    // the condition is committed to its first solution
    e.consult("u(1). u(2). u(3).").unwrap();
    let sols = solutions(&e, "(u(X), X > 1 -> Y = X ; Y = none).");
    assert_eq!(sols.len(), 1);
    assert_bound(&sols[0], "Y", &e, "2");
}

#[test]
fn disjunction_tries_both_branches() {
    let e = engine();
    let sols = solutions(&e, "(X = 1 ; X = 2).");
    assert_eq!(sols.len(), 2);
    assert_bound(&sols[0], "X", &e, "1");
    assert_bound(&sols[1], "X", &e, "2");
}

#[test]
fn once_stops_after_the_first_solution() {
    let e = engine();
    e.consult("v(1). v(2).").unwrap();
    let sols = solutions(&e, "once(v(X)).");
    assert_eq!(sols.len(), 1);
    assert_bound(&sols[0], "X", &e, "1");
}

#[test]
fn retract_removes_on_success_only() {
    let e = engine();
    assert!(succeeds(&e, "assertz(p(1)), assertz(p(2)), retract(p(1))."));
    let sols = solutions(&e, "findall(X, p(X), L).");
    assert_bound(&sols[0], "L", &e, "[2]");
    // assert then retract leaves the database unchanged
    assert!(succeeds(&e, "assertz(r(9)), retract(r(9))."));
    assert!(succeeds(&e, "findall(X, r(X), [])."));
    // retracting something that never matches fails
    assert!(!succeeds(&e, "retract(p(42))."));
}

#[test]
fn abolish_removes_the_whole_procedure() {
    let e = engine();
    assert!(succeeds(&e, "assertz(w(1)), abolish(w/1)."));
    assert!(succeeds(
        &e,
        "catch(w(_), error(existence_error(procedure, w/1), _), true)."
    ));
}

#[test]
fn clause_inspects_the_database() {
    let e = engine();
    e.consult("s(1). s(X) :- t(X).").unwrap();
    let sols = solutions(&e, "clause(s(1), B).");
    assert_bound(&sols[0], "B", &e, "true");
    let sols = solutions(&e, "clause(s(X), t(X)).");
    assert_eq!(sols.len(), 1);
    // built-ins are private
    assert!(succeeds(
        &e,
        "catch(clause(atom(_), _), error(permission_error(access, private_procedure, _), _), true)."
    ));
}

#[test]
fn asserting_over_a_builtin_is_denied() {
    let e = engine();
    assert!(succeeds(
        &e,
        "catch(assertz(atom(1)), error(permission_error(modify, static_procedure, _), _), true)."
    ));
}

#[test]
fn current_predicate_enumerates_user_procedures() {
    let e = engine();
    e.consult("zz(1).").unwrap();
    assert!(succeeds(&e, "current_predicate(zz/1)."));
    assert!(!succeeds(&e, "current_predicate(zz/2)."));
}

#[test]
fn dynamic_declares_an_empty_procedure() {
    let e = engine();
    assert!(succeeds(&e, "dynamic(fresh/1), \\+ fresh(_)."));
}

#[test]
fn op_table_updates() {
    let e = engine();
    assert!(succeeds(&e, "current_op(1200, xfx, ':-')."));
    assert!(succeeds(&e, "op(700, xfx, ===)."));
    assert!(succeeds(&e, "X = (a === b), X =.. ['===', a, b]."));
    assert!(succeeds(&e, "op(0, xfx, ===)."));
    assert!(!succeeds(&e, "current_op(_, _, ===)."));
}

#[test]
fn op_validation() {
    let e = engine();
    assert!(succeeds(
        &e,
        "catch(op(1300, xfx, bad), error(domain_error(operator_priority, _), _), true)."
    ));
    assert!(succeeds(
        &e,
        "catch(op(700, zfz, bad), error(domain_error(operator_specifier, _), _), true)."
    ));
}

#[test]
fn findall_keeps_duplicates_and_order() {
    let e = engine();
    e.consult("d(2). d(1). d(2).").unwrap();
    let sols = solutions(&e, "findall(X, d(X), L).");
    assert_bound(&sols[0], "L", &e, "[2, 1, 2]");
    // no solutions: the empty list, not failure
    assert!(succeeds(&e, "findall(X, fail, [])."));
}

#[test]
fn bagof_fails_without_solutions_and_groups_by_witness() {
    let e = engine();
    e.consult("age(peter, 7). age(ann, 11). age(pat, 8). age(tom, 5).")
        .unwrap();
    assert!(!succeeds(&e, "bagof(X, fail, X)."));
    // grouped by the age witness, groups in standard order of the witness
    let sols = solutions(&e, "bagof(C, age(C, A), L).");
    assert_eq!(sols.len(), 4);
    assert_bound(&sols[0], "A", &e, "5");
    assert_bound(&sols[0], "L", &e, "[tom]");
    assert_bound(&sols[3], "A", &e, "11");
    // existential qualification collapses the groups
    let sols = solutions(&e, "bagof(C, A^age(C, A), L).");
    assert_eq!(sols.len(), 1);
    assert_bound(&sols[0], "L", &e, "[peter, ann, pat, tom]");
}

#[test]
fn setof_sorts_and_deduplicates() {
    let e = engine();
    e.consult("n(2). n(3). n(1). n(2).").unwrap();
    let sols = solutions(&e, "setof(X, n(X), L).");
    assert_eq!(sols.len(), 1);
    assert_bound(&sols[0], "L", &e, "[1, 2, 3]");
}

#[test]
fn bagof_equals_findall_when_fully_qualified() {
    let e = engine();
    e.consult("m(b, 1). m(a, 2).").unwrap();
    assert!(succeeds(
        &e,
        "findall(X, m(X, Y), L1), bagof(X, Y^m(X, Y), L2), L1 == L2."
    ));
}

#[test]
fn sub_atom_enumeration_order() {
    let e = engine();
    let sols = solutions(&e, "sub_atom(abc, 0, L, _, S).");
    // ascending length at before 0: '', a, ab, abc
    assert_eq!(sols.len(), 4);
    assert_bound(&sols[0], "S", &e, "''");
    assert_bound(&sols[1], "S", &e, "a");
    assert_bound(&sols[3], "S", &e, "abc");
    assert!(succeeds(&e, "sub_atom(abcde, 1, 3, _, bcd)."));
}

#[test]
fn atom_concat_splits_backward() {
    let e = engine();
    let sols = solutions(&e, "atom_concat(A, B, ab).");
    assert_eq!(sols.len(), 3);
    assert_bound(&sols[0], "A", &e, "''");
    assert_bound(&sols[1], "A", &e, "a");
    assert_bound(&sols[1], "B", &e, "b");
    assert_bound(&sols[2], "B", &e, "''");
    assert!(succeeds(&e, "atom_concat(foo, bar, foobar)."));
}

#[test]
fn atom_length_and_char_code() {
    let e = engine();
    assert!(succeeds(&e, "atom_length(hello, 5)."));
    assert!(succeeds(&e, "char_code(a, 97)."));
    assert!(succeeds(&e, "char_code(C, 98), C == b."));
    assert!(succeeds(
        &e,
        "catch(atom_length(_, _), error(instantiation_error, _), true)."
    ));
}

#[test]
fn number_chars_and_codes() {
    let e = engine();
    assert!(succeeds(&e, "number_chars(X, ['1', '2']), X =:= 12."));
    assert!(succeeds(&e, "number_chars(12, ['1', '2'])."));
    assert!(succeeds(&e, "number_codes(X, \"34\"), X =:= 34."));
    assert!(succeeds(
        &e,
        "catch(number_chars(X, [a]), error(syntax_error(_), _), true)."
    ));
}

#[test]
fn univ_functor_arg() {
    let e = engine();
    assert!(succeeds(&e, "f(a, b) =.. [f, a, b]."));
    assert!(succeeds(&e, "T =.. [g, 1], T == g(1)."));
    assert!(succeeds(&e, "atom =.. [atom]."));
    assert!(succeeds(&e, "functor(f(a, b), f, 2)."));
    assert!(succeeds(&e, "functor(T, g, 2), T =.. [g, _, _]."));
    assert!(succeeds(&e, "functor(7, 7, 0)."));
    assert!(succeeds(&e, "arg(2, f(a, b, c), b)."));
    assert!(!succeeds(&e, "arg(4, f(a, b, c), _)."));
}

#[test]
fn copy_term_renames_but_preserves_sharing() {
    let e = engine();
    assert!(succeeds(&e, "copy_term(f(X, X), f(1, Z)), Z == 1."));
    assert!(succeeds(&e, "copy_term(f(X, Y), f(1, 2))."));
    // the copy shares no variables with the source
    assert!(!succeeds(&e, "copy_term(f(X), f(Y)), X == Y."));
}

#[test]
fn term_order_predicates() {
    let e = engine();
    assert!(succeeds(&e, "1 @< a."));
    assert!(succeeds(&e, "a @< f(a)."));
    assert!(succeeds(&e, "f(a) == f(a)."));
    assert!(succeeds(&e, "f(a) \\== f(b)."));
    assert!(succeeds(&e, "compare(<, 1, 2)."));
    assert!(succeeds(&e, "compare(Order, b, a), Order == (>)."));
    assert!(succeeds(
        &e,
        "catch(compare(equal, a, b), error(domain_error(order, _), _), true)."
    ));
}

#[test]
fn occurs_check_variants() {
    let e = engine();
    assert!(succeeds(&e, "X = f(X)."));
    assert!(!succeeds(&e, "unify_with_occurs_check(X, f(X))."));
}

#[test]
fn type_tests() {
    let e = engine();
    assert!(succeeds(&e, "var(_)."));
    assert!(succeeds(&e, "X = 1, nonvar(X)."));
    assert!(succeeds(&e, "atom(foo), \\+ atom(f(x)), \\+ atom(1)."));
    assert!(succeeds(&e, "integer(3), float(3.5), number(3), number(3.5)."));
    assert!(succeeds(&e, "atomic(foo), atomic(3), \\+ atomic(f(x))."));
    assert!(succeeds(&e, "compound(f(x)), \\+ compound(foo)."));
    assert!(succeeds(&e, "is_list([a, b]), \\+ is_list([a|_])."));
}

#[test]
fn unknown_procedure_honours_the_flag() {
    let e = engine();
    assert!(succeeds(
        &e,
        "catch(nope, error(existence_error(procedure, nope/0), _), true)."
    ));
    assert!(succeeds(&e, "set_prolog_flag(unknown, fail)."));
    assert!(!succeeds(&e, "nope."));
}

#[test]
fn prolog_flags() {
    let e = engine();
    assert!(succeeds(&e, "current_prolog_flag(bounded, true)."));
    assert!(succeeds(
        &e,
        "current_prolog_flag(integer_rounding_function, toward_zero)."
    ));
    assert!(succeeds(&e, "current_prolog_flag(double_quotes, codes)."));
    assert!(succeeds(
        &e,
        "catch(set_prolog_flag(bounded, false), error(permission_error(modify, flag, _), _), true)."
    ));
    assert!(succeeds(
        &e,
        "catch(set_prolog_flag(whatever, x), error(domain_error(prolog_flag, _), _), true)."
    ));
}

#[test]
fn double_quotes_flag_changes_reading() {
    let e = engine();
    assert!(succeeds(&e, "\"ab\" = [0'a, 0'b]."));
    assert!(succeeds(&e, "set_prolog_flag(double_quotes, atom)."));
    assert!(succeeds(&e, "atom(\"ab\")."));
}

#[test]
fn char_conversion_applies_to_reading() {
    let e = engine();
    assert!(succeeds(&e, "char_conversion('a', 'b')."));
    assert!(succeeds(&e, "current_char_conversion('a', 'b')."));
    // unquoted source text is converted, quoted text is not
    let sols = solutions(&e, "X = abc, Y = 'abc'.");
    assert_bound(&sols[0], "X", &e, "'bbc'");
    assert_bound(&sols[0], "Y", &e, "'abc'");
    // mapping a character to itself removes the conversion
    assert!(succeeds(&e, "char_conversion('a', 'a')."));
    assert!(!succeeds(&e, "current_char_conversion('a', 'b')."));
}

#[test]
fn repeat_streams_solutions() {
    let e = engine();
    let count = Rc::new(RefCell::new(0));
    let c = count.clone();
    let found = e
        .query("repeat.", move |_| {
            *c.borrow_mut() += 1;
            *c.borrow() < 3
        })
        .unwrap();
    assert!(found);
    assert_eq!(*count.borrow(), 3);
}

#[test]
fn query_interruption() {
    let ctx = Ctx::new();
    let flag = ctx.interrupt_flag();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        flag.store(true, std::sync::atomic::Ordering::SeqCst);
    });
    let e = engine();
    match e.query_ctx("repeat, fail.", &ctx, |_| true) {
        Err(Error::Interrupted) => {}
        r => panic!("unexpected {:?}", r.is_ok()),
    }
    handle.join().unwrap();
}

#[test]
fn errors_propagate_past_choice_points() {
    let e = engine();
    e.consult("e(1). e(2).").unwrap();
    let count = Rc::new(RefCell::new(0));
    let c = count.clone();
    let r = e.query("e(X), throw(ball).", move |_| {
        *c.borrow_mut() += 1;
        true
    });
    assert!(r.is_err());
    // the error cut the enumeration short
    assert_eq!(*count.borrow(), 0);
    assert!(succeeds(&e, "catch((e(X), throw(ball)), ball, true)."));
}

#[test]
fn halt_uses_the_injected_exit_effect() {
    let e = engine();
    let recorded = Rc::new(RefCell::new(None));
    let r = recorded.clone();
    e.set_exit_handler(move |code| *r.borrow_mut() = Some(code));
    assert!(succeeds(&e, "halt(7)."));
    assert_eq!(*recorded.borrow(), Some(7));
    assert!(succeeds(&e, "halt."));
    assert_eq!(*recorded.borrow(), Some(0));
}

#[test]
fn trace_hooks_fire() {
    let e = engine();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let exits = Rc::new(RefCell::new(Vec::new()));
    let c = calls.clone();
    let x = exits.clone();
    e.on_call(move |pi, _, _| c.borrow_mut().push(pi.to_string()));
    e.on_exit(move |pi, _, _| x.borrow_mut().push(pi.to_string()));
    e.consult("h(1).").unwrap();
    assert!(succeeds(&e, "h(X)."));
    assert!(calls.borrow().iter().any(|pi| pi == "h/1"));
    assert!(exits.borrow().iter().any(|pi| pi == "h/1"));
}

#[test]
fn unknown_hook_fires() {
    let e = engine();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    e.on_unknown(move |pi, _, _| s.borrow_mut().push(pi.to_string()));
    assert!(succeeds(&e, "set_prolog_flag(unknown, fail)."));
    assert!(!succeeds(&e, "ghost(1)."));
    assert_eq!(*seen.borrow(), vec!["ghost/1".to_string()]);
}

#[test]
fn directive_failure_is_reported() {
    let e = engine();
    match e.consult(":- fail.") {
        Err(Error::DirectiveFailed(_)) => {}
        r => panic!("unexpected {:?}", r.is_ok()),
    }
}

#[test]
fn register_builtin_extends_the_engine() {
    fn solve_answer(
        _: &Engine,
        args: &[Rc<Term>],
        k: Cont,
        env: &Env,
    ) -> crate::nondet::Promise {
        match crate::unify::unify(&args[0], &Term::new_integer(42), false, env) {
            Some(env) => k(env),
            None => crate::nondet::Promise::Bool(false),
        }
    }
    let e = engine();
    e.register_builtin("answer", 1, solve_answer);
    let sols = solutions(&e, "answer(X).");
    assert_bound(&sols[0], "X", &e, "42");
}

fn temp_path(tag: &str) -> String {
    let dir = std::env::temp_dir();
    dir.join(format!("modus_{}_{}.tmp", tag, std::process::id()))
        .display()
        .to_string()
}

#[test]
fn file_streams_round_trip() {
    let e = engine();
    let path = temp_path("chars");
    assert!(succeeds(
        &e,
        &format!("open('{}', write, S), put_char(S, h), put_char(S, i), nl(S), close(S).", path)
    ));
    let sols = solutions(
        &e,
        &format!(
            "open('{}', read, S, [alias(in)]), get_char(in, C1), peek_char(in, C2), \
             get_char(in, C3), get_char(in, _), get_char(in, E), close(in), \
             A = [C1, C2, C3, E].",
            path
        ),
    );
    assert_eq!(sols.len(), 1);
    assert_bound(&sols[0], "A", &e, "[h, i, i, end_of_file]");
    std::fs::remove_file(&path).ok();
}

#[test]
fn binary_streams_use_bytes() {
    let e = engine();
    let path = temp_path("bytes");
    assert!(succeeds(
        &e,
        &format!(
            "open('{}', write, S, [type(binary)]), put_byte(S, 1), put_byte(S, 255), close(S).",
            path
        )
    ));
    let sols = solutions(
        &e,
        &format!(
            "open('{}', read, S, [type(binary)]), get_byte(S, B1), get_byte(S, B2), \
             get_byte(S, E), close(S), A = [B1, B2, E].",
            path
        ),
    );
    assert_bound(&sols[0], "A", &e, "[1, 255, -1]");
    // reading characters from a binary stream is a permission error
    assert!(succeeds(
        &e,
        &format!(
            "open('{}', read, S, [type(binary)]), \
             catch(get_char(S, _), error(permission_error(input, binary_stream, _), _), R = caught), \
             close(S), R == caught.",
            path
        )
    ));
    std::fs::remove_file(&path).ok();
}

#[test]
fn read_term_from_a_file() {
    let e = engine();
    let path = temp_path("read");
    std::fs::write(&path, "foo(X, Y, X). second.").unwrap();
    let sols = solutions(
        &e,
        &format!(
            "open('{}', read, S), read_term(S, T, [variables(Vs), singletons(Ss)]), \
             read(S, T2), read(S, T3), close(S).",
            path
        ),
    );
    assert_eq!(sols.len(), 1);
    let t = sols[0].get("T").unwrap();
    assert!(t.as_compound("foo", 3).is_some());
    let vs = crate::term::list_elements(sols[0].get("Vs").unwrap(), &Env::new()).unwrap();
    assert_eq!(vs.len(), 2);
    let ss = crate::term::list_elements(sols[0].get("Ss").unwrap(), &Env::new()).unwrap();
    assert_eq!(ss.len(), 1);
    assert!(sols[0].get("T2").unwrap().is_atom("second"));
    assert!(sols[0].get("T3").unwrap().is_atom("end_of_file"));
    std::fs::remove_file(&path).ok();
}

#[test]
fn write_term_output() {
    let out: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    struct Sink(Rc<RefCell<Vec<u8>>>);
    impl std::io::Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
    let e = Engine::with_io(std::io::empty(), Sink(out.clone()));
    assert!(succeeds(&e, "write([1, 2, 3]), nl."));
    assert!(succeeds(&e, "writeq('hello world'), nl."));
    assert!(succeeds(&e, "write_canonical(1 + 2), nl."));
    assert!(succeeds(&e, "write('$VAR'(1)), nl."));
    let text = String::from_utf8(out.borrow().clone()).unwrap();
    assert_eq!(text, "[1,2,3]\n'hello world'\n+(1,2)\nB\n");
}

#[test]
fn stream_properties() {
    let e = engine();
    let path = temp_path("props");
    std::fs::write(&path, "x").unwrap();
    assert!(succeeds(
        &e,
        &format!(
            "open('{}', read, S), stream_property(S, mode(read)), \
             stream_property(S, type(text)), stream_property(S, input), \
             stream_property(S, end_of_stream(not)), close(S).",
            path
        )
    ));
    assert!(succeeds(
        &e,
        &format!(
            "open('{}', read, S), catch(stream_property(S, nonsense(1)), \
             error(domain_error(stream_property, _), _), R = caught), close(S), R == caught.",
            path
        )
    ));
    std::fs::remove_file(&path).ok();
}

#[test]
fn set_stream_position_rewinds() {
    let e = engine();
    let path = temp_path("seek");
    std::fs::write(&path, "abc").unwrap();
    let sols = solutions(
        &e,
        &format!(
            "open('{}', read, S, [reposition(true)]), get_char(S, C1), get_char(S, C2), \
             set_stream_position(S, 0), get_char(S, C3), close(S), A = [C1, C2, C3].",
            path
        ),
    );
    assert_bound(&sols[0], "A", &e, "[a, b, a]");
    std::fs::remove_file(&path).ok();
}

#[test]
fn set_input_redirects_the_default_stream() {
    let e = engine();
    let path = temp_path("input");
    std::fs::write(&path, "q").unwrap();
    let sols = solutions(
        &e,
        &format!(
            "current_input(Old), open('{}', read, S), set_input(S), get_char(C), \
             set_input(Old), close(S).",
            path
        ),
    );
    assert_bound(&sols[0], "C", &e, "q");
    std::fs::remove_file(&path).ok();
}

#[test]
fn open_errors() {
    let e = engine();
    assert!(succeeds(
        &e,
        "catch(open('/no/such/file/anywhere', read, _), error(existence_error(source_sink, _), _), true)."
    ));
    assert!(succeeds(
        &e,
        "catch(open(f, bad_mode, _), error(domain_error(io_mode, _), _), true)."
    ));
}

#[test]
fn solutions_for_distinct_alternatives_do_not_leak_bindings() {
    let e = engine();
    e.consult("g(1). g(2).").unwrap();
    let sols = solutions(&e, "g(X).");
    assert_eq!(sols.len(), 2);
    // each solution sees exactly its own binding
    assert_bound(&sols[0], "X", &e, "1");
    assert_bound(&sols[1], "X", &e, "2");
}

#[test]
fn variables_in_goal_position() {
    let e = engine();
    let sols = solutions(&e, "G = (X = 5), G.");
    assert_eq!(sols.len(), 1);
    assert_bound(&sols[0], "X", &e, "5");
    assert!(succeeds(
        &e,
        "catch(call(_), error(instantiation_error, _), true)."
    ));
}

#[test]
fn call_n_appends_arguments() {
    let e = engine();
    e.consult("add3(A, B, C, S) :- S is A + B + C.").unwrap();
    let sols = solutions(&e, "call(add3(1), 2, 3, S).");
    assert_bound(&sols[0], "S", &e, "6");
}
