/// The prelude consulted into every fresh engine. Until the operator
/// directives run, everything is written in canonical notation.
pub(super) const BOOTSTRAP: &str = r#"
% operators (* 6.3.4.4, table 7 *)
:-(op(1200, xfx, ':-')).
:-(op(1200, xfx, '-->')).
:-(op(1200, fx, ':-')).
:-(op(1200, fx, '?-')).
:-(op(1100, xfy, ';')).
:-(op(1050, xfy, '->')).
:-(op(1000, xfy, ',')).
:-(op(900, fy, '\\+')).
:-(op(700, xfx, '=')).
:-(op(700, xfx, '\\=')).
:-(op(700, xfx, '==')).
:-(op(700, xfx, '\\==')).
:-(op(700, xfx, '@<')).
:-(op(700, xfx, '@>')).
:-(op(700, xfx, '@=<')).
:-(op(700, xfx, '@>=')).
:-(op(700, xfx, '=..')).
:-(op(700, xfx, 'is')).
:-(op(700, xfx, '=:=')).
:-(op(700, xfx, '=\\=')).
:-(op(700, xfx, '<')).
:-(op(700, xfx, '>')).
:-(op(700, xfx, '=<')).
:-(op(700, xfx, '>=')).
:-(op(500, yfx, '+')).
:-(op(500, yfx, '-')).
:-(op(500, yfx, '/\\')).
:-(op(500, yfx, '\\/')).
:-(op(400, yfx, '*')).
:-(op(400, yfx, '/')).
:-(op(400, yfx, '//')).
:-(op(400, yfx, 'rem')).
:-(op(400, yfx, 'mod')).
:-(op(400, yfx, '<<')).
:-(op(400, yfx, '>>')).
:-(op(200, xfx, '**')).
:-(op(200, xfy, '^')).
:-(op(200, fy, '-')).
:-(op(200, fy, '\\')).

% conjunction as a callable goal
','(P, Q) :- call(P), call(Q).

% disjunction and if-then-else; the if-then clauses must come first so a
% succeeded condition commits against the else branch
';'('->'(If, Then), _) :- call(If), !, call(Then).
';'('->'(_, _), Else) :- !, call(Else).
';'(P, _) :- call(P).
';'(_, Q) :- call(Q).
'->'(If, Then) :- call(If), !, call(Then).

% logic and control
X \= Y :- \+(X = Y).
once(G) :- call(G), !.
halt :- halt(0).

% stream defaulting wrappers
open(Name, Mode, S) :- open(Name, Mode, S, []).
close(S) :- close(S, []).
flush_output :- current_output(S), flush_output(S).
read_term(T, Opts) :- current_input(S), read_term(S, T, Opts).
read(T) :- current_input(S), read_term(S, T, []).
read(S, T) :- read_term(S, T, []).
write_term(T, Opts) :- current_output(S), write_term(S, T, Opts).
write(T) :- current_output(S), write_term(S, T, [numbervars(true)]).
write(S, T) :- write_term(S, T, [numbervars(true)]).
writeq(T) :- current_output(S), write_term(S, T, [quoted(true), numbervars(true)]).
writeq(S, T) :- write_term(S, T, [quoted(true), numbervars(true)]).
write_canonical(T) :- current_output(S), write_term(S, T, [quoted(true), ignore_ops(true)]).
write_canonical(S, T) :- write_term(S, T, [quoted(true), ignore_ops(true)]).
print(T) :- write(T).
print(S, T) :- write(S, T).
nl :- current_output(S), put_char(S, '\n').
nl(S) :- put_char(S, '\n').
get_char(C) :- current_input(S), get_char(S, C).
peek_char(C) :- current_input(S), peek_char(S, C).
get_byte(B) :- current_input(S), get_byte(S, B).
peek_byte(B) :- current_input(S), peek_byte(S, B).
put_char(C) :- current_output(S), put_char(S, C).
put_code(C) :- current_output(S), put_code(S, C).
put_byte(B) :- current_output(S), put_byte(S, B).
"#;
