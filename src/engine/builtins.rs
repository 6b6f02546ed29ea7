use phf::phf_map;

use super::{arith, collect, control, database, io, ops, prolog_flags, terms, text, typing};
use super::BuiltinFn;

/// Native predicates, keyed by `name/arity`. Control constructs that need
/// clause-level cut behaviour (`,/2`, `;/2`, `->/2`) live in the bootstrap
/// library instead.
pub(super) static BUILTINS: phf::Map<&'static str, BuiltinFn> = phf_map! {
    // control
    "true/0" => control::solve_true,
    "fail/0" => control::solve_fail,
    "false/0" => control::solve_fail,
    "call/1" => control::solve_call,
    "call/2" => control::solve_call_n,
    "call/3" => control::solve_call_n,
    "call/4" => control::solve_call_n,
    "call/5" => control::solve_call_n,
    "call/6" => control::solve_call_n,
    "call/7" => control::solve_call_n,
    "call/8" => control::solve_call_n,
    "\\+/1" => control::solve_not_provable,
    "not/1" => control::solve_not_provable,
    "catch/3" => control::solve_catch,
    "throw/1" => control::solve_throw,
    "repeat/0" => control::solve_repeat,
    "halt/1" => control::solve_halt,

    // unification and identity
    "=/2" => typing::solve_unify,
    "unify_with_occurs_check/2" => typing::solve_unify_with_occurs_check,
    "==/2" => typing::solve_term_eq,
    "\\==/2" => typing::solve_term_neq,
    "@</2" => typing::solve_term_lss,
    "@=</2" => typing::solve_term_leq,
    "@>/2" => typing::solve_term_gtr,
    "@>=/2" => typing::solve_term_geq,
    "compare/3" => typing::solve_compare,

    // type tests
    "var/1" => typing::solve_var,
    "nonvar/1" => typing::solve_nonvar,
    "atom/1" => typing::solve_atom,
    "integer/1" => typing::solve_integer,
    "float/1" => typing::solve_float,
    "number/1" => typing::solve_number,
    "atomic/1" => typing::solve_atomic,
    "compound/1" => typing::solve_compound,
    "callable/1" => typing::solve_callable,
    "is_list/1" => typing::solve_is_list,

    // term construction and inspection
    "functor/3" => terms::solve_functor,
    "arg/3" => terms::solve_arg,
    "=../2" => terms::solve_univ,
    "copy_term/2" => terms::solve_copy_term,

    // database
    "assertz/1" => database::solve_assertz,
    "asserta/1" => database::solve_asserta,
    "retract/1" => database::solve_retract,
    "abolish/1" => database::solve_abolish,
    "clause/2" => database::solve_clause,
    "current_predicate/1" => database::solve_current_predicate,
    "dynamic/1" => database::solve_dynamic,

    // operators
    "op/3" => ops::solve_op,
    "current_op/3" => ops::solve_current_op,

    // atom and number text
    "atom_length/2" => text::solve_atom_length,
    "atom_concat/3" => text::solve_atom_concat,
    "sub_atom/5" => text::solve_sub_atom,
    "atom_chars/2" => text::solve_atom_chars,
    "atom_codes/2" => text::solve_atom_codes,
    "char_code/2" => text::solve_char_code,
    "number_chars/2" => text::solve_number_chars,
    "number_codes/2" => text::solve_number_codes,

    // arithmetic
    "is/2" => arith::solve_is,
    "=:=/2" => arith::solve_arith_eq,
    "=\\=/2" => arith::solve_arith_neq,
    "</2" => arith::solve_arith_lss,
    "=</2" => arith::solve_arith_leq,
    ">/2" => arith::solve_arith_gtr,
    ">=/2" => arith::solve_arith_geq,

    // all-solutions
    "findall/3" => collect::solve_findall,
    "bagof/3" => collect::solve_bagof,
    "setof/3" => collect::solve_setof,

    // streams and I/O
    "current_input/1" => io::solve_current_input,
    "current_output/1" => io::solve_current_output,
    "set_input/1" => io::solve_set_input,
    "set_output/1" => io::solve_set_output,
    "open/4" => io::solve_open,
    "close/2" => io::solve_close,
    "flush_output/1" => io::solve_flush_output,
    "write_term/3" => io::solve_write_term,
    "read_term/3" => io::solve_read_term,
    "get_char/2" => io::solve_get_char,
    "peek_char/2" => io::solve_peek_char,
    "get_byte/2" => io::solve_get_byte,
    "peek_byte/2" => io::solve_peek_byte,
    "put_char/2" => io::solve_put_char,
    "put_code/2" => io::solve_put_code,
    "put_byte/2" => io::solve_put_byte,
    "stream_property/2" => io::solve_stream_property,
    "set_stream_position/2" => io::solve_set_stream_position,

    // flags and character conversion
    "set_prolog_flag/2" => prolog_flags::solve_set_prolog_flag,
    "current_prolog_flag/2" => prolog_flags::solve_current_prolog_flag,
    "char_conversion/2" => prolog_flags::solve_char_conversion,
    "current_char_conversion/2" => prolog_flags::solve_current_char_conversion,
};
