//! An ISO-flavored Prolog interpreter.
//!
//! Source text is read by an operator-aware Pratt parser, clauses are
//! compiled to a small bytecode, and goals execute against the procedure
//! database on a VM whose nondeterminism is a lazy promise tree: choice
//! points are thunks, backtracking drops extended environments, and cut
//! prunes a marked subtree.
//!
//! ```
//! use modus::Engine;
//!
//! let engine = Engine::new();
//! engine.consult("likes(mary, wine). likes(mary, code).").unwrap();
//! let found = engine
//!     .query("likes(mary, X).", |solution| {
//!         println!("X = {}", solution.get("X").unwrap());
//!         true // ask for the next answer
//!     })
//!     .unwrap();
//! assert!(found);
//! ```

mod engine;
mod env;
mod error;
mod flags;
mod nondet;
mod operators;
mod read_term;
mod stream;
mod term;
mod unify;
mod write;

pub use engine::{BuiltinFn, Cont, Engine, Hook, Solution};
pub use env::Env;
pub use error::{Error, Exception};
pub use flags::{Flags, QuoteFlag, UnknownFlag};
pub use nondet::{Ctx, Promise, Thunk};
pub use operators::{Operator, OperatorTable, Specifier};
pub use read_term::{Error as SyntaxError, ParsedVar};
pub use stream::{ByteSource, CharStream, EofAction, Stream, StreamMode, StreamType};
pub use term::{compare, Compound, Pi, Term, Var};
pub use unify::unify;
pub use write::{term_to_string, write_term, WriteOptions};
