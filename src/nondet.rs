use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Exception;

/// A deferred branch of the search tree.
pub type Thunk = Box<dyn FnOnce(&Ctx) -> Promise>;

/// The lazy search tree. Alternatives are explored left to right, depth
/// first; thunks only run when the search reaches them.
pub enum Promise {
    /// Terminal: true is one solution, false is "no more here".
    Bool(bool),
    /// Terminal failure that propagates past choice points.
    Error(Exception),
    /// A choice point.
    Delay(Vec<Thunk>),
    /// A choice point that a cut can prune back to, created at clause
    /// arrival.
    Barrier(u64, Vec<Thunk>),
    /// Discards every choice point up to and including the named barrier,
    /// then continues.
    Cut(u64, Thunk),
    /// An infinite stream of identical alternatives.
    Repeat(Rc<dyn Fn(&Ctx) -> Promise>),
}

impl Promise {
    pub fn delay(f: impl FnOnce(&Ctx) -> Promise + 'static) -> Promise {
        Promise::Delay(vec![Box::new(f)])
    }
}

/// Cooperative cancellation, checked between promise nodes. The flag is
/// shareable across threads so a host signal handler can set it.
#[derive(Clone, Default)]
pub struct Ctx {
    interrupted: Arc<AtomicBool>,
}

impl Ctx {
    pub fn new() -> Self {
        Ctx::default()
    }

    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

enum Alts {
    Finite(VecDeque<Thunk>),
    Infinite(Rc<dyn Fn(&Ctx) -> Promise>),
}

struct Frame {
    barrier: Option<u64>,
    alts: Alts,
}

enum Pulled {
    Next(Promise),
    Exhausted,
}

/// Drives the tree to its first success. The success continuation decides
/// whether that ends the query: returning Bool(false) from it resumes the
/// search for another solution before force ever returns.
pub fn force(p: Promise, ctx: &Ctx) -> Result<bool, Exception> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut current = Some(p);
    loop {
        if ctx.interrupted() {
            return Err(Exception::Interrupted);
        }
        let p = match current.take() {
            Some(p) => p,
            None => loop {
                let pulled = match stack.last_mut() {
                    None => return Ok(false),
                    Some(f) => match &mut f.alts {
                        Alts::Finite(q) => match q.pop_front() {
                            Some(t) => Pulled::Next(t(ctx)),
                            None => Pulled::Exhausted,
                        },
                        Alts::Infinite(r) => {
                            let r = r.clone();
                            Pulled::Next(r(ctx))
                        }
                    },
                };
                match pulled {
                    Pulled::Next(p) => break p,
                    Pulled::Exhausted => {
                        stack.pop();
                    }
                }
            },
        };
        match p {
            Promise::Bool(true) => return Ok(true),
            Promise::Bool(false) => {}
            Promise::Error(e) => return Err(e),
            Promise::Delay(ks) => stack.push(Frame {
                barrier: None,
                alts: Alts::Finite(ks.into()),
            }),
            Promise::Barrier(id, ks) => stack.push(Frame {
                barrier: Some(id),
                alts: Alts::Finite(ks.into()),
            }),
            Promise::Cut(id, k) => {
                while let Some(f) = stack.pop() {
                    if f.barrier == Some(id) {
                        break;
                    }
                }
                current = Some(k(ctx));
            }
            Promise::Repeat(r) => stack.push(Frame {
                barrier: None,
                alts: Alts::Infinite(r),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn alternatives_run_left_to_right() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mk = |n: i32| {
            let order = order.clone();
            Box::new(move |_: &Ctx| {
                order.borrow_mut().push(n);
                Promise::Bool(false)
            }) as Thunk
        };
        let p = Promise::Delay(vec![mk(1), mk(2), mk(3)]);
        assert!(!force(p, &Ctx::new()).unwrap());
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn first_success_wins_and_stops() {
        let ran = Rc::new(RefCell::new(0));
        let r2 = ran.clone();
        let p = Promise::Delay(vec![
            Box::new(|_: &Ctx| Promise::Bool(true)),
            Box::new(move |_: &Ctx| {
                *r2.borrow_mut() += 1;
                Promise::Bool(true)
            }),
        ]);
        assert!(force(p, &Ctx::new()).unwrap());
        assert_eq!(*ran.borrow(), 0);
    }

    #[test]
    fn errors_propagate_past_choice_points() {
        let p = Promise::Delay(vec![
            Box::new(|_: &Ctx| {
                Promise::Error(crate::error::type_error(
                    "integer",
                    &crate::term::Term::new_atom("x"),
                ))
            }),
            Box::new(|_: &Ctx| Promise::Bool(true)),
        ]);
        assert!(force(p, &Ctx::new()).is_err());
    }

    #[test]
    fn cut_discards_sibling_alternatives() {
        let tried = Rc::new(RefCell::new(Vec::new()));
        let t1 = tried.clone();
        let t2 = tried.clone();
        let barrier = 7;
        let p = Promise::Barrier(
            barrier,
            vec![
                Box::new(move |_: &Ctx| {
                    t1.borrow_mut().push("first");
                    // commit, then fail: the second alternative must not run
                    Promise::Cut(barrier, Box::new(|_: &Ctx| Promise::Bool(false)))
                }),
                Box::new(move |_: &Ctx| {
                    t2.borrow_mut().push("second");
                    Promise::Bool(true)
                }),
            ],
        );
        assert!(!force(p, &Ctx::new()).unwrap());
        assert_eq!(*tried.borrow(), vec!["first"]);
    }

    #[test]
    fn cut_only_prunes_to_its_own_barrier() {
        let tried = Rc::new(RefCell::new(Vec::new()));
        let t1 = tried.clone();
        let t2 = tried.clone();
        let inner = 1;
        let outer = 2;
        let p = Promise::Barrier(
            outer,
            vec![
                Box::new(move |_: &Ctx| {
                    let t1 = t1.clone();
                    Promise::Barrier(
                        inner,
                        vec![Box::new(move |_: &Ctx| {
                            t1.borrow_mut().push("inner");
                            Promise::Cut(inner, Box::new(|_: &Ctx| Promise::Bool(false)))
                        })],
                    )
                }),
                Box::new(move |_: &Ctx| {
                    t2.borrow_mut().push("outer alternative");
                    Promise::Bool(true)
                }),
            ],
        );
        // the inner cut must not prune the outer barrier's alternatives
        assert!(force(p, &Ctx::new()).unwrap());
        assert_eq!(*tried.borrow(), vec!["inner", "outer alternative"]);
    }

    #[test]
    fn repeat_is_infinite_until_committed() {
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        let p = Promise::Repeat(Rc::new(move |_: &Ctx| {
            *c.borrow_mut() += 1;
            if *c.borrow() == 5 {
                Promise::Bool(true)
            } else {
                Promise::Bool(false)
            }
        }));
        assert!(force(p, &Ctx::new()).unwrap());
        assert_eq!(*count.borrow(), 5);
    }

    #[test]
    fn cancellation_stops_the_search() {
        let ctx = Ctx::new();
        let c2 = ctx.clone();
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        let p = Promise::Repeat(Rc::new(move |_: &Ctx| {
            *c.borrow_mut() += 1;
            if *c.borrow() == 10 {
                c2.interrupt();
            }
            Promise::Bool(false)
        }));
        match force(p, &ctx) {
            Err(Exception::Interrupted) => {}
            r => panic!("unexpected {:?}", r.is_ok()),
        }
        assert_eq!(*count.borrow(), 10);
    }

    #[test]
    fn lazy_thunks_are_not_evaluated_past_success() {
        let ran = Rc::new(RefCell::new(false));
        let r2 = ran.clone();
        let p = Promise::Delay(vec![
            Box::new(|_: &Ctx| {
                Promise::delay(|_| Promise::Bool(true))
            }),
            Box::new(move |_: &Ctx| {
                *r2.borrow_mut() = true;
                Promise::Bool(true)
            }),
        ]);
        assert!(force(p, &Ctx::new()).unwrap());
        assert!(!*ran.borrow());
    }
}
