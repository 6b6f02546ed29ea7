use std::rc::Rc;

use crate::term::{Term, Var};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone)]
struct Node {
    color: Color,
    left: Link,
    right: Link,
    var: Var,
    value: Rc<Term>,
}

type Link = Option<Rc<Node>>;

/// A persistent mapping from variables to terms.
///
/// `bind` returns a new environment sharing structure with the old one; a
/// caller holding the ancestor keeps seeing the old bindings, which is what
/// makes backtracking a matter of dropping the extended map.
#[derive(Debug, Clone, Default)]
pub struct Env {
    root: Link,
}

fn make(color: Color, left: Link, right: Link, var: Var, value: Rc<Term>) -> Rc<Node> {
    Rc::new(Node {
        color,
        left,
        right,
        var,
        value,
    })
}

fn is_red(link: &Link) -> bool {
    matches!(link, Some(n) if n.color == Color::Red)
}

// Okasaki's balance: a black node with a red child and red grandchild is
// rewritten into a red node with two black children.
fn balance(color: Color, left: Link, right: Link, var: Var, value: Rc<Term>) -> Rc<Node> {
    if color == Color::Black {
        if is_red(&left) {
            let l = left.as_ref().unwrap();
            if is_red(&l.left) {
                let ll = l.left.as_ref().unwrap();
                return make(
                    Color::Red,
                    Some(make(
                        Color::Black,
                        ll.left.clone(),
                        ll.right.clone(),
                        ll.var,
                        ll.value.clone(),
                    )),
                    Some(make(
                        Color::Black,
                        l.right.clone(),
                        right,
                        var,
                        value,
                    )),
                    l.var,
                    l.value.clone(),
                );
            }
            if is_red(&l.right) {
                let lr = l.right.as_ref().unwrap();
                return make(
                    Color::Red,
                    Some(make(
                        Color::Black,
                        l.left.clone(),
                        lr.left.clone(),
                        l.var,
                        l.value.clone(),
                    )),
                    Some(make(
                        Color::Black,
                        lr.right.clone(),
                        right,
                        var,
                        value,
                    )),
                    lr.var,
                    lr.value.clone(),
                );
            }
        }
        if is_red(&right) {
            let r = right.as_ref().unwrap();
            if is_red(&r.left) {
                let rl = r.left.as_ref().unwrap();
                return make(
                    Color::Red,
                    Some(make(Color::Black, left, rl.left.clone(), var, value)),
                    Some(make(
                        Color::Black,
                        rl.right.clone(),
                        r.right.clone(),
                        r.var,
                        r.value.clone(),
                    )),
                    rl.var,
                    rl.value.clone(),
                );
            }
            if is_red(&r.right) {
                let rr = r.right.as_ref().unwrap();
                return make(
                    Color::Red,
                    Some(make(Color::Black, left, r.left.clone(), var, value)),
                    Some(make(
                        Color::Black,
                        rr.left.clone(),
                        rr.right.clone(),
                        rr.var,
                        rr.value.clone(),
                    )),
                    r.var,
                    r.value.clone(),
                );
            }
        }
    }
    make(color, left, right, var, value)
}

fn insert(link: &Link, var: Var, value: &Rc<Term>) -> Rc<Node> {
    match link {
        None => make(Color::Red, None, None, var, value.clone()),
        Some(n) => match var.cmp(&n.var) {
            std::cmp::Ordering::Less => balance(
                n.color,
                Some(insert(&n.left, var, value)),
                n.right.clone(),
                n.var,
                n.value.clone(),
            ),
            std::cmp::Ordering::Greater => balance(
                n.color,
                n.left.clone(),
                Some(insert(&n.right, var, value)),
                n.var,
                n.value.clone(),
            ),
            std::cmp::Ordering::Equal => n.clone(),
        },
    }
}

impl Env {
    pub fn new() -> Self {
        Env::default()
    }

    /// Returns the term the variable is bound to, if any.
    pub fn lookup(&self, var: Var) -> Option<Rc<Term>> {
        let mut node = &self.root;
        while let Some(n) = node {
            match var.cmp(&n.var) {
                std::cmp::Ordering::Less => node = &n.left,
                std::cmp::Ordering::Greater => node = &n.right,
                std::cmp::Ordering::Equal => return Some(n.value.clone()),
            }
        }
        None
    }

    /// Returns a new environment extended with var -> value.
    pub fn bind(&self, var: Var, value: Rc<Term>) -> Env {
        let n = insert(&self.root, var, &value);
        let mut root = (*n).clone();
        root.color = Color::Black;
        Env {
            root: Some(Rc::new(root)),
        }
    }

    /// Follows the variable chain and returns the first non-variable term or
    /// the last variable. A chain that loops back on itself stops at the
    /// first revisited variable.
    pub fn resolve(&self, t: &Rc<Term>) -> Rc<Term> {
        let mut t = t.clone();
        let mut stop: Vec<Var> = Vec::new();
        loop {
            let v = match &*t {
                Term::Var(v) => *v,
                _ => return t,
            };
            if stop.contains(&v) {
                return t;
            }
            match self.lookup(v) {
                Some(next) => {
                    stop.push(v);
                    t = next;
                }
                None => return t,
            }
        }
    }

    /// Deep-resolves t, rebuilding compound spines so that as few variables
    /// as possible remain. Cyclic bindings are left as the variable that
    /// closes the cycle.
    pub fn simplify(&self, t: &Rc<Term>) -> Rc<Term> {
        let mut path = Vec::new();
        self.simplify_guarded(t, &mut path)
    }

    fn simplify_guarded(&self, t: &Rc<Term>, path: &mut Vec<Var>) -> Rc<Term> {
        let mut t = t.clone();
        let mut chain: Vec<Var> = Vec::new();
        loop {
            let v = match &*t {
                Term::Var(v) => *v,
                _ => break,
            };
            if path.contains(&v) || chain.contains(&v) {
                return t;
            }
            match self.lookup(v) {
                Some(next) => {
                    chain.push(v);
                    t = next;
                }
                None => return t,
            }
        }
        if let Term::Compound(c) = &*t {
            let depth = path.len();
            path.extend(chain);
            let args = c
                .args
                .iter()
                .map(|a| self.simplify_guarded(a, path))
                .collect();
            path.truncate(depth);
            Term::new_compound(&c.functor, args)
        } else {
            t.clone()
        }
    }

    /// Extracts the unbound variables in the given terms, first occurrence
    /// first, deduplicated.
    pub fn free_variables(&self, ts: &[Rc<Term>]) -> Vec<Var> {
        let mut acc = Vec::new();
        let mut expanded = Vec::new();
        for t in ts {
            self.append_free(t, &mut acc, &mut expanded);
        }
        acc
    }

    fn append_free(&self, t: &Rc<Term>, acc: &mut Vec<Var>, expanded: &mut Vec<Var>) {
        let mut t = t.clone();
        loop {
            let v = match &*t {
                Term::Var(v) => *v,
                _ => break,
            };
            match self.lookup(v) {
                Some(next) => {
                    if expanded.contains(&v) {
                        return;
                    }
                    expanded.push(v);
                    t = next;
                }
                None => {
                    if !acc.contains(&v) {
                        acc.push(v);
                    }
                    return;
                }
            }
        }
        if let Term::Compound(c) = &*t {
            for a in &c.args {
                self.append_free(a, acc, expanded);
            }
        }
    }
}
