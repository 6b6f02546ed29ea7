#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specifier {
    xf,
    yf,
    xfx,
    xfy,
    yfx,
    fx,
    fy,
}

impl Specifier {
    pub fn from_atom(s: &str) -> Option<Specifier> {
        match s {
            "xf" => Some(Specifier::xf),
            "yf" => Some(Specifier::yf),
            "xfx" => Some(Specifier::xfx),
            "xfy" => Some(Specifier::xfy),
            "yfx" => Some(Specifier::yfx),
            "fx" => Some(Specifier::fx),
            "fy" => Some(Specifier::fy),
            _ => None,
        }
    }

    pub fn as_atom(&self) -> &'static str {
        match self {
            Specifier::xf => "xf",
            Specifier::yf => "yf",
            Specifier::xfx => "xfx",
            Specifier::xfy => "xfy",
            Specifier::yfx => "yfx",
            Specifier::fx => "fx",
            Specifier::fy => "fy",
        }
    }

    pub fn is_prefix(&self) -> bool {
        matches!(self, Specifier::fx | Specifier::fy)
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, Specifier::xf | Specifier::yf)
    }

    pub fn is_infix(&self) -> bool {
        matches!(self, Specifier::xfx | Specifier::xfy | Specifier::yfx)
    }
}

#[derive(Debug, Clone)]
pub struct Operator {
    pub priority: u16,
    pub specifier: Specifier,
    pub name: String,
}

impl Operator {
    /// Binding powers for the Pratt parser. Priorities invert into powers
    /// with 1201 - priority, so a tighter operator binds stronger. A left
    /// power of 0 marks a prefix operator, a right power of 0 a postfix one.
    pub fn binding_powers(&self) -> (u16, u16) {
        let bp = 1201 - self.priority;
        match self.specifier {
            Specifier::xf => (bp + 1, 0),
            Specifier::yf => (bp, 0),
            Specifier::xfx => (bp + 1, bp + 1),
            Specifier::xfy => (bp + 1, bp),
            Specifier::yfx => (bp, bp + 1),
            Specifier::fx => (0, bp + 1),
            Specifier::fy => (0, bp),
        }
    }
}

/// The operator table, kept sorted by priority descending so that scans for
/// "priority at most N" are suffix scans.
#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    ops: Vec<Operator>,
}

impl OperatorTable {
    pub fn new() -> Self {
        OperatorTable::default()
    }

    /// Defines an operator. An existing entry with the same name and
    /// specifier is removed first; priority 0 keeps it removed.
    pub fn define(&mut self, priority: u16, specifier: Specifier, name: &str) {
        self.ops
            .retain(|o| !(o.name == name && o.specifier == specifier));
        if priority == 0 {
            return;
        }
        let at = self
            .ops
            .iter()
            .position(|o| o.priority < priority)
            .unwrap_or(self.ops.len());
        self.ops.insert(
            at,
            Operator {
                priority,
                specifier,
                name: name.to_string(),
            },
        );
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operator> {
        self.ops.iter()
    }

    pub fn lookup_prefix(&self, name: &str) -> Option<&Operator> {
        self.ops
            .iter()
            .find(|o| o.name == name && o.specifier.is_prefix())
    }

    pub fn lookup_infix(&self, name: &str) -> Option<&Operator> {
        self.ops
            .iter()
            .find(|o| o.name == name && o.specifier.is_infix())
    }

    pub fn lookup_postfix(&self, name: &str) -> Option<&Operator> {
        self.ops
            .iter()
            .find(|o| o.name == name && o.specifier.is_postfix())
    }

    /// Any operator usable after a left operand: infix or postfix.
    pub fn lookup_trailing(&self, name: &str) -> Option<&Operator> {
        self.ops
            .iter()
            .find(|o| o.name == name && !o.specifier.is_prefix())
    }

    pub fn is_operator(&self, name: &str) -> bool {
        self.ops.iter().any(|o| o.name == name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_stays_sorted_descending() {
        let mut t = OperatorTable::new();
        t.define(700, Specifier::xfx, "=");
        t.define(1200, Specifier::xfx, ":-");
        t.define(500, Specifier::yfx, "+");
        t.define(1000, Specifier::xfy, ",");
        let prios: Vec<u16> = t.iter().map(|o| o.priority).collect();
        let mut sorted = prios.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(prios, sorted);
    }

    #[test]
    fn priority_zero_removes() {
        let mut t = OperatorTable::new();
        t.define(700, Specifier::xfx, "=");
        assert!(t.lookup_infix("=").is_some());
        t.define(0, Specifier::xfx, "=");
        assert!(t.lookup_infix("=").is_none());
    }

    #[test]
    fn redefining_replaces() {
        let mut t = OperatorTable::new();
        t.define(700, Specifier::xfx, "=");
        t.define(600, Specifier::xfx, "=");
        let found: Vec<&Operator> = t.iter().filter(|o| o.name == "=").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].priority, 600);
    }

    #[test]
    fn prefix_and_infix_coexist() {
        let mut t = OperatorTable::new();
        t.define(500, Specifier::yfx, "-");
        t.define(200, Specifier::fy, "-");
        assert_eq!(t.lookup_prefix("-").unwrap().priority, 200);
        assert_eq!(t.lookup_infix("-").unwrap().priority, 500);
    }

    #[test]
    fn binding_powers_follow_the_table() {
        let op = Operator {
            priority: 1200,
            specifier: Specifier::xfx,
            name: ":-".into(),
        };
        assert_eq!(op.binding_powers(), (2, 2));
        let op = Operator {
            priority: 500,
            specifier: Specifier::yfx,
            name: "+".into(),
        };
        assert_eq!(op.binding_powers(), (701, 702));
        let op = Operator {
            priority: 200,
            specifier: Specifier::fy,
            name: "-".into(),
        };
        assert_eq!(op.binding_powers(), (0, 1001));
    }
}
