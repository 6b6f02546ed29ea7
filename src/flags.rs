#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteFlag {
    Codes,
    Chars,
    Atom,
}

impl QuoteFlag {
    pub fn as_atom(&self) -> &'static str {
        match self {
            QuoteFlag::Codes => "codes",
            QuoteFlag::Chars => "chars",
            QuoteFlag::Atom => "atom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownFlag {
    Error,
    Fail,
    Warning,
}

impl UnknownFlag {
    pub fn as_atom(&self) -> &'static str {
        match self {
            UnknownFlag::Error => "error",
            UnknownFlag::Fail => "fail",
            UnknownFlag::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Flags {
    pub char_conversion: bool,
    pub double_quotes: QuoteFlag,
    pub unknown: UnknownFlag,
    pub debug: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            char_conversion: true,
            double_quotes: QuoteFlag::Codes,
            unknown: UnknownFlag::Error,
            debug: false,
        }
    }
}
