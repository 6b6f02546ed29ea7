use super::{Error, ReadContext};
use crate::stream::CharStream;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Eof,
    Name(String),
    Var(String),
    Int(i64),
    Float(f64),
    Str(String),
    Open,
    OpenCt,
    Close,
    OpenL,
    CloseL,
    OpenC,
    CloseC,
    Bar,
    Comma,
    End,
}

enum Char {
    Layout(char),
    Solo(char),
    Meta(char),
    Digit(char),
    Underscore,
    CapitalLetter(char),
    SmallLetter(char),
    Graphic(char),
    Invalid(char),
    Eof,
}

fn classify_char(c: Option<char>) -> Char {
    match c {
        None => Char::Eof,
        Some(c) => match c {
            ' ' | '\t' | '\r' | '\n' => Char::Layout(c),
            '!' | '(' | ')' | ',' | ';' | '[' | ']' | '{' | '}' | '|' | '%' => Char::Solo(c),
            '\\' | '\'' | '"' | '`' => Char::Meta(c),
            '0'..='9' => Char::Digit(c),
            '_' => Char::Underscore,
            'A'..='Z' => Char::CapitalLetter(c),
            'a'..='z' => Char::SmallLetter(c),
            '#' | '$' | '&' | '*' | '+' | '-' | '.' | '/' | ':' | '<' | '=' | '>' | '?' | '@'
            | '^' | '~' => Char::Graphic(c),
            _ => Char::Invalid(c),
        },
    }
}

fn convert_char(ctx: &ReadContext, c: Option<char>) -> Option<char> {
    if !ctx.flags.char_conversion {
        return c;
    }
    match c {
        Some(c) => Some(*ctx.conversions.get(&c).unwrap_or(&c)),
        None => None,
    }
}

fn next_char_raw(stream: &mut dyn CharStream) -> Result<Option<char>, Error> {
    Ok(stream.get()?)
}

fn peek_char_raw(stream: &mut dyn CharStream) -> Result<Option<char>, Error> {
    Ok(stream.peek()?)
}

fn eat_char(stream: &mut dyn CharStream) -> Result<(), Error> {
    next_char_raw(stream)?;
    Ok(())
}

fn next_char(ctx: &ReadContext, stream: &mut dyn CharStream) -> Result<Char, Error> {
    let c = next_char_raw(stream)?;
    Ok(classify_char(convert_char(ctx, c)))
}

fn peek_char(ctx: &ReadContext, stream: &mut dyn CharStream) -> Result<Char, Error> {
    let c = peek_char_raw(stream)?;
    Ok(classify_char(convert_char(ctx, c)))
}

fn multiline_comment(ctx: &ReadContext, stream: &mut dyn CharStream) -> Result<Char, Error> {
    loop {
        match next_char(ctx, stream)? {
            Char::Eof => return Ok(Char::Eof),
            Char::Graphic('*') => match next_char(ctx, stream)? {
                Char::Eof => return Ok(Char::Eof),
                Char::Graphic('/') => return next_char(ctx, stream),
                _ => {}
            },
            _ => {}
        }
    }
}

fn integral(
    stream: &mut dyn CharStream,
    max: char,
    radix: u32,
    prefix: &str,
) -> Result<Token, Error> {
    let mut t = String::new();
    loop {
        match classify_char(peek_char_raw(stream)?) {
            Char::Digit(c) if c <= max => t.push(c),
            Char::SmallLetter(c) if radix == 16 && ('a'..='f').contains(&c) => t.push(c),
            Char::CapitalLetter(c) if radix == 16 && ('A'..='F').contains(&c) => t.push(c),
            _ => break,
        }
        eat_char(stream)?;
    }
    if t.is_empty() {
        return Err(Error::BadInteger(prefix.to_string()));
    }
    i64::from_str_radix(&t, radix)
        .map(Token::Int)
        .map_err(|_| Error::BadInteger(format!("{}{}", prefix, t)))
}

fn numeric(ctx: &ReadContext, stream: &mut dyn CharStream, c: char) -> Result<Token, Error> {
    let mut t = c.to_string();
    // integer part
    loop {
        match peek_char(ctx, stream)? {
            Char::Digit(c) => {
                t.push(c);
                eat_char(stream)?;
            }
            Char::Graphic('.') => {
                // the dot continues the number only when a digit follows;
                // otherwise it is an end-of-clause left for the next token
                match classify_char(stream.peek2()?) {
                    Char::Digit(_) => {
                        eat_char(stream)?;
                        t.push('.');
                        break;
                    }
                    _ => {
                        return t
                            .parse::<i64>()
                            .map(Token::Int)
                            .map_err(|_| Error::BadInteger(t))
                    }
                }
            }
            _ => {
                return t
                    .parse::<i64>()
                    .map(Token::Int)
                    .map_err(|_| Error::BadInteger(t))
            }
        }
    }
    // fraction (* 6.4.5 *)
    loop {
        match peek_char(ctx, stream)? {
            Char::Digit(c) => {
                t.push(c);
                eat_char(stream)?;
            }
            Char::CapitalLetter('E') | Char::SmallLetter('e') => {
                eat_char(stream)?;
                t.push('e');
                break;
            }
            _ => {
                return t
                    .parse::<f64>()
                    .map(Token::Float)
                    .map_err(|_| Error::BadFloat(t))
            }
        }
    }
    // exponent
    match peek_char(ctx, stream)? {
        Char::Graphic('+') => {
            t.push('+');
            eat_char(stream)?;
        }
        Char::Graphic('-') => {
            t.push('-');
            eat_char(stream)?;
        }
        Char::Digit(_) => {}
        _ => return Err(Error::BadFloat(t)),
    }
    let mut any = false;
    loop {
        match peek_char(ctx, stream)? {
            Char::Digit(c) => {
                any = true;
                t.push(c);
                eat_char(stream)?;
            }
            _ => {
                if !any {
                    return Err(Error::BadFloat(t));
                }
                return t
                    .parse::<f64>()
                    .map(Token::Float)
                    .map_err(|_| Error::BadFloat(t));
            }
        }
    }
}

fn alpha_numeric(
    ctx: &ReadContext,
    stream: &mut dyn CharStream,
    c: char,
) -> Result<String, Error> {
    let mut t = c.to_string();
    loop {
        match peek_char(ctx, stream)? {
            Char::Underscore => t.push('_'),
            Char::SmallLetter(c) | Char::CapitalLetter(c) | Char::Digit(c) => t.push(c),
            _ => return Ok(t),
        }
        eat_char(stream)?;
    }
}

// One escape sequence after the backslash. None means a line continuation.
fn escape(stream: &mut dyn CharStream) -> Result<Option<char>, Error> {
    match next_char_raw(stream)? {
        Some('\n') => Ok(None),
        Some('\\') => Ok(Some('\\')),
        Some('\'') => Ok(Some('\'')),
        Some('"') => Ok(Some('"')),
        Some('`') => Ok(Some('`')),
        Some('a') => Ok(Some('\x07')),
        Some('b') => Ok(Some('\x08')),
        Some('f') => Ok(Some('\x0C')),
        Some('n') => Ok(Some('\n')),
        Some('r') => Ok(Some('\r')),
        Some('t') => Ok(Some('\t')),
        Some('v') => Ok(Some('\x0B')),
        Some('x') => {
            let mut hex = String::new();
            loop {
                match next_char_raw(stream)? {
                    Some('\\') => break,
                    Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                    Some(c) => return Err(Error::BadEscape(format!("x{}{}", hex, c))),
                    None => return Err(Error::BadEscape(format!("x{}", hex))),
                }
            }
            u32::from_str_radix(&hex, 16)
                .ok()
                .and_then(char::from_u32)
                .map(Some)
                .ok_or(Error::BadEscape(format!("x{}\\", hex)))
        }
        Some(c) if ('0'..='7').contains(&c) => {
            let mut oct = c.to_string();
            loop {
                match next_char_raw(stream)? {
                    Some('\\') => break,
                    Some(c) if ('0'..='7').contains(&c) => oct.push(c),
                    Some(c) => return Err(Error::BadEscape(format!("{}{}", oct, c))),
                    None => return Err(Error::BadEscape(oct)),
                }
            }
            u32::from_str_radix(&oct, 8)
                .ok()
                .and_then(char::from_u32)
                .map(Some)
                .ok_or(Error::BadEscape(oct))
        }
        Some(c) => Err(Error::BadEscape(c.to_string())),
        None => Err(Error::BadEscape("\\".to_string())),
    }
}

fn quoted(stream: &mut dyn CharStream, quote: char) -> Result<String, Error> {
    let mut t = String::new();
    loop {
        match next_char_raw(stream)? {
            None => return Err(Error::Missing(quote)),
            Some('\\') => {
                if let Some(c) = escape(stream)? {
                    t.push(c);
                }
            }
            Some(c) if c == quote => match peek_char_raw(stream)? {
                Some(c) if c == quote => {
                    t.push(c);
                    eat_char(stream)?;
                }
                _ => return Ok(t),
            },
            Some(c) => t.push(c),
        }
    }
}

// character code literal (* 6.4.4 *)
fn char_code_literal(stream: &mut dyn CharStream) -> Result<Token, Error> {
    match next_char_raw(stream)? {
        None => Err(Error::BadInteger("0'".to_string())),
        Some('\\') => match escape(stream)? {
            Some(c) => Ok(Token::Int(c as i64)),
            None => Err(Error::BadEscape("\\".to_string())),
        },
        Some('\'') => match peek_char_raw(stream)? {
            Some('\'') => {
                eat_char(stream)?;
                Ok(Token::Int('\'' as i64))
            }
            _ => Ok(Token::Int('\'' as i64)),
        },
        Some(c) => Ok(Token::Int(c as i64)),
    }
}

pub(crate) fn next(ctx: &ReadContext, stream: &mut dyn CharStream) -> Result<Token, Error> {
    let mut c = next_char(ctx, stream)?;

    // open ct (* 6.4 *)
    if let Char::Solo('(') = c {
        return Ok(Token::OpenCt);
    }

    loop {
        match c {
            Char::Eof => return Ok(Token::Eof),

            // layout text sequence (* 6.4.1 *)
            Char::Layout(_) => {
                c = next_char(ctx, stream)?;
            }

            // single line comment (* 6.4.1 *)
            Char::Solo('%') => loop {
                match next_char(ctx, stream)? {
                    Char::Eof => return Ok(Token::Eof),
                    Char::Layout('\n') => {
                        c = next_char(ctx, stream)?;
                        break;
                    }
                    _ => {}
                }
            },

            // letter digit token (* 6.4.2 *)
            Char::SmallLetter(c) => return Ok(Token::Name(alpha_numeric(ctx, stream, c)?)),

            // graphic token (* 6.4.2 *)
            Char::Graphic('.') => {
                let mut t = String::from('.');
                match peek_char(ctx, stream)? {
                    Char::Solo('%') | Char::Layout(_) | Char::Eof => return Ok(Token::End),
                    Char::Graphic(c) => t.push(c),
                    Char::Meta('\\') => t.push('\\'),
                    _ => return Ok(Token::Name(t)),
                }
                eat_char(stream)?;
                loop {
                    match peek_char(ctx, stream)? {
                        Char::Graphic(c) => t.push(c),
                        Char::Meta('\\') => t.push('\\'),
                        _ => return Ok(Token::Name(t)),
                    }
                    eat_char(stream)?;
                }
            }
            Char::Graphic('/') => {
                // bracketed comment (* 6.4.1 *)
                if let Char::Graphic('*') = peek_char(ctx, stream)? {
                    eat_char(stream)?;
                    c = multiline_comment(ctx, stream)?;
                } else {
                    let mut t = String::from('/');
                    loop {
                        match peek_char(ctx, stream)? {
                            Char::Graphic(c) => t.push(c),
                            Char::Meta('\\') => t.push('\\'),
                            _ => return Ok(Token::Name(t)),
                        }
                        eat_char(stream)?;
                    }
                }
            }
            Char::Graphic(c) => {
                let mut t = c.to_string();
                loop {
                    match peek_char(ctx, stream)? {
                        Char::Graphic(c) => t.push(c),
                        Char::Meta('\\') => t.push('\\'),
                        _ => return Ok(Token::Name(t)),
                    }
                    eat_char(stream)?;
                }
            }

            // backslash is a symbol char and may begin a graphic token
            Char::Meta('\\') => {
                let mut t = String::from('\\');
                loop {
                    match peek_char(ctx, stream)? {
                        Char::Graphic(c) => t.push(c),
                        Char::Meta('\\') => t.push('\\'),
                        _ => return Ok(Token::Name(t)),
                    }
                    eat_char(stream)?;
                }
            }

            // quoted token (* 6.4.2 *)
            Char::Meta('\'') => return Ok(Token::Name(quoted(stream, '\'')?)),

            // semicolon token (* 6.4.2 *)
            Char::Solo(';') => return Ok(Token::Name(String::from(';'))),

            // cut token (* 6.4.2 *)
            Char::Solo('!') => return Ok(Token::Name(String::from('!'))),

            // variable (* 6.4 *)
            Char::Underscore => return Ok(Token::Var(alpha_numeric(ctx, stream, '_')?)),
            Char::CapitalLetter(c) => return Ok(Token::Var(alpha_numeric(ctx, stream, c)?)),

            // integer (* 6.4 *)
            // float number (* 6.4 *)
            Char::Digit('0') => match peek_char(ctx, stream)? {
                Char::Meta('\'') => {
                    eat_char(stream)?;
                    return char_code_literal(stream);
                }
                Char::SmallLetter('b') => {
                    eat_char(stream)?;
                    return integral(stream, '1', 2, "0b");
                }
                Char::SmallLetter('o') => {
                    eat_char(stream)?;
                    return integral(stream, '7', 8, "0o");
                }
                Char::SmallLetter('x') => {
                    eat_char(stream)?;
                    return integral(stream, '9', 16, "0x");
                }
                _ => return numeric(ctx, stream, '0'),
            },
            Char::Digit(c) => return numeric(ctx, stream, c),

            // double quoted list (* 6.4 *)
            Char::Meta('"') => return Ok(Token::Str(quoted(stream, '"')?)),

            // open (* 6.4 *)
            Char::Solo('(') => return Ok(Token::Open),

            // close (* 6.4 *)
            Char::Solo(')') => return Ok(Token::Close),

            // open list (* 6.4 *)
            Char::Solo('[') => return Ok(Token::OpenL),

            // close list (* 6.4 *)
            Char::Solo(']') => return Ok(Token::CloseL),

            // open curly (* 6.4 *)
            Char::Solo('{') => return Ok(Token::OpenC),

            // close curly (* 6.4 *)
            Char::Solo('}') => return Ok(Token::CloseC),

            // ht sep (* 6.4 *)
            Char::Solo('|') => return Ok(Token::Bar),

            // comma (* 6.4 *)
            Char::Solo(',') => return Ok(Token::Comma),

            Char::Solo(c) | Char::Meta(c) | Char::Invalid(c) => {
                return Err(Error::Unexpected(c.to_string()))
            }
        }
    }
}
