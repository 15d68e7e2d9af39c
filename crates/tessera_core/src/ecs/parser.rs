//! Type expression parser
//!
//! Turns expression text such as `Position, AND | Movable, (ChildOf, scene)`
//! into a stream of symbolic [`Term`]s. Identifiers stay textual here; the
//! world resolves them to ids when a term is collected. The parser owns all
//! syntax diagnostics.

use crate::ecs::{ParseError, Result, Role, WorldError};

/// Name of the implicit subject placeholder.
pub const THIS_NAME: &str = "This";

/// Logical operator applied to a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oper {
    And,
    Or,
    Not,
    Optional,
}

/// Where the matched id is expected to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FromKind {
    Owned,
    Shared,
    Parent,
    Cascade,
    System,
    Nothing,
}

impl FromKind {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "OWNED" => Some(FromKind::Owned),
            "SHARED" => Some(FromKind::Shared),
            "PARENT" => Some(FromKind::Parent),
            "CASCADE" => Some(FromKind::Cascade),
            "SYSTEM" => Some(FromKind::System),
            "NOTHING" => Some(FromKind::Nothing),
            _ => None,
        }
    }
}

/// Entity the term applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// The implicit subject, written either not at all or as `This`.
    This,
    Named(String),
    /// `Pred()`: the term matches nothing.
    Empty,
}

/// One parsed element of an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// Column name (`name:Pred`).
    pub name: Option<String>,
    pub oper: Oper,
    pub from_kind: FromKind,
    pub role: Option<Role>,
    pub pred: String,
    pub subject: Subject,
    /// Pair object, from `(Pred, Obj)` or `Pred(This, Obj)`.
    pub object: Option<String>,
    /// Byte offset of the term in the expression.
    pub column: usize,
}

impl Term {
    fn new(column: usize) -> Self {
        Self {
            name: None,
            oper: Oper::And,
            from_kind: FromKind::Owned,
            role: None,
            pred: String::new(),
            subject: Subject::This,
            object: None,
            column,
        }
    }
}

/// Parse `expr`, invoking `on_term` once per term in order.
///
/// Scanning stops at the first syntax error or at the first error returned
/// by `on_term`, and that error is returned. A blank expression yields no
/// terms.
pub fn parse_expr<F>(name: Option<&str>, expr: &str, mut on_term: F) -> Result<()>
where
    F: FnMut(Term) -> Result<()>,
{
    let mut parser = Parser {
        name,
        expr,
        pos: 0,
    };

    parser.skip_ws();
    if parser.peek().is_none() {
        return Ok(());
    }

    let mut or_chain = false;
    loop {
        let mut term = parser.term()?;
        if or_chain {
            parser.join_or(&mut term)?;
        }

        parser.skip_ws();
        let done = match parser.peek() {
            None => true,
            Some(b',') => {
                parser.pos += 1;
                or_chain = false;
                false
            }
            Some(b'|') if parser.peek_at(1) == Some(b'|') => {
                parser.pos += 2;
                parser.join_or(&mut term)?;
                or_chain = true;
                false
            }
            Some(c) => {
                return Err(parser.error(parser.pos, format!("unexpected character '{}'", c as char)))
            }
        };

        on_term(term)?;
        if done {
            return Ok(());
        }
    }
}

struct Parser<'a> {
    name: Option<&'a str>,
    expr: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    #[inline]
    fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.expr.as_bytes().get(self.pos + offset).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Consume `c` after optional whitespace.
    fn eat(&mut self, c: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// True if the next token is a single `|` (role separator), not `||`.
    fn at_role_separator(&mut self) -> bool {
        self.skip_ws();
        self.peek() == Some(b'|') && self.peek_at(1) != Some(b'|')
    }

    fn error(&self, column: usize, message: impl Into<String>) -> WorldError {
        ParseError::new(self.name, self.expr, column, message).into()
    }

    fn ident(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || matches!(c, b'_' | b'.' | b'*'))
        {
            self.pos += 1;
        }
        let expr: &'a str = self.expr;
        (self.pos > start).then(|| &expr[start..self.pos])
    }

    fn expect_ident(&mut self, what: &str) -> Result<&'a str> {
        match self.ident() {
            Some(ident) => Ok(ident),
            None => Err(self.error(self.pos, format!("expected {}", what))),
        }
    }

    /// Argument list after an opening parenthesis, up to and including `)`.
    fn args(&mut self) -> Result<Vec<&'a str>> {
        let mut args = Vec::new();
        if self.eat(b')') {
            return Ok(args);
        }
        loop {
            args.push(self.expect_ident("argument")?);
            if self.eat(b')') {
                return Ok(args);
            }
            if args.len() == 2 {
                return Err(self.error(self.pos, "expected ')' after second argument"));
            }
            if !self.eat(b',') {
                return Err(self.error(self.pos, "expected ',' or ')'"));
            }
        }
    }

    fn subject_args(&mut self, term: &mut Term) -> Result<()> {
        if !self.eat(b'(') {
            return Ok(());
        }
        let args = self.args()?;
        term.subject = match args.first() {
            None => Subject::Empty,
            Some(&THIS_NAME) => Subject::This,
            Some(subject) => Subject::Named(subject.to_string()),
        };
        term.object = args.get(1).map(|obj| obj.to_string());
        Ok(())
    }

    fn join_or(&self, term: &mut Term) -> Result<()> {
        match term.oper {
            Oper::And | Oper::Or => {
                term.oper = Oper::Or;
                Ok(())
            }
            _ => Err(self.error(term.column, "operator cannot be combined with '||'")),
        }
    }

    fn term(&mut self) -> Result<Term> {
        self.skip_ws();
        let mut term = Term::new(self.pos);

        let mut head = self.ident();
        if let Some(prefix) = head {
            if self.eat(b':') {
                match FromKind::from_keyword(prefix) {
                    Some(kind) => term.from_kind = kind,
                    None => term.name = Some(prefix.to_string()),
                }
                head = None;
            }
        }

        let head = match head {
            Some(head) => head,
            None => {
                self.skip_ws();
                match self.peek() {
                    Some(b'!') => {
                        term.oper = Oper::Not;
                        self.pos += 1;
                    }
                    Some(b'?') => {
                        term.oper = Oper::Optional;
                        self.pos += 1;
                    }
                    _ => {}
                }

                if self.eat(b'(') {
                    let args = self.args()?;
                    let [relation, object] = args.as_slice() else {
                        return Err(self.error(term.column, "expected (relation, object)"));
                    };
                    term.role = Some(Role::Pair);
                    term.pred = relation.to_string();
                    term.object = Some(object.to_string());
                    return Ok(term);
                }

                self.expect_ident("identifier")?
            }
        };

        if self.at_role_separator() {
            self.pos += 1;
            let role = Role::from_keyword(head)
                .ok_or_else(|| self.error(term.column, format!("unknown role '{}'", head)))?;
            term.role = Some(role);
            term.pred = self.expect_ident("identifier after role")?.to_string();
            self.subject_args(&mut term)?;
            return Ok(term);
        }

        if let Some(role) = Role::from_keyword(head) {
            if self.eat(b'(') {
                let args = self.args()?;
                match (role, args.as_slice()) {
                    (_, [pred]) => term.pred = pred.to_string(),
                    (Role::Pair, [relation, object]) => {
                        term.pred = relation.to_string();
                        term.object = Some(object.to_string());
                    }
                    _ => {
                        return Err(self.error(
                            term.column,
                            format!("role '{}' takes a single identifier", head),
                        ))
                    }
                }
                term.role = Some(role);
                return Ok(term);
            }
        }

        term.pred = head.to_string();
        self.subject_args(&mut term)?;
        Ok(term)
    }
}
