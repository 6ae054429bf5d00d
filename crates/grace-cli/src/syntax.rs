//! A small hand-written lexer and recursive-descent parser translating a
//! minimal concrete syntax into the `grace` AST contract. This is
//! deliberately the thinnest front end that can exercise every node kind
//! the evaluator understands -- it is not an attempt at the full Grace
//! surface language, just enough surface syntax for `execute`/`debug` to
//! run a file end to end.

use std::fmt;
use std::rc::Rc;

use grace::{CodeLoc, Node, NodeKind};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    True,
    False,
    Var,
    Const,
    Method,
    If,
    Else,
    While,
    Return,
    Object,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Pipe,
    Comma,
    Semi,
    Dot,
    Assign,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    PlusPlus,
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    Eof,
}

#[derive(Debug, Clone, Copy)]
struct Spanned {
    line: u32,
    column: u32,
}

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub loc: CodeLoc,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.loc.line, self.loc.column, self.message)
    }
}

impl std::error::Error for ParseError {}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let (_, ch) = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn tokenize(mut self) -> Result<Vec<(Token, Spanned)>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let at = Spanned { line: self.line, column: self.column };
            let Some(ch) = self.peek() else {
                tokens.push((Token::Eof, at));
                break;
            };
            let token = match ch {
                '(' => self.single(Token::LParen),
                ')' => self.single(Token::RParen),
                '{' => self.single(Token::LBrace),
                '}' => self.single(Token::RBrace),
                // '||' is the boolean-or operator; a bare '|' delimits a
                // block's parameter list.
                '|' => self.one_or_two('|', Token::Pipe, Token::OrOr),
                ',' => self.single(Token::Comma),
                ';' => self.single(Token::Semi),
                '.' => self.single(Token::Dot),
                '!' => self.one_or_two('=', Token::Bang, Token::NotEq),
                '=' => self.one_or_two('=', Token::Assign, Token::EqEq),
                '<' => self.one_or_two('=', Token::Lt, Token::LtEq),
                '>' => self.one_or_two('=', Token::Gt, Token::GtEq),
                '+' => self.one_or_two('+', Token::Plus, Token::PlusPlus),
                '-' => self.single(Token::Minus),
                '*' => self.single(Token::Star),
                '/' => self.single(Token::Slash),
                '&' => self.expect_pair('&', Token::AndAnd)?,
                '"' => self.string_literal()?,
                c if c.is_ascii_digit() => self.number_literal(),
                c if c.is_alphabetic() || c == '_' => self.ident_or_keyword(),
                other => {
                    return Err(ParseError {
                        message: format!("unexpected character '{other}'"),
                        loc: CodeLoc { line: at.line, column: at.column },
                    })
                }
            };
            tokens.push((token, at));
        }
        Ok(tokens)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn single(&mut self, token: Token) -> Token {
        self.bump();
        token
    }

    fn one_or_two(&mut self, second: char, one: Token, two: Token) -> Token {
        self.bump();
        if self.peek() == Some(second) {
            self.bump();
            two
        } else {
            one
        }
    }

    fn expect_pair(&mut self, c: char, token: Token) -> Result<Token, ParseError> {
        let at = Spanned { line: self.line, column: self.column };
        self.bump();
        if self.peek() == Some(c) {
            self.bump();
            Ok(token)
        } else {
            Err(ParseError {
                message: format!("expected '{c}{c}'"),
                loc: CodeLoc { line: at.line, column: at.column },
            })
        }
    }

    fn string_literal(&mut self) -> Result<Token, ParseError> {
        let at = Spanned { line: self.line, column: self.column };
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c) => text.push(c),
                    None => {
                        return Err(ParseError {
                            message: "unterminated string".to_owned(),
                            loc: CodeLoc { line: at.line, column: at.column },
                        })
                    }
                },
                Some(c) => text.push(c),
                None => {
                    return Err(ParseError {
                        message: "unterminated string".to_owned(),
                        loc: CodeLoc { line: at.line, column: at.column },
                    })
                }
            }
        }
        Ok(Token::Str(text))
    }

    fn number_literal(&mut self) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Token::Number(text.parse().unwrap_or(0.0))
    }

    fn ident_or_keyword(&mut self) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match text.as_str() {
            "true" => Token::True,
            "false" => Token::False,
            "var" => Token::Var,
            "const" => Token::Const,
            "method" => Token::Method,
            "if" => Token::If,
            "else" => Token::Else,
            "while" => Token::While,
            "return" => Token::Return,
            "object" => Token::Object,
            _ => Token::Ident(text),
        }
    }
}

/// Parses `source` into a sequence of top-level statements, the AST
/// contract `Evaluator::evaluate_ast`/`evaluate_sandbox` consumes.
pub fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    let body = parser.statements_until_eof()?;
    Ok(body)
}

struct Parser {
    tokens: Vec<(Token, Spanned)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    fn loc(&self) -> CodeLoc {
        let at = self.tokens[self.pos].1;
        CodeLoc { line: at.line, column: at.column }
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].0.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseError> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError {
                message: format!("expected {expected:?}, found {:?}", self.peek()),
                loc: self.loc(),
            })
        }
    }

    fn expect_ident(&mut self) -> Result<Rc<str>, ParseError> {
        match self.advance() {
            Token::Ident(name) => Ok(Rc::from(name.as_str())),
            other => Err(ParseError {
                message: format!("expected identifier, found {other:?}"),
                loc: self.loc(),
            }),
        }
    }

    fn statements_until_eof(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut statements = Vec::new();
        while self.peek() != &Token::Eof {
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    fn statements_until_rbrace(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut statements = Vec::new();
        while self.peek() != &Token::RBrace {
            statements.push(self.statement()?);
        }
        self.expect(&Token::RBrace)?;
        Ok(statements)
    }

    fn statement(&mut self) -> Result<Node, ParseError> {
        let loc = self.loc();
        match self.peek() {
            Token::Var => self.var_decl(loc),
            Token::Const => self.const_decl(loc),
            Token::Method => self.method_decl(loc),
            Token::If => self.if_stmt(loc),
            Token::While => self.while_stmt(loc),
            Token::Return => self.return_stmt(loc),
            _ => self.assignment_or_expr_stmt(loc),
        }
    }

    fn var_decl(&mut self, loc: CodeLoc) -> Result<Node, ParseError> {
        self.advance();
        let name = self.expect_ident()?;
        let init = if self.peek() == &Token::Assign {
            self.advance();
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        self.expect(&Token::Semi)?;
        Ok(Node::at(NodeKind::VariableDeclaration { name, init }, loc))
    }

    fn const_decl(&mut self, loc: CodeLoc) -> Result<Node, ParseError> {
        self.advance();
        let name = self.expect_ident()?;
        self.expect(&Token::Assign)?;
        let init = Box::new(self.expression()?);
        self.expect(&Token::Semi)?;
        Ok(Node::at(NodeKind::ConstantDeclaration { name, init }, loc))
    }

    fn method_decl(&mut self, loc: CodeLoc) -> Result<Node, ParseError> {
        self.advance();
        let name = self.expect_ident()?;
        self.expect(&Token::LParen)?;
        let params = self.param_list()?;
        self.expect(&Token::RParen)?;
        self.expect(&Token::LBrace)?;
        let body = self.statements_until_rbrace()?;
        let selector = selector_for(&name, params.len());
        Ok(Node::at(
            NodeKind::MethodDeclaration { selector: Rc::from(selector.as_str()), params: Rc::from(params), body: Rc::from(body) },
            loc,
        ))
    }

    fn param_list(&mut self) -> Result<Vec<Rc<str>>, ParseError> {
        let mut params = Vec::new();
        if self.peek() == &Token::RParen {
            return Ok(params);
        }
        params.push(self.expect_ident()?);
        while self.peek() == &Token::Comma {
            self.advance();
            params.push(self.expect_ident()?);
        }
        Ok(params)
    }

    fn if_stmt(&mut self, loc: CodeLoc) -> Result<Node, ParseError> {
        self.advance();
        self.expect(&Token::LParen)?;
        let cond = Box::new(self.expression()?);
        self.expect(&Token::RParen)?;
        self.expect(&Token::LBrace)?;
        let then_body = Rc::from(self.statements_until_rbrace()?);
        if self.peek() == &Token::Else {
            self.advance();
            self.expect(&Token::LBrace)?;
            let else_body = Rc::from(self.statements_until_rbrace()?);
            Ok(Node::at(NodeKind::IfThenElse { cond, then_body, else_body }, loc))
        } else {
            Ok(Node::at(NodeKind::IfThen { cond, then_body }, loc))
        }
    }

    fn while_stmt(&mut self, loc: CodeLoc) -> Result<Node, ParseError> {
        self.advance();
        self.expect(&Token::LParen)?;
        let cond = Box::new(self.expression()?);
        self.expect(&Token::RParen)?;
        self.expect(&Token::LBrace)?;
        let body = Rc::from(self.statements_until_rbrace()?);
        Ok(Node::at(NodeKind::While { cond, body }, loc))
    }

    fn return_stmt(&mut self, loc: CodeLoc) -> Result<Node, ParseError> {
        self.advance();
        let expr = if self.peek() == &Token::Semi { None } else { Some(Box::new(self.expression()?)) };
        self.expect(&Token::Semi)?;
        Ok(Node::at(NodeKind::Return(expr), loc))
    }

    fn assignment_or_expr_stmt(&mut self, loc: CodeLoc) -> Result<Node, ParseError> {
        if let Token::Ident(name) = self.peek().clone() {
            if self.tokens.get(self.pos + 1).map(|(t, _)| t) == Some(&Token::Assign) {
                self.advance();
                self.advance();
                let value = Box::new(self.expression()?);
                self.expect(&Token::Semi)?;
                return Ok(Node::at(NodeKind::Assignment { name: Rc::from(name.as_str()), value }, loc));
            }
        }
        let expr = self.expression()?;
        self.expect(&Token::Semi)?;
        Ok(expr)
    }

    fn expression(&mut self) -> Result<Node, ParseError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Node, ParseError> {
        self.left_assoc_binary(&[("||", Token::OrOr)], Self::and_expr)
    }

    fn and_expr(&mut self) -> Result<Node, ParseError> {
        self.left_assoc_binary(&[("&&", Token::AndAnd)], Self::equality_expr)
    }

    fn equality_expr(&mut self) -> Result<Node, ParseError> {
        self.left_assoc_binary(&[("==", Token::EqEq), ("!=", Token::NotEq)], Self::comparison_expr)
    }

    fn comparison_expr(&mut self) -> Result<Node, ParseError> {
        self.left_assoc_binary(
            &[("<", Token::Lt), ("<=", Token::LtEq), (">", Token::Gt), (">=", Token::GtEq)],
            Self::concat_expr,
        )
    }

    fn concat_expr(&mut self) -> Result<Node, ParseError> {
        self.left_assoc_binary(&[("++", Token::PlusPlus)], Self::additive_expr)
    }

    fn additive_expr(&mut self) -> Result<Node, ParseError> {
        self.left_assoc_binary(&[("+", Token::Plus), ("-", Token::Minus)], Self::multiplicative_expr)
    }

    fn multiplicative_expr(&mut self) -> Result<Node, ParseError> {
        self.left_assoc_binary(&[("*", Token::Star), ("/", Token::Slash)], Self::unary_expr)
    }

    fn left_assoc_binary(
        &mut self,
        ops: &[(&str, Token)],
        mut next: impl FnMut(&mut Self) -> Result<Node, ParseError>,
    ) -> Result<Node, ParseError> {
        let mut left = next(self)?;
        loop {
            let matched = ops.iter().find(|(_, tok)| self.peek() == tok);
            let Some((text, _)) = matched else { break };
            let loc = self.loc();
            let selector: Rc<str> = Rc::from(format!("{text}(_)").as_str());
            self.advance();
            let right = next(self)?;
            left = Node::at(
                NodeKind::ExplicitRequest { selector, receiver: Box::new(left), args: vec![right] },
                loc,
            );
        }
        Ok(left)
    }

    fn unary_expr(&mut self) -> Result<Node, ParseError> {
        let loc = self.loc();
        match self.peek() {
            Token::Bang => {
                self.advance();
                let operand = self.unary_expr()?;
                Ok(Node::at(
                    NodeKind::ExplicitRequest { selector: Rc::from("prefix!"), receiver: Box::new(operand), args: vec![] },
                    loc,
                ))
            }
            Token::Minus => {
                self.advance();
                let operand = self.unary_expr()?;
                Ok(Node::at(
                    NodeKind::ExplicitRequest { selector: Rc::from("prefix-"), receiver: Box::new(operand), args: vec![] },
                    loc,
                ))
            }
            _ => self.postfix_expr(),
        }
    }

    fn postfix_expr(&mut self) -> Result<Node, ParseError> {
        let mut node = self.primary_expr()?;
        loop {
            if self.peek() != &Token::Dot {
                break;
            }
            let loc = self.loc();
            self.advance();
            let name = self.expect_ident()?;
            let args = if self.peek() == &Token::LParen {
                self.advance();
                let args = self.arg_list()?;
                self.expect(&Token::RParen)?;
                args
            } else {
                Vec::new()
            };
            let selector: Rc<str> = Rc::from(selector_for(&name, args.len()).as_str());
            node = Node::at(NodeKind::ExplicitRequest { selector, receiver: Box::new(node), args }, loc);
        }
        Ok(node)
    }

    fn arg_list(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut args = Vec::new();
        if self.peek() == &Token::RParen {
            return Ok(args);
        }
        args.push(self.expression()?);
        while self.peek() == &Token::Comma {
            self.advance();
            args.push(self.expression()?);
        }
        Ok(args)
    }

    fn primary_expr(&mut self) -> Result<Node, ParseError> {
        let loc = self.loc();
        match self.advance() {
            Token::True => Ok(Node::at(NodeKind::BooleanLiteral(true), loc)),
            Token::False => Ok(Node::at(NodeKind::BooleanLiteral(false), loc)),
            Token::Number(n) => Ok(Node::at(NodeKind::NumberLiteral(n), loc)),
            Token::Str(s) => Ok(Node::at(NodeKind::StringLiteral(Rc::from(s.as_str())), loc)),
            Token::Object => {
                self.expect(&Token::LBrace)?;
                let body = Rc::from(self.statements_until_rbrace()?);
                Ok(Node::at(NodeKind::ObjectConstructor { body }, loc))
            }
            Token::LBrace => self.block_literal(loc),
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if self.peek() == &Token::LParen {
                    self.advance();
                    let args = self.arg_list()?;
                    self.expect(&Token::RParen)?;
                    let selector: Rc<str> = Rc::from(selector_for(&name, args.len()).as_str());
                    Ok(Node::at(NodeKind::ImplicitRequest { selector, args }, loc))
                } else {
                    Ok(Node::at(NodeKind::VariableReference(Rc::from(name.as_str())), loc))
                }
            }
            other => Err(ParseError {
                message: format!("unexpected token {other:?}"),
                loc,
            }),
        }
    }

    fn block_literal(&mut self, loc: CodeLoc) -> Result<Node, ParseError> {
        let params = if self.peek() == &Token::Pipe {
            self.advance();
            let params = self.param_list()?;
            self.expect(&Token::Pipe)?;
            params
        } else {
            Vec::new()
        };
        let body = self.statements_until_rbrace()?;
        Ok(Node::at(NodeKind::Block { params: Rc::from(params), body: Rc::from(body) }, loc))
    }
}

/// Builds a selector from a bare method/call name and its argument count,
/// matching the `name(_,_,...)` convention `selector_arity` expects.
fn selector_for(name: &str, arity: usize) -> String {
    if arity == 0 {
        name.to_owned()
    } else {
        format!("{name}({})", vec!["_"; arity].join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literal_statement() {
        let ast = parse("true;").unwrap();
        assert_eq!(ast.len(), 1);
        assert!(matches!(ast[0].kind, NodeKind::BooleanLiteral(true)));
    }

    #[test]
    fn parses_var_decl_and_reference() {
        let ast = parse("var x = 1; x;").unwrap();
        assert_eq!(ast.len(), 2);
        assert!(matches!(ast[0].kind, NodeKind::VariableDeclaration { .. }));
        assert!(matches!(ast[1].kind, NodeKind::VariableReference(_)));
    }

    #[test]
    fn parses_assignment() {
        let ast = parse("var x = 1; x = 2;").unwrap();
        assert!(matches!(ast[1].kind, NodeKind::Assignment { .. }));
    }

    #[test]
    fn parses_binary_operator_as_explicit_request() {
        let ast = parse("true && false;").unwrap();
        match &ast[0].kind {
            NodeKind::ExplicitRequest { selector, args, .. } => {
                assert_eq!(&**selector, "&&(_)");
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected ExplicitRequest, got {other:?}"),
        }
    }

    #[test]
    fn parses_method_declaration_with_two_params() {
        let ast = parse("method add(a, b) { return a; }").unwrap();
        match &ast[0].kind {
            NodeKind::MethodDeclaration { selector, params, .. } => {
                assert_eq!(&**selector, "add(_,_)");
                assert_eq!(params.len(), 2);
            }
            other => panic!("expected MethodDeclaration, got {other:?}"),
        }
    }

    #[test]
    fn parses_object_constructor_and_if_while() {
        let ast = parse(
            r#"
            var o = object {
                var n = 0;
                method bump() { n = n + 1; }
            };
            if (true) { o.bump(); } else { o.bump(); }
            while (false) { o.bump(); }
            "#,
        )
        .unwrap();
        assert_eq!(ast.len(), 3);
    }

    #[test]
    fn parses_block_literal_with_params() {
        let ast = parse("{ |x| x; };").unwrap();
        match &ast[0].kind {
            NodeKind::Block { params, .. } => assert_eq!(params.len(), 1),
            other => panic!("expected Block, got {other:?}"),
        }
    }
}
