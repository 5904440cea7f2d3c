use crate::ast::{EdgePattern, Expr, Literal, NodePattern, Op, Pattern, Projection, ProjectedField, Query};
use crate::lexer::{lex, Spanned, Token};
use panflow_model::{PanflowError, Result};

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

pub(crate) fn parse(input: &str) -> Result<Query> {
    let tokens = lex(input).map_err(|(position, message)| PanflowError::QuerySyntax { position, message })?;
    let mut parser = Parser { tokens, pos: 0 };
    let query = parser.parse_query()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(query)
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map(|s| s.position).unwrap_or_else(|| self.tokens.last().map(|s| s.position + 1).unwrap_or(0))
    }

    fn error(&self, message: &str) -> PanflowError {
        PanflowError::QuerySyntax { position: self.position(), message: message.to_string() }
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|s| s.token.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(id)) if id.eq_ignore_ascii_case(word))
    }

    fn expect_keyword(&mut self, word: &str) -> Result<()> {
        if self.keyword(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", word.to_uppercase())))
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.peek() == Some(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("expected {:?}", token)))
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.advance() {
            Some(Token::Ident(id)) => Ok(id),
            _ => Err(self.error("expected an identifier")),
        }
    }

    fn parse_query(&mut self) -> Result<Query> {
        self.expect_keyword("match")?;
        let mut patterns = vec![self.parse_pattern()?];
        while self.peek() == Some(&Token::Comma) {
            self.advance();
            patterns.push(self.parse_pattern()?);
        }
        let where_clause = if self.keyword("where") {
            self.advance();
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect_keyword("return")?;
        let projection = self.parse_projection()?;
        let limit = if self.keyword("limit") {
            self.advance();
            match self.advance() {
                Some(Token::Num(n)) if n >= 0.0 => Some(n as usize),
                _ => return Err(self.error("LIMIT requires a non-negative number")),
            }
        } else {
            None
        };
        Ok(Query { patterns, where_clause, projection, limit })
    }

    fn parse_pattern(&mut self) -> Result<Pattern> {
        let mut nodes = vec![self.parse_node_pattern()?];
        let mut edges = Vec::new();
        while self.peek() == Some(&Token::Dash) {
            edges.push(self.parse_edge_pattern()?);
            nodes.push(self.parse_node_pattern()?);
        }
        Ok(Pattern { nodes, edges })
    }

    fn parse_node_pattern(&mut self) -> Result<NodePattern> {
        self.expect(&Token::LParen)?;
        let var = self.expect_ident()?;
        let kind = if self.peek() == Some(&Token::Colon) {
            self.advance();
            Some(self.expect_ident()?)
        } else {
            None
        };
        self.expect(&Token::RParen)?;
        Ok(NodePattern { var, kind })
    }

    fn parse_edge_pattern(&mut self) -> Result<EdgePattern> {
        self.expect(&Token::Dash)?;
        self.expect(&Token::LBracket)?;
        self.expect(&Token::Colon)?;
        let mut relations = vec![self.expect_ident()?];
        while self.peek() == Some(&Token::Pipe) {
            self.advance();
            relations.push(self.expect_ident()?);
        }
        self.expect(&Token::RBracket)?;
        self.expect(&Token::Arrow)?;
        Ok(EdgePattern { relations })
    }

    fn parse_projection(&mut self) -> Result<Projection> {
        let distinct = if self.keyword("distinct") {
            self.advance();
            true
        } else {
            false
        };
        let mut fields = vec![self.parse_projected_field()?];
        while self.peek() == Some(&Token::Comma) {
            self.advance();
            fields.push(self.parse_projected_field()?);
        }
        Ok(Projection { distinct, fields })
    }

    fn parse_projected_field(&mut self) -> Result<ProjectedField> {
        if self.keyword("collect") {
            self.advance();
            self.expect(&Token::LParen)?;
            let (var, field) = self.parse_var_field()?;
            self.expect(&Token::RParen)?;
            return Ok(ProjectedField::Collect { var, field });
        }
        let (var, field) = self.parse_var_field()?;
        Ok(ProjectedField::Field { var, field })
    }

    fn parse_var_field(&mut self) -> Result<(String, String)> {
        let var = self.expect_ident()?;
        self.expect(&Token::Dot)?;
        let field = self.expect_ident()?;
        Ok((var, field))
    }

    // expr := or_expr
    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_and()?;
        while self.keyword("or") {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        while self.keyword("and") {
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.keyword("not") {
            self.advance();
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        if self.peek() == Some(&Token::LParen) {
            self.advance();
            let expr = self.parse_expr()?;
            self.expect(&Token::RParen)?;
            return Ok(expr);
        }
        if self.keyword("exists") {
            self.advance();
            self.expect(&Token::LParen)?;
            let (var, field) = self.parse_var_field()?;
            self.expect(&Token::RParen)?;
            return Ok(Expr::Exists { var, field });
        }
        let (var, field) = self.parse_var_field()?;
        let op = self.parse_operator()?;
        let literal = self.parse_literal()?;
        Ok(Expr::Comparison { var, field, op, literal })
    }

    fn parse_operator(&mut self) -> Result<Op> {
        if self.keyword("contains") {
            self.advance();
            return Ok(Op::Contains);
        }
        if self.keyword("starts") {
            self.advance();
            self.expect_keyword("with")?;
            return Ok(Op::StartsWith);
        }
        if self.keyword("ends") {
            self.advance();
            self.expect_keyword("with")?;
            return Ok(Op::EndsWith);
        }
        match self.advance() {
            Some(Token::Eq) => Ok(Op::Eq),
            Some(Token::Ne) => Ok(Op::Ne),
            Some(Token::RegexOp) => Ok(Op::Regex),
            Some(Token::Lt) => Ok(Op::Lt),
            Some(Token::Gt) => Ok(Op::Gt),
            Some(Token::Le) => Ok(Op::Le),
            Some(Token::Ge) => Ok(Op::Ge),
            _ => Err(self.error("expected a comparison operator")),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        match self.advance() {
            Some(Token::Str(s)) => Ok(Literal::Str(s)),
            Some(Token::Num(n)) => Ok(Literal::Num(n)),
            Some(Token::Ident(id)) if id.eq_ignore_ascii_case("true") => Ok(Literal::Bool(true)),
            Some(Token::Ident(id)) if id.eq_ignore_ascii_case("false") => Ok(Literal::Bool(false)),
            _ => Err(self.error("expected a string, number, or boolean literal")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_match_return() {
        let q = parse("MATCH (a:address) RETURN a.name").unwrap();
        assert_eq!(q.patterns.len(), 1);
        assert_eq!(q.patterns[0].nodes[0].kind.as_deref(), Some("address"));
        assert!(q.where_clause.is_none());
        assert!(q.limit.is_none());
    }

    #[test]
    fn parses_chained_pattern_with_where_and_limit() {
        let q = parse("MATCH (a:address-group)-[:contains]->(b:address) WHERE b.value == '10.0.0.5/32' RETURN DISTINCT a.name LIMIT 5").unwrap();
        assert_eq!(q.patterns[0].nodes.len(), 2);
        assert_eq!(q.patterns[0].edges[0].relations, vec!["contains".to_string()]);
        assert!(q.where_clause.is_some());
        assert!(q.projection.distinct);
        assert_eq!(q.limit, Some(5));
    }

    #[test]
    fn parses_collect_projection_and_boolean_operators() {
        let q = parse("MATCH (a:security-rule) WHERE a.name STARTS WITH 'allow' AND NOT a.context == 'shared' RETURN COLLECT(a.name)").unwrap();
        assert!(matches!(q.projection.fields[0], ProjectedField::Collect { .. }));
        assert!(matches!(q.where_clause, Some(Expr::And(_, _))));
    }

    #[test]
    fn rejects_malformed_query() {
        let err = parse("MATCH (a RETURN a.name").unwrap_err();
        assert!(matches!(err, PanflowError::QuerySyntax { .. }));
    }
}
