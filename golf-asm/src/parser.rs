//! Turns the textual remainder of a line into an [`Expr`] tree. The grammar
//! itself ([`golf.pest`](../golf.pest)) only describes shape; this module
//! walks the resulting parse tree and folds each precedence level's
//! repetition into a left-associative binary chain.

use crate::error::SyntaxError;
use crate::expr::{BinOp, Expr, UnaryOp};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "golf.pest"]
pub struct GolfParser;

pub fn parse_expr(input: &str) -> Result<Expr, SyntaxError> {
    let mut pairs = GolfParser::parse(Rule::expr_line, input)
        .map_err(|e| SyntaxError::Grammar(e.to_string()))?;
    let expr_line = pairs.next().unwrap();
    let expr_pair = expr_line.into_inner().next().unwrap();
    Ok(build_expr(expr_pair))
}

/// Parses a comma-separated operand list; an empty remainder yields an
/// empty list (instructions like `halt` with a literal `0` still carry one
/// operand, but `ret` with no registers legitimately parses to zero).
pub fn parse_operand_list(input: &str) -> Result<Vec<Expr>, SyntaxError> {
    let mut pairs = GolfParser::parse(Rule::operand_line, input)
        .map_err(|e| SyntaxError::Grammar(e.to_string()))?;
    let operand_line = pairs.next().unwrap();
    match operand_line.into_inner().next() {
        Some(list) if list.as_rule() == Rule::operand_list => {
            Ok(list.into_inner().map(build_expr).collect())
        }
        _ => Ok(Vec::new()),
    }
}

fn build_expr(pair: Pair<Rule>) -> Expr {
    match pair.as_rule() {
        Rule::expr | Rule::or_expr => build_binary_chain(pair),
        Rule::xor_expr | Rule::and_expr | Rule::shift_expr | Rule::add_expr | Rule::mul_expr => {
            build_binary_chain(pair)
        }
        Rule::unary => build_unary(pair),
        Rule::power => build_power(pair),
        Rule::integer => Expr::Int(parse_integer(pair.as_str())),
        Rule::float_lit => Expr::Float(pair.as_str().parse().expect("grammar guarantees a float")),
        Rule::string_lit => Expr::Str(unescape(inner_str(pair))),
        Rule::bytes_lit => Expr::Bytes(unescape(inner_str(pair)).into_bytes()),
        Rule::path => Expr::Name(pair.as_str().split('.').map(str::to_owned).collect()),
        Rule::ident => Expr::Name(vec![pair.as_str().to_owned()]),
        Rule::call => build_call(pair),
        Rule::tuple_lit => Expr::Tuple(pair.into_inner().map(build_expr).collect()),
        Rule::paren_expr => build_expr(pair.into_inner().next().unwrap()),
        other => unreachable!("unexpected rule in expression tree: {:?}", other),
    }
}

fn inner_str(pair: Pair<Rule>) -> String {
    pair.into_inner().next().unwrap().as_str().to_owned()
}

/// Resolves `\\`, `\"` and `\n`/`\t` escapes; anything else passes through
/// literally, matching the host tokenizer's lenient string literals.
fn unescape(raw: String) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn parse_integer(s: &str) -> i128 {
    if let Some(hex) = s.strip_prefix("0x") {
        i128::from_str_radix(hex, 16).expect("grammar guarantees valid hex digits")
    } else if let Some(bin) = s.strip_prefix("0b") {
        i128::from_str_radix(bin, 2).expect("grammar guarantees valid binary digits")
    } else {
        s.parse().expect("grammar guarantees valid decimal digits")
    }
}

/// Folds a `head ~ (op ~ head)*` repetition into a left-associative binary
/// tree; rules with no operator children (like `or_expr` with a single
/// `xor_expr`) just pass their one child through.
fn build_binary_chain(pair: Pair<Rule>) -> Expr {
    let mut inner = pair.into_inner();
    let mut lhs = build_expr(inner.next().unwrap());
    let mut pending = inner.peekable();
    while let Some(op_pair) = pending.next() {
        let op = bin_op(op_pair.as_str());
        let rhs_pair = pending.next().expect("operator without a right-hand operand");
        let rhs = build_expr(rhs_pair);
        lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
    }
    lhs
}

fn bin_op(s: &str) -> BinOp {
    match s {
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "*" => BinOp::Mul,
        "/" => BinOp::Div,
        "//" => BinOp::FloorDiv,
        "%" => BinOp::Mod,
        "<<" => BinOp::Shl,
        ">>" => BinOp::Shr,
        "&" => BinOp::BitAnd,
        "^" => BinOp::BitXor,
        "|" => BinOp::BitOr,
        other => unreachable!("unknown binary operator {:?}", other),
    }
}

fn build_unary(pair: Pair<Rule>) -> Expr {
    let mut inner = pair.into_inner();
    let mut ops = Vec::new();
    let mut next = inner.next().unwrap();
    while next.as_rule() == Rule::unary_op {
        ops.push(match next.as_str() {
            "-" => UnaryOp::Neg,
            "~" => UnaryOp::Not,
            "+" => UnaryOp::Plus,
            other => unreachable!("unknown unary operator {:?}", other),
        });
        next = inner.next().unwrap();
    }
    let mut expr = build_expr(next);
    for op in ops.into_iter().rev() {
        expr = Expr::Unary(op, Box::new(expr));
    }
    expr
}

fn build_power(pair: Pair<Rule>) -> Expr {
    let mut inner = pair.into_inner();
    let base = build_expr(inner.next().unwrap());
    match inner.next() {
        Some(exp_pair) => Expr::Binary(BinOp::Pow, Box::new(base), Box::new(build_expr(exp_pair))),
        None => base,
    }
}

fn build_call(pair: Pair<Rule>) -> Expr {
    let mut inner = pair.into_inner();
    let callee = inner
        .next()
        .unwrap()
        .as_str()
        .split('.')
        .map(str::to_owned)
        .collect();
    let args = inner.map(build_expr).collect();
    Expr::Call(callee, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_hex_and_binary_literals() {
        assert_eq!(parse_expr("42").unwrap(), Expr::Int(42));
        assert_eq!(parse_expr("0xFF").unwrap(), Expr::Int(255));
        assert_eq!(parse_expr("0b101").unwrap(), Expr::Int(5));
    }

    #[test]
    fn honors_standard_precedence() {
        // 1 + 2 * 3 == 1 + (2 * 3), not (1 + 2) * 3
        let expr = parse_expr("1 + 2 * 3").unwrap();
        match expr {
            Expr::Binary(BinOp::Add, lhs, rhs) => {
                assert_eq!(*lhs, Expr::Int(1));
                assert_eq!(*rhs, Expr::Binary(BinOp::Mul, Box::new(Expr::Int(2)), Box::new(Expr::Int(3))));
            }
            other => panic!("expected an addition at the root, got {:?}", other),
        }
    }

    #[test]
    fn parses_negative_numbers() {
        assert_eq!(
            parse_expr("-5").unwrap(),
            Expr::Unary(UnaryOp::Neg, Box::new(Expr::Int(5)))
        );
    }

    #[test]
    fn parses_dotted_calls() {
        let expr = parse_expr("math.sqrt(4)").unwrap();
        match expr {
            Expr::Call(path, args) => {
                assert_eq!(path, vec!["math".to_owned(), "sqrt".to_owned()]);
                assert_eq!(args, vec![Expr::Int(4)]);
            }
            other => panic!("expected a call, got {:?}", other),
        }
    }

    #[test]
    fn parses_data_string_literal() {
        let expr = parse_expr(r#"data("hi")"#).unwrap();
        assert_eq!(expr, Expr::Call(vec!["data".to_owned()], vec![Expr::Str("hi".to_owned())]));
    }

    #[test]
    fn parses_operand_lists() {
        let operands = parse_operand_list("a, b, 7").unwrap();
        assert_eq!(operands.len(), 3);
    }

    #[test]
    fn empty_operand_list_parses_to_no_operands() {
        assert_eq!(parse_operand_list("").unwrap(), Vec::new());
    }
}
