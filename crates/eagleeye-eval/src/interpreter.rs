//! Tree-walking interpreter over the closed [`Expr`] grammar.
//!
//! Division by zero yields positive infinity: an unbounded ratio is
//! treated as certainly exceeding any threshold. Modulo by zero has no
//! such reading and is an error.

use std::cmp::Ordering;

use crate::ast::{BinaryOp, BoolOp, Builtin, CmpOp, Expr, UnaryOp};
use crate::error::{ExprError, ExprResult};
use crate::value::Value;

/// Recursion bound for evaluation. Left-deep operator chains are not
/// limited by the parser's nesting bound, so the interpreter has its own.
pub const MAX_EVAL_DEPTH: usize = 256;

/// Evaluate a parsed expression to a value.
pub fn evaluate(expr: &Expr) -> ExprResult<Value> {
    Interpreter::default().eval(expr, 0)
}

/// Numeric value of the left operand when the root is a comparison.
pub fn left_operand_value(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Compare { first, .. } => evaluate(first).ok()?.as_number(),
        _ => None,
    }
}

#[derive(Default)]
struct Interpreter {
    /// Comprehension variables, innermost last.
    scope: Vec<(String, Value)>,
}

impl Interpreter {
    fn eval(&mut self, expr: &Expr, depth: usize) -> ExprResult<Value> {
        if depth > MAX_EVAL_DEPTH {
            return Err(ExprError::TooDeep(MAX_EVAL_DEPTH));
        }
        let depth = depth + 1;

        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::None => Ok(Value::None),
            Expr::List(items) => Ok(Value::List(self.eval_all(items, depth)?)),
            Expr::Tuple(items) => Ok(Value::Tuple(self.eval_all(items, depth)?)),
            Expr::Name(name) => self
                .scope
                .iter()
                .rev()
                .find(|(bound, _)| bound == name)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| ExprError::UnknownName(name.clone())),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, depth)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
                    UnaryOp::Neg => Ok(Value::Number(-value.expect_number("unary '-'")?)),
                    UnaryOp::Pos => Ok(Value::Number(value.expect_number("unary '+'")?)),
                }
            }
            Expr::Binary { op, left, right } => {
                let l = self.eval(left, depth)?;
                let r = self.eval(right, depth)?;
                binary(*op, l, r)
            }
            Expr::Compare { first, rest } => {
                let mut left = self.eval(first, depth)?;
                for (op, operand) in rest {
                    let right = self.eval(operand, depth)?;
                    if !compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::Membership {
                needle,
                haystack,
                negated,
            } => {
                let needle = self.eval(needle, depth)?;
                let haystack = self.eval(haystack, depth)?;
                Ok(Value::Bool(contains(&haystack, &needle)? != *negated))
            }
            Expr::BoolOp { op, operands } => {
                for operand in operands {
                    let truthy = self.eval(operand, depth)?.truthy();
                    match op {
                        BoolOp::And if !truthy => return Ok(Value::Bool(false)),
                        BoolOp::Or if truthy => return Ok(Value::Bool(true)),
                        _ => {}
                    }
                }
                Ok(Value::Bool(matches!(op, BoolOp::And)))
            }
            Expr::Call { func, args } => {
                let args = self.eval_all(args, depth)?;
                call(*func, args)
            }
            Expr::Conditional { test, body, orelse } => {
                if self.eval(test, depth)?.truthy() {
                    self.eval(body, depth)
                } else {
                    self.eval(orelse, depth)
                }
            }
            Expr::Comprehension {
                element,
                var,
                iter,
                filter,
            } => {
                let items = self.eval(iter, depth)?.iter_items("comprehension")?;
                let mut out = Vec::new();
                for item in items {
                    self.scope.push((var.clone(), item));
                    let produced = self.comprehension_step(element, filter.as_deref(), depth);
                    self.scope.pop();
                    if let Some(value) = produced? {
                        out.push(value);
                    }
                }
                Ok(Value::List(out))
            }
        }
    }

    fn comprehension_step(
        &mut self,
        element: &Expr,
        filter: Option<&Expr>,
        depth: usize,
    ) -> ExprResult<Option<Value>> {
        if let Some(filter) = filter {
            if !self.eval(filter, depth)?.truthy() {
                return Ok(None);
            }
        }
        self.eval(element, depth).map(Some)
    }

    fn eval_all(&mut self, items: &[Expr], depth: usize) -> ExprResult<Vec<Value>> {
        items.iter().map(|item| self.eval(item, depth)).collect()
    }
}

// ─── Operators ───────────────────────────────────────────────────────

fn binary(op: BinaryOp, l: Value, r: Value) -> ExprResult<Value> {
    if op == BinaryOp::Add {
        match (&l, &r) {
            (Value::Str(a), Value::Str(b)) => return Ok(Value::Str(format!("{a}{b}"))),
            (Value::List(a), Value::List(b)) => {
                return Ok(Value::List(a.iter().chain(b).cloned().collect()))
            }
            (Value::Tuple(a), Value::Tuple(b)) => {
                return Ok(Value::Tuple(a.iter().chain(b).cloned().collect()))
            }
            _ => {}
        }
    }

    let symbol = match op {
        BinaryOp::Add => "'+'",
        BinaryOp::Sub => "'-'",
        BinaryOp::Mul => "'*'",
        BinaryOp::Div => "'/'",
        BinaryOp::Mod => "'%'",
        BinaryOp::Pow => "'**'",
    };
    let (a, b) = match (l.as_number(), r.as_number()) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(ExprError::Type(format!(
                "unsupported operand types for {symbol}: {} and {}",
                l.type_name(),
                r.type_name()
            )))
        }
    };

    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div if b == 0.0 => f64::INFINITY,
        BinaryOp::Div => a / b,
        BinaryOp::Mod if b == 0.0 => return Err(ExprError::ModuloByZero),
        // Floored modulo: the result takes the sign of the divisor.
        BinaryOp::Mod => a - b * (a / b).floor(),
        BinaryOp::Pow => a.powf(b),
    };
    Ok(Value::Number(result))
}

fn compare(op: CmpOp, l: &Value, r: &Value) -> ExprResult<bool> {
    match op {
        CmpOp::Eq => Ok(l.loosely_equals(r)),
        CmpOp::NotEq => Ok(!l.loosely_equals(r)),
        CmpOp::Is => identical(l, r),
        CmpOp::IsNot => identical(l, r).map(|same| !same),
        CmpOp::Gt | CmpOp::Lt | CmpOp::Ge | CmpOp::Le => {
            let ordering = order(op, l, r)?;
            Ok(match op {
                CmpOp::Gt => ordering == Some(Ordering::Greater),
                CmpOp::Lt => ordering == Some(Ordering::Less),
                CmpOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
                _ => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            })
        }
    }
}

/// `is` is only meaningful against the singletons `None`, `True`, `False`.
fn identical(l: &Value, r: &Value) -> ExprResult<bool> {
    match (l, r) {
        (Value::None, Value::None) => Ok(true),
        (Value::None, _) | (_, Value::None) => Ok(false),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Bool(_), _) | (_, Value::Bool(_)) => Ok(false),
        _ => Err(ExprError::Unsupported(
            "'is' only compares with None, True or False".to_string(),
        )),
    }
}

/// `None` ordering means unordered (NaN), which fails every comparison.
fn order(op: CmpOp, l: &Value, r: &Value) -> ExprResult<Option<Ordering>> {
    if let (Value::Str(a), Value::Str(b)) = (l, r) {
        return Ok(Some(a.cmp(b)));
    }
    match (l.as_number(), r.as_number()) {
        (Some(a), Some(b)) => Ok(a.partial_cmp(&b)),
        _ => Err(ExprError::Type(format!(
            "{op:?} comparison not supported between {} and {}",
            l.type_name(),
            r.type_name()
        ))),
    }
}

fn contains(haystack: &Value, needle: &Value) -> ExprResult<bool> {
    match haystack {
        Value::List(items) | Value::Tuple(items) => {
            Ok(items.iter().any(|item| item.loosely_equals(needle)))
        }
        Value::Str(text) => match needle {
            Value::Str(part) => Ok(text.contains(part.as_str())),
            other => Err(ExprError::Type(format!(
                "'in <str>' requires a str on the left, got {}",
                other.type_name()
            ))),
        },
        other => Err(ExprError::Type(format!(
            "membership test on a {}",
            other.type_name()
        ))),
    }
}

// ─── Builtins ────────────────────────────────────────────────────────

fn call(func: Builtin, args: Vec<Value>) -> ExprResult<Value> {
    let name = func.name();
    match func {
        Builtin::Abs => {
            let [x] = exactly::<1>(name, args)?;
            Ok(Value::Number(x.expect_number("abs()")?.abs()))
        }
        Builtin::Len => {
            let [x] = exactly::<1>(name, args)?;
            match x {
                Value::Str(s) => Ok(Value::Number(s.chars().count() as f64)),
                Value::List(items) | Value::Tuple(items) => Ok(Value::Number(items.len() as f64)),
                other => Err(ExprError::Type(format!(
                    "len() of a {}",
                    other.type_name()
                ))),
            }
        }
        Builtin::Count => {
            let [x] = exactly::<1>(name, args)?;
            let count = match &x {
                Value::List(items) | Value::Tuple(items) => {
                    items.iter().filter(|item| item.truthy()).count()
                }
                scalar => usize::from(scalar.truthy()),
            };
            Ok(Value::Number(count as f64))
        }
        Builtin::Sum => {
            if args.is_empty() || args.len() > 2 {
                return Err(arity(name, "1 or 2", args.len()));
            }
            let mut args = args.into_iter();
            let items = match args.next() {
                Some(iterable) => iterable.iter_items("sum()")?,
                None => Vec::new(),
            };
            let start = match args.next() {
                Some(start) => start.expect_number("sum() start")?,
                None => 0.0,
            };
            let total = items
                .iter()
                .try_fold(start, |acc, item| -> ExprResult<f64> {
                    Ok(acc + item.expect_number("sum()")?)
                })?;
            Ok(Value::Number(total))
        }
        Builtin::Max | Builtin::Min => {
            let items = match args.len() {
                0 => return Err(arity(name, "at least 1", 0)),
                1 => args[0].iter_items(&format!("{name}()"))?,
                _ => args,
            };
            extremum(func, items)
        }
    }
}

fn extremum(func: Builtin, items: Vec<Value>) -> ExprResult<Value> {
    let name = func.name();
    let mut best: Option<Value> = None;
    for item in items {
        best = Some(match best {
            None => item,
            Some(current) => {
                let ordering = order(CmpOp::Gt, &item, &current)?;
                let replace = match func {
                    Builtin::Max => ordering == Some(Ordering::Greater),
                    _ => ordering == Some(Ordering::Less),
                };
                if replace {
                    item
                } else {
                    current
                }
            }
        });
    }
    best.ok_or_else(|| ExprError::Type(format!("{name}() arg is an empty sequence")))
}

fn exactly<const N: usize>(name: &str, args: Vec<Value>) -> ExprResult<[Value; N]> {
    let given = args.len();
    args.try_into()
        .map_err(|_| arity(name, &N.to_string(), given))
}

fn arity(name: &str, expected: &str, given: usize) -> ExprError {
    ExprError::Type(format!(
        "{name}() takes {expected} argument(s), {given} given"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn run(src: &str) -> ExprResult<Value> {
        evaluate(&parse(src).unwrap())
    }

    fn truthy(src: &str) -> bool {
        run(src).unwrap().truthy()
    }

    #[test]
    fn arithmetic() {
        assert_eq!(run("1 + 2 * 3 - 4 / 2").unwrap(), Value::Number(5.0));
        assert_eq!(run("2 ** 10").unwrap(), Value::Number(1024.0));
        assert_eq!(run("-7 % 3").unwrap(), Value::Number(2.0));
        assert_eq!(run("7 % -3").unwrap(), Value::Number(-2.0));
        assert_eq!(run("True + 1").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn division_by_zero_is_positive_infinity() {
        assert_eq!(run("5 / 0").unwrap(), Value::Number(f64::INFINITY));
        assert_eq!(run("-5 / 0").unwrap(), Value::Number(f64::INFINITY));
        assert!(truthy("(1 / (2 - 2)) > 1000000"));
    }

    #[test]
    fn modulo_by_zero_is_an_error() {
        assert_eq!(run("5 % 0"), Err(ExprError::ModuloByZero));
    }

    #[test]
    fn comparisons_and_chains() {
        assert!(truthy("0 < 0.5 <= 1"));
        assert!(!truthy("0 < 2 <= 1"));
        assert!(truthy("'b' > 'a'"));
        assert!(truthy("1 == 1.0 != 2"));
        assert!(!truthy("'1' == 1"));
        assert!(matches!(run("'a' < 1"), Err(ExprError::Type(_))));
    }

    #[test]
    fn identity_against_singletons() {
        assert!(truthy("None is None"));
        assert!(truthy("5 is not None"));
        assert!(!truthy("1 is True"));
        assert!(matches!(run("1 is 1"), Err(ExprError::Unsupported(_))));
    }

    #[test]
    fn membership() {
        assert!(truthy("2 in [1, 2, 3]"));
        assert!(truthy("'x' not in ('a', 'b')"));
        assert!(truthy("'关联' in '关联方交易'"));
        assert!(matches!(run("1 in 'abc'"), Err(ExprError::Type(_))));
        assert!(matches!(run("1 in 5"), Err(ExprError::Type(_))));
    }

    #[test]
    fn boolean_ops_short_circuit() {
        assert!(truthy("True or (1 % 0)"));
        assert!(!truthy("False and (1 % 0)"));
        assert!(truthy("not 0 and [1]"));
    }

    #[test]
    fn conditional() {
        assert_eq!(run("10 if 0 else 20").unwrap(), Value::Number(20.0));
    }

    #[test]
    fn builtins() {
        assert_eq!(run("abs(-3)").unwrap(), Value::Number(3.0));
        assert_eq!(run("max(1, 5, 3)").unwrap(), Value::Number(5.0));
        assert_eq!(run("min([4, 2, 8])").unwrap(), Value::Number(2.0));
        assert_eq!(run("sum([1, 2, 3])").unwrap(), Value::Number(6.0));
        assert_eq!(run("sum([1, 2], 10)").unwrap(), Value::Number(13.0));
        assert_eq!(run("len('营业收入')").unwrap(), Value::Number(4.0));
        assert_eq!(run("len([1, 2])").unwrap(), Value::Number(2.0));
        assert_eq!(run("COUNT([1, 0, 'a', ''])").unwrap(), Value::Number(2.0));
        assert_eq!(run("COUNT(5)").unwrap(), Value::Number(1.0));
        assert!(matches!(run("max([])"), Err(ExprError::Type(_))));
        assert!(matches!(run("abs(1, 2)"), Err(ExprError::Type(_))));
        assert!(matches!(run("len(3)"), Err(ExprError::Type(_))));
    }

    #[test]
    fn comprehension_filters_and_binds() {
        assert_eq!(
            run("sum(1 for __item in [5, -1, -2, 3] if __item < 0)").unwrap(),
            Value::Number(2.0)
        );
        assert_eq!(
            run("sum(__item * 2 for __item in [1, 2, 3])").unwrap(),
            Value::Number(12.0)
        );
    }

    #[test]
    fn unbound_name_is_an_error() {
        assert_eq!(run("x > 1"), Err(ExprError::UnknownName("x".to_string())));
    }

    #[test]
    fn left_operand_of_root_comparison() {
        assert_eq!(left_operand_value(&parse("(10 / 4) > 2").unwrap()), Some(2.5));
        assert_eq!(left_operand_value(&parse("1 > 0 and 2 > 1").unwrap()), None);
        assert_eq!(left_operand_value(&parse("'a' == 'a'").unwrap()), None);
    }

    #[test]
    fn left_deep_chain_is_bounded() {
        let chain = vec!["1"; MAX_EVAL_DEPTH + 8].join("+");
        assert_eq!(run(&chain), Err(ExprError::TooDeep(MAX_EVAL_DEPTH)));
    }
}
