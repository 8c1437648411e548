use std::fmt::{self, Display};
use std::future::ready;
use std::iter::Peekable;
use std::str::CharIndices;

use recall_agent_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

const MAX_DEPTH: usize = 128;

#[derive(Deserialize, JsonSchema)]
pub struct CalculatorParameters {
    #[schemars(description = "Arithmetic expression, e.g. (2 + 3) * 4.")]
    expression: String,
}

/// A tool for evaluating arithmetic expressions.
///
/// Only numbers, `+ - * /`, unary minus and parentheses are understood.
pub struct CalculatorTool {
    parameter_schema: Value,
}

impl CalculatorTool {
    /// Creates a new calculator tool.
    #[inline]
    pub fn new() -> Self {
        CalculatorTool {
            parameter_schema: schema_for!(CalculatorParameters).to_value(),
        }
    }
}

impl Default for CalculatorTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for CalculatorTool {
    type Input = CalculatorParameters;

    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Perform basic mathematical calculations"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: CalculatorParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let result = evaluate(&input.expression)
            .map(format_number)
            .map_err(|err| {
                ToolError::execution_error()
                    .with_reason(format!("Error calculating: {err}"))
            });
        ready(result)
    }
}

/// Why an expression could not be evaluated.
#[derive(Clone, Debug, PartialEq)]
pub enum EvalError {
    /// The expression ended where an operand was expected.
    UnexpectedEnd,
    /// A character that doesn't fit the grammar at this position.
    UnexpectedChar(char, usize),
    /// A malformed number literal.
    InvalidNumber(String),
    /// A division whose divisor evaluated to zero.
    DivisionByZero,
    /// Parentheses or unary minus nested deeper than the parser allows.
    TooDeep,
}

impl Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnexpectedEnd => write!(f, "unexpected end of expression"),
            EvalError::UnexpectedChar(ch, pos) => {
                write!(f, "unexpected character `{ch}` at position {pos}")
            }
            EvalError::InvalidNumber(literal) => {
                write!(f, "invalid number `{literal}`")
            }
            EvalError::DivisionByZero => write!(f, "division by zero"),
            EvalError::TooDeep => {
                write!(f, "expression nested deeper than {MAX_DEPTH} levels")
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// Evaluates an arithmetic expression.
///
/// ```text
/// expr   := term (('+' | '-') term)*
/// term   := factor (('*' | '/') factor)*
/// factor := '-' factor | number | '(' expr ')'
/// ```
///
/// Factors nest at most [`MAX_DEPTH`] levels deep.
pub fn evaluate(expression: &str) -> Result<f64, EvalError> {
    let mut parser = Parser {
        src: expression,
        chars: expression.char_indices().peekable(),
        depth: 0,
    };
    let value = parser.expr()?;
    parser.skip_whitespace();
    match parser.chars.next() {
        Some((pos, ch)) => Err(EvalError::UnexpectedChar(ch, pos)),
        None => Ok(value),
    }
}

struct Parser<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, ch)| ch.is_whitespace()).is_some() {}
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.peek().map(|&(_, ch)| ch)
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some('+') => {
                    self.chars.next();
                    value += self.term()?;
                }
                Some('-') => {
                    self.chars.next();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.factor()?;
        loop {
            match self.peek() {
                Some('*') => {
                    self.chars.next();
                    value *= self.factor()?;
                }
                Some('/') => {
                    self.chars.next();
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn factor(&mut self) -> Result<f64, EvalError> {
        if self.depth == MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        self.depth += 1;
        let value = self.operand();
        self.depth -= 1;
        value
    }

    fn operand(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            None => Err(EvalError::UnexpectedEnd),
            Some('-') => {
                self.chars.next();
                Ok(-self.factor()?)
            }
            Some('(') => {
                self.chars.next();
                let value = self.expr()?;
                match self.peek() {
                    Some(')') => {
                        self.chars.next();
                        Ok(value)
                    }
                    Some(ch) => Err(EvalError::UnexpectedChar(ch, self.offset())),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            Some(ch) if ch.is_ascii_digit() || ch == '.' => self.number(),
            Some(ch) => Err(EvalError::UnexpectedChar(ch, self.offset())),
        }
    }

    fn number(&mut self) -> Result<f64, EvalError> {
        let start = self.offset();
        let mut end = start;
        while let Some((pos, ch)) = self
            .chars
            .next_if(|(_, ch)| ch.is_ascii_digit() || *ch == '.')
        {
            end = pos + ch.len_utf8();
        }
        let literal = &self.src[start..end];
        literal
            .parse()
            .map_err(|_| EvalError::InvalidNumber(literal.to_owned()))
    }

    #[inline]
    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.src.len(), |&(pos, _)| pos)
    }
}

/// Prints integral values without a fraction.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
