//! Calculator tool: one addition or subtraction of two numbers.
//!
//! The expression is split on the first operator kind found (`+` is checked
//! before `-`) and must yield exactly two numeric operands. Results are
//! reported as `a op b = result`.

use async_trait::async_trait;
use chatloop_core::error::ToolError;
use chatloop_core::tool::{Tool, ToolResult};
use std::fmt;
use tracing::debug;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Useful for performing calculations. Adds or subtracts two numbers, e.g. '25.5 + 10.8'."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Two numbers joined by + or -, e.g. '25.5 + 10.8'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let expr = arguments["expression"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'expression' argument".into()))?;

        let outcome = calculate(expr);
        debug!(expression = expr, ok = outcome.is_ok(), "Calculator invoked");

        Ok(match outcome {
            Ok(calc) => ToolResult {
                call_id: String::new(),
                success: true,
                output: calc.to_string(),
            },
            Err(e) => ToolResult {
                call_id: String::new(),
                success: false,
                output: e.to_string(),
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
}

impl Operator {
    fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
        }
    }
}

/// A completed calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calculation {
    pub lhs: f64,
    pub op: Operator,
    pub rhs: f64,
    pub result: f64,
}

impl fmt::Display for Calculation {
    // `{:?}` keeps the trailing `.0` on whole numbers: "2.0 + 3.0 = 5.0".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} {:?} = {:?}",
            self.lhs,
            self.op.symbol(),
            self.rhs,
            self.result
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    /// Splitting on the operator did not give exactly two parts
    Format(Operator),
    /// An operand is not a number
    Numbers,
    /// Neither `+` nor `-` present
    Unsupported,
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcError::Format(Operator::Add) => f.write_str("Invalid input format for addition"),
            CalcError::Format(Operator::Subtract) => {
                f.write_str("Invalid input format for subtraction")
            }
            CalcError::Numbers => f.write_str("Invalid numbers for calculation"),
            CalcError::Unsupported => f.write_str("Unsupported operation"),
        }
    }
}

impl std::error::Error for CalcError {}

pub fn calculate(query: &str) -> Result<Calculation, CalcError> {
    let query = query.trim();

    let op = if query.contains('+') {
        Operator::Add
    } else if query.contains('-') {
        Operator::Subtract
    } else {
        return Err(CalcError::Unsupported);
    };

    let parts: Vec<&str> = query.split(op.symbol()).collect();
    let [lhs, rhs] = parts.as_slice() else {
        return Err(CalcError::Format(op));
    };

    let lhs: f64 = lhs.trim().parse().map_err(|_| CalcError::Numbers)?;
    let rhs: f64 = rhs.trim().parse().map_err(|_| CalcError::Numbers)?;
    let result = match op {
        Operator::Add => lhs + rhs,
        Operator::Subtract => lhs - rhs,
    };

    Ok(Calculation {
        lhs,
        op,
        rhs,
        result,
    })
}
