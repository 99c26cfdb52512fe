//! The calculator's tool catalog.

use std::sync::Arc;

use llm_chat_core::tool::{self, Catalog, ToolResult};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::arith::{self, ArithError};

#[derive(Deserialize, JsonSchema)]
struct Pair {
    /// The first operand.
    a: f64,
    /// The second operand.
    b: f64,
}

#[derive(Deserialize, JsonSchema)]
struct Number {
    /// The operand.
    a: f64,
}

#[derive(Deserialize, JsonSchema)]
struct Count {
    /// A non-negative whole number.
    a: i64,
}

/// Builds the catalog every request handler shares.
pub fn catalog() -> Arc<Catalog> {
    let catalog = Catalog::default()
        .with_tool(tool::from_fn("add", "Add two numbers together", |p: Pair| {
            real(arith::add(p.a, p.b))
        }))
        .with_tool(tool::from_fn("subtract", "Subtract two numbers", |p: Pair| {
            real(arith::subtract(p.a, p.b))
        }))
        .with_tool(tool::from_fn("multiply", "Multiply two numbers", |p: Pair| {
            real(arith::multiply(p.a, p.b))
        }))
        .with_tool(tool::from_fn("divide", "Divide two numbers", |p: Pair| {
            real(arith::divide(p.a, p.b))
        }))
        .with_tool(tool::from_fn(
            "power",
            "Raise a number to a power",
            |p: Pair| real(arith::power(p.a, p.b)),
        ))
        .with_tool(tool::from_fn(
            "square_root",
            "Calculate the square root of a number",
            |n: Number| real(arith::square_root(n.a)),
        ))
        .with_tool(tool::from_fn(
            "absolute_value",
            "Calculate the absolute value of a number",
            |n: Number| real(Ok(arith::absolute_value(n.a))),
        ))
        .with_tool(tool::from_fn(
            "factorial",
            "Calculate the factorial of a number",
            |c: Count| whole(arith::factorial(c.a)),
        ))
        .with_tool(tool::from_fn(
            "fibonacci",
            "Calculate the n-th Fibonacci number",
            |c: Count| whole(arith::fibonacci(c.a)),
        ))
        .with_tool(tool::from_fn(
            "fibonacci_sequence",
            "Calculate the Fibonacci sequence up to a number",
            |c: Count| whole(arith::fibonacci(c.a)),
        ));
    Arc::new(catalog)
}

/// Whole results render as JSON integers, so `2 + 3` is `5` and not `5.0`.
fn real(result: Result<f64, ArithError>) -> ToolResult {
    const EXACT: f64 = (1u64 << 53) as f64;
    let value = result.map_err(rejected)?;
    if value.fract() == 0.0 && value.abs() < EXACT {
        Ok(json!(value as i64))
    } else {
        Ok(json!(value))
    }
}

fn whole(result: Result<u64, ArithError>) -> ToolResult {
    result.map(Value::from).map_err(rejected)
}

fn rejected(err: ArithError) -> tool::Error {
    tool::Error::domain().with_reason(err.to_string())
}

#[cfg(test)]
mod tests {
    use llm_chat_core::tool::ErrorKind;

    use super::*;

    #[test]
    fn test_catalog_definitions() {
        let catalog = catalog();
        let names: Vec<_> = catalog
            .definitions()
            .into_iter()
            .map(|def| def.name)
            .collect();
        assert_eq!(
            names,
            [
                "add",
                "subtract",
                "multiply",
                "divide",
                "power",
                "square_root",
                "absolute_value",
                "factorial",
                "fibonacci",
                "fibonacci_sequence",
            ]
        );

        let add = &catalog.definitions()[0];
        assert_eq!(add.description, "Add two numbers together");
        assert_eq!(add.input_schema["required"], json!(["a", "b"]));
        assert_eq!(add.input_schema["properties"]["a"]["type"], "number");
    }

    #[tokio::test]
    async fn test_calls() {
        let catalog = catalog();
        assert_eq!(
            catalog.call("add", json!({ "a": 2, "b": 3 })).await,
            Ok(json!(5))
        );
        assert_eq!(
            catalog.call("divide", json!({ "a": 7, "b": 2 })).await,
            Ok(json!(3.5))
        );
        assert_eq!(
            catalog.call("square_root", json!({ "a": 2 })).await,
            Ok(json!(std::f64::consts::SQRT_2))
        );
        assert_eq!(
            catalog.call("factorial", json!({ "a": 5 })).await,
            Ok(json!(120))
        );
        assert_eq!(
            catalog.call("fibonacci", json!({ "a": 93 })).await,
            Ok(json!(12_200_160_415_121_876_738u64))
        );
        assert_eq!(
            catalog.call("fibonacci_sequence", json!({ "a": 10 })).await,
            Ok(json!(55))
        );
    }

    #[tokio::test]
    async fn test_rejected_calls() {
        let catalog = catalog();

        let err = catalog
            .call("divide", json!({ "a": 1, "b": 0 }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
        assert_eq!(err.reason(), "Cannot divide by zero");

        let err = catalog
            .call("factorial", json!({ "a": 2.5 }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = catalog
            .call("fibonacci", json!({ "a": -1 }))
            .await
            .unwrap_err();
        assert_eq!(
            err.reason(),
            "Fibonacci is not defined for negative numbers"
        );
    }
}
