//! Find command implementation.
//!
//! Filters are written as `field<op>value`, for example `age>=18` or
//! `name==Ada`. Word operators need spaces: `tags array-contains rust`,
//! `status in ["open","done"]`. Values are parsed as JSON and fall back to
//! a plain string.

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::Value;

use docrepo_core::{Direction, Operator};

use super::open_repository;
use crate::output;

/// Symbolic operators, two-character tokens first so `<=` wins over `<`.
const SYMBOLS: [&str; 6] = ["==", "!=", "<=", ">=", "<", ">"];

#[derive(Args, Debug)]
pub struct FindArgs {
    /// Collection name
    pub collection: String,

    /// Filter expression (repeatable, all must match)
    #[arg(long = "where", short = 'w', value_name = "FILTER")]
    pub filters: Vec<String>,

    /// Order by a field, optionally suffixed with :asc or :desc
    #[arg(long, value_name = "FIELD[:asc|desc]")]
    pub order_by: Option<String>,

    /// Maximum number of documents to return
    #[arg(long)]
    pub limit: Option<usize>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// One parsed `--where` expression.
#[derive(Debug, PartialEq)]
struct Clause {
    field: String,
    op: Operator,
    value: Value,
}

pub async fn run(args: FindArgs, root: &Path) -> Result<()> {
    let repo = open_repository(root, &args.collection)?;

    let mut builder = repo.query_builder();
    for expr in &args.filters {
        let clause = parse_clause(expr)?;
        builder = builder
            .filter_named(&clause.field, clause.op, clause.value)
            .with_context(|| format!("Invalid filter '{}'", expr))?;
    }
    if let Some(order) = &args.order_by {
        let (field, direction) = parse_order(order)?;
        builder = builder
            .order_by_named(field, direction)
            .with_context(|| format!("Invalid ordering '{}'", order))?;
    }
    if let Some(limit) = args.limit {
        builder = builder.limit(limit).context("Invalid limit")?;
    }

    let docs = repo.query(&builder).await.context("Failed to run query")?;

    if docs.is_empty() {
        output::notice("No documents found.");
        return Ok(());
    }

    output::json_lines(&docs, args.pretty)
}

fn parse_clause(expr: &str) -> Result<Clause> {
    if let Some((at, token)) = find_symbol(expr) {
        let field = expr[..at].trim();
        let value = expr[at + token.len()..].trim();
        return clause(expr, field, token, value);
    }

    let mut parts = expr.trim().splitn(3, char::is_whitespace);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(field), Some(token), Some(value)) => clause(expr, field, token, value.trim()),
        _ => bail!("Filter '{}' is not of the form FIELD OP VALUE", expr),
    }
}

/// Earliest symbolic operator in `expr`, preferring the longer token at a
/// given position.
fn find_symbol(expr: &str) -> Option<(usize, &'static str)> {
    (0..expr.len())
        .filter(|at| expr.is_char_boundary(*at))
        .find_map(|at| {
            SYMBOLS
                .iter()
                .find(|token| expr[at..].starts_with(**token))
                .map(|token| (at, *token))
        })
}

fn clause(expr: &str, field: &str, token: &str, value: &str) -> Result<Clause> {
    if field.is_empty() {
        bail!("Filter '{}' has no field name", expr);
    }
    if value.is_empty() {
        bail!("Filter '{}' has no value", expr);
    }
    let op: Operator = token
        .parse()
        .with_context(|| format!("Unknown operator in filter '{}'", expr))?;

    Ok(Clause {
        field: field.to_string(),
        op,
        value: parse_value(value),
    })
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_order(raw: &str) -> Result<(&str, Direction)> {
    let (field, direction) = match raw.rsplit_once(':') {
        Some((field, suffix)) => (field, suffix.parse().context("Direction must be asc or desc")?),
        None => (raw, Direction::Ascending),
    };
    if field.is_empty() {
        bail!("Ordering '{}' has no field name", raw);
    }
    Ok((field, direction))
}
