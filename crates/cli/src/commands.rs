use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Value, json};

use millerp_formula::{VariableContext, evaluate_formula};
use millerp_invoicing::{InvoiceTypeConfig, Stage, compute_invoice};

/// Parse `NAME=VALUE` (the name may contain spaces and `/`).
pub fn parse_assignment(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{s}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for [{name}]: {e}"))?;
    Ok((name.to_string(), value))
}

fn load_config(path: &Path) -> Result<InvoiceTypeConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    InvoiceTypeConfig::from_json(&text)
        .with_context(|| format!("Failed to load invoice type from '{}'", path.display()))
}

fn load_context(path: Option<&Path>, vars: Vec<(String, f64)>) -> Result<VariableContext> {
    let mut context = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse variables in '{}'", path.display()))?
        }
        None => VariableContext::new(),
    };
    context.extend(vars);
    Ok(context)
}

pub fn compute(config: &Path, context: &Path, vars: Vec<(String, f64)>) -> Result<Value> {
    let config = load_config(config)?;
    let context = load_context(Some(context), vars)?;

    tracing::debug!(invoice_type = %config.name, variables = context.len(), "computing invoice");

    let result = compute_invoice(&config, context)
        .with_context(|| format!("Invoice type '{}' could not be computed", config.name))?;
    Ok(serde_json::to_value(result)?)
}

pub fn check(config: &Path) -> Result<Value> {
    let config = load_config(config)?;
    config
        .validate()
        .with_context(|| format!("Invoice type '{}' is invalid", config.name))?;
    let required = config.required_inputs()?;

    let enabled: Vec<Stage> = Stage::ORDER
        .into_iter()
        .filter(|stage| config.slot(*stage).enabled)
        .collect();

    Ok(json!({
        "id": config.id,
        "name": config.name,
        "enabled_stages": enabled,
        "required_inputs": required,
    }))
}

pub fn eval(formula: &str, context: Option<&Path>, vars: Vec<(String, f64)>) -> Result<Value> {
    let context = load_context(context, vars)?;
    let value = evaluate_formula(formula, &context)
        .with_context(|| format!("Failed to evaluate '{formula}'"))?;
    Ok(json!({ "formula": formula, "value": value }))
}
