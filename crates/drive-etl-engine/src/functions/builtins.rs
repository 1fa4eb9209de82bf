//! Builtin transform functions
//!
//! The minimal set every loaded registry supports. Each follows the fixed
//! signature `(row input, args, kwargs) -> value`; functions are applied
//! once per row.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value as Json};

use drive_etl_core::Value;

use crate::error::{Error, Result};
use crate::functions::{json_to_value, CalcInput, FunctionDef};

pub(super) fn defs() -> Vec<FunctionDef> {
    vec![
        FunctionDef {
            name: "identity",
            min_args: 0,
            implementation: identity,
        },
        FunctionDef {
            name: "constant",
            min_args: 1,
            implementation: constant,
        },
        FunctionDef {
            name: "strip_upper",
            min_args: 0,
            implementation: strip_upper,
        },
        FunctionDef {
            name: "concat",
            min_args: 0,
            implementation: concat,
        },
        FunctionDef {
            name: "zfill",
            min_args: 1,
            implementation: zfill,
        },
        FunctionDef {
            name: "strip_left",
            min_args: 1,
            implementation: strip_left,
        },
        FunctionDef {
            name: "use_dictionary",
            min_args: 2,
            implementation: use_dictionary,
        },
        FunctionDef {
            name: "if_then_else",
            min_args: 1,
            implementation: if_then_else,
        },
        FunctionDef {
            name: "proxy_id",
            min_args: 1,
            implementation: proxy_id,
        },
    ]
}

fn argument_error(function: &str, message: impl Into<String>) -> Error {
    Error::Argument {
        function: function.to_string(),
        message: message.into(),
    }
}

fn identity(input: &CalcInput, _args: &[Json], _kwargs: &Map<String, Json>) -> Result<Value> {
    Ok(input.first().clone())
}

fn constant(_input: &CalcInput, args: &[Json], _kwargs: &Map<String, Json>) -> Result<Value> {
    Ok(json_to_value(&args[0]))
}

fn strip_upper(input: &CalcInput, _args: &[Json], _kwargs: &Map<String, Json>) -> Result<Value> {
    match input.first() {
        Value::Null => Ok(Value::Null),
        v => Ok(Value::str(v.to_string().trim().to_uppercase())),
    }
}

/// Join the non-empty inputs with single spaces
fn concat(input: &CalcInput, _args: &[Json], _kwargs: &Map<String, Json>) -> Result<Value> {
    let joined = input
        .values()
        .iter()
        .map(|v| v.to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Ok(Value::Str(joined))
}

fn zfill(input: &CalcInput, args: &[Json], _kwargs: &Map<String, Json>) -> Result<Value> {
    let width = args[0]
        .as_u64()
        .ok_or_else(|| argument_error("zfill", "width must be a non-negative integer"))?
        as usize;
    let s = input.first().to_string();
    if s.len() >= width {
        return Ok(Value::Str(s));
    }
    // Zeros go after a leading sign, as in str.zfill
    let (sign, digits) = if s.starts_with('+') || s.starts_with('-') {
        s.split_at(1)
    } else {
        ("", s.as_str())
    };
    let padding = "0".repeat(width - s.len());
    Ok(Value::Str(format!("{}{}{}", sign, padding, digits)))
}

fn strip_left(input: &CalcInput, args: &[Json], _kwargs: &Map<String, Json>) -> Result<Value> {
    let chars = args[0]
        .as_str()
        .ok_or_else(|| argument_error("strip_left", "chars must be a string"))?;
    let s = input.first().to_string();
    Ok(Value::str(s.trim_start_matches(|c| chars.contains(c))))
}

fn use_dictionary(input: &CalcInput, args: &[Json], _kwargs: &Map<String, Json>) -> Result<Value> {
    let mapping = args[0]
        .as_object()
        .ok_or_else(|| argument_error("use_dictionary", "mapping must be an object"))?;
    let key = input.first().to_string();
    match mapping.get(&key) {
        Some(found) => Ok(json_to_value(found)),
        None => Ok(json_to_value(&args[1])),
    }
}

/// Pick between paired answers on the truthiness of the first input.
///
/// `args[0]` is the values list: a null entry takes the next raw input as
/// its answer, anything else is the answer itself. The truthy branch is
/// index 0, the falsy branch index 1. An empty-string question is falsy
/// but still a legitimate, present value.
fn if_then_else(input: &CalcInput, args: &[Json], _kwargs: &Map<String, Json>) -> Result<Value> {
    let values = args[0]
        .as_array()
        .ok_or_else(|| argument_error("if_then_else", "values must be an array"))?;
    let mut inputs = input.values().iter();
    let question = inputs
        .next()
        .ok_or_else(|| argument_error("if_then_else", "no question input"))?;

    let mut answers = Vec::with_capacity(values.len());
    for value in values {
        if value.is_null() {
            let raw = inputs.next().ok_or_else(|| {
                argument_error("if_then_else", "ran out of inputs to pair with null values")
            })?;
            answers.push(raw.clone());
        } else {
            answers.push(json_to_value(value));
        }
    }
    if answers.len() < 2 {
        return Err(argument_error("if_then_else", "needs two paired answers"));
    }
    let pick = if question.is_truthy() { 0 } else { 1 };
    Ok(answers[pick].clone())
}

/// Deterministic pseudo-identifier.
///
/// `args[0]` lists index combinations over the inputs; the first fully
/// populated combination seeds the generator, so the same inputs always
/// produce the same identifier. With no populated combination the seed is
/// random and the identifier merely unique.
fn proxy_id(input: &CalcInput, args: &[Json], kwargs: &Map<String, Json>) -> Result<Value> {
    let combinations = args[0]
        .as_array()
        .ok_or_else(|| argument_error("proxy_id", "combinations must be an array"))?;
    let length = kwargs
        .get("length")
        .map(|v| {
            v.as_u64()
                .ok_or_else(|| argument_error("proxy_id", "length must be an integer"))
        })
        .transpose()?
        .unwrap_or(16) as usize;
    let prefix = kwargs
        .get("prefix")
        .and_then(Json::as_str)
        .unwrap_or("PROXY");
    let dashed = kwargs
        .get("dashed")
        .map(|v| {
            v.as_bool()
                .ok_or_else(|| argument_error("proxy_id", "dashed must be a boolean"))
        })
        .transpose()?
        .unwrap_or(true);

    let values = input.values();
    let mut seed: Option<String> = None;
    for combination in combinations {
        let indices = combination
            .as_array()
            .ok_or_else(|| argument_error("proxy_id", "each combination must be an array"))?;
        let mut picked = Vec::with_capacity(indices.len());
        for index in indices {
            let i = index
                .as_u64()
                .ok_or_else(|| argument_error("proxy_id", "combination indices must be integers"))?
                as usize;
            match values.get(i) {
                Some(v) if v.is_truthy() => picked.push(v.to_string()),
                _ => {
                    picked.clear();
                    break;
                }
            }
        }
        if !picked.is_empty() {
            seed = Some(picked.join("|"));
            break;
        }
    }

    let seed = match seed {
        Some(s) => {
            let mut hasher = DefaultHasher::new();
            s.hash(&mut hasher);
            hasher.finish()
        }
        None => rand::random(),
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let digits: String = (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect();

    let id = if dashed {
        let grouped = digits
            .as_bytes()
            .chunks(4)
            .map(|c| std::str::from_utf8(c).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("-");
        format!("{}-{}", prefix, grouped)
    } else {
        format!("{}{}", prefix, digits)
    };
    Ok(Value::Str(id))
}
