//! The function registry
//!
//! Named value-transform functions, dispatched through a table built at
//! startup. Remote function sources supply a declarative JSON manifest
//! whose entries alias builtins with pre-bound arguments; manifest content
//! is data interpreted by this closed table, never executed code.

mod builtins;

use std::collections::HashMap;

use serde_json::{Map, Value as Json};

use drive_etl_core::Value;
use drive_etl_store::Drive;

use crate::error::{Error, Result};
use crate::resolve::resolve_document;
use crate::settings::SettingsLocation;

/// The input a function receives for one row
#[derive(Debug, Clone, Copy)]
pub enum CalcInput<'a> {
    /// A single selected column's value
    Scalar(&'a Value),
    /// A slice of selected columns (row-wise application)
    Row(&'a [Value]),
}

impl<'a> CalcInput<'a> {
    /// The selected values, one for scalar input
    pub fn values(&self) -> &'a [Value] {
        match *self {
            CalcInput::Scalar(v) => std::slice::from_ref(v),
            CalcInput::Row(r) => r,
        }
    }

    /// The first selected value
    pub fn first(&self) -> &'a Value {
        static NULL: Value = Value::Null;
        self.values().first().unwrap_or(&NULL)
    }
}

/// Function implementation signature: `(row input, args, kwargs) -> value`
pub type FunctionImpl = fn(&CalcInput, &[Json], &Map<String, Json>) -> Result<Value>;

/// Function definition
pub struct FunctionDef {
    /// Registry key
    pub name: &'static str,
    /// Minimum positional arguments
    pub min_args: usize,
    /// Implementation
    pub implementation: FunctionImpl,
}

#[derive(Clone)]
struct Function {
    implementation: FunctionImpl,
    min_args: usize,
    bound_args: Vec<Json>,
    bound_kwargs: Map<String, Json>,
}

/// A function resolved against one calculation's arguments, ready to be
/// applied per row
pub struct BoundFunction {
    implementation: FunctionImpl,
    args: Vec<Json>,
    kwargs: Map<String, Json>,
}

impl BoundFunction {
    /// Apply to one row's input
    pub fn call(&self, input: &CalcInput) -> Result<Value> {
        (self.implementation)(input, &self.args, &self.kwargs)
    }
}

/// A loaded set of named transform functions.
///
/// Loading from a source replaces the registry wholesale; the builtin set
/// is always present underneath whatever a manifest defines.
pub struct Registry {
    functions: HashMap<String, Function>,
}

impl Registry {
    /// The builtin function set every registry supports
    pub fn builtin() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };
        for def in builtins::defs() {
            registry.register(def);
        }
        registry
    }

    /// Register a function definition
    fn register(&mut self, def: FunctionDef) {
        self.functions.insert(
            def.name.to_string(),
            Function {
                implementation: def.implementation,
                min_args: def.min_args,
                bound_args: Vec::new(),
                bound_kwargs: Map::new(),
            },
        );
    }

    /// Check whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Resolve a function against one calculation's arguments.
    ///
    /// Call-site positional args replace manifest-bound ones when present;
    /// kwargs merge with call-site keys winning. Arity is checked against
    /// the effective arguments.
    pub fn bind(
        &self,
        name: &str,
        args: &[Json],
        kwargs: &Map<String, Json>,
    ) -> Result<BoundFunction> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| Error::UnknownFunction(name.to_string()))?;

        let effective_args: Vec<Json> = if args.is_empty() {
            function.bound_args.clone()
        } else {
            args.to_vec()
        };
        if effective_args.len() < function.min_args {
            return Err(Error::Arity {
                function: name.to_string(),
                expected: function.min_args,
                actual: effective_args.len(),
            });
        }

        let mut effective_kwargs = function.bound_kwargs.clone();
        for (key, value) in kwargs {
            effective_kwargs.insert(key.clone(), value.clone());
        }

        Ok(BoundFunction {
            implementation: function.implementation,
            args: effective_args,
            kwargs: effective_kwargs,
        })
    }

    /// Load a registry from a function source.
    ///
    /// The resolved document must expose a `functions` object mapping
    /// names to `{function, args?, kwargs?}` aliases of builtins.
    pub fn load(source: &SettingsLocation, drive: &dyn Drive) -> Result<Registry> {
        let doc = resolve_document(source, drive)?;
        let manifest = doc
            .get("functions")
            .ok_or_else(|| {
                Error::FunctionLoad("manifest has no `functions` entry".to_string())
            })?
            .as_object()
            .ok_or_else(|| Error::FunctionLoad("`functions` is not an object".to_string()))?;

        let base = Registry::builtin();
        let mut registry = Registry::builtin();
        for (name, entry) in manifest {
            let base_name = entry
                .get("function")
                .and_then(Json::as_str)
                .ok_or_else(|| {
                    Error::FunctionLoad(format!("entry {} names no base function", name))
                })?;
            let builtin = base.functions.get(base_name).ok_or_else(|| {
                Error::FunctionLoad(format!(
                    "entry {} aliases unknown function {}",
                    name, base_name
                ))
            })?;
            let bound_args = match entry.get("args") {
                Some(Json::Array(args)) => args.clone(),
                Some(_) => {
                    return Err(Error::FunctionLoad(format!(
                        "entry {} has non-array args",
                        name
                    )))
                }
                None => Vec::new(),
            };
            let bound_kwargs = match entry.get("kwargs") {
                Some(Json::Object(kwargs)) => kwargs.clone(),
                Some(_) => {
                    return Err(Error::FunctionLoad(format!(
                        "entry {} has non-object kwargs",
                        name
                    )))
                }
                None => Map::new(),
            };
            registry.functions.insert(
                name.clone(),
                Function {
                    implementation: builtin.implementation,
                    min_args: builtin.min_args,
                    bound_args,
                    bound_kwargs,
                },
            );
        }
        Ok(registry)
    }
}

/// Convert a settings/manifest JSON scalar into a table value
pub fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Str(b.to_string()),
        Json::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
        Json::String(s) => Value::Str(s.clone()),
        other => Value::Str(other.to_string()),
    }
}
