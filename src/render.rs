//! Call-signature and argument rendering for trace lines.

use crate::value::Value;

/// Renders a value in argument position. Nil reads as `undefined` there,
/// rather than the `()` used in result position.
pub fn arg_repr(value: &Value) -> String {
    if value.is_nil() {
        "undefined".to_string()
    } else {
        value.to_string()
    }
}

/// Comma-joined argument list: `5, 'x', [1, 2]`.
pub fn args_repr(args: &[Value]) -> String {
    args.iter()
        .map(arg_repr)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Call signature of a candidate applied to bound arguments: `add(5, 5)`.
pub fn signature(name: &str, args: &[Value]) -> String {
    format!("{}({})", name, args_repr(args))
}
