use serde_json::{Number, Value};

/// Round every float in `value` to `digits` decimal places, in place.
///
/// Integers are left untouched. Floats that end up integral keep their float
/// representation (`1.0` stays `1.0`).
pub fn round_floats(value: &mut Value, digits: i32) {
    match value {
        Value::Number(n) if n.is_f64() => {
            if let Some(rounded) = n.as_f64().map(|f| round(f, digits)).and_then(Number::from_f64) {
                *n = rounded;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|item| round_floats(item, digits)),
        Value::Object(map) => map.values_mut().for_each(|item| round_floats(item, digits)),
        _ => {}
    }
}

fn round(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}
