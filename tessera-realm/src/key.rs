use core::hash::{Hash, Hasher};

use crate::Value;

/// A [`Value`] used as a `Map` key or `Set` item, compared with
/// SameValueZero: `NaN` equals `NaN`, `-0` equals `0`, objects compare by
/// identity.
#[derive(Clone, Debug)]
pub struct MapKey(pub Value);

impl MapKey {
    /// The wrapped value
    #[inline]
    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl PartialEq for MapKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.same_value_zero(&other.0)
    }
}

impl Eq for MapKey {}

impl Hash for MapKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(&self.0).hash(state);
        match &self.0 {
            Value::Undefined | Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Number(n) => {
                let canonical = if n.is_nan() {
                    f64::NAN.to_bits()
                } else if *n == 0.0 {
                    0
                } else {
                    n.to_bits()
                };
                canonical.hash(state)
            }
            Value::BigInt(n) => n.hash(state),
            Value::String(s) => s.hash(state),
            Value::Object(id) => id.hash(state),
        }
    }
}

impl From<Value> for MapKey {
    fn from(value: Value) -> Self {
        MapKey(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexSet;

    #[test]
    fn nan_and_signed_zero_collapse() {
        let mut set = IndexSet::new();
        set.insert(MapKey(Value::Number(f64::NAN)));
        set.insert(MapKey(Value::Number(-f64::NAN)));
        set.insert(MapKey(Value::Number(0.0)));
        set.insert(MapKey(Value::Number(-0.0)));
        set.insert(MapKey(Value::from("0")));
        assert_eq!(set.len(), 3);
    }
}
