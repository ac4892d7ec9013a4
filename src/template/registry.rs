//! Parameter registry for bound values

use super::Value;

/// Ordered, append-only set of bound values for one top-level build
///
/// Registering a value equal to one already present returns the existing
/// name instead of adding a slot, so a value used from several fragments is
/// bound once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: Vec<Value>,
}

impl Parameters {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with caller-chosen positions
    pub fn with_initial(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Parameter name for a position, e.g. `@p0`
    pub fn name(index: usize) -> String {
        format!("@p{}", index)
    }

    /// Register a value, returning its parameter name
    pub fn register(&mut self, value: Value) -> String {
        let index = match self.position(&value) {
            Some(index) => index,
            None => {
                self.values.push(value);
                self.values.len() - 1
            }
        };
        Self::name(index)
    }

    /// Position of the first value equal to `value`
    ///
    /// NaN matches NaN here, so registering it twice reuses one slot.
    pub fn position(&self, value: &Value) -> Option<usize> {
        self.values.iter().position(|v| same_value(v, value))
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// (name, value) pairs in position order
    pub fn iter(&self) -> impl Iterator<Item = (String, &Value)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (Self::name(i), v))
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => x == y || (x.is_nan() && y.is_nan()),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_assigns_positions() {
        let mut params = Parameters::new();
        assert_eq!(params.register(Value::from(5)), "@p0");
        assert_eq!(params.register(Value::from("a")), "@p1");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_register_deduplicates_equal_values() {
        let mut params = Parameters::new();
        let first = params.register(Value::Text("x".to_string()));
        let second = params.register(Value::Text(String::from("x")));
        assert_eq!(first, second);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_null_is_a_value() {
        let mut params = Parameters::new();
        assert_eq!(params.register(Value::Null), "@p0");
        assert_eq!(params.register(Value::Null), "@p0");
        assert_eq!(params.values(), &[Value::Null]);
    }

    #[test]
    fn test_nan_registers_once() {
        let mut params = Parameters::new();
        assert_eq!(params.register(Value::Float(f64::NAN)), "@p0");
        assert_eq!(params.register(Value::Float(f64::NAN)), "@p0");
        assert_eq!(params.register(Value::Float(1.5)), "@p1");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_int_and_text_are_distinct() {
        let mut params = Parameters::new();
        params.register(Value::Int(1));
        params.register(Value::Text("1".to_string()));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_initial_values_keep_positions() {
        let mut params = Parameters::with_initial(vec![Value::from("tenant"), Value::from(7)]);
        assert_eq!(params.register(Value::from(7)), "@p1");
        assert_eq!(params.register(Value::from(8)), "@p2");
    }

    #[test]
    fn test_iter_names() {
        let params = Parameters::with_initial(vec![Value::from(1), Value::from(2)]);
        let names: Vec<_> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["@p0", "@p1"]);
    }
}
