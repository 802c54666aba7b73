//! Decoded field values paired with their schema field names.

use crate::schema::Schema;

/// Values decoded from one address, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValues {
    names: Vec<String>,
    values: Vec<u64>,
}

impl FieldValues {
    /// Pair `values` with the field names of `schema`. Extra values past the last field are dropped.
    pub fn new(schema: &Schema, mut values: Vec<u64>) -> Self {
        values.truncate(schema.len());
        let names = schema
            .fields()
            .iter()
            .take(values.len())
            .map(|f| f.name.clone())
            .collect();
        FieldValues { names, values }
    }

    /// Value of the first field called `name`.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<u64> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;

    #[test]
    fn lookup_by_name() {
        let schema = Schema::new(vec![FieldSpec::new("pid", 22), FieldSpec::new("ts", 32)]).unwrap();
        let fv = FieldValues::new(&schema, vec![7, 9]);
        assert_eq!(fv.get("ts"), Some(9));
        assert_eq!(fv.get("nope"), None);
        assert_eq!(fv.iter().collect::<Vec<_>>(), vec![("pid", 7), ("ts", 9)]);
    }
}
