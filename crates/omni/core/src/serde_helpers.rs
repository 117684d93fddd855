//! custom serde helper functions

/// A module that deserializes the `params` of parameterless methods, where
/// the wire value may be missing, `null` or `[]`
pub mod empty_params {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn deserialize<'de, D>(d: D) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        let seq = Option::<Vec<serde_json::Value>>::deserialize(d)?.unwrap_or_default();
        if !seq.is_empty() {
            return Err(serde::de::Error::custom(format!(
                "expected params sequence with length 0 but got {}",
                seq.len()
            )));
        }
        Ok(())
    }

    pub fn serialize<S>(_: &(), s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_json::Value::Null.serialize(s)
    }
}
