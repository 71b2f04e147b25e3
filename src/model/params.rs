use std::collections::BTreeMap;

use serde_json::Value;

/// Effect parameters snapshot sent as `userInput`.
///
/// The well-known numeric knobs are typed; anything else an effect understands is carried in
/// `extra` and forwarded to the service untouched.
///
/// Deserialization routes every key through [`EffectParameters::set`], so anything `set` accepts
/// reads back the same way.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct EffectParameters {
    #[serde(rename = "Radius", skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(rename = "Strength", skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    #[serde(rename = "Lightness", skip_serializing_if = "Option::is_none")]
    pub lightness: Option<f64>,
    #[serde(rename = "Saturation", skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl EffectParameters {
    /// Default knobs the front-end offers for `effect`.
    pub fn defaults_for(effect: &str) -> Self {
        let (radius, strength, lightness, saturation) = match effect {
            "heisenbrush" => (20.0, 0.8, Some(0.5), Some(0.5)),
            "acrylic" => (30.0, 0.7, None, None),
            "qdrop" => (25.0, 0.9, None, None),
            _ => (20.0, 0.8, None, None),
        };
        Self {
            radius: Some(radius),
            strength: Some(strength),
            lightness,
            saturation,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength);
        self
    }

    /// Set a parameter by its wire name. Known names land in the typed fields.
    ///
    /// A key is held in exactly one place: a numeric value for a known name clears any opaque
    /// entry of the same name, and a non-numeric one clears the typed field.
    pub fn set(&mut self, key: &str, value: Value) {
        let slot = match key {
            "Radius" => &mut self.radius,
            "Strength" => &mut self.strength,
            "Lightness" => &mut self.lightness,
            "Saturation" => &mut self.saturation,
            _ => {
                self.extra.insert(key.to_string(), value);
                return;
            }
        };
        match value.as_f64() {
            Some(v) => {
                *slot = Some(v);
                self.extra.remove(key);
            }
            None => {
                *slot = None;
                self.extra.insert(key.to_string(), value);
            }
        }
    }

    /// Look up a parameter by its wire name.
    pub fn get(&self, key: &str) -> Option<Value> {
        let typed = match key {
            "Radius" => self.radius,
            "Strength" => self.strength,
            "Lightness" => self.lightness,
            "Saturation" => self.saturation,
            _ => None,
        };
        typed
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .or_else(|| self.extra.get(key).cloned())
    }
}

impl From<BTreeMap<String, Value>> for EffectParameters {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut params = Self::default();
        for (key, value) in raw {
            params.set(&key, value);
        }
        params
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/params.rs"]
mod tests;
