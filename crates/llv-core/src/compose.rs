//! Composite rhythm construction.
//!
//! A composite is a new cyclic generator whose pattern is the ordered list
//! of component weights — it references other elements by name but ignores
//! their own rhythms entirely. Components arrive as loose JSON (the tool
//! schema cannot guarantee shape), so validation filters rather than fails:
//! an entry survives only with a non-empty string `element` and a finite
//! numeric `weight`.

use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::rhythm::RhythmGenerator;

/// A component that passed validation.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    pub element: String,
    pub weight: f64,
}

/// Keep the components with a usable element/weight pair, in order.
pub fn valid_components(raw: &[Value]) -> Vec<Component> {
    raw.iter()
        .filter_map(|entry| {
            let element = entry.get("element")?.as_str()?;
            if element.trim().is_empty() {
                return None;
            }
            let weight = entry.get("weight")?.as_f64()?;
            if !weight.is_finite() {
                return None;
            }
            Some(Component {
                element: element.to_string(),
                weight,
            })
        })
        .collect()
}

/// Build the composite generator for `name`. Invalid entries are dropped;
/// the call fails only when nothing valid remains.
pub fn compose(name: &str, raw: &[Value]) -> Result<(Vec<Component>, RhythmGenerator)> {
    let components = valid_components(raw);
    if components.is_empty() {
        return Err(EngineError::NoValidComponents {
            name: name.to_string(),
        });
    }
    let weights: Vec<f64> = components.iter().map(|c| c.weight).collect();
    Ok((components, RhythmGenerator::from_pattern(weights)))
}
