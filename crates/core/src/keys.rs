use serde::{Deserialize, Serialize};

/// Grouping key for processing and dispatch metrics: one estate location
/// and one coffee variety.
///
/// Ordered so that `BTreeMap<LocationCoffee, _>` iterates deterministically,
/// which keeps alert output order stable across invocations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCoffee {
    pub location: String,
    pub coffee_type: String,
}

impl LocationCoffee {
    pub fn new(location: impl Into<String>, coffee_type: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            coffee_type: coffee_type.into(),
        }
    }
}

impl std::fmt::Display for LocationCoffee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.location, self.coffee_type)
    }
}

/// Grouping key for sales metrics, which additionally split by bag type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCoffeeBag {
    pub location: String,
    pub coffee_type: String,
    pub bag_type: String,
}

impl LocationCoffeeBag {
    pub fn new(
        location: impl Into<String>,
        coffee_type: impl Into<String>,
        bag_type: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            coffee_type: coffee_type.into(),
            bag_type: bag_type.into(),
        }
    }
}

impl std::fmt::Display for LocationCoffeeBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {} / {}", self.location, self.coffee_type, self.bag_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn keys_do_not_collide_across_fields() {
        // "a b" + "c" and "a" + "b c" would collide under naive concatenation.
        let mut map = BTreeMap::new();
        map.insert(LocationCoffee::new("a b", "c"), 1);
        map.insert(LocationCoffee::new("a", "b c"), 2);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn bag_key_displays_all_fields() {
        let key = LocationCoffeeBag::new("North", "Arabica", "Parchment");
        assert_eq!(key.to_string(), "North / Arabica / Parchment");
    }
}
