//! Entity and set model
//!
//! An [`Entity`] is one monitored parameter as declared in a revision. Scalar
//! fields are `Option` so the defaulter can tell "declared" from "absent".

use std::collections::BTreeMap;

/// Which table an entity's sets belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityType {
    Limit,
    ExpectedState,
    #[default]
    Undefined,
}

/// Four threshold values of a limit set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LimitSet {
    pub warning_low: Option<f64>,
    pub caution_low: Option<f64>,
    pub caution_high: Option<f64>,
    pub warning_high: Option<f64>,
}

/// Expected state label of a state set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSet {
    pub expst: Option<String>,
}

/// Type-specific content of a set
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SetValues {
    Limit(LimitSet),
    State(StateSet),
    /// `MLIMIT` without `PPENG`/`EXPST`
    #[default]
    Unspecified,
}

/// One numbered variant of an entity's limits or expected states
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Set {
    pub values: SetValues,
    pub switchstate: Option<String>,
}

impl Set {
    pub fn limit(values: LimitSet) -> Self {
        Self {
            values: SetValues::Limit(values),
            switchstate: None,
        }
    }

    pub fn state(expst: impl Into<String>) -> Self {
        Self {
            values: SetValues::State(StateSet {
                expst: Some(expst.into()),
            }),
            switchstate: None,
        }
    }

    pub fn with_switchstate(mut self, state: impl Into<String>) -> Self {
        self.switchstate = Some(state.into());
        self
    }
}

/// A monitored parameter and everything declared for it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    pub name: String,
    pub entity_type: EntityType,
    /// Set keys in declaration order, without duplicates
    pub set_keys: Vec<i64>,
    pub sets: BTreeMap<i64, Set>,
    pub default_set: Option<i64>,
    pub mlmtol: Option<i64>,
    pub mlimsw: Option<String>,
    pub mlmenable: Option<i64>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Insert or replace a set, keeping the key at its first position
    pub fn put_set(&mut self, key: i64, set: Set) {
        if !self.set_keys.contains(&key) {
            self.set_keys.push(key);
        }
        self.sets.insert(key, set);
    }

    /// Sets in key-list order; keys without a stored set are skipped
    pub fn ordered_sets(&self) -> impl Iterator<Item = (i64, &Set)> {
        self.set_keys
            .iter()
            .filter_map(|key| self.sets.get(key).map(|set| (*key, set)))
    }

    pub fn is_disabled(&self) -> bool {
        self.mlmenable == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_set_keeps_first_position_and_last_content() {
        let mut entity = Entity::new("FOO");
        entity.put_set(1, Set::state("ON"));
        entity.put_set(0, Set::state("OFF"));
        entity.put_set(1, Set::state("STBY"));

        assert_eq!(entity.set_keys, vec![1, 0]);
        let ordered: Vec<_> = entity.ordered_sets().map(|(k, _)| k).collect();
        assert_eq!(ordered, vec![1, 0]);
        assert_eq!(entity.sets[&1], Set::state("STBY"));
    }

    #[test]
    fn test_new_entity_is_untyped_and_enabled_by_omission() {
        let entity = Entity::new("BAR");
        assert_eq!(entity.entity_type, EntityType::Undefined);
        assert!(!entity.is_disabled());
    }
}
