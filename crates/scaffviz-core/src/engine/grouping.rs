use crate::core::models::columns::OTHER_GROUP;
use std::collections::HashMap;

fn key(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

/// Collapses rare scaffolds into [`OTHER_GROUP`].
///
/// A scaffold keeps its own group iff it occurs at least `mols_per_group`
/// times. Missing values and empty scaffolds form one shared category that
/// follows the same rule; surviving members of it stay empty.
pub fn group_scaffolds(values: &[Option<String>], mols_per_group: usize) -> Vec<Option<String>> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(key(value)).or_default() += 1;
    }
    values
        .iter()
        .map(|value| {
            let scaffold = key(value);
            if counts.get(scaffold).copied().unwrap_or(0) >= mols_per_group {
                (!scaffold.is_empty()).then(|| scaffold.to_string())
            } else {
                Some(OTHER_GROUP.to_string())
            }
        })
        .collect()
}
