use crate::core::RecordId;
use crate::gateway::SpeciesInfo;
use crate::model::Animal;
use std::collections::HashMap;

/// Field-level update to one animal's derived taxonomy. `None` leaves the
/// field untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesPatch {
    pub animal_id: RecordId,
    pub latin_name: Option<String>,
    pub red_list_status: Option<String>,
}

impl SpeciesPatch {
    /// Patch carrying only the fields where `info` disagrees with `animal`
    pub fn diff(animal: &Animal, info: &SpeciesInfo) -> Option<Self> {
        let latin_name = non_empty(info.scientific_name.as_deref())
            .filter(|name| animal.latin_name.as_deref() != Some(*name))
            .map(str::to_owned);
        let red_list_status = non_empty(info.conservation_status.as_deref())
            .filter(|status| animal.red_list_status.as_deref() != Some(*status))
            .map(str::to_owned);

        if latin_name.is_none() && red_list_status.is_none() {
            return None;
        }
        Some(Self {
            animal_id: animal.id.clone(),
            latin_name,
            red_list_status,
        })
    }

    pub fn apply(&self, animal: &mut Animal) {
        if let Some(latin_name) = &self.latin_name {
            animal.latin_name = Some(latin_name.clone());
        }
        if let Some(status) = &self.red_list_status {
            animal.red_list_status = Some(status.clone());
        }
    }
}

/// Find the lookup result for `species`: exact key first, then a trimmed,
/// case-insensitive match. Among several such matches the lowest key wins.
pub fn find_species<'a>(
    found: &'a HashMap<String, SpeciesInfo>,
    species: &str,
) -> Option<&'a SpeciesInfo> {
    if let Some(info) = found.get(species) {
        return Some(info);
    }
    let wanted = species.trim();
    found
        .iter()
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case(wanted))
        .min_by(|(left, _), (right, _)| left.cmp(right))
        .map(|(_, info)| info)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
