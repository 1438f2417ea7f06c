use crate::facility::FacilityObject;
use serde::{Deserialize, Serialize};

/// Children of one gym (or of an unknown parent)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GymGroup {
    pub parent_id: Option<String>,
    /// Resolved parent when it is part of the input
    pub parent: Option<FacilityObject>,
    pub children: Vec<FacilityObject>,
}

/// Presentation split of a facility list: gyms first, then children per gym.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedFacilities {
    pub gyms: Vec<FacilityObject>,
    pub groups: Vec<GymGroup>,
}

/// Groups `objects` by owning gym.
///
/// Gyms keep input order. Child groups appear in order of their first child,
/// and children keep input order within a group.
pub fn group_by_gym(objects: &[FacilityObject]) -> GroupedFacilities {
    let mut grouped = GroupedFacilities::default();

    for object in objects {
        if object.is_gym() {
            grouped.gyms.push(object.clone());
            continue;
        }

        let parent_id = object.parent_facility_id.clone();
        match grouped.groups.iter_mut().find(|g| g.parent_id == parent_id) {
            Some(group) => group.children.push(object.clone()),
            None => grouped.groups.push(GymGroup {
                parent: resolve_parent(objects, parent_id.as_deref()),
                parent_id,
                children: vec![object.clone()],
            }),
        }
    }

    grouped
}

fn resolve_parent(objects: &[FacilityObject], parent_id: Option<&str>) -> Option<FacilityObject> {
    let parent_id = parent_id?;
    objects
        .iter()
        .find(|o| o.is_gym() && o.id == parent_id)
        .or_else(|| objects.iter().find(|o| o.id == parent_id))
        .cloned()
}
