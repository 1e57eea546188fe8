use crate::model::{RawElement, SchoolRecord, SourceKind};
use chrono::{DateTime, Utc};

/// Name used when a school carries no `name` tag at all.
pub const UNNAMED_SCHOOL: &str = "Unnamed School";

/// Converts one raw element into the canonical school record.
///
/// Never fails: missing tags become `None` (or the documented sentinel),
/// and coordinate selection follows a strict tie-break — direct `lat`/`lon`
/// on a node wins, otherwise the computed `center` of a way/relation,
/// otherwise no coordinates at all. Direct and center values are never mixed.
pub fn normalize(element: &RawElement, source: SourceKind, retrieved_at: DateTime<Utc>) -> SchoolRecord {
    let tags = &element.tags;

    let (latitude, longitude) = match (element.element_type.as_str(), element.lat, element.lon) {
        ("node", Some(lat), Some(lon)) => (Some(lat), Some(lon)),
        _ => match element.center {
            Some(center) => (Some(center.lat), Some(center.lon)),
            None => (None, None),
        },
    };

    let owned = |value: Option<&str>| value.map(str::to_string);

    SchoolRecord {
        id: element.id,
        name: tags.get("name").unwrap_or(UNNAMED_SCHOOL).to_string(),
        category: tags.get("amenity").unwrap_or("school").to_string(),
        latitude,
        longitude,
        city: owned(tags.first_present(&["addr:city", "addr:suburb"])),
        province: owned(tags.first_present(&["addr:state", "addr:province"])),
        postal_code: owned(tags.get("addr:postcode")),
        address: build_address(element),
        education_level: owned(tags.first_present(&["education:level", "isced:level"])),
        operator: owned(tags.get("operator")),
        operator_type: owned(tags.get("operator:type")),
        website: owned(tags.first_present(&["website", "contact:website"])),
        phone: owned(tags.first_present(&["phone", "contact:phone"])),
        email: owned(tags.first_present(&["email", "contact:email"])),
        capacity: owned(tags.get("capacity")),
        grades: owned(tags.get("grades")),
        language: owned(tags.get("language")),
        denomination: owned(tags.first_present(&["denomination", "religion"])),
        gender_policy: owned(tags.get("gender")),
        wheelchair_access: owned(tags.get("wheelchair")),
        retrieved_at,
        data_source: source.name().to_string(),
        source_native_id: element.id,
        source_native_type: element.element_type.clone(),
    }
}

/// Builds a display address from the tagged components.
///
/// Canonical order is street then house number, joined with `", "`
/// (`"Calle Duarte, 23"`). Absent components are skipped; when both are
/// absent the address is the empty string, never null.
fn build_address(element: &RawElement) -> String {
    let parts: Vec<&str> = ["addr:street", "addr:housenumber"]
        .iter()
        .filter_map(|key| element.tags.get(key))
        .collect();
    parts.join(", ")
}
