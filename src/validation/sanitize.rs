//! Text normalization applied before persistence.
//!
//! Stripping `<` and `>` only blunts naive markup injection; it is not HTML
//! escaping. Anything rendering this text into HTML must still escape it.

use crate::domain::profiles::RoleSpecificData;

pub const STRING_ARRAY_MAX: usize = 50;

/// Trim, collapse whitespace runs to a single space, drop `<` and `>`
pub fn sanitize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .collect()
}

/// Sanitize each entry, drop the ones left empty, keep at most 50
pub fn sanitize_string_array(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|item| sanitize_text(item))
        .filter(|item| !item.is_empty())
        .take(STRING_ARRAY_MAX)
        .collect()
}

fn sanitize_opt(value: &mut Option<String>) {
    if let Some(v) = value.take() {
        let clean = sanitize_text(&v);
        if !clean.is_empty() {
            *value = Some(clean);
        }
    }
}

fn sanitize_vec(items: &mut Vec<String>) {
    *items = sanitize_string_array(items);
}

/// Apply the text rules to every free-text and list field of a payload
pub fn sanitize_role_specific_data(data: &mut RoleSpecificData) {
    match data {
        RoleSpecificData::Model(d) => {
            sanitize_vec(&mut d.model_type);
            if let Some(languages) = d.languages.as_mut() {
                sanitize_vec(languages);
            }
        }
        RoleSpecificData::Photographer(d) => {
            sanitize_vec(&mut d.specialties);
            sanitize_vec(&mut d.post_production_skills);
            sanitize_opt(&mut d.equipment_highlights);
            sanitize_opt(&mut d.portfolio_url);
        }
        RoleSpecificData::MakeupArtist(d) => {
            sanitize_vec(&mut d.specialties);
            sanitize_vec(&mut d.kit_highlights);
            sanitize_vec(&mut d.services_offered);
            sanitize_opt(&mut d.portfolio_url);
        }
        RoleSpecificData::Stylist(d) => {
            sanitize_vec(&mut d.specialties);
            sanitize_opt(&mut d.wardrobe_access);
            sanitize_opt(&mut d.portfolio_url);
        }
        RoleSpecificData::Producer(d) => {
            sanitize_vec(&mut d.specialties);
            sanitize_opt(&mut d.team_size);
            sanitize_opt(&mut d.portfolio_url);
        }
    }
}
