//! Role-specific payload rules and the profile update aggregate

use crate::domain::profiles::{
    MakeupArtistData, ModelData, PhotographerData, ProducerData, Role, RoleSpecificData,
    StylistData, UpdateProfileRequest,
};

use super::fields::{
    check_max_items, check_max_len, check_range, check_url, validate_bio, validate_full_name,
    validate_location, validate_profile_username,
};
use super::{ErrorKind, ValidationResult};

pub const YEARS_EXPERIENCE_MAX: i32 = 50;
pub const FREE_TEXT_MAX: usize = 500;
pub const TEAM_SIZE_MAX: usize = 100;
pub const MAKEUP_LIST_MAX: usize = 20;

pub fn validate_model_data(data: &ModelData) -> ValidationResult {
    let mut result = ValidationResult::new();

    check_range(&mut result, "height_cm", data.height_cm, 140, 220);
    check_range(&mut result, "bust_cm", data.bust_cm, 60, 150);
    check_range(&mut result, "waist_cm", data.waist_cm, 50, 120);
    check_range(&mut result, "hips_cm", data.hips_cm, 60, 150);
    check_range(&mut result, "shoe_size_eu", data.shoe_size_eu, 35.0, 50.0);
    check_range(&mut result, "dress_size_eu", data.dress_size_eu, 32, 50);

    result
}

fn check_common(
    result: &mut ValidationResult,
    years_experience: Option<i32>,
    portfolio_url: Option<&str>,
) {
    check_range(result, "years_experience", years_experience, 0, YEARS_EXPERIENCE_MAX);
    check_url(result, "portfolio_url", portfolio_url);
}

pub fn validate_photographer_data(data: &PhotographerData) -> ValidationResult {
    let mut result = ValidationResult::new();
    check_common(&mut result, data.years_experience, data.portfolio_url.as_deref());
    check_max_len(
        &mut result,
        "equipment_highlights",
        data.equipment_highlights.as_deref(),
        FREE_TEXT_MAX,
    );
    result
}

pub fn validate_makeup_artist_data(data: &MakeupArtistData) -> ValidationResult {
    let mut result = ValidationResult::new();
    check_common(&mut result, data.years_experience, data.portfolio_url.as_deref());
    check_max_items(&mut result, "kit_highlights", &data.kit_highlights, MAKEUP_LIST_MAX);
    check_max_items(&mut result, "services_offered", &data.services_offered, MAKEUP_LIST_MAX);
    result
}

pub fn validate_stylist_data(data: &StylistData) -> ValidationResult {
    let mut result = ValidationResult::new();
    check_common(&mut result, data.years_experience, data.portfolio_url.as_deref());
    check_max_len(&mut result, "wardrobe_access", data.wardrobe_access.as_deref(), FREE_TEXT_MAX);
    result
}

pub fn validate_producer_data(data: &ProducerData) -> ValidationResult {
    let mut result = ValidationResult::new();
    check_common(&mut result, data.years_experience, data.portfolio_url.as_deref());
    check_max_len(&mut result, "team_size", data.team_size.as_deref(), TEAM_SIZE_MAX);
    result
}

/// Validate a typed payload against the role it is meant for.
///
/// A payload of another role is rejected, so a profile can never end up
/// with data shaped for a different role.
pub fn validate_role_specific_data(data: &RoleSpecificData, role: Role) -> ValidationResult {
    if data.role() != role {
        let mut result = ValidationResult::new();
        result.add_error(
            "role_specific_data",
            ErrorKind::InvalidValue,
            format!("Role data for {} does not match role {}", data.role(), role),
        );
        return result;
    }

    match data {
        RoleSpecificData::Model(d) => validate_model_data(d),
        RoleSpecificData::Photographer(d) => validate_photographer_data(d),
        RoleSpecificData::MakeupArtist(d) => validate_makeup_artist_data(d),
        RoleSpecificData::Stylist(d) => validate_stylist_data(d),
        RoleSpecificData::Producer(d) => validate_producer_data(d),
    }
}

/// Validate an untyped payload for a role given as a string.
///
/// An unrecognised role is accepted without checks: rows written by other
/// clients may carry roles this service does not know yet.
pub fn validate_raw_role_specific_data(value: &serde_json::Value, role: &str) -> ValidationResult {
    let role: Role = match role.parse() {
        Ok(role) => role,
        Err(_) => {
            tracing::debug!(role = %role, "Skipping role data validation for unknown role");
            return ValidationResult::new();
        }
    };

    match RoleSpecificData::from_parts(role, value.clone()) {
        Ok(data) => validate_role_specific_data(&data, role),
        Err(e) => {
            let mut result = ValidationResult::new();
            result.add_error(
                "role_specific_data",
                ErrorKind::InvalidValue,
                format!("Invalid {} data: {}", role, e),
            );
            result
        }
    }
}

/// Validate the fields present in a partial profile update.
///
/// Every failing field contributes its error; nothing short-circuits.
pub fn validate_profile_update(data: &UpdateProfileRequest, role: Role) -> ValidationResult {
    let mut result = ValidationResult::new();

    if let Some(full_name) = &data.full_name {
        result.merge(validate_full_name(full_name));
    }
    if let Some(username) = &data.username {
        result.merge(validate_profile_username(username));
    }
    if let Some(bio) = &data.bio {
        result.merge(validate_bio(bio));
    }
    if let Some(location) = &data.location {
        result.merge(validate_location(location));
    }
    if let Some(role_data) = &data.role_specific_data {
        result.merge(validate_raw_role_specific_data(role_data, role.as_str()));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_model() -> ModelData {
        ModelData {
            height_cm: Some(175),
            bust_cm: Some(86),
            waist_cm: Some(62),
            hips_cm: Some(90),
            shoe_size_eu: Some(39.5),
            dress_size_eu: Some(36),
            model_type: vec!["editorial".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn valid_model_passes() {
        let result = validate_model_data(&valid_model());
        assert!(result.is_valid());
        assert!(result.errors().is_empty());
    }

    #[test]
    fn model_boundaries_are_inclusive() {
        for (height, ok) in [(139, false), (140, true), (220, true), (221, false)] {
            let data = ModelData { height_cm: Some(height), ..valid_model() };
            let result = validate_model_data(&data);
            assert_eq!(result.is_valid(), ok, "height {}", height);
            assert_eq!(result.has_error("height_cm", ErrorKind::OutOfRange), !ok);
        }

        let cases: [(&str, ModelData); 8] = [
            ("bust_cm", ModelData { bust_cm: Some(59), ..valid_model() }),
            ("bust_cm", ModelData { bust_cm: Some(151), ..valid_model() }),
            ("waist_cm", ModelData { waist_cm: Some(49), ..valid_model() }),
            ("waist_cm", ModelData { waist_cm: Some(121), ..valid_model() }),
            ("hips_cm", ModelData { hips_cm: Some(151), ..valid_model() }),
            ("shoe_size_eu", ModelData { shoe_size_eu: Some(34.5), ..valid_model() }),
            ("dress_size_eu", ModelData { dress_size_eu: Some(31), ..valid_model() }),
            ("dress_size_eu", ModelData { dress_size_eu: Some(51), ..valid_model() }),
        ];
        for (field, data) in cases {
            assert!(validate_model_data(&data).has_error(field, ErrorKind::OutOfRange), "{}", field);
        }

        let edges = ModelData {
            height_cm: Some(220),
            bust_cm: Some(150),
            waist_cm: Some(50),
            hips_cm: Some(60),
            shoe_size_eu: Some(50.0),
            dress_size_eu: Some(32),
            ..valid_model()
        };
        assert!(validate_model_data(&edges).is_valid());
    }

    #[test]
    fn photographer_rules() {
        let ok = PhotographerData {
            specialties: vec!["retrato".into()],
            years_experience: Some(50),
            portfolio_url: Some("https://ana.photo".into()),
            equipment_highlights: Some("e".repeat(500)),
            ..Default::default()
        };
        assert!(validate_photographer_data(&ok).is_valid());

        let bad = PhotographerData {
            years_experience: Some(51),
            portfolio_url: Some("not a url".into()),
            equipment_highlights: Some("e".repeat(501)),
            ..Default::default()
        };
        let result = validate_photographer_data(&bad);
        assert!(result.has_error("years_experience", ErrorKind::OutOfRange));
        assert!(result.has_error("portfolio_url", ErrorKind::InvalidUrl));
        assert!(result.has_error("equipment_highlights", ErrorKind::MaxLength));
        assert_eq!(result.errors().len(), 3);
    }

    #[test]
    fn makeup_list_caps() {
        let twenty: Vec<String> = (0..20).map(|i| format!("item {}", i)).collect();
        let ok = MakeupArtistData {
            kit_highlights: twenty.clone(),
            services_offered: twenty.clone(),
            ..Default::default()
        };
        assert!(validate_makeup_artist_data(&ok).is_valid());

        let mut too_many = twenty;
        too_many.push("extra".into());
        let bad = MakeupArtistData {
            services_offered: too_many,
            years_experience: Some(-1),
            ..Default::default()
        };
        let result = validate_makeup_artist_data(&bad);
        assert!(result.has_error("services_offered", ErrorKind::MaxLength));
        assert!(result.has_error("years_experience", ErrorKind::OutOfRange));
    }

    #[test]
    fn stylist_and_producer_text_caps() {
        let stylist = StylistData { wardrobe_access: Some("w".repeat(501)), ..Default::default() };
        assert!(validate_stylist_data(&stylist).has_error("wardrobe_access", ErrorKind::MaxLength));

        let producer = ProducerData { team_size: Some("t".repeat(101)), ..Default::default() };
        assert!(validate_producer_data(&producer).has_error("team_size", ErrorKind::MaxLength));

        let producer = ProducerData { team_size: Some("5-10 people".into()), ..Default::default() };
        assert!(validate_producer_data(&producer).is_valid());
    }

    #[test]
    fn dispatch_rejects_mismatched_variant() {
        let data = RoleSpecificData::Model(valid_model());
        assert!(validate_role_specific_data(&data, Role::Model).is_valid());

        let result = validate_role_specific_data(&data, Role::Stylist);
        assert!(result.has_error("role_specific_data", ErrorKind::InvalidValue));
    }

    #[test]
    fn dispatch_routes_to_role_rules() {
        let data = RoleSpecificData::Model(ModelData { height_cm: Some(300), ..valid_model() });
        assert!(validate_role_specific_data(&data, Role::Model).has_error("height_cm", ErrorKind::OutOfRange));
    }

    #[test]
    fn raw_unknown_role_is_accepted() {
        let value = serde_json::json!({ "height_cm": 999 });
        assert!(validate_raw_role_specific_data(&value, "director").is_valid());
        assert!(!validate_raw_role_specific_data(&value, "model").is_valid());
    }

    #[test]
    fn raw_payload_with_wrong_shape_is_invalid() {
        let value = serde_json::json!({ "budget_range": "astronomical" });
        let result = validate_raw_role_specific_data(&value, "producer");
        assert!(result.has_error("role_specific_data", ErrorKind::InvalidValue));
    }

    #[test]
    fn profile_update_collects_every_error() {
        let update = UpdateProfileRequest {
            full_name: Some("A".into()),
            bio: Some("Short".into()),
            location: Some("".into()),
            ..Default::default()
        };
        let result = validate_profile_update(&update, Role::Model);
        assert!(!result.is_valid());

        let mut fields: Vec<&str> = result.errors().iter().map(|e| e.field.as_str()).collect();
        fields.dedup();
        assert!(fields.len() >= 3);
        assert!(result.has_error("full_name", ErrorKind::MinLength));
        assert!(result.has_error("bio", ErrorKind::MinLength));
        assert!(result.has_error("location", ErrorKind::Required));
    }

    #[test]
    fn profile_update_only_checks_present_fields() {
        let update = UpdateProfileRequest {
            bio: Some("A perfectly fine biography.".into()),
            ..Default::default()
        };
        assert!(validate_profile_update(&update, Role::Photographer).is_valid());

        let update = UpdateProfileRequest {
            role_specific_data: Some(serde_json::json!({ "years_experience": 60 })),
            ..Default::default()
        };
        let result = validate_profile_update(&update, Role::Stylist);
        assert!(result.has_error("years_experience", ErrorKind::OutOfRange));
    }
}
