//! Profile domain types
//!
//! A profile's role is carried by its `RoleSpecificData` variant, so the
//! role and the role payload can never be set independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::portfolio::PortfolioImage;

/// Professional role of a profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Model,
    Photographer,
    MakeupArtist,
    Stylist,
    Producer,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Model,
        Role::Photographer,
        Role::MakeupArtist,
        Role::Stylist,
        Role::Producer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Photographer => "photographer",
            Self::MakeupArtist => "makeup_artist",
            Self::Stylist => "stylist",
            Self::Producer => "producer",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "model" => Ok(Self::Model),
            "photographer" => Ok(Self::Photographer),
            "makeup_artist" => Ok(Self::MakeupArtist),
            "stylist" => Ok(Self::Stylist),
            "producer" => Ok(Self::Producer),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Pro,
}

impl From<String> for SubscriptionTier {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pro" => Self::Pro,
            _ => Self::Free,
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Pro => write!(f, "pro"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
    Professional,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Professional => "professional",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HairColor {
    Black,
    Brown,
    Blonde,
    Red,
    Gray,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EyeColor {
    Brown,
    Blue,
    Green,
    Hazel,
    Gray,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StudioAccess {
    OwnStudio,
    RentalAccess,
    NoStudio,
}

impl StudioAccess {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OwnStudio => "own_studio",
            Self::RentalAccess => "rental_access",
            Self::NoStudio => "no_studio",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BudgetRange {
    Low,
    Medium,
    High,
    Premium,
}

impl BudgetRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Premium => "premium",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ModelData {
    #[serde(default)]
    pub height_cm: Option<i32>,
    #[serde(default)]
    pub bust_cm: Option<i32>,
    #[serde(default)]
    pub waist_cm: Option<i32>,
    #[serde(default)]
    pub hips_cm: Option<i32>,
    #[serde(default)]
    pub shoe_size_eu: Option<f32>,
    #[serde(default)]
    pub dress_size_eu: Option<i32>,
    #[serde(default)]
    pub hair_color: Option<HairColor>,
    #[serde(default)]
    pub eye_color: Option<EyeColor>,
    #[serde(default)]
    pub has_tattoos: bool,
    #[serde(default)]
    pub has_piercings: bool,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub model_type: Vec<String>,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default)]
    pub travel_availability: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PhotographerData {
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default)]
    pub studio_access: Option<StudioAccess>,
    #[serde(default)]
    pub equipment_highlights: Option<String>,
    #[serde(default)]
    pub post_production_skills: Vec<String>,
    #[serde(default)]
    pub years_experience: Option<i32>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub travel_availability: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MakeupArtistData {
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default)]
    pub kit_highlights: Vec<String>,
    #[serde(default)]
    pub services_offered: Vec<String>,
    #[serde(default)]
    pub years_experience: Option<i32>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub travel_availability: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StylistData {
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default)]
    pub wardrobe_access: Option<String>,
    #[serde(default)]
    pub years_experience: Option<i32>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub travel_availability: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProducerData {
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default)]
    pub team_size: Option<String>,
    #[serde(default)]
    pub budget_range: Option<BudgetRange>,
    #[serde(default)]
    pub years_experience: Option<i32>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
}

/// Role-specific attributes, keyed by role.
///
/// Serialized adjacently tagged so a flattened profile reads as
/// `{"role": "model", "role_specific_data": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", content = "role_specific_data", rename_all = "snake_case")]
pub enum RoleSpecificData {
    Model(ModelData),
    Photographer(PhotographerData),
    MakeupArtist(MakeupArtistData),
    Stylist(StylistData),
    Producer(ProducerData),
}

impl RoleSpecificData {
    /// Empty payload for a freshly created profile of `role`
    pub fn empty(role: Role) -> Self {
        match role {
            Role::Model => Self::Model(ModelData::default()),
            Role::Photographer => Self::Photographer(PhotographerData::default()),
            Role::MakeupArtist => Self::MakeupArtist(MakeupArtistData::default()),
            Role::Stylist => Self::Stylist(StylistData::default()),
            Role::Producer => Self::Producer(ProducerData::default()),
        }
    }

    /// Parse an untagged JSON payload as the variant belonging to `role`
    pub fn from_parts(role: Role, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match role {
            Role::Model => Self::Model(serde_json::from_value(value)?),
            Role::Photographer => Self::Photographer(serde_json::from_value(value)?),
            Role::MakeupArtist => Self::MakeupArtist(serde_json::from_value(value)?),
            Role::Stylist => Self::Stylist(serde_json::from_value(value)?),
            Role::Producer => Self::Producer(serde_json::from_value(value)?),
        })
    }

    /// Untagged JSON payload, as stored in the `role_specific_data` column
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Model(d) => serde_json::to_value(d),
            Self::Photographer(d) => serde_json::to_value(d),
            Self::MakeupArtist(d) => serde_json::to_value(d),
            Self::Stylist(d) => serde_json::to_value(d),
            Self::Producer(d) => serde_json::to_value(d),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Model(_) => Role::Model,
            Self::Photographer(_) => Role::Photographer,
            Self::MakeupArtist(_) => Role::MakeupArtist,
            Self::Stylist(_) => Role::Stylist,
            Self::Producer(_) => Role::Producer,
        }
    }

    pub fn experience_level(&self) -> Option<ExperienceLevel> {
        match self {
            Self::Model(d) => d.experience_level,
            Self::Photographer(d) => d.experience_level,
            Self::MakeupArtist(d) => d.experience_level,
            Self::Stylist(d) => d.experience_level,
            Self::Producer(d) => d.experience_level,
        }
    }

    /// Specialty list used by search: `model_type` for models, `specialties` otherwise
    pub fn specialty_list(&self) -> &[String] {
        match self {
            Self::Model(d) => &d.model_type,
            Self::Photographer(d) => &d.specialties,
            Self::MakeupArtist(d) => &d.specialties,
            Self::Stylist(d) => &d.specialties,
            Self::Producer(d) => &d.specialties,
        }
    }

    /// `None` for roles without a travel field
    pub fn travel_availability(&self) -> Option<bool> {
        match self {
            Self::Model(d) => Some(d.travel_availability),
            Self::Photographer(d) => Some(d.travel_availability),
            Self::MakeupArtist(d) => Some(d.travel_availability),
            Self::Stylist(d) => Some(d.travel_availability),
            Self::Producer(_) => None,
        }
    }

    pub fn studio_access(&self) -> Option<StudioAccess> {
        match self {
            Self::Photographer(d) => d.studio_access,
            _ => None,
        }
    }

    pub fn budget_range(&self) -> Option<BudgetRange> {
        match self {
            Self::Producer(d) => d.budget_range,
            _ => None,
        }
    }
}

/// Profile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub bio: String,
    pub location: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub subscription_tier: SubscriptionTier,
    #[serde(flatten)]
    pub role_data: RoleSpecificData,
    #[serde(default)]
    pub portfolio: Vec<PortfolioImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn role(&self) -> Role {
        self.role_data.role()
    }
}

/// Partial profile update. Absent fields are left untouched.
///
/// `role_specific_data` is untyped here; it is parsed against the stored
/// role of the profile being updated.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub role_specific_data: Option<serde_json::Value>,
}

/// Which profile image slot an upload targets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    Avatar,
    Cover,
    Portfolio,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avatar => "avatar",
            Self::Cover => "cover",
            Self::Portfolio => "portfolio",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("director".parse::<Role>().is_err());
    }

    #[test]
    fn from_parts_parses_payload_for_role() {
        let value = serde_json::json!({ "height_cm": 175, "model_type": ["editorial"] });
        let data = RoleSpecificData::from_parts(Role::Model, value).unwrap();
        assert_eq!(data.role(), Role::Model);
        assert_eq!(data.specialty_list(), ["editorial".to_string()]);

        let bad = serde_json::json!({ "studio_access": "castle" });
        assert!(RoleSpecificData::from_parts(Role::Photographer, bad).is_err());
    }

    #[test]
    fn role_only_fields_are_none_elsewhere() {
        let producer = RoleSpecificData::Producer(ProducerData {
            budget_range: Some(BudgetRange::High),
            ..Default::default()
        });
        assert_eq!(producer.travel_availability(), None);
        assert_eq!(producer.studio_access(), None);
        assert_eq!(producer.budget_range(), Some(BudgetRange::High));

        let photographer = RoleSpecificData::empty(Role::Photographer);
        assert_eq!(photographer.travel_availability(), Some(false));
        assert_eq!(photographer.budget_range(), None);
    }

    #[test]
    fn tagged_serialization_carries_role() {
        let data = RoleSpecificData::empty(Role::Stylist);
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["role"], "stylist");
        assert!(json["role_specific_data"].is_object());
    }
}
