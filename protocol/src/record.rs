//! The accumulating survey record.

use serde::Deserialize;
use serde::Serialize;

use crate::fields::SurveyField;

/// A respondent's accumulated answers. An empty string means "unset"; the
/// wire and the sheet store never distinguish missing from empty.
///
/// `timestamp` is stamped once and then immutable across merges;
/// `last_updated` is restamped on every submission. Everything else follows
/// last-non-empty-wins semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurveyRecord {
    pub session_id: String,
    pub email: String,
    pub timestamp: String,
    pub last_updated: String,
    pub services: String,
    pub duration: String,
    pub work_time: String,
    pub gender_preference: String,
    pub hours_per_week: String,
    pub food_arrangement: String,
    pub household_members: String,
    pub head_of_household_age: String,
    pub bedroom_count: String,
    pub zip_code: String,
    pub address: String,
    pub first_name: String,
    #[serde(alias = "plan")]
    pub selected_plan: String,
    pub current_page: String,
}

impl SurveyRecord {
    pub fn value(&self, field: SurveyField) -> &str {
        match field {
            SurveyField::SessionId => &self.session_id,
            SurveyField::Email => &self.email,
            SurveyField::Timestamp => &self.timestamp,
            SurveyField::LastUpdated => &self.last_updated,
            SurveyField::Services => &self.services,
            SurveyField::Duration => &self.duration,
            SurveyField::WorkTime => &self.work_time,
            SurveyField::GenderPreference => &self.gender_preference,
            SurveyField::HoursPerWeek => &self.hours_per_week,
            SurveyField::FoodArrangement => &self.food_arrangement,
            SurveyField::HouseholdMembers => &self.household_members,
            SurveyField::HeadOfHouseholdAge => &self.head_of_household_age,
            SurveyField::BedroomCount => &self.bedroom_count,
            SurveyField::ZipCode => &self.zip_code,
            SurveyField::Address => &self.address,
            SurveyField::FirstName => &self.first_name,
            SurveyField::SelectedPlan => &self.selected_plan,
            SurveyField::CurrentPage => &self.current_page,
        }
    }

    pub fn set_value(&mut self, field: SurveyField, value: impl Into<String>) {
        let value = value.into();
        let slot = match field {
            SurveyField::SessionId => &mut self.session_id,
            SurveyField::Email => &mut self.email,
            SurveyField::Timestamp => &mut self.timestamp,
            SurveyField::LastUpdated => &mut self.last_updated,
            SurveyField::Services => &mut self.services,
            SurveyField::Duration => &mut self.duration,
            SurveyField::WorkTime => &mut self.work_time,
            SurveyField::GenderPreference => &mut self.gender_preference,
            SurveyField::HoursPerWeek => &mut self.hours_per_week,
            SurveyField::FoodArrangement => &mut self.food_arrangement,
            SurveyField::HouseholdMembers => &mut self.household_members,
            SurveyField::HeadOfHouseholdAge => &mut self.head_of_household_age,
            SurveyField::BedroomCount => &mut self.bedroom_count,
            SurveyField::ZipCode => &mut self.zip_code,
            SurveyField::Address => &mut self.address,
            SurveyField::FirstName => &mut self.first_name,
            SurveyField::SelectedPlan => &mut self.selected_plan,
            SurveyField::CurrentPage => &mut self.current_page,
        };
        *slot = value;
    }

    /// True when `field` holds a value that is non-empty after trimming.
    pub fn has_value(&self, field: SurveyField) -> bool {
        !self.value(field).trim().is_empty()
    }

    /// Fold `incoming` into `self`: a field is replaced only when the
    /// incoming value is non-empty after trimming, and an already-set
    /// `timestamp` is never replaced.
    pub fn merge_non_empty(&mut self, incoming: &SurveyRecord) {
        for field in SurveyField::ALL {
            if !incoming.has_value(field) {
                continue;
            }
            if field == SurveyField::Timestamp && self.has_value(SurveyField::Timestamp) {
                continue;
            }
            self.set_value(field, incoming.value(field));
        }
    }
}
