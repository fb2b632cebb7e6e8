//! Canonical survey fields.
//!
//! Every component agrees on this field set: submissions serialize it in
//! wire order, the sheet store lays its columns out in the same order, and
//! the fallback export projects the 15-column "collect all" subset.

/// One canonical survey field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SurveyField {
    SessionId,
    Email,
    Timestamp,
    LastUpdated,
    Services,
    Duration,
    WorkTime,
    GenderPreference,
    HoursPerWeek,
    FoodArrangement,
    HouseholdMembers,
    HeadOfHouseholdAge,
    BedroomCount,
    ZipCode,
    Address,
    FirstName,
    SelectedPlan,
    CurrentPage,
}

impl SurveyField {
    /// Every field, in wire order.
    pub const ALL: [SurveyField; 18] = [
        SurveyField::SessionId,
        SurveyField::Email,
        SurveyField::Timestamp,
        SurveyField::LastUpdated,
        SurveyField::Services,
        SurveyField::Duration,
        SurveyField::WorkTime,
        SurveyField::GenderPreference,
        SurveyField::HoursPerWeek,
        SurveyField::FoodArrangement,
        SurveyField::HouseholdMembers,
        SurveyField::HeadOfHouseholdAge,
        SurveyField::BedroomCount,
        SurveyField::ZipCode,
        SurveyField::Address,
        SurveyField::FirstName,
        SurveyField::SelectedPlan,
        SurveyField::CurrentPage,
    ];

    /// Key used for this field in form-encoded and JSON submissions.
    pub fn wire_key(self) -> &'static str {
        match self {
            SurveyField::SessionId => "sessionId",
            SurveyField::Email => "email",
            SurveyField::Timestamp => "timestamp",
            SurveyField::LastUpdated => "lastUpdated",
            SurveyField::Services => "services",
            SurveyField::Duration => "duration",
            SurveyField::WorkTime => "workTime",
            SurveyField::GenderPreference => "genderPreference",
            SurveyField::HoursPerWeek => "hoursPerWeek",
            SurveyField::FoodArrangement => "foodArrangement",
            SurveyField::HouseholdMembers => "householdMembers",
            SurveyField::HeadOfHouseholdAge => "headOfHouseholdAge",
            SurveyField::BedroomCount => "bedroomCount",
            SurveyField::ZipCode => "zipCode",
            SurveyField::Address => "address",
            SurveyField::FirstName => "firstName",
            SurveyField::SelectedPlan => "selectedPlan",
            SurveyField::CurrentPage => "currentPage",
        }
    }

    /// Column title used by the sheet store and the CSV export.
    pub fn column_title(self) -> &'static str {
        match self {
            SurveyField::SessionId => "Session Id",
            SurveyField::Email => "Email",
            SurveyField::Timestamp => "Timestamp",
            SurveyField::LastUpdated => "Last Updated",
            SurveyField::Services => "Services",
            SurveyField::Duration => "Duration",
            SurveyField::WorkTime => "Work Time",
            SurveyField::GenderPreference => "Gender Preference",
            SurveyField::HoursPerWeek => "Hours Per Week",
            SurveyField::FoodArrangement => "Food Arrangement",
            SurveyField::HouseholdMembers => "Household Members",
            SurveyField::HeadOfHouseholdAge => "Head of Household Age",
            SurveyField::BedroomCount => "Bedroom Count",
            SurveyField::ZipCode => "Zip Code",
            SurveyField::Address => "Address",
            SurveyField::FirstName => "First Name",
            SurveyField::SelectedPlan => "Selected Plan",
            SurveyField::CurrentPage => "Current Page",
        }
    }

    /// Parse a wire key back into a field. Unknown keys yield `None`.
    pub fn from_wire_key(key: &str) -> Option<SurveyField> {
        SurveyField::ALL
            .into_iter()
            .find(|field| field.wire_key() == key)
    }
}

/// Columns of the fallback export, in the fixed "collect all" order.
pub const EXPORT_FIELDS: [SurveyField; 15] = [
    SurveyField::Timestamp,
    SurveyField::Services,
    SurveyField::Duration,
    SurveyField::WorkTime,
    SurveyField::GenderPreference,
    SurveyField::HoursPerWeek,
    SurveyField::FoodArrangement,
    SurveyField::HouseholdMembers,
    SurveyField::HeadOfHouseholdAge,
    SurveyField::BedroomCount,
    SurveyField::ZipCode,
    SurveyField::Address,
    SurveyField::FirstName,
    SurveyField::Email,
    SurveyField::SelectedPlan,
];
