use serde::{Deserialize, Serialize};

/// --- Scraped listing ---

/// One opportunity as scraped from the listing page. Every attribute is
/// present; a missing source element yields an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Data-d")]
    pub location_tag: String,
    #[serde(rename = "Data-a")]
    pub status_tag: String,
    #[serde(rename = "Heading")]
    pub heading: String,
    #[serde(rename = "Alert")]
    pub alert_badge: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Date Updated")]
    pub date_updated: String,
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "URL")]
    pub application_url: String,
}

impl RawRecord {
    /// Persisted column names, in declaration order.
    pub const COLUMNS: [&'static str; 8] = [
        "Data-d",
        "Data-a",
        "Heading",
        "Alert",
        "Title",
        "Date Updated",
        "Body",
        "URL",
    ];

    /// `(column, value)` pairs in declaration order.
    pub fn columns(&self) -> [(&'static str, &str); 8] {
        [
            (Self::COLUMNS[0], self.location_tag.as_str()),
            (Self::COLUMNS[1], self.status_tag.as_str()),
            (Self::COLUMNS[2], self.heading.as_str()),
            (Self::COLUMNS[3], self.alert_badge.as_str()),
            (Self::COLUMNS[4], self.title.as_str()),
            (Self::COLUMNS[5], self.date_updated.as_str()),
            (Self::COLUMNS[6], self.body.as_str()),
            (Self::COLUMNS[7], self.application_url.as_str()),
        ]
    }
}

/// --- Canonical schema ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    CityCountry,
    OpenCallTitle,
    DeadlineDate,
    EventDate,
    ApplicationFormLink,
    SelectionCriteria,
    Faq,
    ApplicationGuide,
    Fee,
}

impl CanonicalField {
    /// All fields in canonical column order.
    pub const ALL: [CanonicalField; 9] = [
        CanonicalField::CityCountry,
        CanonicalField::OpenCallTitle,
        CanonicalField::DeadlineDate,
        CanonicalField::EventDate,
        CanonicalField::ApplicationFormLink,
        CanonicalField::SelectionCriteria,
        CanonicalField::Faq,
        CanonicalField::ApplicationGuide,
        CanonicalField::Fee,
    ];

    /// Column name used in persisted canonical tables.
    pub fn column(self) -> &'static str {
        match self {
            CanonicalField::CityCountry => "City_Country",
            CanonicalField::OpenCallTitle => "Open_Call_Title",
            CanonicalField::DeadlineDate => "Deadline_Date",
            CanonicalField::EventDate => "Event_Date",
            CanonicalField::ApplicationFormLink => "Application_Form_Link",
            CanonicalField::SelectionCriteria => "Selection_Criteria",
            CanonicalField::Faq => "FAQ",
            CanonicalField::ApplicationGuide => "Application_Guide",
            CanonicalField::Fee => "Fee",
        }
    }
}

/// Normalized open call. Deadline and event dates are `YYYY-MM-DD` when the
/// backend complied, otherwise whatever text it returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(rename = "City_Country")]
    pub city_country: String,
    #[serde(rename = "Open_Call_Title")]
    pub open_call_title: String,
    #[serde(rename = "Deadline_Date")]
    pub deadline_date: String,
    #[serde(rename = "Event_Date")]
    pub event_date: String,
    #[serde(rename = "Application_Form_Link")]
    pub application_form_link: String,
    #[serde(rename = "Selection_Criteria")]
    pub selection_criteria: String,
    #[serde(rename = "FAQ")]
    pub faq: String,
    #[serde(rename = "Application_Guide")]
    pub application_guide: String,
    #[serde(rename = "Fee")]
    pub fee: String,
}

impl CanonicalRecord {
    /// Assemble a record positionally from values in `CanonicalField::ALL` order.
    pub fn from_values(values: [String; 9]) -> Self {
        let [
            city_country,
            open_call_title,
            deadline_date,
            event_date,
            application_form_link,
            selection_criteria,
            faq,
            application_guide,
            fee,
        ] = values;
        Self {
            city_country,
            open_call_title,
            deadline_date,
            event_date,
            application_form_link,
            selection_criteria,
            faq,
            application_guide,
            fee,
        }
    }

    pub fn get(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::CityCountry => &self.city_country,
            CanonicalField::OpenCallTitle => &self.open_call_title,
            CanonicalField::DeadlineDate => &self.deadline_date,
            CanonicalField::EventDate => &self.event_date,
            CanonicalField::ApplicationFormLink => &self.application_form_link,
            CanonicalField::SelectionCriteria => &self.selection_criteria,
            CanonicalField::Faq => &self.faq,
            CanonicalField::ApplicationGuide => &self.application_guide,
            CanonicalField::Fee => &self.fee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_values_is_positional() {
        let values = CanonicalField::ALL.map(|f| f.column().to_lowercase());
        let record = CanonicalRecord::from_values(values);
        for field in CanonicalField::ALL {
            assert_eq!(record.get(field), field.column().to_lowercase());
        }
    }

    #[test]
    fn raw_columns_follow_declaration_order() {
        let record = RawRecord {
            location_tag: "london".into(),
            title: "Residency".into(),
            application_url: "https://example.com/apply".into(),
            ..Default::default()
        };
        let columns = record.columns();
        assert_eq!(columns[0], ("Data-d", "london"));
        assert_eq!(columns[4], ("Title", "Residency"));
        assert_eq!(columns[7], ("URL", "https://example.com/apply"));
        assert_eq!(columns[1], ("Data-a", ""));
    }
}
