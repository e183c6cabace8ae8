use serde::Serialize;

use crate::entities::CanonicalRecord;

/// JSON body accepted by the open calls API.
///
/// The API spells the link field `application_from_link`; that name is part
/// of the remote schema and must be sent as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenCallPayload {
    pub city_country: String,
    pub open_call_title: String,
    pub deadline_date: String,
    pub event_date: String,
    pub application_from_link: String,
    pub selection_criteria: String,
    pub faq: String,
    pub fee: String,
    pub application_guide: String,
    pub open_call_description: String,
}

impl From<&CanonicalRecord> for OpenCallPayload {
    fn from(record: &CanonicalRecord) -> Self {
        Self {
            city_country: record.city_country.clone(),
            open_call_title: record.open_call_title.clone(),
            deadline_date: record.deadline_date.clone(),
            event_date: record.event_date.clone(),
            application_from_link: record.application_form_link.clone(),
            selection_criteria: record.selection_criteria.clone(),
            faq: record.faq.clone(),
            fee: record.fee.clone(),
            application_guide: record.application_guide.clone(),
            open_call_description: describe(record),
        }
    }
}

pub fn describe(record: &CanonicalRecord) -> String {
    format!(
        "Open call in {} titled {}.",
        record.city_country, record.open_call_title
    )
}
