use crate::entities::CanonicalField;

impl CanonicalField {
    /// Task description sent ahead of the record text.
    pub fn instruction(self) -> &'static str {
        match self {
            CanonicalField::CityCountry => "Extract only country name",
            CanonicalField::OpenCallTitle => "Extract only open call title",
            CanonicalField::DeadlineDate => "Extract only deadline date in YYYY-MM-DD",
            CanonicalField::EventDate => "Extract only event date in YYYY-MM-DD",
            CanonicalField::ApplicationFormLink => "Extract only application link",
            CanonicalField::SelectionCriteria => "Extract only selection criteria",
            CanonicalField::Faq => "Generate FAQ from data",
            CanonicalField::ApplicationGuide => "Generate application guide from data",
            CanonicalField::Fee => "Extract only fee information",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_instructions_are_distinct() {
        let distinct: HashSet<_> = CanonicalField::ALL.iter().map(|f| f.instruction()).collect();
        assert_eq!(distinct.len(), CanonicalField::ALL.len());
    }

    #[test]
    fn test_date_fields_ask_for_iso_format() {
        assert!(CanonicalField::DeadlineDate.instruction().ends_with("YYYY-MM-DD"));
        assert!(CanonicalField::EventDate.instruction().ends_with("YYYY-MM-DD"));
    }
}
