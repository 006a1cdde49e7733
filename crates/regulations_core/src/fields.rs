/// Descriptive metadata fields understood by the backend.
///
/// The wire key of a field is its lower-cased label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetadataField {
    Text,
    Dokumententitel,
    Herausgeber,
    Verlag,
    Erscheinungsort,
    Erscheinungsdatum,
    Erscheinungsjahr,
    Erlassdatum,
    Inkrafttreten,
    Seitenzahl,
}

impl MetadataField {
    /// Every field, in display order. Used by the search form.
    pub const ALL: [MetadataField; 10] = [
        MetadataField::Text,
        MetadataField::Dokumententitel,
        MetadataField::Herausgeber,
        MetadataField::Verlag,
        MetadataField::Erscheinungsort,
        MetadataField::Erscheinungsdatum,
        MetadataField::Erscheinungsjahr,
        MetadataField::Erlassdatum,
        MetadataField::Inkrafttreten,
        MetadataField::Seitenzahl,
    ];

    /// Fields the user can set on an upload (full text is not one of them).
    pub const UPLOAD: [MetadataField; 9] = [
        MetadataField::Dokumententitel,
        MetadataField::Herausgeber,
        MetadataField::Verlag,
        MetadataField::Erscheinungsort,
        MetadataField::Erscheinungsdatum,
        MetadataField::Erscheinungsjahr,
        MetadataField::Erlassdatum,
        MetadataField::Inkrafttreten,
        MetadataField::Seitenzahl,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MetadataField::Text => "Text",
            MetadataField::Dokumententitel => "Dokumententitel",
            MetadataField::Herausgeber => "Herausgeber",
            MetadataField::Verlag => "Verlag",
            MetadataField::Erscheinungsort => "Erscheinungsort",
            MetadataField::Erscheinungsdatum => "Erscheinungsdatum",
            MetadataField::Erscheinungsjahr => "Erscheinungsjahr",
            MetadataField::Erlassdatum => "Erlassdatum",
            MetadataField::Inkrafttreten => "Inkrafttreten",
            MetadataField::Seitenzahl => "Seitenzahl",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            MetadataField::Text => "text",
            MetadataField::Dokumententitel => "dokumententitel",
            MetadataField::Herausgeber => "herausgeber",
            MetadataField::Verlag => "verlag",
            MetadataField::Erscheinungsort => "erscheinungsort",
            MetadataField::Erscheinungsdatum => "erscheinungsdatum",
            MetadataField::Erscheinungsjahr => "erscheinungsjahr",
            MetadataField::Erlassdatum => "erlassdatum",
            MetadataField::Inkrafttreten => "inkrafttreten",
            MetadataField::Seitenzahl => "seitenzahl",
        }
    }

    /// Case-insensitive lookup by key or label.
    pub fn from_key(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(raw))
    }
}

/// Ordered form values for a fixed set of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValues {
    entries: Vec<(MetadataField, String)>,
}

impl FieldValues {
    pub fn new(fields: &[MetadataField]) -> Self {
        Self {
            entries: fields.iter().map(|field| (*field, String::new())).collect(),
        }
    }

    pub fn upload() -> Self {
        Self::new(&MetadataField::UPLOAD)
    }

    pub fn search() -> Self {
        Self::new(&MetadataField::ALL)
    }

    /// Returns false when the field is not part of this form.
    pub fn set(&mut self, field: MetadataField, value: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some((_, slot)) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, field: MetadataField) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetadataField, &str)> {
        self.entries.iter().map(|(field, value)| (*field, value.as_str()))
    }

    /// True when every value is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.entries.iter().all(|(_, value)| value.trim().is_empty())
    }

    /// Wire representation: lower-cased keys in form order, empty values kept.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(field, value)| (field.key().to_string(), value.clone()))
            .collect()
    }

    pub fn clear(&mut self) {
        for (_, value) in &mut self.entries {
            value.clear();
        }
    }
}
