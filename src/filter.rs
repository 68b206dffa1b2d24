use crate::source::record::LogRecord;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Admits a record iff it is at least as severe as `threshold`.
/// Lower numbers are more severe, so this is `priority <= threshold`.
pub fn severity_admits(record: &LogRecord, threshold: u8) -> bool {
    record.priority <= threshold
}

/// Case-sensitive substrings matched against a record's service id and unit.
/// An empty set matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    patterns: Vec<String>,
}

impl FilterSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self { patterns }
    }

    /// Parse the comma-separated form, e.g. `"nginx,postgres"`.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn admits(&self, record: &LogRecord) -> bool {
        self.patterns.is_empty()
            || self
                .patterns
                .iter()
                .any(|p| record.service_id.contains(p.as_str()) || record.unit.contains(p.as_str()))
    }
}

impl Serialize for FilterSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.patterns.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FilterSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawFilters {
            Csv(String),
            List(Vec<String>),
        }

        let raw = Option::<RawFilters>::deserialize(deserializer)?;
        Ok(match raw {
            None => FilterSet::default(),
            Some(RawFilters::Csv(list)) => FilterSet::parse(&list),
            Some(RawFilters::List(items)) => FilterSet::new(items),
        })
    }
}
