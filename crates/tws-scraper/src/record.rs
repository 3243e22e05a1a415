use std::fmt;

/// Output columns, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    TenderId,
    Title,
    IssuingAuthority,
    PublicationDate,
    AwardDate,
    ContractDuration,
    FinalPrice,
    EstimatedValueConverted,
    EstimatedValue,
    Currency,
    Winners,
    Bidders,
    Units,
    SourceUrl,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::TenderId,
        Field::Title,
        Field::IssuingAuthority,
        Field::PublicationDate,
        Field::AwardDate,
        Field::ContractDuration,
        Field::FinalPrice,
        Field::EstimatedValueConverted,
        Field::EstimatedValue,
        Field::Currency,
        Field::Winners,
        Field::Bidders,
        Field::Units,
        Field::SourceUrl,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Field::TenderId => "Tender ID/Reference Number",
            Field::Title => "Tender Title",
            Field::IssuingAuthority => "Issuing Authority",
            Field::PublicationDate => "Publication Date",
            Field::AwardDate => "Award Date",
            Field::ContractDuration => "Contract Duration",
            Field::FinalPrice => "Final Contract Price (Original)",
            Field::EstimatedValueConverted => "Estimated Contract Value (INR)",
            Field::EstimatedValue => "Estimated Contract Value (Original)",
            Field::Currency => "Currency (Original)",
            Field::Winners => "Winning Company/Companies",
            Field::Bidders => "List of Participating Companies (bidders)",
            Field::Units => "Number of units/doses required",
            Field::SourceUrl => "Source URL",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Amount(f64),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Amount(_) => None,
        }
    }

    pub fn as_amount(&self) -> Option<f64> {
        match self {
            Value::Amount(n) => Some(*n),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Amount(n) => write!(f, "{n:?}"),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Amount(n)
    }
}

/// One tender, always carrying every column; absent values are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenderRecord {
    values: [Option<Value>; 14],
}

impl TenderRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<&Value> {
        self.values[field.index()].as_ref()
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(Value::as_text)
    }

    pub fn amount(&self, field: Field) -> Option<f64> {
        self.get(field).and_then(Value::as_amount)
    }

    pub fn set(&mut self, field: Field, value: Option<Value>) {
        self.values[field.index()] = value;
    }

    pub fn is_present(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    /// Columns in table order, paired with their value.
    pub fn iter(&self) -> impl Iterator<Item = (Field, Option<&Value>)> + '_ {
        Field::ALL.iter().map(move |&f| (f, self.get(f)))
    }

    pub fn to_string_record(&self) -> csv::StringRecord {
        self.iter()
            .map(|(_, v)| v.map(Value::to_string).unwrap_or_default())
            .collect()
    }

    pub fn headers() -> csv::StringRecord {
        Field::ALL.iter().map(|f| f.header()).collect()
    }
}
