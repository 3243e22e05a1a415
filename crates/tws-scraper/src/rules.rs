use scraper::ElementRef;

use crate::dom::{stripped_text, Locator};
use crate::record::{Field, TenderRecord, Value};

/// Everything a rule may need besides the document itself.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    pub source_url: String,
    /// ISO code of the amounts found on the page
    pub currency: String,
    /// Conversion rate applied to estimated values
    pub rate: f64,
}

pub type Assignments = Vec<(Field, Option<Value>)>;

pub type CustomFn = fn(ElementRef<'_>, &ExtractContext) -> anyhow::Result<Assignments>;

/// One extraction step filling one or more fields of a record.
pub enum Rule {
    /// Locates a single element and post-processes its stripped text.
    Text {
        field: Field,
        locator: Locator,
        post: fn(String) -> Option<Value>,
    },
    /// Arbitrary extraction, for fields built from several anchors.
    Custom {
        name: &'static str,
        fields: &'static [Field],
        extract: CustomFn,
    },
}

impl Rule {
    pub fn text(field: Field, locator: Locator) -> Self {
        Self::Text {
            field,
            locator,
            post: non_empty,
        }
    }

    pub fn text_with(field: Field, locator: Locator, post: fn(String) -> Option<Value>) -> Self {
        Self::Text {
            field,
            locator,
            post,
        }
    }

    pub fn custom(name: &'static str, fields: &'static [Field], extract: CustomFn) -> Self {
        Self::Custom {
            name,
            fields,
            extract,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Rule::Text { field, .. } => field.header(),
            Rule::Custom { name, .. } => name,
        }
    }

    pub fn fields(&self) -> &[Field] {
        match self {
            Rule::Text { field, .. } => std::slice::from_ref(field),
            Rule::Custom { fields, .. } => fields,
        }
    }

    pub fn apply(&self, root: ElementRef<'_>, ctx: &ExtractContext) -> anyhow::Result<Assignments> {
        match self {
            Rule::Text {
                field,
                locator,
                post,
            } => {
                let value = locator
                    .locate(root)
                    .map(|elem| stripped_text(&elem))
                    .and_then(post);
                Ok(vec![(*field, value)])
            }
            Rule::Custom { extract, .. } => extract(root, ctx),
        }
    }
}

/// Runs every rule in order. A failing rule leaves its fields absent and does
/// not stop the following ones.
pub fn evaluate(rules: &[Rule], root: ElementRef<'_>, ctx: &ExtractContext, record: &mut TenderRecord) {
    for rule in rules {
        match rule.apply(root, ctx) {
            Ok(values) => {
                for (field, value) in values {
                    record.set(field, value);
                }
            }
            Err(e) => {
                log::debug!("Rule '{}' failed: {e}", rule.name());
                for field in rule.fields() {
                    record.set(*field, None);
                }
            }
        }
    }
}

pub fn non_empty(text: String) -> Option<Value> {
    if text.is_empty() {
        None
    } else {
        Some(Value::Text(text))
    }
}

/// Text after the last `:`, trimmed.
pub fn after_last_colon(text: &str) -> &str {
    text.rsplit(':').next().unwrap_or(text).trim()
}

#[cfg(test)]
mod tests {
    use anyhow::bail;
    use scraper::Html;

    use super::*;
    use crate::dom::{root, Matcher};

    fn ctx() -> ExtractContext {
        ExtractContext {
            source_url: "https://example.org".into(),
            currency: "GBP".into(),
            rate: 2.0,
        }
    }

    fn always_fails(_: ElementRef<'_>, _: &ExtractContext) -> anyhow::Result<Assignments> {
        bail!("unexpected structure")
    }

    #[test]
    fn failing_rule_does_not_stop_the_next() {
        let html = Html::parse_document("<h1>Title</h1>");
        let rules = vec![
            Rule::custom("broken", &[Field::Winners, Field::Bidders], always_fails),
            Rule::text(Field::Title, Locator::new(Matcher::tag("h1"))),
        ];

        let mut record = TenderRecord::new();
        record.set(Field::Winners, Some("stale".into()));
        evaluate(&rules, root(&html), &ctx(), &mut record);

        assert_eq!(record.text(Field::Title), Some("Title"));
        assert!(!record.is_present(Field::Winners));
        assert!(!record.is_present(Field::Bidders));
    }

    #[test]
    fn empty_text_is_absent() {
        let html = Html::parse_document("<h1>   </h1>");
        let rule = Rule::text(Field::Title, Locator::new(Matcher::tag("h1")));
        let values = rule.apply(root(&html), &ctx()).unwrap();
        assert_eq!(values, vec![(Field::Title, None)]);
    }

    #[test]
    fn colon_split_keeps_last_part() {
        assert_eq!(after_last_colon("Number of tenders received: 4"), "4");
        assert_eq!(after_last_colon("no colon "), "no colon");
    }
}
