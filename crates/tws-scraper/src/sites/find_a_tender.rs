//! Contract award notices from find-tender.service.gov.uk.
//!
//! Notices follow the numbered sections of the standard award form, e.g.
//! `V.2.4) Information on value of contract/lot`, each rendered as an `h4`
//! wrapping a `span` and followed by sibling paragraphs.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use super::{Site, SiteExtractor};
use crate::dom::{next_siblings, stripped_text, Locator, Matcher, Step};
use crate::normalize::{normalize_date, parse_amount};
use crate::record::{Field, Value};
use crate::rules::{after_last_colon, non_empty, Assignments, ExtractContext, Rule};

pub struct FindATender;

impl SiteExtractor for FindATender {
    fn site(&self) -> Site {
        Site::FindATender
    }

    fn rules(&self) -> &[Rule] {
        &RULES
    }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::text(Field::Title, Locator::new(title())),
        Rule::text_with(
            Field::TenderId,
            Locator::new(Matcher::tag("p").string("Notice identifier:")),
            |text| non_empty(text.replace("Notice identifier:", "").trim().to_string()),
        ),
        Rule::text_with(
            Field::PublicationDate,
            Locator::new(Matcher::tag("p").string("Published")),
            |text| date(text.replace("Published", "").trim()),
        ),
        Rule::text(
            Field::IssuingAuthority,
            Locator::new(title())
                .then(Step::FindNext(Matcher::tag("ul").class("govuk-list")))
                .then(Step::Descendant(Matcher::tag("li"))),
        ),
        Rule::text_with(
            Field::AwardDate,
            section(r"V\.2\.1\)\s+Date of conclusion of the contract")
                .then(Step::NextSibling(Matcher::tag("p"))),
            |text| date(&text),
        ),
        Rule::custom("winners", &[Field::Winners], winners),
        Rule::custom(
            "contract values",
            &[
                Field::FinalPrice,
                Field::EstimatedValue,
                Field::EstimatedValueConverted,
            ],
            contract_values,
        ),
        Rule::custom("contract duration", &[Field::ContractDuration], contract_duration),
        Rule::text_with(
            Field::Bidders,
            section(r"V\.2\.2\)\s+Information about tenders").then(Step::NextSibling(
                Matcher::tag("p").string("Number of tenders received:"),
            )),
            |text| non_empty(after_last_colon(&text).to_string()),
        ),
    ]
});

static WINNERS: Lazy<Locator> = Lazy::new(|| {
    section(r"V\.2\.3\)\s+Name and address of the contractor")
        .then(Step::NextSibling(Matcher::tag("p")))
});

static VALUES: Lazy<Locator> =
    Lazy::new(|| section(r"V\.2\.4\)\s+Information on value of contract/lot"));

static LOT_1: Lazy<Matcher> = Lazy::new(|| Matcher::any().id("object-1-lot-1"));

static DURATION: Lazy<Locator> =
    Lazy::new(|| section(r"II\.2\.7\)\s+Duration of the contract"));

static DESCRIPTION: Lazy<Locator> = Lazy::new(|| {
    section(r"II\.1\.4\)\s+Short description")
        .then(Step::NextSibling(Matcher::tag("p").class("govuk-body")))
});

static FRAMEWORK_PERIOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)Period of framework:\s*(\d{1,2}\s+\w+\s+\d{4})\s+to\s+(\d{1,2}\s+\w+\s+\d{4})",
    )
    .expect("valid framework period pattern")
});

fn title() -> Matcher {
    Matcher::tag("h1").class("govuk-heading-l")
}

/// The `h4` of a numbered form section.
fn section(pattern: &str) -> Locator {
    Locator::new(Matcher::tag("span").string(pattern)).then(Step::Parent("h4"))
}

fn date(text: &str) -> Option<Value> {
    normalize_date(text).map(Value::Text)
}

fn winners(root: ElementRef<'_>, _ctx: &ExtractContext) -> anyhow::Result<Assignments> {
    let names: Vec<String> = WINNERS
        .locate_all(root)
        .iter()
        .map(stripped_text)
        .collect();
    let winners = if names.is_empty() {
        None
    } else {
        Some(Value::Text(names.join(", ")))
    };
    Ok(vec![(Field::Winners, winners)])
}

/// The two paragraphs after the value heading hold the estimate and the
/// final total, in either order.
fn contract_values(root: ElementRef<'_>, ctx: &ExtractContext) -> anyhow::Result<Assignments> {
    let mut final_text = None;
    let mut estimate_text = None;

    if let Some(heading) = VALUES.locate(root) {
        let paragraph = Matcher::tag("p");
        let first = next_siblings(heading).find(|e| paragraph.matches(e));
        let second = first.and_then(|p| next_siblings(p).find(|e| paragraph.matches(e)));

        for p in first.into_iter().chain(second) {
            let text: String = p.text().collect();
            if text.contains("Initial estimated") {
                estimate_text = Some(after_last_colon(&text).to_string());
            } else if text.contains("Total value") {
                final_text = Some(after_last_colon(&text).to_string());
            }
        }
    }

    let final_price = final_text.and_then(|t| parse_amount(&t, 1.0));
    let estimate = estimate_text.and_then(|t| parse_amount(&t, ctx.rate));

    Ok(vec![
        (Field::FinalPrice, final_price.map(|a| a.original.into())),
        (Field::EstimatedValue, estimate.map(|a| a.original.into())),
        (
            Field::EstimatedValueConverted,
            estimate.map(|a| a.converted.into()),
        ),
    ])
}

/// Start and end dates of lot 1, or the framework period from the short
/// description when the lot does not state both.
fn contract_duration(root: ElementRef<'_>, _ctx: &ExtractContext) -> anyhow::Result<Assignments> {
    let mut start = None;
    let mut end = None;

    if let Some(heading) = LOT_1.find(root).and_then(|lot| DURATION.locate(lot)) {
        let candidates = Matcher::tags(&["p", "dd"]);
        for elem in next_siblings(heading)
            .filter(|e| candidates.matches(e))
            .take(5)
        {
            let text: String = elem.text().collect();
            if text.contains("Start date:") {
                start = normalize_date(text.replace("Start date:", "").trim());
            } else if text.contains("End date:") {
                end = normalize_date(text.replace("End date:", "").trim());
            }
            if start.is_some() && end.is_some() {
                break;
            }
        }
    }

    if start.is_none() || end.is_none() {
        if let Some(p) = DESCRIPTION.locate(root) {
            let text: String = p.text().collect();
            if let Some(caps) = FRAMEWORK_PERIOD.captures(&text) {
                start = normalize_date(&caps[1]);
                end = normalize_date(&caps[2]);
            }
        }
    }

    let duration = match (start, end) {
        (Some(start), Some(end)) => Some(Value::Text(format!("{start} to {end}"))),
        _ => None,
    };
    Ok(vec![(Field::ContractDuration, duration)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TenderRecord;

    const NOTICE: &str = r#"
<!DOCTYPE html>
<html><body><main>
  <p class="govuk-body">Published 14 February 2023, 4:05pm</p>
  <h1 class="govuk-heading-l">Winter Road Maintenance Framework</h1>
  <ul class="govuk-list"><li>Highways Authority of Somewhere</li><li>Contract award notice</li></ul>
  <p class="govuk-body">Notice identifier: 008624-2023</p>

  <div id="object-1-lot-1">
    <h4 class="govuk-heading-s"><span>II.2.7) Duration of the contract, framework agreement or dynamic purchasing system</span></h4>
    <p class="govuk-body">Start date: 1 April 2023</p>
    <p class="govuk-body">End date: 31 March 2027</p>
  </div>

  <h4><span>V.2.1) Date of conclusion of the contract</span></h4>
  <p class="govuk-body">10 February 2023</p>

  <h4><span>V.2.2) Information about tenders</span></h4>
  <p class="govuk-body">Number of tenders received: 4</p>

  <h4><span>V.2.3) Name and address of the contractor</span></h4>
  <p class="govuk-body">Gritters Ltd</p>
  <h4><span>V.2.3) Name and address of the contractor</span></h4>
  <p class="govuk-body">Salt &amp; Sons plc</p>

  <h4><span>V.2.4) Information on value of contract/lot (excluding VAT)</span></h4>
  <p class="govuk-body">Initial estimated total value of the contract/lot: £1,000,000</p>
  <p class="govuk-body">Total value of the contract/lot: £950,000.50</p>
</main></body></html>
"#;

    fn extract(page: &str) -> TenderRecord {
        let ctx = ExtractContext {
            source_url: "https://www.find-tender.service.gov.uk/Notice/008624-2023".into(),
            currency: "GBP".into(),
            rate: 116.95,
        };
        FindATender.extract(page, &ctx)
    }

    #[test]
    fn full_notice() {
        let record = extract(NOTICE);

        assert_eq!(record.text(Field::TenderId), Some("008624-2023"));
        assert_eq!(
            record.text(Field::Title),
            Some("Winter Road Maintenance Framework")
        );
        assert_eq!(
            record.text(Field::IssuingAuthority),
            Some("Highways Authority of Somewhere")
        );
        assert_eq!(record.text(Field::PublicationDate), Some("2023-02-14"));
        assert_eq!(record.text(Field::AwardDate), Some("2023-02-10"));
        assert_eq!(
            record.text(Field::ContractDuration),
            Some("2023-04-01 to 2027-03-31")
        );
        assert_eq!(record.amount(Field::FinalPrice), Some(950000.5));
        assert_eq!(record.amount(Field::EstimatedValue), Some(1_000_000.0));
        assert_eq!(
            record.amount(Field::EstimatedValueConverted),
            Some(116_950_000.0)
        );
        assert_eq!(
            record.text(Field::Winners),
            Some("Gritters Ltd, Salt & Sons plc")
        );
        assert_eq!(record.text(Field::Bidders), Some("4"));
        assert!(!record.is_present(Field::Units));
    }

    #[test]
    fn duration_falls_back_to_framework_period() {
        let page = r#"
            <h1 class="govuk-heading-l">Framework</h1>
            <h4><span>II.1.4) Short description</span></h4>
            <p class="govuk-body">Supply of grit. Period of framework: 1 June 2023 to 31 May 2025.</p>
        "#;
        let record = extract(page);
        assert_eq!(
            record.text(Field::ContractDuration),
            Some("2023-06-01 to 2025-05-31")
        );
    }

    #[test]
    fn duration_needs_both_dates() {
        let page = r#"
            <div id="object-1-lot-1">
              <h4><span>II.2.7) Duration of the contract</span></h4>
              <p>Start date: 1 April 2023</p>
            </div>
        "#;
        let record = extract(page);
        assert!(!record.is_present(Field::ContractDuration));
    }

    #[test]
    fn only_final_value() {
        let page = r#"
            <h4><span>V.2.4) Information on value of contract/lot</span></h4>
            <p>Total value of the contract/lot: £12,500</p>
        "#;
        let record = extract(page);
        assert_eq!(record.amount(Field::FinalPrice), Some(12500.0));
        assert!(!record.is_present(Field::EstimatedValue));
        assert!(!record.is_present(Field::EstimatedValueConverted));
    }

    #[test]
    fn unparsable_award_date_is_kept_raw() {
        let page = r#"
            <h4><span>V.2.1) Date of conclusion of the contract</span></h4>
            <p>To be confirmed</p>
        "#;
        let record = extract(page);
        assert_eq!(record.text(Field::AwardDate), Some("To be confirmed"));
    }
}
