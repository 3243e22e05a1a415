//! Notices from contractsfinder.service.gov.uk.
//!
//! Most values sit in a `p` following an `h4` whose `strong` holds the label.
//! Award details are grouped under the `Award information` heading.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use super::{Site, SiteExtractor};
use crate::dom::{stripped_text, Locator, Matcher, Step};
use crate::normalize::{normalize_date, parse_amount};
use crate::record::{Field, Value};
use crate::rules::{Assignments, ExtractContext, Rule};

pub struct ContractsFinder;

impl SiteExtractor for ContractsFinder {
    fn site(&self) -> Site {
        Site::ContractsFinder
    }

    fn rules(&self) -> &[Rule] {
        &RULES
    }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::text(
            Field::Title,
            Locator::new(Matcher::tag("h1").class("govuk-heading-l")),
        ),
        Rule::custom("notice id", &[Field::TenderId], notice_id),
        Rule::custom("buyer", &[Field::IssuingAuthority], buyer),
        Rule::custom("published date", &[Field::PublicationDate], published_date),
        Rule::custom(
            "award information",
            &[
                Field::AwardDate,
                Field::FinalPrice,
                Field::EstimatedValue,
                Field::EstimatedValueConverted,
                Field::ContractDuration,
            ],
            award_information,
        ),
        Rule::custom("winners", &[Field::Winners], winners),
    ]
});

static NOTICE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/notice/([\w-]+)").expect("valid notice id pattern"));

static BUYER: Lazy<Matcher> = Lazy::new(|| {
    Matcher::tag("dt")
        .class("govuk-summary-list__key")
        .string(r"\s*Buyer:\s*")
});

static BUYER_VALUE: Lazy<Step> =
    Lazy::new(|| Step::NextSibling(Matcher::tag("dd").class("govuk-summary-list__value")));

static ABOUT_BUYER: Lazy<Matcher> = Lazy::new(|| Matcher::tag("h3").string("About the buyer"));

static AWARD_INFORMATION: Lazy<Matcher> =
    Lazy::new(|| Matcher::tag("h3").string("Award information"));

/// Headings of the award section that are not contractor names.
const AWARD_LABELS: [&str; 4] = [
    "awarded date",
    "contract start date",
    "contract end date",
    "total value of contract",
];

/// Labels are searched in the stripped, lowercased heading text.
fn is_award_label(h4: &ElementRef<'_>) -> bool {
    let text = stripped_text(h4).to_lowercase();
    AWARD_LABELS.iter().any(|label| text.contains(label))
}

/// Text of the `p` following the `h4` labelled `label` under `scope`.
fn after_h4(scope: ElementRef<'_>, label: &str) -> Option<String> {
    let strong = Matcher::tag("strong").string(&format!(r"\s*{}\s*", regex::escape(label)));
    Matcher::tag("h4")
        .find_all(scope)
        .into_iter()
        .find(|h4| strong.find(*h4).is_some())
        .and_then(|h4| Step::NextSibling(Matcher::tag("p")).apply(h4))
        .map(|p| stripped_text(&p))
}

/// The award section, or the whole document when the page has none.
fn award_section(root: ElementRef<'_>) -> ElementRef<'_> {
    AWARD_INFORMATION
        .find(root)
        .and_then(|h3| h3.parent())
        .and_then(ElementRef::wrap)
        .unwrap_or(root)
}

fn date_after_h4(scope: ElementRef<'_>, label: &str) -> Option<String> {
    after_h4(scope, label).and_then(|text| normalize_date(&text))
}

fn notice_id(_root: ElementRef<'_>, ctx: &ExtractContext) -> anyhow::Result<Assignments> {
    let id = NOTICE_ID
        .captures(&ctx.source_url)
        .map(|caps| Value::Text(caps[1].to_string()));
    Ok(vec![(Field::TenderId, id)])
}

/// The summary list buyer, or the buyer's contact name when the list has no
/// buyer entry.
fn buyer(root: ElementRef<'_>, _ctx: &ExtractContext) -> anyhow::Result<Assignments> {
    let authority = if let Some(dt) = BUYER.find(root) {
        BUYER_VALUE.apply(dt).map(|dd| stripped_text(&dd))
    } else {
        log::info!("Buyer name not in summary list, looking for contact name");
        match ABOUT_BUYER.find(root) {
            Some(h3) => {
                let contact = h3
                    .parent()
                    .and_then(ElementRef::wrap)
                    .and_then(|about| after_h4(about, "Contact name"));
                log::info!("Using contact name as issuing authority: {contact:?}");
                contact
            }
            None => {
                log::warn!("Could not find buyer or contact name");
                None
            }
        }
    };
    Ok(vec![(
        Field::IssuingAuthority,
        authority.filter(|s| !s.is_empty()).map(Value::Text),
    )])
}

fn published_date(root: ElementRef<'_>, _ctx: &ExtractContext) -> anyhow::Result<Assignments> {
    let published = date_after_h4(root, "Published date").map(Value::Text);
    Ok(vec![(Field::PublicationDate, published)])
}

fn award_information(root: ElementRef<'_>, _ctx: &ExtractContext) -> anyhow::Result<Assignments> {
    let section = award_section(root);

    let awarded = date_after_h4(section, "Awarded date").map(Value::Text);
    let total = after_h4(section, "Total value of contract")
        .and_then(|text| parse_amount(&text, 1.0))
        .map(|amount| Value::Amount(amount.original));

    let start = date_after_h4(section, "Contract start date");
    let end = date_after_h4(section, "Contract end date");
    let duration = match (start, end) {
        (Some(start), Some(end)) => Some(Value::Text(format!("{start} to {end}"))),
        _ => None,
    };

    Ok(vec![
        (Field::AwardDate, awarded),
        (Field::FinalPrice, total),
        (Field::EstimatedValue, None),
        (Field::EstimatedValueConverted, None),
        (Field::ContractDuration, duration),
    ])
}

/// Contractor names are the award section's own `h4`s that are not labels.
fn winners(root: ElementRef<'_>, _ctx: &ExtractContext) -> anyhow::Result<Assignments> {
    let section = award_section(root);
    let strong = Matcher::tag("strong");

    let names: Vec<String> = Matcher::tag("h4")
        .find_children(section)
        .into_iter()
        .filter(|h4| !is_award_label(h4))
        .map(|h4| stripped_text(&strong.find(h4).unwrap_or(h4)))
        .filter(|name| !name.is_empty())
        .collect();

    let winners = if names.is_empty() {
        None
    } else {
        Some(Value::Text(names.join(", ")))
    };
    Ok(vec![(Field::Winners, winners)])
}
