//! The supported procurement sites.

mod contracts_finder;
mod find_a_tender;

use std::fmt;

use scraper::Html;
use serde::{Deserialize, Serialize};

pub use contracts_finder::ContractsFinder;
pub use find_a_tender::FindATender;

use crate::dom::root;
use crate::record::{Field, TenderRecord, Value};
use crate::rules::{evaluate, ExtractContext, Rule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Site {
    /// find-tender.service.gov.uk
    FindATender,
    /// contractsfinder.service.gov.uk
    ContractsFinder,
}

impl Site {
    pub fn extractor(self) -> &'static dyn SiteExtractor {
        match self {
            Site::FindATender => &FindATender,
            Site::ContractsFinder => &ContractsFinder,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Site::FindATender => "UK Find a Tender",
            Site::ContractsFinder => "UK Contracts Finder",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait SiteExtractor: Sync {
    fn site(&self) -> Site;

    /// Extraction rules, evaluated in order.
    fn rules(&self) -> &[Rule];

    /// Always returns a full record, possibly with every extracted field absent.
    fn extract(&self, page: &str, ctx: &ExtractContext) -> TenderRecord {
        let html = Html::parse_document(page);

        let mut record = TenderRecord::new();
        record.set(Field::SourceUrl, Some(Value::from(ctx.source_url.as_str())));
        record.set(Field::Currency, Some(Value::from(ctx.currency.as_str())));

        evaluate(self.rules(), root(&html), ctx, &mut record);

        let site = self.site();
        if record.is_present(Field::Title) || record.is_present(Field::IssuingAuthority) {
            log::info!("Successfully parsed {site}");
        } else {
            log::warn!("Parsed {site}, but key fields seem missing, review its saved HTML");
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTRACTED: [Field; 12] = [
        Field::TenderId,
        Field::Title,
        Field::IssuingAuthority,
        Field::PublicationDate,
        Field::AwardDate,
        Field::ContractDuration,
        Field::FinalPrice,
        Field::EstimatedValueConverted,
        Field::EstimatedValue,
        Field::Winners,
        Field::Bidders,
        Field::Units,
    ];

    #[test]
    fn empty_document_gives_full_record_without_values() {
        let ctx = ExtractContext {
            source_url: "https://example.org/somewhere".into(),
            currency: "GBP".into(),
            rate: 116.95,
        };
        for site in [Site::FindATender, Site::ContractsFinder] {
            for page in ["", "<html><body><p>Service unavailable</p></body></html>"] {
                let record = site.extractor().extract(page, &ctx);
                for field in EXTRACTED {
                    assert!(!record.is_present(field), "{site}: {field}");
                }
                assert_eq!(record.text(Field::SourceUrl), Some("https://example.org/somewhere"));
                assert_eq!(record.text(Field::Currency), Some("GBP"));
                assert_eq!(record.to_string_record().len(), 14);
            }
        }
    }

    #[test]
    fn site_keys() {
        let site: Site = serde_yaml::from_str("contracts-finder").unwrap();
        assert_eq!(site, Site::ContractsFinder);
        assert_eq!(site.extractor().site(), Site::ContractsFinder);
    }
}
