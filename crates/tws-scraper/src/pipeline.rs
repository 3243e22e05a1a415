//! Sequential scraping of the configured sites into a single table.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tws_render::{load_or_fetch, RenderConfig, RenderRequest, Renderer, Snapshot};

use crate::record::TenderRecord;
use crate::rules::ExtractContext;
use crate::sites::Site;
use crate::writer::{export, CsvWriterConfig, ExportStatus};

/// GBP to INR, as of 2025-10-25.
pub const GBP_TO_INR: f64 = 116.95;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Processed in order, one at a time
    #[serde(default = "default_sites")]
    pub sites: Vec<SiteConfig>,

    /// ISO code of the amounts found on the pages
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Conversion rate applied to estimated values
    #[serde(default = "default_rate")]
    pub rate: f64,

    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Pause between two consecutive sites, in seconds
    #[serde(default = "default_delay_between_sites")]
    pub delay_between_sites: u64,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub csv: CsvWriterConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sites: default_sites(),
            currency: default_currency(),
            rate: default_rate(),
            output: default_output(),
            delay_between_sites: default_delay_between_sites(),
            render: RenderConfig::default(),
            csv: CsvWriterConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn delay_between_sites(&self) -> Duration {
        Duration::from_secs(self.delay_between_sites)
    }
}

fn default_sites() -> Vec<SiteConfig> {
    vec![
        SiteConfig {
            site: Site::FindATender,
            url: "https://www.find-tender.service.gov.uk/Notice/008624-2023".into(),
            snapshot: "html_FindATender.html".into(),
            wait_for_selector: default_wait_for_selector(),
            idle_wait: 5,
        },
        SiteConfig {
            site: Site::ContractsFinder,
            url: "https://www.contractsfinder.service.gov.uk/notice/05c544dc-9e6f-452d-87c1-bf00f3ce73ac"
                .into(),
            snapshot: "html_ContractsFinder.html".into(),
            wait_for_selector: default_wait_for_selector(),
            idle_wait: 3,
        },
    ]
}

fn default_currency() -> String {
    String::from("GBP")
}

fn default_rate() -> f64 {
    GBP_TO_INR
}

fn default_output() -> PathBuf {
    PathBuf::from("tender_data.csv")
}

fn default_delay_between_sites() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub site: Site,
    pub url: String,
    /// Saved HTML, read instead of rendering when present and non-empty
    pub snapshot: PathBuf,
    #[serde(default = "default_wait_for_selector")]
    pub wait_for_selector: Option<String>,
    /// Seconds to let the page settle when there is no selector to wait for
    #[serde(default = "default_idle_wait")]
    pub idle_wait: u64,
}

fn default_wait_for_selector() -> Option<String> {
    Some(String::from("h1.govuk-heading-l"))
}

fn default_idle_wait() -> u64 {
    5
}

pub struct Pipeline<R> {
    config: PipelineConfig,
    renderer: R,
}

impl<R: Renderer> Pipeline<R> {
    pub fn new(config: PipelineConfig, renderer: R) -> Self {
        Self { config, renderer }
    }

    /// One record per site whose page could be obtained, in site order.
    pub fn run(&self) -> Vec<TenderRecord> {
        let mut records = Vec::with_capacity(self.config.sites.len());

        for (i, site_conf) in self.config.sites.iter().enumerate() {
            if i > 0 {
                log::info!(
                    "Pausing for {} seconds before next request...",
                    self.config.delay_between_sites
                );
                thread::sleep(self.config.delay_between_sites());
            }

            match self.scrap_site(site_conf) {
                Some(record) => records.push(record),
                None => log::error!(
                    "{} scraping returned no data for {}",
                    site_conf.site,
                    site_conf.url
                ),
            }
        }

        records
    }

    /// Runs then writes the configured output file.
    pub fn run_and_export(&self) -> ExportStatus {
        let records = self.run();
        let status = export(&records, &self.config.output, &self.config.csv);
        log::info!("Script finished");
        status
    }

    fn scrap_site(&self, site_conf: &SiteConfig) -> Option<TenderRecord> {
        log::info!("--- Processing {} ---", site_conf.site);

        let snapshot = Snapshot::new(&site_conf.snapshot);
        let request = RenderRequest::new(&site_conf.url, self.config.render.timeout())
            .wait_for(site_conf.wait_for_selector.clone())
            .idle_wait(Duration::from_secs(site_conf.idle_wait));

        let page = load_or_fetch(&snapshot, &site_conf.url, |_| {
            self.renderer.render(&request)
        })
        .map_err(|e| log::error!("Failed to fetch HTML for {}: {e}", site_conf.url))
        .ok()?;

        Some(scrap_page(
            site_conf.site,
            &page,
            &site_conf.url,
            &self.config.currency,
            self.config.rate,
        ))
    }
}

/// Extracts one page, no cache nor renderer involved.
pub fn scrap_page(site: Site, page: &str, url: &str, currency: &str, rate: f64) -> TenderRecord {
    let ctx = ExtractContext {
        source_url: url.to_string(),
        currency: currency.to_string(),
        rate,
    };
    site.extractor().extract(page, &ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Field;

    #[test]
    fn defaults_reproduce_hardcoded_run() {
        let config = PipelineConfig::default();
        let sites: Vec<Site> = config.sites.iter().map(|s| s.site).collect();
        assert_eq!(sites, vec![Site::FindATender, Site::ContractsFinder]);
        assert_eq!(config.sites[1].idle_wait, 3);
        assert_eq!(config.rate, 116.95);
        assert_eq!(config.output, PathBuf::from("tender_data.csv"));
        assert_eq!(config.delay_between_sites(), Duration::from_secs(5));
    }

    #[test]
    fn yaml_config() {
        let yaml = r#"
rate: 1.5
output: out/tenders.csv
delayBetweenSites: 0
sites:
  - site: contracts-finder
    url: https://www.contractsfinder.service.gov.uk/notice/abc-123
    snapshot: cf.html
    waitForSelector: null
render:
  renderer: http
"#;
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sites.len(), 1);
        assert_eq!(config.sites[0].wait_for_selector, None);
        assert_eq!(config.sites[0].idle_wait, 5);
        assert_eq!(config.currency, "GBP");
        assert_eq!(config.render.renderer, tws_render::RendererKind::Http);
        assert_eq!(config.render.timeout, 60);
        assert!(config.csv.bom);
    }

    #[test]
    fn scrap_page_sets_provenance() {
        let url = "https://www.contractsfinder.service.gov.uk/notice/abc-123";
        let record = scrap_page(Site::ContractsFinder, "", url, "GBP", GBP_TO_INR);
        assert_eq!(record.text(Field::SourceUrl), Some(url));
        assert_eq!(record.text(Field::Currency), Some("GBP"));
        assert_eq!(record.text(Field::TenderId), Some("abc-123"));
    }
}
