use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use env_logger::{Env, Target};
use tws_render::{from_config, RenderConfig, RenderRequest, Renderer, RendererKind};
use tws_scraper::{
    scrap_page, CsvWriter, CsvWriterConfig, Pipeline, PipelineConfig, Site, GBP_TO_INR,
};

/// Tender Web Scraper
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    #[command(name = "run")]
    Run(RunArgs),
    #[command(name = "scrap")]
    Scrap(ScrapArgs),
    #[command(hide = true)]
    Completion,
}

/// Scrap every configured site and write the CSV table
#[derive(Debug, Default, clap::Args)]
pub struct RunArgs {
    /// Optional yaml configuration file
    #[arg(env = "TWS_CONFIG", long, short)]
    pub config: Option<PathBuf>,
    /// Override the output CSV file
    #[arg(long, short)]
    pub output_file: Option<PathBuf>,
    /// Override how pages are fetched when no snapshot exists
    #[arg(value_enum, long)]
    pub renderer: Option<RendererKind>,
    /// Override the user agent
    #[arg(long)]
    pub user_agent: Option<String>,
    /// Override the page timeout, in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Override the pause between two sites, in seconds
    #[arg(long)]
    pub delay: Option<u64>,
    /// Override the conversion rate applied to estimated values
    #[arg(long)]
    pub rate: Option<f64>,
    /// Don't prefix the CSV file with a byte-order mark
    #[arg(long)]
    pub no_bom: bool,
    /// When quiet no logs are outputted
    #[arg(long, short)]
    pub quiet: bool,
}

impl TryFrom<&RunArgs> for PipelineConfig {
    type Error = anyhow::Error;

    fn try_from(args: &RunArgs) -> Result<Self, Self::Error> {
        let mut conf = if let Some(file) = args.config.as_ref().map(File::open) {
            serde_yaml::from_reader(file?)?
        } else {
            PipelineConfig::default()
        };
        if let Some(output_file) = &args.output_file {
            conf.output = output_file.clone();
        }
        if let Some(renderer) = args.renderer {
            conf.render.renderer = renderer;
        }
        if let Some(user_agent) = &args.user_agent {
            conf.render.user_agent = user_agent.to_string();
        }
        if let Some(timeout) = args.timeout {
            conf.render.timeout = timeout;
        }
        if let Some(delay) = args.delay {
            conf.delay_between_sites = delay;
        }
        if let Some(rate) = args.rate {
            if !rate.is_finite() || rate <= 0.0 {
                anyhow::bail!("Invalid conversion rate: {rate}");
            }
            conf.rate = rate;
        }
        if args.no_bom {
            conf.csv.bom = false;
        }
        Ok(conf)
    }
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let conf: PipelineConfig = (&args).try_into()?;
    log::debug!("Running with {conf:?}");
    let renderer = from_config(&conf.render)?;
    // Export failures are logged, the run itself still succeeds
    Pipeline::new(conf, renderer).run_and_export();
    Ok(())
}

/// Scrap a single page and print the result to stdout
#[derive(Debug, clap::Args)]
#[command(group = clap::ArgGroup::new("page").required(true))]
pub struct ScrapArgs {
    /// Site the page comes from
    #[arg(value_enum, long, short)]
    pub site: Site,
    /// A local html page to scrap
    #[arg(group = "page", long)]
    pub file: Option<PathBuf>,
    /// A distant html page to scrap
    #[arg(group = "page", long)]
    pub url: Option<String>,
    /// How to fetch `url`
    #[arg(value_enum, long, default_value = "http", conflicts_with = "file")]
    pub renderer: RendererKind,
    /// Custom user agent to download the page
    #[arg(long, conflicts_with = "file")]
    pub ua: Option<String>,
    /// ISO code of the amounts found on the page
    #[arg(long, default_value = "GBP")]
    pub currency: String,
    /// Conversion rate applied to estimated values
    #[arg(long, default_value_t = GBP_TO_INR)]
    pub rate: f64,
}

pub fn scrap(args: ScrapArgs) -> anyhow::Result<()> {
    let (page, url) = if let Some(url) = args.url {
        let mut render_conf = RenderConfig {
            renderer: args.renderer,
            ..Default::default()
        };
        if let Some(ua) = args.ua {
            render_conf.user_agent = ua;
        }
        let request = RenderRequest::new(&url, render_conf.timeout());
        let page = from_config(&render_conf)?.render(&request)?;
        (page, url)
    } else if let Some(path) = args.file {
        let page = fs::read_to_string(&path)?;
        (page, path.display().to_string())
    } else {
        anyhow::bail!("Missing `url` or `file`");
    };

    let record = scrap_page(args.site, &page, &url, &args.currency, args.rate);
    let csv_conf = CsvWriterConfig::default();
    CsvWriter::stdout(&csv_conf).write_table(&[record])?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.cmd {
        SubCommand::Run(args) => {
            if !args.quiet {
                env_logger::Builder::from_env(
                    Env::default().default_filter_or("tws=info,tws_scraper=info,tws_render=info"),
                )
                .target(Target::Stdout)
                .format_timestamp_secs()
                .init();
            }
            run(args)
        }
        SubCommand::Scrap(args) => {
            // Stdout holds the table
            env_logger::Builder::from_env(
                Env::default().default_filter_or("tws_scraper=warn,tws_render=warn"),
            )
            .target(Target::Stderr)
            .init();
            scrap(args)
        }
        SubCommand::Completion => {
            generate(Shell::Bash, &mut Args::command(), "tws", &mut io::stdout());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rate: 2.0\ndelayBetweenSites: 1\nrender:\n  timeout: 30").unwrap();

        let args = RunArgs {
            config: Some(file.path().to_path_buf()),
            output_file: Some("out.csv".into()),
            renderer: Some(RendererKind::Http),
            delay: Some(0),
            no_bom: true,
            ..Default::default()
        };
        let conf = PipelineConfig::try_from(&args).unwrap();

        assert_eq!(conf.rate, 2.0);
        assert_eq!(conf.delay_between_sites, 0);
        assert_eq!(conf.render.timeout, 30);
        assert_eq!(conf.render.renderer, RendererKind::Http);
        assert_eq!(conf.output, PathBuf::from("out.csv"));
        assert!(!conf.csv.bom);
        assert_eq!(conf.sites.len(), 2);
    }

    #[test]
    fn no_config_file_means_defaults() {
        let conf = PipelineConfig::try_from(&RunArgs::default()).unwrap();
        assert_eq!(conf.rate, GBP_TO_INR);
        assert_eq!(conf.output, PathBuf::from("tender_data.csv"));
    }

    #[test]
    fn rate_must_be_positive() {
        let args = RunArgs {
            rate: Some(-1.0),
            ..Default::default()
        };
        assert!(PipelineConfig::try_from(&args).is_err());
    }

    #[test]
    fn scrap_needs_a_page() {
        let res = Args::try_parse_from(["tws", "scrap", "--site", "find-a-tender"]);
        assert!(res.is_err());
        let res = Args::try_parse_from([
            "tws",
            "scrap",
            "--site",
            "contracts-finder",
            "--file",
            "page.html",
        ]);
        assert!(res.is_ok());
    }
}
