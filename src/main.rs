use clap::Parser;
use std::path::PathBuf;

use pgyer_uploader::config::{self, ContextDefaults, RawInstallType, UploadConfig};
use pgyer_uploader::uploader::PgyerClient;

/// Distribute an app build to the pgyer beta testing service
#[derive(Parser, Debug)]
#[command(name = "pgyer-uploader", version, about)]
struct Cli {
    /// api_key in your pgyer account
    #[arg(long, env = "PGYER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Short link of the single channel to update, e.g. abcd
    #[arg(long, env = "PGYER_CHANNEL_SHORTCUT")]
    channel_shortcut: Option<String>,

    /// Path to your APK file
    #[arg(long, env = "PGYER_APK")]
    apk: Option<String>,

    /// Path to your IPA file
    #[arg(long, env = "PGYER_IPA")]
    ipa: Option<String>,

    /// Password testers enter to install the app
    #[arg(long, env = "PGYER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Release notes for this version
    #[arg(long, env = "PGYER_UPDATE_DESCRIPTION")]
    update_description: Option<String>,

    /// Install method: 2 = password install, 3 = invite install
    #[arg(long, env = "PGYER_INSTALL_TYPE")]
    install_type: Option<String>,

    /// APK produced by an earlier gradle step, used when neither --apk nor --ipa is set
    #[arg(long, env = "GRADLE_APK_OUTPUT_PATH")]
    gradle_apk_output_path: Option<String>,

    /// IPA produced by an earlier archive step, used when neither --apk nor --ipa is set
    #[arg(long, env = "IPA_OUTPUT_PATH")]
    ipa_output_path: Option<String>,

    /// JSON file with default values for the options above
    #[arg(long, env = "PGYER_CONFIG")]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            api_key: self.api_key.clone(),
            channel_shortcut: self.channel_shortcut.clone(),
            apk: self.apk.clone(),
            ipa: self.ipa.clone(),
            password: self.password.clone(),
            update_description: self.update_description.clone(),
            install_type: self.install_type.clone().map(RawInstallType::Text),
        }
    }

    fn context_defaults(&self) -> ContextDefaults {
        ContextDefaults {
            gradle_apk_output_path: self.gradle_apk_output_path.clone(),
            ipa_output_path: self.ipa_output_path.clone(),
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let file_config = match &cli.config {
        Some(path) => UploadConfig::from_file(path)?,
        None => UploadConfig::default(),
    };
    let upload_config = file_config.merge(cli.upload_config());

    let request = config::resolve_upload_request(&upload_config, &cli.context_defaults())?;

    let client = PgyerClient::new()?;
    let success = client.upload(&request).await?;

    if cli.json {
        println!("{}", serde_json::to_string(&success)?);
    } else {
        println!("Upload success. Visit this URL to see: {}", success.url);
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    log::info!("The pgyer uploader is working.");

    if let Err(e) = run(&cli).await {
        log::error!("Upload failed: {}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
