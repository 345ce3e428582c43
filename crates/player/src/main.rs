use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use pilit_core::{
    build_show, ConfigManager, LogSink, MqttSink, Sequencer, SequencerConfig, Settings,
    ShowLoader, SystemClock,
};

/// Plays a PiLit light show by publishing animation commands to MQTT fixtures.
#[derive(Parser, Debug)]
#[command(name = "pilit")]
#[command(about = "PiLit light show player")]
struct Args {
    /// Show file to play (prompted for when omitted)
    show: Option<String>,

    /// Path to the player config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// MQTT broker host (overrides the config file)
    #[arg(long)]
    mqtt_host: Option<String>,

    /// MQTT broker port (overrides the config file)
    #[arg(long)]
    mqtt_port: Option<u16>,

    /// Log commands instead of publishing them
    #[arg(long, default_value = "false")]
    dry_run: bool,

    /// Turn every channel of the show off and exit
    #[arg(long, default_value = "false")]
    off: bool,
}

fn init_logging(settings: &Settings) {
    let default_filter = if settings.logging_enabled { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn prompt_for_show(loader: &ShowLoader) -> Result<String> {
    let shows = loader.list_shows()?;
    if !shows.is_empty() {
        eprintln!("Shows in {}:", loader.shows_directory().display());
        for (i, show) in shows.iter().enumerate() {
            if let Some(name) = show.file_name() {
                eprintln!("  {}. {}", i + 1, name.to_string_lossy());
            }
        }
    }

    eprint!("Enter the show name: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    let name = line.trim();
    if name.is_empty() {
        bail!("No show name given");
    }
    // Accept a number from the listing as well as a name.
    if let Ok(index) = name.parse::<usize>() {
        if let Some(path) = index.checked_sub(1).and_then(|i| shows.get(i)) {
            return Ok(path.to_string_lossy().into_owned());
        }
    }
    Ok(name.to_string())
}

/// How long `--off` waits for the broker to take its commands.
const OFF_FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config_manager = ConfigManager::new(Some(args.config.clone()));
    let settings = config_manager
        .load()
        .with_context(|| format!("loading config {}", args.config.display()))?
        .with_mqtt_overrides(args.mqtt_host, args.mqtt_port)
        .context("applying command line overrides")?;
    init_logging(&settings);

    let loader = ShowLoader::from_current_dir()?;
    let show_name = match args.show {
        Some(name) => name,
        None => prompt_for_show(&loader)?,
    };
    let show = loader.load_show(&loader.resolve(&show_name))?;
    let built = build_show(&show)?;
    let mut sequencer = Sequencer::new(built, SequencerConfig::from(&settings));

    if args.dry_run {
        log::info!("Dry run: commands will only be logged");
        let mut sink = LogSink::new();
        if args.off {
            let sent = sequencer.all_off(&mut sink);
            log::info!("Sent off to {} channels", sent);
        } else {
            sequencer.run(&SystemClock, &mut sink).await;
        }
        return Ok(());
    }

    // Leave room for a full round of commands while the broker connects.
    let mut mqtt_config = settings.mqtt_config();
    mqtt_config.queue_capacity = mqtt_config
        .queue_capacity
        .max(sequencer.show().channels.len() * 2);
    let mut sink = MqttSink::connect(&mqtt_config);

    if args.off {
        let sent = sequencer.all_off(&mut sink);
        sink.close(OFF_FLUSH_TIMEOUT)
            .await
            .context("sending off commands")?;
        log::info!("Sent off to {} channels", sent);
        return Ok(());
    }

    sequencer.run(&SystemClock, &mut sink).await;
    Ok(())
}
