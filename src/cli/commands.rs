use crate::cli::args::{Cli, Commands};
use crate::config::Settings;
use crate::error::Result;
use crate::models::Locale;
use crate::processors::{ChartJob, ChartPipeline, PipelineEvent, StationGrouper, TrailingWindow};
use crate::readers::ObservationReader;
use crate::utils::filename::{station_label, DocumentNaming};
use crate::utils::progress::ProgressReporter;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::info;
use validator::Validate;

pub async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate {
            input,
            output,
            naming,
            locale,
            include_humidity,
            max_workers,
            width,
            height,
        } => {
            if let Some(naming) = naming {
                settings.naming = naming.parse::<DocumentNaming>()?;
            }
            if let Some(locale) = locale {
                settings.locale = locale.parse::<Locale>()?;
            }
            if include_humidity {
                settings.include_humidity = true;
            }
            if let Some(max_workers) = max_workers {
                settings.max_workers = max_workers;
            }
            if let Some(width) = width {
                settings.image_width = width;
            }
            if let Some(height) = height {
                settings.image_height = height;
            }
            settings.validate()?;

            generate(settings, input, output).await
        }

        Commands::Stations { input } => list_stations(&settings, &input),
    }
}

async fn generate(settings: Settings, input: PathBuf, output: PathBuf) -> Result<()> {
    println!("Generating station charts...");
    println!("Input file: {}", input.display());
    println!("Output folder: {}", output.display());
    println!(
        "Workers: {}, Naming: {}, Locale: {}",
        settings.max_workers, settings.naming, settings.locale
    );

    let pipeline = ChartPipeline::from_settings(&settings);
    let mut job = ChartJob::spawn(pipeline, input, output);
    let progress = ProgressReporter::new_spinner("Loading observations...", false);
    follow_job(&mut job, &progress, tokio::signal::ctrl_c()).await;

    let summary = job.wait().await?;

    for failure in &summary.failed {
        println!("  {}: {}", failure.station, failure.message);
    }
    println!("{}", summary.status_message());
    if summary.artifact_count() > 0 {
        println!("Wrote {} files", summary.artifact_count());
    }

    Ok(())
}

/// Relay job events to the terminal until the channel closes. The first
/// completion of `interrupt` cancels the job.
async fn follow_job<I>(job: &mut ChartJob, progress: &ProgressReporter, interrupt: I)
where
    I: Future<Output = std::io::Result<()>>,
{
    let cancel = job.cancel_handle();
    let mut interrupted = false;
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            biased;

            _ = &mut interrupt, if !interrupted => {
                interrupted = true;
                info!("Interrupt received, stopping after the current station");
                cancel.cancel();
                progress.set_message("Cancelling...");
            }
            event = job.next_event() => match event {
                Some(event) => report(progress, event),
                None => break,
            },
        }
    }
}

fn report(progress: &ProgressReporter, event: PipelineEvent) {
    match event {
        PipelineEvent::Loaded {
            stations,
            observations,
        } => {
            progress.set_length(stations as u64);
            progress.set_message(&format!(
                "Rendering {} stations ({} observations)",
                stations, observations
            ));
        }
        PipelineEvent::StationCompleted { station, .. } => {
            progress.increment(1);
            progress.set_message(&station);
        }
        PipelineEvent::StationSkipped { .. } => progress.increment(1),
        PipelineEvent::StationFailed {
            station, message, ..
        } => {
            progress.increment(1);
            progress.println(&format!("Failed: {} ({})", station, message));
        }
        PipelineEvent::Finished(summary) => {
            progress.finish_with_message(&summary.status_message());
        }
        PipelineEvent::Aborted { message } => {
            progress.finish_with_message(&format!("Aborted: {}", message));
        }
    }
}

fn list_stations(settings: &Settings, input: &Path) -> Result<()> {
    let observations = ObservationReader::with_mmap(settings.use_mmap).read_observations(input)?;
    let total = observations.len();

    let grouper = StationGrouper::new();
    let groups = grouper.group_by_station(observations);
    grouper.label_collisions(&groups);
    let window = TrailingWindow::new();

    println!(
        "{} stations, {} observations in {}",
        groups.len(),
        total,
        input.display()
    );
    println!(
        "{:<32} {:>7} {:>12} {:>12} {:>7}",
        "Station",
        "Rows",
        "First",
        "Latest",
        format!("{}d", window.days())
    );

    for group in &groups {
        let fmt_date = |d: Option<chrono::NaiveDate>| {
            d.map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        let windowed = window.apply(group).map(|s| s.len()).unwrap_or(0);

        println!(
            "{:<32} {:>7} {:>12} {:>12} {:>7}",
            station_label(&group.key),
            group.len(),
            fmt_date(group.earliest_date()),
            fmt_date(group.latest_date()),
            windowed
        );
    }

    Ok(())
}
