use crate::config::Settings;
use crate::error::{ProcessingError, Result};
use crate::models::{ArtifactPaths, StationGroup};
use crate::processors::{RunSummary, StationFailure, StationGrouper, TrailingWindow};
use crate::readers::ObservationReader;
use crate::utils::constants::{DOCUMENT_DIR, IMAGE_DIR};
use crate::utils::filename::station_label;
use crate::writers::ArtifactDispatcher;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Loaded {
        stations: usize,
        observations: usize,
    },
    StationCompleted {
        index: usize,
        total: usize,
        station: String,
        artifacts: ArtifactPaths,
    },
    StationSkipped {
        index: usize,
        total: usize,
        station: String,
    },
    StationFailed {
        index: usize,
        total: usize,
        station: String,
        message: String,
    },
    Finished(RunSummary),
    Aborted {
        message: String,
    },
}

/// Cooperative stop request, checked before each station.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum StationOutcome {
    Rendered(String, ArtifactPaths),
    Skipped,
    Failed(StationFailure),
}

/// Load, group, window and render every station in one input file.
pub struct ChartPipeline {
    reader: ObservationReader,
    grouper: StationGrouper,
    window: TrailingWindow,
    dispatcher: ArtifactDispatcher,
    max_workers: usize,
    image_dir_name: String,
    document_dir_name: String,
}

impl ChartPipeline {
    pub fn new(dispatcher: ArtifactDispatcher) -> Self {
        Self {
            reader: ObservationReader::new(),
            grouper: StationGrouper::new(),
            window: TrailingWindow::new(),
            dispatcher,
            max_workers: 1,
            image_dir_name: IMAGE_DIR.to_string(),
            document_dir_name: DOCUMENT_DIR.to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(ArtifactDispatcher::from_settings(settings))
            .with_reader(ObservationReader::with_mmap(settings.use_mmap))
            .with_max_workers(settings.max_workers)
            .with_dir_names(&settings.image_dir_name, &settings.document_dir_name)
    }

    pub fn with_reader(mut self, reader: ObservationReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_dir_names(mut self, image_dir_name: &str, document_dir_name: &str) -> Self {
        self.image_dir_name = image_dir_name.to_string();
        self.document_dir_name = document_dir_name.to_string();
        self
    }

    /// Run the whole batch. Parse and directory errors abort before any station
    /// is rendered; render errors are recorded per station in the summary.
    pub fn run(
        &self,
        input: &Path,
        output_root: &Path,
        events: Option<&UnboundedSender<PipelineEvent>>,
        cancel: &CancellationFlag,
    ) -> Result<RunSummary> {
        let emit = |event: PipelineEvent| {
            if let Some(tx) = events {
                // A closed receiver only means nobody is listening anymore
                let _ = tx.send(event);
            }
        };

        match self.execute(input, output_root, &emit, cancel) {
            Ok(summary) => {
                info!("{}", summary.status_message());
                emit(PipelineEvent::Finished(summary.clone()));
                Ok(summary)
            }
            Err(e) => {
                warn!("Run aborted: {}", e);
                emit(PipelineEvent::Aborted {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn execute<F>(
        &self,
        input: &Path,
        output_root: &Path,
        emit: &F,
        cancel: &CancellationFlag,
    ) -> Result<RunSummary>
    where
        F: Fn(PipelineEvent) + Sync,
    {
        info!("Loading observations from {}", input.display());
        let observations = self.reader.read_observations(input)?;
        let observations_total = observations.len();

        let groups = self.grouper.group_by_station(observations);
        self.grouper.label_collisions(&groups);
        info!(
            "Found {} stations in {} observations",
            groups.len(),
            observations_total
        );
        emit(PipelineEvent::Loaded {
            stations: groups.len(),
            observations: observations_total,
        });

        let image_dir = output_root.join(&self.image_dir_name);
        let doc_dir = output_root.join(&self.document_dir_name);
        self.dispatcher.prepare_directories(&image_dir, &doc_dir)?;

        let total = groups.len();
        let processed = AtomicUsize::new(0);
        let process = |group: &StationGroup| {
            self.process_station(group, &image_dir, &doc_dir, total, &processed, emit, cancel)
        };

        // Stations sharing a label share files; one lane renders them in input order
        let lanes = self.grouper.label_lanes(&groups);
        let run_lane = |lane: &Vec<usize>| -> Result<Vec<(usize, StationOutcome)>> {
            lane.iter()
                .map(|&i| process(&groups[i]).map(|outcome| (i, outcome)))
                .collect()
        };

        let lane_outcomes: Vec<Vec<(usize, StationOutcome)>> =
            if self.max_workers > 1 && lanes.len() > 1 {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(self.max_workers)
                    .build()
                    .map_err(|e| ProcessingError::Config(e.to_string()))?;
                pool.install(|| lanes.par_iter().map(run_lane).collect::<Result<Vec<_>>>())?
            } else {
                lanes.iter().map(run_lane).collect::<Result<Vec<_>>>()?
            };

        let mut outcomes: Vec<(usize, StationOutcome)> =
            lane_outcomes.into_iter().flatten().collect();
        outcomes.sort_by_key(|(i, _)| *i);

        let mut summary = RunSummary {
            stations_total: total,
            observations_total,
            ..RunSummary::default()
        };
        for (_, outcome) in outcomes {
            match outcome {
                StationOutcome::Rendered(station, paths) => summary.succeeded.push((station, paths)),
                StationOutcome::Skipped => summary.skipped += 1,
                StationOutcome::Failed(failure) => summary.failed.push(failure),
            }
        }

        Ok(summary)
    }

    #[allow(clippy::too_many_arguments)]
    fn process_station<F>(
        &self,
        group: &StationGroup,
        image_dir: &Path,
        doc_dir: &Path,
        total: usize,
        processed: &AtomicUsize,
        emit: &F,
        cancel: &CancellationFlag,
    ) -> Result<StationOutcome>
    where
        F: Fn(PipelineEvent) + Sync,
    {
        if cancel.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }

        let Some(subset) = self.window.apply(group).filter(|s| !s.is_empty()) else {
            let index = processed.fetch_add(1, Ordering::Relaxed) + 1;
            let station = station_label(&group.key);
            debug!("Skipping '{}': no observations", station);
            emit(PipelineEvent::StationSkipped {
                index,
                total,
                station,
            });
            return Ok(StationOutcome::Skipped);
        };

        debug!(
            "Rendering '{}' ({} of {} rows, {} to {})",
            subset.label,
            subset.len(),
            group.len(),
            subset.start,
            subset.latest
        );
        let result = self.dispatcher.render(&subset, image_dir, doc_dir);
        let index = processed.fetch_add(1, Ordering::Relaxed) + 1;

        match result {
            Ok(artifacts) => {
                emit(PipelineEvent::StationCompleted {
                    index,
                    total,
                    station: subset.label.clone(),
                    artifacts: artifacts.clone(),
                });
                Ok(StationOutcome::Rendered(subset.label, artifacts))
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Station '{}' failed: {}", subset.label, e);
                let message = e.to_string();
                emit(PipelineEvent::StationFailed {
                    index,
                    total,
                    station: subset.label.clone(),
                    message: message.clone(),
                });
                Ok(StationOutcome::Failed(StationFailure {
                    station: subset.label,
                    message,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StationChart;
    use crate::writers::ChartRenderer;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};
    use tokio::sync::mpsc;

    const HEADER: &str = "Nombre,fecha,lluvia,tmin,tseca,tmax";

    /// Writes the station name; fails for one chosen station.
    struct StubRenderer {
        fail_for: Option<&'static str>,
    }

    impl ChartRenderer for StubRenderer {
        fn render(&self, chart: &StationChart, path: &Path) -> Result<()> {
            if self.fail_for == Some(chart.station.as_str()) {
                return Err(ProcessingError::render(&chart.station, "stub failure"));
            }
            fs::write(path, format!("{} {}", chart.station, chart.dates.len()))?;
            Ok(())
        }
    }

    fn pipeline(fail_for: Option<&'static str>) -> ChartPipeline {
        ChartPipeline::new(ArtifactDispatcher::new().with_renderers(
            Box::new(StubRenderer { fail_for }),
            Box::new(StubRenderer { fail_for: None }),
        ))
    }

    fn input(rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file
    }

    fn three_stations() -> NamedTempFile {
        input(&[
            "Norte,01/04/2024,1,10,15,20",
            "Sur_Alto,01/04/2024,2,11,16,21",
            "Este,01/04/2024,3,12,17,22",
            "Norte,02/04/2024,0,10,15,20",
        ])
    }

    #[test]
    fn test_renders_every_station() {
        let file = three_stations();
        let out = TempDir::new().unwrap();

        let summary = pipeline(None)
            .run(file.path(), out.path(), None, &CancellationFlag::new())
            .unwrap();

        assert_eq!(summary.stations_total, 3);
        assert_eq!(summary.observations_total, 4);
        assert!(summary.is_success());
        let names: Vec<&str> = summary.succeeded.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(names, vec!["Norte", "Sur Alto", "Este"]);
        assert!(out.path().join("html_output/Sur Alto.html").exists());
        assert!(out.path().join("img_output/Sur Alto.png").exists());
        assert_eq!(
            fs::read_to_string(out.path().join("html_output/Norte.html")).unwrap(),
            "Norte 2"
        );
    }

    #[test]
    fn test_failure_is_isolated() {
        let file = three_stations();
        let out = TempDir::new().unwrap();

        let summary = pipeline(Some("Sur Alto"))
            .run(file.path(), out.path(), None, &CancellationFlag::new())
            .unwrap();

        assert_eq!(summary.succeeded.len(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].station, "Sur Alto");
        assert!(summary.failed[0].message.contains("stub failure"));
        assert!(out.path().join("html_output/Este.html").exists());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let file = three_stations();
        let seq_out = TempDir::new().unwrap();
        let par_out = TempDir::new().unwrap();
        let cancel = CancellationFlag::new();

        let sequential = pipeline(None)
            .run(file.path(), seq_out.path(), None, &cancel)
            .unwrap();
        let parallel = pipeline(None)
            .with_max_workers(4)
            .run(file.path(), par_out.path(), None, &cancel)
            .unwrap();

        let names = |s: &RunSummary| -> Vec<String> {
            s.succeeded.iter().map(|(n, _)| n.clone()).collect()
        };
        assert_eq!(names(&sequential), names(&parallel));
        for name in names(&sequential) {
            let doc = format!("html_output/{}.html", name);
            assert_eq!(
                fs::read(seq_out.path().join(&doc)).unwrap(),
                fs::read(par_out.path().join(&doc)).unwrap()
            );
        }
    }

    #[test]
    fn test_colliding_labels_resolve_like_sequential() {
        let mut rows: Vec<String> = (1..=5)
            .map(|d| format!("Los_Altos,{:02}/04/2024,1,10,15,20", d))
            .collect();
        rows.extend((1..=9).map(|d| format!("Los Altos,{:02}/04/2024,1,10,15,20", d)));
        rows.push("Norte,01/04/2024,1,10,15,20".to_string());
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let file = input(&rows);
        let cancel = CancellationFlag::new();

        for workers in [1, 4] {
            for _ in 0..20 {
                let out = TempDir::new().unwrap();
                let summary = pipeline(None)
                    .with_max_workers(workers)
                    .run(file.path(), out.path(), None, &cancel)
                    .unwrap();

                assert_eq!(
                    fs::read_to_string(out.path().join("html_output/Los Altos.html")).unwrap(),
                    "Los Altos 9"
                );
                let names: Vec<&str> =
                    summary.succeeded.iter().map(|(s, _)| s.as_str()).collect();
                assert_eq!(names, vec!["Los Altos", "Los Altos", "Norte"]);
                assert_eq!(summary.artifact_count(), 4);
            }
        }
    }

    #[test]
    fn test_parse_error_aborts_before_directories() {
        let file = input(&["Norte,2024-04-01,1,10,15,20"]);
        let out = TempDir::new().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let err = pipeline(None)
            .run(file.path(), out.path(), Some(&tx), &CancellationFlag::new())
            .unwrap_err();

        assert!(matches!(err, ProcessingError::InvalidDate { .. }));
        assert!(!out.path().join("html_output").exists());
        assert!(matches!(rx.try_recv(), Ok(PipelineEvent::Aborted { .. })));
    }

    #[test]
    fn test_cancelled_before_first_station() {
        let file = three_stations();
        let out = TempDir::new().unwrap();
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let err = pipeline(None)
            .run(file.path(), out.path(), None, &cancel)
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Cancelled));
        assert!(!out.path().join("html_output/Norte.html").exists());
    }

    #[test]
    fn test_events_in_order() {
        let file = three_stations();
        let out = TempDir::new().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        pipeline(None)
            .run(file.path(), out.path(), Some(&tx), &CancellationFlag::new())
            .unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            PipelineEvent::Loaded {
                stations: 3,
                observations: 4
            }
        );
        for expected in 1..=3 {
            match rx.try_recv().unwrap() {
                PipelineEvent::StationCompleted { index, total, .. } => {
                    assert_eq!(index, expected);
                    assert_eq!(total, 3);
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }
        assert!(matches!(rx.try_recv(), Ok(PipelineEvent::Finished(_))));
    }

    #[test]
    fn test_header_only_is_a_clean_empty_run() {
        let file = input(&[]);
        let out = TempDir::new().unwrap();

        let summary = pipeline(None)
            .run(file.path(), out.path(), None, &CancellationFlag::new())
            .unwrap();

        assert_eq!(summary.stations_total, 0);
        assert!(summary.is_success());
        assert_eq!(fs::read_dir(out.path().join("html_output")).unwrap().count(), 0);
    }
}
