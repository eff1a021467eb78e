use crate::config::Settings;
use crate::error::{ProcessingError, Result};
use crate::models::{ArtifactPaths, Locale, StationChart, WindowedSubset};
use crate::utils::filename::{document_file_name, image_file_name, DocumentNaming};
use crate::writers::{ChartRenderer, HtmlChartWriter, PngChartWriter};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Hands each station window to the document and image renderers.
pub struct ArtifactDispatcher {
    document: Box<dyn ChartRenderer>,
    image: Box<dyn ChartRenderer>,
    naming: DocumentNaming,
    locale: Locale,
    include_humidity: bool,
}

impl ArtifactDispatcher {
    pub fn new() -> Self {
        Self {
            document: Box::new(HtmlChartWriter::new()),
            image: Box::new(PngChartWriter::new()),
            naming: DocumentNaming::default(),
            locale: Locale::default(),
            include_humidity: false,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let document =
            HtmlChartWriter::new().with_size(settings.document_width, settings.document_height);
        let image = PngChartWriter::new()
            .with_size(settings.image_width, settings.image_height)
            .with_font_path(settings.font_path.clone());

        Self::new()
            .with_renderers(Box::new(document), Box::new(image))
            .with_naming(settings.naming)
            .with_locale(settings.locale)
            .with_humidity(settings.include_humidity)
    }

    pub fn with_naming(mut self, naming: DocumentNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_humidity(mut self, include_humidity: bool) -> Self {
        self.include_humidity = include_humidity;
        self
    }

    pub fn with_renderers(
        mut self,
        document: Box<dyn ChartRenderer>,
        image: Box<dyn ChartRenderer>,
    ) -> Self {
        self.document = document;
        self.image = image;
        self
    }

    /// Create both output directories if absent.
    pub fn prepare_directories(&self, image_dir: &Path, doc_dir: &Path) -> Result<()> {
        for dir in [image_dir, doc_dir] {
            fs::create_dir_all(dir).map_err(|source| ProcessingError::Directory {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// Write one document and one image for the window, overwriting existing files.
    pub fn render(
        &self,
        subset: &WindowedSubset,
        image_dir: &Path,
        doc_dir: &Path,
    ) -> Result<ArtifactPaths> {
        if subset.is_empty() {
            return Err(ProcessingError::EmptyWindow {
                station: subset.label.clone(),
            });
        }

        self.prepare_directories(image_dir, doc_dir)?;

        let chart = StationChart::from_subset(subset, self.locale, self.include_humidity)?;
        let paths = ArtifactPaths {
            document: doc_dir.join(document_file_name(subset, self.naming)),
            image: image_dir.join(image_file_name(subset)),
        };

        self.document.render(&chart, &paths.document)?;
        self.image.render(&chart, &paths.image)?;

        debug!(
            "Wrote {} and {} ({} rows)",
            paths.document.display(),
            paths.image.display(),
            subset.len()
        );
        Ok(paths)
    }
}

impl Default for ArtifactDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;
    use chrono::{Duration, NaiveDate};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct CountingRenderer {
        calls: Arc<AtomicUsize>,
    }

    impl ChartRenderer for CountingRenderer {
        fn render(&self, chart: &StationChart, path: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            fs::write(path, &chart.station)?;
            Ok(())
        }
    }

    fn subset(rows: usize) -> WindowedSubset {
        let latest = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let observations = (0..rows)
            .map(|i| {
                Observation::new(
                    "San Jose".to_string(),
                    latest - Duration::days((rows - 1 - i) as i64),
                    Some(1.0),
                    Some(10.0),
                    Some(15.0),
                    Some(20.0),
                )
            })
            .collect();
        WindowedSubset {
            key: "San_Jose".to_string(),
            label: "San Jose".to_string(),
            start: latest - Duration::days(30),
            latest,
            observations,
        }
    }

    fn counting() -> (ArtifactDispatcher, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = ArtifactDispatcher::new().with_renderers(
            Box::new(CountingRenderer {
                calls: calls.clone(),
            }),
            Box::new(CountingRenderer {
                calls: calls.clone(),
            }),
        );
        (dispatcher, calls)
    }

    #[test]
    fn test_creates_directories_and_writes_pair() {
        let root = TempDir::new().unwrap();
        let image_dir = root.path().join("img_output");
        let doc_dir = root.path().join("html_output");
        let (dispatcher, calls) = counting();

        let paths = dispatcher.render(&subset(5), &image_dir, &doc_dir).unwrap();

        assert_eq!(paths.document, doc_dir.join("San Jose.html"));
        assert_eq!(paths.image, image_dir.join("San Jose.png"));
        assert!(paths.document.exists());
        assert!(paths.image.exists());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_month_year_naming() {
        let root = TempDir::new().unwrap();
        let (dispatcher, _) = counting();
        let dispatcher = dispatcher.with_naming(DocumentNaming::MonthYear);

        let paths = dispatcher
            .render(&subset(3), root.path(), root.path())
            .unwrap();
        assert_eq!(paths.document, root.path().join("San Jose_03-2024.html"));
        assert_eq!(paths.image, root.path().join("San Jose.png"));
    }

    #[test]
    fn test_rerun_overwrites() {
        let root = TempDir::new().unwrap();
        let (dispatcher, _) = counting();

        let first = dispatcher.render(&subset(2), root.path(), root.path()).unwrap();
        fs::write(&first.document, "stale").unwrap();
        let second = dispatcher.render(&subset(2), root.path(), root.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(&second.document).unwrap(), "San Jose");
    }

    #[test]
    fn test_empty_subset_renders_nothing() {
        let root = TempDir::new().unwrap();
        let (dispatcher, calls) = counting();

        let err = dispatcher
            .render(&subset(0), &root.path().join("img"), &root.path().join("doc"))
            .unwrap_err();

        assert!(matches!(err, ProcessingError::EmptyWindow { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!root.path().join("img").exists());
    }

    #[test]
    fn test_directory_failure() {
        let root = TempDir::new().unwrap();
        let blocker = root.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let (dispatcher, _) = counting();

        let err = dispatcher
            .prepare_directories(&blocker.join("img"), root.path())
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Directory { .. }));
    }
}
