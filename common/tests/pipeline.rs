use std::{cell::RefCell, fs, path::Path};

use common::{
    aggregate::{Aggregator, PanelGrid, RatioKind},
    error::ReportError,
    locate::{DEFAULT_LOG_SUFFIX, LogLocator},
    matrix::{Category, FileMode, Library, MatrixPoint, Operation, Workload, categories},
    plot::{Plot, plot},
};
use eyre::Result;

#[derive(Debug, Default)]
struct RecordingPlot {
    seen: RefCell<Vec<PanelGrid>>,
}

impl Plot for RecordingPlot {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn plot(&self, grid: &PanelGrid, output: &Path) -> Result<()> {
        self.seen.borrow_mut().push(grid.clone());
        fs::write(output, b"image")?;
        Ok(())
    }
}

/// iops encode the matrix position so ordering mistakes show up as wrong values
fn iops(point: &MatrixPoint) -> f64 {
    let op = point.category.operation.index() as f64;
    let trial = point.category.trial as f64;
    1000.0 * (point.library.index() as f64 + 1.0) + 100.0 * trial + 10.0 * op
}

fn summary(point: &MatrixPoint) -> String {
    let total = 10.0 + point.workload.index() as f64;
    match point.library {
        Library::PosixAio => format!(
            "[{}] {total:.2} s in total, {:.2} s holding lock, {:.2} s avg true io time, {:.2} s max true io time, {:.2} MB/s, {:.2} iops",
            point.category,
            total * 0.25,
            total * 0.01,
            total * 0.5,
            iops(point) / 256.0,
            iops(point)
        ),
        _ => format!("{total:.2} s in total, 65536 requests, {:.2} iops", iops(point)),
    }
}

fn write_tree(base: &Path) {
    let locator = LogLocator::new(base, DEFAULT_LOG_SUFFIX);
    for &workload in Workload::ALL {
        for &file_mode in FileMode::ALL {
            for category in categories() {
                for &library in Library::ALL {
                    let point = MatrixPoint::new(workload, file_mode, library, category);
                    let path = locator.path(&point);
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    fs::write(
                        path,
                        format!("opening files\nrunning {point}\n{}\n", summary(&point)),
                    )
                    .unwrap();
                }
            }
        }
    }
}

fn report(base: &Path, sink: &RecordingPlot) -> Result<()> {
    let aggregator = Aggregator::new(
        LogLocator::new(base, DEFAULT_LOG_SUFFIX),
        Library::PosixAio,
    )?;
    let grid = aggregator.run()?;
    let plots: Vec<Box<dyn Plot>> = vec![Box::new(RecordingPlot::default())];
    plot(&plots, &grid, &base.join("unused.png"))?;
    sink.plot(&grid, &base.join("res.png"))
}

#[test]
fn full_matrix() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());
    let aggregator = Aggregator::new(
        LogLocator::new(dir.path(), DEFAULT_LOG_SUFFIX),
        Library::PosixAio,
    )
    .unwrap();
    let grid = aggregator.run().unwrap();

    assert_eq!(grid.reference, Library::PosixAio);
    assert_eq!(grid.panels().len(), 12);

    let expected_labels = [
        "r1", "w1", "rw1", "r2", "w2", "rw2", "r3", "w3", "rw3", "r4", "w4", "rw4",
    ];
    let mut order = Vec::new();
    for panel in grid.panels() {
        order.push((panel.workload, panel.file_mode));
        let labels = panel
            .categories
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        assert_eq!(labels, expected_labels);

        for &library in Library::ALL {
            let series = panel.throughput(library);
            assert_eq!(series.len(), 12);
            for (category, kiops) in panel.categories.iter().zip(series) {
                let point =
                    MatrixPoint::new(panel.workload, panel.file_mode, library, *category);
                assert!((kiops - iops(&point) / 1000.0).abs() < 1e-9);
            }
        }

        for &kind in RatioKind::ALL {
            let ratios = panel.ratios.get(kind);
            assert_eq!(ratios.len(), 12);
            assert!(ratios.iter().all(|x| (0.0..=1.0).contains(x)));
        }
        assert!(panel.ratios.lock.iter().all(|x| (x - 0.25).abs() < 1e-9));
        assert!(panel.ratios.avg_io.iter().all(|x| (x - 0.01).abs() < 1e-9));
        assert!(panel.ratios.max_io.iter().all(|x| (x - 0.5).abs() < 1e-9));
    }

    let expected_order = Workload::ALL
        .iter()
        .flat_map(|w| FileMode::ALL.iter().map(move |f| (*w, *f)))
        .collect::<Vec<_>>();
    assert_eq!(order, expected_order);

    let panel = grid.get(Workload::M1Discrete, FileMode::Multi).unwrap();
    assert_eq!(panel.title(), "1M-Discrete - Multi File");
}

#[test]
fn rerun_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());
    let aggregator = Aggregator::new(
        LogLocator::new(dir.path(), DEFAULT_LOG_SUFFIX),
        Library::PosixAio,
    )
    .unwrap();
    assert_eq!(aggregator.run().unwrap(), aggregator.run().unwrap());
}

#[test]
fn sink_receives_the_grid() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());
    let sink = RecordingPlot::default();
    report(dir.path(), &sink).unwrap();

    let seen = sink.seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].panels().len(), 12);
    assert!(dir.path().join("res.png").exists());
}

#[test]
fn missing_log_fails_before_plotting() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());
    let locator = LogLocator::new(dir.path(), DEFAULT_LOG_SUFFIX);
    let missing = MatrixPoint::new(
        Workload::M1Overlay,
        FileMode::Multi,
        Library::Fstream,
        Category {
            operation: Operation::ReadWrite,
            trial: 4,
        },
    );
    fs::remove_file(locator.path(&missing)).unwrap();

    let sink = RecordingPlot::default();
    let err = report(dir.path(), &sink).unwrap_err();
    match err.downcast_ref::<ReportError>() {
        Some(ReportError::MissingLogFile { path, .. }) => {
            assert_eq!(path, &locator.path(&missing))
        }
        other => panic!("expected missing log file, got {other:?}"),
    }
    assert!(sink.seen.borrow().is_empty());
    assert!(!dir.path().join("res.png").exists());
}

#[test]
fn summary_without_iops_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());
    let locator = LogLocator::new(dir.path(), DEFAULT_LOG_SUFFIX);
    let broken = MatrixPoint::new(
        Workload::K4Discrete,
        FileMode::Single,
        Library::PosixAio,
        Category {
            operation: Operation::Read,
            trial: 1,
        },
    );
    fs::write(
        locator.path(&broken),
        "12.50 s in total, 3.00 s holding lock, 0.40 s avg true io time, 1.10 s max true io time\n",
    )
    .unwrap();

    let sink = RecordingPlot::default();
    let err = report(dir.path(), &sink).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ReportError>(),
        Some(ReportError::UnparseableSummaryLine { .. })
    ));
    assert!(sink.seen.borrow().is_empty());
}
