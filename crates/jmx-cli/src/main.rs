use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use jmx_lib::{
    batch::{run_benchmark, write_summary_csv},
    detectors::{
        ecg::{TwoAverageConfig, TwoAverageDetector},
        Detector,
    },
    io::{load_annotation_events, manifest::ManifestDataset, text as text_io, wfdb as wfdb_io},
    metrics::{
        jmx::{evaluate, JitterMode, JmxConfig},
        sensitivity::evaluate_sensitivity,
    },
    plot::{figure_from_score_map, Figure, Series},
    signal::TimeSeries,
};
use log::info;
use serde::Serialize;
use plotters::prelude::*;
use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "jmx",
    version,
    about = "JMX: jitter, missed and extra beat scoring for beat detectors"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum JitterModeArg {
    /// Differences of successive inter-beat intervals
    Interval,
    /// Offsets between matched positions
    Positional,
}

impl From<JitterModeArg> for JitterMode {
    fn from(arg: JitterModeArg) -> Self {
        match arg {
            JitterModeArg::Interval => JitterMode::Interval,
            JitterModeArg::Positional => JitterMode::Positional,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Score detections against annotated beats
    Evaluate {
        #[arg(long)]
        detections: PathBuf,
        #[arg(long)]
        annotations: PathBuf,
        #[arg(long, default_value_t = 250.0)]
        fs: f64,
        /// Length of the recording in samples
        #[arg(long)]
        n_samples: usize,
        /// Keep the first and last annotated beats
        #[arg(long)]
        no_trim: bool,
        #[arg(long, default_value_t = 10)]
        trim_start: usize,
        #[arg(long, default_value_t = -5, allow_negative_numbers = true)]
        trim_end: isize,
        #[arg(long, default_value_t = 4.0)]
        reference_jitter_ms: f64,
        #[arg(long, default_value_t = 220.0)]
        max_hr: f64,
        #[arg(long, value_enum, default_value_t = JitterModeArg::Interval)]
        jitter_mode: JitterModeArg,
        /// Multiplier of the median absolute deviation; 1 gives the raw statistic
        #[arg(long, default_value_t = 1.4826)]
        mad_scale: f64,
    },
    /// Tolerance-window sensitivity, positive predictivity and F1
    Sensitivity {
        #[arg(long)]
        detections: PathBuf,
        #[arg(long)]
        annotations: PathBuf,
        #[arg(long, default_value_t = 250.0)]
        fs: f64,
        #[arg(long)]
        n_samples: usize,
        #[arg(long, default_value_t = 0.05)]
        tolerance_s: f64,
    },
    /// Detect R-peaks from newline-delimited samples read from stdin or --input file
    Detect {
        #[arg(long, default_value_t = 250.0)]
        fs: f64,
        #[arg(long, default_value_t = 0.3)]
        min_rr_s: f64,
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        wfdb_header: Option<PathBuf>,
        #[arg(long, default_value_t = 0)]
        wfdb_lead: usize,
    },
    /// Run every detector over the recordings listed in a manifest
    Benchmark {
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Sample the jitter to score curve; renders a PNG when --out is given
    ScoreMap {
        #[arg(long, default_value_t = 4.0)]
        reference_jitter_ms: f64,
        /// Upper end of the jitter axis; defaults to 12 reference jitters
        #[arg(long)]
        max_jitter_ms: Option<f64>,
        #[arg(long, default_value_t = 200)]
        points: usize,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Evaluate {
            detections,
            annotations,
            fs,
            n_samples,
            no_trim,
            trim_start,
            trim_end,
            reference_jitter_ms,
            max_hr,
            jitter_mode,
            mad_scale,
        } => {
            let cfg = JmxConfig {
                trim: !no_trim,
                trim_start,
                trim_end,
                reference_jitter_s: reference_jitter_ms / 1e3,
                max_heart_rate_bpm: max_hr,
                jitter_mode: jitter_mode.into(),
                mad_scale,
            };
            cmd_evaluate(&detections, &annotations, fs, n_samples, &cfg)?
        }
        Commands::Sensitivity {
            detections,
            annotations,
            fs,
            n_samples,
            tolerance_s,
        } => cmd_sensitivity(&detections, &annotations, fs, n_samples, tolerance_s)?,
        Commands::Detect {
            fs,
            min_rr_s,
            input,
            wfdb_header,
            wfdb_lead,
        } => cmd_detect(
            fs,
            min_rr_s,
            input.as_deref(),
            wfdb_header.as_deref(),
            wfdb_lead,
        )?,
        Commands::Benchmark { manifest, out } => cmd_benchmark(&manifest, &out)?,
        Commands::ScoreMap {
            reference_jitter_ms,
            max_jitter_ms,
            points,
            out,
        } => cmd_score_map(reference_jitter_ms, max_jitter_ms, points, out.as_deref())?,
    }
    Ok(())
}

fn read_samples(input: Option<&Path>) -> Result<Vec<f64>> {
    match input {
        Some(path) => text_io::read_f64_series(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_f64_series(&buf)
        }
    }
}

fn load_time_series(
    fs: f64,
    input: Option<&Path>,
    wfdb_header: Option<&Path>,
    wfdb_lead: usize,
) -> Result<TimeSeries> {
    if let Some(header) = wfdb_header {
        wfdb_io::load_wfdb_lead(header, wfdb_lead)
    } else {
        let data = read_samples(input)?;
        Ok(TimeSeries { fs, data })
    }
}

fn load_pair(detections: &Path, annotations: &Path) -> Result<(Vec<i64>, Vec<i64>)> {
    let detected = load_annotation_events(detections)
        .with_context(|| format!("loading detections {}", detections.display()))?;
    let annotated = load_annotation_events(annotations)
        .with_context(|| format!("loading annotations {}", annotations.display()))?;
    Ok((detected.positions(), annotated.positions()))
}

fn cmd_evaluate(
    detections: &Path,
    annotations: &Path,
    fs: f64,
    n_samples: usize,
    cfg: &JmxConfig,
) -> Result<()> {
    let (detected, annotated) = load_pair(detections, annotations)?;
    let report = evaluate(&detected, &annotated, fs, n_samples, cfg)?;
    if report.is_low_confidence() {
        log::warn!(
            "fewer than {} beats after trimming, score is unreliable",
            jmx_lib::metrics::jmx::MIN_RELIABLE_EVENTS
        );
    }
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn cmd_sensitivity(
    detections: &Path,
    annotations: &Path,
    fs: f64,
    n_samples: usize,
    tolerance_s: f64,
) -> Result<()> {
    let (detected, annotated) = load_pair(detections, annotations)?;
    let tolerance = (tolerance_s * fs).round() as i64;
    let result = evaluate_sensitivity(&detected, &annotated, tolerance, n_samples)?;
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}

fn cmd_detect(
    fs: f64,
    min_rr_s: f64,
    input: Option<&Path>,
    wfdb_header: Option<&Path>,
    wfdb_lead: usize,
) -> Result<()> {
    let ts = load_time_series(fs, input, wfdb_header, wfdb_lead)?;
    let detector = TwoAverageDetector::new(TwoAverageConfig {
        min_rr_s,
        ..TwoAverageConfig::default()
    });
    let events = detector.detect(&ts);
    println!("{}", serde_json::to_string(&events)?);
    Ok(())
}

fn cmd_benchmark(manifest: &Path, out: &Path) -> Result<()> {
    let dataset = ManifestDataset::read(manifest)?;
    let detectors: Vec<Box<dyn Detector>> = vec![Box::new(TwoAverageDetector::default())];
    let results = run_benchmark(&dataset, &detectors, dataset.config())?;

    fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    for name in results.detectors() {
        write_json(&out.join(format!("{}.json", name)), &results.for_detector(name))?;
        write_json(
            &out.join(format!("sens_{}.json", name)),
            &results.sensitivity_for_detector(name),
        )?;
    }
    write_summary_csv(
        &out.join("summary.csv"),
        &results.summarize(dataset.config().min_sensitivity),
    )?;
    println!("{}", serde_json::to_string(&results.global_summary())?);
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)?;
    info!("wrote {}", path.display());
    Ok(())
}

fn cmd_score_map(
    reference_jitter_ms: f64,
    max_jitter_ms: Option<f64>,
    points: usize,
    out: Option<&Path>,
) -> Result<()> {
    anyhow::ensure!(
        reference_jitter_ms > 0.0,
        "reference jitter must be positive, got {}",
        reference_jitter_ms
    );
    let max_ms = max_jitter_ms.unwrap_or(12.0 * reference_jitter_ms);
    let fig = figure_from_score_map(reference_jitter_ms / 1e3, max_ms / 1e3, points);
    match out {
        Some(path) => draw_plotters_figure(path, &fig)?,
        None => println!("{}", serde_json::to_string(&fig)?),
    }
    Ok(())
}

fn draw_plotters_figure(path: &Path, fig: &Figure) -> Result<()> {
    let backend = BitMapBackend::new(path, (800, 480));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let (x_min, mut x_max, y_min, mut y_max) = fig.bounds().unwrap_or((0.0, 1.0, 0.0, 1.0));
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }
    if y_max <= y_min {
        y_max = y_min + 1.0;
    }
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 24),
        )
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    let mut mesh = chart.configure_mesh();
    if let Some(label) = &fig.x.label {
        mesh.x_desc(label.as_str());
    }
    if let Some(label) = &fig.y.label {
        mesh.y_desc(label.as_str());
    }
    mesh.draw()?;
    for series in &fig.series {
        match series {
            Series::Line(line) => {
                let (r, g, b) = line.style.color.rgb();
                chart.draw_series(LineSeries::new(
                    line.points.iter().map(|p| (p[0], p[1])),
                    RGBColor(r, g, b).stroke_width(line.style.width.round() as u32),
                ))?;
            }
        }
    }
    root.present()?;
    Ok(())
}
