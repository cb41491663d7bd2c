use std::path::Path;

use bimap::BiMap;
use clap::Parser;
use env_logger::Env;
use itertools::Itertools;
use log::{info, trace, warn};
use nalgebra::DMatrix;

use crate::{
    cli::{Cli, LogLevel},
    error::{Error, Result},
};

/// Class label as it appears in the data file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassID(pub u32);
/// Position of the class in the one-hot encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassIndex(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub features: Vec<f64>,
    pub class: ClassID,
}

/// Sum-of-squares loss over the whole batch: 0.5 * sum((outputs - targets)^2)
pub fn compute_cost(outputs: &DMatrix<f64>, targets: &DMatrix<f64>) -> f64 {
    return 0.5 * (outputs - targets).map(|v| return v * v).sum();
}

/// Parse whitespace separated samples, one per line, features first and the class label last.
/// With `num_features == 0` the number of features is detected from the first line.
pub fn parse_points(text: &str, mut num_features: usize) -> Result<Vec<Point>> {
    let mut points: Vec<Point> = vec![];
    for (line_idx, line) in text.lines().filter(|l| return !l.trim().is_empty()).enumerate() {
        let mut columns = line.split_whitespace();

        // If the number of features is not specified, guess it from the first line.
        // For the following lines this also checks that the data are consistent.
        if num_features == 0 {
            // last column is class, so subtract 1 from the number of columns
            let n = columns.clone().count().saturating_sub(1);
            if n < 1 {
                return Err(Error::Data(format!("Detected {} features, but need at least 1.", n)));
            }
            info!("Detected number of features: {}", n);
            num_features = n;
        }

        let mut features = Vec::with_capacity(num_features);
        for i in 0..num_features {
            let Some(s) = columns.next() else {
                return Err(Error::Data(format!("line {:?} doesn't have enough columns, expected {}", line, num_features + 1)));
            };
            let Ok(n) = s.parse::<f64>() else {
                return Err(Error::Data(format!("Can't parse {}. column of {}. line ({:?}) into f64", i + 1, line_idx + 1, s)));
            };
            features.push(n);
        }
        let Some(s) = columns.next() else {
            return Err(Error::Data(format!("line {:?} doesn't have enough columns, expected {}", line, num_features + 1)));
        };
        let class = match s.parse::<f64>() {
            Ok(n) if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => ClassID(n as u32),
            _ => return Err(Error::Data(format!("Can't parse class label of {}. line ({:?}) into a non-negative integer", line_idx + 1, s))),
        };
        if columns.next().is_some() {
            warn!("{}. line contains more columns than expected ({})", line_idx + 1, num_features + 1)
        }
        points.push(Point { features, class });
    }
    if points.is_empty() {
        return Err(Error::Data(String::from("no samples found")));
    }
    return Ok(points);
}

/// Load samples from a file, see [`parse_points`] for the format
pub fn load_data(path: &Path, num_features: usize) -> Result<Vec<Point>> {
    trace!("Loading data from {:?}", path);
    let text = std::fs::read_to_string(path)?;
    let points = parse_points(&text, num_features)?;
    info!("Loaded {} datapoints from {:?}", points.len(), path);
    return Ok(points);
}

/// Map every class label present in the data onto an index, in ascending label order
pub fn construct_class_1hot_mapping(data: &[Point]) -> BiMap<ClassID, ClassIndex> {
    trace!("Constructing one-hot class mapping...");
    let mut map = BiMap::new();
    let unique_classes = data.iter().map(|d| return d.class).unique().sorted();
    for (cls_idx, cls_val) in unique_classes.enumerate() {
        map.insert(cls_val, ClassIndex(cls_idx as u32));
    }
    trace!("Successfully constructed one-hot mapping for {} classes.", map.len());
    return map;
}

/// Stack the points into a feature matrix (N, features) and a one-hot target matrix (N, classes)
pub fn to_matrices(data: &[Point], class_map: &BiMap<ClassID, ClassIndex>) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
    let num_features = data.first().map(|p| return p.features.len()).unwrap_or(0);
    let mut features = DMatrix::<f64>::zeros(data.len(), num_features);
    let mut targets = DMatrix::<f64>::zeros(data.len(), class_map.len());
    for (row, point) in data.iter().enumerate() {
        if point.features.len() != num_features {
            return Err(Error::ShapeMismatch {
                what: "point features",
                expected: (1, num_features),
                found: (1, point.features.len()),
            });
        }
        for (col, val) in point.features.iter().enumerate() {
            features[(row, col)] = *val;
        }
        let Some(class_idx) = class_map.get_by_left(&point.class) else {
            return Err(Error::Data(format!("class {} was not present in the training data", point.class.0)));
        };
        targets[(row, class_idx.0 as usize)] = 1.0;
    }
    return Ok((features, targets));
}

/// Write the values into the file, one per line
pub fn write_values(path: &Path, values: &[f64]) -> Result<()> {
    trace!("writing {} values into file {}", values.len(), path.to_string_lossy());
    std::fs::write(path, values.iter().map(|v| return v.to_string()).join("\n"))?;
    info!("Written values into file {}", path.to_string_lossy());
    return Ok(());
}

/// Parse the command line, set up logging and fix invalid settings
pub fn init() -> Cli {
    let mut cli = Cli::parse();
    let loglevel = match cli.log_level {
        LogLevel::Warn => "off,softmax_mlp=warn",
        LogLevel::Info => "off,softmax_mlp=info",
        LogLevel::Error => "off,softmax_mlp=error",
        LogLevel::Debug => "off,softmax_mlp=debug",
        LogLevel::Trace => "off,softmax_mlp=trace",
        LogLevel::Off => "off",
    };
    // RUST_LOG from the environment wins over the command line
    env_logger::init_from_env(Env::default().default_filter_or(loglevel));
    if cli.momentum < 0.0 {
        cli.momentum = 0.0;
        warn!("Momentum can't be negative, overwriting to {}", cli.momentum);
    } else if cli.momentum >= 1.0 {
        cli.momentum = 0.9;
        warn!("Momentum must be smaller than 1, overwriting to {}", cli.momentum);
    }
    if cli.hidden1 == 0 {
        cli.hidden1 = 5;
        warn!("First hidden layer can't be empty, overwriting to {}", cli.hidden1);
    }
    if cli.hidden2 == 0 {
        cli.hidden2 = 7;
        warn!("Second hidden layer can't be empty, overwriting to {}", cli.hidden2);
    }
    return cli;
}
