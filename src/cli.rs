use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Train a two-hidden-layer softmax classifier on whitespace separated data and evaluate it
#[derive(Parser, Debug)]
pub struct Cli {
    /// level of logging details (into stderr), RUST_LOG takes precedence when set
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// path to file with training data, one sample per line with the class label in the last column
    #[arg(short, long)]
    pub input_file: PathBuf,

    /// path to file with evaluation data in the same format, training data is used when omitted
    #[arg(short, long)]
    pub test_file: Option<PathBuf>,

    /// number of features that will be present in the data, leave 0 for "auto"
    #[arg(long, default_value_t = 0)]
    pub num_features: usize,

    /// number of neurons in the first hidden layer
    #[arg(long, default_value_t = 5)]
    pub hidden1: usize,

    /// number of neurons in the second hidden layer
    #[arg(long, default_value_t = 7)]
    pub hidden2: usize,

    /// steepness of the sigmoid in hidden layers
    #[arg(long, default_value_t = 1.0)]
    pub beta: f64,

    /// learning momentum, must be larger or equal to 0 and smaller than 1
    #[arg(long, default_value_t = 0.9)]
    pub momentum: f64,

    /// learning rate
    #[arg(long, visible_alias = "eta", default_value_t = 0.1)]
    pub learning_rate: f64,

    /// number of full-batch training iterations
    #[arg(long, default_value_t = 1000)]
    pub iterations: usize,

    /// seed for weight initialisation, random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// file where loss values of every iteration will be logged
    #[arg(long)]
    pub log_file_costs: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Off,
}
