use log::*;
use rand::{rngs::StdRng, SeedableRng};

use softmax_mlp::{
    cli::Cli,
    utils::{construct_class_1hot_mapping, init, load_data, to_matrices, write_values},
    Network, Result, Sizes,
};

fn main() {
    let cli = init();
    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let train_points = load_data(&cli.input_file, cli.num_features)?;
    let class_map = construct_class_1hot_mapping(&train_points);
    let (train_x, train_y) = to_matrices(&train_points, &class_map)?;
    info!("Detected {} classes", class_map.len());

    let sizes = Sizes {
        nin: train_x.ncols(),
        nhidden1: cli.hidden1,
        nhidden2: cli.hidden2,
        nout: class_map.len(),
    };
    let mut net = match cli.seed {
        Some(seed) => Network::with_rng(sizes, cli.beta, cli.momentum, &mut StdRng::seed_from_u64(seed))?,
        None => Network::new(sizes, cli.beta, cli.momentum)?,
    };
    let costs = net.train(&train_x, &train_y, cli.learning_rate, cli.iterations)?;
    if let Some(file) = &cli.log_file_costs {
        write_values(file, &costs)?;
    }

    let evaluation = match &cli.test_file {
        Some(path) => {
            let test_points = load_data(path, sizes.nin)?;
            let (test_x, test_y) = to_matrices(&test_points, &class_map)?;
            net.evaluate(&test_x, &test_y)?
        }
        None => {
            warn!("No test file given, evaluating on the training data");
            net.evaluate(&train_x, &train_y)?
        }
    };
    debug!("evaluated {} samples", evaluation.total());
    return Ok(());
}
