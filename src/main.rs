// Small end-to-end demo of the library: trains a two-class XOR network,
// prints its predictions and round-trips it through a model file.
//
// Run with:
//   RUST_LOG=info cargo run
use std::process;

use ferrite_classifier::{
    one_hot, rank_predictions, train_loop, Activation, ModelMetadata, Network, NetworkSpec, TrainConfig,
};
use log::{error, info};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("{e}");
        process::exit(1);
    }
}

fn run() -> ferrite_classifier::Result<()> {
    let inputs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let labels = [0usize, 1, 1, 0];
    let targets: Vec<Vec<f64>> = labels.iter().filter_map(|&l| one_hot(l, 2)).collect();
    let class_names = vec!["same".to_string(), "different".to_string()];

    let mut network = NetworkSpec::new(vec![2, 8, 2])
        .with_learning_rate(0.5)
        .with_activation(Activation::Sigmoid)
        .build()?;

    let config = TrainConfig::new(2000).with_workers(2).with_report_every(200);
    let loss = train_loop(&mut network, &inputs, &targets, &config)?;
    info!("final loss {loss:.6}");

    for input in &inputs {
        let probs = network.forward(input)?;
        let best = &rank_predictions(&probs, 1, Some(class_names.as_slice()))[0];
        println!(
            "Input: {:?} -> {} ({:.4})",
            input,
            best.class_name.as_deref().unwrap_or("?"),
            best.confidence
        );
    }

    let model_path = std::env::temp_dir().join("ferrite-classifier-demo.bin");
    network.save(&model_path)?;
    ModelMetadata {
        activation: network.activation(),
        description: Some("xor demo".into()),
        output_labels: Some(class_names),
    }
    .save_json(ModelMetadata::sidecar_path(&model_path))?;

    let meta = ModelMetadata::load_json(ModelMetadata::sidecar_path(&model_path))?;
    let restored = Network::from_file(&model_path, meta.activation)?;
    let same = inputs
        .iter()
        .all(|x| restored.forward(x).ok() == network.forward(x).ok());
    println!("Reloaded from {}: identical outputs = {same}", model_path.display());

    Ok(())
}
