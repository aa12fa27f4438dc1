use std::fs;
use std::path::PathBuf;

use ferrite_classifier::persist::{decode, encode_legacy, Format};
use ferrite_classifier::{Activation, Layer, Matrix, Network, NetworkError};
use rand::{rngs::StdRng, SeedableRng};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("ferrite-{name}-{}.bin", std::process::id()))
}

fn trained(sizes: &[usize], seed: u64) -> Network {
    let mut network = Network::with_rng(sizes, 0.2, Activation::Tanh, &mut StdRng::seed_from_u64(seed)).unwrap();
    let inputs: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64 / 6.0; sizes[0]]).collect();
    let targets: Vec<Vec<f64>> = (0..6)
        .map(|i| ferrite_classifier::one_hot(i % sizes[sizes.len() - 1], sizes[sizes.len() - 1]).unwrap())
        .collect();
    network.train_batch(&inputs, &targets, 5).unwrap();
    network
}

#[test]
fn save_then_load_reproduces_forward_bit_for_bit() {
    let path = temp_path("roundtrip");
    let network = trained(&[5, 7, 4, 3], 1);
    network.save(&path).unwrap();

    let mut restored = Network::with_rng(&[5, 2, 3], 0.9, Activation::Tanh, &mut StdRng::seed_from_u64(2)).unwrap();
    restored.load(&path).unwrap();

    for x in [[0.0; 5], [1.0, -1.0, 0.5, 0.25, 3.0], [0.1, 0.2, 0.3, 0.4, 0.5]] {
        let a = network.forward(&x).unwrap();
        let b = restored.forward(&x).unwrap();
        assert!(a.iter().zip(&b).all(|(p, q)| p.to_bits() == q.to_bits()));
    }
    assert_eq!(restored, network);
    let _ = fs::remove_file(path);
}

#[test]
fn two_three_two_structure_round_trips_exactly() {
    let hidden = Layer::from_parts(
        Matrix::from_data(vec![vec![0.1, -0.2], vec![0.3, 0.4], vec![-0.5, 0.6]]),
        vec![0.01, 0.02, 0.03],
    )
    .unwrap();
    let output = Layer::from_parts(
        Matrix::from_data(vec![vec![0.7, -0.8, 0.9], vec![1.0, 1.1, -1.2]]),
        vec![-0.04, 0.05],
    )
    .unwrap();
    let network = Network::from_layers(vec![hidden, output], 0.125, Activation::Sigmoid).unwrap();
    let path = temp_path("two-three-two");
    network.save(&path).unwrap();

    let mut fresh = Network::new(&[2, 3, 2], 0.01, Activation::Sigmoid).unwrap();
    fresh.load(&path).unwrap();

    assert_eq!(fresh.layer_sizes(), &[2, 3, 2]);
    assert_eq!(fresh.learning_rate(), 0.125);
    assert_eq!(fresh.layers(), network.layers());
    let _ = fs::remove_file(path);
}

#[test]
fn legacy_files_load_and_keep_the_activation() {
    let path = temp_path("legacy");
    let network = trained(&[3, 4, 2], 3);
    network.save_legacy(&path).unwrap();
    assert_eq!(fs::read(&path).unwrap(), encode_legacy(&network));
    assert_eq!(decode(&fs::read(&path).unwrap()).unwrap().format, Format::Legacy);

    let restored = Network::from_file(&path, Activation::Tanh).unwrap();
    assert_eq!(restored, network);

    let relu = Network::from_file(&path, Activation::ReLU).unwrap();
    assert_eq!(relu.activation(), Activation::ReLU);
    assert_eq!(relu.layers(), network.layers());
    let _ = fs::remove_file(path);
}

#[test]
fn missing_file_is_reported_and_state_kept() {
    let mut network = trained(&[2, 3, 2], 4);
    let before = network.clone();

    let err = network.load(temp_path("does-not-exist")).unwrap_err();

    assert!(matches!(err, NetworkError::Io(_)));
    assert_eq!(network, before);
}

#[test]
fn truncated_file_is_rejected_and_state_kept() {
    let path = temp_path("truncated");
    let source = trained(&[4, 5, 3], 5);
    source.save(&path).unwrap();
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

    let mut network = trained(&[2, 3, 2], 6);
    let before = network.clone();
    assert!(matches!(network.load(&path), Err(NetworkError::CorruptModel(_))));
    assert_eq!(network, before);
    let _ = fs::remove_file(path);
}

#[test]
fn garbage_file_is_rejected() {
    let path = temp_path("garbage");
    fs::write(&path, b"definitely not a model file").unwrap();
    assert!(matches!(
        Network::from_file(&path, Activation::Sigmoid),
        Err(NetworkError::CorruptModel(_))
    ));
    let _ = fs::remove_file(path);
}
