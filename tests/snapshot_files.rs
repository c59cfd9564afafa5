use rand::rngs::StdRng;
use rand::SeedableRng;

use neurogenetic::snapshot::{self, HEADER_LEN};
use neurogenetic::{Activation, Crossover, EngineConfig, Error, Mutation, Noise, Topology};

fn config() -> EngineConfig {
    EngineConfig::from_toml_str(
        r#"
topology = [3, 4, 2]
activation = "sin"
population = 12
survivors = 3
mutation_rate = 0.3
mutation_magnitude = 0.1
mutation = "all-genes"
crossover = "uniform"
noise = "uniform"
seed = 7
"#,
    )
    .unwrap()
}

#[test]
fn test_save_and_load_through_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("population.sng");

    let config = config();
    let mut rng = config.rng();
    let mut engine = config.build(&mut rng).unwrap();
    for i in 0..engine.len() {
        engine.set_fitness(i, (i % 5) as f64);
    }
    engine.advance_generation(&mut rng);
    engine.advance_generation(&mut rng);

    snapshot::save(&engine, &path).unwrap();
    let loaded = snapshot::load(&path).unwrap();

    assert_eq!(loaded.generation(), 2);
    assert_eq!(loaded.params(), engine.params());
    assert_eq!(loaded.population(), engine.population());
    assert_eq!(loaded.params().activation, Activation::Sin);
    assert_eq!(loaded.params().crossover, Crossover::Uniform);
    assert_eq!(loaded.params().mutation, Mutation::AllGenes);
    assert_eq!(loaded.params().noise, Noise::Uniform);

    // a loaded engine keeps evolving
    let mut loaded = loaded;
    loaded.advance_generation_concurrently(2, &mut StdRng::seed_from_u64(3));
    assert_eq!(loaded.generation(), 3);
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = snapshot::load(&dir.path().join("absent.sng")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_load_truncated_file_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cut.sng");
    let config = config();
    let engine = config.build(&mut config.rng()).unwrap();
    let bytes = snapshot::encode(&engine).unwrap();
    std::fs::write(&path, &bytes[..HEADER_LEN + 10]).unwrap();

    assert!(matches!(snapshot::load(&path), Err(Error::Decode(_))));
}

#[test]
fn test_display_strings() {
    let topology: Topology = "2,3,1".parse().unwrap();
    insta::assert_snapshot!(topology.to_string(), @"2-3-1");

    let err = Error::InvalidPopulationSize {
        requested: 3,
        survivors: 5,
    };
    insta::assert_snapshot!(err.to_string(), @"invalid population size 3: must be at least the 5 survivors");

    let err = Topology::new(vec![4]).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"invalid topology [4]: need at least 2 non-empty layers");

    insta::assert_snapshot!(Crossover::DivisionPoint.to_string(), @"division-point");
}
