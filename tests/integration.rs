use flusim::engine::EpisodeMatrix;
use std::{
    env, fs,
    path::{Path, PathBuf},
    process::Command,
};

fn write_config(test_dir: &Path, n_students: usize, social_distance_range: &str) {
    let config_contents = String::new()
        + "[disease]\n"
        + "infectious_probability = 0.083\n"
        + "incubation_range = [ 2.0, 5.0,]\n"
        + "infectious_period_range = [ 2.0, 5.0,]\n"
        + "\n"
        + "[population]\n"
        + &format!("n_students = {n_students}\n")
        + &format!("social_distance_range = {social_distance_range}\n")
        + "mask_adoption_prob = 0.5\n"
        + "mask_factor_range = [ 0.6, 0.8,]\n"
        + "handwash_low_prob = 0.42\n"
        + "vaccination_prob = 0.68\n"
        + "second_dose_prob = 0.5\n"
        + "vaccination_factor_range = [ 0.44, 0.48,]\n"
        + "\n"
        + "[simulation]\n"
        + "n_days = 40\n"
        + "n_episodes = 6\n"
        + "weekend_enabled = true\n"
        + "seed = 8388607\n"
        + "duration_offset = 4\n";

    fs::write(test_dir.join("config.toml"), config_contents).expect("failed to write config file");
}

fn run_bin(args: &[&str]) -> bool {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_flusim"));

    let output = Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command");

    if !output.status.success() {
        let stdout_str = String::from_utf8_lossy(&output.stdout);
        let stderr_str = String::from_utf8_lossy(&output.stderr);
        eprintln!("failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n");
    }
    output.status.success()
}

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");
    write_config(&test_dir, 60, "[ 0.0, 0.1,]");

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(run_bin(&["--sim-dir", test_dir_str, "run"]));
    assert!(run_bin(&["--sim-dir", test_dir_str, "run"]));

    let run_0 = EpisodeMatrix::load(test_dir.join("run-0000").join("episodes.msgpack"))
        .expect("failed to load first run");
    let run_1 = EpisodeMatrix::load(test_dir.join("run-0001").join("episodes.msgpack"))
        .expect("failed to load second run");
    assert_eq!(run_0.n_episodes(), 6);
    assert_eq!(run_0.n_days, 40);
    assert_eq!(run_0, run_1);
    for row in &run_0.rows {
        assert!(row.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    assert!(run_bin(&["--sim-dir", test_dir_str, "analyze"]));
    assert!(test_dir.join("run-0000").join("summary.toml").is_file());
    assert!(test_dir.join("run-0001").join("summary.toml").is_file());

    assert!(run_bin(&["--sim-dir", test_dir_str, "clean"]));
    assert!(!test_dir.join("run-0000").join("summary.toml").exists());
    assert!(test_dir.join("run-0000").join("episodes.msgpack").is_file());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn rejects_invalid_config() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("rejects_invalid_config");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");
    write_config(&test_dir, 0, "[ 0.0, 0.1,]");

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(!run_bin(&["--sim-dir", test_dir_str, "run"]));
    assert!(!test_dir.join("run-0000").exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn rejects_non_finite_range_before_creating_run() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("rejects_non_finite_range");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");
    write_config(&test_dir, 60, "[ 0.0, inf,]");

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert!(!run_bin(&["--sim-dir", test_dir_str, "run"]));
    assert!(!test_dir.join("run-0000").exists());

    fs::remove_dir_all(&test_dir).ok();
}
