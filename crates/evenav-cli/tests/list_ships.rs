use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn lists_jump_ships_without_a_dataset() {
    let mut cmd = cargo_bin_cmd!("evenav");
    cmd.env("RUST_LOG", "error").env_remove("EVENAV_DATA").arg("ships");

    cmd.assert()
        .success()
        .stdout(contains("Jump-capable ships (8):"))
        .stdout(contains("Range at L5"))
        .stdout(contains("carrier"))
        .stdout(contains("jump_freighter"))
        .stdout(contains("supercapital"));
}
