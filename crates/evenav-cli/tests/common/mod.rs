#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use evenav_lib::SystemPosition;
use rusqlite::{params, Connection};
use tempfile::TempDir;

/// Temporary data directory holding a small static-data export.
///
/// Anchor (station), Bridge, and Citadel sit 6 LY apart on a line; Gatekeeper
/// links Anchor and Citadel by gates. All systems are low-sec.
pub struct TestEnv {
    temp_dir: TempDir,
    pub db_path: PathBuf,
    pub neighbors_path: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let db_path = temp_dir.path().join("static_data.db");
        let neighbors_path = temp_dir.path().join("jump_neighbors.db");
        write_fixture(&db_path);
        Self {
            temp_dir: temp_dir,
            db_path,
            neighbors_path,
        }
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// CLI command pointed at this environment with logging and color quiet.
    pub fn cli(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("evenav");
        cmd.env("RUST_LOG", "error")
            .env("NO_COLOR", "1")
            .env_remove("EVENAV_DATA")
            .env_remove("EVENAV_CONFIG")
            .arg("--data")
            .arg(&self.db_path);
        cmd
    }

    pub fn precompute(&self, bucket: &str) {
        self.cli()
            .args(["precompute", "--bucket", bucket])
            .assert()
            .success();
    }
}

fn write_fixture(path: &Path) {
    let connection = Connection::open(path).expect("open fixture db");
    connection
        .execute_batch(
            "CREATE TABLE SolarSystems (
                solarSystemId INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                constellationID INTEGER,
                regionID INTEGER,
                security REAL,
                centerX REAL,
                centerY REAL,
                centerZ REAL,
                hasStation INTEGER
            );
            CREATE TABLE Jumps (
                fromSystemId INTEGER NOT NULL,
                toSystemId INTEGER NOT NULL
            );",
        )
        .expect("create fixture schema");

    let systems = [
        (1_i64, "Anchor", [0.0, 0.0, 0.0], true),
        (2, "Bridge", [6.0, 0.0, 0.0], false),
        (3, "Citadel", [12.0, 0.0, 0.0], false),
        (4, "Gatekeeper", [3.0, 3.0, 0.0], false),
    ];
    for (id, name, [x, y, z], has_station) in systems {
        let position = SystemPosition::from_light_years(x, y, z);
        connection
            .execute(
                "INSERT INTO SolarSystems VALUES (?1, ?2, 1, 1, 0.3, ?3, ?4, ?5, ?6)",
                params![id, name, position.x, position.y, position.z, has_station],
            )
            .expect("insert system");
    }
    for (from, to) in [(1_i64, 4_i64), (4, 3)] {
        connection
            .execute("INSERT INTO Jumps VALUES (?1, ?2)", params![from, to])
            .expect("insert gate");
    }
}
