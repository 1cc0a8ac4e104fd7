use limdb_core::reference::ReferenceSet;
use limdb_core::LimdbConfig;
use limdb_engine::{MergeContext, RevisionInput};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const REFERENCE: &str = r#"{
  "p007": {
    "TEPHIN": {
      "limit": {
        "1": {"warning_low": 10.0, "caution_low": 20.0, "caution_high": 80.0, "warning_high": 90.0},
        "2": {"warning_low": 15.0, "caution_low": 25.0, "caution_high": 75.0, "warning_high": 85.0}
      },
      "limit_default_set_num": 1
    }
  }
}"#;

pub const BASELINE_BODY: &str = "\
MLOAD TEPHIN
MLOAD FOO
MLIMIT SET 0 PPENG 0 1 9 10
MLOAD BAR
MLIMIT SET 0 PPENG 0 1 10 20
MLOAD AOPCADMD
MLIMIT SET 0 DEFAULT EXPST NPNT
";

/// A data directory holding a reference file and a baseline revision
pub struct Fixture {
    pub dir: TempDir,
    pub config: LimdbConfig,
    pub reference: ReferenceSet,
}

#[allow(dead_code)]
impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("reference_snapshots.json"), REFERENCE).unwrap();
        let config = LimdbConfig {
            data_dir: dir.path().to_path_buf(),
            ..LimdbConfig::default()
        };
        fs::write(
            config.baseline_path(),
            revision_text("1.12", "2000/01/01 00:00:00", BASELINE_BODY),
        )
        .unwrap();
        let reference = serde_json::from_str(REFERENCE).unwrap();
        Self {
            dir,
            config,
            reference,
        }
    }

    pub fn ctx(&self) -> MergeContext<'_> {
        MergeContext::from_config(&self.config, &self.reference)
    }

    /// Write `G_LIMMON_<revision>.dec` and return it as an input
    pub fn archive(&self, revision: &str, date: &str, body: &str) -> RevisionInput {
        let path = self
            .dir
            .path()
            .join(format!("G_LIMMON_{}.dec", revision));
        fs::write(&path, revision_text(revision, date, body)).unwrap();
        RevisionInput::new(path)
    }

    pub fn baseline(&self) -> RevisionInput {
        RevisionInput::new(self.config.baseline_path())
            .with_revision(&self.config.baseline_revision)
    }

    pub fn store_path(&self) -> PathBuf {
        self.config.store_path()
    }
}

pub fn revision_text(revision: &str, date: &str, body: &str) -> String {
    format!(
        "# $Revision: {} $\n# $Date: {} $\nMLMDEFTOL 1\n{}",
        revision, date, body
    )
}
