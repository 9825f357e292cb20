//! Test helpers shared by the runner's unit tests

use std::path::{Path, PathBuf};

/// Writes a shell script into `dir` and returns its path
///
/// Tests run stubs as `sh <path> ...` so the file never has to be executable.
pub(crate) fn write_stub(dir: &Path, file_name: &str, body: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    path
}

/// Scheduler stand-in that runs the script in the background
///
/// Mirrors `sbatch`: output goes to the `--output` file and the script path
/// is the last argument.
pub(crate) const FAKE_SBATCH: &str = r#"out=""
script=""
for arg in "$@"; do
  case "$arg" in
    --output=*) out="${arg#--output=}" ;;
  esac
  script="$arg"
done
printf '%s\n' "$@" > last-args.txt
sh "$script" > "$out" 2>&1 < /dev/null &
echo "Submitted batch job 42"
"#;
