use ratechart::data::{analyze_csv, DatasetManifest};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn manifest_path(csv: &Path) -> PathBuf {
    csv.with_extension("manifest.json")
}

fn main() {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "unemployment.csv".to_string());
    let measure = env::var("MEASURE_LABEL").unwrap_or_else(|_| "Unemployment".to_string());

    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(err) => {
            eprintln!("cannot read {}: {}", path, err);
            std::process::exit(1);
        }
    };

    let manifest: DatasetManifest = match analyze_csv(&path, &text, &measure) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("analysis failed: {}", err);
            std::process::exit(2);
        }
    };

    for warning in &manifest.warnings {
        eprintln!("warning: {}", warning);
    }

    let out_path = manifest_path(Path::new(&path));
    let payload = match serde_json::to_string_pretty(&manifest) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("failed to encode manifest: {}", err);
            std::process::exit(3);
        }
    };
    if let Err(err) = fs::write(&out_path, payload) {
        eprintln!("failed to write {}: {}", out_path.display(), err);
        std::process::exit(4);
    }
    println!("wrote manifest {}", out_path.display());
}
